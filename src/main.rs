use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rhesus::repl::{self, Config, Session};

#[derive(Parser, Debug)]
#[command(name = "rhesus")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Interpreter for a small dynamically typed scripting language", long_about = None)]
struct Args {
    /// Run the whole file as one program instead of starting the REPL
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    #[arg(long, value_name = "TEXT", default_value = repl::DEFAULT_PROMPT)]
    prompt: String,

    /// Skip the greeting
    #[arg(short, long)]
    quiet: bool,
}

fn init_tracing() {
    // only when RUST_LOG is set, and on stderr so REPL output stays clean
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn main() -> anyhow::Result<ExitCode> {
    init_tracing();
    let args = Args::parse();

    if let Some(path) = args.file {
        let source = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let ok = repl::run(&Session::new(), &source, io::stdout().lock())?;
        return Ok(if ok {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    if !args.quiet {
        let user = std::env::var("USER").unwrap_or_else(|_| "there".to_string());
        println!("Hello {}! This is the rhesus programming language!", user);
        println!("Type in expressions and statements; end input to quit.");
    }

    let config = Config {
        prompt: args.prompt,
    };
    repl::start(io::stdin().lock(), io::stdout().lock(), &config)?;
    Ok(ExitCode::SUCCESS)
}
