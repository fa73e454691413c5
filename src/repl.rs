use std::io::{self, BufRead, Write};
use std::rc::Rc;

use thiserror::Error;
use tracing::debug;

use crate::interpreter::eval;
use crate::object::{Env, Environment, Object};
use crate::parser::{parse, ParseError};

pub const DEFAULT_PROMPT: &str = ">> ";

#[derive(Debug, Error)]
pub enum ReplError {
    #[error("failed to read input")]
    Read(#[source] io::Error),
    #[error("failed to write output")]
    Write(#[source] io::Error),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub prompt: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    ParseErrors(Vec<ParseError>),
    Value(Rc<Object>),
    /// The input evaluated to nothing displayable, e.g. a lone `let`.
    Empty,
}

/// Interpreter state that survives from one input to the next.
#[derive(Debug)]
pub struct Session {
    env: Env,
}

impl Session {
    pub fn new() -> Self {
        Self {
            env: Environment::new().shared(),
        }
    }

    pub fn eval_line(&self, line: &str) -> Outcome {
        let program = match parse(line) {
            Ok(program) => program,
            Err(errors) => {
                debug!(count = errors.len(), "input rejected by parser");
                return Outcome::ParseErrors(errors);
            }
        };
        match eval(&program, &self.env) {
            Some(value) => Outcome::Value(value),
            None => Outcome::Empty,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

fn write_outcome<W: Write>(output: &mut W, outcome: &Outcome) -> io::Result<()> {
    match outcome {
        Outcome::ParseErrors(errors) => {
            writeln!(output, "parser errors:")?;
            for e in errors {
                writeln!(output, "\t{}", e)?;
            }
            Ok(())
        }
        Outcome::Value(value) => writeln!(output, "{}", value),
        Outcome::Empty => Ok(()),
    }
}

/// Evaluates `source` as a single program and prints the outcome.
///
/// Returns `false` when the program failed to parse or evaluated to an error.
pub fn run<W: Write>(session: &Session, source: &str, mut output: W) -> Result<bool, ReplError> {
    let outcome = session.eval_line(source);
    write_outcome(&mut output, &outcome).map_err(ReplError::Write)?;
    Ok(match outcome {
        Outcome::ParseErrors(_) => false,
        Outcome::Value(value) => !value.is_error(),
        Outcome::Empty => true,
    })
}

/// Reads `input` line by line until it is exhausted, printing each result.
pub fn start<R: BufRead, W: Write>(input: R, mut output: W, config: &Config) -> Result<(), ReplError> {
    let session = Session::new();
    let mut lines = input.lines();
    loop {
        write!(output, "{}", config.prompt).map_err(ReplError::Write)?;
        output.flush().map_err(ReplError::Write)?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.map_err(ReplError::Read)?;
        if line.trim().is_empty() {
            continue;
        }
        debug!(line = %line, "evaluating");

        let outcome = session.eval_line(&line);
        write_outcome(&mut output, &outcome).map_err(ReplError::Write)?;
    }
    Ok(())
}
