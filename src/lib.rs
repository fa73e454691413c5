pub mod ast;
pub mod builtin;
pub mod interpreter;
pub mod lexer;
pub mod object;
pub mod parser;
pub mod repl;
