//! Pseudocode interpreter library
//!
//! Line-oriented interpreter for a small teaching pseudocode: typed
//! variables and fixed-bound arrays, `DECLARE`/`CONSTANT`, `INPUT`,
//! `OUTPUT` and `<-` assignment over one expression grammar that mixes
//! arithmetic with string concatenation.

pub mod ast;
pub mod config;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod util;

pub use ast::Span;
pub use error::{Error, Result};
pub use interp::{assign, declare, evaluate, EvalError, Interpreter, Value, ValueStore};
