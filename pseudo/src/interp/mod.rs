//! Expression engine and value store

pub mod concat;
pub mod error;
pub mod eval;
pub mod infix;
pub mod postfix;
pub mod resolve;
pub mod store;
pub mod value;

pub use concat::evaluate;
pub use error::{ErrorKind, EvalError, EvalResult};
pub use eval::{assign, declare, input, Interpreter, LineError, RunSummary};
pub use store::{Entry, TypePolicy, ValueStore};
pub use value::{DataType, Value};
