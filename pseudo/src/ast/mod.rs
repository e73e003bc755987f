//! Statement forms of one source line

mod span;

pub use span::*;

use crate::interp::Value;
use serde::Serialize;

/// One executable line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Statement {
    /// `DECLARE a, b : INTEGER` or `DECLARE a : ARRAY[1:5] OF REAL`
    Declare(DeclSpec),
    /// `CONSTANT PI = 3.14`
    Constant {
        name: Spanned<String>,
        value: Spanned<Value>,
    },
    /// `target <- expr`
    Assign {
        target: Spanned<Target>,
        expr: Spanned<String>,
    },
    /// `INPUT target`
    Input { target: Spanned<Target> },
    /// `OUTPUT expr, expr, ...`
    Output { exprs: Vec<Spanned<String>> },
}

impl Statement {
    pub fn keyword(&self) -> &'static str {
        match self {
            Statement::Declare(_) => "DECLARE",
            Statement::Constant { .. } => "CONSTANT",
            Statement::Assign { .. } => "<-",
            Statement::Input { .. } => "INPUT",
            Statement::Output { .. } => "OUTPUT",
        }
    }
}

/// Body of a `DECLARE`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeclSpec {
    pub names: Vec<Spanned<String>>,
    /// Type keyword as written; validated by the store
    pub ty: Spanned<String>,
    pub bounds: Option<Spanned<Bounds>>,
}

/// `[lower:upper]` of an array declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bounds {
    pub lower: i64,
    pub upper: i64,
}

/// Left side of an assignment or the operand of `INPUT`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Target {
    Variable(String),
    Element {
        name: String,
        /// Index expression text; span relative to the line
        index: Spanned<String>,
    },
}

impl Target {
    pub fn name(&self) -> &str {
        match self {
            Target::Variable(name) | Target::Element { name, .. } => name,
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Variable(name) => write!(f, "{name}"),
            Target::Element { name, index } => write!(f, "{name}[{}]", index.node),
        }
    }
}
