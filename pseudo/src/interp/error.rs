//! Evaluation errors for the expression engine and the value store

use crate::ast::Span;
use thiserror::Error;

/// Error raised by any core operation
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct EvalError {
    pub kind: ErrorKind,
    pub message: String,
    /// Location in the text that was being evaluated, when one is known
    pub span: Option<Span>,
}

/// Kinds of evaluation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Reference to a name that was never declared
    UndeclaredVariable,
    /// Write to a constant
    AssignToConstant,
    /// Second `CONSTANT` for the same name
    ConstantRedeclared,
    /// `DECLARE` over an existing constant
    DuplicateName,
    /// Unknown type keyword in a `DECLARE`
    InvalidType,
    /// Array lower bound above its upper bound
    InvalidBounds,
    /// Declared name is not an identifier
    InvalidName,
    IndexOutOfBounds,
    /// Indexed access on a scalar (or plain access on an array)
    NotAnArray,
    /// Read of a slot that was never written
    UninitializedValue,
    TypeMismatch,
    DivisionByZero,
    /// INTEGER result outside the i64 range, or a REAL result that is not finite
    Overflow,
    /// Tokenizer or shunting-yard structural failure
    MalformedExpression,
    /// Operand count wrong for the postfix stack machine
    InvalidExpression,
    /// Line matches no statement form
    MalformedStatement,
    /// INPUT text does not convert to the target type
    InvalidInput,
    Io,
}

impl ErrorKind {
    /// Short title used as the report header
    pub fn title(self) -> &'static str {
        match self {
            ErrorKind::UndeclaredVariable => "undeclared variable",
            ErrorKind::AssignToConstant => "assignment to constant",
            ErrorKind::ConstantRedeclared => "constant redeclared",
            ErrorKind::DuplicateName => "duplicate name",
            ErrorKind::InvalidType => "invalid type",
            ErrorKind::InvalidBounds => "invalid bounds",
            ErrorKind::InvalidName => "invalid name",
            ErrorKind::IndexOutOfBounds => "index out of bounds",
            ErrorKind::NotAnArray => "not an array",
            ErrorKind::UninitializedValue => "uninitialized value",
            ErrorKind::TypeMismatch => "type mismatch",
            ErrorKind::DivisionByZero => "division by zero",
            ErrorKind::Overflow => "arithmetic overflow",
            ErrorKind::MalformedExpression => "malformed expression",
            ErrorKind::InvalidExpression => "invalid expression",
            ErrorKind::MalformedStatement => "malformed statement",
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::Io => "I/O error",
        }
    }
}

impl EvalError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        EvalError {
            kind,
            message: message.into(),
            span: None,
        }
    }

    pub fn undeclared_variable(name: &str, hint: &str) -> Self {
        Self::new(
            ErrorKind::UndeclaredVariable,
            format!("`{name}` is not declared{hint}"),
        )
    }

    pub fn assign_to_constant(name: &str) -> Self {
        Self::new(
            ErrorKind::AssignToConstant,
            format!("`{name}` is a constant and cannot be assigned"),
        )
    }

    pub fn constant_redeclared(name: &str) -> Self {
        Self::new(
            ErrorKind::ConstantRedeclared,
            format!("`{name}` is already defined as a constant"),
        )
    }

    pub fn duplicate_name(name: &str) -> Self {
        Self::new(
            ErrorKind::DuplicateName,
            format!("`{name}` is a constant and cannot be redeclared"),
        )
    }

    pub fn invalid_type(ty: &str) -> Self {
        Self::new(
            ErrorKind::InvalidType,
            format!("`{ty}` is not a valid data type; expected INTEGER, REAL, CHAR, STRING or BOOLEAN"),
        )
    }

    pub fn invalid_bounds(lower: i64, upper: i64) -> Self {
        Self::new(
            ErrorKind::InvalidBounds,
            format!("lower bound {lower} is greater than upper bound {upper}"),
        )
    }

    /// Array declaration past the slot limits
    pub fn too_many_slots(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidBounds, message)
    }

    pub fn invalid_name(name: &str) -> Self {
        Self::new(
            ErrorKind::InvalidName,
            format!("`{name}` is not a valid variable name"),
        )
    }

    pub fn index_out_of_bounds(name: &str, index: i64, lower: i64, upper: i64) -> Self {
        Self::new(
            ErrorKind::IndexOutOfBounds,
            format!("index {index} is outside `{name}[{lower}:{upper}]`"),
        )
    }

    pub fn not_an_array(name: &str) -> Self {
        Self::new(ErrorKind::NotAnArray, format!("`{name}` is not an array"))
    }

    pub fn array_without_index(name: &str) -> Self {
        Self::new(
            ErrorKind::NotAnArray,
            format!("`{name}` is an array and needs an index"),
        )
    }

    pub fn uninitialized(what: &str) -> Self {
        Self::new(
            ErrorKind::UninitializedValue,
            format!("{what} is used before a value is assigned"),
        )
    }

    pub fn type_mismatch(expected: &str, got: &str) -> Self {
        Self::new(
            ErrorKind::TypeMismatch,
            format!("type mismatch: expected {expected}, got {got}"),
        )
    }

    pub fn division_by_zero() -> Self {
        Self::new(ErrorKind::DivisionByZero, "division by zero")
    }

    pub fn overflow(op: &str) -> Self {
        Self::new(ErrorKind::Overflow, format!("arithmetic overflow in `{op}`"))
    }

    pub fn malformed_expression(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedExpression, message)
    }

    pub fn invalid_expression(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidExpression, message)
    }

    pub fn malformed_statement(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedStatement, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn io(err: &std::io::Error) -> Self {
        Self::new(ErrorKind::Io, format!("I/O error: {err}"))
    }

    /// Attach a span
    pub fn at(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Attach `span` only if the error does not already carry a narrower one
    pub fn or_at(mut self, span: Span) -> Self {
        self.span.get_or_insert(span);
        self
    }

    /// Rebase the span onto enclosing text starting `offset` bytes earlier
    pub fn shifted(mut self, offset: usize) -> Self {
        self.span = self.span.map(|span| span.shift(offset));
        self
    }
}

/// Result type for core operations
pub type EvalResult<T> = Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undeclared_variable_message() {
        let err = EvalError::undeclared_variable("totl", " (did you mean `total`?)");
        assert_eq!(err.kind, ErrorKind::UndeclaredVariable);
        assert_eq!(err.message, "`totl` is not declared (did you mean `total`?)");
        assert!(err.span.is_none());
    }

    #[test]
    fn test_index_out_of_bounds_message() {
        let err = EvalError::index_out_of_bounds("arr", 6, 1, 5);
        assert_eq!(err.kind, ErrorKind::IndexOutOfBounds);
        assert_eq!(err.to_string(), "index 6 is outside `arr[1:5]`");
    }

    #[test]
    fn test_type_mismatch_message() {
        let err = EvalError::type_mismatch("INTEGER", "STRING");
        assert_eq!(err.message, "type mismatch: expected INTEGER, got STRING");
    }

    #[test]
    fn test_span_attachment() {
        let err = EvalError::division_by_zero().at(Span::new(2, 3));
        assert_eq!(err.span, Some(Span::new(2, 3)));

        let kept = err.clone().or_at(Span::new(0, 10));
        assert_eq!(kept.span, Some(Span::new(2, 3)));

        let filled = EvalError::division_by_zero().or_at(Span::new(0, 10));
        assert_eq!(filled.span, Some(Span::new(0, 10)));
    }

    #[test]
    fn test_shifted_rebases_span() {
        let err = EvalError::malformed_expression("x").at(Span::new(1, 4)).shifted(7);
        assert_eq!(err.span, Some(Span::new(8, 11)));
        let spanless = EvalError::division_by_zero().shifted(7);
        assert!(spanless.span.is_none());
    }

    #[test]
    fn test_error_is_std_error() {
        let err = EvalError::division_by_zero();
        let std_err: &dyn std::error::Error = &err;
        assert!(std_err.source().is_none());
        assert_eq!(std_err.to_string(), "division by zero");
    }

    #[test]
    fn test_titles_are_distinct() {
        let kinds = [
            ErrorKind::UndeclaredVariable,
            ErrorKind::AssignToConstant,
            ErrorKind::ConstantRedeclared,
            ErrorKind::DuplicateName,
            ErrorKind::InvalidType,
            ErrorKind::InvalidBounds,
            ErrorKind::InvalidName,
            ErrorKind::IndexOutOfBounds,
            ErrorKind::NotAnArray,
            ErrorKind::UninitializedValue,
            ErrorKind::TypeMismatch,
            ErrorKind::DivisionByZero,
            ErrorKind::Overflow,
            ErrorKind::MalformedExpression,
            ErrorKind::InvalidExpression,
            ErrorKind::MalformedStatement,
            ErrorKind::InvalidInput,
            ErrorKind::Io,
        ];
        for i in 0..kinds.len() {
            for j in (i + 1)..kinds.len() {
                assert_ne!(kinds[i].title(), kinds[j].title());
            }
        }
    }
}
