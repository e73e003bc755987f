//! Identifier resolution against the value store

use super::concat::evaluate_segment;
use super::error::{ErrorKind, EvalError, EvalResult};
use super::store::ValueStore;
use super::value::Value;
use crate::ast::{Span, Spanned};
use crate::lexer::{ExprToken, Operator};

const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_GROW_SIZE: usize = 1024 * 1024;

/// A token with every reference replaced by its literal value
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Operand(Value),
    Operator(Operator),
    LParen,
    RParen,
}

/// Resolve a token run that contains operators; every operand must be numeric.
pub fn resolve_arithmetic(
    tokens: Vec<(ExprToken, Span)>,
    store: &ValueStore,
) -> EvalResult<Vec<(Term, Span)>> {
    tokens
        .into_iter()
        .map(|(token, span)| {
            let term = match token {
                ExprToken::Operator(op) => Term::Operator(op),
                ExprToken::LParen => Term::LParen,
                ExprToken::RParen => Term::RParen,
                operand => {
                    let value = resolve_value(&operand, span, store)?;
                    if !value.is_numeric() {
                        return Err(EvalError::new(
                            ErrorKind::TypeMismatch,
                            format!("`{operand}` is {}, but arithmetic needs a number", value.type_name()),
                        )
                        .at(span));
                    }
                    Term::Operand(value)
                }
            };
            Ok((term, span))
        })
        .collect()
}

/// Resolve a single operand token to its value, whatever its type.
pub fn resolve_value(token: &ExprToken, span: Span, store: &ValueStore) -> EvalResult<Value> {
    match token {
        ExprToken::Number(text) => parse_number(text).map_err(|e| e.at(span)),
        ExprToken::StringLiteral(s) => Ok(Value::Str(s.clone())),
        ExprToken::CharLiteral(c) => Ok(Value::Char(*c)),
        ExprToken::Boolean(b) => Ok(Value::Boolean(*b)),
        ExprToken::Identifier(name) => {
            let value = store.get_scalar(name).map_err(|e| e.at(span))?;
            if !value.is_initialized() {
                return Err(EvalError::uninitialized(&format!("`{name}`")).at(span));
            }
            Ok(value.clone())
        }
        ExprToken::IndexedIdentifier { name, index } => {
            let i = evaluate_index(index, store)?;
            let value = store.get_element(name, i).map_err(|e| e.at(span))?;
            if !value.is_initialized() {
                return Err(EvalError::uninitialized(&format!("`{name}[{i}]`")).at(span));
            }
            Ok(value.clone())
        }
        ExprToken::Operator(_) | ExprToken::LParen | ExprToken::RParen => Err(
            EvalError::invalid_expression(format!("expected a value, found `{token}`")).at(span),
        ),
    }
}

/// Evaluate an index expression to an INTEGER.
///
/// Index text may itself index arrays, so this recurses through the whole
/// pipeline; the stack grows on demand for deeply nested subscripts.
pub fn evaluate_index(index: &Spanned<String>, store: &ValueStore) -> EvalResult<i64> {
    let value = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
        evaluate_segment(&index.node, store)
    })
    .map_err(|e| e.shifted(index.span.start).or_at(index.span))?;

    match value {
        Value::Integer(i) => Ok(i),
        other => Err(EvalError::type_mismatch("INTEGER index", other.type_name()).at(index.span)),
    }
}

/// Parse numeric literal text; a decimal point makes it REAL.
pub fn parse_number(text: &str) -> EvalResult<Value> {
    if text.contains('.') {
        let x: f64 = text
            .parse()
            .map_err(|_| EvalError::malformed_expression(format!("invalid number `{text}`")))?;
        if x.is_finite() {
            Ok(Value::Real(x))
        } else {
            Err(EvalError::overflow(text))
        }
    } else {
        text.parse()
            .map(Value::Integer)
            .map_err(|_| EvalError::overflow(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn store() -> ValueStore {
        let mut store = ValueStore::new();
        store.declare_scalar("n", "INTEGER").unwrap();
        store.set_scalar("n", Value::Integer(2)).unwrap();
        store.declare_scalar("name", "STRING").unwrap();
        store.set_scalar("name", Value::Str("Ann".into())).unwrap();
        store.declare_scalar("empty", "INTEGER").unwrap();
        store.declare_array("arr", "INTEGER", 1, 3).unwrap();
        store.set_element("arr", 1, Value::Integer(3)).unwrap();
        store.set_element("arr", 2, Value::Integer(20)).unwrap();
        store
    }

    fn resolve_one(source: &str, store: &ValueStore) -> EvalResult<Value> {
        let tokens = tokenize(source).unwrap();
        assert_eq!(tokens.len(), 1);
        resolve_value(&tokens[0].0, tokens[0].1, store)
    }

    #[test]
    fn test_resolve_literals() {
        let store = store();
        assert_eq!(resolve_one("42", &store).unwrap(), Value::Integer(42));
        assert_eq!(resolve_one("4.5", &store).unwrap(), Value::Real(4.5));
        assert_eq!(resolve_one("\"hi\"", &store).unwrap(), Value::Str("hi".into()));
        assert_eq!(resolve_one("'c'", &store).unwrap(), Value::Char('c'));
        assert_eq!(resolve_one("TRUE", &store).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_parse_number_out_of_range() {
        let too_big = format!("1{}.5", "0".repeat(400));
        assert_eq!(parse_number(&too_big).unwrap_err().kind, ErrorKind::Overflow);
        assert_eq!(parse_number("99999999999999999999").unwrap_err().kind, ErrorKind::Overflow);
        assert_eq!(parse_number("0.25").unwrap(), Value::Real(0.25));
    }

    #[test]
    fn test_resolve_identifiers() {
        let store = store();
        assert_eq!(resolve_one("n", &store).unwrap(), Value::Integer(2));
        assert_eq!(resolve_one("name", &store).unwrap(), Value::Str("Ann".into()));
    }

    #[test]
    fn test_resolve_uninitialized() {
        let store = store();
        let err = resolve_one("empty", &store).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UninitializedValue);
        assert_eq!(err.span, Some(Span::new(0, 5)));
        assert_eq!(resolve_one("arr[3]", &store).unwrap_err().kind, ErrorKind::UninitializedValue);
    }

    #[test]
    fn test_resolve_undeclared() {
        let store = store();
        assert_eq!(resolve_one("ghost", &store).unwrap_err().kind, ErrorKind::UndeclaredVariable);
    }

    #[test]
    fn test_resolve_indexed_identifier() {
        let store = store();
        assert_eq!(resolve_one("arr[1]", &store).unwrap(), Value::Integer(3));
        assert_eq!(resolve_one("arr[n]", &store).unwrap(), Value::Integer(20));
        assert_eq!(resolve_one("arr[n - 1]", &store).unwrap(), Value::Integer(3));
        assert_eq!(resolve_one("arr[arr[1] - 1]", &store).unwrap(), Value::Integer(20));
    }

    #[test]
    fn test_resolve_index_errors() {
        let store = store();
        assert_eq!(resolve_one("arr[7]", &store).unwrap_err().kind, ErrorKind::IndexOutOfBounds);
        assert_eq!(resolve_one("arr[name]", &store).unwrap_err().kind, ErrorKind::TypeMismatch);
        assert_eq!(resolve_one("arr[1.5]", &store).unwrap_err().kind, ErrorKind::TypeMismatch);
        assert_eq!(resolve_one("n[1]", &store).unwrap_err().kind, ErrorKind::NotAnArray);
    }

    #[test]
    fn test_index_error_span_is_rebased() {
        let store = store();
        let err = resolve_one("arr[ghost]", &store).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UndeclaredVariable);
        assert_eq!(err.span, Some(Span::new(4, 9)));
    }

    #[test]
    fn test_resolve_arithmetic_rejects_strings() {
        let store = store();
        let err = resolve_arithmetic(tokenize("n * name").unwrap(), &store).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
        assert_eq!(err.span, Some(Span::new(4, 8)));
        let err = resolve_arithmetic(tokenize("TRUE - 1").unwrap(), &store).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_resolve_arithmetic_substitutes_values() {
        let store = store();
        let terms: Vec<Term> = resolve_arithmetic(tokenize("(n + arr[2])").unwrap(), &store)
            .unwrap()
            .into_iter()
            .map(|(t, _)| t)
            .collect();
        assert_eq!(
            terms,
            vec![
                Term::LParen,
                Term::Operand(Value::Integer(2)),
                Term::Operator(Operator::Add),
                Term::Operand(Value::Integer(20)),
                Term::RParen,
            ]
        );
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("7").unwrap(), Value::Integer(7));
        assert_eq!(parse_number("0.25").unwrap(), Value::Real(0.25));
        assert_eq!(
            parse_number("99999999999999999999").unwrap_err().kind,
            ErrorKind::Overflow
        );
    }
}
