//! Postfix stack machine and numeric type inference

use super::error::{EvalError, EvalResult};
use super::resolve::Term;
use super::value::Value;
use crate::ast::Span;
use crate::lexer::Operator;

/// Evaluate a postfix queue to a single numeric value.
pub fn evaluate_postfix(postfix: &[(Term, Span)]) -> EvalResult<Value> {
    let mut stack: Vec<(Value, Span)> = Vec::with_capacity(postfix.len());

    for (term, span) in postfix {
        match term {
            Term::Operand(value) => stack.push((value.clone(), *span)),
            Term::Operator(op) if op.is_unary() => {
                let (operand, operand_span) = stack
                    .pop()
                    .ok_or_else(|| missing_operand(*op, *span))?;
                let whole = span.merge(operand_span);
                stack.push((negate(&operand).map_err(|e| e.or_at(whole))?, whole));
            }
            Term::Operator(op) => {
                // Right operand sits on top
                let (right, right_span) = stack.pop().ok_or_else(|| missing_operand(*op, *span))?;
                let (left, left_span) = stack.pop().ok_or_else(|| missing_operand(*op, *span))?;
                let whole = left_span.merge(right_span).merge(*span);
                let result = apply(*op, &left, &right).map_err(|e| e.or_at(whole))?;
                stack.push((result, whole));
            }
            Term::LParen | Term::RParen => {
                return Err(EvalError::invalid_expression("parenthesis in postfix queue").at(*span));
            }
        }
    }

    match (stack.pop(), stack.is_empty()) {
        (Some((value, _)), true) => Ok(value),
        (Some((_, span)), false) => Err(EvalError::invalid_expression(
            "expected an operator between values",
        )
        .at(span)),
        (None, _) => Err(EvalError::invalid_expression("empty expression")),
    }
}

/// Apply a binary operator.
///
/// `/` always yields REAL. `DIV` and `MOD` floor and always yield INTEGER.
/// `+ - *` stay INTEGER only when both sides are INTEGER.
pub fn apply(op: Operator, left: &Value, right: &Value) -> EvalResult<Value> {
    for operand in [left, right] {
        if !operand.is_numeric() {
            return Err(EvalError::type_mismatch("a number", operand.type_name()));
        }
    }

    match op {
        Operator::Add | Operator::Sub | Operator::Mul => match (left, right) {
            (Value::Integer(a), Value::Integer(b)) => {
                let result = match op {
                    Operator::Add => a.checked_add(*b),
                    Operator::Sub => a.checked_sub(*b),
                    _ => a.checked_mul(*b),
                };
                result
                    .map(Value::Integer)
                    .ok_or_else(|| EvalError::overflow(op.symbol()))
            }
            _ => {
                let (a, b) = (real(left), real(right));
                finite(op, match op {
                    Operator::Add => a + b,
                    Operator::Sub => a - b,
                    _ => a * b,
                })
            }
        },
        Operator::Div => {
            let divisor = real(right);
            if divisor == 0.0 {
                return Err(EvalError::division_by_zero());
            }
            finite(op, real(left) / divisor)
        }
        Operator::IntDiv | Operator::Mod => {
            let a = integral(left, op)?;
            let b = integral(right, op)?;
            if b == 0 {
                return Err(EvalError::division_by_zero());
            }
            let result = if op == Operator::IntDiv {
                floor_div(a, b)
            } else {
                Some(floor_mod(a, b))
            };
            result
                .map(Value::Integer)
                .ok_or_else(|| EvalError::overflow(op.symbol()))
        }
        Operator::Neg => Err(EvalError::invalid_expression("`-` used as a binary operator")),
    }
}

fn negate(value: &Value) -> EvalResult<Value> {
    match value {
        Value::Integer(n) => n
            .checked_neg()
            .map(Value::Integer)
            .ok_or_else(|| EvalError::overflow("-")),
        Value::Real(x) => Ok(Value::Real(-x)),
        other => Err(EvalError::type_mismatch("a number", other.type_name())),
    }
}

/// REAL result, or `Overflow` once it leaves the finite range.
fn finite(op: Operator, x: f64) -> EvalResult<Value> {
    if x.is_finite() {
        Ok(Value::Real(x))
    } else {
        Err(EvalError::overflow(op.symbol()))
    }
}

fn real(value: &Value) -> f64 {
    value.as_real().unwrap_or(f64::NAN)
}

/// INTEGER operand for `DIV`/`MOD`; a REAL is accepted only if it is whole.
fn integral(value: &Value, op: Operator) -> EvalResult<i64> {
    match value {
        Value::Integer(n) => Ok(*n),
        Value::Real(x) if x.fract() == 0.0 && x.abs() < i64::MAX as f64 => Ok(*x as i64),
        other => Err(EvalError::type_mismatch(
            &format!("an INTEGER operand for {}", op.symbol()),
            &format!("{} {other}", other.type_name()),
        )),
    }
}

fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

fn floor_mod(a: i64, b: i64) -> i64 {
    let r = a.wrapping_rem(b);
    if r != 0 && ((r < 0) != (b < 0)) { r + b } else { r }
}

fn missing_operand(op: Operator, span: Span) -> EvalError {
    EvalError::invalid_expression(format!("`{op}` is missing an operand")).at(span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::error::ErrorKind;
    use crate::interp::infix::to_postfix;
    use crate::interp::resolve::resolve_arithmetic;
    use crate::interp::store::ValueStore;
    use crate::lexer::tokenize;

    fn eval(source: &str) -> EvalResult<Value> {
        let terms = resolve_arithmetic(tokenize(source)?, &ValueStore::new())?;
        evaluate_postfix(&to_postfix(terms)?)
    }

    #[test]
    fn test_integer_arithmetic() {
        assert_eq!(eval("2 + 3 * 4").unwrap(), Value::Integer(14));
        assert_eq!(eval("(2 + 3) * 4").unwrap(), Value::Integer(20));
        assert_eq!(eval("10 - 3 - 2").unwrap(), Value::Integer(5));
    }

    #[test]
    fn test_true_division_is_real() {
        assert_eq!(eval("7 / 2").unwrap(), Value::Real(3.5));
        assert_eq!(eval("8 / 4").unwrap(), Value::Real(2.0));
    }

    #[test]
    fn test_mixed_operands_are_real() {
        assert_eq!(eval("1 + 0.5").unwrap(), Value::Real(1.5));
        assert_eq!(eval("2.5 * 2").unwrap(), Value::Real(5.0));
    }

    #[test]
    fn test_floor_div_and_mod() {
        assert_eq!(eval("7 DIV 2").unwrap(), Value::Integer(3));
        assert_eq!(eval("7 MOD 2").unwrap(), Value::Integer(1));
        assert_eq!(eval("-7 DIV 2").unwrap(), Value::Integer(-4));
        assert_eq!(eval("-7 MOD 2").unwrap(), Value::Integer(1));
        assert_eq!(eval("7 DIV -2").unwrap(), Value::Integer(-4));
        assert_eq!(eval("7 MOD -2").unwrap(), Value::Integer(-1));
        assert_eq!(eval("6.0 DIV 4").unwrap(), Value::Integer(1));
    }

    #[test]
    fn test_div_mod_need_whole_numbers() {
        assert_eq!(eval("7.5 DIV 2").unwrap_err().kind, ErrorKind::TypeMismatch);
        assert_eq!(eval("7 MOD 0.5").unwrap_err().kind, ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval("1 / 0").unwrap_err().kind, ErrorKind::DivisionByZero);
        assert_eq!(eval("1 DIV 0").unwrap_err().kind, ErrorKind::DivisionByZero);
        assert_eq!(eval("1 MOD 0").unwrap_err().kind, ErrorKind::DivisionByZero);
    }

    #[test]
    fn test_overflow() {
        assert_eq!(eval("9223372036854775807 + 1").unwrap_err().kind, ErrorKind::Overflow);
        assert_eq!(
            eval("(0 - 9223372036854775807 - 1) DIV -1").unwrap_err().kind,
            ErrorKind::Overflow
        );
        assert_eq!(
            eval("(0 - 9223372036854775807 - 1) MOD -1").unwrap(),
            Value::Integer(0)
        );
    }

    #[test]
    fn test_real_overflow() {
        let huge = format!("1{}.0", "0".repeat(308));
        assert_eq!(eval(&format!("{huge} * 10")).unwrap_err().kind, ErrorKind::Overflow);
        assert_eq!(
            eval(&format!("{huge} * 10 - {huge} * 10")).unwrap_err().kind,
            ErrorKind::Overflow
        );
        assert_eq!(eval(&format!("{huge} / 0.1")).unwrap_err().kind, ErrorKind::Overflow);
        assert_eq!(eval(&format!("{huge} - {huge}")).unwrap(), Value::Real(0.0));
    }

    #[test]
    fn test_real_overflow_message() {
        let err = apply(Operator::Mul, &Value::Real(f64::MAX), &Value::Integer(2)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Overflow);
        assert_eq!(err.message, "arithmetic overflow in `*`");
    }

    #[test]
    fn test_negation() {
        assert_eq!(eval("-3 + 5").unwrap(), Value::Integer(2));
        assert_eq!(eval("2 * -(1 + 2)").unwrap(), Value::Integer(-6));
        assert_eq!(eval("-1.5 * 2").unwrap(), Value::Real(-3.0));
    }

    #[test]
    fn test_arity_errors() {
        assert_eq!(eval("2 *").unwrap_err().kind, ErrorKind::InvalidExpression);
        assert_eq!(eval("* 2").unwrap_err().kind, ErrorKind::InvalidExpression);
        assert_eq!(eval("2 3").unwrap_err().kind, ErrorKind::InvalidExpression);
        assert_eq!(eval("()").unwrap_err().kind, ErrorKind::InvalidExpression);
        assert_eq!(eval("-").unwrap_err().kind, ErrorKind::InvalidExpression);
    }

    #[test]
    fn test_error_span_covers_operation() {
        let err = eval("1 + 4 / 0").unwrap_err();
        assert_eq!(err.span, Some(Span::new(4, 9)));
    }

    #[test]
    fn test_apply_rejects_non_numeric() {
        let err = apply(Operator::Add, &Value::Integer(1), &Value::Str("x".into())).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
    }
}
