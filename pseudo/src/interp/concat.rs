//! Top-level expression evaluation: `+` as addition or concatenation
//!
//! An expression is cut on every `+` that sits outside quotes, parentheses
//! and brackets. Each segment is evaluated on its own, then the results are
//! folded left to right: two numbers add, anything else is rendered as text
//! and joined.

use super::error::{EvalError, EvalResult};
use super::infix::to_postfix;
use super::postfix::{apply, evaluate_postfix};
use super::resolve::{resolve_arithmetic, resolve_value};
use super::store::ValueStore;
use super::value::Value;
use crate::ast::{Span, Spanned};
use crate::lexer::{tokenize, ExprToken, Operator};

/// Evaluate an OUTPUT argument or an assignment's right-hand side.
#[tracing::instrument(level = "debug", skip(store))]
pub fn evaluate(expression: &str, store: &ValueStore) -> EvalResult<Value> {
    let mut result: Option<Value> = None;

    for segment in split_segments(expression)? {
        let value = evaluate_segment(segment.node, store)
            .map_err(|e| e.shifted(segment.span.start).or_at(segment.span))?;
        result = Some(match result {
            None => value,
            Some(acc) => combine(acc, value).map_err(|e| e.or_at(segment.span))?,
        });
    }

    result.ok_or_else(|| EvalError::malformed_expression("empty expression"))
}

/// Join two adjacent segment values.
pub fn combine(left: Value, right: Value) -> EvalResult<Value> {
    if left.is_numeric() && right.is_numeric() {
        apply(Operator::Add, &left, &right)
    } else {
        Ok(Value::Str(format!("{left}{right}")))
    }
}

/// Evaluate one `+`-free segment.
///
/// A lone operand (`name`, `arr[i]`, a literal) keeps its own type. Anything
/// with an operator or parenthesis is arithmetic and goes through resolution,
/// shunting-yard and the postfix machine.
pub(crate) fn evaluate_segment(text: &str, store: &ValueStore) -> EvalResult<Value> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Err(EvalError::malformed_expression("empty expression").at(Span::new(0, text.len())));
    }
    if let [(token, span)] = tokens.as_slice()
        && is_operand(token)
    {
        return resolve_value(token, *span, store);
    }
    let terms = resolve_arithmetic(tokens, store)?;
    evaluate_postfix(&to_postfix(terms)?)
}

fn is_operand(token: &ExprToken) -> bool {
    !matches!(token, ExprToken::Operator(_) | ExprToken::LParen | ExprToken::RParen)
}

/// Split on top-level `+`. Segment text is trimmed; spans index `expression`.
pub fn split_segments(expression: &str) -> EvalResult<Vec<Spanned<&str>>> {
    let mut segments = Vec::new();
    let mut quote: Option<char> = None;
    let mut depth: isize = 0;
    let mut start = 0;

    for (pos, c) in expression.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(' | '[') => depth += 1,
            (None, ')' | ']') => depth -= 1,
            (None, '+') if depth == 0 => {
                segments.push(segment(expression, start, pos)?);
                start = pos + 1;
            }
            _ => {}
        }
    }
    segments.push(segment(expression, start, expression.len())?);
    Ok(segments)
}

fn segment(expression: &str, start: usize, end: usize) -> EvalResult<Spanned<&str>> {
    let raw = &expression[start..end];
    let text = raw.trim();
    if text.is_empty() {
        let at = if end < expression.len() { Span::new(end, end + 1) } else { Span::new(start, end) };
        return Err(EvalError::malformed_expression("`+` is missing an operand").at(at));
    }
    let lead = raw.len() - raw.trim_start().len();
    let begin = start + lead;
    Ok(Spanned::new(text, Span::new(begin, begin + text.len())))
}
