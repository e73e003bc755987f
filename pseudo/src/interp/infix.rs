//! Infix to postfix conversion (shunting-yard)

use super::error::{EvalError, EvalResult};
use super::resolve::Term;
use crate::ast::Span;
use crate::lexer::Operator;

/// Binding strength; higher binds tighter
pub fn precedence(op: Operator) -> u8 {
    match op {
        Operator::Add | Operator::Sub => 1,
        Operator::Mul | Operator::Div | Operator::IntDiv | Operator::Mod => 2,
        Operator::Neg => 3,
    }
}

/// Reorder resolved terms into postfix. Parentheses are consumed.
///
/// Binary operators are left-associative: an incoming operator first emits
/// every stacked operator of equal or higher precedence. Prefix negation is
/// pushed without popping, which makes it right-associative.
pub fn to_postfix(terms: Vec<(Term, Span)>) -> EvalResult<Vec<(Term, Span)>> {
    let mut output = Vec::with_capacity(terms.len());
    let mut stack: Vec<(Term, Span)> = Vec::new();

    for (term, span) in terms {
        match term {
            Term::Operand(_) => output.push((term, span)),
            Term::Operator(op) if op.is_unary() => stack.push((term, span)),
            Term::Operator(op) => {
                while let Some((Term::Operator(top), _)) = stack.last() {
                    if precedence(*top) < precedence(op) {
                        break;
                    }
                    if let Some(item) = stack.pop() {
                        output.push(item);
                    }
                }
                stack.push((term, span));
            }
            Term::LParen => stack.push((term, span)),
            Term::RParen => loop {
                match stack.pop() {
                    Some((Term::LParen, _)) => break,
                    Some(item) => output.push(item),
                    None => {
                        return Err(EvalError::malformed_expression("unmatched `)`").at(span));
                    }
                }
            },
        }
    }

    while let Some((term, span)) = stack.pop() {
        if term == Term::LParen {
            return Err(EvalError::malformed_expression("unclosed `(`").at(span));
        }
        output.push((term, span));
    }

    tracing::trace!(?output, "postfix");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::error::ErrorKind;
    use crate::interp::resolve::resolve_arithmetic;
    use crate::interp::store::ValueStore;
    use crate::lexer::tokenize;

    fn postfix(source: &str) -> EvalResult<String> {
        let terms = resolve_arithmetic(tokenize(source)?, &ValueStore::new())?;
        let rendered: Vec<String> = to_postfix(terms)?
            .into_iter()
            .map(|(term, _)| match term {
                Term::Operand(v) => v.to_string(),
                Term::Operator(Operator::Neg) => "neg".to_string(),
                Term::Operator(op) => op.to_string(),
                Term::LParen => "(".to_string(),
                Term::RParen => ")".to_string(),
            })
            .collect();
        Ok(rendered.join(" "))
    }

    #[test]
    fn test_precedence_table() {
        assert_eq!(precedence(Operator::Add), precedence(Operator::Sub));
        assert_eq!(precedence(Operator::Mul), precedence(Operator::Div));
        assert_eq!(precedence(Operator::IntDiv), precedence(Operator::Mod));
        assert!(precedence(Operator::Mul) > precedence(Operator::Add));
        assert!(precedence(Operator::Neg) > precedence(Operator::Mod));
    }

    #[test]
    fn test_postfix_precedence() {
        assert_eq!(postfix("2 + 3 * 4").unwrap(), "2 3 4 * +");
        assert_eq!(postfix("2 * 3 + 4").unwrap(), "2 3 * 4 +");
    }

    #[test]
    fn test_postfix_left_associative() {
        assert_eq!(postfix("10 - 3 - 2").unwrap(), "10 3 - 2 -");
        assert_eq!(postfix("8 / 4 / 2").unwrap(), "8 4 / 2 /");
        assert_eq!(postfix("7 DIV 2 MOD 3").unwrap(), "7 2 DIV 3 MOD");
    }

    #[test]
    fn test_postfix_parentheses() {
        assert_eq!(postfix("(2 + 3) * 4").unwrap(), "2 3 + 4 *");
        assert_eq!(postfix("2 * (3 - (4 - 1))").unwrap(), "2 3 4 1 - - *");
    }

    #[test]
    fn test_postfix_negation() {
        assert_eq!(postfix("-2 * 3").unwrap(), "2 neg 3 *");
        assert_eq!(postfix("2 * -3").unwrap(), "2 3 neg *");
        assert_eq!(postfix("- -3").unwrap(), "3 neg neg");
    }

    #[test]
    fn test_postfix_unbalanced() {
        let err = postfix("(2 + 3").unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedExpression);
        assert_eq!(err.span, Some(Span::new(0, 1)));

        let err = postfix("2 + 3)").unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedExpression);
        assert_eq!(err.span, Some(Span::new(5, 6)));
    }
}
