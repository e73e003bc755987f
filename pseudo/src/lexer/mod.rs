//! Expression tokenizer
//!
//! logos produces raw lexemes; this module groups `name[...]` into a single
//! indexed-identifier token, tells unary minus from subtraction, and turns
//! malformed quoting or stray brackets into `MalformedExpression`.

mod token;

pub use token::Token;

use crate::ast::{Span, Spanned};
use crate::interp::error::{EvalError, EvalResult};
use logos::Logos;

/// Arithmetic operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    /// `/`, true division
    Div,
    /// `DIV`, floor division
    IntDiv,
    /// `MOD`, floor modulus
    Mod,
    /// Prefix `-`
    Neg,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub | Operator::Neg => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::IntDiv => "DIV",
            Operator::Mod => "MOD",
        }
    }

    pub fn is_unary(self) -> bool {
        self == Operator::Neg
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Typed token of an expression
#[derive(Debug, Clone, PartialEq)]
pub enum ExprToken {
    Number(String),
    Identifier(String),
    /// `name[index]`; the index text is kept whole and resolved recursively
    IndexedIdentifier {
        name: String,
        index: Spanned<String>,
    },
    Operator(Operator),
    LParen,
    RParen,
    StringLiteral(String),
    CharLiteral(char),
    Boolean(bool),
}

impl ExprToken {
    /// Whether a following `-` is a prefix negation
    fn expects_operand(prev: Option<&ExprToken>) -> bool {
        matches!(prev, None | Some(ExprToken::Operator(_)) | Some(ExprToken::LParen))
    }
}

impl std::fmt::Display for ExprToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExprToken::Number(n) => write!(f, "{n}"),
            ExprToken::Identifier(name) => write!(f, "{name}"),
            ExprToken::IndexedIdentifier { name, index } => write!(f, "{name}[{}]", index.node),
            ExprToken::Operator(op) => write!(f, "{op}"),
            ExprToken::LParen => write!(f, "("),
            ExprToken::RParen => write!(f, ")"),
            ExprToken::StringLiteral(s) => write!(f, "\"{s}\""),
            ExprToken::CharLiteral(c) => write!(f, "'{c}'"),
            ExprToken::Boolean(true) => write!(f, "TRUE"),
            ExprToken::Boolean(false) => write!(f, "FALSE"),
        }
    }
}

/// Tokenize one expression. Spans are relative to `source`.
pub fn tokenize(source: &str) -> EvalResult<Vec<(ExprToken, Span)>> {
    let raw = lex(source)?;
    let mut tokens: Vec<(ExprToken, Span)> = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        let (tok, span) = &raw[i];
        let span = *span;
        let expr_token = match tok {
            Token::Ident(name) if matches!(raw.get(i + 1), Some((Token::LBracket, _))) => {
                let open = raw[i + 1].1;
                let close_at = matching_bracket(&raw, i + 1).ok_or_else(|| {
                    EvalError::malformed_expression(format!("unclosed `[` after `{name}`")).at(open)
                })?;
                let close = raw[close_at].1;
                let index_span = Span::new(open.end, close.start);
                let index_text = &source[index_span.start..index_span.end];
                if index_text.trim().is_empty() {
                    return Err(EvalError::malformed_expression(format!("`{name}[]` needs an index"))
                        .at(open.merge(close)));
                }
                tokens.push((
                    ExprToken::IndexedIdentifier {
                        name: name.clone(),
                        index: Spanned::new(index_text.to_string(), index_span),
                    },
                    span.merge(close),
                ));
                i = close_at + 1;
                continue;
            }
            Token::Ident(name) => ExprToken::Identifier(name.clone()),
            Token::Number(text) => ExprToken::Number(text.clone()),
            Token::StringLit(text) => ExprToken::StringLiteral(text.clone()),
            Token::CharLit(c) => ExprToken::CharLiteral(*c),
            Token::True => ExprToken::Boolean(true),
            Token::False => ExprToken::Boolean(false),
            Token::Plus => ExprToken::Operator(Operator::Add),
            Token::Minus if ExprToken::expects_operand(tokens.last().map(|(t, _)| t)) => {
                ExprToken::Operator(Operator::Neg)
            }
            Token::Minus => ExprToken::Operator(Operator::Sub),
            Token::Star => ExprToken::Operator(Operator::Mul),
            Token::Slash => ExprToken::Operator(Operator::Div),
            Token::Div => ExprToken::Operator(Operator::IntDiv),
            Token::Mod => ExprToken::Operator(Operator::Mod),
            Token::LParen => ExprToken::LParen,
            Token::RParen => ExprToken::RParen,
            Token::LBracket => {
                return Err(EvalError::malformed_expression("`[` must follow an array name").at(span));
            }
            Token::RBracket => {
                return Err(EvalError::malformed_expression("unmatched `]`").at(span));
            }
            Token::UnterminatedString => {
                return Err(EvalError::malformed_expression("unterminated string literal")
                    .at(Span::new(span.start, source.len())));
            }
        };
        tokens.push((expr_token, span));
        i += 1;
    }

    tracing::trace!(?tokens, "tokenized");
    Ok(tokens)
}

fn lex(source: &str) -> EvalResult<Vec<(Token, Span)>> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let span = Span::new(lexer.span().start, lexer.span().end);
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(_) => {
                return Err(EvalError::malformed_expression(format!(
                    "unexpected character: {:?}",
                    lexer.slice()
                ))
                .at(span));
            }
        }
    }

    Ok(tokens)
}

/// Position of the `]` closing the `[` at `open`, honouring nesting
fn matching_bracket(raw: &[(Token, Span)], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, (tok, _)) in raw[open..].iter().enumerate() {
        match tok {
            Token::LBracket => depth += 1,
            Token::RBracket => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::error::ErrorKind;

    fn kinds(source: &str) -> Vec<ExprToken> {
        tokenize(source).unwrap().into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").unwrap().is_empty());
        assert!(tokenize("   \t").unwrap().is_empty());
    }

    #[test]
    fn test_tokenize_arithmetic() {
        assert_eq!(
            kinds("(a + 2) * b"),
            vec![
                ExprToken::LParen,
                ExprToken::Identifier("a".into()),
                ExprToken::Operator(Operator::Add),
                ExprToken::Number("2".into()),
                ExprToken::RParen,
                ExprToken::Operator(Operator::Mul),
                ExprToken::Identifier("b".into()),
            ]
        );
    }

    #[test]
    fn test_tokenize_word_operators() {
        assert_eq!(
            kinds("a DIV b MOD c / d"),
            vec![
                ExprToken::Identifier("a".into()),
                ExprToken::Operator(Operator::IntDiv),
                ExprToken::Identifier("b".into()),
                ExprToken::Operator(Operator::Mod),
                ExprToken::Identifier("c".into()),
                ExprToken::Operator(Operator::Div),
                ExprToken::Identifier("d".into()),
            ]
        );
    }

    #[test]
    fn test_tokenize_word_operator_inside_identifier() {
        assert_eq!(kinds("MODULUS"), vec![ExprToken::Identifier("MODULUS".into())]);
    }

    #[test]
    fn test_tokenize_indexed_identifier() {
        let tokens = tokenize("arr[i + 1] * 2").unwrap();
        assert_eq!(tokens.len(), 3);
        match &tokens[0] {
            (ExprToken::IndexedIdentifier { name, index }, span) => {
                assert_eq!(name, "arr");
                assert_eq!(index.node, "i + 1");
                assert_eq!(index.span, Span::new(4, 9));
                assert_eq!(*span, Span::new(0, 10));
            }
            other => panic!("expected IndexedIdentifier, got {other:?}"),
        }
    }

    #[test]
    fn test_tokenize_nested_index() {
        let tokens = kinds("a[b[2]]");
        assert_eq!(tokens.len(), 1);
        assert!(matches!(
            &tokens[0],
            ExprToken::IndexedIdentifier { name, index } if name == "a" && index.node == "b[2]"
        ));
    }

    #[test]
    fn test_tokenize_unary_minus() {
        assert_eq!(
            kinds("-3 - -x"),
            vec![
                ExprToken::Operator(Operator::Neg),
                ExprToken::Number("3".into()),
                ExprToken::Operator(Operator::Sub),
                ExprToken::Operator(Operator::Neg),
                ExprToken::Identifier("x".into()),
            ]
        );
        assert_eq!(kinds("(-1)")[1], ExprToken::Operator(Operator::Neg));
    }

    #[test]
    fn test_tokenize_literals() {
        assert_eq!(
            kinds(r#""a+b" 'c' TRUE FALSE 2.5"#),
            vec![
                ExprToken::StringLiteral("a+b".into()),
                ExprToken::CharLiteral('c'),
                ExprToken::Boolean(true),
                ExprToken::Boolean(false),
                ExprToken::Number("2.5".into()),
            ]
        );
    }

    #[test]
    fn test_tokenize_unterminated_string() {
        let err = tokenize(r#"1 + "abc"#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedExpression);
        assert_eq!(err.span, Some(Span::new(4, 8)));
    }

    #[test]
    fn test_tokenize_bracket_errors() {
        assert_eq!(tokenize("arr[1").unwrap_err().kind, ErrorKind::MalformedExpression);
        assert_eq!(tokenize("arr[]").unwrap_err().kind, ErrorKind::MalformedExpression);
        assert_eq!(tokenize("[1]").unwrap_err().kind, ErrorKind::MalformedExpression);
        assert_eq!(tokenize("1]").unwrap_err().kind, ErrorKind::MalformedExpression);
    }

    #[test]
    fn test_tokenize_unexpected_character() {
        let err = tokenize("a ? b").unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedExpression);
        assert!(err.message.contains("unexpected character"));
        assert_eq!(err.span, Some(Span::new(2, 3)));
    }

    #[test]
    fn test_tokenize_spans() {
        let tokens = tokenize("ab DIV 7").unwrap();
        assert_eq!(tokens[0].1, Span::new(0, 2));
        assert_eq!(tokens[1].1, Span::new(3, 6));
        assert_eq!(tokens[2].1, Span::new(7, 8));
    }

    #[test]
    fn test_display_expr_token() {
        let rendered: Vec<String> = kinds("x[i] MOD -2").iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["x[i]", "MOD", "-", "2"]);
    }
}
