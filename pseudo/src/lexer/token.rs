//! Raw lexemes recognised inside an expression

use logos::Logos;

/// Raw token produced by logos before indexed identifiers are grouped
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    // Word operators and literals; whole words only, so `DIVISOR` stays an identifier
    #[token("DIV")]
    Div,
    #[token("MOD")]
    Mod,
    #[token("TRUE")]
    True,
    #[token("FALSE")]
    False,

    #[regex(r"[0-9]+(\.[0-9]+)?", |lex| lex.slice().to_owned())]
    Number(String),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_owned())]
    Ident(String),

    #[regex(r#""[^"]*""#, |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_owned()
    })]
    StringLit(String),

    /// Opening quote with no closing quote before the end of input
    #[regex(r#""[^"]*"#)]
    UnterminatedString,

    #[regex(r"'[^']'", |lex| lex.slice().chars().nth(1))]
    CharLit(char),

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Div => write!(f, "DIV"),
            Token::Mod => write!(f, "MOD"),
            Token::True => write!(f, "TRUE"),
            Token::False => write!(f, "FALSE"),
            Token::Number(n) => write!(f, "{n}"),
            Token::Ident(s) => write!(f, "{s}"),
            Token::StringLit(s) => write!(f, "\"{s}\""),
            Token::UnterminatedString => write!(f, "\""),
            Token::CharLit(c) => write!(f, "'{c}'"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
        }
    }
}
