//! Statement parser: one source line to one [`Statement`]
//!
//! Spans in the returned statement index the line as given, so the run
//! loop only has to add the line's offset in the file.

use crate::ast::{Bounds, DeclSpec, Span, Spanned, Statement, Target};
use crate::interp::error::{EvalError, EvalResult};
use crate::interp::resolve::parse_number;
use crate::interp::Value;
use crate::lexer::{tokenize, ExprToken, Operator};
use crate::util::is_identifier;


/// Drop a trailing `//` comment. `//` inside a string literal is kept.
pub fn strip_comment(line: &str) -> &str {
    for (pos, c, _) in unquoted(line) {
        if c == '/' && line[pos + 1..].starts_with('/') {
            return &line[..pos];
        }
    }
    line
}

/// Keywords that open a statement
pub const STATEMENT_KEYWORDS: [&str; 4] = ["DECLARE", "CONSTANT", "INPUT", "OUTPUT"];

/// Whether `line` is meant as a statement rather than a bare expression.
pub fn is_statement(line: &str) -> bool {
    let code = strip_comment(line).trim();
    STATEMENT_KEYWORDS
        .iter()
        .any(|keyword| keyword_body(code, keyword).is_some())
        || find_top_level(code, "<-").is_some()
}

/// Parse one line. Blank and comment-only lines yield `None`.
pub fn parse_line(line: &str) -> EvalResult<Option<Spanned<Statement>>> {
    let code = trimmed(strip_comment(line), 0);
    if code.node.is_empty() {
        return Ok(None);
    }
    let (text, base) = (code.node, code.span.start);
    let body_base = |rest: &str| base + text.len() - rest.len();

    let statement = if let Some(rest) = keyword_body(text, "DECLARE") {
        Statement::Declare(parse_declaration(rest, body_base(rest))?)
    } else if let Some(rest) = keyword_body(text, "CONSTANT") {
        let (name, value) = parse_constant(rest, body_base(rest))?;
        Statement::Constant { name, value }
    } else if let Some(rest) = keyword_body(text, "INPUT") {
        Statement::Input {
            target: parse_target(rest, body_base(rest))?,
        }
    } else if let Some(rest) = keyword_body(text, "OUTPUT") {
        Statement::Output {
            exprs: parse_output(rest, body_base(rest))?,
        }
    } else if let Some(arrow) = find_top_level(text, "<-") {
        let expr = trimmed(&text[arrow + 2..], base + arrow + 2);
        if expr.node.is_empty() {
            return Err(EvalError::malformed_statement("`<-` needs an expression on its right")
                .at(Span::new(base + arrow, base + arrow + 2)));
        }
        Statement::Assign {
            target: parse_target(&text[..arrow], base)?,
            expr: expr.map(str::to_string),
        }
    } else {
        return Err(EvalError::malformed_statement(
            "expected DECLARE, CONSTANT, INPUT, OUTPUT or an assignment with `<-`",
        )
        .at(code.span));
    };

    tracing::trace!(?statement, "parsed");
    Ok(Some(Spanned::new(statement, code.span)))
}

/// Parse the body of a `DECLARE` (everything after the keyword).
pub fn parse_declaration(body: &str, base: usize) -> EvalResult<DeclSpec> {
    let whole = trimmed(body, base);
    let Some(colon) = body.find(':') else {
        return Err(EvalError::malformed_statement("expected `<name> : <type>`").at(whole.span));
    };

    let mut names = Vec::new();
    for (offset, part) in split_top_level(&body[..colon], ',') {
        let name = trimmed(part, base + offset);
        if name.node.is_empty() {
            return Err(EvalError::malformed_statement("missing variable name")
                .at(Span::new(base + offset, base + colon)));
        }
        names.push(name.map(str::to_string));
    }

    let rhs = trimmed(&body[colon + 1..], base + colon + 1);
    let (ty, bounds) = match keyword_body(rhs.node, "ARRAY") {
        Some(after) => {
            let after_base = rhs.span.start + rhs.node.len() - after.len();
            let (bounds, rest) = parse_bounds(after, after_base)?;
            let rest = trimmed(rest.node, rest.span.start);
            let Some(ty) = keyword_body(rest.node, "OF") else {
                return Err(EvalError::malformed_statement("expected `OF <type>` after the bounds")
                    .at(rest.span.merge(bounds.span)));
            };
            let ty_base = rest.span.start + rest.node.len() - ty.len();
            (trimmed(ty, ty_base), Some(bounds))
        }
        None => (rhs, None),
    };

    if ty.node.is_empty() {
        return Err(EvalError::malformed_statement("missing type after `:`").at(ty.span));
    }

    Ok(DeclSpec {
        names,
        ty: ty.map(str::to_string),
        bounds,
    })
}

/// `[lower:upper]` followed by the rest of the text
fn parse_bounds(text: &str, base: usize) -> EvalResult<(Spanned<Bounds>, Spanned<&str>)> {
    let open = text.len() - text.trim_start().len();
    if !text[open..].starts_with('[') {
        return Err(EvalError::malformed_statement("expected `[lower:upper]` after ARRAY")
            .at(trimmed(text, base).span));
    }
    let Some(close) = text[open..].find(']').map(|c| open + c) else {
        return Err(EvalError::malformed_statement("expected `]` to close the bounds")
            .at(trimmed(text, base).span));
    };
    let span = Span::new(base + open, base + close + 1);

    let parts: Vec<&str> = text[open + 1..close].split(':').collect();
    let [lower, upper] = parts.as_slice() else {
        return Err(EvalError::malformed_statement("array bounds must be written `[lower:upper]`").at(span));
    };
    let bound = |text: &str| {
        text.trim().parse::<i64>().map_err(|_| {
            EvalError::malformed_statement(format!("array bound `{}` is not an integer", text.trim()))
                .at(span)
        })
    };
    let bounds = Bounds {
        lower: bound(*lower)?,
        upper: bound(*upper)?,
    };
    let rest = Spanned::new(&text[close + 1..], Span::new(base + close + 1, base + text.len()));
    Ok((Spanned::new(bounds, span), rest))
}

/// Parse the body of a `CONSTANT`: `<name> = <literal>`.
pub fn parse_constant(body: &str, base: usize) -> EvalResult<(Spanned<String>, Spanned<Value>)> {
    let Some(eq) = find_top_level(body, "=") else {
        return Err(EvalError::malformed_statement("expected `CONSTANT <name> = <value>`")
            .at(trimmed(body, base).span));
    };
    let name = trimmed(&body[..eq], base);
    let value = trimmed(&body[eq + 1..], base + eq + 1);
    if name.node.is_empty() || value.node.is_empty() {
        return Err(EvalError::malformed_statement("expected `CONSTANT <name> = <value>`")
            .at(Span::new(base, base + body.len())));
    }

    let tokens = tokenize(value.node).map_err(|e| e.shifted(value.span.start))?;
    let literal = match tokens.as_slice() {
        [(ExprToken::Number(n), _)] => parse_number(n),
        [(ExprToken::Operator(Operator::Neg), _), (ExprToken::Number(n), _)] => {
            parse_number(&format!("-{n}"))
        }
        [(ExprToken::StringLiteral(s), _)] => Ok(Value::Str(s.clone())),
        [(ExprToken::CharLiteral(c), _)] => Ok(Value::Char(*c)),
        [(ExprToken::Boolean(b), _)] => Ok(Value::Boolean(*b)),
        _ => Err(EvalError::malformed_statement("a CONSTANT value must be a single literal")),
    }
    .map_err(|e| e.or_at(value.span))?;

    Ok((name.map(str::to_string), Spanned::new(literal, value.span)))
}

/// Parse `name` or `name[index]`.
pub fn parse_target(text: &str, base: usize) -> EvalResult<Spanned<Target>> {
    let t = trimmed(text, base);
    if t.node.is_empty() {
        return Err(EvalError::malformed_statement("missing variable name").at(t.span));
    }

    let target = match t.node.find('[') {
        Some(open) => {
            let name = t.node[..open].trim_end();
            let Some(inner) = t.node[open + 1..].strip_suffix(']') else {
                return Err(EvalError::malformed_statement("expected `]` to close the index").at(t.span));
            };
            let index = trimmed(inner, t.span.start + open + 1);
            if index.node.is_empty() {
                return Err(EvalError::malformed_statement("missing array index").at(t.span));
            }
            check_target_name(name, t.span)?;
            Target::Element {
                name: name.to_string(),
                index: index.map(str::to_string),
            }
        }
        None => {
            check_target_name(t.node, t.span)?;
            Target::Variable(t.node.to_string())
        }
    };
    Ok(Spanned::new(target, t.span))
}

fn check_target_name(name: &str, span: Span) -> EvalResult<()> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(EvalError::malformed_statement(format!("`{name}` is not a valid target")).at(span))
    }
}

fn parse_output(body: &str, base: usize) -> EvalResult<Vec<Spanned<String>>> {
    split_top_level(body, ',')
        .into_iter()
        .map(|(offset, part)| {
            let expr = trimmed(part, base + offset);
            if expr.node.is_empty() {
                Err(EvalError::malformed_statement("OUTPUT needs an expression")
                    .at(Span::new(base + offset, base + offset + part.len())))
            } else {
                Ok(expr.map(str::to_string))
            }
        })
        .collect()
}

/// Text after `keyword` when `text` starts with it as a whole word
pub(crate) fn keyword_body<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(keyword)?;
    match rest.chars().next() {
        Some(c) if c.is_ascii_alphanumeric() || c == '_' => None,
        _ => Some(rest),
    }
}

/// Trim `text`, returning the slice with a span offset by `base`
fn trimmed(text: &str, base: usize) -> Spanned<&str> {
    let lead = text.len() - text.trim_start().len();
    let node = text.trim();
    Spanned::new(node, Span::new(base + lead, base + lead + node.len()))
}

/// Characters outside quotes, with their byte position and bracket depth
fn unquoted(text: &str) -> impl Iterator<Item = (usize, char, isize)> + '_ {
    let mut quote: Option<char> = None;
    let mut depth: isize = 0;
    text.char_indices().filter_map(move |(pos, c)| match (quote, c) {
        (Some(q), _) if c == q => {
            quote = None;
            None
        }
        (Some(_), _) => None,
        (None, '"' | '\'') => {
            quote = Some(c);
            None
        }
        (None, '(' | '[') => {
            depth += 1;
            Some((pos, c, depth))
        }
        (None, ')' | ']') => {
            depth -= 1;
            Some((pos, c, depth))
        }
        (None, _) => Some((pos, c, depth)),
    })
}

/// First `pattern` outside quotes and brackets
fn find_top_level(text: &str, pattern: &str) -> Option<usize> {
    unquoted(text)
        .find(|&(pos, _, depth)| depth == 0 && text[pos..].starts_with(pattern))
        .map(|(pos, _, _)| pos)
}

/// Split on `sep` outside quotes and brackets, keeping each part's offset
fn split_top_level(text: &str, sep: char) -> Vec<(usize, &str)> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (pos, c, depth) in unquoted(text) {
        if c == sep && depth == 0 {
            parts.push((start, &text[start..pos]));
            start = pos + sep.len_utf8();
        }
    }
    parts.push((start, &text[start..]));
    parts
}
