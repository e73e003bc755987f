//! Error types and reporting

use crate::interp::error::EvalError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Failure outside a single line's evaluation
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Script rejected before any line runs
    #[error("invalid script: {message}")]
    InvalidScript { message: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_script(message: impl Into<String>) -> Self {
        Self::InvalidScript {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

fn build_report<'a>(
    filename: &'a str,
    source_len: usize,
    error: &EvalError,
    color: bool,
) -> ariadne::Report<'a, (&'a str, std::ops::Range<usize>)> {
    use ariadne::{Color, Config, Label, Report, ReportKind};

    let title = error.kind.title();
    let config = Config::default().with_color(color);

    match error.span {
        Some(span) => {
            // Clamp so a span past the end of the text still renders.
            let end = span.end.min(source_len);
            let range = span.start.min(end)..end;
            let label = Label::new((filename, range.clone())).with_message(&error.message);
            let label = if color { label.with_color(Color::Red) } else { label };
            Report::build(ReportKind::Error, (filename, range))
                .with_config(config)
                .with_message(title)
                .with_label(label)
                .finish()
        }
        None => Report::build(ReportKind::Error, (filename, 0..0))
            .with_config(config)
            .with_message(format!("{title}: {}", error.message))
            .finish(),
    }
}

/// Report error with ariadne on stderr
pub fn report_error(filename: &str, source: &str, error: &EvalError, color: bool) -> std::io::Result<()> {
    build_report(filename, source.len(), error, color)
        .eprint((filename, ariadne::Source::from(source)))
}

/// Render the same report into a string
pub fn render_error(filename: &str, source: &str, error: &EvalError, color: bool) -> String {
    let mut buf = Vec::new();
    let written = build_report(filename, source.len(), error, color)
        .write((filename, ariadne::Source::from(source)), &mut buf);
    match written {
        Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
        Err(_) => format!("error: {error}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Span;
    use crate::interp::error::ErrorKind;

    #[test]
    fn test_render_error_with_span() {
        let source = "DECLARE x : INTEGER\nx <- y\n";
        let error = EvalError::undeclared_variable("y", "").at(Span::new(25, 26));
        let rendered = render_error("demo.pseudo", source, &error, false);
        assert!(rendered.contains("undeclared variable"));
        assert!(rendered.contains("`y` is not declared"));
        assert!(rendered.contains("demo.pseudo"));
    }

    #[test]
    fn test_render_error_without_span() {
        let error = EvalError::new(ErrorKind::Io, "I/O error: broken pipe");
        let rendered = render_error("demo.pseudo", "", &error, false);
        assert!(rendered.contains("broken pipe"));
    }

    #[test]
    fn test_render_error_span_past_end() {
        let error = EvalError::malformed_statement("bad").at(Span::new(10, 40));
        let rendered = render_error("demo.pseudo", "OUTPUT", &error, false);
        assert!(rendered.contains("malformed statement"));
    }

    #[test]
    fn test_error_display() {
        let err = Error::io("missing.pseudo", std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(err.to_string().starts_with("cannot read `missing.pseudo`"));
        assert_eq!(
            Error::invalid_script("expected a .pseudo file").to_string(),
            "invalid script: expected a .pseudo file"
        );
        let eval: Error = EvalError::division_by_zero().into();
        assert_eq!(eval.to_string(), "division by zero");
    }
}
