//! Statement execution
//!
//! `declare`, `assign` and `input` are the store-mutating entry points used
//! by the run loop. Each one evaluates everything it needs before the first
//! write, so a failing statement leaves its target untouched.

use super::concat::evaluate;
use super::error::{ErrorKind, EvalError, EvalResult};
use super::resolve::evaluate_index;
use super::store::ValueStore;
use super::value::{DataType, Value};
use crate::ast::{DeclSpec, Spanned, Statement, Target};
use crate::parser::{keyword_body, parse_constant, parse_declaration, parse_line, parse_target};
use std::io::{BufRead, Write};

/// Apply one `DECLARE` or `CONSTANT` statement.
///
/// Text without a leading keyword is read as a `DECLARE` body, so both
/// `DECLARE x : INTEGER` and `x : INTEGER` work.
pub fn declare(spec: &str, store: &mut ValueStore) -> EvalResult<()> {
    let text = spec.trim_start();
    let base = spec.len() - text.len();
    let body_base = |body: &str| base + text.len() - body.len();

    if let Some(body) = keyword_body(text, "CONSTANT") {
        let (name, value) = parse_constant(body, body_base(body))?;
        define_constant(&name, value, store)
    } else {
        let body = keyword_body(text, "DECLARE").unwrap_or(text);
        let decl = parse_declaration(body, body_base(body))?;
        declare_names(&decl, store)
    }
}

/// Evaluate `expr` and write it to `target` (`name` or `name[index]`).
pub fn assign(target: &str, expr: &str, store: &mut ValueStore) -> EvalResult<()> {
    let target = parse_target(target, 0)?;
    let value = evaluate(expr, store)?;
    write_target(&target, value, store)
}

/// Convert one line of input by the target's declared type and store it.
pub fn input(target: &str, line: &str, store: &mut ValueStore) -> EvalResult<()> {
    store_input(&parse_target(target, 0)?, line, store)
}

fn declare_names(decl: &DeclSpec, store: &mut ValueStore) -> EvalResult<()> {
    // Reject the whole statement before declaring any of its names.
    for name in &decl.names {
        store.check_declarable(&name.node).map_err(|e| e.at(name.span))?;
    }
    if let Some(bounds) = &decl.bounds
        && bounds.node.lower <= bounds.node.upper
    {
        let names: Vec<&str> = decl.names.iter().map(|n| n.node.as_str()).collect();
        store
            .check_array_capacity(&names, bounds.node.lower, bounds.node.upper)
            .map_err(|e| e.at(bounds.span))?;
    }
    for name in &decl.names {
        let declared = match &decl.bounds {
            Some(bounds) => {
                store.declare_array(&name.node, &decl.ty.node, bounds.node.lower, bounds.node.upper)
            }
            None => store.declare_scalar(&name.node, &decl.ty.node),
        };
        declared.map_err(|e| {
            let span = match (e.kind, &decl.bounds) {
                (ErrorKind::InvalidType, _) => decl.ty.span,
                (ErrorKind::InvalidBounds, Some(bounds)) => bounds.span,
                _ => name.span,
            };
            e.or_at(span)
        })?;
    }
    Ok(())
}

fn define_constant(
    name: &Spanned<String>,
    value: Spanned<Value>,
    store: &mut ValueStore,
) -> EvalResult<()> {
    store
        .declare_constant(&name.node, value.node)
        .map_err(|e| e.or_at(name.span))
}

/// Evaluate an expression whose span indexes the enclosing line.
fn evaluate_in_line(expr: &Spanned<String>, store: &ValueStore) -> EvalResult<Value> {
    evaluate(&expr.node, store).map_err(|e| e.shifted(expr.span.start).or_at(expr.span))
}

fn write_target(target: &Spanned<Target>, value: Value, store: &mut ValueStore) -> EvalResult<()> {
    Slot::locate(target, store)?
        .write(value, store)
        .map_err(|e| e.or_at(target.span))
}

/// A write destination whose index has already been evaluated
#[derive(Debug, Clone, Copy, PartialEq)]
enum Slot<'a> {
    Scalar(&'a str),
    Element(&'a str, i64),
}

impl<'a> Slot<'a> {
    fn locate(target: &'a Spanned<Target>, store: &ValueStore) -> EvalResult<Slot<'a>> {
        match &target.node {
            Target::Variable(name) => Ok(Slot::Scalar(name)),
            Target::Element { name, index } => Ok(Slot::Element(name, evaluate_index(index, store)?)),
        }
    }

    fn data_type(self, store: &ValueStore) -> EvalResult<DataType> {
        match self {
            Slot::Scalar(name) => store.scalar_type(name),
            Slot::Element(name, index) => {
                // Bounds are checked here so INPUT fails before consuming a line.
                store.get_element(name, index)?;
                Ok(store.array(name)?.element_type)
            }
        }
    }

    fn write(self, value: Value, store: &mut ValueStore) -> EvalResult<()> {
        match self {
            Slot::Scalar(name) => store.set_scalar(name, value),
            Slot::Element(name, index) => store.set_element(name, index, value),
        }
    }
}

fn input_slot<'a>(
    target: &'a Spanned<Target>,
    store: &ValueStore,
) -> EvalResult<(Slot<'a>, DataType)> {
    let slot = Slot::locate(target, store)?;
    let ty = slot.data_type(store).map_err(|e| e.or_at(target.span))?;
    Ok((slot, ty))
}

fn store_input(target: &Spanned<Target>, line: &str, store: &mut ValueStore) -> EvalResult<()> {
    let (slot, ty) = input_slot(target, store)?;
    let value = ty.parse_input(line).ok_or_else(|| {
        EvalError::invalid_input(format!(
            "`{line}` is not a valid {ty} value for `{}`",
            target.node
        ))
        .at(target.span)
    })?;
    slot.write(value, store).map_err(|e| e.or_at(target.span))
}

/// A failed line, with its span rebased onto the whole source
#[derive(Debug, Clone)]
pub struct LineError {
    /// 1-based line number
    pub line: usize,
    pub error: EvalError,
}

/// Totals for one [`Interpreter::run`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub lines: usize,
    pub executed: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Line-by-line executor over a store, an input and an output
pub struct Interpreter<R, W> {
    store: ValueStore,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Interpreter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self::with_store(ValueStore::new(), input, output)
    }

    pub fn with_store(store: ValueStore, input: R, output: W) -> Self {
        Interpreter {
            store,
            input,
            output,
        }
    }

    pub fn store(&self) -> &ValueStore {
        &self.store
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Run every line of `source`.
    ///
    /// A failing line is handed to `on_error` and execution carries on with
    /// the next one.
    pub fn run<F>(&mut self, source: &str, mut on_error: F) -> RunSummary
    where
        F: FnMut(LineError),
    {
        let mut summary = RunSummary::default();
        let mut offset = 0;

        for (number, raw) in source.split_inclusive('\n').enumerate() {
            let line = raw.trim_end_matches(['\n', '\r']);
            summary.lines += 1;
            match self.execute_line(line) {
                Ok(true) => summary.executed += 1,
                Ok(false) => {}
                Err(error) => {
                    tracing::debug!(line = number + 1, %error, "line failed");
                    summary.failed += 1;
                    on_error(LineError {
                        line: number + 1,
                        error: error.shifted(offset),
                    });
                }
            }
            offset += raw.len();
        }

        tracing::debug!(?summary, "run finished");
        summary
    }

    /// Parse and execute one line. Returns `false` for blank and comment lines.
    pub fn execute_line(&mut self, line: &str) -> EvalResult<bool> {
        match parse_line(line)? {
            Some(statement) => {
                self.execute(&statement)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn execute(&mut self, statement: &Spanned<Statement>) -> EvalResult<()> {
        tracing::debug!(keyword = statement.node.keyword(), span = %statement.span, "execute");
        match &statement.node {
            Statement::Declare(decl) => declare_names(decl, &mut self.store),
            Statement::Constant { name, value } => {
                define_constant(name, value.clone(), &mut self.store)
            }
            Statement::Assign { target, expr } => {
                let value = evaluate_in_line(expr, &self.store)?;
                write_target(target, value, &mut self.store)
            }
            Statement::Input { target } => self.read_into(target),
            Statement::Output { exprs } => self.write_values(exprs),
        }
    }

    fn read_into(&mut self, target: &Spanned<Target>) -> EvalResult<()> {
        // Fail on the target before a line is consumed.
        input_slot(target, &self.store)?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| EvalError::io(&e).at(target.span))?;
        if read == 0 {
            return Err(EvalError::invalid_input(format!("no input left for `{}`", target.node))
                .at(target.span));
        }

        store_input(target, line.trim_end_matches(['\n', '\r']), &mut self.store)
    }

    fn write_values(&mut self, exprs: &[Spanned<String>]) -> EvalResult<()> {
        let mut text = String::new();
        for expr in exprs {
            text.push_str(&evaluate_in_line(expr, &self.store)?.to_string());
        }
        writeln!(self.output, "{text}")
            .and_then(|()| self.output.flush())
            .map_err(|e| EvalError::io(&e))
    }
}
