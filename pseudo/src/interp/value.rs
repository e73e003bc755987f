//! Runtime values and the five declarable types

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Primitive type named in a `DECLARE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    Integer,
    Real,
    Char,
    String,
    Boolean,
}

impl DataType {
    pub const ALL: [DataType; 5] = [
        DataType::Integer,
        DataType::Real,
        DataType::Char,
        DataType::String,
        DataType::Boolean,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::Real => "REAL",
            DataType::Char => "CHAR",
            DataType::String => "STRING",
            DataType::Boolean => "BOOLEAN",
        }
    }

    /// Coerce `value` into a slot of this type under the strict write policy.
    ///
    /// INTEGER widens into REAL, CHAR into STRING, and a one-character STRING
    /// narrows into CHAR. Everything else must match exactly.
    pub fn accept(self, value: Value) -> Result<Value, Value> {
        match (self, value) {
            (DataType::Integer, v @ Value::Integer(_)) => Ok(v),
            (DataType::Real, v @ Value::Real(_)) => Ok(v),
            (DataType::Real, Value::Integer(n)) => Ok(Value::Real(n as f64)),
            (DataType::Char, v @ Value::Char(_)) => Ok(v),
            (DataType::Char, Value::Str(s)) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Value::Char(c)),
                    _ => Err(Value::Str(s)),
                }
            }
            (DataType::String, v @ Value::Str(_)) => Ok(v),
            (DataType::String, Value::Char(c)) => Ok(Value::Str(c.to_string())),
            (DataType::Boolean, v @ Value::Boolean(_)) => Ok(v),
            (_, other) => Err(other),
        }
    }

    /// Convert one line of console input into a value of this type.
    pub fn parse_input(self, text: &str) -> Option<Value> {
        match self {
            DataType::Integer => text.trim().parse().ok().map(Value::Integer),
            DataType::Real => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|x| x.is_finite())
                .map(Value::Real),
            DataType::Char => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Value::Char(c)),
                    _ => None,
                }
            }
            DataType::String => Some(Value::Str(text.to_string())),
            DataType::Boolean => match text.trim() {
                "TRUE" => Some(Value::Boolean(true)),
                "FALSE" => Some(Value::Boolean(false)),
                _ => None,
            },
        }
    }
}

impl FromStr for DataType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::ALL
            .into_iter()
            .find(|ty| ty.keyword() == s)
            .ok_or(())
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Runtime value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Real(f64),
    Char(char),
    Str(String),
    Boolean(bool),
    /// Every declared slot starts here; never produced by evaluation
    Uninitialized,
}

impl Value {
    /// Runtime type, or `None` for an uninitialized slot
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Integer(_) => Some(DataType::Integer),
            Value::Real(_) => Some(DataType::Real),
            Value::Char(_) => Some(DataType::Char),
            Value::Str(_) => Some(DataType::String),
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::Uninitialized => None,
        }
    }

    /// Type name for error messages
    pub fn type_name(&self) -> &'static str {
        self.data_type().map_or("uninitialized", DataType::keyword)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Real(_))
    }

    pub fn is_initialized(&self) -> bool {
        !matches!(self, Value::Uninitialized)
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(x) => Some(*x),
            Value::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::Real(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{x:.1}"),
            Value::Real(x) => write!(f, "{x}"),
            Value::Char(c) => write!(f, "{c}"),
            Value::Str(s) => f.write_str(s),
            Value::Boolean(true) => f.write_str("TRUE"),
            Value::Boolean(false) => f.write_str("FALSE"),
            Value::Uninitialized => f.write_str("<uninitialized>"),
        }
    }
}
