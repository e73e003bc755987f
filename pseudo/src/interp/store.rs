//! Typed variable, array and constant store

use super::error::{EvalError, EvalResult};
use super::value::{DataType, Value};
use crate::util::{find_similar_name, format_suggestion_hint, is_identifier};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Largest number of slots a single array may declare
pub const MAX_ARRAY_LEN: i128 = 1 << 20;

/// Array slots the whole store may hold at once
pub const MAX_STORE_SLOTS: i128 = 1 << 22;

/// How writes are checked against a slot's declared type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypePolicy {
    /// Coerce by [`DataType::accept`], reject the rest with `TypeMismatch`
    #[default]
    Strict,
    /// Store whatever value arrives
    Permissive,
}

/// A plain variable or a constant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalarEntry {
    /// `None` for constants, whose type is implied by their literal
    #[serde(rename = "type")]
    pub declared_type: Option<DataType>,
    pub value: Value,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_constant: bool,
}

/// A fixed-bound one-dimensional array
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayEntry {
    #[serde(rename = "type")]
    pub element_type: DataType,
    pub lower_bound: i64,
    pub upper_bound: i64,
    pub elements: Vec<Value>,
}

impl ArrayEntry {
    /// Physical slot for logical `index`, if it lies within the bounds
    pub fn offset(&self, index: i64) -> Option<usize> {
        if index < self.lower_bound || index > self.upper_bound {
            return None;
        }
        usize::try_from(i128::from(index) - i128::from(self.lower_bound)).ok()
    }

    fn out_of_bounds(&self, name: &str, index: i64) -> EvalError {
        EvalError::index_out_of_bounds(name, index, self.lower_bound, self.upper_bound)
    }
}

/// One name's record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Entry {
    Scalar(ScalarEntry),
    Array(ArrayEntry),
}

impl Entry {
    pub fn is_constant(&self) -> bool {
        matches!(self, Entry::Scalar(ScalarEntry { is_constant: true, .. }))
    }
}

/// Owner of every declared name for the lifetime of a run
#[derive(Debug, Clone, Default)]
pub struct ValueStore {
    entries: HashMap<String, Entry>,
    policy: TypePolicy,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: TypePolicy) -> Self {
        ValueStore {
            entries: HashMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> TypePolicy {
        self.policy
    }

    /// Declare (or redeclare) a scalar with an uninitialized value.
    pub fn declare_scalar(&mut self, name: &str, type_name: &str) -> EvalResult<()> {
        self.check_declarable(name)?;
        let ty = parse_type(type_name)?;
        tracing::debug!(name, %ty, "declare scalar");
        self.entries.insert(
            name.to_string(),
            Entry::Scalar(ScalarEntry {
                declared_type: Some(ty),
                value: Value::Uninitialized,
                is_constant: false,
            }),
        );
        Ok(())
    }

    /// Declare (or redeclare) an array of `upper - lower + 1` uninitialized slots.
    pub fn declare_array(
        &mut self,
        name: &str,
        type_name: &str,
        lower: i64,
        upper: i64,
    ) -> EvalResult<()> {
        self.check_declarable(name)?;
        if lower > upper {
            return Err(EvalError::invalid_bounds(lower, upper));
        }
        let ty = parse_type(type_name)?;
        self.check_array_capacity(&[name], lower, upper)?;
        let len = i128::from(upper) - i128::from(lower) + 1;
        tracing::debug!(name, %ty, lower, upper, "declare array");
        self.entries.insert(
            name.to_string(),
            Entry::Array(ArrayEntry {
                element_type: ty,
                lower_bound: lower,
                upper_bound: upper,
                elements: vec![Value::Uninitialized; len as usize],
            }),
        );
        Ok(())
    }

    /// Bind `name` to a literal for the rest of the run.
    pub fn declare_constant(&mut self, name: &str, value: Value) -> EvalResult<()> {
        if !is_identifier(name) {
            return Err(EvalError::invalid_name(name));
        }
        if self.entries.get(name).is_some_and(Entry::is_constant) {
            return Err(EvalError::constant_redeclared(name));
        }
        if !value.is_initialized() {
            return Err(EvalError::uninitialized(&format!("constant `{name}`")));
        }
        tracing::debug!(name, %value, "declare constant");
        self.entries.insert(
            name.to_string(),
            Entry::Scalar(ScalarEntry {
                declared_type: None,
                value,
                is_constant: true,
            }),
        );
        Ok(())
    }

    /// Current value of a scalar; may be [`Value::Uninitialized`].
    pub fn get_scalar(&self, name: &str) -> EvalResult<&Value> {
        match self.lookup(name)? {
            Entry::Scalar(scalar) => Ok(&scalar.value),
            Entry::Array(_) => Err(EvalError::array_without_index(name)),
        }
    }

    pub fn set_scalar(&mut self, name: &str, value: Value) -> EvalResult<()> {
        let policy = self.policy;
        let scalar = match self.lookup_mut(name)? {
            Entry::Scalar(scalar) => scalar,
            Entry::Array(_) => return Err(EvalError::array_without_index(name)),
        };
        if scalar.is_constant {
            return Err(EvalError::assign_to_constant(name));
        }
        let value = match scalar.declared_type {
            Some(ty) => coerce(policy, ty, value)?,
            None => value,
        };
        tracing::debug!(name, %value, "set scalar");
        scalar.value = value;
        Ok(())
    }

    /// Element at logical `index`; may be [`Value::Uninitialized`].
    pub fn get_element(&self, name: &str, index: i64) -> EvalResult<&Value> {
        let array = self.array(name)?;
        let offset = array.offset(index).ok_or_else(|| array.out_of_bounds(name, index))?;
        Ok(&array.elements[offset])
    }

    pub fn set_element(&mut self, name: &str, index: i64, value: Value) -> EvalResult<()> {
        let policy = self.policy;
        let array = match self.lookup_mut(name)? {
            Entry::Array(array) => array,
            Entry::Scalar(_) => return Err(EvalError::not_an_array(name)),
        };
        let offset = array.offset(index).ok_or_else(|| array.out_of_bounds(name, index))?;
        let value = coerce(policy, array.element_type, value)?;
        tracing::debug!(name, index, %value, "set element");
        array.elements[offset] = value;
        Ok(())
    }

    /// Declared type of a scalar that may be written.
    pub fn scalar_type(&self, name: &str) -> EvalResult<DataType> {
        match self.lookup(name)? {
            Entry::Scalar(ScalarEntry {
                declared_type: Some(ty),
                is_constant: false,
                ..
            }) => Ok(*ty),
            Entry::Scalar(_) => Err(EvalError::assign_to_constant(name)),
            Entry::Array(_) => Err(EvalError::array_without_index(name)),
        }
    }

    pub fn array(&self, name: &str) -> EvalResult<&ArrayEntry> {
        match self.lookup(name)? {
            Entry::Array(array) => Ok(array),
            Entry::Scalar(_) => Err(EvalError::not_an_array(name)),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries ordered by name, for dumps
    pub fn snapshot(&self) -> BTreeMap<&str, &Entry> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v)).collect()
    }

    fn lookup(&self, name: &str) -> EvalResult<&Entry> {
        self.entries.get(name).ok_or_else(|| self.undeclared(name))
    }

    fn lookup_mut(&mut self, name: &str) -> EvalResult<&mut Entry> {
        if !self.entries.contains_key(name) {
            return Err(self.undeclared(name));
        }
        self.entries
            .get_mut(name)
            .ok_or_else(|| EvalError::undeclared_variable(name, ""))
    }

    fn undeclared(&self, name: &str) -> EvalError {
        let suggestion = find_similar_name(name, self.entries.keys().map(String::as_str), 2);
        EvalError::undeclared_variable(name, &format_suggestion_hint(suggestion))
    }

    /// Check that arrays `[lower:upper]` named `names` fit the slot limits.
    ///
    /// Arrays being redeclared give their current slots back first.
    pub fn check_array_capacity(&self, names: &[&str], lower: i64, upper: i64) -> EvalResult<()> {
        let len = i128::from(upper) - i128::from(lower) + 1;
        if len > MAX_ARRAY_LEN {
            return Err(EvalError::too_many_slots(format!(
                "array of {len} elements exceeds the limit of {MAX_ARRAY_LEN}"
            )));
        }
        let kept: i128 = self
            .entries
            .iter()
            .filter(|(name, _)| !names.contains(&name.as_str()))
            .map(|(_, entry)| match entry {
                Entry::Array(array) => array.elements.len() as i128,
                Entry::Scalar(_) => 0,
            })
            .sum();
        let wanted = kept + len * names.len() as i128;
        if wanted > MAX_STORE_SLOTS {
            return Err(EvalError::too_many_slots(format!(
                "arrays would hold {wanted} elements in total; the limit is {MAX_STORE_SLOTS}"
            )));
        }
        Ok(())
    }

    /// Fail the way a `DECLARE` of `name` would, without declaring it.
    pub fn check_declarable(&self, name: &str) -> EvalResult<()> {
        if !is_identifier(name) {
            return Err(EvalError::invalid_name(name));
        }
        if self.entries.get(name).is_some_and(Entry::is_constant) {
            return Err(EvalError::duplicate_name(name));
        }
        Ok(())
    }
}

fn parse_type(type_name: &str) -> EvalResult<DataType> {
    type_name
        .parse()
        .map_err(|()| EvalError::invalid_type(type_name))
}

fn coerce(policy: TypePolicy, ty: DataType, value: Value) -> EvalResult<Value> {
    if !value.is_initialized() {
        return Err(EvalError::uninitialized("value"));
    }
    match policy {
        TypePolicy::Permissive => Ok(value),
        TypePolicy::Strict => ty
            .accept(value)
            .map_err(|rejected| EvalError::type_mismatch(ty.keyword(), rejected.type_name())),
    }
}
