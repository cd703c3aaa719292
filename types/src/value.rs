//! Immutable values shared between owners.
//!
//! Every value lives behind a [`ValueHolder`], a reference-counted handle.
//! Cloning a holder is cheap and two trees may share a holder freely. A holder
//! is only modified through [`ValueHolder::copy_contents_and_get_non_const`],
//! which first unshares the contents if anyone else can see them.

use alloc::{collections::BTreeMap, string::String, sync::Arc, vec::Vec};
use core::{fmt, ops::Deref};

use serde::{Deserialize, Serialize};
use weft_ident::Identifier;

use crate::TypeExp;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    String(String),
    Enum(Identifier),
    Array(Vec<ValueHolder>),
    Tuple(Vec<ValueHolder>),
    Record(RecordValue),
    Generic(GenericValue),
    /// Stands in for a value whose type is a still unassigned type variable.
    TypeVariable,
}

/// Active fields of a record, plus the selected tag for records with variants.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordValue {
    pub fields: BTreeMap<Identifier, ValueHolder>,
    pub tag: Option<Identifier>,
}

impl RecordValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tag(tag: Identifier) -> Self {
        Self {
            fields: BTreeMap::new(),
            tag: Some(tag),
        }
    }

    pub fn get(&self, field: &Identifier) -> Option<&ValueHolder> {
        self.fields.get(field)
    }

    pub fn get_mut(&mut self, field: &Identifier) -> Option<&mut ValueHolder> {
        self.fields.get_mut(field)
    }

    pub fn insert(&mut self, field: Identifier, value: ValueHolder) {
        self.fields.insert(field, value);
    }

    pub fn contains(&self, field: &Identifier) -> bool {
        self.fields.contains_key(field)
    }
}

/// A value of a generic type: the current assignment of each type variable,
/// plus the wrapped value, which has the instantiated type.
///
/// An assignment of [`TypeExp::Null`] leaves that variable unassigned.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GenericValue {
    pub type_assignments: Vec<TypeExp>,
    pub value: ValueHolder,
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&Identifier> {
        match self {
            Value::Enum(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ValueHolder]> {
        match self {
            Value::Array(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<ValueHolder>> {
        match self {
            Value::Array(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[ValueHolder]> {
        match self {
            Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_tuple_mut(&mut self) -> Option<&mut Vec<ValueHolder>> {
        match self {
            Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordValue> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_record_mut(&mut self) -> Option<&mut RecordValue> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_generic(&self) -> Option<&GenericValue> {
        match self {
            Value::Generic(generic) => Some(generic),
            _ => None,
        }
    }

    pub fn as_generic_mut(&mut self) -> Option<&mut GenericValue> {
        match self {
            Value::Generic(generic) => Some(generic),
            _ => None,
        }
    }

    /// Short name of the kind of value, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::String(_) => "string",
            Value::Enum(_) => "enum",
            Value::Array(_) => "array",
            Value::Tuple(_) => "tuple",
            Value::Record(_) => "record",
            Value::Generic(_) => "generic",
            Value::TypeVariable => "type variable",
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[ValueHolder]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::String(s) => write!(f, "\"{}\"", s.escape_debug()),
            Value::Enum(id) => write!(f, "{id}"),
            Value::Array(entries) => {
                f.write_str("[")?;
                write_list(f, entries)?;
                f.write_str("]")
            }
            Value::Tuple(items) => {
                f.write_str("(")?;
                write_list(f, items)?;
                f.write_str(")")
            }
            Value::Record(record) => {
                if let Some(tag) = &record.tag {
                    write!(f, "{tag}")?;
                }
                f.write_str("{")?;
                for (i, (field, value)) in record.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{field}: {value}")?;
                }
                f.write_str("}")
            }
            Value::Generic(generic) => {
                f.write_str("<")?;
                for (i, assignment) in generic.type_assignments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{assignment}")?;
                }
                write!(f, ">{}", generic.value)
            }
            Value::TypeVariable => f.write_str("?"),
        }
    }
}

/// Shared handle to an immutable [`Value`].
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueHolder(Arc<Value>);

impl ValueHolder {
    pub fn new(value: Value) -> Self {
        Self(Arc::new(value))
    }

    /// Mutable access to the contents, cloning them first if this holder
    /// shares them with anyone.
    pub fn copy_contents_and_get_non_const(&mut self) -> &mut Value {
        Arc::make_mut(&mut self.0)
    }

    /// Whether both holders point at the same allocation.
    pub fn is_shared_with(&self, other: &ValueHolder) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for ValueHolder {
    type Target = Value;

    fn deref(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for ValueHolder {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for ValueHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for ValueHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}
