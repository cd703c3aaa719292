use alloc::{collections::BTreeSet, vec::Vec};

use weft_ident::Identifier;

use crate::{SubtypeOrder, Type, TypeSystem, TypeSystemError, Value, ValueHolder};

/// One of a fixed, ordered list of identifiers.
///
/// Enums are registered by id; related enums (a sub-enum holding some of the
/// values of another) are declared with [`TypeSystem::add_related_types`] or
/// discovered by comparing value sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    values: Vec<Identifier>,
    default_index: usize,
}

impl EnumType {
    /// Panics if `values` is empty or `default_index` is out of range.
    pub fn new(values: Vec<Identifier>, default_index: usize) -> Self {
        assert!(
            default_index < values.len(),
            "default index {default_index} out of range for {} enum values",
            values.len()
        );
        Self {
            values,
            default_index,
        }
    }

    pub fn values(&self) -> &[Identifier] {
        &self.values
    }

    pub fn default_index(&self) -> usize {
        self.default_index
    }

    pub fn index_of(&self, value: &Identifier) -> Option<usize> {
        self.values.iter().position(|v| v.matches(value))
    }

    fn value_set(&self) -> BTreeSet<&Identifier> {
        self.values.iter().collect()
    }
}

impl Type for EnumType {
    fn create_value(&self, _: &TypeSystem) -> Result<ValueHolder, TypeSystemError> {
        Ok(Value::Enum(self.values[self.default_index].clone()).into())
    }

    fn is_valid_value(&self, _: &TypeSystem, value: &ValueHolder) -> bool {
        value.as_enum().is_some_and(|id| self.values.contains(id))
    }

    fn compare_subtype_helper(&self, _: &TypeSystem, other: &dyn Type) -> Option<SubtypeOrder> {
        let other = other.as_enum()?;
        Some(SubtypeOrder::of_sets(&self.value_set(), &other.value_set()))
    }

    fn as_enum(&self) -> Option<&EnumType> {
        Some(self)
    }
}
