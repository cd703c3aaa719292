use crate::{
    SubtypeOrder, Type, TypeExp, TypeSystem, TypeSystemError, Value, ValueHolder,
    builtins::string_type_id,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringType;

impl StringType {
    pub fn type_exp() -> TypeExp {
        TypeExp::Registered(string_type_id())
    }
}

impl Type for StringType {
    fn create_value(&self, _: &TypeSystem) -> Result<ValueHolder, TypeSystemError> {
        Ok(Value::String(Default::default()).into())
    }

    fn is_valid_value(&self, _: &TypeSystem, value: &ValueHolder) -> bool {
        value.as_string().is_some()
    }

    fn compare_subtype_helper(&self, _: &TypeSystem, other: &dyn Type) -> Option<SubtypeOrder> {
        other.as_string().map(|_| SubtypeOrder::IsEquivalent)
    }

    fn as_string(&self) -> Option<&StringType> {
        Some(self)
    }
}
