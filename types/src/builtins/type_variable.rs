use alloc::{sync::Arc, vec::Vec};

use crate::{
    ResolvedType, Type, TypeConstructor, TypeConstructorArguments, TypeExp, TypeSystem,
    TypeSystemError, Value, ValueHolder,
    builtins::{expect_arity, size_argument, type_variable_constructor_id},
};

/// Placeholder for a type chosen later through a generic type's assignments.
///
/// `level` says how many enclosing generic types to skip to reach the one
/// that owns the variable; `index` picks one of its variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeVariableType {
    level: usize,
    index: usize,
}

impl TypeVariableType {
    pub fn type_exp(level: usize, index: usize) -> TypeExp {
        TypeExp::constructed(
            type_variable_constructor_id(),
            Vec::new(),
            alloc::vec![
                Value::Int(level as i64).into(),
                Value::Int(index as i64).into(),
            ],
        )
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl Type for TypeVariableType {
    fn create_value(&self, _: &TypeSystem) -> Result<ValueHolder, TypeSystemError> {
        Ok(Value::TypeVariable.into())
    }

    fn is_valid_value(&self, _: &TypeSystem, value: &ValueHolder) -> bool {
        matches!(**value, Value::TypeVariable)
    }

    fn as_type_variable(&self) -> Option<&TypeVariableType> {
        Some(self)
    }
}

#[derive(Debug)]
pub struct TypeVariableConstructor;

impl TypeConstructor for TypeVariableConstructor {
    fn construct(
        &self,
        _: &TypeSystem,
        arguments: &TypeConstructorArguments,
        _: &[ResolvedType],
    ) -> Result<ResolvedType, TypeSystemError> {
        let id = type_variable_constructor_id();
        expect_arity(&id, arguments, Some(0), 2)?;
        Ok(Arc::new(TypeVariableType {
            level: size_argument(&id, arguments, 0)?,
            index: size_argument(&id, arguments, 1)?,
        }))
    }

    fn format(&self) -> &str {
        "T[1]"
    }
}
