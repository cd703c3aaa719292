//! The traits every resolved type implements.

use alloc::{string::String, sync::Arc, vec::Vec};
use core::fmt;

use crate::{
    PathStep, SubtypeOrder, TypeConstructorArguments, TypeExp, TypeSystem, TypeSystemError,
    ValueHolder,
    builtins::{
        ArrayType, EnumType, GenericType, IntType, RecordType, RecordWithVariantsType, StringType,
        TupleType, TypeVariableType,
    },
    format::format_type_name,
};

/// A type after resolution, shared by everyone who resolved the same
/// expression.
pub type ResolvedType = Arc<dyn Type>;

/// A set of values, with a default value.
///
/// The `as_*` methods give access to the concrete built-in type behind a
/// resolved type, for callers that need its specific operations.
pub trait Type: fmt::Debug + Send + Sync {
    fn create_value(&self, type_system: &TypeSystem) -> Result<ValueHolder, TypeSystemError>;

    fn is_valid_value(&self, type_system: &TypeSystem, value: &ValueHolder) -> bool;

    /// How this type relates to `other`, if this type knows.
    ///
    /// The type system asks both sides, so a type only needs to handle the
    /// pairs it understands.
    fn compare_subtype_helper(
        &self,
        _type_system: &TypeSystem,
        _other: &dyn Type,
    ) -> Option<SubtypeOrder> {
        None
    }

    fn as_compound(&self) -> Option<&dyn CompoundType> {
        None
    }

    fn as_int(&self) -> Option<&IntType> {
        None
    }

    fn as_string(&self) -> Option<&StringType> {
        None
    }

    fn as_enum(&self) -> Option<&EnumType> {
        None
    }

    fn as_array(&self) -> Option<&ArrayType> {
        None
    }

    fn as_tuple(&self) -> Option<&TupleType> {
        None
    }

    fn as_record(&self) -> Option<&RecordType> {
        None
    }

    fn as_record_with_variants(&self) -> Option<&RecordWithVariantsType> {
        None
    }

    fn as_generic(&self) -> Option<&GenericType> {
        None
    }

    fn as_type_variable(&self) -> Option<&TypeVariableType> {
        None
    }
}

/// A type whose values have children.
///
/// Children are enumerated by index; each comes with the step that reaches it
/// and its type. The enumeration order is fixed by the type, but which
/// children exist may depend on the value (array size, active fields).
pub trait CompoundType: Type {
    fn num_children(&self, value: &ValueHolder) -> usize;

    /// Panics if `index` is out of range.
    fn child<'v>(&self, value: &'v ValueHolder, index: usize) -> (&'v ValueHolder, PathStep, TypeExp);

    /// Like [`CompoundType::child`], but unshares `value` first so the child
    /// can be modified.
    fn child_non_const<'v>(
        &self,
        value: &'v mut ValueHolder,
        index: usize,
    ) -> (&'v mut ValueHolder, PathStep, TypeExp);

    fn child_index_from_step(&self, value: &ValueHolder, step: &PathStep) -> Option<usize>;

    /// Whether two values differ in something other than their children.
    fn are_different_non_recursively(&self, _a: &ValueHolder, _b: &ValueHolder) -> bool {
        false
    }

    /// Whether two values have a different shape for reasons their children
    /// do not show, such as a different selected tag.
    fn are_structurally_different_non_recursively(&self, _a: &ValueHolder, _b: &ValueHolder) -> bool {
        false
    }
}

/// Builds types from arguments.
pub trait TypeConstructor: fmt::Debug + Send + Sync {
    /// `resolved` holds the resolution of each type argument, in order.
    fn construct(
        &self,
        type_system: &TypeSystem,
        arguments: &TypeConstructorArguments,
        resolved: &[ResolvedType],
    ) -> Result<ResolvedType, TypeSystemError>;

    /// Template for [`TypeConstructor::type_name`], see [`crate::format`].
    fn format(&self) -> &str;

    fn type_name(&self, type_system: &TypeSystem, arguments: &TypeConstructorArguments) -> String {
        let type_arguments: Vec<String> = arguments
            .type_arguments
            .iter()
            .map(|argument| argument.to_string_with(type_system))
            .collect();
        let value_arguments: Vec<String> = arguments
            .value_arguments
            .iter()
            .map(|argument| argument.to_string())
            .collect();
        format_type_name(self.format(), &type_arguments, &value_arguments)
    }
}
