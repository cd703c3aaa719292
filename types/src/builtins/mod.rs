//! Types and type constructors every [`TypeSystem`] starts with.

mod array;
mod enums;
mod generic;
mod int;
mod record;
mod string;
mod tuple;
mod type_variable;
mod variants;

pub use array::{ArrayConstructor, ArrayType};
pub use enums::EnumType;
pub use generic::{GenericConstructor, GenericType};
pub use int::{IntRangeConstructor, IntType};
pub use record::{Field, Optionality, RecordConstructor, RecordType};
pub use string::StringType;
pub use tuple::{TupleConstructor, TupleType};
pub use type_variable::{TypeVariableConstructor, TypeVariableType};
pub use variants::{RecordWithVariantsType, VariantField};

use weft_ident::Identifier;

use crate::{RegisteredTypeId, TypeConstructorArguments, TypeConstructorId, TypeSystem, TypeSystemError};

pub fn int_type_id() -> RegisteredTypeId {
    Identifier::builtin("Int")
}

pub fn string_type_id() -> RegisteredTypeId {
    Identifier::builtin("String")
}

pub fn int_range_constructor_id() -> TypeConstructorId {
    Identifier::builtin("IntRange")
}

pub fn array_constructor_id() -> TypeConstructorId {
    Identifier::builtin("Array")
}

pub fn tuple_constructor_id() -> TypeConstructorId {
    Identifier::builtin("Tuple")
}

pub fn record_constructor_id() -> TypeConstructorId {
    Identifier::builtin("Record")
}

pub fn generic_constructor_id() -> TypeConstructorId {
    Identifier::builtin("Generic")
}

pub fn type_variable_constructor_id() -> TypeConstructorId {
    Identifier::builtin("TypeVar")
}

pub(crate) fn register_builtins(type_system: &mut TypeSystem) {
    let registered = [
        type_system.add_type(int_type_id(), IntType::full()).map(drop),
        type_system.add_type(string_type_id(), StringType).map(drop),
        type_system.add_type_constructor(int_range_constructor_id(), IntRangeConstructor),
        type_system.add_type_constructor(array_constructor_id(), ArrayConstructor),
        type_system.add_type_constructor(tuple_constructor_id(), TupleConstructor),
        type_system.add_type_constructor(record_constructor_id(), RecordConstructor),
        type_system.add_type_constructor(generic_constructor_id(), GenericConstructor),
        type_system.add_type_constructor(type_variable_constructor_id(), TypeVariableConstructor),
    ];
    for result in registered {
        result.expect("Bug: built-in registered twice");
    }
}

/// Check the arity of a constructor application.
pub(crate) fn expect_arity(
    constructor: &TypeConstructorId,
    arguments: &TypeConstructorArguments,
    num_type_arguments: Option<usize>,
    num_value_arguments: usize,
) -> Result<(), TypeSystemError> {
    if let Some(expected) = num_type_arguments {
        if arguments.type_arguments.len() != expected {
            return Err(TypeSystemError::invalid_arguments(
                constructor,
                format!(
                    "expected {expected} type arguments, got {}",
                    arguments.type_arguments.len()
                ),
            ));
        }
    }
    if arguments.value_arguments.len() != num_value_arguments {
        return Err(TypeSystemError::invalid_arguments(
            constructor,
            format!(
                "expected {num_value_arguments} value arguments, got {}",
                arguments.value_arguments.len()
            ),
        ));
    }
    Ok(())
}

/// Read value argument `index` as an integer.
pub(crate) fn int_argument(
    constructor: &TypeConstructorId,
    arguments: &TypeConstructorArguments,
    index: usize,
) -> Result<i64, TypeSystemError> {
    arguments
        .value_arguments
        .get(index)
        .and_then(|value| value.as_int())
        .ok_or_else(|| {
            TypeSystemError::invalid_arguments(constructor, format!("value argument {index} must be an int"))
        })
}

pub(crate) fn size_argument(
    constructor: &TypeConstructorId,
    arguments: &TypeConstructorArguments,
    index: usize,
) -> Result<usize, TypeSystemError> {
    let value = int_argument(constructor, arguments, index)?;
    usize::try_from(value).map_err(|_| {
        TypeSystemError::invalid_arguments(constructor, format!("value argument {index} must not be negative"))
    })
}
