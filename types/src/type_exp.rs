//! Type expressions: descriptions of types that the [`TypeSystem`] resolves.
//!
//! A type expression is either the id of a registered type, or a type
//! constructor applied to type arguments and value arguments. Expressions are
//! plain data: cheap to clone, comparable, hashable and serializable.

use alloc::{string::String, sync::Arc, vec::Vec};
use core::{fmt, marker::PhantomData};

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, MapAccess, Visitor},
    ser::SerializeMap,
};
use weft_ident::Identifier;

use crate::{
    ResolvedType, TypeSystem, TypeSystemError, ValueHolder, builtins,
    traversal::{HasFreeTypeVariables, SubstituteTypeVariables, drive_fold},
};

pub type RegisteredTypeId = Identifier;
pub type TypeConstructorId = Identifier;

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeExp {
    /// Names no type.
    #[default]
    Null,
    Registered(RegisteredTypeId),
    Constructed(TypeConstructorId, Arc<TypeConstructorArguments>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeConstructorArguments {
    pub type_arguments: Vec<TypeExp>,
    pub value_arguments: Vec<ValueHolder>,
}

impl TypeExp {
    pub fn registered(id: RegisteredTypeId) -> Self {
        Self::Registered(id)
    }

    pub fn constructed(
        constructor: TypeConstructorId,
        type_arguments: Vec<TypeExp>,
        value_arguments: Vec<ValueHolder>,
    ) -> Self {
        Self::Constructed(
            constructor,
            Arc::new(TypeConstructorArguments {
                type_arguments,
                value_arguments,
            }),
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn registered_id(&self) -> Option<&RegisteredTypeId> {
        match self {
            Self::Registered(id) => Some(id),
            _ => None,
        }
    }

    pub fn constructor_id(&self) -> Option<&TypeConstructorId> {
        match self {
            Self::Constructed(id, _) => Some(id),
            _ => None,
        }
    }

    pub fn arguments(&self) -> Option<&TypeConstructorArguments> {
        match self {
            Self::Constructed(_, arguments) => Some(arguments),
            _ => None,
        }
    }

    pub fn type_arguments(&self) -> &[TypeExp] {
        self.arguments().map_or(&[], |a| &a.type_arguments)
    }

    pub fn value_arguments(&self) -> &[ValueHolder] {
        self.arguments().map_or(&[], |a| &a.value_arguments)
    }

    pub fn resolve(&self, type_system: &TypeSystem) -> Result<ResolvedType, TypeSystemError> {
        type_system.resolve(self)
    }

    pub fn try_resolve(&self, type_system: &TypeSystem) -> Option<ResolvedType> {
        type_system.try_resolve(self)
    }

    /// Whether this expression applies the generic type constructor.
    pub fn is_generic(&self) -> bool {
        self.constructor_id() == Some(&builtins::generic_constructor_id())
    }

    /// `(level, index)` if this expression is a type variable.
    ///
    /// `level` counts how many generic types to skip, walking outwards, to
    /// reach the one the variable belongs to. `index` selects a variable of
    /// that generic type.
    pub fn type_variable_data(&self) -> Option<(usize, usize)> {
        let Self::Constructed(id, arguments) = self else {
            return None;
        };
        if *id != builtins::type_variable_constructor_id() {
            return None;
        }
        match arguments.value_arguments.as_slice() {
            [level, index] => {
                let level = usize::try_from(level.as_int()?).ok()?;
                let index = usize::try_from(index.as_int()?).ok()?;
                Some((level, index))
            }
            _ => None,
        }
    }

    /// Number of generic types nested along the wrapped-type spine of this
    /// expression: `Generic(Generic(Int))` has level 2, `Int` level 0.
    pub fn generic_type_level(&self) -> usize {
        let mut level = 0;
        let mut current = self;
        while current.is_generic() {
            level += 1;
            match current.type_arguments().first() {
                Some(wrapped) => current = wrapped,
                None => break,
            }
        }
        level
    }

    /// Replace the type variables that refer to a generic type directly
    /// enclosing this expression with `assignments`, by index. Null or missing
    /// assignments leave their variable in place.
    pub fn substitute_type_variables(&self, assignments: &[TypeExp]) -> TypeExp {
        match drive_fold(self.clone(), SubstituteTypeVariables { assignments }) {
            Ok(exp) => exp,
            Err(never) => match never {},
        }
    }

    /// Whether some type variable in this expression refers to a generic type
    /// outside it.
    pub fn has_free_type_variables(&self) -> bool {
        match drive_fold(self.clone(), HasFreeTypeVariables) {
            Ok(free) => free,
            Err(never) => match never {},
        }
    }

    /// Human readable name, using the format of each type constructor.
    ///
    /// Never fails: anything that cannot be named shows as
    /// [`MALFORMED_TYPE_EXP`](crate::format::MALFORMED_TYPE_EXP).
    pub fn to_string_with(&self, type_system: &TypeSystem) -> String {
        match self {
            Self::Null => "Null".into(),
            Self::Registered(id) => id.as_str().into(),
            Self::Constructed(id, arguments) => match type_system.try_get_type_constructor(id) {
                Some(constructor) => constructor.type_name(type_system, arguments),
                None => crate::format::MALFORMED_TYPE_EXP.into(),
            },
        }
    }
}

/// Structural rendering that needs no type system.
impl fmt::Display for TypeExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Registered(id) => write!(f, "{id}"),
            Self::Constructed(id, arguments) => {
                write!(f, "{id}<")?;
                for (i, argument) in arguments.type_arguments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{argument}")?;
                }
                f.write_str(">[")?;
                for (i, argument) in arguments.value_arguments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{argument}")?;
                }
                f.write_str("]")
            }
        }
    }
}

const TYPE_ID_KEY: &str = "typeId";
const TYPE_CONSTRUCTOR_ID_KEY: &str = "typeConstructorId";
const TYPE_ARGUMENTS_KEY: &str = "typeArguments";
const VALUE_ARGUMENTS_KEY: &str = "valueArguments";

impl Serialize for TypeExp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_map(Some(0))?.end(),
            Self::Registered(id) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(TYPE_ID_KEY, id)?;
                map.end()
            }
            Self::Constructed(id, arguments) => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry(TYPE_CONSTRUCTOR_ID_KEY, id)?;
                map.serialize_entry(TYPE_ARGUMENTS_KEY, &arguments.type_arguments)?;
                map.serialize_entry(VALUE_ARGUMENTS_KEY, &arguments.value_arguments)?;
                map.end()
            }
        }
    }
}

struct TypeExpVisitor(PhantomData<TypeExp>);

impl<'de> Visitor<'de> for TypeExpVisitor {
    type Value = TypeExp;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a type expression")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<TypeExp, A::Error> {
        let mut type_id: Option<Identifier> = None;
        let mut constructor_id: Option<Identifier> = None;
        let mut type_arguments: Vec<TypeExp> = Vec::new();
        let mut value_arguments: Vec<ValueHolder> = Vec::new();
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                TYPE_ID_KEY => type_id = Some(map.next_value()?),
                TYPE_CONSTRUCTOR_ID_KEY => constructor_id = Some(map.next_value()?),
                TYPE_ARGUMENTS_KEY => type_arguments = map.next_value()?,
                VALUE_ARGUMENTS_KEY => value_arguments = map.next_value()?,
                other => {
                    return Err(de::Error::unknown_field(
                        other,
                        &[TYPE_ID_KEY, TYPE_CONSTRUCTOR_ID_KEY, TYPE_ARGUMENTS_KEY, VALUE_ARGUMENTS_KEY],
                    ));
                }
            }
        }
        match (type_id, constructor_id) {
            (None, None) => Ok(TypeExp::Null),
            (Some(id), None) => Ok(TypeExp::Registered(id)),
            (None, Some(id)) => Ok(TypeExp::constructed(id, type_arguments, value_arguments)),
            (Some(_), Some(_)) => Err(de::Error::custom(
                "a type expression has either a typeId or a typeConstructorId",
            )),
        }
    }
}

impl<'de> Deserialize<'de> for TypeExp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TypeExpVisitor(PhantomData))
    }
}
