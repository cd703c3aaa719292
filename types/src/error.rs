use thiserror::Error;
use weft_ident::{Identifier, IdentifierError};

use crate::{Path, PathStep};

/// Failure to turn a type expression into a type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeSystemError {
    #[error("the null type expression does not name a type")]
    NullTypeExp,

    #[error("unknown type `{0}`")]
    UnknownType(Identifier),

    #[error("unknown type constructor `{0}`")]
    UnknownTypeConstructor(Identifier),

    #[error("type `{0}` is already registered")]
    DuplicateType(Identifier),

    #[error("type constructor `{0}` is already registered")]
    DuplicateTypeConstructor(Identifier),

    #[error("invalid arguments for type constructor `{constructor}`: {message}")]
    InvalidArguments {
        constructor: Identifier,
        message: String,
    },
}

impl TypeSystemError {
    pub(crate) fn invalid_arguments(constructor: &Identifier, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            constructor: constructor.clone(),
            message: message.into(),
        }
    }
}

/// Failure of an operation on values, paths or value trees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("path `{path}` does not lead anywhere (failed at step {step})")]
    PathNotFound { path: Path, step: usize },

    #[error("no child at step `{0}`")]
    NoSuchChild(PathStep),

    #[error("cannot parse path `{0}`")]
    InvalidPath(String),

    #[error("value {value} is not valid for type {type_exp}")]
    InvalidValue { value: String, type_exp: String },

    #[error("expected {expected}, found {found}")]
    WrongKind {
        expected: &'static str,
        found: String,
    },

    #[error("array size {size} is outside the range {min}..={max}")]
    ArraySizeOutOfRange { size: usize, min: usize, max: usize },

    #[error("array index {index} is out of range for size {size}")]
    ArrayIndexOutOfRange { index: usize, size: usize },

    #[error("record has no field `{0}`")]
    UnknownField(Identifier),

    #[error("field `{0}` is not optional")]
    NotOptional(Identifier),

    #[error("unknown tag `{0}`")]
    UnknownTag(Identifier),

    #[error("{given} type assignments given for {num_variables} type variables")]
    TooManyTypeAssignments { given: usize, num_variables: usize },

    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    #[error(transparent)]
    TypeSystem(#[from] TypeSystemError),
}
