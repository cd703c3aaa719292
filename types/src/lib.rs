//! Values, paths and the type system they are checked against.
//!
//! A [`TypeExp`] describes a type; a [`TypeSystem`] resolves it into a
//! [`Type`] that knows how to create, validate and take apart values. Values
//! are immutable and shared through [`ValueHolder`]; a [`Path`] addresses a
//! value inside another one.
//!
//! # Example
//!
//! ```
//! use weft_types::{Path, TypeSystem, builtins::{ArrayType, IntType}};
//!
//! let ts = TypeSystem::new();
//! let exp = ArrayType::type_exp(IntType::type_exp(), 1, 16, 3);
//! let value = ts.resolve(&exp).unwrap().create_value(&ts).unwrap();
//!
//! let path: Path = "2".parse().unwrap();
//! let (entry, entry_type) = path.follow_value(&ts, &exp, &value).unwrap();
//! assert_eq!(entry.as_int(), Some(0));
//! assert_eq!(entry_type, IntType::type_exp());
//! ```

extern crate alloc;

pub mod builtins;
pub mod format;
pub mod traversal;

mod error;
mod path;
mod subtype;
mod ty;
mod type_exp;
mod type_system;
mod value;

pub use error::{ModelError, TypeSystemError};
pub use path::{ArrayIndex, PATH_DELIMITER, Path, PathStep};
pub use subtype::SubtypeOrder;
pub use ty::{CompoundType, ResolvedType, Type, TypeConstructor};
pub use type_exp::{RegisteredTypeId, TypeConstructorArguments, TypeConstructorId, TypeExp};
pub use type_system::TypeSystem;
pub use value::{GenericValue, RecordValue, Value, ValueHolder};

pub use weft_ident::{Identifier, IdentifierError};
