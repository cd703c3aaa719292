//! Weft - typed value trees with change tracking
//!
//! # Overview
//!
//! Weft models structured data as values checked against an extensible type
//! system, and mirrors a value as a tree of nodes that survive edits. Every
//! edit is reconciled against the tree: nodes whose child still exists keep
//! their identity, and each node records whether its value or its structure
//! changed, so that consumers only revisit what changed.
//!
//! - [`weft_ident`]: interned identifiers with discriminators.
//! - [`weft_types`]: values, paths, type expressions and the type system.
//! - [`weft_core`]: value trees, reconciliation, generics and parallel
//!   processing.
//!
//! # Quick Start
//!
//! ```
//! use weft::{Changes, Identifier, InstanceMut, TypeSystem, ValueTree};
//! use weft::builtins::{ArrayType, Field, IntType, RecordType};
//!
//! let ts = TypeSystem::new();
//! let exp = RecordType::constructed_exp(vec![
//!     Field::new(Identifier::new("x").unwrap(), IntType::type_exp()),
//!     Field::new(
//!         Identifier::new("arr").unwrap(),
//!         ArrayType::type_exp(IntType::type_exp(), 1, 16, 3),
//!     ),
//! ]);
//! let mut tree = ValueTree::new(&ts, exp).unwrap();
//! let x = tree.follow(&"x".parse().unwrap()).unwrap();
//!
//! InstanceMut::root(&ts, &mut tree)
//!     .field("arr")
//!     .unwrap()
//!     .set_array_size(5)
//!     .unwrap();
//!
//! assert!(tree.is_changed(tree.root(), Changes::STRUCTURE_CHANGED));
//! assert_eq!(tree.changes(x), Changes::NOTHING_CHANGED);
//! ```

pub use weft_core::{
    self, Changes, EntryContext, EntryFailure, EntryProcessor, Instance, InstanceMut, NodeId,
    ParallelProcessor, PathReconciliation, ProcessError, ProcessorOptions, TreeOptions, ValueTree,
    ValueTreeNode, generics,
};
pub use weft_ident::{self, Authority, Identifier, IdentifierError, IdentifierRegistry};
pub use weft_types::{
    self, CompoundType, ModelError, Path, PathStep, ResolvedType, SubtypeOrder, Type,
    TypeConstructor, TypeExp, TypeSystem, TypeSystemError, Value, ValueHolder, builtins,
};
