//! Live value trees with change tracking, and the processors built on them.
//!
//! A [`ValueTree`] mirrors a typed value as a tree of nodes. Writing a new
//! value reconciles the tree: nodes for children that still exist keep their
//! [`NodeId`], and every node records whether its value or its structure
//! changed until [`ValueTree::clear_changes`] is called.

// This works on std and no_std and is harmless.
extern crate alloc;

mod changes;
mod options;

pub mod generics;
pub mod instance;
pub mod processor;
pub mod tree;

pub use changes::Changes;
pub use instance::{Instance, InstanceMut};
pub use options::{PathReconciliation, ProcessorOptions, TreeOptions};
pub use processor::{EntryContext, EntryFailure, EntryProcessor, ParallelProcessor, ProcessError};
pub use tree::{NodeId, ValueTree, ValueTreeNode};

/// Test utilities for enabling logging in tests
#[cfg(test)]
pub mod test_utils {
    /// Initialize tracing subscriber for tests with DEBUG level
    /// Call this at the start of tests where you want to see logging output
    pub fn init_test_logging() {
        use tracing_subscriber::{EnvFilter, fmt};

        // Try to initialize, ignore error if already initialized
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }
}
