//! Bringing a subtree of nodes in line with a new value.

use alloc::collections::BTreeMap;
use core::cmp::Ordering;

use tracing::{debug, trace};
use weft_types::{ModelError, Path, PathStep, TypeExp, TypeSystem, TypeSystemError, ValueHolder};

use super::{NodeId, ValueTree};
use crate::{Changes, PathReconciliation};

/// One key of a merge-join over two ordered maps.
enum Merged<A, B> {
    Removed(A),
    Added(PathStep, B),
    Kept(PathStep, A, B),
}

fn merge_join<A, B>(current: BTreeMap<PathStep, A>, other: BTreeMap<PathStep, B>) -> Vec<Merged<A, B>> {
    let mut merged = Vec::with_capacity(current.len().max(other.len()));
    let mut current = current.into_iter().peekable();
    let mut other = other.into_iter().peekable();
    loop {
        let ordering = match (current.peek(), other.peek()) {
            (None, None) => break,
            (Some((a, _)), Some((b, _))) => a.cmp(b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
        };
        let next = match ordering {
            Ordering::Less => current.next().map(|(_, a)| Merged::Removed(a)),
            Ordering::Greater => other.next().map(|(step, b)| Merged::Added(step, b)),
            Ordering::Equal => current
                .next()
                .zip(other.next())
                .map(|((step, a), (_, b))| Merged::Kept(step, a, b)),
        };
        merged.extend(next);
    }
    merged
}

/// A child as enumerated from a new value.
struct Incoming {
    index: usize,
    value: ValueHolder,
    type_exp: TypeExp,
}

impl ValueTree {
    /// Replace the value of `id`, then reconcile.
    ///
    /// The new value is written into the root value at the node's path, and
    /// only the nodes along that path are revisited on the way down. The
    /// subtree at `id` itself is reconciled in full.
    pub fn set_value(
        &mut self,
        type_system: &TypeSystem,
        id: NodeId,
        value: ValueHolder,
    ) -> Result<(), ModelError> {
        let ty = self.resolve_type(type_system, id)?;
        if !ty.is_valid_value(type_system, &value) {
            return Err(ModelError::InvalidValue {
                value: value.to_string(),
                type_exp: self.type_exp(id).to_string_with(type_system),
            });
        }
        let path = self.path_from_root(id);
        let root = self.root;
        let mut root_value = self.nodes[root].value.clone();
        let (slot, _) = path.follow_value_mut(type_system, &self.nodes[root].type_exp, &mut root_value)?;
        *slot = value;
        debug!(%path, "set value");
        self.reconcile_changes_and_synchronize_children_at_path(type_system, root, &root_value, &path, 0)?;
        Ok(())
    }

    /// Make the subtree at `id` mirror `new_value`.
    ///
    /// Children present in both the old and the new value keep their node ids.
    /// `new_value` must be a value of the node's type, or of the type the node
    /// has after a change of type-variable assignments above it.
    pub fn reconcile_changes_and_synchronize_children(
        &mut self,
        type_system: &TypeSystem,
        id: NodeId,
        new_value: &ValueHolder,
    ) -> Result<(), TypeSystemError> {
        let ty = self.resolve_type(type_system, id)?;
        let mut changes = Changes::NOTHING_CHANGED;

        if let Some(compound) = ty.as_compound() {
            let current: BTreeMap<PathStep, NodeId> = self.nodes[id]
                .children
                .iter()
                .map(|(step, child)| (step.clone(), *child))
                .collect();
            let num_children = compound.num_children(new_value);
            let mut other = BTreeMap::new();
            for index in 0..num_children {
                let (value, step, type_exp) = compound.child(new_value, index);
                other.insert(
                    step,
                    Incoming {
                        index,
                        value: value.clone(),
                        type_exp,
                    },
                );
            }

            let mut assembled = Vec::with_capacity(num_children);
            for merged in merge_join(current, other) {
                match merged {
                    Merged::Removed(child) => {
                        changes |= Changes::STRUCTURE_CHANGED;
                        self.remove_subtree(child);
                    }
                    Merged::Added(step, incoming) => {
                        trace!(%step, "child added");
                        changes |= Changes::STRUCTURE_CHANGED;
                        let child = self.add_child(type_system, id, incoming.type_exp, incoming.value)?;
                        assembled.push((incoming.index, step, child));
                    }
                    Merged::Kept(step, child, incoming) => {
                        let node = &mut self.nodes[child];
                        if node.type_exp != incoming.type_exp {
                            trace!(%step, "child changed type");
                            node.type_exp = incoming.type_exp;
                            changes |= Changes::STRUCTURE_CHANGED;
                            self.reconcile_changes_and_synchronize_children(type_system, child, &incoming.value)?;
                        } else if !node.value.is_shared_with(&incoming.value) {
                            self.reconcile_changes_and_synchronize_children(type_system, child, &incoming.value)?;
                        }
                        assembled.push((incoming.index, step, child));
                    }
                }
            }
            assembled.sort_unstable_by_key(|(index, _, _)| *index);
            self.nodes[id].children = assembled
                .into_iter()
                .map(|(_, step, child)| (step, child))
                .collect();

            if compound.are_structurally_different_non_recursively(&self.nodes[id].value, new_value) {
                trace!("shape changed");
                changes |= Changes::STRUCTURE_CHANGED;
            }
            if changes.is_empty()
                && compound.are_different_non_recursively(&self.nodes[id].value, new_value)
            {
                changes |= Changes::VALUE_CHANGED;
            }
        } else {
            let stale: Vec<NodeId> = self.nodes[id].children.drain(..).map(|(_, child)| child).collect();
            if !stale.is_empty() {
                changes |= Changes::STRUCTURE_CHANGED;
                for child in stale {
                    self.remove_subtree(child);
                }
            }
            if changes.is_empty() && self.nodes[id].value != *new_value {
                changes |= Changes::VALUE_CHANGED;
            }
        }

        self.nodes[id].value = new_value.clone();
        if !changes.is_empty() {
            debug!(?changes, "node reconciled");
            self.set_changed(id, changes);
        }
        Ok(())
    }

    /// Like [`ValueTree::reconcile_changes_and_synchronize_children`], but only
    /// the child named by each step of `path` from `path_index` on is revisited.
    ///
    /// With [`PathReconciliation::TrustCaller`], children off the path are
    /// assumed to be unchanged and are not compared. Once the path ends, the
    /// remaining subtree is reconciled in full.
    pub fn reconcile_changes_and_synchronize_children_at_path(
        &mut self,
        type_system: &TypeSystem,
        id: NodeId,
        new_value: &ValueHolder,
        path: &Path,
        path_index: usize,
    ) -> Result<(), TypeSystemError> {
        if path_index >= path.num_steps()
            || self.options.path_reconciliation == PathReconciliation::VerifyAll
        {
            return self.reconcile_changes_and_synchronize_children(type_system, id, new_value);
        }

        let ty = self.resolve_type(type_system, id)?;
        let step = path.step(path_index);
        let located = ty.as_compound().and_then(|compound| {
            let child = self.try_get_child_from_step(id, step)?;
            let index = compound.child_index_from_step(new_value, step)?;
            let (value, _, type_exp) = compound.child(new_value, index);
            Some((child, value.clone(), type_exp))
        });
        let Some((child, child_value, child_type)) = located else {
            debug_assert!(false, "Bug: step `{step}` of `{path}` not found during reconciliation");
            return self.reconcile_changes_and_synchronize_children(type_system, id, new_value);
        };

        self.nodes[id].value = new_value.clone();
        if self.nodes[child].type_exp != child_type {
            self.nodes[child].type_exp = child_type;
            self.set_changed(id, Changes::STRUCTURE_CHANGED);
            return self.reconcile_changes_and_synchronize_children(type_system, child, &child_value);
        }
        self.reconcile_changes_and_synchronize_children_at_path(
            type_system,
            child,
            &child_value,
            path,
            path_index + 1,
        )
    }
}
