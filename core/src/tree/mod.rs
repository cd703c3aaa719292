//! A live tree of nodes mirroring the structure of a typed value.
//!
//! Every compound value in the tree gets one node per child, recursively.
//! Nodes live in an arena and refer to their owner by [`NodeId`], so a node
//! keeps its id for as long as the child it mirrors exists, across any number
//! of updates. Updates go through reconciliation (see [`ValueTree::
//! reconcile_changes_and_synchronize_children`]), which records on every node
//! whether its value or its structure changed.

mod reconcile;

use indexmap::IndexMap;
use slotmap::{SlotMap, new_key_type};
use weft_types::{
    ModelError, Path, PathStep, ResolvedType, TypeExp, TypeSystem, TypeSystemError, ValueHolder,
};

use crate::{Changes, TreeOptions};

new_key_type! {
    /// Stable handle to a node of a [`ValueTree`].
    pub struct NodeId;
}

#[derive(Debug, Clone)]
pub struct ValueTreeNode {
    type_exp: TypeExp,
    value: ValueHolder,
    owner: Option<NodeId>,
    /// In the order the node's type enumerates them.
    children: IndexMap<PathStep, NodeId>,
    changes: Changes,
}

impl ValueTreeNode {
    fn new(type_exp: TypeExp, value: ValueHolder, owner: Option<NodeId>) -> Self {
        Self {
            type_exp,
            value,
            owner,
            children: IndexMap::new(),
            changes: Changes::NOTHING_CHANGED,
        }
    }

    pub fn type_exp(&self) -> &TypeExp {
        &self.type_exp
    }

    pub fn value(&self) -> &ValueHolder {
        &self.value
    }

    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }

    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    pub fn changes(&self) -> Changes {
        self.changes
    }
}

#[derive(Debug, Clone)]
pub struct ValueTree {
    nodes: SlotMap<NodeId, ValueTreeNode>,
    root: NodeId,
    options: TreeOptions,
}

impl ValueTree {
    /// A tree holding the default value of `type_exp`.
    pub fn new(type_system: &TypeSystem, type_exp: TypeExp) -> Result<Self, TypeSystemError> {
        let value = type_system.resolve(&type_exp)?.create_value(type_system)?;
        Self::with_value(type_system, type_exp, value)
    }

    /// A tree holding `value`, which must be valid for `type_exp`.
    pub fn with_value(
        type_system: &TypeSystem,
        type_exp: TypeExp,
        value: ValueHolder,
    ) -> Result<Self, TypeSystemError> {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(ValueTreeNode::new(type_exp, value, None));
        let mut tree = Self {
            nodes,
            root,
            options: TreeOptions::default(),
        };
        tree.initialize_children(type_system, root)?;
        Ok(tree)
    }

    pub fn with_options(mut self, options: TreeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &TreeOptions {
        &self.options
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_value(&self) -> &ValueHolder {
        &self.nodes[self.root].value
    }

    /// Panics if `id` is not a node of this tree.
    pub fn node(&self, id: NodeId) -> &ValueTreeNode {
        &self.nodes[id]
    }

    pub fn try_node(&self, id: NodeId) -> Option<&ValueTreeNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn type_exp(&self, id: NodeId) -> &TypeExp {
        &self.nodes[id].type_exp
    }

    pub fn value(&self, id: NodeId) -> &ValueHolder {
        &self.nodes[id].value
    }

    pub fn owner(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].owner
    }

    pub fn resolve_type(&self, type_system: &TypeSystem, id: NodeId) -> Result<ResolvedType, TypeSystemError> {
        type_system.resolve(&self.nodes[id].type_exp)
    }

    pub fn num_children(&self, id: NodeId) -> usize {
        self.nodes[id].children.len()
    }

    pub fn get_child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.nodes[id].children.get_index(index).map(|(_, child)| *child)
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = (&PathStep, NodeId)> {
        self.nodes[id].children.iter().map(|(step, child)| (step, *child))
    }

    pub fn get_child_from_step(&self, id: NodeId, step: &PathStep) -> Result<NodeId, ModelError> {
        self.try_get_child_from_step(id, step)
            .ok_or_else(|| ModelError::NoSuchChild(step.clone()))
    }

    /// Exact lookup first; an unresolved field identifier then matches a
    /// resolved one.
    pub fn try_get_child_from_step(&self, id: NodeId, step: &PathStep) -> Option<NodeId> {
        let children = &self.nodes[id].children;
        children.get(step).copied().or_else(|| {
            children
                .iter()
                .find(|(candidate, _)| candidate.matches(step))
                .map(|(_, child)| *child)
        })
    }

    /// The step under which `owner` holds `child`.
    ///
    /// Panics if `child` is not a child of `owner`.
    pub fn get_step_to_child(&self, owner: NodeId, child: NodeId) -> &PathStep {
        self.nodes[owner]
            .children
            .iter()
            .find(|(_, candidate)| **candidate == child)
            .map(|(step, _)| step)
            .expect("Bug: child not found in owner")
    }

    pub fn path_from_root(&self, id: NodeId) -> Path {
        let mut steps = Vec::new();
        let mut current = id;
        while let Some(owner) = self.nodes[current].owner {
            steps.push(self.get_step_to_child(owner, current).clone());
            current = owner;
        }
        steps.reverse();
        Path::from_steps(steps)
    }

    pub fn follow(&self, path: &Path) -> Result<NodeId, ModelError> {
        self.follow_from(self.root, path)
    }

    pub fn try_follow(&self, path: &Path) -> Option<NodeId> {
        self.follow(path).ok()
    }

    pub fn follow_from(&self, start: NodeId, path: &Path) -> Result<NodeId, ModelError> {
        let mut current = start;
        for (i, step) in path.iter().enumerate() {
            current = self
                .try_get_child_from_step(current, step)
                .ok_or_else(|| ModelError::PathNotFound {
                    path: path.clone(),
                    step: i,
                })?;
        }
        Ok(current)
    }

    /// Nodes of the subtree at `id`, parents before children.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            out.push(current);
            pending.extend(self.nodes[current].children.values().rev().copied());
        }
        out
    }

    pub fn changes(&self, id: NodeId) -> Changes {
        self.nodes[id].changes
    }

    pub fn is_changed(&self, id: NodeId, changes: Changes) -> bool {
        self.nodes[id].changes.intersects(changes)
    }

    /// Record `changes` on `id` and its owners. Stops at the first node that
    /// already has all of them.
    pub fn set_changed(&mut self, id: NodeId, changes: Changes) {
        let mut current = Some(id);
        while let Some(id) = current {
            let node = &mut self.nodes[id];
            if node.changes.contains(changes) {
                break;
            }
            node.changes |= changes;
            current = node.owner;
        }
    }

    /// Forget the changes of `id` and everything below it.
    pub fn clear_changes(&mut self, id: NodeId) {
        for node in self.subtree(id) {
            self.nodes[node].changes = Changes::NOTHING_CHANGED;
        }
    }

    pub fn clear_all_changes(&mut self) {
        for node in self.nodes.values_mut() {
            node.changes = Changes::NOTHING_CHANGED;
        }
    }

    /// Create the nodes for every child of `id`, recursively.
    fn initialize_children(&mut self, type_system: &TypeSystem, id: NodeId) -> Result<(), TypeSystemError> {
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            let ty = self.resolve_type(type_system, id)?;
            let Some(compound) = ty.as_compound() else {
                continue;
            };
            let value = self.nodes[id].value.clone();
            let num_children = compound.num_children(&value);
            let mut children = IndexMap::with_capacity(num_children);
            for index in 0..num_children {
                let (child_value, step, child_type) = compound.child(&value, index);
                let child = self
                    .nodes
                    .insert(ValueTreeNode::new(child_type, child_value.clone(), Some(id)));
                children.insert(step, child);
                pending.push(child);
            }
            self.nodes[id].children = children;
        }
        Ok(())
    }

    fn add_child(
        &mut self,
        type_system: &TypeSystem,
        owner: NodeId,
        type_exp: TypeExp,
        value: ValueHolder,
    ) -> Result<NodeId, TypeSystemError> {
        let child = self
            .nodes
            .insert(ValueTreeNode::new(type_exp, value, Some(owner)));
        self.initialize_children(type_system, child)?;
        Ok(child)
    }

    fn remove_subtree(&mut self, id: NodeId) {
        for node in self.subtree(id) {
            self.nodes.remove(node);
        }
    }
}

static_assertions::assert_impl_all!(ValueTree: Send, Sync);

#[cfg(test)]
mod reconcile_test;
