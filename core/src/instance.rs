//! Typed access to the nodes of a [`ValueTree`].
//!
//! An [`Instance`] reads, an [`InstanceMut`] writes. Both are thin handles over
//! a `(tree, node)` pair: navigation goes through the tree's child steps and
//! every write goes through [`ValueTree::set_value`], so writes are reconciled
//! and tracked like any other.

use weft_types::{
    Identifier, ModelError, PathStep, Type, TypeExp, TypeSystem, Value, ValueHolder,
};

use crate::{NodeId, ValueTree};

fn wrong_kind(expected: &'static str, value: &ValueHolder) -> ModelError {
    ModelError::WrongKind {
        expected,
        found: value.kind_name().into(),
    }
}

fn child_by_name(tree: &ValueTree, node: NodeId, name: &str) -> Result<NodeId, ModelError> {
    let value = tree.value(node);
    if value.as_record().is_none() && value.as_generic().is_none() {
        return Err(wrong_kind("record", value));
    }
    let identifier = Identifier::new(name)?;
    tree.try_get_child_from_step(node, &PathStep::field(identifier.clone()))
        .ok_or(ModelError::UnknownField(identifier))
}

fn entry_by_index(tree: &ValueTree, node: NodeId, index: usize) -> Result<NodeId, ModelError> {
    let value = tree.value(node);
    let size = match (value.as_array(), value.as_tuple()) {
        (Some(entries), _) | (_, Some(entries)) => entries.len(),
        _ => return Err(wrong_kind("array", value)),
    };
    if index >= size {
        return Err(ModelError::ArrayIndexOutOfRange { index, size });
    }
    tree.get_child_from_step(node, &PathStep::index(index))
}

#[derive(Debug, Clone, Copy)]
pub struct Instance<'a> {
    tree: &'a ValueTree,
    node: NodeId,
}

impl<'a> Instance<'a> {
    pub fn new(tree: &'a ValueTree, node: NodeId) -> Self {
        Self { tree, node }
    }

    pub fn root(tree: &'a ValueTree) -> Self {
        Self::new(tree, tree.root())
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn type_exp(&self) -> &'a TypeExp {
        self.tree.type_exp(self.node)
    }

    pub fn value(&self) -> &'a ValueHolder {
        self.tree.value(self.node)
    }

    /// The field `name` of a record, or the wrapped value of a generic
    /// (`value`).
    pub fn field(&self, name: &str) -> Result<Instance<'a>, ModelError> {
        Ok(Self::new(self.tree, child_by_name(self.tree, self.node, name)?))
    }

    /// Entry `index` of an array or tuple.
    pub fn entry(&self, index: usize) -> Result<Instance<'a>, ModelError> {
        Ok(Self::new(self.tree, entry_by_index(self.tree, self.node, index)?))
    }

    pub fn get_int(&self) -> Result<i64, ModelError> {
        self.value().as_int().ok_or_else(|| wrong_kind("int", self.value()))
    }

    pub fn get_string(&self) -> Result<&'a str, ModelError> {
        let value = self.value();
        value.as_string().ok_or_else(|| wrong_kind("string", value))
    }

    pub fn get_enum(&self) -> Result<&'a Identifier, ModelError> {
        let value = self.value();
        value.as_enum().ok_or_else(|| wrong_kind("enum", value))
    }

    pub fn array_size(&self) -> Result<usize, ModelError> {
        let value = self.value();
        value
            .as_array()
            .map(<[_]>::len)
            .ok_or_else(|| wrong_kind("array", value))
    }

    pub fn is_field_active(&self, name: &str) -> Result<bool, ModelError> {
        match child_by_name(self.tree, self.node, name) {
            Ok(_) => Ok(true),
            Err(ModelError::UnknownField(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub fn selected_tag(&self) -> Result<Option<&'a Identifier>, ModelError> {
        let value = self.value();
        let record = value.as_record().ok_or_else(|| wrong_kind("record", value))?;
        Ok(record.tag.as_ref())
    }

    /// Assignment of variable `index` of a generic, `None` if unassigned.
    pub fn type_assignment(
        &self,
        type_system: &TypeSystem,
        index: usize,
    ) -> Result<Option<TypeExp>, ModelError> {
        let ty = self.tree.resolve_type(type_system, self.node)?;
        let generic = ty.as_generic().ok_or_else(|| wrong_kind("generic", self.value()))?;
        Ok(generic.get_type_assignment(self.value(), index).cloned())
    }
}

pub struct InstanceMut<'a> {
    type_system: &'a TypeSystem,
    tree: &'a mut ValueTree,
    node: NodeId,
}

impl<'a> InstanceMut<'a> {
    pub fn new(type_system: &'a TypeSystem, tree: &'a mut ValueTree, node: NodeId) -> Self {
        Self {
            type_system,
            tree,
            node,
        }
    }

    pub fn root(type_system: &'a TypeSystem, tree: &'a mut ValueTree) -> Self {
        let root = tree.root();
        Self::new(type_system, tree, root)
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn as_instance(&self) -> Instance<'_> {
        Instance::new(self.tree, self.node)
    }

    pub fn field(&mut self, name: &str) -> Result<InstanceMut<'_>, ModelError> {
        let child = child_by_name(self.tree, self.node, name)?;
        Ok(InstanceMut::new(self.type_system, self.tree, child))
    }

    pub fn entry(&mut self, index: usize) -> Result<InstanceMut<'_>, ModelError> {
        let child = entry_by_index(self.tree, self.node, index)?;
        Ok(InstanceMut::new(self.type_system, self.tree, child))
    }

    pub fn set_value(&mut self, value: ValueHolder) -> Result<(), ModelError> {
        self.tree.set_value(self.type_system, self.node, value)
    }

    pub fn set_int(&mut self, value: i64) -> Result<(), ModelError> {
        self.set_value(Value::Int(value).into())
    }

    pub fn set_string(&mut self, value: impl Into<String>) -> Result<(), ModelError> {
        self.set_value(Value::String(value.into()).into())
    }

    /// Accepts an unresolved identifier for any enum value with that text.
    pub fn set_enum(&mut self, value: &Identifier) -> Result<(), ModelError> {
        let ty = self.tree.resolve_type(self.type_system, self.node)?;
        let current = self.tree.value(self.node);
        let enum_type = ty.as_enum().ok_or_else(|| wrong_kind("enum", current))?;
        let resolved = enum_type
            .index_of(value)
            .map_or_else(|| value.clone(), |index| enum_type.values()[index].clone());
        self.set_value(Value::Enum(resolved).into())
    }

    pub fn set_array_size(&mut self, size: usize) -> Result<(), ModelError> {
        let type_system = self.type_system;
        self.update("array", |ty, value| {
            Some(ty.as_array()?.set_size(type_system, value, size))
        })
    }

    pub fn activate_field(&mut self, name: &str) -> Result<(), ModelError> {
        let type_system = self.type_system;
        let identifier = Identifier::new(name)?;
        self.update("record", |ty, value| {
            Some(ty.as_record()?.activate_field(type_system, value, &identifier))
        })
    }

    pub fn deactivate_field(&mut self, name: &str) -> Result<(), ModelError> {
        let identifier = Identifier::new(name)?;
        self.update("record", |ty, value| {
            Some(ty.as_record()?.deactivate_field(value, &identifier))
        })
    }

    pub fn select_tag(&mut self, tag: &Identifier) -> Result<(), ModelError> {
        let type_system = self.type_system;
        self.update("record with variants", |ty, value| {
            Some(ty.as_record_with_variants()?.select_tag(type_system, value, tag))
        })
    }

    /// Missing trailing assignments leave their variables unassigned.
    pub fn set_type_assignments(&mut self, assignments: &[TypeExp]) -> Result<(), ModelError> {
        let type_system = self.type_system;
        self.update("generic", |ty, value| {
            Some(
                ty.as_generic()?
                    .set_type_variable_assignment_and_instantiate(type_system, value, assignments),
            )
        })
    }

    /// Apply `edit` to a copy of the value and write it back if it changed.
    /// `edit` returns `None` when the node's type is not the `expected` kind.
    fn update(
        &mut self,
        expected: &'static str,
        edit: impl FnOnce(&dyn Type, &mut ValueHolder) -> Option<Result<(), ModelError>>,
    ) -> Result<(), ModelError> {
        let ty = self.tree.resolve_type(self.type_system, self.node)?;
        let current = self.tree.value(self.node);
        let mut value = current.clone();
        edit(ty.as_ref(), &mut value).ok_or_else(|| wrong_kind(expected, current))??;
        if value.is_shared_with(current) {
            return Ok(());
        }
        self.set_value(value)
    }
}
