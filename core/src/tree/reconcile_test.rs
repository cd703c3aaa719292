use pretty_assertions::assert_eq;
use weft_types::{
    Identifier, Path, PathStep, TypeExp, TypeSystem, Value, ValueHolder,
    builtins::{
        ArrayType, Field, GenericType, IntType, Optionality, RecordType, RecordWithVariantsType,
        TypeVariableType, VariantField,
    },
};

use super::{NodeId, ValueTree};
use crate::{Changes, PathReconciliation, TreeOptions, test_utils::init_test_logging};

fn id(s: &str) -> Identifier {
    Identifier::new(s).unwrap()
}

fn path(s: &str) -> Path {
    s.parse().unwrap()
}

fn int(i: i64) -> ValueHolder {
    Value::Int(i).into()
}

/// `{x: Int, arr: Array<Int>[1..16] default 3}`
fn x_and_array() -> TypeExp {
    RecordType::constructed_exp(vec![
        Field::new(id("x"), IntType::type_exp()),
        Field::new(id("arr"), ArrayType::type_exp(IntType::type_exp(), 1, 16, 3)),
    ])
}

/// `{a: Int, b: Int, c?: Int}`
fn a_b_optional_c() -> TypeExp {
    RecordType::constructed_exp(vec![
        Field::new(id("a"), IntType::type_exp()),
        Field::new(id("b"), IntType::type_exp()),
        Field::optional(id("c"), IntType::type_exp(), Optionality::OptionalDefaultInactive),
    ])
}

fn steps(tree: &ValueTree, node: NodeId) -> Vec<String> {
    tree.children(node).map(|(step, _)| step.to_string()).collect()
}

#[test]
fn test_initial_tree() {
    let ts = TypeSystem::new();
    let tree = ValueTree::new(&ts, x_and_array()).unwrap();
    let root = tree.root();
    assert_eq!(tree.len(), 6);
    assert_eq!(steps(&tree, root), vec!["x", "arr"]);

    let entry = tree.follow(&path("arr/2")).unwrap();
    assert_eq!(tree.path_from_root(entry), path("arr/2"));
    assert_eq!(tree.value(entry).as_int(), Some(0));
    assert_eq!(tree.owner(root), None);
    assert!(tree.try_follow(&path("arr/3")).is_none());
    assert!(tree.get_child_from_step(root, &PathStep::field(id("nope"))).is_err());
}

#[test]
fn test_reconcile_with_own_value_is_idempotent() {
    init_test_logging();
    let ts = TypeSystem::new();
    let mut tree = ValueTree::new(&ts, x_and_array()).unwrap();
    let root = tree.root();
    let before = tree.subtree(root);

    for _ in 0..2 {
        let value = tree.root_value().clone();
        tree.reconcile_changes_and_synchronize_children(&ts, root, &value)
            .unwrap();
        assert_eq!(tree.changes(root), Changes::NOTHING_CHANGED);
        assert_eq!(tree.subtree(root), before);
    }

    // Equal contents in a different allocation.
    let copy = ValueHolder::new(Value::clone(tree.root_value()));
    assert!(!copy.is_shared_with(tree.root_value()));
    tree.reconcile_changes_and_synchronize_children(&ts, root, &copy)
        .unwrap();
    assert_eq!(tree.changes(root), Changes::NOTHING_CHANGED);
    assert_eq!(tree.subtree(root), before);
}

#[test]
fn test_growing_array_changes_structure_and_keeps_nodes() {
    init_test_logging();
    let ts = TypeSystem::new();
    let mut tree = ValueTree::new(&ts, x_and_array()).unwrap();
    let root = tree.root();
    let x = tree.follow(&path("x")).unwrap();
    let arr = tree.follow(&path("arr")).unwrap();
    let entries: Vec<NodeId> = tree.children(arr).map(|(_, child)| child).collect();

    let mut value = tree.value(arr).clone();
    let ty = tree.resolve_type(&ts, arr).unwrap();
    ty.as_array().unwrap().set_size(&ts, &mut value, 5).unwrap();
    tree.set_value(&ts, arr, value).unwrap();

    assert!(tree.is_changed(arr, Changes::STRUCTURE_CHANGED));
    assert!(tree.is_changed(root, Changes::STRUCTURE_CHANGED));
    assert_eq!(tree.changes(x), Changes::NOTHING_CHANGED);
    assert_eq!(tree.num_children(arr), 5);
    let after: Vec<NodeId> = tree.children(arr).map(|(_, child)| child).collect();
    assert_eq!(&after[..3], &entries[..]);
    for entry in &entries {
        assert_eq!(tree.changes(*entry), Changes::NOTHING_CHANGED);
    }
    assert_eq!(tree.root_value().as_record().unwrap().get(&id("arr")).unwrap().as_array().unwrap().len(), 5);
}

#[test]
fn test_reconcile_against_other_tree_value() {
    let ts = TypeSystem::new();
    let mut tree = ValueTree::new(&ts, x_and_array()).unwrap();
    let mut other = ValueTree::new(&ts, x_and_array()).unwrap();
    let root = tree.root();
    let arr = other.follow(&path("arr")).unwrap();

    let mut resized = other.value(arr).clone();
    let ty = other.resolve_type(&ts, arr).unwrap();
    ty.as_array().unwrap().set_size(&ts, &mut resized, 5).unwrap();
    other.set_value(&ts, arr, resized).unwrap();

    let new_value = other.root_value().clone();
    tree.reconcile_changes_and_synchronize_children(&ts, root, &new_value)
        .unwrap();
    let arr = tree.follow(&path("arr")).unwrap();
    let x = tree.follow(&path("x")).unwrap();
    assert!(tree.is_changed(arr, Changes::STRUCTURE_CHANGED));
    assert!(tree.is_changed(root, Changes::STRUCTURE_CHANGED));
    assert_eq!(tree.changes(x), Changes::NOTHING_CHANGED);
}

#[test]
fn test_shrinking_array_removes_nodes() {
    let ts = TypeSystem::new();
    let mut tree = ValueTree::new(&ts, x_and_array()).unwrap();
    let arr = tree.follow(&path("arr")).unwrap();
    let removed = tree.follow(&path("arr/2")).unwrap();

    let mut value = tree.value(arr).clone();
    let ty = tree.resolve_type(&ts, arr).unwrap();
    ty.as_array().unwrap().remove_entries(&mut value, 1, 2).unwrap();
    tree.set_value(&ts, arr, value).unwrap();

    assert_eq!(tree.num_children(arr), 1);
    assert!(!tree.contains(removed));
    assert_eq!(tree.len(), 4);
    assert!(tree.is_changed(arr, Changes::STRUCTURE_CHANGED));
}

#[test]
fn test_value_change_versus_structure_change() {
    init_test_logging();
    let ts = TypeSystem::new();
    let mut tree = ValueTree::new(&ts, a_b_optional_c()).unwrap();
    let root = tree.root();
    let a = tree.follow(&path("a")).unwrap();
    let b = tree.follow(&path("b")).unwrap();
    assert_eq!(steps(&tree, root), vec!["a", "b"]);

    tree.set_value(&ts, a, int(7)).unwrap();
    assert_eq!(tree.changes(a), Changes::VALUE_CHANGED);
    assert_eq!(tree.changes(root), Changes::VALUE_CHANGED);
    assert_eq!(tree.changes(b), Changes::NOTHING_CHANGED);
    assert_eq!(tree.value(a).as_int(), Some(7));

    tree.clear_changes(root);
    let ty = tree.resolve_type(&ts, root).unwrap();
    let record = ty.as_record().unwrap();
    let mut value = tree.root_value().clone();
    record.activate_field(&ts, &mut value, &id("c")).unwrap();
    tree.set_value(&ts, root, value).unwrap();
    assert_eq!(tree.changes(root), Changes::STRUCTURE_CHANGED);
    assert_eq!(steps(&tree, root), vec!["a", "b", "c"]);
    assert_eq!(tree.follow(&path("a")).unwrap(), a);

    tree.clear_changes(root);
    let c = tree.follow(&path("c")).unwrap();
    let mut value = tree.root_value().clone();
    record.deactivate_field(&mut value, &id("c")).unwrap();
    tree.set_value(&ts, root, value).unwrap();
    assert_eq!(tree.changes(root), Changes::STRUCTURE_CHANGED);
    assert!(!tree.contains(c));
    assert_eq!(tree.changes(a), Changes::NOTHING_CHANGED);
}

#[test]
fn test_tag_change_with_same_fields_is_structural() {
    let mut ts = TypeSystem::new();
    let (on, off) = (Identifier::builtin("on"), Identifier::builtin("off"));
    let switch = ts
        .add_type(
            Identifier::builtin("Switch"),
            RecordWithVariantsType::new(
                vec![on.clone(), off.clone()],
                0,
                vec![VariantField::common(Field::new(id("level"), IntType::type_exp()))],
            ),
        )
        .unwrap();
    let mut tree = ValueTree::new(&ts, switch).unwrap();
    let root = tree.root();
    let level = tree.follow(&path("level")).unwrap();

    let ty = tree.resolve_type(&ts, root).unwrap();
    let mut value = tree.root_value().clone();
    ty.as_record_with_variants()
        .unwrap()
        .select_tag(&ts, &mut value, &off)
        .unwrap();
    tree.set_value(&ts, root, value).unwrap();

    assert!(tree.is_changed(root, Changes::STRUCTURE_CHANGED));
    assert_eq!(steps(&tree, root), vec!["level"]);
    assert_eq!(tree.follow(&path("level")).unwrap(), level);
    assert_eq!(tree.changes(level), Changes::NOTHING_CHANGED);
}

#[test]
fn test_set_value_rejects_invalid_value() {
    let ts = TypeSystem::new();
    let mut tree = ValueTree::new(&ts, x_and_array()).unwrap();
    let arr = tree.follow(&path("arr")).unwrap();
    let err = tree.set_value(&ts, arr, int(1)).unwrap_err();
    assert!(matches!(err, weft_types::ModelError::InvalidValue { .. }));
    assert_eq!(tree.changes(tree.root()), Changes::NOTHING_CHANGED);
}

#[test]
fn test_changes_propagate_up_and_clear_down() {
    let ts = TypeSystem::new();
    let mut tree = ValueTree::new(&ts, x_and_array()).unwrap();
    let root = tree.root();
    let x = tree.follow(&path("x")).unwrap();
    let arr = tree.follow(&path("arr")).unwrap();
    let leaf = tree.follow(&path("arr/2")).unwrap();

    tree.set_changed(leaf, Changes::VALUE_CHANGED);
    for node in [leaf, arr, root] {
        assert!(tree.is_changed(node, Changes::VALUE_CHANGED));
        assert!(tree.is_changed(node, Changes::SOMETHING_CHANGED));
        assert!(!tree.is_changed(node, Changes::STRUCTURE_CHANGED));
    }
    assert!(!tree.is_changed(x, Changes::SOMETHING_CHANGED));

    tree.set_changed(arr, Changes::STRUCTURE_CHANGED);
    assert_eq!(tree.changes(root), Changes::SOMETHING_CHANGED);
    assert_eq!(tree.changes(leaf), Changes::VALUE_CHANGED);

    tree.clear_changes(root);
    for node in tree.subtree(root) {
        assert!(!tree.is_changed(node, Changes::SOMETHING_CHANGED));
    }
}

fn root_value_with(ts: &TypeSystem, tree: &ValueTree, writes: &[(&str, i64)]) -> ValueHolder {
    let mut value = tree.root_value().clone();
    for (at, i) in writes {
        let (slot, _) = path(at)
            .follow_value_mut(ts, tree.type_exp(tree.root()), &mut value)
            .unwrap();
        *slot = int(*i);
    }
    value
}

#[test]
fn test_path_scoped_reconciliation_trusts_caller_by_default() {
    let ts = TypeSystem::new();
    let mut tree = ValueTree::new(&ts, x_and_array()).unwrap();
    let root = tree.root();
    let new_value = root_value_with(&ts, &tree, &[("x", 4), ("arr/0", 9)]);

    tree.reconcile_changes_and_synchronize_children_at_path(&ts, root, &new_value, &path("x"), 0)
        .unwrap();
    let x = tree.follow(&path("x")).unwrap();
    let entry = tree.follow(&path("arr/0")).unwrap();
    assert_eq!(tree.value(x).as_int(), Some(4));
    assert_eq!(tree.changes(x), Changes::VALUE_CHANGED);
    // Off the path: not looked at.
    assert_eq!(tree.value(entry).as_int(), Some(0));
    assert_eq!(tree.changes(entry), Changes::NOTHING_CHANGED);
    assert!(tree.root_value().is_shared_with(&new_value));
}

#[test]
fn test_path_scoped_reconciliation_can_verify_everything() {
    let ts = TypeSystem::new();
    let mut tree = ValueTree::new(&ts, x_and_array())
        .unwrap()
        .with_options(TreeOptions {
            path_reconciliation: PathReconciliation::VerifyAll,
        });
    let root = tree.root();
    let new_value = root_value_with(&ts, &tree, &[("x", 4), ("arr/0", 9)]);

    tree.reconcile_changes_and_synchronize_children_at_path(&ts, root, &new_value, &path("x"), 0)
        .unwrap();
    let entry = tree.follow(&path("arr/0")).unwrap();
    assert_eq!(tree.value(entry).as_int(), Some(9));
    assert_eq!(tree.changes(entry), Changes::VALUE_CHANGED);
}

#[test]
fn test_type_change_keeps_node_and_marks_structure() {
    let ts = TypeSystem::new();
    // Generic[1]<{x: T0}>
    let wrapped = RecordType::constructed_exp(vec![Field::new(id("x"), TypeVariableType::type_exp(0, 0))]);
    let mut tree = ValueTree::new(&ts, GenericType::type_exp(wrapped, 1)).unwrap();
    let root = tree.root();
    let record = tree.follow(&path("value")).unwrap();
    let x = tree.follow(&path("value/x")).unwrap();
    assert!(tree.type_exp(x).type_variable_data().is_some());

    let ty = tree.resolve_type(&ts, root).unwrap();
    let mut value = tree.root_value().clone();
    ty.as_generic()
        .unwrap()
        .set_type_variable_assignment_and_instantiate(&ts, &mut value, &[IntType::type_exp()])
        .unwrap();
    tree.set_value(&ts, root, value).unwrap();

    assert_eq!(tree.follow(&path("value")).unwrap(), record);
    assert_eq!(tree.follow(&path("value/x")).unwrap(), x);
    assert_eq!(tree.type_exp(x), &IntType::type_exp());
    assert!(tree.is_changed(root, Changes::STRUCTURE_CHANGED));
    assert!(tree.is_changed(record, Changes::STRUCTURE_CHANGED));
    assert_eq!(tree.value(x).as_int(), Some(0));
}
