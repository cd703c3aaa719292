//! Queries about generic types and type variables in a [`ValueTree`].
//!
//! A type variable node carries a `level`: the number of generic nodes above
//! it to skip before reaching the one that owns it. The node types in a tree
//! are already instantiated, so a type variable node found in a tree always
//! stands for a variable that is not assigned.
//!
//! Heights are counted from a starting node: height 0 is the starting node if
//! it is generic, or otherwise its nearest generic owner; height 1 is the next
//! generic node above that, and so on.

use crate::{NodeId, ValueTree};

fn is_generic(tree: &ValueTree, id: NodeId) -> bool {
    tree.type_exp(id).is_generic()
}

fn has_unassigned_variable(tree: &ValueTree, id: NodeId) -> bool {
    tree.value(id).as_generic().is_some_and(|generic| {
        generic
            .type_assignments
            .iter()
            .any(|assignment| assignment.is_null())
    })
}

/// The generic node that owns the type variable at `node`.
///
/// `None` if `node` is not a type variable, or if the tree ends before the
/// owning generic node is reached (the subtree was built on its own).
pub fn try_get_generic_type_from_variable(tree: &ValueTree, node: NodeId) -> Option<NodeId> {
    let (level, _) = tree.type_exp(node).type_variable_data()?;
    let mut remaining = level;
    let mut current = tree.owner(node);
    while let Some(id) = current {
        if is_generic(tree, id) {
            if remaining == 0 {
                return Some(id);
            }
            remaining -= 1;
        }
        current = tree.owner(id);
    }
    None
}

/// Greatest height, relative to `node`, of a generic node that owns a type
/// variable found in the subtree at `node`.
///
/// Variables owned by generic nodes inside the subtree do not count. `None`
/// if no variable in the subtree belongs to a generic node at or above
/// `node`.
pub fn get_maximum_height_of_unassigned_generic_type(tree: &ValueTree, node: NodeId) -> Option<usize> {
    // Only generic nodes with an unassigned variable can own a variable node.
    let mut max_height = None;
    let mut height = 0;
    let mut current = Some(node);
    while let Some(id) = current {
        if is_generic(tree, id) {
            if has_unassigned_variable(tree, id) {
                max_height = Some(height);
            }
            height += 1;
        }
        current = tree.owner(id);
    }
    let max_height = max_height?;

    let mut found = None;
    // (node, generic nodes strictly between `node` and it)
    let mut pending = vec![(node, 0usize)];
    while let Some((id, depth)) = pending.pop() {
        if let Some((level, _)) = tree.type_exp(id).type_variable_data()
            && level >= depth
        {
            let height = level - depth;
            if height >= max_height {
                return Some(max_height);
            }
            found = found.max(Some(height));
        }
        let child_depth = if id != node && is_generic(tree, id) {
            depth + 1
        } else {
            depth
        };
        pending.extend(tree.children(id).map(|(_, child)| (child, child_depth)));
    }
    found
}

/// Whether the subtree at `node` has a type variable owned by a generic node
/// at `height` or above, relative to `node`.
pub fn contains_unassigned_type_variable(tree: &ValueTree, node: NodeId, height: usize) -> bool {
    get_maximum_height_of_unassigned_generic_type(tree, node).is_some_and(|found| found >= height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use weft_types::{
        Identifier, Path, TypeExp, TypeSystem,
        builtins::{Field, GenericType, IntType, RecordType, StringType, TypeVariableType},
    };

    fn id(s: &str) -> Identifier {
        Identifier::new(s).unwrap()
    }

    fn path(s: &str) -> Path {
        s.parse().unwrap()
    }

    fn assign(ts: &TypeSystem, tree: &mut ValueTree, node: NodeId, assignments: &[TypeExp]) {
        let ty = tree.resolve_type(ts, node).unwrap();
        let mut value = tree.value(node).clone();
        ty.as_generic()
            .unwrap()
            .set_type_variable_assignment_and_instantiate(ts, &mut value, assignments)
            .unwrap();
        tree.set_value(ts, node, value).unwrap();
    }

    /// `Generic[2]<{x: T0, y: T1}>`
    fn two_variables() -> TypeExp {
        GenericType::type_exp(
            RecordType::constructed_exp(vec![
                Field::new(id("x"), TypeVariableType::type_exp(0, 0)),
                Field::new(id("y"), TypeVariableType::type_exp(0, 1)),
            ]),
            2,
        )
    }

    /// `Generic[1]<{outer: T0, inner: Generic[1]<{a: T0, b: T0 of the outer generic}>}>`
    fn nested() -> TypeExp {
        let inner = GenericType::type_exp(
            RecordType::constructed_exp(vec![
                Field::new(id("a"), TypeVariableType::type_exp(0, 0)),
                Field::new(id("b"), TypeVariableType::type_exp(1, 0)),
            ]),
            1,
        );
        GenericType::type_exp(
            RecordType::constructed_exp(vec![
                Field::new(id("outer"), TypeVariableType::type_exp(0, 0)),
                Field::new(id("inner"), inner),
            ]),
            1,
        )
    }

    #[test]
    fn test_partial_assignment() {
        let ts = TypeSystem::new();
        let mut tree = ValueTree::new(&ts, two_variables()).unwrap();
        let root = tree.root();
        let x = tree.follow(&path("value/x")).unwrap();
        assert_eq!(try_get_generic_type_from_variable(&tree, x), Some(root));
        assert_eq!(get_maximum_height_of_unassigned_generic_type(&tree, root), Some(0));

        assign(&ts, &mut tree, root, &[IntType::type_exp()]);
        let ty = tree.resolve_type(&ts, root).unwrap();
        let generic = ty.as_generic().unwrap();
        assert_eq!(generic.get_type_assignment(tree.root_value(), 0), Some(&IntType::type_exp()));
        assert_eq!(generic.get_type_assignment(tree.root_value(), 1), None);
        assert_eq!(tree.follow(&path("value/x")).unwrap(), x);
        assert_eq!(tree.type_exp(x), &IntType::type_exp());
        assert_eq!(try_get_generic_type_from_variable(&tree, x), None);

        let y = tree.follow(&path("value/y")).unwrap();
        assert_eq!(try_get_generic_type_from_variable(&tree, y), Some(root));
        assert_eq!(get_maximum_height_of_unassigned_generic_type(&tree, root), Some(0));
        assert_eq!(get_maximum_height_of_unassigned_generic_type(&tree, x), None);
        assert!(contains_unassigned_type_variable(&tree, y, 0));

        assign(&ts, &mut tree, root, &[IntType::type_exp(), StringType::type_exp()]);
        assert_eq!(get_maximum_height_of_unassigned_generic_type(&tree, root), None);
        assert!(!contains_unassigned_type_variable(&tree, root, 0));
    }

    #[test]
    fn test_heights_in_nested_generics() {
        let ts = TypeSystem::new();
        let mut tree = ValueTree::new(&ts, nested()).unwrap();
        let root = tree.root();
        let inner = tree.follow(&path("value/inner")).unwrap();
        let a = tree.follow(&path("value/inner/value/a")).unwrap();
        let b = tree.follow(&path("value/inner/value/b")).unwrap();

        assert_eq!(try_get_generic_type_from_variable(&tree, a), Some(inner));
        assert_eq!(try_get_generic_type_from_variable(&tree, b), Some(root));

        assert_eq!(get_maximum_height_of_unassigned_generic_type(&tree, inner), Some(1));
        assert_eq!(get_maximum_height_of_unassigned_generic_type(&tree, a), Some(0));
        assert_eq!(get_maximum_height_of_unassigned_generic_type(&tree, b), Some(1));
        // From the root, `a` belongs to a generic inside the subtree and `b` is
        // at height 0 like `outer`.
        assert_eq!(get_maximum_height_of_unassigned_generic_type(&tree, root), Some(0));
        assert!(contains_unassigned_type_variable(&tree, inner, 1));

        assign(&ts, &mut tree, root, &[StringType::type_exp()]);
        assert_eq!(tree.follow(&path("value/inner")).unwrap(), inner);
        assert_eq!(tree.type_exp(b), &StringType::type_exp());
        assert_eq!(get_maximum_height_of_unassigned_generic_type(&tree, inner), Some(0));
        assert!(!contains_unassigned_type_variable(&tree, inner, 1));
        assert!(contains_unassigned_type_variable(&tree, inner, 0));
    }

    #[test]
    fn test_variable_without_owner_is_dangling() {
        let ts = TypeSystem::new();
        let wrapped = RecordType::constructed_exp(vec![Field::new(id("x"), TypeVariableType::type_exp(0, 0))]);
        let tree = ValueTree::new(&ts, wrapped).unwrap();
        let x = tree.follow(&path("x")).unwrap();
        assert_eq!(try_get_generic_type_from_variable(&tree, x), None);
        assert_eq!(get_maximum_height_of_unassigned_generic_type(&tree, x), None);
        assert_eq!(try_get_generic_type_from_variable(&tree, tree.root()), None);
    }
}
