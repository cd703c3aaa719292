use alloc::{sync::Arc, vec::Vec};

use crate::{
    CompoundType, PathStep, ResolvedType, SubtypeOrder, Type, TypeConstructor,
    TypeConstructorArguments, TypeExp, TypeSystem, TypeSystemError, Value, ValueHolder,
    builtins::{expect_arity, tuple_constructor_id},
};

/// A fixed number of values of fixed types, addressed by index.
#[derive(Debug, Clone)]
pub struct TupleType {
    items: Vec<TypeExp>,
    item_types: Vec<ResolvedType>,
}

impl TupleType {
    pub fn type_exp(items: Vec<TypeExp>) -> TypeExp {
        TypeExp::constructed(tuple_constructor_id(), items, Vec::new())
    }

    pub fn item_types(&self) -> &[TypeExp] {
        &self.items
    }

    fn values_of<'v>(&self, value: &'v ValueHolder) -> &'v [ValueHolder] {
        value
            .as_tuple()
            .expect("Bug: tuple type given a non-tuple value")
    }
}

impl Type for TupleType {
    fn create_value(&self, type_system: &TypeSystem) -> Result<ValueHolder, TypeSystemError> {
        let items = self
            .item_types
            .iter()
            .map(|ty| ty.create_value(type_system))
            .collect::<Result<_, _>>()?;
        Ok(Value::Tuple(items).into())
    }

    fn is_valid_value(&self, type_system: &TypeSystem, value: &ValueHolder) -> bool {
        value.as_tuple().is_some_and(|items| {
            items.len() == self.item_types.len()
                && items
                    .iter()
                    .zip(&self.item_types)
                    .all(|(item, ty)| ty.is_valid_value(type_system, item))
        })
    }

    fn compare_subtype_helper(
        &self,
        type_system: &TypeSystem,
        other: &dyn Type,
    ) -> Option<SubtypeOrder> {
        let other = other.as_tuple()?;
        if self.items.len() != other.items.len() {
            return Some(SubtypeOrder::IsDisjoint);
        }
        Some(SubtypeOrder::product_of(
            self.items
                .iter()
                .zip(&other.items)
                .map(|(a, b)| type_system.compare_subtype(a, b)),
        ))
    }

    fn as_compound(&self) -> Option<&dyn CompoundType> {
        Some(self)
    }

    fn as_tuple(&self) -> Option<&TupleType> {
        Some(self)
    }
}

impl CompoundType for TupleType {
    fn num_children(&self, value: &ValueHolder) -> usize {
        value.as_tuple().map_or(0, <[_]>::len)
    }

    fn child<'v>(&self, value: &'v ValueHolder, index: usize) -> (&'v ValueHolder, PathStep, TypeExp) {
        (&self.values_of(value)[index], PathStep::Index(index), self.items[index].clone())
    }

    fn child_non_const<'v>(
        &self,
        value: &'v mut ValueHolder,
        index: usize,
    ) -> (&'v mut ValueHolder, PathStep, TypeExp) {
        let items = value
            .copy_contents_and_get_non_const()
            .as_tuple_mut()
            .expect("Bug: tuple type given a non-tuple value");
        (&mut items[index], PathStep::Index(index), self.items[index].clone())
    }

    fn child_index_from_step(&self, value: &ValueHolder, step: &PathStep) -> Option<usize> {
        step.as_index().filter(|&index| index < self.num_children(value))
    }
}

#[derive(Debug)]
pub struct TupleConstructor;

impl TypeConstructor for TupleConstructor {
    fn construct(
        &self,
        _: &TypeSystem,
        arguments: &TypeConstructorArguments,
        resolved: &[ResolvedType],
    ) -> Result<ResolvedType, TypeSystemError> {
        expect_arity(&tuple_constructor_id(), arguments, None, 0)?;
        Ok(Arc::new(TupleType {
            items: arguments.type_arguments.clone(),
            item_types: resolved.to_vec(),
        }))
    }

    fn format(&self) -> &str {
        "({0|, })"
    }
}
