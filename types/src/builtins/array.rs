use alloc::{sync::Arc, vec};
use core::{iter, ops::RangeInclusive};

use crate::{
    CompoundType, ModelError, PathStep, ResolvedType, SubtypeOrder, Type, TypeConstructor,
    TypeConstructorArguments, TypeExp, TypeSystem, TypeSystemError, Value, ValueHolder,
    builtins::{array_constructor_id, expect_arity, size_argument},
};

/// A variable-size sequence of values of one element type, with a size range.
#[derive(Debug, Clone)]
pub struct ArrayType {
    element: TypeExp,
    element_type: ResolvedType,
    min: usize,
    max: usize,
    initial: usize,
}

impl ArrayType {
    pub fn type_exp(element: TypeExp, min: usize, max: usize, initial: usize) -> TypeExp {
        TypeExp::constructed(
            array_constructor_id(),
            vec![element],
            vec![
                Value::Int(min as i64).into(),
                Value::Int(max as i64).into(),
                Value::Int(initial as i64).into(),
            ],
        )
    }

    pub fn entry_type(&self) -> &TypeExp {
        &self.element
    }

    pub fn size_range(&self) -> RangeInclusive<usize> {
        self.min..=self.max
    }

    pub fn initial_size(&self) -> usize {
        self.initial
    }

    pub fn num_entries(&self, value: &ValueHolder) -> Result<usize, ModelError> {
        value.as_array().map(<[_]>::len).ok_or(ModelError::WrongKind {
            expected: "array",
            found: value.kind_name().into(),
        })
    }

    fn check_size(&self, size: usize) -> Result<(), ModelError> {
        if self.size_range().contains(&size) {
            Ok(())
        } else {
            Err(ModelError::ArraySizeOutOfRange {
                size,
                min: self.min,
                max: self.max,
            })
        }
    }

    /// Grow with default entries or shrink from the end.
    pub fn set_size(
        &self,
        type_system: &TypeSystem,
        value: &mut ValueHolder,
        size: usize,
    ) -> Result<(), ModelError> {
        self.check_size(size)?;
        if self.num_entries(value)? == size {
            return Ok(());
        }
        let default = self.element_type.create_value(type_system)?;
        entries_mut(value).resize(size, default);
        Ok(())
    }

    /// Insert `count` default entries before `index`.
    pub fn insert_entries(
        &self,
        type_system: &TypeSystem,
        value: &mut ValueHolder,
        index: usize,
        count: usize,
    ) -> Result<(), ModelError> {
        let size = self.num_entries(value)?;
        if index > size {
            return Err(ModelError::ArrayIndexOutOfRange { index, size });
        }
        let new_size = size.checked_add(count).ok_or(ModelError::ArraySizeOutOfRange {
            size: usize::MAX,
            min: self.min,
            max: self.max,
        })?;
        self.check_size(new_size)?;
        let default = self.element_type.create_value(type_system)?;
        entries_mut(value).splice(index..index, iter::repeat_n(default, count));
        Ok(())
    }

    /// Remove `count` entries starting at `index`.
    pub fn remove_entries(
        &self,
        value: &mut ValueHolder,
        index: usize,
        count: usize,
    ) -> Result<(), ModelError> {
        let size = self.num_entries(value)?;
        let end = index
            .checked_add(count)
            .filter(|end| *end <= size)
            .ok_or(ModelError::ArrayIndexOutOfRange {
                index: index.saturating_add(count),
                size,
            })?;
        self.check_size(size - count)?;
        entries_mut(value).drain(index..end);
        Ok(())
    }
}

fn entries_mut(value: &mut ValueHolder) -> &mut alloc::vec::Vec<ValueHolder> {
    value
        .copy_contents_and_get_non_const()
        .as_array_mut()
        .expect("Bug: array type given a non-array value")
}

impl Type for ArrayType {
    fn create_value(&self, type_system: &TypeSystem) -> Result<ValueHolder, TypeSystemError> {
        let default = self.element_type.create_value(type_system)?;
        Ok(Value::Array(vec![default; self.initial]).into())
    }

    fn is_valid_value(&self, type_system: &TypeSystem, value: &ValueHolder) -> bool {
        value.as_array().is_some_and(|entries| {
            self.size_range().contains(&entries.len())
                && entries
                    .iter()
                    .all(|entry| self.element_type.is_valid_value(type_system, entry))
        })
    }

    fn compare_subtype_helper(
        &self,
        type_system: &TypeSystem,
        other: &dyn Type,
    ) -> Option<SubtypeOrder> {
        let other = other.as_array()?;
        let element = type_system.compare_subtype(&self.element, &other.element);
        let size = SubtypeOrder::of_ranges(&self.size_range(), &other.size_range());
        // The empty array belongs to both when both allow size 0.
        if element == SubtypeOrder::IsDisjoint && self.min == 0 && other.min == 0 {
            return Some(if self.max == 0 && other.max == 0 {
                SubtypeOrder::IsEquivalent
            } else {
                SubtypeOrder::IsIntersecting
            });
        }
        Some(element.product(size))
    }

    fn as_compound(&self) -> Option<&dyn CompoundType> {
        Some(self)
    }

    fn as_array(&self) -> Option<&ArrayType> {
        Some(self)
    }
}

impl CompoundType for ArrayType {
    fn num_children(&self, value: &ValueHolder) -> usize {
        value.as_array().map_or(0, <[_]>::len)
    }

    fn child<'v>(&self, value: &'v ValueHolder, index: usize) -> (&'v ValueHolder, PathStep, TypeExp) {
        let entries = value
            .as_array()
            .expect("Bug: array type given a non-array value");
        (&entries[index], PathStep::Index(index), self.element.clone())
    }

    fn child_non_const<'v>(
        &self,
        value: &'v mut ValueHolder,
        index: usize,
    ) -> (&'v mut ValueHolder, PathStep, TypeExp) {
        (&mut entries_mut(value)[index], PathStep::Index(index), self.element.clone())
    }

    fn child_index_from_step(&self, value: &ValueHolder, step: &PathStep) -> Option<usize> {
        step.as_index().filter(|&index| index < self.num_children(value))
    }
}

#[derive(Debug)]
pub struct ArrayConstructor;

impl TypeConstructor for ArrayConstructor {
    fn construct(
        &self,
        _: &TypeSystem,
        arguments: &TypeConstructorArguments,
        resolved: &[ResolvedType],
    ) -> Result<ResolvedType, TypeSystemError> {
        let id = array_constructor_id();
        expect_arity(&id, arguments, Some(1), 3)?;
        let min = size_argument(&id, arguments, 0)?;
        let max = size_argument(&id, arguments, 1)?;
        let initial = size_argument(&id, arguments, 2)?;
        if !(min <= initial && initial <= max) {
            return Err(TypeSystemError::invalid_arguments(
                &id,
                format!("need {min} <= {initial} <= {max}"),
            ));
        }
        Ok(Arc::new(ArrayType {
            element: arguments.type_arguments[0].clone(),
            element_type: resolved[0].clone(),
            min,
            max,
            initial,
        }))
    }

    fn format(&self) -> &str {
        "Array<{0}>[[[0]..[1]]]"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::IntType;
    use pretty_assertions::assert_eq;

    fn ints(value: &ValueHolder) -> Vec<i64> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|entry| entry.as_int().unwrap())
            .collect()
    }

    #[test]
    fn test_default_and_name() {
        let ts = TypeSystem::new();
        let exp = ArrayType::type_exp(IntType::type_exp(), 1, 16, 3);
        let ty = ts.resolve(&exp).unwrap();
        let value = ty.create_value(&ts).unwrap();
        assert_eq!(ints(&value), vec![0, 0, 0]);
        assert!(ty.is_valid_value(&ts, &value));
        assert_eq!(exp.to_string_with(&ts), "Array<Int>[1..16]");
    }

    #[test]
    fn test_set_size_bounds() {
        let ts = TypeSystem::new();
        let ty = ts
            .resolve(&ArrayType::type_exp(IntType::type_exp(), 1, 4, 2))
            .unwrap();
        let array = ty.as_array().unwrap();
        let mut value = ty.create_value(&ts).unwrap();

        array.set_size(&ts, &mut value, 4).unwrap();
        assert_eq!(ints(&value).len(), 4);
        assert_eq!(
            array.set_size(&ts, &mut value, 5),
            Err(ModelError::ArraySizeOutOfRange { size: 5, min: 1, max: 4 })
        );
        assert!(array.set_size(&ts, &mut value, 0).is_err());
        array.set_size(&ts, &mut value, 1).unwrap();
        assert_eq!(ints(&value).len(), 1);
    }

    #[test]
    fn test_insert_and_remove() {
        let ts = TypeSystem::new();
        let ty = ts
            .resolve(&ArrayType::type_exp(IntType::type_exp(), 1, 5, 2))
            .unwrap();
        let array = ty.as_array().unwrap();
        let mut value: ValueHolder =
            Value::Array(vec![Value::Int(1).into(), Value::Int(2).into()]).into();

        array.insert_entries(&ts, &mut value, 1, 2).unwrap();
        assert_eq!(ints(&value), vec![1, 0, 0, 2]);
        assert!(matches!(
            array.insert_entries(&ts, &mut value, 5, 1),
            Err(ModelError::ArrayIndexOutOfRange { .. })
        ));
        assert!(matches!(
            array.insert_entries(&ts, &mut value, 0, 2),
            Err(ModelError::ArraySizeOutOfRange { .. })
        ));

        array.remove_entries(&mut value, 0, 3).unwrap();
        assert_eq!(ints(&value), vec![2]);
        assert!(matches!(
            array.remove_entries(&mut value, 0, 1),
            Err(ModelError::ArraySizeOutOfRange { .. })
        ));
        assert!(matches!(
            array.remove_entries(&mut value, 1, 1),
            Err(ModelError::ArrayIndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_huge_counts_are_rejected() {
        let ts = TypeSystem::new();
        let ty = ts
            .resolve(&ArrayType::type_exp(IntType::type_exp(), 0, 5, 2))
            .unwrap();
        let array = ty.as_array().unwrap();
        let mut value = ty.create_value(&ts).unwrap();

        assert!(matches!(
            array.insert_entries(&ts, &mut value, 1, usize::MAX),
            Err(ModelError::ArraySizeOutOfRange { .. })
        ));
        assert!(matches!(
            array.remove_entries(&mut value, 1, usize::MAX),
            Err(ModelError::ArrayIndexOutOfRange { .. })
        ));
        assert_eq!(ints(&value), vec![0, 0]);
    }

    #[test]
    fn test_operations_do_not_touch_shared_values() {
        let ts = TypeSystem::new();
        let ty = ts
            .resolve(&ArrayType::type_exp(IntType::type_exp(), 0, 8, 2))
            .unwrap();
        let original = ty.create_value(&ts).unwrap();
        let mut copy = original.clone();
        ty.as_array().unwrap().set_size(&ts, &mut copy, 5).unwrap();
        assert_eq!(ints(&original).len(), 2);
        assert_eq!(ints(&copy).len(), 5);
    }

    #[test]
    fn test_subtyping_combines_element_and_size() {
        let ts = TypeSystem::new();
        let small = IntType::range_exp(0, 5, 0);
        let int = IntType::type_exp();
        let a = ArrayType::type_exp(small.clone(), 0, 4, 0);
        let b = ArrayType::type_exp(int.clone(), 0, 8, 0);
        assert_eq!(ts.compare_subtype(&a, &b), SubtypeOrder::IsSubtype);
        assert_eq!(ts.compare_subtype(&b, &a), SubtypeOrder::IsSupertype);

        // Element narrower, size range wider: no containment either way.
        let c = ArrayType::type_exp(small, 0, 16, 0);
        assert_eq!(ts.compare_subtype(&c, &b), SubtypeOrder::IsUnrelated);
        let d = ArrayType::type_exp(int, 0, 8, 4);
        assert_eq!(ts.compare_subtype(&d, &b), SubtypeOrder::IsEquivalent);
    }

    #[test]
    fn test_disjoint_elements_share_the_empty_array() {
        let ts = TypeSystem::new();
        let low = IntType::range_exp(0, 5, 0);
        let high = IntType::range_exp(10, 20, 10);
        assert_eq!(ts.compare_subtype(&low, &high), SubtypeOrder::IsDisjoint);

        let maybe_low = ArrayType::type_exp(low.clone(), 0, 4, 0);
        let maybe_high = ArrayType::type_exp(high.clone(), 0, 8, 0);
        assert_eq!(ts.compare_subtype(&maybe_low, &maybe_high), SubtypeOrder::IsIntersecting);

        let some_high = ArrayType::type_exp(high.clone(), 1, 8, 1);
        assert_eq!(ts.compare_subtype(&maybe_low, &some_high), SubtypeOrder::IsDisjoint);

        let empty_low = ArrayType::type_exp(low, 0, 0, 0);
        let empty_high = ArrayType::type_exp(high, 0, 0, 0);
        assert_eq!(ts.compare_subtype(&empty_low, &empty_high), SubtypeOrder::IsEquivalent);
    }
}
