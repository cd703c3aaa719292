use alloc::{sync::Arc, vec};
use core::ops::RangeInclusive;

use crate::{
    ResolvedType, SubtypeOrder, Type, TypeConstructor, TypeConstructorArguments, TypeExp,
    TypeSystem, TypeSystemError, Value, ValueHolder,
    builtins::{expect_arity, int_argument, int_range_constructor_id, int_type_id},
};

/// Integers in an inclusive range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntType {
    min: i64,
    max: i64,
    default: i64,
}

impl IntType {
    pub fn new(min: i64, max: i64, default: i64) -> Option<Self> {
        (min <= default && default <= max).then_some(Self { min, max, default })
    }

    /// Every `i64`, defaulting to 0.
    pub fn full() -> Self {
        Self {
            min: i64::MIN,
            max: i64::MAX,
            default: 0,
        }
    }

    /// The registered unbounded int type.
    pub fn type_exp() -> TypeExp {
        TypeExp::Registered(int_type_id())
    }

    /// A bounded int type built by the `IntRange` constructor.
    pub fn range_exp(min: i64, max: i64, default: i64) -> TypeExp {
        TypeExp::constructed(
            int_range_constructor_id(),
            vec![],
            vec![
                Value::Int(min).into(),
                Value::Int(max).into(),
                Value::Int(default).into(),
            ],
        )
    }

    pub fn range(&self) -> RangeInclusive<i64> {
        self.min..=self.max
    }

    pub fn default_value(&self) -> i64 {
        self.default
    }

    pub fn contains(&self, value: i64) -> bool {
        self.range().contains(&value)
    }
}

impl Type for IntType {
    fn create_value(&self, _: &TypeSystem) -> Result<ValueHolder, TypeSystemError> {
        Ok(Value::Int(self.default).into())
    }

    fn is_valid_value(&self, _: &TypeSystem, value: &ValueHolder) -> bool {
        value.as_int().is_some_and(|i| self.contains(i))
    }

    fn compare_subtype_helper(&self, _: &TypeSystem, other: &dyn Type) -> Option<SubtypeOrder> {
        let other = other.as_int()?;
        Some(SubtypeOrder::of_ranges(&self.range(), &other.range()))
    }

    fn as_int(&self) -> Option<&IntType> {
        Some(self)
    }
}

#[derive(Debug)]
pub struct IntRangeConstructor;

impl TypeConstructor for IntRangeConstructor {
    fn construct(
        &self,
        _: &TypeSystem,
        arguments: &TypeConstructorArguments,
        _: &[ResolvedType],
    ) -> Result<ResolvedType, TypeSystemError> {
        let id = int_range_constructor_id();
        expect_arity(&id, arguments, Some(0), 3)?;
        let min = int_argument(&id, arguments, 0)?;
        let max = int_argument(&id, arguments, 1)?;
        let default = int_argument(&id, arguments, 2)?;
        let ty = IntType::new(min, max, default).ok_or_else(|| {
            TypeSystemError::invalid_arguments(&id, format!("need {min} <= {default} <= {max}"))
        })?;
        Ok(Arc::new(ty))
    }

    fn format(&self) -> &str {
        "Int[[[0]..[1]]]"
    }
}
