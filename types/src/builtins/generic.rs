use alloc::{sync::Arc, vec};

use weft_ident::Identifier;

use crate::{
    CompoundType, GenericValue, ModelError, PathStep, ResolvedType, SubtypeOrder, Type,
    TypeConstructor, TypeConstructorArguments, TypeExp, TypeSystem, TypeSystemError, Value,
    ValueHolder,
    builtins::{expect_arity, generic_constructor_id, size_argument},
};

/// Wraps a type containing type variables. The value holds an assignment
/// for each variable, and the wrapped value has the wrapped type with those
/// assignments substituted in.
#[derive(Debug, Clone)]
pub struct GenericType {
    wrapped: TypeExp,
    num_variables: usize,
}

impl GenericType {
    pub fn type_exp(wrapped: TypeExp, num_variables: usize) -> TypeExp {
        TypeExp::constructed(
            generic_constructor_id(),
            vec![wrapped],
            vec![Value::Int(num_variables as i64).into()],
        )
    }

    /// The step from a generic value to its wrapped value.
    pub fn step_to_value() -> PathStep {
        PathStep::Field(Identifier::builtin("value"))
    }

    pub fn wrapped_type(&self) -> &TypeExp {
        &self.wrapped
    }

    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    fn generic_value<'v>(&self, value: &'v ValueHolder) -> Result<&'v GenericValue, ModelError> {
        value.as_generic().ok_or_else(|| ModelError::WrongKind {
            expected: "generic",
            found: value.kind_name().into(),
        })
    }

    /// The wrapped type with the current assignments substituted.
    pub fn instantiated_type_exp(&self, value: &ValueHolder) -> TypeExp {
        match value.as_generic() {
            Some(generic) => self.wrapped.substitute_type_variables(&generic.type_assignments),
            None => self.wrapped.clone(),
        }
    }

    /// The type assigned to variable `index`, or `None` if it is unassigned.
    pub fn get_type_assignment<'v>(&self, value: &'v ValueHolder, index: usize) -> Option<&'v TypeExp> {
        value
            .as_generic()?
            .type_assignments
            .get(index)
            .filter(|assignment| !assignment.is_null())
    }

    pub fn is_any_type_variable_unassigned(&self, value: &ValueHolder) -> bool {
        value.as_generic().is_some_and(|generic| {
            generic
                .type_assignments
                .iter()
                .any(TypeExp::is_null)
        })
    }

    /// Replace the assignments and re-instantiate.
    ///
    /// Missing trailing assignments are unassigned. Nothing happens if the
    /// assignments are unchanged. Otherwise the wrapped value is kept if it is
    /// still valid for the new instantiation, and reset to its default if not.
    pub fn set_type_variable_assignment_and_instantiate(
        &self,
        type_system: &TypeSystem,
        value: &mut ValueHolder,
        assignments: &[TypeExp],
    ) -> Result<(), ModelError> {
        if assignments.len() > self.num_variables {
            return Err(ModelError::TooManyTypeAssignments {
                given: assignments.len(),
                num_variables: self.num_variables,
            });
        }
        let mut padded = assignments.to_vec();
        padded.resize(self.num_variables, TypeExp::Null);

        let current = self.generic_value(value)?;
        if current.type_assignments == padded {
            return Ok(());
        }
        let instantiated = self.wrapped.substitute_type_variables(&padded);
        let ty = type_system.resolve(&instantiated)?;
        let wrapped_value = if ty.is_valid_value(type_system, &current.value) {
            current.value.clone()
        } else {
            ty.create_value(type_system)?
        };

        let generic = value
            .copy_contents_and_get_non_const()
            .as_generic_mut()
            .expect("Bug: checked above");
        generic.type_assignments = padded;
        generic.value = wrapped_value;
        Ok(())
    }
}

impl Type for GenericType {
    fn create_value(&self, type_system: &TypeSystem) -> Result<ValueHolder, TypeSystemError> {
        let wrapped_value = type_system.resolve(&self.wrapped)?.create_value(type_system)?;
        Ok(Value::Generic(GenericValue {
            type_assignments: vec![TypeExp::Null; self.num_variables],
            value: wrapped_value,
        })
        .into())
    }

    fn is_valid_value(&self, type_system: &TypeSystem, value: &ValueHolder) -> bool {
        let Some(generic) = value.as_generic() else {
            return false;
        };
        generic.type_assignments.len() == self.num_variables
            && type_system
                .try_resolve(&self.instantiated_type_exp(value))
                .is_some_and(|ty| ty.is_valid_value(type_system, &generic.value))
    }

    fn compare_subtype_helper(
        &self,
        type_system: &TypeSystem,
        other: &dyn Type,
    ) -> Option<SubtypeOrder> {
        let other = other.as_generic()?;
        if self.num_variables != other.num_variables {
            return Some(SubtypeOrder::IsUnrelated);
        }
        Some(type_system.compare_subtype(&self.wrapped, &other.wrapped))
    }

    fn as_compound(&self) -> Option<&dyn CompoundType> {
        Some(self)
    }

    fn as_generic(&self) -> Option<&GenericType> {
        Some(self)
    }
}

impl CompoundType for GenericType {
    fn num_children(&self, value: &ValueHolder) -> usize {
        usize::from(value.as_generic().is_some())
    }

    fn child<'v>(&self, value: &'v ValueHolder, index: usize) -> (&'v ValueHolder, PathStep, TypeExp) {
        assert_eq!(index, 0, "Bug: generic types have a single child");
        let generic = value
            .as_generic()
            .expect("Bug: generic type given a non-generic value");
        (&generic.value, Self::step_to_value(), self.instantiated_type_exp(value))
    }

    fn child_non_const<'v>(
        &self,
        value: &'v mut ValueHolder,
        index: usize,
    ) -> (&'v mut ValueHolder, PathStep, TypeExp) {
        assert_eq!(index, 0, "Bug: generic types have a single child");
        let child_type = self.instantiated_type_exp(value);
        let generic = value
            .copy_contents_and_get_non_const()
            .as_generic_mut()
            .expect("Bug: generic type given a non-generic value");
        (&mut generic.value, Self::step_to_value(), child_type)
    }

    fn child_index_from_step(&self, value: &ValueHolder, step: &PathStep) -> Option<usize> {
        (value.as_generic().is_some() && step.matches(&Self::step_to_value())).then_some(0)
    }

    fn are_different_non_recursively(&self, a: &ValueHolder, b: &ValueHolder) -> bool {
        let assignments = |v: &ValueHolder| v.as_generic().map(|g| g.type_assignments.clone());
        assignments(a) != assignments(b)
    }
}

#[derive(Debug)]
pub struct GenericConstructor;

impl TypeConstructor for GenericConstructor {
    fn construct(
        &self,
        _: &TypeSystem,
        arguments: &TypeConstructorArguments,
        _: &[ResolvedType],
    ) -> Result<ResolvedType, TypeSystemError> {
        let id = generic_constructor_id();
        expect_arity(&id, arguments, Some(1), 1)?;
        let num_variables = size_argument(&id, arguments, 0)?;
        if num_variables == 0 {
            return Err(TypeSystemError::invalid_arguments(&id, "a generic type needs a type variable"));
        }
        Ok(Arc::new(GenericType {
            wrapped: arguments.type_arguments[0].clone(),
            num_variables,
        }))
    }

    fn format(&self) -> &str {
        "Generic[[[0]]]<{0}>"
    }
}
