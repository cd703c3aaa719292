use alloc::{collections::VecDeque, sync::Arc, vec::Vec};

use hashbrown::{HashMap, HashSet};
use parking_lot::RwLock;
use tracing::trace;

use crate::{
    RegisteredTypeId, ResolvedType, SubtypeOrder, Type, TypeConstructor, TypeConstructorId,
    TypeExp, TypeSystemError, builtins,
};

/// Owns every registered type and type constructor, and resolves type
/// expressions against them.
///
/// Registration needs `&mut self`; everything else takes `&self` and may run
/// from many threads at once. Constructed types are memoized per expression.
#[derive(Debug, Default)]
pub struct TypeSystem {
    types: HashMap<RegisteredTypeId, ResolvedType>,
    constructors: HashMap<TypeConstructorId, Arc<dyn TypeConstructor>>,
    /// Declared direct supertypes of registered types.
    supertypes: HashMap<RegisteredTypeId, Vec<RegisteredTypeId>>,
    constructed: RwLock<HashMap<TypeExp, ResolvedType>>,
}

impl TypeSystem {
    /// A type system with the built-in types and constructors registered.
    pub fn new() -> Self {
        let mut type_system = Self::empty();
        builtins::register_builtins(&mut type_system);
        type_system
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn add_type(
        &mut self,
        id: RegisteredTypeId,
        ty: impl Type + 'static,
    ) -> Result<TypeExp, TypeSystemError> {
        if self.types.contains_key(&id) {
            return Err(TypeSystemError::DuplicateType(id));
        }
        self.types.insert(id.clone(), Arc::new(ty));
        Ok(TypeExp::Registered(id))
    }

    pub fn add_type_constructor(
        &mut self,
        id: TypeConstructorId,
        constructor: impl TypeConstructor + 'static,
    ) -> Result<(), TypeSystemError> {
        if self.constructors.contains_key(&id) {
            return Err(TypeSystemError::DuplicateTypeConstructor(id));
        }
        self.constructors.insert(id, Arc::new(constructor));
        Ok(())
    }

    /// Declare that `id` is a subtype of each of `supertypes` and a supertype
    /// of each of `subtypes`. Declarations are followed transitively.
    pub fn add_related_types(
        &mut self,
        id: &RegisteredTypeId,
        supertypes: &[RegisteredTypeId],
        subtypes: &[RegisteredTypeId],
    ) {
        self.supertypes
            .entry(id.clone())
            .or_default()
            .extend(supertypes.iter().cloned());
        for subtype in subtypes {
            self.supertypes
                .entry(subtype.clone())
                .or_default()
                .push(id.clone());
        }
    }

    pub fn get_registered_type(&self, id: &RegisteredTypeId) -> Result<&ResolvedType, TypeSystemError> {
        self.try_get_registered_type(id)
            .ok_or_else(|| TypeSystemError::UnknownType(id.clone()))
    }

    pub fn try_get_registered_type(&self, id: &RegisteredTypeId) -> Option<&ResolvedType> {
        self.types.get(id)
    }

    pub fn get_type_constructor(
        &self,
        id: &TypeConstructorId,
    ) -> Result<&Arc<dyn TypeConstructor>, TypeSystemError> {
        self.try_get_type_constructor(id)
            .ok_or_else(|| TypeSystemError::UnknownTypeConstructor(id.clone()))
    }

    pub fn try_get_type_constructor(&self, id: &TypeConstructorId) -> Option<&Arc<dyn TypeConstructor>> {
        self.constructors.get(id)
    }

    pub fn resolve(&self, exp: &TypeExp) -> Result<ResolvedType, TypeSystemError> {
        match exp {
            TypeExp::Null => Err(TypeSystemError::NullTypeExp),
            TypeExp::Registered(id) => self.get_registered_type(id).cloned(),
            TypeExp::Constructed(id, arguments) => {
                let cached = self.constructed.read().get(exp).cloned();
                if let Some(ty) = cached {
                    return Ok(ty);
                }
                let constructor = self.get_type_constructor(id)?;
                let resolved = arguments
                    .type_arguments
                    .iter()
                    .map(|argument| self.resolve(argument))
                    .collect::<Result<Vec<_>, _>>()?;
                let ty = constructor.construct(self, arguments, &resolved)?;
                trace!(constructor = %id, "Constructed type");
                // Another thread may have raced us here; keep the first one.
                Ok(self
                    .constructed
                    .write()
                    .entry(exp.clone())
                    .or_insert(ty)
                    .clone())
            }
        }
    }

    pub fn try_resolve(&self, exp: &TypeExp) -> Option<ResolvedType> {
        self.resolve(exp).ok()
    }

    /// How the set of values of `a` relates to that of `b`.
    pub fn compare_subtype(&self, a: &TypeExp, b: &TypeExp) -> SubtypeOrder {
        if a == b {
            return SubtypeOrder::IsEquivalent;
        }
        if let (TypeExp::Registered(a_id), TypeExp::Registered(b_id)) = (a, b) {
            if self.is_declared_subtype(a_id, b_id) {
                return SubtypeOrder::IsSubtype;
            }
            if self.is_declared_subtype(b_id, a_id) {
                return SubtypeOrder::IsSupertype;
            }
        }
        let (Some(a_type), Some(b_type)) = (self.try_resolve(a), self.try_resolve(b)) else {
            return SubtypeOrder::IsUnrelated;
        };
        if let Some(order) = a_type.compare_subtype_helper(self, &*b_type) {
            return order;
        }
        if let Some(order) = b_type.compare_subtype_helper(self, &*a_type) {
            return order.reverse();
        }
        SubtypeOrder::IsUnrelated
    }

    pub fn is_subtype(&self, a: &TypeExp, b: &TypeExp) -> bool {
        self.compare_subtype(a, b).is_subtype_or_equivalent()
    }

    /// Whether `a` and `b` are comparable: one contains the other.
    pub fn is_related_type(&self, a: &TypeExp, b: &TypeExp) -> bool {
        matches!(
            self.compare_subtype(a, b),
            SubtypeOrder::IsEquivalent | SubtypeOrder::IsSubtype | SubtypeOrder::IsSupertype
        )
    }

    fn is_declared_subtype(&self, subtype: &RegisteredTypeId, supertype: &RegisteredTypeId) -> bool {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([subtype]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            for parent in self.supertypes.get(current).into_iter().flatten() {
                if parent == supertype {
                    return true;
                }
                queue.push_back(parent);
            }
        }
        false
    }
}

static_assertions::assert_impl_all!(TypeSystem: Send, Sync);
