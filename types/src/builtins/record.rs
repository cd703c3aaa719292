use alloc::{string::String, sync::Arc, vec, vec::Vec};

use hashbrown::HashSet;
use weft_ident::Identifier;

use crate::{
    CompoundType, ModelError, PathStep, RecordValue, ResolvedType, SubtypeOrder, Type,
    TypeConstructor, TypeConstructorArguments, TypeExp, TypeSystem, TypeSystemError, Value,
    ValueHolder,
    builtins::{expect_arity, record_constructor_id},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Optionality {
    AlwaysActive,
    OptionalDefaultInactive,
    OptionalDefaultActive,
}

impl Optionality {
    pub fn is_optional(self) -> bool {
        self != Self::AlwaysActive
    }

    pub fn is_active_by_default(self) -> bool {
        self != Self::OptionalDefaultInactive
    }

    fn code(self) -> i64 {
        match self {
            Self::AlwaysActive => 0,
            Self::OptionalDefaultInactive => 1,
            Self::OptionalDefaultActive => 2,
        }
    }

    fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::AlwaysActive),
            1 => Some(Self::OptionalDefaultInactive),
            2 => Some(Self::OptionalDefaultActive),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub identifier: Identifier,
    pub type_exp: TypeExp,
    pub optionality: Optionality,
}

impl Field {
    pub fn new(identifier: Identifier, type_exp: TypeExp) -> Self {
        Self {
            identifier,
            type_exp,
            optionality: Optionality::AlwaysActive,
        }
    }

    pub fn optional(identifier: Identifier, type_exp: TypeExp, optionality: Optionality) -> Self {
        Self {
            identifier,
            type_exp,
            optionality,
        }
    }
}

/// Named fields, some of which may be optional.
///
/// Children are the active fields in declaration order, addressed by field
/// steps. Activating or deactivating a field changes which children exist.
#[derive(Debug, Clone)]
pub struct RecordType {
    fields: Vec<Field>,
}

impl RecordType {
    pub fn new(fields: Vec<Field>) -> Self {
        debug_assert!(
            fields.iter().map(|f| &f.identifier).collect::<HashSet<_>>().len() == fields.len(),
            "Bug: duplicate record field"
        );
        Self { fields }
    }

    /// A record built by the `Record` constructor. Unlike a registered record,
    /// its field types take part in type-variable substitution.
    pub fn constructed_exp(fields: Vec<Field>) -> TypeExp {
        let mut type_arguments = Vec::with_capacity(fields.len());
        let mut value_arguments = Vec::with_capacity(fields.len());
        for field in fields {
            type_arguments.push(field.type_exp);
            value_arguments.push(
                Value::Tuple(vec![
                    Value::Enum(field.identifier).into(),
                    Value::Int(field.optionality.code()).into(),
                ])
                .into(),
            );
        }
        TypeExp::constructed(record_constructor_id(), type_arguments, value_arguments)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look a field up, accepting an unresolved identifier.
    pub fn field(&self, identifier: &Identifier) -> Option<&Field> {
        self.fields
            .iter()
            .find(|field| field.identifier == *identifier)
            .or_else(|| self.fields.iter().find(|field| field.identifier.matches(identifier)))
    }

    pub fn optional_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|field| field.optionality.is_optional())
    }

    pub fn is_activated(&self, value: &ValueHolder, identifier: &Identifier) -> bool {
        match (self.field(identifier), value.as_record()) {
            (Some(field), Some(record)) => record.contains(&field.identifier),
            _ => false,
        }
    }

    pub fn field_value<'v>(&self, value: &'v ValueHolder, identifier: &Identifier) -> Option<&'v ValueHolder> {
        let field = self.field(identifier)?;
        value.as_record()?.get(&field.identifier)
    }

    fn optional_field(&self, identifier: &Identifier) -> Result<&Field, ModelError> {
        let field = self
            .field(identifier)
            .ok_or_else(|| ModelError::UnknownField(identifier.clone()))?;
        if !field.optionality.is_optional() {
            return Err(ModelError::NotOptional(field.identifier.clone()));
        }
        Ok(field)
    }

    /// Give an inactive optional field its default value.
    pub fn activate_field(
        &self,
        type_system: &TypeSystem,
        value: &mut ValueHolder,
        identifier: &Identifier,
    ) -> Result<(), ModelError> {
        let field = self.optional_field(identifier)?;
        if self.is_activated(value, &field.identifier) {
            return Ok(());
        }
        let default = type_system.resolve(&field.type_exp)?.create_value(type_system)?;
        record_mut(value).insert(field.identifier.clone(), default);
        Ok(())
    }

    pub fn deactivate_field(
        &self,
        value: &mut ValueHolder,
        identifier: &Identifier,
    ) -> Result<(), ModelError> {
        let field = self.optional_field(identifier)?;
        if self.is_activated(value, &field.identifier) {
            record_mut(value).fields.remove(&field.identifier);
        }
        Ok(())
    }

    fn active_fields<'s>(&'s self, record: &RecordValue) -> impl Iterator<Item = &'s Field> {
        self.fields
            .iter()
            .filter(move |field| record.contains(&field.identifier))
    }
}

pub(crate) fn record_mut(value: &mut ValueHolder) -> &mut RecordValue {
    value
        .copy_contents_and_get_non_const()
        .as_record_mut()
        .expect("Bug: record type given a non-record value")
}

/// Values of `fields` that a fresh record starts with.
pub(crate) fn default_fields<'a>(
    type_system: &TypeSystem,
    fields: impl IntoIterator<Item = &'a Field>,
) -> Result<RecordValue, TypeSystemError> {
    let mut record = RecordValue::new();
    for field in fields {
        if field.optionality.is_active_by_default() {
            let default = type_system.resolve(&field.type_exp)?.create_value(type_system)?;
            record.insert(field.identifier.clone(), default);
        }
    }
    Ok(record)
}

pub(crate) fn are_valid_fields<'a>(
    type_system: &TypeSystem,
    record: &RecordValue,
    fields: impl IntoIterator<Item = &'a Field>,
) -> bool {
    let mut present = 0;
    for field in fields {
        match record.get(&field.identifier) {
            Some(value) => {
                present += 1;
                let valid = type_system
                    .try_resolve(&field.type_exp)
                    .is_some_and(|ty| ty.is_valid_value(type_system, value));
                if !valid {
                    return false;
                }
            }
            None if !field.optionality.is_optional() => return false,
            None => {}
        }
    }
    // Anything left over is not a field of this record.
    present == record.fields.len()
}

fn optionality_order(a: Optionality, b: Optionality) -> SubtypeOrder {
    match (a.is_optional(), b.is_optional()) {
        (false, true) => SubtypeOrder::IsSubtype,
        (true, false) => SubtypeOrder::IsSupertype,
        _ => SubtypeOrder::IsEquivalent,
    }
}

impl Type for RecordType {
    fn create_value(&self, type_system: &TypeSystem) -> Result<ValueHolder, TypeSystemError> {
        Ok(Value::Record(default_fields(type_system, &self.fields)?).into())
    }

    fn is_valid_value(&self, type_system: &TypeSystem, value: &ValueHolder) -> bool {
        value.as_record().is_some_and(|record| {
            record.tag.is_none() && are_valid_fields(type_system, record, &self.fields)
        })
    }

    fn compare_subtype_helper(
        &self,
        type_system: &TypeSystem,
        other: &dyn Type,
    ) -> Option<SubtypeOrder> {
        let other = other.as_record()?;
        if self.fields.len() != other.fields.len() {
            return Some(SubtypeOrder::IsUnrelated);
        }
        let mut order = SubtypeOrder::IsEquivalent;
        for field in &self.fields {
            let Some(other_field) = other.fields.iter().find(|f| f.identifier == field.identifier)
            else {
                return Some(SubtypeOrder::IsUnrelated);
            };
            order = order
                .product(type_system.compare_subtype(&field.type_exp, &other_field.type_exp))
                .product(optionality_order(field.optionality, other_field.optionality));
        }
        Some(order)
    }

    fn as_compound(&self) -> Option<&dyn CompoundType> {
        Some(self)
    }

    fn as_record(&self) -> Option<&RecordType> {
        Some(self)
    }
}

impl CompoundType for RecordType {
    fn num_children(&self, value: &ValueHolder) -> usize {
        value
            .as_record()
            .map_or(0, |record| self.active_fields(record).count())
    }

    fn child<'v>(&self, value: &'v ValueHolder, index: usize) -> (&'v ValueHolder, PathStep, TypeExp) {
        let record = value
            .as_record()
            .expect("Bug: record type given a non-record value");
        let field = self
            .active_fields(record)
            .nth(index)
            .expect("Bug: record child index out of range");
        let child = record
            .get(&field.identifier)
            .expect("Bug: active field has no value");
        (child, PathStep::Field(field.identifier.clone()), field.type_exp.clone())
    }

    fn child_non_const<'v>(
        &self,
        value: &'v mut ValueHolder,
        index: usize,
    ) -> (&'v mut ValueHolder, PathStep, TypeExp) {
        let record = value
            .as_record()
            .expect("Bug: record type given a non-record value");
        let field = self
            .active_fields(record)
            .nth(index)
            .expect("Bug: record child index out of range");
        let child = record_mut(value)
            .get_mut(&field.identifier)
            .expect("Bug: active field has no value");
        (child, PathStep::Field(field.identifier.clone()), field.type_exp.clone())
    }

    fn child_index_from_step(&self, value: &ValueHolder, step: &PathStep) -> Option<usize> {
        let identifier = step.as_field()?;
        let record = value.as_record()?;
        let active: Vec<&Field> = self.active_fields(record).collect();
        active
            .iter()
            .position(|field| field.identifier == *identifier)
            .or_else(|| active.iter().position(|field| field.identifier.matches(identifier)))
    }
}

#[derive(Debug)]
pub struct RecordConstructor;

impl RecordConstructor {
    fn fields(arguments: &TypeConstructorArguments) -> Result<Vec<Field>, TypeSystemError> {
        let id = record_constructor_id();
        expect_arity(&id, arguments, None, arguments.type_arguments.len())?;
        let mut seen = HashSet::new();
        arguments
            .type_arguments
            .iter()
            .zip(&arguments.value_arguments)
            .map(|(type_exp, descriptor)| {
                let invalid = || {
                    TypeSystemError::invalid_arguments(&id, format!("bad field descriptor {descriptor}"))
                };
                let (identifier, optionality) = match descriptor.as_tuple() {
                    Some([identifier, optionality]) => (
                        identifier.as_enum().ok_or_else(invalid)?,
                        optionality
                            .as_int()
                            .and_then(Optionality::from_code)
                            .ok_or_else(invalid)?,
                    ),
                    _ => return Err(invalid()),
                };
                if !seen.insert(identifier.clone()) {
                    return Err(TypeSystemError::invalid_arguments(
                        &id,
                        format!("duplicate field `{identifier}`"),
                    ));
                }
                Ok(Field::optional(identifier.clone(), type_exp.clone(), optionality))
            })
            .collect()
    }
}

impl TypeConstructor for RecordConstructor {
    fn construct(
        &self,
        _: &TypeSystem,
        arguments: &TypeConstructorArguments,
        _: &[ResolvedType],
    ) -> Result<ResolvedType, TypeSystemError> {
        Ok(Arc::new(RecordType::new(Self::fields(arguments)?)))
    }

    fn format(&self) -> &str {
        "{{{0|, }}}"
    }

    /// Like the format, but with field names: `{x: Int, y?: String}`.
    fn type_name(&self, type_system: &TypeSystem, arguments: &TypeConstructorArguments) -> String {
        let Ok(fields) = Self::fields(arguments) else {
            return crate::format::MALFORMED_TYPE_EXP.into();
        };
        let parts: Vec<String> = fields
            .iter()
            .map(|field| {
                let marker = if field.optionality.is_optional() { "?" } else { "" };
                format!(
                    "{}{marker}: {}",
                    field.identifier.as_str(),
                    field.type_exp.to_string_with(type_system)
                )
            })
            .collect();
        format!("{{{}}}", parts.join(", "))
    }
}
