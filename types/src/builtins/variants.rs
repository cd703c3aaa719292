use alloc::vec::Vec;

use weft_ident::Identifier;

use crate::{
    CompoundType, ModelError, PathStep, RecordValue, Type, TypeExp, TypeSystem, TypeSystemError,
    Value, ValueHolder,
    builtins::record::{Field, are_valid_fields, default_fields, record_mut},
};

/// A record field that only exists under some tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantField {
    pub field: Field,
    /// Tags under which the field exists. Empty means every tag.
    pub tags: Vec<Identifier>,
}

impl VariantField {
    pub fn common(field: Field) -> Self {
        Self {
            field,
            tags: Vec::new(),
        }
    }

    pub fn tagged(field: Field, tags: Vec<Identifier>) -> Self {
        Self { field, tags }
    }

    fn belongs_to(&self, tag: &Identifier) -> bool {
        self.tags.is_empty() || self.tags.contains(tag)
    }
}

/// A record whose set of fields is chosen by a tag.
///
/// The selected tag lives in the value. Changing it swaps the fields, so the
/// record's children change.
#[derive(Debug, Clone)]
pub struct RecordWithVariantsType {
    tags: Vec<Identifier>,
    default_tag: usize,
    fields: Vec<VariantField>,
}

impl RecordWithVariantsType {
    /// Panics if `default_tag` is out of range.
    pub fn new(tags: Vec<Identifier>, default_tag: usize, fields: Vec<VariantField>) -> Self {
        assert!(default_tag < tags.len(), "default tag {default_tag} out of range");
        debug_assert!(
            fields
                .iter()
                .flat_map(|f| &f.tags)
                .all(|tag| tags.contains(tag)),
            "Bug: field restricted to an undeclared tag"
        );
        Self {
            tags,
            default_tag,
            fields,
        }
    }

    pub fn tags(&self) -> &[Identifier] {
        &self.tags
    }

    pub fn default_tag(&self) -> &Identifier {
        &self.tags[self.default_tag]
    }

    fn tag(&self, tag: &Identifier) -> Option<&Identifier> {
        self.tags
            .iter()
            .find(|t| *t == tag)
            .or_else(|| self.tags.iter().find(|t| t.matches(tag)))
    }

    /// Fields present under `tag`, in declaration order.
    pub fn fields_of_tag<'s>(&'s self, tag: &Identifier) -> impl Iterator<Item = &'s Field> {
        self.fields
            .iter()
            .filter(move |f| f.belongs_to(tag))
            .map(|f| &f.field)
    }

    pub fn get_selected_tag<'v>(&self, value: &'v ValueHolder) -> Option<&'v Identifier> {
        value.as_record()?.tag.as_ref()
    }

    /// Switch to `tag`. Fields shared with the old tag keep their values;
    /// the others start at their defaults.
    pub fn select_tag(
        &self,
        type_system: &TypeSystem,
        value: &mut ValueHolder,
        tag: &Identifier,
    ) -> Result<(), ModelError> {
        let tag = self
            .tag(tag)
            .ok_or_else(|| ModelError::UnknownTag(tag.clone()))?;
        let old = value.as_record().ok_or_else(|| ModelError::WrongKind {
            expected: "record",
            found: value.kind_name().into(),
        })?;
        if old.tag.as_ref() == Some(tag) {
            return Ok(());
        }
        let mut record = RecordValue::with_tag(tag.clone());
        for field in self.fields_of_tag(tag) {
            if let Some(existing) = old.get(&field.identifier) {
                record.insert(field.identifier.clone(), existing.clone());
            } else if field.optionality.is_active_by_default() {
                let default = type_system.resolve(&field.type_exp)?.create_value(type_system)?;
                record.insert(field.identifier.clone(), default);
            }
        }
        *record_mut(value) = record;
        Ok(())
    }

    fn active_fields<'s>(&'s self, record: &RecordValue) -> impl Iterator<Item = &'s Field> {
        let tag = record.tag.clone();
        self.fields
            .iter()
            .filter(move |f| tag.as_ref().is_some_and(|tag| f.belongs_to(tag)))
            .map(|f| &f.field)
            .filter(move |field| record.contains(&field.identifier))
    }
}

impl Type for RecordWithVariantsType {
    fn create_value(&self, type_system: &TypeSystem) -> Result<ValueHolder, TypeSystemError> {
        let tag = self.default_tag();
        let mut record = default_fields(type_system, self.fields_of_tag(tag))?;
        record.tag = Some(tag.clone());
        Ok(Value::Record(record).into())
    }

    fn is_valid_value(&self, type_system: &TypeSystem, value: &ValueHolder) -> bool {
        let Some(record) = value.as_record() else {
            return false;
        };
        match &record.tag {
            Some(tag) if self.tags.contains(tag) => {
                are_valid_fields(type_system, record, self.fields_of_tag(tag))
            }
            _ => false,
        }
    }

    fn as_compound(&self) -> Option<&dyn CompoundType> {
        Some(self)
    }

    fn as_record_with_variants(&self) -> Option<&RecordWithVariantsType> {
        Some(self)
    }
}

impl CompoundType for RecordWithVariantsType {
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

    fn are_structurally_different_non_recursively(&self, a: &ValueHolder, b: &ValueHolder) -> bool {
        self.get_selected_tag(a) != self.get_selected_tag(b)
    }
}
