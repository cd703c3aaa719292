//! Process-wide record of which discriminator belongs to which author.
//!
//! The registry is shared behind a lock: readers (display names, resolution of
//! unresolved identifiers) run concurrently, writes are serialized.

use hashbrown::HashMap;
use parking_lot::RwLock;
use string_cache::DefaultAtom;

use crate::{Discriminator, Identifier, IdentifierError};

/// How much a registration should be trusted when it clashes with an earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    /// Registered by the code that defines the identifier.
    Authoritative,
    /// Registered while loading data; may be superseded.
    Provisional,
}

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    uuid: String,
    authority: Authority,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<Identifier, Entry>,
    by_uuid: HashMap<String, Identifier>,
    last_discriminator: HashMap<DefaultAtom, Discriminator>,
}

#[derive(Debug, Default)]
pub struct IdentifierRegistry {
    inner: RwLock<Inner>,
}

impl IdentifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `identifier` with a display name and a uuid naming its author.
    ///
    /// Registering the same uuid twice returns the identifier handed out the
    /// first time. An authoritative registration replaces the display name of
    /// a provisional one. A resolved identifier keeps its discriminator when
    /// that discriminator is still free, otherwise it gets a fresh one.
    pub fn add_identifier_with_metadata(
        &self,
        identifier: Identifier,
        name: impl Into<String>,
        uuid: impl Into<String>,
        authority: Authority,
    ) -> Result<Identifier, IdentifierError> {
        let name = name.into();
        let uuid = uuid.into();
        let mut inner = self.inner.write();

        if let Some(existing) = inner.by_uuid.get(&uuid).cloned() {
            if existing.as_str() != identifier.as_str() {
                return Err(IdentifierError::UuidClash {
                    uuid,
                    existing: existing.to_string(),
                });
            }
            if let Some(entry) = inner.entries.get_mut(&existing) {
                if authority == Authority::Authoritative
                    && entry.authority == Authority::Provisional
                {
                    entry.name = name;
                    entry.authority = authority;
                }
            }
            return Ok(existing);
        }

        let text = DefaultAtom::from(identifier.as_str());
        let last = inner.last_discriminator.get(&text).copied().unwrap_or(0);
        let discriminator = if identifier.is_resolved() && !inner.entries.contains_key(&identifier)
        {
            identifier.discriminator()
        } else {
            last.checked_add(1)
                .ok_or_else(|| IdentifierError::DiscriminatorsExhausted(identifier.as_str().to_string()))?
        };

        let mut resolved = identifier.unresolved();
        resolved.set_discriminator(discriminator);
        inner
            .last_discriminator
            .insert(text, last.max(discriminator));
        inner.by_uuid.insert(uuid.clone(), resolved.clone());
        inner.entries.insert(
            resolved.clone(),
            Entry {
                name,
                uuid,
                authority,
            },
        );
        Ok(resolved)
    }

    /// Display name of a registered identifier.
    pub fn get_name(&self, identifier: &Identifier) -> Result<String, IdentifierError> {
        self.try_get_name(identifier)
            .ok_or_else(|| IdentifierError::Unknown(identifier.to_string()))
    }

    pub fn try_get_name(&self, identifier: &Identifier) -> Option<String> {
        let resolved = self.resolve(identifier)?;
        self.inner
            .read()
            .entries
            .get(&resolved)
            .map(|entry| entry.name.clone())
    }

    pub fn try_get_uuid(&self, identifier: &Identifier) -> Option<String> {
        self.inner
            .read()
            .entries
            .get(identifier)
            .map(|entry| entry.uuid.clone())
    }

    /// The registered identifier `identifier` refers to.
    ///
    /// A resolved identifier resolves to itself if registered. An unresolved
    /// one resolves only when exactly one registered identifier has its text.
    pub fn resolve(&self, identifier: &Identifier) -> Option<Identifier> {
        let inner = self.inner.read();
        if identifier.is_resolved() {
            return inner
                .entries
                .contains_key(identifier)
                .then(|| identifier.clone());
        }
        let mut candidates = inner.entries.keys().filter(|id| id.matches(identifier));
        match (candidates.next(), candidates.next()) {
            (Some(only), None) => Some(only.clone()),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
