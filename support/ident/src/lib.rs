//! Compact interned identifiers with a numeric discriminator.
//!
//! An [`Identifier`] is a short name (record field, enum value, type id) plus a
//! discriminator that tells apart identifiers registered by different authors
//! under the same text. The text part is interned through `string_cache`, so
//! clones and comparisons of the text are cheap.
//!
//! A discriminator of `0` means the identifier is *unresolved*: it was typed
//! in by hand or read from a file that did not record a discriminator. The
//! [`IdentifierRegistry`] assigns real discriminators.
//!
//! # Example
//!
//! ```
//! use weft_ident::Identifier;
//!
//! let field: Identifier = "count".parse().unwrap();
//! assert!(!field.is_resolved());
//!
//! let resolved = Identifier::with_discriminator("count", 2).unwrap();
//! assert_eq!(resolved.to_string(), "count'2");
//! assert!(field.matches(&resolved));
//! assert_ne!(field, resolved);
//! ```

mod registry;

pub use registry::{Authority, IdentifierRegistry};

use core::{cmp::Ordering, fmt, hash, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use string_cache::DefaultAtom;
use thiserror::Error;

/// Maximum number of bytes in the text part of an identifier.
pub const MAX_IDENTIFIER_LENGTH: usize = 32;

/// Separates the text from the discriminator in the canonical form.
pub const DISCRIMINATOR_DELIMITER: char = '\'';

pub type Discriminator = u16;

/// Discriminator given to identifiers that the system itself defines.
pub const BUILTIN_DISCRIMINATOR: Discriminator = 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("identifier is empty")]
    Empty,

    #[error("identifier `{0}` is longer than {max} bytes", max = MAX_IDENTIFIER_LENGTH)]
    TooLong(String),

    #[error("identifier `{text}` contains invalid character {ch:?}")]
    InvalidCharacter { text: String, ch: char },

    #[error("invalid discriminator in `{0}`")]
    InvalidDiscriminator(String),

    #[error("unknown identifier `{0}`")]
    Unknown(String),

    #[error("uuid `{uuid}` is already registered for `{existing}`")]
    UuidClash { uuid: String, existing: String },

    #[error("no discriminators left for `{0}`")]
    DiscriminatorsExhausted(String),
}

/// Interned name plus discriminator.
///
/// `PartialEq`, `Eq`, `Hash` and `Ord` are *strict*: they compare text and
/// discriminator, so identifiers can key sorted and hashed containers.
///
/// The looser comparison used when reading user input is [`Identifier::matches`],
/// where an unresolved side matches any discriminator. That relation is not
/// transitive (`x'1` and `x'2` both match `x` but not each other), which is why
/// it is never used as the `Eq` of a container key.
#[derive(Clone)]
pub struct Identifier {
    text: DefaultAtom,
    discriminator: Discriminator,
}

impl Identifier {
    /// Create an unresolved identifier.
    pub fn new(text: &str) -> Result<Self, IdentifierError> {
        Self::with_discriminator(text, 0)
    }

    pub fn with_discriminator(
        text: &str,
        discriminator: Discriminator,
    ) -> Result<Self, IdentifierError> {
        validate_text(text)?;
        Ok(Self {
            text: DefaultAtom::from(text),
            discriminator,
        })
    }

    /// Identifier for something the system defines itself (built-in types and
    /// constructors, fixed field names).
    ///
    /// Panics if `text` is not a valid identifier: built-in names are fixed in
    /// code, so that is a bug.
    pub fn builtin(text: &'static str) -> Self {
        Self::with_discriminator(text, BUILTIN_DISCRIMINATOR)
            .expect("Bug: invalid built-in identifier")
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn discriminator(&self) -> Discriminator {
        self.discriminator
    }

    pub fn is_resolved(&self) -> bool {
        self.discriminator != 0
    }

    /// Give an unresolved identifier its discriminator.
    ///
    /// Resolved identifiers are immutable; calling this on one is a bug.
    pub fn set_discriminator(&mut self, discriminator: Discriminator) {
        debug_assert!(
            !self.is_resolved(),
            "Bug: discriminator of `{self}` is already resolved"
        );
        self.discriminator = discriminator;
    }

    /// Same identifier without its discriminator.
    pub fn unresolved(&self) -> Self {
        Self {
            text: self.text.clone(),
            discriminator: 0,
        }
    }

    /// Weak equality: the texts agree and either the discriminators agree or
    /// one of the two sides is unresolved.
    ///
    /// Not transitive. Only use this for lookups by linear scan.
    pub fn matches(&self, other: &Identifier) -> bool {
        self.text == other.text
            && (self.discriminator == other.discriminator
                || !self.is_resolved()
                || !other.is_resolved())
    }

    /// Canonical text: `text` when unresolved, `text'N` otherwise.
    pub fn serialize_to_string(&self) -> String {
        self.to_string()
    }

    pub fn deserialize_from_string(s: &str) -> Result<Self, IdentifierError> {
        match s.split_once(DISCRIMINATOR_DELIMITER) {
            None => Self::new(s),
            Some((text, discriminator)) => {
                let discriminator = discriminator
                    .parse::<Discriminator>()
                    .ok()
                    .filter(|d| *d != 0)
                    .ok_or_else(|| IdentifierError::InvalidDiscriminator(s.to_string()))?;
                Self::with_discriminator(text, discriminator)
            }
        }
    }
}

/// Check the text part of an identifier.
///
/// The allowed alphabet excludes the path delimiter and the discriminator
/// delimiter, and the first character is never a digit so that a serialized
/// path step can be told apart from an array index.
pub fn validate_text(text: &str) -> Result<(), IdentifierError> {
    if text.is_empty() {
        return Err(IdentifierError::Empty);
    }
    if text.len() > MAX_IDENTIFIER_LENGTH {
        return Err(IdentifierError::TooLong(text.to_string()));
    }
    for (i, ch) in text.chars().enumerate() {
        let ok = ch == '_' || ch.is_ascii_alphabetic() || (i > 0 && ch.is_ascii_digit());
        if !ok {
            return Err(IdentifierError::InvalidCharacter {
                text: text.to_string(),
                ch,
            });
        }
    }
    Ok(())
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text && self.discriminator == other.discriminator
    }
}

impl Eq for Identifier {}

impl hash::Hash for Identifier {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
        self.discriminator.hash(state);
    }
}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str()
            .cmp(other.as_str())
            .then(self.discriminator.cmp(&other.discriminator))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_resolved() {
            write!(f, "{}{}{}", self.text, DISCRIMINATOR_DELIMITER, self.discriminator)
        } else {
            f.write_str(&self.text)
        }
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({self})")
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::deserialize_from_string(s)
    }
}

impl TryFrom<&str> for Identifier {
    type Error = IdentifierError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::deserialize_from_string(s)
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::deserialize_from_string(&s).map_err(de::Error::custom)
    }
}
