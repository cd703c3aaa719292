//! Addresses of values inside a value.
//!
//! A [`Path`] is a sequence of [`PathStep`]s, each either a record field or an
//! array/tuple index. Its canonical text joins steps with `/`, writing indices
//! as bare integers: `points/3/x`.

use core::{fmt, ops::Index, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use smallvec::SmallVec;
use weft_ident::Identifier;

use crate::{ModelError, TypeExp, TypeSystem, ValueHolder};

pub const PATH_DELIMITER: char = '/';

pub type ArrayIndex = usize;

/// One step from a compound value to one of its children.
///
/// Steps are ordered with all fields before all indices, fields by identifier
/// and indices numerically.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathStep {
    Field(Identifier),
    Index(ArrayIndex),
    /// Placeholder that never appears inside a [`Path`].
    NotAStep,
}

impl PathStep {
    pub fn field(identifier: Identifier) -> Self {
        Self::Field(identifier)
    }

    pub fn index(index: ArrayIndex) -> Self {
        Self::Index(index)
    }

    pub fn is_field(&self) -> bool {
        matches!(self, Self::Field(_))
    }

    pub fn is_index(&self) -> bool {
        matches!(self, Self::Index(_))
    }

    pub fn is_step(&self) -> bool {
        !matches!(self, Self::NotAStep)
    }

    pub fn as_field(&self) -> Option<&Identifier> {
        match self {
            Self::Field(identifier) => Some(identifier),
            _ => None,
        }
    }

    pub fn as_index(&self) -> Option<ArrayIndex> {
        match self {
            Self::Index(index) => Some(*index),
            _ => None,
        }
    }

    /// Weak comparison: fields compare with [`Identifier::matches`].
    pub fn matches(&self, other: &PathStep) -> bool {
        match (self, other) {
            (Self::Field(a), Self::Field(b)) => a.matches(b),
            _ => self == other,
        }
    }

    pub fn serialize_to_string(&self) -> String {
        match self {
            Self::Field(identifier) => identifier.serialize_to_string(),
            Self::Index(index) => index.to_string(),
            Self::NotAStep => {
                debug_assert!(false, "Bug: serializing NotAStep");
                String::new()
            }
        }
    }

    pub fn deserialize_from_string(s: &str) -> Result<Self, ModelError> {
        if s.starts_with(|c: char| c.is_ascii_digit()) {
            s.parse::<ArrayIndex>()
                .map(Self::Index)
                .map_err(|_| ModelError::InvalidPath(s.to_string()))
        } else {
            Ok(Self::Field(Identifier::deserialize_from_string(s)?))
        }
    }
}

impl From<Identifier> for PathStep {
    fn from(identifier: Identifier) -> Self {
        Self::Field(identifier)
    }
}

impl From<ArrayIndex> for PathStep {
    fn from(index: ArrayIndex) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(identifier) => write!(f, "{identifier}"),
            Self::Index(index) => write!(f, "[{index}]"),
            Self::NotAStep => f.write_str("<not a step>"),
        }
    }
}

impl fmt::Debug for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PathStep({self})")
    }
}

/// A sequence of steps from some value to one of its descendants.
///
/// Ordered lexicographically by step, so a path sorts right before the paths
/// it is a prefix of.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path {
    steps: SmallVec<[PathStep; 4]>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: impl IntoIterator<Item = PathStep>) -> Self {
        let mut path = Self::new();
        for step in steps {
            path.push_step(step);
        }
        path
    }

    pub fn push_step(&mut self, step: PathStep) {
        debug_assert!(step.is_step(), "Bug: NotAStep pushed onto a path");
        self.steps.push(step);
    }

    pub fn pop_step(&mut self) -> Option<PathStep> {
        self.steps.pop()
    }

    pub fn append(&mut self, other: &Path) {
        self.steps.extend(other.steps.iter().cloned());
    }

    /// Drop the first `num_steps` steps.
    pub fn remove_prefix(&mut self, num_steps: usize) {
        debug_assert!(num_steps <= self.steps.len());
        self.steps.drain(..num_steps.min(self.steps.len()));
    }

    /// Keep only the first `num_steps` steps.
    pub fn truncate(&mut self, num_steps: usize) {
        self.steps.truncate(num_steps);
    }

    pub fn num_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, index: usize) -> &PathStep {
        &self.steps[index]
    }

    pub fn last_step(&self) -> Option<&PathStep> {
        self.steps.last()
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn iter(&self) -> core::slice::Iter<'_, PathStep> {
        self.steps.iter()
    }

    pub fn is_prefix_of(&self, other: &Path) -> bool {
        other.steps.starts_with(&self.steps)
    }

    pub fn is_strict_prefix_of(&self, other: &Path) -> bool {
        self.steps.len() < other.steps.len() && self.is_prefix_of(other)
    }

    pub fn serialize_to_string(&self) -> String {
        let mut out = String::new();
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                out.push(PATH_DELIMITER);
            }
            out.push_str(&step.serialize_to_string());
        }
        out
    }

    pub fn deserialize_from_string(s: &str) -> Result<Self, ModelError> {
        if s.is_empty() {
            return Ok(Self::new());
        }
        s.split(PATH_DELIMITER)
            .map(|part| {
                if part.is_empty() {
                    Err(ModelError::InvalidPath(s.to_string()))
                } else {
                    PathStep::deserialize_from_string(part)
                }
            })
            .collect()
    }

    /// The value this path reaches from `value`, along with its type.
    pub fn follow_value<'v>(
        &self,
        type_system: &TypeSystem,
        type_exp: &TypeExp,
        value: &'v ValueHolder,
    ) -> Result<(&'v ValueHolder, TypeExp), ModelError> {
        let mut current = value;
        let mut current_type = type_exp.clone();
        for (i, step) in self.steps.iter().enumerate() {
            let ty = type_system.resolve(&current_type)?;
            let not_found = || ModelError::PathNotFound {
                path: self.clone(),
                step: i,
            };
            let compound = ty.as_compound().ok_or_else(not_found)?;
            let index = compound
                .child_index_from_step(current, step)
                .ok_or_else(not_found)?;
            let (child, _, child_type) = compound.child(current, index);
            current = child;
            current_type = child_type;
        }
        Ok((current, current_type))
    }

    pub fn try_follow_value<'v>(
        &self,
        type_system: &TypeSystem,
        type_exp: &TypeExp,
        value: &'v ValueHolder,
    ) -> Option<(&'v ValueHolder, TypeExp)> {
        self.follow_value(type_system, type_exp, value).ok()
    }

    /// Like [`Path::follow_value`], but unshares every value along the way so
    /// the returned holder can be overwritten in place.
    pub fn follow_value_mut<'v>(
        &self,
        type_system: &TypeSystem,
        type_exp: &TypeExp,
        value: &'v mut ValueHolder,
    ) -> Result<(&'v mut ValueHolder, TypeExp), ModelError> {
        let mut current = value;
        let mut current_type = type_exp.clone();
        for (i, step) in self.steps.iter().enumerate() {
            let ty = type_system.resolve(&current_type)?;
            let not_found = || ModelError::PathNotFound {
                path: self.clone(),
                step: i,
            };
            let compound = ty.as_compound().ok_or_else(not_found)?;
            let index = compound
                .child_index_from_step(current, step)
                .ok_or_else(not_found)?;
            let (child, _, child_type) = compound.child_non_const(current, index);
            current = child;
            current_type = child_type;
        }
        Ok((current, current_type))
    }
}

impl Index<usize> for Path {
    type Output = PathStep;

    fn index(&self, index: usize) -> &PathStep {
        &self.steps[index]
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a PathStep;
    type IntoIter = core::slice::Iter<'a, PathStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

impl FromIterator<PathStep> for Path {
    fn from_iter<I: IntoIterator<Item = PathStep>>(iter: I) -> Self {
        Self::from_steps(iter)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize_to_string())
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({self})")
    }
}

impl FromStr for Path {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::deserialize_from_string(s)
    }
}

impl Serialize for PathStep {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.serialize_to_string())
    }
}

impl<'de> Deserialize<'de> for PathStep {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::deserialize_from_string(&s).map_err(de::Error::custom)
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.serialize_to_string())
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::deserialize_from_string(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn field(s: &str) -> PathStep {
        PathStep::Field(Identifier::deserialize_from_string(s).unwrap())
    }

    #[test]
    fn test_serialize() {
        let path = Path::from_steps([field("points"), PathStep::Index(3), field("x'2")]);
        assert_eq!(path.serialize_to_string(), "points/3/x'2");
        assert_eq!(path.to_string(), "points/3/x'2");
        assert_eq!(Path::new().serialize_to_string(), "");
        assert_eq!(PathStep::Index(3).to_string(), "[3]");
    }

    #[test]
    fn test_deserialize() {
        let path: Path = "points/3/x'2".parse().unwrap();
        assert_eq!(path.num_steps(), 3);
        assert_eq!(path[0], field("points"));
        assert_eq!(path[1], PathStep::Index(3));
        assert_eq!(path[2], field("x'2"));
        assert_eq!("".parse::<Path>().unwrap(), Path::new());
        assert!("a//b".parse::<Path>().is_err());
        assert!("a/3x".parse::<Path>().is_err());
        assert!("a/b c".parse::<Path>().is_err());
    }

    #[test]
    fn test_round_trip_preserves_text() {
        for text in ["a", "a/0", "a'3/12/b_c/0/d'65535"] {
            let path: Path = text.parse().unwrap();
            assert_eq!(path.serialize_to_string(), text);
        }
    }

    #[test]
    fn test_prefix_and_ordering() {
        let a: Path = "a".parse().unwrap();
        let a0: Path = "a/0".parse().unwrap();
        let a1: Path = "a/1".parse().unwrap();
        let b: Path = "b".parse().unwrap();
        assert!(a.is_prefix_of(&a0));
        assert!(a.is_strict_prefix_of(&a0));
        assert!(a.is_prefix_of(&a));
        assert!(!a.is_strict_prefix_of(&a));
        assert!(!a0.is_prefix_of(&a1));

        let mut paths = vec![b.clone(), a1.clone(), a0.clone(), a.clone()];
        paths.sort();
        assert_eq!(paths, vec![a, a0, a1, b]);
    }

    #[test]
    fn test_fields_sort_before_indices() {
        assert!(field("z") < PathStep::Index(0));
        assert!(PathStep::Index(2) < PathStep::Index(10));
    }

    #[test]
    fn test_editing() {
        let mut path: Path = "a/1/b/2".parse().unwrap();
        assert_eq!(path.pop_step(), Some(PathStep::Index(2)));
        path.remove_prefix(1);
        assert_eq!(path.to_string(), "1/b");
        path.append(&"c/d".parse().unwrap());
        assert_eq!(path.to_string(), "1/b/c/d");
        path.truncate(2);
        assert_eq!(path.to_string(), "1/b");
        assert_eq!(path.last_step(), Some(&field("b")));
    }

    #[test]
    fn test_weak_step_matching() {
        assert!(field("x").matches(&field("x'4")));
        assert!(!field("x'3").matches(&field("x'4")));
        assert!(!field("x").matches(&PathStep::Index(0)));
    }

    #[test]
    fn test_serde() {
        let path: Path = "a/0/b'1".parse().unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"a/0/b'1\"");
        assert_eq!(serde_json::from_str::<Path>(&json).unwrap(), path);
    }
}
