//! How two types relate as sets of values.

use alloc::collections::BTreeSet;
use core::ops::RangeInclusive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubtypeOrder {
    IsEquivalent,
    IsSubtype,
    IsSupertype,
    IsUnrelated,
    /// No value belongs to both types.
    IsDisjoint,
    /// Some values belong to both types, but neither contains the other.
    IsIntersecting,
}

impl SubtypeOrder {
    /// The same relationship seen from the other side.
    pub fn reverse(self) -> Self {
        match self {
            Self::IsSubtype => Self::IsSupertype,
            Self::IsSupertype => Self::IsSubtype,
            other => other,
        }
    }

    /// Combine the orders of two components of a product type (tuple items,
    /// record fields, array element and size).
    ///
    /// Equivalent components do not affect the result and one disjoint
    /// component makes the whole disjoint. Otherwise the components must agree.
    pub fn product(self, other: Self) -> Self {
        match (self, other) {
            (Self::IsEquivalent, order) | (order, Self::IsEquivalent) => order,
            (Self::IsDisjoint, _) | (_, Self::IsDisjoint) => Self::IsDisjoint,
            (a, b) if a == b => a,
            _ => Self::IsUnrelated,
        }
    }

    pub fn product_of(orders: impl IntoIterator<Item = SubtypeOrder>) -> Self {
        orders
            .into_iter()
            .fold(Self::IsEquivalent, |acc, order| acc.product(order))
    }

    pub fn is_subtype_or_equivalent(self) -> bool {
        matches!(self, Self::IsEquivalent | Self::IsSubtype)
    }

    /// Compare two inclusive ranges as sets.
    pub fn of_ranges<T: Ord>(a: &RangeInclusive<T>, b: &RangeInclusive<T>) -> Self {
        let (a_start, a_end) = (a.start(), a.end());
        let (b_start, b_end) = (b.start(), b.end());
        if a_start == b_start && a_end == b_end {
            Self::IsEquivalent
        } else if b_start <= a_start && a_end <= b_end {
            Self::IsSubtype
        } else if a_start <= b_start && b_end <= a_end {
            Self::IsSupertype
        } else if a_start <= b_end && b_start <= a_end {
            Self::IsIntersecting
        } else {
            Self::IsDisjoint
        }
    }

    pub fn of_sets<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> Self {
        if a == b {
            Self::IsEquivalent
        } else if a.is_subset(b) {
            Self::IsSubtype
        } else if a.is_superset(b) {
            Self::IsSupertype
        } else if a.is_disjoint(b) {
            Self::IsDisjoint
        } else {
            Self::IsIntersecting
        }
    }
}
