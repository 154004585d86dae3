//! Dense position of an item within its scope.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Zero-based rank of an item within a scope.
///
/// At rest the ranks of a scope are exactly `0..n-1`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Rank(usize);

impl Rank {
    /// The first position in a scope.
    pub const FIRST: Self = Self(0);

    /// Creates a rank from a list index.
    #[must_use]
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    /// Returns the rank as a list index.
    #[must_use]
    pub const fn value(self) -> usize {
        self.0
    }
}

impl From<usize> for Rank {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
