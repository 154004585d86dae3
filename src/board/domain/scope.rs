//! Scope (board column) value.

use super::ScopeId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// An ordered list of items, such as a board column.
///
/// Titles and other column metadata belong to the surrounding application;
/// the ordering core only needs the identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    id: ScopeId,
    created_at: DateTime<Utc>,
}

impl Scope {
    /// Creates a new scope stamped with the current clock time.
    #[must_use]
    pub fn new(clock: &impl Clock) -> Self {
        Self {
            id: ScopeId::new(),
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a scope from persisted storage.
    #[must_use]
    pub const fn from_persisted(id: ScopeId, created_at: DateTime<Utc>) -> Self {
        Self { id, created_at }
    }

    /// Returns the scope identifier.
    #[must_use]
    pub const fn id(&self) -> ScopeId {
        self.id
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
