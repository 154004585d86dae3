//! Item (card) aggregate and its unplaced draft form.

use super::{ItemId, Rank, ScopeId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque application payload carried with an item.
///
/// The ordering core stores and returns it verbatim and never inspects it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemPayload(Value);

impl ItemPayload {
    /// Wraps a JSON document.
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self(value)
    }

    /// Returns the JSON document.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for ItemPayload {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// An item positioned within a scope.
///
/// Callers hold copies; the list store owns the authoritative state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    scope_id: ScopeId,
    rank: Rank,
    payload: ItemPayload,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedItemData {
    /// Persisted item identifier.
    pub id: ItemId,
    /// Scope the item currently belongs to.
    pub scope_id: ScopeId,
    /// Persisted rank within the scope.
    pub rank: Rank,
    /// Persisted application payload.
    pub payload: ItemPayload,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Item {
    /// Reconstructs an item from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedItemData) -> Self {
        Self {
            id: data.id,
            scope_id: data.scope_id,
            rank: data.rank,
            payload: data.payload,
            created_at: data.created_at,
        }
    }

    /// Returns the item identifier.
    #[must_use]
    pub const fn id(&self) -> ItemId {
        self.id
    }

    /// Returns the scope the item belongs to.
    #[must_use]
    pub const fn scope_id(&self) -> ScopeId {
        self.scope_id
    }

    /// Returns the rank within the scope.
    #[must_use]
    pub const fn rank(&self) -> Rank {
        self.rank
    }

    /// Returns the application payload.
    #[must_use]
    pub const fn payload(&self) -> &ItemPayload {
        &self.payload
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Sets the rank after a committed move.
    pub const fn set_rank(&mut self, rank: Rank) {
        self.rank = rank;
    }

    /// Moves the item into another scope at the given rank.
    pub const fn relocate(&mut self, scope_id: ScopeId, rank: Rank) {
        self.scope_id = scope_id;
        self.rank = rank;
    }
}

/// An item that has an identity and payload but no position yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDraft {
    id: ItemId,
    scope_id: ScopeId,
    payload: ItemPayload,
    created_at: DateTime<Utc>,
}

impl ItemDraft {
    /// Creates a draft for the given scope stamped with the current time.
    #[must_use]
    pub fn new(scope_id: ScopeId, payload: ItemPayload, clock: &impl Clock) -> Self {
        Self {
            id: ItemId::new(),
            scope_id,
            payload,
            created_at: clock.utc(),
        }
    }

    /// Returns the identifier the item will carry.
    #[must_use]
    pub const fn id(&self) -> ItemId {
        self.id
    }

    /// Returns the target scope.
    #[must_use]
    pub const fn scope_id(&self) -> ScopeId {
        self.scope_id
    }

    /// Places the draft at a rank, producing the item.
    #[must_use]
    pub fn place(self, rank: Rank) -> Item {
        Item {
            id: self.id,
            scope_id: self.scope_id,
            rank,
            payload: self.payload,
            created_at: self.created_at,
        }
    }
}
