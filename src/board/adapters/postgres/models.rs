//! Diesel row models for column ordering persistence.

use super::schema::{items, scopes};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result and insert model for scope records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = scopes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ScopeRow {
    /// Scope identifier.
    pub id: uuid::Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Query result row for item records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ItemRow {
    /// Item identifier.
    pub id: uuid::Uuid,
    /// Owning scope.
    pub scope_id: uuid::Uuid,
    /// Rank within the scope.
    pub sort_rank: i32,
    /// Payload JSON document.
    pub payload: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for item records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = items)]
pub struct NewItemRow {
    /// Item identifier.
    pub id: uuid::Uuid,
    /// Owning scope.
    pub scope_id: uuid::Uuid,
    /// Rank within the scope.
    pub sort_rank: i32,
    /// Payload JSON document.
    pub payload: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
