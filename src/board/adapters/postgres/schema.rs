//! Diesel schema for column ordering persistence.

diesel::table! {
    /// Scopes (board columns).
    scopes (id) {
        /// Scope identifier.
        id -> Uuid,
        /// Bumped by every transaction that locks the scope for writing.
        revision -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Items with their scope and dense rank.
    items (id) {
        /// Item identifier.
        id -> Uuid,
        /// Owning scope.
        scope_id -> Uuid,
        /// Zero-based rank within the scope.
        sort_rank -> Int4,
        /// Opaque application payload.
        payload -> Jsonb,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(items -> scopes (scope_id));
diesel::allow_tables_to_appear_in_same_query!(items, scopes);
