//! List store port: scoped reads and transactional rank writes.

use super::ChangeSet;
use crate::board::domain::{BoardDomainError, Item, ItemDraft, ItemId, Scope, ScopeId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for list store operations.
pub type ListStoreResult<T> = Result<T, ListStoreError>;

/// Durable storage of scopes and ranked items.
///
/// Rank writes only happen through [`ListStore::create`] (append) and
/// [`ListStore::commit`]; there is no direct per-row rank update.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListStore: Send + Sync {
    /// Stores a new, empty scope.
    ///
    /// # Errors
    ///
    /// Returns [`ListStoreError::DuplicateScope`] when the identifier is
    /// already taken.
    async fn create_scope(&self, scope: &Scope) -> ListStoreResult<()>;

    /// Deletes a scope together with every item in it.
    ///
    /// # Errors
    ///
    /// Returns [`ListStoreError::ScopeNotFound`] when the scope does not
    /// exist.
    async fn delete_scope(&self, id: ScopeId) -> ListStoreResult<()>;

    /// Finds a scope by identifier.
    ///
    /// Returns `None` when the scope does not exist.
    async fn find_scope(&self, id: ScopeId) -> ListStoreResult<Option<Scope>>;

    /// Returns all scopes, oldest first.
    async fn list_scopes(&self) -> ListStoreResult<Vec<Scope>>;

    /// Finds an item by identifier.
    ///
    /// Returns `None` when the item does not exist.
    async fn find_item(&self, id: ItemId) -> ListStoreResult<Option<Item>>;

    /// Returns the committed items of a scope in ascending rank order.
    ///
    /// # Errors
    ///
    /// Returns [`ListStoreError::ScopeNotFound`] when the scope does not
    /// exist.
    async fn list_by_scope(&self, scope: ScopeId) -> ListStoreResult<Vec<Item>>;

    /// Appends a drafted item at rank `count(scope)` in one atomic step.
    ///
    /// # Errors
    ///
    /// Returns [`ListStoreError::ScopeNotFound`] when the target scope does
    /// not exist, or [`ListStoreError::Conflict`] when the transaction
    /// times out.
    async fn create(&self, draft: ItemDraft) -> ListStoreResult<Item>;

    /// Applies a change set as a single transaction.
    ///
    /// Either every write becomes visible or none does.
    ///
    /// # Errors
    ///
    /// Returns [`ListStoreError::Conflict`] when an expected snapshot no
    /// longer matches committed state or the transaction times out,
    /// [`ListStoreError::ItemNotFound`] / [`ListStoreError::ScopeNotFound`]
    /// for missing rows, and [`ListStoreError::InvariantViolation`] when the
    /// result would not be densely ranked.
    async fn commit(&self, changes: ChangeSet) -> ListStoreResult<()>;
}

/// Why a transaction lost against a concurrent writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConflictKind {
    /// The scope changed after the plan's snapshot was read.
    #[error("scope {0} changed since it was read")]
    StaleSnapshot(ScopeId),

    /// The transaction did not obtain its locks in time.
    #[error("transaction timed out")]
    Timeout,

    /// The database aborted the transaction to preserve serializability.
    #[error("serialization failure")]
    Serialization,
}

/// Errors returned by list store implementations.
#[derive(Debug, Clone, Error)]
pub enum ListStoreError {
    /// The item was not found.
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),

    /// The scope was not found.
    #[error("scope not found: {0}")]
    ScopeNotFound(ScopeId),

    /// An item with the same identifier already exists.
    #[error("duplicate item identifier: {0}")]
    DuplicateItem(ItemId),

    /// A scope with the same identifier already exists.
    #[error("duplicate scope identifier: {0}")]
    DuplicateScope(ScopeId),

    /// A concurrent transaction invalidated this one; retry with a fresh
    /// read.
    #[error("write conflict: {0}")]
    Conflict(ConflictKind),

    /// A change set wrote an item outside the scopes it declared.
    #[error("change set writes item {0} outside its expected scopes")]
    UndeclaredWrite(ItemId),

    /// Applying the writes would leave a scope without dense ranks.
    #[error("rank invariant violated: {0}")]
    InvariantViolation(#[from] BoardDomainError),

    /// The underlying store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ListStoreError {
    /// Wraps a connectivity error.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }

    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
