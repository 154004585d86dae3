//! Ordering service: plans moves against committed snapshots and applies
//! them through the list store as single transactions.

use crate::board::{
    config::OrderingConfig,
    domain::{
        Item, ItemDraft, ItemId, ItemPayload, RankedList, Scope, ScopeId,
        reorder::{
            plan_delete_at, plan_insert_at, plan_move_across_scopes, plan_move_within_scope,
            plan_normalize,
        },
    },
    ports::{ChangeSet, ConflictKind, ListStore, ListStoreError},
};
use mockable::Clock;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Service-level errors for ordering operations.
///
/// `ItemNotFound`, `ScopeNotFound` and `InvalidScope` mean the caller's view
/// is stale and should be refreshed. `Conflict` means the operation may be
/// retried from a fresh read.
#[derive(Debug, Error)]
pub enum OrderingError {
    /// The referenced item does not exist.
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),

    /// The referenced scope does not exist.
    #[error("scope not found: {0}")]
    ScopeNotFound(ScopeId),

    /// The item does not belong to the stated scope.
    #[error("item {item} belongs to scope {actual}, not {scope}")]
    InvalidScope {
        /// Item the caller referenced.
        item: ItemId,
        /// Scope the caller stated.
        scope: ScopeId,
        /// Scope the item actually belongs to.
        actual: ScopeId,
    },

    /// A concurrent transaction won; retry with a fresh read.
    #[error("ordering conflict: {0}")]
    Conflict(ConflictKind),

    /// The store could not be reached.
    #[error(transparent)]
    StoreUnavailable(ListStoreError),

    /// Any other store failure.
    #[error(transparent)]
    Store(ListStoreError),
}

impl OrderingError {
    /// Returns `true` when re-reading and re-planning may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<ListStoreError> for OrderingError {
    fn from(err: ListStoreError) -> Self {
        match err {
            ListStoreError::ItemNotFound(id) => Self::ItemNotFound(id),
            ListStoreError::ScopeNotFound(id) => Self::ScopeNotFound(id),
            ListStoreError::Conflict(kind) => Self::Conflict(kind),
            ListStoreError::Unavailable(_) => Self::StoreUnavailable(err),
            other => Self::Store(other),
        }
    }
}

/// Result type for ordering service operations.
pub type OrderingResult<T> = Result<T, OrderingError>;

/// Ordering orchestration service.
///
/// Each mutation reads the committed ranks of the scopes it touches, asks
/// the reorder planner for the resulting rank changes, and commits them as
/// one [`ChangeSet`] guarded by the snapshots it read. A snapshot that went
/// stale in between surfaces as [`OrderingError::Conflict`], or is retried
/// from a fresh read when [`OrderingConfig::max_attempts`] allows it.
#[derive(Clone)]
pub struct OrderingService<S, C>
where
    S: ListStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    config: OrderingConfig,
}

impl<S, C> OrderingService<S, C>
where
    S: ListStore,
    C: Clock + Send + Sync,
{
    /// Creates a new ordering service with default configuration.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self {
            store,
            clock,
            config: OrderingConfig::default(),
        }
    }

    /// Replaces the service configuration.
    #[must_use]
    pub const fn with_config(mut self, config: OrderingConfig) -> Self {
        self.config = config;
        self
    }

    /// Creates an empty scope.
    ///
    /// # Errors
    ///
    /// Returns [`OrderingError`] when the store rejects the scope.
    pub async fn create_scope(&self) -> OrderingResult<Scope> {
        let scope = Scope::new(&*self.clock);
        self.store.create_scope(&scope).await?;
        Ok(scope)
    }

    /// Deletes a scope and every item in it.
    ///
    /// # Errors
    ///
    /// Returns [`OrderingError::ScopeNotFound`] when the scope does not
    /// exist.
    pub async fn delete_scope(&self, scope: ScopeId) -> OrderingResult<()> {
        self.store.delete_scope(scope).await?;
        tracing::debug!(%scope, "deleted scope");
        Ok(())
    }

    /// Returns a single scope.
    ///
    /// # Errors
    ///
    /// Returns [`OrderingError::ScopeNotFound`] when the scope does not
    /// exist.
    pub async fn get_scope(&self, scope: ScopeId) -> OrderingResult<Scope> {
        self.store
            .find_scope(scope)
            .await?
            .ok_or(OrderingError::ScopeNotFound(scope))
    }

    /// Returns all scopes, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`OrderingError`] when the store read fails.
    pub async fn list_scopes(&self) -> OrderingResult<Vec<Scope>> {
        Ok(self.store.list_scopes().await?)
    }

    /// Returns the items of a scope in rank order.
    ///
    /// # Errors
    ///
    /// Returns [`OrderingError::ScopeNotFound`] when the scope does not
    /// exist.
    pub async fn list_items(&self, scope: ScopeId) -> OrderingResult<Vec<Item>> {
        Ok(self.store.list_by_scope(scope).await?)
    }

    /// Returns a single item.
    ///
    /// # Errors
    ///
    /// Returns [`OrderingError::ItemNotFound`] when the item does not exist.
    pub async fn get_item(&self, item: ItemId) -> OrderingResult<Item> {
        self.store
            .find_item(item)
            .await?
            .ok_or(OrderingError::ItemNotFound(item))
    }

    /// Appends a new item to the end of a scope.
    ///
    /// # Errors
    ///
    /// Returns [`OrderingError::ScopeNotFound`] when the scope does not
    /// exist.
    pub async fn create_item(
        &self,
        scope: ScopeId,
        payload: ItemPayload,
    ) -> OrderingResult<Item> {
        self.insert(scope, payload, None).await
    }

    /// Inserts a new item at `at_index` (clamped to `[0, len]`), or at the
    /// end when no index is given. Items at or after the index shift down
    /// by one.
    ///
    /// # Errors
    ///
    /// Returns [`OrderingError::ScopeNotFound`] when the scope does not
    /// exist and [`OrderingError::Conflict`] when a concurrent change wins.
    pub async fn insert(
        &self,
        scope: ScopeId,
        payload: ItemPayload,
        at_index: Option<usize>,
    ) -> OrderingResult<Item> {
        let draft = ItemDraft::new(scope, payload, &*self.clock);
        let Some(index) = at_index else {
            return self
                .retrying("append", || self.try_append(draft.clone()))
                .await;
        };
        self.retrying("insert", || self.try_insert_at(draft.clone(), index))
            .await
    }

    /// Removes an item and closes the gap it leaves.
    ///
    /// # Errors
    ///
    /// Returns [`OrderingError::ItemNotFound`] when the item does not exist
    /// and [`OrderingError::Conflict`] when a concurrent change wins.
    pub async fn remove(&self, item: ItemId) -> OrderingResult<()> {
        self.retrying("remove", || self.try_remove(item)).await
    }

    /// Moves an item to `to_index` (clamped to `[0, len-1]`) within its
    /// scope and returns it in its committed position.
    ///
    /// Moving an item to the index it already holds writes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`OrderingError::InvalidScope`] when the item belongs to a
    /// different scope, [`OrderingError::ItemNotFound`] when it does not
    /// exist, and [`OrderingError::Conflict`] when a concurrent change wins.
    pub async fn reorder(
        &self,
        scope: ScopeId,
        item: ItemId,
        to_index: usize,
    ) -> OrderingResult<Item> {
        self.retrying("reorder", || self.try_reorder(scope, item, to_index))
            .await
    }

    /// Moves an item into `destination` at `dest_index` (clamped to
    /// `[0, len]` of the destination before the move) and returns it in its
    /// committed position.
    ///
    /// Relocating into the item's own scope behaves like
    /// [`OrderingService::reorder`].
    ///
    /// # Errors
    ///
    /// Returns [`OrderingError::ItemNotFound`] or
    /// [`OrderingError::ScopeNotFound`] for missing references and
    /// [`OrderingError::Conflict`] when a concurrent change wins.
    pub async fn relocate(
        &self,
        item: ItemId,
        destination: ScopeId,
        dest_index: usize,
    ) -> OrderingResult<Item> {
        self.retrying("relocate", || {
            self.try_relocate(item, destination, dest_index)
        })
        .await
    }

    /// Rewrites a scope's ranks to `0..n-1` while keeping the current
    /// order. Returns how many items changed rank.
    ///
    /// Only scopes written by an older gap-based ordering scheme need this.
    ///
    /// # Errors
    ///
    /// Returns [`OrderingError::ScopeNotFound`] when the scope does not
    /// exist and [`OrderingError::Conflict`] when a concurrent change wins.
    pub async fn normalize(&self, scope: ScopeId) -> OrderingResult<usize> {
        self.retrying("normalize", || self.try_normalize(scope))
            .await
    }

    /// Appends through the store, falling back to a planned insert at the
    /// end when the scope still carries gapped ranks.
    async fn try_append(&self, draft: ItemDraft) -> OrderingResult<Item> {
        match self.store.create(draft.clone()).await {
            Err(ListStoreError::InvariantViolation(err)) => {
                tracing::warn!(
                    scope = %draft.scope_id(),
                    error = %err,
                    "scope ranks are not dense; appending with a re-densifying insert"
                );
                self.try_insert_at(draft, usize::MAX).await
            }
            result => result.map_err(OrderingError::from),
        }
    }

    async fn try_insert_at(&self, draft: ItemDraft, index: usize) -> OrderingResult<Item> {
        let scope = draft.scope_id();
        let snapshot = self.snapshot(scope).await?;
        let plan = plan_insert_at(&snapshot, draft.id(), index);
        let item = draft.place(plan.rank());

        let changes = ChangeSet::new()
            .expect_scope(scope, snapshot)
            .create(item.clone())
            .batch_set_order(plan.shifts());
        self.store.commit(changes).await?;

        tracing::debug!(
            item = %item.id(),
            %scope,
            rank = %item.rank(),
            shifted = plan.shifts().len(),
            "inserted item"
        );
        Ok(item)
    }

    async fn try_remove(&self, item: ItemId) -> OrderingResult<()> {
        let current = self.get_item(item).await?;
        let scope = current.scope_id();
        let snapshot = self.snapshot(scope).await?;
        let plan = plan_delete_at(&snapshot, item)
            .ok_or(OrderingError::Conflict(ConflictKind::StaleSnapshot(scope)))?;

        let changes = ChangeSet::new()
            .expect_scope(scope, snapshot)
            .delete(item)
            .batch_set_order(plan.shifts());
        self.store.commit(changes).await?;

        tracing::debug!(
            %item,
            %scope,
            shifted = plan.shifts().len(),
            "removed item"
        );
        Ok(())
    }

    async fn try_reorder(
        &self,
        scope: ScopeId,
        item: ItemId,
        to_index: usize,
    ) -> OrderingResult<Item> {
        let mut current = self.get_item(item).await?;
        if current.scope_id() != scope {
            return Err(OrderingError::InvalidScope {
                item,
                scope,
                actual: current.scope_id(),
            });
        }

        let snapshot = self.snapshot(scope).await?;
        let plan = plan_move_within_scope(&snapshot, item, to_index)
            .ok_or(OrderingError::Conflict(ConflictKind::StaleSnapshot(scope)))?;
        let rank = plan.target().map_or(current.rank(), |(_, rank)| rank);

        if !plan.is_noop() {
            let changes = ChangeSet::new()
                .expect_scope(scope, snapshot)
                .batch_set_order(plan.changes());
            self.store.commit(changes).await?;
        }

        tracing::debug!(
            %item,
            %scope,
            %rank,
            changed = plan.changes().len(),
            "reordered item"
        );
        current.set_rank(rank);
        Ok(current)
    }

    async fn try_relocate(
        &self,
        item: ItemId,
        destination: ScopeId,
        dest_index: usize,
    ) -> OrderingResult<Item> {
        let mut current = self.get_item(item).await?;
        let source = current.scope_id();
        if source == destination {
            return self.try_reorder(destination, item, dest_index).await;
        }

        let source_snapshot = self.snapshot(source).await?;
        let dest_snapshot = self.snapshot(destination).await?;
        let plan = plan_move_across_scopes(&source_snapshot, &dest_snapshot, item, dest_index)
            .ok_or(OrderingError::Conflict(ConflictKind::StaleSnapshot(source)))?;
        let rank = plan.destination().rank();

        let changes = ChangeSet::new()
            .expect_scope(source, source_snapshot)
            .expect_scope(destination, dest_snapshot)
            .batch_set_order(
                plan.source()
                    .shifts()
                    .iter()
                    .chain(plan.destination().shifts()),
            )
            .move_scope(item, destination, rank);
        self.store.commit(changes).await?;

        tracing::debug!(
            %item,
            %source,
            %destination,
            %rank,
            "relocated item"
        );
        current.relocate(destination, rank);
        Ok(current)
    }

    async fn try_normalize(&self, scope: ScopeId) -> OrderingResult<usize> {
        let snapshot = self.snapshot(scope).await?;
        let plan = plan_normalize(&snapshot);
        if plan.is_noop() {
            return Ok(0);
        }

        let changed = plan.changes().len();
        tracing::warn!(%scope, changed, "re-densifying scope ranks");
        let changes = ChangeSet::new()
            .expect_scope(scope, snapshot)
            .batch_set_order(plan.changes());
        self.store.commit(changes).await?;
        Ok(changed)
    }

    async fn snapshot(&self, scope: ScopeId) -> OrderingResult<RankedList> {
        let items = self.store.list_by_scope(scope).await?;
        Ok(RankedList::from_items(&items))
    }

    /// Runs `attempt` until it succeeds, fails with a non-retryable error,
    /// or exhausts the configured attempt budget.
    async fn retrying<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> OrderingResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = OrderingResult<T>>,
    {
        let budget = self.config.attempts();
        let mut made = 1;
        loop {
            match attempt().await {
                Err(err) if err.is_retryable() && made < budget => {
                    tracing::warn!(
                        operation,
                        attempt = made,
                        error = %err,
                        "ordering conflict; retrying from a fresh read"
                    );
                    tokio::time::sleep(self.config.backoff_after(made)).await;
                    made += 1;
                }
                result => return result,
            }
        }
    }
}
