//! Thread-safe in-memory list store.
//!
//! Commits stage their writes on a scratch copy of the item table while
//! holding the write lock, verify the dense-rank policy, and only then swap
//! the copy in. Readers therefore observe either the complete pre-state or
//! the complete post-state of a commit.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::board::{
    domain::{Item, ItemDraft, ItemId, Rank, RankedList, Scope, ScopeId, verify_dense},
    ports::{ChangeSet, ConflictKind, ListStore, ListStoreError, ListStoreResult, RankWrite},
};

const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(5);
const FAULT_DISARMED: usize = usize::MAX;

/// In-memory [`ListStore`] with bounded lock waits.
#[derive(Debug, Clone)]
pub struct InMemoryListStore {
    state: Arc<RwLock<InMemoryBoardState>>,
    transaction_timeout: Duration,
    fault: Arc<AtomicUsize>,
}

#[derive(Debug, Default)]
struct InMemoryBoardState {
    scopes: BTreeMap<ScopeId, Scope>,
    items: HashMap<ItemId, Item>,
}

impl InMemoryListStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::default(),
            transaction_timeout: DEFAULT_TRANSACTION_TIMEOUT,
            fault: Arc::new(AtomicUsize::new(FAULT_DISARMED)),
        }
    }

    /// Sets how long an operation may wait for the store lock before it
    /// fails with [`ConflictKind::Timeout`].
    #[must_use]
    pub const fn with_transaction_timeout(mut self, timeout: Duration) -> Self {
        self.transaction_timeout = timeout;
        self
    }

    /// Arms a one-shot fault: the write after the next `writes` row writes
    /// fails with [`ListStoreError::Unavailable`].
    ///
    /// Used to check that a failing commit leaves no partial state behind.
    pub fn fail_after_writes(&self, writes: usize) {
        self.fault.store(writes, Ordering::SeqCst);
    }

    async fn read_state(&self) -> ListStoreResult<RwLockReadGuard<'_, InMemoryBoardState>> {
        tokio::time::timeout(self.transaction_timeout, self.state.read())
            .await
            .map_err(|_| ListStoreError::Conflict(ConflictKind::Timeout))
    }

    async fn write_state(&self) -> ListStoreResult<RwLockWriteGuard<'_, InMemoryBoardState>> {
        tokio::time::timeout(self.transaction_timeout, self.state.write())
            .await
            .map_err(|_| ListStoreError::Conflict(ConflictKind::Timeout))
    }

    fn record_write(&self) -> ListStoreResult<()> {
        let remaining = self.fault.load(Ordering::SeqCst);
        if remaining == FAULT_DISARMED {
            return Ok(());
        }
        if remaining == 0 {
            self.fault.store(FAULT_DISARMED, Ordering::SeqCst);
            return Err(ListStoreError::unavailable(std::io::Error::other(
                "injected store fault",
            )));
        }
        self.fault.store(remaining - 1, Ordering::SeqCst);
        Ok(())
    }

    fn apply(&self, staged: &mut HashMap<ItemId, Item>, write: &RankWrite) -> ListStoreResult<()> {
        match write {
            RankWrite::Create(item) => {
                if staged.contains_key(&item.id()) {
                    return Err(ListStoreError::DuplicateItem(item.id()));
                }
                self.record_write()?;
                staged.insert(item.id(), item.clone());
            }
            RankWrite::Delete(item_id) => {
                self.record_write()?;
                staged
                    .remove(item_id)
                    .ok_or(ListStoreError::ItemNotFound(*item_id))?;
            }
            RankWrite::SetOrder(batch) => {
                for (item_id, rank) in batch {
                    self.record_write()?;
                    staged
                        .get_mut(item_id)
                        .ok_or(ListStoreError::ItemNotFound(*item_id))?
                        .set_rank(*rank);
                }
            }
            RankWrite::MoveScope { item, scope, rank } => {
                self.record_write()?;
                staged
                    .get_mut(item)
                    .ok_or(ListStoreError::ItemNotFound(*item))?
                    .relocate(*scope, *rank);
            }
        }
        Ok(())
    }
}

impl Default for InMemoryListStore {
    fn default() -> Self {
        Self::new()
    }
}

fn items_in(items: &HashMap<ItemId, Item>, scope: ScopeId) -> impl Iterator<Item = &Item> {
    items.values().filter(move |item| item.scope_id() == scope)
}

fn ranks_in(items: &HashMap<ItemId, Item>, scope: ScopeId) -> Vec<Rank> {
    items_in(items, scope).map(Item::rank).collect()
}

fn ensure_scope(state: &InMemoryBoardState, scope: ScopeId) -> ListStoreResult<()> {
    if state.scopes.contains_key(&scope) {
        Ok(())
    } else {
        Err(ListStoreError::ScopeNotFound(scope))
    }
}

#[async_trait]
impl ListStore for InMemoryListStore {
    async fn create_scope(&self, scope: &Scope) -> ListStoreResult<()> {
        let mut state = self.write_state().await?;
        if state.scopes.contains_key(&scope.id()) {
            return Err(ListStoreError::DuplicateScope(scope.id()));
        }
        state.scopes.insert(scope.id(), scope.clone());
        Ok(())
    }

    async fn delete_scope(&self, id: ScopeId) -> ListStoreResult<()> {
        let mut state = self.write_state().await?;
        state
            .scopes
            .remove(&id)
            .ok_or(ListStoreError::ScopeNotFound(id))?;
        state.items.retain(|_, item| item.scope_id() != id);
        Ok(())
    }

    async fn find_scope(&self, id: ScopeId) -> ListStoreResult<Option<Scope>> {
        let state = self.read_state().await?;
        Ok(state.scopes.get(&id).cloned())
    }

    async fn list_scopes(&self) -> ListStoreResult<Vec<Scope>> {
        let state = self.read_state().await?;
        let mut scopes: Vec<Scope> = state.scopes.values().cloned().collect();
        scopes.sort_by_key(|scope| (scope.created_at(), scope.id()));
        Ok(scopes)
    }

    async fn find_item(&self, id: ItemId) -> ListStoreResult<Option<Item>> {
        let state = self.read_state().await?;
        Ok(state.items.get(&id).cloned())
    }

    async fn list_by_scope(&self, scope: ScopeId) -> ListStoreResult<Vec<Item>> {
        let state = self.read_state().await?;
        ensure_scope(&state, scope)?;
        let mut items: Vec<Item> = items_in(&state.items, scope).cloned().collect();
        items.sort_by_key(|item| (item.rank(), item.id()));
        Ok(items)
    }

    async fn create(&self, draft: ItemDraft) -> ListStoreResult<Item> {
        let mut state = self.write_state().await?;
        let scope = draft.scope_id();
        ensure_scope(&state, scope)?;
        if state.items.contains_key(&draft.id()) {
            return Err(ListStoreError::DuplicateItem(draft.id()));
        }

        let ranks = ranks_in(&state.items, scope);
        verify_dense(scope, ranks.iter().copied())?;
        let item = draft.place(Rank::new(ranks.len()));
        self.record_write()?;
        state.items.insert(item.id(), item.clone());
        tracing::debug!(item = %item.id(), %scope, rank = %item.rank(), "appended item");
        Ok(item)
    }

    async fn commit(&self, changes: ChangeSet) -> ListStoreResult<()> {
        if changes.is_empty() {
            return Ok(());
        }
        changes.check_declared()?;

        let mut state = self.write_state().await?;
        for (scope, expected) in changes.expectations() {
            ensure_scope(&state, *scope)?;
            let current = RankedList::from_items(items_in(&state.items, *scope));
            if &current != expected {
                return Err(ListStoreError::Conflict(ConflictKind::StaleSnapshot(*scope)));
            }
        }

        let mut staged = state.items.clone();
        for write in changes.writes() {
            self.apply(&mut staged, write)?;
        }
        for scope in changes.scopes() {
            verify_dense(scope, ranks_in(&staged, scope))?;
        }

        state.items = staged;
        tracing::debug!(
            scopes = changes.expectations().len(),
            writes = changes.writes().len(),
            "committed change set"
        );
        Ok(())
    }
}
