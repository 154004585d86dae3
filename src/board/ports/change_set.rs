//! Transactional unit of work submitted to a list store.

use super::{ListStoreError, ListStoreResult};
use crate::board::domain::{Item, ItemId, Rank, RankChange, RankedList, ScopeId};
use std::collections::BTreeMap;

/// A single write inside a [`ChangeSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RankWrite {
    /// Insert a new item at the rank it carries.
    Create(Item),
    /// Remove an item. Remaining ranks are repaired by accompanying
    /// [`RankWrite::SetOrder`] writes, never by the store.
    Delete(ItemId),
    /// Rewrite the ranks of several items.
    SetOrder(BTreeMap<ItemId, Rank>),
    /// Move an item into another scope at the given rank.
    MoveScope {
        /// Item being moved.
        item: ItemId,
        /// Destination scope.
        scope: ScopeId,
        /// Rank in the destination scope.
        rank: Rank,
    },
}

/// Writes that must commit together, guarded by the snapshots they were
/// planned against.
///
/// Every scope a change set touches must be declared with
/// [`ChangeSet::expect_scope`]. Stores lock declared scopes in ascending
/// [`ScopeId`] order, reject the commit when any snapshot is stale, and
/// verify the dense-rank policy of each declared scope before publishing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    expectations: BTreeMap<ScopeId, RankedList>,
    writes: Vec<RankWrite>,
}

impl ChangeSet {
    /// Creates an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a touched scope and the snapshot the plan was computed from.
    #[must_use]
    pub fn expect_scope(mut self, scope: ScopeId, snapshot: RankedList) -> Self {
        self.expectations.insert(scope, snapshot);
        self
    }

    /// Adds an item insertion.
    #[must_use]
    pub fn create(mut self, item: Item) -> Self {
        self.writes.push(RankWrite::Create(item));
        self
    }

    /// Adds an item removal.
    #[must_use]
    pub fn delete(mut self, item: ItemId) -> Self {
        self.writes.push(RankWrite::Delete(item));
        self
    }

    /// Adds a batch of rank rewrites. Empty batches are dropped.
    #[must_use]
    pub fn batch_set_order<'a>(mut self, changes: impl IntoIterator<Item = &'a RankChange>) -> Self {
        let batch: BTreeMap<ItemId, Rank> = changes
            .into_iter()
            .map(|change| (change.item, change.to))
            .collect();
        if !batch.is_empty() {
            self.writes.push(RankWrite::SetOrder(batch));
        }
        self
    }

    /// Adds a scope change for one item.
    #[must_use]
    pub fn move_scope(mut self, item: ItemId, scope: ScopeId, rank: Rank) -> Self {
        self.writes.push(RankWrite::MoveScope { item, scope, rank });
        self
    }

    /// Returns the declared scopes in lock order.
    pub fn scopes(&self) -> impl Iterator<Item = ScopeId> + '_ {
        self.expectations.keys().copied()
    }

    /// Returns the declared snapshots keyed by scope, in lock order.
    #[must_use]
    pub const fn expectations(&self) -> &BTreeMap<ScopeId, RankedList> {
        &self.expectations
    }

    /// Returns the writes in application order.
    #[must_use]
    pub fn writes(&self) -> &[RankWrite] {
        &self.writes
    }

    /// Returns `true` when the change set writes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Returns the declared scope whose snapshot contains `item`.
    #[must_use]
    pub fn expected_scope_of(&self, item: ItemId) -> Option<ScopeId> {
        self.expectations
            .iter()
            .find(|(_, snapshot)| snapshot.position_of(item).is_some())
            .map(|(scope, _)| *scope)
    }

    /// Checks that every write stays within the declared scopes.
    ///
    /// Existing items must appear in a declared snapshot; created items and
    /// scope moves must target a declared scope. Stores call this before
    /// taking any lock.
    ///
    /// # Errors
    ///
    /// Returns [`ListStoreError::UndeclaredWrite`] naming the first item
    /// that escapes the declared scopes.
    pub fn check_declared(&self) -> ListStoreResult<()> {
        for write in &self.writes {
            match write {
                RankWrite::Create(item) => {
                    if !self.expectations.contains_key(&item.scope_id()) {
                        return Err(ListStoreError::UndeclaredWrite(item.id()));
                    }
                }
                RankWrite::Delete(item) => self.check_existing(*item)?,
                RankWrite::SetOrder(batch) => {
                    for item in batch.keys() {
                        self.check_existing(*item)?;
                    }
                }
                RankWrite::MoveScope { item, scope, .. } => {
                    self.check_existing(*item)?;
                    if !self.expectations.contains_key(scope) {
                        return Err(ListStoreError::UndeclaredWrite(*item));
                    }
                }
            }
        }
        Ok(())
    }

    fn check_existing(&self, item: ItemId) -> ListStoreResult<()> {
        if self.expected_scope_of(item).is_some() || self.creates(item) {
            Ok(())
        } else {
            Err(ListStoreError::UndeclaredWrite(item))
        }
    }

    fn creates(&self, item: ItemId) -> bool {
        self.writes
            .iter()
            .any(|write| matches!(write, RankWrite::Create(created) if created.id() == item))
    }
}
