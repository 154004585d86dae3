//! Ranked snapshots of a scope and the dense-rank check.

use super::{BoardDomainError, Item, ItemId, Rank, ScopeId};

/// Items of one scope in ascending rank order, together with the rank each
/// item currently holds.
///
/// A snapshot is what the reorder planner reads and what a commit compares
/// against to detect concurrent changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankedList {
    entries: Vec<(ItemId, Rank)>,
}

impl RankedList {
    /// Builds a snapshot from items of a single scope.
    ///
    /// Items are ordered by rank; equal ranks fall back to item id so the
    /// order is deterministic even for corrupted input.
    #[must_use]
    pub fn from_items<'a>(items: impl IntoIterator<Item = &'a Item>) -> Self {
        Self::from_entries(items.into_iter().map(|item| (item.id(), item.rank())))
    }

    /// Builds a snapshot from `(item, rank)` pairs in any order.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = (ItemId, Rank)>) -> Self {
        let mut collected: Vec<(ItemId, Rank)> = entries.into_iter().collect();
        collected.sort_by(|(left_id, left_rank), (right_id, right_rank)| {
            left_rank.cmp(right_rank).then(left_id.cmp(right_id))
        });
        Self { entries: collected }
    }

    /// Returns the number of items in the snapshot.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the scope holds no items.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the `(item, rank)` pairs in rank order.
    #[must_use]
    pub fn entries(&self) -> &[(ItemId, Rank)] {
        &self.entries
    }

    /// Iterates over item ids in rank order.
    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }

    /// Returns the list position of an item.
    #[must_use]
    pub fn position_of(&self, item: ItemId) -> Option<usize> {
        self.entries.iter().position(|(id, _)| *id == item)
    }

    /// Returns the rank an item currently holds.
    #[must_use]
    pub fn rank_of(&self, item: ItemId) -> Option<Rank> {
        self.entries
            .iter()
            .find(|(id, _)| *id == item)
            .map(|(_, rank)| *rank)
    }

    /// Returns `true` when the held ranks are exactly `0..n-1`.
    #[must_use]
    pub fn is_dense(&self) -> bool {
        self.entries
            .iter()
            .enumerate()
            .all(|(index, (_, rank))| rank.value() == index)
    }
}

/// Checks that `ranks` form the dense sequence `0..n-1` with no duplicates.
///
/// # Errors
///
/// Returns [`BoardDomainError::DuplicateRank`] or
/// [`BoardDomainError::RankGap`] describing the first violation found.
pub fn verify_dense(
    scope: ScopeId,
    ranks: impl IntoIterator<Item = Rank>,
) -> Result<(), BoardDomainError> {
    let mut sorted: Vec<Rank> = ranks.into_iter().collect();
    sorted.sort_unstable();

    let mut previous: Option<Rank> = None;
    for (index, found) in sorted.into_iter().enumerate() {
        if previous == Some(found) {
            return Err(BoardDomainError::DuplicateRank { scope, rank: found });
        }
        let expected = Rank::new(index);
        if found != expected {
            return Err(BoardDomainError::RankGap {
                scope,
                expected,
                found,
            });
        }
        previous = Some(found);
    }
    Ok(())
}
