//! Pure reorder planner.
//!
//! Given a ranked snapshot of one or two scopes and a requested move, the
//! planner computes the rank every affected item must hold afterwards. It
//! performs no I/O and never fails: indices are clamped into range and a
//! missing item yields `None`.
//!
//! Every plan is produced the same way: build the target order of item ids,
//! then diff it against the ranks the snapshot holds. On a dense snapshot
//! the diff is exactly the set of items shifted by one; on a snapshot
//! written by a gap-based scheme it also re-densifies the scope.

use super::{ItemId, Rank, RankedList};
use std::collections::HashMap;

/// A single rank rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankChange {
    /// The item whose rank changes.
    pub item: ItemId,
    /// Rank held in the snapshot.
    pub from: Rank,
    /// Rank the item holds after the plan is applied.
    pub to: Rank,
}

/// Plan for placing a new item into a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertPlan {
    item: ItemId,
    rank: Rank,
    shifts: Vec<RankChange>,
}

impl InsertPlan {
    /// Returns the item being inserted.
    #[must_use]
    pub const fn item(&self) -> ItemId {
        self.item
    }

    /// Returns the rank the new item receives.
    #[must_use]
    pub const fn rank(&self) -> Rank {
        self.rank
    }

    /// Returns the rank changes for items already in the scope.
    #[must_use]
    pub fn shifts(&self) -> &[RankChange] {
        &self.shifts
    }
}

/// Plan for removing an item from a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePlan {
    item: ItemId,
    rank: Rank,
    shifts: Vec<RankChange>,
}

impl DeletePlan {
    /// Returns the item being removed.
    #[must_use]
    pub const fn item(&self) -> ItemId {
        self.item
    }

    /// Returns the rank the removed item held.
    #[must_use]
    pub const fn rank(&self) -> Rank {
        self.rank
    }

    /// Returns the rank changes for the items that remain.
    #[must_use]
    pub fn shifts(&self) -> &[RankChange] {
        &self.shifts
    }
}

/// Plan for permuting the items of a single scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderPlan {
    target: Option<(ItemId, Rank)>,
    changes: Vec<RankChange>,
}

impl ReorderPlan {
    /// Returns the moved item and its final rank, when the plan moves one.
    #[must_use]
    pub const fn target(&self) -> Option<(ItemId, Rank)> {
        self.target
    }

    /// Returns every rank change, the moved item included.
    #[must_use]
    pub fn changes(&self) -> &[RankChange] {
        &self.changes
    }

    /// Returns `true` when applying the plan writes nothing.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Plan for moving an item from one scope into another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocatePlan {
    source: DeletePlan,
    destination: InsertPlan,
}

impl RelocatePlan {
    /// Returns the plan that closes the gap in the source scope.
    #[must_use]
    pub const fn source(&self) -> &DeletePlan {
        &self.source
    }

    /// Returns the plan that opens a slot in the destination scope.
    #[must_use]
    pub const fn destination(&self) -> &InsertPlan {
        &self.destination
    }
}

/// Plans the insertion of `item` at `target_index`, clamped to
/// `[0, len]`.
///
/// `item` is expected to be absent from `ranks`; if it is present it is
/// treated as already removed.
#[must_use]
pub fn plan_insert_at(ranks: &RankedList, item: ItemId, target_index: usize) -> InsertPlan {
    let mut order = order_without(ranks, item);
    let index = target_index.min(order.len());
    order.insert(index, item);
    InsertPlan {
        item,
        rank: Rank::new(index),
        shifts: diff(ranks, &order, Some(item)),
    }
}

/// Plans the removal of `item`. Returns `None` when the item is not in the
/// snapshot.
#[must_use]
pub fn plan_delete_at(ranks: &RankedList, item: ItemId) -> Option<DeletePlan> {
    let rank = ranks.rank_of(item)?;
    let order = order_without(ranks, item);
    Some(DeletePlan {
        item,
        rank,
        shifts: diff(ranks, &order, None),
    })
}

/// Plans moving `item` to `to_index` within its scope, clamped to
/// `[0, len-1]`.
///
/// Equivalent to a delete followed by an insert against the same snapshot,
/// so the result is always a single dense permutation. The plan is empty
/// when the item already sits at the target index. Returns `None` when the
/// item is not in the snapshot.
#[must_use]
pub fn plan_move_within_scope(
    ranks: &RankedList,
    item: ItemId,
    to_index: usize,
) -> Option<ReorderPlan> {
    ranks.position_of(item)?;
    let mut order = order_without(ranks, item);
    let index = to_index.min(order.len());
    order.insert(index, item);
    Some(ReorderPlan {
        target: Some((item, Rank::new(index))),
        changes: diff(ranks, &order, None),
    })
}

/// Plans moving `item` out of `source` and into `destination` at
/// `dest_index`, clamped to `[0, destination.len()]`.
///
/// `destination` must be the snapshot before the item arrives. Returns
/// `None` when the item is not in the source snapshot.
#[must_use]
pub fn plan_move_across_scopes(
    source: &RankedList,
    destination: &RankedList,
    item: ItemId,
    dest_index: usize,
) -> Option<RelocatePlan> {
    let source_plan = plan_delete_at(source, item)?;
    Some(RelocatePlan {
        source: source_plan,
        destination: plan_insert_at(destination, item, dest_index),
    })
}

/// Plans rewriting a scope's ranks to `0..n-1`, preserving the current
/// order. Empty when the snapshot is already dense.
#[must_use]
pub fn plan_normalize(ranks: &RankedList) -> ReorderPlan {
    let order: Vec<ItemId> = ranks.ids().collect();
    ReorderPlan {
        target: None,
        changes: diff(ranks, &order, None),
    }
}

fn order_without(ranks: &RankedList, item: ItemId) -> Vec<ItemId> {
    ranks.ids().filter(|id| *id != item).collect()
}

/// Diffs a target order against the ranks held in the snapshot. `skip`
/// names an item that is new to the scope and so has no held rank.
fn diff(ranks: &RankedList, order: &[ItemId], skip: Option<ItemId>) -> Vec<RankChange> {
    let held: HashMap<ItemId, Rank> = ranks.entries().iter().copied().collect();
    order
        .iter()
        .enumerate()
        .filter(|(_, id)| Some(**id) != skip)
        .filter_map(|(index, id)| {
            let from = *held.get(id)?;
            let to = Rank::new(index);
            (from != to).then_some(RankChange { item: *id, from, to })
        })
        .collect()
}
