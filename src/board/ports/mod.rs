//! Port contracts for column ordering.
//!
//! Ports define infrastructure-agnostic interfaces used by the ordering
//! service.

pub mod change_set;
pub mod store;

pub use change_set::{ChangeSet, RankWrite};
pub use store::{ConflictKind, ListStore, ListStoreError, ListStoreResult};

#[cfg(test)]
pub use store::MockListStore;
