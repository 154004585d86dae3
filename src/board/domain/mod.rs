//! Domain model for column ordering.
//!
//! Scopes, items and ranks are plain values; the [`reorder`] planner is a
//! set of pure functions over ranked snapshots. Infrastructure concerns stay
//! outside of this boundary.

mod error;
mod ids;
mod item;
mod rank;
mod ranked;
pub mod reorder;
mod scope;

pub use error::BoardDomainError;
pub use ids::{ItemId, ScopeId};
pub use item::{Item, ItemDraft, ItemPayload, PersistedItemData};
pub use rank::Rank;
pub use ranked::{RankedList, verify_dense};
pub use reorder::{DeletePlan, InsertPlan, RankChange, ReorderPlan, RelocatePlan};
pub use scope::Scope;
