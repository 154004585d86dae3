//! Error types for ordering domain validation.

use super::{Rank, ScopeId};
use thiserror::Error;

/// Errors raised when a scope's ranks break the dense-rank policy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoardDomainError {
    /// Two items in the same scope hold the same rank.
    #[error("scope {scope} holds rank {rank} more than once")]
    DuplicateRank {
        /// Scope containing the duplicate.
        scope: ScopeId,
        /// The rank that appears twice.
        rank: Rank,
    },

    /// The ranks of a scope do not form the sequence `0..n-1`.
    #[error("scope {scope} has a gap: expected rank {expected}, found {found}")]
    RankGap {
        /// Scope containing the gap.
        scope: ScopeId,
        /// The rank the dense sequence requires at this position.
        expected: Rank,
        /// The rank actually found.
        found: Rank,
    },
}
