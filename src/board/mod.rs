//! Column ordering for the task board.
//!
//! Items (cards) live in exactly one scope (column) and carry a dense rank
//! within it. This module keeps those ranks unique and gap-free under
//! insertion, removal, reordering within a column, and relocation between
//! columns. The module follows hexagonal architecture:
//!
//! - Domain types and the pure reorder planner in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]
//! - Tunables in [`config`]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
