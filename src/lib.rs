//! Cardinal: transactional ordering for kanban-style boards.
//!
//! A board is a set of scopes (columns), each holding an ordered list of
//! items (cards). Every item carries a dense integer rank: a scope with `n`
//! items holds exactly the ranks `0..n-1`. Inserts, removals, moves within
//! a scope and moves across scopes are planned as a pure diff of ranks and
//! committed as one atomic unit, so concurrent writers never leave
//! duplicate ranks or gaps behind.
//!
//! # Architecture
//!
//! Cardinal follows hexagonal architecture principles:
//!
//! - **Domain**: ranks, ranked snapshots and the reorder planner
//! - **Ports**: the [`board::ports::ListStore`] trait and its change sets
//! - **Adapters**: in-memory and `PostgreSQL` list stores
//! - **Services**: [`board::services::OrderingService`]
//!
//! # Modules
//!
//! - [`board`]: board ordering domain, ports, adapters and services

pub mod board;
