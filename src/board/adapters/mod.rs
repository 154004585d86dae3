//! Adapter implementations of the list store port.
//!
//! - [`memory`]: in-process store for tests and single-node deployments
//! - [`postgres`]: Diesel-backed `PostgreSQL` store

pub mod memory;
pub mod postgres;
