//! Unit tests for the board ordering module.
//!
//! Tests are organised by layer: domain types and the reorder planner,
//! change set validation, configuration, the in-memory store, and the
//! ordering service.
