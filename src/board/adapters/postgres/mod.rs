//! `PostgreSQL` adapter for the list store.

mod models;
mod schema;
mod store;

pub use store::{BoardPgPool, PostgresListStore};
