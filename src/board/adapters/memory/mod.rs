//! In-memory list store.

mod store;

pub use store::InMemoryListStore;
