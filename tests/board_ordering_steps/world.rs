//! Shared world state for board ordering BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use cardinal::board::{
    adapters::memory::InMemoryListStore,
    domain::{ItemId, ScopeId},
    services::{OrderingError, OrderingService},
};
use mockable::DefaultClock;
use rstest::fixture;

/// Service type used by the BDD world.
pub type TestOrderingService = OrderingService<InMemoryListStore, DefaultClock>;

/// Scenario world for board ordering behaviour tests.
pub struct BoardWorld {
    pub service: TestOrderingService,
    pub columns: HashMap<String, ScopeId>,
    pub cards: HashMap<String, ItemId>,
    pub last_result: Option<Result<(), OrderingError>>,
}

impl BoardWorld {
    /// Creates a world with an empty board.
    #[must_use]
    pub fn new() -> Self {
        let service = OrderingService::new(
            Arc::new(InMemoryListStore::new()),
            Arc::new(DefaultClock),
        );

        Self {
            service,
            columns: HashMap::new(),
            cards: HashMap::new(),
            last_result: None,
        }
    }

    /// Looks up a column created earlier in the scenario.
    ///
    /// # Errors
    ///
    /// Returns an error when no column has that name.
    pub fn column(&self, name: &str) -> Result<ScopeId, eyre::Report> {
        self.columns
            .get(name)
            .copied()
            .ok_or_else(|| eyre::eyre!("unknown column {name} in scenario world"))
    }

    /// Looks up a card created earlier in the scenario.
    ///
    /// # Errors
    ///
    /// Returns an error when no card has that label.
    pub fn card(&self, label: &str) -> Result<ItemId, eyre::Report> {
        self.cards
            .get(label)
            .copied()
            .ok_or_else(|| eyre::eyre!("unknown card {label} in scenario world"))
    }
}

impl Default for BoardWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> BoardWorld {
    BoardWorld::default()
}

/// Splits a comma-separated card list such as `"x, y, z"`.
#[must_use]
pub fn card_labels(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
