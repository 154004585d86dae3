//! Shared test helpers for in-memory ordering integration tests.

use std::sync::Arc;

use cardinal::board::{
    adapters::memory::InMemoryListStore,
    config::OrderingConfig,
    domain::{Item, ItemId, ItemPayload, Rank, ScopeId},
    services::OrderingService,
};
use mockable::DefaultClock;
use rstest::fixture;
use serde_json::json;

/// Service type used across the in-memory tests.
pub type TestService = OrderingService<InMemoryListStore, DefaultClock>;

/// Provides a fresh ordering service that surfaces every conflict.
#[fixture]
pub fn service() -> TestService {
    OrderingService::new(Arc::new(InMemoryListStore::new()), Arc::new(DefaultClock))
}

/// Builds a shareable service that retries conflicts.
#[must_use]
pub fn retrying_service(max_attempts: u32) -> Arc<TestService> {
    let config = OrderingConfig::default()
        .with_max_attempts(max_attempts)
        .with_retry_backoff_ms(1);
    let store = InMemoryListStore::new().with_transaction_timeout(config.transaction_timeout());
    Arc::new(OrderingService::new(Arc::new(store), Arc::new(DefaultClock)).with_config(config))
}

/// Creates a column holding one card per label, in label order.
///
/// # Errors
///
/// Returns an error if the column or any card cannot be created.
pub async fn seed_column(
    service: &TestService,
    labels: &[&str],
) -> Result<(ScopeId, Vec<ItemId>), eyre::Report> {
    let scope = service.create_scope().await?;
    let mut ids = Vec::with_capacity(labels.len());
    for label in labels {
        let item = service
            .create_item(scope.id(), ItemPayload::from(json!(label)))
            .await?;
        ids.push(item.id());
    }
    Ok((scope.id(), ids))
}

/// Returns the card labels of a column in rank order.
///
/// # Errors
///
/// Returns an error if the column cannot be listed.
pub async fn labels_of(service: &TestService, scope: ScopeId) -> Result<Vec<String>, eyre::Report> {
    let items = service.list_items(scope).await?;
    Ok(items.iter().map(label).collect())
}

/// Returns the label stored in a card's payload.
#[must_use]
pub fn label(item: &Item) -> String {
    item.payload()
        .as_value()
        .as_str()
        .unwrap_or_default()
        .to_owned()
}

/// Asserts that a column holds exactly the ranks `0..n-1`.
///
/// # Errors
///
/// Returns an error if the column cannot be listed or a rank is out of
/// place.
pub async fn ensure_dense(service: &TestService, scope: ScopeId) -> Result<(), eyre::Report> {
    let items = service.list_items(scope).await?;
    for (index, item) in items.iter().enumerate() {
        eyre::ensure!(
            item.rank() == Rank::new(index),
            "position {index} holds rank {} in scope {scope}",
            item.rank()
        );
    }
    Ok(())
}

/// Returns the card id at `index`.
///
/// # Errors
///
/// Returns an error if `index` is out of range.
pub fn card_at(ids: &[ItemId], index: usize) -> Result<ItemId, eyre::Report> {
    ids.get(index)
        .copied()
        .ok_or_else(|| eyre::eyre!("no card at index {index}"))
}
