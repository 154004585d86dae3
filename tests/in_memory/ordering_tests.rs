//! Scripted operation sequences against a single in-memory board.

use super::helpers::{TestService, card_at, ensure_dense, labels_of, seed_column, service};
use cardinal::board::{domain::ItemPayload, services::OrderingError};
use rstest::rstest;
use serde_json::json;

/// Deterministic index source for scripted sequences.
struct Lcg(u64);

impl Lcg {
    fn next_below(&mut self, bound: usize) -> usize {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        let modulus = u64::try_from(bound.max(1)).unwrap_or(u64::MAX);
        (self.0 >> 33)
            .checked_rem(modulus)
            .and_then(|index| usize::try_from(index).ok())
            .unwrap_or_default()
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn mixed_sequence_keeps_every_column_dense(
    service: TestService,
    #[values(7, 42, 1_234)] seed: u64,
) -> Result<(), eyre::Report> {
    let (left, _) = seed_column(&service, &["a", "b", "c", "d"]).await?;
    let (right, _) = seed_column(&service, &["e", "f"]).await?;
    let columns = [left, right];
    let mut script = Lcg(seed);

    for step in 0..60 {
        let scope = *columns
            .get(script.next_below(columns.len()))
            .ok_or_else(|| eyre::eyre!("column index out of range"))?;
        let items = service.list_items(scope).await?;
        match script.next_below(4) {
            0 => {
                service
                    .insert(
                        scope,
                        ItemPayload::from(json!(format!("n{step}"))),
                        Some(script.next_below(items.len() + 2)),
                    )
                    .await?;
            }
            1 if !items.is_empty() => {
                let victim = items
                    .get(script.next_below(items.len()))
                    .ok_or_else(|| eyre::eyre!("item index out of range"))?;
                service.remove(victim.id()).await?;
            }
            2 if !items.is_empty() => {
                let moving = items
                    .get(script.next_below(items.len()))
                    .ok_or_else(|| eyre::eyre!("item index out of range"))?;
                service
                    .reorder(scope, moving.id(), script.next_below(items.len() + 1))
                    .await?;
            }
            _ if !items.is_empty() => {
                let moving = items
                    .get(script.next_below(items.len()))
                    .ok_or_else(|| eyre::eyre!("item index out of range"))?;
                let destination = if scope == left { right } else { left };
                service
                    .relocate(moving.id(), destination, script.next_below(8))
                    .await?;
            }
            _ => {}
        }

        ensure_dense(&service, left).await?;
        ensure_dense(&service, right).await?;
    }
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reorder_only_touches_the_spanned_range(service: TestService) -> Result<(), eyre::Report> {
    let (scope, ids) = seed_column(&service, &["a", "b", "c", "d", "e"]).await?;
    let before = service.list_items(scope).await?;

    service.reorder(scope, card_at(&ids, 3)?, 1).await?;

    let after = service.list_items(scope).await?;
    for (old, new) in before.iter().zip(&after) {
        if old.id() == card_at(&ids, 0)? || old.id() == card_at(&ids, 4)? {
            eyre::ensure!(old.rank() == new.rank(), "card outside the moved range changed rank");
        }
    }
    let order = labels_of(&service, scope).await?;
    eyre::ensure!(order == ["a", "d", "b", "c", "e"], "unexpected order {order:?}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn removing_every_card_leaves_an_empty_column(
    service: TestService,
) -> Result<(), eyre::Report> {
    let (scope, ids) = seed_column(&service, &["a", "b", "c"]).await?;

    for id in ids {
        service.remove(id).await?;
        ensure_dense(&service, scope).await?;
    }

    let remaining = service.list_items(scope).await?;
    eyre::ensure!(remaining.is_empty(), "column still holds {} cards", remaining.len());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn removing_twice_reports_missing_card(service: TestService) -> Result<(), eyre::Report> {
    let (_, ids) = seed_column(&service, &["a"]).await?;
    let card = card_at(&ids, 0)?;
    service.remove(card).await?;

    let result = service.remove(card).await;

    eyre::ensure!(
        matches!(result, Err(OrderingError::ItemNotFound(id)) if id == card),
        "expected item not found, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn appends_after_removal_reuse_the_freed_tail(
    service: TestService,
) -> Result<(), eyre::Report> {
    let (scope, ids) = seed_column(&service, &["a", "b", "c"]).await?;
    service.remove(card_at(&ids, 0)?).await?;

    let appended = service
        .create_item(scope, ItemPayload::from(json!("d")))
        .await?;

    eyre::ensure!(
        appended.rank().value() == 2,
        "appended card holds rank {}",
        appended.rank()
    );
    let order = labels_of(&service, scope).await?;
    eyre::ensure!(order == ["b", "c", "d"], "unexpected order {order:?}");
    Ok(())
}
