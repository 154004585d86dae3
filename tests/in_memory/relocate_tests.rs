//! Cross-column relocation tests.

use super::helpers::{TestService, card_at, ensure_dense, labels_of, seed_column, service};
use cardinal::board::{domain::ScopeId, services::OrderingError};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn relocate_and_back_restores_both_columns(
    service: TestService,
    #[values(0, 1, 2)] origin: usize,
    #[values(0, 1, 5)] dest_index: usize,
) -> Result<(), eyre::Report> {
    let (source, ids) = seed_column(&service, &["a", "b", "c"]).await?;
    let (destination, _) = seed_column(&service, &["x", "y"]).await?;
    let card = card_at(&ids, origin)?;

    service.relocate(card, destination, dest_index).await?;
    service.relocate(card, source, origin).await?;

    let source_order = labels_of(&service, source).await?;
    let dest_order = labels_of(&service, destination).await?;
    eyre::ensure!(source_order == ["a", "b", "c"], "source order {source_order:?}");
    eyre::ensure!(dest_order == ["x", "y"], "destination order {dest_order:?}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn relocations_conserve_cards(service: TestService) -> Result<(), eyre::Report> {
    let (left, left_ids) = seed_column(&service, &["a", "b", "c"]).await?;
    let (right, right_ids) = seed_column(&service, &["d", "e"]).await?;

    service.relocate(card_at(&left_ids, 0)?, right, 1).await?;
    service.relocate(card_at(&right_ids, 1)?, left, 0).await?;
    service.relocate(card_at(&left_ids, 2)?, right, 9).await?;

    let left_items = service.list_items(left).await?;
    let right_items = service.list_items(right).await?;
    eyre::ensure!(
        left_items.len() + right_items.len() == 5,
        "cards were lost or duplicated"
    );
    let left_order = labels_of(&service, left).await?;
    let right_order = labels_of(&service, right).await?;
    eyre::ensure!(left_order == ["e", "b"], "left order {left_order:?}");
    eyre::ensure!(right_order == ["d", "a", "c"], "right order {right_order:?}");
    ensure_dense(&service, left).await?;
    ensure_dense(&service, right).await?;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn relocated_card_reports_its_new_home(service: TestService) -> Result<(), eyre::Report> {
    let (_, ids) = seed_column(&service, &["a", "b"]).await?;
    let (destination, _) = seed_column(&service, &["x"]).await?;
    let card = card_at(&ids, 1)?;

    let moved = service.relocate(card, destination, 1).await?;
    let fetched = service.get_item(card).await?;

    eyre::ensure!(moved == fetched, "returned card differs from stored card");
    eyre::ensure!(fetched.scope_id() == destination, "card stayed in its old column");
    eyre::ensure!(
        fetched.rank().value() == 1,
        "card holds rank {}",
        fetched.rank()
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn relocate_of_missing_card_is_not_found(service: TestService) -> Result<(), eyre::Report> {
    let (destination, _) = seed_column(&service, &["x"]).await?;
    let missing = cardinal::board::domain::ItemId::new();

    let result = service.relocate(missing, destination, 0).await;

    eyre::ensure!(
        matches!(result, Err(OrderingError::ItemNotFound(id)) if id == missing),
        "expected item not found, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn relocate_into_deleted_column_leaves_source_untouched(
    service: TestService,
) -> Result<(), eyre::Report> {
    let (source, ids) = seed_column(&service, &["a", "b"]).await?;
    let (destination, _) = seed_column(&service, &[]).await?;
    service.delete_scope(destination).await?;

    let result = service.relocate(card_at(&ids, 0)?, destination, 0).await;

    eyre::ensure!(
        matches!(result, Err(OrderingError::ScopeNotFound(id)) if id == destination),
        "expected scope not found, got {result:?}"
    );
    let source_order = labels_of(&service, source).await?;
    eyre::ensure!(source_order == ["a", "b"], "source order {source_order:?}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_column_drops_its_cards(service: TestService) -> Result<(), eyre::Report> {
    let (scope, ids) = seed_column(&service, &["a", "b"]).await?;

    service.delete_scope(scope).await?;

    let lookup = service.get_item(card_at(&ids, 0)?).await;
    eyre::ensure!(
        matches!(lookup, Err(OrderingError::ItemNotFound(_))),
        "card survived its column: {lookup:?}"
    );
    let remaining: Vec<ScopeId> = service
        .list_scopes()
        .await?
        .iter()
        .map(cardinal::board::domain::Scope::id)
        .collect();
    eyre::ensure!(!remaining.contains(&scope), "deleted column is still listed");
    Ok(())
}
