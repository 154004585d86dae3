//! Then steps for board ordering BDD scenarios.

use super::world::{BoardWorld, card_labels, run_async};
use cardinal::board::{domain::Rank, services::OrderingError};
use eyre::WrapErr;
use rstest_bdd_macros::then;

#[then(r#"column "{column}" lists cards "{cards}""#)]
fn column_lists_cards(
    world: &BoardWorld,
    column: String,
    cards: String,
) -> Result<(), eyre::Report> {
    let scope = world.column(&column)?;
    let items = run_async(world.service.list_items(scope)).wrap_err("list column items")?;
    let found: Vec<String> = items
        .iter()
        .map(|item| {
            item.payload()
                .as_value()
                .as_str()
                .unwrap_or_default()
                .to_owned()
        })
        .collect();
    let expected = card_labels(&cards);

    eyre::ensure!(
        found == expected,
        "column {column}: expected cards {expected:?}, found {found:?}"
    );
    Ok(())
}

#[then(r#"column "{column}" has dense ranks"#)]
fn column_has_dense_ranks(world: &BoardWorld, column: String) -> Result<(), eyre::Report> {
    let scope = world.column(&column)?;
    let items = run_async(world.service.list_items(scope)).wrap_err("list column items")?;

    for (index, item) in items.iter().enumerate() {
        eyre::ensure!(
            item.rank() == Rank::new(index),
            "column {column}: item at position {index} holds rank {}",
            item.rank()
        );
    }
    Ok(())
}

#[then("the operation fails with an invalid scope error")]
fn operation_fails_with_invalid_scope(world: &BoardWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing operation result"))?;

    eyre::ensure!(
        matches!(result, Err(OrderingError::InvalidScope { .. })),
        "expected invalid scope error, got {result:?}"
    );
    Ok(())
}
