//! Given steps for board ordering BDD scenarios.

use super::world::{BoardWorld, card_labels, run_async};
use cardinal::board::domain::ItemPayload;
use eyre::WrapErr;
use rstest_bdd_macros::given;
use serde_json::json;

#[given(r#"a column "{name}" with cards "{cards}""#)]
fn column_with_cards(
    world: &mut BoardWorld,
    name: String,
    cards: String,
) -> Result<(), eyre::Report> {
    let scope = run_async(world.service.create_scope()).wrap_err("create column")?;
    for label in card_labels(&cards) {
        let item = run_async(
            world
                .service
                .create_item(scope.id(), ItemPayload::from(json!(label))),
        )
        .wrap_err_with(|| format!("append card {label} to column {name}"))?;
        world.cards.insert(label, item.id());
    }
    world.columns.insert(name, scope.id());
    Ok(())
}
