//! Pop-center improvement.

use super::{subject_pop, Order, Outcome, Rejection};
use crate::rules::Rules;
use crate::world::Game;

pub(super) fn check(order: &Order, game: &Game, rules: &Rules) -> Result<u32, Rejection> {
    let pop = subject_pop(order, game)?;
    if pop.core.has_executed(|t| t.is_pop_action()) {
        return Err(Rejection::new(format!("{} has already acted this turn", pop.core.name)));
    }
    if pop.at_level_cap() {
        return Err(Rejection::new(format!(
            "{} is already at its highest level",
            pop.core.name
        )));
    }
    Ok(rules.economy.improve_cost.saturating_mul(u32::from(pop.level()) + 1))
}

pub(super) fn process(order: &Order, game: &mut Game) -> Outcome {
    if let Some(pop) = game.pop_centers.get_mut(&order.subject) {
        let level = pop.level() + 1;
        pop.level = Some(level);
        pop.core.status.push(format!("Grew to level {level}"));
    }
    Outcome::Nothing
}
