//! Figure training.

use super::{figure_idle, subject_figure, Order, Outcome, Rejection};
use crate::rules::Rules;
use crate::world::{Base, Figure, Game};

/// Gold needed to train a figure to its next level, capped at `u32::MAX`.
pub fn training_cost(figure: &Figure, rules: &Rules) -> u32 {
    let next = u64::from(figure.level) + 1;
    let cost = u64::from(rules.economy.training_cost) * next * u64::from(figure.kind.training_cost_modifier()) / 100;
    u32::try_from(cost).unwrap_or(u32::MAX)
}

pub(super) fn check(order: &Order, game: &Game, rules: &Rules) -> Result<u32, Rejection> {
    let figure = subject_figure(order, game)?;
    figure_idle(figure)?;
    if figure.at_level_cap() {
        return Err(Rejection::new(format!(
            "{} cannot advance past level {}",
            figure.core.name, figure.level
        )));
    }
    // Training needs a pop center of the figure's own side.
    let trained_at_home = match figure.base() {
        Some(Base::PopCenter(id)) => game
            .pop_centers
            .get(&id)
            .is_some_and(|p| p.core.owner() == figure.core.owner()),
        _ => false,
    };
    if !trained_at_home {
        return Err(Rejection::new(format!(
            "{} must be in one of your pop centers to train",
            figure.core.name
        )));
    }
    Ok(training_cost(figure, rules))
}

pub(super) fn process(order: &Order, game: &mut Game) -> Outcome {
    if let Some(figure) = game.figures.get_mut(&order.subject) {
        if figure.promote() {
            figure.range += 1;
            let status = format!("Trained to level {}", figure.level);
            figure.core.status.push(status);
        }
    }
    Outcome::Nothing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::{OrderKind, OrderStatus};
    use crate::world::{FigureKind, GameMap, Hex, Owner, PopType, Region, RegionId, Terrain};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn cost_scales_with_level_and_kind() {
        let rules = Rules::default();
        let mut game = Game::new(GameMap::new([Region::new(RegionId(1), "Vale")]));
        let p = game.add_player("Aldric", "Northmen", 0);
        let king = game.add_figure("Aldric", Owner::Player(p), FigureKind::King, 1, None);
        let agent = game.add_figure("Shade", Owner::Player(p), FigureKind::Agent, 1, None);
        assert_eq!(training_cost(&game.figures[&king], &rules), 300);
        assert_eq!(training_cost(&game.figures[&agent], &rules), 200);
    }

    #[test]
    fn huge_training_cost_saturates() {
        let mut rules = Rules::default();
        rules.economy.training_cost = u32::MAX;
        let mut game = Game::new(GameMap::new([Region::new(RegionId(1), "Vale")]));
        let p = game.add_player("Aldric", "Northmen", 0);
        let king = game.add_figure("Aldric", Owner::Player(p), FigureKind::King, 1, None);
        assert_eq!(training_cost(&game.figures[&king], &rules), u32::MAX);
    }

    #[test]
    fn figure_in_the_wilds_cannot_train() {
        let map = GameMap::parallelogram(3, 3, Terrain::Plains, [Region::new(RegionId(1), "Vale")], |_| RegionId(1));
        let mut game = Game::new(map);
        let p = game.add_player("Aldric", "Northmen", 5000);
        let pop = game.add_pop_center("Ford", Owner::Player(p), Hex::new(0, 0), PopType::Town, 2);
        let home = game.add_figure("Mage", Owner::Player(p), FigureKind::Wizard, 2, Some(Base::PopCenter(pop)));
        let lost = game.add_figure("Hermit", Owner::Player(p), FigureKind::Wizard, 2, None);
        let rules = Rules::default();
        let mut rng = StdRng::seed_from_u64(3);

        let mut train_home = Order::new(home, OrderKind::TrainFigure).issued_by(p);
        let mut train_lost = Order::new(lost, OrderKind::TrainFigure).issued_by(p);
        assert_eq!(train_home.execute(&mut game, &rules, &mut rng), OrderStatus::Executed);
        assert_eq!(train_lost.execute(&mut game, &rules, &mut rng), OrderStatus::Rejected);
        assert_eq!(game.figures[&home].level, 3);
        assert_eq!(game.figures[&lost].level, 2);
        assert_eq!(game.players[0].gold, 5000 - 375);
    }
}
