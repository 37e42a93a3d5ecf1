//! Recruitment orders given by pop centers.

use tracing::debug;

use super::{subject_pop, Order, OrderKind, Outcome, Rejection};
use crate::rules::Rules;
use crate::world::{Base, FigureKind, Game, Owner, PlayerId};

pub(super) fn check(order: &Order, issuer: PlayerId, game: &Game, rules: &Rules) -> Result<u32, Rejection> {
    let pop = subject_pop(order, game)?;
    if pop.core.has_executed(|t| t.is_pop_action()) {
        return Err(Rejection::new(format!("{} has already acted this turn", pop.core.name)));
    }
    if !pop.pop_type.can_recruit() {
        return Err(Rejection::new(format!("{} is too small to recruit", pop.core.name)));
    }

    match &order.kind {
        OrderKind::HireArmy { troop, units } => {
            let template = rules
                .troop(troop)
                .ok_or_else(|| Rejection::new(format!("unknown troop type {troop}")))?;
            if *units == 0 {
                return Err(Rejection::new("an army needs at least one unit"));
            }
            if *units > u32::from(pop.level()) {
                return Err(Rejection::new(format!(
                    "{} can raise at most {} units",
                    pop.core.name,
                    pop.level()
                )));
            }
            Ok(template.support_cost.saturating_mul(*units))
        }
        OrderKind::HireFigure { kind, name } => {
            if name.trim().is_empty() {
                return Err(Rejection::new("a figure needs a name"));
            }
            let has_king = game.player(issuer).is_some_and(|p| p.king.is_some());
            if *kind == FigureKind::King && has_king {
                return Err(Rejection::new("your kingdom already has a king"));
            }
            Ok(rules.economy.figure_hire_cost)
        }
        _ => Err(Rejection::new("not a recruitment order")),
    }
}

pub(super) fn process(order: &Order, issuer: PlayerId, game: &mut Game, rules: &Rules) -> Outcome {
    let Some(pop) = game.pop_centers.get(&order.subject) else {
        return Outcome::Nothing;
    };
    let (pop_name, hex) = (pop.core.name.clone(), pop.location);
    let owner = Owner::Player(issuer);

    match &order.kind {
        OrderKind::HireArmy { troop, units } => {
            let Some(template) = rules.troop(troop) else {
                return Outcome::Nothing;
            };
            let army = game.add_army(format!("{pop_name} {troop}"), owner, hex);
            for _ in 0..*units {
                game.add_unit(army, template);
            }
            debug!(%army, %troop, units, "army raised");
            game.add_status(order.subject, format!("Raised {units} units of {troop}"));
            game.add_status(army, format!("Raised at {pop_name}"));
        }
        OrderKind::HireFigure { kind, name } => {
            let figure = game.add_figure(name.clone(), owner, *kind, 1, Some(Base::PopCenter(order.subject)));
            debug!(%figure, kind = kind.name(), "figure recruited");
            game.add_status(order.subject, format!("Recruited the {} {name}", kind.name()));
        }
        _ => {}
    }
    Outcome::Nothing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::OrderStatus;
    use crate::world::{GameMap, Hex, ItemId, PopType, Region, RegionId, Terrain};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn setup(pop_type: PopType) -> (Game, PlayerId, ItemId) {
        let map = GameMap::parallelogram(3, 3, Terrain::Plains, [Region::new(RegionId(1), "Vale")], |_| RegionId(1));
        let mut game = Game::new(map);
        let p = game.add_player("Aldric", "Northmen", 1000);
        let pop = game.add_pop_center("Ford", Owner::Player(p), Hex::new(1, 1), pop_type, 3);
        (game, p, pop)
    }

    #[test]
    fn hire_army_raises_units_at_the_pop() {
        let (mut game, p, pop) = setup(PopType::Town);
        let rules = Rules::default();
        let mut rng = StdRng::seed_from_u64(1);
        let kind = OrderKind::HireArmy { troop: "Infantry".into(), units: 2 };
        let mut order = Order::new(pop, kind).issued_by(p);

        assert_eq!(order.execute(&mut game, &rules, &mut rng), OrderStatus::Executed);
        let army = game.armies_of(p).next().unwrap();
        assert_eq!(army.location, Hex::new(1, 1));
        assert_eq!(army.units.len(), 2);
        assert_eq!(game.players[0].gold, 800);
    }

    #[test]
    fn hamlets_cannot_recruit() {
        let (mut game, p, pop) = setup(PopType::Hamlet);
        let rules = Rules::default();
        let mut rng = StdRng::seed_from_u64(1);
        let kind = OrderKind::HireFigure { kind: FigureKind::Agent, name: "Shade".into() };
        let mut order = Order::new(pop, kind).issued_by(p);

        assert_eq!(order.execute(&mut game, &rules, &mut rng), OrderStatus::Rejected);
        assert!(game.figures.is_empty());
    }

    #[test]
    fn second_king_is_rejected() {
        let (mut game, p, pop) = setup(PopType::City);
        game.add_figure("Old King", Owner::Player(p), FigureKind::King, 4, Some(Base::PopCenter(pop)));
        let rules = Rules::default();
        let mut rng = StdRng::seed_from_u64(1);
        let kind = OrderKind::HireFigure { kind: FigureKind::King, name: "Pretender".into() };
        let mut order = Order::new(pop, kind).issued_by(p);

        assert_eq!(order.execute(&mut game, &rules, &mut rng), OrderStatus::Rejected);
        assert_eq!(game.figures.len(), 1);
    }

    #[test]
    fn one_recruitment_per_pop_per_turn() {
        let (mut game, p, pop) = setup(PopType::City);
        let rules = Rules::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut first = Order::new(pop, OrderKind::HireFigure { kind: FigureKind::Agent, name: "Shade".into() }).issued_by(p);
        let mut second = Order::new(pop, OrderKind::HireArmy { troop: "Militia".into(), units: 1 }).issued_by(p);

        assert_eq!(first.execute(&mut game, &rules, &mut rng), OrderStatus::Executed);
        assert_eq!(second.execute(&mut game, &rules, &mut rng), OrderStatus::Rejected);
        assert!(game.armies.is_empty());
    }
}
