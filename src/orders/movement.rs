//! Army marches and figure relocation.

use tracing::debug;

use super::{figure_idle, subject_army, subject_figure, Order, OrderKind, OrderTag, Outcome, Rejection};
use crate::intel::{self, view};
use crate::world::{Base, FigureKind, Game, Hex, ItemRef, PlayerId};

pub(super) fn check(order: &Order, issuer: PlayerId, game: &Game) -> Result<u32, Rejection> {
    match &order.kind {
        OrderKind::MoveArmy { path } => check_march(order, path.len(), game),
        OrderKind::MoveFigure { to } => check_relocation(order, issuer, *to, game),
        _ => Err(Rejection::new("not a movement order")),
    }
}

fn check_march(order: &Order, steps: usize, game: &Game) -> Result<u32, Rejection> {
    let army = subject_army(order, game)?;
    if !army.is_active() {
        return Err(Rejection::new(format!("{} has no troops", army.core.name)));
    }
    if army.core.has_executed(|t| t == OrderTag::MoveArmy) {
        return Err(Rejection::new(format!("{} has already marched this turn", army.core.name)));
    }
    if army.core.has_executed(OrderTag::is_attack) {
        return Err(Rejection::new(format!("{} cannot march after attacking", army.core.name)));
    }
    if steps == 0 {
        return Err(Rejection::new("the march has no steps"));
    }
    let range = army.movement();
    if steps > range as usize {
        return Err(Rejection::new(format!(
            "{} can march at most {range} hexes, not {steps}",
            army.core.name
        )));
    }
    Ok(0)
}

fn check_relocation(order: &Order, issuer: PlayerId, to: crate::world::ItemId, game: &Game) -> Result<u32, Rejection> {
    let figure = subject_figure(order, game)?;
    figure_idle(figure)?;
    if figure.base().map(Base::id) == Some(to) {
        return Err(Rejection::new(format!("{} is already there", figure.core.name)));
    }
    let destination = match game.get_item(to) {
        Some(ItemRef::PopCenter(pop)) => {
            let covert = matches!(figure.kind, FigureKind::Agent | FigureKind::Diplomat);
            if !pop.core.owner().is(issuer) && !covert {
                return Err(Rejection::new(format!(
                    "only agents and diplomats may enter foreign pop centers such as {}",
                    pop.core.name
                )));
            }
            pop.location
        }
        Some(ItemRef::Army(army)) => {
            if !army.core.owner().is(issuer) {
                return Err(Rejection::new(format!("{} is not one of your armies", army.core.name)));
            }
            army.location
        }
        _ => return Err(Rejection::new(format!("{to} cannot house a figure"))),
    };
    match game.figure_location(figure) {
        Some(here) => {
            let distance = here.distance(destination);
            if distance > figure.range {
                return Err(Rejection::new(format!(
                    "{} is {distance} hexes away, beyond {}'s range of {}",
                    game.item_name(to),
                    figure.core.name,
                    figure.range
                )));
            }
        }
        // From the wilds a figure can only make its way home.
        None => {
            let home = matches!(game.get_item(to), Some(ItemRef::PopCenter(p)) if p.core.owner().is(issuer));
            if !home {
                return Err(Rejection::new(format!(
                    "{} is in the wilds and can only return to one of your pop centers",
                    figure.core.name
                )));
            }
        }
    }
    Ok(0)
}

pub(super) fn process(order: &Order, game: &mut Game) -> Outcome {
    match &order.kind {
        OrderKind::MoveArmy { path } => march(order, path, game),
        OrderKind::MoveFigure { to } => {
            let base = match game.get_item(*to) {
                Some(ItemRef::PopCenter(_)) => Base::PopCenter(*to),
                Some(ItemRef::Army(_)) => Base::Army(*to),
                _ => return Outcome::Nothing,
            };
            let destination = game.item_name(*to);
            game.rebase_figure(order.subject, Some(base));
            game.add_status(order.subject, format!("Moved to {destination}"));
            Outcome::Nothing
        }
        _ => Outcome::Nothing,
    }
}

/// Walks the path one hex at a time. A step off the map or into impassable
/// terrain ends the march where it stands.
fn march(order: &Order, path: &[crate::world::Direction], game: &mut Game) -> Outcome {
    let Some(army) = game.armies.get(&order.subject) else {
        return Outcome::Nothing;
    };
    let start = army.location;
    let mut here = start;
    let mut route: Vec<Hex> = Vec::with_capacity(path.len());
    for &dir in path {
        let next = here.step(dir);
        let passable = game.map.terrain(next).is_some_and(|t| t.is_passable());
        if !passable {
            debug!(army = %order.subject, from = %here, ?dir, "march blocked");
            break;
        }
        route.push(next);
        here = next;
    }

    let status = if route.len() == path.len() {
        format!("Marched from {start} to {here}")
    } else {
        format!(
            "March from {start} blocked after {} of {} steps; halted at {here}",
            route.len(),
            path.len()
        )
    };
    if let Some(army) = game.armies.get_mut(&order.subject) {
        army.location = here;
        army.core.status.push(status);
    }

    route.pop();
    Outcome::Marched { passed: route }
}

/// Pop centers passed on the march become known, without owner or level.
/// The destination is left to the end-of-turn intelligence pass.
pub(super) fn update_views(issuer: PlayerId, passed: &[Hex], game: &mut Game) {
    intel::with_view(game, issuer, |known, game| {
        for hex in passed {
            if let Some(pop) = game.pop_at(*hex) {
                if !pop.core.owner().is(issuer) {
                    view::add_known_pop(known, view::glimpsed_pop(pop, game.turn));
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::OrderStatus;
    use crate::rules::Rules;
    use crate::world::{Direction, GameMap, ItemId, Owner, PopType, Region, RegionId, Terrain};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn setup() -> (Game, PlayerId, ItemId, Rules) {
        let map = GameMap::parallelogram(6, 3, Terrain::Plains, [Region::new(RegionId(1), "Vale")], |_| RegionId(1));
        let mut game = Game::new(map);
        let p = game.add_player("Aldric", "Northmen", 0);
        let rules = Rules::default();
        let army = game.add_army("Host", Owner::Player(p), Hex::new(0, 1));
        let cavalry = rules.troop("Cavalry").cloned().unwrap();
        game.add_unit(army, &cavalry);
        (game, p, army, rules)
    }

    #[test]
    fn march_follows_path() {
        let (mut game, p, army, rules) = setup();
        let mut rng = StdRng::seed_from_u64(1);
        let path = vec![Direction::East, Direction::East, Direction::SouthEast];
        let mut order = Order::new(army, OrderKind::MoveArmy { path }).issued_by(p);

        assert_eq!(order.execute(&mut game, &rules, &mut rng), OrderStatus::Executed);
        assert_eq!(game.armies[&army].location, Hex::new(2, 2));
    }

    #[test]
    fn water_halts_the_march() {
        let (mut game, p, army, rules) = setup();
        game.map.insert_location(crate::world::Location {
            hex: Hex::new(2, 1),
            terrain: Terrain::Water,
            region: RegionId(1),
        });
        let mut rng = StdRng::seed_from_u64(1);
        let path = vec![Direction::East, Direction::East, Direction::East];
        let mut order = Order::new(army, OrderKind::MoveArmy { path }).issued_by(p);

        assert_eq!(order.execute(&mut game, &rules, &mut rng), OrderStatus::Executed);
        assert_eq!(game.armies[&army].location, Hex::new(1, 1));
        assert!(game.armies[&army].core.status[0].contains("blocked after 1 of 3"));
    }

    #[test]
    fn march_longer_than_movement_is_rejected() {
        let (mut game, p, army, rules) = setup();
        let mut rng = StdRng::seed_from_u64(1);
        let path = vec![Direction::East; 6];
        let mut order = Order::new(army, OrderKind::MoveArmy { path }).issued_by(p);

        assert_eq!(order.execute(&mut game, &rules, &mut rng), OrderStatus::Rejected);
        assert_eq!(game.armies[&army].location, Hex::new(0, 1));
    }

    #[test]
    fn passing_a_foreign_pop_reveals_it_without_details() {
        let (mut game, p, army, rules) = setup();
        let q = game.add_player("Brenna", "Southfolk", 0);
        let passed = game.add_pop_center("Mill", Owner::Player(q), Hex::new(1, 1), PopType::Town, 4);
        let dest = game.add_pop_center("Keep", Owner::Player(q), Hex::new(2, 1), PopType::Town, 4);
        let mut rng = StdRng::seed_from_u64(1);
        let path = vec![Direction::East, Direction::East];
        let mut order = Order::new(army, OrderKind::MoveArmy { path }).issued_by(p);

        assert_eq!(order.execute(&mut game, &rules, &mut rng), OrderStatus::Executed);
        let known = game.players[0].view.as_deref().unwrap();
        let seen = &known.pop_centers[&passed];
        assert_eq!(seen.core.owner(), Owner::Unknown);
        assert_eq!(seen.level, None);
        assert!(!known.pop_centers.contains_key(&dest));
    }

    #[test]
    fn soldiers_cannot_enter_foreign_pops() {
        let (mut game, p, _, rules) = setup();
        let q = game.add_player("Brenna", "Southfolk", 0);
        let home = game.add_pop_center("Ford", Owner::Player(p), Hex::new(0, 0), PopType::Town, 2);
        let foreign = game.add_pop_center("Mill", Owner::Player(q), Hex::new(1, 0), PopType::Town, 2);
        let mage = game.add_figure("Mage", Owner::Player(p), FigureKind::Wizard, 1, Some(Base::PopCenter(home)));
        let spy = game.add_figure("Shade", Owner::Player(p), FigureKind::Agent, 1, Some(Base::PopCenter(home)));
        let mut rng = StdRng::seed_from_u64(1);

        let mut wizard_move = Order::new(mage, OrderKind::MoveFigure { to: foreign }).issued_by(p);
        let mut agent_move = Order::new(spy, OrderKind::MoveFigure { to: foreign }).issued_by(p);
        assert_eq!(wizard_move.execute(&mut game, &rules, &mut rng), OrderStatus::Rejected);
        assert_eq!(agent_move.execute(&mut game, &rules, &mut rng), OrderStatus::Executed);
        assert_eq!(game.location_of(spy), Some(Hex::new(1, 0)));
    }
}
