//! Building and merging a player's fog-of-war view.
//!
//! A view is an ordinary [`Game`] holding copies of what the player has
//! seen. Copies are stamped with the turn they were observed on, and a copy
//! is only ever replaced by a strictly newer observation.

use tracing::trace;

use crate::world::{Army, Game, Location, Owner, Player, PlayerId, PopCenter, PopType, UNKNOWN_NAME};

/// A full copy of a pop center as observed on `turn`.
pub fn observed_pop(pop: &PopCenter, turn: u32) -> PopCenter {
    let mut copy = pop.clone();
    copy.core.turn_seen = turn;
    copy.core.status.clear();
    copy.core.executed.clear();
    copy.core.effects.clear();
    copy
}

/// A pop center seen only from outside: where it is and what kind it is,
/// not who holds it or how large it has grown.
pub fn glimpsed_pop(pop: &PopCenter, turn: u32) -> PopCenter {
    let mut copy = observed_pop(pop, turn);
    copy.core.set_owner(Owner::Unknown, UNKNOWN_NAME);
    copy.level = None;
    copy
}

/// A full copy of an army as observed on `turn`.
pub fn observed_army(army: &Army, turn: u32) -> Army {
    let mut copy = army.clone();
    copy.core.turn_seen = turn;
    copy.core.status.clear();
    copy.core.executed.clear();
    copy.core.effects.clear();
    copy
}

/// Stores a pop-center observation unless the view already holds one at
/// least as recent. Returns whether the view changed.
pub fn add_known_pop(view: &mut Game, pop: PopCenter) -> bool {
    if let Some(known) = view.pop_centers.get(&pop.id()) {
        if known.core.turn_seen >= pop.core.turn_seen {
            trace!(pop = %pop.id(), known = known.core.turn_seen, seen = pop.core.turn_seen, "stale pop observation");
            return false;
        }
    }
    view.insert_pop_center(pop);
    true
}

/// Stores an army observation unless the view already holds one at least
/// as recent. Returns whether the view changed.
pub fn add_known_army(view: &mut Game, army: Army) -> bool {
    if let Some(known) = view.armies.get(&army.id()) {
        if known.core.turn_seen >= army.core.turn_seen {
            trace!(army = %army.id(), known = known.core.turn_seen, seen = army.core.turn_seen, "stale army observation");
            return false;
        }
    }
    view.ids.observe(army.id());
    view.armies.insert(army.id(), army);
    true
}

/// Records a location, moving it between region sets if its region changed.
pub fn observe_location(view: &mut Game, loc: Location) {
    view.map.insert_location(loc);
}

/// The starting view of a player: the whole map, a shadow of every player,
/// every city without owner or level, and the player's own pop centers.
pub fn bootstrap_view(game: &Game, pid: PlayerId) -> Game {
    let mut view = Game::new(game.map.clone());
    view.turn = game.turn;
    view.players = game.players.iter().map(Player::shadow).collect();

    for city in game.pops_of_type(PopType::City) {
        if !city.core.owner().is(pid) {
            add_known_pop(&mut view, glimpsed_pop(city, 0));
        }
    }
    for pop in game.pop_centers_of(pid) {
        add_known_pop(&mut view, observed_pop(pop, game.turn));
    }
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{GameMap, Hex, Region, RegionId, Terrain};

    fn game() -> (Game, PlayerId, PlayerId) {
        let map = GameMap::parallelogram(4, 4, Terrain::Plains, [Region::new(RegionId(1), "Vale")], |_| RegionId(1));
        let mut game = Game::new(map);
        let a = game.add_player("Aldric", "Northmen", 500);
        let b = game.add_player("Brenna", "Southfolk", 500);
        (game, a, b)
    }

    #[test]
    fn bootstrap_shows_cities_but_not_their_owners() {
        let (mut game, a, b) = game();
        let city = game.add_pop_center("Spire", Owner::Player(b), Hex::new(3, 3), PopType::City, 7);
        let town = game.add_pop_center("Mill", Owner::Player(b), Hex::new(2, 3), PopType::Town, 3);
        let home = game.add_pop_center("Ford", Owner::Player(a), Hex::new(0, 0), PopType::Town, 2);

        let view = bootstrap_view(&game, a);

        assert_eq!(view.players.len(), 2);
        assert_eq!(view.players[1].gold, 0);
        assert!(view.players[1].view.is_none());
        assert_eq!(view.pop_centers[&city].core.owner(), Owner::Unknown);
        assert_eq!(view.pop_centers[&city].level, None);
        assert!(!view.pop_centers.contains_key(&town));
        assert!(view.pop_centers[&home].core.owner().is(a));
        assert!(view.map.contains(Hex::new(3, 3)));
        assert!(view.armies.is_empty());
    }

    #[test]
    fn stale_observations_are_ignored() {
        let (mut game, a, b) = game();
        let id = game.add_pop_center("Mill", Owner::Player(b), Hex::new(1, 1), PopType::Town, 3);
        let mut view = bootstrap_view(&game, a);

        assert!(add_known_pop(&mut view, observed_pop(&game.pop_centers[&id], 4)));
        assert!(!add_known_pop(&mut view, glimpsed_pop(&game.pop_centers[&id], 4)));
        assert!(!add_known_pop(&mut view, glimpsed_pop(&game.pop_centers[&id], 2)));
        assert_eq!(view.pop_centers[&id].level, Some(3));
        assert!(add_known_pop(&mut view, glimpsed_pop(&game.pop_centers[&id], 5)));
        assert_eq!(view.pop_centers[&id].core.turn_seen, 5);
    }

    #[test]
    fn observed_location_changes_region() {
        let map = GameMap::parallelogram(
            2,
            1,
            Terrain::Plains,
            [Region::new(RegionId(1), "West"), Region::new(RegionId(2), "East")],
            |_| RegionId(1),
        );
        let mut game = Game::new(map);
        let a = game.add_player("Aldric", "Northmen", 0);
        let mut view = bootstrap_view(&game, a);

        observe_location(
            &mut view,
            Location { hex: Hex::new(1, 0), terrain: Terrain::Hills, region: RegionId(2) },
        );

        assert_eq!(view.map.region_of(Hex::new(1, 0)), Some(RegionId(2)));
        assert_eq!(view.map.terrain(Hex::new(1, 0)), Some(Terrain::Hills));
        assert!(!view.map.region(RegionId(1)).unwrap().members().contains(&Hex::new(1, 0)));
        assert!(view.map.region(RegionId(2)).unwrap().members().contains(&Hex::new(1, 0)));
    }
}
