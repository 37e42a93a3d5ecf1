//! Effective fighting strength.

use crate::rules::Rules;
use crate::world::{Army, ControlLevel, Game, ItemId, Owner, PopCenter, Terrain};

/// Something that can take part in a battle.
pub trait CombatCapable {
    fn combatant_id(&self) -> ItemId;

    /// Strength this combatant brings to a battle right now.
    fn combat_strength(&self, game: &Game, rules: &Rules) -> u64;
}

impl CombatCapable for Army {
    fn combatant_id(&self) -> ItemId {
        self.id()
    }

    /// Unit strengths on the army's terrain. An army that already fought
    /// this turn fights at three quarters.
    fn combat_strength(&self, game: &Game, _rules: &Rules) -> u64 {
        let terrain = game.map.terrain(self.location).unwrap_or(Terrain::Plains);
        let raw = self.raw_strength(terrain);
        if game.scratch.fought.contains(&self.id()) {
            raw * 3 / 4
        } else {
            raw
        }
    }
}

impl CombatCapable for PopCenter {
    fn combatant_id(&self) -> ItemId {
        self.id()
    }

    /// The owner's militia at the pop center's effective level. Capitols
    /// fight at one and a half times.
    fn combat_strength(&self, game: &Game, rules: &Rules) -> u64 {
        let kingdom = self
            .core
            .owner()
            .player()
            .and_then(|pid| game.player(pid))
            .map(|p| p.kingdom.as_str());
        let Some(militia) = rules.militia(kingdom) else {
            return 0;
        };
        let level = u64::from(effective_level(self, game));
        let strength = u64::from(militia.size) * u64::from(militia.strength) * level;
        if game.is_capitol(self) {
            strength * 3 / 2
        } else {
            strength
        }
    }
}

/// Level a pop center defends at: its own level plus the type's domination
/// bonus when the owner dominated the region at the start of the turn.
pub fn effective_level(pop: &PopCenter, game: &Game) -> u8 {
    let dominated = match (pop.core.owner(), game.map.region_of(pop.location)) {
        (Owner::Player(pid), Some(region)) => {
            game.scratch.control(pid, region) == ControlLevel::Domination
        }
        _ => false,
    };
    if dominated {
        pop.level().saturating_add(pop.pop_type.domination_bonus())
    } else {
        pop.level()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{GameMap, Hex, PopType, Region, RegionId};

    fn game() -> Game {
        let map = GameMap::parallelogram(3, 3, Terrain::Plains, [Region::new(RegionId(1), "Vale")], |_| RegionId(1));
        Game::new(map)
    }

    #[test]
    fn unowned_pop_uses_default_militia() {
        let mut game = game();
        let rules = Rules::default();
        let id = game.add_pop_center("Croft", Owner::Unowned, Hex::new(1, 1), PopType::Hamlet, 2);
        assert_eq!(game.pop_centers[&id].combat_strength(&game, &rules), 1000);
    }

    #[test]
    fn capitol_and_domination_raise_defense() {
        let mut game = game();
        let rules = Rules::default();
        let p = game.add_player("Aldric", "Northmen", 0);
        let id = game.add_pop_center("Spire", Owner::Player(p), Hex::new(1, 1), PopType::City, 4);
        assert_eq!(game.pop_centers[&id].combat_strength(&game, &rules), 2000);

        game.players[0].capitol = Some(id);
        assert_eq!(game.pop_centers[&id].combat_strength(&game, &rules), 3000);

        game.scratch.control_snapshot.insert((p, RegionId(1)), ControlLevel::Domination);
        assert_eq!(effective_level(&game.pop_centers[&id], &game), 6);
        assert_eq!(game.pop_centers[&id].combat_strength(&game, &rules), 4500);
    }

    #[test]
    fn fatigue_after_a_battle() {
        let mut game = game();
        let rules = Rules::default();
        let p = game.add_player("Aldric", "Northmen", 0);
        let army = game.add_army("Host", Owner::Player(p), Hex::new(0, 0));
        let infantry = rules.troop("Infantry").cloned().unwrap();
        game.add_unit(army, &infantry);
        assert_eq!(game.armies[&army].combat_strength(&game, &rules), 1000);
        game.scratch.fought.insert(army);
        assert_eq!(game.armies[&army].combat_strength(&game, &rules), 750);
    }
}
