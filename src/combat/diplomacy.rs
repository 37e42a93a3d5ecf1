//! Demands for surrender.

use rand::Rng;
use tracing::debug;

use super::aftermath::transfer_pop_center;
use crate::rules::Rules;
use crate::world::{Army, EffectKind, EventCategory, FigureKind, Game, ItemId, Owner, PlayerId, PopCenter};

/// How persuasive an army is: its active units, the highest-level diplomat
/// riding with it and any diplomatic aura.
pub fn diplomatic_rating(game: &Game, army: &Army, rules: &Rules) -> i32 {
    let units = army.units.len() as i32;
    let diplomat = game
        .figures_based_in(army.id())
        .iter()
        .filter_map(|id| game.figures.get(id))
        .filter(|f| f.kind == FigureKind::Diplomat)
        .map(|f| i32::from(f.level))
        .max()
        .unwrap_or(0);
    let aura = if army.core.has_effect(EffectKind::DiplomaticAura, game.turn) {
        rules.combat.aura_bonus
    } else {
        0
    };
    units + diplomat + aura
}

/// How firmly a pop center holds out against `demander`: its level, a
/// capitol bonus, the owner's embassy in the region less the demander's,
/// and any shield.
pub fn surrender_resistance(game: &Game, pop: &PopCenter, demander: PlayerId, rules: &Rules) -> i32 {
    let mut resistance = i32::from(pop.level());
    if game.is_capitol(pop) {
        resistance += rules.combat.capitol_resistance_bonus;
    }
    if let Some(region) = game.map.region_of(pop.location) {
        let embassy = |pid: PlayerId| game.player(pid).map_or(0, |p| i32::from(p.embassy(region)));
        if let Owner::Player(owner) = pop.core.owner() {
            resistance += embassy(owner);
        }
        resistance -= embassy(demander);
    }
    if pop.core.has_effect(EffectKind::Shield, game.turn) {
        resistance += rules.combat.shield_bonus;
    }
    resistance
}

/// Asks a pop center to surrender to an army. Returns true if it did.
pub fn demand_surrender<R: Rng + ?Sized>(
    game: &mut Game,
    army: ItemId,
    target: ItemId,
    rules: &Rules,
    rng: &mut R,
) -> bool {
    let (Some(a), Some(pop)) = (game.armies.get(&army), game.pop_centers.get(&target)) else {
        return false;
    };
    let Some(demander) = a.core.owner().player() else {
        return false;
    };
    let rating = diplomatic_rating(game, a, rules);
    let resistance = surrender_resistance(game, pop, demander, rules);
    let owner = pop.core.owner();
    let (a_name, p_name) = (a.core.name.clone(), pop.core.name.clone());
    game.scratch.attacked.insert(target);

    let surrendered = rating > resistance;
    debug!(%army, pop = %target, rating, resistance, surrendered, "surrender demanded");
    let summary = if surrendered {
        transfer_pop_center(game, target, demander, false, rules, rng);
        format!("{p_name} surrendered to {a_name} (rating {rating} against {resistance})")
    } else {
        format!("{p_name} refused to surrender to {a_name} (rating {rating} against {resistance})")
    };
    game.add_status(army, summary.clone());
    game.add_status(target, summary.clone());
    game.notify(demander, EventCategory::Diplomacy, summary.clone());
    if let Owner::Player(pid) = owner {
        game.notify(pid, EventCategory::Diplomacy, summary);
    }
    surrendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Base, GameMap, Hex, PopType, Region, RegionId, Terrain};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Setup {
        game: Game,
        a: PlayerId,
        army: ItemId,
        pop: ItemId,
        rules: Rules,
    }

    fn setup(units: usize, pop_level: u8) -> Setup {
        let map = GameMap::parallelogram(3, 3, Terrain::Plains, [Region::new(RegionId(1), "Vale")], |_| RegionId(1));
        let mut game = Game::new(map);
        let a = game.add_player("Aldric", "Northmen", 0);
        let b = game.add_player("Brenna", "Southfolk", 0);
        let rules = Rules::default();
        let army = game.add_army("Host", Owner::Player(a), Hex::new(1, 1));
        let militia = rules.troop("Militia").cloned().unwrap();
        for _ in 0..units {
            game.add_unit(army, &militia);
        }
        let pop = game.add_pop_center("Mill", Owner::Player(b), Hex::new(1, 1), PopType::Town, pop_level);
        Setup { game, a, army, pop, rules }
    }

    #[test]
    fn rating_counts_units_diplomat_and_aura() {
        let mut s = setup(3, 2);
        s.game.add_figure("Envoy", Owner::Player(s.a), FigureKind::Diplomat, 4, Some(Base::Army(s.army)));
        let turn = s.game.turn;
        s.game.armies.get_mut(&s.army).unwrap().core.add_effect(EffectKind::DiplomaticAura, turn);
        let army = &s.game.armies[&s.army];
        assert_eq!(diplomatic_rating(&s.game, army, &s.rules), 3 + 4 + 2);
    }

    #[test]
    fn embassies_shift_resistance() {
        let mut s = setup(1, 3);
        s.game.players[1].embassies.insert(RegionId(1), 2);
        s.game.players[0].embassies.insert(RegionId(1), 1);
        let pop = &s.game.pop_centers[&s.pop];
        assert_eq!(surrender_resistance(&s.game, pop, s.a, &s.rules), 3 + 2 - 1);
    }

    #[test]
    fn surrender_needs_a_strictly_higher_rating() {
        let mut s = setup(3, 3);
        let mut rng = StdRng::seed_from_u64(2);
        assert!(!demand_surrender(&mut s.game, s.army, s.pop, &s.rules, &mut rng));

        let mut s = setup(4, 3);
        assert!(demand_surrender(&mut s.game, s.army, s.pop, &s.rules, &mut rng));
        assert!(s.game.pop_centers[&s.pop].core.owner().is(s.a));
        // No fighting, no level loss.
        assert_eq!(s.game.pop_centers[&s.pop].level(), 3);
        assert_eq!(s.game.armies[&s.army].total_casualties(), 0);
    }
}
