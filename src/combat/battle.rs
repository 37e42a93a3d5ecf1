//! Army-versus-army battles and assaults on pop centers.
//!
//! Strengths are compared as they stand; the stronger side wins and a tie
//! goes to the defender. The loser takes one hit per `strength_per_hit` of
//! the winner's strength, the winner half as many from the loser's. A win is
//! decisive when the loser is wiped out or the strength ratio reaches
//! `decisive_numerator / decisive_denominator` (3:2 by default).

use rand::Rng;
use tracing::debug;

use super::aftermath::{destroy_army, scatter_figures, transfer_pop_center};
use super::strength::CombatCapable;
use crate::rules::Rules;
use crate::world::{EventCategory, Game, Hex, ItemId, Owner, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleKind {
    /// Two armies meet in the field.
    Field,
    /// An army storms a pop center.
    Assault,
}

/// Everything the rest of the turn needs to know about a battle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleReport {
    pub kind: BattleKind,
    pub hex: Hex,
    pub attacker: ItemId,
    pub defender: ItemId,
    pub attacker_owner: PlayerId,
    pub defender_owner: Owner,
    pub attacker_strength: u64,
    pub defender_strength: u64,
    pub attacker_won: bool,
    pub decisive: bool,
    /// Armies removed from play.
    pub destroyed: Vec<ItemId>,
    /// Figures taken prisoner.
    pub captured: Vec<ItemId>,
}

impl BattleReport {
    /// Whether an assault took the pop center.
    pub fn conquered(&self) -> bool {
        self.kind == BattleKind::Assault && self.attacker_won
    }
}

fn hits(strength: u64, per_hit: u64) -> u64 {
    strength / per_hit.max(1)
}

fn is_decisive(winner: u64, loser: u64, loser_destroyed: bool, rules: &Rules) -> bool {
    let combat = &rules.combat;
    loser_destroyed
        || winner.saturating_mul(combat.decisive_denominator) >= loser.saturating_mul(combat.decisive_numerator)
}

/// Fights a field battle between two armies on the same hex.
pub fn army_battle<R: Rng + ?Sized>(
    game: &mut Game,
    attacker: ItemId,
    defender: ItemId,
    rules: &Rules,
    rng: &mut R,
) -> Option<BattleReport> {
    let a = game.armies.get(&attacker)?;
    let d = game.armies.get(&defender)?;
    let attacker_owner = a.core.owner().player()?;
    let defender_owner = d.core.owner();
    let hex = a.location;
    let a_str = a.combat_strength(game, rules);
    let d_str = d.combat_strength(game, rules);
    let (a_name, d_name) = (a.core.name.clone(), d.core.name.clone());

    game.scratch.attacked.insert(defender);
    game.scratch.fought.insert(attacker);
    game.scratch.fought.insert(defender);

    let attacker_won = a_str > d_str;
    let (winner, loser, w_str, l_str) = if attacker_won {
        (attacker, defender, a_str, d_str)
    } else {
        (defender, attacker, d_str, a_str)
    };
    let per_hit = rules.combat.strength_per_hit;
    let swing = rules.combat.morale_swing;

    if let Some(army) = game.armies.get_mut(&loser) {
        army.take_damage(hits(w_str, per_hit));
        army.adjust_morale(-swing);
    }
    if let Some(army) = game.armies.get_mut(&winner) {
        army.take_damage(hits(l_str, 2 * per_hit));
        army.adjust_morale(swing);
    }
    debug!(%attacker, %defender, a_str, d_str, attacker_won, "field battle");

    let loser_destroyed = game.armies.get(&loser).is_some_and(|a| !a.is_active());
    let decisive = is_decisive(w_str, l_str, loser_destroyed, rules);
    let winner_owner = game.owner_of(winner).and_then(Owner::player);
    let loser_owner = game.owner_of(loser).and_then(Owner::player);

    let mut destroyed = Vec::new();
    let mut captured = Vec::new();
    if loser_destroyed {
        captured.extend(destroy_army(game, loser, winner_owner, rules, rng));
        destroyed.push(loser);
    } else if let (true, Some(lo)) = (decisive, loser_owner) {
        captured.extend(scatter_figures(game, loser, lo, winner_owner, true, rules, rng));
    }
    if game.armies.get(&winner).is_some_and(|a| !a.is_active()) {
        destroy_army(game, winner, None, rules, rng);
        destroyed.push(winner);
    }

    let verdict = match (attacker_won, decisive) {
        (true, true) => "routed",
        (true, false) => "defeated",
        (false, _) => "was repulsed by",
    };
    let summary = format!("{a_name} ({a_str}) {verdict} {d_name} ({d_str}) at {hex}");
    game.add_status(attacker, summary.clone());
    game.add_status(defender, summary.clone());
    game.notify(attacker_owner, EventCategory::Combat, summary.clone());
    if let Owner::Player(pid) = defender_owner {
        game.notify(pid, EventCategory::Combat, summary);
    }

    Some(BattleReport {
        kind: BattleKind::Field,
        hex,
        attacker,
        defender,
        attacker_owner,
        defender_owner,
        attacker_strength: a_str,
        defender_strength: d_str,
        attacker_won,
        decisive,
        destroyed,
        captured,
    })
}

/// Storms a pop center. A victory is always decisive and conquers it.
pub fn assault_pop_center<R: Rng + ?Sized>(
    game: &mut Game,
    attacker: ItemId,
    target: ItemId,
    rules: &Rules,
    rng: &mut R,
) -> Option<BattleReport> {
    let a = game.armies.get(&attacker)?;
    let pop = game.pop_centers.get(&target)?;
    let attacker_owner = a.core.owner().player()?;
    let defender_owner = pop.core.owner();
    let hex = pop.location;
    let a_str = a.combat_strength(game, rules);
    let p_str = pop.combat_strength(game, rules);
    let (a_name, p_name) = (a.core.name.clone(), pop.core.name.clone());

    game.scratch.attacked.insert(target);
    game.scratch.fought.insert(attacker);

    let attacker_won = a_str > p_str;
    let per_hit = rules.combat.strength_per_hit;
    let swing = rules.combat.morale_swing;
    if let Some(army) = game.armies.get_mut(&attacker) {
        if attacker_won {
            army.take_damage(hits(p_str, 2 * per_hit));
            army.adjust_morale(swing);
        } else {
            army.take_damage(hits(p_str, per_hit));
            army.adjust_morale(-swing);
        }
    }
    debug!(%attacker, pop = %target, a_str, p_str, attacker_won, "assault");

    let mut captured = Vec::new();
    if attacker_won {
        captured = transfer_pop_center(game, target, attacker_owner, true, rules, rng);
    }
    let mut destroyed = Vec::new();
    if game.armies.get(&attacker).is_some_and(|a| !a.is_active()) {
        destroy_army(game, attacker, None, rules, rng);
        destroyed.push(attacker);
    }

    let summary = if attacker_won {
        format!("{a_name} ({a_str}) stormed {p_name} ({p_str})")
    } else {
        format!("{a_name} ({a_str}) failed to storm {p_name} ({p_str})")
    };
    game.add_status(attacker, summary.clone());
    game.add_status(target, summary.clone());
    game.notify(attacker_owner, EventCategory::Combat, summary.clone());
    if let Owner::Player(pid) = defender_owner {
        game.notify(pid, EventCategory::Combat, summary);
    }

    Some(BattleReport {
        kind: BattleKind::Assault,
        hex,
        attacker,
        defender: target,
        attacker_owner,
        defender_owner,
        attacker_strength: a_str,
        defender_strength: p_str,
        attacker_won,
        decisive: attacker_won,
        destroyed,
        captured,
    })
}
