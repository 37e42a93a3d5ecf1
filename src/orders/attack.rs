//! Attacks on armies and pop centers, and demands for surrender.

use rand::Rng;

use super::{subject_army, Order, OrderKind, OrderTag, Outcome, Rejection};
use crate::combat::{self, BattleKind, BattleReport, CombatCapable};
use crate::intel::{self, view};
use crate::rules::Rules;
use crate::world::{Game, ItemRef, Owner, PlayerId};

pub(super) fn check(order: &Order, issuer: PlayerId, game: &Game, rules: &Rules) -> Result<u32, Rejection> {
    let army = subject_army(order, game)?;
    if !army.is_active() {
        return Err(Rejection::new(format!("{} has no troops", army.core.name)));
    }
    if army.core.has_executed(OrderTag::is_attack) {
        return Err(Rejection::new(format!("{} has already attacked this turn", army.core.name)));
    }

    let Some(target) = order.kind.target() else {
        return Err(Rejection::new("an attack needs a target"));
    };
    let (owner, location, name) = match (&order.kind, game.get_item(target)) {
        (OrderKind::AttackArmy { .. }, Some(ItemRef::Army(a))) => (a.core.owner(), a.location, &a.core.name),
        (OrderKind::AttackPopCenter { .. } | OrderKind::DemandSurrender { .. }, Some(ItemRef::PopCenter(p))) => {
            (p.core.owner(), p.location, &p.core.name)
        }
        (OrderKind::AttackArmy { .. }, _) => {
            return Err(Rejection::new(format!("{} is not an army", game.item_name(target))))
        }
        _ => return Err(Rejection::new(format!("{} is not a pop center", game.item_name(target)))),
    };
    if owner.is(issuer) {
        return Err(Rejection::new(format!("{name} belongs to your own kingdom")));
    }
    if location != army.location {
        return Err(Rejection::new(format!(
            "{name} is not at {}'s location",
            army.core.name
        )));
    }
    if game.scratch.attacked.contains(&target) {
        return Err(Rejection::new(format!("{name} was already attacked this turn")));
    }
    if matches!(order.kind, OrderKind::AttackArmy { .. } | OrderKind::AttackPopCenter { .. })
        && army.combat_strength(game, rules) == 0
    {
        return Err(Rejection::new(format!("{} has no fighting strength left", army.core.name)));
    }
    Ok(0)
}

pub(super) fn process<R: Rng + ?Sized>(order: &Order, game: &mut Game, rules: &Rules, rng: &mut R) -> Outcome {
    match order.kind {
        OrderKind::AttackArmy { target } => combat::army_battle(game, order.subject, target, rules, rng)
            .map_or(Outcome::Nothing, Outcome::Battle),
        OrderKind::AttackPopCenter { target } => combat::assault_pop_center(game, order.subject, target, rules, rng)
            .map_or(Outcome::Nothing, Outcome::Battle),
        OrderKind::DemandSurrender { target } => {
            if combat::demand_surrender(game, order.subject, target, rules, rng) {
                Outcome::Surrendered { pop: target }
            } else {
                Outcome::Nothing
            }
        }
        _ => Outcome::Nothing,
    }
}

/// Both sides of a field battle get a look at each other; a conquered pop
/// center becomes fully known to its new owner.
pub(super) fn update_views(report: &BattleReport, game: &mut Game) {
    match report.kind {
        BattleKind::Field => {
            reveal_army(report.attacker_owner, report.defender, game);
            if let Owner::Player(defender) = report.defender_owner {
                reveal_army(defender, report.attacker, game);
            }
        }
        BattleKind::Assault => {
            if report.conquered() {
                reveal_pop(report.attacker_owner, report.defender, game);
            }
        }
    }
}

fn reveal_army(pid: PlayerId, army: crate::world::ItemId, game: &mut Game) {
    intel::with_view(game, pid, |known, game| {
        if let Some(a) = game.armies.get(&army) {
            view::add_known_army(known, view::observed_army(a, game.turn));
        }
    });
}

pub(super) fn reveal_pop(pid: PlayerId, pop: crate::world::ItemId, game: &mut Game) {
    intel::with_view(game, pid, |known, game| {
        if let Some(p) = game.pop_centers.get(&pop) {
            view::add_known_pop(known, view::observed_pop(p, game.turn));
        }
    });
}
