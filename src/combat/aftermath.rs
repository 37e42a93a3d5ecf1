//! What happens to the losing side: captured or scattered figures,
//! conquered pop centers and a fallen capitol.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

use super::strength::CombatCapable;
use crate::rules::Rules;
use crate::world::{Base, EventCategory, Game, ItemId, Owner, PlayerId};

/// Sends a figure back to its owner's capitol, or into the wilds when the
/// owner has none.
pub fn send_home(game: &mut Game, figure: ItemId) {
    let Some(owner) = game.owner_of(figure) else {
        return;
    };
    let home = owner
        .player()
        .and_then(|pid| game.capitol_of(pid))
        .map(|p| Base::PopCenter(p.id()));
    let name = game.item_name(figure);
    game.rebase_figure(figure, home);
    let status = match home {
        Some(Base::PopCenter(id)) => format!("{name} fled to {}", game.item_name(id)),
        _ => format!("{name} fled into the wilds"),
    };
    game.add_status(figure, status);
}

/// Deals with figures of `loser` based in `base` after it was beaten.
///
/// With `capture_allowed` each figure is captured by `captor` with the
/// configured probability; every other figure is sent home. Returns the
/// captured figures.
pub fn scatter_figures<R: Rng + ?Sized>(
    game: &mut Game,
    base: ItemId,
    loser: PlayerId,
    captor: Option<PlayerId>,
    capture_allowed: bool,
    rules: &Rules,
    rng: &mut R,
) -> Vec<ItemId> {
    let mut captured = Vec::new();
    for figure in game.figures_based_in(base) {
        if !game.owner_of(figure).is_some_and(|o| o.is(loser)) {
            continue;
        }
        if capture_allowed && rng.gen_bool(rules.combat.capture_probability) {
            let name = game.item_name(figure);
            game.remove_figure(figure);
            debug!(%figure, "figure captured");
            game.notify(loser, EventCategory::Combat, format!("{name} was taken prisoner"));
            if let Some(captor) = captor {
                game.notify(captor, EventCategory::Combat, format!("Your forces captured {name}"));
            }
            captured.push(figure);
        } else {
            send_home(game, figure);
        }
    }
    captured
}

/// Removes an army from play, scattering the figures it carried.
pub fn destroy_army<R: Rng + ?Sized>(
    game: &mut Game,
    army: ItemId,
    captor: Option<PlayerId>,
    rules: &Rules,
    rng: &mut R,
) -> Vec<ItemId> {
    let Some(owner) = game.owner_of(army).and_then(Owner::player) else {
        game.remove_army(army);
        return Vec::new();
    };
    let name = game.item_name(army);
    let captured = scatter_figures(game, army, owner, captor, captor.is_some(), rules, rng);
    // Other players' figures riding along go home.
    for figure in game.figures_based_in(army) {
        send_home(game, figure);
    }
    game.remove_army(army);
    game.notify(owner, EventCategory::Combat, format!("{name} was destroyed"));
    captured
}

/// Hands a pop center to a new owner.
///
/// A conquest (`by_force`) may cost the pop center a level, never below 1,
/// and lets the victor capture figures found inside. A fallen capitol is
/// relocated for the old owner.
pub fn transfer_pop_center<R: Rng + ?Sized>(
    game: &mut Game,
    pop: ItemId,
    new_owner: PlayerId,
    by_force: bool,
    rules: &Rules,
    rng: &mut R,
) -> Vec<ItemId> {
    let Some(previous) = game.owner_of(pop) else {
        return Vec::new();
    };
    let was_capitol = game.pop_centers.get(&pop).is_some_and(|p| game.is_capitol(p));
    game.set_owner(pop, Owner::Player(new_owner));

    if let Some(p) = game.pop_centers.get_mut(&pop) {
        p.core.effects.clear();
        if by_force && p.level() > 1 && rng.gen_bool(rules.combat.level_loss_probability) {
            p.level = Some(p.level() - 1);
            let status = format!("Lost a level in the fighting, now level {}", p.level());
            p.core.status.push(status);
        }
    }

    let Owner::Player(old_owner) = previous else {
        return Vec::new();
    };
    if was_capitol {
        relocate_capitol(game, old_owner, rules, rng);
    }
    scatter_figures(game, pop, old_owner, Some(new_owner), by_force, rules, rng)
}

/// Moves a player's capitol to their strongest remaining pop center after
/// the old one fell. Ties are broken at random. With nothing left the
/// player is in the wilds: the capitol is cleared and armies with no
/// troops left disband. Either way the player loses power.
pub fn relocate_capitol<R: Rng + ?Sized>(game: &mut Game, pid: PlayerId, rules: &Rules, rng: &mut R) {
    let strengths: Vec<(ItemId, u64)> = game
        .pop_centers_of(pid)
        .map(|p| (p.id(), p.combat_strength(game, rules)))
        .collect();
    let best = strengths.iter().map(|(_, s)| *s).max();
    let ties: Vec<ItemId> = strengths
        .iter()
        .filter(|(_, s)| Some(*s) == best)
        .map(|(id, _)| *id)
        .collect();
    let next = ties.choose(rng).copied();

    if let Some(p) = game.player_mut(pid) {
        p.capitol = next;
        p.adjust_power(-i32::try_from(rules.combat.capitol_loss_power_penalty).unwrap_or(i32::MAX));
    }

    match next {
        Some(id) => {
            let name = game.item_name(id);
            info!(player = pid.0, capitol = %id, "capitol relocated");
            game.notify(pid, EventCategory::Combat, format!("Your capitol fell; the court moved to {name}"));
        }
        None => {
            info!(player = pid.0, "player driven into the wilds");
            game.notify(pid, EventCategory::Combat, "Your capitol fell and no pop center remains; you are in the wilds");
            let idle: Vec<ItemId> = game
                .armies_of(pid)
                .filter(|a| !a.is_active())
                .map(|a| a.id())
                .collect();
            for army in idle {
                destroy_army(game, army, None, rules, rng);
            }
        }
    }
}
