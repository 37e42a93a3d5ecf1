//! Intelligence: keeping each player's fog-of-war view current.
//!
//! Once per resolved turn every player's view absorbs what their figures,
//! armies and pop centers can see, refreshes regional control knowledge
//! and reports foreign armies large enough to be sighted. Fresh reports on
//! foreign items are summed up in one intel event.

pub mod view;

use std::collections::BTreeMap;

use tracing::trace;

use crate::rules::Rules;
use crate::world::{control_level, Base, ControlLevel, EventCategory, Game, PlayerId, RegionId};

/// Runs `f` against a player's view, creating the view first if the player
/// has none. `None` if the player does not exist.
pub fn with_view<T>(game: &mut Game, pid: PlayerId, f: impl FnOnce(&mut Game, &Game) -> T) -> Option<T> {
    let existing = game.player_mut(pid)?.view.take();
    let mut known = existing.unwrap_or_else(|| Box::new(view::bootstrap_view(game, pid)));
    let out = f(&mut *known, &*game);
    if let Some(p) = game.player_mut(pid) {
        p.view = Some(known);
    }
    Some(out)
}

/// Refreshes one player's view from the authoritative game.
pub fn update_intelligence(game: &mut Game, pid: PlayerId, rules: &Rules) {
    let turn = game.turn;
    let refreshed = with_view(game, pid, |known, game| {
        known.turn = turn;
        let reports =
            absorb_figures(known, game, pid) + absorb_armies(known, game, pid) + absorb_pop_centers(known, game, pid);
        (reports, refresh_control(known, game, pid, rules))
    });
    let Some((reports, own_control)) = refreshed else {
        return;
    };
    if let Some(p) = game.player_mut(pid) {
        p.control.extend(own_control);
    }
    if reports > 0 {
        trace!(player = pid.0, reports, "view updated");
        game.notify(pid, EventCategory::Intel, format!("{reports} new reports on foreign holdings"));
    }
    for message in sightings(game, pid) {
        game.notify(pid, EventCategory::Sighting, message);
    }
}

/// Refreshes every player's view.
pub fn update_all(game: &mut Game, rules: &Rules) {
    let players: Vec<PlayerId> = game.player_ids().collect();
    for pid in players {
        update_intelligence(game, pid, rules);
    }
}

/// Foreign pop centers hosting one of the player's figures. Returns how
/// many foreign items the view took in.
fn absorb_figures(known: &mut Game, game: &Game, pid: PlayerId) -> usize {
    let mut reports = 0;
    for figure in game.figures_of(pid) {
        let Some(Base::PopCenter(id)) = figure.base() else {
            continue;
        };
        if let Some(pop) = game.pop_centers.get(&id) {
            if !pop.core.owner().is(pid) {
                trace!(player = pid.0, pop = %id, "figure reports on host");
                reports += usize::from(view::add_known_pop(known, view::observed_pop(pop, game.turn)));
            }
        }
    }
    reports
}

/// The player's armies and whatever shares their hex.
fn absorb_armies(known: &mut Game, game: &Game, pid: PlayerId) -> usize {
    let mut reports = 0;
    for army in game.armies_of(pid) {
        view::add_known_army(known, view::observed_army(army, game.turn));
        if let Some(pop) = game.pop_at(army.location) {
            if !pop.core.owner().is(pid) {
                reports += usize::from(view::add_known_pop(known, view::observed_pop(pop, game.turn)));
            }
        }
        for other in game.armies_at(army.location) {
            if !other.core.owner().is(pid) && !other.core.invisible {
                reports += usize::from(view::add_known_army(known, view::observed_army(other, game.turn)));
            }
        }
    }
    reports
}

/// The player's pop centers, the hexes around them and armies inside them.
fn absorb_pop_centers(known: &mut Game, game: &Game, pid: PlayerId) -> usize {
    let mut reports = 0;
    for pop in game.pop_centers_of(pid) {
        view::add_known_pop(known, view::observed_pop(pop, game.turn));
        let around = std::iter::once(pop.location).chain(game.map.neighbors(pop.location));
        for hex in around {
            if let Some(loc) = game.map.location(hex) {
                view::observe_location(known, *loc);
            }
        }
        for army in game.armies_at(pop.location) {
            if !army.core.owner().is(pid) && !army.core.invisible {
                reports += usize::from(view::add_known_army(known, view::observed_army(army, game.turn)));
            }
        }
    }
    reports
}

/// Writes every player's control and embassy level in exposed regions into
/// the view, and returns the player's own control level in every region.
fn refresh_control(
    known: &mut Game,
    game: &Game,
    pid: PlayerId,
    rules: &Rules,
) -> BTreeMap<RegionId, ControlLevel> {
    let mut own = BTreeMap::new();
    for region in game.map.regions() {
        own.insert(region.id, control_level(game, pid, region.id, &rules.control));
        if !rules.intel.exposes(region.id) {
            continue;
        }
        for other in game.player_ids() {
            let level = control_level(game, other, region.id, &rules.control);
            let embassy = game.player(other).map_or(0, |p| p.embassy(region.id));
            if let Some(shadow) = known.player_mut(other) {
                shadow.control.insert(region.id, level);
                if embassy > 0 {
                    shadow.embassies.insert(region.id, embassy);
                } else {
                    shadow.embassies.remove(&region.id);
                }
            }
        }
    }
    own
}

/// Sighting reports for foreign armies big enough to be noticed, given the
/// player's control of the region they stand in.
fn sightings(game: &Game, pid: PlayerId) -> Vec<String> {
    let Some(player) = game.player(pid) else {
        return Vec::new();
    };
    game.armies
        .values()
        .filter(|a| !a.core.owner().is(pid) && !a.core.invisible && a.is_active())
        .filter_map(|a| {
            let region = game.map.region_of(a.location)?;
            let threshold = player.control_in(region).sighting_threshold()?;
            (a.units.len() >= threshold).then(|| {
                format!(
                    "{} of {} sighted at {} with {} units",
                    a.core.name,
                    a.core.owner_name(),
                    a.location,
                    a.units.len()
                )
            })
        })
        .collect()
}
