//! Reference resolution after a load.
//!
//! Persisted games refer to other items by id or name. This pass turns
//! those into the live handles the engine works with: the map index and
//! region sets, item owners, figure bases, troop templates, each player's
//! king and capitol, their fog-of-war view, and the orders they queued.
//! It runs at the start of every turn and is safe to run twice.

use std::collections::BTreeSet;
use std::mem;

use thiserror::Error;
use tracing::{debug, warn};

use crate::rules::Rules;
use crate::world::{Base, FigureKind, Game, Hex, ItemId, ItemRef, Owner, RegionId, UNKNOWN_NAME, UNOWNED_NAME};

/// A persisted game that refers to something that is not there.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("location {hex} names unknown region {region}")]
    UnknownRegion { hex: Hex, region: RegionId },

    #[error("item {item} stands at {hex}, which is not on the map")]
    OffMap { item: ItemId, hex: Hex },

    #[error("item {item} is owned by unknown player '{owner}'")]
    UnknownOwner { item: ItemId, owner: String },

    #[error("player '{player}' belongs to unknown kingdom '{kingdom}'")]
    UnknownKingdom { player: String, kingdom: String },

    #[error("unit {unit} of army {army} uses unknown troop type '{troop}'")]
    UnknownTroop { army: ItemId, unit: ItemId, troop: String },

    #[error("figure {figure} is based in {base}, which cannot house it")]
    DanglingBase { figure: ItemId, base: ItemId },

    #[error("player '{player}' names {id} as king, which is not one of their kings")]
    DanglingKing { player: String, id: ItemId },

    #[error("player '{player}' names {id} as capitol, which is not one of their pop centers")]
    DanglingCapitol { player: String, id: ItemId },

    #[error("player name '{0}' is reserved")]
    ReservedName(String),

    #[error("player name '{0}' is used twice")]
    DuplicatePlayer(String),
}

/// Resolves every persisted reference in `game`.
pub fn link_game(game: &mut Game, rules: &Rules) -> Result<(), LinkError> {
    link_map(game)?;
    check_players(game, rules)?;
    link_pop_centers(game)?;
    link_armies(game, rules)?;
    link_figures(game)?;
    link_players(game, rules)?;
    link_orders(game);
    debug!(
        turn = game.turn,
        pop_centers = game.pop_centers.len(),
        armies = game.armies.len(),
        figures = game.figures.len(),
        "game linked"
    );
    Ok(())
}

fn link_map(game: &mut Game) -> Result<(), LinkError> {
    let map = &mut game.map;
    map.index.clear();
    for region in map.regions.values_mut() {
        region.members.clear();
    }
    for (i, loc) in map.locations.iter().enumerate() {
        let region = map
            .regions
            .get_mut(&loc.region)
            .ok_or(LinkError::UnknownRegion { hex: loc.hex, region: loc.region })?;
        region.members.insert(loc.hex);
        map.index.insert(loc.hex, i);
    }
    Ok(())
}

fn check_players(game: &Game, rules: &Rules) -> Result<(), LinkError> {
    let mut seen = BTreeSet::new();
    for p in &game.players {
        if p.name == UNOWNED_NAME || p.name == UNKNOWN_NAME {
            return Err(LinkError::ReservedName(p.name.clone()));
        }
        if !seen.insert(p.name.as_str()) {
            return Err(LinkError::DuplicatePlayer(p.name.clone()));
        }
        if rules.kingdom(&p.kingdom).is_none() {
            return Err(LinkError::UnknownKingdom {
                player: p.name.clone(),
                kingdom: p.kingdom.clone(),
            });
        }
    }
    Ok(())
}

fn resolve_owner(game: &Game, item: ItemId, name: &str) -> Result<Owner, LinkError> {
    game.resolve_owner(name).ok_or_else(|| LinkError::UnknownOwner {
        item,
        owner: name.to_string(),
    })
}

fn link_pop_centers(game: &mut Game) -> Result<(), LinkError> {
    let mut owners = Vec::with_capacity(game.pop_centers.len());
    for pop in game.pop_centers.values() {
        if !game.map.contains(pop.location) {
            return Err(LinkError::OffMap { item: pop.id(), hex: pop.location });
        }
        owners.push((pop.id(), resolve_owner(game, pop.id(), pop.core.owner_name())?));
    }
    for (id, owner) in owners {
        if let Some(pop) = game.pop_centers.get_mut(&id) {
            pop.core.owner = owner;
        }
        game.ids.observe(id);
    }
    game.reindex_pop_centers();
    Ok(())
}

fn link_armies(game: &mut Game, rules: &Rules) -> Result<(), LinkError> {
    let mut owners = Vec::with_capacity(game.armies.len());
    for army in game.armies.values() {
        if !game.map.contains(army.location) {
            return Err(LinkError::OffMap { item: army.id(), hex: army.location });
        }
        owners.push((army.id(), resolve_owner(game, army.id(), army.core.owner_name())?));
    }
    for (id, owner) in owners {
        let Some(army) = game.armies.get_mut(&id) else {
            continue;
        };
        army.core.owner = owner;
        for unit in &mut army.units {
            let troop = rules.troop(&unit.troop_name).ok_or_else(|| LinkError::UnknownTroop {
                army: id,
                unit: unit.id,
                troop: unit.troop_name.clone(),
            })?;
            unit.troop = troop.clone();
            game.ids.observe(unit.id);
        }
        game.ids.observe(id);
    }
    Ok(())
}

fn link_figures(game: &mut Game) -> Result<(), LinkError> {
    let mut links = Vec::with_capacity(game.figures.len());
    for figure in game.figures.values() {
        let id = figure.id();
        let owner = resolve_owner(game, id, figure.core.owner_name())?;
        let base = if figure.base_id.is_unknown() {
            None
        } else {
            match game.get_item(figure.base_id) {
                Some(ItemRef::PopCenter(_)) => Some(Base::PopCenter(figure.base_id)),
                Some(ItemRef::Army(_)) => Some(Base::Army(figure.base_id)),
                _ => {
                    return Err(LinkError::DanglingBase {
                        figure: id,
                        base: figure.base_id,
                    })
                }
            }
        };
        links.push((id, owner, base));
    }
    for (id, owner, base) in links {
        if let Some(figure) = game.figures.get_mut(&id) {
            figure.core.owner = owner;
            figure.set_base(base);
        }
        game.ids.observe(id);
    }
    Ok(())
}

/// Per-player fix-up. Guarded so a player is only ever linked once.
fn link_players(game: &mut Game, rules: &Rules) -> Result<(), LinkError> {
    for i in 0..game.players.len() {
        if game.players[i].linked {
            continue;
        }
        let player = &game.players[i];
        if let Some(id) = player.king {
            let ok = game
                .figures
                .get(&id)
                .is_some_and(|f| f.kind == FigureKind::King && f.core.owner().player().map(|p| p.index()) == Some(i));
            if !ok {
                return Err(LinkError::DanglingKing { player: player.name.clone(), id });
            }
        }
        if let Some(id) = player.capitol {
            let ok = game
                .pop_centers
                .get(&id)
                .is_some_and(|p| p.core.owner().player().map(|p| p.index()) == Some(i));
            if !ok {
                return Err(LinkError::DanglingCapitol { player: player.name.clone(), id });
            }
        }

        if let Some(mut view) = game.players[i].view.take() {
            let linked = link_game(&mut view, rules);
            game.players[i].view = Some(view);
            linked?;
        }
        game.players[i].linked = true;
    }
    Ok(())
}

/// Marks each pending order with its issuer and flags references to items
/// that no longer exist. Such orders are rejected when they run.
fn link_orders(game: &mut Game) {
    for pid in game.player_ids().collect::<Vec<_>>() {
        let Some(player) = game.player_mut(pid) else {
            continue;
        };
        let mut orders = mem::take(&mut player.pending_orders);
        for order in &mut orders {
            order.issuer = Some(pid);
            order.subject_missing = !game.contains_item(order.subject);
            order.target_missing = order.kind.target().is_some_and(|t| !game.contains_item(t));
            if order.subject_missing || order.target_missing {
                warn!(
                    player = pid.0,
                    subject = %order.subject,
                    order = %order.tag(),
                    "order refers to a missing item"
                );
            }
        }
        if let Some(player) = game.player_mut(pid) {
            player.pending_orders = orders;
        }
    }
}
