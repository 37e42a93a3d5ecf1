//! Regional control tiers.
//!
//! A player's grip on a region is scored from the levels of the pop centers
//! it owns there plus its embassy level, then bucketed into tiers. Combat
//! uses the snapshot taken before the turn; intelligence uses the tiers to
//! decide how large a foreign army must be before it is sighted.

use serde::{Deserialize, Serialize};

use super::game::Game;
use super::item::{Owner, PlayerId};
use super::map::RegionId;
use crate::rules::ControlRules;

/// How strongly a player holds a region, weakest first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ControlLevel {
    #[default]
    Unknown,
    None,
    Presence,
    Control,
    Domination,
}

impl ControlLevel {
    /// Minimum number of units a foreign army needs before an observer at
    /// this control level notices it. `None` means it is never noticed.
    pub const fn sighting_threshold(self) -> Option<usize> {
        match self {
            ControlLevel::Domination => Some(2),
            ControlLevel::Control => Some(4),
            ControlLevel::Presence => Some(10),
            ControlLevel::None => Some(20),
            ControlLevel::Unknown => None,
        }
    }
}

/// Influence score of a player in a region: owned pop levels plus embassy.
pub fn influence(game: &Game, pid: PlayerId, region: RegionId) -> u32 {
    let pops: u32 = game
        .pop_centers
        .values()
        .filter(|p| p.core.owner() == Owner::Player(pid))
        .filter(|p| game.map.region_of(p.location) == Some(region))
        .map(|p| u32::from(p.level()))
        .sum();
    let embassy = game
        .players
        .get(pid.index())
        .map_or(0, |p| u32::from(p.embassy(region)));
    pops + embassy
}

/// Computes the control tier of a player in a region.
///
/// Domination additionally requires owning more pop levels in the region
/// than every other player combined.
pub fn control_level(game: &Game, pid: PlayerId, region: RegionId, rules: &ControlRules) -> ControlLevel {
    let score = influence(game, pid, region);
    if score == 0 {
        return ControlLevel::None;
    }
    if score >= rules.domination {
        let (own, others) = game
            .pop_centers
            .values()
            .filter(|p| game.map.region_of(p.location) == Some(region))
            .fold((0u32, 0u32), |(own, others), p| match p.core.owner() {
                Owner::Player(owner) if owner == pid => (own + u32::from(p.level()), others),
                Owner::Player(_) => (own, others + u32::from(p.level())),
                _ => (own, others),
            });
        if own > others {
            return ControlLevel::Domination;
        }
    }
    if score >= rules.control {
        return ControlLevel::Control;
    }
    ControlLevel::Presence
}
