//! Players: treasury, diplomacy, pending orders, event log and the
//! player's private view of the world.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::control::ControlLevel;
use super::game::Game;
use super::item::ItemId;
use super::map::RegionId;
use crate::orders::Order;

/// Power never drops below this.
pub const MIN_POWER: u32 = 8;

/// What an event in a player's log is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    Rejection,
    Combat,
    Diplomacy,
    Mission,
    Intel,
    Sighting,
    Economy,
}

/// A line in a player's event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    pub turn: u32,
    pub category: EventCategory,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub kingdom: String,
    #[serde(default)]
    pub king: Option<ItemId>,
    #[serde(default)]
    pub capitol: Option<ItemId>,
    #[serde(default)]
    pub gold: u32,
    #[serde(default = "default_power")]
    pub power: u32,
    #[serde(default)]
    pub embassies: BTreeMap<RegionId, u8>,
    /// Orders queued for the next turn.
    #[serde(default)]
    pub pending_orders: Vec<Order>,
    #[serde(default)]
    pub events: Vec<GameEvent>,
    /// Last known control level per region.
    #[serde(default)]
    pub control: BTreeMap<RegionId, ControlLevel>,
    /// What this player knows about the world. Never authoritative.
    #[serde(default)]
    pub view: Option<Box<Game>>,
    #[serde(skip)]
    pub(crate) linked: bool,
}

fn default_power() -> u32 {
    MIN_POWER
}

impl Player {
    /// A player with no holdings and minimum power.
    pub fn new(name: impl Into<String>, kingdom: impl Into<String>, gold: u32) -> Self {
        Player {
            name: name.into(),
            kingdom: kingdom.into(),
            king: None,
            capitol: None,
            gold,
            power: MIN_POWER,
            embassies: BTreeMap::new(),
            pending_orders: Vec::new(),
            events: Vec::new(),
            control: BTreeMap::new(),
            view: None,
            linked: true,
        }
    }

    /// A copy carrying only what another player may know up front:
    /// name and kingdom.
    pub fn shadow(&self) -> Player {
        Player::new(self.name.clone(), self.kingdom.clone(), 0)
    }

    /// Embassy level in a region, 0 when none.
    pub fn embassy(&self, region: RegionId) -> u8 {
        self.embassies.get(&region).copied().unwrap_or(0)
    }

    /// Last known control tier in a region.
    pub fn control_in(&self, region: RegionId) -> ControlLevel {
        self.control.get(&region).copied().unwrap_or_default()
    }

    /// Appends an event to the log.
    pub fn record(&mut self, turn: u32, category: EventCategory, message: impl Into<String>) {
        self.events.push(GameEvent {
            turn,
            category,
            message: message.into(),
        });
    }

    /// Shifts power, never below [`MIN_POWER`].
    pub fn adjust_power(&mut self, delta: i32) {
        let next = i64::from(self.power) + i64::from(delta);
        self.power = next.max(i64::from(MIN_POWER)) as u32;
    }

    /// Whether fix-up already ran on this player.
    pub fn is_linked(&self) -> bool {
        self.linked
    }

    /// This turn's events of one category.
    pub fn events_of(&self, category: EventCategory) -> impl Iterator<Item = &GameEvent> {
        self.events.iter().filter(move |e| e.category == category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_has_a_floor() {
        let mut p = Player::new("Aldric", "Northmen", 100);
        p.power = 12;
        p.adjust_power(-10);
        assert_eq!(p.power, MIN_POWER);
        p.adjust_power(5);
        assert_eq!(p.power, 13);
    }

    #[test]
    fn shadow_drops_private_state() {
        let mut p = Player::new("Aldric", "Northmen", 900);
        p.king = Some(ItemId(4));
        p.embassies.insert(RegionId(2), 3);
        p.record(1, EventCategory::Economy, "Taxes collected");
        let s = p.shadow();
        assert_eq!(s.name, "Aldric");
        assert_eq!(s.kingdom, "Northmen");
        assert_eq!(s.gold, 0);
        assert!(s.king.is_none());
        assert!(s.embassies.is_empty());
        assert!(s.events.is_empty());
    }

    #[test]
    fn record_appends_event() {
        let mut p = Player::new("Brenna", "Southfolk", 0);
        p.record(3, EventCategory::Rejection, "no gold");
        assert_eq!(p.events_of(EventCategory::Rejection).count(), 1);
        assert_eq!(p.events[0].turn, 3);
    }
}
