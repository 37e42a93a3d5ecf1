//! Armies, their units, and the troop templates units are raised from.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::hex::Hex;
use super::item::{ItemCore, ItemId};
use super::map::Terrain;

/// Morale a freshly raised unit starts with.
pub const STARTING_MORALE: u32 = 100;
/// Morale can be driven above the starting value by victories, up to here.
pub const MAX_MORALE: u32 = 150;

/// Static definition of a kind of troop. Loaded from the rules and never
/// mutated by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TroopType {
    pub name: String,
    /// Head-count of a full-strength unit.
    pub size: u32,
    /// Fighting strength per soldier.
    pub strength: u32,
    /// Percentage of delivered hits that turn into casualties.
    pub armor: u32,
    /// Gold paid per unit each turn.
    #[serde(default)]
    pub maintenance: u32,
    /// Gold paid to raise one unit.
    #[serde(default)]
    pub support_cost: u32,
    /// Hexes a unit of this troop can march per turn.
    #[serde(default = "default_movement")]
    pub movement: u32,
    /// Terrain multipliers in percent; missing terrain counts as 100.
    #[serde(default)]
    pub terrain: BTreeMap<Terrain, u32>,
}

fn default_movement() -> u32 {
    4
}

impl TroopType {
    /// Strength percentage on a terrain; 100 unless listed.
    pub fn terrain_percent(&self, terrain: Terrain) -> u32 {
        self.terrain.get(&terrain).copied().unwrap_or(100)
    }
}

/// One unit of an army.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmyUnit {
    pub id: ItemId,
    #[serde(rename = "troop")]
    pub(crate) troop_name: String,
    #[serde(skip)]
    pub(crate) troop: TroopType,
    pub casualties: u32,
    pub morale: u32,
}

impl ArmyUnit {
    /// Raises a full-strength unit.
    pub fn new(id: ItemId, troop: &TroopType) -> Self {
        ArmyUnit {
            id,
            troop_name: troop.name.clone(),
            troop: troop.clone(),
            casualties: 0,
            morale: STARTING_MORALE,
        }
    }

    /// The linked troop template.
    pub fn troop(&self) -> &TroopType {
        &self.troop
    }

    /// Persisted troop template name.
    pub fn troop_name(&self) -> &str {
        &self.troop_name
    }

    /// Full head-count of the troop type.
    pub fn size(&self) -> u32 {
        self.troop.size
    }

    /// Surviving head-count.
    pub fn alive(&self) -> u32 {
        self.troop.size.saturating_sub(self.casualties)
    }

    /// Whether every soldier is a casualty.
    pub fn is_wiped_out(&self) -> bool {
        self.casualties >= self.troop.size
    }

    /// Strength of the unit fighting on the given terrain:
    /// alive × troop strength × terrain% × morale%.
    pub fn strength_on(&self, terrain: Terrain) -> u64 {
        u64::from(self.alive())
            * u64::from(self.troop.strength)
            * u64::from(self.troop.terrain_percent(terrain))
            * u64::from(self.morale)
            / 10_000
    }

    /// Shifts morale, clamped to `0..=MAX_MORALE`.
    pub fn adjust_morale(&mut self, delta: i32) {
        let next = i64::from(self.morale) + i64::from(delta);
        self.morale = next.clamp(0, i64::from(MAX_MORALE)) as u32;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Army {
    #[serde(flatten)]
    pub core: ItemCore,
    pub location: Hex,
    #[serde(default)]
    pub units: Vec<ArmyUnit>,
}

impl Army {
    /// An army with no units.
    pub fn new(core: ItemCore, location: Hex) -> Self {
        Army {
            core,
            location,
            units: Vec::new(),
        }
    }

    /// The army's item id.
    pub fn id(&self) -> ItemId {
        self.core.id
    }

    /// An army is active while it has at least one unit.
    pub fn is_active(&self) -> bool {
        !self.units.is_empty()
    }

    /// Sum of unit strengths on the given terrain, before any fatigue.
    pub fn raw_strength(&self, terrain: Terrain) -> u64 {
        self.units.iter().map(|u| u.strength_on(terrain)).sum()
    }

    /// Casualties summed over every unit.
    pub fn total_casualties(&self) -> u32 {
        self.units.iter().map(|u| u.casualties).sum()
    }

    /// Hexes the army can march this turn: the slowest unit sets the pace.
    pub fn movement(&self) -> u32 {
        self.units.iter().map(|u| u.troop.movement).min().unwrap_or(0)
    }

    /// Shifts the morale of every unit.
    pub fn adjust_morale(&mut self, delta: i32) {
        for unit in &mut self.units {
            unit.adjust_morale(delta);
        }
    }
}

impl PartialEq for Army {
    fn eq(&self, other: &Self) -> bool {
        self.core == other.core
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn infantry() -> TroopType {
        TroopType {
            name: "Infantry".into(),
            size: 100,
            strength: 10,
            armor: 100,
            maintenance: 1,
            support_cost: 50,
            movement: 3,
            terrain: BTreeMap::from([(Terrain::Forest, 50)]),
        }
    }

    #[test]
    fn unit_strength_scales_with_terrain_and_morale() {
        let mut unit = ArmyUnit::new(ItemId(1), &infantry());
        assert_eq!(unit.strength_on(Terrain::Plains), 1000);
        assert_eq!(unit.strength_on(Terrain::Forest), 500);
        unit.morale = 50;
        assert_eq!(unit.strength_on(Terrain::Plains), 500);
        unit.casualties = 60;
        assert_eq!(unit.strength_on(Terrain::Plains), 200);
    }

    #[test]
    fn morale_is_clamped() {
        let mut unit = ArmyUnit::new(ItemId(1), &infantry());
        unit.adjust_morale(100);
        assert_eq!(unit.morale, MAX_MORALE);
        unit.adjust_morale(-500);
        assert_eq!(unit.morale, 0);
    }

    #[test]
    fn empty_army_is_inactive() {
        let mut army = Army::new(ItemCore::new(ItemId(1), "Host"), Hex::new(0, 0));
        assert!(!army.is_active());
        assert_eq!(army.movement(), 0);
        army.units.push(ArmyUnit::new(ItemId(2), &infantry()));
        assert!(army.is_active());
        assert_eq!(army.movement(), 3);
    }
}
