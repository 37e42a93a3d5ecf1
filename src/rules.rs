//! Static game rules.
//!
//! Kingdom and troop definitions, the cross-category order priority table
//! and every tunable constant the engine uses. Loaded once from JSON (or
//! taken from [`Rules::default`]) and passed explicitly into turn
//! resolution; the engine never mutates it.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::orders::OrderTag;
use crate::world::{RegionId, Terrain, TroopType};

/// Errors that can occur when loading or validating rules.
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("failed to read rules file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse rules JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("kingdom '{kingdom}' names unknown militia troop '{troop}'")]
    UnknownMilitia { kingdom: String, troop: String },

    #[error("default militia troop '{0}' is not defined")]
    UnknownDefaultMilitia(String),

    #[error("unknown order type '{0}' in order priority")]
    UnknownOrderType(String),

    #[error("duplicate troop type '{0}'")]
    DuplicateTroop(String),

    #[error("{field} must be between 0 and 1, got {value}")]
    Probability { field: &'static str, value: f64 },

    #[error("decisive ratio needs a non-zero denominator")]
    DecisiveRatio,
}

/// A playable faction definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kingdom {
    pub name: String,
    /// Troop type that garrisons this kingdom's pop centers.
    pub militia: String,
    #[serde(default)]
    pub starting_gold: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatRules {
    /// Strength needed to deliver one hit.
    pub strength_per_hit: u64,
    /// Chance that a co-located enemy figure is captured after a decisive win.
    pub capture_probability: f64,
    /// Chance that a conquered pop center loses a level.
    pub level_loss_probability: f64,
    /// Power lost when a player's capitol falls.
    pub capitol_loss_power_penalty: u32,
    /// A win is decisive when winner / loser strength reaches
    /// `decisive_numerator / decisive_denominator`.
    pub decisive_numerator: u64,
    pub decisive_denominator: u64,
    /// Morale gained by winners and lost by losers, per unit.
    pub morale_swing: i32,
    pub capitol_resistance_bonus: i32,
    pub shield_bonus: i32,
    pub aura_bonus: i32,
}

impl Default for CombatRules {
    fn default() -> Self {
        CombatRules {
            strength_per_hit: 100,
            capture_probability: 0.25,
            level_loss_probability: 0.5,
            capitol_loss_power_penalty: 2,
            decisive_numerator: 3,
            decisive_denominator: 2,
            morale_swing: 10,
            capitol_resistance_bonus: 2,
            shield_bonus: 2,
            aura_bonus: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyRules {
    pub figure_hire_cost: u32,
    /// Base cost of one training level, scaled by the target level and the
    /// figure kind's modifier.
    pub training_cost: u32,
    /// Base cost of one pop-center level, scaled by the target level.
    pub improve_cost: u32,
    /// Gold collected per owned pop-center level each turn.
    pub gold_per_level: u32,
    /// Morale lost by every unit of a player who cannot pay upkeep.
    pub unpaid_morale_loss: i32,
}

impl Default for EconomyRules {
    fn default() -> Self {
        EconomyRules {
            figure_hire_cost: 500,
            training_cost: 100,
            improve_cost: 200,
            gold_per_level: 20,
            unpaid_morale_loss: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionRules {
    pub assassination_base_chance: f64,
    /// Chance added per level the assassin has over the target's difficulty.
    pub assassination_level_step: f64,
    /// Turns a cast effect stays in force, counting the casting turn.
    pub effect_duration: u32,
    pub max_embassy_level: u8,
    /// Base cost of one embassy level, scaled by the target level.
    pub embassy_cost: u32,
    pub spell_cost: u32,
}

impl Default for MissionRules {
    fn default() -> Self {
        MissionRules {
            assassination_base_chance: 0.5,
            assassination_level_step: 0.1,
            effect_duration: 2,
            max_embassy_level: 5,
            embassy_cost: 150,
            spell_cost: 100,
        }
    }
}

/// Influence scores at which a player reaches each control tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlRules {
    pub control: u32,
    pub domination: u32,
}

impl Default for ControlRules {
    fn default() -> Self {
        ControlRules {
            control: 6,
            domination: 12,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntelRules {
    /// Regions whose control and embassy levels are reported to every
    /// player each turn. Empty means every region.
    pub exposed_regions: Vec<RegionId>,
}

impl IntelRules {
    /// Whether the region's control is public knowledge.
    pub fn exposes(&self, region: RegionId) -> bool {
        self.exposed_regions.is_empty() || self.exposed_regions.contains(&region)
    }
}

/// The complete rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rules {
    pub troops: Vec<TroopType>,
    pub kingdoms: Vec<Kingdom>,
    /// Garrison troop for unowned pop centers.
    pub default_militia: String,
    /// Order type names, highest priority first.
    pub order_priority: Vec<String>,
    #[serde(default)]
    pub combat: CombatRules,
    #[serde(default)]
    pub economy: EconomyRules,
    #[serde(default)]
    pub missions: MissionRules,
    #[serde(default)]
    pub control: ControlRules,
    #[serde(default)]
    pub intel: IntelRules,
}

impl Rules {
    /// Loads and validates rules from a JSON file.
    pub fn load(path: &Path) -> Result<Rules, RulesError> {
        let data = fs::read_to_string(path).map_err(|source| RulesError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Rules::from_json(&data)
    }

    /// Parses and validates rules from a JSON string.
    pub fn from_json(json: &str) -> Result<Rules, RulesError> {
        let rules: Rules = serde_json::from_str(json)?;
        rules.validate()?;
        Ok(rules)
    }

    /// Checks that every name the rules use refers to something defined and
    /// that every probability lies in `[0, 1]`.
    pub fn validate(&self) -> Result<(), RulesError> {
        for (field, value) in [
            ("combat.capture_probability", self.combat.capture_probability),
            ("combat.level_loss_probability", self.combat.level_loss_probability),
            ("missions.assassination_base_chance", self.missions.assassination_base_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(RulesError::Probability { field, value });
            }
        }
        if self.combat.decisive_denominator == 0 {
            return Err(RulesError::DecisiveRatio);
        }
        for (i, t) in self.troops.iter().enumerate() {
            if self.troops[..i].iter().any(|o| o.name == t.name) {
                return Err(RulesError::DuplicateTroop(t.name.clone()));
            }
        }
        if self.troop(&self.default_militia).is_none() {
            return Err(RulesError::UnknownDefaultMilitia(self.default_militia.clone()));
        }
        for k in &self.kingdoms {
            if self.troop(&k.militia).is_none() {
                return Err(RulesError::UnknownMilitia {
                    kingdom: k.name.clone(),
                    troop: k.militia.clone(),
                });
            }
        }
        for name in &self.order_priority {
            if OrderTag::from_name(name).is_none() {
                return Err(RulesError::UnknownOrderType(name.clone()));
            }
        }
        Ok(())
    }

    /// Looks a troop type up by name.
    pub fn troop(&self, name: &str) -> Option<&TroopType> {
        self.troops.iter().find(|t| t.name == name)
    }

    /// Looks a kingdom up by name.
    pub fn kingdom(&self, name: &str) -> Option<&Kingdom> {
        self.kingdoms.iter().find(|k| k.name == name)
    }

    /// Garrison troop for pop centers held by the given kingdom, or the
    /// default militia when unowned.
    pub fn militia(&self, kingdom: Option<&str>) -> Option<&TroopType> {
        kingdom
            .and_then(|k| self.kingdom(k))
            .and_then(|k| self.troop(&k.militia))
            .or_else(|| self.troop(&self.default_militia))
    }
}

impl Default for Rules {
    fn default() -> Self {
        let troop = |name: &str,
                     size: u32,
                     strength: u32,
                     armor: u32,
                     maintenance: u32,
                     support_cost: u32,
                     movement: u32| TroopType {
            name: name.to_string(),
            size,
            strength,
            armor,
            maintenance,
            support_cost,
            movement,
            terrain: Default::default(),
        };
        let mut cavalry = troop("Cavalry", 50, 25, 90, 4, 200, 5);
        cavalry.terrain.insert(Terrain::Forest, 75);
        cavalry.terrain.insert(Terrain::Mountains, 50);
        cavalry.terrain.insert(Terrain::Swamp, 50);
        let mut archers = troop("Archers", 80, 12, 110, 2, 120, 3);
        archers.terrain.insert(Terrain::Hills, 125);
        archers.terrain.insert(Terrain::Forest, 110);

        let kingdom = |name: &str| Kingdom {
            name: name.to_string(),
            militia: "Militia".to_string(),
            starting_gold: 1000,
        };

        Rules {
            troops: vec![
                troop("Militia", 100, 5, 100, 0, 0, 2),
                troop("Infantry", 100, 10, 80, 2, 100, 3),
                cavalry,
                archers,
            ],
            kingdoms: vec![
                kingdom("Northmen"),
                kingdom("Southfolk"),
                kingdom("Eastlings"),
                kingdom("Westmarch"),
            ],
            default_militia: "Militia".to_string(),
            order_priority: OrderTag::DEFAULT_PRIORITY
                .iter()
                .map(|t| t.name().to_string())
                .collect(),
            combat: CombatRules::default(),
            economy: EconomyRules::default(),
            missions: MissionRules::default(),
            control: ControlRules::default(),
            intel: IntelRules::default(),
        }
    }
}
