//! Population centers: hamlets, towns and cities.

use serde::{Deserialize, Serialize};

use super::hex::Hex;
use super::item::{ItemCore, ItemId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PopType {
    Hamlet,
    Town,
    City,
    /// Placeholder used in fog-of-war views when the type is not known.
    Unknown,
}

impl PopType {
    /// Highest level a pop center of this type can be improved to.
    pub const fn level_cap(self) -> u8 {
        match self {
            PopType::Hamlet => 3,
            PopType::Town => 6,
            PopType::City => 10,
            PopType::Unknown => 0,
        }
    }

    /// Extra effective defense level when the owner dominates the region.
    pub const fn domination_bonus(self) -> u8 {
        match self {
            PopType::Town => 1,
            PopType::City => 2,
            PopType::Hamlet | PopType::Unknown => 0,
        }
    }

    /// Whether armies and figures can be recruited here.
    pub const fn can_recruit(self) -> bool {
        matches!(self, PopType::Town | PopType::City)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopCenter {
    #[serde(flatten)]
    pub core: ItemCore,
    pub location: Hex,
    pub pop_type: PopType,
    /// `None` only inside a view, when the level is not known.
    #[serde(default)]
    pub level: Option<u8>,
}

impl PopCenter {
    /// A pop center with a known level.
    pub fn new(core: ItemCore, location: Hex, pop_type: PopType, level: u8) -> Self {
        PopCenter {
            core,
            location,
            pop_type,
            level: Some(level),
        }
    }

    /// The pop center's item id.
    pub fn id(&self) -> ItemId {
        self.core.id
    }

    /// Known level, or 0 when unknown.
    pub fn level(&self) -> u8 {
        self.level.unwrap_or(0)
    }

    /// Whether the pop center can grow no further.
    pub fn at_level_cap(&self) -> bool {
        self.level() >= self.pop_type.level_cap()
    }
}

impl PartialEq for PopCenter {
    fn eq(&self, other: &Self) -> bool {
        self.core == other.core
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_level_reads_as_zero() {
        let mut pop = PopCenter::new(
            ItemCore::new(ItemId(3), "Ashford"),
            Hex::new(1, 1),
            PopType::Town,
            4,
        );
        assert_eq!(pop.level(), 4);
        pop.level = None;
        assert_eq!(pop.level(), 0);
    }

    #[test]
    fn only_towns_and_cities_recruit() {
        assert!(!PopType::Hamlet.can_recruit());
        assert!(PopType::Town.can_recruit());
        assert!(PopType::City.can_recruit());
        assert!(!PopType::Unknown.can_recruit());
    }

    #[test]
    fn domination_bonus_by_type() {
        assert_eq!(PopType::Hamlet.domination_bonus(), 0);
        assert_eq!(PopType::Town.domination_bonus(), 1);
        assert_eq!(PopType::City.domination_bonus(), 2);
    }
}
