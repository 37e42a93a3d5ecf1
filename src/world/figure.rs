//! Named characters: kings, wizards, diplomats and agents.
//!
//! A figure never stores a location of its own. It lives in a base (a pop
//! center or an army) and its location is always the base's location, or
//! nowhere when the figure is in the wilds.

use serde::{Deserialize, Serialize};

use super::item::{ItemCore, ItemId};

/// The kind of a figure. Each kind carries its own progression rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FigureKind {
    King,
    Wizard,
    Diplomat,
    Agent,
}

impl FigureKind {
    /// Highest level this kind can reach.
    pub const fn level_cap(self) -> u8 {
        match self {
            FigureKind::King => 10,
            FigureKind::Wizard => 10,
            FigureKind::Diplomat => 8,
            FigureKind::Agent => 8,
        }
    }

    /// How hard a figure of this kind is to assassinate. Subtracted from
    /// the assassin's level when computing the odds.
    pub const fn assassination_difficulty(self) -> u8 {
        match self {
            FigureKind::King => 5,
            FigureKind::Wizard => 3,
            FigureKind::Diplomat => 1,
            FigureKind::Agent => 2,
        }
    }

    /// Training cost modifier in percent.
    pub const fn training_cost_modifier(self) -> u32 {
        match self {
            FigureKind::King => 150,
            FigureKind::Wizard => 125,
            FigureKind::Diplomat => 100,
            FigureKind::Agent => 100,
        }
    }

    /// Whether a successful mission earns a level. Kings and wizards only
    /// advance through training.
    pub const fn promotes_on_mission(self) -> bool {
        matches!(self, FigureKind::Diplomat | FigureKind::Agent)
    }

    /// Starting movement range in hexes.
    pub const fn base_range(self) -> u32 {
        match self {
            FigureKind::King => 3,
            FigureKind::Wizard => 4,
            FigureKind::Diplomat => 5,
            FigureKind::Agent => 6,
        }
    }

    /// Display name of the kind.
    pub const fn name(self) -> &'static str {
        match self {
            FigureKind::King => "King",
            FigureKind::Wizard => "Wizard",
            FigureKind::Diplomat => "Diplomat",
            FigureKind::Agent => "Agent",
        }
    }
}

/// Where a figure currently resides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Base {
    PopCenter(ItemId),
    Army(ItemId),
}

impl Base {
    /// Id of the pop center or army.
    pub const fn id(self) -> ItemId {
        match self {
            Base::PopCenter(id) | Base::Army(id) => id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    #[serde(flatten)]
    pub core: ItemCore,
    pub kind: FigureKind,
    pub level: u8,
    pub range: u32,
    /// Persisted base reference; `0` means in the wilds.
    #[serde(rename = "base")]
    pub(crate) base_id: ItemId,
    #[serde(skip)]
    pub(crate) base: Option<Base>,
}

impl Figure {
    /// A figure of the given kind, level capped, in the wilds.
    pub fn new(core: ItemCore, kind: FigureKind, level: u8) -> Self {
        Figure {
            core,
            kind,
            level: level.min(kind.level_cap()),
            range: kind.base_range(),
            base_id: ItemId::UNKNOWN,
            base: None,
        }
    }

    /// The figure's item id.
    pub fn id(&self) -> ItemId {
        self.core.id
    }

    /// Where the figure is based; `None` in the wilds.
    pub fn base(&self) -> Option<Base> {
        self.base
    }

    /// Sets the base, keeping the persisted id in step.
    pub(crate) fn set_base(&mut self, base: Option<Base>) {
        self.base = base;
        self.base_id = base.map_or(ItemId::UNKNOWN, Base::id);
    }

    /// Whether the figure can train no further.
    pub fn at_level_cap(&self) -> bool {
        self.level >= self.kind.level_cap()
    }

    /// Raises the level by one unless capped. Returns true on promotion.
    pub fn promote(&mut self) -> bool {
        if self.at_level_cap() {
            return false;
        }
        self.level += 1;
        true
    }
}

impl PartialEq for Figure {
    fn eq(&self, other: &Self) -> bool {
        self.core == other.core
    }
}
