//! Identity and ownership shared by every game item.
//!
//! Cross-references between items are [`ItemId`]s resolved through the
//! [`Game`](super::Game) arena. Owners are persisted by name and resolved
//! to a [`PlayerId`] by the reference resolver.

use serde::{Deserialize, Serialize};

use crate::orders::OrderTag;

/// Persisted owner name for items nobody owns.
pub const UNOWNED_NAME: &str = "Unowned";
/// Persisted owner name for items whose owner the viewer does not know.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Unique item identifier within a game. `0` means unknown.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ItemId(pub u32);

impl ItemId {
    pub const UNKNOWN: ItemId = ItemId(0);

    /// Whether this is the placeholder id 0.
    pub const fn is_unknown(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out fresh item ids. Persisted with the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdGenerator {
    next: u32,
}

impl Default for IdGenerator {
    fn default() -> Self {
        IdGenerator { next: 1 }
    }
}

impl IdGenerator {
    /// Hands out the next unused id.
    pub fn next_id(&mut self) -> ItemId {
        let id = ItemId(self.next);
        self.next += 1;
        id
    }

    /// Makes sure ids handed out from now on are above `seen`.
    pub fn observe(&mut self, seen: ItemId) {
        if seen.0 >= self.next {
            self.next = seen.0 + 1;
        }
    }
}

/// Index of a player within [`Game::players`](super::Game).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u16);

impl PlayerId {
    /// Position in `Game::players`.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Resolved owner of an item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Owner {
    #[default]
    Unowned,
    Unknown,
    Player(PlayerId),
}

impl Owner {
    /// The owning player, if a player owns it.
    pub const fn player(self) -> Option<PlayerId> {
        match self {
            Owner::Player(p) => Some(p),
            _ => None,
        }
    }

    /// Whether the given player owns it.
    pub fn is(self, pid: PlayerId) -> bool {
        self == Owner::Player(pid)
    }
}

/// A temporary magical effect on an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Raises an army's diplomatic rating.
    DiplomaticAura,
    /// Protects a pop center and the figures inside it.
    Shield,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub kind: EffectKind,
    /// Last turn on which the effect is in force.
    pub until_turn: u32,
}

/// Fields common to every game item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemCore {
    pub id: ItemId,
    pub name: String,
    #[serde(rename = "owner")]
    pub(crate) owner_name: String,
    #[serde(skip)]
    pub(crate) owner: Owner,
    /// Turn on which this copy of the item was observed.
    #[serde(default)]
    pub turn_seen: u32,
    #[serde(default)]
    pub invisible: bool,
    /// Readable status lines from the last resolved turn.
    #[serde(default)]
    pub status: Vec<String>,
    /// Orders this item executed during the current turn.
    #[serde(default)]
    pub executed: Vec<OrderTag>,
    #[serde(default)]
    pub effects: Vec<ActiveEffect>,
}

impl ItemCore {
    /// Unowned, unseen item fields.
    pub fn new(id: ItemId, name: impl Into<String>) -> Self {
        ItemCore {
            id,
            name: name.into(),
            owner_name: UNOWNED_NAME.to_string(),
            owner: Owner::Unowned,
            turn_seen: 0,
            invisible: false,
            status: Vec::new(),
            executed: Vec::new(),
            effects: Vec::new(),
        }
    }

    /// Resolved owner.
    pub fn owner(&self) -> Owner {
        self.owner
    }

    /// Persisted owner name.
    pub fn owner_name(&self) -> &str {
        &self.owner_name
    }

    /// Sets both the resolved owner and its persisted name.
    pub(crate) fn set_owner(&mut self, owner: Owner, name: impl Into<String>) {
        self.owner = owner;
        self.owner_name = name.into();
    }

    /// Whether an executed order this turn matches `pred`.
    pub fn has_executed(&self, pred: impl Fn(OrderTag) -> bool) -> bool {
        self.executed.iter().any(|t| pred(*t))
    }

    /// Whether an effect of this kind is in force on `turn`.
    pub fn has_effect(&self, kind: EffectKind, turn: u32) -> bool {
        self.effects.iter().any(|e| e.kind == kind && e.until_turn >= turn)
    }

    /// Adds an effect, extending an existing one of the same kind.
    pub fn add_effect(&mut self, kind: EffectKind, until_turn: u32) {
        match self.effects.iter_mut().find(|e| e.kind == kind) {
            Some(e) => e.until_turn = e.until_turn.max(until_turn),
            None => self.effects.push(ActiveEffect { kind, until_turn }),
        }
    }

    /// Resets per-turn bookkeeping and drops effects that ran out.
    pub(crate) fn begin_turn(&mut self, turn: u32) {
        self.status.clear();
        self.executed.clear();
        self.effects.retain(|e| e.until_turn >= turn);
    }
}

impl PartialEq for ItemCore {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ItemCore {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_generator_skips_observed_ids() {
        let mut ids = IdGenerator::default();
        assert_eq!(ids.next_id(), ItemId(1));
        ids.observe(ItemId(10));
        assert_eq!(ids.next_id(), ItemId(11));
        ids.observe(ItemId(3));
        assert_eq!(ids.next_id(), ItemId(12));
    }

    #[test]
    fn items_compare_by_id() {
        let mut a = ItemCore::new(ItemId(4), "Keep");
        let b = ItemCore::new(ItemId(4), "Other name");
        a.turn_seen = 9;
        assert_eq!(a, b);
        assert_ne!(a, ItemCore::new(ItemId(5), "Keep"));
    }

    #[test]
    fn effects_expire_at_turn_start() {
        let mut core = ItemCore::new(ItemId(1), "Tower");
        core.add_effect(EffectKind::Shield, 3);
        assert!(core.has_effect(EffectKind::Shield, 3));
        core.begin_turn(4);
        assert!(!core.has_effect(EffectKind::Shield, 4));
        assert!(core.effects.is_empty());
    }

    #[test]
    fn adding_effect_extends_duration() {
        let mut core = ItemCore::new(ItemId(1), "Host");
        core.add_effect(EffectKind::DiplomaticAura, 2);
        core.add_effect(EffectKind::DiplomaticAura, 5);
        assert_eq!(core.effects.len(), 1);
        assert!(core.has_effect(EffectKind::DiplomaticAura, 5));
    }
}
