//! Combat and diplomacy resolution.
//!
//! Battles compare effective strengths, deal hits, swing morale and hand
//! the loser's figures and pop centers over to the aftermath rules.
//! Surrender demands compare a diplomatic rating against resistance and
//! never deal damage.

pub mod aftermath;
pub mod battle;
pub mod casualties;
pub mod diplomacy;
pub mod strength;

pub use battle::{army_battle, assault_pop_center, BattleKind, BattleReport};
pub use diplomacy::{demand_surrender, diplomatic_rating, surrender_resistance};
pub use strength::CombatCapable;
