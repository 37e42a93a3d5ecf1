//! World model.
//!
//! The mutable game graph: map, players, pop centers, armies and figures,
//! all held in the id-keyed [`Game`] arena.

pub mod army;
pub mod control;
pub mod figure;
pub mod game;
pub mod hex;
pub mod item;
pub mod map;
pub mod player;
pub mod pop_center;

pub use army::{Army, ArmyUnit, TroopType, MAX_MORALE, STARTING_MORALE};
pub use control::{control_level, influence, ControlLevel};
pub use figure::{Base, Figure, FigureKind};
pub use game::{Game, ItemRef, TurnScratch};
pub use hex::{Direction, Hex};
pub use item::{
    ActiveEffect, EffectKind, IdGenerator, ItemCore, ItemId, Owner, PlayerId, UNKNOWN_NAME,
    UNOWNED_NAME,
};
pub use map::{GameMap, Location, Region, RegionId, Terrain};
pub use player::{EventCategory, GameEvent, Player, MIN_POWER};
pub use pop_center::{PopCenter, PopType};
