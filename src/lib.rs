//! Suzerain turn-resolution library.
//!
//! Exposes the world model, the rules, order execution, combat and
//! diplomacy, fog-of-war intelligence and game storage for use by
//! integration tests and the binary entry point.

pub mod combat;
pub mod engine;
pub mod intel;
pub mod link;
pub mod orders;
pub mod rules;
pub mod store;
pub mod world;
