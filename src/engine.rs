//! Turn orchestration.
//!
//! Holds the rules, the order priority table and the random source, and
//! resolves one turn at a time: link the loaded game, reset per-turn
//! bookkeeping, run every order in sequence, settle upkeep, advance the
//! turn counter and refresh every player's view.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::info;

use crate::intel;
use crate::link::{link_game, LinkError};
use crate::orders::{collect_orders, execute_orders, sequence_orders, OrderPriority, TurnTally};
use crate::rules::Rules;
use crate::store::StoreError;
use crate::world::{control_level, EventCategory, Game, PlayerId, TurnScratch};

/// Why a turn could not be resolved. Nothing is saved when this happens.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("no orders from {player} for turn {turn}")]
    MissingOrders { player: String, turn: u32 },
}

/// Resolves turns against a fixed rule set.
pub struct Engine {
    rules: Rules,
    priority: OrderPriority,
    rng: SmallRng,
}

impl Engine {
    /// Creates an engine seeded from system entropy.
    pub fn new(rules: Rules) -> Self {
        Engine::with_rng(rules, SmallRng::from_entropy())
    }

    /// Creates an engine whose shuffles and dice rolls repeat for a seed.
    pub fn with_seed(rules: Rules, seed: u64) -> Self {
        Engine::with_rng(rules, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(rules: Rules, rng: SmallRng) -> Self {
        let priority = OrderPriority::from_rules(&rules);
        Engine { rules, priority, rng }
    }

    /// The rules turns are resolved with.
    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Resolves the turn `game.turn` and returns the game at the start of
    /// the next one.
    pub fn run_turn(&mut self, mut game: Game) -> Result<Game, TurnError> {
        link_game(&mut game, &self.rules)?;
        let turn = game.turn;
        info!(turn, players = game.players.len(), "resolving turn");

        begin_turn(&mut game, &self.rules);
        let mut queue = collect_orders(&mut game);
        sequence_orders(&mut queue, &self.priority, &mut self.rng);
        let TurnTally { executed, rejected } = execute_orders(&mut game, &mut queue, &self.rules, &mut self.rng);
        collect_upkeep(&mut game, &self.rules);

        game.turn += 1;
        intel::update_all(&mut game, &self.rules);

        info!(turn, executed, rejected, "turn resolved");
        Ok(game)
    }
}

/// Clears last turn's statuses, executed lists, expired effects and
/// events, then snapshots regional control for the turn's battles.
pub fn begin_turn(game: &mut Game, rules: &Rules) {
    let turn = game.turn;
    for pop in game.pop_centers.values_mut() {
        pop.core.begin_turn(turn);
    }
    for army in game.armies.values_mut() {
        army.core.begin_turn(turn);
    }
    for figure in game.figures.values_mut() {
        figure.core.begin_turn(turn);
    }
    for player in &mut game.players {
        player.events.clear();
    }

    let mut scratch = TurnScratch::default();
    for pid in game.player_ids() {
        for region in game.map.regions() {
            let level = control_level(game, pid, region.id, &rules.control);
            scratch.control_snapshot.insert((pid, region.id), level);
        }
    }
    game.scratch = scratch;
}

/// Taxes and army maintenance. A player who cannot pay is left with no gold
/// and every unit they field loses morale.
pub fn collect_upkeep(game: &mut Game, rules: &Rules) {
    let players: Vec<PlayerId> = game.player_ids().collect();
    for pid in players {
        let levels: u32 = game.pop_centers_of(pid).map(|p| u32::from(p.level())).sum();
        let income = rules.economy.gold_per_level.saturating_mul(levels);
        let maintenance = game
            .armies_of(pid)
            .flat_map(|a| a.units.iter())
            .filter(|u| u.alive() > 0)
            .fold(0u32, |sum, u| sum.saturating_add(u.troop().maintenance));

        let Some(player) = game.player_mut(pid) else {
            continue;
        };
        let available = player.gold.saturating_add(income);
        let shortfall = maintenance > available;
        player.gold = available.saturating_sub(maintenance);

        let message = format!("Collected {income} gold in taxes and paid {maintenance} in upkeep");
        game.notify(pid, EventCategory::Economy, message);
        if shortfall {
            let loss = rules.economy.unpaid_morale_loss;
            for army in game.armies.values_mut().filter(|a| a.core.owner().is(pid)) {
                army.adjust_morale(-loss);
            }
            game.notify(pid, EventCategory::Economy, "Your troops went unpaid and their morale fell");
        }
    }
}
