//! Loading and saving games and order submissions.
//!
//! The engine itself never touches storage. A [`GameStore`] hands it a game
//! and each player's orders, and takes the resolved game back. A turn is
//! only resolved once every player has submitted, and nothing is written if
//! resolution fails.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::engine::{Engine, TurnError};
use crate::orders::Order;
use crate::world::Game;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed JSON in {what}: {source}")]
    Json {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no game has been saved")]
    NoGame,
}

/// Where games and orders live between turns.
pub trait GameStore {
    /// The current game.
    fn load_game(&self) -> Result<Game, StoreError>;

    /// The orders a player submitted for a turn, or `None` if they have not
    /// submitted.
    fn load_orders(&self, player: &str, turn: u32) -> Result<Option<Vec<Order>>, StoreError>;

    /// Replaces the stored game.
    fn save_game(&mut self, game: &Game) -> Result<(), StoreError>;
}

/// A game directory: `game.json` plus `orders/<player>-<turn>.json`.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    root: PathBuf,
}

impl JsonDirStore {
    /// A store rooted at a game directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        JsonDirStore { root: root.into() }
    }

    /// Path of the saved game.
    pub fn game_path(&self) -> PathBuf {
        self.root.join("game.json")
    }

    /// Path of a player's submission for a turn.
    pub fn orders_path(&self, player: &str, turn: u32) -> PathBuf {
        self.root.join("orders").join(format!("{player}-{turn}.json"))
    }

    /// Writes a player's order submission.
    pub fn submit_orders(&self, player: &str, turn: u32, orders: &[Order]) -> Result<(), StoreError> {
        let path = self.orders_path(player, turn);
        let json = serde_json::to_string_pretty(orders).map_err(|source| StoreError::Json {
            what: path.display().to_string(),
            source,
        })?;
        write_file(&path, &json)
    }
}

fn read_file(path: &Path) -> Result<String, StoreError> {
    fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, contents: &str) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(io_err)?;
    }
    fs::write(path, contents).map_err(io_err)
}

impl GameStore for JsonDirStore {
    fn load_game(&self) -> Result<Game, StoreError> {
        let path = self.game_path();
        let data = read_file(&path)?;
        serde_json::from_str(&data).map_err(|source| StoreError::Json {
            what: path.display().to_string(),
            source,
        })
    }

    fn load_orders(&self, player: &str, turn: u32) -> Result<Option<Vec<Order>>, StoreError> {
        let path = self.orders_path(player, turn);
        if !path.exists() {
            return Ok(None);
        }
        let data = read_file(&path)?;
        serde_json::from_str(&data)
            .map(Some)
            .map_err(|source| StoreError::Json {
                what: path.display().to_string(),
                source,
            })
    }

    fn save_game(&mut self, game: &Game) -> Result<(), StoreError> {
        let path = self.game_path();
        let json = serde_json::to_string_pretty(game).map_err(|source| StoreError::Json {
            what: path.display().to_string(),
            source,
        })?;
        write_file(&path, &json)
    }
}

/// Keeps games as serialized JSON in memory, so every load goes through the
/// same fix-up a file load does.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    game: Option<String>,
    orders: BTreeMap<(String, u32), String>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Stores a player's order submission.
    pub fn submit_orders(&mut self, player: &str, turn: u32, orders: &[Order]) -> Result<(), StoreError> {
        let json = serde_json::to_string(orders).map_err(|source| StoreError::Json {
            what: format!("orders of {player} for turn {turn}"),
            source,
        })?;
        self.orders.insert((player.to_string(), turn), json);
        Ok(())
    }
}

impl GameStore for MemoryStore {
    fn load_game(&self) -> Result<Game, StoreError> {
        let json = self.game.as_deref().ok_or(StoreError::NoGame)?;
        serde_json::from_str(json).map_err(|source| StoreError::Json {
            what: "stored game".to_string(),
            source,
        })
    }

    fn load_orders(&self, player: &str, turn: u32) -> Result<Option<Vec<Order>>, StoreError> {
        let Some(json) = self.orders.get(&(player.to_string(), turn)) else {
            return Ok(None);
        };
        serde_json::from_str(json)
            .map(Some)
            .map_err(|source| StoreError::Json {
                what: format!("orders of {player} for turn {turn}"),
                source,
            })
    }

    fn save_game(&mut self, game: &Game) -> Result<(), StoreError> {
        let json = serde_json::to_string(game).map_err(|source| StoreError::Json {
            what: "game".to_string(),
            source,
        })?;
        self.game = Some(json);
        Ok(())
    }
}

/// Loads the stored game and every player's orders for its current turn,
/// resolves the turn and saves the result.
///
/// If any player has not submitted, this fails with
/// [`TurnError::MissingOrders`] before a single order runs, and the stored
/// game is left untouched.
pub fn resolve_stored_turn<S: GameStore + ?Sized>(store: &mut S, engine: &mut Engine) -> Result<Game, TurnError> {
    let mut game = store.load_game()?;
    let turn = game.turn;
    for player in &mut game.players {
        match store.load_orders(&player.name, turn)? {
            Some(orders) => player.pending_orders = orders,
            None => {
                warn!(player = %player.name, turn, "orders missing, turn not resolved");
                return Err(TurnError::MissingOrders {
                    player: player.name.clone(),
                    turn,
                });
            }
        }
    }

    let game = engine.run_turn(game)?;
    store.save_game(&game)?;
    info!(turn = game.turn, "game saved");
    Ok(game)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::OrderKind;
    use crate::rules::Rules;
    use crate::world::{GameMap, Hex, Owner, PopType, Region, RegionId, Terrain};

    fn new_game() -> Game {
        let map = GameMap::parallelogram(3, 3, Terrain::Plains, [Region::new(RegionId(1), "Vale")], |_| RegionId(1));
        let mut game = Game::new(map);
        let a = game.add_player("Aldric", "Northmen", 1000);
        game.add_player("Brenna", "Southfolk", 1000);
        game.add_pop_center("Ford", Owner::Player(a), Hex::new(1, 1), PopType::Town, 2);
        game
    }

    #[test]
    fn json_dir_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonDirStore::new(dir.path());
        store.save_game(&new_game()).unwrap();

        let loaded = store.load_game().unwrap();
        assert_eq!(loaded.players.len(), 2);
        assert_eq!(loaded.pop_centers.len(), 1);
        assert!(store.load_orders("Aldric", 0).unwrap().is_none());

        let orders = vec![Order::new(crate::world::ItemId(1), OrderKind::ImprovePopCenter)];
        store.submit_orders("Aldric", 0, &orders).unwrap();
        assert_eq!(store.load_orders("Aldric", 0).unwrap(), Some(orders));
    }

    #[test]
    fn missing_submission_aborts_without_saving() {
        let mut store = MemoryStore::new();
        store.save_game(&new_game()).unwrap();
        store.submit_orders("Aldric", 0, &[]).unwrap();
        let before = store.game.clone();
        let mut engine = Engine::with_seed(Rules::default(), 1);

        let err = resolve_stored_turn(&mut store, &mut engine).unwrap_err();

        assert!(matches!(err, TurnError::MissingOrders { ref player, turn: 0 } if player == "Brenna"));
        assert_eq!(store.game, before);
    }

    #[test]
    fn malformed_orders_are_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonDirStore::new(dir.path());
        store.save_game(&new_game()).unwrap();
        write_file(&store.orders_path("Aldric", 0), "{not json").unwrap();
        store.submit_orders("Brenna", 0, &[]).unwrap();
        let mut engine = Engine::with_seed(Rules::default(), 1);

        let err = resolve_stored_turn(&mut store, &mut engine).unwrap_err();
        assert!(matches!(err, TurnError::Store(StoreError::Json { .. })));
    }
}
