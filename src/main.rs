//! Suzerain -- resolves one turn of a stored game.
//!
//! Usage: `suzerain <game-dir> [--rules FILE] [--seed N]`
//!
//! Reads `game.json` and every player's `orders/<player>-<turn>.json` from
//! the game directory, resolves the turn and writes `game.json` back. Log
//! verbosity follows `RUST_LOG`.

use std::path::PathBuf;
use std::process;

use suzerain::engine::Engine;
use suzerain::rules::Rules;
use suzerain::store::{resolve_stored_turn, JsonDirStore};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

struct Args {
    game_dir: PathBuf,
    rules: Option<PathBuf>,
    seed: Option<u64>,
}

fn parse_args() -> Result<Args, String> {
    let mut game_dir = None;
    let mut rules = None;
    let mut seed = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--rules" => {
                let path = args.next().ok_or("--rules requires a file")?;
                rules = Some(PathBuf::from(path));
            }
            "--seed" => {
                let value = args.next().ok_or("--seed requires a number")?;
                seed = Some(value.parse().map_err(|_| format!("invalid seed '{value}'"))?);
            }
            _ if arg.starts_with("--") => return Err(format!("unknown option {arg}")),
            _ if game_dir.is_none() => game_dir = Some(PathBuf::from(arg)),
            _ => return Err(format!("unexpected argument {arg}")),
        }
    }
    let game_dir = game_dir.ok_or("usage: suzerain <game-dir> [--rules FILE] [--seed N]")?;
    Ok(Args { game_dir, rules, seed })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{e}");
            process::exit(2);
        }
    };

    let rules = match &args.rules {
        Some(path) => match Rules::load(path) {
            Ok(r) => r,
            Err(e) => {
                error!("{e}");
                process::exit(1);
            }
        },
        None => Rules::default(),
    };

    let mut engine = match args.seed {
        Some(seed) => Engine::with_seed(rules, seed),
        None => Engine::new(rules),
    };
    let mut store = JsonDirStore::new(&args.game_dir);
    match resolve_stored_turn(&mut store, &mut engine) {
        Ok(game) => info!(turn = game.turn, dir = %args.game_dir.display(), "turn resolved"),
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    }
}
