//! Whole-turn scenarios run through the public API.

use rand::rngs::StdRng;
use rand::SeedableRng;

use suzerain::engine::{begin_turn, Engine, TurnError};
use suzerain::link::link_game;
use suzerain::orders::{Order, OrderKind, OrderStatus};
use suzerain::rules::Rules;
use suzerain::store::{resolve_stored_turn, GameStore, JsonDirStore, MemoryStore};
use suzerain::world::{
    Base, Direction, EventCategory, FigureKind, Game, GameMap, Hex, ItemId, Owner, PlayerId, PopType, Region,
    RegionId, Terrain, TroopType,
};

fn two_player_game(width: i32, height: i32) -> (Game, PlayerId, PlayerId) {
    let map = GameMap::parallelogram(width, height, Terrain::Plains, [Region::new(RegionId(1), "Vale")], |_| {
        RegionId(1)
    });
    let mut game = Game::new(map);
    let rules = Rules::default();
    let a = game.enlist("Aldric", rules.kingdom("Northmen").unwrap());
    let b = game.enlist("Brenna", rules.kingdom("Southfolk").unwrap());
    (game, a, b)
}

/// Standard rules plus a slightly weaker infantry, "Levy".
fn rules() -> Rules {
    let mut rules = Rules::default();
    rules.troops.push(TroopType {
        name: "Levy".into(),
        size: 100,
        strength: 9,
        armor: 100,
        movement: 3,
        ..TroopType::default()
    });
    rules
}

fn army(game: &mut Game, rules: &Rules, owner: PlayerId, name: &str, hex: Hex, troops: &[&str]) -> ItemId {
    let id = game.add_army(name, Owner::Player(owner), hex);
    for troop in troops {
        let troop = rules.troop(troop).cloned().unwrap();
        game.add_unit(id, &troop);
    }
    id
}

#[test]
fn move_off_the_map_stops_at_the_last_hex() {
    let (mut game, a, b) = two_player_game(4, 1);
    let rules = Rules::default();
    let host = game.add_army("Riders", Owner::Player(a), Hex::new(0, 0));
    let cavalry = rules.troop("Cavalry").cloned().unwrap();
    game.add_unit(host, &cavalry);
    let mill = game.add_pop_center("Mill", Owner::Player(b), Hex::new(1, 0), PopType::Town, 3);
    let croft = game.add_pop_center("Croft", Owner::Player(b), Hex::new(2, 0), PopType::Hamlet, 2);
    game.players[0]
        .pending_orders
        .push(Order::new(host, OrderKind::MoveArmy { path: vec![Direction::East; 4] }));

    let mut engine = Engine::with_seed(rules, 11);
    let game = engine.run_turn(game).unwrap();

    assert_eq!(game.armies[&host].location, Hex::new(3, 0));
    assert!(game.armies[&host].core.status.iter().any(|s| s.contains("after 3 of 4")));
    let known = game.players[a.index()].view.as_deref().unwrap();
    for pop in [mill, croft] {
        assert_eq!(known.pop_centers[&pop].core.owner(), Owner::Unknown);
        assert_eq!(known.pop_centers[&pop].level, None);
    }
}

#[test]
fn stronger_army_wins_and_target_cannot_be_attacked_twice() {
    let (mut game, a, b) = two_player_game(3, 3);
    let mut rules = rules();
    rules.combat.capture_probability = 1.0;
    let here = Hex::new(1, 1);
    let first = army(&mut game, &rules, a, "Vanguard", here, &["Infantry"; 3]);
    let second = army(&mut game, &rules, a, "Rearguard", here, &["Infantry"]);
    let target = army(&mut game, &rules, b, "Levies", here, &["Levy"; 2]);
    let envoy = game.add_figure("Envoy", Owner::Player(b), FigureKind::Diplomat, 1, Some(Base::Army(target)));
    let mut rng = StdRng::seed_from_u64(5);
    link_game(&mut game, &rules).unwrap();
    begin_turn(&mut game, &rules);

    let mut attack = Order::new(first, OrderKind::AttackArmy { target }).issued_by(a);
    assert_eq!(attack.execute(&mut game, &rules, &mut rng), OrderStatus::Executed);

    let status = &game.armies[&first].core.status;
    assert!(status.iter().any(|s| s.contains("Vanguard (3000)") && s.contains("Levies (1800)")));
    assert!(status.iter().any(|s| s.contains("routed")));
    assert!(game.armies.contains_key(&target));
    assert!(!game.figures.contains_key(&envoy));
    assert!(game.players[b.index()]
        .events_of(EventCategory::Combat)
        .any(|e| e.message.contains("Envoy was taken prisoner")));
    assert!(game.armies[&target].units.iter().all(|u| u.morale == 90));
    assert!(game.armies[&first].units.iter().all(|u| u.morale == 110));

    let mut again = Order::new(second, OrderKind::AttackArmy { target }).issued_by(a);
    assert_eq!(again.execute(&mut game, &rules, &mut rng), OrderStatus::Rejected);
    let rejection = game.players[a.index()].events_of(EventCategory::Rejection).last().unwrap();
    assert!(rejection.message.contains("already attacked"));
    assert_eq!(game.armies[&second].units[0].morale, 100);
}

#[test]
fn only_one_attack_on_a_target_runs_per_turn() {
    let (mut game, a, b) = two_player_game(3, 3);
    let rules = rules();
    let here = Hex::new(1, 1);
    let first = army(&mut game, &rules, a, "Vanguard", here, &["Infantry"; 3]);
    let second = army(&mut game, &rules, a, "Rearguard", here, &["Infantry"; 3]);
    let target = army(&mut game, &rules, b, "Levies", here, &["Levy"; 2]);
    for attacker in [first, second] {
        game.players[0]
            .pending_orders
            .push(Order::new(attacker, OrderKind::AttackArmy { target }));
    }

    let mut engine = Engine::with_seed(rules, 2);
    let game = engine.run_turn(game).unwrap();

    let rejections: Vec<_> = game.players[0].events_of(EventCategory::Rejection).collect();
    assert_eq!(rejections.len(), 1);
    assert!(rejections[0].message.contains("already attacked"));
    assert_eq!(game.players[1].events_of(EventCategory::Combat).count(), 1);
}

#[test]
fn resubmitting_an_executed_order_charges_once() {
    let (mut game, a, _) = two_player_game(3, 3);
    let rules = Rules::default();
    let pop = game.add_pop_center("Ford", Owner::Player(a), Hex::new(0, 0), PopType::Town, 3);
    link_game(&mut game, &rules).unwrap();
    begin_turn(&mut game, &rules);
    let mut rng = StdRng::seed_from_u64(1);

    let mut improve = Order::new(pop, OrderKind::ImprovePopCenter).issued_by(a);
    assert_eq!(improve.execute(&mut game, &rules, &mut rng), OrderStatus::Executed);
    let gold = game.players[0].gold;
    assert_eq!(improve.execute(&mut game, &rules, &mut rng), OrderStatus::Executed);

    assert_eq!(game.players[0].gold, gold);
    assert_eq!(game.pop_centers[&pop].level(), 4);
}

#[test]
fn turns_chain_through_a_game_directory() {
    let (mut game, a, b) = two_player_game(4, 4);
    let pop = game.add_pop_center("Ford", Owner::Player(a), Hex::new(0, 0), PopType::Town, 2);
    game.players[0].capitol = Some(pop);
    game.players[0].gold = 5000;
    game.add_pop_center("Mill", Owner::Player(b), Hex::new(3, 3), PopType::Town, 2);

    let dir = tempfile::tempdir().unwrap();
    let mut store = JsonDirStore::new(dir.path());
    store.save_game(&game).unwrap();
    let mut engine = Engine::with_seed(Rules::default(), 7);

    for turn in 0..3 {
        let orders = vec![Order::new(pop, OrderKind::ImprovePopCenter)];
        store.submit_orders("Aldric", turn, &orders).unwrap();
        store.submit_orders("Brenna", turn, &[]).unwrap();
        let game = resolve_stored_turn(&mut store, &mut engine).unwrap();
        assert_eq!(game.turn, turn + 1);
    }

    let game = store.load_game().unwrap();
    assert_eq!(game.turn, 3);
    assert_eq!(game.pop_centers[&pop].level(), 5);
    assert!(game.players.iter().all(|p| p.view.is_some()));
}

#[test]
fn a_missing_submission_stops_the_turn() {
    let (game, _, _) = two_player_game(2, 2);
    let mut store = MemoryStore::new();
    store.save_game(&game).unwrap();
    store.submit_orders("Brenna", 0, &[]).unwrap();
    let mut engine = Engine::with_seed(Rules::default(), 1);

    let err = resolve_stored_turn(&mut store, &mut engine).unwrap_err();

    assert!(matches!(err, TurnError::MissingOrders { player, turn: 0 } if player == "Aldric"));
    assert_eq!(store.load_game().unwrap().turn, 0);
}

#[test]
fn relinking_a_loaded_game_is_stable() {
    let (mut game, a, b) = two_player_game(3, 3);
    let pop = game.add_pop_center("Ford", Owner::Player(a), Hex::new(0, 0), PopType::City, 4);
    game.players[0].capitol = Some(pop);
    let rules = rules();
    army(&mut game, &rules, b, "Levies", Hex::new(2, 2), &["Levy"]);
    let mut engine = Engine::with_seed(rules.clone(), 3);
    let played = engine.run_turn(game).unwrap();

    let json = serde_json::to_string(&played).unwrap();
    let mut loaded: Game = serde_json::from_str(&json).unwrap();
    link_game(&mut loaded, &rules).unwrap();
    let once = serde_json::to_value(&loaded).unwrap();
    link_game(&mut loaded, &rules).unwrap();

    assert_eq!(serde_json::to_value(&loaded).unwrap(), once);
    let view = loaded.players[0].view.as_deref().unwrap();
    assert!(view.pop_centers[&pop].core.owner().is(a));
}
