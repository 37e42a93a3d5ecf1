//! The game arena.
//!
//! Every item lives in one of the id-keyed tables of [`Game`]; all links
//! between items are ids resolved through it. The same type backs each
//! player's fog-of-war view, where it holds only what that player knows.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::army::{Army, ArmyUnit, TroopType};
use super::control::ControlLevel;
use super::figure::{Base, Figure, FigureKind};
use super::hex::Hex;
use super::item::{IdGenerator, ItemCore, ItemId, Owner, PlayerId, UNKNOWN_NAME, UNOWNED_NAME};
use super::map::{GameMap, RegionId};
use super::player::Player;
use super::pop_center::{PopCenter, PopType};
use crate::rules::Kingdom;

/// Per-turn bookkeeping. Never persisted; rebuilt at the start of a turn.
#[derive(Debug, Clone, Default)]
pub struct TurnScratch {
    /// Regional control as it stood before any order executed.
    pub control_snapshot: BTreeMap<(PlayerId, RegionId), ControlLevel>,
    /// Armies and pop centers that were already the target of an attack.
    pub attacked: BTreeSet<ItemId>,
    /// Armies that already fought a battle.
    pub fought: BTreeSet<ItemId>,
}

impl TurnScratch {
    /// Pre-turn control tier of a player in a region.
    pub fn control(&self, pid: PlayerId, region: RegionId) -> ControlLevel {
        self.control_snapshot
            .get(&(pid, region))
            .copied()
            .unwrap_or(ControlLevel::None)
    }
}

/// A borrowed item of any kind.
#[derive(Debug, Clone, Copy)]
pub enum ItemRef<'a> {
    PopCenter(&'a PopCenter),
    Army(&'a Army),
    Figure(&'a Figure),
}

impl<'a> ItemRef<'a> {
    /// The shared fields of the borrowed item.
    pub fn core(self) -> &'a ItemCore {
        match self {
            ItemRef::PopCenter(p) => &p.core,
            ItemRef::Army(a) => &a.core,
            ItemRef::Figure(f) => &f.core,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    #[serde(default)]
    pub turn: u32,
    pub map: GameMap,
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub pop_centers: BTreeMap<ItemId, PopCenter>,
    #[serde(default)]
    pub armies: BTreeMap<ItemId, Army>,
    #[serde(default)]
    pub figures: BTreeMap<ItemId, Figure>,
    #[serde(default)]
    pub ids: IdGenerator,
    #[serde(skip)]
    pub(crate) pops_by_hex: BTreeMap<Hex, ItemId>,
    #[serde(skip)]
    pub(crate) pops_by_type: BTreeMap<PopType, BTreeSet<ItemId>>,
    #[serde(skip)]
    pub scratch: TurnScratch,
}

impl Game {
    /// An empty game on the given map, at turn 0.
    pub fn new(map: GameMap) -> Self {
        Game {
            turn: 0,
            map,
            players: Vec::new(),
            pop_centers: BTreeMap::new(),
            armies: BTreeMap::new(),
            figures: BTreeMap::new(),
            ids: IdGenerator::default(),
            pops_by_hex: BTreeMap::new(),
            pops_by_type: BTreeMap::new(),
            scratch: TurnScratch::default(),
        }
    }

    // --- players -----------------------------------------------------------

    /// Adds a player with an explicit treasury. Player ids are seat indexes.
    pub fn add_player(&mut self, name: impl Into<String>, kingdom: impl Into<String>, gold: u32) -> PlayerId {
        let pid = PlayerId(self.players.len() as u16);
        self.players.push(Player::new(name, kingdom, gold));
        pid
    }

    /// Seats a player for a kingdom, starting with the kingdom's gold.
    pub fn enlist(&mut self, name: impl Into<String>, kingdom: &Kingdom) -> PlayerId {
        self.add_player(name, kingdom.name.clone(), kingdom.starting_gold)
    }

    /// The player in a seat, if there is one.
    pub fn player(&self, pid: PlayerId) -> Option<&Player> {
        self.players.get(pid.index())
    }

    /// Mutable access to the player in a seat.
    pub fn player_mut(&mut self, pid: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(pid.index())
    }

    /// Looks a player up by name.
    pub fn player_by_name(&self, name: &str) -> Option<PlayerId> {
        self.players
            .iter()
            .position(|p| p.name == name)
            .map(|i| PlayerId(i as u16))
    }

    /// Every seat, in order.
    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> {
        (0..self.players.len()).map(|i| PlayerId(i as u16))
    }

    /// Persisted name for an owner.
    pub fn owner_name(&self, owner: Owner) -> String {
        match owner {
            Owner::Unowned => UNOWNED_NAME.to_string(),
            Owner::Unknown => UNKNOWN_NAME.to_string(),
            Owner::Player(pid) => self
                .player(pid)
                .map_or_else(|| UNKNOWN_NAME.to_string(), |p| p.name.clone()),
        }
    }

    /// Resolves a persisted owner name. `None` if it names no player.
    pub fn resolve_owner(&self, name: &str) -> Option<Owner> {
        match name {
            UNOWNED_NAME => Some(Owner::Unowned),
            UNKNOWN_NAME => Some(Owner::Unknown),
            _ => self.player_by_name(name).map(Owner::Player),
        }
    }

    /// Records an event for a player, stamped with the current turn.
    pub fn notify(&mut self, pid: PlayerId, category: super::EventCategory, message: impl Into<String>) {
        let turn = self.turn;
        if let Some(p) = self.player_mut(pid) {
            p.record(turn, category, message);
        }
    }

    // --- item creation -----------------------------------------------------

    fn new_core(&mut self, name: impl Into<String>, owner: Owner) -> ItemCore {
        let id = self.ids.next_id();
        let mut core = ItemCore::new(id, name);
        let owner_name = self.owner_name(owner);
        core.set_owner(owner, owner_name);
        core.turn_seen = self.turn;
        core
    }

    /// Creates a pop center with a fresh id and indexes it.
    pub fn add_pop_center(
        &mut self,
        name: impl Into<String>,
        owner: Owner,
        hex: Hex,
        pop_type: PopType,
        level: u8,
    ) -> ItemId {
        let core = self.new_core(name, owner);
        let id = core.id;
        self.insert_pop_center(PopCenter::new(core, hex, pop_type, level));
        id
    }

    /// Inserts a pop center as-is and indexes it.
    pub fn insert_pop_center(&mut self, pop: PopCenter) {
        let id = pop.id();
        self.ids.observe(id);
        self.unindex_pop(id);
        self.pops_by_hex.insert(pop.location, id);
        self.pops_by_type.entry(pop.pop_type).or_default().insert(id);
        self.pop_centers.insert(id, pop);
    }

    fn unindex_pop(&mut self, id: ItemId) {
        if let Some(old) = self.pop_centers.get(&id) {
            if self.pops_by_hex.get(&old.location) == Some(&id) {
                self.pops_by_hex.remove(&old.location);
            }
            if let Some(set) = self.pops_by_type.get_mut(&old.pop_type) {
                set.remove(&id);
            }
        }
    }

    /// Rebuilds the pop-center indexes from the table.
    pub(crate) fn reindex_pop_centers(&mut self) {
        self.pops_by_hex.clear();
        self.pops_by_type.clear();
        for (id, pop) in &self.pop_centers {
            self.pops_by_hex.insert(pop.location, *id);
            self.pops_by_type.entry(pop.pop_type).or_default().insert(*id);
        }
    }

    /// Creates an empty army with a fresh id.
    pub fn add_army(&mut self, name: impl Into<String>, owner: Owner, hex: Hex) -> ItemId {
        let core = self.new_core(name, owner);
        let id = core.id;
        self.armies.insert(id, Army::new(core, hex));
        id
    }

    /// Raises a fresh unit in an army. Returns its id, or `None` if the
    /// army does not exist.
    pub fn add_unit(&mut self, army: ItemId, troop: &TroopType) -> Option<ItemId> {
        if !self.armies.contains_key(&army) {
            return None;
        }
        let id = self.ids.next_id();
        let unit = ArmyUnit::new(id, troop);
        self.armies.get_mut(&army)?.units.push(unit);
        Some(id)
    }

    /// Creates a figure with a fresh id, based where given.
    pub fn add_figure(
        &mut self,
        name: impl Into<String>,
        owner: Owner,
        kind: FigureKind,
        level: u8,
        base: Option<Base>,
    ) -> ItemId {
        let core = self.new_core(name, owner);
        let id = core.id;
        let mut figure = Figure::new(core, kind, level);
        figure.set_base(base);
        self.figures.insert(id, figure);
        if kind == FigureKind::King {
            if let Some(p) = owner.player().and_then(|pid| self.player_mut(pid)) {
                p.king = Some(id);
            }
        }
        id
    }

    // --- lookups -----------------------------------------------------------

    /// Looks an item up in whichever table holds it.
    pub fn get_item(&self, id: ItemId) -> Option<ItemRef<'_>> {
        if let Some(p) = self.pop_centers.get(&id) {
            return Some(ItemRef::PopCenter(p));
        }
        if let Some(a) = self.armies.get(&id) {
            return Some(ItemRef::Army(a));
        }
        self.figures.get(&id).map(ItemRef::Figure)
    }

    /// Whether any table holds the id.
    pub fn contains_item(&self, id: ItemId) -> bool {
        self.get_item(id).is_some()
    }

    /// Shared fields of any item.
    pub fn item_core(&self, id: ItemId) -> Option<&ItemCore> {
        self.get_item(id).map(ItemRef::core)
    }

    /// Mutable shared fields of any item.
    pub fn item_core_mut(&mut self, id: ItemId) -> Option<&mut ItemCore> {
        if let Some(p) = self.pop_centers.get_mut(&id) {
            return Some(&mut p.core);
        }
        if let Some(a) = self.armies.get_mut(&id) {
            return Some(&mut a.core);
        }
        self.figures.get_mut(&id).map(|f| &mut f.core)
    }

    /// Owner of any item.
    pub fn owner_of(&self, id: ItemId) -> Option<Owner> {
        self.item_core(id).map(ItemCore::owner)
    }

    /// Display name of an item, or its id when it is gone.
    pub fn item_name(&self, id: ItemId) -> String {
        self.item_core(id)
            .map_or_else(|| id.to_string(), |c| c.name.clone())
    }

    /// Location of a base.
    pub fn base_location(&self, base: Base) -> Option<Hex> {
        match base {
            Base::PopCenter(id) => self.pop_centers.get(&id).map(|p| p.location),
            Base::Army(id) => self.armies.get(&id).map(|a| a.location),
        }
    }

    /// A figure's location, derived from its base.
    pub fn figure_location(&self, figure: &Figure) -> Option<Hex> {
        figure.base.and_then(|b| self.base_location(b))
    }

    /// Hex of any item; figures report their base's hex.
    pub fn location_of(&self, id: ItemId) -> Option<Hex> {
        match self.get_item(id)? {
            ItemRef::PopCenter(p) => Some(p.location),
            ItemRef::Army(a) => Some(a.location),
            ItemRef::Figure(f) => self.figure_location(f),
        }
    }

    /// The pop center on a hex, if any.
    pub fn pop_at(&self, hex: Hex) -> Option<&PopCenter> {
        self.pops_by_hex.get(&hex).and_then(|id| self.pop_centers.get(id))
    }

    /// Pop centers of one type, in id order.
    pub fn pops_of_type(&self, pop_type: PopType) -> impl Iterator<Item = &PopCenter> {
        self.pops_by_type
            .get(&pop_type)
            .into_iter()
            .flatten()
            .filter_map(|id| self.pop_centers.get(id))
    }

    /// Armies standing on a hex.
    pub fn armies_at(&self, hex: Hex) -> impl Iterator<Item = &Army> {
        self.armies.values().filter(move |a| a.location == hex)
    }

    /// Ids of the figures based in a pop center or army.
    pub fn figures_based_in(&self, base: ItemId) -> Vec<ItemId> {
        self.figures
            .values()
            .filter(|f| f.base.map(Base::id) == Some(base))
            .map(Figure::id)
            .collect()
    }

    /// Armies owned by a player.
    pub fn armies_of(&self, pid: PlayerId) -> impl Iterator<Item = &Army> {
        self.armies.values().filter(move |a| a.core.owner().is(pid))
    }

    /// Pop centers owned by a player.
    pub fn pop_centers_of(&self, pid: PlayerId) -> impl Iterator<Item = &PopCenter> {
        self.pop_centers.values().filter(move |p| p.core.owner().is(pid))
    }

    /// Figures owned by a player.
    pub fn figures_of(&self, pid: PlayerId) -> impl Iterator<Item = &Figure> {
        self.figures.values().filter(move |f| f.core.owner().is(pid))
    }

    /// A player's capitol, if they still have one.
    pub fn capitol_of(&self, pid: PlayerId) -> Option<&PopCenter> {
        self.player(pid)
            .and_then(|p| p.capitol)
            .and_then(|id| self.pop_centers.get(&id))
    }

    /// Whether the pop center is its owner's capitol.
    pub fn is_capitol(&self, pop: &PopCenter) -> bool {
        pop.core
            .owner()
            .player()
            .and_then(|pid| self.player(pid))
            .is_some_and(|p| p.capitol == Some(pop.id()))
    }

    // --- mutation ----------------------------------------------------------

    /// Transfers an item to a new owner, keeping the persisted name in step.
    pub fn set_owner(&mut self, id: ItemId, owner: Owner) {
        let name = self.owner_name(owner);
        if let Some(core) = self.item_core_mut(id) {
            core.set_owner(owner, name);
        }
    }

    /// Moves a figure to a new base; `None` sends it into the wilds.
    pub fn rebase_figure(&mut self, id: ItemId, base: Option<Base>) {
        if let Some(f) = self.figures.get_mut(&id) {
            f.set_base(base);
        }
    }

    /// Removes an army. Figures based in it must be handled by the caller.
    pub fn remove_army(&mut self, id: ItemId) -> Option<Army> {
        self.armies.remove(&id)
    }

    /// Removes a figure, clearing the owner's king slot if needed.
    pub fn remove_figure(&mut self, id: ItemId) -> Option<Figure> {
        let figure = self.figures.remove(&id)?;
        if let Some(p) = figure.core.owner().player().and_then(|pid| self.player_mut(pid)) {
            if p.king == Some(id) {
                p.king = None;
            }
        }
        Some(figure)
    }

    /// Appends a status line to an item.
    pub fn add_status(&mut self, id: ItemId, status: impl Into<String>) {
        if let Some(core) = self.item_core_mut(id) {
            core.status.push(status.into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Region, Terrain};

    fn small_game() -> Game {
        let map = GameMap::parallelogram(
            4,
            4,
            Terrain::Plains,
            [Region::new(RegionId(1), "Marches")],
            |_| RegionId(1),
        );
        Game::new(map)
    }

    #[test]
    fn enlisted_player_gets_the_kingdom_treasury() {
        let mut game = small_game();
        let rules = crate::rules::Rules::default();
        let mut northmen = rules.kingdom("Northmen").cloned().unwrap();
        northmen.starting_gold = 750;

        let p = game.enlist("Aldric", &northmen);

        assert_eq!(p, PlayerId(0));
        assert_eq!(game.players[0].gold, 750);
        assert_eq!(game.players[0].kingdom, "Northmen");
    }

    #[test]
    fn ids_are_unique_across_tables() {
        let mut game = small_game();
        let p = game.add_player("Aldric", "Northmen", 0);
        let pop = game.add_pop_center("Ford", Owner::Player(p), Hex::new(0, 0), PopType::Town, 2);
        let army = game.add_army("Host", Owner::Player(p), Hex::new(0, 0));
        let fig = game.add_figure("Aldric", Owner::Player(p), FigureKind::King, 3, Some(Base::PopCenter(pop)));
        assert_ne!(pop, army);
        assert_ne!(army, fig);
        assert!(matches!(game.get_item(pop), Some(ItemRef::PopCenter(_))));
        assert!(matches!(game.get_item(army), Some(ItemRef::Army(_))));
        assert!(matches!(game.get_item(fig), Some(ItemRef::Figure(_))));
        assert_eq!(game.players[0].king, Some(fig));
    }

    #[test]
    fn figure_location_follows_base() {
        let mut game = small_game();
        let p = game.add_player("Aldric", "Northmen", 0);
        let army = game.add_army("Host", Owner::Player(p), Hex::new(1, 1));
        let fig = game.add_figure("Spy", Owner::Player(p), FigureKind::Agent, 1, Some(Base::Army(army)));
        assert_eq!(game.location_of(fig), Some(Hex::new(1, 1)));

        if let Some(a) = game.armies.get_mut(&army) {
            a.location = Hex::new(2, 1);
        }
        assert_eq!(game.location_of(fig), Some(Hex::new(2, 1)));

        game.rebase_figure(fig, None);
        assert_eq!(game.location_of(fig), None);
    }

    #[test]
    fn set_owner_updates_name() {
        let mut game = small_game();
        let a = game.add_player("Aldric", "Northmen", 0);
        let pop = game.add_pop_center("Ford", Owner::Unowned, Hex::new(0, 0), PopType::Hamlet, 1);
        assert_eq!(game.pop_centers[&pop].core.owner_name(), UNOWNED_NAME);
        game.set_owner(pop, Owner::Player(a));
        assert_eq!(game.pop_centers[&pop].core.owner_name(), "Aldric");
        assert_eq!(game.pop_centers_of(a).count(), 1);
    }

    #[test]
    fn pop_index_by_hex_and_type() {
        let mut game = small_game();
        let id = game.add_pop_center("Spire", Owner::Unowned, Hex::new(3, 3), PopType::City, 5);
        assert_eq!(game.pop_at(Hex::new(3, 3)).map(PopCenter::id), Some(id));
        assert_eq!(game.pops_of_type(PopType::City).count(), 1);
        assert_eq!(game.pops_of_type(PopType::Town).count(), 0);
    }

    #[test]
    fn removing_king_clears_slot() {
        let mut game = small_game();
        let p = game.add_player("Aldric", "Northmen", 0);
        let king = game.add_figure("Aldric", Owner::Player(p), FigureKind::King, 1, None);
        assert!(game.remove_figure(king).is_some());
        assert_eq!(game.players[0].king, None);
    }

    #[test]
    fn resolve_owner_covers_sentinels() {
        let mut game = small_game();
        let p = game.add_player("Aldric", "Northmen", 0);
        assert_eq!(game.resolve_owner(UNOWNED_NAME), Some(Owner::Unowned));
        assert_eq!(game.resolve_owner(UNKNOWN_NAME), Some(Owner::Unknown));
        assert_eq!(game.resolve_owner("Aldric"), Some(Owner::Player(p)));
        assert_eq!(game.resolve_owner("Nobody"), None);
    }
}
