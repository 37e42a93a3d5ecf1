//! Map locations and regions.
//!
//! The persisted map is a flat list of locations plus the region table.
//! The hex → location index and each region's membership set are rebuilt
//! by the reference resolver after a load and kept current by
//! [`GameMap::insert_location`] and [`GameMap::set_region`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::hex::Hex;

/// Terrain of a single hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Terrain {
    Plains,
    Forest,
    Hills,
    Mountains,
    Swamp,
    Desert,
    Water,
}

impl Terrain {
    /// Whether armies can enter a hex of this terrain.
    pub const fn is_passable(self) -> bool {
        !matches!(self, Terrain::Water)
    }
}

/// Identifier of a region within a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionId(pub u16);

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "region {}", self.0)
    }
}

/// A named group of locations. Control and embassies are tracked per region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    #[serde(skip)]
    pub(crate) members: BTreeSet<Hex>,
}

impl Region {
    /// A region with no member hexes yet.
    pub fn new(id: RegionId, name: impl Into<String>) -> Self {
        Region {
            id,
            name: name.into(),
            members: BTreeSet::new(),
        }
    }

    /// Hexes currently in the region.
    pub fn members(&self) -> &BTreeSet<Hex> {
        &self.members
    }
}

/// A single hex of the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub hex: Hex,
    pub terrain: Terrain,
    pub region: RegionId,
}

/// The static terrain layout of a game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMap {
    pub(crate) locations: Vec<Location>,
    pub(crate) regions: BTreeMap<RegionId, Region>,
    #[serde(skip)]
    pub(crate) index: BTreeMap<Hex, usize>,
}

impl GameMap {
    /// Creates a map with the given regions and no locations.
    pub fn new(regions: impl IntoIterator<Item = Region>) -> Self {
        GameMap {
            locations: Vec::new(),
            regions: regions.into_iter().map(|r| (r.id, r)).collect(),
            index: BTreeMap::new(),
        }
    }

    /// Builds a `width` x `height` parallelogram of hexes starting at (0, 0).
    ///
    /// `region_of` assigns each hex to a region; the regions must already
    /// be part of `regions`.
    pub fn parallelogram(
        width: i32,
        height: i32,
        terrain: Terrain,
        regions: impl IntoIterator<Item = Region>,
        region_of: impl Fn(Hex) -> RegionId,
    ) -> Self {
        let mut map = GameMap::new(regions);
        for r in 0..height {
            for q in 0..width {
                let hex = Hex::new(q, r);
                map.insert_location(Location {
                    hex,
                    terrain,
                    region: region_of(hex),
                });
            }
        }
        map
    }

    /// Adds or replaces a location, keeping the index and region sets current.
    pub fn insert_location(&mut self, loc: Location) {
        match self.index.get(&loc.hex) {
            Some(&i) => {
                self.locations[i].terrain = loc.terrain;
                self.set_region(loc.hex, loc.region);
            }
            None => {
                self.index.insert(loc.hex, self.locations.len());
                self.locations.push(loc);
                if let Some(region) = self.regions.get_mut(&loc.region) {
                    region.members.insert(loc.hex);
                }
            }
        }
    }

    /// Moves a location to another region, detaching it from the old
    /// region's membership set and attaching it to the new one.
    ///
    /// Returns false if the hex is not on the map.
    pub fn set_region(&mut self, hex: Hex, region: RegionId) -> bool {
        let Some(&i) = self.index.get(&hex) else {
            return false;
        };
        let old = self.locations[i].region;
        if old != region {
            if let Some(r) = self.regions.get_mut(&old) {
                r.members.remove(&hex);
            }
            self.locations[i].region = region;
        }
        if let Some(r) = self.regions.get_mut(&region) {
            r.members.insert(hex);
        }
        true
    }

    /// The location on a hex, if the hex is on the map.
    pub fn location(&self, hex: Hex) -> Option<&Location> {
        self.index.get(&hex).map(|&i| &self.locations[i])
    }

    /// Whether the hex is on the map.
    pub fn contains(&self, hex: Hex) -> bool {
        self.index.contains_key(&hex)
    }

    /// Terrain of an on-map hex.
    pub fn terrain(&self, hex: Hex) -> Option<Terrain> {
        self.location(hex).map(|l| l.terrain)
    }

    /// Region an on-map hex belongs to.
    pub fn region_of(&self, hex: Hex) -> Option<RegionId> {
        self.location(hex).map(|l| l.region)
    }

    /// Looks a region up by id.
    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(&id)
    }

    /// Every region, in id order.
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    /// Every location, in insertion order.
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// On-map hexes adjacent to `hex`.
    pub fn neighbors(&self, hex: Hex) -> impl Iterator<Item = Hex> + '_ {
        hex.neighbors().filter(move |h| self.contains(*h))
    }
}
