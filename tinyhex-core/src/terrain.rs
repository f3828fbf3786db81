//! Terrain classification and procedural placement

use crate::board::{Hex, HexMap};
use rand::seq::SliceRandom;
use rand::Rng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Rocks placed per generated map
const ROCK_COUNT: usize = 4;

/// Forests placed per generated map
const FOREST_COUNT: usize = 6;

/// Tile terrain kind. Tiles without an entry are `Plain`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    #[default]
    Plain,
    /// Reduces movement effectiveness, preferred cover
    Forest,
    /// Blocks movement and line of sight
    Rock,
}

/// Sparse terrain map: hex -> terrain, absent entries are plain.
///
/// Immutable for the duration of a game; rebuilt on full reset.
#[derive(Clone, Debug, Default)]
pub struct TerrainMap {
    tiles: FxHashMap<Hex, Terrain>,
}

impl TerrainMap {
    /// All-plain map
    pub fn empty() -> Self {
        Self::default()
    }

    /// Scatter a few rocks and forest patches over the map.
    pub fn generate<R: Rng + ?Sized>(map: &HexMap, rng: &mut R) -> Self {
        let mut candidates: Vec<Hex> = map.coords().to_vec();
        candidates.shuffle(rng);

        let mut tiles = FxHashMap::default();
        for &hex in candidates.iter().take(ROCK_COUNT) {
            tiles.insert(hex, Terrain::Rock);
        }
        for &hex in candidates.iter().skip(ROCK_COUNT).take(FOREST_COUNT) {
            tiles.insert(hex, Terrain::Forest);
        }

        Self { tiles }
    }

    pub fn get(&self, hex: Hex) -> Terrain {
        self.tiles.get(&hex).copied().unwrap_or_default()
    }

    pub fn set(&mut self, hex: Hex, terrain: Terrain) {
        if terrain == Terrain::Plain {
            self.tiles.remove(&hex);
        } else {
            self.tiles.insert(hex, terrain);
        }
    }

    pub fn is_rock(&self, hex: Hex) -> bool {
        self.get(hex) == Terrain::Rock
    }

    pub fn is_forest(&self, hex: Hex) -> bool {
        self.get(hex) == Terrain::Forest
    }
}
