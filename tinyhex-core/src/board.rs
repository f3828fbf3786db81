//! Hex board geometry with axial coordinates

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Axial hex coordinates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hex {
    pub q: i32,
    pub r: i32,
}

impl Hex {
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// The derived cube coordinate (q + r + s = 0)
    pub const fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// Distance between two hexes (cube Chebyshev metric)
    pub fn distance_to(&self, other: Hex) -> i32 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = ((self.q + self.r) - (other.q + other.r)).abs();
        dq.max(dr).max(ds)
    }

    /// Distance from the origin
    pub fn distance_to_center(&self) -> i32 {
        self.distance_to(Hex::new(0, 0))
    }

    /// The six adjacent hexes, in `DIRECTIONS` order
    pub fn neighbors(&self) -> [Hex; 6] {
        let mut out = [*self; 6];
        for (i, &(dq, dr)) in DIRECTIONS.iter().enumerate() {
            out[i] = Hex::new(self.q + dq, self.r + dr);
        }
        out
    }
}

/// Direction vectors in axial coordinates (dq, dr)
pub const DIRECTIONS: [(i32, i32); 6] = [
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
];

/// The playable coordinate set: a hexagonal region of a given radius.
///
/// Keeps the generation-order `Vec` alongside a hash index so iteration is
/// deterministic while membership stays O(1).
#[derive(Clone, Debug)]
pub struct HexMap {
    coords: Vec<Hex>,
    index: FxHashSet<Hex>,
    radius: i32,
}

impl HexMap {
    /// Generate all hexes within `radius` of the origin.
    ///
    /// Produces exactly `3r^2 + 3r + 1` tiles; deterministic given the radius.
    pub fn generate(radius: i32) -> Self {
        let mut coords = Vec::new();
        for q in -radius..=radius {
            let r1 = (-radius).max(-q - radius);
            let r2 = radius.min(-q + radius);
            for r in r1..=r2 {
                coords.push(Hex::new(q, r));
            }
        }
        let index = coords.iter().copied().collect();
        Self { coords, index, radius }
    }

    pub fn contains(&self, hex: Hex) -> bool {
        self.index.contains(&hex)
    }

    /// Tiles in generation order
    pub fn iter(&self) -> impl Iterator<Item = Hex> + '_ {
        self.coords.iter().copied()
    }

    pub fn coords(&self) -> &[Hex] {
        &self.coords
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_symmetry() {
        let map = HexMap::generate(3);
        for a in map.iter() {
            assert_eq!(a.distance_to(a), 0);
            for b in map.iter() {
                assert_eq!(a.distance_to(b), b.distance_to(a));
            }
        }
    }

    #[test]
    fn test_distance_values() {
        let origin = Hex::new(0, 0);
        assert_eq!(origin.distance_to(Hex::new(1, 0)), 1);
        assert_eq!(origin.distance_to(Hex::new(1, -1)), 1);
        assert_eq!(origin.distance_to(Hex::new(2, -1)), 2);
        assert_eq!(origin.distance_to(Hex::new(-2, 2)), 2);
        assert_eq!(origin.distance_to(Hex::new(3, 0)), 3);
    }

    #[test]
    fn test_triangle_inequality() {
        let map = HexMap::generate(2);
        for a in map.iter() {
            for b in map.iter() {
                for c in map.iter() {
                    assert!(a.distance_to(c) <= a.distance_to(b) + b.distance_to(c));
                }
            }
        }
    }

    #[test]
    fn test_map_cardinality() {
        for radius in 0..=5 {
            let map = HexMap::generate(radius);
            let expected = (3 * radius * radius + 3 * radius + 1) as usize;
            assert_eq!(map.len(), expected, "radius {}", radius);
            for hex in map.iter() {
                assert!(hex.distance_to_center() <= radius);
            }
        }
    }

    #[test]
    fn test_neighbors_adjacent() {
        let center = Hex::new(1, -2);
        for n in center.neighbors() {
            assert_eq!(center.distance_to(n), 1);
        }
    }

    #[test]
    fn test_contains() {
        let map = HexMap::generate(2);
        assert!(map.contains(Hex::new(0, 0)));
        assert!(map.contains(Hex::new(2, -2)));
        assert!(!map.contains(Hex::new(3, 0)));
        assert!(!map.contains(Hex::new(2, 1))); // q + r = 3 > 2
    }
}
