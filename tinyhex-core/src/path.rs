//! A* pathfinding over the hex graph

use crate::board::{Hex, HexMap, DIRECTIONS};
use crate::terrain::{Terrain, TerrainMap};
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Frontier entry. Ordered so the `BinaryHeap` pops the lowest priority
/// first; ties resolve by (q, r) of the hex, keeping the search
/// deterministic across runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Frontier {
    priority: i32,
    hex: Hex,
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.hex.q.cmp(&self.hex.q))
            .then_with(|| other.hex.r.cmp(&self.hex.r))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Neighbors of `hex` that are on the map and not of a blocked terrain kind.
pub fn open_neighbors(
    hex: Hex,
    map: &HexMap,
    terrain: &TerrainMap,
    blocked: &[Terrain],
) -> Vec<Hex> {
    DIRECTIONS
        .iter()
        .map(|&(dq, dr)| Hex::new(hex.q + dq, hex.r + dr))
        .filter(|&n| map.contains(n) && !blocked.contains(&terrain.get(n)))
        .collect()
}

/// Shortest path from `start` to `goal`, inclusive of both endpoints.
///
/// Unit step cost with the hex distance as heuristic, so returned paths are
/// optimal. Returns an empty vec when the goal is unreachable; callers treat
/// that as "stay in place". Units do not block the search - occupancy is the
/// caller's concern when stepping.
pub fn find_path(
    start: Hex,
    goal: Hex,
    map: &HexMap,
    terrain: &TerrainMap,
    blocked: &[Terrain],
) -> Vec<Hex> {
    let mut frontier = BinaryHeap::new();
    frontier.push(Frontier { priority: 0, hex: start });

    let mut came_from: FxHashMap<Hex, Option<Hex>> = FxHashMap::default();
    let mut cost_so_far: FxHashMap<Hex, i32> = FxHashMap::default();
    came_from.insert(start, None);
    cost_so_far.insert(start, 0);

    while let Some(Frontier { hex: current, .. }) = frontier.pop() {
        if current == goal {
            break;
        }

        for next in open_neighbors(current, map, terrain, blocked) {
            let new_cost = cost_so_far[&current] + 1;
            let better = match cost_so_far.get(&next) {
                Some(&existing) => new_cost < existing,
                None => true,
            };
            if better {
                cost_so_far.insert(next, new_cost);
                frontier.push(Frontier {
                    priority: new_cost + goal.distance_to(next),
                    hex: next,
                });
                came_from.insert(next, Some(current));
            }
        }
    }

    if !came_from.contains_key(&goal) {
        return Vec::new();
    }

    let mut path = Vec::new();
    let mut current = goal;
    while current != start {
        path.push(current);
        match came_from.get(&current) {
            Some(&Some(prev)) => current = prev,
            _ => return Vec::new(),
        }
    }
    path.push(start);
    path.reverse();
    path
}
