//! Unit model, roster, and combat resolution

use crate::board::{Hex, HexMap};
use crate::terrain::TerrainMap;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Base hit chance before the relative-HP adjustment
const BASE_HIT_CHANCE: f32 = 0.6;

/// Cap on the relative-HP adjustment, in either direction
const HIT_CHANCE_SWING: f32 = 0.2;

/// Standard deviation of the damage sample around the attack stat
const DAMAGE_SPREAD: f32 = 1.0;

/// Default archer attack range
const ARCHER_RANGE: i32 = 3;

/// Which faction a unit fights for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Player,
    Opponent,
}

impl Side {
    pub fn enemy(self) -> Self {
        match self {
            Side::Player => Side::Opponent,
            Side::Opponent => Side::Player,
        }
    }
}

/// Combat class. Archers add a range and a line-of-sight check; there is no
/// other behavioral split, so a tagged variant beats a trait hierarchy here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitClass {
    Ground,
    Archer { range: i32 },
}

/// A unit on the board
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Unit {
    pub name: String,
    pub side: Side,
    pub pos: Hex,
    pub max_hp: i32,
    pub hp: i32,
    pub attack: i32,
    pub move_range: i32,
    pub class: UnitClass,
    pub alive: bool,
    // action flags used for turn-by-turn activation
    pub has_moved: bool,
    pub has_attacked: bool,
}

impl Unit {
    /// Melee ground unit with the standard stat line
    pub fn ground(name: impl Into<String>, pos: Hex, side: Side) -> Self {
        Self {
            name: name.into(),
            side,
            pos,
            max_hp: 10,
            hp: 10,
            attack: 4,
            move_range: 2,
            class: UnitClass::Ground,
            alive: true,
            has_moved: false,
            has_attacked: false,
        }
    }

    /// Ranged unit: weaker attack, shoots up to `ARCHER_RANGE` along clear axes
    pub fn archer(name: impl Into<String>, pos: Hex, side: Side) -> Self {
        Self {
            attack: 3,
            class: UnitClass::Archer { range: ARCHER_RANGE },
            ..Self::ground(name, pos, side)
        }
    }

    pub fn hp_ratio(&self) -> f32 {
        self.hp as f32 / self.max_hp as f32
    }

    pub fn distance_to(&self, other: &Unit) -> i32 {
        self.pos.distance_to(other.pos)
    }

    pub fn range(&self) -> Option<i32> {
        match self.class {
            UnitClass::Ground => None,
            UnitClass::Archer { range } => Some(range),
        }
    }

    pub fn is_ranged(&self) -> bool {
        matches!(self.class, UnitClass::Archer { .. })
    }

    /// Turn is over for this unit once both flags are set
    pub fn exhausted(&self) -> bool {
        self.has_moved && self.has_attacked
    }

    pub fn reset_action_flags(&mut self) {
        self.has_moved = false;
        self.has_attacked = false;
    }

    /// Tiles within movement range.
    ///
    /// This is a reachability radius, not a path-validated move set: a Forest
    /// destination costs one point of range (floor 1), the unit's own tile is
    /// excluded, and occupancy/blocking along the way is the caller's concern.
    pub fn possible_moves(&self, map: &HexMap, terrain: &TerrainMap) -> Vec<Hex> {
        map.iter()
            .filter(|&dest| {
                if dest == self.pos {
                    return false;
                }
                let mut effective_range = self.move_range;
                if terrain.is_forest(dest) {
                    effective_range = (effective_range - 1).max(1);
                }
                self.pos.distance_to(dest) <= effective_range
            })
            .collect()
    }
}

/// Outcome of one attack resolution
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AttackOutcome {
    pub hit: bool,
    pub damage: i32,
    /// Target dropped to 0 hp on this attack
    pub killed: bool,
}

impl AttackOutcome {
    pub const MISS: AttackOutcome = AttackOutcome { hit: false, damage: 0, killed: false };
}

/// Chance for `attacker` to hit `target`: wounded attackers are less
/// accurate, wounded targets easier to hit. Always within [0.4, 0.8].
pub fn hit_chance(attacker_hp: i32, target_hp: i32, attacker_max_hp: i32) -> f32 {
    let swing = (attacker_hp - target_hp) as f32 / attacker_max_hp as f32;
    BASE_HIT_CHANCE + swing.clamp(-HIT_CHANCE_SWING, HIT_CHANCE_SWING)
}

/// The unit roster. Owned by the turn controller; the AI engine and
/// pathfinding receive it by reference. Units are addressed by index, which
/// stays stable within a phase (`prune_dead` only runs at phase boundaries).
#[derive(Clone, Debug, Default)]
pub struct Roster {
    units: Vec<Unit>,
}

impl Roster {
    pub fn new(units: Vec<Unit>) -> Self {
        Self { units }
    }

    pub fn push(&mut self, unit: Unit) {
        self.units.push(unit);
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Unit> {
        self.units.get(idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut Unit> {
        self.units.get_mut(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.units.iter_mut()
    }

    /// Living unit at the given tile
    pub fn unit_at(&self, hex: Hex) -> Option<usize> {
        self.units.iter().position(|u| u.alive && u.pos == hex)
    }

    pub fn is_occupied(&self, hex: Hex) -> bool {
        self.unit_at(hex).is_some()
    }

    /// Indices of living units on the given side, in roster order
    pub fn living(&self, side: Side) -> Vec<usize> {
        self.units
            .iter()
            .enumerate()
            .filter(|(_, u)| u.alive && u.side == side)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn living_count(&self, side: Side) -> usize {
        self.units.iter().filter(|u| u.alive && u.side == side).count()
    }

    /// Living enemies of `side` adjacent to `hex`
    pub fn adjacent_enemies(&self, hex: Hex, side: Side) -> usize {
        let enemy = side.enemy();
        self.units
            .iter()
            .filter(|u| u.alive && u.side == enemy && u.pos.distance_to(hex) == 1)
            .count()
    }

    /// Remove dead units. Invalidates indices; call only between phases.
    pub fn prune_dead(&mut self) {
        self.units.retain(|u| u.alive);
    }

    pub fn reset_action_flags(&mut self, side: Side) {
        for unit in self.units.iter_mut().filter(|u| u.alive && u.side == side) {
            unit.reset_action_flags();
        }
    }

    /// Archer line of sight from `attacker_idx` to `target`: a straight hex
    /// axis (q, r, or s constant), within range, with every intermediate tile
    /// free of Rock and of living units.
    pub fn has_line_of_sight(&self, attacker_idx: usize, target: Hex, terrain: &TerrainMap) -> bool {
        let attacker = match self.units.get(attacker_idx) {
            Some(a) => a,
            None => return false,
        };
        let range = match attacker.range() {
            Some(range) => range,
            None => return false,
        };

        let dq = target.q - attacker.pos.q;
        let dr = target.r - attacker.pos.r;
        let axis_aligned = dq == 0 || dr == 0 || dq + dr == 0;
        if !axis_aligned {
            return false;
        }

        let steps = attacker.pos.distance_to(target);
        if steps == 0 || steps > range {
            return false;
        }

        let step_q = dq.signum();
        let step_r = dr.signum();
        for i in 1..steps {
            let between = Hex::new(attacker.pos.q + step_q * i, attacker.pos.r + step_r * i);
            if terrain.is_rock(between) {
                return false;
            }
            if self.is_occupied(between) {
                return false;
            }
        }
        true
    }

    /// Whether a ranged attack from `attacker_idx` on `target_idx` is legal
    pub fn can_shoot(&self, attacker_idx: usize, target_idx: usize, terrain: &TerrainMap) -> bool {
        match (self.units.get(attacker_idx), self.units.get(target_idx)) {
            (Some(attacker), Some(target)) => {
                attacker.alive
                    && target.alive
                    && self.has_line_of_sight(attacker_idx, target.pos, terrain)
            }
            _ => false,
        }
    }

    /// Probabilistic attack adjudication.
    ///
    /// A dead target is a no-op miss. On a hit the damage is a gaussian
    /// sample around the attack stat, never below 1; the target's hp is
    /// reduced and the dead flag set at hp <= 0 (hp is left where the hit
    /// put it, the flag is what excludes the unit from further logic).
    pub fn resolve_attack<R: Rng + ?Sized>(
        &mut self,
        attacker_idx: usize,
        target_idx: usize,
        rng: &mut R,
    ) -> AttackOutcome {
        let (attacker_hp, attacker_max_hp, attack) = match self.units.get(attacker_idx) {
            Some(a) => (a.hp, a.max_hp, a.attack),
            None => return AttackOutcome::MISS,
        };

        let target = match self.units.get_mut(target_idx) {
            Some(t) => t,
            None => return AttackOutcome::MISS,
        };
        if !target.alive {
            return AttackOutcome::MISS;
        }

        let chance = hit_chance(attacker_hp, target.hp, attacker_max_hp);
        let roll: f32 = rng.gen();
        if roll > chance {
            return AttackOutcome::MISS;
        }

        let normal = Normal::new(attack as f32, DAMAGE_SPREAD).expect("valid damage distribution");
        let damage = (normal.sample(rng).round() as i32).max(1);
        target.hp -= damage;
        let killed = target.hp <= 0;
        if killed {
            target.alive = false;
        }

        AttackOutcome { hit: true, damage, killed }
    }
}
