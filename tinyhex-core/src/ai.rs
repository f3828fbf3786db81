//! Adaptive opponent AI
//!
//! Per unit and phase: evaluate the retreat condition, otherwise score all
//! living player units with the learned weights and either shoot, strike an
//! adjacent target, or advance one step along an A* path toward the chosen
//! one. Decisions are logged to a history that the post-game weight update
//! consumes.

use crate::board::{Hex, HexMap};
use crate::path::find_path;
use crate::stats::{AttackRenderer, GameStats};
use crate::terrain::{Terrain, TerrainMap};
use crate::units::{Roster, Side};
use crate::weights::Weights;
use rand::RngCore;
use rustc_hash::FxHashMap;
use std::path::PathBuf;

/// Weight factor per ally already attacking the same target
const FOCUS_FIRE_BONUS: f32 = 0.2;

/// Adjacent enemies at which a unit retreats regardless of hp
const SURROUNDED_THRESHOLD: usize = 3;

/// Nearest-ally distance when a unit has no living allies
const LONELY_ALLY_DISTANCE: i32 = 5;

/// What a recorded decision was
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionKind {
    Attack,
    Move,
    /// Advance that raised the unit's adjacent-enemy exposure
    MoveIntoDanger,
    Retreat,
}

/// One entry of the per-game decision history
#[derive(Clone, Copy, Debug)]
pub struct DecisionRecord {
    pub action: ActionKind,
    pub used_terrain: bool,
    pub hit: bool,
    pub damage: i32,
    pub survived_weak: bool,
}

impl DecisionRecord {
    fn of(action: ActionKind) -> Self {
        Self {
            action,
            used_terrain: false,
            hit: false,
            damage: 0,
            survived_weak: false,
        }
    }
}

/// Opponent AI with learned weights that persist across games.
///
/// Weights load at construction; `finish_game` applies the outcome-driven
/// update, saves, and clears the history for the next game.
pub struct AdaptiveAI {
    weights: Weights,
    weights_path: PathBuf,
    history: Vec<DecisionRecord>,
    /// Per-phase focus-fire bookkeeping: target index -> attackers so far
    focus: FxHashMap<usize, u32>,
}

impl AdaptiveAI {
    pub fn new(weights_path: impl Into<PathBuf>) -> Self {
        let weights_path = weights_path.into();
        let weights = Weights::load_or_default(&weights_path);
        Self {
            weights,
            weights_path,
            history: Vec::new(),
            focus: FxHashMap::default(),
        }
    }

    /// Engine with explicit weights, bypassing the file load
    pub fn with_weights(weights: Weights, weights_path: impl Into<PathBuf>) -> Self {
        Self {
            weights,
            weights_path: weights_path.into(),
            history: Vec::new(),
            focus: FxHashMap::default(),
        }
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    pub fn history(&self) -> &[DecisionRecord] {
        &self.history
    }

    // ========================================================================
    // PHASE EXECUTION
    // ========================================================================

    /// Run one full opponent phase: every living opponent unit acts once.
    /// Stops as soon as the player side is wiped out.
    pub fn take_actions(
        &mut self,
        roster: &mut Roster,
        map: &HexMap,
        terrain: &TerrainMap,
        rng: &mut dyn RngCore,
        stats: &mut GameStats,
        renderer: &mut dyn AttackRenderer,
    ) {
        self.focus.clear();

        for idx in roster.living(Side::Opponent) {
            if roster.living_count(Side::Player) == 0 {
                break;
            }
            self.act_unit(idx, roster, map, terrain, rng, stats, renderer);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn act_unit(
        &mut self,
        idx: usize,
        roster: &mut Roster,
        map: &HexMap,
        terrain: &TerrainMap,
        rng: &mut dyn RngCore,
        stats: &mut GameStats,
        renderer: &mut dyn AttackRenderer,
    ) {
        if self.should_retreat(roster, idx) {
            let has_moved = roster.get(idx).map_or(true, |u| u.has_moved);
            if !has_moved {
                if let Some(dest) = self.find_retreat_position(roster, idx, map, terrain) {
                    if let Some(unit) = roster.get_mut(idx) {
                        tracing::debug!(unit = %unit.name, ?dest, "retreat");
                        unit.pos = dest;
                        unit.has_moved = true;
                    }
                    self.history.push(DecisionRecord::of(ActionKind::Retreat));
                }
            }
            // No attack on retreat; the flag stays available but unused
            return;
        }

        let target_idx = match self.pick_target(roster, idx) {
            Some(t) => t,
            None => return,
        };

        let (is_ranged, has_moved, has_attacked, pos) = {
            let unit = match roster.get(idx) {
                Some(u) => u,
                None => return,
            };
            (unit.is_ranged(), unit.has_moved, unit.has_attacked, unit.pos)
        };

        // Shoot in place when the chosen target is in range and sight
        if is_ranged && !has_attacked && roster.can_shoot(idx, target_idx, terrain) {
            self.execute_attack(idx, target_idx, roster, rng, stats, renderer);
            if let Some(unit) = roster.get_mut(idx) {
                unit.has_moved = true;
            }
            return;
        }

        // Melee when adjacent
        let target_pos = match roster.get(target_idx) {
            Some(t) => t.pos,
            None => return,
        };
        if pos.distance_to(target_pos) <= 1 && !has_attacked {
            self.execute_attack(idx, target_idx, roster, rng, stats, renderer);
            if let Some(unit) = roster.get_mut(idx) {
                unit.has_moved = true;
            }
            return;
        }

        // Otherwise advance one step along the path toward the target
        if !has_moved {
            let path = find_path(pos, target_pos, map, terrain, &[Terrain::Rock]);
            if path.len() > 1 {
                let next = path[1];
                if !roster.is_occupied(next) {
                    let danger_before = roster.adjacent_enemies(pos, Side::Opponent);
                    let danger_after = roster.adjacent_enemies(next, Side::Opponent);
                    if let Some(unit) = roster.get_mut(idx) {
                        unit.pos = next;
                        unit.has_moved = true;
                    }
                    let used_terrain = terrain.is_forest(next);
                    let into_danger = danger_after > danger_before;
                    if used_terrain || into_danger {
                        let action = if into_danger {
                            ActionKind::MoveIntoDanger
                        } else {
                            ActionKind::Move
                        };
                        self.history.push(DecisionRecord {
                            used_terrain,
                            ..DecisionRecord::of(action)
                        });
                    }
                }
            }
        }
    }

    fn execute_attack(
        &mut self,
        attacker_idx: usize,
        target_idx: usize,
        roster: &mut Roster,
        rng: &mut dyn RngCore,
        stats: &mut GameStats,
        renderer: &mut dyn AttackRenderer,
    ) {
        if let (Some(attacker), Some(target)) = (roster.get(attacker_idx), roster.get(target_idx)) {
            renderer.render_attack(attacker, target);
        }

        let outcome = roster.resolve_attack(attacker_idx, target_idx, rng);
        stats.record_attack(Side::Opponent, outcome.hit, outcome.damage);
        if outcome.killed {
            stats.record_unit_lost(Side::Player);
        }
        if let Some(attacker) = roster.get_mut(attacker_idx) {
            attacker.has_attacked = true;
        }
        *self.focus.entry(target_idx).or_insert(0) += 1;

        let survived_weak = outcome.hit
            && roster
                .get(target_idx)
                .map_or(false, |t| t.alive && t.hp < t.max_hp / 2);
        self.history.push(DecisionRecord {
            hit: outcome.hit,
            damage: outcome.damage,
            survived_weak,
            ..DecisionRecord::of(ActionKind::Attack)
        });
        tracing::debug!(hit = outcome.hit, damage = outcome.damage, "opponent attack");
    }

    // ========================================================================
    // EVALUATION
    // ========================================================================

    /// Highest-scoring living player unit; ties keep the first in roster order
    fn pick_target(&self, roster: &Roster, ai_idx: usize) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for target_idx in roster.living(Side::Player) {
            let score = self.evaluate_target(roster, ai_idx, target_idx);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((target_idx, score)),
            }
        }
        best.map(|(idx, _)| idx)
    }

    /// How attractive a target is (higher = better)
    fn evaluate_target(&self, roster: &Roster, ai_idx: usize, target_idx: usize) -> f32 {
        let (unit, target) = match (roster.get(ai_idx), roster.get(target_idx)) {
            (Some(u), Some(t)) => (u, t),
            _ => return f32::MIN,
        };

        // Wounded targets score higher
        let hp_score = (target.max_hp - target.hp) as f32 / target.max_hp as f32;

        let distance = unit.distance_to(target);
        let distance_score = 1.0 / (distance as f32 + 1.0);

        // Normalized by the typical attack value; ranged units are more dangerous
        let mut threat_score = target.attack as f32 / 10.0;
        if target.is_ranged() {
            threat_score *= 1.5;
        }

        let allies_attacking = self.focus.get(&target_idx).copied().unwrap_or(0);
        let focus_score = allies_attacking as f32 * FOCUS_FIRE_BONUS;

        self.weights.target_hp_weight * hp_score
            + self.weights.target_distance_weight * distance_score
            + self.weights.target_threat_weight * threat_score
            + self.weights.focus_fire_weight * focus_score
    }

    /// How safe a position is (higher = safer), floored at 0.1
    fn evaluate_position(
        &self,
        roster: &Roster,
        ai_idx: usize,
        position: Hex,
        terrain: &TerrainMap,
    ) -> f32 {
        let mut safety = 1.0;

        let adjacent_enemies = roster.adjacent_enemies(position, Side::Opponent) as f32;
        safety -= adjacent_enemies * self.weights.safety_weight * 0.2;

        if terrain.is_forest(position) {
            safety += self.weights.terrain_defense_weight * 0.3;
        }

        let ally_distance = self.nearest_ally_distance(roster, ai_idx);
        if ally_distance <= 2 {
            safety += self.weights.formation_weight * (2 - ally_distance) as f32 * 0.1;
        }

        safety.max(0.1)
    }

    fn nearest_ally_distance(&self, roster: &Roster, ai_idx: usize) -> i32 {
        let unit = match roster.get(ai_idx) {
            Some(u) => u,
            None => return LONELY_ALLY_DISTANCE,
        };
        roster
            .living(Side::Opponent)
            .into_iter()
            .filter(|&i| i != ai_idx)
            .filter_map(|i| roster.get(i))
            .map(|ally| unit.pos.distance_to(ally.pos))
            .min()
            .unwrap_or(LONELY_ALLY_DISTANCE)
    }

    /// Flee when badly wounded or surrounded
    fn should_retreat(&self, roster: &Roster, ai_idx: usize) -> bool {
        let unit = match roster.get(ai_idx) {
            Some(u) => u,
            None => return false,
        };
        if unit.hp_ratio() < self.weights.retreat_threshold {
            return true;
        }
        roster.adjacent_enemies(unit.pos, Side::Opponent) >= SURROUNDED_THRESHOLD
    }

    /// Safest reachable tile: unoccupied, not rock, maximizing the safety
    /// score; ties keep the first in movement-range order
    fn find_retreat_position(
        &self,
        roster: &Roster,
        ai_idx: usize,
        map: &HexMap,
        terrain: &TerrainMap,
    ) -> Option<Hex> {
        let unit = roster.get(ai_idx)?;
        let mut best: Option<(Hex, f32)> = None;
        for dest in unit.possible_moves(map, terrain) {
            if roster.is_occupied(dest) || terrain.is_rock(dest) {
                continue;
            }
            let score = self.evaluate_position(roster, ai_idx, dest, terrain);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((dest, score)),
            }
        }
        best.map(|(dest, _)| dest)
    }

    // ========================================================================
    // LEARNING
    // ========================================================================

    /// Outcome-driven weight update. Consumes the decision history, clamps
    /// every weight to its bounds and persists the result immediately.
    /// A game with no recorded decisions changes nothing.
    pub fn finish_game(&mut self, won: bool) {
        if self.history.is_empty() {
            return;
        }

        let adjustment: f32 = if won { 0.02 } else { -0.01 };

        if won {
            if self.history.iter().any(|h| h.action == ActionKind::Attack) {
                self.weights.target_threat_weight *= 1.0 + adjustment;
                self.weights.focus_fire_weight *= 1.0 + adjustment;
            }
            if self.history.iter().any(|h| h.used_terrain) {
                self.weights.terrain_defense_weight *= 1.0 + adjustment;
            }
            if self.history.iter().any(|h| h.survived_weak) {
                self.weights.safety_weight *= 1.0 + adjustment;
            }
        } else {
            if self
                .history
                .iter()
                .any(|h| h.action == ActionKind::MoveIntoDanger)
            {
                self.weights.safety_weight *= 1.0 - adjustment;
            }
            // Rein in aggression after a loss
            self.weights.target_threat_weight *= 1.0 - adjustment.abs();
        }

        self.weights.clamp_all();
        self.weights.save(&self.weights_path);
        self.history.clear();
        tracing::debug!(won, weights = ?self.weights, "weights updated");
    }

    /// Drop the recorded history without touching the weights, for games
    /// abandoned before a winner emerged.
    pub fn discard_history(&mut self) {
        self.history.clear();
    }
}
