//! Turn/phase controller: spawning, validated player actions, phase
//! switching and victory detection

use crate::ai::AdaptiveAI;
use crate::board::{Hex, HexMap};
use crate::stats::{AttackRenderer, GameStats, NullRenderer};
use crate::terrain::TerrainMap;
use crate::units::{AttackOutcome, Roster, Side, Unit};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

/// Game lifecycle. `GameOver` is terminal until `reset`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStage {
    Menu,
    Playing,
    GameOver,
}

/// Rejected player action. Policy violations, never panics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("game is not in the playing stage")]
    GameNotRunning,
    #[error("it is not the player's phase")]
    NotPlayersTurn,
    #[error("it is not the opponent's phase")]
    NotOpponentsTurn,
    #[error("no unit with index {0}")]
    NoSuchUnit(usize),
    #[error("unit does not belong to the acting side")]
    NotYourUnit,
    #[error("unit is dead")]
    UnitDead,
    #[error("unit has already moved this phase")]
    AlreadyMoved,
    #[error("unit has already attacked this phase")]
    AlreadyAttacked,
    #[error("destination is out of movement range")]
    OutOfRange,
    #[error("tile occupied")]
    TileOccupied,
    #[error("rock blocks movement")]
    BlockedTerrain,
    #[error("enemy not adjacent")]
    NotAdjacent,
    #[error("target out of range or no line of sight")]
    NoLineOfSight,
}

/// Setup parameters for a fresh game
#[derive(Clone, Copy, Debug)]
pub struct GameConfig {
    pub map_radius: i32,
    pub max_units: usize,
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            map_radius: 3,
            max_units: 12,
            seed: 42,
        }
    }
}

/// Owns the map, terrain and roster, and drives the turn loop. The AI engine
/// and pathfinder borrow these; they never own them.
pub struct GameState {
    map: HexMap,
    terrain: TerrainMap,
    roster: Roster,
    stats: GameStats,
    stage: GameStage,
    active: Side,
    winner: Option<Side>,
    config: GameConfig,
    rng: Box<dyn RngCore>,
    renderer: Box<dyn AttackRenderer>,
}

impl GameState {
    /// New game with generated terrain and spawned units, seeded from the config
    pub fn new(config: GameConfig) -> Self {
        let rng = Box::new(ChaCha8Rng::seed_from_u64(config.seed));
        Self::with_rng(config, rng)
    }

    /// New game with an injected random source (forced outcomes in tests)
    pub fn with_rng(config: GameConfig, mut rng: Box<dyn RngCore>) -> Self {
        let map = HexMap::generate(config.map_radius);
        let terrain = TerrainMap::generate(&map, rng.as_mut());
        let roster = Roster::new(spawn_units(&map, &terrain, config.max_units, rng.as_mut()));
        Self {
            map,
            terrain,
            roster,
            stats: GameStats::new(),
            stage: GameStage::Menu,
            active: Side::Player,
            winner: None,
            config,
            rng,
            renderer: Box::new(NullRenderer),
        }
    }

    /// Game from an explicit setup, for scripted scenarios and tests
    pub fn from_setup(
        map_radius: i32,
        terrain: TerrainMap,
        units: Vec<Unit>,
        rng: Box<dyn RngCore>,
    ) -> Self {
        let map = HexMap::generate(map_radius);
        Self {
            map,
            terrain,
            roster: Roster::new(units),
            stats: GameStats::new(),
            stage: GameStage::Menu,
            active: Side::Player,
            winner: None,
            config: GameConfig {
                map_radius,
                ..GameConfig::default()
            },
            rng,
            renderer: Box::new(NullRenderer),
        }
    }

    pub fn set_renderer(&mut self, renderer: Box<dyn AttackRenderer>) {
        self.renderer = renderer;
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn map(&self) -> &HexMap {
        &self.map
    }

    pub fn terrain(&self) -> &TerrainMap {
        &self.terrain
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    pub fn stage(&self) -> GameStage {
        self.stage
    }

    pub fn active_side(&self) -> Side {
        self.active
    }

    pub fn winner(&self) -> Option<Side> {
        self.winner
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Leave the menu and begin the first player phase
    pub fn start(&mut self) {
        if self.stage != GameStage::Menu {
            return;
        }
        self.stage = GameStage::Playing;
        self.active = Side::Player;
        self.roster.reset_action_flags(Side::Player);
        self.roster.reset_action_flags(Side::Opponent);
        tracing::debug!("battle begins");
    }

    /// Fresh terrain, roster and stats; back to the menu
    pub fn reset(&mut self) {
        self.terrain = TerrainMap::generate(&self.map, self.rng.as_mut());
        self.roster = Roster::new(spawn_units(
            &self.map,
            &self.terrain,
            self.config.max_units,
            self.rng.as_mut(),
        ));
        self.stats = GameStats::new();
        self.stage = GameStage::Menu;
        self.active = Side::Player;
        self.winner = None;
    }

    // ========================================================================
    // PLAYER ACTIONS
    // ========================================================================

    /// Move a player unit to a destination within its movement range.
    pub fn player_move(&mut self, unit_idx: usize, dest: Hex) -> Result<(), ActionError> {
        self.ensure_phase(Side::Player)?;
        let unit = self.acting_unit(unit_idx, Side::Player)?;
        if unit.has_moved {
            return Err(ActionError::AlreadyMoved);
        }
        if !unit.possible_moves(&self.map, &self.terrain).contains(&dest) {
            return Err(ActionError::OutOfRange);
        }
        if self.terrain.is_rock(dest) {
            return Err(ActionError::BlockedTerrain);
        }
        if self.roster.is_occupied(dest) {
            return Err(ActionError::TileOccupied);
        }

        let unit = self.roster.get_mut(unit_idx).ok_or(ActionError::NoSuchUnit(unit_idx))?;
        unit.pos = dest;
        unit.has_moved = true;
        Ok(())
    }

    /// Resolve a player attack: melee requires adjacency, archers shoot along
    /// clear axes. Attacking a corpse is a no-op miss, not an error.
    pub fn player_attack(
        &mut self,
        attacker_idx: usize,
        target_idx: usize,
    ) -> Result<AttackOutcome, ActionError> {
        self.ensure_phase(Side::Player)?;
        let attacker = self.acting_unit(attacker_idx, Side::Player)?;
        if attacker.has_attacked {
            return Err(ActionError::AlreadyAttacked);
        }
        let target = self.roster.get(target_idx).ok_or(ActionError::NoSuchUnit(target_idx))?;
        if target.side != Side::Opponent {
            return Err(ActionError::NotYourUnit);
        }
        if !target.alive {
            return Ok(AttackOutcome::MISS);
        }

        let attacker = self.roster.get(attacker_idx).ok_or(ActionError::NoSuchUnit(attacker_idx))?;
        if attacker.is_ranged() {
            if !self.roster.can_shoot(attacker_idx, target_idx, &self.terrain) {
                return Err(ActionError::NoLineOfSight);
            }
        } else if attacker.distance_to(target) > 1 {
            return Err(ActionError::NotAdjacent);
        }

        let outcome = self.resolve_player_attack(attacker_idx, target_idx);
        if let Some(unit) = self.roster.get_mut(attacker_idx) {
            unit.has_attacked = true;
        }
        self.check_victory();
        Ok(outcome)
    }

    /// End the active phase: corpses are removed, the other side becomes
    /// active with fresh action flags.
    pub fn end_turn(&mut self) {
        if self.stage != GameStage::Playing {
            return;
        }
        self.roster.prune_dead();
        self.active = self.active.enemy();
        self.roster.reset_action_flags(self.active);
        tracing::debug!(side = ?self.active, "phase start");
    }

    // ========================================================================
    // OPPONENT PHASE
    // ========================================================================

    /// Run the automated opponent phase to completion and hand control back
    /// to the player. The AI acts exactly once, uninterrupted; victory is
    /// still detected the instant the last unit of either side falls.
    pub fn run_opponent_phase(&mut self, ai: &mut AdaptiveAI) -> Result<(), ActionError> {
        if self.stage != GameStage::Playing {
            return Err(ActionError::GameNotRunning);
        }
        if self.active != Side::Opponent {
            return Err(ActionError::NotOpponentsTurn);
        }

        ai.take_actions(
            &mut self.roster,
            &self.map,
            &self.terrain,
            self.rng.as_mut(),
            &mut self.stats,
            self.renderer.as_mut(),
        );

        self.stats.turns += 1;
        self.check_victory();
        if self.stage == GameStage::Playing {
            self.end_turn();
        } else {
            self.roster.prune_dead();
        }
        Ok(())
    }

    // ========================================================================
    // INTERNALS
    // ========================================================================

    fn ensure_phase(&self, side: Side) -> Result<(), ActionError> {
        if self.stage != GameStage::Playing {
            return Err(ActionError::GameNotRunning);
        }
        if self.active != side {
            return Err(match side {
                Side::Player => ActionError::NotPlayersTurn,
                Side::Opponent => ActionError::NotOpponentsTurn,
            });
        }
        Ok(())
    }

    fn acting_unit(&self, idx: usize, side: Side) -> Result<&Unit, ActionError> {
        let unit = self.roster.get(idx).ok_or(ActionError::NoSuchUnit(idx))?;
        if unit.side != side {
            return Err(ActionError::NotYourUnit);
        }
        if !unit.alive {
            return Err(ActionError::UnitDead);
        }
        Ok(unit)
    }

    fn resolve_player_attack(&mut self, attacker_idx: usize, target_idx: usize) -> AttackOutcome {
        if let (Some(attacker), Some(target)) =
            (self.roster.get(attacker_idx), self.roster.get(target_idx))
        {
            self.renderer.render_attack(attacker, target);
        }
        let outcome = self.roster.resolve_attack(attacker_idx, target_idx, self.rng.as_mut());
        self.stats.record_attack(Side::Player, outcome.hit, outcome.damage);
        if outcome.killed {
            self.stats.record_unit_lost(Side::Opponent);
        }
        outcome
    }

    /// Enter `GameOver` the instant either side has no living units
    fn check_victory(&mut self) {
        if self.stage != GameStage::Playing {
            return;
        }
        let player_alive = self.roster.living_count(Side::Player) > 0;
        let opponent_alive = self.roster.living_count(Side::Opponent) > 0;
        if player_alive && opponent_alive {
            return;
        }
        let winner = if player_alive { Side::Player } else { Side::Opponent };
        self.stage = GameStage::GameOver;
        self.winner = Some(winner);
        self.stats.set_winner(winner);
        tracing::info!(?winner, turns = self.stats.turns, "game over");
    }
}

/// Spawn up to `max_units` units on free, non-rock tiles: player units are
/// biased to the r < 1 half of the map, opponent units to r > -1. The first
/// unit spawned on each side is upgraded to an archer.
fn spawn_units<R: Rng + ?Sized>(
    map: &HexMap,
    terrain: &TerrainMap,
    max_units: usize,
    rng: &mut R,
) -> Vec<Unit> {
    let mut spawnable: Vec<Hex> = map.iter().filter(|&h| !terrain.is_rock(h)).collect();
    spawnable.shuffle(rng);

    let player_cap = max_units / 2;
    let opponent_cap = max_units - player_cap;

    let mut units: Vec<Unit> = Vec::new();
    for coord in spawnable {
        if units.len() >= max_units {
            break;
        }
        let players = units.iter().filter(|u| u.side == Side::Player).count();
        let opponents = units.len() - players;
        if players < player_cap && coord.r < 1 {
            units.push(Unit::ground(format!("P{}", players + 1), coord, Side::Player));
        } else if opponents < opponent_cap && coord.r > -1 {
            units.push(Unit::ground(format!("E{}", opponents + 1), coord, Side::Opponent));
        }
    }

    for side in [Side::Player, Side::Opponent] {
        if let Some(idx) = units.iter().position(|u| u.side == side) {
            let pos = units[idx].pos;
            units[idx] = Unit::archer("L", pos, side);
        }
    }

    units
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::UnitClass;
    use rand::rngs::mock::StepRng;

    /// See `units::tests::forced_hit_rng`
    fn forced_hit_rng() -> Box<dyn RngCore> {
        Box::new(StepRng::new(0x4000_0000_0000_0001, 0))
    }

    fn seeded_rng(seed: u64) -> Box<dyn RngCore> {
        Box::new(ChaCha8Rng::seed_from_u64(seed))
    }

    fn adjacent_duel(rng: Box<dyn RngCore>) -> GameState {
        let units = vec![
            Unit::ground("P1", Hex::new(0, 0), Side::Player),
            Unit::ground("E1", Hex::new(1, 0), Side::Opponent),
        ];
        let mut game = GameState::from_setup(3, TerrainMap::empty(), units, rng);
        game.start();
        game
    }

    #[test]
    fn test_spawn_counts_and_bias() {
        let game = GameState::new(GameConfig::default());
        let roster = game.roster();
        assert_eq!(roster.living_count(Side::Player), 6);
        assert_eq!(roster.living_count(Side::Opponent), 6);
        for unit in roster.iter() {
            assert!(game.map().contains(unit.pos));
            assert!(!game.terrain().is_rock(unit.pos));
            match unit.side {
                Side::Player => assert!(unit.pos.r < 1),
                Side::Opponent => assert!(unit.pos.r > -1),
            }
        }
        // One archer per side
        for side in [Side::Player, Side::Opponent] {
            let archers = roster
                .iter()
                .filter(|u| u.side == side && matches!(u.class, UnitClass::Archer { .. }))
                .count();
            assert_eq!(archers, 1);
        }
    }

    #[test]
    fn test_spawn_tiles_unique() {
        let game = GameState::new(GameConfig::default());
        let mut seen = std::collections::HashSet::new();
        for unit in game.roster().iter() {
            assert!(seen.insert(unit.pos), "two units at {:?}", unit.pos);
        }
    }

    #[test]
    fn test_stage_flow() {
        let mut game = GameState::new(GameConfig::default());
        assert_eq!(game.stage(), GameStage::Menu);
        assert!(matches!(game.player_move(0, Hex::new(0, 0)), Err(ActionError::GameNotRunning)));
        game.start();
        assert_eq!(game.stage(), GameStage::Playing);
        assert_eq!(game.active_side(), Side::Player);
    }

    #[test]
    fn test_move_validation() {
        let mut game = adjacent_duel(seeded_rng(1));
        // Out of range
        assert_eq!(game.player_move(0, Hex::new(3, 0)), Err(ActionError::OutOfRange));
        // Occupied by the enemy
        assert_eq!(game.player_move(0, Hex::new(1, 0)), Err(ActionError::TileOccupied));
        // Legal move, then flag is spent
        assert_eq!(game.player_move(0, Hex::new(0, 1)), Ok(()));
        assert_eq!(game.player_move(0, Hex::new(0, 0)), Err(ActionError::AlreadyMoved));
    }

    #[test]
    fn test_move_rejects_rock() {
        let mut terrain = TerrainMap::empty();
        terrain.set(Hex::new(0, 1), crate::terrain::Terrain::Rock);
        let units = vec![
            Unit::ground("P1", Hex::new(0, 0), Side::Player),
            Unit::ground("E1", Hex::new(2, 0), Side::Opponent),
        ];
        let mut game = GameState::from_setup(3, terrain, units, seeded_rng(1));
        game.start();
        assert_eq!(game.player_move(0, Hex::new(0, 1)), Err(ActionError::BlockedTerrain));
    }

    #[test]
    fn test_attack_requires_adjacency_for_ground() {
        let units = vec![
            Unit::ground("P1", Hex::new(0, 0), Side::Player),
            Unit::ground("E1", Hex::new(2, 0), Side::Opponent),
        ];
        let mut game = GameState::from_setup(3, TerrainMap::empty(), units, seeded_rng(1));
        game.start();
        assert_eq!(game.player_attack(0, 1), Err(ActionError::NotAdjacent));
    }

    #[test]
    fn test_forced_kill_ends_game() {
        let mut game = adjacent_duel(forced_hit_rng());
        game.roster
            .get_mut(1)
            .unwrap()
            .hp = 1;

        let outcome = game.player_attack(0, 1).unwrap();
        assert!(outcome.hit);
        assert!(outcome.killed);
        assert_eq!(game.stage(), GameStage::GameOver);
        assert_eq!(game.winner(), Some(Side::Player));
        assert_eq!(game.stats().player_hits, 1);
        assert_eq!(game.stats().opponent_units_lost, 1);
    }

    #[test]
    fn test_attack_on_dead_target_is_noop() {
        let units = vec![
            Unit::ground("P1", Hex::new(0, 0), Side::Player),
            Unit::ground("E1", Hex::new(1, 0), Side::Opponent),
            Unit::ground("E2", Hex::new(2, 0), Side::Opponent),
        ];
        let mut game = GameState::from_setup(3, TerrainMap::empty(), units, forced_hit_rng());
        game.start();
        game.roster.get_mut(1).unwrap().alive = false;

        let outcome = game.player_attack(0, 1).unwrap();
        assert_eq!(outcome, AttackOutcome::MISS);
        assert_eq!(game.stage(), GameStage::Playing);
    }

    #[test]
    fn test_end_turn_swaps_and_resets_flags() {
        let mut game = adjacent_duel(seeded_rng(1));
        game.player_move(0, Hex::new(0, 1)).unwrap();
        game.end_turn();
        assert_eq!(game.active_side(), Side::Opponent);
        game.end_turn();
        assert_eq!(game.active_side(), Side::Player);
        // Flags were reset when the player became active again
        assert!(!game.roster().get(0).unwrap().has_moved);
    }

    #[test]
    fn test_end_turn_prunes_dead() {
        let units = vec![
            Unit::ground("P1", Hex::new(0, 0), Side::Player),
            Unit::ground("E1", Hex::new(1, 0), Side::Opponent),
            Unit::ground("E2", Hex::new(-2, 0), Side::Opponent),
        ];
        let mut game = GameState::from_setup(3, TerrainMap::empty(), units, forced_hit_rng());
        game.start();
        game.roster.get_mut(1).unwrap().hp = 1;
        let _ = game.player_attack(0, 1).unwrap();
        // Corpse stays in the roster until the phase boundary
        assert_eq!(game.roster().len(), 3);
        game.end_turn();
        assert_eq!(game.roster().len(), 2);
        assert_eq!(game.roster().living_count(Side::Opponent), 1);
    }

    #[test]
    fn test_reset_restores_menu() {
        let mut game = adjacent_duel(forced_hit_rng());
        game.roster.get_mut(1).unwrap().hp = 1;
        let _ = game.player_attack(0, 1).unwrap();
        assert_eq!(game.stage(), GameStage::GameOver);

        game.reset();
        assert_eq!(game.stage(), GameStage::Menu);
        assert_eq!(game.winner(), None);
        assert_eq!(game.stats().turns, 0);
    }
}
