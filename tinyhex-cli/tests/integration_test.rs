//! Integration tests for the TinyHex engine
//!
//! Tests the full stack: turn controller, combat resolution, the adaptive
//! opponent and weight persistence.

use rand::rngs::mock::StepRng;
use rand::RngCore;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use tinyhex_core::{
    AdaptiveAI, GameConfig, GameStage, GameState, Hex, Side, TerrainMap, Unit, Weights,
};

// ============================================================================
// TEST FIXTURES
// ============================================================================

/// Constant source that forces combat outcomes: the hit roll comes out 0.0
/// and the gaussian damage sample collapses to the attack stat.
fn forced_hit_rng() -> Box<dyn RngCore> {
    Box::new(StepRng::new(0x4000_0000_0000_0001, 0))
}

fn seeded_rng(seed: u64) -> Box<dyn RngCore> {
    Box::new(ChaCha8Rng::seed_from_u64(seed))
}

/// One unit per side, already adjacent, on an empty radius-3 map
fn adjacent_duel(opponent_hp: i32, rng: Box<dyn RngCore>) -> GameState {
    let mut opponent = Unit::ground("E1", Hex::new(1, 0), Side::Opponent);
    opponent.hp = opponent_hp;
    let units = vec![Unit::ground("P1", Hex::new(0, 0), Side::Player), opponent];
    let mut game = GameState::from_setup(3, TerrainMap::empty(), units, rng);
    game.start();
    game
}

// ============================================================================
// END-TO-END COMBAT
// ============================================================================

#[test]
fn test_forced_hit_reduces_hp_by_sampled_damage() {
    let mut game = adjacent_duel(10, forced_hit_rng());

    let outcome = game.player_attack(0, 1).expect("attack is legal");
    assert!(outcome.hit);
    assert!(outcome.damage >= 1);

    let target = game.roster().get(1).unwrap();
    assert_eq!(target.hp, 10 - outcome.damage);
    assert!(target.alive);
    assert_eq!(game.stage(), GameStage::Playing);
}

#[test]
fn test_forced_kill_transitions_to_game_over() {
    let mut game = adjacent_duel(1, forced_hit_rng());

    let outcome = game.player_attack(0, 1).expect("attack is legal");
    assert!(outcome.hit);
    assert!(outcome.killed);

    let target = game.roster().get(1).unwrap();
    assert_eq!(target.hp, 1 - outcome.damage);
    assert!(!target.alive);

    assert_eq!(game.stage(), GameStage::GameOver);
    assert_eq!(game.winner(), Some(Side::Player));
    assert_eq!(game.stats().player_attacks, 1);
    assert_eq!(game.stats().player_hits, 1);
    assert_eq!(game.stats().opponent_units_lost, 1);
}

// ============================================================================
// FULL GAME AGAINST THE ADAPTIVE AI
// ============================================================================

/// A passive player against the adaptive opponent: the AI must close in,
/// wipe the player side and win well within the turn cap.
#[test]
fn test_adaptive_ai_defeats_passive_player() {
    let dir = tempfile::tempdir().unwrap();
    let mut ai = AdaptiveAI::new(dir.path().join("weights.json"));
    let mut game = GameState::new(GameConfig {
        seed: 7,
        ..GameConfig::default()
    });
    game.start();

    let player_units = game.roster().living_count(Side::Player);
    assert!(player_units > 0);

    for _ in 0..500 {
        if game.stage() != GameStage::Playing {
            break;
        }
        // Player does nothing
        game.end_turn();
        game.run_opponent_phase(&mut ai).expect("opponent phase runs");
    }

    assert_eq!(game.stage(), GameStage::GameOver);
    assert_eq!(game.winner(), Some(Side::Opponent));
    assert_eq!(game.stats().player_units_lost as usize, player_units);
    assert!(game.stats().opponent_attacks > 0);
    assert!(!ai.history().is_empty(), "the winning game recorded decisions");
}

#[test]
fn test_weight_update_persists_across_engines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weights.json");

    let mut ai = AdaptiveAI::new(&path);
    let mut game = GameState::new(GameConfig {
        seed: 7,
        ..GameConfig::default()
    });
    game.start();

    for _ in 0..500 {
        if game.stage() != GameStage::Playing {
            break;
        }
        game.end_turn();
        game.run_opponent_phase(&mut ai).expect("opponent phase runs");
    }
    assert_eq!(game.winner(), Some(Side::Opponent));

    let threat_before = ai.weights().target_threat_weight;
    ai.finish_game(true);
    let threat_after = ai.weights().target_threat_weight;
    assert!(threat_after > threat_before, "winning with attacks boosts aggression");

    // A fresh engine picks the updated weights back up
    let reloaded = AdaptiveAI::new(&path);
    assert_eq!(*reloaded.weights(), *ai.weights());
}

#[test]
fn test_fresh_engine_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let ai = AdaptiveAI::new(dir.path().join("missing.json"));
    assert_eq!(*ai.weights(), Weights::default());
}

// ============================================================================
// PHASE DISCIPLINE
// ============================================================================

#[test]
fn test_opponent_phase_requires_opponent_turn() {
    let dir = tempfile::tempdir().unwrap();
    let mut ai = AdaptiveAI::new(dir.path().join("weights.json"));
    let mut game = adjacent_duel(10, seeded_rng(3));

    // Player phase is active; the opponent may not act yet
    assert!(game.run_opponent_phase(&mut ai).is_err());

    game.end_turn();
    assert!(game.run_opponent_phase(&mut ai).is_ok());
    // Control came back to the player
    assert_eq!(game.active_side(), Side::Player);
    assert_eq!(game.stats().turns, 1);
}
