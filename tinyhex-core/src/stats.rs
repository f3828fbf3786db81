//! External collaborator interfaces: statistics sink and attack rendering
//!
//! The engine reports combat outcomes through `GameStats` and announces
//! resolved attacks through `AttackRenderer`. Rendering is fire-and-forget;
//! a headless run uses `NullRenderer`.

use crate::units::{Side, Unit};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Visual feedback hook, invoked once per resolved attack. The engine never
/// consumes a return value, so implementations are free to animate, log, or
/// do nothing.
pub trait AttackRenderer {
    fn render_attack(&mut self, attacker: &Unit, target: &Unit);
}

/// Headless renderer
#[derive(Clone, Copy, Debug, Default)]
pub struct NullRenderer;

impl AttackRenderer for NullRenderer {
    fn render_attack(&mut self, _attacker: &Unit, _target: &Unit) {}
}

/// Per-game statistics accumulator
#[derive(Clone, Debug)]
pub struct GameStats {
    pub turns: u32,
    pub player_attacks: u32,
    pub player_hits: u32,
    pub player_damage: i64,
    pub player_units_lost: u32,
    pub opponent_attacks: u32,
    pub opponent_hits: u32,
    pub opponent_damage: i64,
    pub opponent_units_lost: u32,
    pub winner: Option<Side>,
    start: Instant,
    duration: Option<Duration>,
}

/// Flat summary of a finished (or running) game, for reporting
#[derive(Clone, Debug, Serialize)]
pub struct StatsSummary {
    pub turns: u32,
    pub player_attacks: u32,
    pub player_hits: u32,
    pub player_damage: i64,
    pub player_units_lost: u32,
    pub opponent_attacks: u32,
    pub opponent_hits: u32,
    pub opponent_damage: i64,
    pub opponent_units_lost: u32,
    pub winner: Option<Side>,
    pub duration_seconds: f64,
}

impl Default for GameStats {
    fn default() -> Self {
        Self {
            turns: 0,
            player_attacks: 0,
            player_hits: 0,
            player_damage: 0,
            player_units_lost: 0,
            opponent_attacks: 0,
            opponent_hits: 0,
            opponent_damage: 0,
            opponent_units_lost: 0,
            winner: None,
            start: Instant::now(),
            duration: None,
        }
    }
}

impl GameStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one attack resolution, hit or miss
    pub fn record_attack(&mut self, side: Side, hit: bool, damage: i32) {
        match side {
            Side::Player => {
                self.player_attacks += 1;
                if hit {
                    self.player_hits += 1;
                    self.player_damage += damage as i64;
                }
            }
            Side::Opponent => {
                self.opponent_attacks += 1;
                if hit {
                    self.opponent_hits += 1;
                    self.opponent_damage += damage as i64;
                }
            }
        }
    }

    /// Record a unit death, keyed by the side that lost it
    pub fn record_unit_lost(&mut self, side: Side) {
        match side {
            Side::Player => self.player_units_lost += 1,
            Side::Opponent => self.opponent_units_lost += 1,
        }
    }

    pub fn set_winner(&mut self, winner: Side) {
        self.winner = Some(winner);
        self.duration = Some(self.start.elapsed());
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            turns: self.turns,
            player_attacks: self.player_attacks,
            player_hits: self.player_hits,
            player_damage: self.player_damage,
            player_units_lost: self.player_units_lost,
            opponent_attacks: self.opponent_attacks,
            opponent_hits: self.opponent_hits,
            opponent_damage: self.opponent_damage,
            opponent_units_lost: self.opponent_units_lost,
            winner: self.winner,
            duration_seconds: self
                .duration
                .unwrap_or_else(|| self.start.elapsed())
                .as_secs_f64(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_attack() {
        let mut stats = GameStats::new();
        stats.record_attack(Side::Player, true, 4);
        stats.record_attack(Side::Player, false, 0);
        stats.record_attack(Side::Opponent, true, 3);

        assert_eq!(stats.player_attacks, 2);
        assert_eq!(stats.player_hits, 1);
        assert_eq!(stats.player_damage, 4);
        assert_eq!(stats.opponent_attacks, 1);
        assert_eq!(stats.opponent_damage, 3);
    }

    #[test]
    fn test_record_unit_lost_and_winner() {
        let mut stats = GameStats::new();
        stats.record_unit_lost(Side::Opponent);
        stats.record_unit_lost(Side::Opponent);
        stats.set_winner(Side::Player);

        let summary = stats.summary();
        assert_eq!(summary.opponent_units_lost, 2);
        assert_eq!(summary.winner, Some(Side::Player));
        assert!(summary.duration_seconds >= 0.0);
    }
}
