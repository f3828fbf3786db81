//! Scripted baseline policy for the player side
//!
//! A non-learning mirror of the opponent flow: each unit attacks the nearest
//! living enemy when it can, otherwise closes the distance by one step and
//! tries again. Every action goes through the validated player API, so the
//! policy can never put the game into an illegal state.

use tinyhex_core::{find_path, GameStage, GameState, Side, Terrain};

/// Drive one full player phase
pub fn drive_player_phase(game: &mut GameState) {
    for idx in game.roster().living(Side::Player) {
        if game.stage() != GameStage::Playing {
            break;
        }
        act_unit(game, idx);
    }
}

fn act_unit(game: &mut GameState, idx: usize) {
    let target_idx = match nearest_enemy(game, idx) {
        Some(t) => t,
        None => return,
    };

    // Strike or shoot first when already in position
    if game.player_attack(idx, target_idx).is_ok() {
        return;
    }

    // Close the distance by one step, then try the attack again
    let (pos, target_pos) = {
        let roster = game.roster();
        match (roster.get(idx), roster.get(target_idx)) {
            (Some(u), Some(t)) => (u.pos, t.pos),
            _ => return,
        }
    };
    let path = find_path(pos, target_pos, game.map(), game.terrain(), &[Terrain::Rock]);
    if path.len() > 1 {
        let next = path[1];
        if game.player_move(idx, next).is_ok() {
            let _ = game.player_attack(idx, target_idx);
        }
    }
}

fn nearest_enemy(game: &GameState, idx: usize) -> Option<usize> {
    let roster = game.roster();
    let unit = roster.get(idx)?;
    roster
        .living(Side::Opponent)
        .into_iter()
        .min_by_key(|&t| roster.get(t).map_or(i32::MAX, |e| unit.pos.distance_to(e.pos)))
}
