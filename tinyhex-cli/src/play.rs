//! Play command - run a single headless game

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use tinyhex_core::{AdaptiveAI, GameConfig, GameStage, GameState, Side};

use crate::policy;

#[derive(Args)]
pub struct PlayArgs {
    /// Map radius in hexes
    #[arg(long, default_value = "3")]
    pub radius: i32,

    /// Total units across both sides
    #[arg(long, default_value = "12")]
    pub units: usize,

    /// AI weight file (created after the first game)
    #[arg(long, default_value = "rl_weights.json", value_name = "FILE")]
    pub weights: PathBuf,

    /// Turn cap; a capped game is a draw
    #[arg(long, default_value = "200")]
    pub max_turns: u32,

    /// Output the final stats as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run play command
pub fn run(args: PlayArgs, seed: Option<u64>) -> Result<()> {
    let config = GameConfig {
        map_radius: args.radius,
        max_units: args.units,
        seed: seed.unwrap_or(42),
    };

    tracing::info!(
        radius = config.map_radius,
        units = config.max_units,
        seed = config.seed,
        "starting game"
    );

    let mut ai = AdaptiveAI::new(&args.weights);
    let mut game = GameState::new(config);
    game.start();

    let winner = play_game(&mut game, &mut ai, args.max_turns)?;
    match winner {
        Some(side) => ai.finish_game(side == Side::Opponent),
        None => {
            tracing::warn!(max_turns = args.max_turns, "turn cap reached, drawn game");
            ai.discard_history();
        }
    }

    report(&game, args.json)
}

/// Alternate scripted player phases with the adaptive opponent until the
/// game ends or the turn cap is hit. Returns the winner, `None` on a draw.
pub(crate) fn play_game(
    game: &mut GameState,
    ai: &mut AdaptiveAI,
    max_turns: u32,
) -> Result<Option<Side>> {
    let mut turns = 0;
    while game.stage() == GameStage::Playing && turns < max_turns {
        policy::drive_player_phase(game);
        if game.stage() != GameStage::Playing {
            break;
        }
        game.end_turn();
        game.run_opponent_phase(ai)
            .context("opponent phase failed")?;
        turns += 1;
        tracing::debug!(
            turn = turns,
            player = game.roster().living_count(Side::Player),
            opponent = game.roster().living_count(Side::Opponent),
            "turn complete"
        );
    }
    Ok(game.winner())
}

fn report(game: &GameState, json: bool) -> Result<()> {
    let summary = game.stats().summary();
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    match summary.winner {
        Some(side) => println!("Winner: {:?} after {} turns", side, summary.turns),
        None => println!("Draw after {} turns", summary.turns),
    }
    println!(
        "Player:   {} attacks, {} hits, {} damage, {} units lost",
        summary.player_attacks, summary.player_hits, summary.player_damage, summary.player_units_lost
    );
    println!(
        "Opponent: {} attacks, {} hits, {} damage, {} units lost",
        summary.opponent_attacks,
        summary.opponent_hits,
        summary.opponent_damage,
        summary.opponent_units_lost
    );
    Ok(())
}
