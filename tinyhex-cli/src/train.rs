//! Train command - self-play loop that evolves the AI weights

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use tinyhex_core::{AdaptiveAI, GameConfig, GameState, Side};

use crate::play::play_game;

#[derive(Args)]
pub struct TrainArgs {
    /// Number of games to play
    #[arg(long, default_value = "100")]
    pub games: usize,

    /// Map radius in hexes
    #[arg(long, default_value = "3")]
    pub radius: i32,

    /// Total units across both sides
    #[arg(long, default_value = "12")]
    pub units: usize,

    /// AI weight file, updated after every game
    #[arg(long, default_value = "rl_weights.json", value_name = "FILE")]
    pub weights: PathBuf,

    /// Turn cap per game; capped games are draws and teach nothing
    #[arg(long, default_value = "200")]
    pub max_turns: u32,

    /// Log progress every N games
    #[arg(long, default_value = "10")]
    pub report_every: usize,
}

/// Run train command
pub fn run(args: TrainArgs, seed: Option<u64>) -> Result<()> {
    let base_seed = seed.unwrap_or(42);
    let mut ai = AdaptiveAI::new(&args.weights);

    tracing::info!(
        games = args.games,
        seed = base_seed,
        weights = %args.weights.display(),
        "starting training run"
    );

    let mut opponent_wins = 0usize;
    let mut player_wins = 0usize;
    let mut draws = 0usize;

    for game_num in 0..args.games {
        let config = GameConfig {
            map_radius: args.radius,
            max_units: args.units,
            seed: base_seed.wrapping_add(game_num as u64),
        };
        let mut game = GameState::new(config);
        game.start();

        match play_game(&mut game, &mut ai, args.max_turns)? {
            Some(Side::Opponent) => {
                opponent_wins += 1;
                ai.finish_game(true);
            }
            Some(Side::Player) => {
                player_wins += 1;
                ai.finish_game(false);
            }
            None => {
                draws += 1;
                ai.discard_history();
            }
        }

        if (game_num + 1) % args.report_every.max(1) == 0 {
            tracing::info!(
                played = game_num + 1,
                opponent_wins,
                player_wins,
                draws,
                "training progress"
            );
        }
    }

    println!(
        "Trained over {} games: opponent {} / player {} / draws {}",
        args.games, opponent_wins, player_wins, draws
    );
    println!("Final weights:");
    println!("{}", serde_json::to_string_pretty(ai.weights())?);
    Ok(())
}
