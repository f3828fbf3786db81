//! TinyHex CLI - Headless driver for the tactical engine
//!
//! Commands:
//! - play: run a single game (scripted player vs adaptive AI)
//! - train: run many self-play games, updating the AI weights after each

use clap::{Parser, Subcommand};

mod play;
mod policy;
mod train;

#[derive(Parser)]
#[command(name = "tinyhex")]
#[command(about = "TinyHex - a tiny tactical hex wargame engine")]
struct Cli {
    /// Random seed for terrain, spawns and combat rolls
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single headless game
    Play(play::PlayArgs),
    /// Run self-play games and evolve the AI weights
    Train(train::TrainArgs),
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play(args) => play::run(args, cli.seed),
        Commands::Train(args) => train::run(args, cli.seed),
    }
}
