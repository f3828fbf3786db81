//! TinyHex Core - Tactical engine and AI
//!
//! This crate provides the core game logic for TinyHex:
//! - Board geometry (hex grid with axial coordinates)
//! - Terrain classification and generation
//! - A* pathfinding over the hex graph
//! - Unit model with probabilistic combat and line-of-sight
//! - Turn/phase controller with victory detection
//! - Adaptive opponent AI with a persisted weight vector

pub mod ai;
pub mod board;
pub mod game;
pub mod path;
pub mod stats;
pub mod terrain;
pub mod units;
pub mod weights;

// Re-exports for convenient access
pub use ai::{ActionKind, AdaptiveAI, DecisionRecord};
pub use board::{Hex, HexMap, DIRECTIONS};
pub use game::{ActionError, GameConfig, GameStage, GameState};
pub use path::find_path;
pub use stats::{AttackRenderer, GameStats, NullRenderer};
pub use terrain::{Terrain, TerrainMap};
pub use units::{AttackOutcome, Roster, Side, Unit, UnitClass};
pub use weights::Weights;
