//! Learned weight vector for the adaptive opponent
//!
//! The weights persist across games as a flat JSON document. Reading a
//! missing or corrupt file falls back to the defaults; a failed save is
//! logged and swallowed - the in-memory weights stay authoritative for the
//! rest of the process.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Lower clamp for every weight after an update
pub const WEIGHT_MIN: f32 = 0.1;

/// Upper clamp for every weight after an update
pub const WEIGHT_MAX: f32 = 2.0;

/// Heuristic weights driving target selection, positioning and retreat.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    /// Prefer lower-HP targets
    pub target_hp_weight: f32,
    /// Prefer closer targets
    pub target_distance_weight: f32,
    /// Prefer targets that threaten us
    pub target_threat_weight: f32,
    /// Prefer moving to forest
    pub terrain_defense_weight: f32,
    /// Avoid positions with many enemies
    pub safety_weight: f32,
    /// Prefer targets allies are attacking
    pub focus_fire_weight: f32,
    /// HP ratio below which to retreat
    pub retreat_threshold: f32,
    /// Prefer staying near allies
    pub formation_weight: f32,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            target_hp_weight: 0.8,
            target_distance_weight: 0.3,
            target_threat_weight: 1.2,
            terrain_defense_weight: 0.5,
            safety_weight: 1.0,
            focus_fire_weight: 0.6,
            retreat_threshold: 0.35,
            formation_weight: 0.4,
        }
    }
}

impl Weights {
    /// Keep all weights in reasonable bounds. The retreat threshold goes
    /// through the same clamp as the rest.
    pub fn clamp_all(&mut self) {
        for w in [
            &mut self.target_hp_weight,
            &mut self.target_distance_weight,
            &mut self.target_threat_weight,
            &mut self.terrain_defense_weight,
            &mut self.safety_weight,
            &mut self.focus_fire_weight,
            &mut self.retreat_threshold,
            &mut self.formation_weight,
        ] {
            *w = w.clamp(WEIGHT_MIN, WEIGHT_MAX);
        }
    }

    /// Load weights from a JSON file, falling back to the defaults when the
    /// file is missing, unreadable or does not parse.
    pub fn load_or_default(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(weights) => weights,
                Err(e) => {
                    tracing::warn!("Corrupt weight file {}, using defaults: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                tracing::debug!("No weight file at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Best-effort save. Failures are logged, never surfaced.
    pub fn save(&self, path: &Path) {
        let content = match serde_json::to_string_pretty(self) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Failed to serialize weights: {}", e);
                return;
            }
        };
        if let Err(e) = std::fs::write(path, content) {
            tracing::warn!("Failed to save weights to {}: {}", path.display(), e);
        }
    }
}
