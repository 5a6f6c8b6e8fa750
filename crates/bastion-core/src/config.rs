//! Editor tuning knobs.

use serde::{Deserialize, Serialize};

/// Edge length of one sprite-sheet tile in pixels.
pub const TILE_SIZE: u32 = 16;

/// Default zoom multipliers, ascending.
pub const ZOOM_LEVELS: [u32; 4] = [1, 2, 3, 4];

/// Default timeout for commands and snapshot loads.
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub tile_size: u32,
    /// Integer multipliers so tile edges stay on whole pixels.
    pub zoom_levels: Vec<u32>,
    pub initial_zoom_index: usize,
    pub initial_camera: (f64, f64),
    /// Wheel events with a smaller `|delta_y|` are ignored.
    pub wheel_threshold: f64,
    pub command_timeout_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            tile_size: TILE_SIZE,
            zoom_levels: ZOOM_LEVELS.to_vec(),
            initial_zoom_index: 1, // start at 2x
            initial_camera: (40.0, 40.0),
            wheel_threshold: 1.0,
            command_timeout_ms: DEFAULT_COMMAND_TIMEOUT_MS,
        }
    }
}

impl EditorConfig {
    /// Repair values that would break the viewport math.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.zoom_levels.retain(|z| *z > 0);
        self.zoom_levels.sort_unstable();
        self.zoom_levels.dedup();
        if self.zoom_levels.is_empty() {
            self.zoom_levels = ZOOM_LEVELS.to_vec();
        }
        if self.tile_size == 0 {
            self.tile_size = TILE_SIZE;
        }
        self.initial_zoom_index = self.initial_zoom_index.min(self.zoom_levels.len() - 1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EditorConfig = serde_json::from_str(r#"{"wheel_threshold": 4.0}"#).unwrap();
        assert_eq!(config.zoom_levels, vec![1, 2, 3, 4]);
        assert!((config.wheel_threshold - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_normalized_sorts_and_clamps() {
        let config = EditorConfig {
            zoom_levels: vec![3, 0, 1, 3],
            initial_zoom_index: 9,
            ..EditorConfig::default()
        }
        .normalized();
        assert_eq!(config.zoom_levels, vec![1, 3]);
        assert_eq!(config.initial_zoom_index, 1);
    }
}
