//! Editor settings consumed by the core.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// Default pixel size of one grid cell.
pub const DEFAULT_CELL_SIZE: f64 = 60.0;
/// Default padding around the grid in pixels.
pub const DEFAULT_BORDER_PADDING: f64 = 30.0;
/// Default window for grouping successive keystrokes into one batch.
pub const DEFAULT_ACTION_WINDOW_MS: u64 = 600;
/// Default distance a pointer must travel before a press becomes a drag.
pub const DEFAULT_DRAG_THRESHOLD: f64 = 20.0;

/// Settings that map the lattice to pixels and tune input handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Width and height of one cell in pixels.
    #[serde(default = "default_cell_size")]
    pub cell_size: f64,
    /// Empty space drawn around the grid, in pixels.
    #[serde(default = "default_border_padding")]
    pub border_padding: f64,
    /// Keystrokes closer together than this share a history batch.
    #[serde(default = "default_action_window_ms")]
    pub action_window_ms: u64,
    /// Radius a first pointer must leave before it starts drawing.
    #[serde(default = "default_drag_threshold")]
    pub drag_threshold: f64,
}

fn default_cell_size() -> f64 {
    DEFAULT_CELL_SIZE
}

fn default_border_padding() -> f64 {
    DEFAULT_BORDER_PADDING
}

fn default_action_window_ms() -> u64 {
    DEFAULT_ACTION_WINDOW_MS
}

fn default_drag_threshold() -> f64 {
    DEFAULT_DRAG_THRESHOLD
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            border_padding: DEFAULT_BORDER_PADDING,
            action_window_ms: DEFAULT_ACTION_WINDOW_MS,
            drag_threshold: DEFAULT_DRAG_THRESHOLD,
        }
    }
}

impl Settings {
    /// Parse settings from JSON, filling missing fields with defaults.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let settings: Self =
            serde_json::from_str(json).map_err(|e| CoreError::Settings(e.to_string()))?;
        if settings.cell_size <= 0.0 {
            return Err(CoreError::Settings(format!(
                "cellSize must be positive, got {}",
                settings.cell_size
            )));
        }
        Ok(settings)
    }

    /// Serialize the settings to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Pixel distance between two adjacent lattice coordinates.
    pub fn half_cell(&self) -> f64 {
        self.cell_size / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let settings = Settings::from_json("{}").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_json() {
        let settings = Settings::from_json(r#"{"cellSize": 40, "actionWindowMs": 250}"#).unwrap();
        assert!((settings.cell_size - 40.0).abs() < f64::EPSILON);
        assert_eq!(settings.action_window_ms, 250);
        assert!((settings.border_padding - DEFAULT_BORDER_PADDING).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rejects_non_positive_cell_size() {
        assert!(matches!(
            Settings::from_json(r#"{"cellSize": 0}"#),
            Err(CoreError::Settings(_))
        ));
        assert!(matches!(Settings::from_json("not json"), Err(CoreError::Settings(_))));
    }

    #[test]
    fn test_json_roundtrip() {
        let settings = Settings {
            cell_size: 32.0,
            ..Settings::default()
        };
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }
}
