//! Rendering settings for the native scene renderer.

use serde::{Deserialize, Serialize};

/// Page and element appearance of rendered scenes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub width: f64,
    pub height: f64,
    pub background: String,
    pub element_fill: String,
    pub element_stroke: String,
    /// Timestamp step between simulated frames, in milliseconds.
    pub frame_interval_ms: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            background: "#ffffff".to_string(),
            element_fill: "#f5f5f5".to_string(),
            element_stroke: "#555555".to_string(),
            frame_interval_ms: 16.0,
        }
    }
}
