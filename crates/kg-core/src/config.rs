//! Canvas tuning knobs.
//!
//! Every field has a default, so hosts only pass the values they want to
//! override (as camelCase JSON through the WASM bridge).

use crate::model::ShapeStyle;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasConfig {
    /// Extra hit slop around shape bounds, in screen pixels.
    pub hit_tolerance: f64,
    /// Hit slop used by the eraser sweep, in screen pixels.
    pub eraser_tolerance: f64,
    /// Radius of a graph node as drawn by the layout library, in world units.
    pub node_radius: f64,
    /// Marquee drags smaller than this (screen pixels) count as a click.
    pub marquee_threshold: f64,
    /// Cap on undo snapshots. `None` keeps every snapshot.
    pub history_limit: Option<usize>,
    /// Content given to newly placed text shapes.
    pub text_placeholder: String,
    /// Style for newly drawn shapes.
    pub default_style: ShapeStyle,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            hit_tolerance: 6.0,
            eraser_tolerance: 10.0,
            node_radius: 4.0,
            marquee_threshold: 2.0,
            history_limit: None,
            text_placeholder: "Text".to_string(),
            default_style: ShapeStyle::default(),
        }
    }
}

impl CanvasConfig {
    /// Parse from JSON; an empty string yields the defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(json)
    }
}
