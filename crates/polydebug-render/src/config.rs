//! Draw configuration exposed to the host inspector.
//!
//! [`DebugDrawConfig`] is a plain struct of settable fields. It also
//! round-trips through JSON so hosts can persist it alongside a scene; every
//! field is optional in the document and falls back to its default.
//!
//! ```
//! use polydebug_render::config::DebugDrawConfig;
//!
//! let config = DebugDrawConfig::from_json_str(r#"{ "draw_in_build": true }"#).unwrap();
//! assert!(config.draw_in_build);
//! assert!(config.draw_in_scene_view); // untouched fields keep their defaults
//! ```

use serde::{Deserialize, Serialize};

use crate::RenderError;

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// Straight (non-premultiplied) RGBA color, each channel in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);

    /// Semi-transparent orange used for outlines by default.
    pub const DEBUG_ORANGE: Self = Self::rgba(1.0, 0.4, 0.0, 0.75);

    /// Cyan used for selected outlines by default.
    pub const SELECTION_CYAN: Self = Self::rgba(0.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Channels as `[r, g, b, a]`, the layout the GPU vertex format expects.
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[f32; 4]> for Color {
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Self { r, g, b, a }
    }
}

// ---------------------------------------------------------------------------
// DebugDrawConfig
// ---------------------------------------------------------------------------

/// Visibility toggles and colors for [`PolygonDebugRenderer`](crate::renderer::PolygonDebugRenderer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugDrawConfig {
    /// Draw the editor preview overlay.
    pub draw_in_scene_view: bool,
    /// Draw through the GPU pipeline while running inside the editor.
    pub draw_in_play_mode: bool,
    /// Draw through the GPU pipeline in a packaged build.
    pub draw_in_build: bool,
    /// Outline color.
    pub draw_color: Color,
    /// Outline color for selected shapes (preview pipeline only).
    pub selected_color: Color,
}

impl Default for DebugDrawConfig {
    fn default() -> Self {
        Self {
            draw_in_scene_view: true,
            draw_in_play_mode: true,
            draw_in_build: false,
            draw_color: Color::DEBUG_ORANGE,
            selected_color: Color::SELECTION_CYAN,
        }
    }
}

impl DebugDrawConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Config`] if the document is malformed.
    pub fn from_json_str(json: &str) -> Result<Self, RenderError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Config`] if serialization fails.
    pub fn to_json_string(&self) -> Result<String, RenderError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_inspector_defaults() {
        let config = DebugDrawConfig::default();
        assert!(config.draw_in_scene_view);
        assert!(config.draw_in_play_mode);
        assert!(!config.draw_in_build);
        assert_eq!(config.draw_color, Color::rgba(1.0, 0.4, 0.0, 0.75));
        assert_eq!(config.selected_color, Color::rgba(0.0, 1.0, 1.0, 1.0));
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = DebugDrawConfig::from_json_str("{}").unwrap();
        assert_eq!(config, DebugDrawConfig::default());
    }

    #[test]
    fn colors_parse_from_objects() {
        let config = DebugDrawConfig::from_json_str(
            r#"{ "draw_color": { "r": 0.0, "g": 1.0, "b": 0.0, "a": 1.0 } }"#,
        )
        .unwrap();
        assert_eq!(config.draw_color, Color::rgba(0.0, 1.0, 0.0, 1.0));
    }

    #[test]
    fn malformed_document_is_a_config_error() {
        let err = DebugDrawConfig::from_json_str("{ draw_in_build: yes }").unwrap_err();
        assert!(matches!(err, RenderError::Config(_)));
    }

    #[test]
    fn json_survives_a_write_and_read() {
        let config = DebugDrawConfig {
            draw_in_build: true,
            selected_color: Color::WHITE,
            ..Default::default()
        };
        let json = config.to_json_string().unwrap();
        assert_eq!(DebugDrawConfig::from_json_str(&json).unwrap(), config);
    }
}
