//! Text object fields.

use serde::{Deserialize, Serialize};

/// Default content for a freshly placed text object.
pub const DEFAULT_TEXT: &str = "new text";

/// Fields carried by a text object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextProps {
    /// The text itself.
    pub content: String,
    /// Font size in canvas units.
    pub font_size: f64,
    /// CSS font family name.
    pub font_family: String,
    /// Text color as a CSS color string.
    pub color: String,
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            content: DEFAULT_TEXT.to_string(),
            font_size: 24.0,
            font_family: "Arial".to_string(),
            color: "#000000".to_string(),
        }
    }
}

impl TextProps {
    /// Create text props with the given content and default styling.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }
}
