//! Geometric shape object fields (rectangle, circle, triangle).

use serde::{Deserialize, Serialize};

/// Outline drawn by a shape object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    #[default]
    Rectangle,
    Circle,
    Triangle,
}

/// Fields carried by a shape object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShapeProps {
    pub shape_type: ShapeType,
    /// Fill color as a CSS color string.
    pub fill: String,
    /// Outline color as a CSS color string.
    pub stroke: String,
    pub stroke_width: f64,
}

impl Default for ShapeProps {
    fn default() -> Self {
        Self {
            shape_type: ShapeType::Rectangle,
            fill: "#ffffff".to_string(),
            stroke: "#000000".to_string(),
            stroke_width: 2.0,
        }
    }
}
