//! Drawing tools and the per-session tool settings.

use crate::shapes::{ObjectKind, ObjectType, ShapeProps, ShapeType, Stroke, TextProps};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Available drawing tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Pen,
    Eraser,
}

impl ToolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolKind::Pen => "pen",
            ToolKind::Eraser => "eraser",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Toolbar settings for one editing session.
///
/// Built once when a session starts and handed to the editor explicitly.
/// Changes produce a new value; nothing reads tool state from a global.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolSettings {
    pub tool: ToolKind,
    pub pen_color: String,
    pub pen_width: f64,
    pub eraser_width: f64,
    pub font_size: f64,
    pub font_family: String,
    pub shape_type: ShapeType,
    pub fill_color: String,
    pub stroke_color: String,
    pub stroke_width: f64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            tool: ToolKind::Pen,
            pen_color: "#000000".to_string(),
            pen_width: 2.0,
            eraser_width: 20.0,
            font_size: 24.0,
            font_family: "Arial".to_string(),
            shape_type: ShapeType::Rectangle,
            fill_color: "#ffffff".to_string(),
            stroke_color: "#000000".to_string(),
            stroke_width: 2.0,
        }
    }
}

impl ToolSettings {
    pub fn with_tool(&self, tool: ToolKind) -> Self {
        Self { tool, ..self.clone() }
    }

    pub fn with_pen(&self, color: impl Into<String>, width: f64) -> Self {
        Self {
            pen_color: color.into(),
            pen_width: width,
            ..self.clone()
        }
    }

    pub fn with_eraser_width(&self, width: f64) -> Self {
        Self {
            eraser_width: width,
            ..self.clone()
        }
    }

    pub fn with_font(&self, family: impl Into<String>, size: f64) -> Self {
        Self {
            font_family: family.into(),
            font_size: size,
            ..self.clone()
        }
    }

    pub fn with_shape(&self, shape_type: ShapeType) -> Self {
        Self {
            shape_type,
            ..self.clone()
        }
    }

    pub fn with_shape_colors(&self, fill: impl Into<String>, stroke: impl Into<String>, width: f64) -> Self {
        Self {
            fill_color: fill.into(),
            stroke_color: stroke.into(),
            stroke_width: width,
            ..self.clone()
        }
    }

    /// Fields for a new object placed from the toolbar. Text and shapes take
    /// the current font and shape style; other types get their defaults.
    pub fn object_kind(&self, object_type: ObjectType) -> ObjectKind {
        match object_type {
            ObjectType::Text => ObjectKind::Text(TextProps {
                font_size: self.font_size,
                font_family: self.font_family.clone(),
                ..TextProps::default()
            }),
            ObjectType::Shape => ObjectKind::Shape(ShapeProps {
                shape_type: self.shape_type,
                fill: self.fill_color.clone(),
                stroke: self.stroke_color.clone(),
                stroke_width: self.stroke_width,
            }),
            other => ObjectKind::defaults_for(other),
        }
    }

    /// Color and width a new stroke gets with the given tool.
    pub fn stroke_style(&self, tool: ToolKind) -> (&str, f64) {
        match tool {
            ToolKind::Pen => (&self.pen_color, self.pen_width),
            // The eraser paints with the background; its color is irrelevant.
            ToolKind::Eraser => (&self.pen_color, self.eraser_width),
        }
    }
}

/// State of a tool interaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ToolState {
    /// Waiting for a pointer press.
    #[default]
    Idle,
    /// A stroke is being drawn.
    Drawing(Stroke),
}

/// Tracks the active stroke while the pointer is down.
#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    pub state: ToolState,
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a stroke is in progress.
    pub fn is_drawing(&self) -> bool {
        matches!(self.state, ToolState::Drawing(_))
    }

    /// The stroke in progress, for live preview.
    pub fn active_stroke(&self) -> Option<&Stroke> {
        match &self.state {
            ToolState::Drawing(stroke) => Some(stroke),
            ToolState::Idle => None,
        }
    }

    /// Begin a stroke with the settings' current tool.
    pub fn begin(&mut self, point: Point, settings: &ToolSettings) {
        let (color, width) = settings.stroke_style(settings.tool);
        self.state = ToolState::Drawing(Stroke::begin(settings.tool, point, color, width));
    }

    /// Extend the stroke in progress. Ignored when idle.
    pub fn add_point(&mut self, point: Point) {
        if let ToolState::Drawing(stroke) = &mut self.state {
            stroke.add_point(point);
        }
    }

    /// Finish the stroke in progress and return it.
    pub fn finish(&mut self) -> Option<Stroke> {
        match std::mem::take(&mut self.state) {
            ToolState::Drawing(stroke) => Some(stroke.finish()),
            ToolState::Idle => None,
        }
    }

    /// Drop the stroke in progress.
    pub fn cancel(&mut self) {
        self.state = ToolState::Idle;
    }
}
