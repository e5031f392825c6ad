//! Freehand strokes captured during a single pen or eraser drag.

use super::generate_id;
use crate::timestamp::now_millis;
use crate::tools::ToolKind;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Unique identifier for a stroke.
pub type StrokeId = String;

/// A freehand stroke (ordered series of points).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    pub id: StrokeId,
    pub tool: ToolKind,
    /// Points in drawing order.
    pub points: Vec<Point>,
    /// Stroke color as a CSS color string.
    pub color: String,
    pub width: f64,
    /// Milliseconds since the Unix epoch when the stroke was finished.
    /// Files written by older editors carry no stamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<u64>,
}

impl Stroke {
    /// Start a stroke at `start`.
    pub fn begin(tool: ToolKind, start: Point, color: impl Into<String>, width: f64) -> Self {
        Self {
            id: generate_id(),
            tool,
            points: vec![start],
            color: color.into(),
            width,
            last_modified: None,
        }
    }

    /// Add a point to the path. Only meaningful while the stroke is being drawn.
    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Stamp the stroke as finished.
    pub fn finish(mut self) -> Self {
        self.last_modified = Some(now_millis());
        self
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Bounding box of the points, or `None` for an empty stroke.
    pub fn bounds(&self) -> Option<Rect> {
        let (first, rest) = self.points.split_first()?;
        Some(
            rest.iter()
                .fold(Rect::from_points(*first, *first), |rect, p| rect.union_pt(*p)),
        )
    }
}
