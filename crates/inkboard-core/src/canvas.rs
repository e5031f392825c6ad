//! Canvas state: the aggregate root that is saved, synced and rendered.
//!
//! States are treated as immutable values. Every edit builds a new state and
//! the owner swaps it in whole, so no handler ever sees a half-applied change.

use crate::shapes::{CanvasObject, ObjectId, Stroke};
use crate::snap::GRID_SIZE;
use crate::timestamp::iso_now;
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// Default canvas width.
pub const DEFAULT_CANVAS_WIDTH: f64 = 1920.0;

/// Default canvas height.
pub const DEFAULT_CANVAS_HEIGHT: f64 = 1080.0;

/// Canvas extents and grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasConfig {
    pub width: f64,
    pub height: f64,
    pub grid_size: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            grid_size: GRID_SIZE,
        }
    }
}

impl CanvasConfig {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Everything on the whiteboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasState {
    pub canvas: CanvasConfig,
    /// Placed objects; insertion order breaks z-index ties.
    #[serde(default)]
    pub objects: Vec<CanvasObject>,
    #[serde(default)]
    pub strokes: Vec<Stroke>,
    #[serde(default)]
    pub tool_buttons: Vec<CanvasObject>,
    /// ISO-8601 time of the last whole-state change.
    #[serde(default)]
    pub last_modified: String,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasState {
    /// Create an empty state on a default canvas.
    pub fn new() -> Self {
        Self::with_canvas(CanvasConfig::default())
    }

    /// Create an empty state on the given canvas.
    pub fn with_canvas(canvas: CanvasConfig) -> Self {
        Self {
            canvas,
            objects: Vec::new(),
            strokes: Vec::new(),
            tool_buttons: Vec::new(),
            last_modified: iso_now(),
        }
    }

    pub fn grid_size(&self) -> f64 {
        self.canvas.grid_size
    }

    /// Get an object by ID.
    pub fn object(&self, id: &str) -> Option<&CanvasObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// First object (in insertion order) whose box contains `point`.
    pub fn object_at(&self, point: Point) -> Option<&CanvasObject> {
        self.objects.iter().find(|o| o.contains(point))
    }

    /// Objects sorted for drawing: ascending z-index, insertion order on ties.
    pub fn objects_ordered(&self) -> Vec<&CanvasObject> {
        let mut ordered: Vec<&CanvasObject> = self.objects.iter().collect();
        ordered.sort_by_key(|o| o.z_index);
        ordered
    }

    /// Copy with the whole-state timestamp refreshed.
    pub fn touched(&self) -> Self {
        Self {
            last_modified: iso_now(),
            ..self.clone()
        }
    }

    /// Copy with `objects` replaced.
    pub fn with_objects(&self, objects: Vec<CanvasObject>) -> Self {
        Self {
            objects,
            ..self.clone()
        }
    }

    /// Copy with `object` appended.
    pub fn with_object_added(&self, object: CanvasObject) -> Self {
        let mut next = self.clone();
        next.objects.push(object);
        next
    }

    /// Copy with the object of the same ID replaced in place.
    /// Returns an unchanged copy when no such object exists.
    pub fn with_object_replaced(&self, object: CanvasObject) -> Self {
        let mut next = self.clone();
        if let Some(slot) = next.objects.iter_mut().find(|o| o.id == object.id) {
            *slot = object;
        }
        next
    }

    /// Copy without the object `id`.
    pub fn without_object(&self, id: &str) -> Self {
        let mut next = self.clone();
        next.objects.retain(|o| o.id != id);
        next
    }

    /// Copy with a finished stroke appended.
    pub fn with_stroke(&self, stroke: Stroke) -> Self {
        let mut next = self.clone();
        next.strokes.push(stroke);
        next
    }

    /// Copy with the tool button of the same ID replaced, or appended if new.
    pub fn with_tool_button(&self, button: CanvasObject) -> Self {
        let mut next = self.clone();
        match next.tool_buttons.iter_mut().find(|b| b.id == button.id) {
            Some(slot) => *slot = button,
            None => next.tool_buttons.push(button),
        }
        next
    }

    /// IDs of all objects, in insertion order.
    pub fn object_ids(&self) -> Vec<ObjectId> {
        self.objects.iter().map(|o| o.id.clone()).collect()
    }

    /// Get the bounding box of all objects and strokes.
    pub fn bounds(&self) -> Option<Rect> {
        let objects = self.objects.iter().map(CanvasObject::bounds);
        let strokes = self.strokes.iter().filter_map(Stroke::bounds);
        objects.chain(strokes).reduce(|acc, r| acc.union(r))
    }

    /// Whether the canvas holds no objects and no strokes.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.strokes.is_empty()
    }

    /// Serialize to compact JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to JSON indented by two spaces.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Deserialize from raw file bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
