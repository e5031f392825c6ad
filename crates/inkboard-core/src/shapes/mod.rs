//! Canvas object definitions for the whiteboard.
//!
//! A [`CanvasObject`] is a placed, persistent entity (text, shape, image or
//! tool button). The per-type fields live in [`ObjectKind`], a tagged union
//! serialized with a `type` discriminator next to the shared fields.

mod image;
mod primitive;
mod stroke;
mod text;
mod tool_button;

pub use image::ImageProps;
pub use primitive::{ShapeProps, ShapeType};
pub use stroke::{Stroke, StrokeId};
pub use text::{DEFAULT_TEXT, TextProps};
pub use tool_button::{TOOL_BUTTON_SIZE, TOOL_BUTTON_Z_INDEX, ToolButtonProps};

use crate::canvas::CanvasConfig;
use crate::snap::{bound_position, bound_size, bound_to_canvas, snap_position, snap_size};
use crate::timestamp::{next_after, now_millis};
use crate::tools::ToolKind;
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a canvas object.
pub type ObjectId = String;

/// Canvas position of an object's top-left corner.
pub type Position = Point;

/// Generate a fresh object identifier.
pub fn generate_id() -> ObjectId {
    Uuid::new_v4().to_string()
}

/// Whether an object may be pushed aside by an overlapping placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapRule {
    /// Never displaced, never displaces others.
    Allow,
    /// Displaced when both sides of a collision use this rule.
    #[default]
    Displace,
}

/// Object type token, as used when asking the factory for a new object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Text,
    Image,
    Shape,
    ToolButton,
    /// Unrecognized token: a base object with no type-specific fields.
    Generic,
}

impl ObjectType {
    /// Token used in persisted files.
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectType::Text => "text",
            ObjectType::Image => "image",
            ObjectType::Shape => "shape",
            ObjectType::ToolButton => "tool-button",
            ObjectType::Generic => "generic",
        }
    }
}

impl From<&str> for ObjectType {
    fn from(token: &str) -> Self {
        match token {
            "text" => ObjectType::Text,
            "image" => ObjectType::Image,
            "shape" => ObjectType::Shape,
            "tool-button" => ObjectType::ToolButton,
            other => {
                log::debug!("Unknown object type {:?}, using a generic object", other);
                ObjectType::Generic
            }
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-specific fields of a canvas object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ObjectKind {
    Text(TextProps),
    Image(ImageProps),
    Shape(ShapeProps),
    ToolButton(ToolButtonProps),
    #[serde(other)]
    Generic,
}

impl ObjectKind {
    /// Default fields for a new object of the given type.
    pub fn defaults_for(object_type: ObjectType) -> Self {
        match object_type {
            ObjectType::Text => ObjectKind::Text(TextProps::default()),
            ObjectType::Image => ObjectKind::Image(ImageProps::default()),
            ObjectType::Shape => ObjectKind::Shape(ShapeProps::default()),
            ObjectType::ToolButton => ObjectKind::ToolButton(ToolButtonProps::default()),
            ObjectType::Generic => ObjectKind::Generic,
        }
    }

    /// The type token for these fields.
    pub fn object_type(&self) -> ObjectType {
        match self {
            ObjectKind::Text(_) => ObjectType::Text,
            ObjectKind::Image(_) => ObjectType::Image,
            ObjectKind::Shape(_) => ObjectType::Shape,
            ObjectKind::ToolButton(_) => ObjectType::ToolButton,
            ObjectKind::Generic => ObjectType::Generic,
        }
    }
}

/// A placed object on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasObject {
    pub id: ObjectId,
    #[serde(flatten)]
    pub kind: ObjectKind,
    pub position: Position,
    pub size: Size,
    /// Rotation in degrees, in `[0, 360)`.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub overlap_rule: OverlapRule,
    #[serde(default)]
    pub z_index: i32,
    /// Milliseconds since the Unix epoch of the last owner edit.
    #[serde(default)]
    pub last_modified: u64,
}

impl CanvasObject {
    pub fn object_type(&self) -> ObjectType {
        self.kind.object_type()
    }

    /// Axis-aligned bounding box (rotation is ignored).
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    /// Whether a point lies inside the bounding box, edges included.
    pub fn contains(&self, point: Point) -> bool {
        let b = self.bounds();
        point.x >= b.x0 && point.x <= b.x1 && point.y >= b.y0 && point.y <= b.y1
    }

    /// Refresh `last_modified` with a stamp newer than the current one.
    pub fn touch(&mut self) {
        self.last_modified = next_after(self.last_modified);
    }
}

/// Caller-supplied fields applied after the type defaults.
///
/// No validation is performed: a `kind` whose variant differs from the
/// requested type simply replaces the defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectOverrides {
    pub overlap_rule: Option<OverlapRule>,
    pub z_index: Option<i32>,
    pub rotation: Option<f64>,
    pub kind: Option<ObjectKind>,
}

impl ObjectOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn overlap_rule(mut self, rule: OverlapRule) -> Self {
        self.overlap_rule = Some(rule);
        self
    }

    pub fn z_index(mut self, z_index: i32) -> Self {
        self.z_index = Some(z_index);
        self
    }

    pub fn rotation(mut self, degrees: f64) -> Self {
        self.rotation = Some(degrees);
        self
    }

    pub fn kind(mut self, kind: ObjectKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// Normalize an angle in degrees to `[0, 360)`.
pub fn normalize_rotation(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs, and
    // keeps the sign of -0.0.
    if wrapped >= 360.0 { 0.0 } else { wrapped + 0.0 }
}

/// Create a new object snapped to the grid and kept inside the canvas.
pub fn create_object(
    object_type: ObjectType,
    position: Position,
    size: Size,
    canvas: &CanvasConfig,
    overrides: ObjectOverrides,
) -> CanvasObject {
    let grid = canvas.grid_size;
    let (position, size) = bound_to_canvas(
        snap_position(position, grid),
        snap_size(size, grid),
        canvas.size(),
        grid,
    );

    CanvasObject {
        id: generate_id(),
        kind: overrides
            .kind
            .unwrap_or_else(|| ObjectKind::defaults_for(object_type)),
        position,
        size,
        rotation: overrides.rotation.map(normalize_rotation).unwrap_or(0.0),
        overlap_rule: overrides.overlap_rule.unwrap_or_default(),
        z_index: overrides.z_index.unwrap_or(0),
        last_modified: now_millis(),
    }
}

/// Create an on-canvas tool button for `tool`.
pub fn create_tool_button(position: Position, tool: ToolKind, canvas: &CanvasConfig) -> CanvasObject {
    create_object(
        ObjectType::ToolButton,
        position,
        Size::new(TOOL_BUTTON_SIZE, TOOL_BUTTON_SIZE),
        canvas,
        ObjectOverrides::new()
            .overlap_rule(OverlapRule::Allow)
            .z_index(TOOL_BUTTON_Z_INDEX)
            .kind(ObjectKind::ToolButton(ToolButtonProps::new(tool))),
    )
}

/// Copy of `object` moved to `new_position`, snapped and kept inside the canvas.
pub fn move_object(object: &CanvasObject, new_position: Position, canvas: &CanvasConfig) -> CanvasObject {
    let grid = canvas.grid_size;
    let mut moved = object.clone();
    moved.position = bound_position(
        snap_position(new_position, grid),
        object.size,
        canvas.size(),
        grid,
    );
    moved.touch();
    moved
}

/// Copy of `object` resized to `new_size`, snapped, at least one grid cell and
/// no larger than the canvas space left from its position.
pub fn resize_object(object: &CanvasObject, new_size: Size, canvas: &CanvasConfig) -> CanvasObject {
    let grid = canvas.grid_size;
    let mut resized = object.clone();
    resized.size = bound_size(snap_size(new_size, grid), object.position, canvas.size(), grid);
    resized.touch();
    resized
}

/// Copy of `object` rotated to `degrees`, normalized to `[0, 360)`.
pub fn rotate_object(object: &CanvasObject, degrees: f64) -> CanvasObject {
    let mut rotated = object.clone();
    rotated.rotation = normalize_rotation(degrees);
    rotated.touch();
    rotated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> CanvasConfig {
        CanvasConfig::default()
    }

    #[test]
    fn test_create_text_defaults() {
        let obj = create_object(
            ObjectType::Text,
            Point::new(103.0, 211.0),
            Size::new(95.0, 42.0),
            &canvas(),
            ObjectOverrides::new(),
        );
        assert_eq!(obj.position, Point::new(100.0, 220.0));
        assert_eq!(obj.size, Size::new(100.0, 40.0));
        assert_eq!(obj.overlap_rule, OverlapRule::Displace);
        assert_eq!(obj.z_index, 0);
        assert_eq!(obj.rotation, 0.0);
        assert!(obj.last_modified > 0);
        match &obj.kind {
            ObjectKind::Text(text) => {
                assert_eq!(text.content, DEFAULT_TEXT);
                assert_eq!(text.font_size, 24.0);
                assert_eq!(text.font_family, "Arial");
                assert_eq!(text.color, "#000000");
            }
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_create_shape_defaults() {
        let obj = create_object(
            ObjectType::Shape,
            Point::ZERO,
            Size::new(40.0, 40.0),
            &canvas(),
            ObjectOverrides::new(),
        );
        assert_eq!(obj.kind, ObjectKind::Shape(ShapeProps::default()));
    }

    #[test]
    fn test_create_clamps_to_canvas() {
        let obj = create_object(
            ObjectType::Text,
            Point::new(1905.0, 1075.0),
            Size::new(100.0, 100.0),
            &canvas(),
            ObjectOverrides::new(),
        );
        assert_eq!(obj.position, Point::new(1820.0, 980.0));
    }

    #[test]
    fn test_create_applies_overrides_last() {
        let obj = create_object(
            ObjectType::Text,
            Point::ZERO,
            Size::new(40.0, 40.0),
            &canvas(),
            ObjectOverrides::new()
                .overlap_rule(OverlapRule::Allow)
                .z_index(7)
                .rotation(-90.0)
                .kind(ObjectKind::Text(TextProps::new("hello"))),
        );
        assert_eq!(obj.overlap_rule, OverlapRule::Allow);
        assert_eq!(obj.z_index, 7);
        assert_eq!(obj.rotation, 270.0);
        assert_eq!(obj.kind, ObjectKind::Text(TextProps::new("hello")));
    }

    #[test]
    fn test_unknown_type_is_generic() {
        let obj = create_object(
            ObjectType::from("sticker"),
            Point::ZERO,
            Size::new(40.0, 40.0),
            &canvas(),
            ObjectOverrides::new(),
        );
        assert_eq!(obj.kind, ObjectKind::Generic);
        assert_eq!(obj.object_type(), ObjectType::Generic);
    }

    #[test]
    fn test_ids_are_unique() {
        let a = create_object(ObjectType::Text, Point::ZERO, Size::new(20.0, 20.0), &canvas(), ObjectOverrides::new());
        let b = create_object(ObjectType::Text, Point::ZERO, Size::new(20.0, 20.0), &canvas(), ObjectOverrides::new());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_tool_button() {
        let button = create_tool_button(Point::new(40.0, 100.0), ToolKind::Eraser, &canvas());
        assert_eq!(button.overlap_rule, OverlapRule::Allow);
        assert_eq!(button.z_index, TOOL_BUTTON_Z_INDEX);
        assert_eq!(button.size, Size::new(60.0, 60.0));
        assert_eq!(button.kind, ObjectKind::ToolButton(ToolButtonProps::new(ToolKind::Eraser)));
    }

    #[test]
    fn test_move_object_snaps_and_bounds() {
        let obj = create_object(ObjectType::Shape, Point::ZERO, Size::new(100.0, 100.0), &canvas(), ObjectOverrides::new());
        let moved = move_object(&obj, Point::new(2000.0, 33.0), &canvas());
        assert_eq!(moved.position, Point::new(1820.0, 40.0));
        assert!(moved.last_modified > obj.last_modified);
        // The original is untouched.
        assert_eq!(obj.position, Point::ZERO);
    }

    #[test]
    fn test_resize_object_bounds() {
        let obj = create_object(ObjectType::Shape, Point::new(1800.0, 0.0), Size::new(100.0, 100.0), &canvas(), ObjectOverrides::new());
        let wide = resize_object(&obj, Size::new(500.0, 5.0), &canvas());
        assert_eq!(wide.size, Size::new(120.0, 20.0));
        assert!(wide.last_modified > obj.last_modified);
    }

    #[test]
    fn test_rotate_object_normalizes() {
        let obj = create_object(ObjectType::Shape, Point::ZERO, Size::new(40.0, 40.0), &canvas(), ObjectOverrides::new());
        assert_eq!(rotate_object(&obj, 370.0).rotation, 10.0);
        assert_eq!(rotate_object(&obj, -30.0).rotation, 330.0);
        assert_eq!(rotate_object(&obj, 360.0).rotation, 0.0);
        assert_eq!(rotate_object(&obj, -0.0).rotation.to_bits(), 0.0f64.to_bits());
    }

    #[test]
    fn test_last_modified_strictly_increases() {
        let mut obj = create_object(ObjectType::Text, Point::ZERO, Size::new(40.0, 40.0), &canvas(), ObjectOverrides::new());
        let mut previous = obj.last_modified;
        for _ in 0..5 {
            obj.touch();
            assert!(obj.last_modified > previous);
            previous = obj.last_modified;
        }
    }

    #[test]
    fn test_contains_includes_edges() {
        let obj = create_object(ObjectType::Shape, Point::new(20.0, 20.0), Size::new(40.0, 40.0), &canvas(), ObjectOverrides::new());
        assert!(obj.contains(Point::new(20.0, 20.0)));
        assert!(obj.contains(Point::new(60.0, 60.0)));
        assert!(!obj.contains(Point::new(61.0, 40.0)));
    }

    #[test]
    fn test_object_json_layout() {
        let obj = create_object(ObjectType::ToolButton, Point::ZERO, Size::new(60.0, 60.0), &canvas(), ObjectOverrides::new());
        let json = serde_json::to_value(&obj).unwrap();
        assert_eq!(json["type"], "tool-button");
        assert_eq!(json["toolType"], "pen");
        assert_eq!(json["overlapRule"], "displace");
        assert_eq!(json["position"]["x"], 0.0);
        assert_eq!(json["size"]["width"], 60.0);
        assert!(json.get("zIndex").is_some());
        assert!(json.get("lastModified").is_some());
    }

    #[test]
    fn test_object_parses_legacy_json() {
        let json = r##"{
            "id": "1700000000000",
            "type": "text",
            "position": { "x": 40, "y": 60 },
            "size": { "width": 100, "height": 100 },
            "rotation": 0,
            "overlapRule": "allow",
            "zIndex": 2,
            "lastModified": 1700000000000,
            "content": "hi",
            "fontSize": 18,
            "fontFamily": "Arial",
            "color": "#ff0000"
        }"##;
        let obj: CanvasObject = serde_json::from_str(json).unwrap();
        assert_eq!(obj.id, "1700000000000");
        assert_eq!(obj.overlap_rule, OverlapRule::Allow);
        assert_eq!(obj.position, Point::new(40.0, 60.0));
        match obj.kind {
            ObjectKind::Text(text) => {
                assert_eq!(text.content, "hi");
                assert_eq!(text.font_size, 18.0);
            }
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_object_parses_unknown_type_as_generic() {
        let json = r#"{
            "id": "a",
            "type": "sticker",
            "position": { "x": 0, "y": 0 },
            "size": { "width": 20, "height": 20 }
        }"#;
        let obj: CanvasObject = serde_json::from_str(json).unwrap();
        assert_eq!(obj.kind, ObjectKind::Generic);
    }
}
