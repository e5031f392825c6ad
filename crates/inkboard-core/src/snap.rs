//! Grid snapping and canvas bounds for placed objects.

use kurbo::{Point, Size};

/// Default grid size (matches the visual grid).
pub const GRID_SIZE: f64 = 20.0;

/// Snap a single coordinate to the nearest multiple of `grid_size`.
///
/// Halves round toward positive infinity, so `-10.0` on a 20 grid snaps to
/// `0.0` and `10.0` snaps to `20.0`. A non-positive grid disables snapping.
pub fn snap_to_grid(value: f64, grid_size: f64) -> f64 {
    if grid_size <= 0.0 {
        return value;
    }
    (value / grid_size + 0.5).floor() * grid_size
}

/// Snap a position componentwise.
pub fn snap_position(position: Point, grid_size: f64) -> Point {
    Point::new(
        snap_to_grid(position.x, grid_size),
        snap_to_grid(position.y, grid_size),
    )
}

/// Snap a size componentwise.
pub fn snap_size(size: Size, grid_size: f64) -> Size {
    Size::new(
        snap_to_grid(size.width, grid_size),
        snap_to_grid(size.height, grid_size),
    )
}

/// Largest grid-aligned value not exceeding `limit`.
fn floor_to_grid(limit: f64, grid_size: f64) -> f64 {
    if grid_size <= 0.0 {
        return limit;
    }
    (limit / grid_size).floor() * grid_size
}

/// Clamp a position so a box of `size` stays inside `[0, width] x [0, height]`.
///
/// The upper limit is floored to the grid so a snapped position stays aligned
/// even when the canvas size is not a multiple of the grid. Objects larger than
/// the canvas are pinned to the origin.
pub fn bound_position(position: Point, size: Size, canvas: Size, grid_size: f64) -> Point {
    let max_x = floor_to_grid(canvas.width - size.width, grid_size);
    let max_y = floor_to_grid(canvas.height - size.height, grid_size);
    Point::new(position.x.min(max_x).max(0.0), position.y.min(max_y).max(0.0))
}

/// Clamp a size to at least one grid cell and at most the canvas space left
/// to the right of and below `position`.
pub fn bound_size(size: Size, position: Point, canvas: Size, grid_size: f64) -> Size {
    let max_w = floor_to_grid(canvas.width - position.x, grid_size);
    let max_h = floor_to_grid(canvas.height - position.y, grid_size);
    Size::new(
        size.width.min(max_w).max(grid_size),
        size.height.min(max_h).max(grid_size),
    )
}

/// Keep an object's box inside the canvas: the position is clamped first,
/// then the size is clamped against the space left from that position.
pub fn bound_to_canvas(position: Point, size: Size, canvas: Size, grid_size: f64) -> (Point, Size) {
    let position = bound_position(position, size, canvas, grid_size);
    let size = bound_size(size, position, canvas, grid_size);
    (position, size)
}
