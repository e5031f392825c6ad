//! Editor session: turns pointer input and panel commands into new canvas
//! snapshots.
//!
//! The session never mutates a published snapshot. Every committed edit
//! builds a new [`CanvasState`] and swaps the `Arc`, so a renderer or a save
//! in flight keeps a consistent view of the previous state.

use crate::canvas::CanvasState;
use crate::overlap::resolve_overlap;
use crate::shapes::{
    CanvasObject, ObjectId, ObjectOverrides, ObjectType, Position, Stroke, create_object,
    create_tool_button, move_object, normalize_rotation, resize_object, rotate_object,
};
use crate::snap::{bound_to_canvas, snap_position, snap_size};
use crate::tools::{ToolKind, ToolManager, ToolSettings};
use kurbo::{Point, Size};
use std::sync::Arc;
use thiserror::Error;

/// Size of objects added from the toolbar.
pub const NEW_OBJECT_SIZE: f64 = 100.0;

/// Edit errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("Canvas is read-only")]
    ReadOnly,
    #[error("Object not found: {0}")]
    NotFound(ObjectId),
    #[error("No object selected")]
    NothingSelected,
}

/// Result type for edit operations.
pub type EditResult<T> = Result<T, EditError>;

/// An object drag in progress.
#[derive(Debug, Clone)]
struct DragState {
    object_id: ObjectId,
    /// Pointer position when the drag started.
    start: Point,
    /// Object position when the drag started.
    origin: Position,
}

/// One editor window's view of the canvas.
pub struct EditorSession {
    state: Arc<CanvasState>,
    settings: ToolSettings,
    tools: ToolManager,
    selection: Option<ObjectId>,
    drag: Option<DragState>,
    read_only: bool,
    /// Bumped on every committed change.
    version: u64,
}

impl EditorSession {
    /// Create an editing session.
    pub fn new(state: CanvasState, settings: ToolSettings) -> Self {
        Self {
            state: Arc::new(state),
            settings,
            tools: ToolManager::new(),
            selection: None,
            drag: None,
            read_only: false,
            version: 0,
        }
    }

    /// Create a session that only displays states handed to
    /// [`replace_state`](Self::replace_state).
    pub fn read_only(state: CanvasState) -> Self {
        Self {
            read_only: true,
            ..Self::new(state, ToolSettings::default())
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Current snapshot.
    pub fn state(&self) -> &Arc<CanvasState> {
        &self.state
    }

    /// Counter of committed changes, for hosts tracking unsaved work.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    /// Replace the tool settings. A stroke in progress keeps its style.
    pub fn set_settings(&mut self, settings: ToolSettings) {
        self.settings = settings;
    }

    /// Select the drawing tool.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.settings = self.settings.with_tool(tool);
    }

    /// The selected object, if it still exists.
    pub fn selected(&self) -> Option<&CanvasObject> {
        self.selection.as_deref().and_then(|id| self.state.object(id))
    }

    pub fn select(&mut self, id: &str) -> EditResult<()> {
        if self.state.object(id).is_none() {
            return Err(EditError::NotFound(id.to_string()));
        }
        self.selection = Some(id.to_string());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// The stroke being drawn, for live rendering.
    pub fn active_stroke(&self) -> Option<&Stroke> {
        self.tools.active_stroke()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Press: grab the object under the pointer, or start a stroke on empty
    /// canvas.
    pub fn pointer_down(&mut self, point: Point) {
        if self.read_only {
            return;
        }

        if let Some(hit) = self.state.object_at(point) {
            self.selection = Some(hit.id.clone());
            self.drag = Some(DragState {
                object_id: hit.id.clone(),
                start: point,
                origin: hit.position,
            });
            return;
        }

        self.selection = None;
        self.tools.begin(point, &self.settings);
    }

    /// Move: drag the grabbed object or extend the stroke.
    /// Returns true if a new snapshot was committed.
    pub fn pointer_move(&mut self, point: Point) -> bool {
        if let Some(drag) = &self.drag {
            let target = drag.origin + (point - drag.start);
            let id = drag.object_id.clone();
            return self.drag_to(&id, target);
        }
        self.tools.add_point(point);
        false
    }

    /// Release: end the drag or commit the finished stroke.
    /// Returns true if a new snapshot was committed.
    pub fn pointer_up(&mut self) -> bool {
        if self.drag.take().is_some() {
            return false;
        }
        match self.tools.finish() {
            Some(stroke) => {
                log::debug!("Stroke {} finished with {} points", stroke.id, stroke.len());
                let next = self.state.with_stroke(stroke);
                self.commit(next);
                true
            }
            None => false,
        }
    }

    /// Abandon a drag or stroke in progress. A dragged object stays where it
    /// was last committed.
    pub fn cancel(&mut self) {
        self.drag = None;
        self.tools.cancel();
    }

    /// Add an object of `object_type` at the canvas center and select it.
    pub fn add_object(&mut self, object_type: ObjectType) -> EditResult<ObjectId> {
        let center = self.state.canvas.center();
        self.add_object_at(object_type, center, Size::new(NEW_OBJECT_SIZE, NEW_OBJECT_SIZE))
    }

    /// Add an object of `object_type` at `position` and select it.
    ///
    /// Overlapping objects are displaced. The new object is drawn above the
    /// existing ones.
    pub fn add_object_at(
        &mut self,
        object_type: ObjectType,
        position: Position,
        size: Size,
    ) -> EditResult<ObjectId> {
        self.ensure_editable()?;
        let z_index = i32::try_from(self.state.objects.len()).unwrap_or(i32::MAX);
        let object = create_object(
            object_type,
            position,
            size,
            &self.state.canvas,
            ObjectOverrides::new()
                .z_index(z_index)
                .kind(self.settings.object_kind(object_type)),
        );
        let id = object.id.clone();
        log::debug!("Adding {} {} at ({}, {})", object_type, id, object.position.x, object.position.y);

        let mut objects = resolve_overlap(&object, &self.state.objects, self.state.grid_size());
        objects.push(object);
        let next = self.state.with_objects(objects);
        self.commit(next);
        self.selection = Some(id.clone());
        Ok(id)
    }

    /// Place a tool button for `tool`.
    pub fn add_tool_button(&mut self, tool: ToolKind, position: Position) -> EditResult<ObjectId> {
        self.ensure_editable()?;
        let button = create_tool_button(position, tool, &self.state.canvas);
        let id = button.id.clone();
        let next = self.state.with_tool_button(button);
        self.commit(next);
        Ok(id)
    }

    /// Replace an object with an edited copy (property panel).
    ///
    /// The edited geometry is snapped and kept inside the canvas like any
    /// other placement, and the objects it now covers are displaced.
    pub fn update_object(&mut self, object: CanvasObject) -> EditResult<()> {
        self.ensure_editable()?;
        if self.state.object(&object.id).is_none() {
            return Err(EditError::NotFound(object.id));
        }
        let grid = self.state.grid_size();
        let (position, size) = bound_to_canvas(
            snap_position(object.position, grid),
            snap_size(object.size, grid),
            self.state.canvas.size(),
            grid,
        );
        let mut placed = CanvasObject {
            position,
            size,
            rotation: normalize_rotation(object.rotation),
            ..object
        };
        placed.touch();
        self.commit_placed(placed);
        Ok(())
    }

    /// Remove an object.
    pub fn delete_object(&mut self, id: &str) -> EditResult<CanvasObject> {
        self.ensure_editable()?;
        let removed = self
            .state
            .object(id)
            .cloned()
            .ok_or_else(|| EditError::NotFound(id.to_string()))?;
        if self.selection.as_deref() == Some(id) {
            self.selection = None;
        }
        if self.drag.as_ref().is_some_and(|d| d.object_id == id) {
            self.drag = None;
        }
        let next = self.state.without_object(id);
        self.commit(next);
        Ok(removed)
    }

    /// Resize the selected object and displace what it now covers.
    pub fn resize_selected(&mut self, size: Size) -> EditResult<()> {
        self.ensure_editable()?;
        let current = self.selected().ok_or(EditError::NothingSelected)?;
        let resized = resize_object(current, size, &self.state.canvas);
        self.commit_placed(resized);
        Ok(())
    }

    /// Rotate the selected object to `degrees`.
    pub fn rotate_selected(&mut self, degrees: f64) -> EditResult<()> {
        self.ensure_editable()?;
        let current = self.selected().ok_or(EditError::NothingSelected)?;
        let rotated = rotate_object(current, degrees);
        let next = self.state.with_object_replaced(rotated);
        self.commit(next);
        Ok(())
    }

    /// Swap in a state from outside the session (load, import, restore,
    /// sync). Allowed on read-only sessions.
    pub fn replace_state(&mut self, state: CanvasState) {
        self.drag = None;
        self.state = Arc::new(state);
        if self.selected().is_none() {
            self.selection = None;
        }
        self.version += 1;
    }

    fn drag_to(&mut self, id: &str, target: Position) -> bool {
        let Some(current) = self.state.object(id) else {
            self.drag = None;
            return false;
        };
        let moved = move_object(current, target, &self.state.canvas);
        if moved.position == current.position {
            return false;
        }
        self.commit_placed(moved);
        true
    }

    /// Commit `placed` in place of its previous version, displacing the
    /// objects it collides with.
    fn commit_placed(&mut self, placed: CanvasObject) {
        let objects = resolve_overlap(&placed, &self.state.objects, self.state.grid_size())
            .into_iter()
            .map(|o| if o.id == placed.id { placed.clone() } else { o })
            .collect();
        let next = self.state.with_objects(objects);
        self.commit(next);
    }

    fn commit(&mut self, next: CanvasState) {
        self.state = Arc::new(next.touched());
        self.version += 1;
    }

    fn ensure_editable(&self) -> EditResult<()> {
        if self.read_only {
            Err(EditError::ReadOnly)
        } else {
            Ok(())
        }
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(CanvasState::new(), ToolSettings::default())
    }
}
