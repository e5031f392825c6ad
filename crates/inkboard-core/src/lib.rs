//! Inkboard Core Library
//!
//! Platform-agnostic core of the Inkboard whiteboard: grid snapping, the
//! canvas object model, overlap resolution, persistence and file-based sync
//! between an admin and a view window.

pub mod canvas;
pub mod config;
pub mod dialog;
pub mod editor;
pub mod overlap;
pub mod shapes;
pub mod snap;
pub mod storage;
pub mod sync;
pub mod timestamp;
pub mod tools;

pub use canvas::{CanvasConfig, CanvasState};
pub use config::{StorageConfig, StorageConfigPatch};
pub use dialog::FileDialog;
pub use editor::{EditError, EditResult, EditorSession};
pub use overlap::{collides, resolve_overlap};
pub use shapes::{CanvasObject, ObjectId, ObjectKind, ObjectType, OverlapRule, Stroke, create_object};
pub use snap::{GRID_SIZE, bound_to_canvas, snap_position, snap_size, snap_to_grid};
pub use storage::{AutoSaveManager, FileStorage, Persistence, SaveStatus, Storage, StorageError};
pub use sync::{
    ResolutionStrategy, StateSource, SyncConflict, SyncEngine, SyncError, SyncOutcome, detect_conflict,
    merge_states, resolve_conflict,
};
pub use tools::{ToolKind, ToolManager, ToolSettings};
