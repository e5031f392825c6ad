//! Tool button objects: movable on-canvas buttons that select a drawing tool.

use serde::{Deserialize, Serialize};

use crate::tools::ToolKind;

/// Edge length of a tool button.
pub const TOOL_BUTTON_SIZE: f64 = 60.0;

/// Tool buttons stack above regular objects.
pub const TOOL_BUTTON_Z_INDEX: i32 = 1000;

/// Fields carried by a tool button object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolButtonProps {
    pub tool_type: ToolKind,
}

impl ToolButtonProps {
    pub fn new(tool_type: ToolKind) -> Self {
        Self { tool_type }
    }
}
