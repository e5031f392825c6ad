//! Image object fields.

use serde::{Deserialize, Serialize};

/// Fields carried by an image object.
///
/// The image is referenced by URL (a file path, `data:` URL or remote URL);
/// fetching and decoding belong to the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageProps {
    pub image_url: String,
}
