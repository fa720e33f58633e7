// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the export pipeline.

use thiserror::Error;

/// Result type for export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Export errors. Any of these aborts the whole export; a flattened scene
/// missing part of its nesting state is not a usable partial result.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Geometry(#[from] scenebake_geometry::Error),

    #[error(transparent)]
    Host(#[from] scenebake_core::Error),

    #[error("Traversal event received before start")]
    NotStarted,

    #[error("Export context was already started")]
    AlreadyStarted,

    #[error("Export has not finished")]
    NotFinished,

    #[error(
        "Unbalanced traversal at finish: transform depth {transform_depth}, \
         document depth {document_depth}, {open_elements} open elements"
    )]
    UnbalancedTraversal {
        transform_depth: usize,
        document_depth: usize,
        open_elements: usize,
    },

    #[error("glTF JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GLB container error: {0}")]
    Glb(#[from] gltf::Error),

    #[error("Binary buffer too large for glTF: {0} bytes")]
    BufferTooLarge(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
