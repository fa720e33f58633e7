// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for host scene loading and traversal.

use thiserror::Error;

/// Result type for host-side operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading or replaying a recorded host scene
#[derive(Error, Debug)]
pub enum Error {
    #[error("Link '{link}' references unknown document '{document}'")]
    UnknownDocument { link: String, document: String },

    #[error("Scene records more than one document titled '{0}'")]
    DuplicateDocument(String),

    #[error("Scene has no root document named '{0}'")]
    MissingRootDocument(String),

    #[error("Scene has no active view")]
    NoActiveView,

    #[error("Scene JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
