// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Precondition failures reported to the user before any export work.

use scenebake_core::ViewKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShellError {
    #[error("No active document: '{0}' is not among the recorded documents")]
    NoActiveDocument(String),

    #[error("No active view: open a 3D view before exporting")]
    NoActiveView,

    #[error("The active view is a {0:?} view; export needs a 3D view")]
    NotThreeDView(ViewKind),

    #[error("Unit scale must be a positive finite number, got {0}")]
    InvalidUnitScale(f64),
}
