// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use scenebake_core::ElementId;
use thiserror::Error;

/// Result type for scene building operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building the flattened scene.
///
/// All of these mean the traversal driver broke its begin/end contract or
/// handed over malformed geometry; none are recoverable mid-export.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{stack} stack underflow: pop without matching push")]
    StackUnderflow { stack: &'static str },

    #[error("Facet references point {index} but polymesh has {point_count} points")]
    FacetIndexOutOfRange { index: usize, point_count: usize },

    #[error("Polymesh received outside of an element")]
    NoActiveElement,

    #[error("Element end for {found} while element {expected} is open")]
    ElementMismatch { expected: ElementId, found: ElementId },
}
