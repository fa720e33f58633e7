// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # SceneBake Core
//!
//! Host-side surface of the SceneBake exporter: the scene-graph traversal
//! callback protocol a CAD host drives, the document lookups the protocol
//! resolves against, and a reference driver that replays a recorded host
//! scene through any [`ExportContext`].
//!
//! ## Overview
//!
//! - **Documents**: [`Document`] answers element and material lookups by
//!   [`ElementId`]. Ids only mean something inside their owning document.
//! - **Render nodes**: payloads handed to each callback ([`InstanceNode`],
//!   [`LinkNode`], [`MaterialNode`], [`PolymeshTopology`], ...).
//! - **Protocol**: [`ExportContext`] has one method per traversal event.
//! - **Driver**: [`drive`] walks a [`SceneDump`] depth-first and emits the
//!   begin/end sequence in host order.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use scenebake_core::{drive, SceneDump};
//!
//! let dump = SceneDump::from_json(&std::fs::read_to_string("scene.json")?)?;
//! let outcome = drive(&dump, &mut my_context)?;
//! ```

pub mod context;
pub mod document;
pub mod driver;
pub mod dump;
pub mod error;
pub mod nodes;

pub use context::ExportContext;
pub use document::{
    Category, Document, DocumentHandle, ElementId, ElementInfo, InMemoryDocument, MaterialInfo,
    Rgb8,
};
pub use driver::{drive, drive_with_documents, DriveOutcome};
pub use dump::{DumpNode, HostTransform, SceneDump, ViewInfo, ViewKind};
pub use error::{Error, Result};
pub use nodes::{
    DistributionOfNormals, FaceNode, InstanceNode, LightNode, LinkNode, MaterialNode,
    PolymeshFacet, PolymeshTopology, RenderNodeAction, RpcNode, Transform, ViewNode,
};
