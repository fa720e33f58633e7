// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! SceneBake export pipeline.
//!
//! [`SceneExportContext`] consumes the host traversal protocol and builds a
//! flattened [`OutputScene`](scenebake_geometry::OutputScene);
//! [`GltfWriter`] serializes that scene as `.glb` or `.gltf` + `.bin`.
//!
//! ```rust,ignore
//! use scenebake_export::{run_export, ExportConfig, GltfWriter};
//!
//! let config = ExportConfig::from_env();
//! let export = run_export(&dump, config.clone())?;
//! let writer = GltfWriter::from_scene(&export.scene, &config.generator)?;
//! writer.save_glb("model.glb")?;
//! ```

pub mod config;
pub mod error;
pub mod handler;
pub mod writer;

pub use config::{ExportConfig, LengthUnit, FOOT_TO_METER};
pub use error::{Error, Result};
pub use handler::{run_export, ExportRun, ExportState, ExportSummary, SceneExportContext};
pub use writer::GltfWriter;
