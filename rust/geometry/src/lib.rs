// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! SceneBake Geometry
//!
//! Incremental builders that turn a nested traversal into one flattened,
//! material-grouped triangle scene: the transform and document stacks, the
//! material cache, per-element mesh accumulation and scene assembly.

pub mod error;
pub mod material;
pub mod mesh;
pub mod scene;
pub mod stack;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix4, Point3, Vector3};

pub use error::{Error, Result};
pub use material::{
    AlphaMode, MaterialCache, MaterialDescriptor, MaterialId, MaterialKey, MetallicRoughness,
    DEFAULT_MATERIAL_KEY,
};
pub use mesh::{remap_axes, MeshAccumulator, Primitive};
pub use scene::{OutputScene, SceneAssembler, SceneMesh, SceneNode};
pub use stack::{DocumentStack, FrameStack, TransformStack};
