// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Render node payloads passed to [`ExportContext`](crate::ExportContext) callbacks.

use crate::document::{DocumentHandle, ElementId};
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Affine host transform, column-vector convention (`p' = T * p`)
pub type Transform = Matrix4<f64>;

/// Answer to a Begin callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderNodeAction {
    /// Descend into the node's content
    Proceed,
    /// Do not descend; the matching End callback still arrives
    Skip,
}

/// Nested, transformed sub-tree within the same document
#[derive(Debug, Clone)]
pub struct InstanceNode {
    pub name: String,
    /// Transform relative to the enclosing frame
    pub transform: Transform,
}

/// Nested, transformed sub-tree rooted in another document
#[derive(Clone)]
pub struct LinkNode {
    pub name: String,
    /// Transform relative to the enclosing frame
    pub transform: Transform,
    pub document: DocumentHandle,
}

impl fmt::Debug for LinkNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkNode")
            .field("name", &self.name)
            .field("transform", &self.transform)
            .field("document", &self.document.title())
            .finish()
    }
}

/// Active-material change
#[derive(Debug, Clone)]
pub struct MaterialNode {
    pub name: String,
    /// [`ElementId::INVALID`] when geometry has no material assigned
    pub material_id: ElementId,
}

/// Triangle of point indices, in host winding order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolymeshFacet {
    pub v1: usize,
    pub v2: usize,
    pub v3: usize,
}

impl PolymeshFacet {
    pub const fn new(v1: usize, v2: usize, v3: usize) -> Self {
        Self { v1, v2, v3 }
    }

    #[inline]
    pub fn indices(&self) -> [usize; 3] {
        [self.v1, self.v2, self.v3]
    }
}

/// How normals in a [`PolymeshTopology`] are laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionOfNormals {
    #[default]
    AtEachPoint,
    OnePerFace,
    OnEachFacet,
}

/// One tessellated batch of geometry in the current local frame
#[derive(Debug, Clone, Default)]
pub struct PolymeshTopology {
    pub points: Vec<Point3<f64>>,
    pub facets: Vec<PolymeshFacet>,
    pub normals: Vec<Vector3<f64>>,
    pub distribution: DistributionOfNormals,
}

impl PolymeshTopology {
    pub fn new(points: Vec<Point3<f64>>, facets: Vec<PolymeshFacet>) -> Self {
        Self {
            points,
            facets,
            normals: Vec::new(),
            distribution: DistributionOfNormals::default(),
        }
    }

    #[inline]
    pub fn number_of_points(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn number_of_facets(&self) -> usize {
        self.facets.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FaceNode {
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct LightNode {
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct RpcNode {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ViewNode {
    pub name: String,
    pub view_id: ElementId,
}
