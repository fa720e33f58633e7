// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Recorded host scenes.
//!
//! A [`SceneDump`] captures what a host exposes during one export: its
//! documents (element and material tables), the active view, and the view's
//! scene graph as nested nodes. The JSON form looks like:
//!
//! ```json
//! {
//!   "root_document": "Project",
//!   "documents": [{ "title": "Project", "elements": [], "materials": [] }],
//!   "active_view": {
//!     "id": 100, "name": "{3D}", "kind": "three_d",
//!     "nodes": [{ "type": "element", "id": 1, "children": [] }]
//!   }
//! }
//! ```

use crate::document::{DocumentHandle, ElementId, ElementInfo, InMemoryDocument, MaterialInfo};
use crate::error::{Error, Result};
use crate::nodes::{DistributionOfNormals, PolymeshFacet, PolymeshTopology, Transform};
use nalgebra::{Point3, Vector3};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Recorded host scene
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDump {
    /// Title of the document the export was invoked on
    pub root_document: String,
    #[serde(default)]
    pub documents: Vec<DocumentDump>,
    #[serde(default)]
    pub active_view: Option<ViewInfo>,
}

/// Element and material tables of one document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentDump {
    pub title: String,
    #[serde(default)]
    pub elements: Vec<ElementInfo>,
    #[serde(default)]
    pub materials: Vec<MaterialInfo>,
}

/// Kind of host view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    ThreeD,
    FloorPlan,
    CeilingPlan,
    Elevation,
    Section,
    Sheet,
    Schedule,
}

/// Active view and the scene graph it exposes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewInfo {
    pub id: ElementId,
    #[serde(default)]
    pub name: String,
    pub kind: ViewKind,
    #[serde(default)]
    pub nodes: Vec<DumpNode>,
}

/// Host transform as origin plus basis vectors. Omitted fields keep their
/// identity value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostTransform {
    pub origin: [f64; 3],
    pub basis_x: [f64; 3],
    pub basis_y: [f64; 3],
    pub basis_z: [f64; 3],
}

impl Default for HostTransform {
    fn default() -> Self {
        Self {
            origin: [0.0, 0.0, 0.0],
            basis_x: [1.0, 0.0, 0.0],
            basis_y: [0.0, 1.0, 0.0],
            basis_z: [0.0, 0.0, 1.0],
        }
    }
}

impl HostTransform {
    /// Build the 4x4 matrix whose columns are the basis vectors and origin
    pub fn to_matrix(&self) -> Transform {
        let mut m = Transform::identity();
        for row in 0..3 {
            m[(row, 0)] = self.basis_x[row];
            m[(row, 1)] = self.basis_y[row];
            m[(row, 2)] = self.basis_z[row];
            m[(row, 3)] = self.origin[row];
        }
        m
    }
}

fn invalid_id() -> ElementId {
    ElementId::INVALID
}

/// Node of a recorded scene graph
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DumpNode {
    Element {
        id: ElementId,
        #[serde(default)]
        children: Vec<DumpNode>,
    },
    Instance {
        #[serde(default)]
        name: String,
        #[serde(default)]
        transform: HostTransform,
        #[serde(default)]
        children: Vec<DumpNode>,
    },
    Link {
        #[serde(default)]
        name: String,
        #[serde(default)]
        transform: HostTransform,
        /// Title of the linked document
        document: String,
        #[serde(default)]
        children: Vec<DumpNode>,
    },
    Material {
        #[serde(default)]
        name: String,
        #[serde(default = "invalid_id")]
        material_id: ElementId,
    },
    Polymesh {
        points: Vec<[f64; 3]>,
        facets: Vec<[usize; 3]>,
        #[serde(default)]
        normals: Vec<[f64; 3]>,
        #[serde(default)]
        distribution: DistributionOfNormals,
    },
    Face {
        #[serde(default)]
        name: String,
        #[serde(default)]
        children: Vec<DumpNode>,
    },
    Light {
        #[serde(default)]
        name: String,
    },
    Rpc {
        #[serde(default)]
        name: String,
    },
}

impl DumpNode {
    /// Convert a recorded polymesh into the callback payload
    pub(crate) fn to_polymesh(
        points: &[[f64; 3]],
        facets: &[[usize; 3]],
        normals: &[[f64; 3]],
        distribution: DistributionOfNormals,
    ) -> PolymeshTopology {
        PolymeshTopology {
            points: points.iter().map(|p| Point3::new(p[0], p[1], p[2])).collect(),
            facets: facets
                .iter()
                .map(|f| PolymeshFacet::new(f[0], f[1], f[2]))
                .collect(),
            normals: normals.iter().map(|n| Vector3::new(n[0], n[1], n[2])).collect(),
            distribution,
        }
    }
}

impl DocumentDump {
    fn open(&self) -> DocumentHandle {
        let mut doc = InMemoryDocument::new(self.title.clone());
        for element in &self.elements {
            doc.insert_element(element.clone());
        }
        for material in &self.materials {
            doc.insert_material(material.clone());
        }
        doc.into_handle()
    }
}

impl SceneDump {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Materialize every recorded document, keyed by title.
    ///
    /// Links name their target by title, so titles must be unique.
    pub fn open_documents(&self) -> Result<FxHashMap<String, DocumentHandle>> {
        let mut documents = FxHashMap::default();
        for dump in &self.documents {
            if documents.contains_key(&dump.title) {
                return Err(Error::DuplicateDocument(dump.title.clone()));
            }
            documents.insert(dump.title.clone(), dump.open());
        }
        Ok(documents)
    }

    /// The document the export was invoked on
    pub fn root(&self, documents: &FxHashMap<String, DocumentHandle>) -> Result<DocumentHandle> {
        documents
            .get(&self.root_document)
            .cloned()
            .ok_or_else(|| Error::MissingRootDocument(self.root_document.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn host_transform_columns() {
        let t = HostTransform {
            origin: [10.0, 20.0, 30.0],
            basis_x: [0.0, 1.0, 0.0],
            basis_y: [-1.0, 0.0, 0.0],
            basis_z: [0.0, 0.0, 1.0],
        };
        let p = t.to_matrix().transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.x, 10.0);
        assert_relative_eq!(p.y, 21.0);
        assert_relative_eq!(p.z, 30.0);
    }

    #[test]
    fn default_transform_is_identity() {
        assert_eq!(HostTransform::default().to_matrix(), Transform::identity());
    }

    #[test]
    fn parse_scene_json() {
        let json = r#"{
            "root_document": "Project",
            "documents": [{
                "title": "Project",
                "elements": [{ "id": 1, "category": { "name": "Walls" } }],
                "materials": [{ "id": 5, "unique_id": "m5", "color": { "red": 255, "green": 0, "blue": 0 } }]
            }],
            "active_view": {
                "id": 100,
                "kind": "three_d",
                "nodes": [
                    { "type": "element", "id": 1, "children": [
                        { "type": "material" },
                        { "type": "polymesh", "points": [[0,0,0],[1,0,0],[0,1,0]], "facets": [[0,1,2]] }
                    ]}
                ]
            }
        }"#;

        let dump = SceneDump::from_json(json).unwrap();
        let view = dump.active_view.as_ref().unwrap();
        assert_eq!(view.kind, ViewKind::ThreeD);
        match &view.nodes[0] {
            DumpNode::Element { id, children } => {
                assert_eq!(*id, ElementId(1));
                match &children[0] {
                    DumpNode::Material { material_id, .. } => {
                        assert_eq!(*material_id, ElementId::INVALID)
                    }
                    other => panic!("unexpected node {:?}", other),
                }
            }
            other => panic!("unexpected node {:?}", other),
        }

        let docs = dump.open_documents().unwrap();
        let root = dump.root(&docs).unwrap();
        assert_eq!(root.material(ElementId(5)).unwrap().transparency, 0);
        assert_eq!(root.element(ElementId(1)).unwrap().category.unwrap().name, "Walls");
    }

    #[test]
    fn missing_root_document() {
        let dump = SceneDump {
            root_document: "Nope".into(),
            documents: Vec::new(),
            active_view: None,
        };
        let docs = dump.open_documents().unwrap();
        assert!(matches!(dump.root(&docs), Err(Error::MissingRootDocument(_))));
    }

    #[test]
    fn duplicate_document_titles_are_rejected() {
        let json = r#"{
            "root_document": "Project",
            "documents": [
                { "title": "Project" },
                { "title": "Shared", "elements": [{ "id": 1 }] },
                { "title": "Shared", "elements": [{ "id": 2 }] }
            ]
        }"#;
        let dump = SceneDump::from_json(json).unwrap();
        match dump.open_documents() {
            Err(Error::DuplicateDocument(title)) => assert_eq!(title, "Shared"),
            other => panic!("unexpected result {:?}", other.map(|d| d.len())),
        }
    }
}
