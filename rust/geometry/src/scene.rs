// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Flattened output scene and its incremental assembly.
//!
//! Every committed element becomes one node holding one mesh. Nodes are
//! appended in element-completion order and carry no hierarchy; instance
//! and link nesting is already baked into the vertex positions.

use crate::material::{MaterialCache, MaterialDescriptor, MaterialId};
use crate::mesh::{MeshAccumulator, Primitive};
use rustc_hash::FxHashSet;
use scenebake_core::ElementId;

/// Mesh of one node: material-grouped indexed triangles
#[derive(Debug, Clone)]
pub struct SceneMesh {
    pub name: String,
    pub primitives: Vec<Primitive>,
}

impl SceneMesh {
    pub fn triangle_count(&self) -> usize {
        self.primitives.iter().map(Primitive::triangle_count).sum()
    }

    pub fn vertex_count(&self) -> usize {
        self.primitives.iter().map(Primitive::vertex_count).sum()
    }
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    /// Element the node was built from
    pub element: ElementId,
    pub mesh: SceneMesh,
}

/// Finished, flattened export result
#[derive(Debug, Clone)]
pub struct OutputScene {
    pub name: String,
    /// Every material resolved during the export, indexed by [`MaterialId`]
    pub materials: Vec<MaterialDescriptor>,
    pub nodes: Vec<SceneNode>,
}

impl OutputScene {
    #[inline]
    pub fn material(&self, id: MaterialId) -> Option<&MaterialDescriptor> {
        self.materials.get(id.0)
    }

    pub fn triangle_count(&self) -> usize {
        self.nodes.iter().map(|n| n.mesh.triangle_count()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Materials referenced by at least one primitive, in first-use order
    pub fn used_materials(&self) -> Vec<MaterialId> {
        let mut seen = FxHashSet::default();
        self.nodes
            .iter()
            .flat_map(|n| n.mesh.primitives.iter().map(|p| p.material))
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

/// Builds the node list of an [`OutputScene`] one element at a time
#[derive(Debug, Clone)]
pub struct SceneAssembler {
    name: String,
    nodes: Vec<SceneNode>,
}

impl SceneAssembler {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
        }
    }

    /// Append a node for `accumulator` if it holds any triangle.
    ///
    /// Returns the new node's index, or `None` when the accumulator was
    /// empty and has been discarded.
    pub fn commit(&mut self, accumulator: MeshAccumulator) -> Option<usize> {
        if accumulator.is_empty() {
            return None;
        }

        let element = accumulator.element();
        let name = accumulator.name();
        let primitives = accumulator.into_primitives();

        let index = self.nodes.len();
        self.nodes.push(SceneNode {
            name: name.clone(),
            element,
            mesh: SceneMesh { name, primitives },
        });
        Some(index)
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    /// Freeze the scene together with the materials it references
    pub fn finish(self, materials: &MaterialCache) -> OutputScene {
        OutputScene {
            name: self.name,
            materials: materials.descriptors().to_vec(),
            nodes: self.nodes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Matrix4, Point3};
    use scenebake_core::{MaterialInfo, PolymeshFacet, PolymeshTopology, Rgb8};

    fn triangle() -> PolymeshTopology {
        PolymeshTopology::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![PolymeshFacet::new(0, 1, 2)],
        )
    }

    #[test]
    fn empty_accumulator_is_dropped() {
        let mut assembler = SceneAssembler::new("Default");
        assert_eq!(assembler.commit(MeshAccumulator::new(ElementId(1))), None);
        assert_eq!(assembler.node_count(), 0);
    }

    #[test]
    fn nodes_follow_commit_order() {
        let mut assembler = SceneAssembler::new("Default");
        for id in [30, 10, 20] {
            let mut acc = MeshAccumulator::new(ElementId(id));
            acc.add_polymesh(&triangle(), &Matrix4::identity(), MaterialId::DEFAULT)
                .unwrap();
            assembler.commit(acc);
        }

        let names: Vec<_> = assembler.nodes().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["30", "10", "20"]);

        let scene = assembler.finish(&MaterialCache::new());
        assert_eq!(scene.nodes.len(), 3);
        assert_eq!(scene.triangle_count(), 3);
        assert_eq!(scene.nodes[0].element, ElementId(30));
        assert_eq!(scene.nodes[0].mesh.name, "30");
    }

    #[test]
    fn used_materials_in_first_use_order() {
        let mut cache = MaterialCache::new();
        let glass = cache.insert(&MaterialInfo {
            id: ElementId(5),
            unique_id: "glass".into(),
            name: "Glass".into(),
            color: Rgb8::new(0, 0, 255),
            transparency: 10,
        });

        let mut assembler = SceneAssembler::new("Default");
        let mut acc = MeshAccumulator::new(ElementId(1));
        acc.add_polymesh(&triangle(), &Matrix4::identity(), glass)
            .unwrap();
        acc.add_polymesh(&triangle(), &Matrix4::identity(), MaterialId::DEFAULT)
            .unwrap();
        assembler.commit(acc);

        let scene = assembler.finish(&cache);
        assert_eq!(scene.used_materials(), vec![glass, MaterialId::DEFAULT]);
        assert_eq!(scene.material(glass).unwrap().name, "Glass");
    }
}
