// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-element mesh accumulation.
//!
//! A [`MeshAccumulator`] collects every polymesh batch reported for one
//! element and buckets triangles by the material active for that batch.
//! Positions are baked into output space on arrival: host transform first,
//! then the axis remap, then the unit scale, all in f64 before narrowing.

use crate::error::{Error, Result};
use crate::material::MaterialId;
use nalgebra::{Matrix4, Point3};
use rustc_hash::FxHashMap;
use scenebake_core::{ElementId, PolymeshFacet, PolymeshTopology};

/// Map a source point into the output frame: (x, y, z) -> (y, z, x)
#[inline]
pub fn remap_axes(p: &Point3<f64>) -> [f64; 3] {
    [p.y, p.z, p.x]
}

/// Indexed triangles sharing one material
#[derive(Debug, Clone)]
pub struct Primitive {
    pub material: MaterialId,
    /// Vertex positions (x, y, z)
    pub positions: Vec<f32>,
    /// Triangle indices (i0, i1, i2), in source winding order
    pub indices: Vec<u32>,
    /// Bit pattern of a position -> its vertex index
    vertex_lookup: FxHashMap<[u32; 3], u32>,
}

impl Primitive {
    pub fn new(material: MaterialId) -> Self {
        Self {
            material,
            positions: Vec::new(),
            indices: Vec::new(),
            vertex_lookup: FxHashMap::default(),
        }
    }

    /// Add a vertex, reusing the index of an identical position
    #[inline]
    pub fn add_vertex(&mut self, position: [f32; 3]) -> u32 {
        let bits = [
            position[0].to_bits(),
            position[1].to_bits(),
            position[2].to_bits(),
        ];
        if let Some(&index) = self.vertex_lookup.get(&bits) {
            return index;
        }
        let index = self.vertex_count() as u32;
        self.positions.extend_from_slice(&position);
        self.vertex_lookup.insert(bits, index);
        index
    }

    /// Add a triangle by corner positions, keeping corner order
    #[inline]
    pub fn add_triangle(&mut self, a: [f32; 3], b: [f32; 3], c: [f32; 3]) {
        let i0 = self.add_vertex(a);
        let i1 = self.add_vertex(b);
        let i2 = self.add_vertex(c);
        self.indices.push(i0);
        self.indices.push(i1);
        self.indices.push(i2);
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[inline]
    pub fn position(&self, index: u32) -> [f32; 3] {
        let i = index as usize * 3;
        [self.positions[i], self.positions[i + 1], self.positions[i + 2]]
    }

    /// Triangles as corner positions
    pub fn triangles(&self) -> impl Iterator<Item = [[f32; 3]; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|t| [self.position(t[0]), self.position(t[1]), self.position(t[2])])
    }

    /// Calculate bounds (min, max)
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        if self.positions.is_empty() {
            return None;
        }

        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        self.positions.chunks_exact(3).for_each(|chunk| {
            for axis in 0..3 {
                min[axis] = min[axis].min(chunk[axis]);
                max[axis] = max[axis].max(chunk[axis]);
            }
        });

        Some((min, max))
    }
}

/// In-progress geometry of one element
#[derive(Debug, Clone)]
pub struct MeshAccumulator {
    element: ElementId,
    unit_scale: f64,
    primitives: Vec<Primitive>,
    by_material: FxHashMap<MaterialId, usize>,
}

impl MeshAccumulator {
    pub fn new(element: ElementId) -> Self {
        Self::with_unit_scale(element, 1.0)
    }

    /// Accumulator that multiplies output positions by `unit_scale`
    pub fn with_unit_scale(element: ElementId, unit_scale: f64) -> Self {
        Self {
            element,
            unit_scale,
            primitives: Vec::new(),
            by_material: FxHashMap::default(),
        }
    }

    #[inline]
    pub fn element(&self) -> ElementId {
        self.element
    }

    /// Mesh name derived from the element id
    pub fn name(&self) -> String {
        self.element.to_string()
    }

    /// Primitive for `material`, created on first use
    pub fn use_primitive(&mut self, material: MaterialId) -> &mut Primitive {
        let slot = match self.by_material.get(&material) {
            Some(&slot) => slot,
            None => {
                let slot = self.primitives.len();
                self.primitives.push(Primitive::new(material));
                self.by_material.insert(material, slot);
                slot
            }
        };
        &mut self.primitives[slot]
    }

    /// Bake one polymesh batch into the primitive for `material`.
    ///
    /// Every facet becomes one triangle with its corner order untouched.
    /// Facets are validated before anything is added, so a malformed batch
    /// leaves the accumulator unchanged. Returns the number of triangles added.
    pub fn add_polymesh(
        &mut self,
        polymesh: &PolymeshTopology,
        transform: &Matrix4<f64>,
        material: MaterialId,
    ) -> Result<usize> {
        let point_count = polymesh.points.len();
        if let Some(index) = polymesh
            .facets
            .iter()
            .flat_map(PolymeshFacet::indices)
            .find(|&i| i >= point_count)
        {
            return Err(Error::FacetIndexOutOfRange { index, point_count });
        }

        if polymesh.facets.is_empty() {
            return Ok(0);
        }

        let scale = self.unit_scale;
        let vertices: Vec<[f32; 3]> = polymesh
            .points
            .iter()
            .map(|p| {
                let world = transform.transform_point(p);
                let [x, y, z] = remap_axes(&world);
                [(x * scale) as f32, (y * scale) as f32, (z * scale) as f32]
            })
            .collect();

        let primitive = self.use_primitive(material);
        for facet in &polymesh.facets {
            primitive.add_triangle(vertices[facet.v1], vertices[facet.v2], vertices[facet.v3]);
        }

        Ok(polymesh.facets.len())
    }

    /// True when no primitive holds a triangle
    pub fn is_empty(&self) -> bool {
        self.primitives.iter().all(Primitive::is_empty)
    }

    pub fn triangle_count(&self) -> usize {
        self.primitives.iter().map(Primitive::triangle_count).sum()
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    /// Finish the element, dropping primitives that never got a triangle
    pub fn into_primitives(self) -> Vec<Primitive> {
        self.primitives
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect()
    }
}
