// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! glTF 2.0 serialization of an [`OutputScene`].
//!
//! Every scene node becomes one glTF node with one mesh; every material
//! group of that mesh becomes one primitive with an f32 `POSITION` accessor
//! and u32 indices. All geometry shares a single binary buffer whose views
//! are 4-byte aligned.

use crate::error::{Error, Result};
use base64::Engine as _;
use gltf::json as gj;
use rustc_hash::FxHashMap;
use scenebake_geometry::{AlphaMode, MaterialDescriptor, MaterialId, OutputScene, Primitive};
use gltf::binary::{Glb, Header};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::Path;

/// GLB header plus one chunk header
const GLB_PREAMBLE: usize = 12 + 8;
const CHUNK_HEADER: usize = 8;

/// Serialized form of one exported scene
#[derive(Debug, Clone)]
pub struct GltfWriter {
    root: gj::Root,
    buffer: Vec<u8>,
}

impl GltfWriter {
    /// Encode `scene`, writing `generator` into `asset.generator`
    pub fn from_scene(scene: &OutputScene, generator: &str) -> Result<Self> {
        let mut encoder = Encoder::default();
        encoder.root.asset = gj::Asset {
            version: "2.0".to_string(),
            generator: Some(generator.to_string()),
            ..Default::default()
        };

        let materials = encoder.encode_materials(scene);
        let mut scene_nodes = Vec::with_capacity(scene.nodes.len());
        for node in &scene.nodes {
            let mesh = encoder.encode_mesh(&node.mesh.name, &node.mesh.primitives, &materials);
            let index = encoder.root.nodes.len() as u32;
            encoder.root.nodes.push(gj::Node {
                mesh: Some(gj::Index::new(mesh)),
                name: Some(node.name.clone()),
                ..gj::Node::default()
            });
            scene_nodes.push(gj::Index::new(index));
        }

        encoder.root.scenes.push(gj::Scene {
            name: Some(scene.name.clone()),
            nodes: scene_nodes,
            extensions: None,
            extras: gj::Extras::default(),
        });
        encoder.root.scene = Some(gj::Index::new(0));

        if !encoder.buffer.is_empty() {
            encoder.align();
            encoder.root.buffers.push(gj::Buffer {
                byte_length: gj::validation::USize64(encoder.buffer.len() as u64),
                name: None,
                uri: None,
                extensions: None,
                extras: gj::Extras::default(),
            });
        }

        tracing::debug!(
            nodes = encoder.root.nodes.len(),
            meshes = encoder.root.meshes.len(),
            materials = encoder.root.materials.len(),
            bytes = encoder.buffer.len(),
            "glTF document encoded"
        );

        Ok(Self {
            root: encoder.root,
            buffer: encoder.buffer,
        })
    }

    pub fn root(&self) -> &gj::Root {
        &self.root
    }

    /// Geometry bytes shared by every buffer view
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Binary glTF container: header, JSON chunk, optional BIN chunk
    pub fn to_glb(&self) -> Result<Vec<u8>> {
        let json = serde_json::to_vec(&self.root)?;
        let bin = (!self.buffer.is_empty()).then(|| Cow::Borrowed(self.buffer.as_slice()));

        let mut total = GLB_PREAMBLE + padded(json.len());
        if bin.is_some() {
            total += CHUNK_HEADER + padded(self.buffer.len());
        }
        let length = u32::try_from(total).map_err(|_| Error::BufferTooLarge(total))?;

        let glb = Glb {
            header: Header {
                magic: *b"glTF",
                version: 2,
                length,
            },
            json: Cow::Owned(json),
            bin,
        };
        Ok(glb.to_vec()?)
    }

    /// JSON glTF text.
    ///
    /// The buffer is referenced through `buffer_uri`, or embedded as a
    /// base64 data URI when `None`.
    pub fn to_gltf(&self, buffer_uri: Option<&str>) -> Result<String> {
        let mut root = self.root.clone();
        if let Some(buffer) = root.buffers.first_mut() {
            buffer.uri = Some(match buffer_uri {
                Some(uri) => uri.to_string(),
                None => format!(
                    "data:application/octet-stream;base64,{}",
                    base64::engine::general_purpose::STANDARD.encode(&self.buffer)
                ),
            });
        }
        Ok(serde_json::to_string_pretty(&root)?)
    }

    pub fn save_glb(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_glb()?)?;
        tracing::info!(path = %path.display(), "Wrote GLB");
        Ok(())
    }

    /// Write `path` and, unless `embed_buffers`, a sibling `.bin` file
    pub fn save_gltf(&self, path: impl AsRef<Path>, embed_buffers: bool) -> Result<()> {
        let path = path.as_ref();

        let json = if embed_buffers || self.buffer.is_empty() {
            self.to_gltf(None)?
        } else {
            let bin_path = path.with_extension("bin");
            let uri = bin_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "scene.bin".to_string());
            std::fs::write(&bin_path, &self.buffer)?;
            self.to_gltf(Some(&uri))?
        };

        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), embedded = embed_buffers, "Wrote glTF");
        Ok(())
    }
}

#[derive(Default)]
struct Encoder {
    root: gj::Root,
    buffer: Vec<u8>,
}

impl Encoder {
    fn align(&mut self) {
        let padding = (4 - self.buffer.len() % 4) % 4;
        self.buffer.resize(self.buffer.len() + padding, 0);
    }

    fn push_view(&mut self, data: &[u8], target: gj::buffer::Target) -> u32 {
        self.align();
        let offset = self.buffer.len();
        self.buffer.extend_from_slice(data);

        let index = self.root.buffer_views.len() as u32;
        self.root.buffer_views.push(gj::buffer::View {
            buffer: gj::Index::new(0),
            byte_offset: Some(gj::validation::USize64(offset as u64)),
            byte_length: gj::validation::USize64(data.len() as u64),
            byte_stride: None,
            target: Some(gj::validation::Checked::Valid(target)),
            name: None,
            extensions: None,
            extras: gj::Extras::default(),
        });
        index
    }

    fn push_accessor(
        &mut self,
        view: u32,
        count: usize,
        component_type: gj::accessor::ComponentType,
        type_: gj::accessor::Type,
        bounds: Option<([f32; 3], [f32; 3])>,
    ) -> u32 {
        let (min, max) = match bounds {
            Some((min, max)) => (Some(json_f32_array(&min)), Some(json_f32_array(&max))),
            None => (None, None),
        };

        let index = self.root.accessors.len() as u32;
        self.root.accessors.push(gj::Accessor {
            buffer_view: Some(gj::Index::new(view)),
            byte_offset: Some(gj::validation::USize64(0)),
            count: gj::validation::USize64(count as u64),
            component_type: gj::validation::Checked::Valid(gj::accessor::GenericComponentType(
                component_type,
            )),
            type_: gj::validation::Checked::Valid(type_),
            min,
            max,
            normalized: false,
            name: None,
            sparse: None,
            extensions: None,
            extras: gj::Extras::default(),
        });
        index
    }

    /// Write the used materials and map scene material ids to glTF indices
    fn encode_materials(&mut self, scene: &OutputScene) -> FxHashMap<MaterialId, u32> {
        let mut indices = FxHashMap::default();
        for id in scene.used_materials() {
            let Some(descriptor) = scene.material(id) else {
                continue;
            };
            indices.insert(id, self.root.materials.len() as u32);
            self.root.materials.push(material(descriptor));
        }
        indices
    }

    fn encode_mesh(
        &mut self,
        name: &str,
        primitives: &[Primitive],
        materials: &FxHashMap<MaterialId, u32>,
    ) -> u32 {
        let mut encoded = Vec::with_capacity(primitives.len());
        for primitive in primitives.iter().filter(|p| !p.is_empty()) {
            let positions: Vec<u8> = primitive
                .positions
                .iter()
                .flat_map(|v| v.to_le_bytes())
                .collect();
            let view = self.push_view(&positions, gj::buffer::Target::ArrayBuffer);
            let position_accessor = self.push_accessor(
                view,
                primitive.vertex_count(),
                gj::accessor::ComponentType::F32,
                gj::accessor::Type::Vec3,
                primitive.bounds(),
            );

            let indices: Vec<u8> = primitive
                .indices
                .iter()
                .flat_map(|i| i.to_le_bytes())
                .collect();
            let view = self.push_view(&indices, gj::buffer::Target::ElementArrayBuffer);
            let index_accessor = self.push_accessor(
                view,
                primitive.indices.len(),
                gj::accessor::ComponentType::U32,
                gj::accessor::Type::Scalar,
                None,
            );

            let mut attributes = BTreeMap::new();
            attributes.insert(
                gj::validation::Checked::Valid(gj::mesh::Semantic::Positions),
                gj::Index::new(position_accessor),
            );

            encoded.push(gj::mesh::Primitive {
                attributes,
                extensions: None,
                extras: gj::Extras::default(),
                indices: Some(gj::Index::new(index_accessor)),
                material: materials.get(&primitive.material).map(|&m| gj::Index::new(m)),
                mode: gj::validation::Checked::Valid(gj::mesh::Mode::Triangles),
                targets: None,
            });
        }

        let index = self.root.meshes.len() as u32;
        self.root.meshes.push(gj::Mesh {
            name: Some(name.to_string()),
            primitives: encoded,
            weights: None,
            extensions: None,
            extras: gj::Extras::default(),
        });
        index
    }
}

/// Chunk length rounded up to 4-byte alignment
#[inline]
fn padded(len: usize) -> usize {
    (len + 3) & !3
}

fn material(descriptor: &MaterialDescriptor) -> gj::Material {
    let alpha_mode = match descriptor.alpha_mode {
        AlphaMode::Opaque => gj::material::AlphaMode::Opaque,
        AlphaMode::Blend => gj::material::AlphaMode::Blend,
    };
    // Unset channels fall back to the glTF defaults
    let metallic = descriptor.metallic_roughness.metallic.unwrap_or(1.0);
    let roughness = descriptor.metallic_roughness.roughness.unwrap_or(1.0);

    gj::Material {
        name: Some(descriptor.name.clone()),
        alpha_cutoff: None,
        alpha_mode: gj::validation::Checked::Valid(alpha_mode),
        double_sided: descriptor.double_sided,
        pbr_metallic_roughness: gj::material::PbrMetallicRoughness {
            base_color_factor: gj::material::PbrBaseColorFactor(descriptor.base_color),
            base_color_texture: None,
            metallic_factor: gj::material::StrengthFactor(metallic),
            roughness_factor: gj::material::StrengthFactor(roughness),
            metallic_roughness_texture: None,
            extensions: None,
            extras: gj::Extras::default(),
        },
        normal_texture: None,
        occlusion_texture: None,
        emissive_texture: None,
        emissive_factor: gj::material::EmissiveFactor([0.0, 0.0, 0.0]),
        extensions: None,
        extras: gj::Extras::default(),
    }
}

fn json_f32_array(values: &[f32; 3]) -> gj::Value {
    gj::Value::Array(values.iter().map(|&v| gj::Value::from(v)).collect())
}
