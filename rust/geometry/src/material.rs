// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Material cache: one descriptor per stable material key, built lazily.
//!
//! Descriptors live in an append-only table and are referred to by
//! [`MaterialId`]. Slot 0 is the default material, present from the start.
//!
//! Two maps sit in front of the table:
//! - `by_element`: (document, element id) to slot, so a host material is
//!   looked up in its document at most once per export. Documents are
//!   pinned by the cache for its whole lifetime, so a slot never refers to
//!   a document that was dropped and replaced;
//! - `by_key`: stable key to slot, so the same material reached through
//!   different ids or documents shares one descriptor.

use rustc_hash::FxHashMap;
use scenebake_core::{DocumentHandle, ElementId, MaterialInfo};
use std::fmt;
use std::sync::Arc;

/// Name of the default material
pub const DEFAULT_MATERIAL_KEY: &str = "Default";

/// Gray used for geometry without a material
const DEFAULT_BASE_COLOR: [f32; 4] = [0.5, 0.5, 0.5, 1.0];

/// Host transparency value meaning fully transparent
const MAX_TRANSPARENCY: f32 = 128.0;

/// Stable material identifier.
///
/// The default material has its own variant, so no host unique id can
/// collide with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MaterialKey {
    Default,
    /// The host's unique id
    Host(String),
}

impl MaterialKey {
    pub fn new(key: impl Into<String>) -> Self {
        MaterialKey::Host(key.into())
    }

    pub fn default_key() -> Self {
        MaterialKey::Default
    }

    #[inline]
    pub fn is_default(&self) -> bool {
        matches!(self, MaterialKey::Default)
    }

    pub fn as_str(&self) -> &str {
        match self {
            MaterialKey::Default => DEFAULT_MATERIAL_KEY,
            MaterialKey::Host(key) => key,
        }
    }
}

impl fmt::Display for MaterialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Slot of a descriptor in a [`MaterialCache`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub usize);

impl MaterialId {
    pub const DEFAULT: MaterialId = MaterialId(0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlphaMode {
    Opaque,
    Blend,
}

/// Metallic/roughness channel. Declared on every material, never populated
/// from host data, so writers fall back to format defaults.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MetallicRoughness {
    pub metallic: Option<f32>,
    pub roughness: Option<f32>,
}

/// Derived visual properties of one material
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialDescriptor {
    pub key: MaterialKey,
    pub name: String,
    /// Linear RGBA, each channel in [0, 1]
    pub base_color: [f32; 4],
    pub double_sided: bool,
    pub alpha_mode: AlphaMode,
    pub metallic_roughness: MetallicRoughness,
}

impl MaterialDescriptor {
    /// The material used when geometry has none
    pub fn default_material() -> Self {
        Self {
            key: MaterialKey::default_key(),
            name: DEFAULT_MATERIAL_KEY.to_string(),
            base_color: DEFAULT_BASE_COLOR,
            double_sided: true,
            alpha_mode: AlphaMode::Opaque,
            metallic_roughness: MetallicRoughness::default(),
        }
    }

    /// Derive a descriptor from host material properties.
    ///
    /// Nonzero transparency selects blending with alpha `1 - t/128`.
    pub fn from_host(info: &MaterialInfo) -> Self {
        let channel = |c: u8| f32::from(c) / 255.0;

        let (alpha, alpha_mode) = if info.transparency != 0 {
            let t = f32::from(info.transparency).min(MAX_TRANSPARENCY);
            (1.0 - t / MAX_TRANSPARENCY, AlphaMode::Blend)
        } else {
            (1.0, AlphaMode::Opaque)
        };

        let name = if info.name.is_empty() {
            info.unique_id.clone()
        } else {
            info.name.clone()
        };

        Self {
            key: MaterialKey::new(info.unique_id.clone()),
            name,
            base_color: [
                channel(info.color.red),
                channel(info.color.green),
                channel(info.color.blue),
                alpha,
            ],
            double_sided: true,
            alpha_mode,
            metallic_roughness: MetallicRoughness::default(),
        }
    }
}

/// Append-only material table for one export
#[derive(Clone)]
pub struct MaterialCache {
    descriptors: Vec<MaterialDescriptor>,
    by_key: FxHashMap<MaterialKey, MaterialId>,
    /// Every document a lookup went to, indexed by slot
    documents: Vec<DocumentHandle>,
    by_element: FxHashMap<(usize, ElementId), MaterialId>,
}

impl MaterialCache {
    /// Create a cache holding only the default material
    pub fn new() -> Self {
        let default = MaterialDescriptor::default_material();
        let mut by_key = FxHashMap::default();
        by_key.insert(default.key.clone(), MaterialId::DEFAULT);
        Self {
            descriptors: vec![default],
            by_key,
            documents: Vec::new(),
            by_element: FxHashMap::default(),
        }
    }

    #[inline]
    pub fn resolve_default(&self) -> MaterialId {
        MaterialId::DEFAULT
    }

    /// Resolve a host material id against `document`.
    ///
    /// Invalid ids, and ids the document does not know as a material, map to
    /// the default material.
    pub fn resolve(&mut self, document: &DocumentHandle, id: ElementId) -> MaterialId {
        if !id.is_valid() {
            return MaterialId::DEFAULT;
        }

        let element_key = (self.document_slot(document), id);
        if let Some(&cached) = self.by_element.get(&element_key) {
            return cached;
        }

        let resolved = match document.material(id) {
            Some(info) => self.insert(&info),
            None => MaterialId::DEFAULT,
        };
        self.by_element.insert(element_key, resolved);
        resolved
    }

    /// Return the slot for `info`'s key, building the descriptor on first use
    pub fn insert(&mut self, info: &MaterialInfo) -> MaterialId {
        let key = MaterialKey::new(info.unique_id.clone());
        if let Some(&existing) = self.by_key.get(&key) {
            return existing;
        }

        let id = MaterialId(self.descriptors.len());
        self.descriptors.push(MaterialDescriptor::from_host(info));
        self.by_key.insert(key, id);
        id
    }

    /// Slot of `document`, pinning the handle on first sight
    fn document_slot(&mut self, document: &DocumentHandle) -> usize {
        match self
            .documents
            .iter()
            .position(|pinned| Arc::ptr_eq(pinned, document))
        {
            Some(slot) => slot,
            None => {
                self.documents.push(Arc::clone(document));
                self.documents.len() - 1
            }
        }
    }

    #[inline]
    pub fn get(&self, id: MaterialId) -> Option<&MaterialDescriptor> {
        self.descriptors.get(id.0)
    }

    pub fn get_by_key(&self, key: &MaterialKey) -> Option<MaterialId> {
        self.by_key.get(key).copied()
    }

    /// Number of descriptors, default included
    #[inline]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MaterialId, &MaterialDescriptor)> {
        self.descriptors
            .iter()
            .enumerate()
            .map(|(i, d)| (MaterialId(i), d))
    }

    pub fn descriptors(&self) -> &[MaterialDescriptor] {
        &self.descriptors
    }
}

impl Default for MaterialCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MaterialCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaterialCache")
            .field("descriptors", &self.descriptors)
            .field(
                "documents",
                &self.documents.iter().map(|d| d.title()).collect::<Vec<_>>(),
            )
            .field("cached_lookups", &self.by_element.len())
            .finish()
    }
}
