// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host document model: element and material lookups by id.
//!
//! Element ids are document-scoped. The same numeric id can name a wall in
//! the host document and a material in a linked one, so every lookup must go
//! through the document that owns the id.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Document-scoped element identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub i64);

impl ElementId {
    /// The host's "no element" id
    pub const INVALID: ElementId = ElementId(-1);

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Element classification. Elements without one are filtered out of exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub id: Option<i64>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
        }
    }
}

/// Result of an element-by-id lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementInfo {
    pub id: ElementId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: Option<Category>,
}

/// 8-bit RGB color as the host stores it (0-255 per channel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb8 {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb8 {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

/// Result of a material-by-id lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialInfo {
    pub id: ElementId,
    /// Stable identifier, unique within the owning document
    pub unique_id: String,
    #[serde(default)]
    pub name: String,
    pub color: Rgb8,
    /// 0 = opaque, 128 = fully transparent
    #[serde(default)]
    pub transparency: u8,
}

/// Source document that element and material ids resolve against
pub trait Document: Send + Sync {
    /// Human readable document title
    fn title(&self) -> &str;

    /// Look up an element by id
    fn element(&self, id: ElementId) -> Option<ElementInfo>;

    /// Look up a material by id
    fn material(&self, id: ElementId) -> Option<MaterialInfo>;
}

/// Shared handle to a host document
pub type DocumentHandle = Arc<dyn Document>;

/// Document backed by in-memory tables.
///
/// Used by the reference driver for recorded scenes and by tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocument {
    title: String,
    elements: FxHashMap<ElementId, ElementInfo>,
    materials: FxHashMap<ElementId, MaterialInfo>,
}

impl InMemoryDocument {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            elements: FxHashMap::default(),
            materials: FxHashMap::default(),
        }
    }

    /// Add an element with an optional category
    pub fn with_element(mut self, id: i64, category: Option<&str>) -> Self {
        let id = ElementId(id);
        self.elements.insert(
            id,
            ElementInfo {
                id,
                name: String::new(),
                category: category.map(Category::new),
            },
        );
        self
    }

    /// Add a material
    pub fn with_material(mut self, material: MaterialInfo) -> Self {
        self.insert_material(material);
        self
    }

    pub fn insert_element(&mut self, element: ElementInfo) {
        self.elements.insert(element.id, element);
    }

    pub fn insert_material(&mut self, material: MaterialInfo) {
        self.materials.insert(material.id, material);
    }

    pub fn into_handle(self) -> DocumentHandle {
        Arc::new(self)
    }
}

impl Document for InMemoryDocument {
    fn title(&self) -> &str {
        &self.title
    }

    fn element(&self, id: ElementId) -> Option<ElementInfo> {
        self.elements.get(&id).cloned()
    }

    fn material(&self, id: ElementId) -> Option<MaterialInfo> {
        self.materials.get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_id_is_not_valid() {
        assert!(!ElementId::INVALID.is_valid());
        assert!(ElementId(0).is_valid());
        assert!(ElementId(42).is_valid());
    }

    #[test]
    fn in_memory_lookups() {
        let doc = InMemoryDocument::new("Host")
            .with_element(1, Some("Walls"))
            .with_element(2, None)
            .with_material(MaterialInfo {
                id: ElementId(10),
                unique_id: "mat-10".into(),
                name: "Concrete".into(),
                color: Rgb8::new(128, 128, 128),
                transparency: 0,
            });

        assert_eq!(doc.title(), "Host");
        let wall = doc.element(ElementId(1)).unwrap();
        assert_eq!(wall.category.unwrap().name, "Walls");
        assert!(doc.element(ElementId(2)).unwrap().category.is_none());
        assert!(doc.element(ElementId(3)).is_none());
        assert_eq!(doc.material(ElementId(10)).unwrap().unique_id, "mat-10");
        assert!(doc.material(ElementId(1)).is_none());
    }
}
