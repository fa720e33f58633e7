// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Traversal handler that flattens the host scene graph.
//!
//! Transforms and documents are tracked on explicit stacks that mirror the
//! Begin/End nesting of instances and links. Each geometric element collects
//! its polymesh batches into a [`MeshAccumulator`], baked into output space
//! with the transform current at the time of the batch, and is committed as
//! one scene node on its End event.

use crate::config::ExportConfig;
use crate::error::{Error, Result};
use scenebake_core::{
    drive_with_documents, DocumentHandle, DriveOutcome, ElementId, ExportContext, FaceNode,
    InstanceNode, LightNode, LinkNode, MaterialNode, PolymeshTopology, RenderNodeAction,
    RpcNode, SceneDump, ViewNode,
};
use scenebake_geometry::{
    DocumentStack, MaterialCache, MaterialId, MeshAccumulator, OutputScene, SceneAssembler,
    TransformStack,
};

/// Lifecycle of a [`SceneExportContext`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    Idle,
    Started,
    Finished,
}

/// Counters reported when an export finishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Scene nodes written, one per element with geometry
    pub nodes: usize,
    /// Materials referenced by the written nodes
    pub materials: usize,
    pub triangles: usize,
    /// Elements skipped because they have no category
    pub skipped_elements: usize,
}

/// One open element
#[derive(Debug)]
enum ElementFrame {
    Collecting(MeshAccumulator),
    Skipped(ElementId),
}

impl ElementFrame {
    fn element(&self) -> ElementId {
        match self {
            ElementFrame::Collecting(acc) => acc.element(),
            ElementFrame::Skipped(id) => *id,
        }
    }
}

/// Export context producing an [`OutputScene`].
#[derive(Debug)]
pub struct SceneExportContext {
    config: ExportConfig,
    state: ExportState,
    transforms: TransformStack,
    documents: DocumentStack,
    materials: MaterialCache,
    current_material: MaterialId,
    elements: Vec<ElementFrame>,
    assembler: SceneAssembler,
    skipped_elements: usize,
    scene: Option<OutputScene>,
    summary: ExportSummary,
}

impl SceneExportContext {
    /// Create a context whose lookups start in `root`
    pub fn new(root: DocumentHandle, config: ExportConfig) -> Self {
        let assembler = SceneAssembler::new(config.scene_name.clone());
        Self {
            config,
            state: ExportState::Idle,
            transforms: TransformStack::new(),
            documents: DocumentStack::new(root),
            materials: MaterialCache::new(),
            current_material: MaterialId::DEFAULT,
            elements: Vec::new(),
            assembler,
            skipped_elements: 0,
            scene: None,
            summary: ExportSummary::default(),
        }
    }

    #[inline]
    pub fn state(&self) -> ExportState {
        self.state
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Document that element and material lookups currently resolve against
    pub fn current_document(&self) -> &DocumentHandle {
        self.documents.current()
    }

    pub fn transform_depth(&self) -> usize {
        self.transforms.depth()
    }

    pub fn document_depth(&self) -> usize {
        self.documents.depth()
    }

    pub fn current_transform(&self) -> &nalgebra::Matrix4<f64> {
        self.transforms.current()
    }

    pub fn current_material(&self) -> MaterialId {
        self.current_material
    }

    pub fn materials(&self) -> &MaterialCache {
        &self.materials
    }

    /// Nodes committed so far
    pub fn node_count(&self) -> usize {
        match &self.scene {
            Some(scene) => scene.nodes.len(),
            None => self.assembler.node_count(),
        }
    }

    pub fn summary(&self) -> ExportSummary {
        self.summary
    }

    /// The finished scene, available once `finish` has succeeded
    pub fn scene(&self) -> Option<&OutputScene> {
        self.scene.as_ref()
    }

    pub fn into_scene(self) -> Result<OutputScene> {
        self.scene.ok_or(Error::NotFinished)
    }

    fn ensure_started(&self) -> Result<()> {
        match self.state {
            ExportState::Started => Ok(()),
            _ => Err(Error::NotStarted),
        }
    }

    /// Accumulator of the innermost open element
    fn active_accumulator(&mut self) -> Result<&mut MeshAccumulator> {
        match self.elements.last_mut() {
            Some(ElementFrame::Collecting(acc)) => Ok(acc),
            _ => Err(scenebake_geometry::Error::NoActiveElement.into()),
        }
    }
}

impl ExportContext for SceneExportContext {
    type Error = Error;

    fn start(&mut self) -> Result<bool> {
        if self.state != ExportState::Idle {
            return Err(Error::AlreadyStarted);
        }
        tracing::debug!(
            document = %self.documents.current().title(),
            unit_scale = self.config.unit_scale,
            "Export started"
        );
        self.current_material = self.materials.resolve_default();
        self.state = ExportState::Started;
        Ok(true)
    }

    fn finish(&mut self) -> Result<()> {
        self.ensure_started()?;

        if !self.transforms.is_at_root()
            || !self.documents.is_at_root()
            || !self.elements.is_empty()
        {
            return Err(Error::UnbalancedTraversal {
                transform_depth: self.transforms.depth(),
                document_depth: self.documents.depth(),
                open_elements: self.elements.len(),
            });
        }

        let assembler = std::mem::replace(
            &mut self.assembler,
            SceneAssembler::new(self.config.scene_name.clone()),
        );
        let scene = assembler.finish(&self.materials);

        self.summary = ExportSummary {
            nodes: scene.nodes.len(),
            materials: scene.used_materials().len(),
            triangles: scene.triangle_count(),
            skipped_elements: self.skipped_elements,
        };
        tracing::info!(
            nodes = self.summary.nodes,
            materials = self.summary.materials,
            triangles = self.summary.triangles,
            skipped = self.summary.skipped_elements,
            "Export finished"
        );

        self.scene = Some(scene);
        self.state = ExportState::Finished;
        Ok(())
    }

    fn is_canceled(&self) -> bool {
        false
    }

    fn on_view_begin(&mut self, node: &ViewNode) -> Result<RenderNodeAction> {
        self.ensure_started()?;
        tracing::debug!(view = %node.name, "View begin");
        Ok(RenderNodeAction::Proceed)
    }

    fn on_view_end(&mut self, _view_id: ElementId) -> Result<()> {
        self.ensure_started()
    }

    fn on_element_begin(&mut self, id: ElementId) -> Result<RenderNodeAction> {
        self.ensure_started()?;

        // Elements the document does not know are still collected; only a
        // known element without a category is treated as non-geometric.
        let unclassified = self
            .documents
            .current()
            .element(id)
            .is_some_and(|info| info.category.is_none());

        if unclassified {
            tracing::debug!(element = %id, "Skipping element without category");
            self.skipped_elements += 1;
            self.elements.push(ElementFrame::Skipped(id));
            return Ok(RenderNodeAction::Skip);
        }

        self.elements.push(ElementFrame::Collecting(MeshAccumulator::with_unit_scale(
            id,
            self.config.unit_scale,
        )));
        Ok(RenderNodeAction::Proceed)
    }

    fn on_element_end(&mut self, id: ElementId) -> Result<()> {
        self.ensure_started()?;

        let frame = self
            .elements
            .pop()
            .ok_or(scenebake_geometry::Error::NoActiveElement)?;
        if frame.element() != id {
            return Err(scenebake_geometry::Error::ElementMismatch {
                expected: frame.element(),
                found: id,
            }
            .into());
        }

        if let ElementFrame::Collecting(acc) = frame {
            let triangles = acc.triangle_count();
            match self.assembler.commit(acc) {
                Some(index) => {
                    tracing::debug!(element = %id, node = index, triangles, "Element committed")
                }
                None => tracing::debug!(element = %id, "Element without geometry dropped"),
            }
        }
        Ok(())
    }

    fn on_instance_begin(&mut self, node: &InstanceNode) -> Result<RenderNodeAction> {
        self.ensure_started()?;
        self.transforms.push(&node.transform);
        tracing::trace!(instance = %node.name, depth = self.transforms.depth(), "Instance begin");
        Ok(RenderNodeAction::Proceed)
    }

    fn on_instance_end(&mut self, _node: &InstanceNode) -> Result<()> {
        self.ensure_started()?;
        self.transforms.pop()?;
        Ok(())
    }

    fn on_link_begin(&mut self, node: &LinkNode) -> Result<RenderNodeAction> {
        self.ensure_started()?;
        self.transforms.push(&node.transform);
        self.documents.push(node.document.clone());
        tracing::debug!(
            link = %node.name,
            document = %node.document.title(),
            "Entering linked document"
        );
        Ok(RenderNodeAction::Proceed)
    }

    fn on_link_end(&mut self, node: &LinkNode) -> Result<()> {
        self.ensure_started()?;
        self.documents.pop()?;
        self.transforms.pop()?;
        tracing::debug!(link = %node.name, "Leaving linked document");
        Ok(())
    }

    fn on_face_begin(&mut self, _node: &FaceNode) -> Result<RenderNodeAction> {
        self.ensure_started()?;
        // Polymesh batches already carry the face geometry
        Ok(RenderNodeAction::Skip)
    }

    fn on_face_end(&mut self, _node: &FaceNode) -> Result<()> {
        self.ensure_started()
    }

    fn on_material(&mut self, node: &MaterialNode) -> Result<()> {
        self.ensure_started()?;

        let document = self.documents.current();
        let resolved = self.materials.resolve(document, node.material_id);
        if node.material_id.is_valid() && resolved == MaterialId::DEFAULT {
            tracing::warn!(
                material = %node.material_id,
                document = %document.title(),
                "Material not found, using default"
            );
        }
        self.current_material = resolved;
        Ok(())
    }

    fn on_polymesh(&mut self, node: &PolymeshTopology) -> Result<()> {
        self.ensure_started()?;

        let transform = *self.transforms.current();
        let material = self.current_material;
        let acc = self.active_accumulator()?;
        let added = acc.add_polymesh(node, &transform, material)?;
        tracing::trace!(element = %acc.element(), triangles = added, "Polymesh baked");
        Ok(())
    }

    fn on_light(&mut self, node: &LightNode) -> Result<()> {
        self.ensure_started()?;
        tracing::trace!(light = %node.name, "Light ignored");
        Ok(())
    }

    fn on_rpc(&mut self, node: &RpcNode) -> Result<()> {
        self.ensure_started()?;
        tracing::trace!(rpc = %node.name, "RPC ignored");
        Ok(())
    }
}

/// Result of [`run_export`]
#[derive(Debug)]
pub struct ExportRun {
    pub outcome: DriveOutcome,
    pub scene: OutputScene,
    pub summary: ExportSummary,
}

/// Replay the active view of `dump` through a fresh [`SceneExportContext`].
///
/// A canceled traversal still finishes and yields the elements committed
/// before the cancellation point.
pub fn run_export(dump: &SceneDump, config: ExportConfig) -> Result<ExportRun> {
    let documents = dump.open_documents()?;
    let root = dump.root(&documents)?;

    let mut ctx = SceneExportContext::new(root, config);
    let outcome = drive_with_documents(dump, &documents, &mut ctx)?;
    let summary = ctx.summary();
    let scene = ctx.into_scene()?;

    Ok(ExportRun {
        outcome,
        scene,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Matrix4;
    use scenebake_core::InMemoryDocument;
    use std::sync::Arc;

    fn context() -> SceneExportContext {
        let doc = InMemoryDocument::new("Host").with_element(1, Some("Walls"));
        SceneExportContext::new(doc.into_handle(), ExportConfig::default())
    }

    #[test]
    fn events_before_start_are_rejected() {
        let mut ctx = context();
        assert!(matches!(
            ctx.on_element_begin(ElementId(1)),
            Err(Error::NotStarted)
        ));
        assert_eq!(ctx.state(), ExportState::Idle);
    }

    #[test]
    fn start_twice_is_rejected() {
        let mut ctx = context();
        assert!(ctx.start().unwrap());
        assert!(matches!(ctx.start(), Err(Error::AlreadyStarted)));
    }

    #[test]
    fn finish_with_open_instance_is_unbalanced() {
        let mut ctx = context();
        ctx.start().unwrap();
        ctx.on_instance_begin(&InstanceNode {
            name: "open".into(),
            transform: Matrix4::identity(),
        })
        .unwrap();
        assert!(matches!(
            ctx.finish(),
            Err(Error::UnbalancedTraversal {
                transform_depth: 2,
                document_depth: 1,
                open_elements: 0
            })
        ));
    }

    #[test]
    fn instance_end_without_begin_underflows() {
        let mut ctx = context();
        ctx.start().unwrap();
        let node = InstanceNode {
            name: "stray".into(),
            transform: Matrix4::identity(),
        };
        assert!(matches!(
            ctx.on_instance_end(&node),
            Err(Error::Geometry(
                scenebake_geometry::Error::StackUnderflow { .. }
            ))
        ));
    }

    #[test]
    fn polymesh_outside_element_is_rejected() {
        let mut ctx = context();
        ctx.start().unwrap();
        assert!(matches!(
            ctx.on_polymesh(&PolymeshTopology::default()),
            Err(Error::Geometry(scenebake_geometry::Error::NoActiveElement))
        ));
    }

    #[test]
    fn mismatched_element_end_is_rejected() {
        let mut ctx = context();
        ctx.start().unwrap();
        ctx.on_element_begin(ElementId(1)).unwrap();
        assert!(matches!(
            ctx.on_element_end(ElementId(2)),
            Err(Error::Geometry(
                scenebake_geometry::Error::ElementMismatch { .. }
            ))
        ));
    }

    #[test]
    fn into_scene_requires_finish() {
        let mut ctx = context();
        ctx.start().unwrap();
        assert!(matches!(ctx.into_scene(), Err(Error::NotFinished)));
    }

    #[test]
    fn link_swaps_current_document() {
        let linked: DocumentHandle = Arc::new(InMemoryDocument::new("Linked"));
        let mut ctx = context();
        ctx.start().unwrap();

        let link = LinkNode {
            name: "Link".into(),
            transform: Matrix4::new_translation(&nalgebra::Vector3::new(5.0, 0.0, 0.0)),
            document: linked,
        };
        ctx.on_link_begin(&link).unwrap();
        assert_eq!(ctx.current_document().title(), "Linked");
        assert_eq!(ctx.transform_depth(), 2);
        assert_eq!(ctx.document_depth(), 2);

        ctx.on_link_end(&link).unwrap();
        assert_eq!(ctx.current_document().title(), "Host");
        assert_eq!(*ctx.current_transform(), Matrix4::identity());
    }
}
