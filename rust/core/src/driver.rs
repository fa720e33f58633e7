// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reference traversal driver for recorded scenes.
//!
//! Emits the callback sequence a host would for the dump's active view:
//! `start`, view begin, the depth-first node stream, view end, `finish`.
//! Every Begin is paired with its End even when the context answered
//! [`RenderNodeAction::Skip`]; a skip only prunes the node's children.

use crate::context::ExportContext;
use crate::document::DocumentHandle;
use crate::dump::{DumpNode, SceneDump};
use crate::error::Error;
use crate::nodes::{
    FaceNode, InstanceNode, LightNode, LinkNode, MaterialNode, RenderNodeAction, RpcNode,
    ViewNode,
};
use rustc_hash::FxHashMap;

/// How a traversal ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    /// Every node was visited
    Completed,
    /// The context asked to stop between top-level elements
    Canceled,
    /// `start` returned false; nothing else was called
    Declined,
}

/// Replay the active view of `dump` through `ctx`.
///
/// Context errors abort the traversal immediately and are returned as-is.
pub fn drive<C>(dump: &SceneDump, ctx: &mut C) -> Result<DriveOutcome, C::Error>
where
    C: ExportContext,
    C::Error: From<Error>,
{
    let documents = dump.open_documents()?;
    drive_with_documents(dump, &documents, ctx)
}

/// Like [`drive`], resolving links against already opened `documents`.
///
/// Use this when the context holds handles from the same map (its root
/// document, typically) so both sides agree on document identity.
pub fn drive_with_documents<C>(
    dump: &SceneDump,
    documents: &FxHashMap<String, DocumentHandle>,
    ctx: &mut C,
) -> Result<DriveOutcome, C::Error>
where
    C: ExportContext,
    C::Error: From<Error>,
{
    let view = dump.active_view.as_ref().ok_or(Error::NoActiveView)?;

    if !ctx.start()? {
        tracing::debug!("Export context declined traversal");
        return Ok(DriveOutcome::Declined);
    }

    let mut outcome = DriveOutcome::Completed;
    let view_node = ViewNode {
        name: view.name.clone(),
        view_id: view.id,
    };

    if ctx.on_view_begin(&view_node)? == RenderNodeAction::Proceed {
        for node in &view.nodes {
            if ctx.is_canceled() {
                tracing::info!("Traversal canceled");
                outcome = DriveOutcome::Canceled;
                break;
            }
            walk(node, documents, ctx)?;
        }
    }
    ctx.on_view_end(view.id)?;
    ctx.finish()?;

    Ok(outcome)
}

fn walk<C>(
    node: &DumpNode,
    documents: &FxHashMap<String, DocumentHandle>,
    ctx: &mut C,
) -> Result<(), C::Error>
where
    C: ExportContext,
    C::Error: From<Error>,
{
    match node {
        DumpNode::Element { id, children } => {
            if ctx.on_element_begin(*id)? == RenderNodeAction::Proceed {
                walk_all(children, documents, ctx)?;
            }
            ctx.on_element_end(*id)?;
        }
        DumpNode::Instance {
            name,
            transform,
            children,
        } => {
            let instance = InstanceNode {
                name: name.clone(),
                transform: transform.to_matrix(),
            };
            if ctx.on_instance_begin(&instance)? == RenderNodeAction::Proceed {
                walk_all(children, documents, ctx)?;
            }
            ctx.on_instance_end(&instance)?;
        }
        DumpNode::Link {
            name,
            transform,
            document,
            children,
        } => {
            let linked = documents
                .get(document)
                .cloned()
                .ok_or_else(|| Error::UnknownDocument {
                    link: name.clone(),
                    document: document.clone(),
                })?;
            let link = LinkNode {
                name: name.clone(),
                transform: transform.to_matrix(),
                document: linked,
            };
            if ctx.on_link_begin(&link)? == RenderNodeAction::Proceed {
                walk_all(children, documents, ctx)?;
            }
            ctx.on_link_end(&link)?;
        }
        DumpNode::Material { name, material_id } => {
            ctx.on_material(&MaterialNode {
                name: name.clone(),
                material_id: *material_id,
            })?;
        }
        DumpNode::Polymesh {
            points,
            facets,
            normals,
            distribution,
        } => {
            let polymesh = DumpNode::to_polymesh(points, facets, normals, *distribution);
            ctx.on_polymesh(&polymesh)?;
        }
        DumpNode::Face { name, children } => {
            let face = FaceNode { name: name.clone() };
            if ctx.on_face_begin(&face)? == RenderNodeAction::Proceed {
                walk_all(children, documents, ctx)?;
            }
            ctx.on_face_end(&face)?;
        }
        DumpNode::Light { name } => ctx.on_light(&LightNode { name: name.clone() })?,
        DumpNode::Rpc { name } => ctx.on_rpc(&RpcNode { name: name.clone() })?,
    }
    Ok(())
}

fn walk_all<C>(
    nodes: &[DumpNode],
    documents: &FxHashMap<String, DocumentHandle>,
    ctx: &mut C,
) -> Result<(), C::Error>
where
    C: ExportContext,
    C::Error: From<Error>,
{
    for node in nodes {
        walk(node, documents, ctx)?;
    }
    Ok(())
}
