// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Traversal callback protocol.

use crate::document::ElementId;
use crate::nodes::{
    FaceNode, InstanceNode, LightNode, LinkNode, MaterialNode, PolymeshTopology,
    RenderNodeAction, RpcNode, ViewNode,
};

/// Receiver of a host scene-graph traversal.
///
/// The driver calls these in strict depth-first order and pairs every Begin
/// with exactly one End before any sibling Begin. Implementations may rely on
/// that ordering and report a broken pairing as an error.
pub trait ExportContext {
    type Error;

    /// Called once before anything else. Returning `false` aborts traversal.
    fn start(&mut self) -> Result<bool, Self::Error>;

    /// Called once after the last End.
    fn finish(&mut self) -> Result<(), Self::Error>;

    /// Polled between top-level elements.
    fn is_canceled(&self) -> bool;

    fn on_view_begin(&mut self, node: &ViewNode) -> Result<RenderNodeAction, Self::Error>;
    fn on_view_end(&mut self, view_id: ElementId) -> Result<(), Self::Error>;

    fn on_element_begin(&mut self, id: ElementId) -> Result<RenderNodeAction, Self::Error>;
    fn on_element_end(&mut self, id: ElementId) -> Result<(), Self::Error>;

    fn on_instance_begin(&mut self, node: &InstanceNode) -> Result<RenderNodeAction, Self::Error>;
    fn on_instance_end(&mut self, node: &InstanceNode) -> Result<(), Self::Error>;

    fn on_link_begin(&mut self, node: &LinkNode) -> Result<RenderNodeAction, Self::Error>;
    fn on_link_end(&mut self, node: &LinkNode) -> Result<(), Self::Error>;

    fn on_face_begin(&mut self, node: &FaceNode) -> Result<RenderNodeAction, Self::Error>;
    fn on_face_end(&mut self, node: &FaceNode) -> Result<(), Self::Error>;

    fn on_material(&mut self, node: &MaterialNode) -> Result<(), Self::Error>;
    fn on_polymesh(&mut self, node: &PolymeshTopology) -> Result<(), Self::Error>;
    fn on_light(&mut self, node: &LightNode) -> Result<(), Self::Error>;
    fn on_rpc(&mut self, node: &RpcNode) -> Result<(), Self::Error>;
}
