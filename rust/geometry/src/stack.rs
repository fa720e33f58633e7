// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Explicit frame stacks mirroring traversal nesting.
//!
//! Both stacks are created with their root frame and can never drop below
//! it, so `current()` always has a frame to return. Popping the root is a
//! broken begin/end pairing and reported as [`Error::StackUnderflow`].

use crate::error::{Error, Result};
use nalgebra::Matrix4;
use scenebake_core::DocumentHandle;

/// Stack of frames with a permanent root
#[derive(Debug, Clone)]
pub struct FrameStack<T> {
    name: &'static str,
    frames: Vec<T>,
}

impl<T> FrameStack<T> {
    pub fn new(name: &'static str, root: T) -> Self {
        Self {
            name,
            frames: vec![root],
        }
    }

    #[inline]
    pub fn push(&mut self, frame: T) {
        self.frames.push(frame);
    }

    /// Remove the top frame, restoring the previous one
    pub fn pop(&mut self) -> Result<T> {
        if self.frames.len() <= 1 {
            return Err(Error::StackUnderflow { stack: self.name });
        }
        self.frames
            .pop()
            .ok_or(Error::StackUnderflow { stack: self.name })
    }

    #[inline]
    pub fn current(&self) -> &T {
        // The root frame is never popped
        &self.frames[self.frames.len() - 1]
    }

    /// Number of frames, root included
    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_at_root(&self) -> bool {
        self.frames.len() == 1
    }
}

/// Cumulative instance/link transforms, identity at the bottom
#[derive(Debug, Clone)]
pub struct TransformStack {
    frames: FrameStack<Matrix4<f64>>,
}

impl TransformStack {
    pub fn new() -> Self {
        Self {
            frames: FrameStack::new("transform", Matrix4::identity()),
        }
    }

    /// Push `current * relative`: points get `relative` applied first, then
    /// the enclosing frame.
    pub fn push(&mut self, relative: &Matrix4<f64>) {
        let composed = self.frames.current() * relative;
        self.frames.push(composed);
    }

    /// Restore the enclosing frame exactly as it was stored
    pub fn pop(&mut self) -> Result<Matrix4<f64>> {
        self.frames.pop()
    }

    #[inline]
    pub fn current(&self) -> &Matrix4<f64> {
        self.frames.current()
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.depth()
    }

    #[inline]
    pub fn is_at_root(&self) -> bool {
        self.frames.is_at_root()
    }
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new()
    }
}

/// Documents that lookups resolve against; pushed only for links
#[derive(Clone)]
pub struct DocumentStack {
    frames: FrameStack<DocumentHandle>,
}

impl DocumentStack {
    pub fn new(root: DocumentHandle) -> Self {
        Self {
            frames: FrameStack::new("document", root),
        }
    }

    #[inline]
    pub fn push(&mut self, document: DocumentHandle) {
        self.frames.push(document);
    }

    pub fn pop(&mut self) -> Result<DocumentHandle> {
        self.frames.pop()
    }

    #[inline]
    pub fn current(&self) -> &DocumentHandle {
        self.frames.current()
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.depth()
    }

    #[inline]
    pub fn is_at_root(&self) -> bool {
        self.frames.is_at_root()
    }
}

impl std::fmt::Debug for DocumentStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStack")
            .field("current", &self.current().title())
            .field("depth", &self.depth())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};
    use scenebake_core::InMemoryDocument;
    use std::sync::Arc;

    fn translation(x: f64, y: f64, z: f64) -> Matrix4<f64> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    fn rotation_z_90() -> Matrix4<f64> {
        Matrix4::new_rotation(Vector3::new(0.0, 0.0, std::f64::consts::FRAC_PI_2))
    }

    #[test]
    fn starts_at_identity() {
        let stack = TransformStack::new();
        assert_eq!(*stack.current(), Matrix4::identity());
        assert!(stack.is_at_root());
    }

    #[test]
    fn composition_law() {
        let r1 = translation(1.0, 2.0, 3.0);
        let r2 = rotation_z_90();

        let mut stack = TransformStack::new();
        stack.push(&r1);
        stack.push(&r2);

        let expected = (Matrix4::<f64>::identity() * r1) * r2;
        assert_eq!(*stack.current(), expected);

        stack.pop().unwrap();
        stack.pop().unwrap();
        assert_eq!(*stack.current(), Matrix4::identity());
    }

    #[test]
    fn relative_applies_before_parent() {
        // Rotate inside a translated frame: local +X ends up at parent +Y
        let mut stack = TransformStack::new();
        stack.push(&translation(10.0, 0.0, 0.0));
        stack.push(&rotation_z_90());

        let p = stack.current().transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.x, 10.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn pop_restores_bit_exact() {
        let skew = Matrix4::new(
            0.1, 0.7, 0.3, 1.0 / 3.0, //
            0.2, 0.9, 0.4, 2.0 / 7.0, //
            0.5, 0.6, 0.8, 1e-9, //
            0.0, 0.0, 0.0, 1.0,
        );
        let mut stack = TransformStack::new();
        stack.push(&skew);
        let before = *stack.current();

        stack.push(&skew.try_inverse().unwrap());
        stack.pop().unwrap();

        assert_eq!(*stack.current(), before);
    }

    #[test]
    fn popping_root_underflows() {
        let mut stack = TransformStack::new();
        assert!(matches!(
            stack.pop(),
            Err(Error::StackUnderflow { stack: "transform" })
        ));
        assert_eq!(*stack.current(), Matrix4::identity());
    }

    #[test]
    fn document_stack_tracks_links() {
        let root: DocumentHandle = Arc::new(InMemoryDocument::new("Host"));
        let linked: DocumentHandle = Arc::new(InMemoryDocument::new("Linked"));

        let mut docs = DocumentStack::new(root);
        assert_eq!(docs.current().title(), "Host");

        docs.push(linked);
        assert_eq!(docs.current().title(), "Linked");
        assert_eq!(docs.depth(), 2);

        assert_eq!(docs.pop().unwrap().title(), "Linked");
        assert_eq!(docs.current().title(), "Host");
        assert!(matches!(
            docs.pop(),
            Err(Error::StackUnderflow { stack: "document" })
        ));
    }
}
