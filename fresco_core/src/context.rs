// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-call view context.
//!
//! A [`ViewContext`] is derived fresh for every node a cascade visits: the
//! inherited context plus this node's parent-assigned frame. It is passed
//! explicitly down the call stack and never stored on a view, so there is
//! no process-wide "current context" to swap in and out around traversal.

use kurbo::{Point, Rect};

/// The transient context a cascade or hit-test call sees at one view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewContext {
    /// The frame rectangle the nearest framed ancestor assigned, in
    /// surface coordinates. [`Rect::ZERO`] until a surface has been
    /// measured.
    pub view_frame: Rect,
    /// Device pixels per CSS pixel of the backing surface.
    pub pixel_ratio: f64,
}

impl ViewContext {
    /// Creates a root context for a surface with the given frame.
    #[must_use]
    pub const fn new(view_frame: Rect, pixel_ratio: f64) -> Self {
        Self {
            view_frame,
            pixel_ratio,
        }
    }

    /// Derives the context a child with the given frame sees.
    #[must_use]
    pub const fn extended(self, view_frame: Rect) -> Self {
        Self { view_frame, ..self }
    }

    /// Returns whether the given surface-space point lies inside this
    /// context's frame.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        self.view_frame.contains(point)
    }
}

impl Default for ViewContext {
    fn default() -> Self {
        Self::new(Rect::ZERO, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extended_replaces_frame_only() {
        let root = ViewContext::new(Rect::new(0.0, 0.0, 800.0, 600.0), 2.0);
        let child = root.extended(Rect::new(10.0, 10.0, 110.0, 60.0));
        assert_eq!(child.view_frame, Rect::new(10.0, 10.0, 110.0, 60.0));
        assert_eq!(child.pixel_ratio, 2.0);
    }

    #[test]
    fn containment_follows_frame() {
        let ctx = ViewContext::new(Rect::new(0.0, 0.0, 100.0, 100.0), 1.0);
        assert!(ctx.contains(Point::new(50.0, 50.0)));
        assert!(!ctx.contains(Point::new(150.0, 50.0)));
    }
}
