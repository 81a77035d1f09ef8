// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-view behavior: roles, stage hooks, and observers.
//!
//! Fresco has no view class hierarchy. A view's structural semantics come
//! from its closed [`ViewRole`]; its behavior comes from an optional
//! [`ViewHooks`] table installed on the node. The cascade engine drives
//! every view through the same traversal and calls into the table at the
//! will/on/did points of each stage. Hooks default to no-ops, so a table
//! implements only the stages it cares about.
//!
//! [`ViewObserver`]s receive the same will/did notifications the hook
//! table receives, keyed by [`CascadeStage`], without being able to
//! mutate the tree mid-notification.

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

use kurbo::{Point, Rect};

use crate::cascade::{DisplayPass, ProcessPass};
use crate::flags::ViewFlags;

use super::{ViewId, ViewTree};

/// The closed set of structural view kinds.
///
/// Roles decide the non-overridable parts of cascade and dispatch
/// behavior; everything else goes through [`ViewHooks`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ViewRole {
    /// An ordered grouping node with no pixels of its own.
    #[default]
    Container,
    /// A leaf or composite node that paints geometry.
    Graphic,
    /// A node backed by a canvas surface. Forces render + composite
    /// whenever process work invalidates it, clears its frame rectangle
    /// before descendants paint, and terminates event bubbling.
    SurfaceHost,
}

/// One sub-stage of a cascade pass, in fixed service order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CascadeStage {
    /// Remeasure surface-backing dimensions (process).
    Resize,
    /// Recompute scroll-derived state (process).
    Scroll,
    /// Recompute generic derived state (process).
    Change,
    /// Advance animated properties (process).
    Animate,
    /// Recompute frames and own layout (display).
    Layout,
    /// Paint into the surface (display).
    Render,
    /// Redraw cached off-screen rasters (display).
    Rasterize,
    /// Blit cached rasters to the surface (display).
    Composite,
}

/// Process-pass stages in service order.
pub const PROCESS_STAGES: [CascadeStage; 4] = [
    CascadeStage::Resize,
    CascadeStage::Scroll,
    CascadeStage::Change,
    CascadeStage::Animate,
];

/// Display-pass stages in service order.
pub const DISPLAY_STAGES: [CascadeStage; 4] = [
    CascadeStage::Layout,
    CascadeStage::Render,
    CascadeStage::Rasterize,
    CascadeStage::Composite,
];

impl CascadeStage {
    /// Returns the needs bit this stage services.
    #[must_use]
    pub const fn flag(self) -> ViewFlags {
        match self {
            Self::Resize => ViewFlags::NEEDS_RESIZE,
            Self::Scroll => ViewFlags::NEEDS_SCROLL,
            Self::Change => ViewFlags::NEEDS_CHANGE,
            Self::Animate => ViewFlags::NEEDS_ANIMATE,
            Self::Layout => ViewFlags::NEEDS_LAYOUT,
            Self::Render => ViewFlags::NEEDS_RENDER,
            Self::Rasterize => ViewFlags::NEEDS_RASTERIZE,
            Self::Composite => ViewFlags::NEEDS_COMPOSITE,
        }
    }

    /// Returns whether this stage belongs to the process pass.
    #[must_use]
    pub const fn is_process(self) -> bool {
        matches!(
            self,
            Self::Resize | Self::Scroll | Self::Change | Self::Animate
        )
    }
}

/// An error raised by a stage hook.
///
/// The cascade does not catch these: the error propagates to whoever
/// invoked the tick, after the engine has cleared transient traversal
/// flags so a later tick is not permanently stuck. Needs bits that were
/// being serviced may be left partially cleared; the next full tick
/// re-evaluates needs from flags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CascadeError {
    /// The view whose hook failed.
    pub view: ViewId,
    /// The stage that was being serviced.
    pub stage: CascadeStage,
    /// Hook-supplied description.
    pub reason: String,
}

impl CascadeError {
    /// Creates an error for the given view and stage.
    #[must_use]
    pub fn new(view: ViewId, stage: CascadeStage, reason: impl Into<String>) -> Self {
        Self {
            view,
            stage,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for CascadeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} hook failed for {:?}: {}",
            self.stage, self.view, self.reason
        )
    }
}

impl core::error::Error for CascadeError {}

/// Result type for stage hooks.
pub type CascadeResult = Result<(), CascadeError>;

/// The hit region a view reports for pointer containment tests.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum HitBounds {
    /// Use the view's own bounds, falling back to its frame. If neither
    /// is set (e.g. before any layout has run) containment reliably
    /// fails rather than matching spuriously.
    #[default]
    Default,
    /// Use this rectangle, in surface coordinates.
    Region(Rect),
    /// Skip the pruning check entirely; children are tested regardless
    /// of where the point falls. For pure containers whose children may
    /// overflow.
    Unbounded,
}

/// Per-view stage hooks.
///
/// One table per view, installed with
/// [`ViewTree::set_hooks`](super::ViewTree::set_hooks). During a cascade
/// visit the table is temporarily moved out of its slot, so hooks receive
/// `&mut ViewTree` and may freely mutate the tree — including requesting
/// further updates, which land on the *next* tick because the serviced
/// bit was cleared before the hook ran.
#[expect(unused_variables, reason = "default no-op bodies name their arguments")]
pub trait ViewHooks {
    // -- Flag adjustment --

    /// Adjusts the effective process flags for this cascade visit.
    ///
    /// Called with (incoming ∪ persisted) process bits; the returned set
    /// replaces them for this visit only.
    fn needs_process(&mut self, view: ViewId, flags: ViewFlags) -> ViewFlags {
        flags
    }

    /// Adjusts the effective display flags for this cascade visit.
    fn needs_display(&mut self, view: ViewId, flags: ViewFlags) -> ViewFlags {
        flags
    }

    // -- Process stages --

    /// About to remeasure.
    fn will_resize(
        &mut self,
        view: ViewId,
        tree: &mut ViewTree,
        pass: &mut ProcessPass,
    ) -> CascadeResult {
        Ok(())
    }

    /// Remeasure surface-backing state.
    fn on_resize(
        &mut self,
        view: ViewId,
        tree: &mut ViewTree,
        pass: &mut ProcessPass,
    ) -> CascadeResult {
        Ok(())
    }

    /// Remeasure finished (runs after descendants).
    fn did_resize(
        &mut self,
        view: ViewId,
        tree: &mut ViewTree,
        pass: &mut ProcessPass,
    ) -> CascadeResult {
        Ok(())
    }

    /// About to recompute scroll state.
    fn will_scroll(
        &mut self,
        view: ViewId,
        tree: &mut ViewTree,
        pass: &mut ProcessPass,
    ) -> CascadeResult {
        Ok(())
    }

    /// Recompute scroll-derived state.
    fn on_scroll(
        &mut self,
        view: ViewId,
        tree: &mut ViewTree,
        pass: &mut ProcessPass,
    ) -> CascadeResult {
        Ok(())
    }

    /// Scroll recomputation finished.
    fn did_scroll(
        &mut self,
        view: ViewId,
        tree: &mut ViewTree,
        pass: &mut ProcessPass,
    ) -> CascadeResult {
        Ok(())
    }

    /// About to recompute derived state.
    fn will_change(
        &mut self,
        view: ViewId,
        tree: &mut ViewTree,
        pass: &mut ProcessPass,
    ) -> CascadeResult {
        Ok(())
    }

    /// Recompute generic derived state.
    fn on_change(
        &mut self,
        view: ViewId,
        tree: &mut ViewTree,
        pass: &mut ProcessPass,
    ) -> CascadeResult {
        Ok(())
    }

    /// Derived-state recomputation finished.
    fn did_change(
        &mut self,
        view: ViewId,
        tree: &mut ViewTree,
        pass: &mut ProcessPass,
    ) -> CascadeResult {
        Ok(())
    }

    /// About to advance animations.
    fn will_animate(
        &mut self,
        view: ViewId,
        tree: &mut ViewTree,
        pass: &mut ProcessPass,
    ) -> CascadeResult {
        Ok(())
    }

    /// Advance animated properties to [`ProcessPass::time`].
    fn on_animate(
        &mut self,
        view: ViewId,
        tree: &mut ViewTree,
        pass: &mut ProcessPass,
    ) -> CascadeResult {
        Ok(())
    }

    /// Animation advance finished.
    fn did_animate(
        &mut self,
        view: ViewId,
        tree: &mut ViewTree,
        pass: &mut ProcessPass,
    ) -> CascadeResult {
        Ok(())
    }

    // -- Display stages --

    /// About to lay out.
    fn will_layout(
        &mut self,
        view: ViewId,
        tree: &mut ViewTree,
        pass: &mut DisplayPass<'_>,
    ) -> CascadeResult {
        Ok(())
    }

    /// Assign child frames and own bounds.
    fn on_layout(
        &mut self,
        view: ViewId,
        tree: &mut ViewTree,
        pass: &mut DisplayPass<'_>,
    ) -> CascadeResult {
        Ok(())
    }

    /// Layout finished (runs after descendants).
    fn did_layout(
        &mut self,
        view: ViewId,
        tree: &mut ViewTree,
        pass: &mut DisplayPass<'_>,
    ) -> CascadeResult {
        Ok(())
    }

    /// About to paint.
    fn will_render(
        &mut self,
        view: ViewId,
        tree: &mut ViewTree,
        pass: &mut DisplayPass<'_>,
    ) -> CascadeResult {
        Ok(())
    }

    /// Paint through [`DisplayPass::renderer`].
    fn on_render(
        &mut self,
        view: ViewId,
        tree: &mut ViewTree,
        pass: &mut DisplayPass<'_>,
    ) -> CascadeResult {
        Ok(())
    }

    /// Painting finished.
    fn did_render(
        &mut self,
        view: ViewId,
        tree: &mut ViewTree,
        pass: &mut DisplayPass<'_>,
    ) -> CascadeResult {
        Ok(())
    }

    /// About to redraw cached rasters.
    fn will_rasterize(
        &mut self,
        view: ViewId,
        tree: &mut ViewTree,
        pass: &mut DisplayPass<'_>,
    ) -> CascadeResult {
        Ok(())
    }

    /// Redraw cached off-screen content (sprites acquired from
    /// [`DisplayPass::sprites`]).
    fn on_rasterize(
        &mut self,
        view: ViewId,
        tree: &mut ViewTree,
        pass: &mut DisplayPass<'_>,
    ) -> CascadeResult {
        Ok(())
    }

    /// Raster redraw finished.
    fn did_rasterize(
        &mut self,
        view: ViewId,
        tree: &mut ViewTree,
        pass: &mut DisplayPass<'_>,
    ) -> CascadeResult {
        Ok(())
    }

    /// About to composite.
    fn will_composite(
        &mut self,
        view: ViewId,
        tree: &mut ViewTree,
        pass: &mut DisplayPass<'_>,
    ) -> CascadeResult {
        Ok(())
    }

    /// Blit cached content to the surface.
    fn on_composite(
        &mut self,
        view: ViewId,
        tree: &mut ViewTree,
        pass: &mut DisplayPass<'_>,
    ) -> CascadeResult {
        Ok(())
    }

    /// Compositing finished.
    fn did_composite(
        &mut self,
        view: ViewId,
        tree: &mut ViewTree,
        pass: &mut DisplayPass<'_>,
    ) -> CascadeResult {
        Ok(())
    }

    // -- Hit testing --

    /// Returns the region used for pointer containment pruning.
    fn hit_bounds(&self, view: ViewId, tree: &ViewTree) -> HitBounds {
        HitBounds::Default
    }

    /// Tests whether `point` hits this view's own geometry, given its
    /// resolved frame. Only graphic primitives override this; the
    /// default reports no self hit, so pure containers are transparent
    /// to pointers.
    fn hit_test(&self, view: ViewId, point: Point, frame: Rect) -> bool {
        false
    }

    // -- Lifecycle --

    /// The view was attached to a mounted root.
    fn on_mount(&mut self, view: ViewId, tree: &mut ViewTree) {}

    /// The view was detached from a mounted root. All flags are reset
    /// after this returns.
    fn on_unmount(&mut self, view: ViewId, tree: &mut ViewTree) {}
}

impl fmt::Debug for dyn ViewHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ViewHooks")
    }
}

/// Receives the will/did notifications of every stage a view runs, plus
/// mount transitions.
///
/// Observers are notified read-only: will notifications fire before the
/// hook table's `will_*`, did notifications fire after the table's
/// `did_*`, so the innermost effect commits first and the outermost
/// observers hear about it last.
#[expect(unused_variables, reason = "default no-op bodies name their arguments")]
pub trait ViewObserver {
    /// A stage is about to run for `view`.
    fn view_will_stage(&self, view: ViewId, stage: CascadeStage) {}

    /// A stage finished for `view` (after its descendants).
    fn view_did_stage(&self, view: ViewId, stage: CascadeStage) {}

    /// `view` was attached to a mounted root.
    fn view_did_mount(&self, view: ViewId) {}

    /// `view` was detached from a mounted root.
    fn view_did_unmount(&self, view: ViewId) {}
}

impl fmt::Debug for dyn ViewObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ViewObserver")
    }
}

/// Boxed hook table, as stored on a view slot.
pub type HookBox = Box<dyn ViewHooks>;
