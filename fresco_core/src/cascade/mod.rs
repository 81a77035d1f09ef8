// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The two-phase update cascade and the hit-testing cascade.
//!
//! Once per animation tick a host drives two structurally identical
//! traversals over the tree: the **process** pass (resize → scroll →
//! change → animate) and the **display** pass (layout → render →
//! rasterize → composite). Every visit follows the same shape:
//!
//! 1. Derive the per-call [`ViewContext`] from the inherited one plus
//!    this view's frame.
//! 2. Compute effective flags = (incoming ∪ persisted), let the view's
//!    `needs_*` hook adjust them.
//! 3. If no stage-relevant bit is set, skip entirely — no hooks fire and
//!    children are not visited, which keeps unaffected subtrees cheap.
//! 4. Otherwise service the stages in fixed order: clear each stage bit
//!    on the view *before* its hooks run, fire all `will_*` hooks in
//!    stage order, all `on_*` hooks (with structural bodies) in stage
//!    order, recurse into children with the union of serviced bits, then
//!    fire `did_*` hooks in reverse stage order — the innermost effect
//!    commits first and the outermost observers are notified last.
//! 5. Transient traversal flags are cleared unconditionally on the way
//!    out, error or not, so a failed tick never leaves the tree stuck.
//!
//! Hooks escalate more work for the *current* tick by ORing bits into
//! the in-flight pass ([`ProcessPass::escalate`] /
//! [`DisplayPass::escalate`]); requesting through
//! [`require_update`](crate::view::ViewTree::require_update) instead
//! defers to the next tick, because the serviced bit was already cleared.
//! Each stage runs at most once per view per pass, so a hook re-setting
//! its own bit cannot loop within one tick.
//!
//! [`cascade_hit_test`](crate::view::ViewTree::cascade_hit_test) shares
//! the traversal but inverts the order: children are tested topmost
//! first, and a view only tests itself after no child claims the point.

mod display;
mod hit;
mod process;

use crate::context::ViewContext;
use crate::flags::ViewFlags;
use crate::render::Renderer;
use crate::sprite::SpriteService;
use crate::time::HostTime;

/// The in-flight state of a process-pass visit at one view.
#[derive(Debug)]
pub struct ProcessPass {
    /// The context derived for this view.
    pub context: ViewContext,
    /// The semantic time animations should advance to.
    pub time: HostTime,
    flags: ViewFlags,
}

impl ProcessPass {
    pub(crate) const fn new(context: ViewContext, time: HostTime, flags: ViewFlags) -> Self {
        Self {
            context,
            time,
            flags,
        }
    }

    /// Returns the stage bits in flight for this visit.
    #[must_use]
    pub const fn flags(&self) -> ViewFlags {
        self.flags
    }

    /// Forces additional process stages to run during *this* visit.
    ///
    /// Only process bits are honored. Escalation reaches stages that
    /// have not been serviced yet this visit; bits for stages already
    /// serviced are ignored (request those via `require_update` for the
    /// next tick).
    pub fn escalate(&mut self, flags: ViewFlags) {
        self.flags |= flags & ViewFlags::PROCESS_MASK;
    }
}

/// The in-flight state of a display-pass visit at one view.
pub struct DisplayPass<'a> {
    /// The context derived for this view.
    pub context: ViewContext,
    /// The surface being painted.
    pub renderer: &'a mut dyn Renderer,
    /// The shared sprite allocator for cached off-screen content.
    pub sprites: &'a mut SpriteService,
    flags: ViewFlags,
}

impl<'a> DisplayPass<'a> {
    pub(crate) fn new(
        context: ViewContext,
        flags: ViewFlags,
        renderer: &'a mut dyn Renderer,
        sprites: &'a mut SpriteService,
    ) -> Self {
        Self {
            context,
            renderer,
            sprites,
            flags,
        }
    }

    /// Returns the stage bits in flight for this visit.
    #[must_use]
    pub const fn flags(&self) -> ViewFlags {
        self.flags
    }

    /// Forces additional display stages to run during *this* visit.
    ///
    /// Only display bits are honored; see [`ProcessPass::escalate`].
    pub fn escalate(&mut self, flags: ViewFlags) {
        self.flags |= flags & ViewFlags::DISPLAY_MASK;
    }
}

impl core::fmt::Debug for DisplayPass<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DisplayPass")
            .field("context", &self.context)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}
