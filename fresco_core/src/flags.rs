// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-view dirty and structural flag bits.
//!
//! Every view carries one [`ViewFlags`] word. The *needs* bits mark work a
//! cascade pass still owes the view; the structural bits describe tree and
//! traversal state.
//!
//! # Clearing discipline
//!
//! A needs bit is cleared by the cascade stage that services it, *before*
//! the stage's hooks run. A hook that re-requests the same stage therefore
//! schedules it for the next tick rather than looping within the current
//! one. Escalating work within the current tick goes through the in-flight
//! pass flags instead (see
//! [`ProcessPass::escalate`](crate::cascade::ProcessPass::escalate)).
//!
//! # Propagation
//!
//! [`ViewTree::require_update`](crate::view::ViewTree::require_update)
//! ORs needs bits into the view and every ancestor up to its root, so a
//! cascade entered at the root always reaches dirty descendants. Repeated
//! requests within one turn coalesce into a single pending tick.

use bitflags::bitflags;

bitflags! {
    /// Dirty and structural state bits for a single view.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ViewFlags: u32 {
        // -- Process-pass needs --

        /// Surface-backing dimensions must be remeasured.
        const NEEDS_RESIZE = 1 << 0;
        /// Scroll-derived state must be recomputed.
        const NEEDS_SCROLL = 1 << 1;
        /// Generic derived state must be recomputed. Also services a
        /// pending [`HIDE_REQUESTED`](Self::HIDE_REQUESTED).
        const NEEDS_CHANGE = 1 << 2;
        /// Animated properties must advance to the current frame time.
        const NEEDS_ANIMATE = 1 << 3;

        // -- Display-pass needs --

        /// The parent-assigned frame or own layout must be recomputed.
        const NEEDS_LAYOUT = 1 << 4;
        /// The view must repaint into the surface.
        const NEEDS_RENDER = 1 << 5;
        /// Cached off-screen raster content must be redrawn.
        const NEEDS_RASTERIZE = 1 << 6;
        /// Cached raster content must be re-blitted to the surface.
        const NEEDS_COMPOSITE = 1 << 7;

        // -- Visibility / interaction --

        /// The view and its subtree contribute no pixels.
        const HIDDEN = 1 << 8;
        /// A hide was requested; applied by the next change stage.
        const HIDE_REQUESTED = 1 << 9;
        /// Known to be outside the visible/interactive region; skipped by
        /// the display cascade and by hit testing.
        const CULLED = 1 << 10;
        /// Exempt from self hit-testing (children are still tested).
        const INTANGIBLE = 1 << 11;

        // -- Transient traversal state --

        /// A cascade is currently visiting this view.
        const TRAVERSING = 1 << 12;
        /// The process pass is currently visiting this view.
        const PROCESSING = 1 << 13;
        /// The display pass is currently visiting this view.
        const DISPLAYING = 1 << 14;
        /// Hooks for this view are on the stack and context-dependent
        /// lookups are legal.
        const CONTEXTUAL = 1 << 15;

        // -- Lifecycle --

        /// Removal was requested mid-traversal; detach is deferred until
        /// the visit unwinds.
        const REMOVING = 1 << 16;
        /// The view is attached to a mounted root.
        const MOUNTED = 1 << 17;
    }
}

impl ViewFlags {
    /// All process-pass needs bits, in stage order: resize, scroll,
    /// change, animate.
    pub const PROCESS_MASK: Self = Self::NEEDS_RESIZE
        .union(Self::NEEDS_SCROLL)
        .union(Self::NEEDS_CHANGE)
        .union(Self::NEEDS_ANIMATE);

    /// All display-pass needs bits, in stage order: layout, render,
    /// rasterize, composite.
    pub const DISPLAY_MASK: Self = Self::NEEDS_LAYOUT
        .union(Self::NEEDS_RENDER)
        .union(Self::NEEDS_RASTERIZE)
        .union(Self::NEEDS_COMPOSITE);

    /// Every needs bit either cascade pass services.
    pub const UPDATE_MASK: Self = Self::PROCESS_MASK.union(Self::DISPLAY_MASK);

    /// Bits that must never survive a cascade visit, error or not.
    pub const TRANSIENT_MASK: Self = Self::TRAVERSING
        .union(Self::PROCESSING)
        .union(Self::DISPLAYING)
        .union(Self::CONTEXTUAL);

    /// Returns whether any process-pass needs bit is set.
    #[inline]
    #[must_use]
    pub const fn needs_process(self) -> bool {
        self.intersects(Self::PROCESS_MASK)
    }

    /// Returns whether any display-pass needs bit is set.
    #[inline]
    #[must_use]
    pub const fn needs_display(self) -> bool {
        self.intersects(Self::DISPLAY_MASK)
    }
}
