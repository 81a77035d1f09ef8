// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The hit-testing cascade.

use kurbo::Point;

use crate::context::ViewContext;
use crate::flags::ViewFlags;
use crate::view::{HitBounds, INVALID, ViewId, ViewTree};

impl ViewTree {
    /// Finds the deepest, frontmost, eligible view whose hit region
    /// contains `point` (surface coordinates), or `None`.
    ///
    /// Eligible means not hidden, not culled, and not intangible. The
    /// search prunes whole subtrees whose hit bounds exclude the point,
    /// then recurses into children topmost first — the last-painted
    /// child wins ties — and only tests the view's own geometry (via the
    /// [`hit_test`](crate::view::ViewHooks::hit_test) hook) when no
    /// child claims the point.
    ///
    /// Safe to call before any layout has run: a view with no resolved
    /// bounds fails the containment check rather than matching
    /// spuriously.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn cascade_hit_test(
        &mut self,
        root: ViewId,
        point: Point,
        ctx: &ViewContext,
    ) -> Option<ViewId> {
        self.validate(root);
        self.hit_view(root.idx, point, ctx)
    }

    fn hit_view(&mut self, idx: u32, point: Point, inherited: &ViewContext) -> Option<ViewId> {
        let slot = idx as usize;
        if self.flags[slot].intersects(ViewFlags::HIDDEN | ViewFlags::CULLED) {
            return None;
        }

        let id = self.id_at(idx);
        let ctx = match self.frame[slot] {
            Some(frame) => inherited.extended(frame),
            None => *inherited,
        };

        let hooks = self.hooks[slot].take();
        let bounds = match hooks.as_deref() {
            Some(h) => h.hit_bounds(id, self),
            None => HitBounds::Default,
        };
        let pruned = match bounds {
            HitBounds::Region(region) => !region.contains(point),
            HitBounds::Default => {
                let region = self.own_bounds[slot].or(self.frame[slot]);
                region.is_none_or(|r| !r.contains(point))
            }
            HitBounds::Unbounded => false,
        };
        if pruned {
            self.restore_hooks(idx, hooks);
            return None;
        }

        // Topmost child first: walk to the last sibling, then follow
        // prev links. Hit hooks cannot mutate topology (they take the
        // tree by shared reference), so the links stay stable.
        let mut hit = None;
        let mut child = self.first_child[slot];
        if child != INVALID {
            while self.next_sibling[child as usize] != INVALID {
                child = self.next_sibling[child as usize];
            }
        }
        while child != INVALID {
            let prev = self.prev_sibling[child as usize];
            if let Some(found) = self.hit_view(child, point, &ctx) {
                hit = Some(found);
                break;
            }
            child = prev;
        }

        // Self test only when no child claims the point.
        if hit.is_none() && !self.flags[slot].contains(ViewFlags::INTANGIBLE) {
            if let Some(h) = hooks.as_deref() {
                self.flags[slot] |= ViewFlags::CONTEXTUAL;
                let self_hit = h.hit_test(id, point, ctx.view_frame);
                self.flags[slot] &= !ViewFlags::CONTEXTUAL;
                if self_hit {
                    hit = Some(id);
                }
            }
        }

        self.restore_hooks(idx, hooks);
        hit
    }
}
