// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-device input tracking state machines.
//!
//! The router owns the live-tracking records layered above raw surface
//! input:
//!
//! - **Mouse** — one shared record, created on enter (or first contact),
//!   destroyed on leave. Every event re-hit-tests; a target change
//!   synthesizes exactly one out (related = new target) and one over
//!   (related = old target), plus per-ancestor leave/enter events for
//!   the chain difference. While a record exists the backend should keep
//!   window-scoped move/up listeners attached
//!   ([`mouse_active`](InputRouter::mouse_active)) so drags that exit
//!   the surface keep updating state.
//! - **Pointer** — one record per pointer id, same shape as the mouse
//!   but multiplexed. Records of pointer type "mouse" survive up/cancel
//!   the way a real mouse keeps hovering; other types are removed.
//! - **Touch** — one record per touch identifier. The target is hit
//!   tested once at touch start and **locked** for the whole sequence;
//!   move/end/cancel reuse it without re-testing. Synthetic events are
//!   batched per distinct target: one event per target carrying only
//!   that target's touches.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use kurbo::Point;

use crate::context::ViewContext;
use crate::view::{INVALID, ViewId, ViewRole, ViewTree};

use super::types::{EventKind, Modifiers, TouchPoint, ViewEvent};

/// The device class behind a pointer event, as reported by the platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerType {
    /// An indirect, persistent pointing device. Keeps its hover record
    /// alive across up/cancel.
    Mouse,
    /// Pen input.
    Pen,
    /// A finger driving the pointer-event stream.
    Touch,
}

/// The out/over/leave/enter kinds of one device family.
struct HoverKinds {
    out: EventKind,
    over: EventKind,
    leave: EventKind,
    enter: EventKind,
}

const MOUSE_HOVER: HoverKinds = HoverKinds {
    out: EventKind::MouseOut,
    over: EventKind::MouseOver,
    leave: EventKind::MouseLeave,
    enter: EventKind::MouseEnter,
};

const POINTER_HOVER: HoverKinds = HoverKinds {
    out: EventKind::PointerOut,
    over: EventKind::PointerOver,
    leave: EventKind::PointerLeave,
    enter: EventKind::PointerEnter,
};

/// Last-known state of one tracked device.
#[derive(Clone, Copy, Debug)]
struct DeviceTrack {
    position: Point,
    modifiers: Modifiers,
    target: Option<ViewId>,
}

#[derive(Clone, Copy, Debug)]
struct PointerRecord {
    track: DeviceTrack,
    pointer_type: PointerType,
}

#[derive(Clone, Copy, Debug)]
struct TouchRecord {
    target: Option<ViewId>,
    position: Point,
}

/// Multiplexes raw surface input into synthetic view events.
#[derive(Debug, Default)]
pub struct InputRouter {
    mouse: Option<DeviceTrack>,
    pointers: BTreeMap<i32, PointerRecord>,
    touches: BTreeMap<i32, TouchRecord>,
}

impl InputRouter {
    /// Creates a router with no live tracking state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -- Mouse --

    /// The mouse entered the surface.
    pub fn mouse_enter(
        &mut self,
        tree: &mut ViewTree,
        root: ViewId,
        ctx: &ViewContext,
        position: Point,
        modifiers: Modifiers,
    ) {
        self.mouse_update(tree, root, ctx, position, modifiers);
    }

    /// The mouse moved; dispatches a move event to the current target.
    pub fn mouse_move(
        &mut self,
        tree: &mut ViewTree,
        root: ViewId,
        ctx: &ViewContext,
        position: Point,
        modifiers: Modifiers,
    ) {
        let target = self.mouse_update(tree, root, ctx, position, modifiers);
        if let Some(target) = target {
            dispatch_plain(tree, EventKind::MouseMove, target, position, modifiers);
        }
    }

    /// The primary button was pressed.
    pub fn mouse_down(
        &mut self,
        tree: &mut ViewTree,
        root: ViewId,
        ctx: &ViewContext,
        position: Point,
        modifiers: Modifiers,
    ) {
        let target = self.mouse_update(tree, root, ctx, position, modifiers);
        if let Some(target) = target {
            dispatch_plain(tree, EventKind::MouseDown, target, position, modifiers);
        }
    }

    /// The primary button was released. The hover record stays alive.
    pub fn mouse_up(
        &mut self,
        tree: &mut ViewTree,
        root: ViewId,
        ctx: &ViewContext,
        position: Point,
        modifiers: Modifiers,
    ) {
        let target = self.mouse_update(tree, root, ctx, position, modifiers);
        if let Some(target) = target {
            dispatch_plain(tree, EventKind::MouseUp, target, position, modifiers);
        }
    }

    /// The mouse left the surface; the record is destroyed.
    pub fn mouse_leave(
        &mut self,
        tree: &mut ViewTree,
        position: Point,
        modifiers: Modifiers,
    ) {
        if let Some(track) = self.mouse.take() {
            retarget(tree, &MOUSE_HOVER, track.target, None, position, modifiers);
        }
    }

    /// Returns whether a mouse record exists (the backend keeps
    /// window-scoped listeners attached while it does).
    #[must_use]
    pub const fn mouse_active(&self) -> bool {
        self.mouse.is_some()
    }

    /// Returns the view the mouse currently hovers.
    #[must_use]
    pub fn mouse_target(&self) -> Option<ViewId> {
        self.mouse.as_ref().and_then(|t| t.target)
    }

    /// Re-hit-tests, updates the record (creating it on first contact),
    /// and synthesizes transition events. Returns the current target.
    fn mouse_update(
        &mut self,
        tree: &mut ViewTree,
        root: ViewId,
        ctx: &ViewContext,
        position: Point,
        modifiers: Modifiers,
    ) -> Option<ViewId> {
        let hit = tree.cascade_hit_test(root, position, ctx);
        let old = match &mut self.mouse {
            Some(track) => {
                let old = track.target;
                track.position = position;
                track.modifiers = modifiers;
                track.target = hit;
                old
            }
            None => {
                self.mouse = Some(DeviceTrack {
                    position,
                    modifiers,
                    target: hit,
                });
                None
            }
        };
        if old != hit {
            retarget(tree, &MOUSE_HOVER, old, hit, position, modifiers);
        }
        hit
    }

    // -- Pointer --

    /// A pointer entered the surface.
    pub fn pointer_enter(
        &mut self,
        tree: &mut ViewTree,
        root: ViewId,
        ctx: &ViewContext,
        pointer_id: i32,
        pointer_type: PointerType,
        position: Point,
        modifiers: Modifiers,
    ) {
        self.pointer_update(tree, root, ctx, pointer_id, pointer_type, position, modifiers);
    }

    /// A pointer moved; dispatches a move event to its current target.
    pub fn pointer_move(
        &mut self,
        tree: &mut ViewTree,
        root: ViewId,
        ctx: &ViewContext,
        pointer_id: i32,
        pointer_type: PointerType,
        position: Point,
        modifiers: Modifiers,
    ) {
        let target =
            self.pointer_update(tree, root, ctx, pointer_id, pointer_type, position, modifiers);
        if let Some(target) = target {
            dispatch_plain(tree, EventKind::PointerMove, target, position, modifiers);
        }
    }

    /// A pointer made contact.
    pub fn pointer_down(
        &mut self,
        tree: &mut ViewTree,
        root: ViewId,
        ctx: &ViewContext,
        pointer_id: i32,
        pointer_type: PointerType,
        position: Point,
        modifiers: Modifiers,
    ) {
        let target =
            self.pointer_update(tree, root, ctx, pointer_id, pointer_type, position, modifiers);
        if let Some(target) = target {
            dispatch_plain(tree, EventKind::PointerDown, target, position, modifiers);
        }
    }

    /// A pointer lifted. Non-mouse pointer records are removed, with
    /// out/leave synthesized; a mouse-type pointer keeps hovering.
    pub fn pointer_up(
        &mut self,
        tree: &mut ViewTree,
        root: ViewId,
        ctx: &ViewContext,
        pointer_id: i32,
        pointer_type: PointerType,
        position: Point,
        modifiers: Modifiers,
    ) {
        let target =
            self.pointer_update(tree, root, ctx, pointer_id, pointer_type, position, modifiers);
        if let Some(target) = target {
            dispatch_plain(tree, EventKind::PointerUp, target, position, modifiers);
        }
        self.pointer_finish(tree, pointer_id, pointer_type, position, modifiers);
    }

    /// A pointer sequence was aborted.
    pub fn pointer_cancel(
        &mut self,
        tree: &mut ViewTree,
        pointer_id: i32,
        pointer_type: PointerType,
        position: Point,
        modifiers: Modifiers,
    ) {
        if let Some(record) = self.pointers.get(&pointer_id) {
            if let Some(target) = record.track.target {
                dispatch_plain(tree, EventKind::PointerCancel, target, position, modifiers);
            }
        }
        self.pointer_finish(tree, pointer_id, pointer_type, position, modifiers);
    }

    /// A pointer left the surface; its record is destroyed.
    pub fn pointer_leave(
        &mut self,
        tree: &mut ViewTree,
        pointer_id: i32,
        position: Point,
        modifiers: Modifiers,
    ) {
        if let Some(record) = self.pointers.remove(&pointer_id) {
            retarget(
                tree,
                &POINTER_HOVER,
                record.track.target,
                None,
                position,
                modifiers,
            );
        }
    }

    /// Returns the view a tracked pointer currently hovers.
    #[must_use]
    pub fn pointer_target(&self, pointer_id: i32) -> Option<ViewId> {
        self.pointers
            .get(&pointer_id)
            .and_then(|record| record.track.target)
    }

    /// Returns the number of tracked pointers.
    #[must_use]
    pub fn pointer_count(&self) -> usize {
        self.pointers.len()
    }

    fn pointer_update(
        &mut self,
        tree: &mut ViewTree,
        root: ViewId,
        ctx: &ViewContext,
        pointer_id: i32,
        pointer_type: PointerType,
        position: Point,
        modifiers: Modifiers,
    ) -> Option<ViewId> {
        let hit = tree.cascade_hit_test(root, position, ctx);
        let track = DeviceTrack {
            position,
            modifiers,
            target: hit,
        };
        let old = match self.pointers.insert(
            pointer_id,
            PointerRecord {
                track,
                pointer_type,
            },
        ) {
            Some(previous) => previous.track.target,
            None => None,
        };
        if old != hit {
            retarget(tree, &POINTER_HOVER, old, hit, position, modifiers);
        }
        hit
    }

    /// Removes the record of a finished non-mouse pointer. The primary
    /// "mouse" pointer type is exempt so its hover state persists the
    /// way a physical mouse does.
    fn pointer_finish(
        &mut self,
        tree: &mut ViewTree,
        pointer_id: i32,
        pointer_type: PointerType,
        position: Point,
        modifiers: Modifiers,
    ) {
        if pointer_type == PointerType::Mouse {
            return;
        }
        if let Some(record) = self.pointers.remove(&pointer_id) {
            retarget(
                tree,
                &POINTER_HOVER,
                record.track.target,
                None,
                position,
                modifiers,
            );
        }
    }

    // -- Touch --

    /// Touches began. Each changed touch is hit tested once and its
    /// target locked for the rest of the sequence.
    ///
    /// Returns whether no listener canceled a synthetic event, so hosts
    /// can mirror the cancellation onto the native event.
    pub fn touch_start(
        &mut self,
        tree: &mut ViewTree,
        root: ViewId,
        ctx: &ViewContext,
        changed: &[TouchPoint],
        modifiers: Modifiers,
    ) -> bool {
        let mut groups: Vec<(ViewId, Vec<TouchPoint>)> = Vec::new();
        for touch in changed {
            let hit = tree.cascade_hit_test(root, touch.position, ctx);
            self.touches.insert(
                touch.id,
                TouchRecord {
                    target: hit,
                    position: touch.position,
                },
            );
            if let Some(target) = hit {
                push_group(&mut groups, target, *touch);
            }
        }
        dispatch_groups(tree, EventKind::TouchStart, groups, modifiers)
    }

    /// Touches moved. Locked targets are reused; no re-hit-testing.
    ///
    /// Returns whether no listener canceled a synthetic event.
    pub fn touch_move(
        &mut self,
        tree: &mut ViewTree,
        changed: &[TouchPoint],
        modifiers: Modifiers,
    ) -> bool {
        let mut groups: Vec<(ViewId, Vec<TouchPoint>)> = Vec::new();
        for touch in changed {
            if let Some(record) = self.touches.get_mut(&touch.id) {
                record.position = touch.position;
                if let Some(target) = record.target {
                    push_group(&mut groups, target, *touch);
                }
            }
        }
        dispatch_groups(tree, EventKind::TouchMove, groups, modifiers)
    }

    /// Touches lifted; their records are removed.
    ///
    /// Returns whether no listener canceled a synthetic event.
    pub fn touch_end(
        &mut self,
        tree: &mut ViewTree,
        changed: &[TouchPoint],
        modifiers: Modifiers,
    ) -> bool {
        self.touch_finish(tree, EventKind::TouchEnd, changed, modifiers)
    }

    /// A touch sequence was aborted; the records are removed.
    pub fn touch_cancel(
        &mut self,
        tree: &mut ViewTree,
        changed: &[TouchPoint],
        modifiers: Modifiers,
    ) -> bool {
        self.touch_finish(tree, EventKind::TouchCancel, changed, modifiers)
    }

    /// Returns the locked target of a tracked touch.
    #[must_use]
    pub fn touch_target(&self, touch_id: i32) -> Option<ViewId> {
        self.touches.get(&touch_id).and_then(|record| record.target)
    }

    /// Returns the number of tracked touches.
    #[must_use]
    pub fn touch_count(&self) -> usize {
        self.touches.len()
    }

    fn touch_finish(
        &mut self,
        tree: &mut ViewTree,
        kind: EventKind,
        changed: &[TouchPoint],
        modifiers: Modifiers,
    ) -> bool {
        let mut groups: Vec<(ViewId, Vec<TouchPoint>)> = Vec::new();
        for touch in changed {
            if let Some(record) = self.touches.remove(&touch.id) {
                if let Some(target) = record.target {
                    push_group(&mut groups, target, *touch);
                }
            }
        }
        dispatch_groups(tree, kind, groups, modifiers)
    }
}

/// Appends a touch to its target's batch, preserving first-seen target
/// order.
fn push_group(groups: &mut Vec<(ViewId, Vec<TouchPoint>)>, target: ViewId, touch: TouchPoint) {
    if let Some((_, touches)) = groups.iter_mut().find(|(t, _)| *t == target) {
        touches.push(touch);
    } else {
        groups.push((target, alloc::vec![touch]));
    }
}

/// Dispatches one batched event per distinct target. Returns whether no
/// listener canceled any of them.
fn dispatch_groups(
    tree: &mut ViewTree,
    kind: EventKind,
    groups: Vec<(ViewId, Vec<TouchPoint>)>,
    modifiers: Modifiers,
) -> bool {
    let mut uncanceled = true;
    for (target, touches) in groups {
        let mut event = ViewEvent::touch(kind, target, touches, modifiers);
        uncanceled &= tree.dispatch_event(&mut event);
    }
    uncanceled
}

fn dispatch_plain(
    tree: &mut ViewTree,
    kind: EventKind,
    target: ViewId,
    position: Point,
    modifiers: Modifiers,
) {
    let mut event = ViewEvent::new(kind, target, position, modifiers);
    tree.dispatch_event(&mut event);
}

/// Synthesizes the transition events for a hover target change, in DOM
/// order: out on the old target, leave along the old-only ancestor
/// chain, over on the new target, enter along the new-only chain.
fn retarget(
    tree: &mut ViewTree,
    kinds: &HoverKinds,
    old: Option<ViewId>,
    new: Option<ViewId>,
    position: Point,
    modifiers: Modifiers,
) {
    if old == new {
        return;
    }
    let old_chain = hover_chain(tree, old);
    let new_chain = hover_chain(tree, new);

    if let Some(old_target) = old.filter(|&v| tree.is_alive(v)) {
        let mut out = ViewEvent::new(kinds.out, old_target, position, modifiers).with_related(new);
        tree.dispatch_event(&mut out);
    }
    // Leave the views no longer under the device, innermost first.
    for &view in old_chain.iter().filter(|v| !new_chain.contains(v)) {
        let mut leave = ViewEvent::new(kinds.leave, view, position, modifiers).with_related(new);
        tree.dispatch_event(&mut leave);
    }
    if let Some(new_target) = new.filter(|&v| tree.is_alive(v)) {
        let mut over = ViewEvent::new(kinds.over, new_target, position, modifiers).with_related(old);
        tree.dispatch_event(&mut over);
    }
    // Enter the newly covered views, outermost first.
    for &view in new_chain.iter().rev().filter(|v| !old_chain.contains(v)) {
        let mut enter = ViewEvent::new(kinds.enter, view, position, modifiers).with_related(old);
        tree.dispatch_event(&mut enter);
    }
}

/// The ancestor chain of a hover target, target first, ending at the
/// dispatch root.
fn hover_chain(tree: &ViewTree, view: Option<ViewId>) -> Vec<ViewId> {
    let mut chain = Vec::new();
    let Some(target) = view else {
        return chain;
    };
    if !tree.is_alive(target) {
        return chain;
    }
    let mut idx = target.idx;
    loop {
        chain.push(tree.id_at(idx));
        if tree.role[idx as usize] == ViewRole::SurfaceHost {
            break;
        }
        let parent = tree.parent[idx as usize];
        if parent == INVALID {
            break;
        }
        idx = parent;
    }
    chain
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use kurbo::Rect;

    use crate::event::ListenerOptions;
    use crate::view::{ViewHooks, ViewRole};

    use super::*;

    struct RectGraphic;

    impl ViewHooks for RectGraphic {
        fn hit_test(&self, _view: ViewId, point: Point, frame: Rect) -> bool {
            frame.contains(point)
        }
    }

    fn ctx() -> ViewContext {
        ViewContext::new(Rect::new(0.0, 0.0, 200.0, 200.0), 1.0)
    }

    /// host with two side-by-side rectangles: a = [0,100), b = [100,200).
    fn fixture() -> (ViewTree, ViewId, ViewId, ViewId) {
        let mut tree = ViewTree::new();
        let host = tree.create_view(ViewRole::SurfaceHost);
        tree.set_frame(host, Rect::new(0.0, 0.0, 200.0, 200.0));
        let a = tree.create_view(ViewRole::Graphic);
        tree.set_hooks(a, Box::new(RectGraphic));
        tree.set_frame(a, Rect::new(0.0, 0.0, 100.0, 200.0));
        let b = tree.create_view(ViewRole::Graphic);
        tree.set_hooks(b, Box::new(RectGraphic));
        tree.set_frame(b, Rect::new(100.0, 0.0, 200.0, 200.0));
        tree.append_child(host, a);
        tree.append_child(host, b);
        (tree, host, a, b)
    }

    type Log = Rc<RefCell<Vec<(EventKind, ViewId, Option<ViewId>)>>>;

    fn record(tree: &mut ViewTree, view: ViewId, kind: EventKind, log: &Log) {
        let log = log.clone();
        tree.on(view, kind, ListenerOptions::default(), move |_, ev| {
            log.borrow_mut()
                .push((ev.kind(), ev.target(), ev.related_target()));
        });
    }

    #[test]
    fn mouse_transition_synthesizes_one_out_and_one_over() {
        let (mut tree, host, a, b) = fixture();
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        for view in [a, b] {
            record(&mut tree, view, EventKind::MouseOver, &log);
            record(&mut tree, view, EventKind::MouseOut, &log);
        }

        let mut router = InputRouter::new();
        router.mouse_enter(&mut tree, host, &ctx(), Point::new(50.0, 50.0), Modifiers::NONE);
        assert_eq!(
            log.borrow().as_slice(),
            [(EventKind::MouseOver, a, None)],
            "entering over a synthesizes over with no related target"
        );
        log.borrow_mut().clear();

        // Crossing from a to b: exactly one out then one over.
        router.mouse_move(&mut tree, host, &ctx(), Point::new(150.0, 50.0), Modifiers::NONE);
        assert_eq!(
            log.borrow().as_slice(),
            [
                (EventKind::MouseOut, a, Some(b)),
                (EventKind::MouseOver, b, Some(a)),
            ]
        );
        log.borrow_mut().clear();

        // Moving within b: no transition events.
        router.mouse_move(&mut tree, host, &ctx(), Point::new(160.0, 60.0), Modifiers::NONE);
        assert!(log.borrow().is_empty());
        assert_eq!(router.mouse_target(), Some(b));
    }

    #[test]
    fn mouse_leave_destroys_the_record() {
        let (mut tree, host, a, _b) = fixture();
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        record(&mut tree, a, EventKind::MouseOut, &log);

        let mut router = InputRouter::new();
        router.mouse_enter(&mut tree, host, &ctx(), Point::new(50.0, 50.0), Modifiers::NONE);
        assert!(router.mouse_active());

        router.mouse_leave(&mut tree, Point::new(-10.0, 50.0), Modifiers::NONE);
        assert!(!router.mouse_active());
        assert_eq!(
            log.borrow().as_slice(),
            [(EventKind::MouseOut, a, None)]
        );
    }

    #[test]
    fn enter_and_leave_walk_the_chain_difference() {
        // host ← group ← inner; crossing from inner to outside-of-group.
        let mut tree = ViewTree::new();
        let host = tree.create_view(ViewRole::SurfaceHost);
        tree.set_frame(host, Rect::new(0.0, 0.0, 200.0, 200.0));
        let group = tree.create_view(ViewRole::Container);
        tree.set_frame(group, Rect::new(0.0, 0.0, 100.0, 200.0));
        let inner = tree.create_view(ViewRole::Graphic);
        tree.set_hooks(inner, Box::new(RectGraphic));
        tree.set_frame(inner, Rect::new(0.0, 0.0, 100.0, 200.0));
        let other = tree.create_view(ViewRole::Graphic);
        tree.set_hooks(other, Box::new(RectGraphic));
        tree.set_frame(other, Rect::new(100.0, 0.0, 200.0, 200.0));
        tree.append_child(host, group);
        tree.append_child(group, inner);
        tree.append_child(host, other);

        let log: Log = Rc::new(RefCell::new(Vec::new()));
        for view in [group, inner, other] {
            record(&mut tree, view, EventKind::MouseEnter, &log);
            record(&mut tree, view, EventKind::MouseLeave, &log);
        }

        let mut router = InputRouter::new();
        router.mouse_enter(&mut tree, host, &ctx(), Point::new(50.0, 50.0), Modifiers::NONE);
        assert_eq!(
            log.borrow().as_slice(),
            [
                (EventKind::MouseEnter, group, None),
                (EventKind::MouseEnter, inner, None),
            ],
            "enter runs outermost first"
        );
        log.borrow_mut().clear();

        router.mouse_move(&mut tree, host, &ctx(), Point::new(150.0, 50.0), Modifiers::NONE);
        assert_eq!(
            log.borrow().as_slice(),
            [
                (EventKind::MouseLeave, inner, Some(other)),
                (EventKind::MouseLeave, group, Some(other)),
                (EventKind::MouseEnter, other, Some(inner)),
            ],
            "leave runs innermost first, then enter on the new branch"
        );
    }

    #[test]
    fn non_mouse_pointer_is_removed_on_up() {
        let (mut tree, host, a, _b) = fixture();
        let mut router = InputRouter::new();
        let p = Point::new(50.0, 50.0);

        router.pointer_down(&mut tree, host, &ctx(), 7, PointerType::Touch, p, Modifiers::NONE);
        assert_eq!(router.pointer_target(7), Some(a));
        assert_eq!(router.pointer_count(), 1);

        router.pointer_up(&mut tree, host, &ctx(), 7, PointerType::Touch, p, Modifiers::NONE);
        assert_eq!(router.pointer_count(), 0, "touch pointers do not hover");
    }

    #[test]
    fn mouse_pointer_keeps_hovering_after_up() {
        let (mut tree, host, a, _b) = fixture();
        let mut router = InputRouter::new();
        let p = Point::new(50.0, 50.0);

        router.pointer_down(&mut tree, host, &ctx(), 1, PointerType::Mouse, p, Modifiers::NONE);
        router.pointer_up(&mut tree, host, &ctx(), 1, PointerType::Mouse, p, Modifiers::NONE);
        assert_eq!(router.pointer_target(1), Some(a));
        assert_eq!(router.pointer_count(), 1);

        router.pointer_leave(&mut tree, 1, p, Modifiers::NONE);
        assert_eq!(router.pointer_count(), 0);
    }

    #[test]
    fn pointer_transition_synthesizes_out_and_over() {
        let (mut tree, host, a, b) = fixture();
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        for view in [a, b] {
            record(&mut tree, view, EventKind::PointerOver, &log);
            record(&mut tree, view, EventKind::PointerOut, &log);
        }

        let mut router = InputRouter::new();
        router.pointer_enter(
            &mut tree,
            host,
            &ctx(),
            3,
            PointerType::Pen,
            Point::new(20.0, 20.0),
            Modifiers::NONE,
        );
        log.borrow_mut().clear();
        router.pointer_move(
            &mut tree,
            host,
            &ctx(),
            3,
            PointerType::Pen,
            Point::new(180.0, 20.0),
            Modifiers::NONE,
        );
        assert_eq!(
            log.borrow().as_slice(),
            [
                (EventKind::PointerOut, a, Some(b)),
                (EventKind::PointerOver, b, Some(a)),
            ]
        );
    }

    #[test]
    fn touch_target_locks_at_start() {
        let (mut tree, host, a, b) = fixture();
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        for view in [a, b] {
            record(&mut tree, view, EventKind::TouchMove, &log);
            record(&mut tree, view, EventKind::TouchEnd, &log);
        }

        let mut router = InputRouter::new();
        router.touch_start(
            &mut tree,
            host,
            &ctx(),
            &[TouchPoint {
                id: 11,
                position: Point::new(50.0, 50.0),
            }],
            Modifiers::NONE,
        );
        assert_eq!(router.touch_target(11), Some(a));

        // The finger slides over b, but the target stays locked to a.
        router.touch_move(
            &mut tree,
            &[TouchPoint {
                id: 11,
                position: Point::new(150.0, 50.0),
            }],
            Modifiers::NONE,
        );
        router.touch_end(
            &mut tree,
            &[TouchPoint {
                id: 11,
                position: Point::new(150.0, 50.0),
            }],
            Modifiers::NONE,
        );

        let events = log.borrow();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|(_, target, _)| *target == a));
        assert_eq!(router.touch_count(), 0, "end removes the record");
    }

    #[test]
    fn touches_batch_per_distinct_target() {
        let (mut tree, host, a, b) = fixture();
        let batches: Rc<RefCell<Vec<(ViewId, usize)>>> = Rc::new(RefCell::new(Vec::new()));
        for view in [a, b] {
            let batches = batches.clone();
            tree.on(
                view,
                EventKind::TouchStart,
                ListenerOptions::default(),
                move |_, ev| {
                    batches.borrow_mut().push((ev.target(), ev.touches().len()));
                },
            );
        }

        let mut router = InputRouter::new();
        router.touch_start(
            &mut tree,
            host,
            &ctx(),
            &[
                TouchPoint {
                    id: 1,
                    position: Point::new(30.0, 30.0),
                },
                TouchPoint {
                    id: 2,
                    position: Point::new(60.0, 60.0),
                },
                TouchPoint {
                    id: 3,
                    position: Point::new(150.0, 30.0),
                },
            ],
            Modifiers::NONE,
        );

        // Two fingers on a share one event; the finger on b gets its own.
        assert_eq!(batches.borrow().as_slice(), [(a, 2), (b, 1)]);
        assert_eq!(router.touch_count(), 3);
    }

    #[test]
    fn touch_cancel_clears_records_without_retargeting() {
        let (mut tree, host, a, _b) = fixture();
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        record(&mut tree, a, EventKind::TouchCancel, &log);

        let mut router = InputRouter::new();
        let touch = TouchPoint {
            id: 4,
            position: Point::new(40.0, 40.0),
        };
        router.touch_start(&mut tree, host, &ctx(), &[touch], Modifiers::NONE);
        router.touch_cancel(&mut tree, &[touch], Modifiers::NONE);

        assert_eq!(log.borrow().len(), 1);
        assert_eq!(router.touch_count(), 0);
    }

    #[test]
    fn stale_locked_target_is_tolerated() {
        let (mut tree, host, a, _b) = fixture();
        let mut router = InputRouter::new();
        let touch = TouchPoint {
            id: 9,
            position: Point::new(40.0, 40.0),
        };
        router.touch_start(&mut tree, host, &ctx(), &[touch], Modifiers::NONE);
        assert_eq!(router.touch_target(9), Some(a));

        // The target disappears mid-sequence; move/end must not panic.
        tree.remove_from_parent(a);
        tree.destroy_view(a);
        router.touch_move(&mut tree, &[touch], Modifiers::NONE);
        router.touch_end(&mut tree, &[touch], Modifiers::NONE);
        assert_eq!(router.touch_count(), 0);
    }
}
