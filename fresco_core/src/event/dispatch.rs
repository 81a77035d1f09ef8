// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Listener registry and event dispatch.
//!
//! Registration mirrors `addEventListener`: a listener is keyed by event
//! kind and carries capture/passive/once options. Dispatch walks capture
//! listeners from the dispatch root down to the target's parent, runs the
//! target's listeners, then — for bubbling events — walks non-capture
//! listeners back up until a listener stops propagation or the surface
//! host terminates the chain. Capture listeners never run during the
//! bubble walk.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use crate::view::{INVALID, ViewId, ViewRole, ViewTree};

use super::types::{EventKind, ViewEvent};

/// A handle identifying a registered listener, for removal via
/// [`ViewTree::off`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// Registration options, mirroring `AddEventListenerOptions`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    /// Run during the capture descent instead of the bubble walk.
    pub capture: bool,
    /// The listener may not cancel the event's default action.
    pub passive: bool,
    /// Remove the listener after its first invocation.
    pub once: bool,
}

pub(crate) type ListenerCallback = Rc<RefCell<dyn FnMut(&mut ViewTree, &mut ViewEvent)>>;

/// One registered listener on a view.
pub(crate) struct ListenerEntry {
    pub(crate) id: ListenerId,
    pub(crate) kind: EventKind,
    pub(crate) options: ListenerOptions,
    pub(crate) callback: ListenerCallback,
}

impl fmt::Debug for ListenerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerEntry")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Phase {
    Capture,
    Target,
    Bubble,
}

impl ViewTree {
    /// Registers `listener` for events of `kind` on `view` and returns a
    /// handle for removal.
    ///
    /// Listeners receive the tree mutably and may mutate it, including
    /// registering or removing listeners; changes to the view currently
    /// being dispatched take effect from the next dispatch.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn on<F>(
        &mut self,
        view: ViewId,
        kind: EventKind,
        options: ListenerOptions,
        listener: F,
    ) -> ListenerId
    where
        F: FnMut(&mut ViewTree, &mut ViewEvent) + 'static,
    {
        self.validate(view);
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners[view.idx as usize].push(ListenerEntry {
            id,
            kind,
            options,
            callback: Rc::new(RefCell::new(listener)),
        });
        id
    }

    /// Removes a listener previously registered on `view`. Returns
    /// whether it was found.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn off(&mut self, view: ViewId, listener: ListenerId) -> bool {
        self.validate(view);
        let list = &mut self.listeners[view.idx as usize];
        let before = list.len();
        list.retain(|entry| entry.id != listener);
        list.len() != before
    }

    /// Dispatches `event` through the tree: capture descent, target
    /// phase, then — if the event bubbles and nothing stopped it — the
    /// bubble walk up to the surface host, which terminates the chain.
    ///
    /// Returns whether the event was *not* canceled. A stale target
    /// (e.g. removed earlier in the same turn) dispatches nothing.
    pub fn dispatch_event(&mut self, event: &mut ViewEvent) -> bool {
        let target = event.target();
        if !self.is_alive(target) {
            return !event.default_prevented();
        }

        // Ancestor chain from the target's parent up to and including
        // the dispatch root.
        let mut chain: Vec<u32> = Vec::new();
        let mut cursor = self.parent[target.idx as usize];
        while cursor != INVALID {
            chain.push(cursor);
            if self.role[cursor as usize] == ViewRole::SurfaceHost {
                break;
            }
            cursor = self.parent[cursor as usize];
        }

        // Capture descent, outermost first.
        for &idx in chain.iter().rev() {
            if event.propagation_stopped() {
                break;
            }
            self.invoke_listeners(idx, event, Phase::Capture);
        }

        // Target phase: capture and bubble listeners alike, in
        // registration order.
        if !event.propagation_stopped() {
            self.invoke_listeners(target.idx, event, Phase::Target);
        }

        // Bubble walk, innermost first. Capture listeners are exempt.
        if event.bubbles() {
            for &idx in &chain {
                if event.propagation_stopped() {
                    break;
                }
                self.invoke_listeners(idx, event, Phase::Bubble);
            }
        }

        !event.default_prevented()
    }

    /// Runs the listeners of one view matching the event kind and phase.
    fn invoke_listeners(&mut self, idx: u32, event: &mut ViewEvent, phase: Phase) {
        // Collect matching callbacks first (removing `once` entries), so
        // listener bodies can mutate the registry without invalidating
        // the iteration.
        let mut matched: Vec<(ListenerCallback, bool)> = Vec::new();
        self.listeners[idx as usize].retain(|entry| {
            let phase_match = match phase {
                Phase::Capture => entry.options.capture,
                Phase::Bubble => !entry.options.capture,
                Phase::Target => true,
            };
            if entry.kind == event.kind() && phase_match {
                matched.push((entry.callback.clone(), entry.options.passive));
                !entry.options.once
            } else {
                true
            }
        });

        for (callback, passive) in matched {
            event.set_in_passive_listener(passive);
            // A listener that re-enters dispatch into itself is skipped
            // rather than aborted.
            if let Ok(mut f) = callback.try_borrow_mut() {
                f(self, event);
            }
            event.set_in_passive_listener(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use core::cell::RefCell;

    use kurbo::Point;

    use crate::event::Modifiers;

    use super::*;

    fn event(kind: EventKind, target: ViewId) -> ViewEvent {
        ViewEvent::new(kind, target, Point::new(5.0, 5.0), Modifiers::NONE)
    }

    /// host ← layer ← leaf
    fn chain() -> (ViewTree, ViewId, ViewId, ViewId) {
        let mut tree = ViewTree::new();
        let host = tree.create_view(ViewRole::SurfaceHost);
        let layer = tree.create_view(ViewRole::Container);
        let leaf = tree.create_view(ViewRole::Graphic);
        tree.append_child(host, layer);
        tree.append_child(layer, leaf);
        (tree, host, layer, leaf)
    }

    #[test]
    fn bubbles_target_first_then_ancestors() {
        let (mut tree, host, layer, leaf) = chain();
        let log = Rc::new(RefCell::new(vec![]));
        for view in [host, layer, leaf] {
            let log = log.clone();
            tree.on(
                view,
                EventKind::MouseDown,
                ListenerOptions::default(),
                move |_, _| log.borrow_mut().push(view),
            );
        }

        let mut ev = event(EventKind::MouseDown, leaf);
        assert!(tree.dispatch_event(&mut ev));
        assert_eq!(*log.borrow(), vec![leaf, layer, host]);
    }

    #[test]
    fn capture_listeners_run_outermost_first_and_skip_bubble() {
        let (mut tree, host, layer, leaf) = chain();
        let log = Rc::new(RefCell::new(vec![]));
        for view in [host, layer] {
            let log = log.clone();
            tree.on(
                view,
                EventKind::MouseDown,
                ListenerOptions {
                    capture: true,
                    ..ListenerOptions::default()
                },
                move |_, _| log.borrow_mut().push(view),
            );
        }
        {
            let log = log.clone();
            tree.on(
                leaf,
                EventKind::MouseDown,
                ListenerOptions::default(),
                move |_, _| log.borrow_mut().push(leaf),
            );
        }

        let mut ev = event(EventKind::MouseDown, leaf);
        tree.dispatch_event(&mut ev);
        // Capture fired on the way down, exactly once per ancestor.
        assert_eq!(*log.borrow(), vec![host, layer, leaf]);
    }

    #[test]
    fn stop_propagation_halts_the_bubble() {
        let (mut tree, host, layer, leaf) = chain();
        let log = Rc::new(RefCell::new(vec![]));
        {
            let log = log.clone();
            tree.on(
                leaf,
                EventKind::MouseUp,
                ListenerOptions::default(),
                move |_, ev| {
                    log.borrow_mut().push(leaf);
                    ev.stop_propagation();
                },
            );
        }
        for view in [layer, host] {
            let log = log.clone();
            tree.on(
                view,
                EventKind::MouseUp,
                ListenerOptions::default(),
                move |_, _| log.borrow_mut().push(view),
            );
        }

        let mut ev = event(EventKind::MouseUp, leaf);
        assert!(tree.dispatch_event(&mut ev));
        assert_eq!(*log.borrow(), vec![leaf]);
    }

    #[test]
    fn bubbling_terminates_at_the_surface_host() {
        let mut tree = ViewTree::new();
        let outer = tree.create_view(ViewRole::Container);
        let host = tree.create_view(ViewRole::SurfaceHost);
        let leaf = tree.create_view(ViewRole::Graphic);
        tree.append_child(outer, host);
        tree.append_child(host, leaf);

        let log = Rc::new(RefCell::new(vec![]));
        for view in [outer, host] {
            let log = log.clone();
            tree.on(
                view,
                EventKind::MouseDown,
                ListenerOptions::default(),
                move |_, _| log.borrow_mut().push(view),
            );
        }

        let mut ev = event(EventKind::MouseDown, leaf);
        tree.dispatch_event(&mut ev);
        assert_eq!(*log.borrow(), vec![host], "host ends the chain");
    }

    #[test]
    fn prevent_default_reports_canceled() {
        let (mut tree, _host, _layer, leaf) = chain();
        tree.on(
            leaf,
            EventKind::MouseDown,
            ListenerOptions::default(),
            |_, ev| ev.prevent_default(),
        );
        let mut ev = event(EventKind::MouseDown, leaf);
        assert!(!tree.dispatch_event(&mut ev));
    }

    #[test]
    fn passive_listener_cannot_cancel() {
        let (mut tree, _host, _layer, leaf) = chain();
        tree.on(
            leaf,
            EventKind::TouchStart,
            ListenerOptions {
                passive: true,
                ..ListenerOptions::default()
            },
            |_, ev| ev.prevent_default(),
        );
        let mut ev = event(EventKind::TouchStart, leaf);
        assert!(tree.dispatch_event(&mut ev));
    }

    #[test]
    fn once_listener_fires_exactly_once() {
        let (mut tree, _host, _layer, leaf) = chain();
        let count = Rc::new(RefCell::new(0));
        {
            let count = count.clone();
            tree.on(
                leaf,
                EventKind::MouseDown,
                ListenerOptions {
                    once: true,
                    ..ListenerOptions::default()
                },
                move |_, _| *count.borrow_mut() += 1,
            );
        }

        tree.dispatch_event(&mut event(EventKind::MouseDown, leaf));
        tree.dispatch_event(&mut event(EventKind::MouseDown, leaf));
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn off_removes_a_listener() {
        let (mut tree, _host, _layer, leaf) = chain();
        let count = Rc::new(RefCell::new(0));
        let id = {
            let count = count.clone();
            tree.on(
                leaf,
                EventKind::MouseDown,
                ListenerOptions::default(),
                move |_, _| *count.borrow_mut() += 1,
            )
        };

        assert!(tree.off(leaf, id));
        assert!(!tree.off(leaf, id), "second removal finds nothing");
        tree.dispatch_event(&mut event(EventKind::MouseDown, leaf));
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn kind_filter_excludes_other_kinds() {
        let (mut tree, _host, _layer, leaf) = chain();
        let count = Rc::new(RefCell::new(0));
        {
            let count = count.clone();
            tree.on(
                leaf,
                EventKind::MouseDown,
                ListenerOptions::default(),
                move |_, _| *count.borrow_mut() += 1,
            );
        }
        tree.dispatch_event(&mut event(EventKind::MouseUp, leaf));
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn stale_target_dispatches_nothing() {
        let (mut tree, _host, _layer, leaf) = chain();
        tree.remove_from_parent(leaf);
        tree.destroy_view(leaf);
        let mut ev = event(EventKind::MouseDown, leaf);
        assert!(tree.dispatch_event(&mut ev));
    }

    #[test]
    fn listener_may_mutate_the_tree() {
        let (mut tree, _host, layer, leaf) = chain();
        tree.on(
            leaf,
            EventKind::MouseDown,
            ListenerOptions::default(),
            move |tree, ev| {
                tree.remove_from_parent(ev.target());
            },
        );
        tree.dispatch_event(&mut event(EventKind::MouseDown, leaf));
        assert_eq!(tree.parent(leaf), None);
        assert!(tree.children(layer).next().is_none());
    }
}
