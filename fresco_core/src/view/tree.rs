// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays view storage with topology, keys, and lifecycle.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;

use kurbo::Rect;

use crate::event::ListenerEntry;
use crate::flags::ViewFlags;
use crate::schedule::UpdateScheduler;

use super::hooks::{HookBox, ViewObserver, ViewRole};
use super::id::{INVALID, ViewId};
use super::traverse::{Children, ChildrenRev};

/// Struct-of-arrays storage for all views.
///
/// Views are addressed by [`ViewId`] handles. Internally, each view
/// occupies a slot in parallel arrays. Destroyed views are recycled via a
/// free list, and generation counters prevent stale handle access.
#[derive(Debug)]
pub struct ViewTree {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Per-view data --
    pub(crate) key: Vec<Option<String>>,
    pub(crate) child_by_key: Vec<BTreeMap<String, u32>>,
    pub(crate) flags: Vec<ViewFlags>,
    pub(crate) role: Vec<ViewRole>,
    pub(crate) frame: Vec<Option<Rect>>,
    pub(crate) own_bounds: Vec<Option<Rect>>,
    pub(crate) hooks: Vec<Option<HookBox>>,
    pub(crate) observers: Vec<Vec<Rc<dyn ViewObserver>>>,
    pub(crate) listeners: Vec<Vec<ListenerEntry>>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Update coalescing --
    pub(crate) scheduler: UpdateScheduler,
    pub(crate) next_listener_id: u64,
}

impl Default for ViewTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewTree {
    /// Creates an empty view tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            key: Vec::new(),
            child_by_key: Vec::new(),
            flags: Vec::new(),
            role: Vec::new(),
            frame: Vec::new(),
            own_bounds: Vec::new(),
            hooks: Vec::new(),
            observers: Vec::new(),
            listeners: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            scheduler: UpdateScheduler::new(),
            next_listener_id: 0,
        }
    }

    // -- Allocation API --

    /// Creates a new detached view of the given role and returns its
    /// handle.
    ///
    /// The view starts with empty flags, no key, no frame, no bounds, no
    /// hooks, and no parent.
    pub fn create_view(&mut self, role: ViewRole) -> ViewId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot.
            let slot = idx as usize;
            self.generation[slot] += 1;
            self.parent[slot] = INVALID;
            self.first_child[slot] = INVALID;
            self.next_sibling[slot] = INVALID;
            self.prev_sibling[slot] = INVALID;
            self.key[slot] = None;
            self.child_by_key[slot].clear();
            self.flags[slot] = ViewFlags::empty();
            self.role[slot] = role;
            self.frame[slot] = None;
            self.own_bounds[slot] = None;
            self.hooks[slot] = None;
            self.observers[slot].clear();
            self.listeners[slot].clear();
            idx
        } else {
            // Allocate a new slot.
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.key.push(None);
            self.child_by_key.push(BTreeMap::new());
            self.flags.push(ViewFlags::empty());
            self.role.push(role);
            self.frame.push(None);
            self.own_bounds.push(None);
            self.hooks.push(None);
            self.observers.push(Vec::new());
            self.listeners.push(Vec::new());
            self.generation.push(0);
            idx
        };

        ViewId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Destroys a detached view, freeing its slot for reuse.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, if the view is still attached to a
    /// parent or mounted, if it has children (remove them first), or if a
    /// cascade is currently visiting it.
    pub fn destroy_view(&mut self, id: ViewId) {
        self.validate(id);
        let idx = id.idx;
        let slot = idx as usize;
        assert!(
            self.parent[slot] == INVALID,
            "cannot destroy an attached view; remove it from its parent first"
        );
        assert!(
            self.first_child[slot] == INVALID,
            "cannot destroy view with children"
        );
        assert!(
            !self.flags[slot].contains(ViewFlags::MOUNTED),
            "cannot destroy a mounted view"
        );
        assert!(
            !self.flags[slot].contains(ViewFlags::TRAVERSING),
            "cannot destroy a view mid-traversal"
        );

        self.key[slot] = None;
        self.child_by_key[slot].clear();
        self.flags[slot] = ViewFlags::empty();
        self.frame[slot] = None;
        self.own_bounds[slot] = None;
        self.hooks[slot] = None;
        self.observers[slot].clear();
        self.listeners[slot].clear();

        // Bump generation so old handles immediately fail validation.
        self.generation[slot] += 1;
        self.free_list.push(idx);
    }

    /// Returns whether the given handle refers to a live view.
    #[must_use]
    pub fn is_alive(&self, id: ViewId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    // -- Topology API --

    /// Appends `child` as the last child of `parent`.
    ///
    /// If `parent` is mounted, the attached subtree is mounted. The
    /// parent is marked as needing layout and render.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, if `child` already has a
    /// parent, or if `child`'s key duplicates an existing sibling key.
    pub fn append_child(&mut self, parent: ViewId, child: ViewId) {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );

        self.register_key(p, c);
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            // Walk to last child.
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }

        self.after_attach(p, c);
    }

    /// Inserts `child` as the first child of `parent`.
    ///
    /// # Panics
    ///
    /// Same preconditions as [`append_child`](Self::append_child).
    pub fn prepend_child(&mut self, parent: ViewId, child: ViewId) {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );

        self.register_key(p, c);
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = self.first_child[p as usize];
        if self.first_child[p as usize] != INVALID {
            self.prev_sibling[self.first_child[p as usize] as usize] = c;
        }
        self.first_child[p as usize] = c;

        self.after_attach(p, c);
    }

    /// Inserts `child` immediately before `sibling` in the sibling list.
    ///
    /// # Panics
    ///
    /// Panics if handles are stale, `child` already has a parent,
    /// `sibling` has no parent, or the key duplicates a sibling key.
    pub fn insert_before(&mut self, child: ViewId, sibling: ViewId) {
        self.validate(child);
        self.validate(sibling);
        let c = child.idx;
        let s = sibling.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        let p = self.parent[s as usize];
        assert!(p != INVALID, "sibling has no parent");

        self.register_key(p, c);
        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = s;
        self.prev_sibling[c as usize] = self.prev_sibling[s as usize];

        if self.prev_sibling[s as usize] != INVALID {
            self.next_sibling[self.prev_sibling[s as usize] as usize] = c;
        } else {
            // `sibling` was the first child.
            self.first_child[p as usize] = c;
        }
        self.prev_sibling[s as usize] = c;

        self.after_attach(p, c);
    }

    /// Replaces the child of `parent` identified by `key` with `child`,
    /// preserving its position. If no child carries `key`, `child` is
    /// appended instead.
    ///
    /// Returns the displaced view, now detached, or `None` if nothing
    /// was replaced. `child` adopts `key` as its own.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, `child` already has a parent,
    /// or a cascade is currently visiting the displaced view.
    pub fn replace_child(&mut self, parent: ViewId, key: &str, child: ViewId) -> Option<ViewId> {
        self.validate(parent);
        self.validate(child);
        assert!(
            self.parent[child.idx as usize] == INVALID,
            "child already has a parent"
        );

        self.set_key(child, Some(String::from(key)));
        let Some(&old_idx) = self.child_by_key[parent.idx as usize].get(key) else {
            self.append_child(parent, child);
            return None;
        };
        assert!(
            !self.flags[old_idx as usize].contains(ViewFlags::TRAVERSING),
            "cannot replace a view mid-traversal"
        );

        let old = self.id_at(old_idx);
        let anchor = self.next_sibling[old_idx as usize];
        self.remove_now(old_idx);
        if anchor == INVALID {
            self.append_child(parent, child);
        } else {
            self.insert_before(child, self.id_at(anchor));
        }
        Some(old)
    }

    /// Removes `child` from its current parent, unmounting it if it was
    /// mounted and resetting its flags.
    ///
    /// If a cascade is currently visiting `child`, the detach is
    /// deferred: the view is marked as removing and the cascade performs
    /// the removal when its visit unwinds.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the view has no parent.
    pub fn remove_from_parent(&mut self, child: ViewId) {
        self.validate(child);
        let c = child.idx;
        assert!(self.parent[c as usize] != INVALID, "view has no parent");

        if self.flags[c as usize].contains(ViewFlags::TRAVERSING) {
            self.flags[c as usize] |= ViewFlags::REMOVING;
            return;
        }
        self.remove_now(c);
    }

    /// Detaches the view at `idx` immediately: unmounts, unlinks, and
    /// invalidates the old parent.
    pub(crate) fn remove_now(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        if self.flags[idx as usize].contains(ViewFlags::MOUNTED) {
            self.unmount_subtree(idx);
        }
        self.flags[idx as usize] &= !ViewFlags::REMOVING;
        self.unlink_from_parent(idx);
        if p != INVALID {
            self.require_update_at(p, ViewFlags::NEEDS_LAYOUT | ViewFlags::NEEDS_RENDER);
        }
    }

    /// Returns the parent of a view, if any.
    #[must_use]
    pub fn parent(&self, id: ViewId) -> Option<ViewId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        if p == INVALID {
            None
        } else {
            Some(self.id_at(p))
        }
    }

    /// Returns an iterator over the direct children of a view, in
    /// painting order.
    #[must_use]
    pub fn children(&self, id: ViewId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns an iterator over the direct children of a view, topmost
    /// first.
    #[must_use]
    pub fn children_rev(&self, id: ViewId) -> ChildrenRev<'_> {
        self.validate(id);
        ChildrenRev::new(self, self.first_child[id.idx as usize])
    }

    /// Looks up the child of `parent` carrying `key`.
    #[must_use]
    pub fn child_by_key(&self, parent: ViewId, key: &str) -> Option<ViewId> {
        self.validate(parent);
        self.child_by_key[parent.idx as usize]
            .get(key)
            .map(|&idx| self.id_at(idx))
    }

    /// Returns the nearest surface-hosting ancestor of `id`, or the tree
    /// root of `id` if no ancestor hosts a surface. Event bubbling
    /// terminates here.
    #[must_use]
    pub fn dispatch_root(&self, id: ViewId) -> ViewId {
        self.validate(id);
        let mut idx = id.idx;
        loop {
            if self.role[idx as usize] == ViewRole::SurfaceHost {
                return self.id_at(idx);
            }
            let p = self.parent[idx as usize];
            if p == INVALID {
                return self.id_at(idx);
            }
            idx = p;
        }
    }

    // -- Per-view properties --

    /// Returns the view's sibling key, if any.
    #[must_use]
    pub fn key(&self, id: ViewId) -> Option<&str> {
        self.validate(id);
        self.key[id.idx as usize].as_deref()
    }

    /// Sets or clears the view's sibling key, keeping the parent's
    /// lookup map in sync.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the new key duplicates an
    /// existing sibling key.
    pub fn set_key(&mut self, id: ViewId, key: Option<String>) {
        self.validate(id);
        let idx = id.idx;
        let p = self.parent[idx as usize];
        if p != INVALID {
            if let Some(new) = &key {
                let existing = self.child_by_key[p as usize].get(new);
                assert!(
                    existing.is_none() || existing == Some(&idx),
                    "duplicate key among siblings"
                );
            }
            if let Some(old) = self.key[idx as usize].take() {
                self.child_by_key[p as usize].remove(&old);
            }
            if let Some(new) = &key {
                self.child_by_key[p as usize].insert(new.clone(), idx);
            }
        }
        self.key[idx as usize] = key;
    }

    /// Returns the view's current flags.
    #[must_use]
    pub fn flags(&self, id: ViewId) -> ViewFlags {
        self.validate(id);
        self.flags[id.idx as usize]
    }

    /// Returns the view's structural role.
    #[must_use]
    pub fn role(&self, id: ViewId) -> ViewRole {
        self.validate(id);
        self.role[id.idx as usize]
    }

    /// Returns the parent-assigned frame rectangle, if layout has
    /// assigned one.
    #[must_use]
    pub fn frame(&self, id: ViewId) -> Option<Rect> {
        self.validate(id);
        self.frame[id.idx as usize]
    }

    /// Assigns the view's frame rectangle (surface coordinates).
    ///
    /// Layout hooks call this for their children; it does not itself
    /// request an update, so a frame written mid-cascade is picked up by
    /// the layout stage already running. Callers assigning frames
    /// outside a cascade pair this with
    /// [`require_update`](Self::require_update).
    pub fn set_frame(&mut self, id: ViewId, frame: Rect) {
        self.validate(id);
        self.frame[id.idx as usize] = Some(frame);
    }

    /// Returns the view's self-reported paint extent, if any.
    #[must_use]
    pub fn own_bounds(&self, id: ViewId) -> Option<Rect> {
        self.validate(id);
        self.own_bounds[id.idx as usize]
    }

    /// Sets or clears the view's self-reported paint extent.
    pub fn set_own_bounds(&mut self, id: ViewId, bounds: Option<Rect>) {
        self.validate(id);
        self.own_bounds[id.idx as usize] = bounds;
    }

    /// Returns whether the view is hidden (applied hide only; a pending
    /// hide request does not count until the change stage applies it).
    #[must_use]
    pub fn is_hidden(&self, id: ViewId) -> bool {
        self.flags(id).contains(ViewFlags::HIDDEN)
    }

    /// Requests a hide, or unhides immediately.
    ///
    /// Hiding is deferred to the next change stage so that observers see
    /// it as part of an update pass; unhiding takes effect immediately.
    /// Both invalidate rendering.
    pub fn set_hidden(&mut self, id: ViewId, hidden: bool) {
        self.validate(id);
        let slot = id.idx as usize;
        if hidden {
            if self.flags[slot].intersects(ViewFlags::HIDDEN | ViewFlags::HIDE_REQUESTED) {
                return;
            }
            self.flags[slot] |= ViewFlags::HIDE_REQUESTED;
            self.require_update(
                id,
                ViewFlags::NEEDS_CHANGE | ViewFlags::NEEDS_RENDER | ViewFlags::NEEDS_COMPOSITE,
            );
        } else {
            if !self.flags[slot].intersects(ViewFlags::HIDDEN | ViewFlags::HIDE_REQUESTED) {
                return;
            }
            self.flags[slot] &= !(ViewFlags::HIDDEN | ViewFlags::HIDE_REQUESTED);
            self.require_update(id, ViewFlags::NEEDS_RENDER | ViewFlags::NEEDS_COMPOSITE);
        }
    }

    /// Returns whether the view is culled.
    #[must_use]
    pub fn is_culled(&self, id: ViewId) -> bool {
        self.flags(id).contains(ViewFlags::CULLED)
    }

    /// Marks the view as inside or outside the visible/interactive
    /// region. Culled subtrees are skipped by the display cascade and by
    /// hit testing.
    pub fn set_culled(&mut self, id: ViewId, culled: bool) {
        self.validate(id);
        let slot = id.idx as usize;
        if self.flags[slot].contains(ViewFlags::CULLED) == culled {
            return;
        }
        self.flags[slot].set(ViewFlags::CULLED, culled);
        self.require_update(id, ViewFlags::NEEDS_RENDER | ViewFlags::NEEDS_COMPOSITE);
    }

    /// Returns whether the view is exempt from self hit-testing.
    #[must_use]
    pub fn is_intangible(&self, id: ViewId) -> bool {
        self.flags(id).contains(ViewFlags::INTANGIBLE)
    }

    /// Exempts the view itself from hit-testing (children are still
    /// tested).
    pub fn set_intangible(&mut self, id: ViewId, intangible: bool) {
        self.validate(id);
        self.flags[id.idx as usize].set(ViewFlags::INTANGIBLE, intangible);
    }

    // -- Update requests --

    /// Marks the view (and every ancestor) as needing the given update
    /// stages, and records the request for tick coalescing.
    ///
    /// Only needs bits are honored; structural bits in `flags` are
    /// ignored. Requests made from inside a stage hook land on the
    /// *next* tick for that stage, because the current pass clears the
    /// stage bit before invoking hooks.
    pub fn require_update(&mut self, id: ViewId, flags: ViewFlags) {
        self.validate(id);
        self.require_update_at(id.idx, flags);
    }

    pub(crate) fn require_update_at(&mut self, idx: u32, flags: ViewFlags) {
        let req = flags & ViewFlags::UPDATE_MASK;
        if req.is_empty() {
            return;
        }
        // Propagate to the root unconditionally: a cascade may be
        // mid-flight with ancestor bits already cleared, so stopping at
        // a satisfied ancestor could strand the request below the root.
        let mut cursor = idx;
        loop {
            self.flags[cursor as usize] |= req;
            let p = self.parent[cursor as usize];
            if p == INVALID {
                break;
            }
            cursor = p;
        }
        self.scheduler.request(req);
    }

    /// Returns whether an update tick is pending.
    #[must_use]
    pub fn update_pending(&self) -> bool {
        self.scheduler.is_scheduled()
    }

    /// Returns the coalesced pending update flags without consuming them.
    #[must_use]
    pub fn pending_updates(&self) -> ViewFlags {
        self.scheduler.pending()
    }

    /// Takes the coalesced pending update flags at the start of a tick.
    pub fn take_tick(&mut self) -> ViewFlags {
        self.scheduler.take_tick()
    }

    // -- Hooks and observers --

    /// Installs (or replaces) the view's hook table.
    pub fn set_hooks(&mut self, id: ViewId, hooks: HookBox) {
        self.validate(id);
        self.hooks[id.idx as usize] = Some(hooks);
    }

    /// Registers an observer for the view's will/did notifications.
    pub fn add_observer(&mut self, id: ViewId, observer: Rc<dyn ViewObserver>) {
        self.validate(id);
        self.observers[id.idx as usize].push(observer);
    }

    /// Unregisters a previously added observer (by identity). Returns
    /// whether it was found.
    pub fn remove_observer(&mut self, id: ViewId, observer: &Rc<dyn ViewObserver>) -> bool {
        self.validate(id);
        let list = &mut self.observers[id.idx as usize];
        let before = list.len();
        list.retain(|o| !Rc::ptr_eq(o, observer));
        list.len() != before
    }

    // -- Mount lifecycle --

    /// Returns whether the view is attached to a mounted root.
    #[must_use]
    pub fn is_mounted(&self, id: ViewId) -> bool {
        self.flags(id).contains(ViewFlags::MOUNTED)
    }

    /// Mounts a detached root view and its subtree.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, the view has a parent, or it is
    /// already mounted.
    pub fn mount(&mut self, id: ViewId) {
        self.validate(id);
        assert!(
            self.parent[id.idx as usize] == INVALID,
            "only a root view can be mounted directly"
        );
        assert!(
            !self.flags[id.idx as usize].contains(ViewFlags::MOUNTED),
            "view is already mounted"
        );
        self.mount_subtree(id.idx);
    }

    /// Unmounts a mounted root view and its subtree, resetting flags.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, the view has a parent, or it is
    /// not mounted.
    pub fn unmount(&mut self, id: ViewId) {
        self.validate(id);
        assert!(
            self.parent[id.idx as usize] == INVALID,
            "only a root view can be unmounted directly"
        );
        assert!(
            self.flags[id.idx as usize].contains(ViewFlags::MOUNTED),
            "view is not mounted"
        );
        self.unmount_subtree(id.idx);
    }

    /// Pre-order mount: flag, hook, observers, then children.
    pub(crate) fn mount_subtree(&mut self, idx: u32) {
        self.flags[idx as usize] |= ViewFlags::MOUNTED;
        let id = self.id_at(idx);

        let mut hooks = self.hooks[idx as usize].take();
        if let Some(h) = hooks.as_deref_mut() {
            h.on_mount(id, self);
        }
        self.restore_hooks(idx, hooks);

        let observers = self.observers[idx as usize].clone();
        for observer in &observers {
            observer.view_did_mount(id);
        }

        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            // Capture the next link first; mount hooks may mutate.
            let next = self.next_sibling[child as usize];
            self.mount_subtree(child);
            child = next;
        }
    }

    /// Post-order unmount: children, then hook, observers, flags reset.
    pub(crate) fn unmount_subtree(&mut self, idx: u32) {
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            let next = self.next_sibling[child as usize];
            self.unmount_subtree(child);
            child = next;
        }

        let id = self.id_at(idx);
        let mut hooks = self.hooks[idx as usize].take();
        if let Some(h) = hooks.as_deref_mut() {
            h.on_unmount(id, self);
        }
        self.restore_hooks(idx, hooks);

        let observers = self.observers[idx as usize].clone();
        for observer in &observers {
            observer.view_did_unmount(id);
        }

        // All state bits reset on unmount, including pending needs.
        self.flags[idx as usize] = ViewFlags::empty();
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: ViewId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale ViewId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    /// Builds a live handle for a slot index.
    pub(crate) fn id_at(&self, idx: u32) -> ViewId {
        ViewId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Puts a taken hook table back into its slot. If a hook installed a
    /// replacement mid-visit, the replacement wins and the taken table
    /// is dropped.
    pub(crate) fn restore_hooks(&mut self, idx: u32, hooks: Option<HookBox>) {
        let slot = &mut self.hooks[idx as usize];
        if slot.is_none() {
            *slot = hooks;
        }
    }

    /// Registers the child's key in the parent's lookup map before
    /// linking.
    fn register_key(&mut self, p: u32, c: u32) {
        if let Some(k) = &self.key[c as usize] {
            assert!(
                !self.child_by_key[p as usize].contains_key(k),
                "duplicate key among siblings"
            );
            self.child_by_key[p as usize].insert(k.clone(), c);
        }
    }

    /// Post-link bookkeeping shared by all attach operations.
    fn after_attach(&mut self, p: u32, c: u32) {
        if self.flags[p as usize].contains(ViewFlags::MOUNTED) {
            self.mount_subtree(c);
        }
        self.require_update_at(p, ViewFlags::NEEDS_LAYOUT | ViewFlags::NEEDS_RENDER);
    }

    /// Removes `idx` from its parent's child list and key map.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if let Some(k) = &self.key[idx as usize] {
            let removed = self.child_by_key[p as usize].remove(k);
            debug_assert_eq!(removed, Some(idx), "key map out of sync with sibling list");
        }

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            // Was first child.
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }
}
