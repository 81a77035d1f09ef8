// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The process pass: resize → scroll → change → animate.

use crate::context::ViewContext;
use crate::flags::ViewFlags;
use crate::time::HostTime;
use crate::view::{
    CascadeResult, CascadeStage, INVALID, PROCESS_STAGES, ViewHooks, ViewId, ViewRole, ViewTree,
};

use super::ProcessPass;

impl ViewTree {
    /// Runs the process pass over the subtree rooted at `root`.
    ///
    /// `flags` is the externally supplied stage set (usually empty — the
    /// persisted needs bits drive the pass); `time` is the semantic time
    /// the animate stage advances to.
    ///
    /// # Errors
    ///
    /// Propagates the first hook error. Transient traversal flags are
    /// cleared on the way out; needs bits being serviced may remain
    /// partially cleared, to be re-evaluated by the next tick.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn cascade_process(
        &mut self,
        root: ViewId,
        flags: ViewFlags,
        ctx: &ViewContext,
        time: HostTime,
    ) -> CascadeResult {
        self.validate(root);
        self.process_view(root.idx, flags & ViewFlags::PROCESS_MASK, ctx, time)
    }

    fn process_view(
        &mut self,
        idx: u32,
        incoming: ViewFlags,
        inherited: &ViewContext,
        time: HostTime,
    ) -> CascadeResult {
        let slot = idx as usize;
        let id = self.id_at(idx);
        let ctx = match self.frame[slot] {
            Some(frame) => inherited.extended(frame),
            None => *inherited,
        };

        let mut hooks = self.hooks[slot].take();
        let mut effective = (incoming | self.flags[slot]) & ViewFlags::PROCESS_MASK;
        if let Some(h) = hooks.as_deref_mut() {
            effective = h.needs_process(id, effective) & ViewFlags::PROCESS_MASK;
        }
        if effective.is_empty() {
            self.restore_hooks(idx, hooks);
            return Ok(());
        }

        // Any process invalidation also invalidates a surface host's
        // raster: the backing pixels must repaint and re-composite.
        if self.role[slot] == ViewRole::SurfaceHost {
            self.flags[slot] |= ViewFlags::NEEDS_RENDER | ViewFlags::NEEDS_COMPOSITE;
        }

        self.flags[slot] |= ViewFlags::TRAVERSING | ViewFlags::PROCESSING;
        let mut pass = ProcessPass::new(ctx, time, effective);
        let result = self.process_stages(idx, id, hooks.as_deref_mut(), &mut pass);
        // Unconditional cleanup: a hook error must not leave the view
        // stuck in a traversing state.
        self.flags[idx as usize] &= !ViewFlags::TRANSIENT_MASK;
        self.restore_hooks(idx, hooks);
        result
    }

    fn process_stages(
        &mut self,
        idx: u32,
        id: ViewId,
        mut hooks: Option<&mut (dyn ViewHooks + 'static)>,
        pass: &mut ProcessPass,
    ) -> CascadeResult {
        let slot = idx as usize;
        let observers = self.observers[slot].clone();
        let mut ran = ViewFlags::empty();

        // Will phase, in stage order. Pass flags are re-read per stage so
        // an earlier hook can escalate a later stage into this tick.
        for stage in PROCESS_STAGES {
            let bit = stage.flag();
            if pass.flags().contains(bit) {
                self.flags[slot] &= !bit;
                ran |= bit;
                for observer in &observers {
                    observer.view_will_stage(id, stage);
                }
                if let Some(h) = hooks.as_deref_mut() {
                    will_process(h, stage, id, self, pass)?;
                }
            }
        }

        // On phase. A stage escalated after its will slot passed gets its
        // will immediately before its on, preserving relative order.
        for stage in PROCESS_STAGES {
            let bit = stage.flag();
            if !ran.contains(bit) && pass.flags().contains(bit) {
                self.flags[slot] &= !bit;
                ran |= bit;
                for observer in &observers {
                    observer.view_will_stage(id, stage);
                }
                if let Some(h) = hooks.as_deref_mut() {
                    will_process(h, stage, id, self, pass)?;
                }
            }
            if ran.contains(bit) {
                self.process_structural(idx, stage);
                if let Some(h) = hooks.as_deref_mut() {
                    on_process(h, stage, id, self, pass)?;
                }
            }
        }

        // Recurse with the union of the stages serviced at this view;
        // children re-decide via their own flags and needs hooks.
        let mut child = self.first_child[slot];
        while child != INVALID {
            let next = self.next_sibling[child as usize];
            let child_result = self.process_view(child, ran, &pass.context, pass.time);
            if self.flags[child as usize].contains(ViewFlags::REMOVING) {
                self.remove_now(child);
            }
            child_result?;
            // A hook may have detached the captured link; stop rather
            // than walk a stale chain — the mutation marked this view
            // dirty, so remaining siblings are serviced next tick.
            if next != INVALID && self.parent[next as usize] != idx {
                break;
            }
            child = next;
        }

        // Did phase unwinds in reverse stage order.
        for stage in PROCESS_STAGES.iter().rev() {
            if ran.contains(stage.flag()) {
                if let Some(h) = hooks.as_deref_mut() {
                    did_process(h, *stage, id, self, pass)?;
                }
                for observer in &observers {
                    observer.view_did_stage(id, *stage);
                }
            }
        }
        Ok(())
    }

    /// Non-overridable stage bodies of the process pass.
    fn process_structural(&mut self, idx: u32, stage: CascadeStage) {
        let slot = idx as usize;
        if stage == CascadeStage::Change && self.flags[slot].contains(ViewFlags::HIDE_REQUESTED) {
            self.flags[slot] &= !ViewFlags::HIDE_REQUESTED;
            self.flags[slot] |= ViewFlags::HIDDEN;
        }
    }
}

fn will_process(
    h: &mut dyn ViewHooks,
    stage: CascadeStage,
    id: ViewId,
    tree: &mut ViewTree,
    pass: &mut ProcessPass,
) -> CascadeResult {
    match stage {
        CascadeStage::Resize => h.will_resize(id, tree, pass),
        CascadeStage::Scroll => h.will_scroll(id, tree, pass),
        CascadeStage::Change => h.will_change(id, tree, pass),
        CascadeStage::Animate => h.will_animate(id, tree, pass),
        _ => Ok(()),
    }
}

fn on_process(
    h: &mut dyn ViewHooks,
    stage: CascadeStage,
    id: ViewId,
    tree: &mut ViewTree,
    pass: &mut ProcessPass,
) -> CascadeResult {
    match stage {
        CascadeStage::Resize => h.on_resize(id, tree, pass),
        CascadeStage::Scroll => h.on_scroll(id, tree, pass),
        CascadeStage::Change => h.on_change(id, tree, pass),
        CascadeStage::Animate => h.on_animate(id, tree, pass),
        _ => Ok(()),
    }
}

fn did_process(
    h: &mut dyn ViewHooks,
    stage: CascadeStage,
    id: ViewId,
    tree: &mut ViewTree,
    pass: &mut ProcessPass,
) -> CascadeResult {
    match stage {
        CascadeStage::Resize => h.did_resize(id, tree, pass),
        CascadeStage::Scroll => h.did_scroll(id, tree, pass),
        CascadeStage::Change => h.did_change(id, tree, pass),
        CascadeStage::Animate => h.did_animate(id, tree, pass),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use crate::view::{CascadeError, ViewObserver};

    use super::*;

    /// Records every will/did notification it hears.
    #[derive(Default)]
    struct Recorder {
        log: RefCell<Vec<(ViewId, CascadeStage, bool)>>,
    }

    impl ViewObserver for Recorder {
        fn view_will_stage(&self, view: ViewId, stage: CascadeStage) {
            self.log.borrow_mut().push((view, stage, false));
        }
        fn view_did_stage(&self, view: ViewId, stage: CascadeStage) {
            self.log.borrow_mut().push((view, stage, true));
        }
    }

    fn ctx() -> ViewContext {
        ViewContext::default()
    }

    #[test]
    fn clean_tree_fires_no_hooks() {
        let mut tree = ViewTree::new();
        let root = tree.create_view(ViewRole::Container);
        let child = tree.create_view(ViewRole::Container);
        tree.append_child(root, child);
        // Clear the attach-time dirt.
        tree.flags[root.idx as usize] = ViewFlags::empty();
        tree.flags[child.idx as usize] = ViewFlags::empty();

        let recorder = Rc::new(Recorder::default());
        tree.add_observer(root, recorder.clone());
        tree.add_observer(child, recorder.clone());

        tree.cascade_process(root, ViewFlags::empty(), &ctx(), HostTime(0))
            .unwrap();
        assert!(recorder.log.borrow().is_empty(), "no stage may run");
    }

    #[test]
    fn stages_run_in_order_and_unwind_reversed() {
        let mut tree = ViewTree::new();
        let root = tree.create_view(ViewRole::Container);
        let recorder = Rc::new(Recorder::default());
        tree.add_observer(root, recorder.clone());

        tree.require_update(
            root,
            ViewFlags::NEEDS_SCROLL | ViewFlags::NEEDS_ANIMATE | ViewFlags::NEEDS_CHANGE,
        );
        tree.cascade_process(root, ViewFlags::empty(), &ctx(), HostTime(0))
            .unwrap();

        let log = recorder.log.borrow();
        let wills: Vec<_> = log.iter().filter(|e| !e.2).map(|e| e.1).collect();
        let dids: Vec<_> = log.iter().filter(|e| e.2).map(|e| e.1).collect();
        assert_eq!(
            wills,
            [
                CascadeStage::Scroll,
                CascadeStage::Change,
                CascadeStage::Animate
            ]
        );
        assert_eq!(
            dids,
            [
                CascadeStage::Animate,
                CascadeStage::Change,
                CascadeStage::Scroll
            ]
        );
    }

    #[test]
    fn serviced_bits_are_cleared() {
        let mut tree = ViewTree::new();
        let root = tree.create_view(ViewRole::Container);
        tree.require_update(root, ViewFlags::NEEDS_ANIMATE);
        tree.cascade_process(root, ViewFlags::empty(), &ctx(), HostTime(0))
            .unwrap();
        assert!(!tree.flags(root).contains(ViewFlags::NEEDS_ANIMATE));
        assert!(!tree.flags(root).intersects(ViewFlags::TRANSIENT_MASK));
    }

    /// A hook that re-requests its own stage from inside the stage.
    struct SelfRequester {
        runs: Rc<RefCell<u32>>,
        dids: Rc<RefCell<u32>>,
    }

    impl ViewHooks for SelfRequester {
        fn on_animate(
            &mut self,
            view: ViewId,
            tree: &mut ViewTree,
            _pass: &mut ProcessPass,
        ) -> CascadeResult {
            *self.runs.borrow_mut() += 1;
            tree.require_update(view, ViewFlags::NEEDS_ANIMATE);
            Ok(())
        }
        fn did_animate(
            &mut self,
            _view: ViewId,
            _tree: &mut ViewTree,
            _pass: &mut ProcessPass,
        ) -> CascadeResult {
            *self.dids.borrow_mut() += 1;
            Ok(())
        }
    }

    #[test]
    fn self_request_defers_to_next_tick() {
        let mut tree = ViewTree::new();
        let root = tree.create_view(ViewRole::Container);
        let runs = Rc::new(RefCell::new(0));
        let dids = Rc::new(RefCell::new(0));
        tree.set_hooks(
            root,
            alloc::boxed::Box::new(SelfRequester {
                runs: runs.clone(),
                dids: dids.clone(),
            }),
        );

        tree.require_update(root, ViewFlags::NEEDS_ANIMATE);
        tree.cascade_process(root, ViewFlags::empty(), &ctx(), HostTime(0))
            .unwrap();
        assert_eq!(*runs.borrow(), 1, "stage must not re-run this tick");
        assert_eq!(*dids.borrow(), 1, "did hook fires exactly once");
        assert!(
            tree.flags(root).contains(ViewFlags::NEEDS_ANIMATE),
            "re-request lands on the next tick"
        );

        tree.cascade_process(root, ViewFlags::empty(), &ctx(), HostTime(1))
            .unwrap();
        assert_eq!(*runs.borrow(), 2);
    }

    /// A hook that escalates the animate stage during the change stage.
    struct Escalator {
        animated: Rc<RefCell<bool>>,
    }

    impl ViewHooks for Escalator {
        fn on_change(
            &mut self,
            _view: ViewId,
            _tree: &mut ViewTree,
            pass: &mut ProcessPass,
        ) -> CascadeResult {
            pass.escalate(ViewFlags::NEEDS_ANIMATE);
            Ok(())
        }
        fn on_animate(
            &mut self,
            _view: ViewId,
            _tree: &mut ViewTree,
            _pass: &mut ProcessPass,
        ) -> CascadeResult {
            *self.animated.borrow_mut() = true;
            Ok(())
        }
    }

    #[test]
    fn escalation_reaches_later_stages_this_tick() {
        let mut tree = ViewTree::new();
        let root = tree.create_view(ViewRole::Container);
        let animated = Rc::new(RefCell::new(false));
        tree.set_hooks(
            root,
            alloc::boxed::Box::new(Escalator {
                animated: animated.clone(),
            }),
        );

        tree.require_update(root, ViewFlags::NEEDS_CHANGE);
        tree.cascade_process(root, ViewFlags::empty(), &ctx(), HostTime(0))
            .unwrap();
        assert!(*animated.borrow(), "escalated stage runs in the same tick");
        assert!(!tree.flags(root).contains(ViewFlags::NEEDS_ANIMATE));
    }

    #[test]
    fn children_receive_the_serviced_union() {
        let mut tree = ViewTree::new();
        let root = tree.create_view(ViewRole::Container);
        let child = tree.create_view(ViewRole::Container);
        tree.append_child(root, child);
        tree.flags[root.idx as usize] = ViewFlags::empty();
        tree.flags[child.idx as usize] = ViewFlags::empty();

        let recorder = Rc::new(Recorder::default());
        tree.add_observer(child, recorder.clone());

        // Root animates; the child has no own bits but receives the
        // union and decides through its flags — which are clear, so its
        // effective set equals the incoming union and the stage runs.
        tree.require_update(root, ViewFlags::NEEDS_ANIMATE);
        tree.flags[child.idx as usize] = ViewFlags::empty();
        tree.cascade_process(root, ViewFlags::empty(), &ctx(), HostTime(0))
            .unwrap();

        let stages: Vec<_> = recorder.log.borrow().iter().map(|e| e.1).collect();
        assert_eq!(stages, [CascadeStage::Animate, CascadeStage::Animate]);
    }

    #[test]
    fn change_stage_applies_pending_hide() {
        let mut tree = ViewTree::new();
        let root = tree.create_view(ViewRole::Container);
        tree.set_hidden(root, true);
        assert!(!tree.is_hidden(root));

        tree.cascade_process(root, ViewFlags::empty(), &ctx(), HostTime(0))
            .unwrap();
        assert!(tree.is_hidden(root));
        assert!(!tree.flags(root).contains(ViewFlags::HIDE_REQUESTED));
    }

    /// A hook whose will stage fails.
    struct Failing;

    impl ViewHooks for Failing {
        fn will_animate(
            &mut self,
            view: ViewId,
            _tree: &mut ViewTree,
            _pass: &mut ProcessPass,
        ) -> CascadeResult {
            Err(CascadeError::new(view, CascadeStage::Animate, "boom"))
        }
    }

    #[test]
    fn hook_error_propagates_but_clears_transient_flags() {
        let mut tree = ViewTree::new();
        let root = tree.create_view(ViewRole::Container);
        let child = tree.create_view(ViewRole::Container);
        tree.append_child(root, child);
        tree.set_hooks(child, alloc::boxed::Box::new(Failing));

        tree.require_update(child, ViewFlags::NEEDS_ANIMATE);
        let err = tree
            .cascade_process(root, ViewFlags::empty(), &ctx(), HostTime(0))
            .unwrap_err();
        assert_eq!(err.stage, CascadeStage::Animate);
        assert!(!tree.flags(root).intersects(ViewFlags::TRANSIENT_MASK));
        assert!(!tree.flags(child).intersects(ViewFlags::TRANSIENT_MASK));

        // A later tick is not blocked.
        tree.require_update(child, ViewFlags::NEEDS_CHANGE);
        let err = tree
            .cascade_process(root, ViewFlags::empty(), &ctx(), HostTime(1))
            .unwrap_err();
        assert_eq!(err.stage, CascadeStage::Animate);
    }

    /// A hook that removes its own view mid-visit.
    struct SelfRemover;

    impl ViewHooks for SelfRemover {
        fn on_animate(
            &mut self,
            view: ViewId,
            tree: &mut ViewTree,
            _pass: &mut ProcessPass,
        ) -> CascadeResult {
            tree.remove_from_parent(view);
            Ok(())
        }
    }

    #[test]
    fn removal_mid_visit_is_deferred_until_the_visit_unwinds() {
        let mut tree = ViewTree::new();
        let root = tree.create_view(ViewRole::Container);
        let child = tree.create_view(ViewRole::Container);
        tree.append_child(root, child);
        tree.set_hooks(child, alloc::boxed::Box::new(SelfRemover));

        tree.require_update(child, ViewFlags::NEEDS_ANIMATE);
        tree.cascade_process(root, ViewFlags::empty(), &ctx(), HostTime(0))
            .unwrap();

        assert_eq!(tree.parent(child), None, "deferred removal completed");
        assert!(tree.children(root).next().is_none());
        assert!(!tree.flags(child).contains(ViewFlags::REMOVING));
    }
}
