// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The display pass: layout → render → rasterize → composite.
//!
//! Rasterize sits between render and composite so a view can redraw its
//! cached off-screen content without re-running the full render stage;
//! on later ticks it merely re-composites (blits) the cached pixels
//! until invalidated.

use crate::context::ViewContext;
use crate::flags::ViewFlags;
use crate::render::Renderer;
use crate::sprite::SpriteService;
use crate::view::{
    CascadeResult, CascadeStage, DISPLAY_STAGES, INVALID, ViewHooks, ViewId, ViewRole, ViewTree,
};

use super::DisplayPass;

/// Stages whose hooks run with the contextual flag set: their dispatch
/// is leaf-level paint work.
const CONTEXTUAL_STAGES: ViewFlags = ViewFlags::NEEDS_RENDER
    .union(ViewFlags::NEEDS_RASTERIZE)
    .union(ViewFlags::NEEDS_COMPOSITE);

impl ViewTree {
    /// Runs the display pass over the subtree rooted at `root`, painting
    /// through `renderer`.
    ///
    /// # Errors
    ///
    /// Propagates the first hook error after clearing transient
    /// traversal flags; see
    /// [`cascade_process`](Self::cascade_process).
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn cascade_display(
        &mut self,
        root: ViewId,
        flags: ViewFlags,
        ctx: &ViewContext,
        renderer: &mut dyn Renderer,
        sprites: &mut SpriteService,
    ) -> CascadeResult {
        self.validate(root);
        self.display_view(
            root.idx,
            flags & ViewFlags::DISPLAY_MASK,
            ctx,
            renderer,
            sprites,
        )
    }

    fn display_view(
        &mut self,
        idx: u32,
        incoming: ViewFlags,
        inherited: &ViewContext,
        renderer: &mut dyn Renderer,
        sprites: &mut SpriteService,
    ) -> CascadeResult {
        let slot = idx as usize;
        // Culled subtrees are excluded from display entirely; their
        // needs bits stay pending until unculled.
        if self.flags[slot].contains(ViewFlags::CULLED) {
            return Ok(());
        }

        let id = self.id_at(idx);
        let ctx = match self.frame[slot] {
            Some(frame) => inherited.extended(frame),
            None => *inherited,
        };

        let mut hooks = self.hooks[slot].take();
        let mut effective = (incoming | self.flags[slot]) & ViewFlags::DISPLAY_MASK;
        if self.flags[slot].contains(ViewFlags::HIDDEN) {
            // Hidden views still lay out so unhiding restores state
            // immediately, but they contribute no pixels.
            effective &= !CONTEXTUAL_STAGES;
        }
        if let Some(h) = hooks.as_deref_mut() {
            effective = h.needs_display(id, effective) & ViewFlags::DISPLAY_MASK;
        }
        // Anything that invalidates layout invalidates a surface host's
        // raster.
        if self.role[slot] == ViewRole::SurfaceHost && !effective.is_empty() {
            effective |= ViewFlags::NEEDS_RENDER | ViewFlags::NEEDS_COMPOSITE;
        }
        if effective.is_empty() {
            self.restore_hooks(idx, hooks);
            return Ok(());
        }

        self.flags[slot] |= ViewFlags::TRAVERSING | ViewFlags::DISPLAYING;
        let mut pass = DisplayPass::new(ctx, effective, renderer, sprites);
        let result = self.display_stages(idx, id, hooks.as_deref_mut(), &mut pass);
        self.flags[idx as usize] &= !ViewFlags::TRANSIENT_MASK;
        self.restore_hooks(idx, hooks);
        result
    }

    fn display_stages(
        &mut self,
        idx: u32,
        id: ViewId,
        mut hooks: Option<&mut (dyn ViewHooks + 'static)>,
        pass: &mut DisplayPass<'_>,
    ) -> CascadeResult {
        let slot = idx as usize;
        let observers = self.observers[slot].clone();
        let mut ran = ViewFlags::empty();

        // Will phase, in stage order; pass flags re-read per stage.
        for stage in DISPLAY_STAGES {
            let bit = stage.flag();
            if pass.flags().contains(bit) {
                self.flags[slot] &= !bit;
                ran |= bit;
                for observer in &observers {
                    observer.view_will_stage(id, stage);
                }
                if let Some(h) = hooks.as_deref_mut() {
                    will_display(h, stage, id, self, pass)?;
                }
            }
        }

        // On phase with structural bodies; late escalations will first.
        for stage in DISPLAY_STAGES {
            let bit = stage.flag();
            if !ran.contains(bit) && pass.flags().contains(bit) {
                self.flags[slot] &= !bit;
                ran |= bit;
                for observer in &observers {
                    observer.view_will_stage(id, stage);
                }
                if let Some(h) = hooks.as_deref_mut() {
                    will_display(h, stage, id, self, pass)?;
                }
            }
            if ran.contains(bit) {
                self.display_structural(idx, stage, pass);
                if let Some(h) = hooks.as_deref_mut() {
                    let contextual = CONTEXTUAL_STAGES.contains(bit);
                    if contextual {
                        self.flags[slot] |= ViewFlags::CONTEXTUAL;
                    }
                    let hook_result = on_display(h, stage, id, self, pass);
                    self.flags[slot] &= !ViewFlags::CONTEXTUAL;
                    hook_result?;
                }
            }
        }

        // Recurse with the union of serviced stages.
        let mut child = self.first_child[slot];
        while child != INVALID {
            let next = self.next_sibling[child as usize];
            let child_ctx = pass.context;
            let child_result = self.display_view(
                child,
                ran,
                &child_ctx,
                &mut *pass.renderer,
                &mut *pass.sprites,
            );
            if self.flags[child as usize].contains(ViewFlags::REMOVING) {
                self.remove_now(child);
            }
            child_result?;
            if next != INVALID && self.parent[next as usize] != idx {
                break;
            }
            child = next;
        }

        // Did phase unwinds in reverse stage order.
        for stage in DISPLAY_STAGES.iter().rev() {
            if ran.contains(stage.flag()) {
                if let Some(h) = hooks.as_deref_mut() {
                    did_display(h, *stage, id, self, pass)?;
                }
                for observer in &observers {
                    observer.view_did_stage(id, *stage);
                }
            }
        }
        Ok(())
    }

    /// Non-overridable stage bodies of the display pass.
    fn display_structural(&mut self, idx: u32, stage: CascadeStage, pass: &mut DisplayPass<'_>) {
        let slot = idx as usize;
        if stage == CascadeStage::Render && self.role[slot] == ViewRole::SurfaceHost {
            // The previous frame's pixels are cleared scoped to the
            // current frame rectangle, not the whole physical surface.
            pass.renderer.clear_rect(pass.context.view_frame);
        }
    }
}

fn will_display(
    h: &mut dyn ViewHooks,
    stage: CascadeStage,
    id: ViewId,
    tree: &mut ViewTree,
    pass: &mut DisplayPass<'_>,
) -> CascadeResult {
    match stage {
        CascadeStage::Layout => h.will_layout(id, tree, pass),
        CascadeStage::Render => h.will_render(id, tree, pass),
        CascadeStage::Rasterize => h.will_rasterize(id, tree, pass),
        CascadeStage::Composite => h.will_composite(id, tree, pass),
        _ => Ok(()),
    }
}

fn on_display(
    h: &mut dyn ViewHooks,
    stage: CascadeStage,
    id: ViewId,
    tree: &mut ViewTree,
    pass: &mut DisplayPass<'_>,
) -> CascadeResult {
    match stage {
        CascadeStage::Layout => h.on_layout(id, tree, pass),
        CascadeStage::Render => h.on_render(id, tree, pass),
        CascadeStage::Rasterize => h.on_rasterize(id, tree, pass),
        CascadeStage::Composite => h.on_composite(id, tree, pass),
        _ => Ok(()),
    }
}

fn did_display(
    h: &mut dyn ViewHooks,
    stage: CascadeStage,
    id: ViewId,
    tree: &mut ViewTree,
    pass: &mut DisplayPass<'_>,
) -> CascadeResult {
    match stage {
        CascadeStage::Layout => h.did_layout(id, tree, pass),
        CascadeStage::Render => h.did_render(id, tree, pass),
        CascadeStage::Rasterize => h.did_rasterize(id, tree, pass),
        CascadeStage::Composite => h.did_composite(id, tree, pass),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use kurbo::{Affine, Rect};

    use crate::render::{RendererKind, SurfaceId, SurfaceProvider};
    use crate::sprite::{SpriteConfig, SpriteService};
    use crate::view::ViewObserver;

    use super::*;

    /// Records renderer calls for assertions.
    #[derive(Default)]
    struct MockRenderer {
        cleared: Vec<Rect>,
        drawn: Vec<(SurfaceId, Rect, Rect)>,
    }

    impl Renderer for MockRenderer {
        fn kind(&self) -> RendererKind {
            RendererKind::Canvas2d
        }
        fn pixel_ratio(&self) -> f64 {
            1.0
        }
        fn clear_rect(&mut self, rect: Rect) {
            self.cleared.push(rect);
        }
        fn set_transform(&mut self, _transform: Affine) {}
        fn draw_surface(&mut self, surface: SurfaceId, src: Rect, dst: Rect) {
            self.drawn.push((surface, src, dst));
        }
    }

    /// Hands out sequential surface IDs and forgets clears.
    #[derive(Default)]
    struct MockProvider {
        created: u32,
    }

    impl SurfaceProvider for MockProvider {
        fn create_surface(&mut self, _width: u32, _height: u32, _pixel_ratio: f64) -> SurfaceId {
            let id = SurfaceId(self.created);
            self.created += 1;
            id
        }
        fn clear_region(&mut self, _surface: SurfaceId, _rect: Rect) {}
    }

    fn sprites() -> SpriteService {
        SpriteService::new(SpriteConfig::new(4, 8, 1.0), Box::new(MockProvider::default()))
    }

    fn ctx() -> ViewContext {
        ViewContext::new(Rect::new(0.0, 0.0, 640.0, 480.0), 1.0)
    }

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

    #[test]
    fn clean_subtree_is_not_visited() {
        let mut tree = ViewTree::new();
        let root = tree.create_view(ViewRole::Container);
        let child = tree.create_view(ViewRole::Container);
        tree.append_child(root, child);
        tree.flags[root.idx as usize] = ViewFlags::empty();
        tree.flags[child.idx as usize] = ViewFlags::empty();

        let recorder = Rc::new(Recorder::default());
        tree.add_observer(root, recorder.clone());
        tree.add_observer(child, recorder.clone());

        let mut renderer = MockRenderer::default();
        let mut sprites = sprites();
        tree.cascade_display(
            root,
            ViewFlags::empty(),
            &ctx(),
            &mut renderer,
            &mut sprites,
        )
        .unwrap();
        assert!(recorder.log.borrow().is_empty());
        assert!(renderer.cleared.is_empty());
    }

    #[test]
    fn surface_host_clears_its_frame_before_children_paint() {
        let mut tree = ViewTree::new();
        let host = tree.create_view(ViewRole::SurfaceHost);
        tree.set_frame(host, Rect::new(0.0, 0.0, 640.0, 480.0));
        tree.require_update(host, ViewFlags::NEEDS_RENDER);

        let mut renderer = MockRenderer::default();
        let mut sprites = sprites();
        tree.cascade_display(
            host,
            ViewFlags::empty(),
            &ctx(),
            &mut renderer,
            &mut sprites,
        )
        .unwrap();
        assert_eq!(renderer.cleared, [Rect::new(0.0, 0.0, 640.0, 480.0)]);
    }

    #[test]
    fn surface_host_forces_composite_alongside_any_display_bit() {
        let mut tree = ViewTree::new();
        let host = tree.create_view(ViewRole::SurfaceHost);
        let recorder = Rc::new(Recorder::default());
        tree.add_observer(host, recorder.clone());

        tree.require_update(host, ViewFlags::NEEDS_LAYOUT);
        let mut renderer = MockRenderer::default();
        let mut sprites = sprites();
        tree.cascade_display(
            host,
            ViewFlags::empty(),
            &ctx(),
            &mut renderer,
            &mut sprites,
        )
        .unwrap();

        let wills: Vec<_> = recorder
            .log
            .borrow()
            .iter()
            .filter(|e| !e.2)
            .map(|e| e.1)
            .collect();
        assert_eq!(
            wills,
            [
                CascadeStage::Layout,
                CascadeStage::Render,
                CascadeStage::Composite
            ]
        );
    }

    #[test]
    fn hidden_view_lays_out_but_does_not_paint() {
        let mut tree = ViewTree::new();
        let root = tree.create_view(ViewRole::Container);
        let recorder = Rc::new(Recorder::default());
        tree.add_observer(root, recorder.clone());

        tree.flags[root.idx as usize] =
            ViewFlags::HIDDEN | ViewFlags::NEEDS_LAYOUT | ViewFlags::NEEDS_RENDER;
        let mut renderer = MockRenderer::default();
        let mut sprites = sprites();
        tree.cascade_display(
            root,
            ViewFlags::empty(),
            &ctx(),
            &mut renderer,
            &mut sprites,
        )
        .unwrap();

        let stages: Vec<_> = recorder.log.borrow().iter().map(|e| e.1).collect();
        assert!(stages.contains(&CascadeStage::Layout));
        assert!(!stages.contains(&CascadeStage::Render));
    }

    #[test]
    fn culled_subtree_is_skipped_with_bits_left_pending() {
        let mut tree = ViewTree::new();
        let root = tree.create_view(ViewRole::Container);
        let child = tree.create_view(ViewRole::Container);
        tree.append_child(root, child);
        tree.set_culled(child, true);
        tree.require_update(child, ViewFlags::NEEDS_RENDER);

        let recorder = Rc::new(Recorder::default());
        tree.add_observer(child, recorder.clone());

        let mut renderer = MockRenderer::default();
        let mut sprites = sprites();
        tree.cascade_display(
            root,
            ViewFlags::empty(),
            &ctx(),
            &mut renderer,
            &mut sprites,
        )
        .unwrap();

        assert!(recorder.log.borrow().is_empty());
        assert!(tree.flags(child).contains(ViewFlags::NEEDS_RENDER));
    }

    /// Renders into a cached sprite on rasterize, blits it on composite.
    struct SpriteCacher {
        sprite: Rc<RefCell<Option<crate::sprite::Sprite>>>,
        rasterized: Rc<RefCell<u32>>,
        composited: Rc<RefCell<u32>>,
    }

    impl ViewHooks for SpriteCacher {
        fn on_rasterize(
            &mut self,
            _view: ViewId,
            _tree: &mut ViewTree,
            pass: &mut DisplayPass<'_>,
        ) -> CascadeResult {
            let mut slot = self.sprite.borrow_mut();
            if slot.is_none() {
                *slot = Some(pass.sprites.acquire(20.0, 20.0));
            }
            *self.rasterized.borrow_mut() += 1;
            Ok(())
        }
        fn on_composite(
            &mut self,
            _view: ViewId,
            _tree: &mut ViewTree,
            pass: &mut DisplayPass<'_>,
        ) -> CascadeResult {
            if let Some(sprite) = self.sprite.borrow().as_ref() {
                let src = pass.sprites.cell_rect(sprite);
                let surface = pass.sprites.surface(sprite);
                pass.renderer
                    .draw_surface(surface, src, pass.context.view_frame);
            }
            *self.composited.borrow_mut() += 1;
            Ok(())
        }
    }

    #[test]
    fn composite_reuses_cached_raster_without_rerendering() {
        let mut tree = ViewTree::new();
        let view = tree.create_view(ViewRole::Graphic);
        tree.set_frame(view, Rect::new(5.0, 5.0, 25.0, 25.0));

        let sprite = Rc::new(RefCell::new(None));
        let rasterized = Rc::new(RefCell::new(0));
        let composited = Rc::new(RefCell::new(0));
        tree.set_hooks(
            view,
            Box::new(SpriteCacher {
                sprite: sprite.clone(),
                rasterized: rasterized.clone(),
                composited: composited.clone(),
            }),
        );

        let mut renderer = MockRenderer::default();
        let mut sprites = sprites();

        // First tick: rasterize then composite.
        tree.require_update(view, ViewFlags::NEEDS_RASTERIZE | ViewFlags::NEEDS_COMPOSITE);
        tree.cascade_display(
            view,
            ViewFlags::empty(),
            &ctx(),
            &mut renderer,
            &mut sprites,
        )
        .unwrap();
        assert_eq!((*rasterized.borrow(), *composited.borrow()), (1, 1));

        // Later tick: only composite; the cached sprite is blitted again.
        tree.require_update(view, ViewFlags::NEEDS_COMPOSITE);
        tree.cascade_display(
            view,
            ViewFlags::empty(),
            &ctx(),
            &mut renderer,
            &mut sprites,
        )
        .unwrap();
        assert_eq!((*rasterized.borrow(), *composited.borrow()), (1, 2));
        assert_eq!(renderer.drawn.len(), 2);
        assert_eq!(renderer.drawn[0].0, renderer.drawn[1].0);
    }

    #[test]
    fn contextual_flag_wraps_paint_hooks_only() {
        struct ContextProbe {
            during_render: Rc<RefCell<Option<bool>>>,
            during_layout: Rc<RefCell<Option<bool>>>,
        }
        impl ViewHooks for ContextProbe {
            fn on_layout(
                &mut self,
                view: ViewId,
                tree: &mut ViewTree,
                _pass: &mut DisplayPass<'_>,
            ) -> CascadeResult {
                *self.during_layout.borrow_mut() =
                    Some(tree.flags(view).contains(ViewFlags::CONTEXTUAL));
                Ok(())
            }
            fn on_render(
                &mut self,
                view: ViewId,
                tree: &mut ViewTree,
                _pass: &mut DisplayPass<'_>,
            ) -> CascadeResult {
                *self.during_render.borrow_mut() =
                    Some(tree.flags(view).contains(ViewFlags::CONTEXTUAL));
                Ok(())
            }
        }

        let mut tree = ViewTree::new();
        let view = tree.create_view(ViewRole::Graphic);
        let during_render = Rc::new(RefCell::new(None));
        let during_layout = Rc::new(RefCell::new(None));
        tree.set_hooks(
            view,
            Box::new(ContextProbe {
                during_render: during_render.clone(),
                during_layout: during_layout.clone(),
            }),
        );

        tree.require_update(view, ViewFlags::NEEDS_LAYOUT | ViewFlags::NEEDS_RENDER);
        let mut renderer = MockRenderer::default();
        let mut sprites = sprites();
        tree.cascade_display(
            view,
            ViewFlags::empty(),
            &ctx(),
            &mut renderer,
            &mut sprites,
        )
        .unwrap();

        assert_eq!(*during_layout.borrow(), Some(false));
        assert_eq!(*during_render.borrow(), Some(true));
        assert!(!tree.flags(view).contains(ViewFlags::CONTEXTUAL));
    }
}
