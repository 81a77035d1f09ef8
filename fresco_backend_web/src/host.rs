// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The canvas host: surface sizing, frame loop, and input wiring.
//!
//! A [`CanvasHost`] owns one `<canvas>` element, the [`ViewTree`] rooted
//! at a surface-host view, the renderer, the sprite allocator, and the
//! [`InputRouter`]. Each animation tick it runs the process cascade then
//! the display cascade; native mouse/pointer/touch events are translated
//! into router calls synchronously as they arrive.
//!
//! Resize handling is debounced: native resize events arm a quiet-period
//! timer, and the actual remeasure (backing-store pixels from CSS size ×
//! `devicePixelRatio`, root frame, NEEDS_RESIZE/NEEDS_LAYOUT) runs at
//! the start of the first tick after the burst settles — before any
//! child reads the frame in layout.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use kurbo::Rect;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use web_sys::{AddEventListenerOptions, CanvasRenderingContext2d, HtmlCanvasElement};

use fresco_core::context::ViewContext;
use fresco_core::event::{EventKind, InputRouter};
use fresco_core::flags::ViewFlags;
use fresco_core::render::RendererKind;
use fresco_core::schedule::{DebouncedTimer, FrameStamp};
use fresco_core::sprite::{SpriteConfig, SpriteService};
use fresco_core::time::Duration;
use fresco_core::trace::{
    FrameSummaryBuilder, FrameTickEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind, TraceSink,
    Tracer, UpdateRequestEvent,
};
use fresco_core::view::{CascadeError, ViewId, ViewRole, ViewTree};

use crate::input;
use crate::raf::RafLoop;
use crate::renderer::Canvas2dRenderer;
use crate::surfaces::CanvasSurfaces;

/// Quiet period between the last native resize event and the remeasure.
const RESIZE_DEBOUNCE: Duration = Duration(150_000);

/// Errors raised while constructing a [`CanvasHost`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostError {
    /// The requested renderer kind is not supported by this backend.
    UnsupportedRenderer(RendererKind),
    /// The canvas refused to produce a rendering context.
    ContextUnavailable,
    /// No window/document is available (e.g. a worker scope).
    WindowUnavailable,
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedRenderer(kind) => {
                write!(f, "unsupported renderer kind: {kind:?}")
            }
            Self::ContextUnavailable => f.write_str("canvas rendering context unavailable"),
            Self::WindowUnavailable => f.write_str("no window available"),
        }
    }
}

impl core::error::Error for HostError {}

type DomClosure = Closure<dyn FnMut(web_sys::Event)>;

/// Window-scoped move/up listeners kept attached while the mouse is
/// tracked, so drags that leave the canvas keep updating state.
struct WindowTracking {
    mouse_move: DomClosure,
    mouse_up: DomClosure,
}

struct HostState {
    canvas: HtmlCanvasElement,
    tree: RefCell<ViewTree>,
    root: ViewId,
    router: RefCell<InputRouter>,
    renderer: RefCell<Canvas2dRenderer>,
    sprites: RefCell<SpriteService>,
    resize_timer: RefCell<DebouncedTimer>,
    pixel_ratio: Cell<f64>,
    window_tracking: RefCell<Option<WindowTracking>>,
    trace_sink: RefCell<Option<Box<dyn TraceSink>>>,
    last_error: RefCell<Option<CascadeError>>,
}

/// Owns a canvas surface and drives the view tree rendered onto it.
pub struct CanvasHost {
    state: Rc<HostState>,
    raf: RafLoop,
    _dom_listeners: Vec<DomClosure>,
}

impl CanvasHost {
    /// Creates a host for `canvas` with the requested renderer kind.
    ///
    /// The view tree is created with a mounted surface-host root and the
    /// canvas is measured immediately.
    ///
    /// # Errors
    ///
    /// [`HostError::UnsupportedRenderer`] for anything but
    /// [`RendererKind::Canvas2d`]; [`HostError::ContextUnavailable`] if
    /// 2D context creation fails. There is no silent-null fallback —
    /// callers must not proceed to mount on failure.
    pub fn new(canvas: HtmlCanvasElement, renderer: RendererKind) -> Result<Self, HostError> {
        if renderer != RendererKind::Canvas2d {
            return Err(HostError::UnsupportedRenderer(renderer));
        }
        let window = web_sys::window().ok_or(HostError::WindowUnavailable)?;
        let document = window.document().ok_or(HostError::WindowUnavailable)?;
        let context: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .ok_or(HostError::ContextUnavailable)?
            .unchecked_into();
        let pixel_ratio = window.device_pixel_ratio();

        let surfaces = CanvasSurfaces::new(document);
        let surface_map = surfaces.map();
        let rect = canvas.get_bounding_client_rect();
        let sprites = SpriteService::new(
            SpriteConfig::derive(rect.width().max(64.0), rect.height().max(64.0), pixel_ratio),
            Box::new(surfaces),
        );

        let mut tree = ViewTree::new();
        let root = tree.create_view(ViewRole::SurfaceHost);
        tree.mount(root);

        let state = Rc::new(HostState {
            canvas,
            tree: RefCell::new(tree),
            root,
            router: RefCell::new(InputRouter::new()),
            renderer: RefCell::new(Canvas2dRenderer::new(context, pixel_ratio, surface_map)),
            sprites: RefCell::new(sprites),
            resize_timer: RefCell::new(DebouncedTimer::new(RESIZE_DEBOUNCE)),
            pixel_ratio: Cell::new(pixel_ratio),
            window_tracking: RefCell::new(None),
            trace_sink: RefCell::new(None),
            last_error: RefCell::new(None),
        });
        HostState::measure(&state);

        let raf = {
            let state = Rc::clone(&state);
            RafLoop::new(Box::new(move |stamp| HostState::tick(&state, stamp)))
        };
        let dom_listeners = Self::attach_input(&state)?;

        Ok(Self {
            state,
            raf,
            _dom_listeners: dom_listeners,
        })
    }

    /// Returns the mounted surface-host root view.
    #[must_use]
    pub fn root(&self) -> ViewId {
        self.state.root
    }

    /// Returns the hosted canvas element.
    #[must_use]
    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.state.canvas
    }

    /// Grants mutable access to the view tree (build the scene, install
    /// hooks, register listeners).
    pub fn with_tree<R>(&self, f: impl FnOnce(&mut ViewTree) -> R) -> R {
        let (result, requested) = {
            let mut tree = self.state.tree.borrow_mut();
            let was_scheduled = tree.update_pending();
            let before = tree.pending_updates();
            let result = f(&mut tree);
            let after = tree.pending_updates();
            let requested = (after != before).then(|| UpdateRequestEvent {
                flags: after.bits(),
                newly_scheduled: !was_scheduled && tree.update_pending(),
                timestamp: crate::now(),
            });
            (result, requested)
        };
        if let Some(event) = requested {
            let mut sink = self.state.trace_sink.borrow_mut();
            if let Some(sink) = sink.as_deref_mut() {
                Tracer::new(sink).update_request(&event);
            }
        }
        result
    }

    /// Grants mutable access to the sprite allocator.
    pub fn with_sprites<R>(&self, f: impl FnOnce(&mut SpriteService) -> R) -> R {
        f(&mut self.state.sprites.borrow_mut())
    }

    /// Starts the animation-frame loop.
    pub fn start(&self) {
        self.raf.start();
    }

    /// Stops the animation-frame loop. A tick already in flight runs to
    /// completion; there is no mid-cascade cancellation.
    pub fn stop(&self) {
        self.raf.stop();
    }

    /// Installs a trace sink receiving frame-loop events.
    pub fn set_trace_sink(&self, sink: Box<dyn TraceSink>) {
        *self.state.trace_sink.borrow_mut() = Some(sink);
    }

    /// Takes the most recent cascade error, if a hook failed during a
    /// tick. The tree is left re-usable; the failed tick's remaining
    /// stages were skipped.
    pub fn take_error(&self) -> Option<CascadeError> {
        self.state.last_error.borrow_mut().take()
    }

    /// Arms the resize debounce, as the native resize listener does.
    pub fn request_resize(&self) {
        self.state
            .resize_timer
            .borrow_mut()
            .arm(crate::now());
    }

    // -- Wiring --

    fn attach_input(state: &Rc<HostState>) -> Result<Vec<DomClosure>, HostError> {
        let window = web_sys::window().ok_or(HostError::WindowUnavailable)?;
        let mut listeners = Vec::new();
        let target: &web_sys::EventTarget = state.canvas.as_ref();

        // Mouse.
        for (name, action) in [
            ("mouseenter", MouseAction::Enter),
            ("mousemove", MouseAction::Move),
            ("mousedown", MouseAction::Down),
            ("mouseup", MouseAction::Up),
            ("mouseleave", MouseAction::Leave),
        ] {
            let closure = Self::mouse_closure(state, action, false);
            add_listener(target, name, &closure, true);
            listeners.push(closure);
        }

        // Pointer.
        for (name, action) in [
            ("pointerenter", PointerAction::Enter),
            ("pointermove", PointerAction::Move),
            ("pointerdown", PointerAction::Down),
            ("pointerup", PointerAction::Up),
            ("pointercancel", PointerAction::Cancel),
            ("pointerleave", PointerAction::Leave),
        ] {
            let closure = Self::pointer_closure(state, action);
            add_listener(target, name, &closure, true);
            listeners.push(closure);
        }

        // Touch. Registered non-passive: a synthetic listener that
        // cancels the event also cancels the native one (scroll
        // suppression).
        for (name, action) in [
            ("touchstart", TouchAction::Start),
            ("touchmove", TouchAction::Move),
            ("touchend", TouchAction::End),
            ("touchcancel", TouchAction::Cancel),
        ] {
            let closure = Self::touch_closure(state, action);
            add_listener(target, name, &closure, false);
            listeners.push(closure);
        }

        // Debounced resize.
        {
            let state = Rc::clone(state);
            let closure: DomClosure = Closure::new(move |_ev: web_sys::Event| {
                state.resize_timer.borrow_mut().arm(crate::now());
            });
            add_listener(window.as_ref(), "resize", &closure, true);
            listeners.push(closure);
        }

        Ok(listeners)
    }

    fn mouse_closure(state: &Rc<HostState>, action: MouseAction, window_scoped: bool) -> DomClosure {
        let state = Rc::clone(state);
        Closure::new(move |ev: web_sys::Event| {
            // Window-scoped listeners only cover ground the canvas
            // listeners don't, to avoid double dispatch of bubbled
            // events.
            if window_scoped
                && ev
                    .target()
                    .is_some_and(|t| t.eq(state.canvas.as_ref()))
            {
                return;
            }
            let ev: web_sys::MouseEvent = ev.unchecked_into();
            let position = input::mouse_position(&state.canvas, &ev);
            let modifiers = input::mouse_modifiers(&ev);
            let ctx = HostState::context(&state);
            let hit = {
                let mut tree = state.tree.borrow_mut();
                let mut router = state.router.borrow_mut();
                match action {
                    MouseAction::Enter => {
                        router.mouse_enter(&mut tree, state.root, &ctx, position, modifiers);
                    }
                    MouseAction::Move => {
                        router.mouse_move(&mut tree, state.root, &ctx, position, modifiers);
                    }
                    MouseAction::Down => {
                        router.mouse_down(&mut tree, state.root, &ctx, position, modifiers);
                    }
                    MouseAction::Up => {
                        router.mouse_up(&mut tree, state.root, &ctx, position, modifiers);
                    }
                    MouseAction::Leave => {
                        router.mouse_leave(&mut tree, position, modifiers);
                    }
                }
                router.mouse_target().is_some()
            };
            HostState::trace_input(&state, action.kind(), hit);
            // Window-scoped listeners never create or destroy the mouse
            // record, and re-syncing from inside one would drop the
            // closure currently executing.
            if !window_scoped {
                HostState::sync_window_tracking(&state);
            }
        })
    }

    fn pointer_closure(state: &Rc<HostState>, action: PointerAction) -> DomClosure {
        let state = Rc::clone(state);
        Closure::new(move |ev: web_sys::Event| {
            let ev: web_sys::PointerEvent = ev.unchecked_into();
            let mouse: &web_sys::MouseEvent = ev.as_ref();
            let position = input::mouse_position(&state.canvas, mouse);
            let modifiers = input::mouse_modifiers(mouse);
            let pointer_id = ev.pointer_id();
            let pointer_type = input::pointer_type(&ev);
            let ctx = HostState::context(&state);
            let hit = {
                let mut tree = state.tree.borrow_mut();
                let mut router = state.router.borrow_mut();
                match action {
                    PointerAction::Enter => router.pointer_enter(
                        &mut tree,
                        state.root,
                        &ctx,
                        pointer_id,
                        pointer_type,
                        position,
                        modifiers,
                    ),
                    PointerAction::Move => router.pointer_move(
                        &mut tree,
                        state.root,
                        &ctx,
                        pointer_id,
                        pointer_type,
                        position,
                        modifiers,
                    ),
                    PointerAction::Down => router.pointer_down(
                        &mut tree,
                        state.root,
                        &ctx,
                        pointer_id,
                        pointer_type,
                        position,
                        modifiers,
                    ),
                    PointerAction::Up => router.pointer_up(
                        &mut tree,
                        state.root,
                        &ctx,
                        pointer_id,
                        pointer_type,
                        position,
                        modifiers,
                    ),
                    PointerAction::Cancel => {
                        router.pointer_cancel(
                            &mut tree,
                            pointer_id,
                            pointer_type,
                            position,
                            modifiers,
                        );
                    }
                    PointerAction::Leave => {
                        router.pointer_leave(&mut tree, pointer_id, position, modifiers);
                    }
                }
                router.pointer_target(pointer_id).is_some()
            };
            HostState::trace_input(&state, action.kind(), hit);
        })
    }

    fn touch_closure(state: &Rc<HostState>, action: TouchAction) -> DomClosure {
        let state = Rc::clone(state);
        Closure::new(move |ev: web_sys::Event| {
            let ev: web_sys::TouchEvent = ev.unchecked_into();
            let modifiers = input::touch_modifiers(&ev);
            let changed = input::changed_touches(&state.canvas, &ev);
            let ctx = HostState::context(&state);
            let (uncanceled, hit) = {
                let mut tree = state.tree.borrow_mut();
                let mut router = state.router.borrow_mut();
                // End/cancel remove their records, so capture whether any
                // changed touch had a locked target before dispatching.
                let pre_hit = changed.iter().any(|t| router.touch_target(t.id).is_some());
                let uncanceled = match action {
                    TouchAction::Start => {
                        router.touch_start(&mut tree, state.root, &ctx, &changed, modifiers)
                    }
                    TouchAction::Move => router.touch_move(&mut tree, &changed, modifiers),
                    TouchAction::End => router.touch_end(&mut tree, &changed, modifiers),
                    TouchAction::Cancel => router.touch_cancel(&mut tree, &changed, modifiers),
                };
                let hit = match action {
                    TouchAction::Start => {
                        changed.iter().any(|t| router.touch_target(t.id).is_some())
                    }
                    _ => pre_hit,
                };
                (uncanceled, hit)
            };
            HostState::trace_input(&state, action.kind(), hit);
            if !uncanceled {
                ev.prevent_default();
            }
        })
    }
}

impl fmt::Debug for CanvasHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanvasHost")
            .field("root", &self.state.root)
            .field("pixel_ratio", &self.state.pixel_ratio.get())
            .field("running", &self.raf.is_running())
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy)]
enum MouseAction {
    Enter,
    Move,
    Down,
    Up,
    Leave,
}

impl MouseAction {
    const fn kind(self) -> EventKind {
        match self {
            Self::Enter => EventKind::MouseEnter,
            Self::Move => EventKind::MouseMove,
            Self::Down => EventKind::MouseDown,
            Self::Up => EventKind::MouseUp,
            Self::Leave => EventKind::MouseLeave,
        }
    }
}

#[derive(Clone, Copy)]
enum PointerAction {
    Enter,
    Move,
    Down,
    Up,
    Cancel,
    Leave,
}

impl PointerAction {
    const fn kind(self) -> EventKind {
        match self {
            Self::Enter => EventKind::PointerEnter,
            Self::Move => EventKind::PointerMove,
            Self::Down => EventKind::PointerDown,
            Self::Up => EventKind::PointerUp,
            Self::Cancel => EventKind::PointerCancel,
            Self::Leave => EventKind::PointerLeave,
        }
    }
}

#[derive(Clone, Copy)]
enum TouchAction {
    Start,
    Move,
    End,
    Cancel,
}

impl TouchAction {
    const fn kind(self) -> EventKind {
        match self {
            Self::Start => EventKind::TouchStart,
            Self::Move => EventKind::TouchMove,
            Self::End => EventKind::TouchEnd,
            Self::Cancel => EventKind::TouchCancel,
        }
    }
}

impl HostState {
    /// The root view context for cascades and hit tests.
    fn context(state: &Rc<Self>) -> ViewContext {
        let frame = {
            let tree = state.tree.borrow();
            tree.frame(state.root).unwrap_or(Rect::ZERO)
        };
        ViewContext::new(frame, state.pixel_ratio.get())
    }

    /// Remeasures the backing store and invalidates the tree. Runs at
    /// construction and after the resize debounce settles, before any
    /// child layout reads the frame.
    fn measure(state: &Rc<Self>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let pixel_ratio = window.device_pixel_ratio();
        let rect = state.canvas.get_bounding_client_rect();
        let (width, height) = (rect.width(), rect.height());
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "canvas CSS dimensions are small non-negative values"
        )]
        {
            state.canvas.set_width((width * pixel_ratio).ceil() as u32);
            state.canvas.set_height((height * pixel_ratio).ceil() as u32);
        }
        state.pixel_ratio.set(pixel_ratio);
        state.renderer.borrow_mut().set_pixel_ratio(pixel_ratio);

        let mut tree = state.tree.borrow_mut();
        tree.set_frame(state.root, Rect::new(0.0, 0.0, width, height));
        tree.require_update(
            state.root,
            ViewFlags::NEEDS_RESIZE
                | ViewFlags::NEEDS_LAYOUT
                | ViewFlags::NEEDS_RENDER
                | ViewFlags::NEEDS_COMPOSITE,
        );
    }

    /// One animation-frame tick: debounced resize, process cascade,
    /// display cascade.
    fn tick(state: &Rc<Self>, stamp: FrameStamp) {
        if state.resize_timer.borrow_mut().fire_due(stamp.now) {
            Self::measure(state);
        }

        {
            let tree = state.tree.borrow();
            if !tree.update_pending() {
                return;
            }
        }

        let mut sink = state.trace_sink.borrow_mut();
        let mut tracer = match sink.as_deref_mut() {
            Some(sink) => Tracer::new(sink),
            None => Tracer::none(),
        };
        let tick_event = FrameTickEvent::from(&stamp);
        tracer.frame_tick(&tick_event);
        let mut summary = FrameSummaryBuilder::new(&tick_event);

        let ctx = Self::context(state);
        let mut tree = state.tree.borrow_mut();
        let _ = tree.take_tick();

        let begin = crate::now();
        tracer.phase_begin(&PhaseBeginEvent {
            frame_index: stamp.frame_index,
            phase: PhaseKind::Process,
            timestamp: begin,
        });
        summary.phase_begin(PhaseKind::Process, begin);
        let process = tree.cascade_process(state.root, ViewFlags::empty(), &ctx, stamp.now);
        let end = crate::now();
        tracer.phase_end(&PhaseEndEvent {
            frame_index: stamp.frame_index,
            phase: PhaseKind::Process,
            timestamp: end,
        });
        summary.phase_end(PhaseKind::Process, end);
        if let Err(error) = process {
            *state.last_error.borrow_mut() = Some(error);
            return;
        }

        let begin = crate::now();
        tracer.phase_begin(&PhaseBeginEvent {
            frame_index: stamp.frame_index,
            phase: PhaseKind::Display,
            timestamp: begin,
        });
        summary.phase_begin(PhaseKind::Display, begin);
        let display = {
            let mut renderer = state.renderer.borrow_mut();
            let mut sprites = state.sprites.borrow_mut();
            tree.cascade_display(
                state.root,
                ViewFlags::empty(),
                &ctx,
                &mut *renderer,
                &mut *sprites,
            )
        };
        let end = crate::now();
        tracer.phase_end(&PhaseEndEvent {
            frame_index: stamp.frame_index,
            phase: PhaseKind::Display,
            timestamp: end,
        });
        summary.phase_end(PhaseKind::Display, end);
        if let Err(error) = display {
            *state.last_error.borrow_mut() = Some(error);
            return;
        }

        tracer.frame_summary(&summary.finish());
    }

    /// Emits a per-dispatch input trace event. Compiled in only with the
    /// `trace-rich` feature.
    #[cfg(feature = "trace-rich")]
    fn trace_input(state: &Rc<Self>, kind: EventKind, hit: bool) {
        use fresco_core::trace::InputDispatchEvent;
        let mut sink = state.trace_sink.borrow_mut();
        if let Some(sink) = sink.as_deref_mut() {
            Tracer::new(sink).input_dispatch(&InputDispatchEvent {
                kind_code: kind.code(),
                hit,
                timestamp: crate::now(),
            });
        }
    }

    #[cfg(not(feature = "trace-rich"))]
    fn trace_input(_state: &Rc<Self>, _kind: EventKind, _hit: bool) {}

    /// Attaches or detaches window-scoped move/up listeners to match
    /// whether a mouse record is live.
    fn sync_window_tracking(state: &Rc<Self>) {
        let active = state.router.borrow().mouse_active();
        let mut tracking = state.window_tracking.borrow_mut();
        let Some(window) = web_sys::window() else {
            return;
        };
        let window_target: &web_sys::EventTarget = window.as_ref();

        if active && tracking.is_none() {
            let mouse_move = CanvasHost::mouse_closure(state, MouseAction::Move, true);
            let mouse_up = CanvasHost::mouse_closure(state, MouseAction::Up, true);
            add_listener(window_target, "mousemove", &mouse_move, true);
            add_listener(window_target, "mouseup", &mouse_up, true);
            *tracking = Some(WindowTracking {
                mouse_move,
                mouse_up,
            });
        } else if !active {
            if let Some(tracking) = tracking.take() {
                remove_listener(window_target, "mousemove", &tracking.mouse_move);
                remove_listener(window_target, "mouseup", &tracking.mouse_up);
            }
        }
    }
}

fn add_listener(
    target: &web_sys::EventTarget,
    name: &str,
    closure: &DomClosure,
    passive: bool,
) {
    let options = AddEventListenerOptions::new();
    options.set_passive(passive);
    let _ = target.add_event_listener_with_callback_and_add_event_listener_options(
        name,
        closure.as_ref().unchecked_ref(),
        &options,
    );
}

fn remove_listener(target: &web_sys::EventTarget, name: &str, closure: &DomClosure) {
    let _ = target.remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
}
