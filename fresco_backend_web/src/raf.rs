// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `requestAnimationFrame` tick source.
//!
//! [`RafLoop`] drives a [`FrameStamp`]-based animation loop using the
//! browser's `requestAnimationFrame` API. Each callback receives a
//! [`DOMHighResTimeStamp`][mdn] (milliseconds from `performance.now()`),
//! which is converted to microsecond [`HostTime`] ticks.
//!
//! [mdn]: https://developer.mozilla.org/en-US/docs/Web/API/DOMHighResTimeStamp
//! [`FrameStamp`]: fresco_core::schedule::FrameStamp
//! [`HostTime`]: fresco_core::time::HostTime

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use fresco_core::schedule::FrameStamp;
use fresco_core::time::HostTime;

// Direct global bindings instead of `web_sys::Window` methods — avoids
// fetching (and unwrapping) the Window/Performance objects on every frame.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);
}

/// Converts a `DOMHighResTimeStamp` (ms) to microsecond host ticks.
pub(crate) fn stamp_to_host_time(ms: f64) -> HostTime {
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "performance.now() returns small positive f64; µs fits in u64"
    )]
    let us = (ms * 1000.0) as u64;
    HostTime(us)
}

/// A `requestAnimationFrame` animation loop that emits [`FrameStamp`]
/// events.
///
/// Create with [`RafLoop::new`], then call [`start`](Self::start) to
/// begin receiving callbacks. The loop re-registers itself each frame
/// until [`stop`](Self::stop) is called or the `RafLoop` is dropped.
pub struct RafLoop {
    inner: Rc<RafInner>,
}

type RafClosure = Closure<dyn FnMut(f64)>;

struct RafInner {
    /// The JS closure registered with `requestAnimationFrame`.
    ///
    /// Stored in its own `RefCell` so we can set it once in `start()`
    /// and reference it from inside itself without conflicting with
    /// `callback`.
    closure: RefCell<Option<RafClosure>>,

    /// The user-supplied callback that receives [`FrameStamp`] events.
    callback: RefCell<Box<dyn FnMut(FrameStamp)>>,

    /// Monotonically increasing frame counter.
    frame_counter: Cell<u64>,

    /// Whether the loop is currently running.
    running: Cell<bool>,

    /// The ID returned by the most recent `requestAnimationFrame` call,
    /// used by [`cancel_animation_frame`] when stopping.
    raf_id: Cell<i32>,
}

impl RafLoop {
    /// Creates a stopped loop that will deliver stamps to `callback`.
    #[must_use]
    pub fn new(callback: Box<dyn FnMut(FrameStamp)>) -> Self {
        Self {
            inner: Rc::new(RafInner {
                closure: RefCell::new(None),
                callback: RefCell::new(callback),
                frame_counter: Cell::new(0),
                running: Cell::new(false),
                raf_id: Cell::new(0),
            }),
        }
    }

    /// Starts the loop. No-op if already running.
    pub fn start(&self) {
        if self.inner.running.get() {
            return;
        }
        self.inner.running.set(true);

        if self.inner.closure.borrow().is_none() {
            let inner = Rc::clone(&self.inner);
            let closure: RafClosure = Closure::new(move |ms: f64| {
                if !inner.running.get() {
                    return;
                }
                let stamp = FrameStamp {
                    now: stamp_to_host_time(ms),
                    frame_index: inner.frame_counter.get(),
                };
                inner.frame_counter.set(stamp.frame_index + 1);
                (inner.callback.borrow_mut())(stamp);

                // Re-register for the next frame if still running.
                if inner.running.get() {
                    if let Some(closure) = inner.closure.borrow().as_ref() {
                        inner.raf_id.set(request_animation_frame(closure.as_ref()));
                    }
                }
            });
            *self.inner.closure.borrow_mut() = Some(closure);
        }

        if let Some(closure) = self.inner.closure.borrow().as_ref() {
            self.inner
                .raf_id
                .set(request_animation_frame(closure.as_ref()));
        }
    }

    /// Stops the loop, canceling the pending animation frame.
    pub fn stop(&self) {
        if self.inner.running.replace(false) {
            cancel_animation_frame(self.inner.raf_id.get());
        }
    }

    /// Returns whether the loop is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }
}

impl Drop for RafLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

impl core::fmt::Debug for RafLoop {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RafLoop")
            .field("running", &self.inner.running.get())
            .field("frame_counter", &self.inner.frame_counter.get())
            .finish_non_exhaustive()
    }
}
