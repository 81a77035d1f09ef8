// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core view tree and update cascade for canvas-hosted graphics.
//!
//! `fresco_core` provides the foundational protocol for a retained tree of
//! heterogeneous view nodes painted onto a canvas surface: flag-driven
//! update cascades, pointer/mouse/touch event redistribution, and a sprite
//! atlas allocator for off-screen caching. It is `no_std` compatible (with
//! `alloc`) and uses array-based struct-of-arrays storage with generational
//! index handles for cache-friendly traversal.
//!
//! # Architecture
//!
//! The crate is organized around a frame loop that turns platform display
//! callbacks into tree-wide update passes:
//!
//! ```text
//!   Backend (tick source)
//!       │
//!       ▼
//!   FrameStamp ──► ViewTree::cascade_process()   (resize → scroll →
//!       │                                         change → animate)
//!       ▼
//!   ViewTree::cascade_display()                  (layout → render →
//!       │                                         rasterize → composite)
//!       ▼
//!   Renderer (paints into the canvas surface)
//!
//!   Native input ──► InputRouter ──► cascade_hit_test ──► dispatch_event
//! ```
//!
//! **[`view`]** — Struct-of-arrays view tree with generational handles,
//! keyed children, mount lifecycle, and per-view hook tables.
//!
//! **[`flags`]** — The [`ViewFlags`](flags::ViewFlags) dirty/structural
//! bitset and its propagation rules.
//!
//! **[`cascade`]** — The two-phase process/display traversal engine and
//! the hit-testing cascade.
//!
//! **[`event`]** — Synthetic bubbling events, listener registry, and the
//! per-device input tracking state machines.
//!
//! **[`sprite`]** — Slab-based sprite atlas allocator over abstract
//! backing surfaces.
//!
//! **[`render`]** — The [`Renderer`](render::Renderer) contract that
//! platform backends implement to paint a frame.
//!
//! **[`schedule`]** — Idempotent update coalescing plus debounce/throttle
//! timers for resize-style bursts.
//!
//! **[`time`]** — Monotonic host time consumed by the animate stage and
//! the timers.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types
//! for frame-loop instrumentation, with zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one
//!   branch per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates
//!   per-dispatch input events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod cascade;
pub mod context;
pub mod event;
pub mod flags;
pub mod render;
pub mod schedule;
pub mod sprite;
pub mod time;
pub mod trace;
pub mod view;
