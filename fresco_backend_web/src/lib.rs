// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for fresco.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`CanvasHost`]: owns a `<canvas>`, the view tree, the renderer, the
//!   sprite allocator, and the input wiring
//! - [`RafLoop`]: `requestAnimationFrame` tick source
//! - [`Canvas2dRenderer`]: the 2D implementation of the renderer
//!   contract
//! - [`CanvasSurfaces`]: off-screen canvas provider for sprite sheets
//! - [`input`]: DOM event translation helpers

#![no_std]

extern crate alloc;

mod host;
pub mod input;
mod raf;
mod renderer;
mod surfaces;

pub use host::{CanvasHost, HostError};
pub use raf::RafLoop;
pub use renderer::Canvas2dRenderer;
pub use surfaces::CanvasSurfaces;

use fresco_core::time::{HostTime, Timebase};

/// Returns the current host time from `performance.now()`.
///
/// The returned [`HostTime`] is in microsecond ticks. Use [`timebase`]
/// to convert to nanoseconds.
#[must_use]
pub fn now() -> HostTime {
    raf::stamp_to_host_time(raf::performance_now())
}

/// Returns the web [`Timebase`]: 1 tick = 1 µs = 1000 ns.
///
/// `Timebase { numer: 1000, denom: 1 }` means `nanoseconds = ticks ×
/// 1000`.
#[must_use]
pub fn timebase() -> Timebase {
    Timebase::new(1000, 1)
}
