// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Synthetic events and input redistribution.
//!
//! Native mouse/pointer/touch input arrives at the canvas surface as flat
//! coordinate streams. This module multiplexes them into a synthetic,
//! bubbling event model scoped to individual views:
//!
//! - **[`types`]** — [`ViewEvent`], [`EventKind`], [`Modifiers`], and
//!   [`TouchPoint`]: the synthetic event payloads.
//! - **[`dispatch`]** — the per-view listener registry
//!   ([`ViewTree::on`](crate::view::ViewTree::on) /
//!   [`off`](crate::view::ViewTree::off)) and the capture → target →
//!   bubble dispatch walk, mirroring `addEventListener` semantics
//!   (capture/passive/once) with bubbling terminated at the surface
//!   host.
//! - **[`router`]** — per-device tracking state machines layered above
//!   raw input: the mouse singleton, per-id pointer records, and
//!   per-identifier touch records with target locking.
//!
//! Hit testing during input handlers reads whatever bounds resulted from
//! the last completed display pass; mutations made earlier in the same
//! turn are not reflected until they go through layout. That staleness
//! window is part of the contract.

mod dispatch;
mod router;
mod types;

pub(crate) use dispatch::ListenerEntry;
pub use dispatch::{ListenerId, ListenerOptions};
pub use router::{InputRouter, PointerType};
pub use types::{EventKind, Modifiers, TouchPoint, ViewEvent};
