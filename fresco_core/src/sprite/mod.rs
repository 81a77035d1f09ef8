// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sprite atlas allocation for off-screen canvas caching.
//!
//! A [`SpriteSheet`](sheet) subdivides one shared backing surface into a
//! grid of equal-size cells managed by a LIFO free stack. The
//! [`SpriteService`] pools sheets by power-of-two size class and chains
//! same-class sheets so allocation skips exhausted sheets without
//! rescanning them. Acquiring never fails: when no chained sheet has
//! capacity, a new backing sheet is created through the
//! [`SurfaceProvider`](crate::render::SurfaceProvider). There is no hard
//! cap — callers that never release grow memory unboundedly, which is
//! their resource-management responsibility, not a fault the allocator
//! detects.
//!
//! Releasing clears the cell's pixels before the cell returns to the
//! free stack, so stale content never leaks into a later unrelated use.
//! Reuse is most-recently-freed first, which keeps a view that
//! release/reacquire-cycles the same logical sprite on the same cell.

mod service;
mod sheet;

pub use service::{SpriteConfig, SpriteService};
pub use sheet::Sprite;
