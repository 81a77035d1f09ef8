// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renderer and surface contracts for platform backends.
//!
//! Fresco splits platform-specific work into *backend* crates. The core
//! never creates rendering contexts; it drives them through the narrow
//! [`Renderer`] trait during the display cascade. Context creation failure
//! is a synchronous backend error at construction time, never a silent
//! null passed into the cascade.
//!
//! Off-screen backing stores (sprite sheets, cached rasters) are created
//! and cleared through [`SurfaceProvider`] and referenced by opaque
//! [`SurfaceId`] handles that the backend interprets; core code passes
//! them through without looking inside.

use core::fmt;

use kurbo::{Affine, Rect};

/// An opaque reference to a backend-managed drawing surface.
///
/// Backends assign surface IDs (e.g. to off-screen `<canvas>` elements)
/// and resolve them when asked to draw.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SurfaceId(pub u32);

impl fmt::Debug for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceId({})", self.0)
    }
}

/// Which kind of rendering context backs a [`Renderer`].
///
/// Stage bodies that must behave differently per backend (e.g. clearing a
/// frame rectangle versus a scissored viewport clear) branch on this.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RendererKind {
    /// A 2D raster context (`CanvasRenderingContext2D` on the web).
    Canvas2d,
    /// A WebGL context.
    WebGl,
}

/// The drawing surface a display cascade paints into.
///
/// All coordinates are CSS pixels; implementations apply
/// [`pixel_ratio`](Self::pixel_ratio) scaling internally. The transform
/// set via [`set_transform`](Self::set_transform) is a single mutable
/// register on the shared context; callers must not assume it persists
/// across unrelated operations.
pub trait Renderer {
    /// Returns which backend kind this renderer is.
    fn kind(&self) -> RendererKind;

    /// Returns device pixels per CSS pixel of the backing surface.
    fn pixel_ratio(&self) -> f64;

    /// Clears the pixels inside `rect` to transparent.
    fn clear_rect(&mut self, rect: Rect);

    /// Replaces the current transform.
    fn set_transform(&mut self, transform: Affine);

    /// Draws the `src` region of `surface` into the `dst` region of this
    /// renderer's target.
    fn draw_surface(&mut self, surface: SurfaceId, src: Rect, dst: Rect);
}

impl fmt::Debug for dyn Renderer + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Renderer({:?})", self.kind())
    }
}

/// Creates and clears backend-managed surfaces.
///
/// The sprite allocator calls [`create_surface`](Self::create_surface)
/// when a size class needs a new backing sheet and
/// [`clear_region`](Self::clear_region) when a cell is released, so stale
/// pixels never leak into a later unrelated use.
pub trait SurfaceProvider {
    /// Creates a new surface of `width` × `height` CSS pixels at the
    /// given pixel ratio and returns its handle.
    fn create_surface(&mut self, width: u32, height: u32, pixel_ratio: f64) -> SurfaceId;

    /// Clears the pixels of `rect` (CSS pixels) on `surface`.
    fn clear_region(&mut self, surface: SurfaceId, rect: Rect);
}

impl fmt::Debug for dyn SurfaceProvider + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SurfaceProvider")
    }
}
