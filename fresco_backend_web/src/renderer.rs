// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canvas 2D implementation of the renderer contract.

use alloc::rc::Rc;
use core::cell::RefCell;

use kurbo::{Affine, Rect};
use web_sys::CanvasRenderingContext2d;

use fresco_core::render::{Renderer, RendererKind, SurfaceId};

use crate::surfaces::SurfaceMap;

/// Paints into a `CanvasRenderingContext2D`, resolving [`SurfaceId`]
/// blits through the shared surface map.
///
/// All public coordinates are CSS pixels; the device pixel ratio is
/// folded into the transform on every operation, so callers never see
/// device pixels.
pub struct Canvas2dRenderer {
    context: CanvasRenderingContext2d,
    pixel_ratio: f64,
    surfaces: Rc<RefCell<SurfaceMap>>,
}

impl Canvas2dRenderer {
    pub(crate) fn new(
        context: CanvasRenderingContext2d,
        pixel_ratio: f64,
        surfaces: Rc<RefCell<SurfaceMap>>,
    ) -> Self {
        Self {
            context,
            pixel_ratio,
            surfaces,
        }
    }

    pub(crate) fn set_pixel_ratio(&mut self, pixel_ratio: f64) {
        self.pixel_ratio = pixel_ratio;
    }

    /// Resets the context transform to pixel-ratio scaling only.
    fn apply_base_transform(&self) {
        let r = self.pixel_ratio;
        let _ = self.context.set_transform(r, 0.0, 0.0, r, 0.0, 0.0);
    }
}

impl Renderer for Canvas2dRenderer {
    fn kind(&self) -> RendererKind {
        RendererKind::Canvas2d
    }

    fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    fn clear_rect(&mut self, rect: Rect) {
        self.apply_base_transform();
        self.context
            .clear_rect(rect.x0, rect.y0, rect.width(), rect.height());
    }

    fn set_transform(&mut self, transform: Affine) {
        let r = self.pixel_ratio;
        let [a, b, c, d, e, f] = transform.as_coeffs();
        let _ = self
            .context
            .set_transform(r * a, r * b, r * c, r * d, r * e, r * f);
    }

    fn draw_surface(&mut self, surface: SurfaceId, src: Rect, dst: Rect) {
        let map = self.surfaces.borrow();
        let Some(entry) = map.get(surface) else {
            return;
        };
        self.apply_base_transform();
        // Source coordinates are CSS pixels on the sheet; scale to the
        // sheet's device pixels.
        let sr = entry.pixel_ratio;
        let _ = self
            .context
            .draw_image_with_html_canvas_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                &entry.canvas,
                src.x0 * sr,
                src.y0 * sr,
                src.width() * sr,
                src.height() * sr,
                dst.x0,
                dst.y0,
                dst.width(),
                dst.height(),
            );
    }
}

impl core::fmt::Debug for Canvas2dRenderer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Canvas2dRenderer")
            .field("pixel_ratio", &self.pixel_ratio)
            .finish_non_exhaustive()
    }
}
