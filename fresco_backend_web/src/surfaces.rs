// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Off-screen canvas registry backing [`SurfaceId`] handles.
//!
//! The sprite allocator and the renderer both refer to backing stores by
//! opaque [`SurfaceId`]. This module owns the mapping to real off-screen
//! `<canvas>` elements: the allocator creates and clears surfaces through
//! [`CanvasSurfaces`] (a [`SurfaceProvider`]), and the renderer resolves
//! IDs back to elements for blitting through the shared [`SurfaceMap`].

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use kurbo::Rect;
use wasm_bindgen::JsCast as _;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement};

use fresco_core::render::{SurfaceId, SurfaceProvider};

/// One registered off-screen canvas.
pub(crate) struct SurfaceCanvas {
    pub(crate) canvas: HtmlCanvasElement,
    pub(crate) context: CanvasRenderingContext2d,
    pub(crate) pixel_ratio: f64,
}

/// The shared `SurfaceId` → canvas mapping.
#[derive(Default)]
pub(crate) struct SurfaceMap {
    entries: Vec<SurfaceCanvas>,
}

impl SurfaceMap {
    pub(crate) fn get(&self, surface: SurfaceId) -> Option<&SurfaceCanvas> {
        self.entries.get(surface.0 as usize)
    }

    fn push(&mut self, entry: SurfaceCanvas) -> SurfaceId {
        let id = SurfaceId(u32::try_from(self.entries.len()).expect("surface count exceeds u32"));
        self.entries.push(entry);
        id
    }
}

/// Creates off-screen canvases for the sprite allocator.
pub struct CanvasSurfaces {
    document: Document,
    map: Rc<RefCell<SurfaceMap>>,
}

impl CanvasSurfaces {
    /// Creates a provider that allocates canvases from `document`.
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self {
            document,
            map: Rc::new(RefCell::new(SurfaceMap::default())),
        }
    }

    /// Returns the shared map handle for the renderer.
    pub(crate) fn map(&self) -> Rc<RefCell<SurfaceMap>> {
        Rc::clone(&self.map)
    }
}

impl SurfaceProvider for CanvasSurfaces {
    fn create_surface(&mut self, width: u32, height: u32, pixel_ratio: f64) -> SurfaceId {
        let canvas: HtmlCanvasElement = self
            .document
            .create_element("canvas")
            .expect("create_element failed")
            .unchecked_into();
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "surface dimensions are small positive values"
        )]
        {
            canvas.set_width((f64::from(width) * pixel_ratio).ceil() as u32);
            canvas.set_height((f64::from(height) * pixel_ratio).ceil() as u32);
        }
        let context: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .expect("2d context unavailable on off-screen canvas")
            .unchecked_into();
        self.map.borrow_mut().push(SurfaceCanvas {
            canvas,
            context,
            pixel_ratio,
        })
    }

    fn clear_region(&mut self, surface: SurfaceId, rect: Rect) {
        let map = self.map.borrow();
        if let Some(entry) = map.get(surface) {
            let r = entry.pixel_ratio;
            let _ = entry.context.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
            entry.context.clear_rect(
                rect.x0 * r,
                rect.y0 * r,
                rect.width() * r,
                rect.height() * r,
            );
        }
    }
}

impl core::fmt::Debug for CanvasSurfaces {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CanvasSurfaces")
            .field("surfaces", &self.map.borrow().entries.len())
            .finish_non_exhaustive()
    }
}
