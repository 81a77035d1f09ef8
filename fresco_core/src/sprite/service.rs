// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Size-class pooling and sheet chaining.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use kurbo::Rect;
use kurbo::common::FloatFuncs;

use crate::render::{SurfaceId, SurfaceProvider};

use super::sheet::{DEDICATED, NO_SHEET, Sprite, SpriteSheet};

/// Requests whose longer side exceeds this multiple of the shorter side
/// waste too much of a square cell and get a dedicated sheet instead.
const MAX_ASPECT: u32 = 4;

/// Size-class bounds and scaling for a [`SpriteService`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteConfig {
    /// Smallest pooled size class; requests below it round up.
    pub min_class: u32,
    /// Largest pooled size class. Shared sheets are square with edge
    /// `1 << max_class` CSS pixels.
    pub max_class: u32,
    /// Device pixels per CSS pixel of the backing surfaces.
    pub pixel_ratio: f64,
}

impl SpriteConfig {
    /// Creates a config with explicit class bounds.
    ///
    /// # Panics
    ///
    /// Panics if `min_class > max_class` or `max_class > 12` (sheets are
    /// capped at 4096 CSS pixels per edge).
    #[must_use]
    pub const fn new(min_class: u32, max_class: u32, pixel_ratio: f64) -> Self {
        assert!(min_class <= max_class, "min_class must not exceed max_class");
        assert!(max_class <= 12, "sheet edge is capped at 4096 pixels");
        Self {
            min_class,
            max_class,
            pixel_ratio,
        }
    }

    /// Derives class bounds from the hosting surface's dimensions: the
    /// sheet edge is the largest power of two not exceeding the shorter
    /// surface side (clamped to [64, 4096]), and the smallest pooled
    /// cell is 16 pixels.
    #[must_use]
    pub fn derive(surface_width: f64, surface_height: f64, pixel_ratio: f64) -> Self {
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "surface dimensions are small positive values"
        )]
        let shorter = surface_width.min(surface_height).max(64.0) as u32;
        let max_class = shorter.ilog2().min(12);
        Self::new(4.min(max_class), max_class, pixel_ratio)
    }
}

/// Pools sprite sheets by power-of-two size class.
///
/// Each class holds the head of a singly linked chain of same-size
/// sheets. Allocation pops the head sheet's free stack; an exhausted
/// head is skipped by walking the chain and splicing the first sheet
/// with capacity to the front, so subsequent allocations do not rescan
/// exhausted sheets.
pub struct SpriteService {
    config: SpriteConfig,
    provider: Box<dyn SurfaceProvider>,
    sheets: Vec<SpriteSheet>,
    slabs: Vec<u32>,
}

impl SpriteService {
    /// Creates a service that allocates backing surfaces from
    /// `provider`.
    #[must_use]
    pub fn new(config: SpriteConfig, provider: Box<dyn SurfaceProvider>) -> Self {
        let classes = (config.max_class - config.min_class + 1) as usize;
        Self {
            config,
            provider,
            sheets: Vec::new(),
            slabs: alloc::vec![NO_SHEET; classes],
        }
    }

    /// Acquires an exclusively-owned cell fitting `width` × `height`
    /// CSS pixels.
    ///
    /// The cell comes from the smallest power-of-two size class that
    /// fits the longer side. Requests above the largest class, or whose
    /// aspect ratio would waste most of a square cell, are served from a
    /// dedicated sheet sized exactly to the request (no sharing, no
    /// chaining). Never fails; new backing sheets are created on demand.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is not positive.
    pub fn acquire(&mut self, width: f64, height: f64) -> Sprite {
        assert!(
            width > 0.0 && height > 0.0,
            "sprite dimensions must be positive"
        );
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "dimensions are validated positive and far below u32::MAX"
        )]
        let (w, h) = (width.ceil() as u32, height.ceil() as u32);
        let longer = w.max(h).max(1);
        let shorter = w.min(h).max(1);

        let class = ceil_log2(longer);
        if class > self.config.max_class || longer > MAX_ASPECT * shorter {
            return self.acquire_dedicated(w, h);
        }
        let class = class.max(self.config.min_class);
        let slab = (class - self.config.min_class) as usize;

        // Fast path: the head sheet has capacity.
        let head = self.slabs[slab];
        if head != NO_SHEET && self.sheets[head as usize].has_free() {
            return self.pop_cell(head);
        }

        // Walk the chain for a sheet with capacity and splice it to the
        // front so the exhausted head is not rescanned next time.
        if head != NO_SHEET {
            let mut prev = head;
            let mut cursor = self.sheets[head as usize].next_sheet;
            while cursor != NO_SHEET {
                if self.sheets[cursor as usize].has_free() {
                    let after = self.sheets[cursor as usize].next_sheet;
                    self.sheets[prev as usize].next_sheet = after;
                    self.sheets[cursor as usize].next_sheet = head;
                    self.slabs[slab] = cursor;
                    return self.pop_cell(cursor);
                }
                prev = cursor;
                cursor = self.sheets[cursor as usize].next_sheet;
            }
        }

        // No capacity anywhere in the chain: a fresh sheet becomes the
        // new head.
        let edge = 1u32 << self.config.max_class;
        let cell = 1u32 << class;
        let per_side = (edge / cell).max(1);
        let surface = self
            .provider
            .create_surface(edge, edge, self.config.pixel_ratio);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "per_side is at most 1 << 12"
        )]
        let mut sheet = SpriteSheet::new(
            surface,
            f64::from(cell),
            f64::from(cell),
            per_side as u16,
            per_side as u16,
            class,
        );
        sheet.next_sheet = head;
        let idx = self.push_sheet(sheet);
        self.slabs[slab] = idx;
        self.pop_cell(idx)
    }

    /// Clears the cell's pixels and returns it to its sheet's free
    /// stack. Chain order is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if the handle's sheet is unknown or the cell is already
    /// free.
    pub fn release(&mut self, sprite: Sprite) {
        let sheet = &self.sheets[sprite.sheet as usize];
        let rect = sheet.cell_rect(sprite.row, sprite.col);
        let surface = sheet.surface;
        self.provider.clear_region(surface, rect);
        self.sheets[sprite.sheet as usize].push_free(sprite.row, sprite.col);
    }

    /// Returns the backing surface of a sprite's sheet.
    ///
    /// Drawing through the handle retargets the shared surface's
    /// transform to the cell offset; the transform does not persist
    /// across unrelated operations on the same surface.
    #[must_use]
    pub fn surface(&self, sprite: &Sprite) -> SurfaceId {
        self.sheets[sprite.sheet as usize].surface
    }

    /// Returns the sprite's cell rectangle in sheet coordinates.
    #[must_use]
    pub fn cell_rect(&self, sprite: &Sprite) -> Rect {
        self.sheets[sprite.sheet as usize].cell_rect(sprite.row, sprite.col)
    }

    /// Returns the number of backing sheets created so far.
    #[must_use]
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Serves an oversize or aspect-hostile request from a
    /// single-purpose sheet sized exactly to the request.
    fn acquire_dedicated(&mut self, width: u32, height: u32) -> Sprite {
        let surface = self
            .provider
            .create_surface(width, height, self.config.pixel_ratio);
        let sheet = SpriteSheet::new(
            surface,
            f64::from(width),
            f64::from(height),
            1,
            1,
            DEDICATED,
        );
        let idx = self.push_sheet(sheet);
        self.pop_cell(idx)
    }

    fn push_sheet(&mut self, sheet: SpriteSheet) -> u32 {
        let idx = u32::try_from(self.sheets.len()).expect("sheet count exceeds u32");
        self.sheets.push(sheet);
        idx
    }

    fn pop_cell(&mut self, sheet: u32) -> Sprite {
        let (row, col) = self.sheets[sheet as usize]
            .pop_free()
            .expect("sheet chosen for allocation has a free cell");
        Sprite { sheet, row, col }
    }
}

impl fmt::Debug for SpriteService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpriteService")
            .field("config", &self.config)
            .field("sheets", &self.sheets.len())
            .finish_non_exhaustive()
    }
}

/// Smallest `c` with `1 << c >= n` (n ≥ 1).
const fn ceil_log2(n: u32) -> u32 {
    if n <= 1 { 0 } else { 32 - (n - 1).leading_zeros() }
}
