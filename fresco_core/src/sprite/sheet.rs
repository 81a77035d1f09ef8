// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One backing surface subdivided into a grid of allocatable cells.

use alloc::vec::Vec;
use core::fmt;

use kurbo::Rect;

use crate::render::SurfaceId;

/// Sentinel for "no next sheet" in chain links.
pub(crate) const NO_SHEET: u32 = u32::MAX;

/// Size-class marker for dedicated single-purpose sheets.
pub(crate) const DEDICATED: u32 = u32::MAX;

/// A handle to one exclusively-owned cell of a sprite sheet.
///
/// The handle is not copyable: it is held by exactly one caller until
/// passed back to [`SpriteService::release`](super::SpriteService::release).
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Sprite {
    pub(crate) sheet: u32,
    pub(crate) row: u16,
    pub(crate) col: u16,
}

impl Sprite {
    /// Returns the owning sheet's index within the service (for
    /// diagnostics only).
    #[must_use]
    pub const fn sheet_index(&self) -> u32 {
        self.sheet
    }

    /// Returns the cell's row within its sheet.
    #[must_use]
    pub const fn row(&self) -> u16 {
        self.row
    }

    /// Returns the cell's column within its sheet.
    #[must_use]
    pub const fn col(&self) -> u16 {
        self.col
    }
}

/// A fixed grid of equal-size cells backed by one surface.
///
/// The free stack is LIFO: the most-recently-freed cell is handed out
/// first.
pub(crate) struct SpriteSheet {
    pub(crate) surface: SurfaceId,
    pub(crate) cell_width: f64,
    pub(crate) cell_height: f64,
    pub(crate) rows: u16,
    pub(crate) cols: u16,
    pub(crate) size_class: u32,
    pub(crate) next_sheet: u32,
    free: Vec<(u16, u16)>,
}

impl SpriteSheet {
    /// Creates a sheet with every cell free, stacked so `(0, 0)` is
    /// handed out first.
    pub(crate) fn new(
        surface: SurfaceId,
        cell_width: f64,
        cell_height: f64,
        rows: u16,
        cols: u16,
        size_class: u32,
    ) -> Self {
        assert!(rows > 0 && cols > 0, "sheet must have at least one cell");
        let mut free = Vec::with_capacity(rows as usize * cols as usize);
        for row in (0..rows).rev() {
            for col in (0..cols).rev() {
                free.push((row, col));
            }
        }
        Self {
            surface,
            cell_width,
            cell_height,
            rows,
            cols,
            size_class,
            next_sheet: NO_SHEET,
            free,
        }
    }

    /// Returns whether any cell is free.
    pub(crate) fn has_free(&self) -> bool {
        !self.free.is_empty()
    }

    /// Pops the most-recently-freed cell.
    pub(crate) fn pop_free(&mut self) -> Option<(u16, u16)> {
        self.free.pop()
    }

    /// Returns a cell to the free stack.
    ///
    /// # Panics
    ///
    /// Panics if the cell is out of range or already free (a handle must
    /// never be released twice).
    pub(crate) fn push_free(&mut self, row: u16, col: u16) {
        assert!(row < self.rows && col < self.cols, "cell out of range");
        assert!(
            !self.free.contains(&(row, col)),
            "sprite cell released twice"
        );
        self.free.push((row, col));
    }

    /// Returns the cell's rectangle in sheet coordinates (CSS pixels).
    pub(crate) fn cell_rect(&self, row: u16, col: u16) -> Rect {
        let x = f64::from(col) * self.cell_width;
        let y = f64::from(row) * self.cell_height;
        Rect::new(x, y, x + self.cell_width, y + self.cell_height)
    }
}

impl fmt::Debug for SpriteSheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpriteSheet")
            .field("surface", &self.surface)
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("size_class", &self.size_class)
            .field("free", &self.free.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_pop_in_row_major_order_when_fresh() {
        let mut sheet = SpriteSheet::new(SurfaceId(0), 16.0, 16.0, 2, 2, 4);
        assert_eq!(sheet.pop_free(), Some((0, 0)));
        assert_eq!(sheet.pop_free(), Some((0, 1)));
        assert_eq!(sheet.pop_free(), Some((1, 0)));
        assert_eq!(sheet.pop_free(), Some((1, 1)));
        assert_eq!(sheet.pop_free(), None);
        assert!(!sheet.has_free());
    }

    #[test]
    fn freed_cell_is_reused_first() {
        let mut sheet = SpriteSheet::new(SurfaceId(0), 16.0, 16.0, 2, 2, 4);
        let _ = sheet.pop_free();
        let second = sheet.pop_free().unwrap();
        sheet.push_free(second.0, second.1);
        assert_eq!(sheet.pop_free(), Some(second), "LIFO reuse");
    }

    #[test]
    #[should_panic(expected = "sprite cell released twice")]
    fn double_release_panics() {
        let mut sheet = SpriteSheet::new(SurfaceId(0), 16.0, 16.0, 2, 2, 4);
        let (row, col) = sheet.pop_free().unwrap();
        sheet.push_free(row, col);
        sheet.push_free(row, col);
    }

    #[test]
    fn cell_rect_offsets_by_grid_position() {
        let sheet = SpriteSheet::new(SurfaceId(0), 32.0, 32.0, 4, 4, 5);
        assert_eq!(sheet.cell_rect(0, 0), Rect::new(0.0, 0.0, 32.0, 32.0));
        assert_eq!(sheet.cell_rect(2, 3), Rect::new(96.0, 64.0, 128.0, 96.0));
    }
}
