//! The logical arena framebuffer and its "last rendered" shadow.
//!
//! Cells are stored in serpentine chain order (see [`crate::mapping`]), so the
//! linear index of a cell is exactly the LED index it would have on a single
//! chain spanning the full width.

use core::ops::Range;

use crate::color::ColorName;
use crate::mapping::{Grid, pixel_index};

/// Colour grid plus the snapshot last sent to the hardware.
///
/// A shadow cell of `None` is unknown and always counts as changed; see
/// [`Framebuffer::invalidate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Framebuffer {
    grid: Grid,
    cells: Vec<ColorName>,
    shadow: Vec<Option<ColorName>>,
}

impl Framebuffer {
    /// Create a framebuffer filled with `fill`, whose shadow assumes the hardware already shows `fill`.
    #[must_use]
    pub fn new(grid: Grid, fill: ColorName) -> Self {
        Self {
            grid,
            cells: vec![fill; grid.len()],
            shadow: vec![Some(fill); grid.len()],
        }
    }

    /// Grid dimensions.
    #[must_use]
    pub const fn grid(&self) -> Grid {
        self.grid
    }

    /// Set every cell to `color`.
    pub fn clear(&mut self, color: ColorName) {
        self.cells.fill(color);
    }

    /// Write one in-range cell.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the grid; callers resolve coordinates first.
    pub fn set(&mut self, x: usize, y: usize, color: ColorName) {
        let index = self.linear_index(x, y);
        if let Some(cell) = self.cells.get_mut(index) {
            *cell = color;
        }
    }

    /// Read one in-range cell.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the grid; callers resolve coordinates first.
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> ColorName {
        let index = self.linear_index(x, y);
        self.cells.get(index).copied().unwrap_or_default()
    }

    /// The colour at `(x, y)` if it differs from what was last rendered there.
    #[must_use]
    pub fn changed(&self, x: usize, y: usize) -> Option<ColorName> {
        let index = self.linear_index(x, y);
        let current = self.cells.get(index).copied()?;
        let rendered = self.shadow.get(index).copied().flatten();
        (rendered != Some(current)).then_some(current)
    }

    /// Number of cells that differ from the shadow.
    #[must_use]
    pub fn changed_count(&self) -> usize {
        self.cells
            .iter()
            .zip(&self.shadow)
            .filter(|(current, rendered)| **rendered != Some(**current))
            .count()
    }

    /// Replace the whole shadow with the current cells.
    pub fn commit(&mut self) {
        for (rendered, current) in self.shadow.iter_mut().zip(&self.cells) {
            *rendered = Some(*current);
        }
    }

    /// Replace the shadow for the given columns only.
    pub fn commit_columns(&mut self, columns: Range<usize>) {
        let height = self.grid.height();
        let start = columns.start.saturating_mul(height);
        let end = columns.end.min(self.grid.width()).saturating_mul(height);
        // Serpentine order keeps every column's cells contiguous.
        if let (Some(shadow), Some(cells)) = (self.shadow.get_mut(start..end), self.cells.get(start..end)) {
            for (rendered, current) in shadow.iter_mut().zip(cells) {
                *rendered = Some(*current);
            }
        }
    }

    /// Forget what was rendered, so every cell counts as changed.
    pub fn invalidate(&mut self) {
        self.shadow.fill(None);
    }

    fn linear_index(&self, x: usize, y: usize) -> usize {
        assert!(x < self.grid.width(), "x must be within width");
        assert!(y < self.grid.height(), "y must be within height");
        pixel_index(x, y, self.grid.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_marks_only_that_cell_changed() {
        let mut frame = Framebuffer::new(Grid::new(4, 3), ColorName::Black);
        frame.set(1, 2, ColorName::Red);
        assert_eq!(frame.changed(1, 2), Some(ColorName::Red));
        assert_eq!(frame.changed(0, 0), None);
        assert_eq!(frame.changed_count(), 1);
    }

    #[test]
    fn commit_columns_leaves_other_columns_pending() {
        let mut frame = Framebuffer::new(Grid::new(4, 3), ColorName::Black);
        frame.clear(ColorName::Blue);
        frame.commit_columns(0..2);
        assert_eq!(frame.changed(1, 1), None);
        assert_eq!(frame.changed(2, 1), Some(ColorName::Blue));
        assert_eq!(frame.changed_count(), 6);
    }

    #[test]
    fn invalidate_makes_everything_changed() {
        let mut frame = Framebuffer::new(Grid::new(2, 2), ColorName::Black);
        frame.invalidate();
        assert_eq!(frame.changed_count(), 4);
        frame.commit();
        assert_eq!(frame.changed_count(), 0);
    }
}
