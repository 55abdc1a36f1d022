//! Coordinate mapping from logical `(x, y)` arena positions to LED indices.
//!
//! Arena panels are wired serpentine column-major: the strip runs down the
//! first column, up the second, down the third, and so on.
//!
//! ```text
//! 3×2 serpentine (LED index at each (x, y)):
//!   LED0  LED3  LED4
//!   LED1  LED2  LED5
//! ```
//!
//! Coordinates use a screen-style convention: `(0, 0)` is the top-left corner,
//! `x` increases to the right, and `y` increases downward.

use crate::{Error, Result};

/// What to do with a coordinate that falls outside the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Edges {
    /// Treat the grid as a torus: wrap each axis independently (floored modulo).
    #[default]
    Toroidal,
    /// Reject the coordinate with [`Error::OutOfBounds`].
    Strict,
}

/// LED index of an in-range `(x, y)` on a serpentine column-major chain of the given height.
///
/// Even columns run top-to-bottom, odd columns bottom-to-top.
///
/// ```rust
/// use arena_envoy::mapping::pixel_index;
///
/// assert_eq!(pixel_index(0, 3, 16), 3);
/// assert_eq!(pixel_index(1, 0, 16), 31);
/// assert_eq!(pixel_index(15, 12, 16), 243);
/// ```
#[must_use]
pub const fn pixel_index(x: usize, y: usize, height: usize) -> usize {
    if x % 2 == 0 {
        // Even column: top-to-bottom
        x * height + y
    } else {
        // Odd column: bottom-to-top
        (x + 1) * height - y - 1
    }
}

/// Inverse of [`pixel_index`] for a chain of the given height.
#[must_use]
pub const fn pixel_xy(index: usize, height: usize) -> (usize, usize) {
    let x = index / height;
    let offset = index % height;
    if x % 2 == 0 {
        (x, offset)
    } else {
        (x, height - offset - 1)
    }
}

/// Width and height of a logical grid, with the edge policy applied to every lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
}

impl Grid {
    /// Create a grid description.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero or does not fit in `i32`.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0, "width and height must be positive");
        assert!(
            i32::try_from(width).is_ok() && i32::try_from(height).is_ok(),
            "width and height must fit in i32"
        );
        Self { width, height }
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Total number of cells.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.width * self.height
    }

    /// Always `false`; grids have positive dimensions.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Whether `(x, y)` lies inside the grid.
    #[must_use]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        usize::try_from(x).is_ok_and(|x| x < self.width)
            && usize::try_from(y).is_ok_and(|y| y < self.height)
    }

    /// Wrap `(x, y)` onto the torus.
    #[must_use]
    pub fn wrap(&self, x: i32, y: i32) -> (usize, usize) {
        (wrap_axis(x, self.width), wrap_axis(y, self.height))
    }

    /// Resolve `(x, y)` to an in-range column and row under the given edge policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] for an out-of-range coordinate under [`Edges::Strict`].
    pub fn resolve(&self, x: i32, y: i32, edges: Edges) -> Result<(usize, usize)> {
        match edges {
            Edges::Toroidal => Ok(self.wrap(x, y)),
            Edges::Strict if self.contains(x, y) => Ok(self.wrap(x, y)),
            Edges::Strict => Err(Error::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            }),
        }
    }

    /// Serpentine LED index of `(x, y)` under the given edge policy.
    ///
    /// ```rust
    /// use arena_envoy::mapping::{Edges, Grid};
    ///
    /// let grid = Grid::new(128, 16);
    /// assert_eq!(grid.index(-1, 0, Edges::Toroidal), grid.index(127, 0, Edges::Toroidal));
    /// assert!(grid.index(128, 0, Edges::Strict).is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] for an out-of-range coordinate under [`Edges::Strict`].
    pub fn index(&self, x: i32, y: i32, edges: Edges) -> Result<usize> {
        let (x, y) = self.resolve(x, y, edges)?;
        Ok(pixel_index(x, y, self.height))
    }
}

// `rem_euclid` floors toward negative infinity, so -1 wraps to `len - 1`.
fn wrap_axis(value: i32, len: usize) -> usize {
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    let wrapped = i64::from(value).rem_euclid(len);
    usize::try_from(wrapped).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serpentine_3x2_matches_layout_diagram() {
        let order: Vec<(usize, usize)> = (0..6).map(|index| pixel_xy(index, 2)).collect();
        assert_eq!(order, [(0, 0), (0, 1), (1, 1), (1, 0), (2, 0), (2, 1)]);
    }

    #[test]
    fn negative_coordinates_wrap_to_far_edge() {
        let grid = Grid::new(16, 16);
        assert_eq!(grid.wrap(-1, -17), (15, 15));
        assert_eq!(grid.wrap(16, 32), (0, 0));
    }

    #[test]
    fn strict_reports_the_offending_coordinate() {
        let grid = Grid::new(4, 2);
        assert_eq!(
            grid.index(4, -1, Edges::Strict),
            Err(Error::OutOfBounds {
                x: 4,
                y: -1,
                width: 4,
                height: 2
            })
        );
    }
}
