//! Polygon drawing on top of `embedded-graphics`.
//!
//! `embedded-graphics` covers lines, rectangles, circles and triangles; this
//! module adds closed polygons with any number of vertices. Vertices are pixel
//! coordinates. On an [`Arena`](crate::Arena) they may lie outside the grid
//! and the shape wraps around the torus.

use embedded_graphics::{
    Drawable, Pixel,
    draw_target::DrawTarget,
    geometry::Point,
    primitives::{Line, Primitive, PrimitiveStyle},
};

/// Draw the closed outline through `vertices`.
///
/// # Errors
///
/// Returns the draw target's error.
pub fn outline_polygon<D: DrawTarget>(target: &mut D, vertices: &[Point], color: D::Color) -> Result<(), D::Error> {
    let style = PrimitiveStyle::with_stroke(color, 1);
    let closing = vertices.first().copied();
    let ends = vertices.iter().skip(1).copied().chain(closing);
    for (&start, end) in vertices.iter().zip(ends) {
        Line::new(start, end).into_styled(style).draw(target)?;
    }
    Ok(())
}

/// Fill the polygon through `vertices`, outline included.
///
/// The interior follows the even-odd rule, sampled at pixel centres one row
/// at a time, so self-intersecting polygons get holes where they overlap.
///
/// # Errors
///
/// Returns the draw target's error.
#[expect(clippy::cast_possible_truncation, reason = "crossings lie between two i32 vertices")]
pub fn fill_polygon<D: DrawTarget>(target: &mut D, vertices: &[Point], color: D::Color) -> Result<(), D::Error> {
    let (Some(top), Some(bottom)) = (
        vertices.iter().map(|vertex| vertex.y).min(),
        vertices.iter().map(|vertex| vertex.y).max(),
    ) else {
        return Ok(());
    };

    let mut crossings = Vec::with_capacity(vertices.len());
    for y in top..=bottom {
        scanline_crossings(vertices, y, &mut crossings);
        let spans = crossings.chunks_exact(2).flat_map(|pair| {
            let (left, right) = match *pair {
                [left, right] => (left.ceil() as i32, right.floor() as i32),
                _ => (1, 0),
            };
            (left..=right).map(move |x| Pixel(Point::new(x, y), color))
        });
        target.draw_iter(spans)?;
    }
    outline_polygon(target, vertices, color)
}

// Columns where row `y` crosses an edge, sorted left to right.
fn scanline_crossings(vertices: &[Point], y: i32, crossings: &mut Vec<f64>) {
    crossings.clear();
    let ends = vertices.iter().skip(1).chain(vertices.first());
    for (&a, &b) in vertices.iter().zip(ends) {
        let (low, high) = if a.y <= b.y { (a, b) } else { (b, a) };
        // Half-open in y, so a vertex shared by two edges counts once and flat edges never count.
        if y < low.y || y >= high.y {
            continue;
        }
        let along = f64::from(y - low.y) / f64::from(high.y - low.y);
        crossings.push(f64::from(low.x) + along * f64::from(high.x - low.x));
    }
    crossings.sort_by(f64::total_cmp);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_crossings_are_its_sides() {
        let square = [Point::new(1, 1), Point::new(4, 1), Point::new(4, 4), Point::new(1, 4)];
        let mut crossings = Vec::new();
        scanline_crossings(&square, 2, &mut crossings);
        assert_eq!(crossings, [1.0, 4.0]);
        scanline_crossings(&square, 4, &mut crossings);
        assert!(crossings.is_empty());
    }
}
