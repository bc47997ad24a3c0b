//! Geometry used by the layout passes: euclid aliases from `structviz-core` at the API boundary,
//! kurbo underneath for curves and arc-length queries.

mod path;

pub use path::BezPath;
pub use structviz_core::geom::{Point, Rect, Size, Vector, point, rect, vector};

/// Tolerance for "same point" and "zero length" comparisons, in canvas units.
pub const EPSILON: f64 = 1e-9;

pub fn union_rects(rects: impl IntoIterator<Item = Rect>) -> Option<Rect> {
    rects.into_iter().reduce(|a, b| a.union(&b))
}

pub(crate) fn to_kurbo(p: Point) -> kurbo::Point {
    kurbo::Point::new(p.x, p.y)
}

pub(crate) fn from_kurbo(p: kurbo::Point) -> Point {
    point(p.x, p.y)
}
