use super::{EPSILON, Point, Rect, Vector, from_kurbo, rect, to_kurbo, vector};
use kurbo::{
    Affine, Line, ParamCurve, ParamCurveArclen, ParamCurveDeriv, PathEl, PathSeg, Shape, Vec2,
};
use serde::{Serialize, Serializer};

/// Accuracy passed to kurbo's arc-length solvers, in canvas units.
const ARCLEN_ACCURACY: f64 = 1e-9;

/// Open path of line and cubic segments with arc-length queries.
///
/// Serializes as SVG path data.
#[derive(Debug, Clone, PartialEq)]
pub struct BezPath(kurbo::BezPath);

impl Serialize for BezPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_svg())
    }
}

fn unit(v: Vec2) -> Option<Vec2> {
    let len = v.hypot();
    (len > EPSILON).then(|| v / len)
}

/// Unit tangent of `seg` at `t`. Zero-length handles make the derivative vanish at the ends, so
/// the direction then comes from a short secant, and finally from the chord.
fn segment_tangent(seg: PathSeg, t: f64) -> Option<Vec2> {
    let d = match seg {
        PathSeg::Line(line) => line.p1 - line.p0,
        PathSeg::Quad(quad) => quad.raise().deriv().eval(t).to_vec2(),
        PathSeg::Cubic(cubic) => cubic.deriv().eval(t).to_vec2(),
    };
    unit(d)
        .or_else(|| unit(seg.eval((t + 1e-4).min(1.0)) - seg.eval((t - 1e-4).max(0.0))))
        .or_else(|| unit(seg.end() - seg.start()))
}

/// Parameter of the first point on `seg` at distance `radius` from `center`.
fn first_crossing(seg: PathSeg, center: kurbo::Point, radius: f64) -> Option<f64> {
    if let PathSeg::Line(line) = seg {
        let d = line.p1 - line.p0;
        let m = line.p0 - center;
        let a = d.dot(d);
        if a <= EPSILON * EPSILON {
            return None;
        }
        let b = 2.0 * m.dot(d);
        let c = m.dot(m) - radius * radius;
        let disc = b * b - 4.0 * a * c;
        if disc < 0.0 {
            return None;
        }
        let root = disc.sqrt();
        return [(-b - root) / (2.0 * a), (-b + root) / (2.0 * a)]
            .into_iter()
            .find(|t| (0.0..=1.0).contains(t));
    }

    const STEPS: usize = 64;
    let f = |t: f64| (seg.eval(t) - center).hypot() - radius;
    let mut lo = 0.0;
    let mut f_lo = f(lo);
    if f_lo == 0.0 {
        return Some(lo);
    }
    for i in 1..=STEPS {
        let hi = i as f64 / STEPS as f64;
        let f_hi = f(hi);
        if f_hi == 0.0 {
            return Some(hi);
        }
        if (f_lo < 0.0) != (f_hi < 0.0) {
            let (mut a, mut b) = (lo, hi);
            for _ in 0..60 {
                let mid = 0.5 * (a + b);
                if (f(mid) < 0.0) == (f_lo < 0.0) {
                    a = mid;
                } else {
                    b = mid;
                }
            }
            return Some(b);
        }
        lo = hi;
        f_lo = f_hi;
    }
    None
}

fn push_segment(path: &mut kurbo::BezPath, seg: PathSeg) {
    match seg {
        PathSeg::Line(line) => path.line_to(line.p1),
        PathSeg::Quad(quad) => path.quad_to(quad.p1, quad.p2),
        PathSeg::Cubic(cubic) => path.curve_to(cubic.p1, cubic.p2, cubic.p3),
    }
}

impl BezPath {
    pub fn new(start: Point) -> Self {
        let mut path = kurbo::BezPath::new();
        path.move_to(to_kurbo(start));
        Self(path)
    }

    pub fn line(a: Point, b: Point) -> Self {
        let mut path = Self::new(a);
        path.line_to(b);
        path
    }

    pub fn polyline(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut path = Self::new(*first);
        for &p in rest {
            path.line_to(p);
        }
        Some(path)
    }

    /// Curve through `points` with rounded interior vertices.
    ///
    /// Each interior vertex `p1` (neighbours `p0`, `p2`) gets handles parallel to `p0 - p2`,
    /// split between its two sides in proportion to the adjacent segment lengths and scaled by
    /// `factor`. The end vertices keep zero-length handles, so a two-point input stays straight.
    pub fn smooth_geometric(points: &[Point], factor: f64) -> Option<Self> {
        let n = points.len();
        let first = *points.first()?;
        let mut handle_in = vec![vector(0.0, 0.0); n];
        let mut handle_out = vec![vector(0.0, 0.0); n];

        for i in 1..n.saturating_sub(1) {
            let (p0, p1, p2) = (points[i - 1], points[i], points[i + 1]);
            let d1 = (p1 - p0).length();
            let d2 = (p2 - p1).length();
            if d1 + d2 <= EPSILON {
                continue;
            }
            let v = p0 - p2;
            let k1 = factor * d1 / (d1 + d2);
            let k2 = factor - k1;
            handle_in[i] = v * k1;
            handle_out[i] = -v * k2;
        }

        let mut path = Self::new(first);
        for i in 0..n.saturating_sub(1) {
            let (a, b) = (points[i], points[i + 1]);
            let (out, into) = (handle_out[i], handle_in[i + 1]);
            if out == Vector::zero() && into == Vector::zero() {
                path.line_to(b);
            } else {
                path.curve_to(a + out, b + into, b);
            }
        }
        Some(path)
    }

    pub fn line_to(&mut self, p: Point) {
        self.0.line_to(to_kurbo(p));
    }

    pub fn curve_to(&mut self, c1: Point, c2: Point, p: Point) {
        self.0.curve_to(to_kurbo(c1), to_kurbo(c2), to_kurbo(p));
    }

    pub fn start(&self) -> Point {
        match self.0.elements().first() {
            Some(PathEl::MoveTo(p)) => from_kurbo(*p),
            _ => Point::origin(),
        }
    }

    pub fn end(&self) -> Point {
        self.0
            .segments()
            .last()
            .map_or_else(|| self.start(), |seg| from_kurbo(seg.end()))
    }

    pub fn segments(&self) -> impl Iterator<Item = PathSeg> + '_ {
        self.0.segments()
    }

    /// On-curve vertices: the start point followed by each segment's end point.
    pub fn vertices(&self) -> Vec<Point> {
        std::iter::once(self.start())
            .chain(self.0.segments().map(|seg| from_kurbo(seg.end())))
            .collect()
    }

    pub fn is_straight(&self) -> bool {
        self.0.segments().all(|seg| matches!(seg, PathSeg::Line(_)))
    }

    pub fn segment_lengths(&self) -> Vec<f64> {
        self.0
            .segments()
            .map(|seg| seg.arclen(ARCLEN_ACCURACY))
            .collect()
    }

    pub fn total_length(&self) -> f64 {
        self.segment_lengths().iter().sum()
    }

    /// Segment and parameter for arc length `len` (clamped to the path).
    ///
    /// At a boundary between two segments `toward_end` picks the earlier segment (t = 1);
    /// otherwise the later one (t = 0).
    fn locate(&self, len: f64, lengths: &[f64], toward_end: bool) -> Option<(usize, PathSeg, f64)> {
        let last = lengths.len().checked_sub(1)?;
        let mut acc = 0.0;
        for (i, (seg, &seg_len)) in self.0.segments().zip(lengths).enumerate() {
            let inside = if toward_end {
                len <= acc + seg_len
            } else {
                len < acc + seg_len
            };
            if inside || i == last {
                let local = len - acc;
                let t = if local <= 0.0 || seg_len <= EPSILON {
                    0.0
                } else if local >= seg_len {
                    1.0
                } else {
                    seg.inv_arclen(local, ARCLEN_ACCURACY)
                };
                return Some((i, seg, t));
            }
            acc += seg_len;
        }
        None
    }

    pub fn point_at(&self, len: f64) -> Point {
        let lengths = self.segment_lengths();
        match self.locate(len, &lengths, true) {
            Some((_, seg, t)) => from_kurbo(seg.eval(t)),
            None => self.start(),
        }
    }

    pub fn tangent_at(&self, len: f64) -> Option<Vector> {
        let lengths = self.segment_lengths();
        let (_, seg, t) = self.locate(len, &lengths, true)?;
        segment_tangent(seg, t).map(|d| vector(d.x, d.y))
    }

    /// Unit normal at arc length `len`: the tangent turned a quarter towards negative y.
    pub fn normal_at(&self, len: f64) -> Option<Vector> {
        self.tangent_at(len).map(|t| vector(t.y, -t.x))
    }

    /// Sub-path between arc lengths `from` and `to`, cut exactly on the curve.
    pub fn trimmed(&self, from: f64, to: f64) -> BezPath {
        let lengths = self.segment_lengths();
        let total: f64 = lengths.iter().sum();
        let from = from.clamp(0.0, total);
        let to = to.clamp(from, total);

        let (Some((i, first, ti)), Some((j, last, tj))) = (
            self.locate(from, &lengths, false),
            self.locate(to, &lengths, true),
        ) else {
            return self.clone();
        };

        let pieces: Vec<PathSeg> = if i > j {
            // `from == to` on a segment boundary
            let p = last.eval(tj);
            vec![PathSeg::Line(Line::new(p, p))]
        } else if i == j {
            vec![first.subsegment(ti..tj.max(ti))]
        } else {
            std::iter::once(first.subsegment(ti..1.0))
                .chain(self.0.segments().take(j).skip(i + 1))
                .chain(std::iter::once(last.subsegment(0.0..tj)))
                .collect()
        };

        let mut path = kurbo::BezPath::new();
        path.move_to(pieces[0].start());
        for seg in pieces {
            push_segment(&mut path, seg);
        }
        BezPath(path)
    }

    /// First point, walking from the start, where the path crosses the circle's boundary.
    pub fn first_circle_intersection(&self, center: Point, radius: f64) -> Option<Point> {
        let center = to_kurbo(center);
        self.0
            .segments()
            .find_map(|seg| first_crossing(seg, center, radius).map(|t| from_kurbo(seg.eval(t))))
    }

    /// This path turned by `degrees` about `center` (positive angles turn clockwise on screen).
    pub fn rotated_about(&self, center: Point, degrees: f64) -> BezPath {
        let mut path = self.0.clone();
        path.apply_affine(Affine::rotate_about(degrees.to_radians(), to_kurbo(center)));
        BezPath(path)
    }

    /// Tight bounding box of the curve.
    pub fn bounds(&self) -> Rect {
        let b = self.0.bounding_box();
        rect(b.x0, b.y0, b.width(), b.height())
    }
}
