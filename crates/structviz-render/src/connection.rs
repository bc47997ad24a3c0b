//! Connector routing: smoothing through waypoints, arc-length trimming and arrowheads.

use crate::element::ElementModel;
use crate::geom::{BezPath, EPSILON, Point, Vector};
use crate::{Error, Result};
use serde::Serialize;
use structviz_core::{ConnectionSpec, StructvizConfig};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouterParams {
    /// Margin used when a connection does not set its own.
    pub margin: f64,
    pub arrow_offset: f64,
    pub arrow_width: f64,
    pub smoothing: f64,
    pub stroke_width: f64,
    /// Reject margins longer than half the path instead of clamping them.
    pub strict: bool,
}

impl Default for RouterParams {
    fn default() -> Self {
        Self::from_config(&StructvizConfig::defaults())
    }
}

impl RouterParams {
    pub fn from_config(config: &StructvizConfig) -> Self {
        Self {
            margin: config.get_f64("connection.margin").unwrap_or(10.0),
            arrow_offset: config.get_f64("connection.arrowOffset").unwrap_or(20.0),
            arrow_width: config.get_f64("connection.arrowWidth").unwrap_or(5.0),
            smoothing: config.get_f64("connection.smoothing").unwrap_or(0.3),
            stroke_width: config.get_f64("connection.strokeWidth").unwrap_or(3.0),
            strict: config.get_bool("geometry.strict").unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    /// Opposite anchors and no waypoints: a single straight segment.
    Direct,
    Smoothed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrowHead {
    /// Sampled point `arrow_offset` before the end of the trimmed path.
    pub base: Point,
    pub normal: Vector,
    /// Closed triangle: tip, then the two base corners.
    pub corners: [Point; 3],
}

impl ArrowHead {
    pub fn tip(&self) -> Point {
        self.corners[0]
    }
}

/// Result of routing one connector between two resolved points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    /// Smoothed path through all points before trimming.
    pub full: BezPath,
    /// Margin actually removed from each end (after clamping).
    pub margin: f64,
    /// Visible stroked path: trimmed, and cut back to the arrow base when there is an arrow.
    pub path: BezPath,
    pub arrow: Option<ArrowHead>,
}

/// Routes a connector from `start` through `waypoints` to `end`.
pub fn route(
    start: Point,
    end: Point,
    waypoints: &[Point],
    margin: f64,
    arrow: bool,
    params: &RouterParams,
) -> Result<Route> {
    if !margin.is_finite() || margin < 0.0 {
        return Err(Error::degenerate(format!(
            "connector margin must be a non-negative number, got {margin}"
        )));
    }

    let mut points = Vec::with_capacity(waypoints.len() + 2);
    points.push(start);
    points.extend_from_slice(waypoints);
    points.push(end);

    let full = BezPath::smooth_geometric(&points, params.smoothing)
        .ok_or_else(|| Error::degenerate("connector has no points"))?;
    let total = full.total_length();

    let half = total / 2.0;
    let margin = if margin > half {
        if params.strict {
            return Err(Error::degenerate(format!(
                "margin {margin} exceeds half of the connector length {total}"
            )));
        }
        tracing::warn!(margin, length = total, "clamping connector margin to half its length");
        half
    } else {
        margin
    };

    let mut path = full.trimmed(margin, total - margin);

    let len = path.total_length();
    let arrow = if arrow && len <= EPSILON {
        if params.strict {
            return Err(Error::degenerate(
                "arrowhead on a connector with no visible length",
            ));
        }
        tracing::warn!(
            length = total,
            margin,
            "connector has no visible length; drawing it without an arrowhead"
        );
        None
    } else if arrow {
        let offset = if params.arrow_offset > len {
            tracing::warn!(
                offset = params.arrow_offset,
                length = len,
                "clamping arrow offset to the connector length"
            );
            len
        } else {
            params.arrow_offset.max(0.0)
        };

        let at = len - offset;
        let base = path.point_at(at);
        let normal = path
            .normal_at(at)
            .ok_or_else(|| Error::degenerate("connector has no direction at the arrow base"))?;
        let tip = path.end();
        let corners = [
            tip,
            base + normal * params.arrow_width,
            base - normal * params.arrow_width,
        ];
        tracing::trace!(?base, ?normal, ?corners, "arrowhead");

        path = path.trimmed(0.0, at);
        Some(ArrowHead {
            base,
            normal,
            corners,
        })
    } else {
        None
    };

    Ok(Route {
        full,
        margin,
        path,
        arrow,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutedConnection {
    /// Position of the connection entry in the document.
    pub position: usize,
    pub id: Option<String>,
    pub kind: RouteKind,
    /// Anchor points before trimming.
    pub from: Point,
    pub to: Point,
    pub color: String,
    pub stroke_width: f64,
    pub route: Route,
}

/// Resolves both anchors of `spec` against `model` and routes between them.
pub fn route_connection(
    position: usize,
    spec: &ConnectionSpec,
    model: &ElementModel,
    params: &RouterParams,
) -> Result<RoutedConnection> {
    let from = model.anchor(&spec.from.element, spec.from.direction, spec.from.index)?;
    let to = model.anchor(&spec.to.element, spec.to.direction, spec.to.index)?;

    let kind = if spec.waypoints.is_empty() && spec.from.direction.is_opposite_of(spec.to.direction)
    {
        RouteKind::Direct
    } else {
        RouteKind::Smoothed
    };

    let margin = spec.margin.unwrap_or(params.margin);
    let route = route(from, to, &spec.waypoints, margin, spec.arrow, params)?;

    tracing::trace!(
        position,
        ?kind,
        length = route.path.total_length(),
        "routed connection"
    );

    Ok(RoutedConnection {
        position,
        id: spec.id.clone(),
        kind,
        from,
        to,
        color: spec.color.clone(),
        stroke_width: params.stroke_width,
        route,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::point;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn straight_connector_loses_margin_at_both_ends() {
        let params = RouterParams::default();
        let r = route(
            point(50.0, 100.0),
            point(50.0, 200.0),
            &[],
            10.0,
            false,
            &params,
        )
        .unwrap();
        assert!(close(r.full.total_length(), 100.0, 1e-9));
        assert!(close(r.path.total_length(), 80.0, 1e-6));
        assert!(close(r.path.start().y, 110.0, 1e-6));
        assert!(close(r.path.end().y, 190.0, 1e-6));
        assert!(r.path.is_straight());
        assert!(r.arrow.is_none());
    }

    #[test]
    fn arrowhead_sits_on_the_normal_twenty_units_before_the_end() {
        let params = RouterParams::default();
        let r = route(
            point(0.0, 0.0),
            point(100.0, 0.0),
            &[],
            10.0,
            true,
            &params,
        )
        .unwrap();
        let arrow = r.arrow.unwrap();
        // trimmed path runs 10..90, arrow base at 90 - 20
        assert!(close(arrow.base.x, 70.0, 1e-6));
        assert!(close(arrow.tip().x, 90.0, 1e-6));
        let half_width = (arrow.corners[1] - arrow.corners[2]).length() / 2.0;
        assert!(close(half_width, 5.0, 1e-9));
        assert!(close(arrow.corners[1].x, 70.0, 1e-6));
        // the stroke stops at the arrow base
        assert!(close(r.path.end().x, 70.0, 1e-6));
        assert!(close(r.path.total_length(), 60.0, 1e-6));
    }

    #[test]
    fn waypoints_are_threaded_and_trimmed_along_the_curve() {
        let params = RouterParams::default();
        let r = route(
            point(0.0, 0.0),
            point(100.0, 100.0),
            &[point(80.0, 10.0)],
            12.0,
            false,
            &params,
        )
        .unwrap();
        let total = r.full.total_length();
        assert_eq!(r.full.vertices()[1], point(80.0, 10.0));
        assert!(close(r.path.total_length(), total - 24.0, 1e-6));
        let expected_start = r.full.point_at(12.0);
        assert!(close(r.path.start().x, expected_start.x, 1e-6));
        assert!(close(r.path.start().y, expected_start.y, 1e-6));
    }

    #[test]
    fn oversized_margin_is_clamped_or_rejected() {
        let lenient = RouterParams::default();
        let r = route(point(0.0, 0.0), point(0.0, 30.0), &[], 25.0, false, &lenient).unwrap();
        assert!(close(r.margin, 15.0, 1e-9));
        assert!(close(r.path.total_length(), 0.0, 1e-6));

        let strict = RouterParams {
            strict: true,
            ..RouterParams::default()
        };
        let err = route(point(0.0, 0.0), point(0.0, 30.0), &[], 25.0, false, &strict).unwrap_err();
        assert!(matches!(err, Error::DegenerateGeometry { .. }));

        let negative = route(point(0.0, 0.0), point(0.0, 30.0), &[], -1.0, false, &lenient);
        assert!(matches!(negative, Err(Error::DegenerateGeometry { .. })));
    }

    #[test]
    fn arrow_offset_is_clamped_to_short_connectors() {
        let params = RouterParams::default();
        let r = route(point(0.0, 0.0), point(30.0, 0.0), &[], 10.0, true, &params).unwrap();
        let arrow = r.arrow.unwrap();
        // visible length is 10, shorter than the 20 unit offset
        assert!(close(arrow.base.x, 10.0, 1e-6));
        assert!(close(arrow.tip().x, 20.0, 1e-6));

    }

    #[test]
    fn clamped_connector_without_visible_length_drops_only_its_arrow() {
        // cells 10 units apart with the default 10 unit margin
        let lenient = RouterParams::default();
        let r = route(point(5.0, 10.0), point(5.0, 20.0), &[], 10.0, true, &lenient).unwrap();
        assert!(close(r.margin, 5.0, 1e-9));
        assert!(close(r.path.total_length(), 0.0, 1e-6));
        assert!(r.arrow.is_none());

        let exact = route(point(0.0, 0.0), point(0.0, 20.0), &[], 10.0, true, &lenient).unwrap();
        assert!(exact.arrow.is_none());

        let strict = RouterParams {
            strict: true,
            ..RouterParams::default()
        };
        let zero = route(point(0.0, 0.0), point(0.0, 20.0), &[], 10.0, true, &strict);
        assert!(matches!(zero, Err(Error::DegenerateGeometry { .. })));
    }
}
