//! Layout for sparse complete binary trees.
//!
//! Every present index gets a fixed slot: the bottom level is spread evenly, and each parent sits
//! midway over its two child slots whether or not those children exist.

use crate::geom::{BezPath, Point, Size, point, vector};
use crate::{Error, Result};
use serde::Serialize;
use structviz_core::tree::level;
use structviz_core::{StructvizConfig, TreeSpec};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeParams {
    pub radius: f64,
    pub x_scale: f64,
    pub y_scale: f64,
    pub active_color: String,
    pub font_family: String,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self::from_config(&StructvizConfig::defaults())
    }
}

impl TreeParams {
    pub fn from_config(config: &StructvizConfig) -> Self {
        Self {
            radius: config.get_f64("tree.nodeRadius").unwrap_or(20.0),
            x_scale: config.get_f64("tree.xScale").unwrap_or(0.5),
            y_scale: config.get_f64("tree.yScale").unwrap_or(1.0),
            active_color: config
                .get_str("tree.activeColor")
                .unwrap_or("#2bc5f0")
                .to_string(),
            font_family: config
                .get_str("text.fontFamily")
                .unwrap_or("Courier New")
                .to_string(),
        }
    }

    /// Horizontal unit: everything on the x axis is a power of two times this.
    fn unit_x(&self) -> f64 {
        self.radius * self.x_scale
    }
}

fn pow2(exp: u32) -> f64 {
    2f64.powi(exp as i32)
}

/// Root center for a tree whose deepest level is `max_level`.
pub fn root_position(max_level: u32, params: &TreeParams) -> Point {
    let r = params.radius;
    let sum: f64 = (0..max_level).map(|i| pow2(2 + i)).sum();
    point(3.0 * r + sum * params.unit_x(), 3.0 * r)
}

/// Offset of node `index` from the root center.
pub fn node_offset(index: u32, max_level: u32, params: &TreeParams) -> (f64, f64) {
    let level = level(index);
    let relative_level = max_level.saturating_sub(level);
    let unit = params.unit_x();

    let mut x = 0.0;
    let mut y = 0.0;
    if level > 0 {
        // walk down the left spine to this level's first slot
        for i in 1..=level {
            x -= pow2(2 + max_level.saturating_sub(i)) * unit;
        }
        y = 4.0 * level as f64 * params.radius * params.y_scale;
    }

    let index_offset = (pow2(level) - index as f64).abs();
    x += index_offset * pow2(3 + relative_level) * unit;
    (x, y)
}

fn max_level_of(spec: &TreeSpec) -> Result<u32> {
    spec.max_level().ok_or(Error::EmptyTree)
}

pub fn tree_size(spec: &TreeSpec, params: &TreeParams) -> Result<Size> {
    let max_level = max_level_of(spec)?;
    Ok(canvas_size(max_level, params))
}

fn canvas_size(max_level: u32, params: &TreeParams) -> Size {
    let r = params.radius;
    let root = root_position(max_level, params);
    Size::new(
        2.0 * root.x + 2.0 * r,
        r * params.y_scale * (4.0 * max_level as f64 + 2.0) + 4.0 * r,
    )
}

/// Curved arrow drawn beside a node to show a pending rotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RotationIndicator {
    pub arc: BezPath,
    /// Open three-point polyline.
    pub head: BezPath,
    /// Zero when the node has no rotation; the geometry is still built.
    pub stroke_width: f64,
}

impl RotationIndicator {
    fn build(center: Point, radius: f64, angle: Option<f64>) -> Self {
        let (x, y, r) = (center.x, center.y, radius);
        let degrees = angle.unwrap_or(0.0);
        let sign = if degrees > 0.0 { 1.0 } else { -1.0 };

        let from = point(x + 2.0 * r, y + 0.7 * r);
        let to = point(x + 2.0 * r, y - 0.7 * r);
        let mut arc = BezPath::new(from);
        arc.curve_to(
            from + vector(0.3 * r, -0.3 * r),
            to + vector(0.3 * r, 0.3 * r),
            to,
        );

        let mut head = BezPath::new(point(x + 1.9 * r, y + 0.35 * r * sign));
        head.line_to(point(x + 2.0 * r, y + 0.7 * r * sign));
        head.line_to(point(x + 2.4 * r, y + 0.55 * r * sign));

        Self {
            arc: arc.rotated_about(center, degrees),
            head: head.rotated_about(center, degrees),
            stroke_width: if degrees != 0.0 { 2.0 } else { 0.0 },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNodeLayout {
    pub index: u32,
    pub value: String,
    pub center: Point,
    pub fill: String,
    pub stroke: String,
    pub indicator: RotationIndicator,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeEdgeLayout {
    pub parent: u32,
    pub child: u32,
    /// On the parent's circle.
    pub start: Point,
    /// On the child's circle.
    pub end: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeLayout {
    pub max_level: u32,
    pub radius: f64,
    pub font_family: String,
    pub root: Point,
    pub width: f64,
    pub height: f64,
    /// Ascending index.
    pub nodes: Vec<TreeNodeLayout>,
    pub edges: Vec<TreeEdgeLayout>,
}

impl TreeLayout {
    pub fn node(&self, index: u32) -> Option<&TreeNodeLayout> {
        self.nodes
            .binary_search_by_key(&index, |n| n.index)
            .ok()
            .map(|i| &self.nodes[i])
    }
}

/// Center-to-center segment cut where it leaves the parent circle and where it enters the
/// child circle. `None` when the circles overlap.
fn clip_edge(parent: Point, child: Point, radius: f64) -> Option<(Point, Point)> {
    if (child - parent).length() < 2.0 * radius {
        return None;
    }
    let start = BezPath::line(parent, child).first_circle_intersection(parent, radius)?;
    let end = BezPath::line(child, parent).first_circle_intersection(child, radius)?;
    Some((start, end))
}

pub fn layout_tree(spec: &TreeSpec, params: &TreeParams) -> Result<TreeLayout> {
    let max_level = max_level_of(spec)?;
    let root = root_position(max_level, params);
    let size = canvas_size(max_level, params);

    let nodes: Vec<TreeNodeLayout> = spec
        .nodes
        .iter()
        .map(|(&index, data)| {
            let (dx, dy) = node_offset(index, max_level, params);
            let center = point(root.x + dx, root.y + dy);
            TreeNodeLayout {
                index,
                value: data.value.clone(),
                center,
                fill: if data.is_red { "#f00" } else { "#000" }.to_string(),
                stroke: if data.is_active {
                    params.active_color.clone()
                } else {
                    "#000".to_string()
                },
                indicator: RotationIndicator::build(
                    center,
                    params.radius,
                    data.rotation_angle.filter(|_| data.has_rotation()),
                ),
            }
        })
        .collect();

    let center_of = |index: u32| {
        nodes
            .binary_search_by_key(&index, |n| n.index)
            .ok()
            .map(|i| nodes[i].center)
    };

    let mut edges = Vec::new();
    for (parent, child) in spec.edges() {
        let (Some(from), Some(to)) = (center_of(parent), center_of(child)) else {
            continue;
        };
        let (start, end) = clip_edge(from, to, params.radius).ok_or_else(|| {
            Error::degenerate(format!(
                "nodes {parent} and {child} overlap; no edge between their circles"
            ))
        })?;
        edges.push(TreeEdgeLayout {
            parent,
            child,
            start,
            end,
        });
    }

    tracing::debug!(
        nodes = nodes.len(),
        edges = edges.len(),
        max_level,
        width = size.width,
        height = size.height,
        "laid out tree"
    );

    Ok(TreeLayout {
        max_level,
        radius: params.radius,
        font_family: params.font_family.clone(),
        root,
        width: size.width,
        height: size.height,
        nodes,
        edges,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use structviz_core::NodeData;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn spec(indices: &[u32]) -> TreeSpec {
        TreeSpec::from_nodes(
            indices
                .iter()
                .map(|&i| (i, NodeData::new(i.to_string()))),
        )
        .unwrap()
    }

    #[test]
    fn three_node_tree_positions() {
        let layout = layout_tree(&spec(&[1, 2, 3]), &TreeParams::default()).unwrap();
        assert_eq!(layout.max_level, 1);
        assert_eq!(layout.root, point(100.0, 60.0));
        assert_eq!(layout.node(1).unwrap().center, point(100.0, 60.0));
        assert_eq!(layout.node(2).unwrap().center, point(60.0, 140.0));
        assert_eq!(layout.node(3).unwrap().center, point(140.0, 140.0));
        assert!(close(layout.width, 240.0));
        assert!(close(layout.height, 20.0 * 6.0 + 80.0));
    }

    #[test]
    fn siblings_are_symmetric_about_their_parent() {
        let indices: Vec<u32> = (1..=31).collect();
        let layout = layout_tree(&spec(&indices), &TreeParams::default()).unwrap();
        for k in 1..=15u32 {
            let p = layout.node(k).unwrap().center;
            let l = layout.node(2 * k).unwrap().center;
            let r = layout.node(2 * k + 1).unwrap().center;
            assert!(close((p.x - l.x) - (r.x - p.x), 0.0), "parent {k}");
            assert!(l.x < p.x);
            assert!(close(l.y, r.y));
        }
    }

    #[test]
    fn sparse_nodes_keep_their_slots() {
        let full = layout_tree(&spec(&[1, 2, 3, 4, 5, 6, 7]), &TreeParams::default()).unwrap();
        let sparse = layout_tree(&spec(&[1, 3, 7]), &TreeParams::default()).unwrap();
        for k in [1, 3, 7] {
            assert_eq!(full.node(k).unwrap().center, sparse.node(k).unwrap().center);
        }
    }

    #[test]
    fn height_grows_with_depth() {
        let params = TreeParams::default();
        let heights: Vec<f64> = [1u32, 2, 4, 8, 16]
            .iter()
            .map(|&deepest| tree_size(&spec(&[1, deepest]), &params).unwrap().height)
            .collect();
        assert!(heights.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn edges_exist_only_for_present_children() {
        let layout = layout_tree(&spec(&[1, 2, 5, 11]), &TreeParams::default()).unwrap();
        let pairs: Vec<(u32, u32)> = layout.edges.iter().map(|e| (e.parent, e.child)).collect();
        assert_eq!(pairs, vec![(1, 2), (2, 5), (5, 11)]);
    }

    #[test]
    fn edges_are_cut_at_both_circles() {
        let layout = layout_tree(&spec(&[1, 2]), &TreeParams::default()).unwrap();
        let edge = &layout.edges[0];
        let parent = layout.node(1).unwrap().center;
        let child = layout.node(2).unwrap().center;
        assert!(close((edge.start - parent).length(), 20.0));
        assert!(close((edge.end - child).length(), 20.0));
        let full = (child - parent).length();
        assert!(close((edge.end - edge.start).length(), full - 40.0));
    }

    #[test]
    fn overlapping_nodes_have_no_edge() {
        let params = TreeParams {
            x_scale: 0.1,
            y_scale: 0.1,
            ..TreeParams::default()
        };
        let res = layout_tree(&spec(&[1, 2]), &params);
        assert!(matches!(res, Err(Error::DegenerateGeometry { .. })));
    }

    #[test]
    fn empty_tree_has_no_size_or_layout() {
        let empty = TreeSpec::default();
        let params = TreeParams::default();
        assert!(matches!(tree_size(&empty, &params), Err(Error::EmptyTree)));
        assert!(matches!(layout_tree(&empty, &params), Err(Error::EmptyTree)));
    }

    #[test]
    fn node_colors_follow_red_and_active_flags() {
        let spec = TreeSpec::from_nodes([
            (1, NodeData::new("a").red()),
            (2, NodeData::new("b").active()),
        ])
        .unwrap();
        let params = TreeParams::default();
        let layout = layout_tree(&spec, &params).unwrap();
        assert_eq!(layout.node(1).unwrap().fill, "#f00");
        assert_eq!(layout.node(1).unwrap().stroke, "#000");
        assert_eq!(layout.node(2).unwrap().fill, "#000");
        assert_eq!(layout.node(2).unwrap().stroke, params.active_color);
    }

    #[test]
    fn rotation_indicator_turns_about_the_node() {
        let c = point(100.0, 100.0);
        let still = RotationIndicator::build(c, 20.0, None);
        assert_eq!(still.stroke_width, 0.0);
        assert_eq!(still.arc.start(), point(140.0, 114.0));
        assert_eq!(still.arc.end(), point(140.0, 86.0));
        // no angle: the head points up
        assert!(close(still.head.vertices()[1].y, 86.0));

        let turned = RotationIndicator::build(c, 20.0, Some(90.0));
        assert_eq!(turned.stroke_width, 2.0);
        // (140, 114) turned a quarter clockwise on screen about the center
        let start = turned.arc.start();
        assert!(close(start.x, 86.0));
        assert!(close(start.y, 140.0));
        // positive angles flip the head downwards before rotating
        let tip = turned.head.vertices()[1];
        assert!(close(tip.x, 86.0));
        assert!(close(tip.y, 140.0));
    }
}
