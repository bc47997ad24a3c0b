use crate::geom::{BezPath, Point, Rect};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAnchor {
    Start,
    Middle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RectPrimitive {
    pub bounds: Rect,
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CirclePrimitive {
    pub center: Point,
    pub radius: f64,
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextPrimitive {
    /// Baseline point; `anchor` says whether it is the left end or the middle of the baseline.
    pub position: Point,
    pub content: String,
    pub fill: String,
    pub font_family: String,
    pub font_size: f64,
    pub font_weight: Option<String>,
    pub anchor: TextAnchor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathPrimitive {
    pub path: BezPath,
    pub closed: bool,
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Primitive {
    Rect(RectPrimitive),
    Circle(CirclePrimitive),
    Text(TextPrimitive),
    Path(PathPrimitive),
}

/// Fully resolved drawing: canvas size plus primitives in paint order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub primitives: Vec<Primitive>,
}

impl Scene {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            primitives: Vec::new(),
        }
    }

    pub fn push(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }
}
