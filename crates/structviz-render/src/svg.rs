use crate::backend::DrawingBackend;
use crate::geom::BezPath;
use kurbo::PathSeg;
use crate::model::{
    CirclePrimitive, PathPrimitive, RectPrimitive, Scene, TextAnchor, TextPrimitive,
};
use std::fmt::Write as _;

#[derive(Debug, Clone, Default)]
pub struct SvgRenderOptions {
    /// Optional id for the root `<svg>` element.
    pub diagram_id: Option<String>,
    /// Optional fill painted under the whole canvas.
    pub background: Option<String>,
}

/// Writes a standalone SVG document.
#[derive(Debug, Default)]
pub struct SvgBackend {
    options: SvgRenderOptions,
    out: String,
}

impl SvgBackend {
    pub fn new(options: SvgRenderOptions) -> Self {
        Self {
            options,
            out: String::new(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn into_string(self) -> String {
        self.out
    }

    fn paint_attrs(&mut self, fill: Option<&str>, stroke: Option<&str>, stroke_width: f64) {
        let out = &mut self.out;
        out.push_str(r#" fill=""#);
        escape_xml_into(out, fill.unwrap_or("none"));
        out.push('"');
        if let Some(stroke) = stroke {
            out.push_str(r#" stroke=""#);
            escape_xml_into(out, stroke);
            let _ = write!(out, r#"" stroke-width="{}""#, fmt(stroke_width));
        }
    }
}

impl DrawingBackend for SvgBackend {
    fn begin(&mut self, width: f64, height: f64) {
        self.out.clear();
        let (w, h) = (fmt(width), fmt(height));
        self.out.push_str(r#"<svg xmlns="http://www.w3.org/2000/svg""#);
        if let Some(id) = &self.options.diagram_id {
            self.out.push_str(r#" id=""#);
            escape_xml_into(&mut self.out, id);
            self.out.push('"');
        }
        let _ = write!(
            &mut self.out,
            r#" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
        );
        if let Some(bg) = self.options.background.clone() {
            let _ = write!(&mut self.out, r#"<rect x="0" y="0" width="{w}" height="{h}""#);
            self.paint_attrs(Some(bg.as_str()), None, 0.0);
            self.out.push_str("/>");
        }
    }

    fn rect(&mut self, rect: &RectPrimitive) {
        let b = rect.bounds;
        let _ = write!(
            &mut self.out,
            r#"<rect x="{}" y="{}" width="{}" height="{}""#,
            fmt(b.min_x()),
            fmt(b.min_y()),
            fmt(b.width()),
            fmt(b.height())
        );
        self.paint_attrs(
            rect.fill.as_deref(),
            rect.stroke.as_deref(),
            rect.stroke_width,
        );
        self.out.push_str("/>");
    }

    fn circle(&mut self, circle: &CirclePrimitive) {
        let _ = write!(
            &mut self.out,
            r#"<circle cx="{}" cy="{}" r="{}""#,
            fmt(circle.center.x),
            fmt(circle.center.y),
            fmt(circle.radius)
        );
        self.paint_attrs(
            circle.fill.as_deref(),
            circle.stroke.as_deref(),
            circle.stroke_width,
        );
        self.out.push_str("/>");
    }

    fn text(&mut self, text: &TextPrimitive) {
        let _ = write!(
            &mut self.out,
            r#"<text x="{}" y="{}" font-family=""#,
            fmt(text.position.x),
            fmt(text.position.y)
        );
        escape_xml_into(&mut self.out, &text.font_family);
        let _ = write!(&mut self.out, r#"" font-size="{}""#, fmt(text.font_size));
        if let Some(weight) = &text.font_weight {
            self.out.push_str(r#" font-weight=""#);
            escape_xml_into(&mut self.out, weight);
            self.out.push('"');
        }
        if text.anchor == TextAnchor::Middle {
            self.out.push_str(r#" text-anchor="middle""#);
        }
        self.out.push_str(r#" fill=""#);
        escape_xml_into(&mut self.out, &text.fill);
        self.out.push_str(r#"">"#);
        escape_xml_into(&mut self.out, &text.content);
        self.out.push_str("</text>");
    }

    fn path(&mut self, path: &PathPrimitive) {
        self.out.push_str(r#"<path d=""#);
        path_data_into(&mut self.out, &path.path, path.closed);
        self.out.push('"');
        self.paint_attrs(
            path.fill.as_deref(),
            path.stroke.as_deref(),
            path.stroke_width,
        );
        self.out.push_str("/>");
    }

    fn finish(&mut self) {
        self.out.push_str("</svg>\n");
    }
}

pub fn render_scene_svg(scene: &Scene, options: &SvgRenderOptions) -> String {
    let mut backend = SvgBackend::new(options.clone());
    scene.emit(&mut backend);
    backend.into_string()
}

/// `M`, then `L` for straight segments and `C` for curved ones, then `Z` when closed.
pub fn path_data(path: &BezPath, closed: bool) -> String {
    let mut out = String::new();
    path_data_into(&mut out, path, closed);
    out
}

fn path_data_into(out: &mut String, path: &BezPath, closed: bool) {
    let start = path.start();
    let _ = write!(out, "M{},{}", fmt(start.x), fmt(start.y));
    for seg in path.segments() {
        let curve = match seg {
            PathSeg::Line(line) => {
                let _ = write!(out, "L{},{}", fmt(line.p1.x), fmt(line.p1.y));
                continue;
            }
            PathSeg::Quad(quad) => quad.raise(),
            PathSeg::Cubic(cubic) => cubic,
        };
        let _ = write!(
            out,
            "C{},{},{},{},{},{}",
            fmt(curve.p1.x),
            fmt(curve.p1.y),
            fmt(curve.p2.x),
            fmt(curve.p2.y),
            fmt(curve.p3.x),
            fmt(curve.p3.y)
        );
    }
    if closed {
        out.push('Z');
    }
}

fn trim_trailing_zeros_and_dot(out: &mut String, start: usize) {
    while out.len() > start && out.as_bytes()[out.len() - 1] == b'0' {
        out.pop();
    }
    if out.len() > start && out.as_bytes()[out.len() - 1] == b'.' {
        out.pop();
    }
}

pub(crate) fn fmt(v: f64) -> String {
    let mut out = String::new();
    fmt_into(&mut out, v);
    out
}

/// Compact number form for attributes: at most 3 decimals, no trailing zeros, never `-0`.
pub(crate) fn fmt_into(out: &mut String, v: f64) {
    if !v.is_finite() || v.abs() < 0.0005 {
        out.push('0');
        return;
    }
    let start = out.len();
    let _ = write!(out, "{v:.3}");
    trim_trailing_zeros_and_dot(out, start);
    if &out[start..] == "-0" {
        out.truncate(start);
        out.push('0');
    }
}

pub(crate) fn escape_xml_into(out: &mut String, text: &str) {
    let bytes = text.as_bytes();
    let mut start = 0usize;
    for (i, &b) in bytes.iter().enumerate() {
        let esc = match b {
            b'&' => "&amp;",
            b'<' => "&lt;",
            b'>' => "&gt;",
            b'"' => "&quot;",
            b'\'' => "&#39;",
            _ => continue,
        };
        if start < i {
            out.push_str(&text[start..i]);
        }
        out.push_str(esc);
        start = i + 1;
    }
    if start < text.len() {
        out.push_str(&text[start..]);
    }
}
