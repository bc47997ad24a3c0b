//! Turns laid-out diagrams and trees into ordered draw primitives.

use crate::connection::{RoutedConnection, RouterParams, route_connection};
use crate::element::{Element, ElementModel, TextDefaults};
use crate::geom::{BezPath, Rect, point, union_rects};
use crate::model::{
    CirclePrimitive, PathPrimitive, Primitive, RectPrimitive, Scene, TextAnchor, TextPrimitive,
};
use crate::text::TextMeasurer;
use crate::Result;
use crate::tree::TreeLayout;
use serde::Serialize;
use structviz_core::{DiagramSpec, ElementSpec, StructvizConfig};

/// Space left right of and below the content when a diagram has no explicit size.
const FIT_PADDING: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagramLayout {
    pub width: f64,
    pub height: f64,
    pub font_family: String,
    /// One entry per document element, in document order.
    pub elements: Vec<Element>,
    /// Routed connectors, ascending by document position.
    pub connections: Vec<RoutedConnection>,
}

impl DiagramLayout {
    pub fn connection_at(&self, position: usize) -> Option<&RoutedConnection> {
        self.connections
            .binary_search_by_key(&position, |c| c.position)
            .ok()
            .map(|i| &self.connections[i])
    }

    /// Bounds of everything drawn: elements, stroked paths and arrowheads.
    pub fn content_bounds(&self) -> Option<Rect> {
        let elements = self.elements.iter().filter_map(Element::bounds);
        let paths = self.connections.iter().flat_map(|c| {
            let arrow = c
                .route
                .arrow
                .as_ref()
                .map(|a| Rect::from_points(a.corners));
            std::iter::once(c.route.path.bounds()).chain(arrow)
        });
        union_rects(elements.chain(paths))
    }
}

pub fn layout_diagram(
    spec: &DiagramSpec,
    config: &StructvizConfig,
    measurer: &dyn TextMeasurer,
) -> Result<DiagramLayout> {
    let model = ElementModel::build(spec, config, measurer)?;
    let params = RouterParams::from_config(config);

    let connections = spec
        .elements
        .iter()
        .enumerate()
        .filter_map(|(position, entry)| match entry {
            ElementSpec::Connection(conn) => Some((position, conn)),
            _ => None,
        })
        .map(|(position, conn)| route_connection(position, conn, &model, &params))
        .collect::<Result<Vec<_>>>()?;

    let mut layout = DiagramLayout {
        width: 0.0,
        height: 0.0,
        font_family: TextDefaults::from_config(config).font_family,
        elements: model.into_elements(),
        connections,
    };

    match spec.size {
        Some(size) => {
            layout.width = size.width;
            layout.height = size.height;
        }
        None => {
            if let Some(bounds) = layout.content_bounds() {
                layout.width = bounds.max_x().max(0.0) + FIT_PADDING;
                layout.height = bounds.max_y().max(0.0) + FIT_PADDING;
            }
        }
    }

    tracing::debug!(
        elements = layout.elements.len(),
        connections = layout.connections.len(),
        width = layout.width,
        height = layout.height,
        "laid out diagram"
    );
    Ok(layout)
}

/// Baseline for text whose box should be vertically centred on `center_y`.
fn centered_baseline(center_y: f64, font_size: f64) -> f64 {
    // bounds span baseline - 0.9 size .. baseline + 0.3 size
    center_y + 0.3 * font_size
}

fn push_connection(scene: &mut Scene, connection: &RoutedConnection) {
    scene.push(Primitive::Path(PathPrimitive {
        path: connection.route.path.clone(),
        closed: false,
        fill: None,
        stroke: Some(connection.color.clone()),
        stroke_width: connection.stroke_width,
    }));
    if let Some(arrow) = &connection.route.arrow {
        if let Some(marker) = BezPath::polyline(&arrow.corners) {
            scene.push(Primitive::Path(PathPrimitive {
                path: marker,
                closed: true,
                fill: Some(connection.color.clone()),
                stroke: Some(connection.color.clone()),
                stroke_width: 1.0,
            }));
        }
    }
}

pub fn diagram_scene(layout: &DiagramLayout) -> Scene {
    let mut scene = Scene::new(layout.width, layout.height);
    for (position, element) in layout.elements.iter().enumerate() {
        match element {
            Element::CellArray(array) => {
                for cell in &array.cells {
                    scene.push(Primitive::Rect(RectPrimitive {
                        bounds: cell.bounds,
                        fill: cell.background_color.clone(),
                        stroke: Some("#000".to_string()),
                        stroke_width: 1.0,
                    }));
                    let center = cell.center();
                    scene.push(Primitive::Text(TextPrimitive {
                        position: point(center.x, centered_baseline(center.y, cell.font_size())),
                        content: cell.value.clone(),
                        fill: cell.color.clone(),
                        font_family: layout.font_family.clone(),
                        font_size: cell.font_size(),
                        font_weight: None,
                        anchor: TextAnchor::Middle,
                    }));
                }
            }
            Element::Text(text) => scene.push(Primitive::Text(TextPrimitive {
                position: text.origin,
                content: text.value.clone(),
                fill: text.color.clone(),
                font_family: text.font_family.clone(),
                font_size: text.font_size,
                font_weight: None,
                anchor: TextAnchor::Start,
            })),
            Element::Connection(_) => {
                if let Some(connection) = layout.connection_at(position) {
                    push_connection(&mut scene, connection);
                }
            }
        }
    }
    scene
}

pub fn tree_scene(layout: &TreeLayout) -> Scene {
    let mut scene = Scene::new(layout.width, layout.height);
    let r = layout.radius;

    for edge in &layout.edges {
        scene.push(Primitive::Path(PathPrimitive {
            path: BezPath::line(edge.start, edge.end),
            closed: false,
            fill: None,
            stroke: Some("#000".to_string()),
            stroke_width: 2.0,
        }));
    }

    for node in &layout.nodes {
        scene.push(Primitive::Circle(CirclePrimitive {
            center: node.center,
            radius: r,
            fill: Some(node.fill.clone()),
            stroke: Some(node.stroke.clone()),
            stroke_width: 2.0,
        }));
        scene.push(Primitive::Text(TextPrimitive {
            position: point(node.center.x, node.center.y + 0.25 * r),
            content: node.value.clone(),
            fill: "#fff".to_string(),
            font_family: layout.font_family.clone(),
            font_size: 0.8 * r,
            font_weight: Some("bold".to_string()),
            anchor: TextAnchor::Middle,
        }));
        for path in [&node.indicator.arc, &node.indicator.head] {
            scene.push(Primitive::Path(PathPrimitive {
                path: path.clone(),
                closed: false,
                fill: None,
                stroke: Some("#000".to_string()),
                stroke_width: node.indicator.stroke_width,
            }));
        }
    }
    scene
}
