//! Diagram element model: cell arrays and text labels with direction-keyed anchors.

use crate::geom::{Point, Rect, point, rect};
use crate::text::{TextMeasurer, TextStyle};
use crate::{Error, Result};
use indexmap::IndexMap;
use serde::Serialize;
use structviz_core::{
    CellArraySpec, ConnectionSpec, DiagramSpec, Direction, ElementRef, ElementSpec,
    StructvizConfig, TextPlacement, TextSpec,
};

/// Point on `bounds` named by `direction`.
pub fn anchor_point(bounds: &Rect, direction: Direction) -> Point {
    let (x, y) = (bounds.min_x(), bounds.min_y());
    let (w, h) = (bounds.width(), bounds.height());
    match direction {
        Direction::TopCenter => point(x + w / 2.0, y),
        Direction::BottomCenter => point(x + w / 2.0, y + h),
        Direction::LeftCenter => point(x, y + h / 2.0),
        Direction::RightCenter => point(x + w, y + h / 2.0),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextDefaults {
    pub font_family: String,
    pub font_size: f64,
}

impl TextDefaults {
    pub fn from_config(config: &StructvizConfig) -> Self {
        Self {
            font_family: config
                .get_str("text.fontFamily")
                .unwrap_or("Courier New")
                .to_string(),
            font_size: config.get_f64("text.fontSize").unwrap_or(10.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub value: String,
    pub color: String,
    pub background_color: Option<String>,
    pub bounds: Rect,
}

impl Cell {
    /// Labels fill 80% of the cell height.
    pub fn font_size(&self) -> f64 {
        self.bounds.height() * 0.8
    }

    pub fn center(&self) -> Point {
        self.bounds.center()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellArray {
    pub id: Option<String>,
    pub origin: Point,
    pub cell_width: f64,
    pub cell_height: f64,
    pub cells: Vec<Cell>,
}

impl CellArray {
    pub fn from_spec(spec: &CellArraySpec) -> Self {
        let cells = spec
            .cells
            .iter()
            .enumerate()
            .map(|(i, cell)| Cell {
                value: cell.value.clone(),
                color: cell.color.clone().unwrap_or_else(|| "#000".to_string()),
                background_color: cell.background_color.clone(),
                bounds: rect(
                    spec.x + i as f64 * spec.width,
                    spec.y,
                    spec.width,
                    spec.height,
                ),
            })
            .collect();
        Self {
            id: spec.id.clone(),
            origin: point(spec.x, spec.y),
            cell_width: spec.width,
            cell_height: spec.height,
            cells,
        }
    }

    pub fn bounds(&self) -> Rect {
        rect(
            self.origin.x,
            self.origin.y,
            self.cell_width * self.cells.len() as f64,
            self.cell_height,
        )
    }

    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextElement {
    pub id: Option<String>,
    pub value: String,
    pub color: String,
    pub font_family: String,
    pub font_size: f64,
    /// Left end of the baseline.
    pub origin: Point,
    pub bounds: Rect,
}

impl TextElement {
    fn place(
        spec: &TextSpec,
        origin: Point,
        font_size: f64,
        defaults: &TextDefaults,
        measurer: &dyn TextMeasurer,
    ) -> Self {
        let style = TextStyle::sized(&defaults.font_family, font_size);
        let metrics = measurer.measure(&spec.value, &style);
        Self {
            id: spec.id.clone(),
            value: spec.value.clone(),
            color: spec.color.clone(),
            font_family: defaults.font_family.clone(),
            font_size,
            origin,
            bounds: rect(
                origin.x,
                origin.y - 0.75 * metrics.height,
                metrics.width,
                metrics.height,
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Element {
    CellArray(CellArray),
    Text(TextElement),
    /// Connectors occupy a slot so positions line up with the document; they are routed later.
    Connection(ConnectionSpec),
}

impl Element {
    pub fn id(&self) -> Option<&str> {
        match self {
            Element::CellArray(a) => a.id.as_deref(),
            Element::Text(t) => t.id.as_deref(),
            Element::Connection(c) => c.id.as_deref(),
        }
    }

    pub fn bounds(&self) -> Option<Rect> {
        match self {
            Element::CellArray(a) => Some(a.bounds()),
            Element::Text(t) => Some(t.bounds),
            Element::Connection(_) => None,
        }
    }

    /// Anchor on this element, or on one of its cells when `sub_index` is given.
    /// The error is the reason the anchor does not exist.
    pub fn anchor(
        &self,
        direction: Direction,
        sub_index: Option<usize>,
    ) -> std::result::Result<Point, String> {
        match (self, sub_index) {
            (Element::CellArray(array), Some(i)) => array
                .cell(i)
                .map(|cell| anchor_point(&cell.bounds, direction))
                .ok_or_else(|| {
                    format!(
                        "cell index {i} is out of range ({} cells)",
                        array.cells.len()
                    )
                }),
            (Element::Connection(_), _) => Err("connections have no anchor points".to_string()),
            (_, Some(_)) => Err("only Container elements have indexed cells".to_string()),
            (element, None) => element
                .bounds()
                .map(|b| anchor_point(&b, direction))
                .ok_or_else(|| "element has no bounds".to_string()),
        }
    }
}

/// Elements of one diagram, in document order, with their `id` lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementModel {
    elements: Vec<Element>,
    ids: IndexMap<String, usize>,
    /// Number of entries in the document, including ones not built yet.
    declared: usize,
}

impl ElementModel {
    /// Builds and positions every non-connector element in document order.
    pub fn build(
        spec: &DiagramSpec,
        config: &StructvizConfig,
        measurer: &dyn TextMeasurer,
    ) -> Result<Self> {
        let defaults = TextDefaults::from_config(config);

        let mut ids = IndexMap::new();
        for (position, entry) in spec.elements.iter().enumerate() {
            if let Some(id) = entry.id() {
                if ids.insert(id.to_string(), position).is_some() {
                    return Err(structviz_core::Error::InvalidDocument {
                        message: format!("element id {id:?} is used more than once"),
                    }
                    .into());
                }
            }
        }

        let mut model = Self {
            elements: Vec::with_capacity(spec.elements.len()),
            ids,
            declared: spec.elements.len(),
        };

        for entry in &spec.elements {
            let element = match entry {
                ElementSpec::Container(array) => Element::CellArray(CellArray::from_spec(array)),
                ElementSpec::Text(text) => {
                    Element::Text(model.place_text(text, &defaults, measurer)?)
                }
                ElementSpec::Connection(conn) => Element::Connection(conn.clone()),
            };
            model.elements.push(element);
        }

        Ok(model)
    }

    fn place_text(
        &self,
        spec: &TextSpec,
        defaults: &TextDefaults,
        measurer: &dyn TextMeasurer,
    ) -> Result<TextElement> {
        match &spec.placement {
            TextPlacement::At(origin) => {
                let size = spec.size.unwrap_or(defaults.font_size);
                Ok(TextElement::place(spec, *origin, size, defaults, measurer))
            }
            TextPlacement::After(target) => {
                let position = self.resolve(target)?;
                // Only elements already placed have geometry.
                let Some(element) = self.elements.get(position) else {
                    return Err(Error::unresolved(
                        target,
                        "`after` must reference an earlier element",
                    ));
                };
                let Element::Text(prev) = element else {
                    return Err(Error::unresolved(
                        target,
                        "`after` must reference a Text element",
                    ));
                };
                let origin = point(prev.bounds.max_x(), prev.origin.y);
                let size = spec.size.unwrap_or(prev.font_size);
                Ok(TextElement::place(spec, origin, size, defaults, measurer))
            }
        }
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn into_elements(self) -> Vec<Element> {
        self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Position of the referenced element.
    ///
    /// Ids are looked up first; a purely numeric id that names no element falls back to being a
    /// position.
    pub fn resolve(&self, reference: &ElementRef) -> Result<usize> {
        let in_range = |p: usize| p < self.declared;
        match reference {
            ElementRef::Position(p) if in_range(*p) => Ok(*p),
            ElementRef::Position(_) => {
                Err(Error::unresolved(reference, "no element at this position"))
            }
            ElementRef::Id(id) => {
                if let Some(&p) = self.ids.get(id) {
                    return Ok(p);
                }
                match id.parse::<usize>() {
                    Ok(p) if in_range(p) => Ok(p),
                    _ => Err(Error::unresolved(reference, "no element with this id")),
                }
            }
        }
    }

    pub fn get(&self, reference: &ElementRef) -> Result<&Element> {
        let position = self.resolve(reference)?;
        self.elements
            .get(position)
            .ok_or_else(|| Error::unresolved(reference, "element is not built yet"))
    }

    pub fn anchor(
        &self,
        reference: &ElementRef,
        direction: Direction,
        sub_index: Option<usize>,
    ) -> Result<Point> {
        self.get(reference)?
            .anchor(direction, sub_index)
            .map_err(|reason| Error::unresolved(reference, reason))
    }
}
