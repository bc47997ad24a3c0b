use crate::direction::Direction;
use crate::geom::{Point, Size, point};
use crate::json::{de_flag, de_label, de_opt_index, from_value_ref, json_f64};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Reference from one diagram entry to another: either its position in `elements` or its `id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementRef {
    Position(usize),
    Id(String),
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementRef::Position(p) => write!(f, "#{p}"),
            ElementRef::Id(id) => write!(f, "{id:?}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Container,
    Text,
    Connection,
}

impl ElementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Container => "Container",
            ElementKind::Text => "Text",
            ElementKind::Connection => "Connection",
        }
    }

    fn from_type_name(name: &str) -> Result<Self> {
        match name {
            "Container" => Ok(ElementKind::Container),
            "Text" => Ok(ElementKind::Text),
            "Connection" => Ok(ElementKind::Connection),
            other => Err(Error::UnknownElementType {
                element_type: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CellSpec {
    #[serde(default, deserialize_with = "de_label")]
    pub value: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
}

/// A row of equally sized cells (`"type": "Container"` in documents).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CellArraySpec {
    #[serde(default)]
    pub id: Option<String>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub cells: Vec<CellSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TextPlacement {
    At(Point),
    After(ElementRef),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextSpec {
    pub id: Option<String>,
    pub placement: TextPlacement,
    pub value: String,
    pub color: String,
    pub size: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Endpoint {
    pub element: ElementRef,
    pub direction: Direction,
    pub index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionSpec {
    pub id: Option<String>,
    pub from: Endpoint,
    pub to: Endpoint,
    pub arrow: bool,
    pub color: String,
    /// `None` falls back to `connection.margin` from the config.
    pub margin: Option<f64>,
    pub waypoints: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementSpec {
    Container(CellArraySpec),
    Text(TextSpec),
    Connection(ConnectionSpec),
}

impl ElementSpec {
    pub fn kind(&self) -> ElementKind {
        match self {
            ElementSpec::Container(_) => ElementKind::Container,
            ElementSpec::Text(_) => ElementKind::Text,
            ElementSpec::Connection(_) => ElementKind::Connection,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            ElementSpec::Container(c) => c.id.as_deref(),
            ElementSpec::Text(t) => t.id.as_deref(),
            ElementSpec::Connection(c) => c.id.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiagramSpec {
    /// Canvas size from `size_x`/`size_y`; `None` lets the renderer fit the content.
    pub size: Option<Size>,
    pub elements: Vec<ElementSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum PointSpec {
    Pair([f64; 2]),
    Object { x: f64, y: f64 },
}

impl From<PointSpec> for Point {
    fn from(p: PointSpec) -> Self {
        match p {
            PointSpec::Pair([x, y]) => point(x, y),
            PointSpec::Object { x, y } => point(x, y),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TextRaw {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    x: Option<f64>,
    #[serde(default)]
    y: Option<f64>,
    #[serde(default, deserialize_with = "de_label")]
    value: String,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    size: Option<f64>,
    #[serde(default)]
    after: Option<ElementRef>,
}

#[derive(Debug, Deserialize)]
struct ConnectionRaw {
    #[serde(default)]
    id: Option<String>,
    from: ElementRef,
    #[serde(default)]
    from_direction: Option<String>,
    #[serde(default, deserialize_with = "de_opt_index")]
    from_index: Option<usize>,
    to: ElementRef,
    #[serde(default)]
    to_direction: Option<String>,
    #[serde(default, deserialize_with = "de_opt_index")]
    to_index: Option<usize>,
    #[serde(default, deserialize_with = "de_flag")]
    arrow: bool,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    margin: Option<f64>,
    #[serde(default)]
    segments: Vec<PointSpec>,
}

fn parse_direction(raw: Option<&str>, default: Direction) -> Result<Direction> {
    match raw {
        None => Ok(default),
        Some(s) => s.parse(),
    }
}

fn entry_error(position: usize, kind: ElementKind, err: serde_json::Error) -> Error {
    Error::invalid_document(format!("element #{position} ({}): {err}", kind.as_str()))
}

impl DiagramSpec {
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::invalid_document("diagram document must be a JSON object"))?;

        let size = match (obj.get("size_x"), obj.get("size_y")) {
            (None, None) => None,
            (Some(w), Some(h)) => match (json_f64(w), json_f64(h)) {
                (Some(w), Some(h)) => Some(Size::new(w, h)),
                _ => return Err(Error::invalid_document("size_x/size_y must be numbers")),
            },
            _ => {
                return Err(Error::invalid_document(
                    "size_x and size_y must be given together",
                ));
            }
        };

        let entries = obj
            .get("elements")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::invalid_document("missing `elements` array"))?;

        let mut elements = Vec::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            elements.push(parse_element(position, entry)?);
        }

        Ok(Self { size, elements })
    }
}

fn parse_element(position: usize, entry: &Value) -> Result<ElementSpec> {
    let type_name = entry.get("type").and_then(Value::as_str).ok_or_else(|| {
        Error::invalid_document(format!("element #{position} has no string `type`"))
    })?;
    let kind = ElementKind::from_type_name(type_name)?;

    match kind {
        ElementKind::Container => {
            let spec: CellArraySpec =
                from_value_ref(entry).map_err(|e| entry_error(position, kind, e))?;
            Ok(ElementSpec::Container(spec))
        }
        ElementKind::Text => {
            let raw: TextRaw = from_value_ref(entry).map_err(|e| entry_error(position, kind, e))?;
            let placement = match (raw.after, raw.x, raw.y) {
                (Some(target), _, _) => TextPlacement::After(target),
                (None, Some(x), Some(y)) => TextPlacement::At(point(x, y)),
                (None, _, _) => {
                    return Err(Error::invalid_document(format!(
                        "element #{position} (Text): needs `x` and `y`, or `after`"
                    )));
                }
            };
            Ok(ElementSpec::Text(TextSpec {
                id: raw.id,
                placement,
                value: raw.value,
                color: raw.color.unwrap_or_else(|| "#000".to_string()),
                size: raw.size,
            }))
        }
        ElementKind::Connection => {
            let raw: ConnectionRaw =
                from_value_ref(entry).map_err(|e| entry_error(position, kind, e))?;
            Ok(ElementSpec::Connection(ConnectionSpec {
                id: raw.id,
                from: Endpoint {
                    element: raw.from,
                    direction: parse_direction(
                        raw.from_direction.as_deref(),
                        Direction::BottomCenter,
                    )?,
                    index: raw.from_index,
                },
                to: Endpoint {
                    element: raw.to,
                    direction: parse_direction(raw.to_direction.as_deref(), Direction::TopCenter)?,
                    index: raw.to_index,
                },
                arrow: raw.arrow,
                color: raw.color.unwrap_or_else(|| "#000".to_string()),
                margin: raw.margin,
                waypoints: raw.segments.into_iter().map(Point::from).collect(),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_all_three_kinds_in_order() {
        let doc = json!({
            "size_x": 400, "size_y": 200,
            "elements": [
                { "type": "Container", "x": 10, "y": 10, "width": 30, "height": 30,
                  "cells": [{ "value": 1 }, { "value": "b", "background_color": "#ff0" }] },
                { "type": "Text", "x": 10, "y": 80, "value": "head", "size": 14 },
                { "type": "Connection", "from": 0, "from_index": 0, "to": 0, "to_index": 1,
                  "from_direction": "topCenter", "to_direction": "topCenter",
                  "arrow": true, "segments": [[35, -10], { "x": 40, "y": -5 }] }
            ]
        });
        let spec = DiagramSpec::from_value(&doc).unwrap();
        assert_eq!(spec.size, Some(Size::new(400.0, 200.0)));
        assert_eq!(spec.elements.len(), 3);

        let ElementSpec::Container(cells) = &spec.elements[0] else {
            panic!("expected container");
        };
        assert_eq!(cells.cells[0].value, "1");
        assert_eq!(cells.cells[1].background_color.as_deref(), Some("#ff0"));

        let ElementSpec::Text(text) = &spec.elements[1] else {
            panic!("expected text");
        };
        assert_eq!(text.color, "#000");
        assert_eq!(text.placement, TextPlacement::At(point(10.0, 80.0)));

        let ElementSpec::Connection(conn) = &spec.elements[2] else {
            panic!("expected connection");
        };
        assert_eq!(conn.from.index, Some(0));
        assert_eq!(conn.to.direction, Direction::TopCenter);
        assert_eq!(conn.margin, None);
        assert_eq!(conn.waypoints, vec![point(35.0, -10.0), point(40.0, -5.0)]);
    }

    #[test]
    fn connection_defaults_follow_parent_to_child_convention() {
        let doc = json!({ "elements": [
            { "type": "Connection", "from": "a", "to": "b" }
        ]});
        let spec = DiagramSpec::from_value(&doc).unwrap();
        let ElementSpec::Connection(conn) = &spec.elements[0] else {
            panic!("expected connection");
        };
        assert_eq!(conn.from.direction, Direction::BottomCenter);
        assert_eq!(conn.to.direction, Direction::TopCenter);
        assert_eq!(conn.from.element, ElementRef::Id("a".into()));
        assert!(!conn.arrow);
        assert_eq!(conn.color, "#000");
        assert!(spec.size.is_none());
    }

    #[test]
    fn null_flags_and_integral_float_indices_are_accepted() {
        let doc = json!({ "elements": [
            { "type": "Connection", "from": 0, "from_index": 1.0, "to": 1, "to_index": null,
              "arrow": null }
        ]});
        let spec = DiagramSpec::from_value(&doc).unwrap();
        let ElementSpec::Connection(conn) = &spec.elements[0] else {
            panic!("expected connection");
        };
        assert_eq!(conn.from.index, Some(1));
        assert_eq!(conn.to.index, None);
        assert!(!conn.arrow);

        let doc = json!({ "elements": [
            { "type": "Connection", "from": 0, "from_index": 1.5, "to": 1 }
        ]});
        let err = DiagramSpec::from_value(&doc).unwrap_err();
        assert!(matches!(err, Error::InvalidDocument { .. }));
    }

    #[test]
    fn unknown_type_aborts_the_whole_document() {
        let doc = json!({ "elements": [
            { "type": "Text", "x": 0, "y": 0, "value": "ok" },
            { "type": "Ellipse" }
        ]});
        let err = DiagramSpec::from_value(&doc).unwrap_err();
        assert!(matches!(err, Error::UnknownElementType { ref element_type } if element_type == "Ellipse"));
    }

    #[test]
    fn bad_direction_is_reported_as_invalid_direction() {
        let doc = json!({ "elements": [
            { "type": "Connection", "from": 0, "to": 1, "to_direction": "middle" }
        ]});
        let err = DiagramSpec::from_value(&doc).unwrap_err();
        assert!(matches!(err, Error::InvalidDirection { .. }));
    }

    #[test]
    fn text_needs_a_position_or_an_anchor_text() {
        let doc = json!({ "elements": [{ "type": "Text", "value": "floating" }] });
        let err = DiagramSpec::from_value(&doc).unwrap_err();
        assert!(matches!(err, Error::InvalidDocument { .. }));

        let doc = json!({ "elements": [
            { "type": "Text", "x": 0, "y": 10, "value": "a" },
            { "type": "Text", "value": "b", "after": 0 }
        ]});
        let spec = DiagramSpec::from_value(&doc).unwrap();
        let ElementSpec::Text(text) = &spec.elements[1] else {
            panic!("expected text");
        };
        assert_eq!(text.placement, TextPlacement::After(ElementRef::Position(0)));
    }
}
