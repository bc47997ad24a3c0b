//! Sparse complete-binary-tree input.
//!
//! Nodes are addressed by 1-based index: the root is `1` and the children of `k` are `2k` and
//! `2k + 1`. Gaps in the mapping are absent nodes.

use crate::json::{json_f64, label_text};
use crate::{Error, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NodeData {
    pub value: String,
    pub is_red: bool,
    pub is_active: bool,
    /// Signed degrees; `None` and `Some(0.0)` both mean "no rotation indicator".
    pub rotation_angle: Option<f64>,
}

impl NodeData {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn red(mut self) -> Self {
        self.is_red = true;
        self
    }

    pub fn active(mut self) -> Self {
        self.is_active = true;
        self
    }

    pub fn rotated(mut self, degrees: f64) -> Self {
        self.rotation_angle = Some(degrees);
        self
    }

    pub fn has_rotation(&self) -> bool {
        self.rotation_angle.is_some_and(|a| a != 0.0)
    }
}

/// Layout parameters carried by a tree document. Unset fields fall back to the `tree.*` config.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TreeOverrides {
    pub node_radius: Option<f64>,
    pub x_scale: Option<f64>,
    pub y_scale: Option<f64>,
    pub active_color: Option<String>,
}

impl TreeOverrides {
    /// The overrides as a `tree` config fragment, ready for `StructvizConfig::deep_merge`.
    pub fn to_config_patch(&self) -> Value {
        let mut tree = Map::new();
        if let Some(r) = self.node_radius {
            tree.insert("nodeRadius".into(), Value::from(r));
        }
        if let Some(x) = self.x_scale {
            tree.insert("xScale".into(), Value::from(x));
        }
        if let Some(y) = self.y_scale {
            tree.insert("yScale".into(), Value::from(y));
        }
        if let Some(c) = &self.active_color {
            tree.insert("activeColor".into(), Value::from(c.clone()));
        }
        let mut root = Map::new();
        root.insert("tree".into(), Value::Object(tree));
        Value::Object(root)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeSpec {
    pub nodes: BTreeMap<u32, NodeData>,
    pub overrides: TreeOverrides,
}

/// Depth of `index` below the root: `floor(log2(index))`, with the root at level 0.
pub fn level(index: u32) -> u32 {
    index.checked_ilog2().unwrap_or(0)
}

pub fn left_child(index: u32) -> Option<u32> {
    index.checked_mul(2)
}

pub fn right_child(index: u32) -> Option<u32> {
    index.checked_mul(2)?.checked_add(1)
}

pub fn parent(index: u32) -> Option<u32> {
    (index > 1).then_some(index / 2)
}

impl TreeSpec {
    pub fn from_nodes(nodes: impl IntoIterator<Item = (u32, NodeData)>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for (index, data) in nodes {
            if index == 0 {
                return Err(Error::InvalidIndex {
                    index: index.to_string(),
                });
            }
            map.insert(index, data);
        }
        Ok(Self {
            nodes: map,
            overrides: TreeOverrides::default(),
        })
    }

    /// Parses either `{ "nodes": {...}, "node_radius": .., ... }` or a bare index mapping.
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::invalid_document("tree document must be a JSON object"))?;

        let Some(nodes) = obj.get("nodes") else {
            return Ok(Self {
                nodes: parse_node_map(obj)?,
                overrides: TreeOverrides::default(),
            });
        };

        let nodes = nodes
            .as_object()
            .ok_or_else(|| Error::invalid_document("`nodes` must be an object keyed by index"))?;

        let num = |key: &str| -> Result<Option<f64>> {
            match obj.get(key) {
                None | Some(Value::Null) => Ok(None),
                Some(v) => json_f64(v)
                    .map(Some)
                    .ok_or_else(|| Error::invalid_document(format!("`{key}` must be a number"))),
            }
        };

        let active_color = match obj.get("active_color") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err(Error::invalid_document("`active_color` must be a string")),
        };

        Ok(Self {
            nodes: parse_node_map(nodes)?,
            overrides: TreeOverrides {
                node_radius: num("node_radius")?,
                x_scale: num("x_scale")?,
                y_scale: num("y_scale")?,
                active_color,
            },
        })
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, index: u32) -> bool {
        self.nodes.contains_key(&index)
    }

    pub fn get(&self, index: u32) -> Option<&NodeData> {
        self.nodes.get(&index)
    }

    pub fn max_index(&self) -> Option<u32> {
        self.nodes.keys().next_back().copied()
    }

    pub fn max_level(&self) -> Option<u32> {
        self.max_index().map(level)
    }

    /// Present parent/child pairs, ascending by parent, left child first.
    pub fn edges(&self) -> Vec<(u32, u32)> {
        let mut out = Vec::new();
        for &k in self.nodes.keys() {
            for child in [left_child(k), right_child(k)].into_iter().flatten() {
                if self.contains(child) {
                    out.push((k, child));
                }
            }
        }
        out
    }
}

fn parse_index(key: &str) -> Result<u32> {
    let invalid = || Error::InvalidIndex {
        index: key.to_string(),
    };
    let n: i64 = key.trim().parse().map_err(|_| invalid())?;
    if n <= 0 {
        return Err(invalid());
    }
    u32::try_from(n).map_err(|_| invalid())
}

fn parse_node_map(map: &Map<String, Value>) -> Result<BTreeMap<u32, NodeData>> {
    let mut out = BTreeMap::new();
    for (key, raw) in map {
        let index = parse_index(key)?;
        out.insert(index, parse_node(index, raw)?);
    }
    Ok(out)
}

fn parse_node(index: u32, raw: &Value) -> Result<NodeData> {
    let bad = |what: &str| Error::invalid_document(format!("tree node {index}: {what}"));

    match raw {
        Value::Array(items) => {
            let value = items
                .first()
                .and_then(label_text)
                .ok_or_else(|| bad("first entry must be the node value"))?;
            let is_red = match items.get(1) {
                None | Some(Value::Null) => false,
                Some(Value::String(c)) => {
                    parse_color(c).ok_or_else(|| bad("color must be \"red\" or \"black\""))?
                }
                Some(_) => return Err(bad("color must be a string")),
            };
            let is_active = match items.get(2) {
                None | Some(Value::Null) => false,
                Some(Value::Bool(b)) => *b,
                Some(Value::String(s)) => {
                    parse_active(s).ok_or_else(|| bad("active flag must be \"active\" or \"\""))?
                }
                Some(_) => return Err(bad("active flag must be a string")),
            };
            let rotation_angle = match items.get(3) {
                None | Some(Value::Null) => None,
                Some(v) => {
                    Some(json_f64(v).ok_or_else(|| bad("rotation angle must be a number"))?)
                }
            };
            Ok(NodeData {
                value,
                is_red,
                is_active,
                rotation_angle,
            })
        }
        Value::Object(obj) => {
            let value = obj
                .get("value")
                .and_then(label_text)
                .ok_or_else(|| bad("`value` must be a scalar"))?;
            let is_red = match (obj.get("isRed"), obj.get("color")) {
                (Some(Value::Bool(b)), _) => *b,
                (_, Some(Value::String(c))) => {
                    parse_color(c).ok_or_else(|| bad("color must be \"red\" or \"black\""))?
                }
                _ => false,
            };
            let is_active = match (obj.get("isActive"), obj.get("active")) {
                (Some(Value::Bool(b)), _) | (_, Some(Value::Bool(b))) => *b,
                (_, Some(Value::String(s))) => {
                    parse_active(s).ok_or_else(|| bad("active flag must be \"active\" or \"\""))?
                }
                _ => false,
            };
            let rotation_angle = match obj.get("angle").or_else(|| obj.get("rotationAngle")) {
                None | Some(Value::Null) => None,
                Some(v) => {
                    Some(json_f64(v).ok_or_else(|| bad("rotation angle must be a number"))?)
                }
            };
            Ok(NodeData {
                value,
                is_red,
                is_active,
                rotation_angle,
            })
        }
        _ => Err(bad("expected an array or an object")),
    }
}

fn parse_color(c: &str) -> Option<bool> {
    match c.trim().to_ascii_lowercase().as_str() {
        "red" => Some(true),
        "black" | "" => Some(false),
        _ => None,
    }
}

fn parse_active(s: &str) -> Option<bool> {
    match s.trim() {
        "active" => Some(true),
        "" => Some(false),
        _ => None,
    }
}
