use serde_json::{Map, Value, json};

/// Layout configuration tree.
///
/// Stored as a JSON object so documents and hosts can override any subset of keys and have them
/// deep-merged over the defaults returned by [`StructvizConfig::defaults`].
#[derive(Debug, Clone, PartialEq)]
pub struct StructvizConfig(Value);

impl Default for StructvizConfig {
    fn default() -> Self {
        Self::defaults()
    }
}

impl StructvizConfig {
    pub fn defaults() -> Self {
        Self(json!({
            "tree": {
                "nodeRadius": 20.0,
                "xScale": 0.5,
                "yScale": 1.0,
                "activeColor": "#2bc5f0"
            },
            "connection": {
                "margin": 10.0,
                "arrowOffset": 20.0,
                "arrowWidth": 5.0,
                "smoothing": 0.3,
                "strokeWidth": 3.0
            },
            "text": {
                "fontFamily": "Courier New",
                "fontSize": 10.0
            },
            "geometry": {
                "strict": false
            }
        }))
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    fn lookup(&self, dotted_path: &str) -> Option<&Value> {
        let mut cur = &self.0;
        for segment in dotted_path.split('.') {
            cur = cur.as_object()?.get(segment)?;
        }
        Some(cur)
    }

    pub fn get_str(&self, dotted_path: &str) -> Option<&str> {
        self.lookup(dotted_path)?.as_str()
    }

    pub fn get_bool(&self, dotted_path: &str) -> Option<bool> {
        self.lookup(dotted_path)?.as_bool()
    }

    pub fn get_f64(&self, dotted_path: &str) -> Option<f64> {
        let v = self.lookup(dotted_path)?;
        v.as_f64()
            .or_else(|| v.as_i64().map(|n| n as f64))
            .or_else(|| v.as_u64().map(|n| n as f64))
    }

    /// Sets the leaf at `dotted_path`, replacing any non-object value found on the way.
    pub fn set_value(&mut self, dotted_path: &str, value: Value) {
        let segments: Vec<&str> = dotted_path.split('.').collect();
        set_at(&mut self.0, &segments, value);
    }

    pub fn deep_merge(&mut self, other: &Value) {
        merge_into(&mut self.0, other);
    }
}

fn set_at(slot: &mut Value, segments: &[&str], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *slot = value;
        return;
    };
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(map) = slot {
        set_at(map.entry(*head).or_insert(Value::Null), rest, value);
    }
}

/// Objects merge key by key; any other override replaces the base value.
fn merge_into(base: &mut Value, overrides: &Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                merge_into(base.entry(key.as_str()).or_insert(Value::Null), value);
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}
