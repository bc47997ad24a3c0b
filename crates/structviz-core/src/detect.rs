use serde_json::Value;

#[derive(Debug, thiserror::Error)]
#[error("no document kind detected: expected a JSON object, got {found}")]
pub struct DetectKindError {
    pub found: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Diagram,
    Tree,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Diagram => "diagram",
            DocumentKind::Tree => "tree",
        }
    }
}

/// Classifies a parsed JSON document.
///
/// An object with an `elements` key is a diagram; any other object is a tree, either wrapped in
/// `nodes` or a bare index mapping. Bad keys in a bare mapping are left to the tree parser so
/// they surface as `InvalidIndex`.
pub fn detect_kind(value: &Value) -> Result<DocumentKind, DetectKindError> {
    let Some(obj) = value.as_object() else {
        return Err(DetectKindError {
            found: json_type_name(value).to_string(),
        });
    };

    if obj.contains_key("elements") {
        Ok(DocumentKind::Diagram)
    } else {
        Ok(DocumentKind::Tree)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
