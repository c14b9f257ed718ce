//! Interpretation of fill-time values.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// slug -> value, as posted by the caller.
pub type ValueMap = HashMap<String, Value>;

/// Replacement top-left corner for one field, in logical coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionOverride {
    pub x: f64,
    pub y: f64,
}

/// field id -> override
pub type PositionOverrides = HashMap<String, PositionOverride>;

/// Look up a value; `null` counts as absent.
pub fn lookup<'a>(values: &'a ValueMap, slug: &str) -> Option<&'a Value> {
    values.get(slug).filter(|v| !v.is_null())
}

/// Text to draw for a text-like field.
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Visibility flag for an icon field.
pub fn as_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => {
            let s = s.trim().to_ascii_lowercase();
            !matches!(s.as_str(), "" | "false" | "0" | "no" | "off" | "unchecked")
        }
        Value::Null => false,
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Data URL or absolute URL for an image field.
pub fn as_image_source(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}
