mod types;
mod values;

pub use types::*;
pub use values::*;

use std::collections::HashSet;

use anyhow::{Result, bail};
use serde::{Deserialize, Deserializer, Serialize};

use crate::position::StoredBox;

/// A single placeable form element.
///
/// Coordinates are logical: unscaled PDF points with the origin at the page
/// top-left.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    #[serde(deserialize_with = "ser::opaque_id")]
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub label: String,
    pub page_number: u32,
    pub x_coord: f64,
    pub y_coord: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub z_index: i32,
    /// Editor display toggle only.
    #[serde(default = "ser::yes")]
    pub is_visible: bool,
    #[serde(flatten)]
    pub kind: FieldKind,
}

/// What the field renders as, with the style attributes that type supports.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "inputType", rename_all = "UPPERCASE")]
pub enum FieldKind {
    Text(TextStyle),
    Date(TextStyle),
    Number(TextStyle),
    Email(TextStyle),
    Icon(IconStyle),
    Signature,
    Image,
    Fillable(FillableStyle),
}

impl FieldKind {
    /// Text style for the kinds that draw text.
    pub fn text_style(&self) -> Option<&TextStyle> {
        match self {
            FieldKind::Text(s) | FieldKind::Date(s) | FieldKind::Number(s) | FieldKind::Email(s) => Some(s),
            FieldKind::Fillable(f) => Some(&f.text),
            FieldKind::Icon(_) | FieldKind::Signature | FieldKind::Image => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Text(_) => "TEXT",
            FieldKind::Date(_) => "DATE",
            FieldKind::Number(_) => "NUMBER",
            FieldKind::Email(_) => "EMAIL",
            FieldKind::Icon(_) => "ICON",
            FieldKind::Signature => "SIGNATURE",
            FieldKind::Image => "IMAGE",
            FieldKind::Fillable(_) => "FILLABLE",
        }
    }

    /// Default box size for a newly added field of this kind.
    pub fn default_size(&self) -> (f64, f64) {
        match self {
            FieldKind::Text(_) | FieldKind::Email(_) => (200.0, 24.0),
            FieldKind::Date(_) | FieldKind::Number(_) => (120.0, 24.0),
            FieldKind::Icon(_) => (20.0, 20.0),
            FieldKind::Signature => (200.0, 60.0),
            FieldKind::Image => (150.0, 150.0),
            FieldKind::Fillable(_) => (200.0, 24.0),
        }
    }
}

impl Field {
    /// Create a field with the type's default dimensions.
    pub fn new(id: impl Into<String>, slug: impl Into<String>, page_number: u32, x: f64, y: f64, kind: FieldKind) -> Field {
        let (width, height) = kind.default_size();
        let slug = slug.into();
        Field {
            id: id.into(),
            label: slug.clone(),
            slug,
            page_number,
            x_coord: x,
            y_coord: y,
            width,
            height,
            z_index: 0,
            is_visible: true,
            kind,
        }
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Field {
        self.width = width;
        self.height = height;
        self
    }

    pub fn stored_box(&self) -> StoredBox {
        StoredBox {
            x: self.x_coord,
            y: self.y_coord,
            width: self.width,
            height: self.height,
        }
    }

    /// Font size used for baseline math; non-text fields use the default.
    pub fn font_size(&self) -> f64 {
        self.kind.text_style().map_or(DEFAULT_FONT_SIZE, |s| s.font_size)
    }
}

/// Check the invariants a field list must hold before it is stored.
pub fn validate_fields(fields: &[Field]) -> Result<()> {
    let mut slugs = HashSet::new();
    let mut ids = HashSet::new();
    for f in fields {
        if f.page_number < 1 {
            bail!("field {} has page number 0", f.id);
        }
        if !(f.width > 0.0 && f.height > 0.0) {
            bail!("field {} has a non-positive size {}x{}", f.id, f.width, f.height);
        }
        if !(f.x_coord.is_finite() && f.y_coord.is_finite()) {
            bail!("field {} has a non-finite position", f.id);
        }
        if let Some(style) = f.kind.text_style() {
            if !(style.font_size > 0.0) {
                bail!("field {} has a non-positive font size", f.id);
            }
        }
        if !ids.insert(f.id.as_str()) {
            bail!("duplicate field id {}", f.id);
        }
        if !slugs.insert(f.slug.as_str()) {
            bail!("duplicate field slug {}", f.slug);
        }
    }
    Ok(())
}

/// Sort a copy of the list by stacking order, back to front.
pub fn in_stacking_order(fields: &[Field]) -> Vec<&Field> {
    let mut sorted: Vec<&Field> = fields.iter().collect();
    sorted.sort_by_key(|f| f.z_index);
    sorted
}

mod ser {
    use super::*;

    pub fn yes() -> bool {
        true
    }

    /// Ids arrive as strings or numbers depending on the client.
    pub fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Id {
            Text(String),
            Int(i64),
        }
        Ok(match Id::deserialize(deserializer)? {
            Id::Text(s) => s,
            Id::Int(n) => n.to_string(),
        })
    }
}
