use serde::{Deserialize, Serialize};

pub const DEFAULT_FONT_FAMILY: &str = "Arial";
pub const DEFAULT_TEXT_COLOR: &str = "#000000";
pub const DEFAULT_FONT_SIZE: f64 = 12.0;

fn default_font_family() -> String {
    DEFAULT_FONT_FAMILY.to_string()
}
fn default_text_color() -> String {
    DEFAULT_TEXT_COLOR.to_string()
}
fn default_font_size() -> f64 {
    DEFAULT_FONT_SIZE
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default)]
    pub font_weight: FontWeight,
    #[serde(default)]
    pub font_style: FontStyle,
    #[serde(default)]
    pub text_align: TextAlign,
    #[serde(default = "default_text_color")]
    pub text_color: String,
}

impl Default for TextStyle {
    fn default() -> Self {
        TextStyle {
            font_size: DEFAULT_FONT_SIZE,
            font_family: default_font_family(),
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
            text_align: TextAlign::Left,
            text_color: default_text_color(),
        }
    }
}

/// The fixed set of icon glyphs.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IconVariant {
    #[default]
    Check,
    Cross,
    Circle,
    CircleFilled,
    Square,
    SquareFilled,
    Star,
    Heart,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Plus,
    Diamond,
    /// Anything we don't know how to draw. Rendered as a check.
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconStyle {
    #[serde(default)]
    pub icon_variant: IconVariant,
    #[serde(default = "default_text_color")]
    pub icon_color: String,
    /// Whether the icon is drawn when the fill supplies no value.
    #[serde(default)]
    pub default_visible: bool,
}

impl Default for IconStyle {
    fn default() -> Self {
        IconStyle {
            icon_variant: IconVariant::Check,
            icon_color: default_text_color(),
            default_visible: false,
        }
    }
}

/// Styling carried onto a native interactive text field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillableStyle {
    #[serde(flatten)]
    pub text: TextStyle,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub border_color: Option<String>,
    #[serde(default = "default_border_width")]
    pub border_width: f64,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub multiline: bool,
}

fn default_border_width() -> f64 {
    1.0
}

impl Default for FillableStyle {
    fn default() -> Self {
        FillableStyle {
            text: TextStyle::default(),
            placeholder: None,
            border_color: None,
            border_width: default_border_width(),
            background_color: None,
            multiline: false,
        }
    }
}

/// An RGB color with components in `0.0..=1.0`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0 };

    /// Parse `#RRGGBB` or `RRGGBB`.
    pub fn from_hex(s: &str) -> Option<Color> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok().map(|v| f64::from(v) / 255.0);
        Some(Color { r: channel(0)?, g: channel(2)?, b: channel(4)? })
    }

    pub fn from_hex_or_black(s: &str) -> Color {
        Color::from_hex(s).unwrap_or(Color::BLACK)
    }

    /// `#rrggbb`
    pub fn to_hex(&self) -> String {
        let c = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", c(self.r), c(self.g), c(self.b))
    }
}
