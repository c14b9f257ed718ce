//! Static SVG preview of the fields placed on one page.
//!
//! Positions come from the same resolver as the fill, in the preview
//! context, and icons from the same glyph library, so the preview shows what
//! the filled PDF will contain.

use std::io::Write;

use anyhow::Result;

use crate::calibration::{CalibrationConfig, RenderContext};
use crate::coords::{Point, Rect};
use crate::field::{
    Color, Field, FieldKind, FillableStyle, IconStyle, TextStyle, ValueMap, as_flag, as_image_source, as_text,
    in_stacking_order, lookup,
};
use crate::fill::aligned_x;
use crate::icons::{self, Primitive};
use crate::pdf_metrics::StandardFont;
use crate::position::{ResolvedPosition, resolve_position};
use crate::store::PageSize;

const BOX_COLOR: &str = "#3b82f6";
const PLACEHOLDER_COLOR: &str = "#9ca3af";

/// Round for output so float noise doesn't leak into the markup.
fn num(v: f64) -> f64 {
    let r = (v * 1000.0).round() / 1000.0;
    if r == 0.0 { 0.0 } else { r }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

/// Render the overlay for `page` at `scale`. Fields on other pages are ignored.
pub fn generate_svg(
    fields: &[Field],
    values: &ValueMap,
    page: u32,
    page_size: PageSize,
    scale: f64,
    calibration: &CalibrationConfig,
) -> Result<String> {
    let mut output = Vec::new();
    write_svg_page(fields, values, page, page_size, scale, calibration, &mut output)?;
    Ok(String::from_utf8(output)?)
}

fn write_svg_page(
    fields: &[Field],
    values: &ValueMap,
    page: u32,
    page_size: PageSize,
    scale: f64,
    calibration: &CalibrationConfig,
    w: &mut impl Write,
) -> Result<()> {
    let (width, height) = (num(page_size.width * scale), num(page_size.height * scale));
    writeln!(w, r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"#)?;
    writeln!(
        w,
        r#"<svg width="{0}" height="{1}" viewBox="0 0 {0} {1}" version="1.1" xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">"#,
        width, height
    )?;

    for field in in_stacking_order(fields).into_iter().filter(|f| f.page_number == page) {
        let pos = resolve_position(
            calibration,
            field.stored_box(),
            field.font_size(),
            scale,
            RenderContext::Preview,
            page_size.height,
        );
        let value = lookup(values, &field.slug);
        writeln!(w, r#"<g id="field-{}" data-type="{}">"#, escape(&field.id), field.kind.type_name())?;
        match &field.kind {
            FieldKind::Text(style) | FieldKind::Date(style) | FieldKind::Number(style) | FieldKind::Email(style) => {
                write_box(&pos, None, None, 1.0, w)?;
                let text = value.and_then(as_text).unwrap_or_else(|| field.label.clone());
                write_text(style, &pos, &text, None, w)?;
            }
            FieldKind::Icon(style) => {
                write_box(&pos, None, None, 1.0, w)?;
                if value.map_or(style.default_visible, as_flag) {
                    write_icon(style, &pos, w)?;
                }
            }
            FieldKind::Signature | FieldKind::Image => {
                write_box(&pos, None, None, 1.0, w)?;
                match value.and_then(as_image_source) {
                    Some(href) => {
                        writeln!(
                            w,
                            r#"<image x="{}" y="{}" width="{}" height="{}" preserveAspectRatio="xMidYMid meet" xlink:href="{}" />"#,
                            num(pos.x),
                            num(pos.y),
                            num(pos.width),
                            num(pos.height),
                            escape(href)
                        )?;
                    }
                    None => {
                        let label = scaled_label(&pos);
                        write_text(&TextStyle::default(), &label, &field.label, Some(PLACEHOLDER_COLOR), w)?;
                    }
                }
            }
            FieldKind::Fillable(style) => write_fillable(style, &pos, value.and_then(as_text), w)?,
        }
        writeln!(w, "</g>")?;
    }

    writeln!(w, "</svg>")?;
    Ok(())
}

/// Label text for image placeholders uses the default font size, scaled.
fn scaled_label(pos: &ResolvedPosition) -> ResolvedPosition {
    let font_size = crate::field::DEFAULT_FONT_SIZE * pos.scale;
    ResolvedPosition {
        font_size,
        text_y: crate::coords::text_baseline(pos.y, pos.height, font_size),
        ..*pos
    }
}

fn write_box(
    pos: &ResolvedPosition,
    stroke: Option<&str>,
    fill: Option<&str>,
    stroke_width: f64,
    w: &mut impl Write,
) -> Result<()> {
    let dash = if stroke.is_none() { r#" stroke-dasharray="4 2""# } else { "" };
    writeln!(
        w,
        r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}" stroke="{}" stroke-width="{}"{} />"#,
        num(pos.x),
        num(pos.y),
        num(pos.width),
        num(pos.height),
        fill.unwrap_or("none"),
        stroke.unwrap_or(BOX_COLOR),
        num(stroke_width * pos.scale),
        dash
    )?;
    Ok(())
}

fn write_text(
    style: &TextStyle,
    pos: &ResolvedPosition,
    text: &str,
    color: Option<&str>,
    w: &mut impl Write,
) -> Result<()> {
    if text.trim().is_empty() {
        return Ok(());
    }
    let font = StandardFont::resolve(&style.font_family, style.font_weight, style.font_style);
    let x = aligned_x(style.text_align, pos.text_x, pos.width, font.text_width(text, pos.font_size));
    let fill = color.map_or_else(|| Color::from_hex_or_black(&style.text_color).to_hex(), str::to_string);
    writeln!(
        w,
        r#"<text x="{}" y="{}" font-family="{}" font-size="{}" font-weight="{}" font-style="{}" fill="{}" xml:space="preserve">{}</text>"#,
        num(x),
        num(pos.text_y),
        font.css_family(),
        num(pos.font_size),
        if font.bold { "bold" } else { "normal" },
        if font.italic { "italic" } else { "normal" },
        fill,
        escape(text)
    )?;
    Ok(())
}

fn write_icon(style: &IconStyle, pos: &ResolvedPosition, w: &mut impl Write) -> Result<()> {
    // Glyphs are Y up: build them in a box at the origin and mirror into the field.
    let local = Rect::new(pos.x, 0.0, pos.width, pos.height);
    let flip = |p: Point| (num(p.x), num(pos.y + pos.height - p.y));
    let color = Color::from_hex_or_black(&style.icon_color).to_hex();

    for primitive in icons::shape(style.icon_variant, local) {
        match primitive {
            Primitive::Line { from, to, thickness } => {
                let ((x1, y1), (x2, y2)) = (flip(from), flip(to));
                writeln!(
                    w,
                    r#"<line x1="{x1}" y1="{y1}" x2="{x2}" y2="{y2}" stroke="{color}" stroke-width="{}" stroke-linecap="round" />"#,
                    num(thickness)
                )?;
            }
            Primitive::Circle { center, radius, thickness, filled } => {
                let (cx, cy) = flip(center);
                let paint = if filled {
                    format!(r#"fill="{color}" stroke="none""#)
                } else {
                    format!(r#"fill="none" stroke="{color}" stroke-width="{}""#, num(thickness))
                };
                writeln!(w, r#"<circle cx="{cx}" cy="{cy}" r="{}" {paint} />"#, num(radius))?;
            }
            Primitive::Rect { rect, thickness, filled } => {
                let (x, y) = flip(Point::new(rect.x, rect.top()));
                let paint = if filled {
                    format!(r#"fill="{color}" stroke="none""#)
                } else {
                    format!(r#"fill="none" stroke="{color}" stroke-width="{}""#, num(thickness))
                };
                writeln!(
                    w,
                    r#"<rect x="{x}" y="{y}" width="{}" height="{}" {paint} />"#,
                    num(rect.width),
                    num(rect.height)
                )?;
            }
        }
    }
    Ok(())
}

fn write_fillable(
    style: &FillableStyle,
    pos: &ResolvedPosition,
    value: Option<String>,
    w: &mut impl Write,
) -> Result<()> {
    let border = style.border_color.as_deref().and_then(Color::from_hex).map(|c| c.to_hex());
    let background = style.background_color.as_deref().and_then(Color::from_hex).map(|c| c.to_hex());
    write_box(
        pos,
        Some(border.as_deref().unwrap_or(BOX_COLOR)),
        background.as_deref(),
        style.border_width,
        w,
    )?;
    match value {
        Some(text) => write_text(&style.text, pos, &text, None, w),
        None => match &style.placeholder {
            Some(placeholder) => write_text(&style.text, pos, placeholder, Some(PLACEHOLDER_COLOR), w),
            None => Ok(()),
        },
    }
}
