//! The fill engine: draws field values onto a copy of a source PDF.

use anyhow::{Context, Result};

use crate::calibration::{CalibrationConfig, RenderContext};
use crate::field::{
    Color, Field, FieldKind, FillableStyle, IconStyle, PositionOverrides, TextAlign, TextStyle, ValueMap, as_flag,
    as_image_source, as_text, lookup,
};
use crate::icons;
use crate::images::{self, BlobFetcher};
use crate::pdf_metrics::StandardFont;
use crate::pdf_writer::{PageInfo, PdfDocument, TextFieldSpec};
use crate::position::{ResolvedPosition, resolve_position};

/// Per-fill counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct FillReport {
    pub fields: usize,
    pub drawn: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct Filled {
    pub bytes: Vec<u8>,
    pub report: FillReport,
}

enum Outcome {
    Drawn,
    Skipped(&'static str),
}

/// Fills documents with a fixed calibration and image fetcher.
///
/// Each call to [`FillEngine::fill`] loads its own document instance, so one
/// engine may serve any number of fills.
pub struct FillEngine<'a> {
    calibration: &'a CalibrationConfig,
    fetcher: &'a dyn BlobFetcher,
}

impl<'a> FillEngine<'a> {
    pub fn new(calibration: &'a CalibrationConfig, fetcher: &'a dyn BlobFetcher) -> FillEngine<'a> {
        FillEngine { calibration, fetcher }
    }

    /// Draw every field in list order and serialize the result.
    ///
    /// Problems with a single field are logged and the field is skipped; only
    /// an unreadable source or a failed save is an error.
    pub fn fill(
        &self,
        source: &[u8],
        fields: &[Field],
        values: &ValueMap,
        overrides: &PositionOverrides,
    ) -> Result<Filled> {
        let mut pdf = PdfDocument::load(source)?;
        let mut report = FillReport { fields: fields.len(), ..Default::default() };

        for field in fields {
            let Some(page) = pdf.page(field.page_number) else {
                log::debug!(
                    "skipping field {} ({}): page {} of {} does not exist",
                    field.id,
                    field.slug,
                    field.page_number,
                    pdf.page_count()
                );
                report.skipped += 1;
                continue;
            };

            match self.render_field(&mut pdf, page, field, values, overrides) {
                Ok(Outcome::Drawn) => {
                    log::debug!("drew {} field {} ({}) on page {}", field.kind.type_name(), field.id, field.slug, page.number);
                    report.drawn += 1;
                }
                Ok(Outcome::Skipped(reason)) => {
                    log::debug!("skipping field {} ({}): {}", field.id, field.slug, reason);
                    report.skipped += 1;
                }
                Err(e) => {
                    log::warn!("skipping field {} ({}): {:#}", field.id, field.slug, e);
                    report.failed += 1;
                }
            }
        }

        let bytes = pdf.save()?;
        log::info!(
            "filled {} fields: {} drawn, {} skipped, {} failed",
            report.fields,
            report.drawn,
            report.skipped,
            report.failed
        );
        Ok(Filled { bytes, report })
    }

    fn resolve(&self, field: &Field, page: PageInfo, overrides: &PositionOverrides) -> ResolvedPosition {
        let mut stored = field.stored_box();
        if let Some(o) = overrides.get(&field.id) {
            stored.x = o.x;
            stored.y = o.y;
        }
        resolve_position(self.calibration, stored, field.font_size(), 1.0, RenderContext::Pdf, page.height())
    }

    fn render_field(
        &self,
        pdf: &mut PdfDocument,
        page: PageInfo,
        field: &Field,
        values: &ValueMap,
        overrides: &PositionOverrides,
    ) -> Result<Outcome> {
        let value = lookup(values, &field.slug);

        match &field.kind {
            FieldKind::Text(style) | FieldKind::Date(style) | FieldKind::Number(style) | FieldKind::Email(style) => {
                let Some(text) = value.and_then(as_text) else {
                    return Ok(Outcome::Skipped("no value"));
                };
                if text.trim().is_empty() {
                    return Ok(Outcome::Skipped("blank value"));
                }
                let pos = self.resolve(field, page, overrides);
                draw_text(pdf, page.number, style, &pos, &text);
            }
            FieldKind::Icon(style) => {
                if !value.map_or(style.default_visible, as_flag) {
                    return Ok(Outcome::Skipped("icon hidden"));
                }
                let pos = self.resolve(field, page, overrides);
                draw_icon(pdf, page.number, style, &pos);
            }
            FieldKind::Signature | FieldKind::Image => {
                let Some(value) = value else {
                    return Ok(Outcome::Skipped("no value"));
                };
                let Some(source) = as_image_source(value) else {
                    return Ok(Outcome::Skipped("no image source"));
                };
                let pos = self.resolve(field, page, overrides);
                self.draw_image(pdf, page.number, source, &pos)?;
            }
            FieldKind::Fillable(style) => {
                let pos = self.resolve(field, page, overrides);
                let text = value.and_then(as_text);
                add_fillable(pdf, page.number, field, style, &pos, text.as_deref())
                    .context("creating form field")?;
            }
        }
        Ok(Outcome::Drawn)
    }

    fn draw_image(&self, pdf: &mut PdfDocument, page: u32, source: &str, pos: &ResolvedPosition) -> Result<()> {
        let (kind, bytes) = images::load_source(source, self.fetcher)?;
        let image = images::decode(kind, &bytes)?;
        let handle = pdf.embed_image(&image)?;
        let target = images::contain(handle.width, handle.height, pos.rect());
        pdf.draw_image(page, &handle, target);
        Ok(())
    }
}

/// Left edge of a line of text aligned inside the resolved box.
pub fn aligned_x(align: TextAlign, anchor_x: f64, box_width: f64, text_width: f64) -> f64 {
    match align {
        TextAlign::Left => anchor_x,
        TextAlign::Center => anchor_x - (text_width - box_width) / 2.0,
        TextAlign::Right => anchor_x - (text_width - box_width),
    }
}

fn draw_text(pdf: &mut PdfDocument, page: u32, style: &TextStyle, pos: &ResolvedPosition, text: &str) {
    let font = StandardFont::resolve(&style.font_family, style.font_weight, style.font_style);
    let width = font.text_width(text, pos.font_size);
    let x = aligned_x(style.text_align, pos.text_x, pos.width, width);
    let color = Color::from_hex_or_black(&style.text_color);
    pdf.draw_text(page, font, pos.font_size, color, x, pos.text_y, text);
}

fn draw_icon(pdf: &mut PdfDocument, page: u32, style: &IconStyle, pos: &ResolvedPosition) {
    let color = Color::from_hex_or_black(&style.icon_color);
    pdf.draw_glyph(page, &icons::glyph(style.icon_variant, pos.rect(), color));
}

fn add_fillable(
    pdf: &mut PdfDocument,
    page: u32,
    field: &Field,
    style: &FillableStyle,
    pos: &ResolvedPosition,
    value: Option<&str>,
) -> Result<()> {
    let text = &style.text;
    let spec = TextFieldSpec {
        name: pdf.unique_field_name(&field.slug),
        rect: pos.rect(),
        font: StandardFont::resolve(&text.font_family, text.font_weight, text.font_style),
        font_size: pos.font_size,
        color: Color::from_hex_or_black(&text.text_color),
        align: text.text_align,
        tooltip: style.placeholder.as_deref().filter(|p| !p.is_empty()),
        value,
        border_color: style.border_color.as_deref().and_then(Color::from_hex),
        border_width: style.border_width.max(0.0),
        background: style.background_color.as_deref().and_then(Color::from_hex),
        multiline: style.multiline,
    };
    pdf.add_text_field(page, &spec)
}
