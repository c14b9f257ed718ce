//! Field position resolution shared by the editor canvas, the static preview
//! and the fill engine.

use serde::Serialize;

use crate::calibration::{CalibrationConfig, RenderContext};
use crate::coords::{Rect, canvas_to_pdf_y, normalize, text_baseline, transform};

/// A field box ready to render in one context.
///
/// In the preview context `y` is the top edge (Y down); in the PDF context it
/// is the bottom edge (Y up).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPosition {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub font_size: f64,
    pub text_x: f64,
    pub text_y: f64,
    pub scale: f64,
}

impl ResolvedPosition {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// Stored (logical) placement of a field, in unscaled points, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoredBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Resolve the render position of a stored box.
///
/// `page_height` must be positive in the PDF context; it is ignored for the
/// preview. The PDF context is meant to be called with `scale == 1.0`.
pub fn resolve_position(
    calibration: &CalibrationConfig,
    stored: StoredBox,
    font_size: f64,
    scale: f64,
    context: RenderContext,
    page_height: f64,
) -> ResolvedPosition {
    let x = normalize(stored.x);
    let y = normalize(stored.y);
    let w = normalize(stored.width);
    let h = normalize(stored.height);

    let (cal_x, cal_y) = calibration.calibrate(context, x, y);

    let scaled_x = transform(cal_x, scale, 0.0);
    let scaled_w = transform(w, scale, 0.0);
    let scaled_h = transform(h, scale, 0.0);
    let scaled_font = transform(font_size, scale, 0.0);

    match context {
        RenderContext::Pdf => {
            let pdf_y = canvas_to_pdf_y(cal_y, h, page_height);
            // Distance from the box top to the baseline, in true points.
            let baseline_from_top = text_baseline(0.0, h, font_size);
            let text_y = normalize(pdf_y + h - baseline_from_top);
            ResolvedPosition {
                x: scaled_x,
                y: transform(pdf_y, scale, 0.0),
                width: scaled_w,
                height: scaled_h,
                font_size: scaled_font,
                text_x: scaled_x,
                text_y: transform(text_y, scale, 0.0),
                scale,
            }
        }
        RenderContext::Preview => {
            let scaled_y = transform(cal_y, scale, 0.0);
            ResolvedPosition {
                x: scaled_x,
                y: scaled_y,
                width: scaled_w,
                height: scaled_h,
                font_size: scaled_font,
                text_x: scaled_x,
                text_y: text_baseline(scaled_y, scaled_h, scaled_font),
                scale,
            }
        }
    }
}
