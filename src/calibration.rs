//! Per-context calibration offsets and the offline drift analysis.

use serde::{Deserialize, Serialize};

use crate::coords::normalize;

/// Which consumer is rendering a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderContext {
    /// Interactive canvas and static preview, scaled by zoom, Y down.
    Preview,
    /// Final document, scale 1, Y up.
    Pdf,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Offset {
    pub dx: f64,
    pub dy: f64,
}

impl Offset {
    pub const ZERO: Offset = Offset { dx: 0.0, dy: 0.0 };

    pub fn new(dx: f64, dy: f64) -> Offset {
        Offset { dx, dy }
    }
}

/// Fixed offsets applied in unscaled page points before any zoom.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct CalibrationConfig {
    pub preview_offset: Offset,
    pub pdf_offset: Offset,
}

impl CalibrationConfig {
    /// No correction in either context.
    pub const IDENTITY: CalibrationConfig = CalibrationConfig {
        preview_offset: Offset::ZERO,
        pdf_offset: Offset::ZERO,
    };

    pub fn offset(&self, context: RenderContext) -> Offset {
        match context {
            RenderContext::Preview => self.preview_offset,
            RenderContext::Pdf => self.pdf_offset,
        }
    }

    pub fn calibrate(&self, context: RenderContext, x: f64, y: f64) -> (f64, f64) {
        let off = self.offset(context);
        (x + off.dx, y + off.dy)
    }
}

/// One logged measurement of where a field was expected versus where it rendered.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftSample {
    pub context: RenderContext,
    pub expected_x: f64,
    pub expected_y: f64,
    pub observed_x: f64,
    pub observed_y: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationSuggestion {
    pub calibration: CalibrationConfig,
    pub preview_samples: usize,
    pub pdf_samples: usize,
}

/// Suggest offsets that cancel the mean drift observed per context.
///
/// A context without samples keeps the offset from `current`.
pub fn suggest_offsets(current: &CalibrationConfig, samples: &[DriftSample]) -> CalibrationSuggestion {
    let mean_for = |context: RenderContext| {
        let (n, sx, sy) = samples
            .iter()
            .filter(|s| s.context == context)
            .fold((0usize, 0.0, 0.0), |(n, sx, sy), s| {
                (n + 1, sx + (s.expected_x - s.observed_x), sy + (s.expected_y - s.observed_y))
            });
        let correction = if n == 0 {
            None
        } else {
            Some((sx / n as f64, sy / n as f64))
        };
        (n, correction)
    };

    let adjust = |base: Offset, correction: Option<(f64, f64)>| match correction {
        Some((cx, cy)) => Offset::new(normalize(base.dx + cx), normalize(base.dy + cy)),
        None => base,
    };

    let (preview_samples, preview_fix) = mean_for(RenderContext::Preview);
    let (pdf_samples, pdf_fix) = mean_for(RenderContext::Pdf);

    CalibrationSuggestion {
        calibration: CalibrationConfig {
            preview_offset: adjust(current.preview_offset, preview_fix),
            pdf_offset: adjust(current.pdf_offset, pdf_fix),
        },
        preview_samples,
        pdf_samples,
    }
}
