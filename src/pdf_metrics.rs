//! Standard Type1 font handles and their advance widths.
//!
//! Widths are the Adobe AFM values for the printable ASCII range, in 1/1000
//! of the font size. Text is encoded as WinAnsi, `?` for anything it can't
//! represent. Accented letters measure as their base letter and other
//! non-ASCII glyphs as an ASCII glyph of about the same width.

use crate::field::{FontStyle, FontWeight};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FontFamily {
    Helvetica,
    Times,
    Courier,
}

impl FontFamily {
    /// Map an editor font family name onto one of the standard families.
    ///
    /// Unknown names return `None`; callers fall back to [`FontFamily::Helvetica`].
    pub fn from_name(name: &str) -> Option<FontFamily> {
        let name = name.trim().trim_matches(|c| c == '"' || c == '\'').to_ascii_lowercase();
        match name.as_str() {
            "arial" | "helvetica" | "verdana" | "tahoma" | "sans-serif" | "inter" | "roboto" => Some(FontFamily::Helvetica),
            "times" | "times new roman" | "times-roman" | "georgia" | "serif" => Some(FontFamily::Times),
            "courier" | "courier new" | "monospace" => Some(FontFamily::Courier),
            _ => None,
        }
    }
}

/// One of the 12 standard font handles.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct StandardFont {
    pub family: FontFamily,
    pub bold: bool,
    pub italic: bool,
}

impl StandardFont {
    pub const ALL: [StandardFont; 12] = {
        const fn f(family: FontFamily, bold: bool, italic: bool) -> StandardFont {
            StandardFont { family, bold, italic }
        }
        [
            f(FontFamily::Helvetica, false, false),
            f(FontFamily::Helvetica, true, false),
            f(FontFamily::Helvetica, false, true),
            f(FontFamily::Helvetica, true, true),
            f(FontFamily::Times, false, false),
            f(FontFamily::Times, true, false),
            f(FontFamily::Times, false, true),
            f(FontFamily::Times, true, true),
            f(FontFamily::Courier, false, false),
            f(FontFamily::Courier, true, false),
            f(FontFamily::Courier, false, true),
            f(FontFamily::Courier, true, true),
        ]
    };

    /// Pick the handle for an editor family/weight/style triple.
    pub fn resolve(family: &str, weight: FontWeight, style: FontStyle) -> StandardFont {
        let family = FontFamily::from_name(family).unwrap_or_else(|| {
            log::debug!("unknown font family {family:?}, using Helvetica");
            FontFamily::Helvetica
        });
        StandardFont {
            family,
            bold: weight == FontWeight::Bold,
            italic: style == FontStyle::Italic,
        }
    }

    pub fn base_font(&self) -> &'static str {
        match (self.family, self.bold, self.italic) {
            (FontFamily::Helvetica, false, false) => "Helvetica",
            (FontFamily::Helvetica, true, false) => "Helvetica-Bold",
            (FontFamily::Helvetica, false, true) => "Helvetica-Oblique",
            (FontFamily::Helvetica, true, true) => "Helvetica-BoldOblique",
            (FontFamily::Times, false, false) => "Times-Roman",
            (FontFamily::Times, true, false) => "Times-Bold",
            (FontFamily::Times, false, true) => "Times-Italic",
            (FontFamily::Times, true, true) => "Times-BoldItalic",
            (FontFamily::Courier, false, false) => "Courier",
            (FontFamily::Courier, true, false) => "Courier-Bold",
            (FontFamily::Courier, false, true) => "Courier-Oblique",
            (FontFamily::Courier, true, true) => "Courier-BoldOblique",
        }
    }

    /// Short resource name, stable per handle.
    pub fn resource_name(&self) -> String {
        let idx = StandardFont::ALL.iter().position(|f| f == self).unwrap_or(0);
        format!("PFF{idx}")
    }

    /// CSS family used by the SVG preview.
    pub fn css_family(&self) -> &'static str {
        match self.family {
            FontFamily::Helvetica => "Helvetica, Arial, sans-serif",
            FontFamily::Times => "'Times New Roman', Times, serif",
            FontFamily::Courier => "'Courier New', Courier, monospace",
        }
    }

    fn widths(&self) -> Option<&'static [u16; 95]> {
        match (self.family, self.bold, self.italic) {
            (FontFamily::Courier, _, _) => None,
            (FontFamily::Helvetica, false, _) => Some(&HELVETICA),
            (FontFamily::Helvetica, true, _) => Some(&HELVETICA_BOLD),
            (FontFamily::Times, false, false) => Some(&TIMES_ROMAN),
            (FontFamily::Times, true, false) => Some(&TIMES_BOLD),
            (FontFamily::Times, false, true) => Some(&TIMES_ITALIC),
            (FontFamily::Times, true, true) => Some(&TIMES_BOLD_ITALIC),
        }
    }

    /// Advance width of one WinAnsi byte, in 1/1000 em.
    fn byte_width(&self, b: u8) -> f64 {
        let Some(table) = self.widths() else {
            return 600.0;
        };
        match b {
            // ellipsis, perthousand, emdash, trademark
            0x85 | 0x89 | 0x97 | 0x99 => 1000.0,
            _ => f64::from(table[usize::from(ascii_proxy(b) - 32)]),
        }
    }

    /// Width of `text` at `size` points.
    pub fn text_width(&self, text: &str, size: f64) -> f64 {
        let units: f64 = encode_win_ansi(text).into_iter().map(|b| self.byte_width(b)).sum();
        units * size / 1000.0
    }
}

/// Encode text for a WinAnsi simple font.
///
/// Latin-1 maps directly, the 0x80..0x9F block holds the typographic
/// extras, anything else becomes `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .filter(|c| !c.is_control())
        .map(|c| match u32::from(c) {
            0x20..=0x7e | 0xa0..=0xff => c as u8,
            _ => win_ansi_extra(c).unwrap_or(b'?'),
        })
        .collect()
}

fn win_ansi_extra(c: char) -> Option<u8> {
    Some(match c {
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8a,
        '‹' => 0x8b,
        'Œ' => 0x8c,
        'Ž' => 0x8e,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9a,
        '›' => 0x9b,
        'œ' => 0x9c,
        'ž' => 0x9e,
        'Ÿ' => 0x9f,
        _ => return None,
    })
}

/// Printable ASCII byte whose width stands in for a WinAnsi byte.
fn ascii_proxy(b: u8) -> u8 {
    match b {
        0x20..=0x7e => b,
        0x80 | 0x83 | 0x86 | 0x87 | 0x96 => b'0',
        0x82 | 0x91 | 0x92 => b'\'',
        0x84 | 0x93 | 0x94 => b'"',
        0x88 | 0x98 => b'`',
        0x8b | 0x95 | 0x9b => b'(',
        0x8a => b'S',
        0x8c | 0xc6 => b'M',
        0x8e => b'Z',
        0x9a => b's',
        0x9c | 0xe6 => b'm',
        0x9e => b'z',
        0x9f | 0xdd => b'Y',
        0xa0 => b' ',
        0xad => b'-',
        0xc0..=0xc5 => b'A',
        0xc7 => b'C',
        0xc8..=0xcb => b'E',
        0xcc..=0xcf => b'I',
        0xd0 => b'D',
        0xd1 => b'N',
        0xd2..=0xd6 | 0xd8 => b'O',
        0xd7 | 0xf7 => b'+',
        0xd9..=0xdc => b'U',
        0xde => b'P',
        0xdf => b'h',
        0xe0..=0xe5 => b'a',
        0xe7 => b'c',
        0xe8..=0xeb => b'e',
        0xec..=0xef => b'i',
        0xf0 | 0xf2..=0xf6 | 0xf8 => b'o',
        0xf1 => b'n',
        0xf9..=0xfc => b'u',
        0xfd | 0xff => b'y',
        0xfe => b'p',
        0xa1..=0xbf => b'0',
        _ => b'?',
    }
}

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[rustfmt::skip]
const TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

#[rustfmt::skip]
const TIMES_BOLD: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];

#[rustfmt::skip]
const TIMES_ITALIC: [u16; 95] = [
    250, 333, 420, 500, 500, 833, 778, 214, 333, 333, 500, 675, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 675, 675, 675, 500,
    920, 611, 611, 667, 722, 611, 611, 722, 722, 333, 444, 667, 556, 833, 667, 722,
    611, 722, 611, 500, 556, 722, 611, 833, 611, 556, 556, 389, 278, 389, 422, 500,
    333, 500, 500, 444, 500, 444, 278, 500, 500, 278, 278, 444, 278, 722, 500, 500,
    500, 500, 389, 389, 278, 500, 444, 667, 444, 444, 389, 400, 275, 400, 541,
];

#[rustfmt::skip]
const TIMES_BOLD_ITALIC: [u16; 95] = [
    250, 389, 555, 500, 500, 833, 778, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    832, 667, 667, 667, 722, 667, 667, 722, 778, 389, 500, 667, 611, 889, 722, 722,
    611, 722, 667, 556, 611, 722, 667, 889, 667, 611, 611, 333, 278, 333, 570, 500,
    333, 500, 500, 444, 500, 444, 333, 500, 556, 278, 278, 500, 278, 778, 556, 500,
    500, 500, 389, 389, 278, 556, 444, 667, 500, 444, 389, 348, 220, 348, 570,
];
