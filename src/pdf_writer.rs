//! Drawing onto an existing PDF with lopdf.
//!
//! Drawing calls only record content operators per page. Nothing touches the
//! page tree until [`PdfDocument::save`], which appends one overlay stream per
//! touched page and merges the fonts and images it uses into the page
//! resources.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Write;

use anyhow::{Context, Result, anyhow};
use flate2::Compression;
use flate2::write::ZlibEncoder;
use lopdf::{
    Dictionary, Document, Object, ObjectId, Stream, StringFormat,
    content::{Content, Operation},
    dictionary,
    xref::XrefType,
};

use crate::coords::{Point, Rect};
use crate::field::{Color, TextAlign};
use crate::icons::{Glyph, Primitive};
use crate::pdf_metrics::{StandardFont, encode_win_ansi};

// Control point distance for a quarter circle drawn as a cubic Bezier.
const KAPPA: f64 = 0.552_284_749_830_793_4;

// Guards against cycles in malformed page trees.
const MAX_TREE_DEPTH: usize = 32;

// US Letter, used when no MediaBox can be found.
const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

// lopdf stores reals as f32, so written coordinates keep about 7 significant digits.
fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

fn color_operands(c: Color) -> Vec<Object> {
    vec![real(c.r), real(c.g), real(c.b)]
}

fn color_array(c: Color) -> Object {
    Object::Array(color_operands(c))
}

/// Geometry of one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageInfo {
    pub number: u32,
    pub id: ObjectId,
    /// `[x0, y0, x1, y1]`
    pub media_box: [f64; 4],
}

impl PageInfo {
    pub fn width(&self) -> f64 {
        self.media_box[2] - self.media_box[0]
    }
    pub fn height(&self) -> f64 {
        self.media_box[3] - self.media_box[1]
    }
}

/// An image XObject registered in the document.
#[derive(Debug, Clone)]
pub struct ImageHandle {
    pub id: ObjectId,
    pub name: String,
    pub width: u32,
    pub height: u32,
}

/// A native interactive text field to create.
#[derive(Debug, Clone)]
pub struct TextFieldSpec<'a> {
    pub name: String,
    pub rect: Rect,
    pub font: StandardFont,
    pub font_size: f64,
    pub color: Color,
    pub align: TextAlign,
    pub tooltip: Option<&'a str>,
    pub value: Option<&'a str>,
    pub border_color: Option<Color>,
    pub border_width: f64,
    pub background: Option<Color>,
    pub multiline: bool,
}

#[derive(Default)]
struct PageCanvas {
    ops: Vec<Operation>,
    fonts: BTreeMap<String, ObjectId>,
    xobjects: BTreeMap<String, ObjectId>,
}

/// A loaded PDF being drawn on. Owned by a single fill.
pub struct PdfDocument {
    doc: Document,
    pages: Vec<PageInfo>,
    canvases: BTreeMap<u32, PageCanvas>,
    fonts: HashMap<StandardFont, (ObjectId, String)>,
    image_count: usize,
    form_fields: Vec<ObjectId>,
    field_names: Option<HashSet<String>>,
    /// Font and XObject names already used anywhere in the document.
    resource_names: HashSet<String>,
}

impl PdfDocument {
    pub fn load(bytes: &[u8]) -> Result<PdfDocument> {
        let doc = Document::load_mem(bytes).context("source PDF is unreadable")?;
        let pages = doc
            .get_pages()
            .into_iter()
            .map(|(number, id)| PageInfo { number, id, media_box: media_box(&doc, id) })
            .collect();
        let resource_names = existing_resource_names(&doc);
        Ok(PdfDocument {
            doc,
            pages,
            canvases: BTreeMap::new(),
            fonts: HashMap::new(),
            image_count: 0,
            form_fields: Vec::new(),
            field_names: None,
            resource_names,
        })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page by 1-based number.
    pub fn page(&self, number: u32) -> Option<PageInfo> {
        self.pages.iter().find(|p| p.number == number).copied()
    }

    pub fn pages(&self) -> &[PageInfo] {
        &self.pages
    }

    /// Font object and resource name for `font`, created on first use.
    fn font_resource(&mut self, font: StandardFont) -> (ObjectId, String) {
        if let Some(found) = self.fonts.get(&font) {
            return found.clone();
        }
        let id = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        let name = fresh_name(&mut self.resource_names, font.resource_name());
        self.fonts.insert(font, (id, name.clone()));
        (id, name)
    }

    fn canvas(&mut self, page: u32) -> &mut PageCanvas {
        self.canvases.entry(page).or_default()
    }

    /// Draw `text` with its baseline starting at `(x, y)`.
    pub fn draw_text(&mut self, page: u32, font: StandardFont, size: f64, color: Color, x: f64, y: f64, text: &str) {
        let (font_id, name) = self.font_resource(font);
        let canvas = self.canvas(page);
        canvas.fonts.insert(name.clone(), font_id);
        canvas.ops.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(name.into_bytes()), real(size)]),
            Operation::new("rg", color_operands(color)),
            Operation::new("Td", vec![real(x), real(y)]),
            Operation::new("Tj", vec![Object::String(encode_win_ansi(text), StringFormat::Literal)]),
            Operation::new("ET", vec![]),
        ]);
    }

    pub fn draw_line(&mut self, page: u32, from: Point, to: Point, thickness: f64, color: Color) {
        self.draw_glyph(page, &Glyph { color, primitives: vec![Primitive::Line { from, to, thickness }] });
    }

    pub fn draw_circle(&mut self, page: u32, center: Point, radius: f64, thickness: f64, filled: bool, color: Color) {
        self.draw_glyph(page, &Glyph { color, primitives: vec![Primitive::Circle { center, radius, thickness, filled }] });
    }

    pub fn draw_rectangle(&mut self, page: u32, rect: Rect, thickness: f64, filled: bool, color: Color) {
        self.draw_glyph(page, &Glyph { color, primitives: vec![Primitive::Rect { rect, thickness, filled }] });
    }

    /// Draw every primitive of an icon glyph in its color.
    pub fn draw_glyph(&mut self, page: u32, glyph: &Glyph) {
        let ops = &mut self.canvas(page).ops;
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new("RG", color_operands(glyph.color)));
        ops.push(Operation::new("rg", color_operands(glyph.color)));
        ops.push(Operation::new("J", vec![Object::Integer(1)]));
        ops.push(Operation::new("j", vec![Object::Integer(1)]));
        for p in &glyph.primitives {
            match *p {
                Primitive::Line { from, to, thickness } => {
                    ops.push(Operation::new("w", vec![real(thickness)]));
                    ops.push(Operation::new("m", vec![real(from.x), real(from.y)]));
                    ops.push(Operation::new("l", vec![real(to.x), real(to.y)]));
                    ops.push(Operation::new("S", vec![]));
                }
                Primitive::Circle { center, radius, thickness, filled } => {
                    ops.push(Operation::new("w", vec![real(thickness)]));
                    circle_path(ops, center, radius);
                    ops.push(Operation::new(if filled { "f" } else { "S" }, vec![]));
                }
                Primitive::Rect { rect, thickness, filled } => {
                    ops.push(Operation::new("w", vec![real(thickness)]));
                    ops.push(Operation::new(
                        "re",
                        vec![real(rect.x), real(rect.y), real(rect.width), real(rect.height)],
                    ));
                    ops.push(Operation::new(if filled { "f" } else { "S" }, vec![]));
                }
            }
        }
        ops.push(Operation::new("Q", vec![]));
    }

    /// Add an image XObject. Alpha goes into a soft mask.
    pub fn embed_image(&mut self, image: &image::DynamicImage) -> Result<ImageHandle> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(anyhow!("image has no pixels"));
        }

        let rgb = image.to_rgb8();
        let mut image_dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8i64,
            "Filter" => "FlateDecode",
        };

        if image.color().has_alpha() {
            let alpha: Vec<u8> = image.to_rgba8().pixels().map(|p| p.0[3]).collect();
            let mask_id = self.doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => i64::from(width),
                    "Height" => i64::from(height),
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8i64,
                    "Filter" => "FlateDecode",
                },
                deflate(&alpha)?,
            ));
            image_dict.set("SMask", mask_id);
        }

        let id = self.doc.add_object(Stream::new(image_dict, deflate(rgb.as_raw())?));
        self.image_count += 1;
        let name = fresh_name(&mut self.resource_names, format!("PFIm{}", self.image_count));
        Ok(ImageHandle { id, name, width, height })
    }

    /// Paint an embedded image stretched to `rect`.
    pub fn draw_image(&mut self, page: u32, image: &ImageHandle, rect: Rect) {
        let canvas = self.canvas(page);
        canvas.xobjects.insert(image.name.clone(), image.id);
        canvas.ops.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![real(rect.width), real(0.0), real(0.0), real(rect.height), real(rect.x), real(rect.y)],
            ),
            Operation::new("Do", vec![Object::Name(image.name.clone().into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
    }

    /// Return `base` with a numeric suffix that no form field in the document uses yet.
    pub fn unique_field_name(&mut self, base: &str) -> String {
        let taken = self.field_names.get_or_insert_with(|| existing_field_names(&self.doc));
        let base = if base.is_empty() { "field" } else { base };
        let name = (1..)
            .map(|n| format!("{base}_{n}"))
            .find(|candidate| !taken.contains(candidate))
            .unwrap_or_else(|| base.to_string());
        taken.insert(name.clone());
        name
    }

    /// Create a native text field widget on `page`.
    pub fn add_text_field(&mut self, page: u32, spec: &TextFieldSpec) -> Result<()> {
        let info = self.page(page).ok_or_else(|| anyhow!("page {page} does not exist"))?;
        let (font_id, font_name) = self.font_resource(spec.font);
        let r = spec.rect;
        let [ox, oy, ..] = info.media_box;

        let da = format!(
            "/{} {} Tf {} {} {} rg",
            font_name, spec.font_size, spec.color.r, spec.color.g, spec.color.b
        );
        let quadding = match spec.align {
            TextAlign::Left => 0i64,
            TextAlign::Center => 1,
            TextAlign::Right => 2,
        };

        let mut mk = Dictionary::new();
        if let Some(c) = spec.border_color {
            mk.set("BC", color_array(c));
        }
        if let Some(c) = spec.background {
            mk.set("BG", color_array(c));
        }

        let mut widget = dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Tx",
            "T" => Object::string_literal(spec.name.as_str()),
            "Rect" => vec![real(ox + r.x), real(oy + r.y), real(ox + r.right()), real(oy + r.top())],
            "F" => 4i64,
            "P" => info.id,
            "DA" => Object::string_literal(da),
            "Q" => quadding,
            "MK" => mk,
            "BS" => dictionary! { "W" => real(spec.border_width), "S" => "S" },
            "DR" => dictionary! { "Font" => dictionary! { font_name.as_str() => font_id } },
        };
        if spec.multiline {
            widget.set("Ff", 1i64 << 12);
        }
        if let Some(tip) = spec.tooltip {
            widget.set("TU", Object::String(encode_win_ansi(tip), StringFormat::Literal));
        }
        if let Some(value) = spec.value {
            widget.set("V", Object::String(encode_win_ansi(value), StringFormat::Literal));
        }

        let widget_id = self.doc.add_object(widget);

        let page_dict = self.doc.get_object_mut(info.id)?.as_dict_mut()?;
        match page_dict.get(b"Annots").ok().cloned() {
            Some(Object::Reference(annots_id)) => {
                self.doc.get_object_mut(annots_id)?.as_array_mut()?.push(widget_id.into());
            }
            Some(Object::Array(mut annots)) => {
                annots.push(widget_id.into());
                page_dict.set("Annots", annots);
            }
            _ => page_dict.set("Annots", vec![Object::from(widget_id)]),
        }

        self.form_fields.push(widget_id);
        Ok(())
    }

    fn merge_resources(&mut self, page_id: ObjectId, category: &str, entries: &BTreeMap<String, ObjectId>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut resources = inherited_resources(&self.doc, page_id)?;
        let mut sub = match resources.get(category.as_bytes()) {
            Ok(Object::Dictionary(d)) => d.clone(),
            Ok(Object::Reference(id)) => self
                .doc
                .get_dictionary(*id)
                .with_context(|| format!("page {category} resources are not a dictionary"))?
                .clone(),
            _ => Dictionary::new(),
        };
        for (name, id) in entries {
            sub.set(name.as_str(), *id);
        }
        resources.set(category, sub);
        self.doc.get_object_mut(page_id)?.as_dict_mut()?.set("Resources", resources);
        Ok(())
    }

    fn flush_page(&mut self, number: u32, canvas: PageCanvas, wrap: (ObjectId, ObjectId)) -> Result<()> {
        let info = self.page(number).ok_or_else(|| anyhow!("page {number} does not exist"))?;

        self.merge_resources(info.id, "Font", &canvas.fonts)
            .with_context(|| format!("registering fonts on page {number}"))?;
        self.merge_resources(info.id, "XObject", &canvas.xobjects)
            .with_context(|| format!("registering images on page {number}"))?;

        let mut ops = Vec::with_capacity(canvas.ops.len() + 1);
        let [ox, oy, ..] = info.media_box;
        if ox != 0.0 || oy != 0.0 {
            ops.push(Operation::new("cm", vec![real(1.0), real(0.0), real(0.0), real(1.0), real(ox), real(oy)]));
        }
        ops.extend(canvas.ops);
        let content = Content { operations: ops }.encode()?;
        let overlay_id = self.doc.add_object(Stream::new(dictionary! {}, content));

        // Contents may be one stream, an array of streams, or a reference to such an array.
        let existing: Vec<Object> = match self.doc.get_dictionary(info.id)?.get(b"Contents") {
            Ok(Object::Reference(id)) => match self.doc.get_object(*id) {
                Ok(Object::Array(streams)) => streams.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(streams)) => streams.clone(),
            _ => Vec::new(),
        };
        let (open_id, close_id) = wrap;
        let contents: Vec<Object> = if existing.is_empty() {
            vec![overlay_id.into()]
        } else {
            std::iter::once(open_id.into())
                .chain(existing)
                .chain([close_id.into(), overlay_id.into()])
                .collect()
        };
        self.doc.get_object_mut(info.id)?.as_dict_mut()?.set("Contents", contents);
        Ok(())
    }

    fn flush_form(&mut self) -> Result<()> {
        if self.form_fields.is_empty() {
            return Ok(());
        }
        let catalog_id = self.doc.trailer.get(b"Root")?.as_reference()?;

        let mut acro_form = match self.doc.get_dictionary(catalog_id)?.get(b"AcroForm") {
            Ok(Object::Dictionary(d)) => d.clone(),
            Ok(Object::Reference(id)) => self.doc.get_dictionary(*id)?.clone(),
            _ => Dictionary::new(),
        };

        let mut fields = match acro_form.get(b"Fields") {
            Ok(Object::Array(a)) => a.clone(),
            Ok(Object::Reference(id)) => self.doc.get_object(*id)?.as_array()?.clone(),
            _ => Vec::new(),
        };
        fields.extend(self.form_fields.iter().map(|id| Object::from(*id)));
        acro_form.set("Fields", fields);
        acro_form.set("NeedAppearances", true);

        let mut dr = match acro_form.get(b"DR") {
            Ok(Object::Dictionary(d)) => d.clone(),
            Ok(Object::Reference(id)) => self.doc.get_dictionary(*id)?.clone(),
            _ => Dictionary::new(),
        };
        let mut dr_fonts = match dr.get(b"Font") {
            Ok(Object::Dictionary(d)) => d.clone(),
            Ok(Object::Reference(id)) => self.doc.get_dictionary(*id)?.clone(),
            _ => Dictionary::new(),
        };
        for (id, name) in self.fonts.values() {
            dr_fonts.set(name.as_str(), *id);
        }
        dr.set("Font", dr_fonts);
        acro_form.set("DR", dr);

        self.doc.get_object_mut(catalog_id)?.as_dict_mut()?.set("AcroForm", acro_form);
        Ok(())
    }

    fn stamp_modified(&mut self) -> Result<()> {
        let date = time::OffsetDateTime::now_utc();
        let s_date = format!(
            "D:{:04}{:02}{:02}{:02}{:02}{:02}Z",
            date.year(),
            u8::from(date.month()),
            date.day(),
            date.hour(),
            date.minute(),
            date.second(),
        );
        match self.doc.trailer.get(b"Info").ok().cloned() {
            Some(Object::Reference(id)) => {
                self.doc.get_object_mut(id)?.as_dict_mut()?.set("ModDate", Object::string_literal(s_date));
            }
            _ => {
                let id = self.doc.add_object(dictionary! {
                    "Producer" => Object::string_literal(env!("CARGO_PKG_NAME")),
                    "ModDate" => Object::string_literal(s_date),
                });
                self.doc.trailer.set("Info", id);
            }
        }
        Ok(())
    }

    /// Write the overlays and serialize the document.
    pub fn save(mut self) -> Result<Vec<u8>> {
        let canvases = std::mem::take(&mut self.canvases);
        if !canvases.is_empty() {
            let open_id = self.doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
            let close_id = self.doc.add_object(Stream::new(dictionary! {}, b"\nQ\n".to_vec()));
            for (number, canvas) in canvases {
                self.flush_page(number, canvas, (open_id, close_id))?;
            }
        }
        self.flush_form().context("updating the interactive form")?;
        self.stamp_modified().context("updating document info")?;

        self.doc.reference_table.cross_reference_type = XrefType::CrossReferenceTable;
        let mut buffer = Vec::new();
        self.doc.save_to(&mut buffer).context("serializing the filled PDF")?;
        Ok(buffer)
    }
}

/// `base`, or `base_N` for the first N that is not taken yet.
fn fresh_name(taken: &mut HashSet<String>, base: String) -> String {
    let mut name = base.clone();
    let mut n = 0;
    while taken.contains(&name) {
        n += 1;
        name = format!("{base}_{n}");
    }
    taken.insert(name.clone());
    name
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn circle_path(ops: &mut Vec<Operation>, c: Point, r: f64) {
    let k = r * KAPPA;
    ops.push(Operation::new("m", vec![real(c.x + r), real(c.y)]));
    let quarters = [
        [c.x + r, c.y + k, c.x + k, c.y + r, c.x, c.y + r],
        [c.x - k, c.y + r, c.x - r, c.y + k, c.x - r, c.y],
        [c.x - r, c.y - k, c.x - k, c.y - r, c.x, c.y - r],
        [c.x + k, c.y - r, c.x + r, c.y - k, c.x + r, c.y],
    ];
    for q in quarters {
        ops.push(Operation::new("c", q.iter().map(|v| real(*v)).collect()));
    }
    ops.push(Operation::new("h", vec![]));
}

/// Walk up the page tree to find an inheritable attribute.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(value);
        }
        let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn media_box(doc: &Document, page_id: ObjectId) -> [f64; 4] {
    let array = inherited(doc, page_id, b"MediaBox").and_then(|obj| match obj {
        Object::Array(a) => Some(a),
        Object::Reference(id) => doc.get_object(*id).ok()?.as_array().ok(),
        _ => None,
    });
    let Some(array) = array else {
        return DEFAULT_MEDIA_BOX;
    };
    let values: Vec<f64> = array.iter().filter_map(|o| o.as_float().ok()).map(f64::from).collect();
    match values[..] {
        [x0, y0, x1, y1] if x1 != x0 && y1 != y0 => [x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)],
        _ => DEFAULT_MEDIA_BOX,
    }
}

fn inherited_resources(doc: &Document, page_id: ObjectId) -> Result<Dictionary> {
    Ok(match inherited(doc, page_id, b"Resources") {
        Some(Object::Dictionary(d)) => d.clone(),
        Some(Object::Reference(id)) => doc
            .get_dictionary(*id)
            .context("page resources are not a dictionary")?
            .clone(),
        Some(_) => return Err(anyhow!("page resources are not a dictionary")),
        None => Dictionary::new(),
    })
}

fn dictionary_keys(doc: &Document, obj: &Object, names: &mut HashSet<String>) {
    let dict = match obj {
        Object::Dictionary(d) => d,
        Object::Reference(id) => match doc.get_dictionary(*id) {
            Ok(d) => d,
            Err(_) => return,
        },
        _ => return,
    };
    names.extend(dict.iter().map(|(k, _)| String::from_utf8_lossy(k).into_owned()));
}

/// Font and XObject names on every page, plus the form's default fonts.
fn existing_resource_names(doc: &Document) -> HashSet<String> {
    let mut names = HashSet::new();
    for page_id in doc.get_pages().into_values() {
        let Ok(resources) = inherited_resources(doc, page_id) else {
            continue;
        };
        for category in [&b"Font"[..], b"XObject"] {
            if let Ok(sub) = resources.get(category) {
                dictionary_keys(doc, sub, &mut names);
            }
        }
    }
    let dr_fonts = doc
        .catalog()
        .ok()
        .and_then(|c| c.get(b"AcroForm").ok())
        .and_then(|f| match f {
            Object::Reference(id) => doc.get_dictionary(*id).ok(),
            Object::Dictionary(d) => Some(d),
            _ => None,
        })
        .and_then(|f| f.get(b"DR").ok())
        .and_then(|dr| match dr {
            Object::Reference(id) => doc.get_dictionary(*id).ok(),
            Object::Dictionary(d) => Some(d),
            _ => None,
        })
        .and_then(|dr| dr.get(b"Font").ok());
    if let Some(fonts) = dr_fonts {
        dictionary_keys(doc, fonts, &mut names);
    }
    names
}

fn existing_field_names(doc: &Document) -> HashSet<String> {
    let fields = (|| {
        let catalog = doc.catalog().ok()?;
        let form = match catalog.get(b"AcroForm").ok()? {
            Object::Reference(id) => doc.get_dictionary(*id).ok()?,
            Object::Dictionary(d) => d,
            _ => return None,
        };
        match form.get(b"Fields").ok()? {
            Object::Array(a) => Some(a.clone()),
            Object::Reference(id) => doc.get_object(*id).ok()?.as_array().ok().cloned(),
            _ => None,
        }
    })()
    .unwrap_or_default();

    fields
        .iter()
        .filter_map(|f| f.as_reference().ok())
        .filter_map(|id| doc.get_dictionary(id).ok())
        .filter_map(|d| d.get(b"T").ok()?.as_str().ok())
        .map(|t| String::from_utf8_lossy(t).into_owned())
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A blank PDF with the given page heights (612 wide), optionally
    /// sharing an inherited resources dictionary.
    pub(crate) fn blank_pdf(heights: &[f64]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let mut kids = Vec::new();
        for (i, h) in heights.iter().enumerate() {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), Object::Integer(12)]),
                    Operation::new("Td", vec![Object::Integer(72), Object::Integer(72)]),
                    Operation::new("Tj", vec![Object::string_literal(format!("page {}", i + 1))]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(612), real(*h)],
            });
            kids.push(Object::from(page_id));
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => kids.len() as i64,
                "Kids" => kids,
                "Resources" => resources_id,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    /// Operators of the last content stream of a page (the overlay).
    pub(crate) fn overlay_ops(doc: &Document, page: u32) -> Vec<Operation> {
        let page_id = doc.get_pages()[&page];
        let contents = doc.get_dictionary(page_id).unwrap().get(b"Contents").unwrap();
        let last = match contents {
            Object::Array(a) => a.last().unwrap().as_reference().unwrap(),
            Object::Reference(id) => *id,
            _ => panic!("unexpected contents"),
        };
        let stream = doc.get_object(last).unwrap().as_stream().unwrap();
        let data = stream.decompressed_content().unwrap_or_else(|_| stream.content.clone());
        Content::decode(&data).unwrap().operations
    }

    pub(crate) fn operands(op: &Operation) -> Vec<f64> {
        op.operands.iter().filter_map(|o| o.as_float().ok()).map(f64::from).collect()
    }

    #[test]
    fn reads_page_geometry() {
        let pdf = PdfDocument::load(&blank_pdf(&[792.0, 500.0])).unwrap();
        assert_eq!(pdf.page_count(), 2);
        assert_eq!(pdf.page(2).unwrap().height(), 500.0);
        assert_eq!(pdf.page(1).unwrap().width(), 612.0);
        assert!(pdf.page(3).is_none());
    }

    #[test]
    fn rejects_garbage() {
        assert!(PdfDocument::load(b"not a pdf").is_err());
    }

    #[test]
    fn overlay_keeps_original_content_and_inherited_fonts() {
        let mut pdf = PdfDocument::load(&blank_pdf(&[792.0])).unwrap();
        let helv = StandardFont::ALL[0];
        pdf.draw_text(1, helv, 10.0, Color::BLACK, 50.0, 60.0, "Hi (there)");
        pdf.draw_rectangle(1, Rect::new(1.0, 2.0, 3.0, 4.0), 1.0, true, Color::BLACK);
        let bytes = pdf.save().unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        let page_id = doc.get_pages()[&1];
        let page = doc.get_dictionary(page_id).unwrap();
        let contents = page.get(b"Contents").unwrap().as_array().unwrap();
        assert_eq!(contents.len(), 4);

        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
        assert!(fonts.has(b"F1"), "inherited font must survive");
        assert!(fonts.has(helv.resource_name().as_bytes()));

        let ops = overlay_ops(&doc, 1);
        let tj = ops.iter().find(|o| o.operator == "Tj").unwrap();
        assert_eq!(tj.operands[0].as_str().unwrap(), b"Hi (there)");
        let td = ops.iter().find(|o| o.operator == "Td").unwrap();
        assert_eq!(operands(td), vec![50.0, 60.0]);
        assert!(ops.iter().any(|o| o.operator == "re"));
    }

    #[test]
    fn circles_are_four_bezier_quarters() {
        let mut pdf = PdfDocument::load(&blank_pdf(&[792.0])).unwrap();
        pdf.draw_circle(1, Point::new(100.0, 100.0), 10.0, 2.0, false, Color::BLACK);
        pdf.draw_line(1, Point::new(0.0, 0.0), Point::new(5.0, 5.0), 1.0, Color::BLACK);
        let doc = Document::load_mem(&pdf.save().unwrap()).unwrap();
        let ops = overlay_ops(&doc, 1);
        let curves: Vec<_> = ops.iter().filter(|o| o.operator == "c").collect();
        assert_eq!(curves.len(), 4);
        // Each quarter ends on the circle at a cardinal point.
        assert_eq!(operands(curves[0])[4..], [100.0, 110.0]);
        assert_eq!(operands(curves[3])[4..], [110.0, 100.0]);
        assert_eq!(ops.iter().filter(|o| o.operator == "S").count(), 2);
        let moves: Vec<_> = ops.iter().filter(|o| o.operator == "m").map(operands).collect();
        assert_eq!(moves, vec![vec![110.0, 100.0], vec![0.0, 0.0]]);
    }

    #[test]
    fn offset_media_box_translates_the_overlay() {
        let mut doc = Document::load_mem(&blank_pdf(&[792.0])).unwrap();
        let page_id = doc.get_pages()[&1];
        doc.get_object_mut(page_id)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .set("MediaBox", vec![real(10.0), real(20.0), real(622.0), real(812.0)]);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();

        let mut pdf = PdfDocument::load(&bytes).unwrap();
        assert_eq!(pdf.page(1).unwrap().height(), 792.0);
        pdf.draw_rectangle(1, Rect::new(0.0, 0.0, 5.0, 5.0), 1.0, true, Color::BLACK);
        let doc = Document::load_mem(&pdf.save().unwrap()).unwrap();
        let ops = overlay_ops(&doc, 1);
        assert_eq!(ops[0].operator, "cm");
        assert_eq!(operands(&ops[0]), vec![1.0, 0.0, 0.0, 1.0, 10.0, 20.0]);
    }

    #[test]
    fn form_field_names_are_unique() {
        let mut pdf = PdfDocument::load(&blank_pdf(&[792.0])).unwrap();
        assert_eq!(pdf.unique_field_name("notes"), "notes_1");
        assert_eq!(pdf.unique_field_name("notes"), "notes_2");
        assert_eq!(pdf.unique_field_name(""), "field_1");
    }

    #[test]
    fn resource_names_avoid_existing_entries() {
        let mut doc = Document::load_mem(&blank_pdf(&[792.0])).unwrap();
        let font_id = doc.add_object(dictionary! { "Type" => "Font", "Subtype" => "Type1", "BaseFont" => "Symbol" });
        let page_id = doc.get_pages()[&1];
        let mut resources = inherited_resources(&doc, page_id).unwrap();
        let mut fonts = resources.get(b"Font").unwrap().as_dict().unwrap().clone();
        fonts.set("PFF0", font_id);
        resources.set("Font", fonts);
        doc.get_object_mut(page_id).unwrap().as_dict_mut().unwrap().set("Resources", resources);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();

        let mut pdf = PdfDocument::load(&bytes).unwrap();
        pdf.draw_text(1, StandardFont::ALL[0], 10.0, Color::BLACK, 0.0, 0.0, "x");
        let doc = Document::load_mem(&pdf.save().unwrap()).unwrap();
        let tf = overlay_ops(&doc, 1).into_iter().find(|o| o.operator == "Tf").unwrap();
        assert_eq!(tf.operands[0].as_name().unwrap(), b"PFF0_1");

        let page = doc.get_dictionary(doc.get_pages()[&1]).unwrap();
        let fonts = page.get(b"Resources").unwrap().as_dict().unwrap().get(b"Font").unwrap().as_dict().unwrap();
        let symbol = doc.get_dictionary(fonts.get(b"PFF0").unwrap().as_reference().unwrap()).unwrap();
        assert_eq!(symbol.get(b"BaseFont").unwrap().as_name().unwrap(), b"Symbol");
        assert!(fonts.has(b"PFF0_1"));
    }
}
