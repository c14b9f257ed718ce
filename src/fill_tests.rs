use std::collections::HashMap;

use lopdf::{Document, Object, Stream, content::Content, dictionary};
use regex::Regex;
use serde_json::json;

use crate::calibration::{CalibrationConfig, Offset};
use crate::field::{Field, FieldKind, PositionOverride, PositionOverrides, ValueMap};
use crate::fill::{FillEngine, Filled};
use crate::images::tests::{FakeFetcher, png_data_url};
use crate::pdf_writer::tests::{blank_pdf, operands};

fn fields(json: serde_json::Value) -> Vec<Field> {
    serde_json::from_value(json).unwrap()
}

fn values(json: serde_json::Value) -> ValueMap {
    serde_json::from_value(json).unwrap()
}

fn run(source: &[u8], fields: &[Field], values: &ValueMap) -> Filled {
    run_with(source, fields, values, &PositionOverrides::new(), &CalibrationConfig::IDENTITY)
}

fn run_with(
    source: &[u8],
    fields: &[Field],
    values: &ValueMap,
    overrides: &PositionOverrides,
    calibration: &CalibrationConfig,
) -> Filled {
    let fetcher = FakeFetcher::default();
    FillEngine::new(calibration, &fetcher)
        .fill(source, fields, values, overrides)
        .unwrap()
}

/// Full decoded content of one page, as text.
fn page_text(bytes: &[u8], page: u32) -> String {
    let doc = Document::load_mem(bytes).unwrap();
    let page_id = doc.get_pages()[&page];
    String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned()
}

fn page_ops(bytes: &[u8], page: u32) -> Vec<lopdf::content::Operation> {
    let doc = Document::load_mem(bytes).unwrap();
    let page_id = doc.get_pages()[&page];
    Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap().operations
}

/// Number of overlay text draws (the source pages only use /F1).
fn overlay_text_count(bytes: &[u8], page: u32) -> usize {
    let re = Regex::new(r"/PFF\w+ [\d.]+ Tf").unwrap();
    re.find_iter(&page_text(bytes, page)).count()
}

fn td_positions(bytes: &[u8], page: u32) -> Vec<(f64, f64)> {
    let re = Regex::new(r"(-?[\d.]+) (-?[\d.]+) Td").unwrap();
    re.captures_iter(&page_text(bytes, page))
        .map(|c| (c[1].parse().unwrap(), c[2].parse().unwrap()))
        .filter(|&(x, y)| (x, y) != (72.0, 72.0))
        .collect()
}

fn widget_names(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    let catalog = doc.catalog().unwrap();
    let Ok(form) = catalog.get(b"AcroForm") else {
        return Vec::new();
    };
    let form = form.as_dict().unwrap();
    assert!(form.get(b"NeedAppearances").unwrap().as_bool().unwrap());
    form.get(b"Fields")
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(|r| {
            let d = doc.get_dictionary(r.as_reference().unwrap()).unwrap();
            String::from_utf8_lossy(d.get(b"T").unwrap().as_str().unwrap()).into_owned()
        })
        .collect()
}

#[test]
fn text_without_value_is_not_drawn() {
    let src = blank_pdf(&[792.0]);
    let list = fields(json!([
        {"id": 1, "slug": "name", "pageNumber": 1, "xCoord": 100, "yCoord": 100,
         "width": 200, "height": 24, "inputType": "TEXT"}
    ]));
    let filled = run(&src, &list, &values(json!({})));
    assert_eq!(overlay_text_count(&filled.bytes, 1), 0);
    assert_eq!(filled.report.skipped, 1);

    let filled = run(&src, &list, &values(json!({"name": "   "})));
    assert_eq!(overlay_text_count(&filled.bytes, 1), 0);

    let filled = run(&src, &list, &values(json!({"name": "Ada"})));
    assert_eq!(overlay_text_count(&filled.bytes, 1), 1);
    assert_eq!(filled.report.drawn, 1);
}

#[test]
fn icon_visibility_follows_value_then_default() {
    let src = blank_pdf(&[792.0]);
    let list = fields(json!([
        {"id": 1, "slug": "agree", "pageNumber": 1, "xCoord": 50, "yCoord": 50,
         "width": 20, "height": 20, "inputType": "ICON", "defaultVisible": false,
         "iconColor": "#ff0000"}
    ]));
    let strokes = |bytes: &[u8]| page_ops(bytes, 1).iter().filter(|o| o.operator == "S").count();

    let filled = run(&src, &list, &values(json!({})));
    assert_eq!(strokes(&filled.bytes), 0);

    let filled = run(&src, &list, &values(json!({"agree": true})));
    assert_eq!(strokes(&filled.bytes), 2, "a check is two strokes");
    let red = page_ops(&filled.bytes, 1)
        .into_iter()
        .find(|o| o.operator == "RG")
        .unwrap();
    assert_eq!(operands(&red), vec![1.0, 0.0, 0.0]);

    let filled = run(&src, &list, &values(json!({"agree": "off"})));
    assert_eq!(strokes(&filled.bytes), 0);

    let mut shown = list.clone();
    let FieldKind::Icon(style) = &mut shown[0].kind else { panic!() };
    style.default_visible = true;
    let filled = run(&src, &shown, &values(json!({})));
    assert_eq!(strokes(&filled.bytes), 2);
}

#[test]
fn fillable_is_created_without_a_value() {
    let src = blank_pdf(&[792.0]);
    let list = fields(json!([
        {"id": 1, "slug": "notes", "pageNumber": 1, "xCoord": 72, "yCoord": 100,
         "width": 200, "height": 24, "inputType": "FILLABLE", "placeholder": "Your notes",
         "borderColor": "#0000ff", "fontSize": 10},
        {"id": 2, "slug": "notes2", "pageNumber": 1, "xCoord": 72, "yCoord": 200,
         "width": 200, "height": 24, "inputType": "FILLABLE"}
    ]));
    let filled = run(&src, &list, &values(json!({"notes2": "prefilled"})));
    assert_eq!(filled.report.drawn, 2);
    assert_eq!(widget_names(&filled.bytes), ["notes_1", "notes2_1"]);

    let doc = Document::load_mem(&filled.bytes).unwrap();
    let page = doc.get_dictionary(doc.get_pages()[&1]).unwrap();
    let annots = page.get(b"Annots").unwrap().as_array().unwrap();
    assert_eq!(annots.len(), 2);
    let first = doc.get_dictionary(annots[0].as_reference().unwrap()).unwrap();
    assert_eq!(first.get(b"FT").unwrap().as_name().unwrap(), b"Tx");
    assert_eq!(first.get(b"TU").unwrap().as_str().unwrap(), b"Your notes");
    assert!(first.get(b"V").is_err());
    let rect: Vec<f64> = first
        .get(b"Rect")
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(|o| f64::from(o.as_float().unwrap()))
        .collect();
    assert_eq!(rect, vec![72.0, 668.0, 272.0, 692.0]);
    let da = String::from_utf8_lossy(first.get(b"DA").unwrap().as_str().unwrap()).into_owned();
    assert!(Regex::new(r"^/PFF0 10 Tf 0 0 0 rg$").unwrap().is_match(&da), "{da}");

    let second = doc.get_dictionary(annots[1].as_reference().unwrap()).unwrap();
    assert_eq!(second.get(b"V").unwrap().as_str().unwrap(), b"prefilled");
}

#[test]
fn missing_page_is_skipped_and_the_rest_fills() {
    let src = blank_pdf(&[792.0, 792.0, 792.0]);
    let list = fields(json!([
        {"id": 1, "slug": "ghost", "pageNumber": 5, "xCoord": 10, "yCoord": 10,
         "width": 100, "height": 20, "inputType": "TEXT"},
        {"id": 2, "slug": "real", "pageNumber": 3, "xCoord": 10, "yCoord": 10,
         "width": 100, "height": 20, "inputType": "TEXT"}
    ]));
    let filled = run(&src, &list, &values(json!({"ghost": "boo", "real": "here"})));
    assert_eq!(filled.report.skipped, 1);
    assert_eq!(filled.report.drawn, 1);
    assert_eq!(filled.report.failed, 0);
    assert_eq!(overlay_text_count(&filled.bytes, 3), 1);
    assert_eq!(overlay_text_count(&filled.bytes, 1), 0);
}

#[test]
fn centered_text_is_anchored_by_measured_width() {
    let src = blank_pdf(&[792.0]);
    // "xxxxx" in Helvetica at 20pt is exactly 50pt wide.
    let list = fields(json!([
        {"id": 1, "slug": "c", "pageNumber": 1, "xCoord": 100, "yCoord": 100,
         "width": 200, "height": 24, "inputType": "TEXT", "fontSize": 20,
         "textAlign": "center"},
        {"id": 2, "slug": "r", "pageNumber": 1, "xCoord": 100, "yCoord": 300,
         "width": 200, "height": 24, "inputType": "TEXT", "fontSize": 20,
         "textAlign": "right"}
    ]));
    let filled = run(&src, &list, &values(json!({"c": "xxxxx", "r": "xxxxx"})));
    let positions = td_positions(&filled.bytes, 1);
    // Baseline sits 0.2 * fontSize above the box bottom: 792 - 100 - 24 + 4.
    assert_eq!(positions, vec![(175.0, 672.0), (250.0, 472.0)]);
}

#[test]
fn unreachable_signature_is_skipped() {
    let src = blank_pdf(&[792.0]);
    let list = fields(json!([
        {"id": 1, "slug": "sig", "pageNumber": 1, "xCoord": 10, "yCoord": 10,
         "width": 200, "height": 60, "inputType": "SIGNATURE"},
        {"id": 2, "slug": "name", "pageNumber": 1, "xCoord": 10, "yCoord": 100,
         "width": 200, "height": 24, "inputType": "TEXT"}
    ]));
    let filled = run(
        &src,
        &list,
        &values(json!({"sig": "https://unreachable.invalid/sig.png", "name": "Ada"})),
    );
    assert_eq!(filled.report.failed, 1);
    assert_eq!(filled.report.drawn, 1);
    assert!(Document::load_mem(&filled.bytes).is_ok());
    assert!(!page_ops(&filled.bytes, 1).iter().any(|o| o.operator == "Do"));
    assert_eq!(overlay_text_count(&filled.bytes, 1), 1);
}

#[test]
fn image_is_contained_and_centered() {
    let src = blank_pdf(&[792.0]);
    let list = fields(json!([
        {"id": 1, "slug": "photo", "pageNumber": 1, "xCoord": 100, "yCoord": 100,
         "width": 100, "height": 100, "inputType": "IMAGE"}
    ]));
    let filled = run(&src, &list, &values(json!({"photo": png_data_url(40, 20)})));
    assert_eq!(filled.report.drawn, 1);

    let ops = page_ops(&filled.bytes, 1);
    let draw = ops.iter().position(|o| o.operator == "Do").unwrap();
    let cm = &ops[draw - 1];
    assert_eq!(cm.operator, "cm");
    // Box bottom is 792 - 100 - 100 = 592; a 2:1 image is 100x50 centered.
    assert_eq!(operands(cm), vec![100.0, 0.0, 0.0, 50.0, 100.0, 617.0]);

    let doc = Document::load_mem(&filled.bytes).unwrap();
    let page = doc.get_dictionary(doc.get_pages()[&1]).unwrap();
    let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
    let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
    let (_, image_ref) = xobjects.iter().next().unwrap();
    let image = doc.get_object(image_ref.as_reference().unwrap()).unwrap().as_stream().unwrap();
    assert!(image.dict.has(b"SMask"), "alpha channel goes to a soft mask");
}

#[test]
fn undecodable_image_is_skipped() {
    let src = blank_pdf(&[792.0]);
    let list = fields(json!([
        {"id": 1, "slug": "photo", "pageNumber": 1, "xCoord": 0, "yCoord": 0,
         "width": 10, "height": 10, "inputType": "IMAGE"}
    ]));
    let filled = run(&src, &list, &values(json!({"photo": "data:image/png;base64,AAAA"})));
    assert_eq!(filled.report.failed, 1);
}

#[test]
fn overrides_and_calibration_move_the_box() {
    let src = blank_pdf(&[792.0]);
    let list = fields(json!([
        {"id": "f1", "slug": "name", "pageNumber": 1, "xCoord": 100, "yCoord": 100,
         "width": 200, "height": 20, "inputType": "TEXT", "fontSize": 10}
    ]));
    let vals = values(json!({"name": "Ada"}));

    let mut overrides = PositionOverrides::new();
    overrides.insert("f1".into(), PositionOverride { x: 50.0, y: 200.0 });
    let filled = run_with(&src, &list, &vals, &overrides, &CalibrationConfig::IDENTITY);
    assert_eq!(td_positions(&filled.bytes, 1), vec![(50.0, 574.0)]);

    let calibration = CalibrationConfig { preview_offset: Offset::ZERO, pdf_offset: Offset::new(2.0, 4.0) };
    let filled = run_with(&src, &list, &vals, &PositionOverrides::new(), &calibration);
    // Calibration moves the box down the page by dy before the flip.
    assert_eq!(td_positions(&filled.bytes, 1), vec![(102.0, 670.0)]);
}

#[test]
fn fields_draw_in_list_order() {
    let src = blank_pdf(&[792.0]);
    let list = fields(json!([
        {"id": 1, "slug": "b", "pageNumber": 1, "xCoord": 10, "yCoord": 10, "zIndex": 9,
         "width": 100, "height": 20, "inputType": "TEXT"},
        {"id": 2, "slug": "a", "pageNumber": 1, "xCoord": 20, "yCoord": 10, "zIndex": 1,
         "width": 100, "height": 20, "inputType": "TEXT"}
    ]));
    let filled = run(&src, &list, &values(json!({"a": "A", "b": "B"})));
    let xs: Vec<f64> = td_positions(&filled.bytes, 1).into_iter().map(|(x, _)| x).collect();
    assert_eq!(xs, vec![10.0, 20.0]);
}

#[test]
fn original_content_is_isolated_from_the_overlay() {
    let src = blank_pdf(&[792.0]);
    let list = fields(json!([
        {"id": 1, "slug": "x", "pageNumber": 1, "xCoord": 10, "yCoord": 10,
         "width": 20, "height": 20, "inputType": "ICON", "iconVariant": "star"}
    ]));
    let filled = run(&src, &list, &values(json!({"x": "yes"})));
    let ops: Vec<String> = page_ops(&filled.bytes, 1).into_iter().map(|o| o.operator).collect();
    assert_eq!(ops.first().map(String::as_str), Some("q"));
    let original_end = ops.iter().position(|o| o == "ET").unwrap();
    assert_eq!(ops[original_end + 1], "Q");
    assert_eq!(ops.iter().filter(|o| *o == "S").count(), 10);
}

#[test]
fn unreadable_source_is_fatal() {
    let fetcher = FakeFetcher::default();
    let engine = FillEngine::new(&CalibrationConfig::IDENTITY, &fetcher);
    assert!(engine.fill(b"%PDF-1.4 garbage", &[], &HashMap::new(), &PositionOverrides::new()).is_err());
}

#[test]
fn standard_fonts_are_registered_once_per_page() {
    let src = blank_pdf(&[792.0]);
    let list = fields(json!([
        {"id": 1, "slug": "a", "pageNumber": 1, "xCoord": 10, "yCoord": 10,
         "width": 100, "height": 20, "inputType": "TEXT", "fontFamily": "Times New Roman",
         "fontWeight": "bold"},
        {"id": 2, "slug": "b", "pageNumber": 1, "xCoord": 10, "yCoord": 40,
         "width": 100, "height": 20, "inputType": "TEXT", "fontFamily": "Comic Sans"}
    ]));
    let filled = run(&src, &list, &values(json!({"a": "A", "b": "B"})));
    let doc = Document::load_mem(&filled.bytes).unwrap();
    let page = doc.get_dictionary(doc.get_pages()[&1]).unwrap();
    let fonts = page
        .get(b"Resources")
        .and_then(Object::as_dict)
        .unwrap()
        .get(b"Font")
        .and_then(Object::as_dict)
        .unwrap();
    let base_fonts: Vec<Vec<u8>> = fonts
        .iter()
        .map(|(_, r)| {
            let d = doc.get_dictionary(r.as_reference().unwrap()).unwrap();
            d.get(b"BaseFont").unwrap().as_name().unwrap().to_vec()
        })
        .collect();
    assert_eq!(base_fonts.len(), 3);
    assert!(base_fonts.contains(&b"Times-Bold".to_vec()));
    assert!(base_fonts.contains(&b"Helvetica".to_vec()));
}

/// A one-page source whose Contents is a reference to an array of two streams.
fn split_content_pdf() -> Vec<u8> {
    let mut doc = Document::load_mem(&blank_pdf(&[792.0])).unwrap();
    let page_id = doc.get_pages()[&1];
    let original = doc.get_dictionary(page_id).unwrap().get(b"Contents").unwrap().clone();
    let extra = doc.add_object(Stream::new(dictionary! {}, b"BT /F1 12 Tf 72 90 Td (footer) Tj ET".to_vec()));
    let array_id = doc.add_object(vec![original, Object::from(extra)]);
    doc.get_object_mut(page_id).unwrap().as_dict_mut().unwrap().set("Contents", array_id);
    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

#[test]
fn indirect_content_arrays_are_spliced() {
    let src = split_content_pdf();
    let list = fields(json!([
        {"id": 1, "slug": "name", "pageNumber": 1, "xCoord": 100, "yCoord": 100,
         "width": 200, "height": 24, "inputType": "TEXT"}
    ]));
    let filled = run(&src, &list, &values(json!({"name": "Ada"})));

    let doc = Document::load_mem(&filled.bytes).unwrap();
    let page = doc.get_dictionary(doc.get_pages()[&1]).unwrap();
    let contents = page.get(b"Contents").unwrap().as_array().unwrap();
    assert_eq!(contents.len(), 5);
    for entry in contents {
        let id = entry.as_reference().unwrap();
        assert!(doc.get_object(id).unwrap().as_stream().is_ok(), "contents must only hold streams");
    }

    let text = page_text(&filled.bytes, 1);
    assert!(text.contains("(page 1)"));
    assert!(text.contains("(footer)"));
    assert!(text.contains("(Ada)"));
    let ops: Vec<String> = page_ops(&filled.bytes, 1).into_iter().map(|o| o.operator).collect();
    assert_eq!(ops.first().map(String::as_str), Some("q"));
}

#[test]
fn refilling_keeps_earlier_images() {
    let src = blank_pdf(&[792.0]);
    let photo = |slug: &str| {
        fields(json!([
            {"id": slug, "slug": slug, "pageNumber": 1, "xCoord": 100, "yCoord": 100,
             "width": 100, "height": 100, "inputType": "IMAGE"}
        ]))
    };
    let first = run(&src, &photo("a"), &values(json!({"a": png_data_url(10, 10)})));
    let second = run(&first.bytes, &photo("b"), &values(json!({"b": png_data_url(7, 3)})));
    assert_eq!(second.report.drawn, 1);

    let doc = Document::load_mem(&second.bytes).unwrap();
    let page = doc.get_dictionary(doc.get_pages()[&1]).unwrap();
    let xobjects = page
        .get(b"Resources")
        .and_then(Object::as_dict)
        .unwrap()
        .get(b"XObject")
        .and_then(Object::as_dict)
        .unwrap();
    assert_eq!(xobjects.len(), 2);

    let widths: Vec<i64> = page_ops(&second.bytes, 1)
        .iter()
        .filter(|o| o.operator == "Do")
        .map(|o| {
            let id = xobjects.get(o.operands[0].as_name().unwrap()).unwrap().as_reference().unwrap();
            let image = doc.get_object(id).unwrap().as_stream().unwrap();
            image.dict.get(b"Width").unwrap().as_i64().unwrap()
        })
        .collect();
    assert_eq!(widths, vec![10, 7]);
}
