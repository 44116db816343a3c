//! Integration tests for the pdf-rotulos library

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use pdf_rotulos::coords::{CalibrationTable, CoordinateRecord};
use pdf_rotulos::grid::{plan_coupons, CouponKey, GridOptions};
use pdf_rotulos::pdf::{count_pages, stamp_times, StampOptions};
use pdf_rotulos::schedule::{assign, ScheduleParams};
use pdf_rotulos::session::Session;
use pdf_rotulos::Error;

/// Write a minimal PDF with the given number of Letter-sized pages
fn write_fixture_pdf(page_count: usize, path: &Path) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for i in 0..page_count {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![100.into(), 700.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::string_literal(format!("Page {}", i + 1))],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_count as i64,
        "Resources" => resources_id,
    };
    doc.objects
        .insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).expect("save fixture PDF");
}

/// Count the annotations on each page of a saved document
fn annotation_counts(path: &Path) -> Vec<usize> {
    let doc = Document::load(path).expect("load stamped PDF");
    let mut counts = Vec::new();

    for (_num, page_id) in doc.get_pages() {
        let Object::Dictionary(page) = doc.get_object(page_id).expect("page object") else {
            panic!("page is not a dictionary");
        };
        let count = match page.get(b"Annots") {
            Ok(Object::Array(arr)) => arr.len(),
            Ok(Object::Reference(id)) => match doc.get_object(*id) {
                Ok(Object::Array(arr)) => arr.len(),
                _ => 0,
            },
            _ => 0,
        };
        counts.push(count);
    }

    counts
}

fn fixture_in(dir: &TempDir, pages: usize) -> PathBuf {
    let path = dir.path().join("fixture.pdf");
    write_fixture_pdf(pages, &path);
    path
}

#[test]
fn test_count_pages_fixture() {
    let dir = TempDir::new().expect("temp dir");
    let input = fixture_in(&dir, 3);

    assert_eq!(count_pages(&input).expect("count pages"), 3);
}

#[test]
fn test_stamp_full_schedule() {
    let dir = TempDir::new().expect("temp dir");
    let input = fixture_in(&dir, 2);
    let output = dir.path().join("stamped.pdf");

    let mut coupons = plan_coupons(2, &GridOptions::default());
    assign(&mut coupons, &ScheduleParams::default(), 2).expect("schedule");

    let stamped = stamp_times(
        &input,
        &output,
        &coupons,
        &CalibrationTable::new(),
        &StampOptions::default(),
    )
    .expect("stamp");

    assert_eq!(stamped, 24);
    assert!(output.exists());

    // Two annotations per coupon (HE and HV slots)
    assert_eq!(annotation_counts(&output), vec![24, 24]);
}

#[test]
fn test_stamp_respects_last_page_truncation() {
    let dir = TempDir::new().expect("temp dir");
    let input = fixture_in(&dir, 2);
    let output = dir.path().join("stamped.pdf");

    let mut coupons = plan_coupons(2, &GridOptions::default());
    let params = ScheduleParams {
        last_page_count: 5,
        ..Default::default()
    };
    assign(&mut coupons, &params, 2).expect("schedule");

    let stamped = stamp_times(
        &input,
        &output,
        &coupons,
        &CalibrationTable::new(),
        &StampOptions::default(),
    )
    .expect("stamp");

    assert_eq!(stamped, 17);
    assert_eq!(annotation_counts(&output), vec![24, 10]);
}

#[test]
fn test_stamp_skips_out_of_range_pages() {
    let dir = TempDir::new().expect("temp dir");
    let input = fixture_in(&dir, 2);
    let output = dir.path().join("stamped.pdf");

    // Coupon set planned for 3 pages against a 2-page document
    let mut coupons = plan_coupons(3, &GridOptions::default());
    assign(&mut coupons, &ScheduleParams::default(), 3).expect("schedule");

    let stamped = stamp_times(
        &input,
        &output,
        &coupons,
        &CalibrationTable::new(),
        &StampOptions::default(),
    )
    .expect("stamp should tolerate over-produced coupons");

    // Page 3 coupons are skipped, the rest stamp normally
    assert_eq!(stamped, 24);
    assert_eq!(annotation_counts(&output), vec![24, 24]);
}

#[test]
fn test_stamp_without_labels_writes_nothing() {
    let dir = TempDir::new().expect("temp dir");
    let input = fixture_in(&dir, 1);
    let output = dir.path().join("stamped.pdf");

    let coupons = plan_coupons(1, &GridOptions::default());

    let result = stamp_times(
        &input,
        &output,
        &coupons,
        &CalibrationTable::new(),
        &StampOptions::default(),
    );

    assert!(matches!(result, Err(Error::NothingToStamp)));
    assert!(!output.exists(), "no output file on failure");
}

#[test]
fn test_stamp_uses_calibration_overrides() {
    let dir = TempDir::new().expect("temp dir");
    let input = fixture_in(&dir, 1);
    let output = dir.path().join("stamped.pdf");

    let mut coupons = plan_coupons(1, &GridOptions::default());
    let params = ScheduleParams {
        last_page_count: 1,
        ..Default::default()
    };
    assign(&mut coupons, &params, 1).expect("schedule");

    let mut table = CalibrationTable::new();
    table.set(
        CouponKey::new(1, 1),
        CoordinateRecord::new(0.5, 0.75, 0.5),
    );

    stamp_times(&input, &output, &coupons, &table, &StampOptions::default()).expect("stamp");

    // Page is 612x792; the HE annotation must sit at the overridden x/y
    let doc = Document::load(&output).expect("load stamped PDF");
    let (_, page_id) = doc.get_pages().into_iter().next().expect("page");
    let Object::Dictionary(page) = doc.get_object(page_id).expect("page object") else {
        panic!("page is not a dictionary");
    };
    let Ok(Object::Array(annots)) = page.get(b"Annots") else {
        panic!("missing Annots");
    };
    assert_eq!(annots.len(), 2);

    let Object::Reference(first_id) = annots[0] else {
        panic!("Annots entry is not a reference");
    };
    let Object::Dictionary(annot) = doc.get_object(first_id).expect("annotation") else {
        panic!("annotation is not a dictionary");
    };
    let Ok(Object::Array(rect)) = annot.get(b"Rect") else {
        panic!("missing Rect");
    };
    let x1 = match rect[0] {
        Object::Real(r) => f64::from(r),
        Object::Integer(n) => n as f64,
        _ => panic!("unexpected Rect entry"),
    };
    let y1 = match rect[1] {
        Object::Real(r) => f64::from(r),
        Object::Integer(n) => n as f64,
        _ => panic!("unexpected Rect entry"),
    };
    assert!((x1 - 306.0).abs() < 0.01, "x1 = {x1}");
    assert!((y1 - 390.0).abs() < 0.01, "y1 = {y1}");
}

#[test]
fn test_session_generate_output() {
    let dir = TempDir::new().expect("temp dir");
    let input = fixture_in(&dir, 1);

    // Supply pre-rendered pages so the session does not need a renderer
    let pages = vec![image::RgbaImage::from_pixel(
        800,
        1000,
        image::Rgba([255, 255, 255, 255]),
    )];
    let mut session = Session::from_pages(&input, pages, GridOptions::default());
    session
        .apply_schedule(&ScheduleParams::default())
        .expect("schedule");
    session.set_override(
        CouponKey::new(1, 2),
        CoordinateRecord::new(0.6, 0.74, 0.15),
    );

    let out_dir = dir.path().join("out");
    let path = session.generate_output(&out_dir).expect("generate output");

    assert!(path.exists());
    assert!(path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("rotulos_con_horas_") && n.ends_with(".pdf")));
    assert_eq!(annotation_counts(&path), vec![24]);
}

#[test]
fn test_schedule_and_stamp_are_deterministic() {
    let dir = TempDir::new().expect("temp dir");
    let input = fixture_in(&dir, 2);

    let mut first = plan_coupons(2, &GridOptions::default());
    let mut second = plan_coupons(2, &GridOptions::default());
    let params = ScheduleParams {
        start_time: "22:50".to_string(),
        increment_minutes: 30,
        group_size: 4,
        last_page_count: 9,
    };

    assign(&mut first, &params, 2).expect("schedule");
    assign(&mut second, &params, 2).expect("schedule");

    let labels: Vec<&str> = first.iter().map(|c| c.time_label.as_str()).collect();
    let expected: Vec<&str> = second.iter().map(|c| c.time_label.as_str()).collect();
    assert_eq!(labels, expected);

    // Wraparound past midnight lands back at low hours
    assert_eq!(first[16].time_label, "00:50");

    let out_a = dir.path().join("a.pdf");
    let out_b = dir.path().join("b.pdf");
    let table = CalibrationTable::new();
    let stamped_a =
        stamp_times(&input, &out_a, &first, &table, &StampOptions::default()).expect("stamp a");
    let stamped_b =
        stamp_times(&input, &out_b, &second, &table, &StampOptions::default()).expect("stamp b");
    assert_eq!(stamped_a, stamped_b);
    assert_eq!(annotation_counts(&out_a), annotation_counts(&out_b));
}
