//! Burning time labels into the source PDF as FreeText annotations
//!
//! Every labeled coupon gets two annotations: one at the HE slot and one at
//! the HV slot, at the same vertical offset. Fractional coordinates are
//! mapped into the page's own MediaBox units, never preview pixel sizes.
//! The document is saved once, after every annotation succeeded; a failure
//! part-way through leaves no output file behind.

use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::coords::{resolve, CalibrationTable};
use crate::error::{Error, Result};
use crate::grid::Coupon;
use crate::pdf::meta::page_size;

/// Options for the stamped annotations
#[derive(Debug, Clone)]
pub struct StampOptions {
    /// Annotation font size in points
    pub font_size: f64,
    /// Annotation rectangle width in points
    pub text_width: f64,
    /// Annotation rectangle height in points
    pub text_height: f64,
}

impl Default for StampOptions {
    fn default() -> Self {
        Self {
            font_size: 8.0,
            text_width: 35.0,
            text_height: 12.0,
        }
    }
}

/// Stamp every labeled coupon's time into the document.
///
/// Coupons whose page index is out of range for the document are skipped
/// without error (the planner may over-produce when the grid options do not
/// match the document). Returns the number of coupons stamped.
pub fn stamp_times(
    input_path: &Path,
    output_path: &Path,
    coupons: &[Coupon],
    table: &CalibrationTable,
    options: &StampOptions,
) -> Result<usize> {
    if !input_path.exists() {
        return Err(Error::FileNotFound(input_path.to_path_buf()));
    }
    if !coupons.iter().any(Coupon::has_label) {
        return Err(Error::NothingToStamp);
    }

    let mut doc = Document::load(input_path)?;
    let pages = doc.get_pages();

    let mut stamped = 0usize;
    for coupon in coupons {
        if !coupon.has_label() {
            continue;
        }

        let Some(&page_id) = pages.get(&coupon.page()) else {
            // Coupon beyond the document's page range; tolerated
            continue;
        };

        let (page_width, page_height) = page_size(&doc, page_id);
        let record = resolve(coupon, table);

        // Fractional y is measured from the top; PDF user space grows upward
        let y_center = page_height * (1.0 - record.y);
        let x_he = page_width * record.he_x;
        let x_hv = page_width * record.hv_x;

        for x in [x_he, x_hv] {
            let annotation_id =
                add_time_annotation(&mut doc, &coupon.time_label, x, y_center, options);
            attach_annotation(&mut doc, page_id, annotation_id).map_err(|e| {
                Error::Stamping(format!(
                    "cannot annotate page {} for coupon {}: {e}",
                    coupon.page(),
                    coupon.key.display_id()
                ))
            })?;
        }

        stamped += 1;
    }

    if stamped == 0 {
        return Err(Error::NothingToStamp);
    }

    doc.save(output_path)
        .map_err(|e| Error::Stamping(format!("cannot save output: {e}")))?;

    Ok(stamped)
}

/// Create a FreeText annotation object holding one time string
fn add_time_annotation(
    doc: &mut Document,
    text: &str,
    x: f64,
    y_center: f64,
    options: &StampOptions,
) -> ObjectId {
    let half_height = options.text_height / 2.0;

    let mut annotation = Dictionary::new();
    annotation.set("Type", Object::Name(b"Annot".to_vec()));
    annotation.set("Subtype", Object::Name(b"FreeText".to_vec()));
    annotation.set(
        "Rect",
        Object::Array(vec![
            Object::Real(x as f32),
            Object::Real((y_center - half_height) as f32),
            Object::Real((x + options.text_width) as f32),
            Object::Real((y_center + half_height) as f32),
        ]),
    );
    annotation.set(
        "Contents",
        Object::String(text.as_bytes().to_vec(), lopdf::StringFormat::Literal),
    );
    // Default appearance: Helvetica, black fill, no border
    annotation.set(
        "DA",
        Object::String(
            format!("/Helv {} Tf 0 g", options.font_size).into_bytes(),
            lopdf::StringFormat::Literal,
        ),
    );
    annotation.set(
        "Border",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(0),
        ]),
    );
    // Print flag so the stamp survives printing
    annotation.set("F", Object::Integer(4));

    doc.add_object(Object::Dictionary(annotation))
}

/// Append an annotation reference to the page's Annots array, creating the
/// array or converting a single reference as needed
fn attach_annotation(doc: &mut Document, page_id: ObjectId, annotation_id: ObjectId) -> Result<()> {
    // An Annots entry may be an indirect reference to the array; resolve it
    // first to avoid clobbering shared objects
    let existing = {
        let page_obj = doc.get_object(page_id)?;
        let Object::Dictionary(page_dict) = page_obj else {
            return Err(Error::General("page object is not a dictionary".to_string()));
        };
        match page_dict.get(b"Annots") {
            Ok(Object::Array(arr)) => Some(arr.clone()),
            Ok(Object::Reference(ref_id)) => match doc.get_object(*ref_id) {
                Ok(Object::Array(arr)) => Some(arr.clone()),
                _ => None,
            },
            _ => None,
        }
    };

    let mut annots = existing.unwrap_or_default();
    annots.push(Object::Reference(annotation_id));

    let page_obj = doc.get_object_mut(page_id)?;
    if let Object::Dictionary(ref mut page_dict) = page_obj {
        page_dict.set("Annots", Object::Array(annots));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{plan_coupons, GridOptions};

    #[test]
    fn test_nothing_to_stamp_without_labels() {
        let coupons = plan_coupons(1, &GridOptions::default());
        let result = stamp_times(
            Path::new("tests/does-not-matter.pdf"),
            Path::new("/tmp/out.pdf"),
            &coupons,
            &CalibrationTable::new(),
            &StampOptions::default(),
        );
        // Missing file is reported before the label check
        assert!(result.is_err());
    }

    #[test]
    fn test_annotation_geometry() {
        let mut doc = Document::with_version("1.5");
        let options = StampOptions::default();
        let id = add_time_annotation(&mut doc, "08:15", 100.0, 400.0, &options);

        let Object::Dictionary(dict) = doc.get_object(id).unwrap() else {
            panic!("annotation is not a dictionary");
        };
        assert_eq!(dict.get(b"Subtype").unwrap().as_name().unwrap(), b"FreeText");

        let Object::Array(rect) = dict.get(b"Rect").unwrap() else {
            panic!("missing Rect");
        };
        let values: Vec<f32> = rect
            .iter()
            .map(|o| match o {
                Object::Real(r) => *r,
                Object::Integer(n) => *n as f32,
                _ => panic!("unexpected Rect entry"),
            })
            .collect();
        assert_eq!(values, vec![100.0, 394.0, 135.0, 406.0]);

        let contents = dict.get(b"Contents").unwrap().as_str().unwrap();
        assert_eq!(contents, b"08:15");
    }

    #[test]
    fn test_attach_annotation_creates_and_extends_array() {
        let mut doc = Document::with_version("1.5");
        let page_id = doc.add_object(Object::Dictionary(Dictionary::new()));
        let options = StampOptions::default();

        let first = add_time_annotation(&mut doc, "08:00", 50.0, 700.0, &options);
        attach_annotation(&mut doc, page_id, first).unwrap();
        let second = add_time_annotation(&mut doc, "08:05", 90.0, 700.0, &options);
        attach_annotation(&mut doc, page_id, second).unwrap();

        let Object::Dictionary(page) = doc.get_object(page_id).unwrap() else {
            panic!("page is not a dictionary");
        };
        let Object::Array(annots) = page.get(b"Annots").unwrap() else {
            panic!("missing Annots array");
        };
        assert_eq!(annots.len(), 2);
    }
}
