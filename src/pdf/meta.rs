//! Page counting and page geometry lookups

use std::path::Path;

use lopdf::{Document, Object, ObjectId};

use crate::error::{Error, Result};

/// US Letter fallback when a page carries no resolvable MediaBox
const LETTER: (f64, f64) = (612.0, 792.0);

/// Count pages by reading the Count field from the Pages dictionary.
/// More reliable than walking get_pages() for documents with nested page
/// trees.
fn count_pages_from_catalog(doc: &Document) -> Result<usize> {
    let catalog_ref = doc
        .trailer
        .get(b"Root")
        .map_err(|_| Error::General("No Root in trailer".to_string()))?;

    let catalog_id = match catalog_ref {
        Object::Reference(id) => *id,
        _ => return Err(Error::General("Root is not a reference".to_string())),
    };

    let catalog_dict = match doc.get_object(catalog_id)? {
        Object::Dictionary(dict) => dict,
        _ => return Err(Error::General("Catalog is not a dictionary".to_string())),
    };

    let pages_id = match catalog_dict.get(b"Pages") {
        Ok(Object::Reference(id)) => *id,
        _ => return Err(Error::General("No Pages reference in catalog".to_string())),
    };

    let pages_dict = match doc.get_object(pages_id)? {
        Object::Dictionary(dict) => dict,
        _ => return Err(Error::General("Pages is not a dictionary".to_string())),
    };

    match pages_dict.get(b"Count") {
        Ok(Object::Integer(n)) => Ok(*n as usize),
        _ => Err(Error::General("No Count in Pages".to_string())),
    }
}

/// Count the number of pages in a PDF file
pub fn count_pages(path: &Path) -> Result<usize> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;
    let page_count = count_pages_from_catalog(&doc)?;

    if page_count == 0 {
        return Err(Error::EmptyPdf(path.to_path_buf()));
    }

    Ok(page_count)
}

/// Width and height of a page in PDF points.
///
/// Looks up the page's MediaBox, walking Parent links for inherited
/// attributes; falls back to US Letter when nothing resolves. The stamper
/// needs the real page size because fractional coordinates are mapped into
/// page units, not preview pixels.
pub fn page_size(doc: &Document, page_id: ObjectId) -> (f64, f64) {
    let mut current = Some(page_id);

    // Bounded walk to survive malformed cyclic Parent chains
    for _ in 0..32 {
        let Some(id) = current else { break };
        let Ok(Object::Dictionary(dict)) = doc.get_object(id) else {
            break;
        };

        if let Some(size) = media_box_size(doc, dict.get(b"MediaBox").ok()) {
            return size;
        }

        current = match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => Some(*parent_id),
            _ => None,
        };
    }

    LETTER
}

fn media_box_size(doc: &Document, obj: Option<&Object>) -> Option<(f64, f64)> {
    let resolved = match obj? {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        direct => direct,
    };

    let arr = match resolved {
        Object::Array(arr) if arr.len() == 4 => arr,
        _ => return None,
    };

    let mut values = [0.0f64; 4];
    for (slot, item) in values.iter_mut().zip(arr) {
        *slot = match item {
            Object::Integer(n) => *n as f64,
            Object::Real(r) => f64::from(*r),
            _ => return None,
        };
    }

    let width = (values[2] - values[0]).abs();
    let height = (values[3] - values[1]).abs();
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    Some((width, height))
}
