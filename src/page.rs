//! Page-level helpers shared by extraction and rendering.
//!
//! Both stages need the page's MediaBox: extraction flips device Y against
//! the page height to produce top-left-origin boxes, and the renderer flips
//! translated boxes back onto the drawing surface.

use lopdf::{Dictionary, Document, Object, ObjectId};

/// US Letter, the fallback when a page carries no resolvable MediaBox.
const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Follows one level of indirection if `obj` is a reference.
pub(crate) fn resolve_ref<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    if let Ok(id) = obj.as_reference() {
        doc.get_object(id).unwrap_or(obj)
    } else {
        obj
    }
}

/// Reads a PDF number (Integer or Real) as f64.
pub(crate) fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

/// Resolves a page's MediaBox as `[llx, lly, urx, ury]`, walking up the
/// page tree through `Parent` when the page itself carries none. The walk
/// is depth-limited so a malformed circular tree cannot loop forever.
pub fn media_box(doc: &Document, page_id: ObjectId) -> [f64; 4] {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return DEFAULT_MEDIA_BOX;
    };
    media_box_of_dict(doc, page, 10)
}

fn media_box_of_dict(doc: &Document, dict: &Dictionary, depth: usize) -> [f64; 4] {
    if depth == 0 {
        return DEFAULT_MEDIA_BOX;
    }

    if let Ok(obj) = dict.get(b"MediaBox") {
        if let Object::Array(values) = resolve_ref(doc, obj) {
            let nums: Vec<f64> = values.iter().filter_map(number).collect();
            if nums.len() == 4 {
                return [nums[0], nums[1], nums[2], nums[3]];
            }
        }
    }

    if let Ok(parent) = dict.get(b"Parent") {
        if let Object::Dictionary(parent_dict) = resolve_ref(doc, parent) {
            return media_box_of_dict(doc, parent_dict, depth - 1);
        }
    }

    DEFAULT_MEDIA_BOX
}

/// Page height in points, from the MediaBox.
pub fn page_height(doc: &Document, page_id: ObjectId) -> f64 {
    let [_, lly, _, ury] = media_box(doc, page_id);
    ury - lly
}
