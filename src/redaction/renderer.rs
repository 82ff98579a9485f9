//! Opaque-rectangle overlay rendering.
//!
//! Matched boxes arrive in text-extraction space and are translated here,
//! page by page, before anything is drawn; this module owns the only
//! call site of [`to_render_space`]. Each touched page gets one extra
//! content stream appended after its existing content: a saved graphics
//! state, a solid fill color, and one `re`/`f` pair per rectangle, so the
//! rectangles paint over whatever the page already shows. Overlapping
//! rectangles simply deepen the same coverage.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream};
use log::debug;

use crate::error::{BlackoutError, BlackoutResult};
use crate::geometry::{to_render_space, RenderSpaceBox};
use crate::matcher::MatchSet;

/// Draws one filled rectangle per matched box onto its page. Returns the
/// number of rectangles drawn.
pub fn draw_redactions(
    doc: &mut Document,
    matches: &MatchSet,
    fill_color: (f32, f32, f32),
) -> BlackoutResult<usize> {
    let pages = doc.get_pages();
    let mut drawn = 0;

    for page_matches in &matches.pages {
        if page_matches.boxes.is_empty() {
            continue;
        }
        let Some(page_id) = pages.get(&page_matches.page).copied() else {
            return Err(BlackoutError::Render {
                page: page_matches.page,
                reason: "page not present in open document".to_string(),
            });
        };

        let boxes: Vec<RenderSpaceBox> = page_matches
            .boxes
            .iter()
            .map(|b| to_render_space(*b, page_matches.height))
            .collect();

        debug!(
            "page {}: drawing {} rectangle(s)",
            page_matches.page,
            boxes.len()
        );

        let content = rectangle_content(&boxes, fill_color).map_err(|reason| {
            BlackoutError::Render {
                page: page_matches.page,
                reason,
            }
        })?;
        append_page_content(doc, page_id, content).map_err(|reason| BlackoutError::Render {
            page: page_matches.page,
            reason,
        })?;
        drawn += boxes.len();
    }

    Ok(drawn)
}

/// Builds the overlay content stream: `q`, fill color, `re f` per box, `Q`.
fn rectangle_content(
    boxes: &[RenderSpaceBox],
    (r, g, b): (f32, f32, f32),
) -> Result<Vec<u8>, String> {
    let mut operations = vec![
        Operation::new("q", vec![]),
        Operation::new("rg", vec![r.into(), g.into(), b.into()]),
    ];
    for rect in boxes {
        operations.push(Operation::new(
            "re",
            vec![
                (rect.x as f32).into(),
                (rect.y as f32).into(),
                (rect.width as f32).into(),
                (rect.height as f32).into(),
            ],
        ));
        operations.push(Operation::new("f", vec![]));
    }
    operations.push(Operation::new("Q", vec![]));

    Content { operations }
        .encode()
        .map_err(|e| format!("failed to encode overlay content: {e}"))
}

/// Appends an overlay stream after the page's existing content, keeping
/// whatever shape `Contents` already has.
fn append_page_content(
    doc: &mut Document,
    page_id: ObjectId,
    content: Vec<u8>,
) -> Result<(), String> {
    let overlay_id = doc.add_object(Stream::new(lopdf::Dictionary::new(), content));

    // A page whose Contents is an inline stream needs that stream hoisted
    // into its own object before both can sit in an array.
    let existing = {
        let page = doc
            .get_dictionary(page_id)
            .map_err(|e| format!("failed to read page dictionary: {e}"))?;
        page.get(b"Contents").ok().cloned()
    };

    let contents = match existing {
        Some(Object::Reference(existing_id)) => Object::Array(vec![
            Object::Reference(existing_id),
            Object::Reference(overlay_id),
        ]),
        Some(Object::Array(mut items)) => {
            items.push(Object::Reference(overlay_id));
            Object::Array(items)
        }
        Some(inline @ Object::Stream(_)) => {
            let hoisted_id = doc.add_object(inline);
            Object::Array(vec![
                Object::Reference(hoisted_id),
                Object::Reference(overlay_id),
            ])
        }
        // No existing content: the overlay is the content.
        _ => Object::Reference(overlay_id),
    };

    let page = doc
        .get_object_mut(page_id)
        .map_err(|e| format!("failed to reopen page dictionary: {e}"))?;
    match page {
        Object::Dictionary(dict) => {
            dict.set("Contents", contents);
            Ok(())
        }
        _ => Err("page object is not a dictionary".to_string()),
    }
}
