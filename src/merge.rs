//! Document assembly: append-only page concatenation.
//!
//! Every input is loaded before any output is built, so a bad document in
//! the middle of the list fails the whole request with nothing emitted.
//! Assembly renumbers each source's objects above a running maximum,
//! collects page objects in input order, and synthesizes a fresh page
//! tree and catalog over them.

use lopdf::{Dictionary, Document, Object, ObjectId};
use log::{debug, info};

use crate::error::{BlackoutError, BlackoutResult};
use crate::source::SourceUrl;

/// Merges already-fetched documents into one, preserving the order of
/// inputs and of pages within each input.
///
/// All-or-nothing: a document that fails to load aborts the merge with an
/// error naming its source identifier, and no partial output exists.
pub fn merge_documents(inputs: &[(SourceUrl, Vec<u8>)]) -> BlackoutResult<Vec<u8>> {
    if inputs.is_empty() {
        return Err(BlackoutError::invalid_request("no documents to merge"));
    }

    // Open every input in import mode before building anything.
    let mut documents = Vec::with_capacity(inputs.len());
    for (source, bytes) in inputs {
        let doc = Document::load_mem(bytes).map_err(|e| BlackoutError::Parse {
            source_id: source.to_string(),
            reason: e.to_string(),
        })?;
        debug!("loaded {source} with {} page(s)", doc.get_pages().len());
        documents.push(doc);
    }

    let mut output = Document::with_version("1.5");
    let mut max_id: u32 = 1;
    // (id, page object) in final page order; object map for everything else.
    let mut page_objects: Vec<(ObjectId, Object)> = Vec::new();
    let mut other_objects: Vec<(ObjectId, Object)> = Vec::new();

    for mut doc in documents {
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        for page_id in &page_ids {
            if let Ok(page) = doc.get_object(*page_id) {
                page_objects.push((*page_id, page.clone()));
            }
        }

        for (object_id, object) in doc.objects {
            // The old page-tree plumbing is rebuilt from scratch; pages
            // themselves were captured above in order.
            if is_page_tree_object(&object) {
                continue;
            }
            other_objects.push((object_id, object));
        }
    }

    for (object_id, object) in other_objects {
        output.objects.insert(object_id, object);
    }

    // Copied objects occupy ids below `max_id`; start fresh ids above them.
    output.max_id = max_id;
    let pages_id = output.new_object_id();
    let kids: Vec<Object> = page_objects
        .iter()
        .map(|(id, _)| Object::Reference(*id))
        .collect();
    let page_count = page_objects.len();

    for (object_id, object) in page_objects {
        if let Object::Dictionary(dict) = object {
            let mut reparented = dict;
            reparented.set("Parent", Object::Reference(pages_id));
            output
                .objects
                .insert(object_id, Object::Dictionary(reparented));
        }
    }

    let mut pages_dict = Dictionary::new();
    pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
    pages_dict.set("Kids", Object::Array(kids));
    pages_dict.set("Count", Object::Integer(page_count as i64));
    output
        .objects
        .insert(pages_id, Object::Dictionary(pages_dict));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = output.add_object(catalog);
    output.trailer.set("Root", Object::Reference(catalog_id));

    output.max_id = output.objects.len() as u32;
    output.renumber_objects();
    output.compress();

    let mut bytes = Vec::new();
    output
        .save_to(&mut bytes)
        .map_err(|e| BlackoutError::Serialization {
            reason: e.to_string(),
        })?;

    info!("merged {} input(s) into {page_count} page(s)", inputs.len());
    Ok(bytes)
}

/// Page-tree objects are rebuilt, not copied: Catalog, Pages, Page, and
/// outline nodes whose targets would dangle.
fn is_page_tree_object(object: &Object) -> bool {
    const REBUILT: [&[u8]; 5] = [b"Catalog", b"Pages", b"Page", b"Outlines", b"Outline"];
    let type_name = match object {
        Object::Dictionary(dict) => dict.get(b"Type").ok().and_then(|o| o.as_name().ok()),
        Object::Stream(stream) => stream.dict.get(b"Type").ok().and_then(|o| o.as_name().ok()),
        _ => None,
    };
    type_name.map_or(false, |name| REBUILT.contains(&name))
}
