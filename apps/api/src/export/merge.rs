//! Merging per-page PDFs into one document.
//!
//! Chrome hands back one PDF per captured layout page; this stitches them by
//! renumbering each document's objects into a shared id space, collecting
//! the page objects under a single page tree, and writing a fresh catalog.

use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};

pub fn merge_pdfs(parts: Vec<Vec<u8>>) -> Result<Vec<u8>> {
    if parts.is_empty() {
        return Err(anyhow!("nothing to merge"));
    }

    let mut max_id = 1;
    let mut pages: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for bytes in &parts {
        let mut doc = Document::load_mem(bytes)?;
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        for (_, object_id) in doc.get_pages() {
            let page = doc.get_object(object_id)?.to_owned();
            pages.insert(object_id, page);
        }
        objects.extend(doc.objects.clone());
    }

    let mut merged = Document::with_version("1.5");

    fn dict_type(object: &Object) -> &[u8] {
        object
            .as_dict()
            .ok()
            .and_then(|d| d.get(b"Type").ok())
            .and_then(|t| t.as_name().ok())
            .unwrap_or_default()
    }

    // Carry everything except the structures we rebuild below.
    let mut pages_dict: Option<(ObjectId, Dictionary)> = None;
    for (object_id, object) in objects {
        match dict_type(&object) {
            b"Catalog" | b"Outlines" | b"Outline" => {}
            b"Pages" => {
                if let Ok(dict) = object.as_dict() {
                    let mut dict = dict.clone();
                    if let Some((_, existing)) = &pages_dict {
                        dict.extend(existing);
                    }
                    pages_dict = Some((object_id, dict));
                }
            }
            b"Page" => {}
            _ => {
                merged.objects.insert(object_id, object);
            }
        }
    }

    let (pages_id, mut pages_root) =
        pages_dict.ok_or_else(|| anyhow!("no page tree in captured output"))?;

    for (object_id, object) in &pages {
        if let Ok(dict) = object.as_dict() {
            let mut dict = dict.clone();
            dict.set("Parent", pages_id);
            merged
                .objects
                .insert(*object_id, Object::Dictionary(dict));
        }
    }

    pages_root.set("Count", pages.len() as i64);
    pages_root.set(
        "Kids",
        pages
            .keys()
            .map(|id| Object::Reference(*id))
            .collect::<Vec<_>>(),
    );
    merged
        .objects
        .insert(pages_id, Object::Dictionary(pages_root));

    // Everything so far went into `objects` directly, so `max_id` is still
    // stale; bring it up to the true maximum before allocating the catalog,
    // or the catalog id collides with a carried-over object.
    merged.max_id = merged.objects.keys().map(|id| id.0).max().unwrap_or(0);

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", pages_id);
    let catalog_id = merged.add_object(catalog);
    merged.trailer.set("Root", catalog_id);

    merged.renumber_objects();
    merged.compress();

    let mut out = Vec::new();
    merged.save_to(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    use lopdf::dictionary;

    /// Minimal one-page PDF built with lopdf itself.
    fn tiny_pdf(label: &str) -> Vec<u8> {
        use lopdf::content::{Content, Operation};
        use lopdf::Stream;

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tj", vec![Object::string_literal(label)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            content.encode().unwrap(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
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

    #[test]
    fn test_merge_concatenates_pages_in_order() {
        let merged = merge_pdfs(vec![tiny_pdf("one"), tiny_pdf("two"), tiny_pdf("three")]).unwrap();
        let doc = Document::load_mem(&merged).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn test_merge_single_part_round_trips() {
        let merged = merge_pdfs(vec![tiny_pdf("only")]).unwrap();
        let doc = Document::load_mem(&merged).unwrap();
        assert_eq!(doc.get_pages().len(), 1);

        // The fresh catalog must not land on a carried-over object id; the
        // trailer root has to resolve to a Catalog pointing at a separate
        // Pages dictionary.
        let root_id = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
        let catalog = doc.get_object(root_id).unwrap().as_dict().unwrap();
        assert_eq!(catalog.get(b"Type").unwrap().as_name().unwrap(), b"Catalog");
        let pages_id = catalog.get(b"Pages").unwrap().as_reference().unwrap();
        assert_ne!(pages_id, root_id);
        let pages = doc.get_object(pages_id).unwrap().as_dict().unwrap();
        assert_eq!(pages.get(b"Type").unwrap().as_name().unwrap(), b"Pages");
    }

    #[test]
    fn test_merge_empty_input_is_an_error() {
        assert!(merge_pdfs(vec![]).is_err());
    }
}
