use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use std::path::Path;

/// Builds a document with one page per text entry, enough to exercise loading
/// and merging
pub fn multi_page_pdf(texts: &[&str]) -> Document {
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

    let mut kids: Vec<Object> = Vec::new();
    for text in texts {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 48.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => texts.len() as u32,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

pub fn minimal_pdf(text: &str) -> Document {
    multi_page_pdf(&[text])
}

pub fn pdf_bytes(text: &str) -> Vec<u8> {
    let mut buf = Vec::new();
    minimal_pdf(text).save_to(&mut buf).unwrap();
    buf
}

pub fn write_pdf(path: &Path, text: &str) {
    minimal_pdf(text).save(path).unwrap();
}

pub fn write_pdf_pages(path: &Path, texts: &[&str]) {
    multi_page_pdf(texts).save(path).unwrap();
}

/// A document whose trailer carries an Encrypt entry, which is what
/// `Document::is_encrypted` keys off
pub fn write_encrypted_pdf(path: &Path, text: &str) {
    let mut doc = minimal_pdf(text);
    let encrypt_id = doc.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => 1,
        "R" => 2,
    });
    doc.trailer.set("Encrypt", encrypt_id);
    doc.save(path).unwrap();
}
