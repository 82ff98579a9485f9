//! Test fixtures and PDF builders.
//!
//! Two builders, for two needs:
//!
//! - [`TestPdfBuilder`] generates realistic documents with printpdf
//!   (embedded built-in font, layered pages), good for merge tests.
//! - [`ContentPdfBuilder`] writes pages with lopdf directly, placing each
//!   text run at an exact position, good for geometry assertions, since
//!   every coordinate in the content stream is chosen by the test.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::Result;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object, Stream};
use printpdf::{BuiltinFont, Mm, PdfDocument};

/// Builder for realistic multi-page test PDFs.
#[derive(Debug, Clone)]
pub struct TestPdfBuilder {
    title: String,
    pages: Vec<Vec<String>>,
    page_width: Mm,
    page_height: Mm,
}

impl TestPdfBuilder {
    pub fn new() -> Self {
        Self {
            title: "Test Document".to_string(),
            pages: vec![Vec::new()],
            page_width: Mm(210.0),
            page_height: Mm(297.0),
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Adds a text line to the current page.
    pub fn with_line(mut self, line: &str) -> Self {
        if let Some(page) = self.pages.last_mut() {
            page.push(line.to_string());
        }
        self
    }

    /// Starts a new page; subsequent lines land on it.
    pub fn with_new_page(mut self) -> Self {
        self.pages.push(Vec::new());
        self
    }

    /// Builds the PDF and writes it to `output_path`.
    pub fn build(self, output_path: &Path) -> Result<()> {
        let (doc, first_page, first_layer) =
            PdfDocument::new(&self.title, self.page_width, self.page_height, "Layer 1");
        let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;

        let mut page_refs = vec![(first_page, first_layer)];
        for _ in 1..self.pages.len() {
            page_refs.push(doc.add_page(self.page_width, self.page_height, "Layer 1"));
        }

        for (lines, (page_idx, layer_idx)) in self.pages.iter().zip(page_refs) {
            let layer = doc.get_page(page_idx).get_layer(layer_idx);
            let mut y = self.page_height.0 - 30.0;
            for line in lines {
                layer.use_text(line.clone(), 12.0, Mm(20.0), Mm(y), &font);
                y -= 8.0;
            }
        }

        doc.save(&mut BufWriter::new(File::create(output_path)?))?;
        Ok(())
    }
}

impl Default for TestPdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// One positioned text run: text, x, baseline y, font size (all points,
/// bottom-left origin as PDF content streams expect).
pub type TextRun = (&'static str, f64, f64, f64);

/// Builder for lopdf-made fixtures with exact text geometry.
pub struct ContentPdfBuilder {
    page_height: i64,
    page_width: i64,
    pages: Vec<Vec<TextRun>>,
}

impl ContentPdfBuilder {
    pub fn new() -> Self {
        Self {
            page_height: 792,
            page_width: 612,
            pages: Vec::new(),
        }
    }

    pub fn with_page_height(mut self, height: i64) -> Self {
        self.page_height = height;
        self
    }

    /// Adds a page with the given text runs.
    pub fn with_page(mut self, runs: Vec<TextRun>) -> Self {
        self.pages.push(runs);
        self
    }

    /// Serializes the document to bytes.
    pub fn build_bytes(self) -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut font = Dictionary::new();
        font.set("Type", Object::Name(b"Font".to_vec()));
        font.set("Subtype", Object::Name(b"Type1".to_vec()));
        font.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
        let font_id = doc.add_object(font);

        let mut font_map = Dictionary::new();
        font_map.set("F1", Object::Reference(font_id));
        let mut resources = Dictionary::new();
        resources.set("Font", Object::Dictionary(font_map));
        let resources_id = doc.add_object(resources);

        let mut kids = Vec::new();
        for runs in &self.pages {
            let mut operations = Vec::new();
            for (text, x, y, size) in runs {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new(
                    "Tf",
                    vec!["F1".into(), (*size as f32).into()],
                ));
                operations.push(Operation::new(
                    "Td",
                    vec![(*x as f32).into(), (*y as f32).into()],
                ));
                operations.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
                operations.push(Operation::new("ET", vec![]));
            }
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(
                Dictionary::new(),
                content.encode().expect("encodable fixture content"),
            ));

            let mut page = Dictionary::new();
            page.set("Type", Object::Name(b"Page".to_vec()));
            page.set("Parent", Object::Reference(pages_id));
            page.set("Contents", Object::Reference(content_id));
            page.set("Resources", Object::Reference(resources_id));
            page.set(
                "MediaBox",
                Object::Array(vec![
                    0.into(),
                    0.into(),
                    self.page_width.into(),
                    self.page_height.into(),
                ]),
            );
            kids.push(Object::Reference(doc.add_object(page)));
        }

        let page_count = kids.len() as i64;
        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Kids", Object::Array(kids));
        pages.set("Count", Object::Integer(page_count));
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("serializable fixture");
        bytes
    }

    /// Builds and writes the document to `output_path`.
    pub fn build(self, output_path: &Path) -> Result<()> {
        let bytes = self.build_bytes();
        std::fs::write(output_path, bytes)?;
        Ok(())
    }
}

impl Default for ContentPdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}
