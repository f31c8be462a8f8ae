//! Page-indexed text extraction from budget PDFs.

use std::path::Path;

use anyhow::{Context, bail};
use lopdf::Document;

use crate::Result;

/// Raw text of one PDF page. Page numbers start at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub page: u32,
    pub text: String,
}

impl PageText {
    pub fn new(page: u32, text: impl Into<String>) -> Self {
        PageText {
            page,
            text: text.into(),
        }
    }
}

/// One trimmed, non-empty line of page text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLine<'a> {
    pub page: u32,
    pub text: &'a str,
}

/// Extract the text of every page of the PDF at `path`, in page order.
///
/// Pages that fail to extract or carry no text are skipped. `progress_interval` controls how
/// often (in pages) progress is logged; `0` disables progress output.
pub fn read_pages(path: &Path, progress_interval: u32) -> Result<Vec<PageText>> {
    if !path.exists() {
        bail!("Could not find file: {}", path.display());
    }
    let document = Document::load(path)
        .with_context(|| format!("Failed to load PDF: {}", path.display()))?;

    let page_numbers: Vec<u32> = document.get_pages().into_keys().collect();
    let total_pages = page_numbers.len();
    tracing::debug!("{} has {total_pages} pages", path.display());

    let mut pages = Vec::with_capacity(total_pages);
    for (index, page) in page_numbers.into_iter().enumerate() {
        match document.extract_text(&[page]) {
            Ok(text) if !text.trim().is_empty() => pages.push(PageText { page, text }),
            Ok(_) => {}
            Err(error) => tracing::warn!("Skipping page {page}: {error}"),
        }

        let done = index + 1;
        if progress_interval > 0 && done % progress_interval as usize == 0 {
            let percent = done as f64 / total_pages as f64 * 100.0;
            tracing::info!("Progress: {done}/{total_pages} pages ({percent:.1}%)");
        }
    }

    Ok(pages)
}

/// Split pages into their trimmed, non-empty lines, keeping document order.
pub fn page_lines(pages: &[PageText]) -> impl Iterator<Item = PageLine<'_>> {
    pages.iter().flat_map(|page| {
        page.text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(move |text| PageLine {
                page: page.page,
                text,
            })
    })
}

/// Write a PDF with one text line per entry, using a standard font.
#[cfg(test)]
pub(crate) fn write_test_pdf(path: &Path, pages: &[&[&str]]) {
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    let mut document = Document::with_version("1.5");
    let pages_id = document.new_object_id();
    let font_id = document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = document.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for lines in pages {
        let mut operations = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), Object::Integer(10)]),
                Operation::new(
                    "Td",
                    vec![Object::Integer(50), Object::Integer(780 - 14 * i as i64)],
                ),
                Operation::new("Tj", vec![Object::string_literal(*line)]),
                Operation::new("ET", vec![]),
            ]);
        }
        let content = Content { operations }.encode().unwrap();
        let content_id = document.add_object(Stream::new(dictionary! {}, content));
        let page_id = document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(595),
                Object::Integer(842),
            ],
        });
        kids.push(Object::Reference(page_id));
    }

    let page_count = kids.len() as i64;
    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
        }),
    );
    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);
    document.save(path).unwrap();
}
