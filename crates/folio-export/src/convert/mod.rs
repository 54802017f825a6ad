//! Conversion driver.
//!
//! Builds the [`ConverterConfig`] for a book and hands the staged HTML
//! directory to a [`Converter`]. The converter itself is an external
//! collaborator; [`CalibreConverter`] drives calibre's `ebook-convert`.

mod calibre;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use pulldown_cmark::{Parser, html};
use serde::Serialize;

use crate::document::Book;
use crate::toc::TocEntry;

pub use calibre::CalibreConverter;

/// Page header template. `_SECTION_` is replaced with the current section title.
const HEADER_TEMPLATE: &str = "<p style='color:#8E8E8E;font-size:12px;'>_SECTION_</p>";

/// Output format produced by the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Epub,
    Mobi,
    Pdf,
    Docx,
}

impl Format {
    /// Every format an export produces, in conversion order.
    pub const ALL: [Format; 4] = [Format::Epub, Format::Mobi, Format::Pdf, Format::Docx];

    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Epub => "epub",
            Self::Mobi => "mobi",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }

    /// Canonical output file name (`book.<ext>`).
    pub fn file_name(self) -> String {
        format!("book.{}", self.extension())
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Paths of the four finished ebook files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub epub: PathBuf,
    pub mobi: PathBuf,
    pub pdf: PathBuf,
    pub docx: PathBuf,
}

impl ConversionResult {
    /// Canonical file paths inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            epub: dir.join(Format::Epub.file_name()),
            mobi: dir.join(Format::Mobi.file_name()),
            pdf: dir.join(Format::Pdf.file_name()),
            docx: dir.join(Format::Docx.file_name()),
        }
    }

    /// Path of one format.
    pub fn path(&self, format: Format) -> &Path {
        match format {
            Format::Epub => &self.epub,
            Format::Mobi => &self.mobi,
            Format::Pdf => &self.pdf,
            Format::Docx => &self.docx,
        }
    }
}

/// Page layout for paginated formats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Typography {
    pub font_size: u32,
    pub paper_size: String,
    pub margin_left: u32,
    pub margin_right: u32,
    pub margin_top: u32,
    pub margin_bottom: u32,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            font_size: 14,
            paper_size: "a4".to_owned(),
            margin_left: 72,
            margin_right: 72,
            margin_top: 72,
            margin_bottom: 72,
        }
    }
}

/// Description of one conversion job.
#[derive(Debug, Clone, Serialize)]
pub struct ConverterConfig {
    pub charset: String,
    /// Cover image path on disk, empty when the book has none.
    pub cover: String,
    pub timestamp: String,
    /// Book description rendered to HTML.
    pub description: String,
    /// Footer template; `_PAGENUM_` is replaced with the page number.
    pub footer: String,
    /// Header template; `_SECTION_` is replaced with the section title.
    pub header: String,
    pub identifier: String,
    pub language: String,
    pub creator: String,
    pub publisher: String,
    pub contributor: String,
    pub title: String,
    pub format: Vec<Format>,
    #[serde(flatten)]
    pub typography: Typography,
    pub toc: Vec<TocEntry>,
    /// Extra arguments passed through to the converter.
    pub more: Vec<String>,
}

/// Book-level inputs of [`ConverterConfig::for_book`] that do not come from
/// the book record.
#[derive(Debug, Clone, Default)]
pub struct JobOptions {
    pub timestamp: String,
    pub cover: Option<PathBuf>,
    pub language: String,
    pub typography: Typography,
    pub more: Vec<String>,
}

impl ConverterConfig {
    /// Build the conversion job for a book.
    pub fn for_book(book: &Book, toc: Vec<TocEntry>, options: JobOptions) -> Self {
        Self {
            charset: "utf-8".to_owned(),
            cover: options
                .cover
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            timestamp: options.timestamp,
            description: markdown_to_html(&book.description),
            footer: footer_template(&book.publisher),
            header: HEADER_TEMPLATE.to_owned(),
            identifier: book.identify.clone(),
            language: options.language,
            creator: book.creator.clone(),
            publisher: book.publisher.clone(),
            contributor: book.publisher.clone(),
            title: book.name.clone(),
            format: Format::ALL.to_vec(),
            typography: options.typography,
            toc,
            more: options.more,
        }
    }
}

/// External multi-format converter.
pub trait Converter: Send + Sync {
    /// Convert the pages staged in `source_dir`.
    ///
    /// On success the converter has written `output/book.<ext>` under
    /// `source_dir` for every format in `config.format`.
    fn convert(&self, config: &ConverterConfig, source_dir: &Path) -> Result<(), ConvertError>;
}

/// Error returned by a [`Converter`].
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{format} conversion exited with {status}: {stderr}")]
    Failed {
        format: Format,
        status: String,
        stderr: String,
    },
    #[error("Converter produced no {0} output")]
    IncompleteOutput(Format),
}

/// Check that every format was produced as a non-empty file.
pub fn verify_outputs(dir: &Path) -> Result<ConversionResult, ConvertError> {
    for format in Format::ALL {
        let non_empty = fs::metadata(dir.join(format.file_name()))
            .is_ok_and(|meta| meta.is_file() && meta.len() > 0);
        if !non_empty {
            return Err(ConvertError::IncompleteOutput(format));
        }
    }
    Ok(ConversionResult::in_dir(dir))
}

/// Footer with a publisher credit, or the generic one when there is no publisher.
fn footer_template(publisher: &str) -> String {
    const STYLE: &str = "color:#8E8E8E;font-size:12px;";
    const PAGE_NUMBER: &str = "<span style='float:right'>- _PAGENUM_ -</span>";

    if publisher.trim().is_empty() {
        format!(
            "<p style='{STYLE}'>Built with <a href='https://github.com/folio-books/folio' \
             style='text-decoration:none;color:#1abc9c;font-weight:bold;'>Folio</a> {PAGE_NUMBER}</p>"
        )
    } else {
        format!(
            "<p style='{STYLE}'>Published by <span style='text-decoration:none;color:#1abc9c;\
             font-weight:bold;'>{}</span> {PAGE_NUMBER}</p>",
            html_escape::encode_text(publisher)
        )
    }
}

fn markdown_to_html(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, Parser::new(markdown));
    out
}
