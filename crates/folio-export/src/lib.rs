//! Book export pipeline for Folio.
//!
//! Turns a book (an ordered set of HTML documents) into EPUB, MOBI, PDF and
//! DOCX files. The pipeline is built from small pieces:
//!
//! - [`build_toc`]: Stratified table of contents (roots first, then children)
//! - [`inline_images`]: Embed site-relative `<img>` sources as data URIs
//! - [`PageRenderer`] / [`TemplateRenderer`]: Wrap a document in the export page template
//! - [`Workspace`]: Per-session staging directory, removed on every exit path
//! - [`cached_outputs`]: Skip work when all four outputs already exist
//! - [`Converter`] / [`CalibreConverter`]: External multi-format conversion
//! - [`copy_outputs`]: Atomic copy into the durable per-book directory
//!
//! [`Exporter`] ties them together behind a single [`Exporter::export`] call.
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! use folio_export::{
//!     CalibreConverter, ExportSettings, Exporter, JsonLibrary, TemplateRenderer, Typography,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let exporter = Exporter::new(
//!     Arc::new(JsonLibrary::new(PathBuf::from("library"))),
//!     Arc::new(TemplateRenderer::new()?),
//!     Arc::new(CalibreConverter::new("ebook-convert")),
//!     ExportSettings {
//!         asset_root: PathBuf::from("site"),
//!         output_root: PathBuf::from("site/uploads/books"),
//!         temp_root: std::env::temp_dir(),
//!         base_url: String::new(),
//!         language: "en-US".to_owned(),
//!         typography: Typography::default(),
//!         extra_args: Vec::new(),
//!     },
//! )?;
//!
//! let result = exporter.export(1, "session-1")?;
//! println!("{}", result.pdf.display());
//! # Ok(())
//! # }
//! ```

mod cache;
mod convert;
mod document;
mod error;
mod exporter;
mod inline;
mod lock;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod render;
mod source;
mod stage;
mod toc;
mod workspace;

pub use cache::cached_outputs;
pub use convert::{
    CalibreConverter, ConversionResult, ConvertError, Converter, ConverterConfig, Format,
    JobOptions, Typography, verify_outputs,
};
pub use document::{Book, BookId, DocumentId, DocumentNode};
pub use error::ExportError;
pub use exporter::{ExportSettings, Exporter};
pub use inline::{inline_images, resolve_site_path};
pub use lock::{BookGuard, BookLocks};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockSource;
pub use render::{PageRenderer, PageView, RenderError, TemplateRenderer, stage_document};
pub use source::{DocumentSource, JsonLibrary, SourceError};
pub use stage::copy_outputs;
pub use toc::{TocEntry, build_toc};
pub use workspace::{Workspace, durable_dir};
