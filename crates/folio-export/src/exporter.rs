//! Export session orchestration.
//!
//! One call to [`Exporter::export`] runs a whole session:
//!
//! ```text
//! cache check --hit--> done
//!      |
//!     miss
//!      v
//! lookup -> staging -> render xN -> convert -> verify -> copy outputs -> done
//! ```
//!
//! Any failure after staging starts returns the error once the workspace has
//! been removed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::cached_outputs;
use crate::convert::{
    ConversionResult, Converter, ConverterConfig, JobOptions, Typography, verify_outputs,
};
use crate::document::{Book, BookId};
use crate::error::ExportError;
use crate::inline::resolve_site_path;
use crate::lock::BookLocks;
use crate::render::{PageRenderer, PageView, stage_document};
use crate::source::DocumentSource;
use crate::stage::copy_outputs;
use crate::toc::build_toc;
use crate::workspace::{Workspace, durable_dir, ensure_dir, validate_token};

/// Timestamp format written into the ebook metadata.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Filesystem locations and job defaults for exports.
#[derive(Debug, Clone)]
pub struct ExportSettings {
    /// Directory that site-relative asset URLs resolve against.
    pub asset_root: PathBuf,
    /// Durable output root; each book gets `<output_root>/<book_id>`.
    pub output_root: PathBuf,
    /// Parent directory of per-session staging workspaces.
    pub temp_root: PathBuf,
    /// Base URL exposed to page templates.
    pub base_url: String,
    /// Ebook language tag.
    pub language: String,
    pub typography: Typography,
    /// Extra arguments passed through to the converter.
    pub extra_args: Vec<String>,
}

/// Exports books to EPUB, MOBI, PDF and DOCX.
///
/// Safe to share between threads. Exports of different books run in parallel;
/// exports of the same book are serialized.
pub struct Exporter {
    source: Arc<dyn DocumentSource>,
    renderer: Arc<dyn PageRenderer>,
    converter: Arc<dyn Converter>,
    settings: ExportSettings,
    locks: BookLocks,
}

impl Exporter {
    /// Create an exporter from its collaborators.
    ///
    /// Relative roots in `settings` are resolved against the current
    /// directory here, so result paths and the cover handed to the converter
    /// stay valid whatever directory the converter runs in.
    pub fn new(
        source: Arc<dyn DocumentSource>,
        renderer: Arc<dyn PageRenderer>,
        converter: Arc<dyn Converter>,
        mut settings: ExportSettings,
    ) -> Result<Self, ExportError> {
        settings.asset_root = absolute(&settings.asset_root, "resolve asset root")?;
        settings.output_root = absolute(&settings.output_root, "resolve output root")?;
        settings.temp_root = absolute(&settings.temp_root, "resolve temp root")?;
        Ok(Self {
            source,
            renderer,
            converter,
            settings,
            locks: BookLocks::new(),
        })
    }

    /// Durable output directory of a book.
    pub fn output_dir(&self, book_id: BookId) -> PathBuf {
        durable_dir(&self.settings.output_root, book_id)
    }

    /// Export a book, reusing previously finished outputs when all exist.
    ///
    /// `session_token` names the staging workspace and must be unique among
    /// concurrent sessions. The workspace never outlives this call.
    pub fn export(
        &self,
        book_id: BookId,
        session_token: &str,
    ) -> Result<ConversionResult, ExportError> {
        validate_token(session_token)?;
        let _guard = self.locks.acquire(book_id);
        let output_dir = self.output_dir(book_id);

        if let Some(cached) = cached_outputs(&output_dir) {
            tracing::info!(book_id, dir = %output_dir.display(), "Using cached export");
            return Ok(cached);
        }

        let book = self.source.book(book_id)?;
        let documents = self.source.documents(book_id)?;
        tracing::info!(book_id, title = %book.name, documents = documents.len(), "Exporting book");

        let toc = build_toc(&documents);
        ensure_dir(&output_dir)?;
        let workspace = Workspace::create(&self.settings.temp_root, session_token)?;

        for document in &documents {
            let view = PageView {
                book: &book,
                document,
                base_url: &self.settings.base_url,
                language: &self.settings.language,
            };
            stage_document(
                self.renderer.as_ref(),
                &view,
                &self.settings.asset_root,
                workspace.path(),
            )?;
        }

        let config = ConverterConfig::for_book(&book, toc, self.job_options(&book));
        self.converter.convert(&config, workspace.path())?;
        verify_outputs(&workspace.output_dir())?;

        let result = copy_outputs(&workspace.output_dir(), &output_dir)?;
        if let Err(e) = workspace.close() {
            tracing::warn!(error = %e, "Failed to remove workspace");
        }

        tracing::info!(book_id, dir = %output_dir.display(), "Export finished");
        Ok(result)
    }

    fn job_options(&self, book: &Book) -> JobOptions {
        let cover = resolve_site_path(&book.cover, &self.settings.asset_root)
            .filter(|path| path.is_file());
        JobOptions {
            timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
            cover,
            language: self.settings.language.clone(),
            typography: self.settings.typography.clone(),
            more: self.settings.extra_args.clone(),
        }
    }
}

fn absolute(path: &Path, context: &'static str) -> Result<PathBuf, ExportError> {
    std::path::absolute(path).map_err(|e| ExportError::io(context, path, e))
}
