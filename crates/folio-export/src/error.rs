//! Export pipeline errors.

use std::io;
use std::path::{Path, PathBuf};

use crate::convert::{ConvertError, Format};
use crate::document::DocumentId;
use crate::render::RenderError;
use crate::source::SourceError;

/// Error returned by [`Exporter::export`](crate::Exporter::export).
///
/// Every variant aborts the export session. The staging workspace is removed
/// before the error reaches the caller.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Invalid session token {0:?}")]
    InvalidSession(String),

    #[error("Lookup failed: {0}")]
    Lookup(#[from] SourceError),

    #[error("Failed to render document {document_id}: {source}")]
    Render {
        document_id: DocumentId,
        #[source]
        source: RenderError,
    },

    #[error("Failed to {context} {}: {source}", path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Conversion failed: {0}")]
    Conversion(#[from] ConvertError),

    #[error("Failed to copy {format} output to {}: {source}", path.display())]
    Copy {
        format: Format,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ExportError {
    pub(crate) fn io(context: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            context,
            path: path.to_path_buf(),
            source,
        }
    }
}
