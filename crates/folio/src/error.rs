//! CLI error types.

use folio_config::ConfigError;
use folio_export::{ExportError, RenderError, SourceError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Export(#[from] ExportError),

    #[error("Failed to load export template: {0}")]
    Template(#[from] RenderError),

    #[error("{0}")]
    Source(#[from] SourceError),

    #[error("Failed to serialize table of contents: {0}")]
    Serialize(#[from] serde_json::Error),
}
