//! `folio toc` command implementation.

use std::path::PathBuf;

use clap::Args;
use folio_config::{CliSettings, Config};
use folio_export::{BookId, DocumentSource, JsonLibrary, build_toc};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the toc command.
#[derive(Args)]
pub(crate) struct TocArgs {
    /// Book whose table of contents to print.
    book_id: BookId,

    /// Path to configuration file (default: auto-discover folio.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Library directory holding `<book_id>/book.json` (overrides config).
    #[arg(long, env = "FOLIO_LIBRARY")]
    library: Option<PathBuf>,
}

impl TocArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let cli_settings = CliSettings {
            library_dir: self.library,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let library = JsonLibrary::new(config.library_dir);
        let json = toc_json(&library, self.book_id)?;
        Output::new().data(&json)?;
        Ok(())
    }
}

fn toc_json(source: &dyn DocumentSource, book_id: BookId) -> Result<String, CliError> {
    let documents = source.documents(book_id)?;
    Ok(serde_json::to_string_pretty(&build_toc(&documents))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_toc_json_lists_roots_first() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("5")).unwrap();
        fs::write(
            tmp.path().join("5/book.json"),
            r#"{
                "id": 5,
                "name": "Guide",
                "documents": [
                    {"id": 1, "parent_id": 0, "title": "Intro"},
                    {"id": 2, "parent_id": 1, "title": "Setup"},
                    {"id": 3, "parent_id": 0, "title": "Usage"}
                ]
            }"#,
        )
        .unwrap();
        let library = JsonLibrary::new(tmp.path().to_path_buf());

        let json = toc_json(&library, 5).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let ids: Vec<u64> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["id"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 3, 2]);
        assert_eq!(value[2]["pid"], 1);
        assert_eq!(value[0]["link"], "1.html");
    }

    #[test]
    fn test_toc_json_unknown_book() {
        let tmp = tempfile::TempDir::new().unwrap();
        let library = JsonLibrary::new(tmp.path().to_path_buf());

        let err = toc_json(&library, 9).unwrap_err();
        assert!(matches!(err, CliError::Source(_)));
    }
}
