//! `folio export` command implementation.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use folio_config::{CliSettings, Config};
use folio_export::{
    BookId, CalibreConverter, ConversionResult, ExportSettings, Exporter, Format, JsonLibrary,
    TemplateRenderer, Typography,
};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the export command.
#[derive(Args)]
pub(crate) struct ExportArgs {
    /// Book to export.
    book_id: BookId,

    /// Session token naming the staging workspace (default: random UUID).
    #[arg(long)]
    session: Option<String>,

    /// Path to configuration file (default: auto-discover folio.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Library directory holding `<book_id>/book.json` (overrides config).
    #[arg(long, env = "FOLIO_LIBRARY")]
    library: Option<PathBuf>,

    /// Durable output root (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Converter program (overrides config).
    #[arg(long)]
    converter: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl ExportArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            library_dir: self.library,
            output_dir: self.output_dir,
            converter_program: self.converter,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if let Some(path) = &config.config_path {
            tracing::info!(path = %path.display(), "Loaded configuration");
        }

        let renderer = match &config.export_resolved.template {
            Some(path) => TemplateRenderer::from_file(path)?,
            None => TemplateRenderer::new()?,
        };
        let exporter = Exporter::new(
            Arc::new(JsonLibrary::new(config.library_dir.clone())),
            Arc::new(renderer),
            Arc::new(CalibreConverter::new(config.converter.program.clone())),
            export_settings(&config),
        )?;

        let session = self
            .session
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        output.heading(&format!("Exporting book {}", self.book_id));
        output.path("output", &exporter.output_dir(self.book_id));
        output.info(&format!("Session: {session}"));

        let result = exporter.export(self.book_id, &session)?;

        for line in result_lines(&result) {
            output.data(&line)?;
        }
        output.success("Export complete");
        Ok(())
    }
}

/// One plain path per format, in [`Format::ALL`] order, for stdout.
fn result_lines(result: &ConversionResult) -> Vec<String> {
    Format::ALL
        .iter()
        .map(|&format| result.path(format).display().to_string())
        .collect()
}

/// Map loaded configuration onto exporter settings.
fn export_settings(config: &Config) -> ExportSettings {
    let export = &config.export_resolved;
    let typography = &config.typography;
    ExportSettings {
        asset_root: export.asset_root.clone(),
        output_root: export.output_dir.clone(),
        temp_root: export.temp_dir.clone(),
        base_url: export.base_url.clone(),
        language: export.language.clone(),
        typography: Typography {
            font_size: typography.font_size,
            paper_size: typography.paper_size.clone(),
            margin_left: typography.margin_left,
            margin_right: typography.margin_right,
            margin_top: typography.margin_top,
            margin_bottom: typography.margin_bottom,
        },
        extra_args: config.converter.extra_args.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_export_settings_from_default_config() {
        let config = Config::default();

        let settings = export_settings(&config);

        assert_eq!(settings.typography, Typography::default());
        assert_eq!(settings.language, "en-US");
        assert_eq!(settings.output_root, config.export_resolved.output_dir);
        assert!(settings.extra_args.is_empty());
    }

    #[test]
    fn test_result_lines_are_plain_paths() {
        let result = ConversionResult::in_dir(std::path::Path::new("/srv/books/3"));

        assert_eq!(
            result_lines(&result),
            vec![
                "/srv/books/3/book.epub",
                "/srv/books/3/book.mobi",
                "/srv/books/3/book.pdf",
                "/srv/books/3/book.docx",
            ]
        );
    }

    #[test]
    fn test_export_settings_carry_overrides() {
        let mut config = Config::default();
        config.typography.paper_size = "letter".to_owned();
        config.typography.font_size = 11;
        config.converter.extra_args = vec!["--embed-all-fonts".to_owned()];

        let settings = export_settings(&config);

        assert_eq!(settings.typography.paper_size, "letter");
        assert_eq!(settings.typography.font_size, 11);
        assert_eq!(settings.extra_args, vec!["--embed-all-fonts"]);
    }
}
