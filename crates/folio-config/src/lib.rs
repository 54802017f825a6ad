//! Configuration management for Folio.
//!
//! Parses `folio.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `export.base_url`
//! - `converter.program`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the book library directory.
    pub library_dir: Option<PathBuf>,
    /// Override the durable output directory.
    pub output_dir: Option<PathBuf>,
    /// Override the converter program.
    pub converter_program: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "folio.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Export configuration (paths are relative strings from TOML).
    export: ExportConfigRaw,
    /// Library configuration (paths are relative strings from TOML).
    library: LibraryConfigRaw,
    /// Page layout for paginated formats.
    pub typography: TypographyConfig,
    /// External converter configuration.
    pub converter: ConverterSettings,

    /// Resolved export configuration (set after loading).
    #[serde(skip)]
    pub export_resolved: ExportConfig,
    /// Resolved library directory (set after loading).
    #[serde(skip)]
    pub library_dir: PathBuf,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw export configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ExportConfigRaw {
    asset_root: Option<String>,
    output_dir: Option<String>,
    temp_dir: Option<String>,
    base_url: Option<String>,
    template: Option<String>,
    language: Option<String>,
}

/// Resolved export configuration with absolute paths.
#[derive(Debug, Default)]
pub struct ExportConfig {
    /// Directory that site-relative asset URLs resolve against.
    pub asset_root: PathBuf,
    /// Durable output root; each book gets `<output_dir>/<book_id>`.
    pub output_dir: PathBuf,
    /// Parent directory of per-session staging workspaces.
    pub temp_dir: PathBuf,
    /// Base URL exposed to export templates.
    pub base_url: String,
    /// Custom export template, if any.
    pub template: Option<PathBuf>,
    /// Ebook language tag.
    pub language: String,
}

/// Raw library configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct LibraryConfigRaw {
    dir: Option<String>,
}

/// Page layout settings passed to the converter.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct TypographyConfig {
    /// Base font size in points.
    pub font_size: u32,
    /// Paper size name (e.g. "a4", "letter").
    pub paper_size: String,
    /// Left margin in points.
    pub margin_left: u32,
    /// Right margin in points.
    pub margin_right: u32,
    /// Top margin in points.
    pub margin_top: u32,
    /// Bottom margin in points.
    pub margin_bottom: u32,
}

impl Default for TypographyConfig {
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

/// External converter configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ConverterSettings {
    /// Converter executable (name on `PATH` or absolute path).
    pub program: String,
    /// Extra arguments appended to every converter invocation.
    pub extra_args: Vec<String>,
}

impl Default for ConverterSettings {
    fn default() -> Self {
        Self {
            program: "ebook-convert".to_owned(),
            extra_args: Vec::new(),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Explicitly requested config file does not exist.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// Config file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Config file is not valid TOML for this schema.
    #[error("Invalid folio.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value is out of range or empty.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`export.base_url`").
        field: String,
        /// Error message (e.g., "${`FOLIO_BASE_URL`} is not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `folio.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings)?;
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    ///
    /// Relative directories given on the command line resolve against the
    /// current directory, not the config file's.
    fn apply_cli_settings(&mut self, settings: &CliSettings) -> Result<(), ConfigError> {
        let absolute = |path: &PathBuf| {
            std::path::absolute(path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })
        };
        if let Some(library_dir) = &settings.library_dir {
            self.library_dir = absolute(library_dir)?;
        }
        if let Some(output_dir) = &settings.output_dir {
            self.export_resolved.output_dir = absolute(output_dir)?;
        }
        if let Some(program) = &settings.converter_program {
            self.converter.program.clone_from(program);
        }
        Ok(())
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let cwd = std::env::current_dir().ok()?;
        cwd.ancestors()
            .map(|dir| dir.join(CONFIG_FILENAME))
            .find(|candidate| candidate.is_file())
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            export: ExportConfigRaw::default(),
            library: LibraryConfigRaw::default(),
            typography: TypographyConfig::default(),
            converter: ConverterSettings::default(),
            export_resolved: ExportConfig {
                asset_root: base.to_path_buf(),
                output_dir: base.join("uploads/books"),
                temp_dir: std::env::temp_dir(),
                base_url: String::new(),
                template: None,
                language: default_language(),
            },
            library_dir: base.join("library"),
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        let content = std::fs::read_to_string(path).map_err(io_error)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        let config_dir = std::path::absolute(config_dir).map_err(io_error)?;
        config.resolve_paths(&config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        const MAX_FONT_SIZE: u32 = 72;

        require_non_empty(&self.converter.program, "converter.program")?;
        require_non_empty(&self.typography.paper_size, "typography.paper_size")?;
        require_non_empty(&self.export_resolved.language, "export.language")?;

        let font_size = self.typography.font_size;
        if font_size == 0 || font_size > MAX_FONT_SIZE {
            return Err(ConfigError::Validation(format!(
                "typography.font_size must be between 1 and {MAX_FONT_SIZE}"
            )));
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref url) = self.export.base_url {
            self.export.base_url = Some(expand::expand_env(url, "export.base_url")?);
        }
        self.converter.program = expand::expand_env(&self.converter.program, "converter.program")?;
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.export_resolved = ExportConfig {
            asset_root: resolve(self.export.asset_root.as_deref(), "."),
            output_dir: resolve(self.export.output_dir.as_deref(), "uploads/books"),
            temp_dir: self
                .export
                .temp_dir
                .as_deref()
                .map_or_else(std::env::temp_dir, |dir| config_dir.join(dir)),
            base_url: self.export.base_url.clone().unwrap_or_default(),
            template: self.export.template.as_deref().map(|t| config_dir.join(t)),
            language: self
                .export
                .language
                .clone()
                .unwrap_or_else(default_language),
        };
        self.library_dir = resolve(self.library.dir.as_deref(), "library");
    }
}

fn default_language() -> String {
    "en-US".to_owned()
}
