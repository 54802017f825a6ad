//! Per-document page rendering.
//!
//! A [`PageRenderer`] turns one document plus its book into a standalone HTML
//! page. [`stage_document`] runs the renderer, inlines the page's images and
//! writes the result into the staging directory as `<id>.html`.

use std::fs;
use std::path::{Path, PathBuf};

use minijinja::Environment;
use serde::Serialize;

use crate::document::{Book, DocumentNode};
use crate::error::ExportError;
use crate::inline::inline_images;

/// Name under which the export template is registered.
const TEMPLATE_NAME: &str = "export.html";

/// Built-in export template.
const DEFAULT_TEMPLATE: &str = include_str!("../templates/export.html");

/// View model handed to the page renderer.
#[derive(Debug, Serialize)]
pub struct PageView<'a> {
    pub book: &'a Book,
    pub document: &'a DocumentNode,
    pub base_url: &'a str,
    pub language: &'a str,
}

/// Error returned by a [`PageRenderer`].
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
    #[error("Failed to read template {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Other(String),
}

/// Renders one document into a complete HTML page.
pub trait PageRenderer: Send + Sync {
    fn render(&self, view: &PageView<'_>) -> Result<String, RenderError>;
}

/// [`PageRenderer`] backed by a minijinja template.
///
/// The template sees `book`, `document`, `base_url` and `language`. Output is
/// autoescaped, so document content must be inserted with the `safe` filter.
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    /// Renderer using the built-in export template.
    pub fn new() -> Result<Self, RenderError> {
        Self::from_source(DEFAULT_TEMPLATE.to_owned())
    }

    /// Renderer using the given template source.
    pub fn from_source(source: String) -> Result<Self, RenderError> {
        let mut env = Environment::new();
        env.add_template_owned(TEMPLATE_NAME, source)?;
        Ok(Self { env })
    }

    /// Renderer using a template file.
    pub fn from_file(path: &Path) -> Result<Self, RenderError> {
        let source = fs::read_to_string(path).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_source(source)
    }
}

impl PageRenderer for TemplateRenderer {
    fn render(&self, view: &PageView<'_>) -> Result<String, RenderError> {
        let template = self.env.get_template(TEMPLATE_NAME)?;
        Ok(template.render(view)?)
    }
}

/// Render a document, inline its images and write it to `dir/<id>.html`.
pub fn stage_document(
    renderer: &dyn PageRenderer,
    view: &PageView<'_>,
    asset_root: &Path,
    dir: &Path,
) -> Result<PathBuf, ExportError> {
    let document_id = view.document.id;
    let html = renderer
        .render(view)
        .map_err(|source| ExportError::Render {
            document_id,
            source,
        })?;
    let html = inline_images(&html, asset_root);

    let path = dir.join(view.document.file_name());
    fs::write(&path, html).map_err(|e| ExportError::io("write page", &path, e))?;

    tracing::debug!(document_id, path = %path.display(), "Staged document");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn book() -> Book {
        Book {
            id: 1,
            name: "Field Guide".to_owned(),
            ..Book::default()
        }
    }

    struct FailingRenderer;

    impl PageRenderer for FailingRenderer {
        fn render(&self, _view: &PageView<'_>) -> Result<String, RenderError> {
            Err(RenderError::Other("boom".to_owned()))
        }
    }

    #[test]
    fn test_default_template_renders_content_and_title() {
        let renderer = TemplateRenderer::new().unwrap();
        let book = book();
        let doc = DocumentNode::new(3, 0, "Birds & Bees").with_content("<p>Feathers</p>");
        let view = PageView {
            book: &book,
            document: &doc,
            base_url: "",
            language: "en-US",
        };

        let html = renderer.render(&view).unwrap();

        assert!(html.contains("<p>Feathers</p>"));
        assert!(html.contains("<title>Birds &amp; Bees - Field Guide</title>"));
        assert!(html.contains(r#"<html lang="en-US">"#));
    }

    #[test]
    fn test_custom_template_source() {
        let renderer =
            TemplateRenderer::from_source("{{ language }}|{{ document.id }}".to_owned()).unwrap();
        let book = book();
        let doc = DocumentNode::new(9, 0, "x");
        let view = PageView {
            book: &book,
            document: &doc,
            base_url: "",
            language: "de-DE",
        };

        assert_eq!(renderer.render(&view).unwrap(), "de-DE|9");
    }

    #[test]
    fn test_invalid_template_is_rejected() {
        let result = TemplateRenderer::from_source("{% if %}".to_owned());
        assert!(matches!(result, Err(RenderError::Template(_))));
    }

    #[test]
    fn test_missing_template_file() {
        let result = TemplateRenderer::from_file(Path::new("/nonexistent/export.html"));
        assert!(matches!(result, Err(RenderError::Io { .. })));
    }

    #[test]
    fn test_stage_document_writes_inlined_page() {
        let site = TempDir::new().unwrap();
        fs::create_dir_all(site.path().join("uploads")).unwrap();
        fs::write(site.path().join("uploads/logo.gif"), b"GIF89a").unwrap();
        let staging = TempDir::new().unwrap();

        let renderer = TemplateRenderer::new().unwrap();
        let book = book();
        let doc = DocumentNode::new(5, 0, "Logo").with_content(r#"<img src="/uploads/logo.gif">"#);
        let view = PageView {
            book: &book,
            document: &doc,
            base_url: "",
            language: "en-US",
        };

        let path = stage_document(&renderer, &view, site.path(), staging.path()).unwrap();

        assert_eq!(path, staging.path().join("5.html"));
        let written = fs::read_to_string(path).unwrap();
        assert!(written.contains("data:image/gif;base64,R0lGODlh"));
    }

    #[test]
    fn test_stage_document_render_failure() {
        let staging = TempDir::new().unwrap();
        let book = book();
        let doc = DocumentNode::new(8, 0, "x");
        let view = PageView {
            book: &book,
            document: &doc,
            base_url: "",
            language: "en-US",
        };

        let err = stage_document(&FailingRenderer, &view, staging.path(), staging.path())
            .unwrap_err();

        assert!(matches!(err, ExportError::Render { document_id: 8, .. }));
        assert!(!staging.path().join("8.html").exists());
    }

    #[test]
    fn test_stage_document_write_failure() {
        let staging = TempDir::new().unwrap();
        let missing_dir = staging.path().join("does-not-exist");
        let renderer = TemplateRenderer::new().unwrap();
        let book = book();
        let doc = DocumentNode::new(2, 0, "x");
        let view = PageView {
            book: &book,
            document: &doc,
            base_url: "",
            language: "en-US",
        };

        let err = stage_document(&renderer, &view, staging.path(), &missing_dir).unwrap_err();

        assert!(matches!(err, ExportError::Io { .. }));
    }
}
