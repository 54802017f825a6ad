//! Book and document records consumed by the export pipeline.

use serde::{Deserialize, Serialize};

/// Book identifier.
pub type BookId = u64;

/// Document identifier, unique within a book.
pub type DocumentId = u64;

/// Book metadata needed to build the ebook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Book {
    pub id: BookId,
    /// Display name, used as the ebook title.
    pub name: String,
    /// URL slug, used as the ebook identifier.
    pub identify: String,
    /// Markdown description.
    pub description: String,
    /// Publisher name. Empty when the book has none.
    pub publisher: String,
    /// Site-relative cover image path. Empty when the book has none.
    pub cover: String,
    /// Account name of the book's founder.
    pub creator: String,
}

/// One exportable document of a book.
///
/// Documents arrive as a flat list; nesting is expressed through
/// `parent_id`, where `0` marks a top-level document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentNode {
    pub id: DocumentId,
    #[serde(default)]
    pub parent_id: DocumentId,
    pub title: String,
    /// Pre-rendered HTML body.
    #[serde(default)]
    pub content: String,
}

impl DocumentNode {
    /// Create a document without content.
    #[must_use]
    pub fn new(id: DocumentId, parent_id: DocumentId, title: impl Into<String>) -> Self {
        Self {
            id,
            parent_id,
            title: title.into(),
            content: String::new(),
        }
    }

    /// Attach pre-rendered HTML content.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Whether the document sits at the top level of the book.
    pub fn is_root(&self) -> bool {
        self.parent_id == 0
    }

    /// File name of the staged HTML page for this document.
    pub fn file_name(&self) -> String {
        page_file_name(self.id)
    }
}

/// File name of the staged HTML page for a document id.
pub(crate) fn page_file_name(id: DocumentId) -> String {
    format!("{id}.html")
}
