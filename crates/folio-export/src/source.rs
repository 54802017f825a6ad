//! Document source trait and the JSON library backend.
//!
//! The pipeline never queries storage directly. It asks a [`DocumentSource`]
//! for the book record and the ordered document list, which keeps relational
//! storage, permissions and pagination outside of the export core.
//!
//! # JSON library layout
//!
//! ```text
//! {root}/
//! +-- 1/
//! |   +-- book.json
//! +-- 2/
//!     +-- book.json
//! ```
//!
//! Each `book.json` holds the [`Book`] fields plus a `documents` array of
//! [`DocumentNode`] records in export order.

use std::io;
use std::path::PathBuf;

use serde::Deserialize;

use crate::document::{Book, BookId, DocumentNode};

/// Provider of books and their documents.
pub trait DocumentSource: Send + Sync {
    /// Fetch the book record.
    fn book(&self, id: BookId) -> Result<Book, SourceError>;

    /// Fetch the book's documents in export order.
    fn documents(&self, id: BookId) -> Result<Vec<DocumentNode>, SourceError>;
}

/// Error returned by a [`DocumentSource`].
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Book {0} not found")]
    BookNotFound(BookId),
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid book file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// On-disk shape of `book.json`.
#[derive(Deserialize)]
struct BookFile {
    #[serde(flatten)]
    book: Book,
    #[serde(default)]
    documents: Vec<DocumentNode>,
}

/// [`DocumentSource`] reading `book.json` files from a library directory.
pub struct JsonLibrary {
    root: PathBuf,
}

impl JsonLibrary {
    /// Create a library rooted at `root`.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn load(&self, id: BookId) -> Result<BookFile, SourceError> {
        let path = self.root.join(id.to_string()).join("book.json");
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SourceError::BookNotFound(id));
            }
            Err(source) => return Err(SourceError::Io { path, source }),
        };
        let mut file: BookFile =
            serde_json::from_str(&content).map_err(|source| SourceError::Parse {
                path: path.clone(),
                source,
            })?;
        // The directory name is authoritative.
        file.book.id = id;
        Ok(file)
    }
}

impl DocumentSource for JsonLibrary {
    fn book(&self, id: BookId) -> Result<Book, SourceError> {
        Ok(self.load(id)?.book)
    }

    fn documents(&self, id: BookId) -> Result<Vec<DocumentNode>, SourceError> {
        Ok(self.load(id)?.documents)
    }
}
