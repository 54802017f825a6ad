//! Mock document source for testing.
//!
//! Provides [`MockSource`] for exercising the pipeline without a library on
//! disk.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::document::{Book, BookId, DocumentNode};
use crate::source::{DocumentSource, SourceError};

/// In-memory [`DocumentSource`].
///
/// # Example
///
/// ```ignore
/// use folio_export::{Book, DocumentNode, MockSource};
///
/// let source = MockSource::new().with_book(
///     Book { id: 1, name: "Guide".into(), ..Book::default() },
///     vec![DocumentNode::new(1, 0, "Intro")],
/// );
/// ```
#[derive(Debug, Default)]
pub struct MockSource {
    books: RwLock<HashMap<BookId, (Book, Vec<DocumentNode>)>>,
    document_calls: AtomicUsize,
}

impl MockSource {
    /// Create an empty mock source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a book with its documents.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_book(self, book: Book, documents: Vec<DocumentNode>) -> Self {
        self.books
            .write()
            .unwrap()
            .insert(book.id, (book, documents));
        self
    }

    /// Number of `documents` lookups served so far.
    pub fn document_calls(&self) -> usize {
        self.document_calls.load(Ordering::SeqCst)
    }
}

impl DocumentSource for MockSource {
    fn book(&self, id: BookId) -> Result<Book, SourceError> {
        self.books
            .read()
            .unwrap()
            .get(&id)
            .map(|(book, _)| book.clone())
            .ok_or(SourceError::BookNotFound(id))
    }

    fn documents(&self, id: BookId) -> Result<Vec<DocumentNode>, SourceError> {
        self.document_calls.fetch_add(1, Ordering::SeqCst);
        self.books
            .read()
            .unwrap()
            .get(&id)
            .map(|(_, docs)| docs.clone())
            .ok_or(SourceError::BookNotFound(id))
    }
}
