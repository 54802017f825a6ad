//! Per-book export locks.
//!
//! Exports of the same book share one durable output directory. A
//! [`BookGuard`] is held from the cache check until the outputs are staged,
//! so a second export of the book waits and then finds the finished files.

use std::collections::HashSet;
use std::sync::{Condvar, Mutex, PoisonError};

use crate::document::BookId;

/// Registry of books currently being exported in this process.
#[derive(Debug, Default)]
pub struct BookLocks {
    busy: Mutex<HashSet<BookId>>,
    released: Condvar,
}

impl BookLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until no other export holds `book_id`, then take it.
    pub fn acquire(&self, book_id: BookId) -> BookGuard<'_> {
        let mut busy = self.busy.lock().unwrap_or_else(PoisonError::into_inner);
        while busy.contains(&book_id) {
            busy = self
                .released
                .wait(busy)
                .unwrap_or_else(PoisonError::into_inner);
        }
        busy.insert(book_id);
        BookGuard {
            locks: self,
            book_id,
        }
    }

    /// Whether an export currently holds `book_id`.
    pub fn is_locked(&self, book_id: BookId) -> bool {
        self.busy
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&book_id)
    }
}

/// Exclusive hold on one book, released on drop.
#[derive(Debug)]
pub struct BookGuard<'a> {
    locks: &'a BookLocks,
    book_id: BookId,
}

impl Drop for BookGuard<'_> {
    fn drop(&mut self) {
        let mut busy = self
            .locks
            .busy
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        busy.remove(&self.book_id);
        drop(busy);
        self.locks.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_guard_releases_on_drop() {
        let locks = BookLocks::new();
        {
            let _guard = locks.acquire(1);
            assert!(locks.is_locked(1));
        }
        assert!(!locks.is_locked(1));
    }

    #[test]
    fn test_different_books_do_not_block() {
        let locks = BookLocks::new();
        let _a = locks.acquire(1);
        let _b = locks.acquire(2);
        assert!(locks.is_locked(1) && locks.is_locked(2));
    }

    #[test]
    fn test_same_book_waits_for_release() {
        let locks = Arc::new(BookLocks::new());
        let acquired = Arc::new(AtomicBool::new(false));

        let guard = locks.acquire(7);
        let handle = {
            let locks = Arc::clone(&locks);
            let acquired = Arc::clone(&acquired);
            thread::spawn(move || {
                let _guard = locks.acquire(7);
                acquired.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!acquired.load(Ordering::SeqCst));

        drop(guard);
        handle.join().unwrap();
        assert!(acquired.load(Ordering::SeqCst));
    }
}
