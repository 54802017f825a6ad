//! Staging workspace and durable output directories.
//!
//! Directory layout:
//! ```text
//! {temp_root}/
//! +-- {session_token}/     # Workspace, removed when the session ends
//!     +-- 1.html           # staged document pages
//!     +-- output/          # converter output
//!         +-- book.epub
//!
//! {output_root}/
//! +-- {book_id}/           # durable per-book directory, never removed here
//!     +-- book.epub
//!     +-- book.mobi
//!     +-- book.pdf
//!     +-- book.docx
//! ```

use std::io;
use std::path::{Component, Path, PathBuf};

use tempfile::TempDir;

use crate::document::BookId;
use crate::error::ExportError;

/// Subdirectory of the workspace the converter writes into.
const OUTPUT_SUBDIR: &str = "output";

/// Durable output directory for a book.
///
/// Depends on the book id only, so every export of a book lands in the same
/// place regardless of session.
pub fn durable_dir(output_root: &Path, book_id: BookId) -> PathBuf {
    output_root.join(book_id.to_string())
}

/// Temporary staging directory owned by one export session.
///
/// The directory lives at `<temp_root>/<session_token>` and is removed
/// recursively when the workspace is closed or dropped, whichever way the
/// session ends.
pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl Workspace {
    /// Create the workspace for a session.
    ///
    /// Fails with [`ExportError::InvalidSession`] if the token is not a single
    /// plain path component, and with [`ExportError::Io`] if the directory
    /// already exists. Tokens must be unique across concurrent sessions.
    pub fn create(temp_root: &Path, session_token: &str) -> Result<Self, ExportError> {
        validate_token(session_token)?;

        std::fs::create_dir_all(temp_root)
            .map_err(|e| ExportError::io("create temp root", temp_root, e))?;
        let temp_root = std::path::absolute(temp_root)
            .map_err(|e| ExportError::io("resolve temp root", temp_root, e))?;

        let dir = tempfile::Builder::new()
            .prefix(session_token)
            .rand_bytes(0)
            .tempdir_in(&temp_root)
            .map_err(|e| ExportError::io("create workspace", &temp_root.join(session_token), e))?;
        let path = dir.path().to_path_buf();

        tracing::debug!(path = %path.display(), "Created workspace");
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    /// Absolute path of the staging directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory the converter writes finished formats into.
    pub fn output_dir(&self) -> PathBuf {
        self.path.join(OUTPUT_SUBDIR)
    }

    /// Remove the workspace now, reporting removal failures.
    pub fn close(mut self) -> io::Result<()> {
        match self.dir.take() {
            Some(dir) => dir.close(),
            None => Ok(()),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take()
            && let Err(e) = dir.close()
        {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove workspace");
        }
    }
}

/// Require the session token to be a single plain path component.
pub(crate) fn validate_token(token: &str) -> Result<(), ExportError> {
    let mut components = Path::new(token).components();
    let single_normal = matches!(components.next(), Some(Component::Normal(_)))
        && components.next().is_none()
        && !token.contains(['/', '\\']);
    if single_normal {
        Ok(())
    } else {
        Err(ExportError::InvalidSession(token.to_owned()))
    }
}

/// Create a directory and its parents.
pub(crate) fn ensure_dir(path: &Path) -> Result<(), ExportError> {
    std::fs::create_dir_all(path).map_err(|e| ExportError::io("create directory", path, e))
}
