//! Copying finished formats into the durable output directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::convert::{ConversionResult, Format};
use crate::error::ExportError;

/// Copy every format from the converter output into `durable_dir`.
///
/// Each file is copied to `book.<ext>.partial` and renamed into place, so a
/// reader never observes a half-written output. Formats are copied
/// independently: a failure does not stop the remaining copies and already
/// copied files are kept. The first failure is returned.
pub fn copy_outputs(converted_dir: &Path, durable_dir: &Path) -> Result<ConversionResult, ExportError> {
    let mut first_error = None;

    for format in Format::ALL {
        let from = converted_dir.join(format.file_name());
        let to = durable_dir.join(format.file_name());
        if let Err(e) = copy_one(format, &from, &to) {
            tracing::error!(%format, error = %e, "Failed to copy output");
            first_error.get_or_insert(e);
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(ConversionResult::in_dir(durable_dir)),
    }
}

fn copy_one(format: Format, from: &Path, to: &Path) -> Result<(), ExportError> {
    let partial = partial_path(to);
    let copy_error = |source| ExportError::Copy {
        format,
        path: to.to_path_buf(),
        source,
    };

    fs::copy(from, &partial).map_err(copy_error)?;
    if let Err(e) = fs::rename(&partial, to) {
        let _ = fs::remove_file(&partial);
        return Err(copy_error(e));
    }
    Ok(())
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}
