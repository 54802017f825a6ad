//! Cache gate over the durable output directory.
//!
//! A book counts as exported when all four canonical files exist. There is no
//! invalidation: deleting any of the files forces a full re-export.

use std::path::Path;

use crate::convert::{ConversionResult, Format};

/// Return the finished outputs if every format is already present.
pub fn cached_outputs(durable_dir: &Path) -> Option<ConversionResult> {
    let result = ConversionResult::in_dir(durable_dir);
    Format::ALL
        .iter()
        .all(|&format| result.path(format).is_file())
        .then_some(result)
}
