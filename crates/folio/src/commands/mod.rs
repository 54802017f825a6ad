//! CLI command implementations.

pub(crate) mod export;
pub(crate) mod toc;

pub(crate) use export::ExportArgs;
pub(crate) use toc::TocArgs;
