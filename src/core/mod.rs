//! Core types shared across the analysis pipeline.

mod cancel;
mod error;
mod file_set;
mod language;
mod source_file;

pub use cancel::CancellationToken;
pub use error::{Error, Result};
pub use file_set::{is_vendored_or_hidden, FileSet};
pub use language::Language;
pub use source_file::SourceFile;
