//! The CLI's top-level error, composed from every layer below it by
//! `#[from]` — `stride-core::Error` already absorbs `stride-front`,
//! `stride-ir`, and `stride-vm` errors (see `stride_vm::Error`'s own
//! `From` impl), so this enum only adds the two concerns unique to the
//! driver: reading files off disk and parsing the project config.

use std::path::PathBuf;

use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("failed to read {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse {0}: {1}")]
    Config(PathBuf, #[source] serde_json::Error),

    #[error(transparent)]
    Compiler(#[from] stride_core::Error),
}

impl Error {
    /// A single-line rendering used when no source snippet applies (I/O
    /// and config errors happen before any `SourceFile` exists).
    pub fn render_plain(&self) -> String {
        match self {
            Error::Compiler(e) => e.render_plain(),
            other => other.to_string(),
        }
    }

    /// The `stride_core::Error` this carries, if any — used by the
    /// diagnostics printer to decide whether a source snippet can be
    /// rendered at all.
    pub fn compiler_error(&self) -> Option<&stride_core::Error> {
        match self {
            Error::Compiler(e) => Some(e),
            _ => None,
        }
    }
}
