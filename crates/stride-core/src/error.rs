use std::rc::Rc;

use thiserror::Error as ThisError;

use crate::source_file::{SourceFile, SourcePosition};

/// The closed set of error categories the compiler can raise. Every
/// operation that can fail returns one of these; there is no batching layer
/// above it (see the crate-level design note on single-error propagation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    Semantic,
    Io,
    Backend,
}

impl ErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::Syntax => "syntax error",
            ErrorKind::Semantic => "semantic error",
            ErrorKind::Io => "I/O error",
            ErrorKind::Backend => "backend error",
        }
    }
}

/// A single compiler diagnostic. Carries everything the CLI's pretty
/// printer needs to render one annotated source snippet. There is
/// deliberately no variant for "multiple errors" — the driver stops at the
/// first one.
#[derive(ThisError, Debug, Clone)]
#[error("{kind}: {message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub file: Option<Rc<SourceFile>>,
    pub position: Option<SourcePosition>,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            file: None,
            position: None,
        }
    }

    pub fn at(
        kind: ErrorKind,
        message: impl Into<String>,
        file: Rc<SourceFile>,
        position: SourcePosition,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            file: Some(file),
            position: Some(position),
        }
    }

    pub fn syntax(message: impl Into<String>, file: Rc<SourceFile>, position: SourcePosition) -> Self {
        Self::at(ErrorKind::Syntax, message, file, position)
    }

    pub fn semantic(message: impl Into<String>, file: Rc<SourceFile>, position: SourcePosition) -> Self {
        Self::at(ErrorKind::Semantic, message, file, position)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Backend, message)
    }

    /// One-line rendering used when no source snippet is available (e.g.
    /// I/O errors before any file was read).
    pub fn render_plain(&self) -> String {
        format!("{}: {}", self.kind.label(), self.message)
    }
}
