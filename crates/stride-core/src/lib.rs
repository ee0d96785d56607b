//! Source files, tokens, interning, and shared diagnostics for the stride
//! compiler.
//!
//! This crate has no knowledge of grammar or semantics. It exists so that
//! `stride-front`, `stride-ir`, and `stride-vm` can all refer to the same
//! `SourceFile`, `Token`, and `Error` types without depending on each other.

mod colors;
mod error;
mod interner;
mod source_file;
mod token;
mod token_set;

pub use colors::Colors;
pub use error::{Error, ErrorKind};
pub use interner::{Interner, Symbol};
pub use source_file::{SourceFile, SourcePosition};
pub use token::{Token, TokenType};
pub use token_set::{collect_block, collect_block_variant, collect_until_token, TokenSet};
