//! stride's front end: lexer, recursive-descent parser, scope/symbol
//! registry, and the lowering pass that turns a parsed program into
//! `stride-ir`.
//!
//! - `lexer` - source text to tokens (`logos`-backed)
//! - `ast` - the parsed tree: declarations, statements, expressions
//! - `registry` - the scope/symbol arena and name-mangling inputs
//! - `ty` - the AST's type expressions
//! - `mangle` - the name-mangling scheme shared by declarations and call sites
//! - `parser` - recursive-descent parsing into `ast`
//! - `lower` - the two-pass `ast` to `stride_ir::Module` lowering driver

pub mod ast;
pub mod lexer;
pub mod lower;
pub mod mangle;
pub mod parser;
pub mod registry;
pub mod ty;

pub use lower::lower_program;
pub use parser::parse_program;
