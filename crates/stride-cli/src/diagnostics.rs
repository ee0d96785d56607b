//! Single-error pretty printer, built as an `annotate-snippets` rendering
//! pass narrowed to exactly one error — this crate never collects a
//! batch, it renders whichever `stride_core::Error` the driver propagated
//! and stops.

use annotate_snippets::{AnnotationKind, Level, Renderer, Snippet};

use stride_core::Colors;

use crate::error::Error;

/// Renders `err` to a single string suitable for printing to stderr.
/// Falls back to a plain one-liner when no source snippet applies (I/O and
/// config errors happen before any `SourceFile` exists).
pub fn render(err: &Error, colored: bool) -> String {
    let Some(compiler_err) = err.compiler_error() else {
        return plain_line(&err.render_plain(), colored);
    };

    let (Some(file), Some(position)) = (&compiler_err.file, compiler_err.position) else {
        return plain_line(&compiler_err.render_plain(), colored);
    };

    let renderer = if colored { Renderer::styled() } else { Renderer::plain() };
    let source = file.text();
    let start = position.offset.min(source.len());
    let end = position.end().min(source.len()).max(start);
    let range = if start == end { start..(start + 1).min(source.len()) } else { start..end };

    let title = compiler_err.kind.label();
    let snippet = Snippet::source(source)
        .line_start(1)
        .path(file.path())
        .annotation(AnnotationKind::Primary.span(range).label(&compiler_err.message));

    let group = Level::ERROR.primary_title(title).element(snippet);
    renderer.render(&[group]).to_string()
}

fn plain_line(message: &str, colored: bool) -> String {
    let colors = Colors::new(colored);
    format!("{}error:{} {}", colors.red, colors.reset, message)
}
