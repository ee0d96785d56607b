use std::fmt;
use std::rc::Rc;

/// An immutable (path, text) pair shared by every token and AST node derived
/// from it. Lives at least as long as anything that borrows from it.
#[derive(Debug, PartialEq, Eq)]
pub struct SourceFile {
    path: String,
    text: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            path: path.into(),
            text: text.into(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Resolves a byte offset to a 1-indexed (line, column) pair, for
    /// diagnostic rendering. Column is also counted in bytes.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.text.len());
        let mut line = 1;
        let mut col = 1;
        for b in self.text.as_bytes().iter().take(offset) {
            if *b == b'\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        (line, col)
    }

    /// The full text of the line containing `offset`, without its trailing
    /// newline. Used by the diagnostic printer.
    pub fn line_text(&self, offset: usize) -> &str {
        let offset = offset.min(self.text.len());
        let start = self.text[..offset].rfind('\n').map_or(0, |i| i + 1);
        let end = self.text[offset..]
            .find('\n')
            .map_or(self.text.len(), |i| offset + i);
        &self.text[start..end]
    }
}

/// A (byte offset, byte length) span into a `SourceFile`. Carried by every
/// token and node for diagnostics only; never used to address memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourcePosition {
    pub offset: usize,
    pub length: usize,
}

impl SourcePosition {
    pub fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.offset, self.end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_counts_newlines() {
        let file = SourceFile::new("t.sr", "let a = 1;\nlet b = 2;\n");
        assert_eq!(file.line_col(0), (1, 1));
        assert_eq!(file.line_col(11), (2, 1));
    }

    #[test]
    fn line_text_extracts_containing_line() {
        let file = SourceFile::new("t.sr", "fn f() {\n    return 1;\n}\n");
        assert_eq!(file.line_text(12), "    return 1;");
    }
}
