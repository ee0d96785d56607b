use std::rc::Rc;

use crate::error::{Error, ErrorKind};
use crate::source_file::{SourceFile, SourcePosition};
use crate::token::{Token, TokenType};

/// A token stream bound to a `SourceFile`, with a mutable cursor and
/// subset operations. The cursor is the only mutable state; creating a
/// subset copies the relevant tokens so that advancing one `TokenSet`
/// never affects another.
#[derive(Debug, Clone)]
pub struct TokenSet {
    source: Rc<SourceFile>,
    tokens: Vec<Token>,
    cursor: usize,
}

impl TokenSet {
    pub fn new(source: Rc<SourceFile>, tokens: Vec<Token>) -> Self {
        Self {
            source,
            tokens,
            cursor: 0,
        }
    }

    pub fn source(&self) -> Rc<SourceFile> {
        Rc::clone(&self.source)
    }

    pub fn size(&self) -> usize {
        self.tokens.len()
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.size() - self.position().min(self.size())
    }

    pub fn has_next(&self) -> bool {
        self.remaining() > 0
    }

    /// The position the synthetic end-of-file token should report: one
    /// byte past the end of the last real token, or offset 0 if the set is
    /// empty.
    fn eof_position(&self) -> SourcePosition {
        match self.tokens.last() {
            Some(t) => SourcePosition::new(t.position.end(), 0),
            None => SourcePosition::new(0, 0),
        }
    }

    fn at(&self, index: usize) -> Token {
        match self.tokens.get(index) {
            Some(t) => t.clone(),
            None => Token::eof(self.eof_position()),
        }
    }

    /// Non-consuming lookahead relative to the cursor. Out-of-range never
    /// fails; it yields a synthetic `END_OF_FILE` token.
    pub fn peek(&self, offset: usize) -> Token {
        self.at(self.cursor.saturating_add(offset))
    }

    pub fn peek_next(&self) -> Token {
        self.peek(0)
    }

    pub fn peek_eq(&self, offset: usize, kind: TokenType) -> bool {
        self.peek(offset).kind == kind
    }

    pub fn peek_next_eq(&self, kind: TokenType) -> bool {
        self.peek_eq(0, kind)
    }

    /// Consumes and returns the next token; at end of input, returns
    /// `END_OF_FILE` without advancing the cursor past the end.
    pub fn next(&mut self) -> Token {
        if !self.has_next() {
            return Token::eof(self.eof_position());
        }
        let tok = self.tokens[self.cursor].clone();
        self.cursor += 1;
        tok
    }

    /// Asserts the next token's kind; on mismatch raises a `SyntaxError`
    /// anchored at the current position. On match, consumes and returns.
    pub fn expect(&mut self, kind: TokenType) -> Result<Token, Error> {
        self.expect_msg(
            kind,
            format!(
                "expected {} but found {}",
                kind.describe(),
                self.peek_next().kind.describe()
            ),
        )
    }

    pub fn expect_msg(&mut self, kind: TokenType, message: impl Into<String>) -> Result<Token, Error> {
        let next = self.peek_next();
        if next.kind != kind {
            return Err(self.throw_error_at(&next, ErrorKind::Syntax, message));
        }
        Ok(self.next())
    }

    /// Signed advance; negative values roll the cursor back (used after a
    /// look-past that didn't pan out, e.g. in block collection).
    pub fn skip(&mut self, amount: isize) {
        if amount >= 0 {
            self.cursor = self.cursor.saturating_add(amount as usize).min(self.size());
        } else {
            self.cursor = self.cursor.saturating_sub((-amount) as usize);
        }
    }

    /// Returns a new `TokenSet` sharing this one's `SourceFile`, covering
    /// tokens `[offset, offset + length)`, with its own cursor at 0. Fails
    /// with a range error if the requested range doesn't fit.
    pub fn create_subset(&self, offset: usize, length: usize) -> Result<TokenSet, Error> {
        let end = offset.checked_add(length);
        if end.is_none() || end.unwrap() > self.size() {
            return Err(Error::new(
                ErrorKind::Syntax,
                format!(
                    "invalid token subset range [{}, {}) for a set of size {}",
                    offset,
                    offset + length,
                    self.size()
                ),
            ));
        }
        let copied = self.tokens[offset..offset + length].to_vec();
        Ok(TokenSet {
            source: Rc::clone(&self.source),
            tokens: copied,
            cursor: 0,
        })
    }

    /// Anchors a diagnostic at an explicit token.
    pub fn throw_error_at(&self, token: &Token, kind: ErrorKind, message: impl Into<String>) -> Error {
        Error::at(kind, message, Rc::clone(&self.source), token.position)
    }

    /// Anchors a diagnostic at the current cursor position.
    pub fn throw_error(&self, kind: ErrorKind, message: impl Into<String>) -> Error {
        let token = self.peek_next();
        self.throw_error_at(&token, kind, message)
    }
}

/// `collect_block_variant(open, close) == collect_block` when
/// `(open, close) == (LBRACE, RBRACE)`.
pub fn collect_block(set: &mut TokenSet) -> Result<Option<TokenSet>, Error> {
    collect_block_variant(set, TokenType::LBrace, TokenType::RBrace)
}

/// Consumes the opening delimiter and collects everything up to its
/// matching close, tracking nesting depth so the parser never has to track
/// brace/paren depth manually. Returns `Ok(None)` for an empty interior
/// (`{}`), leaving the cursor just past the close. An unmatched closer
/// rolls the cursor back one position and raises a `SyntaxError`.
pub fn collect_block_variant(
    set: &mut TokenSet,
    open: TokenType,
    close: TokenType,
) -> Result<Option<TokenSet>, Error> {
    set.expect(open)?;
    let start = set.position();
    let mut depth: i32 = 1;

    loop {
        let tok = set.peek_next();
        if tok.kind == TokenType::EndOfFile {
            return Err(set.throw_error(
                ErrorKind::Syntax,
                format!("Unmatched closing '{}'", close.describe()),
            ));
        }
        if tok.kind == open {
            depth += 1;
            set.next();
            continue;
        }
        if tok.kind == close {
            depth -= 1;
            if depth == 0 {
                let end = set.position();
                set.next();
                if end == start {
                    return Ok(None);
                }
                return Ok(Some(set.create_subset(start, end - start)?));
            }
            set.next();
            continue;
        }
        set.next();
    }
}

/// Returns a subset covering `[cursor, first T)`. Returns `Ok(None)` if `T`
/// is the very next token (empty span); otherwise consumes through `T`.
pub fn collect_until_token(set: &mut TokenSet, target: TokenType) -> Result<Option<TokenSet>, Error> {
    let start = set.position();
    loop {
        let tok = set.peek_next();
        if tok.kind == TokenType::EndOfFile {
            return Err(set.throw_error(
                ErrorKind::Syntax,
                format!("expected {} before end of file", target.describe()),
            ));
        }
        if tok.kind == target {
            let end = set.position();
            set.next();
            if end == start {
                return Ok(None);
            }
            return Ok(Some(set.create_subset(start, end - start)?));
        }
        set.next();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_file::SourceFile;

    fn tok(kind: TokenType, lexeme: &str) -> Token {
        Token::new(kind, lexeme, SourcePosition::new(0, lexeme.len()))
    }

    fn make_set(kinds: Vec<TokenType>) -> TokenSet {
        let file = SourceFile::new("t.sr", "");
        let tokens = kinds.into_iter().map(|k| tok(k, "x")).collect();
        TokenSet::new(file, tokens)
    }

    #[test]
    fn create_subset_matches_slice() {
        let set = make_set(vec![
            TokenType::Let,
            TokenType::Identifier,
            TokenType::Colon,
            TokenType::Identifier,
        ]);
        let sub = set.create_subset(1, 2).unwrap();
        assert_eq!(sub.size(), 2);
        assert_eq!(sub.peek(0).kind, TokenType::Identifier);
        assert_eq!(sub.peek(1).kind, TokenType::Colon);
    }

    #[test]
    fn create_subset_rejects_out_of_range() {
        let set = make_set(vec![TokenType::Let]);
        assert!(set.create_subset(0, 5).is_err());
    }

    #[test]
    fn peek_past_end_is_eof() {
        let set = make_set(vec![TokenType::Let]);
        assert_eq!(set.peek(10).kind, TokenType::EndOfFile);
    }

    #[test]
    fn collect_block_variant_covers_interior_and_advances_past_close() {
        let mut set = make_set(vec![
            TokenType::LBrace,
            TokenType::Identifier,
            TokenType::LBrace,
            TokenType::Identifier,
            TokenType::RBrace,
            TokenType::RBrace,
            TokenType::Semicolon,
        ]);
        let block = collect_block(&mut set).unwrap().unwrap();
        assert_eq!(block.size(), 4);
        assert_eq!(set.peek_next().kind, TokenType::Semicolon);
    }

    #[test]
    fn collect_block_empty_interior_returns_none() {
        let mut set = make_set(vec![TokenType::LBrace, TokenType::RBrace, TokenType::Semicolon]);
        let block = collect_block(&mut set).unwrap();
        assert!(block.is_none());
        assert_eq!(set.peek_next().kind, TokenType::Semicolon);
    }

    #[test]
    fn collect_block_unmatched_closer_errors() {
        let mut set = make_set(vec![TokenType::LBrace, TokenType::Identifier]);
        let err = collect_block(&mut set).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert!(err.message.contains("Unmatched closing"));
    }

    #[test]
    fn collect_until_token_stops_before_target_and_consumes_it() {
        let mut set = make_set(vec![
            TokenType::Identifier,
            TokenType::Comma,
            TokenType::Identifier,
            TokenType::Semicolon,
        ]);
        let sub = collect_until_token(&mut set, TokenType::Semicolon).unwrap().unwrap();
        assert_eq!(sub.size(), 3);
        assert_eq!(set.position(), 4);
    }
}
