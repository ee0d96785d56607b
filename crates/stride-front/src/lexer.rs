//! Turns a `SourceFile`'s text into a `TokenSet`: a from-scratch `logos`
//! lexer so the rest of the crate has something real to parse.

use std::rc::Rc;

use logos::Logos;

use stride_core::{Error, ErrorKind, SourceFile, SourcePosition, Token, TokenSet, TokenType};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
enum Raw {
    #[token("module")]
    Module,
    #[token("use")]
    Use,
    #[token("enum")]
    Enum,
    #[token("struct")]
    Struct,
    #[token("fn")]
    Fn,
    #[token("let")]
    Let,
    #[token("mut")]
    Mut,
    #[token("return")]
    Return,
    #[token("nil")]
    Nil,
    #[token("true")]
    #[token("false")]
    BooleanLit,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Identifier,

    #[regex(r"[0-9]+\.[0-9]+D")]
    Double,
    #[regex(r"[0-9]+\.[0-9]+")]
    Float,
    #[regex(r"0x[0-9a-fA-F]+")]
    Hex,
    #[regex(r"[0-9]+L")]
    LongInteger,
    #[regex(r"[0-9]+")]
    Integer,

    #[regex(r#""([^"\\]|\\.)*""#)]
    StringLit,
    #[regex(r"'([^'\\]|\\.)'")]
    CharLit,

    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LSquare,
    #[token("]")]
    RSquare,
    #[token(",")]
    Comma,
    #[token("::")]
    DoubleColon,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token("...")]
    ThreeDots,
    #[token("->")]
    DashRArrow,
    #[token("==")]
    DoubleEquals,
    #[token("!=")]
    BangEquals,
    #[token("<=")]
    LEquals,
    #[token(">=")]
    GEquals,
    #[token("<")]
    LArrow,
    #[token(">")]
    RArrow,
    #[token("=")]
    Equals,
    #[token("&&")]
    DoubleAmpersand,
    #[token("||")]
    DoublePipe,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("!")]
    Bang,
}

impl Raw {
    fn token_type(self) -> TokenType {
        match self {
            Raw::Module => TokenType::Module,
            Raw::Use => TokenType::Use,
            Raw::Enum => TokenType::Enum,
            Raw::Struct => TokenType::Struct,
            Raw::Fn => TokenType::Fn,
            Raw::Let => TokenType::Let,
            Raw::Mut => TokenType::Mut,
            Raw::Return => TokenType::Return,
            Raw::Nil => TokenType::Nil,
            Raw::BooleanLit => TokenType::BooleanLit,
            Raw::Identifier => TokenType::Identifier,
            Raw::Double => TokenType::Double,
            Raw::Float => TokenType::Float,
            Raw::Hex => TokenType::Hex,
            Raw::LongInteger => TokenType::LongInteger,
            Raw::Integer => TokenType::Integer,
            Raw::StringLit => TokenType::StringLit,
            Raw::CharLit => TokenType::CharLit,
            Raw::LBrace => TokenType::LBrace,
            Raw::RBrace => TokenType::RBrace,
            Raw::LParen => TokenType::LParen,
            Raw::RParen => TokenType::RParen,
            Raw::LSquare => TokenType::LSquare,
            Raw::RSquare => TokenType::RSquare,
            Raw::Comma => TokenType::Comma,
            Raw::DoubleColon => TokenType::DoubleColon,
            Raw::Colon => TokenType::Colon,
            Raw::Semicolon => TokenType::Semicolon,
            Raw::ThreeDots => TokenType::ThreeDots,
            Raw::DashRArrow => TokenType::DashRArrow,
            Raw::DoubleEquals => TokenType::DoubleEquals,
            Raw::BangEquals => TokenType::BangEquals,
            Raw::LEquals => TokenType::LEquals,
            Raw::GEquals => TokenType::GEquals,
            Raw::LArrow => TokenType::LArrow,
            Raw::RArrow => TokenType::RArrow,
            Raw::Equals => TokenType::Equals,
            Raw::DoubleAmpersand => TokenType::DoubleAmpersand,
            Raw::DoublePipe => TokenType::DoublePipe,
            Raw::Plus => TokenType::Plus,
            Raw::Minus => TokenType::Minus,
            Raw::Star => TokenType::Star,
            Raw::Slash => TokenType::Slash,
            Raw::Percent => TokenType::Percent,
            Raw::Bang => TokenType::Bang,
        }
    }
}

/// Resolves backslash escapes in a string or char literal's inner text.
/// Called on the bytes between the quotes, after they've been sliced off.
fn unescape(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Lexes an entire source file into a `TokenSet` positioned at its start.
pub fn lex(source: Rc<SourceFile>) -> Result<TokenSet, Error> {
    let text = source.text();
    let mut lexer = Raw::lexer(text);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let position = SourcePosition::new(span.start, span.len());
        let slice = &text[span.clone()];

        let raw = result.map_err(|_| {
            Error::syntax(
                format!("unrecognized token '{}'", slice),
                Rc::clone(&source),
                position,
            )
        })?;

        let lexeme = match raw {
            Raw::StringLit => unescape(&slice[1..slice.len() - 1]),
            Raw::CharLit => unescape(&slice[1..slice.len() - 1]),
            _ => slice.to_owned(),
        };

        tokens.push(Token::new(raw.token_type(), lexeme, position));
    }

    Ok(TokenSet::new(source, tokens))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_str(src: &str) -> TokenSet {
        lex(SourceFile::new("t.sr", src)).unwrap()
    }

    #[test]
    fn lexes_a_function_declaration() {
        let mut set = lex_str("fn add(a: i32, b: i32): i32 -> { return a; }");
        assert_eq!(set.next().kind, TokenType::Fn);
        assert_eq!(set.next().kind, TokenType::Identifier);
        assert_eq!(set.next().kind, TokenType::LParen);
    }

    #[test]
    fn distinguishes_integer_long_and_hex() {
        let mut set = lex_str("1 1L 0x1F");
        assert_eq!(set.next().kind, TokenType::Integer);
        assert_eq!(set.next().kind, TokenType::LongInteger);
        assert_eq!(set.next().kind, TokenType::Hex);
    }

    #[test]
    fn distinguishes_float_and_double() {
        let mut set = lex_str("1.5 1.5D");
        assert_eq!(set.next().kind, TokenType::Float);
        assert_eq!(set.next().kind, TokenType::Double);
    }

    #[test]
    fn unescapes_string_literals() {
        let mut set = lex_str(r#""a\nb""#);
        let tok = set.next();
        assert_eq!(tok.kind, TokenType::StringLit);
        assert_eq!(tok.lexeme, "a\nb");
    }

    #[test]
    fn skips_line_comments() {
        let mut set = lex_str("// comment\nfn");
        assert_eq!(set.next().kind, TokenType::Fn);
    }

    #[test]
    fn keywords_win_over_identifier() {
        let mut set = lex_str("return returning");
        assert_eq!(set.next().kind, TokenType::Return);
        let id = set.next();
        assert_eq!(id.kind, TokenType::Identifier);
        assert_eq!(id.lexeme, "returning");
    }
}
