use stride_core::{ErrorKind, TokenSet, TokenType};
use stride_core::Error;

use crate::ty::{AstType, PrimitiveType};

/// Parses a type expression: a primitive keyword, a named (enum/struct)
/// identifier, a function type `(T1, T2) -> Ret`, or any of those followed
/// by one or more `[N]` array suffixes.
pub fn parse_type(set: &mut TokenSet) -> Result<AstType, Error> {
    let mut base = parse_type_atom(set)?;
    while set.peek_next_eq(TokenType::LSquare) {
        set.next();
        let size_tok = set.expect(TokenType::Integer)?;
        let size: usize = size_tok.lexeme.parse().map_err(|_| {
            set.throw_error_at(&size_tok, ErrorKind::Syntax, "invalid array size")
        })?;
        set.expect(TokenType::RSquare)?;
        base = AstType::Array(Box::new(base), size);
    }
    Ok(base)
}

fn parse_type_atom(set: &mut TokenSet) -> Result<AstType, Error> {
    if set.peek_next_eq(TokenType::LParen) {
        set.next();
        let mut params = Vec::new();
        if !set.peek_next_eq(TokenType::RParen) {
            params.push(parse_type(set)?);
            while set.peek_next_eq(TokenType::Comma) {
                set.next();
                params.push(parse_type(set)?);
            }
        }
        set.expect(TokenType::RParen)?;
        set.expect(TokenType::DashRArrow)?;
        let ret = parse_type(set)?;
        return Ok(AstType::Function(params, Box::new(ret)));
    }

    let tok = set.expect_msg(TokenType::Identifier, "expected a type")?;
    match PrimitiveType::from_keyword(&tok.lexeme) {
        Some(p) => Ok(AstType::Primitive(p)),
        None => Ok(AstType::Named(tok.lexeme)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use stride_core::SourceFile;

    fn set_for(src: &str) -> TokenSet {
        crate::lexer::lex(SourceFile::new("t.sr", src)).unwrap()
    }

    #[allow(dead_code)]
    fn dummy_rc() -> Rc<SourceFile> {
        SourceFile::new("t.sr", "")
    }

    #[test]
    fn parses_primitive_type() {
        let mut set = set_for("i32");
        assert_eq!(parse_type(&mut set).unwrap(), AstType::Primitive(PrimitiveType::I32));
    }

    #[test]
    fn parses_named_type() {
        let mut set = set_for("Foo");
        assert_eq!(parse_type(&mut set).unwrap(), AstType::Named("Foo".to_owned()));
    }

    #[test]
    fn parses_array_type() {
        let mut set = set_for("i32[4]");
        assert_eq!(
            parse_type(&mut set).unwrap(),
            AstType::Array(Box::new(AstType::Primitive(PrimitiveType::I32)), 4)
        );
    }

    #[test]
    fn parses_function_type() {
        let mut set = set_for("(i32, f64) -> bool");
        let ty = parse_type(&mut set).unwrap();
        assert_eq!(
            ty,
            AstType::Function(
                vec![AstType::Primitive(PrimitiveType::I32), AstType::Primitive(PrimitiveType::F64)],
                Box::new(AstType::Primitive(PrimitiveType::Bool))
            )
        );
    }
}
