//! The recursive-descent parser: a thin layer over `TokenSet` that builds
//! `ast::Node` trees while populating the `SymbolRegistry` as it goes in a
//! single pass; lowering to IR happens afterward, in its own pass.

pub mod decl;
pub mod expr;
pub mod types;

use stride_core::{Error, ErrorKind, TokenSet, TokenType};

use crate::ast::{Block, Node, ReturnStmt, VarDeclStmt};
use crate::registry::{ScopeId, ScopeType, SymbolRegistry};
use crate::ty::AstType;

use decl::{
    is_enum_declaration, is_function_declaration, is_import_statement, is_module_statement, is_struct_declaration,
    parse_enum, parse_function, parse_import, parse_module, parse_struct, try_parse_lambda,
};
use expr::parse_expression;

/// Parses an entire source file as the implicit top-level block, in the
/// registry's global scope.
pub fn parse_program(registry: &mut SymbolRegistry, set: &mut TokenSet) -> Result<Block, Error> {
    let scope = registry.global();
    parse_sequential(registry, scope, set)
}

/// Parses statements/declarations until the set is exhausted — the
/// dispatch table: `module`, `use`, `enum`, `struct`, `let`, `return`, a
/// lambda, or (falling through) a bare expression statement.
pub fn parse_sequential(registry: &mut SymbolRegistry, scope: ScopeId, set: &mut TokenSet) -> Result<Block, Error> {
    let start_pos = set.peek_next().position;
    let mut children = Vec::new();

    while set.has_next() {
        children.push(parse_statement(registry, scope, set)?);
    }

    let meta = crate::ast::NodeMeta::new(set.source(), start_pos, scope);
    Ok(Block::new(meta, children))
}

fn parse_statement(registry: &mut SymbolRegistry, scope: ScopeId, set: &mut TokenSet) -> Result<Node, Error> {
    if is_module_statement(set) {
        return Ok(Node::Module(parse_module(registry, scope, set)?));
    }
    if is_import_statement(set) {
        if registry.kind_of(scope) != ScopeType::Global {
            return Err(set.throw_error(ErrorKind::Syntax, "'use' is only allowed at the top level of a file"));
        }
        return Ok(Node::Import(parse_import(registry, scope, set)?));
    }
    if is_enum_declaration(set) {
        return Ok(Node::Enum(parse_enum(registry, scope, set)?));
    }
    if is_struct_declaration(set) {
        return Ok(Node::Struct(parse_struct(registry, scope, set)?));
    }
    if is_function_declaration(set) {
        return Ok(Node::Function(parse_function(registry, scope, set)?));
    }
    if set.peek_next_eq(TokenType::Let) {
        return Ok(Node::VarDecl(parse_var_decl(registry, scope, set)?));
    }
    if set.peek_next_eq(TokenType::Return) {
        return Ok(Node::Return(parse_return(registry, scope, set)?));
    }
    if set.peek_next_eq(TokenType::LBrace) {
        let tok = set.peek_next();
        let Some(mut inner) = stride_core::collect_block(set)? else {
            let meta = crate::ast::NodeMeta::new(set.source(), tok.position, scope);
            return Ok(Node::Block(Block::new(meta, Vec::new())));
        };
        let block_scope = registry.derive(scope, ScopeType::Block, "");
        return Ok(Node::Block(parse_sequential(registry, block_scope, &mut inner)?));
    }

    if let Some(lambda) = try_parse_lambda(registry, scope, set)? {
        let expr = crate::ast::Expr::new(lambda.meta.clone(), crate::ast::ExprKind::Lambda(Box::new(lambda)));
        set.expect(TokenType::Semicolon)?;
        return Ok(Node::Expr(expr));
    }

    let expr = parse_expression(registry, scope, set)?;
    set.expect(TokenType::Semicolon)?;
    Ok(Node::Expr(expr))
}

fn parse_var_decl(registry: &mut SymbolRegistry, scope: ScopeId, set: &mut TokenSet) -> Result<VarDeclStmt, Error> {
    let reference = set.expect(TokenType::Let)?;
    let mutable = if set.peek_next_eq(TokenType::Mut) {
        set.next();
        true
    } else {
        false
    };
    let name_tok = set.expect_msg(TokenType::Identifier, "expected a variable name after 'let'")?;

    let ty = if set.peek_next_eq(TokenType::Colon) {
        set.next();
        types::parse_type(set)?
    } else {
        AstType::i32()
    };

    let init = if set.peek_next_eq(TokenType::Equals) {
        set.next();
        Some(parse_expression(registry, scope, set)?)
    } else {
        None
    };
    set.expect(TokenType::Semicolon)?;

    let entry = registry.define_field(scope, &name_tok.lexeme, ty.clone(), &set.source(), name_tok.position)?;

    Ok(VarDeclStmt {
        meta: crate::ast::NodeMeta::new(set.source(), reference.position, scope).with_type(ty.clone()),
        name: name_tok.lexeme,
        internal_name: entry.internal_name,
        ty,
        mutable,
        init,
    })
}

fn parse_return(registry: &mut SymbolRegistry, scope: ScopeId, set: &mut TokenSet) -> Result<ReturnStmt, Error> {
    let reference = set.expect(TokenType::Return)?;
    let value = if set.peek_next_eq(TokenType::Semicolon) {
        None
    } else {
        Some(parse_expression(registry, scope, set)?)
    };
    set.expect(TokenType::Semicolon)?;
    Ok(ReturnStmt { meta: crate::ast::NodeMeta::new(set.source(), reference.position, scope), value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use stride_core::SourceFile;

    fn parse_src(src: &str) -> (SymbolRegistry, Block) {
        let mut registry = SymbolRegistry::new();
        let mut set = crate::lexer::lex(SourceFile::new("t.sr", src)).unwrap();
        let block = parse_program(&mut registry, &mut set).unwrap();
        (registry, block)
    }

    #[allow(dead_code)]
    fn dummy_rc() -> Rc<SourceFile> {
        SourceFile::new("t.sr", "")
    }

    #[test]
    fn parses_variable_declaration_with_initializer() {
        let (_, block) = parse_src("let mut x: i32 = 5;");
        assert_eq!(block.children.len(), 1);
        match &block.children[0] {
            Node::VarDecl(v) => {
                assert_eq!(v.name, "x");
                assert!(v.mutable);
                assert!(v.init.is_some());
            }
            other => panic!("expected VarDecl, got {:?}", other),
        }
    }

    #[test]
    fn parses_function_with_body() {
        let (_, block) = parse_src("fn add(a: i32, b: i32): i32 -> { return a + b; }");
        assert_eq!(block.children.len(), 1);
        match &block.children[0] {
            Node::Function(f) => {
                assert_eq!(f.name, "add");
                assert_eq!(f.params.len(), 2);
                assert!(!f.is_extern());
                assert_eq!(f.internal_name, crate::mangle::resolve_internal_function_name(
                    &f.params.iter().map(|p| p.ty.clone()).collect::<Vec<_>>(),
                    "add",
                ));
            }
            other => panic!("expected Function, got {:?}", other),
        }
    }

    #[test]
    fn parses_extern_function_declaration() {
        let (_, block) = parse_src("fn puts(s: ptr): i32;");
        match &block.children[0] {
            Node::Function(f) => {
                assert!(f.is_extern());
                assert_eq!(f.internal_name, "puts");
            }
            other => panic!("expected Function, got {:?}", other),
        }
    }

    #[test]
    fn parses_enum_declaration() {
        let (_, block) = parse_src("enum Color { RED: 0, GREEN: 1, }");
        match &block.children[0] {
            Node::Enum(e) => {
                assert_eq!(e.name, "Color");
                assert_eq!(e.members.len(), 2);
            }
            other => panic!("expected Enum, got {:?}", other),
        }
    }

    #[test]
    fn parses_struct_alias() {
        let (_, block) = parse_src("struct Handle = ptr;");
        match &block.children[0] {
            Node::Struct(s) => {
                assert!(s.alias.is_some());
            }
            other => panic!("expected Struct, got {:?}", other),
        }
    }

    #[test]
    fn parses_return_with_value() {
        let (_, block) = parse_src("fn f(): i32 -> { return 1; }");
        match &block.children[0] {
            Node::Function(f) => {
                let body = f.body.as_ref().unwrap();
                match &body.children[0] {
                    Node::Return(r) => assert!(r.value.is_some()),
                    other => panic!("expected Return, got {:?}", other),
                }
            }
            other => panic!("expected Function, got {:?}", other),
        }
    }

    #[test]
    fn module_nests_scope_and_reflects_in_qualified_name() {
        let (registry, block) = parse_src("module math { fn add(a: i32, b: i32): i32 -> { return a + b; } }");
        match &block.children[0] {
            Node::Module(m) => {
                assert_eq!(m.name, "math");
                let inner = &m.body.children[0];
                match inner {
                    Node::Function(f) => {
                        assert!(f.internal_name.starts_with("math__add$"));
                        let _ = &registry;
                    }
                    other => panic!("expected Function, got {:?}", other),
                }
            }
            other => panic!("expected Module, got {:?}", other),
        }
    }
}
