use std::sync::atomic::{AtomicU32, Ordering};

use stride_core::{self, Error, ErrorKind, TokenSet, TokenType};

use crate::ast::{
    EnumDecl, EnumMember, FunctionDecl, FunctionParam, ImportDecl, ModuleDecl, NodeMeta, StructDecl, StructMember,
};
use crate::mangle::resolve_internal_function_name;
use crate::registry::{ScopeId, ScopeType, SymbolKind, SymbolRegistry};
use crate::ty::{self, AstType, FLAG_FN_PARAM_MUTABLE, FLAG_TYPE_VARIADIC};

use super::parse_sequential;
use super::types::parse_type;

/// Hard cap on declared parameters.
pub const MAX_FUNCTION_PARAMETERS: usize = 255;

/// Process-wide monotonic counter backing lambdas' synthesized
/// `__anonymous_<N>` names — would need to become thread/module-local if
/// compilation is ever parallelised.
static ANONYMOUS_COUNTER: AtomicU32 = AtomicU32::new(0);

fn next_anonymous_name() -> String {
    let n = ANONYMOUS_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("__anonymous_{}", n)
}

fn parse_literal_value(set: &mut TokenSet) -> Result<crate::ast::Literal, Error> {
    use crate::ast::Literal;
    let tok = set.peek_next();
    match tok.kind {
        TokenType::Integer | TokenType::Hex | TokenType::LongInteger => {
            set.next();
            let is_long = tok.kind == TokenType::LongInteger;
            let digits: &str = if is_long { &tok.lexeme[..tok.lexeme.len() - 1] } else { &tok.lexeme };
            let radix = if tok.kind == TokenType::Hex { 16 } else { 10 };
            let digits = digits.trim_start_matches("0x");
            let value = i64::from_str_radix(digits, radix)
                .map_err(|_| Error::semantic("invalid integer literal", set.source(), tok.position))?;
            let bits = if is_long {
                64
            } else if (-128..128).contains(&value) {
                8
            } else if (-32768..32768).contains(&value) {
                16
            } else {
                32
            };
            Ok(Literal::Int { value, bits })
        }
        TokenType::BooleanLit => {
            set.next();
            Ok(Literal::Bool(tok.lexeme == "true"))
        }
        TokenType::CharLit => {
            set.next();
            Ok(Literal::Char(tok.lexeme.chars().next().unwrap_or('\0')))
        }
        TokenType::Double => {
            set.next();
            let digits = &tok.lexeme[..tok.lexeme.len() - 1];
            let value: f64 = digits
                .parse()
                .map_err(|_| Error::semantic("invalid double literal", set.source(), tok.position))?;
            Ok(Literal::Double(value))
        }
        TokenType::Float => {
            set.next();
            let value: f32 = tok
                .lexeme
                .parse()
                .map_err(|_| Error::semantic("invalid float literal", set.source(), tok.position))?;
            Ok(Literal::Float(value))
        }
        TokenType::Nil => {
            set.next();
            Ok(Literal::Nil)
        }
        _ => Err(set.throw_error(ErrorKind::Syntax, "expected a literal value")),
    }
}

// ---------------------------------------------------------------- module

pub fn is_module_statement(set: &TokenSet) -> bool {
    set.peek_next_eq(TokenType::Module)
}

pub fn parse_module(registry: &mut SymbolRegistry, scope: ScopeId, set: &mut TokenSet) -> Result<ModuleDecl, Error> {
    let reference = set.expect(TokenType::Module)?;
    let name_tok = set.expect_msg(TokenType::Identifier, "expected module name after 'module'")?;

    registry.define_symbol(scope, &name_tok.lexeme, SymbolKind::Module, &set.source(), name_tok.position)?;
    let module_scope = registry.derive(scope, ScopeType::Module, name_tok.lexeme.clone());

    let Some(mut body_set) = stride_core::collect_block(set)? else {
        let meta = NodeMeta::new(set.source(), reference.position, scope);
        let body_meta = NodeMeta::new(set.source(), name_tok.position, module_scope);
        return Ok(ModuleDecl {
            meta,
            name: name_tok.lexeme,
            scope: module_scope,
            body: crate::ast::Block::new(body_meta, Vec::new()),
        });
    };

    let body = parse_sequential(registry, module_scope, &mut body_set)?;
    let meta = NodeMeta::new(set.source(), reference.position, scope);
    Ok(ModuleDecl { meta, name: name_tok.lexeme, scope: module_scope, body })
}

// ---------------------------------------------------------------- import

pub fn is_import_statement(set: &TokenSet) -> bool {
    set.peek_next_eq(TokenType::Use)
}

pub fn parse_import(registry: &mut SymbolRegistry, scope: ScopeId, set: &mut TokenSet) -> Result<ImportDecl, Error> {
    let _ = registry;
    let reference = set.expect(TokenType::Use)?;

    let base_first = set.expect_msg(TokenType::Identifier, "expected module path after 'use'")?;
    let mut base_segments = vec![base_first.lexeme];
    while set.peek_next_eq(TokenType::DoubleColon) && set.peek_eq(1, TokenType::Identifier) {
        set.next();
        let seg = set.expect(TokenType::Identifier)?;
        base_segments.push(seg.lexeme);
    }
    let module_base = base_segments.join(crate::registry::SEGMENT_DELIMITER);

    set.expect(TokenType::DoubleColon)?;
    set.expect(TokenType::LBrace)?;
    let first = set.expect_msg(TokenType::Identifier, "expected symbol in import list")?;
    let mut submodules = vec![first.lexeme];
    while set.peek_next_eq(TokenType::Comma) && set.peek_eq(1, TokenType::Identifier) {
        set.next();
        let sym = set.expect(TokenType::Identifier)?;
        submodules.push(sym.lexeme);
    }
    set.expect(TokenType::RBrace)?;
    set.expect(TokenType::Semicolon)?;

    if submodules.is_empty() {
        return Err(set.throw_error(ErrorKind::Syntax, "expected at least one symbol in import submodule list"));
    }

    let meta = NodeMeta::new(set.source(), reference.position, scope);
    Ok(ImportDecl { meta, module_base, submodules })
}

// ------------------------------------------------------------------ enum

pub fn is_enum_declaration(set: &TokenSet) -> bool {
    set.peek_next_eq(TokenType::Enum)
}

pub fn parse_enum(registry: &mut SymbolRegistry, scope: ScopeId, set: &mut TokenSet) -> Result<EnumDecl, Error> {
    let reference = set.expect(TokenType::Enum)?;
    let name_tok = set.expect_msg(TokenType::Identifier, "expected enum name")?;
    registry.define_symbol(scope, &name_tok.lexeme, SymbolKind::Enum, &set.source(), name_tok.position)?;

    let enum_scope = registry.derive(scope, ScopeType::Block, "");

    let Some(mut body) = stride_core::collect_block(set)? else {
        return Err(set.throw_error(ErrorKind::Syntax, "expected a block in enum declaration"));
    };

    let mut members = Vec::new();
    while body.has_next() {
        let member_tok = body.expect(TokenType::Identifier)?;
        registry.define_symbol(enum_scope, &member_tok.lexeme, SymbolKind::EnumMember, &body.source(), member_tok.position)?;
        body.expect_msg(TokenType::Colon, "expected a colon after enum member name")?;
        let value = parse_literal_value(&mut body)?;
        body.expect_msg(TokenType::Comma, "expected a comma after enum member value")?;
        members.push(EnumMember {
            meta: NodeMeta::new(body.source(), member_tok.position, enum_scope),
            name: member_tok.lexeme,
            value,
        });
    }

    Ok(EnumDecl {
        meta: NodeMeta::new(set.source(), reference.position, scope),
        name: name_tok.lexeme,
        scope: enum_scope,
        members,
    })
}

// ---------------------------------------------------------------- struct

pub fn is_struct_declaration(set: &TokenSet) -> bool {
    set.peek_next_eq(TokenType::Struct)
}

pub fn parse_struct(registry: &mut SymbolRegistry, scope: ScopeId, set: &mut TokenSet) -> Result<StructDecl, Error> {
    let reference = set.expect(TokenType::Struct)?;
    let name_tok = set.expect_msg(TokenType::Identifier, "expected struct name")?;
    registry.define_symbol(scope, &name_tok.lexeme, SymbolKind::Struct, &set.source(), name_tok.position)?;

    let struct_scope = registry.derive(scope, ScopeType::Block, "");

    if set.peek_next_eq(TokenType::Equals) {
        set.next();
        let alias = parse_type(set)?;
        set.expect(TokenType::Semicolon)?;
        return Ok(StructDecl {
            meta: NodeMeta::new(set.source(), reference.position, scope),
            name: name_tok.lexeme,
            scope: struct_scope,
            alias: Some(alias),
            members: Vec::new(),
        });
    }

    let mut members = Vec::new();
    if let Some(mut body) = stride_core::collect_block(set)? {
        while body.has_next() {
            let member_tok = body.expect_msg(TokenType::Identifier, "expected struct member name")?;
            registry.define_field(struct_scope, &member_tok.lexeme, AstType::void(), &body.source(), member_tok.position)?;
            body.expect(TokenType::Colon)?;
            let ty = parse_type(&mut body)?;
            body.expect(TokenType::Semicolon)?;
            members.push(StructMember {
                meta: NodeMeta::new(body.source(), member_tok.position, struct_scope),
                name: member_tok.lexeme,
                ty,
            });
        }
    }

    Ok(StructDecl {
        meta: NodeMeta::new(set.source(), reference.position, scope),
        name: name_tok.lexeme,
        scope: struct_scope,
        alias: None,
        members,
    })
}

// -------------------------------------------------------------- function

pub fn is_function_declaration(set: &TokenSet) -> bool {
    set.peek_next_eq(TokenType::Fn)
}

fn parse_standalone_param(
    registry: &mut SymbolRegistry,
    fn_scope: ScopeId,
    set: &mut TokenSet,
) -> Result<FunctionParam, Error> {
    let mut mutable = false;
    if set.peek_next_eq(TokenType::Mut) {
        mutable = true;
        set.next();
    }
    let name_tok = set.expect_msg(TokenType::Identifier, "expected a function parameter name")?;
    set.expect(TokenType::Colon)?;
    let ty = parse_type(set)?;

    registry.define_field(fn_scope, &name_tok.lexeme, ty.clone(), &set.source(), name_tok.position)?;

    let mut flags = ty::FLAG_NONE;
    if mutable {
        flags |= FLAG_FN_PARAM_MUTABLE;
    }

    Ok(FunctionParam {
        meta: NodeMeta::new(set.source(), name_tok.position, fn_scope).with_flags(flags),
        name: name_tok.lexeme,
        ty,
        mutable,
        variadic: false,
    })
}

fn parse_params(
    registry: &mut SymbolRegistry,
    fn_scope: ScopeId,
    set: &mut TokenSet,
) -> Result<(Vec<FunctionParam>, bool), Error> {
    let mut params = Vec::new();
    let mut is_variadic = false;

    if set.peek_next_eq(TokenType::RParen) {
        return Ok((params, is_variadic));
    }

    if set.peek_next_eq(TokenType::ThreeDots) {
        set.next();
        let mut p = parse_standalone_param(registry, fn_scope, set)?;
        p.variadic = true;
        p.meta.flags |= FLAG_TYPE_VARIADIC;
        params.push(p);
        is_variadic = true;
    } else {
        params.push(parse_standalone_param(registry, fn_scope, set)?);
    }

    while set.peek_next_eq(TokenType::Comma) {
        let comma = set.next();
        if params.len() > MAX_FUNCTION_PARAMETERS {
            return Err(set.throw_error_at(
                &comma,
                ErrorKind::Syntax,
                format!("function cannot have more than {} parameters", MAX_FUNCTION_PARAMETERS),
            ));
        }

        if set.peek_next_eq(TokenType::ThreeDots) {
            if is_variadic {
                return Err(set.throw_error(ErrorKind::Syntax, "a function can only have one variadic parameter"));
            }
            set.next();
            let mut p = parse_standalone_param(registry, fn_scope, set)?;
            p.variadic = true;
            p.meta.flags |= FLAG_TYPE_VARIADIC;
            is_variadic = true;
            params.push(p);
            if !set.peek_next_eq(TokenType::RParen) {
                return Err(set.throw_error(
                    ErrorKind::Syntax,
                    "expected closing parenthesis after variadic parameter; variadic parameter must be last parameter",
                ));
            }
            break;
        }

        if is_variadic {
            return Err(set.throw_error(ErrorKind::Syntax, "variadic parameter must be last parameter"));
        }

        let param = parse_standalone_param(registry, fn_scope, set)?;
        if params.iter().any(|existing: &FunctionParam| existing.name == param.name) {
            return Err(set.throw_error(
                ErrorKind::Semantic,
                format!("duplicate parameter name \"{}\" in function definition", param.name),
            ));
        }
        params.push(param);
    }

    Ok((params, is_variadic))
}

fn function_decl_inner(
    registry: &mut SymbolRegistry,
    scope: ScopeId,
    set: &mut TokenSet,
    reference_pos: stride_core::SourcePosition,
    name: String,
    is_extern_candidate: bool,
) -> Result<FunctionDecl, Error> {
    let fn_scope = registry.derive(scope, ScopeType::Function, "");

    set.expect(TokenType::LParen)?;
    let (params, is_variadic) = parse_params(registry, fn_scope, set)?;
    set.expect(TokenType::RParen)?;
    set.expect(TokenType::Colon)?;
    let ret = parse_type(set)?;

    let param_types: Vec<AstType> = params.iter().map(|p| p.ty.clone()).collect();

    let body = if is_extern_candidate && set.peek_next_eq(TokenType::Semicolon) {
        set.next();
        None
    } else {
        set.expect(TokenType::DashRArrow)?;
        let body_scope = registry.derive(fn_scope, ScopeType::Block, "");
        match stride_core::collect_block(set)? {
            Some(mut body_set) => Some(parse_sequential(registry, body_scope, &mut body_set)?),
            None => Some(crate::ast::Block::new(NodeMeta::new(set.source(), reference_pos, body_scope), Vec::new())),
        }
    };

    Ok(finish_function(
        registry, scope, fn_scope, set, reference_pos, name, param_types, params, ret, is_variadic, body,
    ))
}

#[allow(clippy::too_many_arguments)]
fn finish_function(
    registry: &mut SymbolRegistry,
    scope: ScopeId,
    fn_scope: ScopeId,
    set: &TokenSet,
    reference_pos: stride_core::SourcePosition,
    name: String,
    param_types: Vec<AstType>,
    params: Vec<FunctionParam>,
    ret: AstType,
    is_variadic: bool,
    body: Option<crate::ast::Block>,
) -> FunctionDecl {
    // Register the name in the *enclosing* scope first, so sibling
    // declarations and call sites can find it during lookup; this also
    // gives us the symbol's module-qualified (but not yet overload-mangled)
    // name, which is the mangle input — using the bare `name` here would let
    // same-named functions in different modules collide in the IR's flat
    // function table.
    let _ = registry.define_symbol(scope, &name, SymbolKind::Function, &set.source(), reference_pos);
    let qualified = registry.qualified_name(scope, &name);

    let internal_name = if name == crate::mangle::MAIN_FN_NAME {
        name.clone()
    } else if body.is_none() {
        qualified
    } else {
        resolve_internal_function_name(&param_types, &qualified)
    };

    FunctionDecl {
        meta: NodeMeta::new(set.source(), reference_pos, scope),
        name,
        internal_name,
        params,
        ret,
        is_variadic,
        scope: fn_scope,
        body,
    }
}

pub fn parse_function(registry: &mut SymbolRegistry, scope: ScopeId, set: &mut TokenSet) -> Result<FunctionDecl, Error> {
    let reference = set.expect(TokenType::Fn)?;
    let name_tok = set.expect_msg(TokenType::Identifier, "expected a function name")?;
    function_decl_inner(registry, scope, set, reference.position, name_tok.lexeme, true)
}

/// A lambda is recognised by the 3-token lookahead `(` IDENT `:`; it parses
/// exactly like a named function but under a synthesized `__anonymous_<N>`
/// name, and always has a body.
pub fn try_parse_lambda(
    registry: &mut SymbolRegistry,
    scope: ScopeId,
    set: &mut TokenSet,
) -> Result<Option<FunctionDecl>, Error> {
    let looks_like_lambda = set.peek_eq(0, TokenType::LParen)
        && set.peek_eq(1, TokenType::Identifier)
        && set.peek_eq(2, TokenType::Colon);
    if !looks_like_lambda {
        return Ok(None);
    }
    let reference = set.peek_next();
    let name = next_anonymous_name();
    let decl = function_decl_inner(registry, scope, set, reference.position, name, false)?;
    Ok(Some(decl))
}

#[cfg(test)]
mod tests {
    use stride_core::{Error, ErrorKind, SourceFile};

    use crate::registry::SymbolRegistry;

    fn parse(src: &str) -> Result<crate::ast::Block, Error> {
        let mut registry = SymbolRegistry::new();
        let mut set = crate::lexer::lex(SourceFile::new("t.sr", src)).unwrap();
        crate::parser::parse_program(&mut registry, &mut set)
    }

    #[test]
    fn trailing_variadic_parameter_is_accepted() {
        parse("fn f(x: i32, ...xs: i32): void -> { }").unwrap();
    }

    #[test]
    fn leading_variadic_followed_by_another_parameter_is_a_syntax_error() {
        let err = parse("fn f(...xs: i32, y: i32): void -> { }").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert!(err.message.contains("variadic parameter must be last parameter"));
    }

    #[test]
    fn second_variadic_parameter_is_a_syntax_error() {
        let err = parse("fn f(...xs: i32, ...ys: i32): void -> { }").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
    }
}
