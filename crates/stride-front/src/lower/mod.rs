//! The two-pass lowering driver: pass 1 walks the whole tree
//! declaring every function's signature up front (so mutual/forward
//! recursion and lambdas-used-before-their-textual-position both resolve);
//! pass 2 walks the same flat list defining each body. Nested declarations
//! (inner `fn`, lambdas) are hoisted into the same flat list rather than
//! lowered recursively from inside a parent function's builder session —
//! `FunctionBuilder` holds an exclusive borrow of the module for its whole
//! lifetime, so two builder sessions can never be active at once.

mod expr;
mod stmt;

use std::collections::HashMap;

use stride_core::Error;
use stride_ir::{FunctionId, IrType, Module, ModuleBuilder, Value};

use crate::ast::{Block, Expr, ExprKind, FunctionDecl, Node};
use crate::registry::SymbolRegistry;
use crate::ty::AstType;

pub(crate) use expr::lower_expr;
pub(crate) use stmt::lower_var_decl;

/// Everything the lowering pass needs to resolve a call or function-value
/// reference: its IR identity plus enough of its source signature to check
/// arity and report its return type.
pub(crate) struct FnSig {
    pub id: FunctionId,
    pub param_count: usize,
    pub is_variadic: bool,
    pub ret: AstType,
}

/// Read-only context threaded through every lowering function. `fn_sigs` is
/// keyed by each function's already-resolved `internal_name` (module path +
/// mangle digest, or the bare name for `main`/externs/lambdas).
pub(crate) struct LowerCtx<'a> {
    pub registry: &'a SymbolRegistry,
    pub fn_sigs: &'a HashMap<String, FnSig>,
}

/// Per-function mutable state: the live variable-to-slot map (keyed by the
/// field's module-qualified internal name, so shadowing across nested
/// blocks is impossible by construction) and the lazily-created variadic
/// argument handle.
pub(crate) struct FnState {
    pub vars: HashMap<String, (Value, AstType)>,
    pub is_variadic: bool,
    pub va_handle: Option<Value>,
}

impl FnState {
    fn new(is_variadic: bool) -> Self {
        Self { vars: HashMap::new(), is_variadic, va_handle: None }
    }
}

fn declare_signature(mb: &mut ModuleBuilder, f: &FunctionDecl) {
    let params: Vec<IrType> = f.params.iter().filter(|p| !p.variadic).map(|p| p.ty.to_ir()).collect();
    mb.declare_function(&f.internal_name, params, f.ret.to_ir(), f.is_variadic);
}

/// Pass 1: discovers and declares every function reachable from `block`,
/// in source order, appending each to `out`. Top-level (and module-level)
/// nodes are restricted to declarations; function bodies are walked
/// permissively, descending into nested blocks and every sub-expression
/// looking for lambdas.
fn discover_top_level<'a>(
    mb: &mut ModuleBuilder,
    block: &'a Block,
    out: &mut Vec<&'a FunctionDecl>,
) -> Result<(), Error> {
    for node in &block.children {
        match node {
            Node::Function(f) => {
                declare_signature(mb, f);
                out.push(f);
                if let Some(body) = &f.body {
                    discover_in_statements(mb, body, out)?;
                }
            }
            Node::Module(m) => discover_top_level(mb, &m.body, out)?,
            Node::Enum(_) | Node::Struct(_) | Node::Import(_) => {}
            other => {
                return Err(Error::semantic(
                    "only declarations ('fn', 'enum', 'struct', 'module', 'use') are allowed at this level",
                    node_meta(other).source.clone(),
                    node_meta(other).position,
                ));
            }
        }
    }
    Ok(())
}

fn discover_in_statements<'a>(
    mb: &mut ModuleBuilder,
    block: &'a Block,
    out: &mut Vec<&'a FunctionDecl>,
) -> Result<(), Error> {
    for node in &block.children {
        match node {
            Node::Function(f) => {
                declare_signature(mb, f);
                out.push(f);
                if let Some(body) = &f.body {
                    discover_in_statements(mb, body, out)?;
                }
            }
            Node::VarDecl(v) => {
                if let Some(init) = &v.init {
                    discover_in_expr(mb, init, out)?;
                }
            }
            Node::Return(r) => {
                if let Some(value) = &r.value {
                    discover_in_expr(mb, value, out)?;
                }
            }
            Node::Expr(e) => discover_in_expr(mb, e, out)?,
            Node::Block(b) => discover_in_statements(mb, b, out)?,
            Node::Enum(_) | Node::Struct(_) | Node::Module(_) | Node::Import(_) => {
                return Err(Error::semantic(
                    "declarations are not allowed inside a function body",
                    node_meta(node).source.clone(),
                    node_meta(node).position,
                ));
            }
        }
    }
    Ok(())
}

fn discover_in_expr<'a>(mb: &mut ModuleBuilder, expr: &'a Expr, out: &mut Vec<&'a FunctionDecl>) -> Result<(), Error> {
    match &expr.kind {
        ExprKind::Lambda(decl) => {
            declare_signature(mb, decl);
            out.push(decl.as_ref());
            if let Some(body) = &decl.body {
                discover_in_statements(mb, body, out)?;
            }
        }
        ExprKind::Binary { lhs, rhs, .. } | ExprKind::Comparison { lhs, rhs, .. } | ExprKind::Logical { lhs, rhs, .. } => {
            discover_in_expr(mb, lhs, out)?;
            discover_in_expr(mb, rhs, out)?;
        }
        ExprKind::ArrayIndex { base, index } => {
            discover_in_expr(mb, base, out)?;
            discover_in_expr(mb, index, out)?;
        }
        ExprKind::ArrayInitializer(elements) => {
            for el in elements {
                discover_in_expr(mb, el, out)?;
            }
        }
        ExprKind::Call { args, .. } => {
            for a in args {
                discover_in_expr(mb, a, out)?;
            }
        }
        ExprKind::Literal(_) | ExprKind::Str(_) | ExprKind::Identifier(_) | ExprKind::VariadicRef => {}
    }
    Ok(())
}

fn node_meta(node: &Node) -> &crate::ast::NodeMeta {
    match node {
        Node::VarDecl(v) => &v.meta,
        Node::Return(r) => &r.meta,
        Node::Block(b) => &b.meta,
        Node::Expr(e) => &e.meta,
        Node::Function(f) => &f.meta,
        Node::Enum(e) => &e.meta,
        Node::Struct(s) => &s.meta,
        Node::Module(m) => &m.meta,
        Node::Import(i) => &i.meta,
    }
}

fn bind_parameters(registry: &SymbolRegistry, fb: &mut stride_ir::FunctionBuilder, state: &mut FnState, f: &FunctionDecl) {
    for (i, p) in f.params.iter().enumerate() {
        if p.variadic {
            continue;
        }
        let field = registry
            .field_lookup(f.scope, &p.name)
            .expect("function parameters are defined in their own scope during parsing");
        let ir_ty = p.ty.to_ir();
        let slot = fb.alloca_in_entry(ir_ty);
        let arg = fb.argument(i);
        fb.store(slot, arg);
        state.vars.insert(field.internal_name.clone(), (slot, p.ty.clone()));
    }
}

/// Lowers a function body's statement list, returning whether the current
/// block ended terminated (so a caller iterating sibling nodes of an outer
/// block knows to stop — the "skip children after a terminated block"
/// rule). Nested `fn` declarations are never visited here: pass 1
/// already hoisted them into the flat discovery list.
fn lower_body(
    ctx: &LowerCtx,
    fb: &mut stride_ir::FunctionBuilder,
    state: &mut FnState,
    block: &Block,
) -> Result<bool, Error> {
    let mut terminated = false;
    for node in &block.children {
        if terminated {
            continue;
        }
        match node {
            Node::Function(_) => {}
            Node::VarDecl(v) => {
                lower_var_decl(ctx, fb, state, v)?;
            }
            Node::Return(r) => {
                let value = match &r.value {
                    Some(expr) => Some(lower_expr(ctx, fb, state, expr)?.0),
                    None => None,
                };
                fb.ret(value);
                terminated = true;
            }
            Node::Expr(e) => {
                lower_expr(ctx, fb, state, e)?;
            }
            Node::Block(b) => {
                terminated = lower_body(ctx, fb, state, b)?;
            }
            Node::Enum(_) | Node::Struct(_) | Node::Module(_) | Node::Import(_) => {
                let meta = node_meta(node);
                return Err(Error::semantic(
                    "declarations are not allowed inside a function body",
                    meta.source.clone(),
                    meta.position,
                ));
            }
        }
    }
    Ok(terminated)
}

/// Lowers an entire parsed program into a finished IR `Module`.
pub fn lower_program(registry: &SymbolRegistry, program: &Block, module_name: &str, target_triple: &str) -> Result<Module, Error> {
    let mut mb = ModuleBuilder::new(module_name, target_triple);

    let mut flat: Vec<&FunctionDecl> = Vec::new();
    discover_top_level(&mut mb, program, &mut flat)?;

    let fn_sigs: HashMap<String, FnSig> = flat
        .iter()
        .map(|f| {
            let id = mb
                .lookup_function(&f.internal_name)
                .expect("every function in `flat` was declared in pass 1");
            (
                f.internal_name.clone(),
                FnSig {
                    id,
                    param_count: f.params.len(),
                    is_variadic: f.is_variadic,
                    ret: f.ret.clone(),
                },
            )
        })
        .collect();

    for f in &flat {
        let Some(body) = &f.body else { continue };
        let id = fn_sigs[&f.internal_name].id;
        let mut fb = mb.define_function(id);
        let mut state = FnState::new(f.is_variadic);
        bind_parameters(registry, &mut fb, &mut state, f);
        let ctx = LowerCtx { registry, fn_sigs: &fn_sigs };
        let terminated = lower_body(&ctx, &mut fb, &mut state, body)?;
        if !terminated {
            fb.ret(None);
        }
    }

    let module = mb.finish();
    module.verify().map_err(Error::backend)?;
    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SymbolRegistry;
    use stride_core::SourceFile;

    fn lower_src(src: &str) -> Module {
        let mut registry = SymbolRegistry::new();
        let mut set = crate::lexer::lex(SourceFile::new("t.sr", src)).unwrap();
        let program = crate::parser::parse_program(&mut registry, &mut set).unwrap();
        lower_program(&registry, &program, "t", "x86_64-unknown-linux-gnu").unwrap()
    }

    #[test]
    fn lowers_main_returning_a_constant() {
        let module = lower_src("fn main(): i32 -> { return 42; }");
        let id = module.lookup_function("main").unwrap();
        let f = module.function(id);
        assert!(!f.is_declaration);
        assert!(module.verify().is_ok());
    }

    #[test]
    fn lowers_arithmetic_and_calls() {
        let module = lower_src(
            "fn add(a: i32, b: i32): i32 -> { return a + b; } \
             fn main(): i32 -> { return add(1, 2); }",
        );
        assert!(module.verify().is_ok());
    }

    #[test]
    fn lowers_short_circuit_and() {
        let module = lower_src("fn f(a: bool, b: bool): bool -> { return a && b; }");
        assert!(module.verify().is_ok());
        let f = module.functions().iter().find(|f| f.name.starts_with("f$")).expect("mangled 'f' function should exist");
        assert!(f.blocks.len() >= 3);
    }

    #[test]
    fn rejects_statement_at_global_scope() {
        let mut registry = SymbolRegistry::new();
        let mut set = crate::lexer::lex(SourceFile::new("t.sr", "5;")).unwrap();
        let program = crate::parser::parse_program(&mut registry, &mut set).unwrap();
        let err = lower_program(&registry, &program, "t", "x86_64-unknown-linux-gnu").unwrap_err();
        assert_eq!(err.kind, stride_core::ErrorKind::Semantic);
    }
}
