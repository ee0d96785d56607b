use stride_core::Error;
use stride_ir::{FunctionBuilder, IrType};

use crate::ast::{ArithOp as AstArithOp, ComparisonOp, Expr, ExprKind, Literal, LogicalOp, NodeMeta};
use crate::mangle::resolve_internal_function_name;
use crate::registry::SymbolKind;
use crate::ty::{AstType, PrimitiveType};

use super::{FnState, LowerCtx};

/// Lowers any expression to the `Value` it produces and that value's
/// static type. Array-typed values are always pointers to their backing
/// storage — they are never "loaded" as an aggregate — so that indexing
/// and nested-array addressing fall out of the same rule used for scalars.
pub(super) fn lower_expr(
    ctx: &LowerCtx,
    fb: &mut FunctionBuilder,
    state: &mut FnState,
    expr: &Expr,
) -> Result<(stride_ir::Value, AstType), Error> {
    match &expr.kind {
        ExprKind::Literal(lit) => Ok(lower_literal(fb, lit)),
        ExprKind::Str(s) => {
            let idx = fb.intern_string(s);
            let v = fb.global_string(idx);
            Ok((v, AstType::Primitive(PrimitiveType::Ptr)))
        }
        ExprKind::Identifier(segments) => lower_identifier(ctx, fb, state, segments, &expr.meta),
        ExprKind::Binary { op, lhs, rhs } => lower_binary(ctx, fb, state, *op, lhs, rhs),
        ExprKind::Comparison { op, lhs, rhs } => lower_comparison(ctx, fb, state, *op, lhs, rhs),
        ExprKind::Logical { op, lhs, rhs } => lower_logical(ctx, fb, state, *op, lhs, rhs),
        ExprKind::ArrayInitializer(elements) => lower_array_initializer(ctx, fb, state, &expr.meta, elements),
        ExprKind::ArrayIndex { base, index } => lower_array_index(ctx, fb, state, &expr.meta, base, index),
        ExprKind::Call { name, args } => lower_call(ctx, fb, state, &expr.meta, name, args),
        ExprKind::Lambda(decl) => lower_lambda(ctx, fb, decl),
        ExprKind::VariadicRef => lower_variadic_ref(fb, state, &expr.meta),
    }
}

fn lower_literal(fb: &mut FunctionBuilder, lit: &Literal) -> (stride_ir::Value, AstType) {
    match lit {
        Literal::Int { value, bits } => {
            let prim = match bits {
                8 => PrimitiveType::I8,
                16 => PrimitiveType::I16,
                32 => PrimitiveType::I32,
                _ => PrimitiveType::I64,
            };
            (fb.const_int(prim.to_ir(), *value), AstType::Primitive(prim))
        }
        Literal::Float(v) => (fb.const_float(IrType::F32, *v as f64), AstType::Primitive(PrimitiveType::F32)),
        Literal::Double(v) => (fb.const_float(IrType::F64, *v), AstType::Primitive(PrimitiveType::F64)),
        Literal::Char(c) => (fb.const_int(IrType::Char, *c as i64), AstType::Primitive(PrimitiveType::Char)),
        Literal::Bool(b) => (fb.const_bool(*b), AstType::Primitive(PrimitiveType::Bool)),
        Literal::Nil => (fb.const_int(IrType::Ptr(Box::new(IrType::I8)), 0), AstType::Primitive(PrimitiveType::Ptr)),
    }
}

/// Identifier lookup order: a local field in scope, then a function
/// symbol taken by address, else undefined.
fn lower_identifier(
    ctx: &LowerCtx,
    fb: &mut FunctionBuilder,
    state: &mut FnState,
    segments: &[String],
    meta: &NodeMeta,
) -> Result<(stride_ir::Value, AstType), Error> {
    if segments.len() == 1 {
        let name = &segments[0];

        if let Some(field) = ctx.registry.field_lookup(meta.scope, name) {
            let (ptr, ty) = state.vars.get(&field.internal_name).cloned().ok_or_else(|| {
                Error::semantic(format!("'{}' cannot be used before its declaration", name), meta.source.clone(), meta.position)
            })?;
            if matches!(ty, AstType::Array(..)) {
                return Ok((ptr, ty));
            }
            let v = fb.load(ptr, ty.to_ir());
            return Ok((v, ty));
        }

        if let Some(sym) = ctx.registry.symbol_lookup(meta.scope, name, Some(SymbolKind::Function)) {
            return function_value(ctx, fb, &sym.internal_name, name, meta);
        }

        return Err(Error::semantic(format!("undefined identifier '{}'", name), meta.source.clone(), meta.position));
    }

    let entry = ctx
        .registry
        .resolve_qualified(segments)
        .ok_or_else(|| Error::semantic(format!("undefined identifier '{}'", segments.join("::")), meta.source.clone(), meta.position))?;
    function_value(ctx, fb, &entry.internal_name, &segments.join("::"), meta)
}

/// A bare identifier naming a function (not a call) is only unambiguous
/// when `internal_name` matches exactly (`main`/externs, never mangled)
/// or when exactly one overload of it was declared (its mangled name is
/// the only `fn_sigs` key with `internal_name` as its prefix before `$`).
fn function_value(
    ctx: &LowerCtx,
    fb: &mut FunctionBuilder,
    internal_name: &str,
    display_name: &str,
    meta: &NodeMeta,
) -> Result<(stride_ir::Value, AstType), Error> {
    let prefix = format!("{}$", internal_name);
    let sig = match ctx.fn_sigs.get(internal_name) {
        Some(sig) => sig,
        None => {
            let mut matches = ctx.fn_sigs.iter().filter(|(key, _)| key.starts_with(&prefix));
            let (_, sig) = match (matches.next(), matches.next()) {
                (Some(only), None) => only,
                _ => {
                    return Err(Error::semantic(
                        format!("cannot reference overloaded function '{}' as a value", display_name),
                        meta.source.clone(),
                        meta.position,
                    ))
                }
            };
            sig
        }
    };
    let v = fb.func_addr(sig.id);
    Ok((v, AstType::Function(Vec::new(), Box::new(sig.ret.clone()))))
}

fn wider_numeric_type(lhs: &AstType, rhs: &AstType) -> AstType {
    if lhs.is_float() {
        lhs.clone()
    } else if rhs.is_float() {
        rhs.clone()
    } else {
        lhs.clone()
    }
}

fn lower_binary(
    ctx: &LowerCtx,
    fb: &mut FunctionBuilder,
    state: &mut FnState,
    op: AstArithOp,
    lhs: &Expr,
    rhs: &Expr,
) -> Result<(stride_ir::Value, AstType), Error> {
    let (lv, lty) = lower_expr(ctx, fb, state, lhs)?;
    let (rv, rty) = lower_expr(ctx, fb, state, rhs)?;
    let ty = wider_numeric_type(&lty, &rty);
    let ir_ty = ty.to_ir();
    let v = match op {
        AstArithOp::Add => fb.add(lv, rv, ir_ty),
        AstArithOp::Sub => fb.sub(lv, rv, ir_ty),
        AstArithOp::Mul => fb.mul(lv, rv, ir_ty),
        AstArithOp::Div => fb.div(lv, rv, ir_ty),
        AstArithOp::Rem => fb.rem(lv, rv, ir_ty),
    };
    Ok((v, ty))
}

/// Dispatches to float or signed-integer predicates depending on whether
/// either operand is floating-point.
fn lower_comparison(
    ctx: &LowerCtx,
    fb: &mut FunctionBuilder,
    state: &mut FnState,
    op: ComparisonOp,
    lhs: &Expr,
    rhs: &Expr,
) -> Result<(stride_ir::Value, AstType), Error> {
    use stride_ir::{CmpOp, FloatPredicate, IntPredicate};

    let (lv, lty) = lower_expr(ctx, fb, state, lhs)?;
    let (rv, rty) = lower_expr(ctx, fb, state, rhs)?;

    let cmp_op = if lty.is_float() || rty.is_float() {
        CmpOp::Float(match op {
            ComparisonOp::Equal => FloatPredicate::Oeq,
            ComparisonOp::NotEqual => FloatPredicate::One,
            ComparisonOp::LessThan => FloatPredicate::Olt,
            ComparisonOp::LessThanOrEqual => FloatPredicate::Ole,
            ComparisonOp::GreaterThan => FloatPredicate::Ogt,
            ComparisonOp::GreaterThanOrEqual => FloatPredicate::Oge,
        })
    } else {
        CmpOp::Int(match op {
            ComparisonOp::Equal => IntPredicate::Eq,
            ComparisonOp::NotEqual => IntPredicate::Ne,
            ComparisonOp::LessThan => IntPredicate::Slt,
            ComparisonOp::LessThanOrEqual => IntPredicate::Sle,
            ComparisonOp::GreaterThan => IntPredicate::Sgt,
            ComparisonOp::GreaterThanOrEqual => IntPredicate::Sge,
        })
    };

    let v = fb.cmp(cmp_op, lv, rv);
    Ok((v, AstType::Primitive(PrimitiveType::Bool)))
}

/// Coerces an operand to `i1` for use as a branch condition or boolean
/// phi incoming: a bool passes through, an integer compares not-equal to
/// zero, a float compares unordered-not-equal to `0.0`; anything else is
/// left unchanged (fallback).
fn to_bool(fb: &mut FunctionBuilder, value: stride_ir::Value, ty: &AstType) -> stride_ir::Value {
    use stride_ir::{CmpOp, FloatPredicate, IntPredicate};

    match ty {
        AstType::Primitive(PrimitiveType::Bool) => value,
        _ if ty.is_integer() => {
            let zero = fb.const_int(ty.to_ir(), 0);
            fb.cmp(CmpOp::Int(IntPredicate::Ne), value, zero)
        }
        _ if ty.is_float() => {
            let zero = fb.const_float(ty.to_ir(), 0.0);
            fb.cmp(CmpOp::Float(FloatPredicate::Une), value, zero)
        }
        _ => value,
    }
}

/// Short-circuit `&&`/`||` lowering: start block evaluates the left-hand
/// side and the shortcut constant, a second block evaluates the
/// right-hand side only when reached, and a merge block phis the two
/// possible outcomes together. Both operands are coerced to `i1` via
/// `to_bool` before they're used as a branch condition or phi incoming.
fn lower_logical(
    ctx: &LowerCtx,
    fb: &mut FunctionBuilder,
    state: &mut FnState,
    op: LogicalOp,
    lhs: &Expr,
    rhs: &Expr,
) -> Result<(stride_ir::Value, AstType), Error> {
    let (lhs_val, lhs_ty) = lower_expr(ctx, fb, state, lhs)?;
    let lhs_val = to_bool(fb, lhs_val, &lhs_ty);
    let shortcircuit_value = match op {
        LogicalOp::And => fb.const_bool(false),
        LogicalOp::Or => fb.const_bool(true),
    };
    let start_block = fb.current_block();

    let eval_rhs_block = fb.create_block();
    let merge_block = fb.create_block();

    match op {
        LogicalOp::And => fb.cond_br(lhs_val, eval_rhs_block, merge_block),
        LogicalOp::Or => fb.cond_br(lhs_val, merge_block, eval_rhs_block),
    }

    fb.switch_to_block(eval_rhs_block);
    let (rhs_val, rhs_ty) = lower_expr(ctx, fb, state, rhs)?;
    let rhs_val = to_bool(fb, rhs_val, &rhs_ty);
    let rhs_end_block = fb.current_block();
    fb.br(merge_block);

    fb.switch_to_block(merge_block);
    let result = fb.phi([(start_block, shortcircuit_value), (rhs_end_block, rhs_val)], IrType::Bool);
    Ok((result, AstType::Primitive(PrimitiveType::Bool)))
}

/// Arrays decay to pointers at the value level (like C): an
/// `ArrayInitializer` allocates a fresh stack slot, stores each element,
/// and returns the slot's address rather than a loaded aggregate.
fn lower_array_initializer(
    ctx: &LowerCtx,
    fb: &mut FunctionBuilder,
    state: &mut FnState,
    meta: &NodeMeta,
    elements: &[Expr],
) -> Result<(stride_ir::Value, AstType), Error> {
    if elements.is_empty() {
        return Err(Error::semantic("array initializer cannot be empty", meta.source.clone(), meta.position));
    }

    let mut values = Vec::with_capacity(elements.len());
    let mut elem_ty: Option<AstType> = None;
    for el in elements {
        let (v, ty) = lower_expr(ctx, fb, state, el)?;
        if let Some(expected) = &elem_ty {
            if *expected != ty {
                return Err(Error::semantic(
                    "array initializer elements must share a common type",
                    meta.source.clone(),
                    meta.position,
                ));
            }
        } else {
            elem_ty = Some(ty);
        }
        values.push(v);
    }
    let elem_ty = elem_ty.expect("checked non-empty above");
    let ir_elem = elem_ty.to_ir();

    let slot = fb.alloca(IrType::Array(Box::new(ir_elem.clone()), elements.len()));
    for (i, v) in values.into_iter().enumerate() {
        let idx = fb.const_int(IrType::I64, i as i64);
        let addr = fb.gep(slot, idx, ir_elem.clone());
        fb.store(addr, v);
    }

    Ok((slot, AstType::Array(Box::new(elem_ty), elements.len())))
}

fn lower_array_index(
    ctx: &LowerCtx,
    fb: &mut FunctionBuilder,
    state: &mut FnState,
    meta: &NodeMeta,
    base: &Expr,
    index: &Expr,
) -> Result<(stride_ir::Value, AstType), Error> {
    let (base_val, base_ty) = lower_expr(ctx, fb, state, base)?;
    let elem_ty = base_ty
        .element_type()
        .cloned()
        .ok_or_else(|| Error::semantic("cannot index a non-array value", meta.source.clone(), meta.position))?;

    let (idx_val, idx_ty) = lower_expr(ctx, fb, state, index)?;
    if !idx_ty.is_integer() {
        return Err(Error::semantic("array index must be an integer", meta.source.clone(), meta.position));
    }

    let elem_ir = elem_ty.to_ir();
    let addr = fb.gep(base_val, idx_val, elem_ir.clone());

    if matches!(elem_ty, AstType::Array(..)) {
        Ok((addr, elem_ty))
    } else {
        let v = fb.load(addr, elem_ir);
        Ok((v, elem_ty))
    }
}

/// Resolves and lowers a call. Name resolution finds the callee's
/// declaring `SymbolEntry` (whose `internal_name` is its module-qualified,
/// not-yet-overload-mangled name), re-derives the call site's mangle
/// candidate from the argument types, and falls back to the unmangled
/// name for `main`/externs.
fn lower_call(
    ctx: &LowerCtx,
    fb: &mut FunctionBuilder,
    state: &mut FnState,
    meta: &NodeMeta,
    name: &[String],
    args: &[Expr],
) -> Result<(stride_ir::Value, AstType), Error> {
    let mut arg_values = Vec::with_capacity(args.len());
    let mut arg_types = Vec::with_capacity(args.len());
    for a in args {
        let (v, ty) = lower_expr(ctx, fb, state, a)?;
        arg_values.push(v);
        arg_types.push(ty);
    }

    let display_name = name.join("::");
    let entry = if name.len() == 1 {
        ctx.registry
            .symbol_lookup(meta.scope, &name[0], Some(SymbolKind::Function))
            .ok_or_else(|| Error::semantic(format!("undefined function '{}'", display_name), meta.source.clone(), meta.position))?
    } else {
        ctx.registry
            .resolve_qualified(name)
            .ok_or_else(|| Error::semantic(format!("undefined function '{}'", display_name), meta.source.clone(), meta.position))?
    };

    let mangled = resolve_internal_function_name(&arg_types, &entry.internal_name);
    let sig = ctx
        .fn_sigs
        .get(&mangled)
        .or_else(|| ctx.fn_sigs.get(&entry.internal_name))
        .ok_or_else(|| {
            Error::semantic(
                format!("no matching overload of '{}' for the given arguments", display_name),
                meta.source.clone(),
                meta.position,
            )
        })?;

    let required = if sig.is_variadic { sig.param_count.saturating_sub(1) } else { sig.param_count };
    if args.len() < required || (!sig.is_variadic && args.len() != required) {
        return Err(Error::semantic(
            format!("'{}' expects {} argument(s), found {}", display_name, required, args.len()),
            meta.source.clone(),
            meta.position,
        ));
    }

    let v = fb.call(sig.id, arg_values);
    Ok((v, sig.ret.clone()))
}

/// A lambda expression's signature was already declared (and its body
/// already lowered) by pass 1/2's flat discovery list — here we only need
/// its address as a first-class value.
fn lower_lambda(ctx: &LowerCtx, fb: &mut FunctionBuilder, decl: &crate::ast::FunctionDecl) -> Result<(stride_ir::Value, AstType), Error> {
    let sig = ctx.fn_sigs.get(&decl.internal_name).expect("lambdas are declared during discovery before any lowering runs");
    let v = fb.func_addr(sig.id);
    let param_types: Vec<AstType> = decl.params.iter().map(|p| p.ty.clone()).collect();
    Ok((v, AstType::Function(param_types, Box::new(decl.ret.clone()))))
}

fn lower_variadic_ref(fb: &mut FunctionBuilder, state: &mut FnState, meta: &NodeMeta) -> Result<(stride_ir::Value, AstType), Error> {
    if !state.is_variadic {
        return Err(Error::semantic("'...' can only be used inside a variadic function", meta.source.clone(), meta.position));
    }
    let handle = match state.va_handle {
        Some(v) => v,
        None => {
            let v = fb.va_start();
            state.va_handle = Some(v);
            v
        }
    };
    Ok((handle, AstType::Primitive(PrimitiveType::Ptr)))
}
