use stride_core::Error;
use stride_ir::FunctionBuilder;

use crate::ast::VarDeclStmt;

use super::{lower_expr, FnState, LowerCtx};

/// Lowers a `let` statement: an entry-block stack slot, an optional stored
/// initializer, and a binding into `state.vars` keyed by the field's
/// module-qualified internal name.
pub(super) fn lower_var_decl(
    ctx: &LowerCtx,
    fb: &mut FunctionBuilder,
    state: &mut FnState,
    v: &VarDeclStmt,
) -> Result<(), Error> {
    let ir_ty = v.ty.to_ir();
    let slot = fb.alloca_in_entry(ir_ty);

    if let Some(init) = &v.init {
        let (value, _ty) = lower_expr(ctx, fb, state, init)?;
        fb.store(slot, value);
    }

    state.vars.insert(v.internal_name.clone(), (slot, v.ty.clone()));
    Ok(())
}
