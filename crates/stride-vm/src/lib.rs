//! The `stride-vm` backend: a tree-walking interpreter for `stride-ir`
//! modules (JIT mode) plus a verification-only stub for native emission
//! (native mode). Selection between the two lives in the CLI driver, keyed
//! off the project config's `mode` field — this crate only implements the
//! two execution strategies themselves.
//!
//! - `engine` - the interpreter: call frames, runtime values, the
//!   per-block dispatch loop.
//! - `native` - the native-emission stub (verifies, then reports
//!   unimplemented rather than silently no-op'ing).
//! - `error` - this crate's `thiserror`-derived error enum.

mod engine;
mod error;
mod native;

pub use engine::{FuelLimits, Interpreter, Pointer, RuntimeValue};
pub use error::Error;
pub use native::emit_native;

use stride_ir::Module;

/// Looks up `main` by its unmangled name (`main` is never mangled, the
/// same exemption a call site's fallback lookup relies on) and interprets
/// it with no arguments. Returns its return value's integer interpretation,
/// or `RuntimeValue::Void`'s `0` if `main` returns void.
pub fn run_main(module: &Module) -> Result<i64, Error> {
    module.verify().map_err(Error::Verify)?;
    let id = module.lookup_function("main").ok_or(Error::MissingMain)?;
    let mut interp = Interpreter::new(module, FuelLimits::default());
    let result = interp.call(id, Vec::new())?;
    Ok(result.map_or(0, |v| v.as_int()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stride_ir::{IrType, ModuleBuilder};

    #[test]
    fn runs_a_function_returning_a_constant() {
        let mut mb = ModuleBuilder::new("m", "x86_64-unknown-linux-gnu");
        let id = mb.declare_function("main", vec![], IrType::I32, false);
        {
            let mut fb = mb.define_function(id);
            let v = fb.const_int(IrType::I32, 42);
            fb.ret(Some(v));
        }
        let module = mb.finish();
        assert_eq!(run_main(&module).unwrap(), 42);
    }

    #[test]
    fn missing_main_is_reported() {
        let mb = ModuleBuilder::new("m", "x86_64-unknown-linux-gnu");
        let module = mb.finish();
        assert!(matches!(run_main(&module), Err(Error::MissingMain)));
    }

    fn compile(src: &str) -> Module {
        let mut registry = stride_front::registry::SymbolRegistry::new();
        let mut set = stride_front::lexer::lex(stride_core::SourceFile::new("t.sr", src)).unwrap();
        let program = stride_front::parse_program(&mut registry, &mut set).unwrap();
        stride_front::lower_program(&registry, &program, "t", "x86_64-unknown-linux-gnu").unwrap()
    }

    /// `fn main(): i32 -> { return 42; }` interprets to completion with
    /// `main`'s return value equal to `42`.
    #[test]
    fn end_to_end_main_returning_constant() {
        let module = compile("fn main(): i32 -> { return 42; }");
        assert_eq!(run_main(&module).unwrap(), 42);
    }

    #[test]
    fn end_to_end_arithmetic_and_calls() {
        let module = compile(indoc::indoc! {"
            fn add(a: i32, b: i32): i32 -> { return a + b; }
            fn main(): i32 -> { return add(19, 23); }
        "});
        assert_eq!(run_main(&module).unwrap(), 42);
    }

    #[test]
    fn end_to_end_nested_call_chain() {
        let module = compile(indoc::indoc! {"
            fn inc(n: i32): i32 -> { return n + 1; }
            fn twice(n: i32): i32 -> { return inc(inc(n)); }
            fn main(): i32 -> { return twice(40); }
        "});
        assert_eq!(run_main(&module).unwrap(), 42);
    }

    /// Short-circuit invariant: the right-hand side of `&&` is never
    /// evaluated once the left side is `false`. Modeled here by making the
    /// right-hand call divide by zero — if it ran, interpreting would fail
    /// with `DivisionByZero`.
    #[test]
    fn end_to_end_short_circuit_and_skips_rhs() {
        let module = compile(indoc::indoc! {"
            fn boom(): bool -> { return (1 / 0) == 0; }
            fn main(): i32 -> {
                let x: bool = false && boom();
                return 0;
            }
        "});
        assert_eq!(run_main(&module).unwrap(), 0);
    }

    /// A `let` after a short-circuiting one still allocates cleanly: the
    /// first statement's branching leaves entry's terminator already in
    /// place, and the second `let`'s entry-block alloca must land ahead of
    /// it rather than after.
    #[test]
    fn end_to_end_var_decl_after_short_circuit_still_allocates_in_entry() {
        let module = compile(indoc::indoc! {"
            fn main(): i32 -> {
                let x: bool = false && true;
                let y: i32 = 7;
                return y;
            }
        "});
        assert_eq!(run_main(&module).unwrap(), 7);
    }

    /// Both operands of a logical operator are coerced to `i1` before use
    /// (`to_bool`): a non-zero int/float operand is truthy, zero is
    /// falsy, matching C-style truthiness rather than leaving a non-bool
    /// value in a boolean phi.
    #[test]
    fn end_to_end_short_circuit_coerces_non_zero_int_and_float_operands_as_truthy() {
        let module = compile(indoc::indoc! {"
            fn main(): i32 -> {
                let a: bool = 3 && 2.5;
                let b: bool = 0 && 2.5;
                let c: bool = 0.0 || 7;
                return (a == true) + (b == false) + (c == true);
            }
        "});
        assert_eq!(run_main(&module).unwrap(), 3);
    }

    #[test]
    fn end_to_end_array_index_round_trips() {
        let module = compile(indoc::indoc! {"
            fn main(): i32 -> {
                let xs: i32[3] = [10, 20, 30];
                return xs[1];
            }
        "});
        assert_eq!(run_main(&module).unwrap(), 20);
    }

    #[test]
    fn end_to_end_division_by_zero_is_reported() {
        let module = compile("fn main(): i32 -> { return 1 / 0; }");
        assert_eq!(run_main(&module), Err(Error::DivisionByZero));
    }
}
