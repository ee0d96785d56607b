//! Native-emission stub: a real object-code generator is out of scope
//! here, but the `COMPILE_NATIVE` mode contract must still behave
//! honestly rather than silently doing nothing. This verifies the module
//! exactly as the interpreter path does, then reports the one thing it
//! actually can't do.

use stride_ir::Module;

use crate::error::Error;

/// Verifies `module`, then always returns `Error::NativeUnimplemented` —
/// there is no assembler or linker backing this build.
pub fn emit_native(module: &Module) -> Result<(), Error> {
    module.verify().map_err(Error::Verify)?;
    Err(Error::NativeUnimplemented)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stride_ir::{IrType, ModuleBuilder};

    #[test]
    fn reports_unimplemented_after_verifying() {
        let mut mb = ModuleBuilder::new("m", "x86_64-unknown-linux-gnu");
        let id = mb.declare_function("main", vec![], IrType::I32, false);
        {
            let mut fb = mb.define_function(id);
            let v = fb.const_int(IrType::I32, 0);
            fb.ret(Some(v));
        }
        let module = mb.finish();
        assert_eq!(emit_native(&module), Err(Error::NativeUnimplemented));
    }

    #[test]
    fn verification_failure_takes_priority() {
        let mut mb = ModuleBuilder::new("m", "x86_64-unknown-linux-gnu");
        mb.declare_function("f", vec![], IrType::Void, false);
        let id = mb.lookup_function("f").unwrap();
        mb.define_function(id);
        let module = mb.finish();
        assert!(matches!(emit_native(&module), Err(Error::Verify(_))));
    }
}
