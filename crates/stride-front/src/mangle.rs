//! Name mangling: the scheme a function declaration's internal name and a
//! call site's candidate name must agree on byte-for-byte.

use crate::ty::{ast_type_to_internal_id, AstType};

pub const MAIN_FN_NAME: &str = "main";

/// `main` is never mangled; every other name gets `$` + a folded
/// 6-hex-digit type hash.
pub fn resolve_internal_function_name(param_types: &[AstType], name: &str) -> String {
    if name == MAIN_FN_NAME {
        return name.to_owned();
    }

    let mut hash: u32 = 0;
    let mut shift: u32 = 0;
    for ty in param_types {
        hash |= ast_type_to_internal_id(ty);
        hash = hash.wrapping_shl(shift);
        shift += 2;
    }

    format!("{}${:06x}", name, hash & 0xFF_FFFF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::PrimitiveType;

    #[test]
    fn main_is_never_mangled() {
        assert_eq!(resolve_internal_function_name(&[AstType::i32()], "main"), "main");
        assert_eq!(resolve_internal_function_name(&[], "main"), "main");
    }

    #[test]
    fn identical_signatures_mangle_identically() {
        let types = vec![AstType::Primitive(PrimitiveType::I32), AstType::Primitive(PrimitiveType::F64)];
        let a = resolve_internal_function_name(&types, "add");
        let b = resolve_internal_function_name(&types.clone(), "add");
        assert_eq!(a, b);
        assert!(a.starts_with("add$"));
        assert_eq!(a.len(), "add$".len() + 6);
    }

    #[test]
    fn different_signatures_mangle_differently() {
        let a = resolve_internal_function_name(&[AstType::Primitive(PrimitiveType::I32)], "add");
        let b = resolve_internal_function_name(&[AstType::Primitive(PrimitiveType::F64)], "add");
        assert_ne!(a, b);
    }
}
