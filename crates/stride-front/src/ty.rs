//! The `AstType` hierarchy: type expressions carried by AST nodes. A much
//! narrower lattice than a full type checker would need — just enough
//! structural equality and array/primitive distinctions for lowering to
//! pick the right IR type and mangled name.

use stride_ir::IrType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Bool,
    Char,
    Void,
    Ptr,
}

impl PrimitiveType {
    pub fn from_keyword(word: &str) -> Option<Self> {
        Some(match word {
            "i8" => PrimitiveType::I8,
            "i16" => PrimitiveType::I16,
            "i32" => PrimitiveType::I32,
            "i64" => PrimitiveType::I64,
            "u8" => PrimitiveType::U8,
            "u16" => PrimitiveType::U16,
            "u32" => PrimitiveType::U32,
            "u64" => PrimitiveType::U64,
            "f32" => PrimitiveType::F32,
            "f64" => PrimitiveType::F64,
            "bool" => PrimitiveType::Bool,
            "char" => PrimitiveType::Char,
            "void" => PrimitiveType::Void,
            "ptr" => PrimitiveType::Ptr,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::I8 => "i8",
            PrimitiveType::I16 => "i16",
            PrimitiveType::I32 => "i32",
            PrimitiveType::I64 => "i64",
            PrimitiveType::U8 => "u8",
            PrimitiveType::U16 => "u16",
            PrimitiveType::U32 => "u32",
            PrimitiveType::U64 => "u64",
            PrimitiveType::F32 => "f32",
            PrimitiveType::F64 => "f64",
            PrimitiveType::Bool => "bool",
            PrimitiveType::Char => "char",
            PrimitiveType::Void => "void",
            PrimitiveType::Ptr => "ptr",
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            PrimitiveType::I8
                | PrimitiveType::I16
                | PrimitiveType::I32
                | PrimitiveType::I64
                | PrimitiveType::U8
                | PrimitiveType::U16
                | PrimitiveType::U32
                | PrimitiveType::U64
                | PrimitiveType::Char
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, PrimitiveType::F32 | PrimitiveType::F64)
    }

    pub fn to_ir(&self) -> IrType {
        match self {
            PrimitiveType::I8 => IrType::I8,
            PrimitiveType::I16 => IrType::I16,
            PrimitiveType::I32 => IrType::I32,
            PrimitiveType::I64 => IrType::I64,
            PrimitiveType::U8 => IrType::U8,
            PrimitiveType::U16 => IrType::U16,
            PrimitiveType::U32 => IrType::U32,
            PrimitiveType::U64 => IrType::U64,
            PrimitiveType::F32 => IrType::F32,
            PrimitiveType::F64 => IrType::F64,
            PrimitiveType::Bool => IrType::Bool,
            PrimitiveType::Char => IrType::Char,
            PrimitiveType::Void => IrType::Void,
            PrimitiveType::Ptr => IrType::Ptr(Box::new(IrType::I8)),
        }
    }
}

/// A type expression as written in source: primitive keyword, array,
/// named (enum/struct) reference, or function signature.
#[derive(Debug, Clone, PartialEq)]
pub enum AstType {
    Primitive(PrimitiveType),
    Array(Box<AstType>, usize),
    Named(String),
    Function(Vec<AstType>, Box<AstType>),
}

impl AstType {
    pub fn i32() -> Self {
        AstType::Primitive(PrimitiveType::I32)
    }

    pub fn void() -> Self {
        AstType::Primitive(PrimitiveType::Void)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, AstType::Primitive(p) if p.is_integer())
    }

    pub fn is_float(&self) -> bool {
        matches!(self, AstType::Primitive(p) if p.is_float())
    }

    pub fn element_type(&self) -> Option<&AstType> {
        match self {
            AstType::Array(elem, _) => Some(elem),
            _ => None,
        }
    }

    pub fn to_string_repr(&self) -> String {
        match self {
            AstType::Primitive(p) => p.name().to_owned(),
            AstType::Array(elem, size) => format!("{}[{}]", elem.to_string_repr(), size),
            AstType::Named(name) => name.clone(),
            AstType::Function(params, ret) => {
                let joined = params.iter().map(AstType::to_string_repr).collect::<Vec<_>>().join(", ");
                format!("({}) -> {}", joined, ret.to_string_repr())
            }
        }
    }

    /// The IR-level representation of this type, resolving an array to a
    /// sized `IrType::Array` and leaving a `Named` type to its pointer-sized
    /// default (structs/enums lower to an opaque pointer-sized slot — no
    /// struct-field layout is modeled here).
    pub fn to_ir(&self) -> IrType {
        match self {
            AstType::Primitive(p) => p.to_ir(),
            AstType::Array(elem, size) => IrType::Array(Box::new(elem.to_ir()), *size),
            AstType::Named(_) => IrType::Ptr(Box::new(IrType::I8)),
            AstType::Function(..) => IrType::Ptr(Box::new(IrType::I8)),
        }
    }
}

/// Bitset flags carried by certain type expressions, implemented as plain
/// constants over a `u8` rather than pulling in a bitflags crate for three
/// bits.
pub type TypeFlags = u8;

pub const FLAG_NONE: TypeFlags = 0;
pub const FLAG_TYPE_VARIADIC: TypeFlags = 1 << 0;
pub const FLAG_FN_PARAM_MUTABLE: TypeFlags = 1 << 1;

/// Assigns each primitive/named/compound type shape a small integer for
/// name-mangling's type-hash fold. The scheme only needs to be internally
/// consistent between a call site and a declaration; it is not required
/// to match any particular numbering.
pub fn ast_type_to_internal_id(ty: &AstType) -> u32 {
    match ty {
        AstType::Primitive(p) => match p {
            PrimitiveType::Void => 0,
            PrimitiveType::I8 => 1,
            PrimitiveType::I16 => 2,
            PrimitiveType::I32 => 3,
            PrimitiveType::I64 => 4,
            PrimitiveType::U8 => 5,
            PrimitiveType::U16 => 6,
            PrimitiveType::U32 => 7,
            PrimitiveType::U64 => 8,
            PrimitiveType::F32 => 9,
            PrimitiveType::F64 => 10,
            PrimitiveType::Bool => 11,
            PrimitiveType::Char => 12,
            PrimitiveType::Ptr => 13,
        },
        AstType::Array(..) => 14,
        AstType::Named(_) => 15,
        AstType::Function(..) => 16,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_round_trips_through_keyword() {
        assert_eq!(PrimitiveType::from_keyword("i32"), Some(PrimitiveType::I32));
        assert_eq!(PrimitiveType::from_keyword("nope"), None);
    }

    #[test]
    fn array_element_type_is_accessible() {
        let arr = AstType::Array(Box::new(AstType::i32()), 4);
        assert_eq!(arr.element_type(), Some(&AstType::i32()));
    }
}
