//! A machine-neutral intermediate representation consumed by stride
//! backends.
//!
//! This crate owns the IR's shape only: `Module`, `Function`, `BasicBlock`,
//! `Instruction`, and the opaque `Value` handle instructions produce. It
//! knows nothing about execution — interpreting or emitting the IR is a
//! backend's job (see `stride-vm`).

mod builder;
mod instr;
mod module;
mod ty;
mod value;

pub use builder::{FunctionBuilder, ModuleBuilder};
pub use instr::{ArithOp, CmpOp, FloatPredicate, Instruction, IntPredicate};
pub use module::{BasicBlock, BasicBlockId, Function, FunctionId, Module};
pub use ty::IrType;
pub use value::Value;
