//! The interpreter: call frames (`frame`), the runtime value
//! representation (`value`), and the per-block dispatch loop
//! (`interpreter`).

mod frame;
mod interpreter;
mod value;

pub use interpreter::{FuelLimits, Interpreter};
pub use value::{Pointer, RuntimeValue};
