//! The dispatch loop: one `Interpreter` per module, walking a function's
//! basic blocks in order and following terminators, grounded on the
//! teacher's `vm.rs` fuel-limited step loop (simplified — no checkpoints,
//! no backtracking, since the core has no query-style retry semantics).

use stride_ir::{
    ArithOp, BasicBlockId, CmpOp, FloatPredicate, FunctionId, Instruction, IntPredicate, IrType, Module,
};

use crate::error::Error;

use super::frame::{CallStack, Frame};
use super::value::{Pointer, RuntimeValue};

/// Runtime limits guarding against runaway interpretation — the compiler
/// itself never loops or recurses unboundedly, but an interpreted *source
/// program* can (unbounded recursion, a `let` loop construct is absent
/// from this language, but recursive functions are not).
#[derive(Clone, Copy, Debug)]
pub struct FuelLimits {
    pub exec_fuel: u32,
    pub recursion_limit: u32,
}

impl Default for FuelLimits {
    fn default() -> Self {
        Self {
            exec_fuel: 10_000_000,
            recursion_limit: 4_096,
        }
    }
}

/// Flat memory the interpreter allocates `Alloca`'d cells from. Cells are
/// never freed — matching the core's documented "the variadic handle is
/// never auto-released" looseness, generalized to every stack slot, since
/// nothing in this interpreter ever needs to reclaim them before the whole
/// run ends.
#[derive(Default)]
struct Memory {
    cells: Vec<RuntimeValue>,
}

impl Memory {
    fn alloc(&mut self, count: usize) -> Pointer {
        let base = self.cells.len() as u32;
        self.cells.resize(self.cells.len() + count.max(1), RuntimeValue::Void);
        Pointer::Cell(base)
    }

    fn load(&self, ptr: Pointer) -> RuntimeValue {
        match ptr {
            Pointer::Cell(idx) => self.cells[idx as usize],
            _ => RuntimeValue::Void,
        }
    }

    fn store(&mut self, ptr: Pointer, value: RuntimeValue) {
        if let Pointer::Cell(idx) = ptr {
            self.cells[idx as usize] = value;
        }
    }
}

pub struct Interpreter<'m> {
    module: &'m Module,
    memory: Memory,
    calls: CallStack,
    exec_fuel: u32,
    limits: FuelLimits,
}

impl<'m> Interpreter<'m> {
    pub fn new(module: &'m Module, limits: FuelLimits) -> Self {
        Self {
            module,
            memory: Memory::default(),
            calls: CallStack::new(),
            exec_fuel: limits.exec_fuel,
            limits,
        }
    }

    /// Calls `function` with already-lowered argument values, running it
    /// to completion and returning its `Ret` value, if any.
    pub fn call(&mut self, function: FunctionId, args: Vec<RuntimeValue>) -> Result<Option<RuntimeValue>, Error> {
        if self.calls.depth() >= self.limits.recursion_limit {
            return Err(Error::RecursionLimitExceeded(self.limits.recursion_limit));
        }

        let f = self.module.function(function);
        if f.is_declaration {
            return Err(Error::UninterpretableExtern(f.name.clone()));
        }

        let mut frame = Frame::new(f.value_count());
        for (i, arg) in args.into_iter().enumerate() {
            frame.set(stride_ir::Value::argument(i), arg);
        }
        self.calls.push(frame);

        let result = self.run_blocks(function);

        self.calls.pop();
        result
    }

    fn tick(&mut self) -> Result<(), Error> {
        if self.exec_fuel == 0 {
            return Err(Error::FuelExhausted(self.limits.exec_fuel));
        }
        self.exec_fuel -= 1;
        Ok(())
    }

    fn run_blocks(&mut self, function: FunctionId) -> Result<Option<RuntimeValue>, Error> {
        let f = self.module.function(function);
        let mut current = f.entry_block();
        let mut prev: Option<BasicBlockId> = None;

        loop {
            let block = self.module.function(function).block(current);
            for (i, instr) in block.instructions.iter().enumerate() {
                self.tick()?;
                let result_slot = block.results[i];

                match instr {
                    Instruction::ConstInt { value, .. } => {
                        self.set(result_slot, RuntimeValue::Int(*value));
                    }
                    Instruction::ConstFloat { value, .. } => {
                        self.set(result_slot, RuntimeValue::Float(*value));
                    }
                    Instruction::ConstBool(b) => {
                        self.set(result_slot, RuntimeValue::Bool(*b));
                    }
                    Instruction::Arith { op, lhs, rhs, ty } => {
                        let lv = self.get(*lhs);
                        let rv = self.get(*rhs);
                        let v = eval_arith(*op, ty, lv, rv)?;
                        self.set(result_slot, v);
                    }
                    Instruction::Cmp { op, lhs, rhs } => {
                        let lv = self.get(*lhs);
                        let rv = self.get(*rhs);
                        self.set(result_slot, RuntimeValue::Bool(eval_cmp(*op, lv, rv)));
                    }
                    Instruction::Alloca { ty } => {
                        let count = cell_count(ty);
                        let ptr = self.memory.alloc(count);
                        self.set(result_slot, RuntimeValue::Ptr(ptr));
                    }
                    Instruction::Load { ptr, .. } => {
                        let p = self.get(*ptr).as_ptr();
                        self.set(result_slot, self.memory.load(p));
                    }
                    Instruction::Store { ptr, value } => {
                        let p = self.get(*ptr).as_ptr();
                        let v = self.get(*value);
                        self.memory.store(p, v);
                    }
                    Instruction::Gep { base, index, .. } => {
                        let base_ptr = self.get(*base).as_ptr();
                        let idx = self.get(*index).as_int();
                        let addr = match base_ptr {
                            Pointer::Cell(b) => Pointer::Cell((b as i64 + idx) as u32),
                            other => other,
                        };
                        self.set(result_slot, RuntimeValue::Ptr(addr));
                    }
                    Instruction::GlobalString { index } => {
                        self.set(result_slot, RuntimeValue::Ptr(Pointer::Global(*index)));
                    }
                    Instruction::Call { function: callee, args } => {
                        let arg_values: Vec<RuntimeValue> = args.iter().map(|a| self.get(*a)).collect();
                        let returned = self.call(*callee, arg_values)?;
                        self.set(result_slot, returned.unwrap_or(RuntimeValue::Void));
                    }
                    Instruction::FuncAddr { function: target } => {
                        self.set(result_slot, RuntimeValue::Ptr(Pointer::Function(*target)));
                    }
                    Instruction::Phi { incoming, .. } => {
                        let chosen = incoming
                            .iter()
                            .find(|(from, _)| Some(*from) == prev)
                            .map(|(_, v)| self.get(*v))
                            .expect("phi's incoming set does not cover the predecessor actually taken");
                        self.set(result_slot, chosen);
                    }
                    Instruction::VaStart => {
                        self.set(result_slot, RuntimeValue::Ptr(Pointer::VaList));
                    }
                    Instruction::Br { target } => {
                        prev = Some(current);
                        current = *target;
                        break;
                    }
                    Instruction::CondBr { cond, then_block, else_block } => {
                        let taken = if self.get(*cond).as_bool() { *then_block } else { *else_block };
                        prev = Some(current);
                        current = taken;
                        break;
                    }
                    Instruction::Ret { value } => {
                        return Ok(value.map(|v| self.get(v)));
                    }
                }
            }
        }
    }

    /// A verified module never reads a `Value` before the instruction that
    /// produces it has run — `Void` is only ever returned for a `Value`
    /// slot a block jumped past, which a reachable, terminator-checked
    /// function can't do.
    fn get(&mut self, value: stride_ir::Value) -> RuntimeValue {
        self.calls
            .current()
            .get(value)
            .unwrap_or(RuntimeValue::Void)
    }

    fn set(&mut self, value: Option<stride_ir::Value>, result: RuntimeValue) {
        if let Some(v) = value {
            self.calls.current().set(v, result);
        }
    }
}

/// How many memory cells an `Alloca` of `ty` needs: one per scalar, one
/// per element for an array (structs/named types have no layout at the
/// IR level — they're opaque pointer-sized slots).
fn cell_count(ty: &IrType) -> usize {
    match ty {
        IrType::Array(_, len) => *len,
        _ => 1,
    }
}

fn eval_arith(op: ArithOp, ty: &IrType, lhs: RuntimeValue, rhs: RuntimeValue) -> Result<RuntimeValue, Error> {
    if ty.is_float() {
        let (a, b) = (lhs.as_float(), rhs.as_float());
        let v = match op {
            ArithOp::Add => a + b,
            ArithOp::Sub => a - b,
            ArithOp::Mul => a * b,
            ArithOp::Div => a / b,
            ArithOp::Rem => a % b,
        };
        return Ok(RuntimeValue::Float(v));
    }

    let (a, b) = (lhs.as_int(), rhs.as_int());
    let v = match op {
        ArithOp::Add => a.wrapping_add(b),
        ArithOp::Sub => a.wrapping_sub(b),
        ArithOp::Mul => a.wrapping_mul(b),
        ArithOp::Div => {
            if b == 0 {
                return Err(Error::DivisionByZero);
            }
            a.wrapping_div(b)
        }
        ArithOp::Rem => {
            if b == 0 {
                return Err(Error::DivisionByZero);
            }
            a.wrapping_rem(b)
        }
    };
    Ok(RuntimeValue::Int(v))
}

fn eval_cmp(op: CmpOp, lhs: RuntimeValue, rhs: RuntimeValue) -> bool {
    match op {
        CmpOp::Float(pred) => {
            let (a, b) = (lhs.as_float(), rhs.as_float());
            match pred {
                FloatPredicate::Oeq => a == b,
                FloatPredicate::One => a != b,
                FloatPredicate::Olt => a < b,
                FloatPredicate::Ole => a <= b,
                FloatPredicate::Ogt => a > b,
                FloatPredicate::Oge => a >= b,
                FloatPredicate::Une => a != b,
            }
        }
        CmpOp::Int(pred) => {
            let (a, b) = (lhs.as_int(), rhs.as_int());
            match pred {
                IntPredicate::Eq => a == b,
                IntPredicate::Ne => a != b,
                IntPredicate::Slt => a < b,
                IntPredicate::Sle => a <= b,
                IntPredicate::Sgt => a > b,
                IntPredicate::Sge => a >= b,
            }
        }
    }
}
