use crate::instr::{ArithOp, CmpOp, Instruction};
use crate::module::{BasicBlock, BasicBlockId, Function, FunctionId, Module};
use crate::ty::IrType;
use crate::value::Value;

/// The construction surface a two-pass lowering driver writes into:
/// declare/define functions, look functions up by name, intern string
/// globals, and hand out a `FunctionBuilder` to emit instructions into a
/// specific function's blocks.
pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    pub fn new(name: impl Into<String>, target_triple: impl Into<String>) -> Self {
        Self {
            module: Module::new(name, target_triple),
        }
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn finish(self) -> Module {
        self.module
    }

    pub fn lookup_function(&self, name: &str) -> Option<FunctionId> {
        self.module.lookup_function(name)
    }

    pub fn intern_string(&mut self, s: &str) -> u32 {
        self.module.intern_string(s)
    }

    /// Declares a function's signature with no body — used by pass 1
    /// (forward-reference resolution) so later code can call functions
    /// defined earlier or later in the same file.
    pub fn declare_function(
        &mut self,
        name: &str,
        params: Vec<IrType>,
        ret: IrType,
        is_variadic: bool,
    ) -> FunctionId {
        if let Some(id) = self.module.lookup_function(name) {
            return id;
        }
        let nparams = params.len() as u32;
        let function = Function {
            name: name.to_owned(),
            params,
            ret,
            is_variadic,
            is_declaration: true,
            blocks: Vec::new(),
            value_count: nparams,
        };
        self.module.push_function(function, name.to_owned())
    }

    /// Gives a previously-declared function a body, creating its entry
    /// block, and returns a builder positioned at that block.
    pub fn define_function(&mut self, id: FunctionId) -> FunctionBuilder<'_> {
        {
            let function = self.module.function_mut(id);
            function.is_declaration = false;
            if function.blocks.is_empty() {
                function.blocks.push(BasicBlock::default());
            }
        }
        FunctionBuilder {
            module: &mut self.module,
            function: id,
            current_block: BasicBlockId(0),
        }
    }
}

/// Emits instructions into one function, tracking an insertion point
/// (current block) independent of the entry block, which variable
/// declarations target directly so their stack slots dominate every use.
pub struct FunctionBuilder<'a> {
    module: &'a mut Module,
    function: FunctionId,
    current_block: BasicBlockId,
}

impl<'a> FunctionBuilder<'a> {
    fn func(&mut self) -> &mut Function {
        self.module.function_mut(self.function)
    }

    pub fn entry_block(&mut self) -> BasicBlockId {
        self.func().entry_block()
    }

    pub fn current_block(&self) -> BasicBlockId {
        self.current_block
    }

    pub fn switch_to_block(&mut self, block: BasicBlockId) {
        self.current_block = block;
    }

    pub fn create_block(&mut self) -> BasicBlockId {
        let f = self.func();
        let id = BasicBlockId(f.blocks.len() as u32);
        f.blocks.push(BasicBlock::default());
        id
    }

    pub fn block_is_terminated(&self, block: BasicBlockId) -> bool {
        self.module.function(self.function).block(block).is_terminated()
    }

    fn next_value(&mut self) -> Value {
        let f = self.func();
        let v = Value(f.value_count);
        f.value_count += 1;
        v
    }

    fn push_into(&mut self, block: BasicBlockId, instr: Instruction, result: Option<Value>) {
        let b = &mut self.func().blocks[block.0 as usize];
        b.instructions.push(instr);
        b.results.push(result);
    }

    fn push_value_into(&mut self, block: BasicBlockId, instr: Instruction) -> Value {
        let v = self.next_value();
        self.push_into(block, instr, Some(v));
        v
    }

    /// Inserts at the very front of `block`'s instruction list, keeping
    /// `instructions`/`results` in lockstep. Used for entry-block allocas so
    /// they never land after a terminator the entry block already picked up
    /// from an earlier statement's control flow (e.g. a short-circuit
    /// logical operator branching out of entry before a later `let` runs).
    fn push_value_front_into(&mut self, block: BasicBlockId, instr: Instruction) -> Value {
        let v = self.next_value();
        let b = &mut self.func().blocks[block.0 as usize];
        b.instructions.insert(0, instr);
        b.results.insert(0, Some(v));
        v
    }

    fn push_value(&mut self, instr: Instruction) -> Value {
        let block = self.current_block;
        self.push_value_into(block, instr)
    }

    fn push_void(&mut self, instr: Instruction) {
        let block = self.current_block;
        self.push_into(block, instr, None);
    }

    /// The index-th function argument's value handle (arguments occupy
    /// values `0..params.len()`).
    pub fn argument(&self, index: usize) -> Value {
        Value::argument(index)
    }

    pub fn const_int(&mut self, ty: IrType, value: i64) -> Value {
        self.push_value(Instruction::ConstInt { ty, value })
    }

    pub fn const_float(&mut self, ty: IrType, value: f64) -> Value {
        self.push_value(Instruction::ConstFloat { ty, value })
    }

    pub fn const_bool(&mut self, value: bool) -> Value {
        self.push_value(Instruction::ConstBool(value))
    }

    pub fn add(&mut self, lhs: Value, rhs: Value, ty: IrType) -> Value {
        self.push_value(Instruction::Arith { op: ArithOp::Add, lhs, rhs, ty })
    }

    pub fn sub(&mut self, lhs: Value, rhs: Value, ty: IrType) -> Value {
        self.push_value(Instruction::Arith { op: ArithOp::Sub, lhs, rhs, ty })
    }

    pub fn mul(&mut self, lhs: Value, rhs: Value, ty: IrType) -> Value {
        self.push_value(Instruction::Arith { op: ArithOp::Mul, lhs, rhs, ty })
    }

    pub fn div(&mut self, lhs: Value, rhs: Value, ty: IrType) -> Value {
        self.push_value(Instruction::Arith { op: ArithOp::Div, lhs, rhs, ty })
    }

    pub fn rem(&mut self, lhs: Value, rhs: Value, ty: IrType) -> Value {
        self.push_value(Instruction::Arith { op: ArithOp::Rem, lhs, rhs, ty })
    }

    pub fn cmp(&mut self, op: CmpOp, lhs: Value, rhs: Value) -> Value {
        self.push_value(Instruction::Cmp { op, lhs, rhs })
    }

    /// A general-purpose stack allocation at the current insertion point.
    pub fn alloca(&mut self, ty: IrType) -> Value {
        self.push_value(Instruction::Alloca { ty })
    }

    /// A stack allocation forced into the function's entry block,
    /// regardless of the current insertion point, so the slot dominates
    /// every use — the shape a variable declaration lowers to. Always
    /// inserted at the front of the entry block rather than appended, so it
    /// never ends up after whatever terminator the entry block has already
    /// picked up.
    pub fn alloca_in_entry(&mut self, ty: IrType) -> Value {
        let entry = self.entry_block();
        self.push_value_front_into(entry, Instruction::Alloca { ty })
    }

    pub fn load(&mut self, ptr: Value, ty: IrType) -> Value {
        self.push_value(Instruction::Load { ptr, ty })
    }

    pub fn store(&mut self, ptr: Value, value: Value) {
        self.push_void(Instruction::Store { ptr, value });
    }

    pub fn gep(&mut self, base: Value, index: Value, elem_ty: IrType) -> Value {
        self.push_value(Instruction::Gep { base, index, elem_ty })
    }

    pub fn global_string(&mut self, index: u32) -> Value {
        self.push_value(Instruction::GlobalString { index })
    }

    /// Interns a string literal from within an active function body, where
    /// the enclosing `ModuleBuilder` is already mutably borrowed.
    pub fn intern_string(&mut self, s: &str) -> u32 {
        self.module.intern_string(s)
    }

    pub fn lookup_function(&self, name: &str) -> Option<FunctionId> {
        self.module.lookup_function(name)
    }

    pub fn call(&mut self, function: FunctionId, args: Vec<Value>) -> Value {
        self.push_value(Instruction::Call { function, args })
    }

    pub fn func_addr(&mut self, function: FunctionId) -> Value {
        self.push_value(Instruction::FuncAddr { function })
    }

    /// Two-incoming phi: exactly the shape a short-circuit `&&`/`||`
    /// lowering needs for its merge block.
    pub fn phi(&mut self, incoming: [(BasicBlockId, Value); 2], ty: IrType) -> Value {
        self.push_value(Instruction::Phi { incoming, ty })
    }

    pub fn va_start(&mut self) -> Value {
        self.push_value(Instruction::VaStart)
    }

    pub fn br(&mut self, target: BasicBlockId) {
        self.push_void(Instruction::Br { target });
    }

    pub fn cond_br(&mut self, cond: Value, then_block: BasicBlockId, else_block: BasicBlockId) {
        self.push_void(Instruction::CondBr { cond, then_block, else_block });
    }

    pub fn ret(&mut self, value: Option<Value>) {
        self.push_void(Instruction::Ret { value });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_function_returning_a_constant() {
        let mut mb = ModuleBuilder::new("m", "x86_64-unknown-linux-gnu");
        let id = mb.declare_function("main", vec![], IrType::I32, false);
        {
            let mut fb = mb.define_function(id);
            let v = fb.const_int(IrType::I32, 42);
            fb.ret(Some(v));
        }
        let module = mb.finish();
        assert!(module.verify().is_ok());
        assert_eq!(module.function(id).blocks.len(), 1);
    }

    #[test]
    fn verify_rejects_unterminated_block() {
        let mut mb = ModuleBuilder::new("m", "x86_64-unknown-linux-gnu");
        let id = mb.declare_function("f", vec![], IrType::Void, false);
        {
            let mut fb = mb.define_function(id);
            fb.const_int(IrType::I32, 1);
        }
        let module = mb.finish();
        assert!(module.verify().is_err());
    }

    #[test]
    fn alloca_in_entry_lands_in_first_block_from_a_later_block() {
        let mut mb = ModuleBuilder::new("m", "x86_64-unknown-linux-gnu");
        let id = mb.declare_function("f", vec![], IrType::Void, false);
        {
            let mut fb = mb.define_function(id);
            let entry = fb.entry_block();
            let other = fb.create_block();
            fb.switch_to_block(other);
            fb.alloca_in_entry(IrType::I32);
            fb.br(entry);
            fb.switch_to_block(entry);
            fb.ret(None);
        }
        let module = mb.finish();
        assert_eq!(module.function(id).blocks[0].instructions.len(), 2);
    }

    #[test]
    fn string_interning_dedupes_identical_bytes() {
        let mut mb = ModuleBuilder::new("m", "x86_64-unknown-linux-gnu");
        let a = mb.intern_string("hi");
        let b = mb.intern_string("hi");
        let c = mb.intern_string("there");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
