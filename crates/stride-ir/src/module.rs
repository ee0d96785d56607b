use std::collections::HashMap;

use crate::instr::Instruction;
use crate::ty::IrType;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BasicBlockId(pub(crate) u32);

/// A straight-line sequence of instructions. Sealed by exactly one
/// terminator once codegen finishes emitting into it.
///
/// `results[i]` is the `Value` that `instructions[i]` produces, or `None`
/// for instructions with no result (`Store`, `Br`, `CondBr`, `Ret`). A
/// consumer cannot recover an instruction's produced `Value` from its
/// position alone — `alloca_in_entry` appends to block 0 out of the
/// value-numbering order of whatever block is current at the time — so the
/// builder records it explicitly here instead.
#[derive(Debug, Clone, Default)]
pub struct BasicBlock {
    pub instructions: Vec<Instruction>,
    pub results: Vec<Option<Value>>,
}

impl BasicBlock {
    pub fn is_terminated(&self) -> bool {
        matches!(self.instructions.last(), Some(i) if i.is_terminator())
    }
}

/// One function: its mangled name, signature, and body (empty for a
/// declaration-only / extern function).
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub params: Vec<IrType>,
    pub ret: IrType,
    pub is_variadic: bool,
    pub is_declaration: bool,
    pub blocks: Vec<BasicBlock>,
    pub(crate) value_count: u32,
}

impl Function {
    pub fn entry_block(&self) -> BasicBlockId {
        BasicBlockId(0)
    }

    pub fn block(&self, id: BasicBlockId) -> &BasicBlock {
        &self.blocks[id.0 as usize]
    }

    /// How many `Value` slots this function's instructions address,
    /// including its own parameters (`0..params.len()`). A backend's call
    /// frame sizes its local value table from this.
    pub fn value_count(&self) -> u32 {
        self.value_count
    }
}

/// The top-level IR container: named, owning an ordered collection of
/// functions and a deduplicated table of global string constants.
#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    pub target_triple: String,
    functions: Vec<Function>,
    function_index: HashMap<String, FunctionId>,
    strings: Vec<String>,
    string_index: HashMap<String, u32>,
}

impl Module {
    pub fn new(name: impl Into<String>, target_triple: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_triple: target_triple.into(),
            functions: Vec::new(),
            function_index: HashMap::new(),
            strings: Vec::new(),
            string_index: HashMap::new(),
        }
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.0 as usize]
    }

    pub fn function_mut(&mut self, id: FunctionId) -> &mut Function {
        &mut self.functions[id.0 as usize]
    }

    /// Looks up a function by its exact (already-mangled, or unmangled for
    /// externs) name.
    pub fn lookup_function(&self, name: &str) -> Option<FunctionId> {
        self.function_index.get(name).copied()
    }

    pub fn string_table(&self) -> &[String] {
        &self.strings
    }

    /// Interns a string literal by value. Identical bytes always resolve
    /// to the same global index.
    pub fn intern_string(&mut self, s: &str) -> u32 {
        if let Some(&idx) = self.string_index.get(s) {
            return idx;
        }
        let idx = self.strings.len() as u32;
        self.strings.push(s.to_owned());
        self.string_index.insert(s.to_owned(), idx);
        idx
    }

    pub(crate) fn push_function(&mut self, function: Function, name: String) -> FunctionId {
        let id = FunctionId(self.functions.len() as u32);
        self.functions.push(function);
        self.function_index.insert(name, id);
        id
    }

    /// Structural check only: every block ends in exactly one terminator,
    /// and every `Value` operand refers to something produced earlier in
    /// the same function. This is not a type checker.
    pub fn verify(&self) -> Result<(), String> {
        for f in &self.functions {
            if f.is_declaration {
                continue;
            }
            if f.blocks.is_empty() {
                return Err(format!("function '{}' has no blocks", f.name));
            }

            let mut defined: std::collections::HashSet<u32> = (0..f.params.len() as u32).collect();

            for (i, block) in f.blocks.iter().enumerate() {
                if !block.is_terminated() {
                    return Err(format!(
                        "function '{}' block {} is not terminated",
                        f.name, i
                    ));
                }
                for instr in &block.instructions[..block.instructions.len() - 1] {
                    if instr.is_terminator() {
                        return Err(format!(
                            "function '{}' block {} has a terminator before its end",
                            f.name, i
                        ));
                    }
                }

                for (instr, result) in block.instructions.iter().zip(block.results.iter()) {
                    for operand in instr.value_operands() {
                        if !defined.contains(&operand.index()) {
                            return Err(format!(
                                "function '{}' block {} uses value %{} before it is produced",
                                f.name, i, operand.index()
                            ));
                        }
                    }
                    if let Some(v) = result {
                        defined.insert(v.index());
                    }
                }
            }
        }
        Ok(())
    }
}
