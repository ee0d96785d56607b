//! Call frame stack for recursive interpretation.
//!
//! This interpreter never needs to restore a frame after the fact — a
//! function call always either returns normally or the whole
//! interpretation aborts on error — so frames are pushed and popped in
//! strict LIFO order rather than kept in a prunable arena.

use stride_ir::Value;

use super::value::RuntimeValue;

/// One function activation: a flat table of runtime values addressed by
/// `Value::index()`, sized up front from `Function::value_count()` so
/// every instruction's result (and every parameter) has a home slot.
pub struct Frame {
    values: Vec<Option<RuntimeValue>>,
}

impl Frame {
    pub fn new(value_count: u32) -> Self {
        Self {
            values: vec![None; value_count as usize],
        }
    }

    pub fn set(&mut self, value: Value, result: RuntimeValue) {
        self.values[value.index() as usize] = Some(result);
    }

    pub fn get(&self, value: Value) -> Option<RuntimeValue> {
        self.values[value.index() as usize]
    }
}

/// The call stack. `depth()` backs the interpreter's recursion-limit
/// check — there are no cancellation points during interpretation, so
/// runaway recursion is the one thing the interpreter itself must guard
/// against.
#[derive(Default)]
pub struct CallStack {
    frames: Vec<Frame>,
}

impl CallStack {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Frame {
        self.frames.pop().expect("pop on empty call stack")
    }

    pub fn current(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("no active call frame")
    }

    pub fn depth(&self) -> u32 {
        self.frames.len() as u32
    }
}
