//! Operand stack
//!
//! A thin wrapper over `Vec<Value>` that turns underflow into a runtime
//! error instead of a panic; the dispatch loop attaches pc/opcode context.

use crate::error::JsError;
use crate::value::Value;

#[derive(Debug, Default)]
pub struct OperandStack {
    values: Vec<Value>,
}

impl OperandStack {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    pub fn pop(&mut self) -> Result<Value, JsError> {
        self.values
            .pop()
            .ok_or_else(|| JsError::runtime("operand stack underflow"))
    }

    pub fn peek(&self) -> Option<&Value> {
        self.values.last()
    }

    /// Pop `n` values; the result is in push order (bottom first)
    pub fn pop_n(&mut self, n: usize) -> Result<Vec<Value>, JsError> {
        if self.values.len() < n {
            return Err(JsError::runtime("operand stack underflow"));
        }
        Ok(self.values.split_off(self.values.len() - n))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Snapshot of the topmost values, top last (verbose debug logging)
    pub fn top_slice(&self, n: usize) -> &[Value] {
        let start = self.values.len().saturating_sub(n);
        &self.values[start..]
    }
}
