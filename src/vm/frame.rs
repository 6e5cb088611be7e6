//! Call frames

use std::rc::Rc;

use indexmap::IndexMap;

use crate::value::{UserFunction, Value};

/// Per-invocation record: locals, the resume point, and the executing
/// function (which carries the closure consulted by LOAD/STORE).
#[derive(Debug)]
pub struct CallFrame {
    /// Instruction index to resume at after RET
    pub return_pc: usize,
    /// Insertion-ordered local bindings, seeded with parameters and `this`
    pub locals: IndexMap<String, Value>,
    /// True when the frame was pushed by NEW
    pub is_constructor: bool,
    /// The pre-allocated instance when `is_constructor`, else undefined
    pub new_instance: Value,
    /// The function being executed
    pub function: Rc<UserFunction>,
}

impl CallFrame {
    pub fn new(return_pc: usize, function: Rc<UserFunction>) -> Self {
        Self {
            return_pc,
            locals: IndexMap::new(),
            is_constructor: false,
            new_instance: Value::Undefined,
            function,
        }
    }
}
