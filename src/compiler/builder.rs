//! ProgramBuilder - helper for emitting bytecode instructions
//!
//! Provides a convenient API for building programs with constant pooling
//! and forward-jump patching support.

use std::rc::Rc;

use super::bytecode::{
    Constant, ConstantIndex, ConstantPool, DebugEntry, DebugInfo, FunctionTemplate, JumpTarget, Op,
    Program,
};
use crate::error::JsError;
use crate::lexer::Span;

/// Placeholder for a jump that needs to be patched later
#[derive(Debug, Clone, Copy)]
pub struct JumpPlaceholder {
    /// Index of the jump instruction in the code
    pub instruction_index: usize,
}

/// Builder for constructing programs
pub struct ProgramBuilder {
    code: Vec<Op>,
    constants: ConstantPool,
    /// Debug entries; only populated when debug symbols are enabled
    debug_entries: Vec<DebugEntry>,
    emit_debug: bool,
    /// Current source span (attached to emitted instructions)
    current_span: Option<Span>,
}

impl ProgramBuilder {
    pub fn new(emit_debug: bool) -> Self {
        Self {
            code: Vec::new(),
            constants: ConstantPool::new(),
            debug_entries: Vec::new(),
            emit_debug,
            current_span: None,
        }
    }

    /// Set the source span attached to subsequently emitted instructions
    pub fn set_span(&mut self, span: Span) {
        self.current_span = Some(span);
    }

    /// Emit an instruction and return its index
    pub fn emit(&mut self, op: Op) -> usize {
        let index = self.code.len();

        if self.emit_debug {
            if let Some(span) = self.current_span {
                let should_add = self
                    .debug_entries
                    .last()
                    .map(|e| e.line != span.line || e.column != span.column)
                    .unwrap_or(true);
                if should_add {
                    self.debug_entries.push(DebugEntry {
                        pc: index,
                        line: span.line,
                        column: span.column,
                    });
                }
            }
        }

        self.code.push(op);
        index
    }

    /// Emit an unconditional jump with a placeholder target
    pub fn emit_jump(&mut self) -> JumpPlaceholder {
        let index = self.emit(Op::Jmp { target: 0 });
        JumpPlaceholder {
            instruction_index: index,
        }
    }

    /// Emit a jump-if-truthy with a placeholder target
    pub fn emit_jump_if_true(&mut self) -> JumpPlaceholder {
        let index = self.emit(Op::Jif { target: 0 });
        JumpPlaceholder {
            instruction_index: index,
        }
    }

    /// Emit a jump-if-falsy with a placeholder target
    pub fn emit_jump_if_false(&mut self) -> JumpPlaceholder {
        let index = self.emit(Op::Jnf { target: 0 });
        JumpPlaceholder {
            instruction_index: index,
        }
    }

    /// Emit a jump to a known (backward) target
    pub fn emit_jump_to(&mut self, target: usize) {
        self.emit(Op::Jmp {
            target: target as JumpTarget,
        });
    }

    /// Patch a placeholder to jump to the current position
    pub fn patch_jump(&mut self, placeholder: JumpPlaceholder) {
        let target = self.code.len() as JumpTarget;
        self.patch_jump_to(placeholder, target);
    }

    /// Patch a placeholder to jump to a specific target
    pub fn patch_jump_to(&mut self, placeholder: JumpPlaceholder, target: JumpTarget) {
        if let Some(op) = self.code.get_mut(placeholder.instruction_index) {
            match op {
                Op::Jmp { target: t } | Op::Jif { target: t } | Op::Jnf { target: t } => {
                    *t = target;
                }
                _ => debug_assert!(false, "patch target is not a jump instruction"),
            }
        }
    }

    /// Current instruction offset (the next instruction's index)
    pub fn current_offset(&self) -> usize {
        self.code.len()
    }

    pub fn add_undefined(&mut self) -> Result<ConstantIndex, JsError> {
        self.constants.add_undefined()
    }

    pub fn add_null(&mut self) -> Result<ConstantIndex, JsError> {
        self.constants.add_null()
    }

    pub fn add_bool(&mut self, value: bool) -> Result<ConstantIndex, JsError> {
        self.constants.add_bool(value)
    }

    pub fn add_number(&mut self, value: f64) -> Result<ConstantIndex, JsError> {
        self.constants.add_number(value)
    }

    pub fn add_string(&mut self, value: Rc<str>) -> Result<ConstantIndex, JsError> {
        self.constants.add_string(value)
    }

    pub fn add_regex(&mut self, pattern: Rc<str>, flags: Rc<str>) -> Result<ConstantIndex, JsError> {
        self.constants.add_regex(pattern, flags)
    }

    pub fn add_function(&mut self, template: FunctionTemplate) -> Result<ConstantIndex, JsError> {
        self.constants.add_function(template)
    }

    /// Emit `Push` for a pooled number
    pub fn emit_push_number(&mut self, value: f64) -> Result<(), JsError> {
        let idx = self.add_number(value)?;
        self.emit(Op::Push { idx });
        Ok(())
    }

    /// Emit `Push` for a pooled string
    pub fn emit_push_string(&mut self, value: Rc<str>) -> Result<(), JsError> {
        let idx = self.add_string(value)?;
        self.emit(Op::Push { idx });
        Ok(())
    }

    /// Emit `Push` for undefined
    pub fn emit_push_undefined(&mut self) -> Result<(), JsError> {
        let idx = self.add_undefined()?;
        self.emit(Op::Push { idx });
        Ok(())
    }

    /// Emit `Load` for a name
    pub fn emit_load(&mut self, name: Rc<str>) -> Result<(), JsError> {
        let idx = self.add_string(name)?;
        self.emit(Op::Load { name: idx });
        Ok(())
    }

    /// Emit `Store` for a name
    pub fn emit_store(&mut self, name: Rc<str>) -> Result<(), JsError> {
        let idx = self.add_string(name)?;
        self.emit(Op::Store { name: idx });
        Ok(())
    }

    /// Emit `Declare` for a name
    pub fn emit_declare(&mut self, name: Rc<str>) -> Result<(), JsError> {
        let idx = self.add_string(name)?;
        self.emit(Op::Declare { name: idx });
        Ok(())
    }

    /// Pool an argument count for the call family
    pub fn add_argc(&mut self, argc: usize) -> Result<ConstantIndex, JsError> {
        self.add_number(argc as f64)
    }

    /// Look at an already-pooled constant (used by peephole checks)
    pub fn constant(&self, idx: ConstantIndex) -> Option<&Constant> {
        self.constants.get(idx)
    }

    /// Finish building; `source` provides line text for debug symbols
    pub fn finish(self, source: Option<&str>) -> Program {
        let debug = if self.emit_debug {
            Some(DebugInfo {
                entries: self.debug_entries,
                lines: source
                    .map(|s| s.lines().map(str::to_string).collect())
                    .unwrap_or_default(),
            })
        } else {
            None
        };

        Program {
            code: self.code,
            constants: self.constants,
            debug,
        }
    }
}
