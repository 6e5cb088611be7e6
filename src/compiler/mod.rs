//! Bytecode compiler
//!
//! Lowers the AST to stack-machine instructions. Expressions leave exactly
//! one value on the operand stack; statements leave none (except the last
//! top-level expression statement, whose value survives for the host).

mod builder;
mod bytecode;
mod compile_expr;
mod compile_stmt;

pub use builder::{JumpPlaceholder, ProgramBuilder};
pub use bytecode::{
    Constant, ConstantIndex, ConstantPool, DebugEntry, DebugInfo, FunctionTemplate, JumpTarget, Op,
    Program,
};

use rustc_hash::FxHashSet;

use crate::ast;
use crate::error::JsError;

/// Prefix for compiler-generated locals (`%keys0`, `%idx0`, `%switch0`).
/// `%` cannot appear in a script identifier, so desugared temporaries can
/// never collide with, shadow, or be read by script names.
pub(crate) const HIDDEN_NAME_PREFIX: char = '%';

/// Whether a binding name is a compiler-generated temporary. The VM keeps
/// such names out of `state()` listings and closure captures.
pub(crate) fn is_hidden_name(name: &str) -> bool {
    name.starts_with(HIDDEN_NAME_PREFIX)
}

/// What a `break` can bind to. `continue` only binds to loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreakableKind {
    Loop,
    Switch,
}

/// Pending jumps for one enclosing loop or switch
struct BreakableContext {
    kind: BreakableKind,
    /// Jumps patched to the end of the construct
    break_jumps: Vec<JumpPlaceholder>,
    /// Forward jumps to the continue point, patched when it is known
    continue_jumps: Vec<JumpPlaceholder>,
    /// Backward continue target, when already known at entry
    continue_target: Option<usize>,
}

/// Compiler state for converting an AST into a `Program`
pub struct Compiler {
    builder: ProgramBuilder,

    /// Innermost-last stack of enclosing loops/switches
    breakables: Vec<BreakableContext>,

    /// Lexical scope stack of declared names (names only, no values)
    scopes: Vec<FxHashSet<String>>,

    /// Nesting depth of function bodies being compiled
    function_depth: usize,

    /// Counter for hidden locals (%keys0, %idx0, %switch0, ...)
    hidden_counter: u32,
}

impl Compiler {
    pub fn new(emit_debug: bool) -> Self {
        Self {
            builder: ProgramBuilder::new(emit_debug),
            breakables: Vec::new(),
            scopes: vec![FxHashSet::default()],
            function_depth: 0,
            hidden_counter: 0,
        }
    }

    /// Compile a program AST. `source` is kept for debug-symbol line text.
    pub fn compile(program: &ast::Program, source: &str, emit_debug: bool) -> Result<Program, JsError> {
        let mut compiler = Compiler::new(emit_debug);
        compiler.compile_top_level(&program.body)?;
        compiler.builder.emit(Op::Halt);
        Ok(compiler.builder.finish(Some(source)))
    }

    /// Top-level statement list: the final expression statement keeps its
    /// value on the stack so it becomes the program result.
    fn compile_top_level(&mut self, body: &[ast::Statement]) -> Result<(), JsError> {
        let last_expr_index = body
            .iter()
            .rposition(|s| matches!(s, ast::Statement::Expression(_)));

        for (i, statement) in body.iter().enumerate() {
            match statement {
                ast::Statement::Expression(expr_stmt) if Some(i) == last_expr_index => {
                    self.compile_expression(&expr_stmt.expression)?;
                }
                other => self.compile_statement(other)?,
            }
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Scope bookkeeping
    // ═══════════════════════════════════════════════════════════════════════════

    fn push_scope(&mut self) {
        self.scopes.push(FxHashSet::default());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare_name(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string());
        }
    }

    fn is_declared(&self, name: &str) -> bool {
        self.scopes.iter().rev().any(|s| s.contains(name))
    }

    /// Allocate a hidden local name for desugared constructs
    fn hidden_name(&mut self, prefix: &str) -> std::rc::Rc<str> {
        let name = format!("{}{}{}", HIDDEN_NAME_PREFIX, prefix, self.hidden_counter);
        self.hidden_counter += 1;
        std::rc::Rc::from(name.as_str())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Break/continue contexts
    // ═══════════════════════════════════════════════════════════════════════════

    fn push_breakable(&mut self, kind: BreakableKind, continue_target: Option<usize>) {
        self.breakables.push(BreakableContext {
            kind,
            break_jumps: Vec::new(),
            continue_jumps: Vec::new(),
            continue_target,
        });
    }

    /// Set the continue target for the innermost loop and patch forward
    /// continue jumps recorded so far.
    fn set_continue_target(&mut self, target: usize) {
        if let Some(ctx) = self.breakables.last_mut() {
            ctx.continue_target = Some(target);
            let pending = std::mem::take(&mut ctx.continue_jumps);
            for jump in pending {
                self.builder.patch_jump_to(jump, target as JumpTarget);
            }
        }
    }

    /// Pop the innermost context and patch its break jumps to here
    fn pop_breakable(&mut self) {
        if let Some(ctx) = self.breakables.pop() {
            debug_assert!(ctx.continue_jumps.is_empty() || ctx.kind == BreakableKind::Switch);
            for jump in ctx.break_jumps {
                self.builder.patch_jump(jump);
            }
        }
    }

    fn record_break(&mut self) -> Result<(), JsError> {
        if self.breakables.is_empty() {
            return Err(JsError::compile("'break' outside of a loop or switch"));
        }
        let jump = self.builder.emit_jump();
        if let Some(ctx) = self.breakables.last_mut() {
            ctx.break_jumps.push(jump);
        }
        Ok(())
    }

    fn record_continue(&mut self) -> Result<(), JsError> {
        let target = self
            .breakables
            .iter()
            .rev()
            .find(|c| c.kind == BreakableKind::Loop)
            .and_then(|c| c.continue_target);

        // The innermost loop may not know its continue point yet (for-loop
        // updates come after the body); record a forward jump in that case.
        let has_loop = self
            .breakables
            .iter()
            .any(|c| c.kind == BreakableKind::Loop);
        if !has_loop {
            return Err(JsError::compile("'continue' outside of a loop"));
        }

        match target {
            Some(t) => {
                self.builder.emit_jump_to(t);
            }
            None => {
                let jump = self.builder.emit_jump();
                if let Some(ctx) = self
                    .breakables
                    .iter_mut()
                    .rev()
                    .find(|c| c.kind == BreakableKind::Loop)
                {
                    ctx.continue_jumps.push(jump);
                }
            }
        }
        Ok(())
    }
}
