//! Statement compilation

use std::rc::Rc;

use super::bytecode::{FunctionTemplate, Op};
use super::{BreakableKind, Compiler};
use crate::ast::{
    BlockStatement, DoWhileStatement, ForInStatement, ForInTarget, ForInit, ForStatement,
    FunctionDeclaration, Identifier, IfStatement, ReturnStatement, Statement, SwitchStatement,
    ThrowStatement, TryStatement, VariableDeclaration, WhileStatement,
};
use crate::error::JsError;

impl Compiler {
    pub(super) fn compile_statement(&mut self, statement: &Statement) -> Result<(), JsError> {
        match statement {
            Statement::Expression(expr_stmt) => {
                self.builder.set_span(expr_stmt.span);
                self.compile_expression(&expr_stmt.expression)?;
                self.builder.emit(Op::Pop);
                Ok(())
            }
            Statement::VariableDeclaration(decl) => self.compile_variable_declaration(decl),
            Statement::FunctionDeclaration(decl) => self.compile_function_declaration(decl),
            Statement::Block(block) => self.compile_block(block),
            Statement::If(if_stmt) => self.compile_if(if_stmt),
            Statement::While(while_stmt) => self.compile_while(while_stmt),
            Statement::DoWhile(do_while) => self.compile_do_while(do_while),
            Statement::For(for_stmt) => self.compile_for(for_stmt),
            Statement::ForIn(for_in) => self.compile_for_in(for_in),
            Statement::Switch(switch_stmt) => self.compile_switch(switch_stmt),
            Statement::Break(brk) => {
                self.builder.set_span(brk.span);
                self.record_break()
            }
            Statement::Continue(cont) => {
                self.builder.set_span(cont.span);
                self.record_continue()
            }
            Statement::Return(ret) => self.compile_return(ret),
            Statement::Throw(throw) => self.compile_throw(throw),
            Statement::Try(try_stmt) => self.compile_try(try_stmt),
        }
    }

    fn compile_block(&mut self, block: &BlockStatement) -> Result<(), JsError> {
        self.push_scope();
        for statement in &block.body {
            self.compile_statement(statement)?;
        }
        self.pop_scope();
        Ok(())
    }

    /// `var x = e;` compiles the initializer (or undefined), then DECLARE.
    /// All declaration kinds share function-scope semantics.
    fn compile_variable_declaration(&mut self, decl: &VariableDeclaration) -> Result<(), JsError> {
        self.builder.set_span(decl.span);
        for declarator in &decl.declarations {
            match &declarator.init {
                Some(init) => self.compile_expression(init)?,
                None => self.builder.emit_push_undefined()?,
            }
            self.builder.emit_declare(declarator.id.name.clone())?;
            self.declare_name(&declarator.id.name);
        }
        Ok(())
    }

    fn compile_function_declaration(&mut self, decl: &FunctionDeclaration) -> Result<(), JsError> {
        self.builder.set_span(decl.span);
        let idx = self.compile_function_parts(
            Some(decl.id.name.clone()),
            &decl.params,
            &decl.body,
        )?;
        self.builder.emit(Op::Push { idx });
        self.builder.emit_declare(decl.id.name.clone())?;
        self.declare_name(&decl.id.name);
        Ok(())
    }

    /// Shared lowering for function declarations and expressions:
    /// jump over the body, compile it with a guaranteed trailing return,
    /// patch the jump, and pool the function template.
    pub(super) fn compile_function_parts(
        &mut self,
        name: Option<Rc<str>>,
        params: &[Identifier],
        body: &BlockStatement,
    ) -> Result<super::ConstantIndex, JsError> {
        let over_body = self.builder.emit_jump();
        let entry_pc = self.builder.current_offset();

        // Enclosing loops and switches are not breakable from inside the
        // body; the context stack is swapped out for the duration.
        let enclosing_breakables = std::mem::take(&mut self.breakables);

        self.function_depth += 1;
        self.push_scope();
        for param in params {
            self.declare_name(&param.name);
        }
        for statement in &body.body {
            self.compile_statement(statement)?;
        }
        // Guaranteed return for bodies that fall off the end
        self.builder.emit_push_undefined()?;
        self.builder.emit(Op::Ret);
        self.pop_scope();
        self.function_depth -= 1;

        self.breakables = enclosing_breakables;

        self.builder.patch_jump(over_body);

        self.builder.add_function(FunctionTemplate {
            name,
            params: params.iter().map(|p| p.name.clone()).collect(),
            entry_pc,
        })
    }

    fn compile_if(&mut self, if_stmt: &IfStatement) -> Result<(), JsError> {
        self.builder.set_span(if_stmt.span);
        self.compile_expression(&if_stmt.test)?;
        let over_consequent = self.builder.emit_jump_if_false();

        self.compile_statement(&if_stmt.consequent)?;

        match &if_stmt.alternate {
            Some(alternate) => {
                let over_alternate = self.builder.emit_jump();
                self.builder.patch_jump(over_consequent);
                self.compile_statement(alternate)?;
                self.builder.patch_jump(over_alternate);
            }
            None => {
                self.builder.patch_jump(over_consequent);
            }
        }
        Ok(())
    }

    fn compile_while(&mut self, while_stmt: &WhileStatement) -> Result<(), JsError> {
        self.builder.set_span(while_stmt.span);

        let loop_start = self.builder.current_offset();
        self.push_breakable(BreakableKind::Loop, Some(loop_start));

        self.compile_expression(&while_stmt.test)?;
        let exit = self.builder.emit_jump_if_false();

        self.compile_statement(&while_stmt.body)?;
        self.builder.emit_jump_to(loop_start);

        self.builder.patch_jump(exit);
        self.pop_breakable();
        Ok(())
    }

    fn compile_do_while(&mut self, do_while: &DoWhileStatement) -> Result<(), JsError> {
        self.builder.set_span(do_while.span);

        let body_start = self.builder.current_offset();
        self.push_breakable(BreakableKind::Loop, None);

        self.compile_statement(&do_while.body)?;

        // Continue lands on the test
        let test_offset = self.builder.current_offset();
        self.set_continue_target(test_offset);

        self.compile_expression(&do_while.test)?;
        let back = self.builder.emit_jump_if_true();
        self.builder
            .patch_jump_to(back, body_start as super::JumpTarget);

        self.pop_breakable();
        Ok(())
    }

    fn compile_for(&mut self, for_stmt: &ForStatement) -> Result<(), JsError> {
        self.builder.set_span(for_stmt.span);

        match &for_stmt.init {
            Some(ForInit::Declaration(decl)) => self.compile_variable_declaration(decl)?,
            Some(ForInit::Expression(expr)) => {
                self.compile_expression(expr)?;
                self.builder.emit(Op::Pop);
            }
            None => {}
        }

        let loop_start = self.builder.current_offset();
        self.push_breakable(BreakableKind::Loop, None);

        let exit = match &for_stmt.test {
            Some(test) => {
                self.compile_expression(test)?;
                Some(self.builder.emit_jump_if_false())
            }
            None => None,
        };

        self.compile_statement(&for_stmt.body)?;

        // Continue lands on the update clause
        let update_offset = self.builder.current_offset();
        self.set_continue_target(update_offset);

        if let Some(update) = &for_stmt.update {
            self.compile_expression(update)?;
            self.builder.emit(Op::Pop);
        }
        self.builder.emit_jump_to(loop_start);

        if let Some(exit) = exit {
            self.builder.patch_jump(exit);
        }
        self.pop_breakable();
        Ok(())
    }

    /// `for (k in o)` desugars to an index walk over the host key list:
    /// the iteree's keys land in a hidden local, a hidden index counts up
    /// against their length, and the loop variable is re-assigned each pass.
    fn compile_for_in(&mut self, for_in: &ForInStatement) -> Result<(), JsError> {
        self.builder.set_span(for_in.span);

        let keys_name = self.hidden_name("keys");
        let idx_name = self.hidden_name("idx");

        // %keys = Object.keys(iteree)
        self.compile_expression(&for_in.right)?;
        self.builder.emit_load(Rc::from("Object"))?;
        self.builder.emit(Op::Dup);
        self.builder.emit_push_string(Rc::from("keys"))?;
        self.builder.emit(Op::GetProp);
        let argc = self.builder.add_argc(1)?;
        self.builder.emit(Op::CallMethod { argc });
        self.builder.emit_declare(keys_name.clone())?;

        // %idx = 0
        self.builder.emit_push_number(0.0)?;
        self.builder.emit_declare(idx_name.clone())?;

        let loop_var = match &for_in.left {
            ForInTarget::Declaration(id) => {
                self.builder.emit_push_undefined()?;
                self.builder.emit_declare(id.name.clone())?;
                self.declare_name(&id.name);
                id.name.clone()
            }
            ForInTarget::Identifier(id) => {
                // Undeclared loop variables get a binding in the current
                // scope instead of leaking through the STORE fallback.
                if !self.is_declared(&id.name) {
                    self.builder.emit_push_undefined()?;
                    self.builder.emit_declare(id.name.clone())?;
                    self.declare_name(&id.name);
                }
                id.name.clone()
            }
        };

        let loop_start = self.builder.current_offset();
        self.push_breakable(BreakableKind::Loop, None);

        // %idx < %keys.length
        self.builder.emit_load(idx_name.clone())?;
        self.builder.emit_load(keys_name.clone())?;
        self.builder.emit_push_string(Rc::from("length"))?;
        self.builder.emit(Op::GetProp);
        self.builder.emit(Op::Lt);
        let exit = self.builder.emit_jump_if_false();

        // loop_var = %keys[%idx]
        self.builder.emit_load(keys_name.clone())?;
        self.builder.emit_load(idx_name.clone())?;
        self.builder.emit(Op::GetElem);
        self.builder.emit_store(loop_var)?;

        self.compile_statement(&for_in.body)?;

        // Continue lands on the increment
        let increment_offset = self.builder.current_offset();
        self.set_continue_target(increment_offset);

        self.builder.emit_load(idx_name.clone())?;
        self.builder.emit_push_number(1.0)?;
        self.builder.emit(Op::Add);
        self.builder.emit_store(idx_name)?;
        self.builder.emit_jump_to(loop_start);

        self.builder.patch_jump(exit);
        self.pop_breakable();
        Ok(())
    }

    /// Switch lowering: the discriminant lands in a hidden local, each
    /// case test compares against it, and bodies fall through in source
    /// order. `break` binds here (taking precedence over enclosing loops).
    fn compile_switch(&mut self, switch_stmt: &SwitchStatement) -> Result<(), JsError> {
        self.builder.set_span(switch_stmt.span);

        let disc_name = self.hidden_name("switch");
        self.compile_expression(&switch_stmt.discriminant)?;
        self.builder.emit_declare(disc_name.clone())?;

        self.push_breakable(BreakableKind::Switch, None);

        // Dispatch chain: one strict comparison per non-default case
        let mut case_jumps = Vec::with_capacity(switch_stmt.cases.len());
        for case in &switch_stmt.cases {
            match &case.test {
                Some(test) => {
                    self.builder.set_span(case.span);
                    self.builder.emit_load(disc_name.clone())?;
                    self.compile_expression(test)?;
                    self.builder.emit(Op::Eq);
                    case_jumps.push(Some(self.builder.emit_jump_if_true()));
                }
                None => case_jumps.push(None),
            }
        }

        // No case matched: jump to the default body, or past the switch
        let no_match = self.builder.emit_jump();
        let mut default_patched = false;

        for (case, jump) in switch_stmt.cases.iter().zip(case_jumps) {
            match jump {
                Some(jump) => self.builder.patch_jump(jump),
                None => {
                    self.builder.patch_jump(no_match);
                    default_patched = true;
                }
            }
            for statement in &case.consequent {
                self.compile_statement(statement)?;
            }
        }

        if !default_patched {
            self.builder.patch_jump(no_match);
        }
        self.pop_breakable();
        Ok(())
    }

    fn compile_return(&mut self, ret: &ReturnStatement) -> Result<(), JsError> {
        self.builder.set_span(ret.span);
        if self.function_depth == 0 {
            return Err(JsError::compile_at(
                "'return' outside of a function",
                ret.span.line,
                ret.span.column,
            ));
        }
        match &ret.argument {
            Some(argument) => self.compile_expression(argument)?,
            None => self.builder.emit_push_undefined()?,
        }
        self.builder.emit(Op::Ret);
        Ok(())
    }

    fn compile_throw(&mut self, throw: &ThrowStatement) -> Result<(), JsError> {
        self.builder.set_span(throw.span);
        self.compile_expression(&throw.argument)?;
        self.builder.emit(Op::Throw);
        Ok(())
    }

    /// Partial exception support: the try block and the finalizer compile
    /// inline; the catch clause is unreachable (thrown values surface as
    /// runtime errors) and is dropped.
    fn compile_try(&mut self, try_stmt: &TryStatement) -> Result<(), JsError> {
        self.builder.set_span(try_stmt.span);
        self.compile_block(&try_stmt.block)?;
        if let Some(finalizer) = &try_stmt.finalizer {
            self.compile_block(finalizer)?;
        }
        Ok(())
    }
}
