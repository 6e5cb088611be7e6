//! Expression compilation
//!
//! Every expression handler leaves exactly one value on the operand stack.

use std::rc::Rc;

use super::bytecode::Op;
use super::Compiler;
use crate::ast::{
    ArrayExpression, AssignmentExpression, AssignmentOp, BinaryExpression, BinaryOp,
    CallExpression, ConditionalExpression, Expression, LogicalExpression, LogicalOp, MemberKey,
    MemberExpression, NewExpression, ObjectExpression, PropertyKey, SequenceExpression,
    TemplateLiteral, UnaryExpression, UnaryOp, UpdateExpression, UpdateOp,
};
use crate::error::JsError;
use crate::value::format_number;

impl Compiler {
    pub(super) fn compile_expression(&mut self, expr: &Expression) -> Result<(), JsError> {
        self.builder.set_span(expr.span());

        match expr {
            Expression::Number(n) => self.builder.emit_push_number(n.value),
            Expression::String(s) => self.builder.emit_push_string(s.value.clone()),
            Expression::Boolean(b) => {
                let idx = self.builder.add_bool(b.value)?;
                self.builder.emit(Op::Push { idx });
                Ok(())
            }
            Expression::Null(_) => {
                let idx = self.builder.add_null()?;
                self.builder.emit(Op::Push { idx });
                Ok(())
            }
            Expression::Template(template) => self.compile_template(template),
            Expression::RegExp(regex) => {
                let idx = self
                    .builder
                    .add_regex(regex.pattern.clone(), regex.flags.clone())?;
                self.builder.emit(Op::Push { idx });
                Ok(())
            }
            Expression::Identifier(id) => self.builder.emit_load(id.name.clone()),
            Expression::This(_) => self.builder.emit_load(Rc::from("this")),
            Expression::Binary(binary) => self.compile_binary(binary),
            Expression::Logical(logical) => self.compile_logical(logical),
            Expression::Unary(unary) => self.compile_unary(unary),
            Expression::Update(update) => self.compile_update(update),
            Expression::Assignment(assignment) => self.compile_assignment(assignment),
            Expression::Conditional(conditional) => self.compile_conditional(conditional),
            Expression::Sequence(sequence) => self.compile_sequence(sequence),
            Expression::Call(call) => self.compile_call(call),
            Expression::New(new) => self.compile_new(new),
            Expression::Member(member) => self.compile_member_read(member),
            Expression::Array(array) => self.compile_array(array),
            Expression::Object(object) => self.compile_object(object),
            Expression::Function(func) => {
                let idx = self.compile_function_parts(
                    func.id.as_ref().map(|id| id.name.clone()),
                    &func.params,
                    &func.body,
                )?;
                self.builder.emit(Op::Push { idx });
                Ok(())
            }
        }
    }

    /// Templates lower to a concatenation chain seeded by the first quasi,
    /// so `Add` always sees a string on its left.
    fn compile_template(&mut self, template: &TemplateLiteral) -> Result<(), JsError> {
        self.builder.emit_push_string(template.quasis[0].clone())?;
        for (expr, quasi) in template
            .expressions
            .iter()
            .zip(template.quasis.iter().skip(1))
        {
            self.compile_expression(expr)?;
            self.builder.emit(Op::Add);
            if !quasi.is_empty() {
                self.builder.emit_push_string(quasi.clone())?;
                self.builder.emit(Op::Add);
            }
        }
        Ok(())
    }

    fn compile_binary(&mut self, binary: &BinaryExpression) -> Result<(), JsError> {
        self.compile_expression(&binary.left)?;
        self.compile_expression(&binary.right)?;
        let op = match binary.op {
            BinaryOp::Add => Op::Add,
            BinaryOp::Sub => Op::Sub,
            BinaryOp::Mul => Op::Mul,
            BinaryOp::Div => Op::Div,
            BinaryOp::Mod => Op::Mod,
            BinaryOp::Shl => Op::Shl,
            BinaryOp::Shr => Op::Shr,
            BinaryOp::UShr => Op::UShr,
            BinaryOp::BitAnd => Op::BitAnd,
            BinaryOp::BitOr => Op::BitOr,
            BinaryOp::BitXor => Op::BitXor,
            BinaryOp::Eq => Op::Eq,
            BinaryOp::NotEq => Op::Ne,
            BinaryOp::Lt => Op::Lt,
            BinaryOp::LtEq => Op::Le,
            BinaryOp::Gt => Op::Gt,
            BinaryOp::GtEq => Op::Ge,
        };
        self.builder.emit(op);
        Ok(())
    }

    /// `a && b` → a; DUP; JNF end; POP; b; end.
    /// `a || b` is symmetric with JIF.
    fn compile_logical(&mut self, logical: &LogicalExpression) -> Result<(), JsError> {
        self.compile_expression(&logical.left)?;
        self.builder.emit(Op::Dup);
        let short = match logical.op {
            LogicalOp::And => self.builder.emit_jump_if_false(),
            LogicalOp::Or => self.builder.emit_jump_if_true(),
        };
        self.builder.emit(Op::Pop);
        self.compile_expression(&logical.right)?;
        self.builder.patch_jump(short);
        Ok(())
    }

    fn compile_unary(&mut self, unary: &UnaryExpression) -> Result<(), JsError> {
        self.compile_expression(&unary.argument)?;
        match unary.op {
            UnaryOp::Minus => {
                self.builder.emit(Op::Neg);
            }
            UnaryOp::Plus => {
                // Numeric coercion without a dedicated opcode
                self.builder.emit_push_number(1.0)?;
                self.builder.emit(Op::Mul);
            }
            UnaryOp::Not => {
                self.builder.emit(Op::Not);
            }
            UnaryOp::BitNot => {
                self.builder.emit(Op::BitNot);
            }
            UnaryOp::Typeof => {
                self.builder.emit(Op::TypeOf);
            }
        }
        Ok(())
    }

    /// Prefix: load, apply, DUP, store (leaves the new value).
    /// Postfix: load, DUP, apply, store (leaves the old value).
    fn compile_update(&mut self, update: &UpdateExpression) -> Result<(), JsError> {
        let step = match update.op {
            UpdateOp::Increment => Op::Add,
            UpdateOp::Decrement => Op::Sub,
        };

        match &update.argument {
            Expression::Identifier(id) => {
                self.builder.emit_load(id.name.clone())?;
                if update.prefix {
                    self.builder.emit_push_number(1.0)?;
                    self.builder.emit(step);
                    self.builder.emit(Op::Dup);
                    self.builder.emit_store(id.name.clone())?;
                } else {
                    self.builder.emit(Op::Dup);
                    self.builder.emit_push_number(1.0)?;
                    self.builder.emit(step);
                    self.builder.emit_store(id.name.clone())?;
                }
                Ok(())
            }
            Expression::Member(member) => {
                self.compile_member_fetch(member)?;
                if update.prefix {
                    self.builder.emit_push_number(1.0)?;
                    self.builder.emit(step);
                    self.compile_member_store(member)?;
                } else {
                    self.builder.emit(Op::Dup);
                    self.builder.emit_push_number(1.0)?;
                    self.builder.emit(step);
                    self.compile_member_store(member)?;
                    // SetProp left the new value above the saved old one
                    self.builder.emit(Op::Pop);
                }
                Ok(())
            }
            other => Err(JsError::compile_at(
                "invalid increment/decrement target",
                other.span().line,
                other.span().column,
            )),
        }
    }

    fn compile_assignment(&mut self, assignment: &AssignmentExpression) -> Result<(), JsError> {
        let compound = match assignment.op {
            AssignmentOp::Assign => None,
            AssignmentOp::Add => Some(Op::Add),
            AssignmentOp::Sub => Some(Op::Sub),
            AssignmentOp::Mul => Some(Op::Mul),
            AssignmentOp::Div => Some(Op::Div),
            AssignmentOp::Mod => Some(Op::Mod),
            AssignmentOp::Shl => Some(Op::Shl),
            AssignmentOp::Shr => Some(Op::Shr),
            AssignmentOp::UShr => Some(Op::UShr),
            AssignmentOp::BitAnd => Some(Op::BitAnd),
            AssignmentOp::BitOr => Some(Op::BitOr),
            AssignmentOp::BitXor => Some(Op::BitXor),
        };

        match (&assignment.target, compound) {
            (Expression::Identifier(id), None) => {
                self.compile_expression(&assignment.value)?;
                self.builder.emit(Op::Dup);
                self.builder.emit_store(id.name.clone())
            }
            (Expression::Identifier(id), Some(op)) => {
                self.builder.emit_load(id.name.clone())?;
                self.compile_expression(&assignment.value)?;
                self.builder.emit(op);
                self.builder.emit(Op::Dup);
                self.builder.emit_store(id.name.clone())
            }
            (Expression::Member(member), None) => {
                self.compile_expression(&assignment.value)?;
                self.compile_member_store(member)
            }
            (Expression::Member(member), Some(op)) => {
                self.compile_member_fetch(member)?;
                self.compile_expression(&assignment.value)?;
                self.builder.emit(op);
                self.compile_member_store(member)
            }
            (other, _) => Err(JsError::compile_at(
                "cannot assign to this expression",
                other.span().line,
                other.span().column,
            )),
        }
    }

    /// Read a member target: leaves the current value
    fn compile_member_fetch(&mut self, member: &MemberExpression) -> Result<(), JsError> {
        self.compile_expression(&member.object)?;
        match &member.property {
            MemberKey::Named(id) => {
                self.builder.emit_push_string(id.name.clone())?;
                self.builder.emit(Op::GetProp);
            }
            MemberKey::Computed(key) => {
                self.compile_expression(key)?;
                self.builder.emit(Op::GetElem);
            }
        }
        Ok(())
    }

    /// Store to a member target: expects the value on the stack, re-evaluates
    /// the object and key, and leaves the stored value (SetProp contract).
    /// Computed keys route through SetProp as well.
    fn compile_member_store(&mut self, member: &MemberExpression) -> Result<(), JsError> {
        self.compile_expression(&member.object)?;
        match &member.property {
            MemberKey::Named(id) => {
                self.builder.emit_push_string(id.name.clone())?;
            }
            MemberKey::Computed(key) => {
                self.compile_expression(key)?;
            }
        }
        self.builder.emit(Op::SetProp);
        Ok(())
    }

    fn compile_member_read(&mut self, member: &MemberExpression) -> Result<(), JsError> {
        self.compile_member_fetch(member)
    }

    fn compile_conditional(&mut self, conditional: &ConditionalExpression) -> Result<(), JsError> {
        self.compile_expression(&conditional.test)?;
        let over_consequent = self.builder.emit_jump_if_false();
        self.compile_expression(&conditional.consequent)?;
        let over_alternate = self.builder.emit_jump();
        self.builder.patch_jump(over_consequent);
        self.compile_expression(&conditional.alternate)?;
        self.builder.patch_jump(over_alternate);
        Ok(())
    }

    fn compile_sequence(&mut self, sequence: &SequenceExpression) -> Result<(), JsError> {
        let last = sequence.expressions.len() - 1;
        for (i, expr) in sequence.expressions.iter().enumerate() {
            self.compile_expression(expr)?;
            if i != last {
                self.builder.emit(Op::Pop);
            }
        }
        Ok(())
    }

    /// Arguments are emitted right-to-left so the callee ends up on top and
    /// the VM pops arguments in forward order.
    fn compile_call(&mut self, call: &CallExpression) -> Result<(), JsError> {
        for argument in call.arguments.iter().rev() {
            self.compile_expression(argument)?;
        }

        match &call.callee {
            Expression::Member(member) => {
                // Keep the receiver beneath the resolved method
                self.compile_expression(&member.object)?;
                self.builder.emit(Op::Dup);
                match &member.property {
                    MemberKey::Named(id) => {
                        self.builder.emit_push_string(id.name.clone())?;
                    }
                    MemberKey::Computed(key) => {
                        self.compile_expression(key)?;
                    }
                }
                self.builder.emit(Op::GetProp);
                let argc = self.builder.add_argc(call.arguments.len())?;
                self.builder.emit(Op::CallMethod { argc });
            }
            callee => {
                self.compile_expression(callee)?;
                let argc = self.builder.add_argc(call.arguments.len())?;
                self.builder.emit(Op::Call { argc });
            }
        }
        Ok(())
    }

    fn compile_new(&mut self, new: &NewExpression) -> Result<(), JsError> {
        for argument in new.arguments.iter().rev() {
            self.compile_expression(argument)?;
        }
        self.compile_expression(&new.callee)?;
        let argc = self.builder.add_argc(new.arguments.len())?;
        self.builder.emit(Op::New { argc });
        Ok(())
    }

    fn compile_array(&mut self, array: &ArrayExpression) -> Result<(), JsError> {
        for element in &array.elements {
            self.compile_expression(element)?;
        }
        self.builder.emit_push_number(array.elements.len() as f64)?;
        self.builder.emit(Op::NewArr);
        Ok(())
    }

    /// Object literals push value-then-key per property, then the count
    fn compile_object(&mut self, object: &ObjectExpression) -> Result<(), JsError> {
        for property in &object.properties {
            self.compile_expression(&property.value)?;
            match &property.key {
                PropertyKey::Identifier(name) | PropertyKey::String(name) => {
                    self.builder.emit_push_string(name.clone())?;
                }
                PropertyKey::Number(n) => {
                    self.builder
                        .emit_push_string(Rc::from(format_number(*n).as_str()))?;
                }
                PropertyKey::Computed(key) => {
                    self.compile_expression(key)?;
                }
            }
        }
        self.builder
            .emit_push_number(object.properties.len() as f64)?;
        self.builder.emit(Op::NewObj);
        Ok(())
    }
}
