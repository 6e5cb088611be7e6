//! Parser for script source code
//!
//! Recursive descent with precedence climbing for expressions. Produces
//! exactly the AST node set the compiler consumes; anything outside the
//! supported subset is a SyntaxError naming the construct.

use std::rc::Rc;

use crate::ast::*;
use crate::error::JsError;
use crate::lexer::{Lexer, Span, TemplateToken, Token, TokenKind};

/// Saved parser position for bounded backtracking (the for/for-in split)
struct Checkpoint<'a> {
    lexer: Lexer<'a>,
    current: Token,
    previous: Token,
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    previous: Token,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            previous: Token::eof(0, 1, 1),
        }
    }

    /// Parse a complete program
    pub fn parse_program(&mut self) -> Result<Program, JsError> {
        let mut body = Vec::new();
        while !self.is_at_end() {
            if self.eat(&TokenKind::Semicolon) {
                continue;
            }
            body.push(self.parse_statement()?);
        }
        Ok(Program { body })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Token plumbing
    // ═══════════════════════════════════════════════════════════════════════════

    fn advance(&mut self) -> Token {
        let next = self.lexer.next_token();
        self.previous = std::mem::replace(&mut self.current, next);
        self.previous.clone()
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.current.kind == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<Token, JsError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_here(format!("expected {}", what)))
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current.kind, TokenKind::Eof)
    }

    fn error_here(&self, message: impl Into<String>) -> JsError {
        JsError::syntax(message, self.current.span.line, self.current.span.column)
    }

    fn span_from(&self, start: Span) -> Span {
        Span::new(
            start.start,
            self.previous.span.end,
            start.line,
            start.column,
        )
    }

    /// Consume an optional statement-terminating semicolon
    fn eat_semicolon(&mut self) {
        self.eat(&TokenKind::Semicolon);
    }

    fn expect_identifier(&mut self, what: &str) -> Result<Identifier, JsError> {
        match self.current.kind.clone() {
            TokenKind::Identifier(name) => {
                let span = self.current.span;
                self.advance();
                Ok(Identifier { name, span })
            }
            _ => Err(self.error_here(format!("expected {}", what))),
        }
    }

    fn checkpoint(&self) -> Checkpoint<'a> {
        Checkpoint {
            lexer: self.lexer.clone(),
            current: self.current.clone(),
            previous: self.previous.clone(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint<'a>) {
        self.lexer = checkpoint.lexer;
        self.current = checkpoint.current;
        self.previous = checkpoint.previous;
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Statements
    // ═══════════════════════════════════════════════════════════════════════════

    fn parse_statement(&mut self) -> Result<Statement, JsError> {
        match &self.current.kind {
            TokenKind::LBrace => Ok(Statement::Block(self.parse_block()?)),
            TokenKind::Var | TokenKind::Let | TokenKind::Const => {
                let decl = self.parse_variable_declaration()?;
                self.eat_semicolon();
                Ok(Statement::VariableDeclaration(decl))
            }
            TokenKind::Function => self.parse_function_declaration(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Do => self.parse_do_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Switch => self.parse_switch(),
            TokenKind::Break => {
                let span = self.advance().span;
                self.eat_semicolon();
                Ok(Statement::Break(BreakStatement { span }))
            }
            TokenKind::Continue => {
                let span = self.advance().span;
                self.eat_semicolon();
                Ok(Statement::Continue(ContinueStatement { span }))
            }
            TokenKind::Return => self.parse_return(),
            TokenKind::Throw => self.parse_throw(),
            TokenKind::Try => self.parse_try(),
            _ => {
                let start = self.current.span;
                let expression = self.parse_expression()?;
                self.eat_semicolon();
                Ok(Statement::Expression(ExpressionStatement {
                    expression,
                    span: start,
                }))
            }
        }
    }

    fn parse_block(&mut self) -> Result<BlockStatement, JsError> {
        let start = self.current.span;
        self.expect(&TokenKind::LBrace, "'{'")?;
        let mut body = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            if self.eat(&TokenKind::Semicolon) {
                continue;
            }
            body.push(self.parse_statement()?);
        }
        self.expect(&TokenKind::RBrace, "'}'")?;
        Ok(BlockStatement {
            body,
            span: self.span_from(start),
        })
    }

    fn parse_variable_declaration(&mut self) -> Result<VariableDeclaration, JsError> {
        let start = self.current.span;
        let kind = match self.advance().kind {
            TokenKind::Var => VarKind::Var,
            TokenKind::Let => VarKind::Let,
            _ => VarKind::Const,
        };

        let mut declarations = Vec::new();
        loop {
            let id = self.expect_identifier("variable name")?;
            let init = if self.eat(&TokenKind::Assign) {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            declarations.push(VariableDeclarator { id, init });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }

        Ok(VariableDeclaration {
            kind,
            declarations,
            span: self.span_from(start),
        })
    }

    fn parse_function_declaration(&mut self) -> Result<Statement, JsError> {
        let start = self.current.span;
        self.advance(); // 'function'
        let id = self.expect_identifier("function name")?;
        let params = self.parse_params()?;
        let body = self.parse_block()?;
        Ok(Statement::FunctionDeclaration(Rc::new(
            FunctionDeclaration {
                id,
                params,
                body,
                span: self.span_from(start),
            },
        )))
    }

    fn parse_params(&mut self) -> Result<Vec<Identifier>, JsError> {
        self.expect(&TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) {
            params.push(self.expect_identifier("parameter name")?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen, "')'")?;
        Ok(params)
    }

    fn parse_if(&mut self) -> Result<Statement, JsError> {
        let start = self.current.span;
        self.advance(); // 'if'
        self.expect(&TokenKind::LParen, "'('")?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RParen, "')'")?;
        let consequent = self.parse_statement()?;
        let alternate = if self.eat(&TokenKind::Else) {
            Some(self.parse_statement()?)
        } else {
            None
        };
        Ok(Statement::If(Box::new(IfStatement {
            test,
            consequent,
            alternate,
            span: self.span_from(start),
        })))
    }

    fn parse_while(&mut self) -> Result<Statement, JsError> {
        let start = self.current.span;
        self.advance(); // 'while'
        self.expect(&TokenKind::LParen, "'('")?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RParen, "')'")?;
        let body = self.parse_statement()?;
        Ok(Statement::While(Box::new(WhileStatement {
            test,
            body,
            span: self.span_from(start),
        })))
    }

    fn parse_do_while(&mut self) -> Result<Statement, JsError> {
        let start = self.current.span;
        self.advance(); // 'do'
        let body = self.parse_statement()?;
        self.expect(&TokenKind::While, "'while'")?;
        self.expect(&TokenKind::LParen, "'('")?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RParen, "')'")?;
        self.eat_semicolon();
        Ok(Statement::DoWhile(Box::new(DoWhileStatement {
            body,
            test,
            span: self.span_from(start),
        })))
    }

    fn parse_for(&mut self) -> Result<Statement, JsError> {
        let start = self.current.span;
        self.advance(); // 'for'
        self.expect(&TokenKind::LParen, "'('")?;

        // The `for (x in o)` and `for (init; ...)` heads are only told apart
        // after the first identifier; probe with a checkpoint.
        let checkpoint = self.checkpoint();
        if let Some(for_in) = self.try_parse_for_in_head()? {
            let (left, right) = for_in;
            self.expect(&TokenKind::RParen, "')'")?;
            let body = self.parse_statement()?;
            return Ok(Statement::ForIn(Box::new(ForInStatement {
                left,
                right,
                body,
                span: self.span_from(start),
            })));
        }
        self.restore(checkpoint);

        let init = if self.check(&TokenKind::Semicolon) {
            None
        } else if matches!(
            self.current.kind,
            TokenKind::Var | TokenKind::Let | TokenKind::Const
        ) {
            Some(ForInit::Declaration(self.parse_variable_declaration()?))
        } else {
            Some(ForInit::Expression(self.parse_expression()?))
        };
        self.expect(&TokenKind::Semicolon, "';'")?;

        let test = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::Semicolon, "';'")?;

        let update = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::RParen, "')'")?;

        let body = self.parse_statement()?;
        Ok(Statement::For(Box::new(ForStatement {
            init,
            test,
            update,
            body,
            span: self.span_from(start),
        })))
    }

    /// Probe for a `[var] ident in expr` head. Returns None (caller restores
    /// the checkpoint) when this is a classic for head.
    fn try_parse_for_in_head(
        &mut self,
    ) -> Result<Option<(ForInTarget, Expression)>, JsError> {
        let declared = matches!(
            self.current.kind,
            TokenKind::Var | TokenKind::Let | TokenKind::Const
        );
        if declared {
            self.advance();
        }

        let id = match self.current.kind.clone() {
            TokenKind::Identifier(name) => {
                let span = self.current.span;
                self.advance();
                Identifier { name, span }
            }
            _ => return Ok(None),
        };

        if !self.eat(&TokenKind::In) {
            return Ok(None);
        }

        let right = self.parse_expression()?;
        let left = if declared {
            ForInTarget::Declaration(id)
        } else {
            ForInTarget::Identifier(id)
        };
        Ok(Some((left, right)))
    }

    fn parse_switch(&mut self) -> Result<Statement, JsError> {
        let start = self.current.span;
        self.advance(); // 'switch'
        self.expect(&TokenKind::LParen, "'('")?;
        let discriminant = self.parse_expression()?;
        self.expect(&TokenKind::RParen, "')'")?;
        self.expect(&TokenKind::LBrace, "'{'")?;

        let mut cases = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            let case_start = self.current.span;
            let test = if self.eat(&TokenKind::Case) {
                Some(self.parse_expression()?)
            } else if self.eat(&TokenKind::Default) {
                None
            } else {
                return Err(self.error_here("expected 'case' or 'default'"));
            };
            self.expect(&TokenKind::Colon, "':'")?;

            let mut consequent = Vec::new();
            while !matches!(
                self.current.kind,
                TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof
            ) {
                if self.eat(&TokenKind::Semicolon) {
                    continue;
                }
                consequent.push(self.parse_statement()?);
            }

            cases.push(SwitchCase {
                test,
                consequent,
                span: self.span_from(case_start),
            });
        }
        self.expect(&TokenKind::RBrace, "'}'")?;

        Ok(Statement::Switch(Box::new(SwitchStatement {
            discriminant,
            cases,
            span: self.span_from(start),
        })))
    }

    fn parse_return(&mut self) -> Result<Statement, JsError> {
        let span = self.advance().span; // 'return'
        let argument = if self.check(&TokenKind::Semicolon)
            || self.check(&TokenKind::RBrace)
            || self.is_at_end()
        {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.eat_semicolon();
        Ok(Statement::Return(ReturnStatement { argument, span }))
    }

    fn parse_throw(&mut self) -> Result<Statement, JsError> {
        let span = self.advance().span; // 'throw'
        let argument = self.parse_expression()?;
        self.eat_semicolon();
        Ok(Statement::Throw(ThrowStatement { argument, span }))
    }

    fn parse_try(&mut self) -> Result<Statement, JsError> {
        let start = self.current.span;
        self.advance(); // 'try'
        let block = self.parse_block()?;

        let handler = if self.eat(&TokenKind::Catch) {
            let param = if self.eat(&TokenKind::LParen) {
                let id = self.expect_identifier("catch parameter")?;
                self.expect(&TokenKind::RParen, "')'")?;
                Some(id)
            } else {
                None
            };
            let body = self.parse_block()?;
            Some(CatchClause { param, body })
        } else {
            None
        };

        let finalizer = if self.eat(&TokenKind::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(self.error_here("expected 'catch' or 'finally' after try block"));
        }

        Ok(Statement::Try(Box::new(TryStatement {
            block,
            handler,
            finalizer,
            span: self.span_from(start),
        })))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Expressions
    // ═══════════════════════════════════════════════════════════════════════════

    /// Full expression including the comma operator
    pub fn parse_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        let first = self.parse_assignment()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut expressions = vec![first];
        while self.eat(&TokenKind::Comma) {
            expressions.push(self.parse_assignment()?);
        }
        Ok(Expression::Sequence(Box::new(SequenceExpression {
            expressions,
            span: self.span_from(start),
        })))
    }

    fn parse_assignment(&mut self) -> Result<Expression, JsError> {
        let target = self.parse_conditional()?;

        let op = match self.current.kind {
            TokenKind::Assign => AssignmentOp::Assign,
            TokenKind::PlusAssign => AssignmentOp::Add,
            TokenKind::MinusAssign => AssignmentOp::Sub,
            TokenKind::StarAssign => AssignmentOp::Mul,
            TokenKind::SlashAssign => AssignmentOp::Div,
            TokenKind::PercentAssign => AssignmentOp::Mod,
            TokenKind::ShlAssign => AssignmentOp::Shl,
            TokenKind::ShrAssign => AssignmentOp::Shr,
            TokenKind::UShrAssign => AssignmentOp::UShr,
            TokenKind::AmpAssign => AssignmentOp::BitAnd,
            TokenKind::PipeAssign => AssignmentOp::BitOr,
            TokenKind::CaretAssign => AssignmentOp::BitXor,
            _ => return Ok(target),
        };
        self.advance();
        let value = self.parse_assignment()?;
        let span = self.span_from(target.span());
        Ok(Expression::Assignment(Box::new(AssignmentExpression {
            op,
            target,
            value,
            span,
        })))
    }

    fn parse_conditional(&mut self) -> Result<Expression, JsError> {
        let test = self.parse_binary(0)?;
        if !self.eat(&TokenKind::Question) {
            return Ok(test);
        }
        let consequent = self.parse_assignment()?;
        self.expect(&TokenKind::Colon, "':'")?;
        let alternate = self.parse_assignment()?;
        let span = self.span_from(test.span());
        Ok(Expression::Conditional(Box::new(ConditionalExpression {
            test,
            consequent,
            alternate,
            span,
        })))
    }

    /// Binary operator precedence, lowest first
    fn binary_precedence(kind: &TokenKind) -> Option<u8> {
        Some(match kind {
            TokenKind::PipePipe => 1,
            TokenKind::AmpAmp => 2,
            TokenKind::Pipe => 3,
            TokenKind::Caret => 4,
            TokenKind::Amp => 5,
            TokenKind::EqEq | TokenKind::EqEqEq | TokenKind::NotEq | TokenKind::NotEqEq => 6,
            TokenKind::Lt | TokenKind::LtEq | TokenKind::Gt | TokenKind::GtEq => 7,
            TokenKind::Shl | TokenKind::Shr | TokenKind::UShr => 8,
            TokenKind::Plus | TokenKind::Minus => 9,
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => 10,
            _ => return None,
        })
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expression, JsError> {
        let mut left = self.parse_unary()?;

        while let Some(precedence) = Self::binary_precedence(&self.current.kind) {
            if precedence < min_precedence {
                break;
            }
            let op_token = self.advance().kind;
            let right = self.parse_binary(precedence + 1)?;
            let span = self.span_from(left.span());

            left = match op_token {
                TokenKind::PipePipe => Expression::Logical(Box::new(LogicalExpression {
                    op: LogicalOp::Or,
                    left,
                    right,
                    span,
                })),
                TokenKind::AmpAmp => Expression::Logical(Box::new(LogicalExpression {
                    op: LogicalOp::And,
                    left,
                    right,
                    span,
                })),
                other => {
                    let op = match other {
                        TokenKind::Pipe => BinaryOp::BitOr,
                        TokenKind::Caret => BinaryOp::BitXor,
                        TokenKind::Amp => BinaryOp::BitAnd,
                        TokenKind::EqEq | TokenKind::EqEqEq => BinaryOp::Eq,
                        TokenKind::NotEq | TokenKind::NotEqEq => BinaryOp::NotEq,
                        TokenKind::Lt => BinaryOp::Lt,
                        TokenKind::LtEq => BinaryOp::LtEq,
                        TokenKind::Gt => BinaryOp::Gt,
                        TokenKind::GtEq => BinaryOp::GtEq,
                        TokenKind::Shl => BinaryOp::Shl,
                        TokenKind::Shr => BinaryOp::Shr,
                        TokenKind::UShr => BinaryOp::UShr,
                        TokenKind::Plus => BinaryOp::Add,
                        TokenKind::Minus => BinaryOp::Sub,
                        TokenKind::Star => BinaryOp::Mul,
                        TokenKind::Slash => BinaryOp::Div,
                        TokenKind::Percent => BinaryOp::Mod,
                        _ => unreachable!("precedence table and operator table disagree"),
                    };
                    Expression::Binary(Box::new(BinaryExpression {
                        op,
                        left,
                        right,
                        span,
                    }))
                }
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        let op = match self.current.kind {
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            TokenKind::Typeof => Some(UnaryOp::Typeof),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let argument = self.parse_unary()?;
            return Ok(Expression::Unary(Box::new(UnaryExpression {
                op,
                argument,
                span: self.span_from(start),
            })));
        }

        if matches!(
            self.current.kind,
            TokenKind::PlusPlus | TokenKind::MinusMinus
        ) {
            let op = if self.advance().kind == TokenKind::PlusPlus {
                UpdateOp::Increment
            } else {
                UpdateOp::Decrement
            };
            let argument = self.parse_unary()?;
            return Ok(Expression::Update(Box::new(UpdateExpression {
                op,
                prefix: true,
                argument,
                span: self.span_from(start),
            })));
        }

        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expression, JsError> {
        let expr = self.parse_call_member()?;
        if matches!(
            self.current.kind,
            TokenKind::PlusPlus | TokenKind::MinusMinus
        ) {
            let op = if self.advance().kind == TokenKind::PlusPlus {
                UpdateOp::Increment
            } else {
                UpdateOp::Decrement
            };
            let span = self.span_from(expr.span());
            return Ok(Expression::Update(Box::new(UpdateExpression {
                op,
                prefix: false,
                argument: expr,
                span,
            })));
        }
        Ok(expr)
    }

    fn parse_call_member(&mut self) -> Result<Expression, JsError> {
        if self.check(&TokenKind::New) {
            return self.parse_new();
        }
        let primary = self.parse_primary()?;
        self.parse_call_member_tail(primary)
    }

    /// Member access and call suffixes: `.name`, `[expr]`, `(args)`
    fn parse_call_member_tail(&mut self, mut expr: Expression) -> Result<Expression, JsError> {
        loop {
            if self.eat(&TokenKind::Dot) {
                let property = self.expect_identifier("property name")?;
                let span = self.span_from(expr.span());
                expr = Expression::Member(Box::new(MemberExpression {
                    object: expr,
                    property: MemberKey::Named(property),
                    span,
                }));
            } else if self.eat(&TokenKind::LBracket) {
                let key = self.parse_expression()?;
                self.expect(&TokenKind::RBracket, "']'")?;
                let span = self.span_from(expr.span());
                expr = Expression::Member(Box::new(MemberExpression {
                    object: expr,
                    property: MemberKey::Computed(key),
                    span,
                }));
            } else if self.check(&TokenKind::LParen) {
                let arguments = self.parse_arguments()?;
                let span = self.span_from(expr.span());
                expr = Expression::Call(Box::new(CallExpression {
                    callee: expr,
                    arguments,
                    span,
                }));
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_new(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        self.advance(); // 'new'

        // The callee is a member chain; the first call parens belong to `new`
        let mut callee = self.parse_primary()?;
        loop {
            if self.eat(&TokenKind::Dot) {
                let property = self.expect_identifier("property name")?;
                let span = self.span_from(callee.span());
                callee = Expression::Member(Box::new(MemberExpression {
                    object: callee,
                    property: MemberKey::Named(property),
                    span,
                }));
            } else if self.eat(&TokenKind::LBracket) {
                let key = self.parse_expression()?;
                self.expect(&TokenKind::RBracket, "']'")?;
                let span = self.span_from(callee.span());
                callee = Expression::Member(Box::new(MemberExpression {
                    object: callee,
                    property: MemberKey::Computed(key),
                    span,
                }));
            } else {
                break;
            }
        }

        let arguments = if self.check(&TokenKind::LParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };

        let new_expr = Expression::New(Box::new(NewExpression {
            callee,
            arguments,
            span: self.span_from(start),
        }));

        // `new C().m()`: the construct result can be further accessed
        self.parse_call_member_tail(new_expr)
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expression>, JsError> {
        self.expect(&TokenKind::LParen, "'('")?;
        let mut arguments = Vec::new();
        while !self.check(&TokenKind::RParen) {
            arguments.push(self.parse_assignment()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen, "')'")?;
        Ok(arguments)
    }

    fn parse_primary(&mut self) -> Result<Expression, JsError> {
        let span = self.current.span;
        match self.current.kind.clone() {
            TokenKind::Number(value) => {
                self.advance();
                Ok(Expression::Number(NumberLiteral { value, span }))
            }
            TokenKind::String(value) => {
                self.advance();
                Ok(Expression::String(StringLiteral { value, span }))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expression::Boolean(BooleanLiteral { value: true, span }))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expression::Boolean(BooleanLiteral { value: false, span }))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expression::Null(span))
            }
            TokenKind::This => {
                self.advance();
                Ok(Expression::This(span))
            }
            TokenKind::Template(template) => {
                self.advance();
                self.build_template(template, span)
            }
            TokenKind::RegExp(pattern, flags) => {
                self.advance();
                Ok(Expression::RegExp(RegExpLiteral {
                    pattern: Rc::from(pattern.as_str()),
                    flags: Rc::from(flags.as_str()),
                    span,
                }))
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Expression::Identifier(Identifier { name, span }))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::RParen, "')'")?;
                Ok(expr)
            }
            TokenKind::LBracket => self.parse_array(),
            TokenKind::LBrace => self.parse_object(),
            TokenKind::Function => self.parse_function_expression(),
            other => Err(self.error_here(format!("unexpected token {:?}", other))),
        }
    }

    fn parse_array(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        self.advance(); // '['
        let mut elements = Vec::new();
        while !self.check(&TokenKind::RBracket) {
            elements.push(self.parse_assignment()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBracket, "']'")?;
        Ok(Expression::Array(ArrayExpression {
            elements,
            span: self.span_from(start),
        }))
    }

    fn parse_object(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        self.advance(); // '{'
        let mut properties = Vec::new();

        while !self.check(&TokenKind::RBrace) {
            let key = match self.current.kind.clone() {
                TokenKind::Identifier(name) => {
                    self.advance();
                    PropertyKey::Identifier(name)
                }
                TokenKind::String(value) => {
                    self.advance();
                    PropertyKey::String(value)
                }
                TokenKind::Number(value) => {
                    self.advance();
                    PropertyKey::Number(value)
                }
                TokenKind::LBracket => {
                    self.advance();
                    let key = self.parse_assignment()?;
                    self.expect(&TokenKind::RBracket, "']'")?;
                    PropertyKey::Computed(key)
                }
                _ => return Err(self.error_here("expected property key")),
            };

            let value = if self.eat(&TokenKind::Colon) {
                self.parse_assignment()?
            } else if let PropertyKey::Identifier(name) = &key {
                // Shorthand `{ a }`: the value is the same identifier
                Expression::Identifier(Identifier {
                    name: name.clone(),
                    span: self.previous.span,
                })
            } else {
                return Err(self.error_here("expected ':' after property key"));
            };

            properties.push(ObjectProperty { key, value });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace, "'}'")?;

        Ok(Expression::Object(ObjectExpression {
            properties,
            span: self.span_from(start),
        }))
    }

    fn parse_function_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        self.advance(); // 'function'
        let id = if matches!(self.current.kind, TokenKind::Identifier(_)) {
            Some(self.expect_identifier("function name")?)
        } else {
            None
        };
        let params = self.parse_params()?;
        let body = self.parse_block()?;
        Ok(Expression::Function(Rc::new(FunctionExpression {
            id,
            params,
            body,
            span: self.span_from(start),
        })))
    }

    fn build_template(
        &mut self,
        template: TemplateToken,
        span: Span,
    ) -> Result<Expression, JsError> {
        let quasis = template
            .quasis
            .iter()
            .map(|q| Rc::from(q.as_str()))
            .collect();

        let mut expressions = Vec::new();
        for source in &template.exprs {
            let mut sub = Parser::new(source);
            let expr = sub.parse_expression()?;
            if !sub.is_at_end() {
                return Err(JsError::syntax(
                    "unexpected trailing tokens in template expression",
                    span.line,
                    span.column,
                ));
            }
            expressions.push(expr);
        }

        Ok(Expression::Template(Box::new(TemplateLiteral {
            quasis,
            expressions,
            span,
        })))
    }
}
