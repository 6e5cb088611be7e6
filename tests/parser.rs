//! Tests for the parser
//!
//! These tests verify that source text parses to the expected AST shapes
//! and that unsupported constructs are rejected with syntax errors.

use jsbox::ast::*;
use jsbox::parser::Parser;
use jsbox::JsError;

fn parse(source: &str) -> Program {
    Parser::new(source)
        .parse_program()
        .expect("program should parse")
}

fn parse_err(source: &str) -> JsError {
    Parser::new(source)
        .parse_program()
        .expect_err("program should not parse")
}

#[test]
fn test_variable_declarations() {
    let program = parse("var x = 1; let y; const z = 'a';");
    assert_eq!(program.body.len(), 3);
    match &program.body[0] {
        Statement::VariableDeclaration(decl) => {
            assert_eq!(decl.kind, VarKind::Var);
            assert_eq!(decl.declarations.len(), 1);
            assert_eq!(decl.declarations[0].id.name.as_ref(), "x");
            assert!(decl.declarations[0].init.is_some());
        }
        other => panic!("expected variable declaration, got {:?}", other),
    }
    match &program.body[1] {
        Statement::VariableDeclaration(decl) => {
            assert_eq!(decl.kind, VarKind::Let);
            assert!(decl.declarations[0].init.is_none());
        }
        other => panic!("expected variable declaration, got {:?}", other),
    }
}

#[test]
fn test_function_declaration() {
    let program = parse("function add(a, b) { return a + b; }");
    match &program.body[0] {
        Statement::FunctionDeclaration(decl) => {
            assert_eq!(decl.id.name.as_ref(), "add");
            assert_eq!(decl.params.len(), 2);
            assert_eq!(decl.body.body.len(), 1);
        }
        other => panic!("expected function declaration, got {:?}", other),
    }
}

#[test]
fn test_operator_precedence() {
    let program = parse("1 + 2 * 3");
    match &program.body[0] {
        Statement::Expression(stmt) => match &stmt.expression {
            Expression::Binary(add) => {
                assert_eq!(add.op, BinaryOp::Add);
                assert!(matches!(&add.right, Expression::Binary(mul) if mul.op == BinaryOp::Mul));
            }
            other => panic!("expected binary expression, got {:?}", other),
        },
        other => panic!("expected expression statement, got {:?}", other),
    }
}

#[test]
fn test_logical_operators_are_distinct_nodes() {
    let program = parse("a && b || c");
    match &program.body[0] {
        Statement::Expression(stmt) => match &stmt.expression {
            Expression::Logical(or) => {
                assert_eq!(or.op, LogicalOp::Or);
                assert!(matches!(&or.left, Expression::Logical(and) if and.op == LogicalOp::And));
            }
            other => panic!("expected logical expression, got {:?}", other),
        },
        other => panic!("expected expression statement, got {:?}", other),
    }
}

#[test]
fn test_member_and_call_chains() {
    let program = parse("a.b[c](1, 2)");
    match &program.body[0] {
        Statement::Expression(stmt) => match &stmt.expression {
            Expression::Call(call) => {
                assert_eq!(call.arguments.len(), 2);
                assert!(matches!(&call.callee, Expression::Member(_)));
            }
            other => panic!("expected call expression, got {:?}", other),
        },
        other => panic!("expected expression statement, got {:?}", other),
    }
}

#[test]
fn test_new_expression() {
    let program = parse("new Point(1, 2)");
    match &program.body[0] {
        Statement::Expression(stmt) => match &stmt.expression {
            Expression::New(new) => {
                assert_eq!(new.arguments.len(), 2);
                assert!(matches!(&new.callee, Expression::Identifier(id) if id.name.as_ref() == "Point"));
            }
            other => panic!("expected new expression, got {:?}", other),
        },
        other => panic!("expected expression statement, got {:?}", other),
    }
}

#[test]
fn test_for_variants() {
    let program = parse("for (var i = 0; i < 3; i++) {} for (k in obj) {} for (;;) {}");
    assert!(matches!(&program.body[0], Statement::For(f) if f.init.is_some() && f.test.is_some()));
    assert!(matches!(
        &program.body[1],
        Statement::ForIn(f) if matches!(&f.left, ForInTarget::Identifier(id) if id.name.as_ref() == "k")
    ));
    assert!(matches!(
        &program.body[2],
        Statement::For(f) if f.init.is_none() && f.test.is_none() && f.update.is_none()
    ));
}

#[test]
fn test_for_in_with_declaration() {
    let program = parse("for (var k in obj) {}");
    assert!(matches!(
        &program.body[0],
        Statement::ForIn(f) if matches!(&f.left, ForInTarget::Declaration(id) if id.name.as_ref() == "k")
    ));
}

#[test]
fn test_switch_cases() {
    let program = parse("switch (x) { case 1: a(); break; default: b(); }");
    match &program.body[0] {
        Statement::Switch(switch) => {
            assert_eq!(switch.cases.len(), 2);
            assert!(switch.cases[0].test.is_some());
            assert!(switch.cases[1].test.is_none());
            assert_eq!(switch.cases[0].consequent.len(), 2);
        }
        other => panic!("expected switch statement, got {:?}", other),
    }
}

#[test]
fn test_try_catch_finally() {
    let program = parse("try { a(); } catch (e) { b(); } finally { c(); }");
    match &program.body[0] {
        Statement::Try(try_stmt) => {
            assert!(try_stmt.handler.is_some());
            assert!(try_stmt.finalizer.is_some());
        }
        other => panic!("expected try statement, got {:?}", other),
    }
}

#[test]
fn test_object_literal_key_forms() {
    let program = parse("var o = { a: 1, 'b c': 2, 3: 4, [k]: 5, shorthand };");
    match &program.body[0] {
        Statement::VariableDeclaration(decl) => {
            match decl.declarations[0].init.as_ref().expect("initializer") {
                Expression::Object(obj) => {
                    assert_eq!(obj.properties.len(), 5);
                    assert!(matches!(&obj.properties[0].key, PropertyKey::Identifier(_)));
                    assert!(matches!(&obj.properties[1].key, PropertyKey::String(_)));
                    assert!(matches!(&obj.properties[2].key, PropertyKey::Number(_)));
                    assert!(matches!(&obj.properties[3].key, PropertyKey::Computed(_)));
                    // Shorthand expands to an identifier value of the same name
                    assert!(matches!(
                        &obj.properties[4].value,
                        Expression::Identifier(id) if id.name.as_ref() == "shorthand"
                    ));
                }
                other => panic!("expected object literal, got {:?}", other),
            }
        }
        other => panic!("expected variable declaration, got {:?}", other),
    }
}

#[test]
fn test_template_literal_expressions() {
    let program = parse("`x is ${x + 1}!`");
    match &program.body[0] {
        Statement::Expression(stmt) => match &stmt.expression {
            Expression::Template(template) => {
                assert_eq!(template.quasis.len(), 2);
                assert_eq!(template.expressions.len(), 1);
                assert!(matches!(&template.expressions[0], Expression::Binary(_)));
            }
            other => panic!("expected template literal, got {:?}", other),
        },
        other => panic!("expected expression statement, got {:?}", other),
    }
}

#[test]
fn test_conditional_and_sequence() {
    let program = parse("(a ? b : c, d)");
    match &program.body[0] {
        Statement::Expression(stmt) => match &stmt.expression {
            Expression::Sequence(seq) => {
                assert_eq!(seq.expressions.len(), 2);
                assert!(matches!(&seq.expressions[0], Expression::Conditional(_)));
            }
            other => panic!("expected sequence expression, got {:?}", other),
        },
        other => panic!("expected expression statement, got {:?}", other),
    }
}

#[test]
fn test_update_expressions() {
    let program = parse("x++; --y;");
    assert!(matches!(
        &program.body[0],
        Statement::Expression(s) if matches!(&s.expression, Expression::Update(u) if !u.prefix)
    ));
    assert!(matches!(
        &program.body[1],
        Statement::Expression(s) if matches!(&s.expression, Expression::Update(u) if u.prefix)
    ));
}

#[test]
fn test_syntax_errors() {
    assert!(matches!(parse_err("var = 1;"), JsError::Syntax { .. }));
    assert!(matches!(parse_err("function () {}"), JsError::Syntax { .. }));
    assert!(matches!(parse_err("if (x"), JsError::Syntax { .. }));
    assert!(matches!(parse_err("try { }"), JsError::Syntax { .. }));
    assert!(matches!(parse_err("switch (x) { foo }"), JsError::Syntax { .. }));
}

#[test]
fn test_syntax_error_carries_position() {
    match parse_err("var x = \n  @") {
        JsError::Syntax { line, .. } => assert_eq!(line, 2),
        other => panic!("expected syntax error, got {:?}", other),
    }
}
