//! Tests for the lexer
//!
//! These tests verify that the lexer correctly tokenizes script source.

use jsbox::lexer::{Lexer, TokenKind};

fn lex(source: &str) -> Vec<TokenKind> {
    let mut lexer = Lexer::new(source);
    let mut tokens = vec![];
    loop {
        let token = lexer.next_token();
        if token.kind == TokenKind::Eof {
            break;
        }
        tokens.push(token.kind);
    }
    tokens
}

#[test]
fn test_numbers() {
    assert_eq!(lex("42"), vec![TokenKind::Number(42.0)]);
    assert_eq!(lex("3.14"), vec![TokenKind::Number(3.14)]);
    assert_eq!(lex("1e10"), vec![TokenKind::Number(1e10)]);
    assert_eq!(lex("2.5e-3"), vec![TokenKind::Number(2.5e-3)]);
    assert_eq!(lex("0xff"), vec![TokenKind::Number(255.0)]);
    assert_eq!(lex("0b1010"), vec![TokenKind::Number(10.0)]);
    assert_eq!(lex("0o17"), vec![TokenKind::Number(15.0)]);
    assert_eq!(lex(".5"), vec![TokenKind::Number(0.5)]);
}

#[test]
fn test_strings() {
    assert_eq!(lex("'hello'"), vec![TokenKind::String("hello".into())]);
    assert_eq!(lex("\"world\""), vec![TokenKind::String("world".into())]);
    assert_eq!(lex("'a\\nb'"), vec![TokenKind::String("a\nb".into())]);
    assert_eq!(lex("'it\\'s'"), vec![TokenKind::String("it's".into())]);
}

#[test]
fn test_keywords() {
    assert_eq!(
        lex("var function return"),
        vec![TokenKind::Var, TokenKind::Function, TokenKind::Return]
    );
    assert_eq!(
        lex("if else while do"),
        vec![TokenKind::If, TokenKind::Else, TokenKind::While, TokenKind::Do]
    );
    assert_eq!(lex("true false null"), vec![
        TokenKind::True,
        TokenKind::False,
        TokenKind::Null
    ]);
}

#[test]
fn test_identifiers() {
    assert_eq!(lex("foo"), vec![TokenKind::Identifier("foo".into())]);
    assert_eq!(lex("_bar"), vec![TokenKind::Identifier("_bar".into())]);
    assert_eq!(lex("$x1"), vec![TokenKind::Identifier("$x1".into())]);
}

#[test]
fn test_operators() {
    assert_eq!(
        lex("a += b"),
        vec![
            TokenKind::Identifier("a".into()),
            TokenKind::PlusAssign,
            TokenKind::Identifier("b".into())
        ]
    );
    assert_eq!(
        lex("== === != !=="),
        vec![
            TokenKind::EqEq,
            TokenKind::EqEqEq,
            TokenKind::NotEq,
            TokenKind::NotEqEq
        ]
    );
    assert_eq!(
        lex("<< >> >>>"),
        vec![TokenKind::Shl, TokenKind::Shr, TokenKind::UShr]
    );
    assert_eq!(
        lex("x++ - --y"),
        vec![
            TokenKind::Identifier("x".into()),
            TokenKind::PlusPlus,
            TokenKind::Minus,
            TokenKind::MinusMinus,
            TokenKind::Identifier("y".into())
        ]
    );
}

#[test]
fn test_comments() {
    assert_eq!(
        lex("1 // comment\n2"),
        vec![TokenKind::Number(1.0), TokenKind::Number(2.0)]
    );
    assert_eq!(
        lex("1 /* inner */ 2"),
        vec![TokenKind::Number(1.0), TokenKind::Number(2.0)]
    );
}

#[test]
fn test_regex_literal_in_expression_position() {
    let tokens = lex("var r = /ab+c/gi");
    assert_eq!(
        tokens,
        vec![
            TokenKind::Var,
            TokenKind::Identifier("r".into()),
            TokenKind::Assign,
            TokenKind::RegExp("ab+c".to_string(), "gi".to_string()),
        ]
    );
}

#[test]
fn test_slash_after_operand_is_division() {
    let tokens = lex("a / b");
    assert_eq!(
        tokens,
        vec![
            TokenKind::Identifier("a".into()),
            TokenKind::Slash,
            TokenKind::Identifier("b".into()),
        ]
    );
}

#[test]
fn test_template_literal() {
    let tokens = lex("`a ${x} b`");
    assert_eq!(tokens.len(), 1);
    match &tokens[0] {
        TokenKind::Template(template) => {
            assert_eq!(template.quasis, vec!["a ".to_string(), " b".to_string()]);
            assert_eq!(template.exprs, vec!["x".to_string()]);
        }
        other => panic!("expected template token, got {:?}", other),
    }
}

#[test]
fn test_template_nested_braces() {
    let tokens = lex("`v: ${obj[key]} end`");
    match &tokens[0] {
        TokenKind::Template(template) => {
            assert_eq!(template.exprs, vec!["obj[key]".to_string()]);
        }
        other => panic!("expected template token, got {:?}", other),
    }
}

#[test]
fn test_spans_track_lines() {
    let mut lexer = Lexer::new("a\n  b");
    let a = lexer.next_token();
    let b = lexer.next_token();
    assert_eq!(a.span.line, 1);
    assert_eq!(b.span.line, 2);
    assert_eq!(b.span.column, 3);
}
