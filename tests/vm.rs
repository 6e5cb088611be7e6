//! End-to-end execution tests
//!
//! Source goes through the full pipeline (parse, compile, execute) and the
//! final value is checked against the language semantics.

use jsbox::{Bindings, ExecuteOptions, JsError, Value, Vm};

fn run(source: &str) -> Value {
    Vm::new().run(source, None).expect("program should run")
}

fn run_err(source: &str) -> JsError {
    Vm::new().run(source, None).expect_err("program should fail")
}

fn number(source: &str) -> f64 {
    run(source).as_number().expect("expected a number result")
}

fn string(source: &str) -> String {
    run(source).as_str().expect("expected a string result").to_string()
}

fn numbers(value: &Value) -> Vec<f64> {
    value
        .as_array()
        .expect("expected an array result")
        .borrow()
        .iter()
        .map(|v| v.as_number().expect("expected number element"))
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Arithmetic and operators
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_arithmetic() {
    assert_eq!(number("2 + 3 * 4"), 14.0);
    assert_eq!(number("(2 + 3) * 4"), 20.0);
    assert_eq!(number("10 % 3"), 1.0);
    assert_eq!(number("-5 + 2"), -3.0);
    assert_eq!(number("2 * 3 - 4 / 2"), 4.0);
}

#[test]
fn test_division_by_zero_follows_float_rules() {
    assert_eq!(number("1 / 0"), f64::INFINITY);
    assert_eq!(number("-1 / 0"), f64::NEG_INFINITY);
    assert!(number("0 / 0").is_nan());
}

#[test]
fn test_string_concatenation() {
    assert_eq!(string("'a' + 'b'"), "ab");
    assert_eq!(string("'n = ' + 5"), "n = 5");
    assert_eq!(string("1 + '2'"), "12");
}

#[test]
fn test_bitwise_operators() {
    assert_eq!(number("5 & 3"), 1.0);
    assert_eq!(number("5 | 3"), 7.0);
    assert_eq!(number("5 ^ 3"), 6.0);
    assert_eq!(number("~5"), -6.0);
    assert_eq!(number("1 << 4"), 16.0);
    assert_eq!(number("-8 >> 1"), -4.0);
    assert_eq!(number("-1 >>> 28"), 15.0);
    // Operands coerce through 32-bit integers
    assert_eq!(number("5.9 | 0"), 5.0);
}

#[test]
fn test_comparison_and_equality() {
    assert_eq!(run("1 < 2").as_bool(), Some(true));
    assert_eq!(run("2 <= 1").as_bool(), Some(false));
    assert_eq!(run("'a' < 'b'").as_bool(), Some(true));
    assert_eq!(run("1 === 1").as_bool(), Some(true));
    // Equality is strict: tag plus value
    assert_eq!(run("1 == '1'").as_bool(), Some(false));
    assert_eq!(run("null == null").as_bool(), Some(true));
    assert_eq!(run("NaN === NaN").as_bool(), Some(false));
}

#[test]
fn test_logical_short_circuit() {
    assert_eq!(number("1 && 2"), 2.0);
    assert_eq!(number("0 || 3"), 3.0);
    assert_eq!(number("0 && f()"), 0.0, "rhs must not evaluate");
    assert_eq!(number("1 || f()"), 1.0, "rhs must not evaluate");
    assert_eq!(run("!0").as_bool(), Some(true));
}

#[test]
fn test_typeof() {
    assert_eq!(string("typeof 1"), "number");
    assert_eq!(string("typeof 'x'"), "string");
    assert_eq!(string("typeof true"), "boolean");
    assert_eq!(string("typeof undefined"), "undefined");
    assert_eq!(string("typeof null"), "object");
    assert_eq!(string("typeof {}"), "object");
    assert_eq!(string("typeof function () {}"), "function");
}

#[test]
fn test_conditional_and_sequence() {
    assert_eq!(number("1 ? 2 : 3"), 2.0);
    assert_eq!(number("0 ? 2 : 3"), 3.0);
    assert_eq!(number("(1, 2, 3)"), 3.0);
}

// ═══════════════════════════════════════════════════════════════════════════════
// Variables, functions, control flow
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_variables_and_functions() {
    assert_eq!(number("var x=5; function f(n){ return n*n; } f(x)+x"), 30.0);
}

#[test]
fn test_default_and_missing_arguments() {
    assert_eq!(
        run("function f(a, b) { return b; } f(1)").is_undefined(),
        true
    );
}

#[test]
fn test_argument_count_overflow_is_a_runtime_error() {
    assert!(run_err("function f(a) { return a; } f(1, 2)").is_runtime());
}

#[test]
fn test_if_else_chains() {
    let source = "function grade(n) {
        if (n >= 90) { return 'A'; }
        else if (n >= 80) { return 'B'; }
        else { return 'C'; }
    }
    grade(85)";
    assert_eq!(string(source), "B");
}

#[test]
fn test_while_and_do_while() {
    assert_eq!(number("var i = 0; while (i < 5) { i++; } i"), 5.0);
    assert_eq!(number("var i = 10; do { i++; } while (i < 5); i"), 11.0);
}

#[test]
fn test_for_loop_with_break_continue() {
    let source = "var sum = 0;
    for (var i = 0; i < 10; i++) {
        if (i === 3) { continue; }
        if (i === 7) { break; }
        sum += i;
    }
    sum";
    // 0+1+2+4+5+6
    assert_eq!(number(source), 18.0);
}

#[test]
fn test_for_in_over_object_and_array() {
    let source = "var o = { a: 1, b: 2, c: 3 };
    var keys = '';
    for (var k in o) { keys += k; }
    keys";
    assert_eq!(string(source), "abc");

    let source = "var a = [10, 20, 30];
    var total = 0;
    for (var i in a) { total += a[i]; }
    total";
    assert_eq!(number(source), 60.0);
}

#[test]
fn test_switch_fallthrough_and_default() {
    let source = "function pick(n) {
        var out = '';
        switch (n) {
            case 1: out += 'one ';
            case 2: out += 'two'; break;
            default: out += 'other';
        }
        return out;
    }
    pick(1) + '/' + pick(2) + '/' + pick(9)";
    assert_eq!(string(source), "one two/two/other");
}

#[test]
fn test_break_in_switch_inside_loop_leaves_only_the_switch() {
    let source = "var log = '';
    for (var i = 0; i < 3; i++) {
        switch (i) {
            case 1: break;
            default: log += i;
        }
        log += '.';
    }
    log";
    assert_eq!(string(source), "0..2.");
}

#[test]
fn test_recursion() {
    assert_eq!(
        number("function fact(n) { if (n < 2) { return 1; } return n * fact(n - 1); } fact(5)"),
        120.0
    );
    let source = "function fib(n) { if (n < 2) { return n; } return fib(n-1) + fib(n-2); }
    var out = [];
    for (var i = 0; i < 10; i++) { out.push(fib(i)); }
    out";
    assert_eq!(
        numbers(&run(source)),
        vec![0.0, 1.0, 1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0, 34.0]
    );
}

#[test]
fn test_sibling_function_calls() {
    // A function declared after its sibling can call it
    let source = "function outer() {
        function a() { return b() + 1; }
        function b() { return 10; }
        return a();
    }
    outer()";
    assert_eq!(number(source), 11.0);
}

// ═══════════════════════════════════════════════════════════════════════════════
// Closures
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_closure_isolation() {
    let source = "function mk(i){ var c=i; return function(){ c++; return c; }; }
    var a=mk(10); var b=mk(100);
    [a(),a(),b(),a(),b()]";
    assert_eq!(numbers(&run(source)), vec![11.0, 12.0, 101.0, 13.0, 102.0]);
}

#[test]
fn test_returned_closures_have_disjoint_state() {
    let source = "function mk(){ var c = 0; return function(){ c++; return c; }; }
    [mk(), mk()]";
    let result = run(source);
    let array = result.as_array().expect("array of closures").borrow();
    let (a, b) = match (&array[0], &array[1]) {
        (Value::Function(a), Value::Function(b)) => (a.clone(), b.clone()),
        other => panic!("expected two functions, got {:?}", other),
    };
    assert_ne!(a.closure_id.get(), b.closure_id.get());
    assert_ne!(a.closure_id.get(), 0);
    assert!(!std::rc::Rc::ptr_eq(&a, &b));
    // Disjoint maps: mutating one must not show in the other
    a.closure.borrow_mut().insert("c".to_string(), Value::from(99.0));
    assert_ne!(
        b.closure.borrow().get("c").cloned(),
        Some(Value::from(99.0))
    );
}

#[test]
fn test_capture_on_return_copies_loop_variable_value() {
    // The captured value is the one at the moment of return (shallow copy),
    // not a live reference to the loop variable
    let source = "function mk(n) {
        var i = 0;
        while (i < n) { i++; }
        return function () { return i; };
    }
    mk(4)()";
    assert_eq!(number(source), 4.0);
}

#[test]
fn test_captured_arrays_are_shallow_copied_per_closure() {
    let source = "function mk() {
        var items = [1];
        return function (x) { items.push(x); return items.length; };
    }
    var a = mk(); var b = mk();
    [a(2), a(3), b(2)]";
    assert_eq!(numbers(&run(source)), vec![2.0, 3.0, 2.0]);
}

// ═══════════════════════════════════════════════════════════════════════════════
// Objects, arrays, properties
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_object_literals_and_member_access() {
    assert_eq!(number("var o = { a: 1, b: { c: 2 } }; o.a + o.b.c"), 3.0);
    assert_eq!(number("var o = { x: 1 }; o['x']"), 1.0);
    assert_eq!(number("var k = 'y'; var o = { y: 7 }; o[k]"), 7.0);
    assert_eq!(number("var o = {}; o.n = 5; o.n"), 5.0);
}

#[test]
fn test_array_literals_and_elements() {
    assert_eq!(number("[1, 2, 3][1]"), 2.0);
    assert_eq!(number("var a = [1, 2, 3]; a.length"), 3.0);
    assert_eq!(run("[1, 2][5]").is_undefined(), true);
    assert_eq!(number("var a = [1]; a[0] = 9; a[0]"), 9.0);
}

#[test]
fn test_out_of_range_element_write_grows_the_array() {
    assert_eq!(number("var a = [1]; a[3] = 9; a.length"), 4.0);
    assert_eq!(run("var a = [1]; a[3] = 9; a[2]").is_undefined(), true);
}

#[test]
fn test_compound_assignment_to_array_element() {
    assert_eq!(number("var a=[5]; a[0] |= 3; a[0]"), 7.0);
    assert_eq!(number("var a=[5]; a[0] += 2; a[0]"), 7.0);
}

#[test]
fn test_chained_assignment() {
    assert_eq!(number("var a; var b; a = b = 5; a + b"), 10.0);
    assert_eq!(number("var o = {}; var v = o.x = 3; v"), 3.0);
}

#[test]
fn test_update_expressions() {
    assert_eq!(number("var x = 5; x++"), 5.0);
    assert_eq!(number("var x = 5; x++; x"), 6.0);
    assert_eq!(number("var x = 5; ++x"), 6.0);
    assert_eq!(number("var a = [1]; a[0]++; a[0]"), 2.0);
    assert_eq!(number("var o = { n: 3 }; --o.n; o.n"), 2.0);
}

#[test]
fn test_string_prototype_fallback() {
    assert_eq!(number("'abc'.length"), 3.0);
    assert_eq!(string("'abc'.charAt(1)"), "b");
    assert_eq!(string("'a-b-c'.split('-')[1]"), "b");
    assert_eq!(string("'  x  '.trim()"), "x");
    assert_eq!(string("'abc'.toUpperCase()"), "ABC");
    assert_eq!(number("'hello'.indexOf('ll')"), 2.0);
    assert_eq!(string("'aXa'.replace('X', 'b')"), "aba");
    assert_eq!(string("'abcdef'.slice(1, 3)"), "bc");
    // Extracted methods stay bound to their receiver
    assert_eq!(string("var up = 'abc'.toUpperCase; up()"), "ABC");
}

#[test]
fn test_array_prototype_fallback() {
    assert_eq!(number("var a = [1]; a.push(2, 3)"), 3.0);
    assert_eq!(number("var a = [1, 2]; a.pop()"), 2.0);
    assert_eq!(string("[1, 2, 3].join('-')"), "1-2-3");
    assert_eq!(numbers(&run("[1, 2, 3].slice(1)")), vec![2.0, 3.0]);
    assert_eq!(number("[5, 6, 7].indexOf(6)"), 1.0);
    assert_eq!(numbers(&run("[1].concat([2, 3], 4)")), vec![1.0, 2.0, 3.0, 4.0]);
    assert_eq!(numbers(&run("var a = [1, 2]; a.reverse(); a")), vec![2.0, 1.0]);
    assert_eq!(number("var a = [1, 2]; a.shift(); a[0]"), 2.0);
}

#[test]
fn test_number_and_object_prototype_fallback() {
    assert_eq!(string("(255).toString(16)"), "ff");
    assert_eq!(string("(1.005).toFixed(1)"), "1.0");
    assert_eq!(run("({ a: 1 }).hasOwnProperty('a')").as_bool(), Some(true));
    assert_eq!(run("({ a: 1 }).hasOwnProperty('b')").as_bool(), Some(false));
}

#[test]
fn test_missing_property_is_undefined() {
    assert_eq!(run("({ a: 1 }).b").is_undefined(), true);
}

#[test]
fn test_template_literals() {
    assert_eq!(string("var n = 3; `n is ${n}!`"), "n is 3!");
    assert_eq!(string("`${1 + 1} and ${'two'}`"), "2 and two");
}

#[test]
fn test_regex_literal_builds_object() {
    assert_eq!(string("/ab+c/gi.source"), "ab+c");
    assert_eq!(string("/ab+c/gi.flags"), "gi");
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constructors and `this`
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_new_with_user_constructor() {
    let source = "function Point(x, y) { this.x = x; this.y = y; }
    var p = new Point(3, 4);
    p.x * p.y";
    assert_eq!(number(source), 12.0);
}

#[test]
fn test_constructor_explicit_object_return_wins() {
    let source = "function C() { this.a = 1; return { a: 42 }; }
    new C().a";
    assert_eq!(number(source), 42.0);

    let source = "function C() { this.a = 1; return 7; }
    new C().a";
    assert_eq!(number(source), 1.0, "primitive returns yield the instance");
}

#[test]
fn test_method_call_binds_this() {
    let source = "var counter = {
        n: 0,
        bump: function () { this.n = this.n + 1; return this.n; }
    };
    counter.bump(); counter.bump()";
    assert_eq!(number(source), 2.0);
}

#[test]
fn test_new_builtin_constructors_dispatch_to_host() {
    assert_eq!(number("new Array(3).length"), 3.0);
    assert_eq!(string("new String(12)"), "12");
    assert_eq!(number("new Number('8')"), 8.0);
    assert_eq!(run("new Boolean(0)").as_bool(), Some(false));
    assert_eq!(number("var o = new Object(); o.x = 1; o.x"), 1.0);
}

// ═══════════════════════════════════════════════════════════════════════════════
// Builtins
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_math_builtins() {
    assert_eq!(number("Math.abs(-3)"), 3.0);
    assert_eq!(number("Math.floor(2.9)"), 2.0);
    assert_eq!(number("Math.ceil(2.1)"), 3.0);
    assert_eq!(number("Math.max(1, 5, 3)"), 5.0);
    assert_eq!(number("Math.min(4, 2, 8)"), 2.0);
    assert_eq!(number("Math.pow(2, 10)"), 1024.0);
    assert_eq!(number("Math.sqrt(49)"), 7.0);
    assert!((number("Math.PI") - std::f64::consts::PI).abs() < 1e-12);
    assert!(number("Math.sin(0)") == 0.0);
    let r = number("Math.random()");
    assert!((0.0..1.0).contains(&r));
}

#[test]
fn test_parse_and_classify_builtins() {
    assert_eq!(number("parseInt('42px')"), 42.0);
    assert_eq!(number("parseInt('ff', 16)"), 255.0);
    assert_eq!(number("parseInt('0x10')"), 16.0);
    assert!(number("parseInt('zz')").is_nan());
    assert_eq!(number("parseFloat('2.5rem')"), 2.5);
    assert_eq!(run("isNaN('x')").as_bool(), Some(true));
    assert_eq!(run("isFinite(1 / 0)").as_bool(), Some(false));
    assert_eq!(run("isFinite(3)").as_bool(), Some(true));
}

#[test]
fn test_coercing_constructors() {
    assert_eq!(string("String(12)"), "12");
    assert_eq!(string("String([1, 2])"), "1,2");
    assert_eq!(number("Number('3.5')"), 3.5);
    assert_eq!(run("Boolean('')").as_bool(), Some(false));
    assert_eq!(run("Boolean('x')").as_bool(), Some(true));
    assert_eq!(number("Array(1, 2, 3).length"), 3.0);
    assert_eq!(numbers(&run("Object.keys({ a: 1, b: 2 }).length ? [2] : [0]")), vec![2.0]);
}

#[test]
fn test_global_number_bindings() {
    assert!(number("NaN").is_nan());
    assert_eq!(number("Infinity"), f64::INFINITY);
    assert_eq!(run("undefined").is_undefined(), true);
}

// ═══════════════════════════════════════════════════════════════════════════════
// Host interop
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_host_bindings() {
    let mut vm = Vm::new();
    let mut context = Bindings::new();
    context.insert("name".to_string(), Value::from("x"));
    context.insert(
        "greet".to_string(),
        Vm::native("greet", |args, _| {
            Ok(Value::from(format!("hi {}", args[0].to_display())))
        }),
    );
    let result = vm.run("greet(name)", Some(context)).expect("run");
    assert_eq!(result.as_str(), Some("hi x"));
}

#[test]
fn test_host_function_error_becomes_runtime_error() {
    let mut vm = Vm::new();
    let mut context = Bindings::new();
    context.insert(
        "boom".to_string(),
        Vm::native("boom", |_, _| Err(JsError::compile("host side failure"))),
    );
    let error = vm.run("boom()", Some(context)).expect_err("must fail");
    assert!(error.is_runtime(), "host failures surface as runtime errors");
}

#[test]
fn test_globals_persist_across_runs() {
    let mut vm = Vm::new();
    vm.run("var counter = 41;", None).expect("first run");
    let result = vm.run("counter + 1", None).expect("second run");
    assert_eq!(result.as_number(), Some(42.0));
}

#[test]
fn test_compile_then_execute() {
    let mut vm = Vm::new();
    let program = vm.compile("6 * 7").expect("compile");
    let result = vm.execute(&program, None, None).expect("execute");
    assert_eq!(result.as_number(), Some(42.0));
}

// ═══════════════════════════════════════════════════════════════════════════════
// Watchdog, reset, state
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_budget_error_on_infinite_loop() {
    let mut vm = Vm::new();
    vm.set_max_instructions(10_000);
    let error = vm.run("while (true) {}", None).expect_err("must hit budget");
    assert_eq!(error, JsError::Budget { limit: 10_000 });
}

#[test]
fn test_budget_override_per_execution() {
    let mut vm = Vm::new();
    let program = vm.compile("while (true) {}").expect("compile");
    let error = vm
        .execute(
            &program,
            None,
            Some(ExecuteOptions {
                max_instructions: Some(500),
            }),
        )
        .expect_err("must hit budget");
    assert_eq!(error, JsError::Budget { limit: 500 });
}

#[test]
fn test_reset_clears_user_globals() {
    let mut vm = Vm::new();
    vm.run("var mine = 1;", None).expect("run");
    assert!(vm.state().global_names.iter().any(|n| n == "mine"));

    vm.reset();
    assert!(!vm.state().global_names.iter().any(|n| n == "mine"));
    assert!(vm.state().initialized);

    let error = vm.run("mine", None).expect_err("variable must be gone");
    assert!(error.is_runtime());

    // Builtins are re-seeded
    assert_eq!(vm.run("Math.abs(-1)", None).expect("run").as_number(), Some(1.0));
}

#[test]
fn test_reset_then_run_is_idempotent_for_pure_programs() {
    let mut vm = Vm::new();
    let source = "var x = 2; function sq(n) { return n * n; } sq(x) + 1";
    vm.reset();
    let first = vm.run(source, None).expect("first");
    vm.reset();
    let second = vm.run(source, None).expect("second");
    assert_eq!(first, second);
}

#[test]
fn test_top_level_for_in_and_switch_leave_no_synthetic_globals() {
    let mut vm = Vm::new();
    let source = "var o = { a: 1 };
    var seen = '';
    for (var k in o) { seen += k; }
    switch (seen) { case 'a': seen = 'hit'; break; }
    function later() { return seen; }
    [later(), later]";
    let result = vm.run(source, None).expect("run");
    let array = result.as_array().expect("array result").borrow().clone();
    assert_eq!(array[0].as_str(), Some("hit"));

    // Desugaring temporaries must not surface as globals
    let names = vm.state().global_names;
    assert!(
        names.iter().all(|n| !n.starts_with('%')),
        "temporaries leaked into {:?}",
        names
    );
    assert!(names.iter().any(|n| n == "seen"));

    // ...and a function declared after the constructs must not capture them
    match &array[1] {
        Value::Function(f) => {
            let closure = f.closure.borrow();
            assert!(
                closure.keys().all(|k| !k.starts_with('%')),
                "temporaries captured into closure: {:?}",
                closure.keys().collect::<Vec<_>>()
            );
            assert_eq!(
                closure.get("seen").and_then(|v| v.as_str().map(str::to_string)),
                Some("hit".to_string())
            );
        }
        other => panic!("expected a function, got {:?}", other),
    }
}

#[test]
fn test_state_snapshot() {
    let mut vm = Vm::new();
    let state = vm.state();
    assert!(!state.initialized);
    assert_eq!(state.call_depth, 0);

    vm.run("1", None).expect("run");
    let state = vm.state();
    assert!(state.initialized);
    assert!(state.global_names.iter().any(|n| n == "Math"));
    assert_eq!(state.call_depth, 0, "idle instances report no frames");
}

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_undefined_variable_error_names_it() {
    let error = run_err("missing_thing");
    match &error {
        JsError::Runtime { message, .. } => assert!(message.contains("missing_thing")),
        other => panic!("expected runtime error, got {:?}", other),
    }
}

#[test]
fn test_call_of_non_callable() {
    assert!(run_err("var x = 1; x()").is_runtime());
    assert!(run_err("new 5()").is_runtime());
}

#[test]
fn test_property_access_on_nullish() {
    assert!(run_err("null.x").is_runtime());
    assert!(run_err("undefined.x").is_runtime());
}

#[test]
fn test_runtime_error_carries_pc_and_position() {
    let error = run_err("var x = 1;\nmissing_thing");
    match error {
        JsError::Runtime { context, .. } => {
            let context = context.expect("dispatch loop attaches context");
            assert_eq!(context.opcode, "LOAD");
            assert!(context.pc > 0);
            let pos = context.pos.expect("debug symbols are on by default");
            assert_eq!(pos.line, 2);
            assert_eq!(context.source_text.as_deref(), Some("missing_thing"));
        }
        other => panic!("expected runtime error, got {:?}", other),
    }
}

#[test]
fn test_disabling_debug_symbols_drops_positions() {
    let mut vm = Vm::new();
    vm.set_debug_symbols(false);
    let error = vm.run("missing_thing", None).expect_err("must fail");
    match error {
        JsError::Runtime { context, .. } => {
            let context = context.expect("pc/opcode context is always attached");
            assert!(context.pos.is_none());
            assert!(context.source_text.is_none());
        }
        other => panic!("expected runtime error, got {:?}", other),
    }
}

#[test]
fn test_throw_is_raised_as_runtime_error() {
    let error = run_err("throw 'broken';");
    match &error {
        JsError::Runtime { message, .. } => assert!(message.contains("broken")),
        other => panic!("expected runtime error, got {:?}", other),
    }
}

#[test]
fn test_try_block_runs_and_finally_runs() {
    assert_eq!(number("var x = 0; try { x = 1; } finally { x += 1; } x"), 2.0);
    assert_eq!(
        number("var x = 0; try { x = 1; } catch (e) { x = 99; } x"),
        1.0,
        "catch is accepted but never taken"
    );
}

#[test]
fn test_arithmetic_on_composite_tags_is_a_runtime_error() {
    assert!(run_err("({}) / 2").is_runtime());
    assert!(run_err("[1] * 2").is_runtime());
}
