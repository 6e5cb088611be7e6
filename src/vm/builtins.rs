//! Default globals
//!
//! Seeded into a fresh VM (and again on reset): a console object, a math
//! facility, the parse/number-classification functions, and the coercing
//! constructors. `Object.keys` lives on the `Object` coercer and also backs
//! the `for-in` lowering.

use std::time::{SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use rustc_hash::FxHashSet;

use crate::value::{format_number, NativeFunction, Value};

/// Install all builtins into `globals`, recording their names
pub fn install(globals: &mut IndexMap<String, Value>, names: &mut FxHashSet<String>) {
    let mut define = |name: &str, value: Value| {
        globals.insert(name.to_string(), value);
        names.insert(name.to_string());
    };

    define("console", console_object());
    define("Math", math_object());

    define(
        "parseInt",
        Value::Native(NativeFunction::new("parseInt", |args, _| {
            let text = first_arg(args).to_display();
            let radix = args
                .get(1)
                .and_then(|v| v.to_number())
                .filter(|r| (2.0..=36.0).contains(r))
                .map(|r| r as u32);
            Ok(Value::Number(parse_int(&text, radix)))
        })),
    );

    define(
        "parseFloat",
        Value::Native(NativeFunction::new("parseFloat", |args, _| {
            Ok(Value::Number(parse_float(&first_arg(args).to_display())))
        })),
    );

    define(
        "isNaN",
        Value::Native(NativeFunction::new("isNaN", |args, _| {
            let n = first_arg(args).to_number().unwrap_or(f64::NAN);
            Ok(Value::Bool(n.is_nan()))
        })),
    );

    define(
        "isFinite",
        Value::Native(NativeFunction::new("isFinite", |args, _| {
            let n = first_arg(args).to_number().unwrap_or(f64::NAN);
            Ok(Value::Bool(n.is_finite()))
        })),
    );

    define(
        "String",
        Value::Native(NativeFunction::new("String", |args, _| {
            Ok(match args.first() {
                Some(value) => Value::from(value.to_display()),
                None => Value::from(""),
            })
        })),
    );

    define(
        "Number",
        Value::Native(NativeFunction::new("Number", |args, _| {
            Ok(Value::Number(match args.first() {
                Some(value) => value.to_number().unwrap_or(f64::NAN),
                None => 0.0,
            }))
        })),
    );

    define(
        "Boolean",
        Value::Native(NativeFunction::new("Boolean", |args, _| {
            Ok(Value::Bool(first_arg(args).truthy()))
        })),
    );

    define(
        "Array",
        Value::Native(NativeFunction::new("Array", |args, _| {
            // A single numeric argument is a length; anything else is elements
            if let [Value::Number(n)] = args {
                if n.fract() == 0.0 && *n >= 0.0 {
                    return Ok(Value::array(vec![Value::Undefined; *n as usize]));
                }
            }
            Ok(Value::array(args.to_vec()))
        })),
    );

    define("Object", object_constructor());

    define("undefined", Value::Undefined);
    define("NaN", Value::Number(f64::NAN));
    define("Infinity", Value::Number(f64::INFINITY));

    // The global receiver; hosts override it through the context
    define("this", Value::Undefined);
}

fn first_arg(args: &[Value]) -> Value {
    args.first().cloned().unwrap_or(Value::Undefined)
}

// ═══════════════════════════════════════════════════════════════════════════════
// console
// ═══════════════════════════════════════════════════════════════════════════════

fn console_object() -> Value {
    let mut console = IndexMap::new();

    console.insert(
        "log".to_string(),
        Value::Native(NativeFunction::new("log", |args, _| {
            println!("{}", join_for_print(args));
            Ok(Value::Undefined)
        })),
    );
    console.insert(
        "info".to_string(),
        Value::Native(NativeFunction::new("info", |args, _| {
            println!("{}", join_for_print(args));
            Ok(Value::Undefined)
        })),
    );
    console.insert(
        "warn".to_string(),
        Value::Native(NativeFunction::new("warn", |args, _| {
            eprintln!("{}", join_for_print(args));
            Ok(Value::Undefined)
        })),
    );
    console.insert(
        "error".to_string(),
        Value::Native(NativeFunction::new("error", |args, _| {
            eprintln!("{}", join_for_print(args));
            Ok(Value::Undefined)
        })),
    );

    Value::object(console)
}

fn join_for_print(args: &[Value]) -> String {
    args.iter()
        .map(|v| v.inspect())
        .collect::<Vec<_>>()
        .join(" ")
}

// ═══════════════════════════════════════════════════════════════════════════════
// Math
// ═══════════════════════════════════════════════════════════════════════════════

fn math_object() -> Value {
    let mut math = IndexMap::new();

    math.insert("PI".to_string(), Value::Number(std::f64::consts::PI));
    math.insert("E".to_string(), Value::Number(std::f64::consts::E));

    let mut method = |name: &'static str, f: fn(&[Value]) -> f64| {
        math.insert(
            name.to_string(),
            Value::Native(NativeFunction::new(name, move |args, _| {
                Ok(Value::Number(f(args)))
            })),
        );
    };

    method("abs", |args| number_arg(args, 0).abs());
    method("floor", |args| number_arg(args, 0).floor());
    method("ceil", |args| number_arg(args, 0).ceil());
    method("round", |args| number_arg(args, 0).round());
    method("sqrt", |args| number_arg(args, 0).sqrt());
    method("pow", |args| number_arg(args, 0).powf(number_arg(args, 1)));
    method("sin", |args| number_arg(args, 0).sin());
    method("cos", |args| number_arg(args, 0).cos());
    method("tan", |args| number_arg(args, 0).tan());
    method("max", |args| {
        args.iter()
            .map(|v| v.to_number().unwrap_or(f64::NAN))
            .fold(f64::NEG_INFINITY, f64::max)
    });
    method("min", |args| {
        args.iter()
            .map(|v| v.to_number().unwrap_or(f64::NAN))
            .fold(f64::INFINITY, f64::min)
    });
    method("random", |_| pseudo_random());

    Value::object(math)
}

fn number_arg(args: &[Value], i: usize) -> f64 {
    args.get(i)
        .and_then(|v| v.to_number())
        .unwrap_or(f64::NAN)
}

/// Time-seeded pseudo-random in [0, 1); not cryptographically secure
fn pseudo_random() -> f64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64 ^ (d.as_secs() << 20))
        .unwrap_or(0x9e3779b9);
    let mixed = nanos
        .wrapping_mul(0x9e37_79b9_7f4a_7c15)
        .rotate_left(31)
        .wrapping_mul(0xbf58_476d_1ce4_e5b9);
    (mixed >> 11) as f64 / (1u64 << 53) as f64
}

// ═══════════════════════════════════════════════════════════════════════════════
// Object constructor
// ═══════════════════════════════════════════════════════════════════════════════

fn object_constructor() -> Value {
    let constructor = NativeFunction::new("Object", |args, _| {
        Ok(match args.first() {
            Some(value @ (Value::Object(_) | Value::Array(_) | Value::Host(_))) => value.clone(),
            _ => Value::object(IndexMap::new()),
        })
    });

    constructor.properties.borrow_mut().insert(
        "keys".to_string(),
        Value::Native(NativeFunction::new("keys", |args, _| {
            Ok(Value::array(own_keys(&first_arg(args))))
        })),
    );

    Value::Native(constructor)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Numeric parsing
// ═══════════════════════════════════════════════════════════════════════════════

fn parse_int(text: &str, radix: Option<u32>) -> f64 {
    let mut rest = text.trim();
    let mut sign = 1.0;
    if let Some(stripped) = rest.strip_prefix('-') {
        sign = -1.0;
        rest = stripped;
    } else if let Some(stripped) = rest.strip_prefix('+') {
        rest = stripped;
    }

    let radix = match radix {
        Some(r) => {
            if r == 16 {
                rest = rest
                    .strip_prefix("0x")
                    .or_else(|| rest.strip_prefix("0X"))
                    .unwrap_or(rest);
            }
            r
        }
        None => {
            if let Some(stripped) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
                rest = stripped;
                16
            } else {
                10
            }
        }
    };

    let digits: String = rest
        .chars()
        .take_while(|c| c.to_digit(radix).is_some())
        .collect();
    if digits.is_empty() {
        return f64::NAN;
    }

    let mut value = 0.0f64;
    for c in digits.chars() {
        value = value * radix as f64 + c.to_digit(radix).unwrap_or(0) as f64;
    }
    sign * value
}

fn parse_float(text: &str) -> f64 {
    let rest = text.trim();
    // Longest numeric prefix: sign, digits, fraction, exponent
    let mut best: Option<f64> = None;
    for (i, _) in rest.char_indices().chain(std::iter::once((rest.len(), ' '))) {
        if i == 0 {
            continue;
        }
        if let Ok(parsed) = rest[..i].parse::<f64>() {
            best = Some(parsed);
        }
    }
    best.unwrap_or(f64::NAN)
}

/// Own enumerable keys as string values (backs for-in as well)
pub fn own_keys(value: &Value) -> Vec<Value> {
    match value {
        Value::Object(obj) => obj
            .borrow()
            .keys()
            .map(|k| Value::from(k.as_str()))
            .collect(),
        Value::Array(arr) => (0..arr.borrow().len())
            .map(|i| Value::from(format_number(i as f64)))
            .collect(),
        Value::Host(host) => host.keys().into_iter().map(Value::from).collect(),
        Value::String(s) => (0..s.chars().count())
            .map(|i| Value::from(format_number(i as f64)))
            .collect(),
        _ => Vec::new(),
    }
}
