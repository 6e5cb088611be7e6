//! Property and element access, with prototype fallback
//!
//! A `GET_PROP` miss on an own property falls through to a native method
//! table for the receiver's tag (strings, arrays, numbers, plain objects).
//! Resolved methods are bound to the receiver at lookup time, so extracting
//! a method and calling it later still dispatches on the right value.

use std::rc::Rc;

use crate::error::JsError;
use crate::value::{format_number, ArrayRef, NativeFunction, ObjectRef, Value};

/// Property keys are strings; numbers format the way the language prints them
pub fn key_string(key: &Value) -> String {
    match key {
        Value::String(s) => s.to_string(),
        Value::Number(n) => format_number(*n),
        other => other.to_display(),
    }
}

fn array_index(key: &Value) -> Option<usize> {
    match key {
        Value::Number(n) if n.fract() == 0.0 && *n >= 0.0 && *n < usize::MAX as f64 => {
            Some(*n as usize)
        }
        Value::String(s) => s.parse::<usize>().ok(),
        _ => None,
    }
}

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or(Value::Undefined)
}

/// Resolve `start`/`end` style slice bounds with negative offsets
fn slice_bound(raw: &Value, len: usize, default: usize) -> usize {
    match raw.to_number() {
        Some(n) if !n.is_nan() => {
            if n < 0.0 {
                len.saturating_sub((-n) as usize)
            } else {
                (n as usize).min(len)
            }
        }
        _ => default,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// GET
// ═══════════════════════════════════════════════════════════════════════════════

pub fn get_property(receiver: &Value, key: &Value) -> Result<Value, JsError> {
    let name = key_string(key);
    match receiver {
        Value::Undefined | Value::Null => Err(JsError::runtime(format!(
            "cannot read property '{}' of {}",
            name,
            receiver.to_display()
        ))),

        Value::Object(obj) => {
            if let Some(value) = obj.borrow().get(&name) {
                return Ok(value.clone());
            }
            Ok(object_method(obj, &name).unwrap_or(Value::Undefined))
        }

        Value::Array(arr) => {
            if name == "length" {
                return Ok(Value::Number(arr.borrow().len() as f64));
            }
            if let Some(index) = array_index(key) {
                return Ok(arr.borrow().get(index).cloned().unwrap_or(Value::Undefined));
            }
            Ok(array_method(arr, &name).unwrap_or(Value::Undefined))
        }

        Value::String(s) => {
            if name == "length" {
                return Ok(Value::Number(s.chars().count() as f64));
            }
            if let Some(index) = array_index(key) {
                return Ok(s
                    .chars()
                    .nth(index)
                    .map(|c| Value::from(c.to_string()))
                    .unwrap_or(Value::Undefined));
            }
            Ok(string_method(s, &name).unwrap_or(Value::Undefined))
        }

        Value::Number(n) => Ok(number_method(*n, &name).unwrap_or(Value::Undefined)),

        Value::Bool(_) => Ok(Value::Undefined),

        Value::Function(f) => Ok(match name.as_str() {
            "name" => f
                .name
                .as_ref()
                .map(|n| Value::String(n.clone()))
                .unwrap_or_else(|| Value::from("")),
            "length" => Value::Number(f.params.len() as f64),
            _ => Value::Undefined,
        }),

        Value::Native(nf) => {
            if let Some(value) = nf.properties.borrow().get(&name) {
                return Ok(value.clone());
            }
            Ok(match name.as_str() {
                "name" => Value::from(nf.name.as_str()),
                _ => Value::Undefined,
            })
        }

        Value::Host(host) => Ok(host.get(&name).unwrap_or(Value::Undefined)),
    }
}

/// Computed-member read: integer keys index arrays and strings, anything
/// else behaves like `get_property`.
pub fn get_element(receiver: &Value, key: &Value) -> Result<Value, JsError> {
    match receiver {
        Value::Array(arr) => {
            if let Some(index) = array_index(key) {
                return Ok(arr.borrow().get(index).cloned().unwrap_or(Value::Undefined));
            }
            get_property(receiver, key)
        }
        Value::String(s) => {
            if let Some(index) = array_index(key) {
                return Ok(s
                    .chars()
                    .nth(index)
                    .map(|c| Value::from(c.to_string()))
                    .unwrap_or(Value::Undefined));
            }
            get_property(receiver, key)
        }
        _ => get_property(receiver, key),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SET
// ═══════════════════════════════════════════════════════════════════════════════

pub fn set_property(receiver: &Value, key: &Value, value: Value) -> Result<(), JsError> {
    let name = key_string(key);
    match receiver {
        Value::Undefined | Value::Null => Err(JsError::runtime(format!(
            "cannot set property '{}' of {}",
            name,
            receiver.to_display()
        ))),

        Value::Object(obj) => {
            obj.borrow_mut().insert(name, value);
            Ok(())
        }

        Value::Array(arr) => {
            if let Some(index) = array_index(key) {
                let mut elements = arr.borrow_mut();
                // Out-of-range writes grow the array
                if index >= elements.len() {
                    elements.resize(index + 1, Value::Undefined);
                }
                elements[index] = value;
                return Ok(());
            }
            if name == "length" {
                let new_len = value
                    .to_number()
                    .filter(|n| n.fract() == 0.0 && *n >= 0.0)
                    .ok_or_else(|| JsError::runtime("invalid array length"))?
                    as usize;
                arr.borrow_mut().resize(new_len, Value::Undefined);
                return Ok(());
            }
            Err(JsError::runtime(format!(
                "cannot set non-index property '{}' on an array",
                name
            )))
        }

        Value::Native(nf) => {
            nf.properties.borrow_mut().insert(name, value);
            Ok(())
        }

        Value::Host(host) => {
            if host.set(&name, value) {
                Ok(())
            } else {
                Err(JsError::runtime(format!(
                    "cannot set property '{}' on a host object",
                    name
                )))
            }
        }

        other => Err(JsError::runtime(format!(
            "cannot set property '{}' on a {}",
            name,
            other.type_of()
        ))),
    }
}

/// `SET_ELEM` proper: array receivers only
pub fn set_element(receiver: &Value, key: &Value, value: Value) -> Result<(), JsError> {
    match receiver {
        Value::Array(_) => set_property(receiver, key, value),
        other => Err(JsError::runtime(format!(
            "SET_ELEM on a non-array receiver ({})",
            other.type_of()
        ))),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Prototype fallback tables
// ═══════════════════════════════════════════════════════════════════════════════

fn string_method(s: &Rc<str>, name: &str) -> Option<Value> {
    let s = s.clone();
    let method: Rc<NativeFunction> = match name {
        "charAt" => NativeFunction::new("charAt", move |args, _| {
            let index = arg(args, 0).to_number().unwrap_or(0.0);
            if index < 0.0 || index.fract() != 0.0 {
                return Ok(Value::from(""));
            }
            Ok(s.chars()
                .nth(index as usize)
                .map(|c| Value::from(c.to_string()))
                .unwrap_or_else(|| Value::from("")))
        }),
        "charCodeAt" => NativeFunction::new("charCodeAt", move |args, _| {
            let index = arg(args, 0).to_number().unwrap_or(0.0);
            Ok(s.chars()
                .nth(index.max(0.0) as usize)
                .map(|c| Value::Number(c as u32 as f64))
                .unwrap_or(Value::Number(f64::NAN)))
        }),
        "indexOf" => NativeFunction::new("indexOf", move |args, _| {
            let needle = arg(args, 0).to_display();
            Ok(Value::Number(match s.find(&needle) {
                Some(byte_idx) => s[..byte_idx].chars().count() as f64,
                None => -1.0,
            }))
        }),
        "lastIndexOf" => NativeFunction::new("lastIndexOf", move |args, _| {
            let needle = arg(args, 0).to_display();
            Ok(Value::Number(match s.rfind(&needle) {
                Some(byte_idx) => s[..byte_idx].chars().count() as f64,
                None => -1.0,
            }))
        }),
        "slice" => NativeFunction::new("slice", move |args, _| {
            let chars: Vec<char> = s.chars().collect();
            let start = slice_bound(&arg(args, 0), chars.len(), 0);
            let end = if args.len() > 1 {
                slice_bound(&arg(args, 1), chars.len(), chars.len())
            } else {
                chars.len()
            };
            let out: String = chars[start.min(end)..end].iter().collect();
            Ok(Value::from(out))
        }),
        "substring" => NativeFunction::new("substring", move |args, _| {
            let chars: Vec<char> = s.chars().collect();
            let mut start = slice_bound(&arg(args, 0), chars.len(), 0);
            let mut end = if args.len() > 1 {
                slice_bound(&arg(args, 1), chars.len(), chars.len())
            } else {
                chars.len()
            };
            if start > end {
                std::mem::swap(&mut start, &mut end);
            }
            let out: String = chars[start..end].iter().collect();
            Ok(Value::from(out))
        }),
        "split" => NativeFunction::new("split", move |args, _| {
            let separator = arg(args, 0);
            let parts: Vec<Value> = match separator {
                Value::Undefined => vec![Value::String(s.clone())],
                sep => {
                    let sep = sep.to_display();
                    if sep.is_empty() {
                        s.chars().map(|c| Value::from(c.to_string())).collect()
                    } else {
                        s.split(sep.as_str()).map(Value::from).collect()
                    }
                }
            };
            Ok(Value::array(parts))
        }),
        "toUpperCase" => {
            NativeFunction::new("toUpperCase", move |_, _| Ok(Value::from(s.to_uppercase())))
        }
        "toLowerCase" => {
            NativeFunction::new("toLowerCase", move |_, _| Ok(Value::from(s.to_lowercase())))
        }
        "trim" => NativeFunction::new("trim", move |_, _| Ok(Value::from(s.trim()))),
        "concat" => NativeFunction::new("concat", move |args, _| {
            let mut out = s.to_string();
            for value in args {
                out.push_str(&value.to_display());
            }
            Ok(Value::from(out))
        }),
        "replace" => NativeFunction::new("replace", move |args, _| {
            // Literal search only; there is no regex engine
            let needle = arg(args, 0).to_display();
            let replacement = arg(args, 1).to_display();
            Ok(Value::from(s.replacen(needle.as_str(), &replacement, 1)))
        }),
        _ => return None,
    };
    Some(Value::Native(method))
}

fn array_method(arr: &ArrayRef, name: &str) -> Option<Value> {
    let arr = arr.clone();
    let method: Rc<NativeFunction> = match name {
        "push" => NativeFunction::new("push", move |args, _| {
            let mut elements = arr.borrow_mut();
            elements.extend(args.iter().cloned());
            Ok(Value::Number(elements.len() as f64))
        }),
        "pop" => NativeFunction::new("pop", move |_, _| {
            Ok(arr.borrow_mut().pop().unwrap_or(Value::Undefined))
        }),
        "shift" => NativeFunction::new("shift", move |_, _| {
            let mut elements = arr.borrow_mut();
            if elements.is_empty() {
                Ok(Value::Undefined)
            } else {
                Ok(elements.remove(0))
            }
        }),
        "unshift" => NativeFunction::new("unshift", move |args, _| {
            let mut elements = arr.borrow_mut();
            for (i, value) in args.iter().enumerate() {
                elements.insert(i, value.clone());
            }
            Ok(Value::Number(elements.len() as f64))
        }),
        "join" => NativeFunction::new("join", move |args, _| {
            let separator = match arg(args, 0) {
                Value::Undefined => ",".to_string(),
                other => other.to_display(),
            };
            let joined = arr
                .borrow()
                .iter()
                .map(|v| match v {
                    Value::Undefined | Value::Null => String::new(),
                    other => other.to_display(),
                })
                .collect::<Vec<_>>()
                .join(&separator);
            Ok(Value::from(joined))
        }),
        "slice" => NativeFunction::new("slice", move |args, _| {
            let elements = arr.borrow();
            let start = slice_bound(&arg(args, 0), elements.len(), 0);
            let end = if args.len() > 1 {
                slice_bound(&arg(args, 1), elements.len(), elements.len())
            } else {
                elements.len()
            };
            Ok(Value::array(elements[start.min(end)..end].to_vec()))
        }),
        "indexOf" => NativeFunction::new("indexOf", move |args, _| {
            let needle = arg(args, 0);
            let found = arr
                .borrow()
                .iter()
                .position(|v| v.strict_equals(&needle))
                .map(|i| i as f64)
                .unwrap_or(-1.0);
            Ok(Value::Number(found))
        }),
        "concat" => NativeFunction::new("concat", move |args, _| {
            let mut out = arr.borrow().clone();
            for value in args {
                match value {
                    Value::Array(other) => out.extend(other.borrow().iter().cloned()),
                    single => out.push(single.clone()),
                }
            }
            Ok(Value::array(out))
        }),
        "reverse" => NativeFunction::new("reverse", move |_, _| {
            arr.borrow_mut().reverse();
            Ok(Value::Array(arr.clone()))
        }),
        _ => return None,
    };
    Some(Value::Native(method))
}

fn number_method(n: f64, name: &str) -> Option<Value> {
    let method: Rc<NativeFunction> = match name {
        "toString" => NativeFunction::new("toString", move |args, _| {
            match arg(args, 0).to_number() {
                Some(radix) if (2.0..=36.0).contains(&radix) && radix != 10.0 => {
                    Ok(Value::from(format_radix(n, radix as u32)))
                }
                _ => Ok(Value::from(format_number(n))),
            }
        }),
        "toFixed" => NativeFunction::new("toFixed", move |args, _| {
            let digits = arg(args, 0).to_number().unwrap_or(0.0).max(0.0) as usize;
            Ok(Value::from(format!("{:.*}", digits.min(100), n)))
        }),
        _ => return None,
    };
    Some(Value::Native(method))
}

fn object_method(obj: &ObjectRef, name: &str) -> Option<Value> {
    let obj = obj.clone();
    let method: Rc<NativeFunction> = match name {
        "hasOwnProperty" => NativeFunction::new("hasOwnProperty", move |args, _| {
            let key = key_string(&arg(args, 0));
            Ok(Value::Bool(obj.borrow().contains_key(&key)))
        }),
        "toString" => {
            NativeFunction::new("toString", move |_, _| Ok(Value::from("[object Object]")))
        }
        _ => return None,
    };
    Some(Value::Native(method))
}

/// Integer radix formatting for `Number.prototype.toString(radix)`
fn format_radix(n: f64, radix: u32) -> String {
    if !n.is_finite() || n.fract() != 0.0 {
        return format_number(n);
    }
    let negative = n < 0.0;
    let mut value = n.abs() as u64;
    if value == 0 {
        return "0".to_string();
    }
    let digits = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut out = Vec::new();
    while value > 0 {
        out.push(digits[(value % radix as u64) as usize]);
        value /= radix as u64;
    }
    if negative {
        out.push(b'-');
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
