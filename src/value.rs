//! Runtime value representation
//!
//! The core `Value` type is a tagged union over every runtime shape the VM
//! can produce: primitives, arrays, objects, script functions, host-callable
//! functions, and opaque host objects. The tag determines equality and
//! dispatch; there is no virtual hierarchy.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::JsError;

/// Shared, insertion-ordered property map backing `Value::Object`
pub type ObjectRef = Rc<RefCell<IndexMap<String, Value>>>;

/// Shared dense element vector backing `Value::Array`
pub type ArrayRef = Rc<RefCell<Vec<Value>>>;

/// Signature of host-callable functions: `(args, receiver) -> value`.
///
/// Host functions run synchronously on the VM's thread and must not
/// re-enter the VM instance that invoked them.
pub type NativeImpl = Box<dyn Fn(&[Value], &Value) -> Result<Value, JsError>>;

/// A host-provided callable, optionally carrying its own properties
/// (`Object.keys` lives on the `Object` coercer this way).
pub struct NativeFunction {
    pub name: String,
    pub func: NativeImpl,
    pub properties: RefCell<IndexMap<String, Value>>,
}

impl NativeFunction {
    pub fn new(
        name: impl Into<String>,
        func: impl Fn(&[Value], &Value) -> Result<Value, JsError> + 'static,
    ) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            func: Box::new(func),
            properties: RefCell::new(IndexMap::new()),
        })
    }

    pub fn call(&self, args: &[Value], receiver: &Value) -> Result<Value, JsError> {
        (self.func)(args, receiver).map_err(|e| match e {
            err @ (JsError::Runtime { .. } | JsError::Budget { .. }) => err,
            other => JsError::runtime(format!("host function '{}' failed: {}", self.name, other)),
        })
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[native {}]", self.name)
    }
}

/// An opaque host value, reached only through property access.
///
/// Anything the host injects that is not expressible as one of the other
/// tags implements this trait; `GET_PROP`/`SET_PROP` delegate to it.
pub trait HostObject: fmt::Debug {
    /// Property read; `None` falls through to undefined
    fn get(&self, key: &str) -> Option<Value>;

    /// Property write; return false to reject the assignment
    fn set(&self, _key: &str, _value: Value) -> bool {
        false
    }

    /// Own enumerable keys (backs `Object.keys` and `for-in`)
    fn keys(&self) -> Vec<String> {
        Vec::new()
    }
}

/// A script-defined function.
///
/// The closure map starts empty; it is populated either when the function
/// is bound by `DECLARE` (capture-on-declare) or when it is returned out of
/// its defining frame (capture-on-return, which builds a fresh record). A
/// `closure_id` of 0 means no capture has happened yet.
#[derive(Debug)]
pub struct UserFunction {
    pub name: Option<Rc<str>>,
    pub params: Vec<Rc<str>>,
    /// Index of the function body's first instruction
    pub entry_pc: usize,
    pub closure: RefCell<IndexMap<String, Value>>,
    pub closure_id: Cell<u64>,
}

impl UserFunction {
    pub fn new(name: Option<Rc<str>>, params: Vec<Rc<str>>, entry_pc: usize) -> Rc<Self> {
        Rc::new(Self {
            name,
            params,
            entry_pc,
            closure: RefCell::new(IndexMap::new()),
            closure_id: Cell::new(0),
        })
    }

    /// Whether a closure has been captured for this instance
    pub fn has_closure(&self) -> bool {
        self.closure_id.get() != 0
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("anonymous")
    }
}

/// A runtime value
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Array(ArrayRef),
    Object(ObjectRef),
    Function(Rc<UserFunction>),
    Native(Rc<NativeFunction>),
    Host(Rc<dyn HostObject>),
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Value {
        Value::String(Rc::from(s.as_ref()))
    }

    pub fn array(values: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(values)))
    }

    pub fn object(map: IndexMap<String, Value>) -> Value {
        Value::Object(Rc::new(RefCell::new(map)))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Native(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayRef> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// The `typeof` string for this value
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object", // historical quirk
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) | Value::Object(_) | Value::Host(_) => "object",
            Value::Function(_) | Value::Native(_) => "function",
        }
    }

    /// ToBoolean
    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// ToNumber for primitive tags; composite tags are the caller's problem
    /// (arithmetic raises a RuntimeError for them).
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Value::Undefined => Some(f64::NAN),
            Value::Null => Some(0.0),
            Value::Bool(true) => Some(1.0),
            Value::Bool(false) => Some(0.0),
            Value::Number(n) => Some(*n),
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    Some(0.0)
                } else {
                    Some(trimmed.parse::<f64>().unwrap_or(f64::NAN))
                }
            }
            _ => None,
        }
    }

    /// ToInt32 (bitwise operand coercion)
    pub fn to_int32(&self) -> Option<i32> {
        let n = self.to_number()?;
        if !n.is_finite() {
            return Some(0);
        }
        let truncated = n.trunc();
        let wrapped = (truncated as i64 as u64 & 0xffff_ffff) as u32;
        Some(wrapped as i32)
    }

    /// ToString semantics used for string concatenation and coercion
    pub fn to_display(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.to_string(),
            Value::Array(a) => {
                let elements = a.borrow();
                elements
                    .iter()
                    .map(|v| match v {
                        Value::Undefined | Value::Null => String::new(),
                        other => other.to_display(),
                    })
                    .collect::<Vec<_>>()
                    .join(",")
            }
            Value::Object(_) | Value::Host(_) => "[object Object]".to_string(),
            Value::Function(f) => format!("function {}() {{ ... }}", f.display_name()),
            Value::Native(n) => format!("function {}() {{ [native code] }}", n.name),
        }
    }

    /// Inspection form used by `console.log` (arrays and objects expanded)
    pub fn inspect(&self) -> String {
        match self {
            Value::String(s) => s.to_string(),
            Value::Array(a) => {
                let elements = a.borrow();
                let inner = elements
                    .iter()
                    .map(|v| v.inspect_quoted())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("[{}]", inner)
            }
            Value::Object(o) => {
                let props = o.borrow();
                let inner = props
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v.inspect_quoted()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{{ {} }}", inner)
            }
            other => other.to_display(),
        }
    }

    fn inspect_quoted(&self) -> String {
        match self {
            Value::String(s) => format!("\"{}\"", s),
            other => other.inspect(),
        }
    }

    /// Strict equality: tag plus value; composites by identity
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => {
                if a.is_nan() || b.is_nan() {
                    false
                } else {
                    a == b
                }
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            (Value::Host(a), Value::Host(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// One-level copy: arrays and objects get a new backing store whose
    /// elements are cloned handles; everything else clones the handle.
    /// This is the capture-on-return copy discipline.
    pub fn shallow_copy(&self) -> Value {
        match self {
            Value::Array(a) => Value::Array(Rc::new(RefCell::new(a.borrow().clone()))),
            Value::Object(o) => Value::Object(Rc::new(RefCell::new(o.borrow().clone()))),
            other => other.clone(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_equals(other)
    }
}

// Debug mirrors the inspection form so test failures read like script
// values, not Rust enum dumps.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "\"{}\"", s),
            other => write!(f, "{}", other.inspect()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s.as_str()))
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Undefined
    }
}

/// Number-to-string following the host language's conventions: integral
/// values print without a fractional part.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
