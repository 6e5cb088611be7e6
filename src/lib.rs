//! Sandboxed bytecode interpreter for a JavaScript subset
//!
//! Source text is parsed to an AST, compiled to stack-machine bytecode
//! against a constant pool, and executed by a virtual machine that owns its
//! globals. Hosts inject named values (including callable functions)
//! through the context map and receive the program's final value back.
//!
//! # Example
//!
//! ```
//! use jsbox::Vm;
//!
//! let mut vm = Vm::new();
//! let result = vm.run("2 + 3 * 4", None).unwrap();
//! assert_eq!(result.as_number(), Some(14.0));
//! ```
//!
//! Host bindings become globals of the executed program:
//!
//! ```
//! use jsbox::{Bindings, Value, Vm};
//!
//! let mut vm = Vm::new();
//! let mut context = Bindings::new();
//! context.insert("name".to_string(), Value::from("world"));
//! context.insert(
//!     "greet".to_string(),
//!     Vm::native("greet", |args, _| {
//!         Ok(Value::from(format!("hi {}", args[0].to_display())))
//!     }),
//! );
//!
//! let result = vm.run("greet(name)", Some(context)).unwrap();
//! assert_eq!(result.as_str(), Some("hi world"));
//! ```

pub mod ast;
pub mod compiler;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod value;
pub mod vm;

pub use compiler::{Compiler, Constant, ConstantPool, Op, Program};
pub use error::{JsError, SourcePos};
pub use parser::Parser;
pub use value::{HostObject, NativeFunction, UserFunction, Value};
pub use vm::{Bindings, DebugLevel, ExecuteOptions, Vm, VmState, DEFAULT_MAX_INSTRUCTIONS};
