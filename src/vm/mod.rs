//! Virtual machine
//!
//! Executes compiled programs against an operand stack and a call-frame
//! stack. The instance owns its globals, which persist across `execute`
//! calls until `reset`. Execution is synchronous and non-reentrant; a
//! watchdog counter bounds runaway programs.

mod builtins;
mod frame;
mod props;
mod stack;

pub use frame::CallFrame;
pub use stack::OperandStack;

use std::rc::Rc;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::compiler::{is_hidden_name, Compiler, Constant, ConstantIndex, Op, Program};
use crate::error::{JsError, RuntimeContext};
use crate::parser::Parser;
use crate::value::{UserFunction, Value};

/// Default watchdog budget
pub const DEFAULT_MAX_INSTRUCTIONS: u64 = 200_000;

/// Named values a host passes into `run`/`execute`; they become globals
pub type Bindings = IndexMap<String, Value>;

/// Diagnostic verbosity for the dispatch loop (emitted via `tracing`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DebugLevel {
    /// Program start/end events
    Basic,
    /// Plus one event per instruction
    Detail,
    /// Plus operand-stack snapshots
    Verbose,
}

/// Snapshot of instance state for the host
#[derive(Debug, Clone)]
pub struct VmState {
    pub initialized: bool,
    pub global_names: Vec<String>,
    pub call_depth: usize,
}

/// Per-execution overrides
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    pub max_instructions: Option<u64>,
}

/// How an instruction leaves the program counter
enum Flow {
    Next,
    Jump(usize),
    Halt,
}

/// Transient per-execution state
struct Machine {
    stack: OperandStack,
    frames: Vec<CallFrame>,
}

/// A sandboxed script engine instance
pub struct Vm {
    globals: Bindings,
    builtin_names: FxHashSet<String>,
    initialized: bool,
    max_instructions: u64,
    debug: Option<DebugLevel>,
    debug_symbols: bool,
    next_closure_id: u64,
    call_depth: usize,
}

impl Vm {
    pub fn new() -> Self {
        Self {
            globals: IndexMap::new(),
            builtin_names: FxHashSet::default(),
            initialized: false,
            max_instructions: DEFAULT_MAX_INSTRUCTIONS,
            debug: None,
            debug_symbols: true,
            next_closure_id: 0,
            call_depth: 0,
        }
    }

    /// Wrap a Rust function as a host-callable value for the context map
    pub fn native(
        name: impl Into<String>,
        func: impl Fn(&[Value], &Value) -> Result<Value, JsError> + 'static,
    ) -> Value {
        Value::Native(crate::value::NativeFunction::new(name, func))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Host API
    // ═══════════════════════════════════════════════════════════════════════════

    /// Parse, compile, and execute source text
    pub fn run(&mut self, source: &str, context: Option<Bindings>) -> Result<Value, JsError> {
        let program = self.compile(source)?;
        self.execute(&program, context, None)
    }

    /// Parse and compile source text without executing it
    pub fn compile(&self, source: &str) -> Result<Program, JsError> {
        let ast = Parser::new(source).parse_program()?;
        Compiler::compile(&ast, source, self.debug_symbols)
    }

    /// Execute a compiled program. Globals persist across calls on the same
    /// instance; context entries are merged in before execution.
    pub fn execute(
        &mut self,
        program: &Program,
        context: Option<Bindings>,
        options: Option<ExecuteOptions>,
    ) -> Result<Value, JsError> {
        if !self.initialized {
            self.seed_builtins();
        }
        if let Some(context) = context {
            for (name, value) in context {
                self.globals.insert(name, value);
            }
        }

        let limit = options
            .and_then(|o| o.max_instructions)
            .unwrap_or(self.max_instructions);

        self.dispatch(program, limit)
    }

    /// Clear all globals and re-seed the builtins
    pub fn reset(&mut self) {
        self.globals.clear();
        self.builtin_names.clear();
        self.seed_builtins();
    }

    pub fn set_max_instructions(&mut self, n: u64) {
        self.max_instructions = n;
    }

    pub fn enable_debug(&mut self, level: DebugLevel) {
        self.debug = Some(level);
    }

    pub fn disable_debug(&mut self) {
        self.debug = None;
    }

    /// Whether compiled programs carry a debug map (line/column per pc)
    pub fn set_debug_symbols(&mut self, enabled: bool) {
        self.debug_symbols = enabled;
    }

    pub fn state(&self) -> VmState {
        VmState {
            initialized: self.initialized,
            // Desugared temporaries (for-in/switch) are not script-visible
            global_names: self
                .globals
                .keys()
                .filter(|name| !is_hidden_name(name))
                .cloned()
                .collect(),
            call_depth: self.call_depth,
        }
    }

    fn seed_builtins(&mut self) {
        builtins::install(&mut self.globals, &mut self.builtin_names);
        self.initialized = true;
    }

    fn next_closure_id(&mut self) -> u64 {
        self.next_closure_id += 1;
        self.next_closure_id
    }

    fn global_this(&self) -> Value {
        self.globals.get("this").cloned().unwrap_or(Value::Undefined)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Dispatch loop
    // ═══════════════════════════════════════════════════════════════════════════

    fn dispatch(&mut self, program: &Program, limit: u64) -> Result<Value, JsError> {
        let mut machine = Machine {
            stack: OperandStack::new(),
            frames: Vec::new(),
        };
        let mut pc: usize = 0;
        let mut counter: u64 = 0;
        let code_len = program.code.len();

        if self.debug.is_some() {
            debug!(
                instructions = code_len,
                constants = program.constants.len(),
                budget = limit,
                "executing program"
            );
        }

        while pc < code_len {
            counter += 1;
            if counter > limit {
                self.call_depth = 0;
                return Err(JsError::budget(limit));
            }

            let op = program.code[pc];

            match self.debug {
                Some(DebugLevel::Detail) => {
                    trace!(pc, opcode = op.name(), depth = machine.frames.len());
                }
                Some(DebugLevel::Verbose) => {
                    trace!(
                        pc,
                        opcode = op.name(),
                        depth = machine.frames.len(),
                        stack = ?machine.stack.top_slice(8)
                    );
                }
                _ => {}
            }

            match self.step(program, op, pc, &mut machine) {
                Ok(Flow::Next) => pc += 1,
                Ok(Flow::Jump(target)) => pc = target,
                Ok(Flow::Halt) => break,
                Err(error) => {
                    self.call_depth = 0;
                    return Err(error.with_context(self.runtime_context(program, pc, op)));
                }
            }
        }

        self.call_depth = 0;
        if self.debug.is_some() {
            debug!(executed = counter, "execution finished");
        }

        // The result is the top of the stack, or undefined when empty
        Ok(match machine.stack.peek() {
            Some(top) => top.clone(),
            None => Value::Undefined,
        })
    }

    fn runtime_context(&self, program: &Program, pc: usize, op: Op) -> RuntimeContext {
        let pos = program.debug.as_ref().and_then(|d| d.position(pc));
        let source_text = pos.and_then(|p| {
            program
                .debug
                .as_ref()
                .and_then(|d| d.line_text(p.line))
                .map(str::to_string)
        });
        RuntimeContext {
            pc,
            opcode: op.name(),
            pos,
            source_text,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Instruction execution
    // ═══════════════════════════════════════════════════════════════════════════

    fn step(
        &mut self,
        program: &Program,
        op: Op,
        pc: usize,
        machine: &mut Machine,
    ) -> Result<Flow, JsError> {
        let stack = &mut machine.stack;
        match op {
            Op::Push { idx } => {
                let value = self.constant_value(program, idx)?;
                stack.push(value);
                Ok(Flow::Next)
            }
            Op::Pop => {
                stack.pop()?;
                Ok(Flow::Next)
            }
            Op::Dup => {
                let top = stack
                    .peek()
                    .cloned()
                    .ok_or_else(|| JsError::runtime("operand stack underflow"))?;
                stack.push(top);
                Ok(Flow::Next)
            }

            Op::Add => {
                let right = stack.pop()?;
                let left = stack.pop()?;
                stack.push(add_values(&left, &right)?);
                Ok(Flow::Next)
            }
            Op::Sub | Op::Mul | Op::Div | Op::Mod => {
                let right = stack.pop()?;
                let left = stack.pop()?;
                let a = coerce_number(&left)?;
                let b = coerce_number(&right)?;
                let result = match op {
                    Op::Sub => a - b,
                    Op::Mul => a * b,
                    Op::Div => a / b, // float semantics: ±Infinity or NaN
                    _ => a % b,
                };
                stack.push(Value::Number(result));
                Ok(Flow::Next)
            }
            Op::Neg => {
                let value = stack.pop()?;
                stack.push(Value::Number(-coerce_number(&value)?));
                Ok(Flow::Next)
            }

            Op::Shl | Op::Shr | Op::UShr | Op::BitAnd | Op::BitOr | Op::BitXor => {
                let right = stack.pop()?;
                let left = stack.pop()?;
                let a = coerce_int32(&left)?;
                let b = coerce_int32(&right)?;
                let shift = (b & 31) as u32;
                let result = match op {
                    Op::Shl => (a.wrapping_shl(shift)) as f64,
                    Op::Shr => (a.wrapping_shr(shift)) as f64,
                    Op::UShr => ((a as u32).wrapping_shr(shift)) as f64,
                    Op::BitAnd => (a & b) as f64,
                    Op::BitOr => (a | b) as f64,
                    _ => (a ^ b) as f64,
                };
                stack.push(Value::Number(result));
                Ok(Flow::Next)
            }
            Op::BitNot => {
                let value = stack.pop()?;
                stack.push(Value::Number(!coerce_int32(&value)? as f64));
                Ok(Flow::Next)
            }

            Op::Eq | Op::Ne => {
                let right = stack.pop()?;
                let left = stack.pop()?;
                let equal = left.strict_equals(&right);
                stack.push(Value::Bool(if matches!(op, Op::Eq) { equal } else { !equal }));
                Ok(Flow::Next)
            }
            Op::Lt | Op::Le | Op::Gt | Op::Ge => {
                let right = stack.pop()?;
                let left = stack.pop()?;
                stack.push(Value::Bool(compare_values(&left, &right, op)?));
                Ok(Flow::Next)
            }

            Op::And => {
                let right = stack.pop()?;
                let left = stack.pop()?;
                stack.push(if left.truthy() { right } else { left });
                Ok(Flow::Next)
            }
            Op::Or => {
                let right = stack.pop()?;
                let left = stack.pop()?;
                stack.push(if left.truthy() { left } else { right });
                Ok(Flow::Next)
            }
            Op::Not => {
                let value = stack.pop()?;
                stack.push(Value::Bool(!value.truthy()));
                Ok(Flow::Next)
            }
            Op::TypeOf => {
                let value = stack.pop()?;
                stack.push(Value::from(value.type_of()));
                Ok(Flow::Next)
            }

            Op::Load { name } => {
                let name = self.name_constant(program, name)?;
                let value = self.resolve(&name, &machine.frames)?;
                machine.stack.push(value);
                Ok(Flow::Next)
            }
            Op::Store { name } => {
                let name = self.name_constant(program, name)?;
                let value = machine.stack.pop()?;
                self.assign(&name, value, &mut machine.frames);
                Ok(Flow::Next)
            }
            Op::Declare { name } => {
                let name = self.name_constant(program, name)?;
                let value = machine.stack.pop()?;
                self.declare(&name, value, &mut machine.frames);
                Ok(Flow::Next)
            }

            Op::Jmp { target } => Ok(Flow::Jump(target as usize)),
            Op::Jif { target } => {
                let value = stack.pop()?;
                if value.truthy() {
                    Ok(Flow::Jump(target as usize))
                } else {
                    Ok(Flow::Next)
                }
            }
            Op::Jnf { target } => {
                let value = stack.pop()?;
                if value.truthy() {
                    Ok(Flow::Next)
                } else {
                    Ok(Flow::Jump(target as usize))
                }
            }

            Op::Call { argc } => {
                let argc = self.argc_constant(program, argc)?;
                let callee = machine.stack.pop()?;
                let args = pop_args(&mut machine.stack, argc)?;
                let receiver = self.global_this();
                self.invoke(callee, args, receiver, false, pc, machine)
            }
            Op::CallMethod { argc } => {
                let argc = self.argc_constant(program, argc)?;
                let callee = machine.stack.pop()?;
                let receiver = machine.stack.pop()?;
                let args = pop_args(&mut machine.stack, argc)?;
                self.invoke(callee, args, receiver, false, pc, machine)
            }
            Op::New { argc } => {
                let argc = self.argc_constant(program, argc)?;
                let callee = machine.stack.pop()?;
                let args = pop_args(&mut machine.stack, argc)?;
                let receiver = self.global_this();
                self.invoke(callee, args, receiver, true, pc, machine)
            }
            Op::Ret => self.ret(machine),

            Op::NewObj => {
                let count = count_operand(machine.stack.pop()?)?;
                let entries = machine.stack.pop_n(count * 2)?;
                let mut map = IndexMap::new();
                for pair in entries.chunks(2) {
                    let key = props::key_string(&pair[1]);
                    map.insert(key, pair[0].clone());
                }
                machine.stack.push(Value::object(map));
                Ok(Flow::Next)
            }
            Op::NewArr => {
                let count = count_operand(machine.stack.pop()?)?;
                let elements = machine.stack.pop_n(count)?;
                machine.stack.push(Value::array(elements));
                Ok(Flow::Next)
            }

            Op::GetProp => {
                let key = stack.pop()?;
                let receiver = stack.pop()?;
                stack.push(props::get_property(&receiver, &key)?);
                Ok(Flow::Next)
            }
            Op::SetProp => {
                let key = stack.pop()?;
                let receiver = stack.pop()?;
                let value = stack.pop()?;
                props::set_property(&receiver, &key, value.clone())?;
                stack.push(value);
                Ok(Flow::Next)
            }
            Op::GetElem => {
                let key = stack.pop()?;
                let receiver = stack.pop()?;
                stack.push(props::get_element(&receiver, &key)?);
                Ok(Flow::Next)
            }
            Op::SetElem => {
                let key = stack.pop()?;
                let receiver = stack.pop()?;
                let value = stack.pop()?;
                props::set_element(&receiver, &key, value.clone())?;
                stack.push(value);
                Ok(Flow::Next)
            }

            Op::Throw => {
                let value = stack.pop()?;
                Err(JsError::runtime(format!("uncaught: {}", value.to_display())))
            }

            Op::Halt => Ok(Flow::Halt),
            Op::Nop => Ok(Flow::Next),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Constants
    // ═══════════════════════════════════════════════════════════════════════════

    fn constant_value(&self, program: &Program, idx: ConstantIndex) -> Result<Value, JsError> {
        match program.constants.get(idx) {
            Some(Constant::Undefined) => Ok(Value::Undefined),
            Some(Constant::Null) => Ok(Value::Null),
            Some(Constant::Bool(b)) => Ok(Value::Bool(*b)),
            Some(Constant::Number(n)) => Ok(Value::Number(*n)),
            Some(Constant::String(s)) => Ok(Value::String(s.clone())),
            Some(Constant::Regex { pattern, flags }) => Ok(Program::regex_object(pattern, flags)),
            Some(Constant::Function(template)) => Ok(Value::Function(UserFunction::new(
                template.name.clone(),
                template.params.clone(),
                template.entry_pc,
            ))),
            None => Err(JsError::runtime(format!("invalid constant index {}", idx))),
        }
    }

    fn name_constant(
        &self,
        program: &Program,
        idx: ConstantIndex,
    ) -> Result<Rc<str>, JsError> {
        program
            .constants
            .get_string(idx)
            .cloned()
            .ok_or_else(|| JsError::runtime(format!("invalid name constant {}", idx)))
    }

    fn argc_constant(&self, program: &Program, idx: ConstantIndex) -> Result<usize, JsError> {
        match program.constants.get(idx) {
            Some(Constant::Number(n)) if n.fract() == 0.0 && *n >= 0.0 => Ok(*n as usize),
            _ => Err(JsError::runtime(format!(
                "invalid argument-count constant {}",
                idx
            ))),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Name resolution
    // ═══════════════════════════════════════════════════════════════════════════

    /// LOAD order: current closure, then each frame's locals innermost-out,
    /// then globals, then the global receiver's property table.
    fn resolve(&self, name: &str, frames: &[CallFrame]) -> Result<Value, JsError> {
        if let Some(frame) = frames.last() {
            if let Some(value) = frame.function.closure.borrow().get(name) {
                return Ok(value.clone());
            }
        }
        for frame in frames.iter().rev() {
            if let Some(value) = frame.locals.get(name) {
                return Ok(value.clone());
            }
        }
        if let Some(value) = self.globals.get(name) {
            return Ok(value.clone());
        }
        match self.globals.get("this") {
            Some(Value::Object(obj)) => {
                if let Some(value) = obj.borrow().get(name) {
                    return Ok(value.clone());
                }
            }
            Some(Value::Host(host)) => {
                if let Some(value) = host.get(name) {
                    return Ok(value);
                }
            }
            _ => {}
        }
        Err(JsError::runtime(format!("'{}' is not defined", name)))
    }

    /// STORE order: the current closure first, then the first frame with an
    /// existing local binding, then globals (creating the binding).
    fn assign(&mut self, name: &str, value: Value, frames: &mut [CallFrame]) {
        if let Some(frame) = frames.last() {
            let mut closure = frame.function.closure.borrow_mut();
            if closure.contains_key(name) {
                closure.insert(name.to_string(), value);
                return;
            }
        }
        for frame in frames.iter_mut().rev() {
            if frame.locals.contains_key(name) {
                frame.locals.insert(name.to_string(), value);
                return;
            }
        }
        self.globals.insert(name.to_string(), value);
    }

    /// DECLARE binds in the current frame's locals (globals at top level),
    /// running capture-on-declare for functions first.
    fn declare(&mut self, name: &str, value: Value, frames: &mut Vec<CallFrame>) {
        if let Value::Function(function) = &value {
            if !function.has_closure() {
                self.capture_on_declare(name, function, frames);
            }
        }
        match frames.last_mut() {
            Some(frame) => {
                frame.locals.insert(name.to_string(), value);
            }
            None => {
                self.globals.insert(name.to_string(), value);
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Closure capture
    // ═══════════════════════════════════════════════════════════════════════════

    /// Capture-on-declare: snapshot the visible environment into the
    /// function's closure map, non-builtin globals first, then frame
    /// locals outermost-in so inner bindings shadow outer ones. `this`,
    /// `arguments`, compiler-generated temporaries, and the name being
    /// declared are skipped (the last one breaks self-reference cycles).
    fn capture_on_declare(
        &mut self,
        declared_name: &str,
        function: &Rc<UserFunction>,
        frames: &[CallFrame],
    ) {
        let mut snapshot: IndexMap<String, Value> = IndexMap::new();

        for (name, value) in &self.globals {
            if self.builtin_names.contains(name)
                || is_hidden_name(name)
                || name == declared_name
            {
                continue;
            }
            snapshot.insert(name.clone(), value.clone());
        }
        for frame in frames {
            for (name, value) in &frame.locals {
                if name == "this"
                    || name == "arguments"
                    || is_hidden_name(name)
                    || name == declared_name
                {
                    continue;
                }
                snapshot.insert(name.clone(), value.clone());
            }
        }

        function.closure.replace(snapshot);
        function.closure_id.set(self.next_closure_id());
    }

    /// Capture-on-return: build a fresh, independent function record whose
    /// closure holds shallow copies of the returning frame's data locals.
    /// `this`/`arguments`, compiler temporaries, the function's own
    /// parameters, and function-valued bindings are skipped (the latter
    /// stay globally addressable).
    fn capture_on_return(&mut self, inner: &Rc<UserFunction>, frame: &CallFrame) -> Value {
        let fresh = UserFunction::new(inner.name.clone(), inner.params.clone(), inner.entry_pc);

        let mut closure: IndexMap<String, Value> = IndexMap::new();
        for (name, value) in &frame.locals {
            if name == "this" || name == "arguments" || is_hidden_name(name) {
                continue;
            }
            if inner.params.iter().any(|p| p.as_ref() == name.as_str()) {
                continue;
            }
            if matches!(value, Value::Function(_) | Value::Native(_)) {
                continue;
            }
            closure.insert(name.clone(), value.shallow_copy());
        }

        fresh.closure.replace(closure);
        fresh.closure_id.set(self.next_closure_id());
        Value::Function(fresh)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Calls, returns, construction
    // ═══════════════════════════════════════════════════════════════════════════

    fn invoke(
        &mut self,
        callee: Value,
        args: Vec<Value>,
        receiver: Value,
        construct: bool,
        pc: usize,
        machine: &mut Machine,
    ) -> Result<Flow, JsError> {
        match callee {
            // Host functions cover both the call and construct protocols;
            // the well-known builtin constructors are host functions too.
            Value::Native(native) => {
                let result = native.call(&args, &receiver)?;
                machine.stack.push(result);
                Ok(Flow::Next)
            }
            Value::Function(function) => {
                if args.len() > function.params.len() {
                    return Err(JsError::runtime(format!(
                        "function '{}' takes {} argument(s) but {} were supplied",
                        function.display_name(),
                        function.params.len(),
                        args.len()
                    )));
                }

                let mut frame = CallFrame::new(pc + 1, function.clone());
                for (i, param) in function.params.iter().enumerate() {
                    let value = args.get(i).cloned().unwrap_or(Value::Undefined);
                    frame.locals.insert(param.to_string(), value);
                }

                if construct {
                    let instance = Value::object(IndexMap::new());
                    frame.is_constructor = true;
                    frame.new_instance = instance.clone();
                    frame.locals.insert("this".to_string(), instance);
                } else {
                    frame.locals.insert("this".to_string(), receiver);
                }

                let entry = function.entry_pc;
                machine.frames.push(frame);
                self.call_depth = machine.frames.len();
                Ok(Flow::Jump(entry))
            }
            other if construct => Err(JsError::runtime(format!(
                "{} is not a constructor",
                other.type_of()
            ))),
            other => Err(JsError::runtime(format!(
                "{} is not a function",
                other.type_of()
            ))),
        }
    }

    fn ret(&mut self, machine: &mut Machine) -> Result<Flow, JsError> {
        let mut result = machine.stack.pop()?;
        let frame = machine
            .frames
            .pop()
            .ok_or_else(|| JsError::runtime("RET outside of a function call"))?;
        self.call_depth = machine.frames.len();

        // Constructor protocol: an explicit object return wins, otherwise
        // the pre-allocated instance is the result
        if frame.is_constructor {
            let explicit_object = matches!(
                result,
                Value::Object(_) | Value::Array(_) | Value::Host(_)
            );
            if !explicit_object {
                result = frame.new_instance.clone();
            }
        }

        let returned_function = match &result {
            Value::Function(inner) => Some(inner.clone()),
            _ => None,
        };
        if let Some(inner) = returned_function {
            result = self.capture_on_return(&inner, &frame);
        }

        machine.stack.push(result);
        Ok(Flow::Jump(frame.return_pc))
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Operand helpers
// ═══════════════════════════════════════════════════════════════════════════════

fn pop_args(stack: &mut OperandStack, argc: usize) -> Result<Vec<Value>, JsError> {
    // Arguments were pushed right-to-left, so popping yields forward order
    let mut args = Vec::with_capacity(argc);
    for _ in 0..argc {
        args.push(stack.pop()?);
    }
    Ok(args)
}

fn count_operand(value: Value) -> Result<usize, JsError> {
    match value {
        Value::Number(n) if n.fract() == 0.0 && n >= 0.0 => Ok(n as usize),
        other => Err(JsError::runtime(format!(
            "expected an element count, found {}",
            other.type_of()
        ))),
    }
}

fn coerce_number(value: &Value) -> Result<f64, JsError> {
    value.to_number().ok_or_else(|| {
        JsError::runtime(format!(
            "cannot use a {} as a number",
            value.type_of()
        ))
    })
}

fn coerce_int32(value: &Value) -> Result<i32, JsError> {
    value.to_int32().ok_or_else(|| {
        JsError::runtime(format!(
            "cannot use a {} as a number",
            value.type_of()
        ))
    })
}

/// ADD: string concatenation when either side is a string, numeric otherwise
fn add_values(left: &Value, right: &Value) -> Result<Value, JsError> {
    if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
        let mut out = left.to_display();
        out.push_str(&right.to_display());
        return Ok(Value::from(out));
    }
    Ok(Value::Number(coerce_number(left)? + coerce_number(right)?))
}

/// Relational comparison: string/string is lexicographic, otherwise numeric.
/// Any NaN operand compares false.
fn compare_values(left: &Value, right: &Value, op: Op) -> Result<bool, JsError> {
    if let (Value::String(a), Value::String(b)) = (left, right) {
        return Ok(match op {
            Op::Lt => a < b,
            Op::Le => a <= b,
            Op::Gt => a > b,
            _ => a >= b,
        });
    }
    let a = coerce_number(left)?;
    let b = coerce_number(right)?;
    if a.is_nan() || b.is_nan() {
        return Ok(false);
    }
    Ok(match op {
        Op::Lt => a < b,
        Op::Le => a <= b,
        Op::Gt => a > b,
        _ => a >= b,
    })
}
