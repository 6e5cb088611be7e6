//! Bytecode instruction set and program format
//!
//! A stack-machine design: every instruction consumes its inputs from the
//! operand stack and leaves its outputs there. An instruction carries at
//! most one operand (a constant-pool index or a jump target).

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::error::{JsError, SourcePos};

/// Constant pool index (0-65535)
pub type ConstantIndex = u16;

/// Jump target (instruction index)
pub type JumpTarget = u32;

/// Bytecode instruction
///
/// Stack effects are written `inputs → outputs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    // ═══════════════════════════════════════════════════════════════════════════
    // Stack
    // ═══════════════════════════════════════════════════════════════════════════
    /// 0 → 1: push `constants[idx]`
    Push { idx: ConstantIndex },

    /// 1 → 0: discard the top value
    Pop,

    /// 1 → 2: duplicate the top value
    Dup,

    // ═══════════════════════════════════════════════════════════════════════════
    // Arithmetic
    // ═══════════════════════════════════════════════════════════════════════════
    /// 2 → 1: numeric add, or string concatenation if either side is a string
    Add,
    /// 2 → 1
    Sub,
    /// 2 → 1
    Mul,
    /// 2 → 1: division by zero yields ±Infinity or NaN, not an error
    Div,
    /// 2 → 1
    Mod,
    /// 1 → 1: numeric negation
    Neg,

    // ═══════════════════════════════════════════════════════════════════════════
    // Bitwise (operands coerced to 32-bit integers)
    // ═══════════════════════════════════════════════════════════════════════════
    /// 2 → 1: `<<`
    Shl,
    /// 2 → 1: `>>` (sign-propagating)
    Shr,
    /// 2 → 1: `>>>` (zero-fill)
    UShr,
    /// 2 → 1: `&`
    BitAnd,
    /// 2 → 1: `|`
    BitOr,
    /// 2 → 1: `^`
    BitXor,
    /// 1 → 1: `~`
    BitNot,

    // ═══════════════════════════════════════════════════════════════════════════
    // Comparison (strict equality: tag plus value)
    // ═══════════════════════════════════════════════════════════════════════════
    /// 2 → 1
    Eq,
    /// 2 → 1
    Ne,
    /// 2 → 1
    Lt,
    /// 2 → 1
    Le,
    /// 2 → 1
    Gt,
    /// 2 → 1
    Ge,

    // ═══════════════════════════════════════════════════════════════════════════
    // Logical
    // ═══════════════════════════════════════════════════════════════════════════
    /// 2 → 1: both operands already evaluated; the compiler emits
    /// `Dup`/`Jnf`/`Jif` sequences when short-circuit evaluation is wanted
    And,
    /// 2 → 1
    Or,
    /// 1 → 1: logical not
    Not,
    /// 1 → 1: `typeof`, yields a string
    TypeOf,

    // ═══════════════════════════════════════════════════════════════════════════
    // Variables (operand names a constant-pool string)
    // ═══════════════════════════════════════════════════════════════════════════
    /// 0 → 1: resolve a name (closure, then frame locals outward, then
    /// globals, then the global receiver's properties)
    Load { name: ConstantIndex },

    /// 1 → 0: assign to the nearest enclosing binding, else to globals
    Store { name: ConstantIndex },

    /// 1 → 0: bind a name in the current scope (frame locals, else globals)
    Declare { name: ConstantIndex },

    // ═══════════════════════════════════════════════════════════════════════════
    // Control flow
    // ═══════════════════════════════════════════════════════════════════════════
    /// 0 → 0: unconditional jump
    Jmp { target: JumpTarget },

    /// 1 → 0: jump if the popped value is truthy
    Jif { target: JumpTarget },

    /// 1 → 0: jump if the popped value is falsy
    Jnf { target: JumpTarget },

    // ═══════════════════════════════════════════════════════════════════════════
    // Calls (`argc` indexes a pooled Number holding the argument count;
    // arguments are pushed right-to-left, so they pop in forward order)
    // ═══════════════════════════════════════════════════════════════════════════
    /// args + callee → 1
    Call { argc: ConstantIndex },

    /// args + receiver + callee → 1: receiver becomes `this`
    CallMethod { argc: ConstantIndex },

    /// 1 → 0 across the frame boundary: pop result, pop frame, resume caller
    Ret,

    /// args + callee → 1: construct with a fresh instance as `this`
    New { argc: ConstantIndex },

    // ═══════════════════════════════════════════════════════════════════════════
    // Objects
    // ═══════════════════════════════════════════════════════════════════════════
    /// 2n+1 → 1: pop a count, then n (key, value) pairs
    NewObj,

    /// 2 → 1: pop key then receiver, push the property value
    GetProp,

    /// 3 → 1: pop key, receiver, value; store; push the value back
    SetProp,

    // ═══════════════════════════════════════════════════════════════════════════
    // Arrays
    // ═══════════════════════════════════════════════════════════════════════════
    /// n+1 → 1: pop a count, then n elements
    NewArr,

    /// 2 → 1: pop index then receiver; out of range yields undefined
    GetElem,

    /// 3 → 1: array receivers only; same stack shape as SetProp
    SetElem,

    // ═══════════════════════════════════════════════════════════════════════════
    // Exceptions (partial: `throw` surfaces as a runtime error)
    // ═══════════════════════════════════════════════════════════════════════════
    /// 1 → (aborts): raise the popped value as a runtime error
    Throw,

    // ═══════════════════════════════════════════════════════════════════════════
    // Terminal
    // ═══════════════════════════════════════════════════════════════════════════
    /// Stop execution; the result is the top of the stack, or undefined
    Halt,

    /// No operation
    Nop,
}

impl Op {
    /// Opcode name for diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Op::Push { .. } => "PUSH",
            Op::Pop => "POP",
            Op::Dup => "DUP",
            Op::Add => "ADD",
            Op::Sub => "SUB",
            Op::Mul => "MUL",
            Op::Div => "DIV",
            Op::Mod => "MOD",
            Op::Neg => "NEG",
            Op::Shl => "SHL",
            Op::Shr => "SHR",
            Op::UShr => "USHR",
            Op::BitAnd => "BIT_AND",
            Op::BitOr => "BIT_OR",
            Op::BitXor => "BIT_XOR",
            Op::BitNot => "BIT_NOT",
            Op::Eq => "EQ",
            Op::Ne => "NE",
            Op::Lt => "LT",
            Op::Le => "LE",
            Op::Gt => "GT",
            Op::Ge => "GE",
            Op::And => "AND",
            Op::Or => "OR",
            Op::Not => "NOT",
            Op::TypeOf => "TYPEOF",
            Op::Load { .. } => "LOAD",
            Op::Store { .. } => "STORE",
            Op::Declare { .. } => "DECLARE",
            Op::Jmp { .. } => "JMP",
            Op::Jif { .. } => "JIF",
            Op::Jnf { .. } => "JNF",
            Op::Call { .. } => "CALL",
            Op::CallMethod { .. } => "CALL_METHOD",
            Op::Ret => "RET",
            Op::New { .. } => "NEW",
            Op::NewObj => "NEW_OBJ",
            Op::GetProp => "GET_PROP",
            Op::SetProp => "SET_PROP",
            Op::NewArr => "NEW_ARR",
            Op::GetElem => "GET_ELEM",
            Op::SetElem => "SET_ELEM",
            Op::Throw => "THROW",
            Op::Halt => "HALT",
            Op::Nop => "NOP",
        }
    }
}

/// Compile-time template for a script function.
///
/// The VM instantiates a fresh `UserFunction` each time the constant is
/// pushed, so distinct evaluations of one function expression never share
/// closure state.
#[derive(Debug, Clone)]
pub struct FunctionTemplate {
    pub name: Option<Rc<str>>,
    pub params: Vec<Rc<str>>,
    pub entry_pc: usize,
}

/// Constants that can live in the pool
#[derive(Debug, Clone)]
pub enum Constant {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    /// Regex literal: materialized as a `{source, flags}` object on push
    Regex { pattern: Rc<str>, flags: Rc<str> },
    /// Function template; never deduplicated
    Function(Rc<FunctionTemplate>),
}

// Pool equality backs the compile-determinism guarantee. Function slots
// compare structurally since each compilation allocates fresh templates.
impl PartialEq for Constant {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Constant::Undefined, Constant::Undefined) => true,
            (Constant::Null, Constant::Null) => true,
            (Constant::Bool(a), Constant::Bool(b)) => a == b,
            (Constant::Number(a), Constant::Number(b)) => a.to_bits() == b.to_bits(),
            (Constant::String(a), Constant::String(b)) => a == b,
            (
                Constant::Regex {
                    pattern: p1,
                    flags: f1,
                },
                Constant::Regex {
                    pattern: p2,
                    flags: f2,
                },
            ) => p1 == p2 && f1 == f2,
            (Constant::Function(a), Constant::Function(b)) => {
                a.name == b.name && a.params == b.params && a.entry_pc == b.entry_pc
            }
            _ => false,
        }
    }
}

/// Append-only constant pool with primitive deduplication.
///
/// Primitives and regex literals share one slot per equal value; function
/// templates always get a new slot.
#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    constants: Vec<Constant>,
    strings: FxHashMap<Rc<str>, ConstantIndex>,
    numbers: FxHashMap<u64, ConstantIndex>,
    regexes: FxHashMap<(Rc<str>, Rc<str>), ConstantIndex>,
    undefined_idx: Option<ConstantIndex>,
    null_idx: Option<ConstantIndex>,
    true_idx: Option<ConstantIndex>,
    false_idx: Option<ConstantIndex>,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_raw(&mut self, constant: Constant) -> Result<ConstantIndex, JsError> {
        if self.constants.len() >= ConstantIndex::MAX as usize {
            return Err(JsError::compile("too many constants (max 65535)"));
        }
        let idx = self.constants.len() as ConstantIndex;
        self.constants.push(constant);
        Ok(idx)
    }

    pub fn add_undefined(&mut self) -> Result<ConstantIndex, JsError> {
        if let Some(idx) = self.undefined_idx {
            return Ok(idx);
        }
        let idx = self.push_raw(Constant::Undefined)?;
        self.undefined_idx = Some(idx);
        Ok(idx)
    }

    pub fn add_null(&mut self) -> Result<ConstantIndex, JsError> {
        if let Some(idx) = self.null_idx {
            return Ok(idx);
        }
        let idx = self.push_raw(Constant::Null)?;
        self.null_idx = Some(idx);
        Ok(idx)
    }

    pub fn add_bool(&mut self, value: bool) -> Result<ConstantIndex, JsError> {
        let slot = if value {
            &mut self.true_idx
        } else {
            &mut self.false_idx
        };
        if let Some(idx) = *slot {
            return Ok(idx);
        }
        let idx = self.push_raw(Constant::Bool(value))?;
        if value {
            self.true_idx = Some(idx);
        } else {
            self.false_idx = Some(idx);
        }
        Ok(idx)
    }

    pub fn add_number(&mut self, value: f64) -> Result<ConstantIndex, JsError> {
        let bits = value.to_bits();
        if let Some(&idx) = self.numbers.get(&bits) {
            return Ok(idx);
        }
        let idx = self.push_raw(Constant::Number(value))?;
        self.numbers.insert(bits, idx);
        Ok(idx)
    }

    pub fn add_string(&mut self, value: Rc<str>) -> Result<ConstantIndex, JsError> {
        if let Some(&idx) = self.strings.get(&value) {
            return Ok(idx);
        }
        let idx = self.push_raw(Constant::String(value.clone()))?;
        self.strings.insert(value, idx);
        Ok(idx)
    }

    pub fn add_regex(
        &mut self,
        pattern: Rc<str>,
        flags: Rc<str>,
    ) -> Result<ConstantIndex, JsError> {
        let key = (pattern.clone(), flags.clone());
        if let Some(&idx) = self.regexes.get(&key) {
            return Ok(idx);
        }
        let idx = self.push_raw(Constant::Regex { pattern, flags })?;
        self.regexes.insert(key, idx);
        Ok(idx)
    }

    /// Function templates are never deduplicated
    pub fn add_function(&mut self, template: FunctionTemplate) -> Result<ConstantIndex, JsError> {
        self.push_raw(Constant::Function(Rc::new(template)))
    }

    pub fn get(&self, idx: ConstantIndex) -> Option<&Constant> {
        self.constants.get(idx as usize)
    }

    /// String constant lookup (LOAD/STORE/DECLARE operands)
    pub fn get_string(&self, idx: ConstantIndex) -> Option<&Rc<str>> {
        match self.get(idx)? {
            Constant::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.constants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constant> {
        self.constants.iter()
    }
}

impl PartialEq for ConstantPool {
    fn eq(&self, other: &Self) -> bool {
        self.constants == other.constants
    }
}

/// Debug map entry: instruction index → source position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugEntry {
    pub pc: usize,
    pub line: u32,
    pub column: u32,
}

/// Optional debug symbols for a compiled program
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DebugInfo {
    /// Entries sorted by pc; looked up by binary search
    pub entries: Vec<DebugEntry>,
    /// Source lines for error display
    pub lines: Vec<String>,
}

impl DebugInfo {
    /// Source position for an instruction index
    pub fn position(&self, pc: usize) -> Option<SourcePos> {
        let idx = self.entries.binary_search_by_key(&pc, |e| e.pc);
        let entry = match idx {
            Ok(i) => self.entries.get(i),
            Err(i) if i > 0 => self.entries.get(i - 1),
            _ => None,
        }?;
        Some(SourcePos {
            line: entry.line,
            column: entry.column,
        })
    }

    /// Source line text (1-based line numbers)
    pub fn line_text(&self, line: u32) -> Option<&str> {
        self.lines.get(line.saturating_sub(1) as usize).map(|s| s.as_str())
    }
}

/// A compiled program: instructions, constants, optional debug symbols
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub code: Vec<Op>,
    pub constants: ConstantPool,
    pub debug: Option<DebugInfo>,
}

impl Program {
    /// Runtime representation of a regex literal
    pub fn regex_object(pattern: &Rc<str>, flags: &Rc<str>) -> crate::value::Value {
        let mut map = indexmap::IndexMap::new();
        map.insert(
            "source".to_string(),
            crate::value::Value::String(pattern.clone()),
        );
        map.insert(
            "flags".to_string(),
            crate::value::Value::String(flags.clone()),
        );
        crate::value::Value::Object(Rc::new(RefCell::new(map)))
    }

    /// Human-readable disassembly (debug tooling and tests)
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        for (pc, op) in self.code.iter().enumerate() {
            let detail = match op {
                Op::Push { idx } => format!(" {:?}", self.constants.get(*idx)),
                Op::Load { name } | Op::Store { name } | Op::Declare { name } => {
                    format!(" {:?}", self.constants.get_string(*name))
                }
                Op::Jmp { target } | Op::Jif { target } | Op::Jnf { target } => {
                    format!(" -> {}", target)
                }
                _ => String::new(),
            };
            out.push_str(&format!("{:4}  {}{}\n", pc, op.name(), detail));
        }
        out
    }
}
