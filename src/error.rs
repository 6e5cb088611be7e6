//! Error types for the script engine

use thiserror::Error;

/// Source position attached to errors when debug symbols are enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcePos {
    pub line: u32,
    pub column: u32,
}

impl std::fmt::Display for SourcePos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Execution context recorded on runtime errors by the dispatch loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeContext {
    /// Instruction index at which the error was raised
    pub pc: usize,
    /// Name of the opcode being executed
    pub opcode: &'static str,
    /// Source position, if the program carries debug symbols
    pub pos: Option<SourcePos>,
    /// The source line text, if the program carries debug symbols
    pub source_text: Option<String>,
}

impl std::fmt::Display for RuntimeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, " at pc {} ({})", self.pc, self.opcode)?;
        if let Some(pos) = &self.pos {
            write!(f, ", line {}", pos)?;
        }
        if let Some(text) = &self.source_text {
            write!(f, ": `{}`", text.trim())?;
        }
        Ok(())
    }
}

/// Main error type for the engine
#[derive(Debug, Error, PartialEq)]
pub enum JsError {
    #[error("SyntaxError: {message} at {line}:{column}")]
    Syntax {
        message: String,
        line: u32,
        column: u32,
    },

    #[error("CompileError: {message}{}", opt_pos(pos))]
    Compile {
        message: String,
        pos: Option<SourcePos>,
    },

    #[error("RuntimeError: {message}{}", opt_ctx(context))]
    Runtime {
        message: String,
        context: Option<RuntimeContext>,
    },

    #[error("BudgetError: instruction budget of {limit} exceeded")]
    Budget { limit: u64 },
}

fn opt_pos(pos: &Option<SourcePos>) -> String {
    match pos {
        Some(p) => format!(" at {}", p),
        None => String::new(),
    }
}

fn opt_ctx(context: &Option<RuntimeContext>) -> String {
    match context {
        Some(c) => c.to_string(),
        None => String::new(),
    }
}

impl JsError {
    pub fn syntax(message: impl Into<String>, line: u32, column: u32) -> Self {
        JsError::Syntax {
            message: message.into(),
            line,
            column,
        }
    }

    pub fn compile(message: impl Into<String>) -> Self {
        JsError::Compile {
            message: message.into(),
            pos: None,
        }
    }

    pub fn compile_at(message: impl Into<String>, line: u32, column: u32) -> Self {
        JsError::Compile {
            message: message.into(),
            pos: Some(SourcePos { line, column }),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        JsError::Runtime {
            message: message.into(),
            context: None,
        }
    }

    pub fn budget(limit: u64) -> Self {
        JsError::Budget { limit }
    }

    /// Attach dispatch-loop context to a runtime error.
    ///
    /// No-op for non-runtime errors and for errors that already carry
    /// context (the innermost frame wins).
    pub fn with_context(self, ctx: RuntimeContext) -> Self {
        match self {
            JsError::Runtime {
                message,
                context: None,
            } => JsError::Runtime {
                message,
                context: Some(ctx),
            },
            other => other,
        }
    }

    /// True for the Runtime variant (used by hosts to classify failures)
    pub fn is_runtime(&self) -> bool {
        matches!(self, JsError::Runtime { .. })
    }
}
