//=====================================================
// File: interpreter/errors.rs
//=====================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: PlainTalk fault taxonomy
// Objective: Runtime error kinds, line-tagged faults and the unified
//            coded error reported across the engine boundary
//=====================================================

use thiserror::Error;

use crate::parser::ParseError;
use crate::tokenizer::LexError;

/// Runtime errors that can occur during interpretation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("Undefined variable: {0}")]
    UndefinedVariable(String),
    #[error("Undefined function: {0}")]
    UndefinedFunction(String),
    #[error("Function {function} expects {expected} arguments, got {found}")]
    ArgumentCount {
        function: String,
        expected: usize,
        found: usize,
    },
    #[error("{0}")]
    ArgumentError(String),
    #[error("Division by zero")]
    DivisionByZero,
    #[error("{0}")]
    TypeError(String),
    #[error("Cannot access property of null or undefined")]
    NullAccess,
    #[error("Maximum call depth of {depth} exceeded")]
    StackOverflow { depth: usize },
}

impl RuntimeError {
    pub fn code(&self) -> &'static str {
        runtime_error_code(self).as_str()
    }
}

/// A runtime error tagged with the source line of the node that raised it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{error} at line {line}")]
pub struct RuntimeFault {
    pub error: RuntimeError,
    pub line: usize,
}

impl RuntimeFault {
    pub fn new(error: RuntimeError, line: usize) -> Self {
        Self { error, line }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Syntax,
    TypeMismatch,
    InvalidOperation,
    RuntimePanic,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Syntax => "E001",
            ErrorCode::TypeMismatch => "E003",
            ErrorCode::InvalidOperation => "E004",
            ErrorCode::RuntimePanic => "E005",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{}] {message}", .code.as_str())]
pub struct ScriptError {
    pub code: ErrorCode,
    pub message: String,
}

impl ScriptError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl From<LexError> for ScriptError {
    fn from(value: LexError) -> Self {
        ScriptError::new(ErrorCode::Syntax, value.to_string())
    }
}

impl From<ParseError> for ScriptError {
    fn from(value: ParseError) -> Self {
        ScriptError::new(ErrorCode::Syntax, value.to_string())
    }
}

impl From<RuntimeError> for ScriptError {
    fn from(value: RuntimeError) -> Self {
        ScriptError::new(runtime_error_code(&value), value.to_string())
    }
}

impl From<RuntimeFault> for ScriptError {
    fn from(value: RuntimeFault) -> Self {
        ScriptError::new(runtime_error_code(&value.error), value.to_string())
    }
}

pub fn runtime_error_code(error: &RuntimeError) -> ErrorCode {
    match error {
        RuntimeError::TypeError(_) => ErrorCode::TypeMismatch,
        RuntimeError::ArgumentError(_)
        | RuntimeError::ArgumentCount { .. }
        | RuntimeError::DivisionByZero
        | RuntimeError::NullAccess
        | RuntimeError::UndefinedVariable(_)
        | RuntimeError::UndefinedFunction(_) => ErrorCode::InvalidOperation,
        RuntimeError::StackOverflow { .. } => ErrorCode::RuntimePanic,
    }
}
