//=====================================================
// File: lib.rs
//=====================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: PlainTalk library root
// Objective: Expose the tokenizer, parser, interpreter and engine facade
//=====================================================

pub mod ast;
pub mod config;
pub mod engine;
pub mod interpreter;
pub mod parser;
pub mod runtime;
pub mod samples;
pub mod tokenizer;

pub use config::{CliConfig, EngineConfig};
pub use engine::{Engine, compile};
pub use interpreter::{ErrorCode, RuntimeError, RuntimeFault, ScriptError, Value};
pub use runtime::{HostIo, LocalBoxFuture, NO_NEWLINE_MARKER, Severity};
