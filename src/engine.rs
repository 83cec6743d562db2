//=============================================
// plaintalk/engine.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Public PlainTalk engine facade
// Objective: Tokenize, parse and interpret source text behind the API an
//            embedding host drives
// Formatting: Zobie.format
//=============================================

use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::warn;

use crate::ast::Program;
use crate::config::EngineConfig;
use crate::interpreter::{Interpreter, ScriptError, Value};
use crate::parser::Parser;
use crate::runtime::{HostIo, Severity};
use crate::tokenizer::Tokenizer;

/// Tokenize and parse without running anything.
pub fn compile(source: &str) -> Result<Program, ScriptError> {
    let tokens = Tokenizer::new(source).tokenize()?;
    let program = Parser::new(tokens).parse()?;
    Ok(program)
}

/// Shared handle to one PlainTalk engine.
///
/// Timer events are spawned with `tokio::task::spawn_local`, so `execute`
/// must be awaited from inside a `tokio::task::LocalSet`.
#[derive(Clone)]
pub struct Engine {
    interpreter: Interpreter,
}

impl Engine {
    pub fn new(host: Rc<dyn HostIo>) -> Self {
        Self::with_config(host, EngineConfig::default())
    }

    pub fn with_config(host: Rc<dyn HostIo>, config: EngineConfig) -> Self {
        Self {
            interpreter: Interpreter::new(host, config),
        }
    }

    //Function: execute
    //Purpose: Run a whole source text; lex and parse faults become one
    //         "Syntax Error" message and nothing executes
    //Inputs: &self, source
    //Returns: ()
    pub async fn execute(&self, source: &str) {
        match compile(source) {
            Ok(program) => self.interpreter.execute(&program).await,
            Err(err) => {
                warn!(code = err.code_str(), "{}", err.message);
                self.interpreter
                    .output(&format!("Syntax Error: {}", err.message), Severity::Error);
            }
        }
    }

    pub async fn trigger_event(&self, name: &str) {
        self.interpreter.trigger_event(name).await;
    }

    pub fn stop(&self) {
        self.interpreter.stop();
    }

    pub fn is_running(&self) -> bool {
        self.interpreter.is_running()
    }

    pub fn variables(&self) -> BTreeMap<String, Value> {
        self.interpreter.variables()
    }

    pub fn functions(&self) -> Vec<String> {
        self.interpreter.function_names()
    }

    pub fn events(&self) -> Vec<String> {
        self.interpreter.event_names()
    }

    pub fn active_timers(&self) -> usize {
        self.interpreter.active_timers()
    }
}
