//=============================================
// plaintalk/runtime/mod.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Runtime context shared by the interpreter
// Objective: Own the variable, function and event tables and expose the
//            host's output/input capabilities
// Formatting: Zobie.format
//=============================================

//=============================================
//            Section 1: Imports & Host Capabilities
//=============================================

pub mod timers;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::rc::Rc;

use serde::Serialize;

use crate::ast::{EventDecl, FunctionDecl, Scope};
use crate::interpreter::Value;

pub use timers::{TimerRegistry, TimerSignal};

/// Boxed future that never leaves the current thread.
pub type LocalBoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Suffix appended to `display` output: the consumer should not end the line.
pub const NO_NEWLINE_MARKER: &str = "\0NO_NEWLINE";

/// Category attached to every message sent to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Error,
    Success,
    Warning,
    System,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Error => "error",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::System => "system",
        };
        f.write_str(label)
    }
}

/// The two boundary calls an embedding host supplies to the engine.
pub trait HostIo {
    fn output(&self, message: &str, severity: Severity);

    /// Must eventually resolve; the asking statement stays suspended until it does.
    fn input(&self, prompt: &str) -> LocalBoxFuture<'static, String>;
}

//=============================================/*
//  Host capabilities are injected, never owned by the interpreter.
//============================================*/
//=============================================
//            Section 2: Runtime Context
//=============================================

/// Mutable tables for one engine instance.
pub struct RuntimeContext {
    variables: HashMap<String, Value>,
    global_variables: HashMap<String, Value>,
    functions: HashMap<String, Rc<FunctionDecl>>,
    events: HashMap<String, Rc<EventDecl>>,
    host: Rc<dyn HostIo>,
}

impl RuntimeContext {
    pub fn new(host: Rc<dyn HostIo>) -> Self {
        Self {
            variables: HashMap::new(),
            global_variables: HashMap::new(),
            functions: HashMap::new(),
            events: HashMap::new(),
            host,
        }
    }

    pub fn host(&self) -> Rc<dyn HostIo> {
        Rc::clone(&self.host)
    }

    /// Drops every table; the host stays attached.
    pub fn reset(&mut self) {
        self.variables.clear();
        self.global_variables.clear();
        self.functions.clear();
        self.events.clear();
    }

    fn table(&self, scope: Scope) -> &HashMap<String, Value> {
        match scope {
            Scope::Local => &self.variables,
            Scope::Global => &self.global_variables,
        }
    }

    fn table_mut(&mut self, scope: Scope) -> &mut HashMap<String, Value> {
        match scope {
            Scope::Local => &mut self.variables,
            Scope::Global => &mut self.global_variables,
        }
    }

    //Function: lookup
    //Purpose: Resolve a read; local scope first, then globals
    //Inputs: name, scope (Global skips the local table)
    //Returns: Option<Value>
    pub fn lookup(&self, name: &str, scope: Scope) -> Option<Value> {
        let local = match scope {
            Scope::Local => self.variables.get(name),
            Scope::Global => None,
        };
        local.or_else(|| self.global_variables.get(name)).cloned()
    }

    /// Reads a single table without falling back.
    pub fn read(&self, name: &str, scope: Scope) -> Option<Value> {
        self.table(scope).get(name).cloned()
    }

    pub fn assign(&mut self, name: &str, scope: Scope, value: Value) {
        self.table_mut(scope).insert(name.to_string(), value);
    }

    pub fn remove(&mut self, name: &str, scope: Scope) -> Option<Value> {
        self.table_mut(scope).remove(name)
    }

    /// Swaps in a fresh local scope, handing back the caller's.
    pub fn enter_scope(&mut self, scope: HashMap<String, Value>) -> HashMap<String, Value> {
        mem::replace(&mut self.variables, scope)
    }

    pub fn restore_scope(&mut self, saved: HashMap<String, Value>) {
        self.variables = saved;
    }

    pub fn register_function(&mut self, decl: Rc<FunctionDecl>) {
        self.functions.insert(decl.name.clone(), decl);
    }

    pub fn register_event(&mut self, decl: Rc<EventDecl>) {
        self.events.insert(decl.name.clone(), decl);
    }

    pub fn function(&self, name: &str) -> Option<Rc<FunctionDecl>> {
        self.functions.get(name).cloned()
    }

    pub fn event(&self, name: &str) -> Option<Rc<EventDecl>> {
        self.events.get(name).cloned()
    }

    /// Local and global variables merged for display; globals win on collision.
    pub fn merged_variables(&self) -> BTreeMap<String, Value> {
        let mut merged: BTreeMap<String, Value> = self
            .variables
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        for (name, value) in &self.global_variables {
            merged.insert(name.clone(), value.clone());
        }
        merged
    }

    pub fn function_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.events.keys().cloned().collect();
        names.sort();
        names
    }
}

//=============================================/*
//  Reads fall back from local to global; writes stay in the named table.
//============================================*/
