//=============================================
// plaintalk/interpreter/builtins.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Built-in function registry
// Objective: Resolve say/print, display, ask/input, random, length and
//            terminate ahead of user-defined functions
// Formatting: Zobie.format
//=============================================

use std::collections::HashMap;
use std::future::ready;

use once_cell::sync::Lazy;
use rand::Rng;

use super::errors::RuntimeError;
use super::{Interpreter, Value};
use crate::runtime::{LocalBoxFuture, NO_NEWLINE_MARKER, Severity};

type BuiltinResult = Result<Value, RuntimeError>;
type SyncBuiltin = fn(&Interpreter, &[Value]) -> BuiltinResult;
type AsyncBuiltin = fn(Interpreter, Vec<Value>) -> LocalBoxFuture<'static, BuiltinResult>;

/// Shared, read-only builtin table.
pub static BUILTINS: Lazy<Builtins> = Lazy::new(Builtins::standard);

pub struct Builtins {
    sync: HashMap<&'static str, SyncBuiltin>,
    async_map: HashMap<&'static str, AsyncBuiltin>,
}

impl Builtins {
    pub fn standard() -> Self {
        let mut builtins = Self {
            sync: HashMap::new(),
            async_map: HashMap::new(),
        };
        builtins.register_sync("say", builtin_say);
        builtins.register_sync("print", builtin_say);
        builtins.register_sync("display", builtin_display);
        builtins.register_sync("random", builtin_random);
        builtins.register_sync("length", builtin_length);
        builtins.register_sync("terminate", builtin_terminate);
        builtins.register_async("ask", builtin_input);
        builtins.register_async("input", builtin_input);
        builtins
    }

    pub fn register_sync(&mut self, name: &'static str, func: SyncBuiltin) {
        self.sync.insert(name, func);
    }

    pub fn register_async(&mut self, name: &'static str, func: AsyncBuiltin) {
        self.async_map.insert(name, func);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sync.contains_key(name) || self.async_map.contains_key(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self
            .sync
            .keys()
            .chain(self.async_map.keys())
            .copied()
            .collect();
        names.sort_unstable();
        names
    }

    //Function: call
    //Purpose: Dispatch a builtin by name with already evaluated arguments
    //Inputs: name, interpreter handle, args
    //Returns: LocalBoxFuture resolving to the builtin's value
    pub fn call(
        &self,
        name: &str,
        interpreter: &Interpreter,
        args: Vec<Value>,
    ) -> LocalBoxFuture<'static, BuiltinResult> {
        if let Some(func) = self.sync.get(name) {
            return Box::pin(ready(func(interpreter, &args)));
        }
        if let Some(func) = self.async_map.get(name) {
            return func(interpreter.clone(), args);
        }
        Box::pin(ready(Err(RuntimeError::UndefinedFunction(name.to_string()))))
    }
}

fn join_args(args: &[Value]) -> String {
    args.iter()
        .map(|arg| arg.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn builtin_say(interpreter: &Interpreter, args: &[Value]) -> BuiltinResult {
    interpreter.output(&join_args(args), Severity::Info);
    Ok(Value::Absent)
}

fn builtin_display(interpreter: &Interpreter, args: &[Value]) -> BuiltinResult {
    let message = format!("{}{}", join_args(args), NO_NEWLINE_MARKER);
    interpreter.output(&message, Severity::Info);
    Ok(Value::Absent)
}

fn builtin_input(interpreter: Interpreter, args: Vec<Value>) -> LocalBoxFuture<'static, BuiltinResult> {
    let prompt = args.first().map(|arg| arg.to_string()).unwrap_or_default();
    let pending = interpreter.host().input(&prompt);
    Box::pin(async move {
        let answer = pending.await;
        Ok(Value::from_input(answer))
    })
}

fn builtin_random(_interpreter: &Interpreter, args: &[Value]) -> BuiltinResult {
    let numbers: Option<Vec<f64>> = args.iter().map(Value::as_number).collect();
    let numbers = numbers
        .ok_or_else(|| RuntimeError::ArgumentError("random() expects numeric arguments".to_string()))?;
    let roll: f64 = rand::thread_rng().r#gen();
    match numbers.as_slice() {
        [upper] => Ok(Value::Number((roll * upper).floor())),
        [min, max] => Ok(Value::Number((roll * (max - min + 1.0)).floor() + min)),
        _ => Err(RuntimeError::ArgumentError(
            "random() expects 1 or 2 arguments".to_string(),
        )),
    }
}

fn builtin_length(_interpreter: &Interpreter, args: &[Value]) -> BuiltinResult {
    match args {
        [Value::List(items)] => Ok(Value::Number(items.len() as f64)),
        [Value::String(text)] => Ok(Value::Number(text.chars().count() as f64)),
        [_] => Err(RuntimeError::ArgumentError(
            "length() can only be used on arrays or strings".to_string(),
        )),
        _ => Err(RuntimeError::ArgumentError(
            "length() expects 1 argument".to_string(),
        )),
    }
}

fn builtin_terminate(interpreter: &Interpreter, _args: &[Value]) -> BuiltinResult {
    interpreter.output("[SYSTEM] Execution completed.", Severity::System);
    interpreter.stop();
    Ok(Value::Absent)
}
