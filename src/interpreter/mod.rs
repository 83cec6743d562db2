//=============================================
// plaintalk/interpreter/mod.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: PlainTalk tree-walking interpreter
// Objective: Execute parsed programs against the runtime context, drive
//            timer events and manage the running/stopped lifecycle
// Formatting: Zobie.format
//=============================================

//=============================================
//            Section 1: Imports & Shared State
//=============================================

pub mod builtins;
pub mod errors;
pub mod value;

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use crate::ast::{
    BinaryOp, EventDecl, Expr, FunctionDecl, Program, START_EVENT, Scope, Stmt, TimerSpec,
    UnaryOp,
};
use crate::config::EngineConfig;
use crate::runtime::{
    HostIo, LocalBoxFuture, NO_NEWLINE_MARKER, RuntimeContext, Severity, TimerRegistry,
    TimerSignal,
};

use builtins::BUILTINS;
pub use errors::{ErrorCode, RuntimeError, RuntimeFault, ScriptError};
pub use value::Value;

pub type ExecResult<T> = Result<T, RuntimeFault>;

/// User calls nested this deep run their body on a fresh local task.
const CALL_STACK_SEGMENT: usize = 8;

/// How a statement sequence finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
}

struct State {
    context: RefCell<RuntimeContext>,
    running: Cell<bool>,
    halted: Cell<bool>,
    call_depth: Cell<usize>,
    timers: TimerRegistry,
    // Held by the main line, each timer tick and each triggered event
    gate: Mutex<()>,
    config: EngineConfig,
}

/// Cloneable handle to one interpreter instance.
#[derive(Clone)]
pub struct Interpreter {
    state: Rc<State>,
}

fn fault(error: RuntimeError, line: usize) -> RuntimeFault {
    RuntimeFault::new(error, line)
}

//=============================================/*
//  Single-threaded shared state: RefCell borrows never span an await.
//============================================*/
//=============================================
//            Section 2: Lifecycle
//=============================================

impl Interpreter {
    pub fn new(host: Rc<dyn HostIo>, config: EngineConfig) -> Self {
        Self {
            state: Rc::new(State {
                context: RefCell::new(RuntimeContext::new(host)),
                running: Cell::new(false),
                halted: Cell::new(false),
                call_depth: Cell::new(0),
                timers: TimerRegistry::new(),
                gate: Mutex::new(()),
                config,
            }),
        }
    }

    fn context(&self) -> Ref<'_, RuntimeContext> {
        self.state.context.borrow()
    }

    fn context_mut(&self) -> RefMut<'_, RuntimeContext> {
        self.state.context.borrow_mut()
    }

    pub fn host(&self) -> Rc<dyn HostIo> {
        self.context().host()
    }

    /// Sends one message to the host; no context borrow is held during the call.
    pub fn output(&self, message: &str, severity: Severity) {
        let host = self.host();
        host.output(message, severity);
    }

    pub fn is_running(&self) -> bool {
        self.state.running.get()
    }

    fn halted(&self) -> bool {
        self.state.halted.get()
    }

    pub fn active_timers(&self) -> usize {
        self.state.timers.len()
    }

    //Function: stop
    //Purpose: Clear the running flag, halt the active sequence and signal all
    //         timers; a tick parked on a prompt finishes that statement first
    //Inputs: &self
    //Returns: ()
    pub fn stop(&self) {
        self.state.running.set(false);
        self.state.halted.set(true);
        let cancelled = self.state.timers.cancel_all();
        debug!(cancelled, "interpreter stopped");
    }

    //Function: execute
    //Purpose: Register declarations, schedule timers, then run `start` and the
    //         remaining top-level statements
    //Inputs: &self, program
    //Returns: () (faults are reported through the host)
    pub async fn execute(&self, program: &Program) {
        // A previous sequence still holding the gate halts at its next statement
        self.state.running.set(false);
        self.state.halted.set(true);
        let cancelled = self.state.timers.cancel_all();
        if cancelled > 0 {
            debug!(cancelled, "cancelled timers from previous run");
        }

        let _gate = self.state.gate.lock().await;
        self.context_mut().reset();
        self.state.call_depth.set(0);
        self.state.running.set(true);
        self.state.halted.set(false);
        info!(statements = program.body.len(), "executing program");

        if let Err(fault) = self.run_program(program).await {
            self.report_fault(fault);
        }

        // Live timers keep the engine running even after a fault
        if self.state.timers.is_empty() {
            self.state.running.set(false);
        }
        info!(
            running = self.is_running(),
            timers = self.state.timers.len(),
            "program finished"
        );
    }

    async fn run_program(&self, program: &Program) -> ExecResult<()> {
        for stmt in &program.body {
            match stmt {
                Stmt::Function(decl) => self.register_function(Rc::clone(decl)),
                Stmt::Event(decl) => {
                    self.context_mut().register_event(Rc::clone(decl));
                    if let Some(timer) = decl.timer {
                        self.schedule_timer(Rc::clone(decl), timer);
                    }
                }
                _ => {}
            }
        }

        let start = self.context().event(START_EVENT);
        if let Some(start) = start {
            debug!("running start event");
            self.execute_block(&start.body).await?;
        }

        for stmt in &program.body {
            if matches!(stmt, Stmt::Function(_) | Stmt::Event(_)) {
                continue;
            }
            if self.halted() {
                break;
            }
            if let Flow::Return(_) = self.execute_statement(stmt).await? {
                break;
            }
        }
        Ok(())
    }

    fn register_function(&self, decl: Rc<FunctionDecl>) {
        if BUILTINS.contains(&decl.name) {
            self.output(
                &format!(
                    "Function '{}' shares its name with a built-in and will never be called",
                    decl.name
                ),
                Severity::Warning,
            );
        }
        debug!(function = %decl.name, params = decl.params.len(), "registered function");
        self.context_mut().register_function(decl);
    }

    //Function: trigger_event
    //Purpose: Run one named event body without touching the running flag
    //Inputs: &self, name
    //Returns: ()
    pub async fn trigger_event(&self, name: &str) {
        let event = self.context().event(name);
        let Some(event) = event else {
            debug!(event = name, "no such event");
            return;
        };

        let _gate = self.state.gate.lock().await;
        self.state.halted.set(false);
        debug!(event = name, "triggering event");
        if let Err(fault) = self.execute_block(&event.body).await {
            self.report_fault(fault);
        }
    }

    fn report_fault(&self, fault: RuntimeFault) {
        let line = fault.line;
        let report = ScriptError::from(fault);
        warn!(code = report.code_str(), line, "{}", report.message);
        self.output(&format!("Error: {}", report.message), Severity::Error);
    }

    pub fn variables(&self) -> BTreeMap<String, Value> {
        self.context().merged_variables()
    }

    pub fn function_names(&self) -> Vec<String> {
        self.context().function_names()
    }

    pub fn event_names(&self) -> Vec<String> {
        self.context().event_names()
    }

    //=============================================/*
    //  Idle -> Running -> (Stopped | Idle); timers alone keep Running alive.
    //============================================*/
    //=============================================
    //            Section 3: Timer Events
    //=============================================

    fn schedule_timer(&self, decl: Rc<EventDecl>, timer: TimerSpec) {
        let millis = timer.period_ms().clamp(1.0, u32::MAX as f64);
        let period = Duration::from_secs_f64(millis / 1000.0);
        let (id, signal) = self.state.timers.register();
        let interpreter = self.clone();
        // Detached: the task retires itself once its signal fires
        tokio::task::spawn_local(async move {
            interpreter.run_timer(id, decl, period, signal).await;
        });
        debug!(timer = id, period_ms = millis, "timer scheduled");
    }

    async fn run_timer(&self, id: u64, decl: Rc<EventDecl>, period: Duration, signal: Rc<TimerSignal>) {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = signal.cancelled() => break,
            }
            if signal.is_cancelled() || !self.is_running() {
                break;
            }

            let _gate = tokio::select! {
                gate = self.state.gate.lock() => gate,
                _ = signal.cancelled() => break,
            };
            if signal.is_cancelled() || !self.is_running() {
                break;
            }
            debug!(timer = id, "timer tick");
            if let Err(fault) = self.execute_block(&decl.body).await {
                self.report_fault(fault);
            }
        }

        self.state.timers.complete(id);
        debug!(timer = id, "timer retired");
    }

    //=============================================
    //            Section 4: Statements
    //=============================================

    /// Runs statements in order until one returns or the engine is halted.
    pub fn execute_block<'a>(&'a self, body: &'a [Stmt]) -> LocalBoxFuture<'a, ExecResult<Flow>> {
        Box::pin(async move {
            for stmt in body {
                if self.halted() {
                    break;
                }
                if let Flow::Return(value) = self.execute_statement(stmt).await? {
                    return Ok(Flow::Return(value));
                }
            }
            Ok(Flow::Normal)
        })
    }

    fn execute_statement<'a>(&'a self, stmt: &'a Stmt) -> LocalBoxFuture<'a, ExecResult<Flow>> {
        Box::pin(async move {
            match stmt {
                // Registered before execution starts
                Stmt::Event(_) | Stmt::Function(_) => {}
                Stmt::Set {
                    target,
                    scope,
                    value,
                    ..
                } => {
                    let value = self.evaluate(value).await?;
                    self.context_mut().assign(target, *scope, value);
                }
                Stmt::Add {
                    target,
                    scope,
                    amount,
                    line,
                } => {
                    let amount = self.evaluate(amount).await?;
                    let current = self.context().read(target, *scope).unwrap_or(Value::Number(0.0));
                    match (current, amount) {
                        (Value::Number(a), Value::Number(b)) => {
                            self.context_mut().assign(target, *scope, Value::Number(a + b));
                        }
                        _ => {
                            return Err(fault(
                                RuntimeError::TypeError(
                                    "Cannot perform arithmetic on non-numeric values".to_string(),
                                ),
                                *line,
                            ));
                        }
                    }
                }
                Stmt::Remove {
                    target,
                    scope,
                    amount,
                    line,
                } => {
                    let amount = self.evaluate(amount).await?;
                    let current = self.context().read(target, *scope).unwrap_or(Value::Number(0.0));
                    match (current, amount) {
                        (Value::Number(a), Value::Number(b)) => {
                            self.context_mut().assign(target, *scope, Value::Number(a - b));
                        }
                        _ => {
                            return Err(fault(
                                RuntimeError::TypeError("Cannot decrease non-numeric values".to_string()),
                                *line,
                            ));
                        }
                    }
                }
                Stmt::Delete { target, scope, .. } => {
                    self.context_mut().remove(target, *scope);
                }
                Stmt::Call {
                    function,
                    args,
                    line,
                } => {
                    self.call_function(function, args, *line).await?;
                }
                Stmt::If {
                    condition,
                    then_body,
                    else_body,
                    ..
                } => {
                    if self.evaluate(condition).await?.is_truthy() {
                        return self.execute_block(then_body).await;
                    }
                    if let Some(else_body) = else_body {
                        return self.execute_block(else_body).await;
                    }
                }
                Stmt::While {
                    condition, body, ..
                } => {
                    while !self.halted() {
                        if !self.evaluate(condition).await?.is_truthy() {
                            break;
                        }
                        if let Flow::Return(value) = self.execute_block(body).await? {
                            return Ok(Flow::Return(value));
                        }
                        // Let timers and the host breathe inside long loops
                        tokio::task::yield_now().await;
                    }
                }
                Stmt::ForEach {
                    variable,
                    iterable,
                    body,
                    line,
                } => {
                    let items = match self.evaluate(iterable).await? {
                        Value::List(items) => items,
                        _ => {
                            return Err(fault(
                                RuntimeError::TypeError("Cannot iterate over non-array value".to_string()),
                                *line,
                            ));
                        }
                    };
                    let mut flow = Flow::Normal;
                    for item in items {
                        if self.halted() {
                            break;
                        }
                        self.context_mut().assign(variable, Scope::Local, item);
                        flow = self.execute_block(body).await?;
                        if let Flow::Return(_) = flow {
                            break;
                        }
                    }
                    self.context_mut().remove(variable, Scope::Local);
                    return Ok(flow);
                }
                Stmt::Print { expr, newline, .. } => {
                    let value = self.evaluate(expr).await?;
                    let mut message = value.to_string();
                    if !newline {
                        message.push_str(NO_NEWLINE_MARKER);
                    }
                    self.output(&message, Severity::Info);
                }
                Stmt::Return { value, .. } => {
                    let value = match value {
                        Some(expr) => self.evaluate(expr).await?,
                        None => Value::Absent,
                    };
                    return Ok(Flow::Return(value));
                }
                Stmt::Expression { expr, .. } => {
                    self.evaluate(expr).await?;
                }
            }
            Ok(Flow::Normal)
        })
    }

    //=============================================/*
    //  A Return unwinds through if/while/for up to the enclosing function.
    //============================================*/
    //=============================================
    //            Section 5: Expressions & Calls
    //=============================================

    pub fn evaluate<'a>(&'a self, expr: &'a Expr) -> LocalBoxFuture<'a, ExecResult<Value>> {
        Box::pin(async move {
            match expr {
                Expr::Literal { value, .. } => Ok(Value::from(value)),
                Expr::Identifier { name, scope, line } => self
                    .context()
                    .lookup(name, *scope)
                    .ok_or_else(|| fault(RuntimeError::UndefinedVariable(name.clone()), *line)),
                Expr::Binary {
                    op,
                    left,
                    right,
                    line,
                } => {
                    let left = self.evaluate(left).await?;
                    match op {
                        BinaryOp::And if !left.is_truthy() => return Ok(left),
                        BinaryOp::Or if left.is_truthy() => return Ok(left),
                        BinaryOp::And | BinaryOp::Or => return self.evaluate(right).await,
                        _ => {}
                    }
                    let right = self.evaluate(right).await?;
                    value::apply_binary(*op, &left, &right).map_err(|error| fault(error, *line))
                }
                Expr::Unary { op, operand, line } => {
                    let operand = self.evaluate(operand).await?;
                    match op {
                        UnaryOp::Not => Ok(Value::Boolean(!operand.is_truthy())),
                        UnaryOp::Negate => match operand {
                            Value::Number(n) => Ok(Value::Number(-n)),
                            _ => Err(fault(
                                RuntimeError::TypeError("Cannot negate non-numeric values".to_string()),
                                *line,
                            )),
                        },
                    }
                }
                Expr::Call {
                    function,
                    args,
                    line,
                } => self.call_function(function, args, *line).await,
                Expr::Member {
                    object,
                    property,
                    line,
                } => {
                    let object = self.evaluate(object).await?;
                    let property = self.evaluate(property).await?;
                    object.member(&property).map_err(|error| fault(error, *line))
                }
                Expr::Array { elements, .. } => {
                    let mut items = Vec::with_capacity(elements.len());
                    for element in elements {
                        items.push(self.evaluate(element).await?);
                    }
                    Ok(Value::List(items))
                }
                Expr::Object { properties, .. } => {
                    let mut fields = BTreeMap::new();
                    for (key, value) in properties {
                        fields.insert(key.clone(), self.evaluate(value).await?);
                    }
                    Ok(Value::Record(fields))
                }
            }
        })
    }

    //Function: call_function
    //Purpose: Evaluate arguments, then dispatch to a builtin or a user function
    //         running in a fresh parameter-only scope
    //Inputs: &self, name, argument expressions, call-site line
    //Returns: ExecResult<Value>
    async fn call_function(&self, name: &str, args: &[Expr], line: usize) -> ExecResult<Value> {
        debug!(function = name, argc = args.len(), line, "calling function");

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.evaluate(arg).await?);
        }

        if BUILTINS.contains(name) {
            return BUILTINS
                .call(name, self, values)
                .await
                .map_err(|error| fault(error, line));
        }

        let decl = self
            .context()
            .function(name)
            .ok_or_else(|| fault(RuntimeError::UndefinedFunction(name.to_string()), line))?;

        if values.len() != decl.params.len() {
            return Err(fault(
                RuntimeError::ArgumentCount {
                    function: name.to_string(),
                    expected: decl.params.len(),
                    found: values.len(),
                },
                line,
            ));
        }

        let depth = self.state.call_depth.get();
        let max_depth = self.state.config.max_call_depth;
        if depth >= max_depth {
            return Err(fault(RuntimeError::StackOverflow { depth: max_depth }, line));
        }

        let scope: HashMap<String, Value> = decl.params.iter().cloned().zip(values).collect();
        let saved = self.context_mut().enter_scope(scope);
        self.state.call_depth.set(depth + 1);

        let outcome = if depth > 0 && depth % CALL_STACK_SEGMENT == 0 {
            self.execute_detached(Rc::clone(&decl)).await
        } else {
            self.execute_block(&decl.body).await
        };

        self.state.call_depth.set(depth);
        self.context_mut().restore_scope(saved);

        match outcome? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Absent),
        }
    }

    //Function: execute_detached
    //Purpose: Run a function body as its own local task so the native stack
    //         restarts from the scheduler instead of growing with call depth
    //Inputs: &self, declaration
    //Returns: ExecResult<Flow>
    async fn execute_detached(&self, decl: Rc<FunctionDecl>) -> ExecResult<Flow> {
        let interpreter = self.clone();
        let task = tokio::task::spawn_local(async move { interpreter.execute_block(&decl.body).await });
        match task.await {
            Ok(outcome) => outcome,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            // Cancelled only while the local set itself is shutting down
            Err(_) => Ok(Flow::Normal),
        }
    }
}

//=============================================/*
//  Builtins resolve before user functions; callers' locals are restored
//  even when the callee faults.
//============================================*/
