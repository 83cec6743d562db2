#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::ready;
use std::rc::Rc;
use std::time::Duration;

use plaintalk::{Engine, EngineConfig, HostIo, LocalBoxFuture, Severity};
use tokio::task::LocalSet;

/// Host that records every message and answers prompts from a script.
#[derive(Default)]
pub struct RecordingHost {
    messages: RefCell<Vec<(String, Severity)>>,
    answers: RefCell<VecDeque<String>>,
    prompts: RefCell<Vec<String>>,
    answer_delay: Cell<Option<Duration>>,
}

impl RecordingHost {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn with_answers(answers: &[&str]) -> Rc<Self> {
        let host = Self::default();
        host.answers
            .borrow_mut()
            .extend(answers.iter().map(|answer| answer.to_string()));
        Rc::new(host)
    }

    /// Answers arrive only after `delay` of (tokio) time.
    pub fn delay_answers(&self, delay: Duration) {
        self.answer_delay.set(Some(delay));
    }

    pub fn messages(&self) -> Vec<(String, Severity)> {
        self.messages.borrow().clone()
    }

    pub fn of(&self, severity: Severity) -> Vec<String> {
        self.messages
            .borrow()
            .iter()
            .filter(|(_, kind)| *kind == severity)
            .map(|(message, _)| message.clone())
            .collect()
    }

    pub fn infos(&self) -> Vec<String> {
        self.of(Severity::Info)
    }

    pub fn errors(&self) -> Vec<String> {
        self.of(Severity::Error)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }

    pub fn clear(&self) {
        self.messages.borrow_mut().clear();
    }
}

impl HostIo for RecordingHost {
    fn output(&self, message: &str, severity: Severity) {
        self.messages
            .borrow_mut()
            .push((message.to_string(), severity));
    }

    fn input(&self, prompt: &str) -> LocalBoxFuture<'static, String> {
        self.prompts.borrow_mut().push(prompt.to_string());
        let answer = self.answers.borrow_mut().pop_front().unwrap_or_default();
        match self.answer_delay.get() {
            Some(delay) => Box::pin(async move {
                tokio::time::sleep(delay).await;
                answer
            }),
            None => Box::pin(ready(answer)),
        }
    }
}

/// Runs `source` to completion on a fresh current-thread runtime.
pub fn run_plaintalk(source: &str) -> Rc<RecordingHost> {
    run_with_answers(source, &[])
}

pub fn run_with_answers(source: &str, answers: &[&str]) -> Rc<RecordingHost> {
    let host = RecordingHost::with_answers(answers);
    run_on(source, host.clone(), EngineConfig::default());
    host
}

pub fn run_on(source: &str, host: Rc<RecordingHost>, config: EngineConfig) -> Engine {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime");
    let local = LocalSet::new();
    let engine = Engine::with_config(host, config);
    local.block_on(&runtime, engine.execute(source));
    engine
}
