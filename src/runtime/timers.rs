//=====================================================
// File: runtime/timers.rs
//=====================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Track scheduled timer-event tasks
// Objective: Register, cancel and retire the local tasks that drive
//            `every N seconds:` events
//=====================================================

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use tokio::sync::Notify;

/// Cooperative stop flag shared between the registry and one timer task.
///
/// Cancelling never interrupts a tick body; the task notices at its next
/// wait point (the interval tick or the execution gate).
#[derive(Default)]
pub struct TimerSignal {
    cancelled: Cell<bool>,
    notify: Notify,
}

impl TimerSignal {
    pub fn cancel(&self) {
        self.cancelled.set(true);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    /// Resolves once `cancel` has been called.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Registry of live timer tasks keyed by a monotonically increasing id.
#[derive(Default)]
pub struct TimerRegistry {
    next_id: Cell<u64>,
    tasks: RefCell<HashMap<u64, Rc<TimerSignal>>>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates an id and the signal the task should watch.
    pub fn register(&self) -> (u64, Rc<TimerSignal>) {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        let signal = Rc::new(TimerSignal::default());
        self.tasks.borrow_mut().insert(id, Rc::clone(&signal));
        (id, signal)
    }

    pub fn cancel(&self, id: u64) -> bool {
        let signal = self.tasks.borrow_mut().remove(&id);
        match signal {
            Some(signal) => {
                signal.cancel();
                true
            }
            None => false,
        }
    }

    /// Signals every registered task and returns how many were live.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<Rc<TimerSignal>> =
            self.tasks.borrow_mut().drain().map(|(_, signal)| signal).collect();
        for signal in &drained {
            signal.cancel();
        }
        drained.len()
    }

    /// Called by a task that retires itself.
    pub fn complete(&self, id: u64) {
        self.tasks.borrow_mut().remove(&id);
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }
}
