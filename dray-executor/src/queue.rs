//! Thread-safe FIFO task queues.
//!
//! A [`TaskQueue`] is drained by any number of threads calling
//! [`next`](TaskQueue::next)/[`complete`](TaskQueue::complete) (or the
//! [`run`](TaskQueue::run) convenience loop). The queue distinguishes
//! *idle* from *done*: while a [`WorkHold`] token is alive, or any task is
//! still in flight, an empty queue blocks instead of returning. The
//! scheduler holds one token per run and releases it when the run is over.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;

/// A unit of queued work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

struct QueueState {
    tasks: VecDeque<Task>,
    /// Outstanding [`WorkHold`] tokens.
    holds: usize,
    /// Tasks popped but not yet completed.
    active: usize,
    stopped: bool,
}

/// A thread-safe FIFO of closures with executor-service semantics.
pub struct TaskQueue {
    state: Mutex<QueueState>,
    ready: Condvar,
}

impl TaskQueue {
    /// Create an empty, running queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                tasks: VecDeque::new(),
                holds: 0,
                active: 0,
                stopped: false,
            }),
            ready: Condvar::new(),
        }
    }

    /// Enqueue a task and wake one waiting drainer.
    ///
    /// After [`stop`](TaskQueue::stop) the task is silently dropped; the
    /// run is tearing down and nothing will drain it.
    pub fn post(&self, task: Task) {
        let mut state = self.state.lock();
        if state.stopped {
            tracing::trace!("task posted after stop; dropped");
            return;
        }
        state.tasks.push_back(task);
        drop(state);
        self.ready.notify_one();
    }

    /// Enqueue a closure. Convenience wrapper around [`post`](TaskQueue::post).
    pub fn post_fn(&self, f: impl FnOnce() + Send + 'static) {
        self.post(Box::new(f));
    }

    /// Block until a task is available and claim it.
    ///
    /// Returns `None` once the queue is done: stopped, or empty with no
    /// task in flight and no outstanding hold. Every `Some` claim must be
    /// paired with a [`complete`](TaskQueue::complete) call.
    pub fn next(&self) -> Option<Task> {
        let mut state = self.state.lock();
        loop {
            if state.stopped {
                return None;
            }
            if let Some(task) = state.tasks.pop_front() {
                state.active += 1;
                return Some(task);
            }
            if state.active == 0 && state.holds == 0 {
                return None;
            }
            self.ready.wait(&mut state);
        }
    }

    /// Mark a previously claimed task as finished.
    pub fn complete(&self) {
        let mut state = self.state.lock();
        state.active = state.active.saturating_sub(1);
        let done = state.active == 0 && state.tasks.is_empty() && state.holds == 0;
        drop(state);
        if done {
            self.ready.notify_all();
        }
    }

    /// Drain the queue on the calling thread until it is done or stopped.
    pub fn run(&self) {
        while let Some(task) = self.next() {
            task();
            self.complete();
        }
    }

    /// Stop the queue: discard pending tasks and wake every drainer.
    ///
    /// Tasks already claimed run to completion; nothing new is handed out.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        state.stopped = true;
        state.tasks.clear();
        drop(state);
        self.ready.notify_all();
    }

    /// Check whether [`stop`](TaskQueue::stop) has been called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.state.lock().stopped
    }

    /// Number of tasks waiting to be claimed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.lock().tasks.len()
    }

    /// Take a work-in-progress token.
    ///
    /// While any token is alive, drainers treat an empty queue as idle
    /// rather than done. Dropping the last token wakes every drainer so
    /// they can re-evaluate.
    #[must_use]
    pub fn hold(self: &Arc<Self>) -> WorkHold {
        self.state.lock().holds += 1;
        WorkHold {
            queue: Arc::clone(self),
        }
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII work-in-progress token for a [`TaskQueue`].
pub struct WorkHold {
    queue: Arc<TaskQueue>,
}

impl Drop for WorkHold {
    fn drop(&mut self) {
        let mut state = self.queue.state.lock();
        state.holds = state.holds.saturating_sub(1);
        let released = state.holds == 0;
        drop(state);
        if released {
            self.queue.ready.notify_all();
        }
    }
}
