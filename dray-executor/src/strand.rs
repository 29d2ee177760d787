//! Serial executors over the shared work queue.
//!
//! A [`SerialQueue`] guarantees that tasks posted to it run in submission
//! order and never overlap in time, while still executing on the shared
//! worker pool; no thread is pinned to a strand. The implementation is a
//! per-key FIFO plus a single "drain thunk in flight" flag: at most one
//! thunk for this strand ever sits in the work queue, and each thunk runs
//! exactly one strand task before rescheduling itself if more are pending.

use crate::queue::{Task, TaskQueue};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Default)]
struct SerialState {
    pending: VecDeque<Task>,
    /// A drain thunk is queued or running on the work queue.
    running: bool,
}

/// A serial task chain bound to a shared [`TaskQueue`].
pub struct SerialQueue {
    queue: Arc<TaskQueue>,
    state: Mutex<SerialState>,
}

impl SerialQueue {
    /// Create a serial executor over the given work queue.
    #[must_use]
    pub fn new(queue: Arc<TaskQueue>) -> Self {
        Self {
            queue,
            state: Mutex::new(SerialState::default()),
        }
    }

    /// Enqueue a task behind every task previously posted to this strand.
    pub fn post(self: &Arc<Self>, task: Task) {
        let mut state = self.state.lock();
        state.pending.push_back(task);
        if !state.running {
            state.running = true;
            drop(state);
            self.schedule();
        }
    }

    /// Closure convenience wrapper around [`post`](SerialQueue::post).
    pub fn post_fn(self: &Arc<Self>, f: impl FnOnce() + Send + 'static) {
        self.post(Box::new(f));
    }

    /// Number of tasks waiting behind the current one.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.lock().pending.len()
    }

    fn schedule(self: &Arc<Self>) {
        let this = Arc::clone(self);
        self.queue.post(Box::new(move || this.drain_one()));
    }

    fn drain_one(self: Arc<Self>) {
        let task = self.state.lock().pending.pop_front();
        if let Some(task) = task {
            task();
        }

        let mut state = self.state.lock();
        if state.pending.is_empty() {
            state.running = false;
        } else {
            drop(state);
            self.schedule();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn strand_preserves_submission_order() {
        let queue = Arc::new(TaskQueue::new());
        let strand = Arc::new(SerialQueue::new(Arc::clone(&queue)));
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..8 {
            let seen = Arc::clone(&seen);
            strand.post_fn(move || seen.lock().push(i));
        }
        queue.run();
        assert_eq!(*seen.lock(), (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn strand_tasks_never_overlap() {
        let queue = Arc::new(TaskQueue::new());
        let strand = Arc::new(SerialQueue::new(Arc::clone(&queue)));
        let hold = queue.hold();

        let inside = Arc::new(AtomicUsize::new(0));
        let overlaps = Arc::new(AtomicUsize::new(0));

        for _ in 0..16 {
            let inside = Arc::clone(&inside);
            let overlaps = Arc::clone(&overlaps);
            strand.post_fn(move || {
                if inside.fetch_add(1, Ordering::SeqCst) > 0 {
                    overlaps.fetch_add(1, Ordering::SeqCst);
                }
                thread::sleep(Duration::from_millis(2));
                inside.fetch_sub(1, Ordering::SeqCst);
            });
        }

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || queue.run())
            })
            .collect();

        // Give the strand time to drain, then release the pool.
        while strand.pending() > 0 {
            thread::sleep(Duration::from_millis(5));
        }
        drop(hold);
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn distinct_strands_share_the_pool() {
        let queue = Arc::new(TaskQueue::new());
        let first = Arc::new(SerialQueue::new(Arc::clone(&queue)));
        let second = Arc::new(SerialQueue::new(Arc::clone(&queue)));
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..4 {
            let count_a = Arc::clone(&count);
            let count_b = Arc::clone(&count);
            first.post_fn(move || {
                count_a.fetch_add(1, Ordering::SeqCst);
            });
            second.post_fn(move || {
                count_b.fetch_add(1, Ordering::SeqCst);
            });
        }
        queue.run();
        assert_eq!(count.load(Ordering::SeqCst), 8);
    }
}
