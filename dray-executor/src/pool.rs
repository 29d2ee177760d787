//! The pool driver: worker threads, the main queue, and run lifecycle.

use crate::invoker::{Invoker, panic_message};
use crate::policy::RunPolicy;
use crate::queue::{TaskQueue, WorkHold};
use crate::report::ExecutionReport;
use crate::strand::SerialQueue;
use dashmap::DashMap;
use dray_core::error::{DrayError, Result};
use dray_core::graph::Graph;
use dray_core::stats::cpu_ticks;
use dray_core::strand::Strand;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;

/// Configuration for one execution.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Number of worker threads to spawn.
    pub threads: usize,
    /// Respawn policy applied to every module.
    pub policy: RunPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            threads: thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(4),
            policy: RunPolicy::Forever,
        }
    }
}

impl RunConfig {
    /// Create configuration from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `DRAY_THREADS`: number of worker threads (must be positive)
    /// - `DRAY_NCALLS`: bound every module to this many fires
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(threads) = std::env::var("DRAY_THREADS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|n| *n > 0)
        {
            config.threads = threads;
        }

        if let Some(limit) = std::env::var("DRAY_NCALLS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config.policy = RunPolicy::Bounded(limit);
        }

        config
    }

    /// Set the number of worker threads.
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1); // At least 1
        self
    }

    /// Set the respawn policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RunPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// The per-run holds that keep both queues alive while invokers are live.
struct RunHolds {
    _work: WorkHold,
    _main: WorkHold,
}

/// Shared state for one execution.
///
/// Built at the start of every `execute*` call and dropped at its end; an
/// invoker's handle to the context never outlives the run that created it.
pub(crate) struct RunContext {
    pub(crate) graph: Arc<Graph>,
    pub(crate) work: Arc<TaskQueue>,
    pub(crate) main: Arc<TaskQueue>,
    pub(crate) policy: RunPolicy,
    /// Strand executors, created lazily on first use.
    strands: DashMap<Strand, Arc<SerialQueue>>,
    /// Invokers that have not yet retired.
    remaining: AtomicUsize,
    /// Released when the last invoker retires, letting both queues drain out.
    holds: Mutex<Option<RunHolds>>,
    /// First failure observed on the main queue; later ones are suppressed.
    first_error: Mutex<Option<DrayError>>,
}

impl RunContext {
    /// The serial executor for a strand key, creating it on first use.
    pub(crate) fn strand_queue(&self, key: Strand) -> Arc<SerialQueue> {
        let entry = self
            .strands
            .entry(key)
            .or_insert_with(|| Arc::new(SerialQueue::new(Arc::clone(&self.work))));
        Arc::clone(entry.value())
    }

    /// Tell the driver one invoker has retired.
    ///
    /// The count is decremented on the main queue, so the "last invoker"
    /// decision and the hold release happen on the owning thread.
    pub(crate) fn notify_quiesced(self: &Arc<Self>) {
        let ctx = Arc::clone(self);
        self.main.post_fn(move || {
            if ctx.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                tracing::debug!("all invokers retired; releasing run holds");
                ctx.holds.lock().take();
            }
        });
    }

    /// Route a failure to the owning thread.
    ///
    /// The first error recorded stops the main queue and will be returned
    /// from `execute*`; anything after that is logged and dropped.
    pub(crate) fn report_error(self: &Arc<Self>, err: DrayError) {
        let ctx = Arc::clone(self);
        self.main.post_fn(move || {
            let mut slot = ctx.first_error.lock();
            if slot.is_none() {
                tracing::debug!(error = %err, "run failed; stopping main queue");
                *slot = Some(err);
                drop(slot);
                ctx.main.stop();
            } else {
                tracing::warn!(error = %err, "additional failure after run already aborted");
            }
        });
    }
}

/// A threadpool scheduler bound to one graph.
///
/// The pool owns the graph for its lifetime; each `execute*` call is a
/// self-contained run with fresh queues, invokers, and strand executors.
/// Runs are sequential: the receiver is `&mut self`, so a pool can never
/// have two executions mutating the same stats records.
pub struct Threadpool {
    graph: Arc<Graph>,
}

impl Threadpool {
    /// Create a pool bound to a graph.
    #[must_use]
    pub fn new(graph: Graph) -> Self {
        Self {
            graph: Arc::new(graph),
        }
    }

    /// The graph this pool drives.
    #[must_use]
    pub fn graph(&self) -> &Arc<Graph> {
        &self.graph
    }

    /// Run until a module fails.
    ///
    /// With [`RunPolicy::Forever`] there is no clean completion; use
    /// [`execute_policy`](Threadpool::execute_policy) with
    /// [`RunPolicy::UntilStopped`] when the host needs to end the run.
    ///
    /// # Errors
    ///
    /// Returns the first module failure observed, after all workers have
    /// been joined.
    pub fn execute(&mut self, nthreads: usize) -> Result<ExecutionReport> {
        self.run(nthreads, RunPolicy::Forever)
    }

    /// Run until every module has fired `ncalls` times.
    ///
    /// # Errors
    ///
    /// Returns the first module failure observed, after all workers have
    /// been joined.
    pub fn execute_bounded(&mut self, nthreads: usize, ncalls: u64) -> Result<ExecutionReport> {
        self.run(nthreads, RunPolicy::Bounded(ncalls))
    }

    /// Run under an explicit respawn policy.
    ///
    /// # Errors
    ///
    /// Returns the first module failure observed, after all workers have
    /// been joined.
    pub fn execute_policy(&mut self, nthreads: usize, policy: RunPolicy) -> Result<ExecutionReport> {
        self.run(nthreads, policy)
    }

    /// Run under a [`RunConfig`].
    ///
    /// # Errors
    ///
    /// Returns the first module failure observed, after all workers have
    /// been joined.
    pub fn execute_config(&mut self, config: &RunConfig) -> Result<ExecutionReport> {
        self.run(config.threads, config.policy.clone())
    }

    fn run(&mut self, nthreads: usize, policy: RunPolicy) -> Result<ExecutionReport> {
        if nthreads == 0 {
            return Err(DrayError::ConfigValue {
                field: "threads".to_string(),
                cause: "at least one worker thread is required".to_string(),
            });
        }

        let work = Arc::new(TaskQueue::new());
        let main = Arc::new(TaskQueue::new());
        let holds = RunHolds {
            _work: work.hold(),
            _main: main.hold(),
        };

        let vertex_count = self.graph.vertex_count();
        let ctx = Arc::new(RunContext {
            graph: Arc::clone(&self.graph),
            work,
            main,
            policy,
            strands: DashMap::new(),
            remaining: AtomicUsize::new(vertex_count),
            holds: Mutex::new(Some(holds)),
            first_error: Mutex::new(None),
        });

        let started = Instant::now();
        let start_ticks = cpu_ticks();
        self.graph.reset_stats();
        tracing::info!(threads = nthreads, vertices = vertex_count, "starting run");

        if vertex_count == 0 {
            // Nothing will ever retire, so release the holds up front.
            ctx.holds.lock().take();
        }
        for vertex in self.graph.vertex_ids() {
            Invoker::new(Arc::clone(&ctx), vertex).post_check();
        }

        let mut workers = Vec::with_capacity(nthreads);
        let mut spawn_error = None;
        for index in 0..nthreads {
            let ctx = Arc::clone(&ctx);
            let spawned = thread::Builder::new()
                .name(format!("dray-worker-{index}"))
                .spawn(move || worker_loop(&ctx));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(err) => {
                    spawn_error = Some(DrayError::WorkerSpawn {
                        cause: err.to_string(),
                    });
                    break;
                }
            }
        }
        if let Some(err) = spawn_error {
            ctx.holds.lock().take();
            ctx.main.stop();
            ctx.work.stop();
            join_workers(workers);
            return Err(err);
        }

        // Drain error thunks and retirement notifications on this thread
        // until the run completes or the first failure stops the queue.
        ctx.main.run();

        // On the failure path the holds are still alive; drop them so the
        // workers can observe a drained queue, then stop and join.
        ctx.holds.lock().take();
        ctx.work.stop();
        join_workers(workers);

        if let Some(err) = ctx.first_error.lock().take() {
            tracing::info!(error = %err, threads = nthreads, "run failed");
            return Err(err);
        }

        let elapsed = started.elapsed();
        let total_ticks = cpu_ticks().saturating_sub(start_ticks);
        let report = ExecutionReport::collect(&self.graph, nthreads, elapsed, total_ticks);
        tracing::info!(threads = nthreads, elapsed = ?elapsed, "run complete");
        println!("{report}");
        Ok(report)
    }
}

fn worker_loop(ctx: &Arc<RunContext>) {
    while let Some(task) = ctx.work.next() {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
            // Module panics are caught inside the fire itself; reaching
            // this point means scheduler code panicked.
            let thread = thread::current()
                .name()
                .unwrap_or("dray-worker")
                .to_string();
            ctx.report_error(DrayError::WorkerPanicked {
                thread,
                message: panic_message(payload.as_ref()),
            });
        }
        ctx.work.complete();
    }
}

fn join_workers(workers: Vec<thread::JoinHandle<()>>) {
    for worker in workers {
        if worker.join().is_err() {
            tracing::error!("worker thread panicked during shutdown");
        }
    }
}
