//! Dray Executor - threadpool scheduler for dataflow graphs.
//!
//! This crate drives a `dray-core` [`Graph`](dray_core::Graph) on a fixed
//! pool of worker threads:
//!
//! - Shared FIFO task queue drained by the workers, plus a main queue
//!   drained by the calling thread for error reporting and completion
//! - Per-vertex invokers that poll readiness and dispatch fires
//! - Strand executors that serialize designated modules against each other
//! - Run policies: forever, bounded call counts, or an external stop flag
//! - An end-of-run report of per-module call counts and CPU-tick costs

#![warn(missing_docs)]
#![warn(clippy::all)]

mod invoker;

pub mod policy;
pub mod pool;
pub mod prelude;
pub mod queue;
pub mod report;
pub mod strand;

pub use policy::RunPolicy;
pub use pool::{RunConfig, Threadpool};
pub use queue::{Task, TaskQueue, WorkHold};
pub use report::{ExecutionReport, ModuleReport};
pub use strand::SerialQueue;
