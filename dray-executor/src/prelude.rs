//! Prelude for convenient imports.

pub use crate::policy::RunPolicy;
pub use crate::pool::{RunConfig, Threadpool};
pub use crate::queue::{Task, TaskQueue, WorkHold};
pub use crate::report::{ExecutionReport, ModuleReport};
pub use crate::strand::SerialQueue;
