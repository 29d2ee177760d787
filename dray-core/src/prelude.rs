//! Prelude for convenient imports.

pub use crate::error::{DrayError, Result, ResultExt};
pub use crate::graph::{Edge, Graph};
pub use crate::module::{Module, Ports};
pub use crate::stats::{ModuleStats, cpu_ticks};
pub use crate::strand::Strand;
pub use crate::types::VertexId;
pub use crate::value::Value;
