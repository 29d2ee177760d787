//! Dray Core Library
//!
//! This crate provides the data model for dray, a dataflow graph scheduler:
//! the graph of processing modules, the buffered edges that connect them,
//! and the per-module bookkeeping the scheduler reads and writes.
//!
//! # Overview
//!
//! A dray program is a directed graph. Each vertex holds a [`Module`], a
//! computation with named input and output ports. Each edge is an ordered
//! buffer carrying [`Value`]s from a producer port to a consumer port. The scheduler (in `dray-executor`) fires a module when every input
//! edge holds a value and every output edge has been drained downstream.
//!
//! # Key Components
//!
//! - **Graph**: vertex/edge storage, readiness detection, and the fire
//!   operation that moves values through a module
//! - **Module**: the trait implemented by computation vertices
//! - **Strand**: opaque keys that serialize designated modules against
//!   each other
//! - **Stats**: per-module call counts and CPU-tick costs
//!
//! # Example
//!
//! ```ignore
//! use dray_core::prelude::*;
//!
//! let mut graph = Graph::new();
//! let source = graph.insert(Box::new(CounterSource::new()));
//! let sink = graph.insert(Box::new(Printer::new()));
//! graph.connect(source, "out", sink, "in")?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod graph;
pub mod module;
pub mod prelude;
pub mod stats;
pub mod strand;
pub mod types;
pub mod value;

pub use error::{DrayError, Result};
pub use graph::{Edge, Graph};
pub use module::{Module, Ports};
pub use stats::ModuleStats;
pub use strand::Strand;
pub use types::VertexId;
pub use value::Value;
