//! Dataflow graph: vertices, buffered edges, readiness, and firing.

use crate::error::{DrayError, Result, ResultExt};
use crate::module::{Module, Ports};
use crate::stats::{ModuleStats, cpu_ticks};
use crate::strand::Strand;
use crate::types::VertexId;
use crate::value::Value;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

/// A buffered connection from a producer port to a consumer port.
///
/// The buffer is an ordered queue; under the scheduler's readiness rule it
/// holds at most one value at a time, but the type does not enforce that.
pub struct Edge {
    /// Producer vertex.
    pub from: VertexId,
    /// Producer port name.
    pub from_port: String,
    /// Consumer vertex.
    pub to: VertexId,
    /// Consumer port name.
    pub to_port: String,
    buffer: Mutex<VecDeque<Value>>,
}

impl Edge {
    fn new(
        from: VertexId,
        from_port: impl Into<String>,
        to: VertexId,
        to_port: impl Into<String>,
    ) -> Self {
        Self {
            from,
            from_port: from_port.into(),
            to,
            to_port: to_port.into(),
            buffer: Mutex::new(VecDeque::new()),
        }
    }

    /// Current number of buffered values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.lock().len()
    }

    /// Check whether the buffer holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }

    /// Append a value at the back of the buffer.
    pub fn push_back(&self, value: Value) {
        self.buffer.lock().push_back(value);
    }

    /// Remove and return the value at the front of the buffer.
    pub fn pop_front(&self) -> Option<Value> {
        self.buffer.lock().pop_front()
    }
}

impl std::fmt::Debug for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Edge")
            .field("from", &self.from)
            .field("from_port", &self.from_port)
            .field("to", &self.to)
            .field("to_port", &self.to_port)
            .field("len", &self.len())
            .finish()
    }
}

/// Per-vertex storage.
///
/// Name and strand are cached at insertion so dispatch and reporting never
/// have to take the module lock.
struct VertexCell {
    module: Mutex<Box<dyn Module>>,
    stats: Mutex<ModuleStats>,
    name: String,
    strand: Option<Strand>,
}

/// A directed dataflow graph of modules connected by buffered edges.
///
/// The graph is assembled with [`insert`](Graph::insert) and
/// [`connect`](Graph::connect), then handed to the scheduler. Topology is
/// immutable during execution (`&self` everywhere past construction); all
/// per-vertex mutation goes through internal locks.
#[derive(Default)]
pub struct Graph {
    vertices: HashMap<VertexId, VertexCell>,
    edges: Vec<Edge>,
    outgoing: HashMap<VertexId, Vec<usize>>,
    incoming: HashMap<VertexId, Vec<usize>>,
    next_id: u32,
}

impl Graph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module as a new vertex and return its ID.
    pub fn insert(&mut self, module: Box<dyn Module>) -> VertexId {
        let id = VertexId::new(self.next_id);
        self.next_id += 1;

        let name = module.name().to_string();
        let strand = module.strand();
        self.vertices.insert(
            id,
            VertexCell {
                module: Mutex::new(module),
                stats: Mutex::new(ModuleStats::new()),
                name,
                strand,
            },
        );
        self.outgoing.entry(id).or_default();
        self.incoming.entry(id).or_default();
        id
    }

    /// Connect a producer port to a consumer port.
    ///
    /// # Errors
    ///
    /// Returns [`DrayError::UnknownVertex`] if either endpoint does not
    /// exist, and [`DrayError::InputAlreadyConnected`] if the consumer port
    /// already has a producer. An input port takes one value per fire, so
    /// a second producer would race the first.
    pub fn connect(
        &mut self,
        from: VertexId,
        from_port: impl Into<String>,
        to: VertexId,
        to_port: impl Into<String>,
    ) -> Result<()> {
        if !self.vertices.contains_key(&from) {
            return Err(DrayError::UnknownVertex { vertex: from });
        }
        if !self.vertices.contains_key(&to) {
            return Err(DrayError::UnknownVertex { vertex: to });
        }

        let to_port = to_port.into();
        if let Some(indices) = self.incoming.get(&to) {
            if indices.iter().any(|&i| self.edges[i].to_port == to_port) {
                return Err(DrayError::InputAlreadyConnected {
                    vertex: to,
                    port: to_port,
                });
            }
        }

        let idx = self.edges.len();
        self.edges.push(Edge::new(from, from_port, to, to_port));
        self.outgoing.entry(from).or_default().push(idx);
        self.incoming.entry(to).or_default().push(idx);
        Ok(())
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// All vertex IDs in insertion order.
    #[must_use]
    pub fn vertex_ids(&self) -> Vec<VertexId> {
        let mut ids: Vec<VertexId> = self.vertices.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// All edges, in connection order.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Incoming edges of a vertex.
    pub fn incoming_edges(&self, vertex: VertexId) -> impl Iterator<Item = &Edge> {
        self.incoming
            .get(&vertex)
            .into_iter()
            .flat_map(|indices| indices.iter().map(|&i| &self.edges[i]))
    }

    /// Outgoing edges of a vertex.
    pub fn outgoing_edges(&self, vertex: VertexId) -> impl Iterator<Item = &Edge> {
        self.outgoing
            .get(&vertex)
            .into_iter()
            .flat_map(|indices| indices.iter().map(|&i| &self.edges[i]))
    }

    fn cell(&self, vertex: VertexId) -> Result<&VertexCell> {
        self.vertices
            .get(&vertex)
            .ok_or(DrayError::UnknownVertex { vertex })
    }

    /// The reported name of the module at a vertex.
    ///
    /// # Errors
    ///
    /// Returns [`DrayError::UnknownVertex`] for an unknown ID.
    pub fn module_name(&self, vertex: VertexId) -> Result<&str> {
        Ok(self.cell(vertex)?.name.as_str())
    }

    /// The strand key of the module at a vertex, if it declared one.
    ///
    /// # Errors
    ///
    /// Returns [`DrayError::UnknownVertex`] for an unknown ID.
    pub fn strand_of(&self, vertex: VertexId) -> Result<Option<Strand>> {
        Ok(self.cell(vertex)?.strand)
    }

    /// Snapshot of the stats record for a vertex.
    ///
    /// # Errors
    ///
    /// Returns [`DrayError::UnknownVertex`] for an unknown ID.
    pub fn stats(&self, vertex: VertexId) -> Result<ModuleStats> {
        Ok(*self.cell(vertex)?.stats.lock())
    }

    /// Zero every vertex's stats record. Called at the start of a run.
    pub fn reset_stats(&self) {
        for cell in self.vertices.values() {
            cell.stats.lock().reset();
        }
    }

    /// Check whether a vertex may fire.
    ///
    /// A vertex is ready when every incoming edge holds a value and every
    /// outgoing edge has been drained. Sources need only drained outputs,
    /// sinks only full inputs, and an isolated vertex is always ready.
    #[must_use]
    pub fn is_ready(&self, vertex: VertexId) -> bool {
        self.incoming_edges(vertex).all(|e| !e.is_empty())
            && self.outgoing_edges(vertex).all(|e| e.is_empty())
    }

    /// Fire the module at a vertex once.
    ///
    /// Pops one value from each incoming edge into the module's input
    /// ports, runs `process()` under the tick clock, records stats on
    /// success, and pushes one value per outgoing edge from the module's
    /// output ports. Must only be called when [`is_ready`](Graph::is_ready)
    /// held; only the producer ever pushes to an edge and only this fire
    /// pops it, so readiness observed at dispatch still holds here.
    ///
    /// # Errors
    ///
    /// Returns [`DrayError::ModuleFailed`] when `process()` errors and
    /// [`DrayError::MissingOutput`] when a connected output port is left
    /// unset. Both are fatal to the run.
    pub fn fire(&self, vertex: VertexId) -> Result<()> {
        let cell = self.cell(vertex)?;

        let mut inputs = Ports::new();
        for edge in self.incoming_edges(vertex) {
            match edge.pop_front() {
                Some(value) => inputs.set(edge.to_port.clone(), value),
                None => {
                    // A fire is dispatched only after readiness was
                    // observed, and nothing but this fire pops these
                    // edges. An empty edge here means the scheduling
                    // invariant is broken and graph state is untrustworthy.
                    tracing::error!(
                        vertex = %vertex,
                        module = %cell.name,
                        port = %edge.to_port,
                        "input edge empty at fire"
                    );
                    std::process::abort();
                }
            }
        }

        let mut outputs = Ports::new();
        let start = cpu_ticks();
        let result = {
            let mut module = cell.module.lock();
            module.process(&inputs, &mut outputs)
        };
        let elapsed = cpu_ticks().saturating_sub(start);

        result.with_module(vertex, &cell.name)?;
        cell.stats.lock().record(elapsed);

        for edge in self.outgoing_edges(vertex) {
            let value = outputs
                .get(&edge.from_port)
                .cloned()
                .ok_or_else(|| DrayError::MissingOutput {
                    vertex,
                    module: cell.name.clone(),
                    port: edge.from_port.clone(),
                })?;
            edge.push_back(value);
        }

        Ok(())
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("vertices", &self.vertices.len())
            .field("edges", &self.edges.len())
            .finish()
    }
}
