//! Common test utilities for integration tests.

#![allow(dead_code)]

use dray_core::error::{DrayError, Result};
use dray_core::graph::Graph;
use dray_core::module::{Module, Ports};
use dray_core::strand::Strand;
use dray_core::types::VertexId;
use dray_core::value::Value;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Emits sequential integers on "out".
pub struct CounterSource {
    next: i64,
}

impl CounterSource {
    pub fn new() -> Self {
        Self { next: 0 }
    }
}

impl Module for CounterSource {
    fn name(&self) -> &str {
        "source"
    }

    fn process(&mut self, _inputs: &Ports, outputs: &mut Ports) -> Result<()> {
        outputs.set("out", Value::int(self.next));
        self.next += 1;
        Ok(())
    }
}

/// Copies "in" to "out".
pub struct Relay;

impl Module for Relay {
    fn name(&self) -> &str {
        "relay"
    }

    fn process(&mut self, inputs: &Ports, outputs: &mut Ports) -> Result<()> {
        let value = inputs.get("in").cloned().unwrap_or(Value::null());
        outputs.set("out", value);
        Ok(())
    }
}

/// Records every value arriving on "in".
pub struct CollectingSink {
    seen: Arc<Mutex<Vec<Value>>>,
}

impl CollectingSink {
    pub fn new(seen: Arc<Mutex<Vec<Value>>>) -> Self {
        Self { seen }
    }
}

impl Module for CollectingSink {
    fn name(&self) -> &str {
        "sink"
    }

    fn process(&mut self, inputs: &Ports, _outputs: &mut Ports) -> Result<()> {
        if let Some(value) = inputs.get("in") {
            self.seen.lock().push(value.clone());
        }
        Ok(())
    }
}

/// Consumes two inputs ("in_b" and "in_c") and produces nothing.
pub struct JoinSink;

impl Module for JoinSink {
    fn name(&self) -> &str {
        "join"
    }

    fn process(&mut self, _inputs: &Ports, _outputs: &mut Ports) -> Result<()> {
        Ok(())
    }
}

/// Relays "in" to "out", failing on its `fail_on`-th call.
pub struct FailingRelay {
    fail_on: u64,
    calls: u64,
}

impl FailingRelay {
    pub fn new(fail_on: u64) -> Self {
        Self { fail_on, calls: 0 }
    }
}

impl Module for FailingRelay {
    fn name(&self) -> &str {
        "failing"
    }

    fn process(&mut self, inputs: &Ports, outputs: &mut Ports) -> Result<()> {
        self.calls += 1;
        if self.calls == self.fail_on {
            return Err(DrayError::ConfigValue {
                field: "fail_on".to_string(),
                cause: format!("deliberate failure on call {}", self.calls),
            });
        }
        let value = inputs.get("in").cloned().unwrap_or(Value::null());
        outputs.set("out", value);
        Ok(())
    }
}

/// Relays "in" to "out" and panics on its `panic_on`-th call.
pub struct PanickingRelay {
    panic_on: u64,
    calls: u64,
}

impl PanickingRelay {
    pub fn new(panic_on: u64) -> Self {
        Self { panic_on, calls: 0 }
    }
}

impl Module for PanickingRelay {
    fn name(&self) -> &str {
        "panicking"
    }

    fn process(&mut self, inputs: &Ports, outputs: &mut Ports) -> Result<()> {
        self.calls += 1;
        assert!(self.calls != self.panic_on, "deliberate panic");
        let value = inputs.get("in").cloned().unwrap_or(Value::null());
        outputs.set("out", value);
        Ok(())
    }
}

/// Relays "in" to "out", stamping entry/exit times and holding the fire
/// open briefly so overlapping executions would be observable.
pub struct StampedRelay {
    name: String,
    strand: Option<Strand>,
    stamps: Arc<Mutex<Vec<(Instant, Instant)>>>,
    hold: Duration,
}

impl StampedRelay {
    pub fn new(
        name: impl Into<String>,
        strand: Option<Strand>,
        stamps: Arc<Mutex<Vec<(Instant, Instant)>>>,
        hold: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            strand,
            stamps,
            hold,
        }
    }
}

impl Module for StampedRelay {
    fn name(&self) -> &str {
        &self.name
    }

    fn strand(&self) -> Option<Strand> {
        self.strand
    }

    fn process(&mut self, inputs: &Ports, outputs: &mut Ports) -> Result<()> {
        let entry = Instant::now();
        thread::sleep(self.hold);
        let value = inputs.get("in").cloned().unwrap_or(Value::null());
        outputs.set("out", value);
        self.stamps.lock().push((entry, Instant::now()));
        Ok(())
    }
}

/// Build source -> relay -> ... -> sink with `relays` relay stages.
/// Returns the graph, the vertex ids in order, and the sink's collected
/// values.
pub fn build_chain(relays: usize) -> (Graph, Vec<VertexId>, Arc<Mutex<Vec<Value>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut graph = Graph::new();
    let mut ids = Vec::new();

    let source = graph.insert(Box::new(CounterSource::new()));
    ids.push(source);

    let mut prev = source;
    for _ in 0..relays {
        let relay = graph.insert(Box::new(Relay));
        graph.connect(prev, "out", relay, "in").unwrap();
        ids.push(relay);
        prev = relay;
    }

    let sink = graph.insert(Box::new(CollectingSink::new(Arc::clone(&seen))));
    graph.connect(prev, "out", sink, "in").unwrap();
    ids.push(sink);

    (graph, ids, seen)
}

/// Build the diamond A -> B, A -> C, B -> D, C -> D.
pub fn build_diamond() -> (Graph, [VertexId; 4]) {
    let mut graph = Graph::new();
    let a = graph.insert(Box::new(CounterSource::new()));
    let b = graph.insert(Box::new(Relay));
    let c = graph.insert(Box::new(Relay));
    let d = graph.insert(Box::new(JoinSink));

    graph.connect(a, "out", b, "in").unwrap();
    graph.connect(a, "out", c, "in").unwrap();
    graph.connect(b, "out", d, "in_b").unwrap();
    graph.connect(c, "out", d, "in_c").unwrap();

    (graph, [a, b, c, d])
}
