//! Module trait and the port map exchanged across a fire.

use crate::error::Result;
use crate::strand::Strand;
use crate::value::Value;
use std::collections::HashMap;

/// Named-port value map.
///
/// On each fire the graph pops one value from every connected input edge
/// into a `Ports` keyed by the edge's consumer port name, and collects one
/// value per connected output port name from the module afterwards.
#[derive(Debug, Default, Clone)]
pub struct Ports(HashMap<String, Value>);

impl Ports {
    /// Create an empty port map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value on a port, replacing any previous value.
    pub fn set(&mut self, port: impl Into<String>, value: Value) {
        self.0.insert(port.into(), value);
    }

    /// Get the value on a port.
    #[must_use]
    pub fn get(&self, port: &str) -> Option<&Value> {
        self.0.get(port)
    }

    /// Remove and return the value on a port.
    pub fn take(&mut self, port: &str) -> Option<Value> {
        self.0.remove(port)
    }

    /// Number of populated ports.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether no port holds a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(port, value)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// The core trait for all dray modules.
///
/// A module is the computation at one vertex of the graph. The scheduler
/// fires it only when every input edge holds a value and every output edge
/// is drained, so `process` always sees exactly one value per connected
/// input port and must leave exactly one value per connected output port.
///
/// # Example
///
/// ```ignore
/// use dray_core::prelude::*;
///
/// struct Doubler;
///
/// impl Module for Doubler {
///     fn name(&self) -> &str {
///         "doubler"
///     }
///
///     fn process(&mut self, inputs: &Ports, outputs: &mut Ports) -> Result<()> {
///         let n = inputs.get("in").and_then(Value::as_i64).unwrap_or(0);
///         outputs.set("out", Value::int(n * 2));
///         Ok(())
///     }
/// }
/// ```
pub trait Module: Send {
    /// Human-readable name, stable for the module's lifetime. Used in
    /// error messages and the end-of-run report.
    fn name(&self) -> &str;

    /// The serial-execution key for this module, if any.
    ///
    /// Modules returning the same [`Strand`] never fire concurrently.
    /// Read once at graph insertion; must not change afterwards.
    fn strand(&self) -> Option<Strand> {
        None
    }

    /// Perform one unit of work.
    ///
    /// Reads one value per connected input port from `inputs` and must set
    /// one value per connected output port on `outputs`. Returning an
    /// error is fatal to the whole run.
    fn process(&mut self, inputs: &Ports, outputs: &mut Ports) -> Result<()>;
}
