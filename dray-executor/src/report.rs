//! End-of-run execution report.
//!
//! Printed to stdout on clean completion; also returned from `execute*` so
//! hosts and tests can inspect the numbers directly.

use dray_core::graph::Graph;
use std::fmt;
use std::time::Duration;

/// Per-module line of the report.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleReport {
    /// The module's reported name.
    pub name: String,
    /// Completed process calls.
    pub ncalls: u64,
    /// Cumulative CPU ticks spent in process calls.
    pub ticks: u64,
    /// Share of the run's total CPU ticks, in percent.
    pub percent: f64,
}

/// Summary of one clean execution.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    /// Number of worker threads the run used.
    pub threads: usize,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
    /// CPU ticks elapsed across the whole run.
    pub total_ticks: u64,
    /// One entry per vertex, in vertex-ID order.
    pub modules: Vec<ModuleReport>,
    /// Sum of the per-module percentages.
    pub total_percent: f64,
    /// Total percentage divided by the thread count.
    pub per_thread_percent: f64,
}

impl ExecutionReport {
    /// Snapshot the graph's stats into a report.
    pub(crate) fn collect(
        graph: &Graph,
        threads: usize,
        elapsed: Duration,
        total_ticks: u64,
    ) -> Self {
        let mut modules = Vec::with_capacity(graph.vertex_count());
        let mut total_percent = 0.0;

        for vertex in graph.vertex_ids() {
            let stats = graph.stats(vertex).unwrap_or_default();
            let name = graph.module_name(vertex).unwrap_or("<unknown>").to_string();
            let percent = if total_ticks == 0 {
                0.0
            } else {
                100.0 * stats.total_ticks as f64 / total_ticks as f64
            };
            total_percent += percent;
            modules.push(ModuleReport {
                name,
                ncalls: stats.ncalls,
                ticks: stats.total_ticks,
                percent,
            });
        }

        let per_thread_percent = if threads == 0 {
            0.0
        } else {
            total_percent / threads as f64
        };

        Self {
            threads,
            elapsed,
            total_ticks,
            modules,
            total_percent,
            per_thread_percent,
        }
    }

    /// Find a module's line by name. First match wins on duplicate names.
    #[must_use]
    pub fn module(&self, name: &str) -> Option<&ModuleReport> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Sum of every module's call count.
    #[must_use]
    pub fn total_calls(&self) -> u64 {
        self.modules.iter().map(|m| m.ncalls).sum()
    }
}

impl fmt::Display for ExecutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "****************************************")?;
        for module in &self.modules {
            writeln!(
                f,
                ">>> {:>25} calls: {}  cpu ticks: {:>12} ({:.6}%)",
                module.name, module.ncalls, module.ticks, module.percent
            )?;
        }
        writeln!(f, "**********************************************")?;
        writeln!(f, "threads:          {}", self.threads)?;
        writeln!(f, "elapsed time:     {:?}", self.elapsed)?;
        writeln!(f, "cpu ticks:        {}", self.total_ticks)?;
        writeln!(f, "percentage total: {:.6}%", self.total_percent)?;
        write!(f, "per-thread:       {:.6}%", self.per_thread_percent)
    }
}
