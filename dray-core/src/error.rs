//! Error types for dray.
//!
//! This module provides strongly-typed errors with actionable context.
//! Errors carry the identifiers (vertex ID, module name) needed to locate
//! the failing part of a graph from a log line alone.

use crate::types::VertexId;
use thiserror::Error;

/// The main error type for dray operations.
#[derive(Error, Debug)]
pub enum DrayError {
    // =========================================================================
    // Graph/Topology Errors (E001-E099)
    // =========================================================================
    /// A vertex ID does not exist in the graph.
    #[error("E001: Unknown vertex {vertex}")]
    UnknownVertex {
        /// The vertex that was not found.
        vertex: VertexId,
    },

    /// An input port already has a producer connected to it.
    #[error("E002: Input port '{port}' on {vertex} already has a producer")]
    InputAlreadyConnected {
        /// The consumer vertex.
        vertex: VertexId,
        /// The input port with two producers.
        port: String,
    },

    // =========================================================================
    // Module Execution Errors (E100-E199)
    // =========================================================================
    /// A module's process call returned an error.
    #[error("E101: Module '{module}' ({vertex}) failed: {cause}")]
    ModuleFailed {
        /// The vertex that failed to fire.
        vertex: VertexId,
        /// The module's reported name.
        module: String,
        /// Reason for the failure.
        cause: String,
    },

    /// A module's process call panicked.
    #[error("E102: Module '{module}' ({vertex}) panicked: {message}")]
    ModulePanicked {
        /// The vertex whose fire panicked.
        vertex: VertexId,
        /// The module's reported name.
        module: String,
        /// The panic message.
        message: String,
    },

    /// A module did not produce a value for a connected output port.
    #[error("E103: Module '{module}' ({vertex}) produced no value for output port '{port}'")]
    MissingOutput {
        /// The vertex that fired.
        vertex: VertexId,
        /// The module's reported name.
        module: String,
        /// The output port left empty.
        port: String,
    },

    // =========================================================================
    // Scheduler Errors (E200-E299)
    // =========================================================================
    /// A worker thread could not be spawned.
    #[error("E201: Failed to spawn worker thread: {cause}")]
    WorkerSpawn {
        /// Reason for the spawn failure.
        cause: String,
    },

    /// A scheduler task panicked outside of a module fire.
    #[error("E202: Worker '{thread}' panicked: {message}")]
    WorkerPanicked {
        /// Name of the worker thread.
        thread: String,
        /// The panic message.
        message: String,
    },

    // =========================================================================
    // Configuration Errors (E300-E399)
    // =========================================================================
    /// Invalid configuration value.
    #[error("E301: Invalid configuration '{field}': {cause}")]
    ConfigValue {
        /// The configuration field with an invalid value.
        field: String,
        /// Description of why the value is invalid.
        cause: String,
    },
}

impl DrayError {
    /// Get the error code (e.g., "E101").
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownVertex { .. } => "E001",
            Self::InputAlreadyConnected { .. } => "E002",
            Self::ModuleFailed { .. } => "E101",
            Self::ModulePanicked { .. } => "E102",
            Self::MissingOutput { .. } => "E103",
            Self::WorkerSpawn { .. } => "E201",
            Self::WorkerPanicked { .. } => "E202",
            Self::ConfigValue { .. } => "E301",
        }
    }

    /// Check if this error originated inside a module's process call.
    #[must_use]
    pub fn is_module_failure(&self) -> bool {
        matches!(
            self,
            Self::ModuleFailed { .. } | Self::ModulePanicked { .. } | Self::MissingOutput { .. }
        )
    }

    /// The vertex this error is attached to, if any.
    #[must_use]
    pub fn vertex(&self) -> Option<VertexId> {
        match self {
            Self::UnknownVertex { vertex }
            | Self::InputAlreadyConnected { vertex, .. }
            | Self::ModuleFailed { vertex, .. }
            | Self::ModulePanicked { vertex, .. }
            | Self::MissingOutput { vertex, .. } => Some(*vertex),
            _ => None,
        }
    }
}

/// Result type alias using `DrayError`.
pub type Result<T> = std::result::Result<T, DrayError>;

/// Extension trait for adding module context to errors.
pub trait ResultExt<T> {
    /// Wrap an error as a failure of the named module at `vertex`.
    fn with_module(self, vertex: VertexId, module: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for std::result::Result<T, E> {
    fn with_module(self, vertex: VertexId, module: &str) -> Result<T> {
        self.map_err(|e| DrayError::ModuleFailed {
            vertex,
            module: module.to_string(),
            cause: e.to_string(),
        })
    }
}
