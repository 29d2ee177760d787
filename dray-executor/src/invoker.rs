//! Per-vertex dispatch: readiness polling, firing, and respawn.

use crate::pool::RunContext;
use dray_core::error::DrayError;
use dray_core::types::VertexId;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Drives one vertex for the duration of a run.
///
/// An invoker has two self-posting actions. `check` evaluates the
/// readiness predicate: ready vertices get a `fire` dispatched (through
/// the module's strand executor when it has one), not-ready vertices
/// repost `check` to the back of the work queue and yield. `fire` runs the
/// module once and then either reposts `check` or tells the driver this
/// vertex is done. At most one action per invoker is ever in flight, which
/// is what makes the per-vertex state single-writer.
pub(crate) struct Invoker {
    ctx: Arc<RunContext>,
    vertex: VertexId,
    calls: AtomicU64,
}

impl Invoker {
    pub(crate) fn new(ctx: Arc<RunContext>, vertex: VertexId) -> Arc<Self> {
        Arc::new(Self {
            ctx,
            vertex,
            calls: AtomicU64::new(0),
        })
    }

    /// Post the readiness check to the work queue.
    pub(crate) fn post_check(self: &Arc<Self>) {
        let this = Arc::clone(self);
        self.ctx.work.post_fn(move || this.check());
    }

    fn check(self: Arc<Self>) {
        // Consult the policy while polling too, so an externally stopped
        // module parks even if its inputs never arrive again.
        let calls = self.calls.load(Ordering::Relaxed);
        if !self.ctx.policy.should_respawn(calls) {
            tracing::debug!(vertex = %self.vertex, calls, "invoker retired while polling");
            self.ctx.notify_quiesced();
            return;
        }

        if !self.ctx.graph.is_ready(self.vertex) {
            self.post_check();
            return;
        }

        let strand = match self.ctx.graph.strand_of(self.vertex) {
            Ok(strand) => strand,
            Err(err) => {
                self.ctx.report_error(err);
                return;
            }
        };

        let this = Arc::clone(&self);
        let fire = Box::new(move || this.fire());
        match strand {
            Some(key) => self.ctx.strand_queue(key).post(fire),
            None => self.ctx.work.post(fire),
        }
    }

    fn fire(self: Arc<Self>) {
        tracing::trace!(vertex = %self.vertex, "fire");
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.ctx.graph.fire(self.vertex)));

        match result {
            Ok(Ok(())) => {
                let calls = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
                if self.ctx.policy.should_respawn(calls) {
                    self.post_check();
                } else {
                    tracing::debug!(vertex = %self.vertex, calls, "invoker retired");
                    self.ctx.notify_quiesced();
                }
            }
            Ok(Err(err)) => self.ctx.report_error(err),
            Err(payload) => {
                let module = self
                    .ctx
                    .graph
                    .module_name(self.vertex)
                    .unwrap_or("<unknown>")
                    .to_string();
                self.ctx.report_error(DrayError::ModulePanicked {
                    vertex: self.vertex,
                    module,
                    message: panic_message(payload.as_ref()),
                });
            }
        }
    }
}

/// Best-effort extraction of a panic payload's message.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_message_extracts_strings() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("static message");
        assert_eq!(panic_message(payload.as_ref()), "static message");

        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(payload.as_ref()), "owned message");

        let payload: Box<dyn std::any::Any + Send> = Box::new(17u32);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic payload");
    }
}
