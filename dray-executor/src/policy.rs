//! Respawn policies: when does a module get rescheduled after a fire.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Decides, after each fire, whether an invoker reposts itself.
///
/// The policy is evaluated against the invoker's post-increment call
/// count. It is also consulted while an invoker polls for readiness, so an
/// externally stopped module parks even if it never becomes ready again.
#[derive(Debug, Clone)]
pub enum RunPolicy {
    /// Reschedule after every fire; the run only ends on failure.
    Forever,
    /// Reschedule while the module's call count is strictly below the limit.
    Bounded(u64),
    /// Reschedule until the shared flag is raised by the host.
    UntilStopped(Arc<AtomicBool>),
}

impl RunPolicy {
    /// Should a module with `ncalls` completed fires be rescheduled?
    #[must_use]
    pub fn should_respawn(&self, ncalls: u64) -> bool {
        match self {
            Self::Forever => true,
            Self::Bounded(limit) => ncalls < *limit,
            Self::UntilStopped(flag) => !flag.load(Ordering::Acquire),
        }
    }
}
