//! Per-module execution statistics and the tick clock.

/// Call count and cumulative CPU-tick cost for one module.
///
/// Stats are reset at the start of every execution and written only from
/// the thread currently firing the module, so no atomics are needed here;
/// the owning vertex keeps the record behind its own lock.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ModuleStats {
    /// Number of completed process calls.
    pub ncalls: u64,
    /// Total CPU ticks spent inside process calls.
    pub total_ticks: u64,
}

impl ModuleStats {
    /// Create a zeroed stats record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed process call costing `ticks`.
    pub fn record(&mut self, ticks: u64) {
        self.ncalls += 1;
        self.total_ticks += ticks;
    }

    /// Reset both counters to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Read the CPU tick counter.
///
/// On x86_64 this is the time-stamp counter; elsewhere it falls back to
/// monotonic nanoseconds. Only differences between two readings on the
/// same host are meaningful.
#[cfg(target_arch = "x86_64")]
#[must_use]
pub fn cpu_ticks() -> u64 {
    // SAFETY: RDTSC has no preconditions and is available on every x86_64
    // target this crate builds for.
    unsafe { core::arch::x86_64::_rdtsc() }
}

/// Read the CPU tick counter.
///
/// On x86_64 this is the time-stamp counter; elsewhere it falls back to
/// monotonic nanoseconds. Only differences between two readings on the
/// same host are meaningful.
#[cfg(not(target_arch = "x86_64"))]
#[must_use]
pub fn cpu_ticks() -> u64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static EPOCH: OnceLock<Instant> = OnceLock::new();
    let epoch = EPOCH.get_or_init(Instant::now);
    u64::try_from(epoch.elapsed().as_nanos()).unwrap_or(u64::MAX)
}
