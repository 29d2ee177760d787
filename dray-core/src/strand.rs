//! Strand keys for serializing module fires.
//!
//! A strand is an opaque mutual-exclusion key. Modules returning the same
//! strand from [`Module::strand`](crate::module::Module::strand) never fire
//! concurrently; modules on distinct strands (or none) are unconstrained.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_STRAND: AtomicU64 = AtomicU64::new(0);

/// An opaque serial-execution key.
///
/// Strand values are cheap to copy and compare; allocate one with
/// [`Strand::new`] and share it between the modules that must not overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Strand(u64);

impl Strand {
    /// Allocate a fresh strand key, distinct from every other allocated key.
    #[must_use]
    pub fn new() -> Self {
        Self(NEXT_STRAND.fetch_add(1, Ordering::Relaxed))
    }

    /// Create a strand from a raw key value.
    ///
    /// Useful when the host assigns its own key space. Raw keys and
    /// [`Strand::new`] keys share one namespace, so mixing the two can
    /// accidentally serialize unrelated modules.
    #[must_use]
    pub const fn from_raw(key: u64) -> Self {
        Self(key)
    }
}

impl Default for Strand {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "strand_{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strands_are_unique() {
        let a = Strand::new();
        let b = Strand::new();
        assert_ne!(a, b);
    }

    #[test]
    fn copies_are_equal() {
        let a = Strand::new();
        let b = a;
        assert_eq!(a, b);
    }

    #[test]
    fn strand_display() {
        let s = Strand::from_raw(12);
        assert_eq!(format!("{}", s), "strand_12");
    }
}
