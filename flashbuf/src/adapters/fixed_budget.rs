//! Fixed memory budget.

extern crate alloc;
use alloc::boxed::Box;

use crate::domain::{MemoryBudget, heap_allocate};

/// Memory budget that reports a constant amount of free memory.
///
/// Useful where the platform has no free-heap query, or to pin the buffer
/// size on the host. [`FixedBudget::without_allocation`] refuses every
/// buffer, which puts sessions into passthrough mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedBudget {
    free: usize,
    allocate: bool,
}

impl FixedBudget {
    /// Report `free` bytes and allocate buffers from the heap.
    pub const fn new(free: usize) -> Self {
        Self {
            free,
            allocate: true,
        }
    }

    /// Report `free` bytes but never hand out a buffer.
    pub const fn without_allocation(free: usize) -> Self {
        Self {
            free,
            allocate: false,
        }
    }
}

impl MemoryBudget for FixedBudget {
    fn free_memory(&self) -> usize {
        self.free
    }

    fn try_allocate(&self, capacity: usize) -> Option<Box<[u8]>> {
        if !self.allocate {
            return None;
        }
        heap_allocate(capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_budget_reports_free_memory() {
        let budget = FixedBudget::new(20_000);
        assert_eq!(budget.free_memory(), 20_000);
        assert_eq!(budget.try_allocate(4096).map(|b| b.len()), Some(4096));
    }

    #[test]
    fn test_without_allocation_refuses() {
        let budget = FixedBudget::without_allocation(1 << 20);
        assert_eq!(budget.free_memory(), 1 << 20);
        assert!(budget.try_allocate(4096).is_none());
    }
}
