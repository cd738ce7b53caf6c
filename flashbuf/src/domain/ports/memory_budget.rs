//! MemoryBudget port - how much RAM a session may claim.

extern crate alloc;
use alloc::{boxed::Box, vec::Vec};

/// Port for the free-memory signal used to size write buffers.
///
/// `free_memory` is consulted exactly once per `open()`. `try_allocate` is
/// the allocation seam: the default asks the global allocator without
/// aborting on failure, and a `None` sends the session into passthrough
/// mode.
pub trait MemoryBudget {
    /// Bytes of memory currently available.
    fn free_memory(&self) -> usize;

    /// Allocate a zeroed buffer of exactly `capacity` bytes.
    ///
    /// Returns `None` when the memory cannot be obtained.
    fn try_allocate(&self, capacity: usize) -> Option<Box<[u8]>> {
        heap_allocate(capacity)
    }
}

/// Fallible zeroed heap allocation of exactly `capacity` bytes.
pub fn heap_allocate(capacity: usize) -> Option<Box<[u8]>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(capacity).ok()?;
    buf.resize(capacity, 0);
    Some(buf.into_boxed_slice())
}

impl<M: MemoryBudget + ?Sized> MemoryBudget for &M {
    fn free_memory(&self) -> usize {
        M::free_memory(self)
    }

    fn try_allocate(&self, capacity: usize) -> Option<Box<[u8]>> {
        M::try_allocate(self, capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plenty;

    impl MemoryBudget for Plenty {
        fn free_memory(&self) -> usize {
            1 << 20
        }
    }

    #[test]
    fn test_default_allocation_is_exact_and_zeroed() {
        let buf = Plenty.try_allocate(8192).unwrap();
        assert_eq!(buf.len(), 8192);
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_default_allocation_reports_impossible_sizes() {
        assert!(Plenty.try_allocate(usize::MAX).is_none());
    }

    #[test]
    fn test_reference_forwards() {
        let budget = &Plenty;
        assert_eq!(budget.free_memory(), 1 << 20);
    }
}
