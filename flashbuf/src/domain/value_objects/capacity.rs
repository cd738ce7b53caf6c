//! Buffer capacity value object and the sizing rule behind it.

use core::fmt;

/// Flush granularity in bytes.
///
/// Assumed to match the erase block of the underlying medium (4KB on most
/// SPI NOR parts). Every flush issued while writing is a whole number of
/// these, except in the small-memory fallback described on [`Capacity::plan`].
pub const CHUNK_SIZE: usize = 4096;

/// Size of a session's write buffer in bytes.
///
/// Computed once per session by [`Capacity::plan`] and fixed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Capacity(usize);

impl Capacity {
    /// A capacity of zero bytes. Sessions with this capacity never buffer.
    pub const ZERO: Self = Self(0);

    /// Derive the buffer capacity from a preferred size and the currently
    /// free memory.
    ///
    /// The rules, in order:
    ///
    /// 1. A `preferred` of 0 means "no preference" and becomes half of `free_memory`.
    /// 2. The result never exceeds half of `free_memory`.
    /// 3. It is rounded down to a multiple of [`CHUNK_SIZE`].
    /// 4. If rounding leaves nothing, it falls back to
    ///    `min(CHUNK_SIZE, free_memory / 2)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use flashbuf::domain::Capacity;
    ///
    /// // No preference, 20000 bytes free: half is 10000, rounded down to 8192.
    /// assert_eq!(Capacity::plan(0, 20_000).bytes(), 8192);
    ///
    /// // A tiny preference is lifted to one chunk when memory allows.
    /// assert_eq!(Capacity::plan(100, 1 << 20).bytes(), 4096);
    ///
    /// // Below one chunk of headroom the fallback is half the free memory.
    /// assert_eq!(Capacity::plan(0, 5000).bytes(), 2500);
    /// ```
    pub const fn plan(preferred: usize, free_memory: usize) -> Self {
        let half = free_memory / 2;
        let preferred = if preferred == 0 { half } else { preferred };
        let capped = if preferred < half { preferred } else { half };

        let aligned = capped - capped % CHUNK_SIZE;
        if aligned == 0 {
            let fallback = if CHUNK_SIZE < half { CHUNK_SIZE } else { half };
            return Self(fallback);
        }
        Self(aligned)
    }

    /// Wrap an exact byte count.
    #[inline]
    pub const fn from_bytes(bytes: usize) -> Self {
        Self(bytes)
    }

    /// Capacity in bytes.
    #[inline]
    pub const fn bytes(&self) -> usize {
        self.0
    }

    /// True for a zero-byte capacity.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// True when the capacity is a whole number of chunks (zero included).
    #[inline]
    pub const fn is_chunk_aligned(&self) -> bool {
        self.0 % CHUNK_SIZE == 0
    }

    /// Number of whole chunks held by this capacity.
    #[inline]
    pub const fn chunks(&self) -> usize {
        self.0 / CHUNK_SIZE
    }
}

impl From<Capacity> for usize {
    fn from(capacity: Capacity) -> usize {
        capacity.0
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_without_preference_uses_half_of_free_memory() {
        let capacity = Capacity::plan(0, 20_000);
        assert_eq!(capacity.bytes(), 8192);
        assert!(capacity.is_chunk_aligned());
        assert_eq!(capacity.chunks(), 2);
    }

    #[test]
    fn test_plan_preference_is_capped_by_half_free_memory() {
        // Asking for 1MB with 64KB free only gets 32KB.
        let capacity = Capacity::plan(1024 * 1024, 64 * 1024);
        assert_eq!(capacity.bytes(), 32 * 1024);
    }

    #[test]
    fn test_plan_preference_below_half_is_honoured() {
        let capacity = Capacity::plan(16 * 1024, 1024 * 1024);
        assert_eq!(capacity.bytes(), 16 * 1024);
    }

    #[test]
    fn test_plan_rounds_down_to_chunk() {
        let capacity = Capacity::plan(10_000, 1024 * 1024);
        assert_eq!(capacity.bytes(), 8192);
    }

    #[test]
    fn test_plan_small_preference_falls_back_to_one_chunk() {
        let capacity = Capacity::plan(100, 1024 * 1024);
        assert_eq!(capacity.bytes(), CHUNK_SIZE);
    }

    #[test]
    fn test_plan_small_memory_falls_back_below_one_chunk() {
        let capacity = Capacity::plan(0, 5000);
        assert_eq!(capacity.bytes(), 2500);
        assert!(!capacity.is_chunk_aligned());
    }

    #[test]
    fn test_plan_with_no_memory_is_zero() {
        assert!(Capacity::plan(0, 0).is_zero());
        assert!(Capacity::plan(4096, 1).is_zero());
    }

    #[test]
    fn test_plan_is_always_aligned_or_fallback() {
        for free in [0usize, 1, 4095, 8191, 8192, 8193, 20_000, 100_000, 1 << 20] {
            for preferred in [0usize, 1, 4096, 5000, 12_288, 1 << 30] {
                let capacity = Capacity::plan(preferred, free);
                assert!(capacity.bytes() <= free / 2);
                assert!(
                    capacity.is_chunk_aligned() || capacity.bytes() == free / 2,
                    "preferred={} free={} -> {}",
                    preferred,
                    free,
                    capacity
                );
            }
        }
    }

    #[test]
    fn test_capacity_display() {
        assert_eq!(format!("{}", Capacity::from_bytes(4096)), "4096 bytes");
    }
}
