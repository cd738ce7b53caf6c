//! Writer configuration value object.

/// What `open()` does when the storage backend refuses to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OpenFailurePolicy {
    /// Report the failure but keep the session active without a stream.
    ///
    /// Writes are still accepted and buffered; flushes that have no stream
    /// to go to are dropped and counted in `SessionStats::bytes_dropped`.
    #[default]
    Proceed,
    /// Report the failure and leave the writer closed.
    Reject,
}

/// Configuration for a [`BufferedWriter`](crate::domain::BufferedWriter).
///
/// # Examples
///
/// ```
/// use flashbuf::domain::{OpenFailurePolicy, WriterConfig};
///
/// let config = WriterConfig::new()
///     .with_preferred_size(16 * 1024)
///     .with_open_failure(OpenFailurePolicy::Reject);
/// assert_eq!(config.preferred_size(), 16 * 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WriterConfig {
    preferred_size: usize,
    open_failure: OpenFailurePolicy,
}

impl WriterConfig {
    /// Default configuration: no size preference, proceed on open failure.
    pub const fn new() -> Self {
        Self {
            preferred_size: 0,
            open_failure: OpenFailurePolicy::Proceed,
        }
    }

    /// Set the preferred buffer size in bytes (0 means no preference).
    ///
    /// The session never gets more than half of the free memory reported at
    /// open time, whatever is asked for here.
    pub const fn with_preferred_size(mut self, bytes: usize) -> Self {
        self.preferred_size = bytes;
        self
    }

    /// Set the policy applied when the backend fails to open.
    pub const fn with_open_failure(mut self, policy: OpenFailurePolicy) -> Self {
        self.open_failure = policy;
        self
    }

    /// Preferred buffer size in bytes.
    #[inline]
    pub const fn preferred_size(&self) -> usize {
        self.preferred_size
    }

    /// Policy applied when the backend fails to open.
    #[inline]
    pub const fn open_failure(&self) -> OpenFailurePolicy {
        self.open_failure
    }
}
