//! BufferedWriter domain service - coalesces small writes into chunk-sized flushes.
//!
//! This module contains the `BufferedWriter` service which owns the session
//! lifecycle: sizing the buffer at open, splitting writes across flushes,
//! and flushing the remainder at close or drop.

extern crate alloc;
use alloc::string::String;

use crate::domain::{
    entities::{Session, SessionStats, WriteMode},
    error::WriterError,
    ports::{MemoryBudget, StorageBackend},
    value_objects::{Capacity, OpenFailurePolicy, WriterConfig},
};

/// Write buffer in front of wear-limited storage.
///
/// Small writes are collected in RAM and reach the backend as whole-buffer
/// writes; only the final flush at [`close`](Self::close) may be shorter.
/// The buffer is sized when a session opens, from the configured preference
/// and the free memory reported by the [`MemoryBudget`], and is never larger
/// than half of that free memory. If it cannot be allocated the session runs
/// in [`WriteMode::Passthrough`] and forwards each write as it comes.
///
/// One writer runs one session at a time and can be reopened after
/// [`close`](Self::close). Dropping a writer with an open session closes it.
///
/// # Type Parameters
///
/// - `B`: The storage backend (must implement `StorageBackend`)
/// - `M`: The free-memory signal (must implement `MemoryBudget`)
///
/// # Examples
///
/// ```
/// use flashbuf::adapters::{FixedBudget, MemoryBackend};
/// use flashbuf::domain::{BufferedWriter, WriteMode};
///
/// let mut backend = MemoryBackend::new();
/// {
///     let mut writer = BufferedWriter::new(&mut backend, FixedBudget::new(20_000));
///     writer.open("samples.csv").unwrap();
///     assert_eq!(writer.mode(), Some(WriteMode::Buffered));
///     assert_eq!(writer.capacity().bytes(), 8192);
///
///     writer.write(b"410nm,0.12\n").unwrap();
///     assert_eq!(writer.close().unwrap(), 11);
/// }
/// assert_eq!(backend.contents("samples.csv"), Some(&b"410nm,0.12\n"[..]));
/// ```
pub struct BufferedWriter<B: StorageBackend, M: MemoryBudget> {
    backend: B,
    budget: M,
    config: WriterConfig,
    session: Option<Session<B::Handle>>,
    last_stats: Option<SessionStats>,
}

impl<B: StorageBackend, M: MemoryBudget> BufferedWriter<B, M> {
    /// Create a closed writer with the default configuration.
    pub fn new(backend: B, budget: M) -> Self {
        Self::with_config(backend, budget, WriterConfig::new())
    }

    /// Create a closed writer with the given configuration.
    pub fn with_config(backend: B, budget: M, config: WriterConfig) -> Self {
        Self {
            backend,
            budget,
            config,
            session: None,
            last_stats: None,
        }
    }

    /// Start a session writing to `path`.
    ///
    /// Sizes and allocates the buffer, then opens the backend whether or not
    /// the allocation worked.
    ///
    /// Opening while a session is already active is the caller's mistake:
    /// the earlier session is discarded without flushing, and its handle is
    /// released without going through the backend.
    ///
    /// # Errors
    ///
    /// Returns [`WriterError::Open`] if the backend cannot open `path`. With
    /// [`OpenFailurePolicy::Proceed`] (the default) the session is active
    /// anyway and accepts writes; with [`OpenFailurePolicy::Reject`] the
    /// writer stays closed.
    pub fn open(&mut self, path: &str) -> Result<(), WriterError<B::Error>> {
        if let Some(previous) = self.session.take() {
            warn!(
                "{}: reopened while active, discarding {} buffered bytes",
                previous.path(),
                previous.filled()
            );
        }

        let free_memory = self.budget.free_memory();
        let capacity = Capacity::plan(self.config.preferred_size(), free_memory);

        let buffer = if capacity.is_zero() {
            None
        } else {
            self.budget
                .try_allocate(capacity.bytes())
                .filter(|buf| buf.len() == capacity.bytes())
        };
        if buffer.is_none() {
            warn!(
                "{}: no {} byte buffer ({} bytes free), writing through",
                path,
                capacity.bytes(),
                free_memory
            );
        }

        let (handle, outcome) = match self.backend.open(path) {
            Ok(handle) => (Some(handle), Ok(())),
            Err(e) => {
                warn!("{}: storage open failed", path);
                if self.config.open_failure() == OpenFailurePolicy::Reject {
                    return Err(WriterError::Open(e));
                }
                (None, Err(WriterError::Open(e)))
            }
        };

        let session = Session::new(String::from(path), capacity, buffer, handle);
        debug!(
            "{}: opened with {} byte buffer ({} bytes free)",
            path,
            capacity.bytes(),
            free_memory
        );
        self.session = Some(session);
        outcome
    }

    /// Accept all of `data`.
    ///
    /// In buffered mode this flushes one whole buffer each time the buffer
    /// fills, as many times as `data` requires. In passthrough mode `data`
    /// goes to the backend in a single call. Empty input does nothing.
    ///
    /// Returns the number of bytes accepted, which is `data.len()` unless an
    /// error is returned.
    ///
    /// # Errors
    ///
    /// - [`WriterError::NotOpen`] without an active session.
    /// - [`WriterError::Write`] if the backend rejects a flush. The full
    ///   buffer is kept and retried by the next call.
    pub fn write(&mut self, data: &[u8]) -> Result<usize, WriterError<B::Error>> {
        match &mut self.session {
            Some(session) => session.write(&mut self.backend, data),
            None => Err(WriterError::NotOpen),
        }
    }

    /// End the session: flush what is left, free the buffer, close the stream.
    ///
    /// The remainder is written as-is, not padded to the buffer size.
    /// Returns the number of bytes flushed by this call, which is 0 in
    /// passthrough mode, when nothing was pending, or when there is no
    /// session. Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// - [`WriterError::Flush`] if the final flush fails.
    /// - [`WriterError::Close`] if the backend fails to close the stream.
    ///
    /// The writer is closed afterwards in every case.
    pub fn close(&mut self) -> Result<usize, WriterError<B::Error>> {
        let Some(session) = self.session.take() else {
            return Ok(0);
        };

        let (stats, result) = session.finish(&mut self.backend);
        debug!(
            "closed: {} bytes in {} writes",
            stats.bytes_flushed, stats.physical_writes
        );
        self.last_stats = Some(stats);
        result
    }

    /// Check if a session is active.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Mode of the active session, if any.
    pub fn mode(&self) -> Option<WriteMode> {
        self.session.as_ref().map(Session::mode)
    }

    /// Buffer capacity planned for the active session, zero when closed.
    ///
    /// In passthrough mode this is the size that could not be allocated.
    pub fn capacity(&self) -> Capacity {
        self.session
            .as_ref()
            .map(Session::capacity)
            .unwrap_or(Capacity::ZERO)
    }

    /// Bytes waiting in the buffer.
    pub fn filled(&self) -> usize {
        self.session.as_ref().map(Session::filled).unwrap_or(0)
    }

    /// Path of the active session.
    pub fn path(&self) -> Option<&str> {
        self.session.as_ref().map(Session::path)
    }

    /// Check if the active session has an open stream.
    ///
    /// False when the backend failed to open under
    /// [`OpenFailurePolicy::Proceed`].
    pub fn has_stream(&self) -> bool {
        self.session.as_ref().is_some_and(Session::has_stream)
    }

    /// Counters of the active session.
    pub fn stats(&self) -> Option<&SessionStats> {
        self.session.as_ref().map(Session::stats)
    }

    /// Final counters of the most recently closed session.
    pub fn last_session_stats(&self) -> Option<&SessionStats> {
        self.last_stats.as_ref()
    }

    /// Get the configuration.
    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Replace the configuration. Takes effect at the next `open()`.
    pub fn set_config(&mut self, config: WriterConfig) {
        self.config = config;
    }

    /// Get a reference to the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Get a mutable reference to the backend.
    ///
    /// Writing through it while a session is open interleaves with the
    /// session's own flushes.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Get a reference to the memory budget.
    pub fn budget(&self) -> &M {
        &self.budget
    }
}

impl<B: StorageBackend, M: MemoryBudget> Drop for BufferedWriter<B, M> {
    fn drop(&mut self) {
        if self.session.is_some() && self.close().is_err() {
            warn!("close on drop failed, pending bytes may be lost");
        }
    }
}
