//! In-memory storage backend.
//!
//! Keeps every stream as a byte vector keyed by path and records each
//! physical write, so the write pattern a buffered writer produces can be
//! inspected on the host.

extern crate alloc;
use alloc::{collections::BTreeMap, string::String, vec::Vec};
use core::fmt;

use crate::domain::StorageBackend;

/// One `write_bytes` call as seen by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    /// Path of the stream written to.
    pub path: String,
    /// Bytes in the call.
    pub len: usize,
}

/// Errors from the in-memory backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryBackendError {
    /// The backend is read-only and refuses to open streams.
    ReadOnly,
    /// The write would exceed the configured size limit.
    Full {
        /// Bytes in the rejected write.
        requested: usize,
        /// Bytes still free.
        available: usize,
    },
}

impl fmt::Display for MemoryBackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadOnly => write!(f, "Storage is read-only"),
            Self::Full {
                requested,
                available,
            } => write!(
                f,
                "Storage full: {} bytes requested, {} available",
                requested, available
            ),
        }
    }
}

impl core::error::Error for MemoryBackendError {}

/// Open stream on a [`MemoryBackend`].
#[derive(Debug)]
pub struct MemoryHandle {
    path: String,
}

impl MemoryHandle {
    /// Path the stream was opened with.
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// RAM-backed storage with an optional size limit.
///
/// Opening a path truncates it. The limit applies to the sum of all stored
/// bytes, like a small flash partition.
///
/// # Examples
///
/// ```
/// use flashbuf::adapters::MemoryBackend;
/// use flashbuf::domain::StorageBackend;
///
/// let mut backend = MemoryBackend::new();
/// let mut handle = backend.open("a.bin").unwrap();
/// backend.write_bytes(&mut handle, b"hello").unwrap();
/// backend.close(handle).unwrap();
///
/// assert_eq!(backend.contents("a.bin"), Some(&b"hello"[..]));
/// assert_eq!(backend.write_sizes("a.bin"), vec![5]);
/// ```
#[derive(Debug, Default)]
pub struct MemoryBackend {
    files: BTreeMap<String, Vec<u8>>,
    log: Vec<WriteRecord>,
    limit: Option<usize>,
    read_only: bool,
    open_streams: usize,
}

impl MemoryBackend {
    /// Create an empty, unlimited backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty backend that holds at most `bytes` in total.
    pub fn with_limit(bytes: usize) -> Self {
        Self {
            limit: Some(bytes),
            ..Self::default()
        }
    }

    /// Refuse (or allow again) opening streams.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Contents stored under `path`.
    pub fn contents(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    /// Every physical write, oldest first.
    pub fn write_log(&self) -> &[WriteRecord] {
        &self.log
    }

    /// Sizes of the physical writes made to `path`, oldest first.
    pub fn write_sizes(&self, path: &str) -> Vec<usize> {
        self.log
            .iter()
            .filter(|record| record.path == path)
            .map(|record| record.len)
            .collect()
    }

    /// Streams opened and not yet closed.
    pub fn open_streams(&self) -> usize {
        self.open_streams
    }

    /// Total bytes stored across all paths.
    pub fn stored_bytes(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }
}

impl StorageBackend for MemoryBackend {
    type Handle = MemoryHandle;
    type Error = MemoryBackendError;

    fn open(&mut self, path: &str) -> Result<MemoryHandle, MemoryBackendError> {
        if self.read_only {
            return Err(MemoryBackendError::ReadOnly);
        }
        self.files.insert(String::from(path), Vec::new());
        self.open_streams += 1;
        Ok(MemoryHandle {
            path: String::from(path),
        })
    }

    fn write_bytes(&mut self, handle: &mut MemoryHandle, data: &[u8]) -> Result<(), MemoryBackendError> {
        if let Some(limit) = self.limit {
            let available = limit.saturating_sub(self.stored_bytes());
            if data.len() > available {
                return Err(MemoryBackendError::Full {
                    requested: data.len(),
                    available,
                });
            }
        }

        self.files
            .entry(handle.path.clone())
            .or_default()
            .extend_from_slice(data);
        self.log.push(WriteRecord {
            path: handle.path.clone(),
            len: data.len(),
        });
        Ok(())
    }

    fn close(&mut self, _handle: MemoryHandle) -> Result<(), MemoryBackendError> {
        self.open_streams = self.open_streams.saturating_sub(1);
        Ok(())
    }
}
