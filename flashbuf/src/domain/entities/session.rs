//! Session entity - the live state of one open/write/close cycle.

extern crate alloc;
use alloc::{boxed::Box, string::String};

use crate::domain::{error::WriterError, ports::StorageBackend, value_objects::Capacity};

/// How a session stores incoming bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteMode {
    /// Bytes collect in an owned buffer and reach storage in whole-buffer flushes.
    Buffered,
    /// No buffer could be obtained; every write goes straight to storage.
    Passthrough,
}

impl WriteMode {
    /// Check if the session is buffering.
    #[inline]
    pub const fn is_buffered(&self) -> bool {
        matches!(self, WriteMode::Buffered)
    }

    /// Check if the session writes straight through.
    #[inline]
    pub const fn is_passthrough(&self) -> bool {
        matches!(self, WriteMode::Passthrough)
    }
}

/// Counters for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionStats {
    /// Bytes taken from callers of `write()`.
    pub bytes_accepted: usize,
    /// Successful `write_bytes` calls issued to the backend.
    pub physical_writes: usize,
    /// Bytes handed to the backend by successful writes.
    pub bytes_flushed: usize,
    /// Bytes discarded because the session has no open stream.
    pub bytes_dropped: usize,
}

enum Sink {
    Buffered { buf: Box<[u8]>, filled: usize },
    Passthrough,
}

/// One write session: the buffer, the stream handle and their bookkeeping.
///
/// Both the buffer and the handle are owned here and nowhere else. Dropping
/// a session frees the buffer but does not close the handle through the
/// backend; [`Session::finish`] does both.
pub(crate) struct Session<H> {
    path: String,
    capacity: Capacity,
    sink: Sink,
    handle: Option<H>,
    stats: SessionStats,
}

impl<H> Session<H> {
    /// Start a session. A missing `buffer` means passthrough.
    pub(crate) fn new(
        path: String,
        capacity: Capacity,
        buffer: Option<Box<[u8]>>,
        handle: Option<H>,
    ) -> Self {
        let sink = match buffer {
            Some(buf) => Sink::Buffered { buf, filled: 0 },
            None => Sink::Passthrough,
        };
        Self {
            path,
            capacity,
            sink,
            handle,
            stats: SessionStats::default(),
        }
    }

    pub(crate) fn mode(&self) -> WriteMode {
        match self.sink {
            Sink::Buffered { .. } => WriteMode::Buffered,
            Sink::Passthrough => WriteMode::Passthrough,
        }
    }

    pub(crate) fn capacity(&self) -> Capacity {
        self.capacity
    }

    pub(crate) fn filled(&self) -> usize {
        match self.sink {
            Sink::Buffered { filled, .. } => filled,
            Sink::Passthrough => 0,
        }
    }

    pub(crate) fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn has_stream(&self) -> bool {
        self.handle.is_some()
    }

    pub(crate) fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Accept all of `data`, flushing whole buffers as they fill.
    ///
    /// A flush that fails leaves the buffer full; the next `write` or
    /// [`finish`](Self::finish) retries it before taking anything new.
    pub(crate) fn write<B>(
        &mut self,
        backend: &mut B,
        mut data: &[u8],
    ) -> Result<usize, WriterError<B::Error>>
    where
        B: StorageBackend<Handle = H>,
    {
        if data.is_empty() {
            return Ok(0);
        }

        let Self { sink, handle, stats, .. } = self;
        match sink {
            Sink::Passthrough => {
                emit(backend, handle, stats, data)
                    .map_err(|source| WriterError::Write { accepted: 0, source })?;
                stats.bytes_accepted += data.len();
                Ok(data.len())
            }
            Sink::Buffered { buf, filled } => {
                let capacity = buf.len();
                let mut accepted = 0;

                while !data.is_empty() {
                    let available = capacity - *filled;

                    if data.len() < available {
                        buf[*filled..*filled + data.len()].copy_from_slice(data);
                        trace!("store {} bytes; {} free", data.len(), available);
                        *filled += data.len();
                        accepted += data.len();
                        stats.bytes_accepted += data.len();
                        break;
                    }

                    let (head, rest) = data.split_at(available);
                    buf[*filled..].copy_from_slice(head);
                    *filled = capacity;
                    accepted += available;
                    stats.bytes_accepted += available;
                    data = rest;

                    emit(backend, handle, stats, buf)
                        .map_err(|source| WriterError::Write { accepted, source })?;
                    *filled = 0;
                }

                Ok(accepted)
            }
        }
    }

    /// Flush the remainder, free the buffer and close the stream.
    ///
    /// The stream is closed even when the final flush fails. Returns the
    /// session's counters alongside the number of bytes flushed here.
    pub(crate) fn finish<B>(self, backend: &mut B) -> (SessionStats, Result<usize, WriterError<B::Error>>)
    where
        B: StorageBackend<Handle = H>,
    {
        let Self { path, sink, mut handle, mut stats, .. } = self;

        let flushed = match sink {
            Sink::Buffered { buf, filled } if filled > 0 => {
                debug!("{}: write {} bytes remaining", path.as_str(), filled);
                emit(backend, &mut handle, &mut stats, &buf[..filled])
                    .map(|()| filled)
                    .map_err(|source| WriterError::Flush { pending: filled, source })
            }
            _ => Ok(0),
        };

        let closed = match handle.take() {
            Some(h) => backend.close(h).map_err(WriterError::Close),
            None => Ok(()),
        };

        let result = match (flushed, closed) {
            (Err(e), _) | (Ok(_), Err(e)) => Err(e),
            (Ok(n), Ok(())) => Ok(n),
        };
        (stats, result)
    }
}

/// One physical write, or a counted drop when there is no stream.
fn emit<B: StorageBackend>(
    backend: &mut B,
    handle: &mut Option<B::Handle>,
    stats: &mut SessionStats,
    bytes: &[u8],
) -> Result<(), B::Error> {
    match handle {
        Some(h) => {
            backend.write_bytes(h, bytes)?;
            trace!("write {} bytes", bytes.len());
            stats.physical_writes += 1;
            stats.bytes_flushed += bytes.len();
        }
        None => {
            warn!("no open stream, dropping {} bytes", bytes.len());
            stats.bytes_dropped += bytes.len();
        }
    }
    Ok(())
}
