//! Writer errors.
//!
//! Failing to allocate a buffer is not an error: the session falls back to
//! passthrough. Everything the storage backend reports comes through here,
//! wrapped with what the writer was doing at the time.

use core::fmt;

/// Errors reported by [`BufferedWriter`](crate::domain::BufferedWriter).
#[derive(Debug)]
#[non_exhaustive]
pub enum WriterError<E> {
    /// The backend could not open the stream.
    ///
    /// Under `OpenFailurePolicy::Proceed` the session is still active.
    Open(E),

    /// A flush during `write()` failed.
    ///
    /// `accepted` bytes of the call were taken before the failure. The full
    /// buffer is kept and flushed again by the next `write()` or `close()`.
    Write {
        /// Bytes of this call that the writer holds.
        accepted: usize,
        /// The backend error.
        source: E,
    },

    /// The final flush during `close()` failed and its bytes are lost.
    ///
    /// The stream was still closed and the buffer freed.
    Flush {
        /// Bytes that were waiting in the buffer.
        pending: usize,
        /// The backend error.
        source: E,
    },

    /// The backend could not close the stream cleanly.
    Close(E),

    /// `write()` was called without an open session.
    NotOpen,
}

impl<E> WriterError<E> {
    /// The backend error, if this error carries one.
    pub fn storage_error(&self) -> Option<&E> {
        match self {
            Self::Open(e) | Self::Close(e) => Some(e),
            Self::Write { source, .. } | Self::Flush { source, .. } => Some(source),
            Self::NotOpen => None,
        }
    }
}

impl<E: fmt::Display> fmt::Display for WriterError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open(e) => write!(f, "Failed to open storage: {}", e),
            Self::Write { accepted, source } => write!(
                f,
                "Flush failed after accepting {} bytes: {}",
                accepted, source
            ),
            Self::Flush { pending, source } => write!(
                f,
                "Final flush of {} bytes failed: {}",
                pending, source
            ),
            Self::Close(e) => write!(f, "Failed to close storage: {}", e),
            Self::NotOpen => write!(f, "Writer is not open"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display + core::error::Error + 'static> core::error::Error
    for WriterError<E>
{
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        self.storage_error().map(|e| e as &(dyn core::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_error_display() {
        let error: WriterError<std::io::Error> = WriterError::Write {
            accepted: 4096,
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };

        let msg = format!("{}", error);
        assert!(msg.contains("4096"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn test_not_open_has_no_source() {
        let error: WriterError<std::io::Error> = WriterError::NotOpen;
        assert!(error.storage_error().is_none());
        assert!(core::error::Error::source(&error).is_none());
    }

    #[test]
    fn test_flush_error_exposes_source() {
        let error: WriterError<std::io::Error> = WriterError::Flush {
            pending: 12,
            source: std::io::Error::new(std::io::ErrorKind::Other, "gone"),
        };
        assert!(core::error::Error::source(&error).is_some());
        assert!(format!("{}", error).contains("12 bytes"));
    }
}
