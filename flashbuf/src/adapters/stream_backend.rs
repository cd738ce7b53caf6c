//! Generic stream backend
//!
//! Provides a `StorageBackend` over any `embedded_io::Write` stream.

use core::{fmt, marker::PhantomData};

use embedded_io::Write;

use crate::domain::StorageBackend;

/// Errors from a [`StreamBackend`].
#[derive(Debug)]
pub enum StreamBackendError<E> {
    /// The stream reported an error.
    Io(E),
    /// The stream accepted zero bytes of a non-empty write.
    WriteZero,
}

impl<E: fmt::Display> fmt::Display for StreamBackendError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Stream error: {}", e),
            Self::WriteZero => write!(f, "Stream accepted no bytes"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display + core::error::Error + 'static> core::error::Error
    for StreamBackendError<E>
{
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::WriteZero => None,
        }
    }
}

/// Storage backend for `embedded_io::Write` streams.
///
/// The opener closure turns a path into a stream; `close` flushes the stream
/// and drops it. This is the way in for UARTs, SD card files, or anything
/// else that already speaks `embedded-io`.
///
/// # Example
///
/// ```ignore
/// use flashbuf::adapters::{FixedBudget, StreamBackend};
/// use flashbuf::domain::BufferedWriter;
///
/// let backend = StreamBackend::new(|path: &str| volume.create_file(path));
/// let mut writer = BufferedWriter::new(backend, FixedBudget::new(64 * 1024));
/// ```
pub struct StreamBackend<F, W> {
    opener: F,
    _stream: PhantomData<fn() -> W>,
}

impl<F, W> StreamBackend<F, W>
where
    F: FnMut(&str) -> Result<W, W::Error>,
    W: Write,
{
    /// Create a backend that opens streams with `opener`.
    pub fn new(opener: F) -> Self {
        Self {
            opener,
            _stream: PhantomData,
        }
    }
}

impl<F, W> StorageBackend for StreamBackend<F, W>
where
    F: FnMut(&str) -> Result<W, W::Error>,
    W: Write,
    W::Error: core::error::Error + 'static,
{
    type Handle = W;
    type Error = StreamBackendError<W::Error>;

    fn open(&mut self, path: &str) -> Result<W, Self::Error> {
        (self.opener)(path).map_err(StreamBackendError::Io)
    }

    fn write_bytes(&mut self, stream: &mut W, mut data: &[u8]) -> Result<(), Self::Error> {
        while !data.is_empty() {
            match stream.write(data).map_err(StreamBackendError::Io)? {
                0 => return Err(StreamBackendError::WriteZero),
                n => data = &data[n..],
            }
        }
        Ok(())
    }

    fn close(&mut self, mut stream: W) -> Result<(), Self::Error> {
        stream.flush().map_err(StreamBackendError::Io)
    }
}
