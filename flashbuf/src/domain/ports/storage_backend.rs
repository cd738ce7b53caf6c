//! StorageBackend port - secondary (driven) port for byte-stream storage.
//!
//! The buffered writer depends on this abstraction; adapters connect it to
//! real storage (files, NOR flash regions, in-memory images).

use core::error::Error;

/// Port for write-only, stream-oriented storage.
///
/// ```text
/// ┌─────────────────────┐
/// │   Domain Layer      │
/// │  (BufferedWriter)   │
/// └──────────┬──────────┘
///            │ depends on
///            ▼
/// ┌─────────────────────┐
/// │ StorageBackend Port │  ◄── This trait
/// └──────────┬──────────┘
///            │ implemented by
///            ▼
/// ┌─────────────────────┐
/// │  Adapter Layer      │
/// │ (MemoryBackend, ...)│
/// └─────────────────────┘
/// ```
///
/// The writer only ever issues whole-buffer writes while a session is
/// running, and a single remainder write when it closes. In passthrough
/// mode each caller write is forwarded as one `write_bytes` call.
pub trait StorageBackend {
    /// An open stream. Owned exclusively by one writer session.
    type Handle;

    /// The error type for storage operations.
    type Error: Error + 'static;

    /// Open `path` for writing, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream cannot be opened.
    fn open(&mut self, path: &str) -> Result<Self::Handle, Self::Error>;

    /// Write all of `data` to the stream before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes could not be stored. The writer treats
    /// the whole call as failed and retries the same bytes later, so a
    /// failed call must leave no partial effect on the stream. Streams that
    /// cannot take back bytes already handed to the device (plain files,
    /// UARTs) may repeat that prefix on retry.
    fn write_bytes(&mut self, handle: &mut Self::Handle, data: &[u8]) -> Result<(), Self::Error>;

    /// Release the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream could not be closed cleanly. The handle
    /// is consumed either way.
    fn close(&mut self, handle: Self::Handle) -> Result<(), Self::Error>;
}

impl<B: StorageBackend + ?Sized> StorageBackend for &mut B {
    type Handle = B::Handle;
    type Error = B::Error;

    fn open(&mut self, path: &str) -> Result<Self::Handle, Self::Error> {
        B::open(self, path)
    }

    fn write_bytes(&mut self, handle: &mut Self::Handle, data: &[u8]) -> Result<(), Self::Error> {
        B::write_bytes(self, handle, data)
    }

    fn close(&mut self, handle: Self::Handle) -> Result<(), Self::Error> {
        B::close(self, handle)
    }
}
