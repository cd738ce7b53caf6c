//! Wear-aware write buffering for flash storage.
//!
//! Writing many small records straight to flash wears it out: every write
//! costs at least one page program, and often an erase. This crate puts a
//! RAM buffer in front of the storage and turns a stream of small writes
//! into a few large, chunk-aligned ones.
//!
//! # Architecture
//!
//! The crate follows a ports-and-adapters layout:
//!
//! ## Domain Layer (`domain`)
//! - **Value Objects**: `Capacity` (buffer sizing), `WriterConfig`
//! - **Entities**: the write session and its `WriteMode`
//! - **Services**: `BufferedWriter`
//! - **Ports**: `StorageBackend`, `MemoryBudget`
//!
//! ## Adapter Layer (`adapters`)
//! - **`MemoryBackend`**: RAM storage that records every physical write
//! - **`StreamBackend`**: any `embedded_io::Write` stream
//! - **`NorFlashBackend`**: a region of NOR flash (`embedded-storage`)
//! - **`FixedBudget`**: a constant free-memory figure
//!
//! # Buffer sizing
//!
//! At `open()` the writer asks its `MemoryBudget` for the free memory and
//! takes at most half of it, rounded down to a multiple of [`CHUNK_SIZE`]
//! (4KB). If no buffer can be had, the session runs in passthrough mode
//! and forwards each write as it arrives.
//!
//! # Quick Start
//!
//! ```
//! use flashbuf::{BufferedWriter, FixedBudget, MemoryBackend};
//!
//! let mut backend = MemoryBackend::new();
//! {
//!     let mut writer = BufferedWriter::new(&mut backend, FixedBudget::new(20_000));
//!     writer.open("log.csv").unwrap();
//!     for _ in 0..1000 {
//!         writer.write(b"0.125,0.250\n").unwrap();
//!     }
//!     writer.close().unwrap();
//! }
//!
//! // 12000 bytes reached storage in one 8KB flush plus the remainder.
//! assert_eq!(backend.write_sizes("log.csv"), vec![8192, 3808]);
//! ```
//!
//! # Features
//!
//! - `embedded-storage`: Enable the NOR flash backend
//! - `log`: Enable logging support
//! - `defmt`: Enable defmt logging for embedded

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

extern crate alloc;

#[macro_use]
mod fmt;

pub mod domain;
pub mod adapters;

pub use domain::{
    BufferedWriter, CHUNK_SIZE, Capacity, MemoryBudget, OpenFailurePolicy, SessionStats,
    StorageBackend, WriteMode, WriterConfig, WriterError,
};

pub use adapters::{
    FixedBudget, MemoryBackend, MemoryBackendError, StreamBackend, StreamBackendError,
};

#[cfg(feature = "embedded-storage")]
pub use adapters::{NorFlashBackend, NorFlashBackendError, NorFlashRegion};

// Re-export embedded_io for convenience
pub use embedded_io;
