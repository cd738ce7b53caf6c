//! Adapter layer - Concrete implementations of the domain's ports.
//!
//! # Hexagonal Architecture
//!
//! ```text
//!     ┌──────────────────────────────────┐
//!     │      Domain Layer                │
//!     │  - BufferedWriter (service)      │
//!     │  - StorageBackend, MemoryBudget  │
//!     └────────────┬─────────────────────┘
//!                  │
//!                  │ implemented by
//!                  ▼
//!     ┌──────────────────────────────────┐
//!     │      Adapter Layer               │  ◄── This module
//!     │  - MemoryBackend                 │
//!     │  - StreamBackend                 │
//!     │  - NorFlashBackend               │
//!     │  - FixedBudget                   │
//!     └────────────┬─────────────────────┘
//!                  │
//!                  │ uses
//!                  ▼
//!     ┌──────────────────────────────────┐
//!     │  Infrastructure (flash, streams) │
//!     └──────────────────────────────────┘
//! ```
//!
//! # Available Adapters
//!
//! - **`MemoryBackend`**: RAM-backed storage that logs every physical write
//! - **`StreamBackend`**: Any `embedded_io::Write` stream
//! - **`NorFlashBackend`**: A region of NOR flash (requires `embedded-storage`)
//! - **`FixedBudget`**: Constant free-memory figure

mod fixed_budget;
mod memory_backend;
mod stream_backend;

#[cfg(feature = "embedded-storage")]
mod nor_flash_backend;

pub use fixed_budget::FixedBudget;
pub use memory_backend::{MemoryBackend, MemoryBackendError, MemoryHandle, WriteRecord};
pub use stream_backend::{StreamBackend, StreamBackendError};

#[cfg(feature = "embedded-storage")]
pub use nor_flash_backend::{
    NOR_FLASH_SECTOR_SIZE, NorFlashBackend, NorFlashBackendError, NorFlashRegion, NorFlashStream,
};
