//! Domain layer - the buffering rules, with no storage or platform code.
//!
//! - **Value Objects**: `Capacity` (and the sizing rule), `WriterConfig`
//! - **Entities**: the write `Session` and its `WriteMode`
//! - **Domain Services**: `BufferedWriter`
//! - **Ports**: `StorageBackend`, `MemoryBudget`
//! - **Domain Errors**: `WriterError`
//!
//! # Hexagonal Architecture
//!
//! ```text
//!     ┌──────────────────────────────────┐
//!     │      Domain Layer (Core)         │
//!     │                                  │
//!     │  ┌────────────────────────────┐  │
//!     │  │  Entities & Value Objects  │  │
//!     │  │  - Session, Capacity, ...  │  │
//!     │  └────────────────────────────┘  │
//!     │              ▲                   │
//!     │              │                   │
//!     │  ┌────────────────────────────┐  │
//!     │  │    Domain Services         │  │
//!     │  │    - BufferedWriter        │  │
//!     │  └────────────────────────────┘  │
//!     │              │                   │
//!     │              ▼                   │
//!     │  ┌────────────────────────────┐  │
//!     │  │    Ports (Interfaces)      │  │
//!     │  │    - StorageBackend        │  │
//!     │  │    - MemoryBudget          │  │
//!     │  └────────────────────────────┘  │
//!     └──────────────────────────────────┘
//!                    ▲
//!                    │ implemented by
//!                    │
//!     ┌──────────────────────────────────┐
//!     │      Adapter Layer               │
//!     │  - MemoryBackend, FixedBudget    │
//!     │  - StreamBackend                 │
//!     │  - NorFlashBackend               │
//!     └──────────────────────────────────┘
//! ```

pub mod entities;
pub mod value_objects;
pub mod ports;
pub mod error;

mod buffered_writer;

pub use entities::{SessionStats, WriteMode};
pub use value_objects::{CHUNK_SIZE, Capacity, OpenFailurePolicy, WriterConfig};
pub use ports::{MemoryBudget, StorageBackend, heap_allocate};
pub use error::WriterError;
pub use buffered_writer::BufferedWriter;
