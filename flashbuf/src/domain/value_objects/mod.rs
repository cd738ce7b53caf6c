//! Value objects for the domain layer.
//!
//! Immutable, validated data describing how a write session is sized and
//! configured.

mod capacity;
mod writer_config;

pub use capacity::{CHUNK_SIZE, Capacity};
pub use writer_config::{OpenFailurePolicy, WriterConfig};
