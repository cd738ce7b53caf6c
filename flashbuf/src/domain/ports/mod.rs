//! Ports define the interfaces between the domain and the outside world.
//!
//! These are the **secondary (driven) ports** the buffered writer needs:
//! somewhere to put bytes, and a signal for how much memory it may use.

mod memory_budget;
mod storage_backend;

pub use memory_budget::{MemoryBudget, heap_allocate};
pub use storage_backend::StorageBackend;
