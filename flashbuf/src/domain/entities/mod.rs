//! Domain entities.
//!
//! A `Session` is the only entity: it lives from `open()` to `close()` and
//! owns the buffer and the stream handle for that span.

mod session;

pub(crate) use session::Session;
pub use session::{SessionStats, WriteMode};
