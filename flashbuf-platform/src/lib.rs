//! Platform backends for flashbuf.
//!
//! - [`FileBackend`]: `std::fs` files under a root directory
//! - [`SystemMemory`]: free memory as reported by Linux (feature `linux`)
//!
//! # Example
//!
//! ```no_run
//! use flashbuf::BufferedWriter;
//! use flashbuf_platform::{FileBackend, SystemMemory};
//!
//! let mut writer = BufferedWriter::new(FileBackend::new("/var/log/sensor"), SystemMemory);
//! writer.open("/spectra.csv")?;
//! writer.write(b"410,0.12\n")?;
//! writer.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]

mod file_backend;

#[cfg(all(target_os = "linux", feature = "linux"))]
mod system_memory;

pub use file_backend::FileBackend;

#[cfg(all(target_os = "linux", feature = "linux"))]
pub use system_memory::SystemMemory;
