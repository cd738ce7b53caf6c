//! `std::fs` storage backend.

use std::{
    fs::File,
    io::{self, Write},
    path::{Path, PathBuf},
};

use flashbuf::StorageBackend;

/// Storage backend writing plain files under a root directory.
///
/// Paths are resolved relative to the root; a leading `/` is ignored, so
/// flash-style names like `"/data.csv"` land inside the root too. Opening
/// creates the file or truncates it. Writes go straight to the file with no
/// extra buffering in between.
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
    sync_on_close: bool,
}

impl FileBackend {
    /// Create a backend rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            sync_on_close: false,
        }
    }

    /// Call `sync_all` before closing each file.
    pub fn sync_on_close(mut self, sync: bool) -> Self {
        self.sync_on_close = sync;
        self
    }

    /// Get the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where `path` lives on disk.
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl StorageBackend for FileBackend {
    type Handle = File;
    type Error = io::Error;

    fn open(&mut self, path: &str) -> io::Result<File> {
        let resolved = self.resolve(path);
        #[cfg(feature = "logging")]
        log::debug!("opening {}", resolved.display());
        File::create(resolved)
    }

    fn write_bytes(&mut self, file: &mut File, data: &[u8]) -> io::Result<()> {
        file.write_all(data)
    }

    fn close(&mut self, mut file: File) -> io::Result<()> {
        file.flush()?;
        if self.sync_on_close {
            file.sync_all()?;
        }
        Ok(())
    }
}
