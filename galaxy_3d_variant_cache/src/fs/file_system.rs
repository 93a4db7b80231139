/// FileSystem trait and the std::fs implementation.

use std::io;
use std::path::Path;
use std::time::SystemTime;

/// Read-only filesystem access used by the source store and buffer cache
///
/// Missing files are reported as `io::ErrorKind::NotFound`.
pub trait FileSystem: Send + Sync {
    /// Read the whole file
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Last modification time of the file
    fn modification_time(&self, path: &Path) -> io::Result<SystemTime>;
}

/// FileSystem backed by `std::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn modification_time(&self, path: &Path) -> io::Result<SystemTime> {
        std::fs::metadata(path)?.modified()
    }
}
