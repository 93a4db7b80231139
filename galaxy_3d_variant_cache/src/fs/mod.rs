//! Filesystem module
//!
//! Boundary with the filesystem: reading whole files and querying
//! modification times. `StdFileSystem` is the real implementation,
//! `MemoryFileSystem` an in-memory one with explicit timestamps.

mod file_system;
mod memory_file_system;

pub use file_system::{FileSystem, StdFileSystem};
pub use memory_file_system::MemoryFileSystem;
