//! A small single-volume file system on top of a fixed-geometry block store.
//!
//! Block 0 holds a fixed-slot directory mapping file names to head blocks.
//! Every other block is either free or part of exactly one file's chain:
//! an 8-byte header (allocated flag, payload length, next block) followed by
//! payload bytes.

pub mod disk;
pub mod fs;

pub use disk::{BlockDevice, FileDisk, Geometry, MemDisk};
pub use fs::{DirEntry, Fd, FileHandle, FileSystem, FileSystemError, FsConfig, Result};
