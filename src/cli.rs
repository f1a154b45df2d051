use std::path::PathBuf;

use chain_fs::{
    disk::{BLOCK_COUNT, BLOCK_SIZE},
    fs::config::MAX_DESC,
    FsConfig, Geometry,
};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(version, about = "Interactive shell for a chain-fs volume")]
pub struct Cli {
    /// Disk image to attach; created and formatted if missing
    #[arg(short, long, default_value = "disk.img")]
    pub disk: PathBuf,

    /// Number of blocks on a new disk
    #[arg(long, default_value_t = BLOCK_COUNT)]
    pub blocks: u64,

    /// Block size in bytes
    #[arg(long, default_value_t = BLOCK_SIZE)]
    pub block_size: usize,

    /// Capacity of the open file table
    #[arg(long, default_value_t = MAX_DESC)]
    pub max_open: usize,

    /// Upper bound on files in the directory
    #[arg(long)]
    pub max_files: Option<usize>,

    /// Use a throwaway in-memory disk instead of an image file
    #[arg(long)]
    pub memory: bool,
}

impl Cli {
    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.block_size, self.blocks)
    }

    pub fn fs_config(&self) -> FsConfig {
        FsConfig {
            max_open_files: self.max_open,
            max_files: self.max_files,
        }
    }
}
