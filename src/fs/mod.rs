use log::{debug, info};

use crate::{
    disk::{BlockDevice, Geometry},
    fs::{
        block::DataBlock,
        config::{BLOCK_HEADER_SIZE, DIR_SLOT_SIZE, FIRST_DATA_BLOCK_ID},
        descriptor::OpenFileTable,
        directory::Directory,
    },
};

pub mod allocator;
pub mod block;
pub mod config;
pub mod descriptor;
pub mod directory;
pub mod error;
pub mod extent_chain;
mod file_ops;

pub use block::BlockId;
pub use config::FsConfig;
pub use descriptor::{Fd, FileHandle};
pub use directory::DirEntry;
pub use error::{FileSystemError, Result};

/// 一次挂载会话：独占底层磁盘，持有目录和打开文件表
#[derive(Debug)]
pub struct FileSystem<D: BlockDevice> {
    disk: D,                     // 底层磁盘抽象层
    geometry: Geometry,          // 块大小与块数
    config: FsConfig,            // 运行期参数
    directory: Directory,        // 文件名 -> 首块
    open_files: OpenFileTable,   // 打开文件表
}

impl<D: BlockDevice> FileSystem<D> {
    /// 格式化磁盘并挂载
    pub fn format(disk: D, config: FsConfig) -> Result<Self> {
        Self::format_with(disk, config, |_, _| {})
    }

    /// 格式化磁盘并挂载，每写完一个块回调一次 `progress(done, total)`
    pub fn format_with<F>(disk: D, config: FsConfig, progress: F) -> Result<Self>
    where
        F: FnMut(u64, u64),
    {
        let mut fs = Self::new(disk, config)?;
        fs.wipe(progress)?;
        Ok(fs)
    }

    /// 挂载一块已经格式化过的磁盘
    pub fn mount(disk: D, config: FsConfig) -> Result<Self> {
        let mut fs = Self::new(disk, config)?;
        fs.directory = Directory::load(&fs.disk, fs.directory.capacity())?;
        info!(
            "mounted volume: {} files, {} blocks x {} bytes",
            fs.directory.len(),
            fs.geometry.block_count,
            fs.geometry.block_size
        );
        Ok(fs)
    }

    /// 关闭所有打开的文件，落盘后交还磁盘
    pub fn unmount(mut self) -> Result<D> {
        let open = self.open_files.len();
        if open > 0 {
            debug!("unmount: dropping {} open file handles", open);
        }
        self.open_files.clear();
        self.directory.sync(&self.disk)?;
        self.disk.flush()?;
        info!("unmounted volume");
        Ok(self.disk)
    }

    /// 重新格式化当前挂载的磁盘，所有打开的文件都会被关闭
    pub fn reformat_with<F>(&mut self, progress: F) -> Result<()>
    where
        F: FnMut(u64, u64),
    {
        self.open_files.clear();
        self.wipe(progress)
    }

    fn new(disk: D, config: FsConfig) -> Result<Self> {
        let geometry = disk.geometry();
        check_geometry(geometry)?;

        let capacity = config.directory_capacity(geometry.block_size);
        Ok(Self {
            directory: Directory::new(geometry.block_size, capacity),
            open_files: OpenFileTable::new(config.max_open_files),
            disk,
            geometry,
            config,
        })
    }

    // 清空目录，并把所有数据块写成空闲
    fn wipe<F>(&mut self, mut progress: F) -> Result<()>
    where
        F: FnMut(u64, u64),
    {
        let total = self.geometry.block_count;
        self.directory = Directory::new(self.geometry.block_size, self.directory.capacity());
        self.directory.sync(&self.disk)?;
        progress(1, total);

        for id in FIRST_DATA_BLOCK_ID as u64..total {
            DataBlock::free(id as BlockId, self.geometry.block_size).write(&self.disk)?;
            progress(id + 1, total);
        }
        self.disk.flush()?;

        info!(
            "formatted volume: {} blocks x {} bytes, {} directory slots",
            total,
            self.geometry.block_size,
            self.directory.capacity()
        );
        Ok(())
    }

    pub fn disk(&self) -> &D {
        &self.disk
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn config(&self) -> FsConfig {
        self.config
    }

    /// 每个块可存放的数据字节数
    pub fn payload_capacity(&self) -> usize {
        self.geometry.block_size - BLOCK_HEADER_SIZE
    }

    /// 按目录顺序列出所有文件
    pub fn list(&self) -> Vec<DirEntry> {
        self.directory.entries().cloned().collect()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.directory.contains(name)
    }

    /// 空闲块数量
    pub fn free_blocks(&self) -> Result<u64> {
        allocator::count_free(&self.disk)
    }

    /// 当前所有打开的文件
    pub fn open_files(&self) -> Vec<(Fd, FileHandle)> {
        self.open_files
            .iter()
            .map(|(fd, handle)| (fd, handle.clone()))
            .collect()
    }
}

fn check_geometry(geometry: Geometry) -> Result<()> {
    let Geometry {
        block_size,
        block_count,
    } = geometry;

    if block_size < DIR_SLOT_SIZE || block_size <= BLOCK_HEADER_SIZE {
        return Err(FileSystemError::InvalidGeometry(format!(
            "block size {} is too small",
            block_size
        )));
    }
    if block_size - BLOCK_HEADER_SIZE > u16::MAX as usize {
        return Err(FileSystemError::InvalidGeometry(format!(
            "block size {} is too large",
            block_size
        )));
    }
    if block_count < 2 || block_count > u32::MAX as u64 {
        return Err(FileSystemError::InvalidGeometry(format!(
            "block count {} is out of range",
            block_count
        )));
    }
    Ok(())
}
