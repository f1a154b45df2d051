use std::{
    fs::{File, OpenOptions},
    io::{Error, ErrorKind, Read, Result, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use log::{debug, info};

use crate::disk::{
    block_device::{check_access, BlockDevice},
    types::Geometry,
};

/// 以宿主机上的一个镜像文件充当虚拟磁盘
#[derive(Debug)]
pub struct FileDisk {
    file: Mutex<File>,
    path: PathBuf,
    geometry: Geometry,
}

impl FileDisk {
    /// 创建（或覆盖）镜像文件并分配好全部空间。
    /// 新分配的空间全为 0。
    pub fn format<P: AsRef<Path>>(path: P, geometry: Geometry) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        file.set_len(geometry.disk_size())?;
        info!(
            "created disk image {} ({} blocks x {} bytes)",
            path.display(),
            geometry.block_count,
            geometry.block_size
        );

        Ok(Self {
            file: Mutex::new(file),
            path,
            geometry,
        })
    }

    /// 挂接一个已存在的镜像文件
    pub fn attach<P: AsRef<Path>>(path: P, geometry: Geometry) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        let len = file.metadata()?.len();
        if len < geometry.disk_size() {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!(
                    "disk image {} is {} bytes, expected at least {}",
                    path.display(),
                    len,
                    geometry.disk_size()
                ),
            ));
        }
        debug!("attached disk image {}", path.display());

        Ok(Self {
            file: Mutex::new(file),
            path,
            geometry,
        })
    }

    /// 落盘并释放镜像文件
    pub fn detach(self) -> Result<()> {
        self.flush()?;
        debug!("detached disk image {}", self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, File>> {
        self.file
            .lock()
            .map_err(|_| Error::new(ErrorKind::Other, "disk image lock poisoned"))
    }
}

impl BlockDevice for FileDisk {
    fn geometry(&self) -> Geometry {
        self.geometry
    }

    fn read_block(&self, block_id: u64, buf: &mut [u8]) -> Result<()> {
        check_access(self.geometry, block_id, buf.len())?;
        let mut file = self.lock()?;
        file.seek(SeekFrom::Start(self.geometry.offset_of(block_id)))?;
        file.read_exact(buf)?;
        Ok(())
    }

    fn write_block(&self, block_id: u64, buf: &[u8]) -> Result<()> {
        check_access(self.geometry, block_id, buf.len())?;
        let mut file = self.lock()?;
        file.seek(SeekFrom::Start(self.geometry.offset_of(block_id)))?;
        file.write_all(buf)?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let file = self.lock()?;
        file.sync_all()
    }
}
