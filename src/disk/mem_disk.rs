use std::{
    io::{Error, ErrorKind, Result},
    sync::{Mutex, MutexGuard},
};

use crate::disk::{
    block_device::{check_access, BlockDevice},
    types::Geometry,
};

/// 内存中的虚拟磁盘，内容随进程结束而丢失
#[derive(Debug)]
pub struct MemDisk {
    blocks: Mutex<Vec<u8>>, // 扁平化存储
    geometry: Geometry,
}

impl MemDisk {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            blocks: Mutex::new(vec![0u8; geometry.disk_size() as usize]),
            geometry,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<u8>>> {
        self.blocks
            .lock()
            .map_err(|_| Error::new(ErrorKind::Other, "memory disk lock poisoned"))
    }
}

impl BlockDevice for MemDisk {
    fn geometry(&self) -> Geometry {
        self.geometry
    }

    fn read_block(&self, block_id: u64, buf: &mut [u8]) -> Result<()> {
        check_access(self.geometry, block_id, buf.len())?;
        let start = self.geometry.offset_of(block_id) as usize;
        let blocks = self.lock()?;
        buf.copy_from_slice(&blocks[start..start + buf.len()]);
        Ok(())
    }

    fn write_block(&self, block_id: u64, buf: &[u8]) -> Result<()> {
        check_access(self.geometry, block_id, buf.len())?;
        let start = self.geometry.offset_of(block_id) as usize;
        let mut blocks = self.lock()?;
        blocks[start..start + buf.len()].copy_from_slice(buf);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_block() {
        let disk = MemDisk::new(Geometry::new(16, 4));
        let mut buf = [0u8; 16];
        assert!(disk.read_block(4, &mut buf).is_err());
        assert!(disk.write_block(0, &[1u8; 8]).is_err());
    }

    #[test]
    fn blocks_are_independent() {
        let disk = MemDisk::new(Geometry::new(16, 4));
        disk.write_block(1, &[7u8; 16]).unwrap();

        let mut buf = [0u8; 16];
        disk.read_block(1, &mut buf).unwrap();
        assert_eq!(buf, [7u8; 16]);
        disk.read_block(2, &mut buf).unwrap();
        assert_eq!(buf, [0u8; 16]);
    }
}
