use std::io::{Error, ErrorKind, Result};

use crate::disk::types::Geometry;

/// 按块寻址的存储介质。所有读写都以整块为单位。
pub trait BlockDevice: Send + Sync {
    fn geometry(&self) -> Geometry;
    fn read_block(&self, block_id: u64, buf: &mut [u8]) -> Result<()>;
    fn write_block(&self, block_id: u64, buf: &[u8]) -> Result<()>;

    /// 把缓冲的写入落盘
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// 检查块号和缓冲区长度是否和设备几何匹配
pub(crate) fn check_access(geometry: Geometry, block_id: u64, len: usize) -> Result<()> {
    if block_id >= geometry.block_count {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            format!(
                "block {} out of range (device has {} blocks)",
                block_id, geometry.block_count
            ),
        ));
    }
    if len != geometry.block_size {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            format!(
                "buffer of {} bytes does not match block size {}",
                len, geometry.block_size
            ),
        ));
    }
    Ok(())
}
