/// 默认逻辑块大小：128 字节
/// 每个块带 8 字节块头，剩余部分为数据。
pub const BLOCK_SIZE: usize = 128;

/// 默认块总数
pub const BLOCK_COUNT: u64 = 4096;

/// 虚拟磁盘的几何参数：块大小 × 块数量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub block_size: usize,
    pub block_count: u64,
}

impl Geometry {
    pub const fn new(block_size: usize, block_count: u64) -> Self {
        Self {
            block_size,
            block_count,
        }
    }

    /// 磁盘总字节数，用于给 disk.img 定长
    pub fn disk_size(&self) -> u64 {
        self.block_size as u64 * self.block_count
    }

    /// 块 `block_id` 在介质上的字节偏移
    pub fn offset_of(&self, block_id: u64) -> u64 {
        block_id * self.block_size as u64
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new(BLOCK_SIZE, BLOCK_COUNT)
    }
}
