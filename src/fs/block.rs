use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::{
    disk::BlockDevice,
    fs::{
        config::{BLOCK_HEADER_SIZE, END_OF_CHAIN},
        error::{FileSystemError, Result},
    },
};

/// 块号。块头里的 next 指针是 32 位
pub type BlockId = u32;

bitflags! {
    /// 块状态标志
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BlockFlags: u8 {
        const ALLOCATED = 0b0000_0001;
    }
}

// 块头在磁盘上的编码（bincode 定长小端）
#[derive(Debug, Serialize, Deserialize)]
struct RawHeader {
    flags: u8,
    reserved: u8,
    len: u16,
    next: u32,
}

/// 数据块：8 字节块头 + 数据区
///
/// 块头记录是否已分配、数据区已用长度和下一块的块号。
/// 未分配的块整块清零，所以全 0 的块就是空闲块。
#[derive(Debug, Clone)]
pub struct DataBlock {
    pub id: BlockId,
    flags: BlockFlags,
    len: usize,
    next: BlockId,
    buf: Vec<u8>, // 整块原始字节
}

impl DataBlock {
    /// 空闲块
    pub fn free(id: BlockId, block_size: usize) -> Self {
        Self {
            id,
            flags: BlockFlags::empty(),
            len: 0,
            next: END_OF_CHAIN,
            buf: vec![0u8; block_size],
        }
    }

    /// 已分配、无数据、无后继的新块
    pub fn terminator(id: BlockId, block_size: usize) -> Self {
        Self {
            flags: BlockFlags::ALLOCATED,
            ..Self::free(id, block_size)
        }
    }

    pub fn read(disk: &dyn BlockDevice, id: BlockId) -> Result<Self> {
        let mut buf = vec![0u8; disk.geometry().block_size];
        disk.read_block(id as u64, &mut buf)?;

        let raw: RawHeader = bincode::deserialize(&buf[..BLOCK_HEADER_SIZE])?;
        let flags = BlockFlags::from_bits_truncate(raw.flags);
        let len = raw.len as usize;
        let capacity = buf.len() - BLOCK_HEADER_SIZE;

        if flags.contains(BlockFlags::ALLOCATED) && len > capacity {
            return Err(FileSystemError::Corrupted(format!(
                "block {} claims {} payload bytes, capacity is {}",
                id, len, capacity
            )));
        }

        Ok(Self {
            id,
            flags,
            len,
            next: raw.next,
            buf,
        })
    }

    pub fn write(&mut self, disk: &dyn BlockDevice) -> Result<()> {
        let raw = RawHeader {
            flags: self.flags.bits(),
            reserved: 0,
            len: self.len as u16,
            next: self.next,
        };
        bincode::serialize_into(&mut self.buf[..BLOCK_HEADER_SIZE], &raw)?;
        disk.write_block(self.id as u64, &self.buf)?;
        Ok(())
    }

    pub fn is_free(&self) -> bool {
        !self.flags.contains(BlockFlags::ALLOCATED)
    }

    pub fn next(&self) -> BlockId {
        self.next
    }

    pub fn set_next(&mut self, next: BlockId) {
        self.next = next;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.buf.len() - BLOCK_HEADER_SIZE
    }

    pub fn payload(&self) -> &[u8] {
        &self.buf[BLOCK_HEADER_SIZE..BLOCK_HEADER_SIZE + self.len]
    }

    /// 在 `offset` 处截断数据区，再写入尽可能多的 `data`，返回写入的字节数。
    ///
    /// `offset` 超过已用长度时，中间的空洞补 0。
    pub fn splice(&mut self, offset: usize, data: &[u8]) -> usize {
        let offset = offset.min(self.capacity());
        let n = data.len().min(self.capacity() - offset);
        let start = BLOCK_HEADER_SIZE + offset;

        if offset > self.len {
            self.buf[BLOCK_HEADER_SIZE + self.len..start].fill(0);
        }
        self.buf[start..start + n].copy_from_slice(&data[..n]);

        let new_len = offset + n;
        if new_len < self.len {
            self.buf[BLOCK_HEADER_SIZE + new_len..BLOCK_HEADER_SIZE + self.len].fill(0);
        }
        self.len = new_len;
        n
    }

    /// 把数据区截短到 `len`，已经更短时不变
    pub fn truncate_payload(&mut self, len: usize) {
        if len < self.len {
            self.buf[BLOCK_HEADER_SIZE + len..BLOCK_HEADER_SIZE + self.len].fill(0);
            self.len = len;
        }
    }
}
