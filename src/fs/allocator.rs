use log::debug;

use crate::{
    disk::BlockDevice,
    fs::{
        block::{BlockId, DataBlock},
        config::{DIRECTORY_BLOCK_ID, FIRST_DATA_BLOCK_ID},
        error::{FileSystemError, Result},
    },
};

// 线性扫描，不缓存空闲链表：块数有限，换来零额外元数据
fn data_blocks(disk: &dyn BlockDevice) -> impl Iterator<Item = BlockId> {
    let count = disk.geometry().block_count as BlockId;
    FIRST_DATA_BLOCK_ID..count
}

/// 分配一个空闲块，返回编号最小的那个。只查找，不改写磁盘
pub fn allocate(disk: &dyn BlockDevice) -> Result<BlockId> {
    for id in data_blocks(disk) {
        if DataBlock::read(disk, id)?.is_free() {
            debug!("allocated block {}", id);
            return Ok(id);
        }
    }
    Err(FileSystemError::NoFreeBlocks)
}

/// 释放一个块：整块清零，原来的 next 指针和数据一并丢弃
pub fn release(disk: &dyn BlockDevice, id: BlockId) -> Result<()> {
    check_data_block(disk, id)?;
    DataBlock::free(id, disk.geometry().block_size).write(disk)?;
    debug!("released block {}", id);
    Ok(())
}

/// 把新分配的块写成空的链尾
pub fn initialize(disk: &dyn BlockDevice, id: BlockId) -> Result<()> {
    check_data_block(disk, id)?;
    DataBlock::terminator(id, disk.geometry().block_size).write(disk)
}

/// 统计空闲块数量
pub fn count_free(disk: &dyn BlockDevice) -> Result<u64> {
    let mut free = 0;
    for id in data_blocks(disk) {
        if DataBlock::read(disk, id)?.is_free() {
            free += 1;
        }
    }
    Ok(free)
}

fn check_data_block(disk: &dyn BlockDevice, id: BlockId) -> Result<()> {
    if id == DIRECTORY_BLOCK_ID || id as u64 >= disk.geometry().block_count {
        return Err(FileSystemError::Corrupted(format!(
            "block {} is not a data block",
            id
        )));
    }
    Ok(())
}
