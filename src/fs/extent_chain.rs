use log::trace;

use crate::{
    disk::BlockDevice,
    fs::{
        allocator,
        block::{BlockId, DataBlock},
        config::{DIRECTORY_BLOCK_ID, END_OF_CHAIN},
        error::{FileSystemError, Result},
    },
};

/// 读取链上的一个块，并确认它确实是一个已分配的、next 指针合法的块
pub fn fetch(disk: &dyn BlockDevice, id: BlockId) -> Result<DataBlock> {
    let block_count = disk.geometry().block_count;
    if id == DIRECTORY_BLOCK_ID || id as u64 >= block_count {
        return Err(FileSystemError::Corrupted(format!(
            "chain points at invalid block {}",
            id
        )));
    }

    let block = DataBlock::read(disk, id)?;
    if block.is_free() {
        return Err(FileSystemError::Corrupted(format!(
            "block {} is linked into a chain but marked free",
            id
        )));
    }
    if block.next() as u64 >= block_count {
        return Err(FileSystemError::Corrupted(format!(
            "block {} has out-of-range next pointer {}",
            id,
            block.next()
        )));
    }
    Ok(block)
}

/// 下一块的块号，0 表示链尾
pub fn next_of(disk: &dyn BlockDevice, id: BlockId) -> Result<BlockId> {
    let next = fetch(disk, id)?.next();
    trace!("block {} -> {}", id, next);
    Ok(next)
}

/// 只改写 `id` 的 next 指针，数据区保持不变
pub fn link(disk: &dyn BlockDevice, id: BlockId, next: BlockId) -> Result<()> {
    let mut block = fetch(disk, id)?;
    block.set_next(next);
    block.write(disk)
}

/// 从 `head` 开始沿链走到结尾，返回途经的全部块号
pub fn walk(disk: &dyn BlockDevice, head: BlockId) -> Result<Vec<BlockId>> {
    let limit = disk.geometry().block_count as usize;
    let mut blocks = Vec::new();
    let mut current = head;

    while current != END_OF_CHAIN {
        // 链长超过块总数说明有环
        if blocks.len() >= limit {
            return Err(FileSystemError::Corrupted(format!(
                "chain starting at block {} does not terminate",
                head
            )));
        }
        blocks.push(current);
        current = next_of(disk, current)?;
    }
    Ok(blocks)
}

/// 释放从 `head` 开始的整条链，返回释放的块数
pub fn release_chain(disk: &dyn BlockDevice, head: BlockId) -> Result<usize> {
    let blocks = walk(disk, head)?;
    for &id in &blocks {
        allocator::release(disk, id)?;
    }
    Ok(blocks.len())
}
