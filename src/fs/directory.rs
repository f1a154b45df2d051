use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    disk::BlockDevice,
    fs::{
        block::BlockId,
        config::{DIRECTORY_BLOCK_ID, DIR_SLOT_SIZE, FILENAME_SIZE},
        error::{FileSystemError, Result},
    },
};

// 目录槽在磁盘上的编码
#[derive(Debug, Default, Serialize, Deserialize)]
struct DirSlot {
    in_use: u8,
    name_len: u8,
    name: [u8; FILENAME_SIZE],
    head: u32,
}

/// 一个目录项：文件名 -> 首块块号
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub head: BlockId,
}

/// 0 号块里的定长槽位目录
///
/// 删除只清空对应槽位，其余目录项的位置和编码都不变；
/// 新建的文件占用第一个空槽。
#[derive(Debug, Clone)]
pub struct Directory {
    slots: Vec<Option<DirEntry>>,
    capacity: usize, // 最多文件数，不超过槽位数
}

/// 文件名必须是 1 到 15 字节
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(FileSystemError::InvalidName(name.to_string()));
    }
    if name.len() > FILENAME_SIZE {
        return Err(FileSystemError::NameTooLong(name.to_string()));
    }
    Ok(())
}

impl Directory {
    pub fn new(block_size: usize, capacity: usize) -> Self {
        let slot_count = block_size / DIR_SLOT_SIZE;
        Self {
            slots: vec![None; slot_count],
            capacity: capacity.min(slot_count),
        }
    }

    /// 从磁盘读取目录块并解析所有槽位
    pub fn load(disk: &dyn BlockDevice, capacity: usize) -> Result<Self> {
        let block_size = disk.geometry().block_size;
        let mut buf = vec![0u8; block_size];
        disk.read_block(DIRECTORY_BLOCK_ID as u64, &mut buf)?;

        let mut dir = Self::new(block_size, capacity);
        for (index, chunk) in buf.chunks_exact(DIR_SLOT_SIZE).enumerate() {
            let slot: DirSlot = bincode::deserialize(chunk)?;
            if slot.in_use == 0 {
                continue;
            }

            let name_len = slot.name_len as usize;
            if name_len == 0 || name_len > FILENAME_SIZE {
                return Err(FileSystemError::Corrupted(format!(
                    "directory slot {} has name length {}",
                    index, name_len
                )));
            }
            let name = String::from_utf8(slot.name[..name_len].to_vec()).map_err(|_| {
                FileSystemError::Corrupted(format!("directory slot {} name is not UTF-8", index))
            })?;

            dir.slots[index] = Some(DirEntry {
                name,
                head: slot.head,
            });
        }
        Ok(dir)
    }

    /// 把目录写回 0 号块
    pub fn sync(&self, disk: &dyn BlockDevice) -> Result<()> {
        let mut buf = vec![0u8; disk.geometry().block_size];
        for (chunk, entry) in buf.chunks_exact_mut(DIR_SLOT_SIZE).zip(&self.slots) {
            let slot = match entry {
                Some(entry) => {
                    let mut name = [0u8; FILENAME_SIZE];
                    name[..entry.name.len()].copy_from_slice(entry.name.as_bytes());
                    DirSlot {
                        in_use: 1,
                        name_len: entry.name.len() as u8,
                        name,
                        head: entry.head,
                    }
                }
                None => DirSlot::default(),
            };
            bincode::serialize_into(chunk, &slot)?;
        }
        disk.write_block(DIRECTORY_BLOCK_ID as u64, &buf)?;
        Ok(())
    }

    /// 查找文件的首块，只读
    pub fn lookup(&self, name: &str) -> Result<BlockId> {
        self.entries()
            .find(|entry| entry.name == name)
            .map(|entry| entry.head)
            .ok_or_else(|| FileSystemError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_ok()
    }

    /// 还能否再放一个目录项
    pub fn has_room(&self) -> bool {
        self.len() < self.capacity && self.slots.iter().any(Option::is_none)
    }

    pub fn insert(&mut self, name: &str, head: BlockId) -> Result<()> {
        validate_name(name)?;
        if self.contains(name) {
            return Err(FileSystemError::AlreadyExists(name.to_string()));
        }
        if !self.has_room() {
            return Err(FileSystemError::DirectoryFull);
        }

        if let Some(slot) = self.slots.iter_mut().find(|slot| slot.is_none()) {
            *slot = Some(DirEntry {
                name: name.to_string(),
                head,
            });
        }
        debug!("directory: added {} -> block {}", name, head);
        Ok(())
    }

    /// 删除目录项，返回它的首块
    pub fn remove(&mut self, name: &str) -> Result<BlockId> {
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| matches!(slot, Some(entry) if entry.name == name))
            .ok_or_else(|| FileSystemError::NotFound(name.to_string()))?;

        let head = slot.take().map(|entry| entry.head).unwrap_or_default();
        debug!("directory: removed {} (block {})", name, head);
        Ok(head)
    }

    /// 按槽位顺序列出所有目录项
    pub fn entries(&self) -> impl Iterator<Item = &DirEntry> {
        self.slots.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
