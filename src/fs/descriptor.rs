use crate::fs::{
    block::BlockId,
    error::{FileSystemError, Result},
};

/// 文件描述符，即打开文件表中的槽位下标
pub type Fd = usize;

/// 一个打开文件的读写游标，只存在于内存中
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    pub name: String,
    pub head: BlockId,  // 首块
    pub block: BlockId, // 当前块
    pub offset: usize,  // 块内偏移
}

impl FileHandle {
    pub fn new(name: &str, head: BlockId) -> Self {
        Self {
            name: name.to_string(),
            head,
            block: head,
            offset: 0,
        }
    }
}

/// 定长的打开文件表，同一文件最多打开一次
#[derive(Debug)]
pub struct OpenFileTable {
    slots: Vec<Option<FileHandle>>,
}

impl OpenFileTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    pub fn is_open(&self, name: &str) -> bool {
        self.iter().any(|(_, handle)| handle.name == name)
    }

    /// 放入第一个空槽，返回描述符
    pub fn insert(&mut self, handle: FileHandle) -> Result<Fd> {
        if self.is_open(&handle.name) {
            return Err(FileSystemError::AlreadyOpen(handle.name));
        }
        let fd = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(FileSystemError::TooManyOpenFiles)?;
        self.slots[fd] = Some(handle);
        Ok(fd)
    }

    /// 关闭描述符。空槽也视为无效，防止重复关闭
    pub fn remove(&mut self, fd: Fd) -> Result<FileHandle> {
        self.slots
            .get_mut(fd)
            .and_then(Option::take)
            .ok_or(FileSystemError::InvalidDescriptor(fd))
    }

    pub fn get(&self, fd: Fd) -> Result<&FileHandle> {
        self.slots
            .get(fd)
            .and_then(Option::as_ref)
            .ok_or(FileSystemError::InvalidDescriptor(fd))
    }

    pub fn get_mut(&mut self, fd: Fd) -> Result<&mut FileHandle> {
        self.slots
            .get_mut(fd)
            .and_then(Option::as_mut)
            .ok_or(FileSystemError::InvalidDescriptor(fd))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Fd, &FileHandle)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(fd, slot)| slot.as_ref().map(|handle| (fd, handle)))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }
}
