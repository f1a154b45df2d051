/// 目录块固定为 0 号块
pub const DIRECTORY_BLOCK_ID: u32 = 0;

/// 第一个可用于存放文件数据的块
pub const FIRST_DATA_BLOCK_ID: u32 = 1;

/// 链表结束标记（next 指针为 0）
pub const END_OF_CHAIN: u32 = 0;

// 块头：flags(1) + reserved(1) + len(2) + next(4)
pub const BLOCK_HEADER_SIZE: usize = 8;

/// 文件名最大字节数
pub const FILENAME_SIZE: usize = 15;

// 目录槽：in_use(1) + name_len(1) + name(15) + head(4)
pub const DIR_SLOT_SIZE: usize = 21;

/// 默认最多同时打开的文件数
pub const MAX_DESC: usize = 32;

/// 运行期可调的文件系统参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsConfig {
    /// 打开文件表的容量
    pub max_open_files: usize,
    /// 目录最多容纳的文件数，`None` 表示用满目录块的全部槽位。
    /// 槽位数 = 块大小 / 21，128 字节的块只能放 6 个文件
    pub max_files: Option<usize>,
}

impl FsConfig {
    /// 实际目录容量：不超过目录块能放下的槽位数
    pub fn directory_capacity(&self, block_size: usize) -> usize {
        let slots = block_size / DIR_SLOT_SIZE;
        match self.max_files {
            Some(limit) => limit.min(slots),
            None => slots,
        }
    }
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            max_open_files: MAX_DESC,
            max_files: None,
        }
    }
}
