use std::fmt;

/// 文件系统错误类型
#[derive(Debug)]
pub enum FileSystemError {
    Io(std::io::Error),        // 底层 I/O 错误
    NotFound(String),          // 文件不存在
    AlreadyExists(String),     // 文件已存在
    AlreadyOpen(String),       // 文件已被打开
    TooManyOpenFiles,          // 打开文件表已满
    InvalidDescriptor(usize),  // 文件描述符无效
    NameTooLong(String),       // 文件名超长
    InvalidName(String),       // 文件名非法（如空名）
    DirectoryFull,             // 目录块已满
    NoFreeBlocks,              // 没有空闲块
    SeekOutOfRange(u64),       // 定位超出文件末尾
    Corrupted(String),         // 磁盘结构损坏
    InvalidGeometry(String),   // 设备几何参数不可用
}

impl From<std::io::Error> for FileSystemError {
    fn from(e: std::io::Error) -> Self {
        FileSystemError::Io(e)
    }
}

impl From<bincode::Error> for FileSystemError {
    fn from(e: bincode::Error) -> Self {
        FileSystemError::Corrupted(format!("undecodable on-disk record: {}", e))
    }
}

impl fmt::Display for FileSystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Disk I/O error: {}", e),
            Self::NotFound(name) => write!(f, "File not found: {}", name),
            Self::AlreadyExists(name) => write!(f, "File already exists: {}", name),
            Self::AlreadyOpen(name) => write!(f, "File is already open: {}", name),
            Self::TooManyOpenFiles => write!(f, "Too many open files"),
            Self::InvalidDescriptor(fd) => write!(f, "Invalid file descriptor: {}", fd),
            Self::NameTooLong(name) => write!(f, "File name too long: {}", name),
            Self::InvalidName(name) => write!(f, "Invalid file name: {:?}", name),
            Self::DirectoryFull => write!(f, "Directory is full"),
            Self::NoFreeBlocks => write!(f, "No free blocks left on disk"),
            Self::SeekOutOfRange(offset) => write!(f, "Seek offset {} is past end of file", offset),
            Self::Corrupted(desc) => write!(f, "File system corrupted: {}", desc),
            Self::InvalidGeometry(desc) => write!(f, "Unusable disk geometry: {}", desc),
        }
    }
}

// 支持链式错误，方便追踪底层原因
impl std::error::Error for FileSystemError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// 文件系统统一结果类型
pub type Result<T> = std::result::Result<T, FileSystemError>;
