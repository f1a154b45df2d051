use log::{debug, info, warn};

use crate::{
    disk::BlockDevice,
    fs::{
        allocator,
        config::END_OF_CHAIN,
        descriptor::{Fd, FileHandle},
        directory::validate_name,
        error::{FileSystemError, Result},
        extent_chain, FileSystem,
    },
};

impl<D: BlockDevice> FileSystem<D> {
    /// 新建一个空文件：分配一个块作为首块并登记到目录
    pub fn create(&mut self, name: &str) -> Result<()> {
        validate_name(name)?;
        if self.directory.contains(name) {
            return Err(FileSystemError::AlreadyExists(name.to_string()));
        }

        let head = allocator::allocate(&self.disk)?;
        if !self.directory.has_room() {
            return Err(FileSystemError::DirectoryFull);
        }

        allocator::initialize(&self.disk, head)?;
        self.directory.insert(name, head)?;
        self.directory.sync(&self.disk)?;
        info!("created {} at block {}", name, head);
        Ok(())
    }

    /// 删除文件：释放整条链并移除目录项。打开中的文件不能删除
    pub fn delete(&mut self, name: &str) -> Result<()> {
        if self.open_files.is_open(name) {
            return Err(FileSystemError::AlreadyOpen(name.to_string()));
        }

        // 先摘掉目录项再释放，目录不会指向释放了一半的链
        let head = self.directory.remove(name)?;
        self.directory.sync(&self.disk)?;
        let released = extent_chain::release_chain(&self.disk, head)?;
        info!("deleted {} ({} blocks released)", name, released);
        Ok(())
    }

    /// 打开文件，游标位于文件开头
    pub fn open(&mut self, name: &str) -> Result<Fd> {
        let head = self.directory.lookup(name)?;
        let fd = self.open_files.insert(FileHandle::new(name, head))?;
        debug!("opened {} as fd {}", name, fd);
        Ok(fd)
    }

    pub fn close(&mut self, fd: Fd) -> Result<()> {
        let handle = self.open_files.remove(fd)?;
        debug!("closed fd {} ({})", fd, handle.name);
        Ok(())
    }

    /// 从游标处读取最多 `buf.len()` 个字节，返回实际读到的字节数。
    ///
    /// 当前块读完后沿链进入下一块；到达链尾时提前返回。
    pub fn read(&mut self, fd: Fd, buf: &mut [u8]) -> Result<usize> {
        let handle = self.open_files.get_mut(fd)?;
        let mut done = 0;

        while done < buf.len() {
            let block = extent_chain::fetch(&self.disk, handle.block)?;
            let payload = block.payload();

            if handle.offset < payload.len() {
                let n = (payload.len() - handle.offset).min(buf.len() - done);
                buf[done..done + n].copy_from_slice(&payload[handle.offset..handle.offset + n]);
                handle.offset += n;
                done += n;
                if done == buf.len() {
                    break;
                }
            }

            match block.next() {
                END_OF_CHAIN => break,
                next => {
                    handle.block = next;
                    handle.offset = 0;
                }
            }
        }
        Ok(done)
    }

    /// 从游标处写入 `buf`，返回实际写入的字节数。
    ///
    /// 每个块在游标处截断后追加数据；块写满后进入已有的下一块，
    /// 没有下一块才分配新块。分配失败时返回已写入的字节数。
    pub fn write(&mut self, fd: Fd, buf: &[u8]) -> Result<usize> {
        let handle = self.open_files.get_mut(fd)?;
        let mut written = 0;

        while written < buf.len() {
            let mut block = extent_chain::fetch(&self.disk, handle.block)?;

            if handle.offset >= block.capacity() {
                let next = match block.next() {
                    END_OF_CHAIN => match allocator::allocate(&self.disk) {
                        Ok(id) => {
                            allocator::initialize(&self.disk, id)?;
                            extent_chain::link(&self.disk, handle.block, id)?;
                            id
                        }
                        Err(FileSystemError::NoFreeBlocks) => {
                            warn!(
                                "disk full: wrote {} of {} bytes to {}",
                                written,
                                buf.len(),
                                handle.name
                            );
                            break;
                        }
                        Err(e) => return Err(e),
                    },
                    next => next,
                };
                handle.block = next;
                handle.offset = 0;
                continue;
            }

            let n = block.splice(handle.offset, &buf[written..]);
            block.write(&self.disk)?;
            handle.offset += n;
            written += n;
        }
        Ok(written)
    }

    /// 文件占用的块数 × 块大小。粒度是整块，不是精确字节数
    pub fn size(&self, fd: Fd) -> Result<u64> {
        let head = self.open_files.get(fd)?.head;
        let blocks = extent_chain::walk(&self.disk, head)?.len() as u64;
        Ok(blocks * self.geometry.block_size as u64)
    }

    /// 文件的精确字节数：链上所有块已用数据长度之和
    pub fn len(&self, fd: Fd) -> Result<u64> {
        let head = self.open_files.get(fd)?.head;
        let mut total = 0;
        for id in extent_chain::walk(&self.disk, head)? {
            total += extent_chain::fetch(&self.disk, id)?.len() as u64;
        }
        Ok(total)
    }

    /// 游标相对文件开头的位置（按每块满容量计算）
    pub fn tell(&self, fd: Fd) -> Result<u64> {
        let capacity = self.payload_capacity() as u64;
        let handle = self.open_files.get(fd)?;
        let chain = extent_chain::walk(&self.disk, handle.head)?;
        let index = chain
            .iter()
            .position(|&id| id == handle.block)
            .ok_or_else(|| {
                FileSystemError::Corrupted(format!(
                    "fd {} points at block {} outside its chain",
                    fd, handle.block
                ))
            })?;
        Ok(index as u64 * capacity + handle.offset as u64)
    }

    /// 把游标移到距文件开头 `offset` 字节处。
    ///
    /// 块号 = offset / 每块容量，块内偏移 = offset % 每块容量。
    /// 尾块写满时，恰好位于它末尾的位置也是合法的。
    pub fn seek(&mut self, fd: Fd, offset: u64) -> Result<()> {
        let capacity = self.payload_capacity() as u64;
        let limit = self.geometry.block_count;
        let handle = self.open_files.get_mut(fd)?;

        let target_block = offset / capacity;
        let target_offset = (offset % capacity) as usize;

        let mut block = handle.head;
        let mut steps = 0;
        while steps < target_block {
            if steps >= limit {
                return Err(FileSystemError::Corrupted(format!(
                    "chain of {} does not terminate",
                    handle.name
                )));
            }
            let current = extent_chain::fetch(&self.disk, block)?;
            match current.next() {
                END_OF_CHAIN
                    if steps + 1 == target_block
                        && target_offset == 0
                        && current.len() == current.capacity() =>
                {
                    handle.block = block;
                    handle.offset = current.capacity();
                    return Ok(());
                }
                END_OF_CHAIN => return Err(FileSystemError::SeekOutOfRange(offset)),
                next => block = next,
            }
            steps += 1;
        }

        handle.block = block;
        handle.offset = target_offset;
        Ok(())
    }

    /// 把文件截短到 `length` 字节，`length` 不小于当前大小时什么都不做。
    ///
    /// `length` 所在块保留之前的数据并成为新的链尾，之后的块全部释放。
    /// `length` 恰好落在块边界且前一块已写满时，从边界处的块开始释放。
    /// 首块永远不会被释放。游标停在 `length` 处。
    pub fn truncate(&mut self, fd: Fd, length: u64) -> Result<()> {
        let capacity = self.payload_capacity();
        let head = self.open_files.get(fd)?.head;
        let chain = extent_chain::walk(&self.disk, head)?;
        let blocks = chain.len() as u64;
        let size = blocks * self.geometry.block_size as u64;
        if length >= size || length >= blocks * capacity as u64 {
            return Ok(());
        }

        let index = (length / capacity as u64) as usize;
        let offset = (length % capacity as u64) as usize;

        let mut tail = None;
        if offset == 0 && index > 0 {
            let previous = extent_chain::fetch(&self.disk, chain[index - 1])?;
            if previous.len() == capacity {
                tail = Some((previous, capacity));
            }
        }
        let (mut block, cut) = match tail {
            Some(tail) => tail,
            None => (extent_chain::fetch(&self.disk, chain[index])?, offset),
        };
        let rest = block.next();

        block.truncate_payload(cut);
        block.set_next(END_OF_CHAIN);
        block.write(&self.disk)?;

        let released = match rest {
            END_OF_CHAIN => 0,
            rest => extent_chain::release_chain(&self.disk, rest)?,
        };

        let handle = self.open_files.get_mut(fd)?;
        handle.block = block.id;
        handle.offset = cut;
        debug!(
            "truncated {} to {} bytes ({} blocks released)",
            handle.name, length, released
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        disk::{Geometry, MemDisk},
        fs::FsConfig,
    };

    // 32 字节块，每块 24 字节数据
    fn small_fs(blocks: u64) -> FileSystem<MemDisk> {
        FileSystem::format(MemDisk::new(Geometry::new(32, blocks)), FsConfig::default()).unwrap()
    }

    fn read_all(fs: &mut FileSystem<MemDisk>, fd: Fd) -> Vec<u8> {
        let mut out = Vec::new();
        let mut buf = [0u8; 10];
        loop {
            let n = fs.read(fd, &mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        out
    }

    #[test]
    fn write_then_read_within_one_block() {
        let mut fs = small_fs(8);
        fs.create("f").unwrap();
        let fd = fs.open("f").unwrap();
        assert_eq!(fs.write(fd, b"bytes\0with\xffnul").unwrap(), 14);

        fs.seek(fd, 0).unwrap();
        let mut buf = [0u8; 14];
        assert_eq!(fs.read(fd, &mut buf).unwrap(), 14);
        assert_eq!(&buf, b"bytes\0with\xffnul");
        assert_eq!(fs.len(fd).unwrap(), 14);
    }

    #[test]
    fn every_length_below_one_block_reads_back() {
        let mut fs = small_fs(8);
        fs.create("f").unwrap();
        let fd = fs.open("f").unwrap();
        let capacity = fs.payload_capacity();

        for len in 0..capacity {
            let data: Vec<u8> = (0..len).map(|i| (i * 37 + len) as u8).collect();
            fs.truncate(fd, 0).unwrap();
            assert_eq!(fs.write(fd, &data).unwrap(), len);

            fs.seek(fd, 0).unwrap();
            let mut buf = vec![0u8; capacity];
            assert_eq!(fs.read(fd, &mut buf).unwrap(), len);
            assert_eq!(&buf[..len], &data[..]);
            assert_eq!(fs.len(fd).unwrap(), len as u64);
        }
    }

    #[test]
    fn spanning_boundaries_allocates_one_block_each() {
        let mut fs = small_fs(16);
        fs.create("f").unwrap();
        let fd = fs.open("f").unwrap();
        let free_before = fs.free_blocks().unwrap();

        // 24 字节正好一块，不会多分配
        fs.write(fd, &[1u8; 24]).unwrap();
        assert_eq!(fs.free_blocks().unwrap(), free_before);
        assert_eq!(fs.size(fd).unwrap(), 32);

        // 再写 50 字节跨越 3 个边界
        fs.write(fd, &[2u8; 50]).unwrap();
        assert_eq!(fs.free_blocks().unwrap(), free_before - 3);
        assert_eq!(fs.size(fd).unwrap(), 4 * 32);
        assert_eq!(fs.len(fd).unwrap(), 74);

        fs.seek(fd, 0).unwrap();
        let data = read_all(&mut fs, fd);
        assert_eq!(&data[..24], &[1u8; 24]);
        assert_eq!(&data[24..], &[2u8; 50][..]);
    }

    #[test]
    fn partial_write_when_disk_fills() {
        // 块 1 给文件，只剩块 2 可扩展
        let mut fs = small_fs(3);
        fs.create("f").unwrap();
        let fd = fs.open("f").unwrap();

        assert_eq!(fs.write(fd, &[9u8; 100]).unwrap(), 48);
        assert_eq!(fs.free_blocks().unwrap(), 0);
        assert_eq!(fs.write(fd, b"more").unwrap(), 0);
    }

    #[test]
    fn seek_walks_the_chain() {
        let mut fs = small_fs(8);
        fs.create("f").unwrap();
        let fd = fs.open("f").unwrap();
        let data: Vec<u8> = (0..60).collect();
        fs.write(fd, &data).unwrap();

        fs.seek(fd, 30).unwrap();
        assert_eq!(fs.tell(fd).unwrap(), 30);
        let mut buf = [0u8; 5];
        fs.read(fd, &mut buf).unwrap();
        assert_eq!(buf, [30, 31, 32, 33, 34]);

        assert!(matches!(
            fs.seek(fd, 80),
            Err(FileSystemError::SeekOutOfRange(80))
        ));
        // 失败的 seek 不移动游标
        assert_eq!(fs.tell(fd).unwrap(), 35);
    }

    #[test]
    fn seek_to_end_of_full_tail_then_append() {
        let mut fs = small_fs(8);
        fs.create("f").unwrap();
        let fd = fs.open("f").unwrap();
        fs.write(fd, &[1u8; 24]).unwrap();

        fs.seek(fd, 24).unwrap();
        fs.write(fd, b"tail").unwrap();
        assert_eq!(fs.len(fd).unwrap(), 28);
        assert_eq!(fs.size(fd).unwrap(), 64);
    }

    #[test]
    fn seek_past_short_tail_is_out_of_range() {
        let mut fs = small_fs(8);
        fs.create("f").unwrap();
        let fd = fs.open("f").unwrap();
        fs.write(fd, b"abc").unwrap();

        assert!(matches!(
            fs.seek(fd, 24),
            Err(FileSystemError::SeekOutOfRange(24))
        ));
        assert_eq!(fs.tell(fd).unwrap(), 3);

        // 块内越过数据末尾的位置补 0
        fs.seek(fd, 23).unwrap();
        fs.write(fd, b"X").unwrap();
        assert_eq!(fs.len(fd).unwrap(), 24);
        assert_eq!(fs.size(fd).unwrap(), 32);

        fs.seek(fd, 0).unwrap();
        let mut expected = b"abc".to_vec();
        expected.resize(23, 0);
        expected.push(b'X');
        assert_eq!(read_all(&mut fs, fd), expected);
    }

    #[test]
    fn overwrite_reuses_existing_blocks() {
        let mut fs = small_fs(8);
        fs.create("f").unwrap();
        let fd = fs.open("f").unwrap();
        fs.write(fd, &[1u8; 60]).unwrap();
        let free = fs.free_blocks().unwrap();

        fs.seek(fd, 0).unwrap();
        fs.write(fd, &[2u8; 30]).unwrap();
        assert_eq!(fs.free_blocks().unwrap(), free);
        assert_eq!(fs.size(fd).unwrap(), 3 * 32);
    }

    #[test]
    fn truncate_keeps_prefix_and_frees_tail() {
        let mut fs = small_fs(8);
        fs.create("f").unwrap();
        let fd = fs.open("f").unwrap();
        let data: Vec<u8> = (0..60).collect();
        fs.write(fd, &data).unwrap();
        let free = fs.free_blocks().unwrap();

        fs.truncate(fd, 30).unwrap();
        assert_eq!(fs.size(fd).unwrap(), 64);
        assert_eq!(fs.len(fd).unwrap(), 30);
        assert_eq!(fs.free_blocks().unwrap(), free + 1);

        fs.seek(fd, 0).unwrap();
        assert_eq!(read_all(&mut fs, fd), &data[..30]);
    }

    #[test]
    fn truncate_on_block_boundary_releases_landed_block() {
        let mut fs = small_fs(8);
        fs.create("f").unwrap();
        let fd = fs.open("f").unwrap();
        let data: Vec<u8> = (0..60).collect();
        fs.write(fd, &data).unwrap();
        let free = fs.free_blocks().unwrap();

        fs.truncate(fd, 24).unwrap();
        assert_eq!(fs.size(fd).unwrap(), 32);
        assert_eq!(fs.len(fd).unwrap(), 24);
        assert_eq!(fs.free_blocks().unwrap(), free + 2);
        assert_eq!(fs.tell(fd).unwrap(), 24);

        // 游标在截断处，继续写就是追加
        fs.write(fd, b"Z").unwrap();
        assert_eq!(fs.size(fd).unwrap(), 64);
        fs.seek(fd, 0).unwrap();
        let mut expected = data[..24].to_vec();
        expected.push(b'Z');
        assert_eq!(read_all(&mut fs, fd), expected);
    }

    #[test]
    fn truncate_on_boundary_matches_fresh_write() {
        let mut fs = small_fs(16);
        fs.create("f").unwrap();
        let fd = fs.open("f").unwrap();
        fs.write(fd, &[5u8; 100]).unwrap();
        fs.truncate(fd, 48).unwrap();
        let truncated = (fs.size(fd).unwrap(), fs.len(fd).unwrap());

        fs.truncate(fd, 0).unwrap();
        fs.write(fd, &[5u8; 48]).unwrap();
        assert_eq!(truncated, (fs.size(fd).unwrap(), fs.len(fd).unwrap()));
        assert_eq!(truncated, (64, 48));
    }

    #[test]
    fn delete_releases_every_block() {
        let mut fs = small_fs(8);
        let free = fs.free_blocks().unwrap();
        fs.create("f").unwrap();
        let fd = fs.open("f").unwrap();
        fs.write(fd, &[1u8; 70]).unwrap();
        fs.close(fd).unwrap();

        fs.delete("f").unwrap();
        assert_eq!(fs.free_blocks().unwrap(), free);
        assert!(fs.list().is_empty());
    }

    #[test]
    fn truncate_to_size_is_noop_and_to_zero_empties() {
        let mut fs = small_fs(8);
        fs.create("f").unwrap();
        let fd = fs.open("f").unwrap();
        fs.write(fd, b"some data").unwrap();

        let size = fs.size(fd).unwrap();
        fs.truncate(fd, size).unwrap();
        assert_eq!(fs.len(fd).unwrap(), 9);

        fs.truncate(fd, 0).unwrap();
        assert_eq!(fs.len(fd).unwrap(), 0);
        assert_eq!(fs.size(fd).unwrap(), 32);
        let mut buf = [0u8; 4];
        assert_eq!(fs.read(fd, &mut buf).unwrap(), 0);
    }

    #[test]
    fn descriptor_errors() {
        let mut fs = small_fs(8);
        let mut buf = [0u8; 1];
        assert!(matches!(
            fs.read(3, &mut buf),
            Err(FileSystemError::InvalidDescriptor(3))
        ));
        assert!(matches!(fs.close(99), Err(FileSystemError::InvalidDescriptor(99))));
        assert!(matches!(fs.open("ghost"), Err(FileSystemError::NotFound(_))));
    }

    #[test]
    fn open_file_cannot_be_deleted_or_reopened() {
        let mut fs = small_fs(8);
        fs.create("f").unwrap();
        let fd = fs.open("f").unwrap();
        assert!(matches!(fs.open("f"), Err(FileSystemError::AlreadyOpen(_))));
        assert!(matches!(fs.delete("f"), Err(FileSystemError::AlreadyOpen(_))));

        fs.close(fd).unwrap();
        fs.delete("f").unwrap();
        assert!(!fs.exists("f"));
        assert!(matches!(fs.delete("f"), Err(FileSystemError::NotFound(_))));
    }

    #[test]
    fn open_table_is_bounded() {
        let config = FsConfig {
            max_open_files: 2,
            ..FsConfig::default()
        };
        let mut fs =
            FileSystem::format(MemDisk::new(Geometry::new(128, 16)), config).unwrap();
        for name in ["a", "b", "c"] {
            fs.create(name).unwrap();
        }
        fs.open("a").unwrap();
        let fd = fs.open("b").unwrap();
        assert!(matches!(fs.open("c"), Err(FileSystemError::TooManyOpenFiles)));

        fs.close(fd).unwrap();
        assert_eq!(fs.open("c").unwrap(), fd);
    }

    #[test]
    fn create_reports_errors_in_order() {
        // 两个数据块，目录有 6 个槽
        let mut fs =
            FileSystem::format(MemDisk::new(Geometry::new(128, 3)), FsConfig::default()).unwrap();
        assert!(matches!(
            fs.create("a-very-long-file-name"),
            Err(FileSystemError::NameTooLong(_))
        ));
        fs.create("a").unwrap();
        assert!(matches!(fs.create("a"), Err(FileSystemError::AlreadyExists(_))));
        fs.create("b").unwrap();
        assert!(matches!(fs.create("c"), Err(FileSystemError::NoFreeBlocks)));
    }

    #[test]
    fn directory_full_leaves_block_free() {
        let mut fs = FileSystem::format(
            MemDisk::new(Geometry::new(32, 8)),
            FsConfig::default(),
        )
        .unwrap();
        // 32 字节的目录块只有 1 个槽
        fs.create("a").unwrap();
        let free = fs.free_blocks().unwrap();
        assert!(matches!(fs.create("b"), Err(FileSystemError::DirectoryFull)));
        assert_eq!(fs.free_blocks().unwrap(), free);
        assert_eq!(fs.list().len(), 1);
    }
}
