use std::path::Path;

use log::info;

use crate::{
    disk::{file_disk::FileDisk, types::Geometry},
    fs::{FileSystem, FsConfig, Result},
};

/// 启动过程中的进度通知
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootProgress {
    Step(&'static str),
    Progress(u64, u64), // 已完成 / 总数
}

/// 打开镜像文件并挂载。镜像不存在时先创建并格式化
pub fn perform_disk_initialization<F>(
    path: &Path,
    geometry: Geometry,
    config: FsConfig,
    mut report: F,
) -> Result<FileSystem<FileDisk>>
where
    F: FnMut(BootProgress),
{
    report(BootProgress::Step("🧠 Initializing virtual disk..."));

    if path.exists() {
        let disk = FileDisk::attach(path, geometry)?;
        report(BootProgress::Step("⚙️  Mounting file system..."));
        let fs = FileSystem::mount(disk, config)?;
        report(BootProgress::Progress(1, 1));
        return Ok(fs);
    }

    // 只有新磁盘才格式化
    info!("no disk image at {}, creating one", path.display());
    report(BootProgress::Step(
        "🔧 No disk found, formatting new file system...",
    ));
    let disk = FileDisk::format(path, geometry)?;
    FileSystem::format_with(disk, config, |done, total| {
        report(BootProgress::Progress(done, total))
    })
}
