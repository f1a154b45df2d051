use std::error::Error;

use chain_fs::{FileSystem, MemDisk};
use clap::Parser;

use crate::{
    cli::Cli,
    shell::{boot, start_shell},
};

mod cli;
mod shell;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.memory {
        let fs = FileSystem::format(MemDisk::new(cli.geometry()), cli.fs_config())?;
        start_shell(fs).unmount()?;
    } else {
        let fs = boot(&cli.disk, cli.geometry(), cli.fs_config())?;
        start_shell(fs).unmount()?.detach()?;
    }
    Ok(())
}
