use std::error::Error;

use chain_fs::{BlockDevice, Fd, FileSystem};
use colored::*;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Debug)]
pub enum Command {
    Help,
    Ls,
    Df,
    Fds,
    Create(String),
    Rm(String),
    Open(String),
    Close(Fd),
    Read(Fd, usize),
    Write(Fd, String),
    Seek(Fd, u64),
    Truncate(Fd, u64),
    Size(Fd),
    Cat(String),
    Format,
    Exit,
}

pub fn execute_command<D: BlockDevice>(
    cmd: &Command,
    fs: &mut FileSystem<D>,
) -> Result<(), Box<dyn Error>> {
    match cmd {
        Command::Help => print_help(),
        Command::Ls => {
            let entries = fs.list();
            if entries.is_empty() {
                println!("{}", "(empty)".bright_black());
            }
            for entry in entries {
                println!(
                    "📄  {:<16} {}",
                    entry.name,
                    format!("head={}", entry.head).bright_black()
                );
            }
        }
        Command::Df => {
            let geometry = fs.geometry();
            let free = fs.free_blocks()?;
            println!(
                "💾 {} of {} data blocks free ({} bytes each, {} payload)",
                free.to_string().green(),
                geometry.block_count - 1,
                geometry.block_size,
                fs.payload_capacity()
            );
        }
        Command::Fds => {
            for (fd, handle) in fs.open_files() {
                println!(
                    "{} {:<16} {}",
                    format!("[{}]", fd).cyan(),
                    handle.name,
                    format!("block={} offset={}", handle.block, handle.offset).bright_black()
                );
            }
        }
        Command::Create(name) => {
            fs.create(name)?;
            println!("📝 Created file: {}", name.green());
        }
        Command::Rm(name) => {
            fs.delete(name)?;
            println!("❌ Deleted file: {}", name.red());
        }
        Command::Open(name) => {
            let fd = fs.open(name)?;
            println!("📂 Opened {} as fd {}", name.cyan(), fd.to_string().bold());
        }
        Command::Close(fd) => {
            fs.close(*fd)?;
            println!("🔒 Closed fd {}", fd);
        }
        Command::Read(fd, n) => {
            let mut buf = vec![0u8; *n];
            let read = fs.read(*fd, &mut buf)?;
            println!("{}", String::from_utf8_lossy(&buf[..read]));
            println!("{}", format!("({} bytes)", read).bright_black());
        }
        Command::Write(fd, content) => {
            let written = fs.write(*fd, content.as_bytes())?;
            if written < content.len() {
                println!(
                    "{} only {} of {} bytes fit on disk",
                    "⚠️ ".yellow(),
                    written,
                    content.len()
                );
            } else {
                println!("{} {} bytes", "✅ Wrote".green(), written);
            }
        }
        Command::Seek(fd, offset) => {
            fs.seek(*fd, *offset)?;
            println!("📍 fd {} at offset {}", fd, offset);
        }
        Command::Truncate(fd, length) => {
            fs.truncate(*fd, *length)?;
            println!("✂️  fd {} truncated to {} bytes", fd, length);
        }
        Command::Size(fd) => {
            println!(
                "{}\n{}: {} bytes\n{}: {} bytes\n",
                "📊 File Info".bright_yellow().bold(),
                "Size".blue(),
                fs.size(*fd)?,
                "Data".blue(),
                fs.len(*fd)?
            );
        }
        Command::Cat(name) => {
            let fd = fs.open(name)?;
            let contents = read_to_end(fs, fd);
            fs.close(fd)?;
            println!("{}", String::from_utf8_lossy(&contents?));
        }
        Command::Format => {
            let confirmed = Confirm::new()
                .with_prompt("Erase every file on this volume?")
                .default(false)
                .interact()?;
            if !confirmed {
                return Ok(());
            }

            println!("💾 Formatting volume...");
            let pb = ProgressBar::new(fs.geometry().block_count);
            pb.set_style(
                ProgressStyle::with_template("[{bar:40.green/black}] {pos}/{len} {msg}")?
                    .progress_chars("#>-"),
            );
            fs.reformat_with(|done, _| pb.set_position(done))?;
            pb.finish_with_message("✅ Disk formatted successfully!");
        }
        Command::Exit => println!("{}", "👋 Exiting chain-fs shell...".yellow().bold()),
    }

    Ok(())
}

fn read_to_end<D: BlockDevice>(fs: &mut FileSystem<D>, fd: Fd) -> chain_fs::Result<Vec<u8>> {
    let mut contents = Vec::new();
    let mut buf = vec![0u8; fs.payload_capacity()];
    loop {
        let n = fs.read(fd, &mut buf)?;
        if n == 0 {
            return Ok(contents);
        }
        contents.extend_from_slice(&buf[..n]);
    }
}

fn print_help() {
    println!("{}", "📘 chain-fs Commands".bright_cyan().bold());
    println!(
        "{}",
        "
  ls                   List files
  df                   Show free blocks
  fds                  List open file descriptors
  create <file>        Create an empty file
  rm <file>            Delete a file
  open <file>          Open a file, prints its fd
  close <fd>           Close a file descriptor
  read <fd> <n>        Read up to n bytes at the cursor
  write <fd> <str>     Write a string at the cursor
  seek <fd> <offset>   Move the cursor
  truncate <fd> <len>  Shrink a file
  size <fd>            Show file size
  cat <file>           Print a whole file
  format               Erase the volume
  help                 Show this help message
  exit                 Quit the shell
"
        .bright_black()
    );
}
