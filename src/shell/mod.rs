pub mod command;
pub mod parse;

use crate::shell::{command::execute_command, parse::parse_command};
use chain_fs::{
    disk::{
        init::{perform_disk_initialization, BootProgress},
        FileDisk,
    },
    BlockDevice, FileSystem, FsConfig, Geometry,
};
use colored::*;
use crossterm::{
    cursor, execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use indicatif::{ProgressBar, ProgressStyle};
use reedline::{
    DefaultCompleter, DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal,
};
use std::{error::Error, io::stdout, path::Path, path::PathBuf};

/// 挂接磁盘镜像，新磁盘格式化时显示进度条
pub fn boot(
    path: &Path,
    geometry: Geometry,
    config: FsConfig,
) -> Result<FileSystem<FileDisk>, Box<dyn Error>> {
    let mut stdout = stdout();
    execute!(stdout, Clear(ClearType::All), cursor::MoveTo(0, 0))?;
    println!("{}", "[chain-fs Booting...]".bright_yellow().bold());

    let pb = ProgressBar::new(geometry.block_count);
    pb.set_style(
        ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos:>5}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let fs = perform_disk_initialization(path, geometry, config, |progress| match progress {
        BootProgress::Step(step) => pb.println(step),
        BootProgress::Progress(done, total) => {
            pb.set_length(total);
            pb.set_position(done);
        }
    })?;
    pb.finish_with_message("✅ Ready!");

    execute!(
        stdout,
        SetForegroundColor(Color::Cyan),
        Print(format!(
            "Welcome to chain-fs v{}\n",
            env!("CARGO_PKG_VERSION")
        )),
        ResetColor
    )?;
    Ok(fs)
}

/// 交互式命令循环，退出时交还文件系统以便卸载
pub fn start_shell<D: BlockDevice>(mut fs: FileSystem<D>) -> FileSystem<D> {
    let username = whoami::username();
    let hostname = whoami::fallible::hostname().unwrap_or_else(|_| "localhost".to_string());

    println!(
        "{}",
        "Type 'help' for available commands. Use ↑↓ for history, Tab for auto-completion.\n"
            .bright_black()
    );

    let history_path = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".chainfs_history");

    let mut line_editor = Reedline::create();
    match FileBackedHistory::with_file(100, history_path) {
        Ok(history) => line_editor = line_editor.with_history(Box::new(history)),
        Err(e) => log::warn!("command history disabled: {}", e),
    }

    // 命令补全
    let commands = vec![
        "help", "ls", "df", "fds", "create", "rm", "open", "close", "read", "write", "seek",
        "truncate", "size", "cat", "format", "exit",
    ]
    .into_iter()
    .map(String::from)
    .collect();
    let completer = DefaultCompleter::new_with_wordlen(commands, 2);
    line_editor = line_editor.with_completer(Box::new(completer));

    let prompt = DefaultPrompt::new(
        DefaultPromptSegment::Basic(format!(
            "{}@{}",
            username.green().bold(),
            hostname.cyan().bold()
        )),
        DefaultPromptSegment::Basic("chain-fs".bright_blue().bold().to_string()),
    );

    loop {
        match line_editor.read_line(&prompt) {
            Ok(Signal::Success(buffer)) => {
                let trimmed = buffer.trim();
                if trimmed.is_empty() {
                    continue;
                }

                match parse_command(trimmed) {
                    Some(cmd) => {
                        if let Err(e) = execute_command(&cmd, &mut fs) {
                            println!("{} {}", "❌ Error:".red().bold(), e);
                        }
                        if matches!(cmd, command::Command::Exit) {
                            break;
                        }
                    }
                    None => println!(
                        "{}",
                        "⚠️  Unknown command. Type 'help' for command list.".yellow()
                    ),
                }
            }
            Ok(Signal::CtrlC) => {
                println!();
                continue;
            }
            Ok(Signal::CtrlD) => {
                println!("{}", "Exiting chain-fs...".yellow());
                break;
            }
            Err(e) => {
                println!("Error reading line: {}", e);
                break;
            }
        }
    }

    println!("{}", "GoodBye!".bright_yellow());
    fs
}
