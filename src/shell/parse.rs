use crate::shell::command::Command;

pub fn parse_command(input: &str) -> Option<Command> {
    let tokens: Vec<&str> = input.trim().split_ascii_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }

    let cmd = tokens[0];
    let args = &tokens[1..];

    match cmd {
        "help" => Some(Command::Help),
        "ls" => Some(Command::Ls),
        "df" => Some(Command::Df),
        "fds" => Some(Command::Fds),
        "create" => args.first().map(|&name| Command::Create(name.to_string())),
        "rm" => args.first().map(|&name| Command::Rm(name.to_string())),
        "open" => args.first().map(|&name| Command::Open(name.to_string())),
        "cat" => args.first().map(|&name| Command::Cat(name.to_string())),
        "close" => Some(Command::Close(args.first()?.parse().ok()?)),
        "size" => Some(Command::Size(args.first()?.parse().ok()?)),
        "read" => Some(Command::Read(
            args.first()?.parse().ok()?,
            args.get(1)?.parse().ok()?,
        )),
        "seek" => Some(Command::Seek(
            args.first()?.parse().ok()?,
            args.get(1)?.parse().ok()?,
        )),
        "truncate" => Some(Command::Truncate(
            args.first()?.parse().ok()?,
            args.get(1)?.parse().ok()?,
        )),
        "write" => {
            if args.len() >= 2 {
                Some(Command::Write(args[0].parse().ok()?, args[1..].join(" ")))
            } else {
                None
            }
        }
        "format" => Some(Command::Format),
        "exit" => Some(Command::Exit),
        _ => None,
    }
}
