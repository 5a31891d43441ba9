// In-band REPL commands. Anything starting with ':' is a command; every
// other line is a query.

use std::fmt;

/// A recognized `:` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `:p N` - show picture N (1-based) from the last result.
    ShowPicture(usize),
    /// `:allpics` - show every picture from the last result.
    AllPictures,
    /// `:q` / `:quit`
    Quit,
    /// `:help`
    Help,
}

/// Why a `:` line was rejected. `Display` gives the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// `:p` with something that isn't a number.
    NotANumber,
    Unknown,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::NotANumber => f.write_str("NaN."),
            CommandError::Unknown => f.write_str("Unknown command."),
        }
    }
}

impl std::error::Error for CommandError {}

pub const HELP: &str = "\
Type a query and press Enter.
  :p N       show picture N from the last result
  :allpics   show every picture from the last result
  :q         quit (Ctrl-D works too)";

impl Command {
    /// Parse a line. Returns `None` when the line is not a command at all.
    pub fn parse(line: &str) -> Option<Result<Command, CommandError>> {
        let rest = line.trim().strip_prefix(':')?;
        let mut words = rest.split_whitespace();
        let cmd = match (words.next(), words.next(), words.next()) {
            (Some("p"), arg, None) => arg
                .and_then(|n| n.parse::<usize>().ok())
                .map(Command::ShowPicture)
                .ok_or(CommandError::NotANumber),
            (Some("allpics"), None, None) => Ok(Command::AllPictures),
            (Some("q" | "quit"), None, None) => Ok(Command::Quit),
            (Some("help"), None, None) => Ok(Command::Help),
            _ => Err(CommandError::Unknown),
        };
        Some(cmd)
    }
}
