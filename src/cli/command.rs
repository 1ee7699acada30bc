//! Parsing of REPL input lines

use crate::error::{DevhubError, Result};

/// A parsed REPL command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Exit,
    Create(String),
    Delete(String),
    Start(String),
    Stop(String),
    List,
}

/// Usage and description of every command, in help order
pub const HELP: &[(&str, &str)] = &[
    ("h, help", "list of commands"),
    ("e, exit", "exit the program"),
    ("c, create <name>", "Create a new dev container"),
    ("d, delete <name>", "Delete an existing container"),
    ("start <name>", "Start a stopped container"),
    ("stop <name>", "Stop a running container"),
    ("l, list", "List all dev containers"),
];

impl Command {
    /// Parse one input line
    ///
    /// Blank lines yield `Ok(None)`. Unknown verbs and wrong argument counts
    /// are reported as errors instead of being dispatched.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let mut tokens = line.split_whitespace();
        let verb = match tokens.next() {
            Some(verb) => verb,
            None => return Ok(None),
        };
        let args: Vec<&str> = tokens.collect();

        let command = match verb {
            "help" | "h" => no_args(&args, "help", Command::Help)?,
            "exit" | "e" => no_args(&args, "exit", Command::Exit)?,
            "list" | "l" => no_args(&args, "list", Command::List)?,
            "create" | "c" => Command::Create(one_arg(&args, "create <name>")?),
            "delete" | "d" => Command::Delete(one_arg(&args, "delete <name>")?),
            "start" => Command::Start(one_arg(&args, "start <name>")?),
            "stop" => Command::Stop(one_arg(&args, "stop <name>")?),
            other => return Err(DevhubError::UnknownCommand(other.to_string())),
        };

        Ok(Some(command))
    }
}

fn no_args(args: &[&str], usage: &'static str, command: Command) -> Result<Command> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(DevhubError::Usage(usage))
    }
}

fn one_arg(args: &[&str], usage: &'static str) -> Result<String> {
    match args {
        [name] => Ok(name.to_string()),
        _ => Err(DevhubError::Usage(usage)),
    }
}
