//! Interactive read-eval-print loop

use super::command::{Command, HELP};
use crate::container::ContainerEngine;
use crate::error::{DevhubError, Result};
use crate::workspace::{Transition, WorkspaceManager};
use std::io::Write;
use std::ops::ControlFlow;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

const PROMPT: &str = "Enter a command: ";

/// REPL driving a workspace manager
pub struct Repl<'a, E> {
    manager: WorkspaceManager<'a, E>,
}

impl<'a, E: ContainerEngine> Repl<'a, E> {
    pub fn new(manager: WorkspaceManager<'a, E>) -> Self {
        Self { manager }
    }

    #[cfg(test)]
    pub(crate) fn manager(&self) -> &WorkspaceManager<'a, E> {
        &self.manager
    }

    /// Read commands until `exit` or end of input
    ///
    /// Only I/O failures on the terminal end the loop early; every command
    /// failure is printed and the loop carries on.
    pub async fn run<R, W>(&self, mut input: R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut buf = Vec::new();
        writeln!(out, "h = help, e = exit")?;

        loop {
            write!(out, "{}", PROMPT)?;
            out.flush()?;

            buf.clear();
            if input.read_until(b'\n', &mut buf).await? == 0 {
                writeln!(out)?;
                break;
            }

            // Invalid UTF-8 is replaced and then rejected by name validation
            let line = String::from_utf8_lossy(&buf);

            let command = match Command::parse(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(e) => {
                    writeln!(out, "{}", e)?;
                    continue;
                }
            };

            if self.dispatch(command, out).await?.is_break() {
                break;
            }
        }

        writeln!(out, "Done.")?;
        Ok(())
    }

    /// Execute one command, writing its report
    pub async fn dispatch<W: Write>(&self, command: Command, out: &mut W) -> Result<ControlFlow<()>> {
        debug!("Dispatching {:?}", command);

        let report = match command {
            Command::Help => {
                for (usage, description) in HELP {
                    writeln!(out, "{} - {}", usage, description)?;
                }
                return Ok(ControlFlow::Continue(()));
            }
            Command::Exit => {
                writeln!(out, "Exiting...")?;
                return Ok(ControlFlow::Break(()));
            }
            Command::Create(name) => self.manager.create(&name).await.map(|p| p.to_string()),
            Command::Delete(name) => self
                .manager
                .delete(&name)
                .await
                .map(|()| format!("Deleted container '{}'.", name)),
            Command::Start(name) => self.manager.start(&name).await.map(|t| match t {
                Transition::Changed => format!("Started container '{}'.", name),
                Transition::Unchanged => format!("Container '{}' is already running.", name),
            }),
            Command::Stop(name) => self.manager.stop(&name).await.map(|t| match t {
                Transition::Changed => format!("Stopped container '{}'.", name),
                Transition::Unchanged => format!("Container '{}' is already stopped.", name),
            }),
            Command::List => self.manager.list().await.map(|entries| {
                if entries.is_empty() {
                    "No containers found.".to_string()
                } else {
                    std::iter::once("Current containers:".to_string())
                        .chain(entries.iter().map(|e| e.to_string()))
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }),
        };

        match report {
            Ok(text) => writeln!(out, "{}", text)?,
            // Terminal I/O failures end the loop
            Err(DevhubError::Io(e)) => return Err(DevhubError::Io(e)),
            Err(e) => {
                debug!("Command failed: {:?}", e);
                writeln!(out, "{}", e)?;
            }
        }

        Ok(ControlFlow::Continue(()))
    }
}
