//! Delegation to external one-shot processes.
//!
//! A few plugins wrap commands that only exist outside the bot, such as music player status
//! tools. They run here: the command line is split into words, spawned without a shell, and
//! killed if it exceeds its timeout. Plugins that delegate keep a [`TaskSlot`] so that a new
//! request replaces any outstanding one instead of piling up.

use std::process::Stdio;
use std::sync::Mutex;
use std::time::Duration;

use tokio::process::Command;
use tokio::task::JoinHandle;

use crate::Error;

/// Collected output of a finished subprocess.
#[derive(Debug)]
pub struct Output {
    /// Whether the process exited successfully.
    pub success: bool,
    /// Captured standard output, lossily decoded.
    pub stdout: String,
    /// Captured standard error, lossily decoded.
    pub stderr: String,
}

impl Output {
    /// Returns the first non-empty line of standard output.
    #[must_use]
    pub fn first_line(&self) -> Option<&str> {
        self.stdout.lines().map(str::trim).find(|line| !line.is_empty())
    }
}

/// Runs `command_line` with the given timeout and collects its output.
///
/// The command line is split with shell-style word rules but no shell is involved, so
/// substitutions and redirections are not interpreted.
///
/// # Errors
///
/// - [`Error::InvalidCommandLine`] if the command line is empty or cannot be split.
/// - [`Error::ProcessSpawn`] if the process cannot be started or awaited.
/// - [`Error::ProcessTimedOut`] if the timeout elapses first; the process is killed.
pub async fn run(command_line: &str, timeout: Duration) -> Result<Output, Error> {
    let words = shlex::split(command_line).ok_or(Error::InvalidCommandLine)?;
    let (program, args) = words.split_first().ok_or(Error::InvalidCommandLine)?;

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(Error::ProcessSpawn)?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| Error::ProcessTimedOut)?
        .map_err(Error::ProcessSpawn)?;

    Ok(Output {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Holder for a plugin's single outstanding background task.
///
/// Storing a new handle aborts the previous task, giving each plugin at most one delegated
/// request in flight.
#[derive(Default)]
pub struct TaskSlot {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl TaskSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `handle`, aborting whichever task held the slot before.
    pub fn replace(&self, handle: JoinHandle<()>) {
        let mut slot = self.handle.lock().expect("task slot lock poisoned");

        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_skips_blanks() {
        let output = Output {
            success: true,
            stdout: "\n  \nArtist - Title\nextra".to_string(),
            stderr: String::new(),
        };

        assert_eq!(output.first_line(), Some("Artist - Title"));
    }

    #[tokio::test]
    async fn empty_command_line_is_rejected() {
        let result = run("", Duration::from_secs(1)).await;

        assert!(matches!(result, Err(Error::InvalidCommandLine)));
    }

    #[tokio::test]
    async fn captures_stdout() {
        let output = run("echo hello world", Duration::from_secs(5))
            .await
            .expect("echo should run");

        assert!(output.success);
        assert_eq!(output.first_line(), Some("hello world"));
    }
}
