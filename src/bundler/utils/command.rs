//! Subprocess execution for the external tools the release drives
//! (cargo, lipo, gpg, aws).

use crate::bundler::error::{Error, Result};
use std::process::{Output, Stdio};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Renders a command as a single shell-like line for logs and errors.
pub fn describe(command: &Command) -> String {
    let std = command.as_std();
    std::iter::once(std.get_program())
        .chain(std.get_args())
        .map(|part| part.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

fn spawn_error(command: String, error: std::io::Error) -> Error {
    Error::ToolInvocation {
        command,
        code: None,
        stderr: error.to_string(),
    }
}

fn check(command: String, output: Output) -> Result<Output> {
    if output.status.success() {
        return Ok(output);
    }
    Err(Error::ToolInvocation {
        command,
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

/// Runs a command to completion with captured output.
///
/// Non-zero exit becomes [`Error::ToolInvocation`] carrying stderr.
pub async fn run_captured(mut command: Command) -> Result<Output> {
    let description = describe(&command);
    log::debug!("Running {}", description);

    let output = command
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| spawn_error(description.clone(), e))?;

    check(description, output)
}

/// Runs a command with inherited stdio so long builds stream to the terminal.
pub async fn run_inherited(mut command: Command) -> Result<()> {
    let description = describe(&command);
    log::info!("Running {}", description);

    let status = command
        .stdin(Stdio::null())
        .status()
        .await
        .map_err(|e| spawn_error(description.clone(), e))?;

    if !status.success() {
        return Err(Error::ToolInvocation {
            command: description,
            code: status.code(),
            stderr: "see output above".to_string(),
        });
    }
    Ok(())
}

/// Runs a command feeding `input` on stdin, capturing output.
pub async fn run_with_input(mut command: Command, input: &[u8]) -> Result<Output> {
    let description = describe(&command);
    log::debug!("Running {}", description);

    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| spawn_error(description.clone(), e))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(input)
            .await
            .map_err(|e| spawn_error(description.clone(), e))?;
    }

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| spawn_error(description.clone(), e))?;

    check(description, output)
}
