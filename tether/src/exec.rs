//! Shell execution bridge: one command line in, captured stdout out.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

/// Captured result of one shell command.
#[derive(Debug)]
pub struct ExecOutput {
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Everything the process wrote to its stdout.
    pub stdout: Vec<u8>,
}

/// Runs `line` through the platform shell with `cwd` as working directory.
///
/// The whole of stdout is buffered before returning, bounded only by
/// available memory; stderr passes through to this process's own stderr.
/// A spawn failure surfaces as the `io::Error` from the OS.
pub async fn run(line: &str, cwd: &Path) -> std::io::Result<ExecOutput> {
    let output = shell_command(line)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .output()
        .await?;
    Ok(ExecOutput {
        success: output.status.success(),
        stdout: output.stdout,
    })
}

/// Builds the platform shell invocation for a raw command line.
#[cfg(windows)]
fn shell_command(line: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", line]);
    cmd
}

/// Builds the platform shell invocation for a raw command line.
#[cfg(not(windows))]
fn shell_command(line: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", line]);
    cmd
}
