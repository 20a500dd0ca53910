use std::future::Future;
use std::io;

use super::GenerationCommand;

/// Captured result of an external process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external commands. The host editor may supply its own.
pub trait ProcessRunner: Send + Sync {
    fn run(&self, command: &GenerationCommand) -> impl Future<Output = io::Result<ProcessOutput>> + Send;
}

/// Spawns commands with `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessRunner;

impl ProcessRunner for TokioProcessRunner {
    fn run(&self, command: &GenerationCommand) -> impl Future<Output = io::Result<ProcessOutput>> + Send {
        let mut process = tokio::process::Command::new(&command.program);
        process.args(&command.args).current_dir(&command.cwd);

        async move {
            let output = process.output().await?;
            Ok(ProcessOutput {
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        }
    }
}
