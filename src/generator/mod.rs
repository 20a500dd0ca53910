pub mod command;
pub mod progress;
pub mod runner;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::error::{Result, TagError};
use crate::index::{TagIndex, TagSnapshot};

pub use command::{GenerationCommand, GenerationConfig};
pub use progress::{GenerationProgress, ProgressSnapshot};
pub use runner::{ProcessOutput, ProcessRunner, TokioProcessRunner};

/// Outcome of a successful generation run
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub command: String,
    pub stdout: String,
    pub snapshot: TagSnapshot,
    pub duration: Duration,
}

/// Runs the tag generator and refreshes the index afterwards.
///
/// Runs for the same root are serialized; every completed run replaces the
/// whole snapshot, so repeated requests converge on the newest file.
pub struct TagGenerator<R: ProcessRunner = TokioProcessRunner> {
    runner: R,
    index: TagIndex,
    progress: GenerationProgress,
    locks: Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>,
}

impl TagGenerator<TokioProcessRunner> {
    pub fn new(index: TagIndex) -> Self {
        Self::with_runner(index, TokioProcessRunner)
    }
}

impl<R: ProcessRunner> TagGenerator<R> {
    pub fn with_runner(index: TagIndex, runner: R) -> Self {
        Self {
            runner,
            index,
            progress: GenerationProgress::new(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn progress(&self) -> &GenerationProgress {
        &self.progress
    }

    fn root_lock(&self, config: &GenerationConfig) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(config.root.clone()).or_default())
    }

    /// Runs the generator in the project root. On failure the cached index
    /// is left untouched; on success it is force-reloaded.
    pub async fn generate(&self, config: &GenerationConfig) -> Result<GenerationReport> {
        let lock = self.root_lock(config);
        let _guard = lock.lock().await;

        let command = config.command();
        let rendered = command.to_string();
        tracing::info!("Generating tags: {}", rendered);

        self.progress.start();
        let started = Instant::now();
        let result = self.run(&command).await;
        let result = match result {
            Ok(stdout) => self
                .index
                .load(&config.root, &config.tag_path, true)
                .await
                .map(|snapshot| (stdout, snapshot)),
            Err(e) => Err(e),
        };
        self.progress.finish(result.is_ok());

        let (stdout, snapshot) = result.inspect_err(|e| tracing::error!("{}", e))?;
        let duration = started.elapsed();
        tracing::info!(
            "Generated {} tags in {:.2}s",
            snapshot.len(),
            duration.as_secs_f64()
        );

        Ok(GenerationReport {
            command: rendered,
            stdout,
            snapshot,
            duration,
        })
    }

    async fn run(&self, command: &GenerationCommand) -> Result<String> {
        let output = self
            .runner
            .run(command)
            .await
            .map_err(|e| TagError::GenerationFailed {
                status: format!("could not start {}", command.program),
                stderr: e.to_string(),
                stdout: String::new(),
            })?;

        if !output.success() {
            let status = match output.code {
                Some(code) => format!("exit code {}", code),
                None => "terminated by signal".to_string(),
            };
            return Err(TagError::GenerationFailed {
                status,
                stderr: output.stderr,
                stdout: output.stdout,
            });
        }

        Ok(output.stdout)
    }
}
