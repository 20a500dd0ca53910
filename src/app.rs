//! Application context: one project root, its configuration, the shared
//! index and everything that keeps it fresh.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::config::Config;
use crate::error::Result;
use crate::generator::{
    GenerationCommand, GenerationConfig, GenerationReport, ProcessRunner, TagGenerator,
    TokioProcessRunner,
};
use crate::git::GitHooks;
use crate::index::watcher::WATCH_DEBOUNCE;
use crate::index::{IndexStore, TagIndex, TagSnapshot, WatchRegistry};
use crate::session::{
    AdminAction, PickerEvent, Presenter, QuerySession, SessionOptions, SessionOutcome,
};
use crate::tags::TagRecord;

/// Opens documents in the host editor
pub trait Editor {
    /// `line` is 0-based
    fn open_and_reveal(&self, path: &Path, line: u32) -> Result<()>;
}

/// Broadcast after the watcher reloaded a changed tag file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReindexNotice {
    pub root: PathBuf,
    pub tag_count: usize,
}

pub struct App<R: ProcessRunner = TokioProcessRunner> {
    root: PathBuf,
    config: Config,
    index: TagIndex,
    generator: TagGenerator<R>,
    watchers: WatchRegistry,
    notices: broadcast::Sender<ReindexNotice>,
}

impl App<TokioProcessRunner> {
    pub fn new(root: impl Into<PathBuf>, config: Config) -> Self {
        Self::with_runner(root, config, TokioProcessRunner)
    }
}

impl<R: ProcessRunner> App<R> {
    pub fn with_runner(root: impl Into<PathBuf>, config: Config, runner: R) -> Self {
        let index = TagIndex::new(Arc::new(IndexStore::new()));
        let (notices, _) = broadcast::channel(16);
        Self {
            root: root.into(),
            config,
            generator: TagGenerator::with_runner(index.clone(), runner),
            index,
            watchers: WatchRegistry::new(),
            notices,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn index(&self) -> &TagIndex {
        &self.index
    }

    pub fn generator(&self) -> &TagGenerator<R> {
        &self.generator
    }

    /// Fails with a configuration error when no tag path is configured
    pub fn can_activate(&self) -> Result<()> {
        self.config.require_tag_path().map(|_| ())
    }

    pub fn tag_file(&self) -> Result<PathBuf> {
        self.config.absolute_tag_path(&self.root)
    }

    fn tag_path(&self) -> Result<PathBuf> {
        Ok(PathBuf::from(self.config.require_tag_path()?))
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            debounce: self.config.debounce(),
            max_matches: self.config.max_matches,
        }
    }

    /// Startup check: loads the tag file into the cache and starts watching
    /// it. A missing file surfaces as `IndexUnavailable` so the caller can
    /// offer generation.
    pub async fn startup(&self) -> Result<TagSnapshot> {
        let snapshot = self.snapshot(false).await?;
        self.ensure_watcher()?;
        Ok(snapshot)
    }

    pub async fn snapshot(&self, force: bool) -> Result<TagSnapshot> {
        self.index.load(&self.root, &self.tag_path()?, force).await
    }

    pub fn generation_config(&self) -> Result<GenerationConfig> {
        GenerationConfig::from_config(&self.root, &self.config)
    }

    pub fn generation_command(&self) -> Result<GenerationCommand> {
        Ok(self.generation_config()?.command())
    }

    /// Regenerates the tag file, reloads the index and makes sure the
    /// watcher is running.
    pub async fn generate(&self) -> Result<GenerationReport> {
        let report = self.generator.generate(&self.generation_config()?).await?;
        self.ensure_watcher()?;
        Ok(report)
    }

    /// Writes the generation command into every configured git hook
    pub fn install_git_hooks(&self) -> Result<Vec<PathBuf>> {
        let command = self.generation_command()?.to_string();
        let hooks = GitHooks::discover(&self.root)?;
        self.config
            .git_hooks
            .iter()
            .map(|name| hooks.install(name, &command))
            .collect()
    }

    /// Starts the tag file watcher unless one is already active. Each change
    /// force-reloads the index and broadcasts a [`ReindexNotice`].
    pub fn ensure_watcher(&self) -> Result<bool> {
        let tag_file = self.tag_file()?;
        if self.watchers.is_watching(&tag_file) {
            return Ok(false);
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<()>();
        let started = self.watchers.watch(&tag_file, WATCH_DEBOUNCE, move || {
            let _ = tx.send(());
        })?;
        if !started {
            return Ok(false);
        }

        let index = self.index.clone();
        let notices = self.notices.clone();
        let root = self.root.clone();
        let tag_path = self.tag_path()?;
        tokio::spawn(async move {
            // Ends when the watcher, and with it the sender, is dropped
            while rx.recv().await.is_some() {
                match index.load(&root, &tag_path, true).await {
                    Ok(snapshot) => {
                        let _ = notices.send(ReindexNotice {
                            root: root.clone(),
                            tag_count: snapshot.len(),
                        });
                    }
                    Err(e) => tracing::error!("Failed to reload tags: {}", e),
                }
            }
        });
        Ok(true)
    }

    pub fn subscribe_reindex(&self) -> broadcast::Receiver<ReindexNotice> {
        self.notices.subscribe()
    }

    /// Runs one interactive search session against the current snapshot
    pub async fn search<P: Presenter>(
        &self,
        seed: Option<&str>,
        presenter: &mut P,
        events: mpsc::Receiver<PickerEvent>,
    ) -> Result<SessionOutcome> {
        let snapshot = self.snapshot(false).await?;
        let mut session = QuerySession::new(snapshot.records, self.session_options());
        Ok(session.run(seed, presenter, events).await)
    }

    /// Executes an administrative action chosen in command mode
    pub async fn run_action<P: Presenter>(&self, action: AdminAction, presenter: &mut P) -> Result<()> {
        match action {
            AdminAction::GenerateTags => {
                let report = self.generate().await?;
                presenter.notify(&format!("Generated {} tags", report.snapshot.len()));
            }
            AdminAction::ShowCommand => {
                presenter.notify(&self.generation_command()?.to_string());
            }
            AdminAction::InstallGitHook => {
                for path in self.install_git_hooks()? {
                    presenter.notify(&format!("Updated {}", path.display()));
                }
            }
        }
        Ok(())
    }

    pub fn jump_to<E: Editor>(&self, editor: &E, record: &TagRecord) -> Result<()> {
        editor.open_and_reveal(&record.file_path, record.editor_line())
    }

    /// Stops all watchers, releasing their OS handles
    pub fn shutdown(&self) {
        self.watchers.clear();
    }
}

impl<R: ProcessRunner> Drop for App<R> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
