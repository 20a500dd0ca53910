pub mod app;
pub mod config;
pub mod error;
pub mod generator;
pub mod git;
pub mod index;
pub mod search;
pub mod session;
pub mod tags;

pub use app::{App, Editor, ReindexNotice};
pub use config::Config;
pub use error::{ParseLineError, Result, TagError};
pub use generator::{
    GenerationCommand, GenerationConfig, GenerationReport, ProcessOutput, ProcessRunner,
    TagGenerator, TokioProcessRunner,
};
pub use git::GitHooks;
pub use index::{IndexStore, LatestCell, TagIndex, TagSnapshot, WatchRegistry};
pub use search::{resolve_seed, FuzzySearch, ScoredTag, SearchStrategy, SeedOutcome};
pub use session::{
    AdminAction, PickerEvent, PickerItem, Presenter, QuerySession, SessionOptions,
    SessionOutcome, SessionState,
};
pub use tags::{ParseOutcome, TagFileParser, TagKind, TagRecord, TagRecords};
