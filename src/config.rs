//! Project configuration read from `.tagnav.yml`.
//!
//! ```yaml
//! tag_path: .tags
//! program: ctags
//! exclude:
//!   - node_modules
//!   - "*.min.js"
//! extra_args:
//!   - --languages=Rust,Python
//! debounce_ms: 300
//! max_matches: 50
//! git_hooks:
//!   - post-commit
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TagError};

/// Name of the per-project configuration file
pub const CONFIG_FILENAME: &str = ".tagnav.yml";

pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_MAX_MATCHES: usize = 50;
pub const DEFAULT_PROGRAM: &str = "ctags";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Tag file location, relative to the project root or absolute.
    /// Leaving it empty disables the whole feature.
    pub tag_path: Option<String>,

    /// Tag generator executable
    pub program: String,

    /// Globs passed to the generator as `--exclude=<glob>`
    pub exclude: Vec<String>,

    /// Extra generator arguments, appended verbatim
    pub extra_args: Vec<String>,

    /// Quiet period before a query is searched
    pub debounce_ms: u64,

    /// Maximum number of fuzzy results presented
    pub max_matches: usize,

    /// Hook scripts that receive the managed generation block
    pub git_hooks: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tag_path: None,
            program: DEFAULT_PROGRAM.to_string(),
            exclude: Vec::new(),
            extra_args: Vec::new(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            max_matches: DEFAULT_MAX_MATCHES,
            git_hooks: vec![
                "post-commit".to_string(),
                "post-merge".to_string(),
                "post-checkout".to_string(),
            ],
        }
    }
}

impl Config {
    /// Parses configuration YAML
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| TagError::Config(format!("Invalid {}: {}", CONFIG_FILENAME, e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `.tagnav.yml` from the project root, falling back to defaults
    /// when the file does not exist.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILENAME);
        if !path.exists() {
            tracing::debug!("No {} in {}, using defaults", CONFIG_FILENAME, root.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        Self::parse(&content)
    }

    fn validate(&self) -> Result<()> {
        for pattern in &self.exclude {
            glob::Pattern::new(pattern).map_err(|e| {
                TagError::Config(format!("Invalid exclude glob {:?}: {}", pattern, e))
            })?;
        }
        if self.program.trim().is_empty() {
            return Err(TagError::Config("program can not be empty".to_string()));
        }
        Ok(())
    }

    /// The configured tag path, or a configuration error when it is unset.
    pub fn require_tag_path(&self) -> Result<&str> {
        match self.tag_path.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => Ok(path),
            _ => Err(TagError::Config("tag_path can not be empty".to_string())),
        }
    }

    /// Absolute tag file location for a project root.
    pub fn absolute_tag_path(&self, root: &Path) -> Result<PathBuf> {
        Ok(resolve_tag_path(root, self.require_tag_path()?))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Joins a tag path onto the root unless it is already absolute.
pub fn resolve_tag_path(root: &Path, tag_path: impl AsRef<Path>) -> PathBuf {
    let tag_path = tag_path.as_ref();
    if tag_path.is_absolute() {
        tag_path.to_path_buf()
    } else {
        root.join(tag_path)
    }
}
