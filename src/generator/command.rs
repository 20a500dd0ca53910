use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{resolve_tag_path, Config};
use crate::error::Result;

/// Inputs of one ctags run, derived from [`Config`] each time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationConfig {
    pub program: String,
    pub root: PathBuf,
    /// Output path as configured (relative to `root` or absolute)
    pub tag_path: PathBuf,
    pub exclude: Vec<String>,
    pub extra_args: Vec<String>,
}

impl GenerationConfig {
    pub fn from_config(root: &Path, config: &Config) -> Result<Self> {
        Ok(Self {
            program: config.program.clone(),
            root: root.to_path_buf(),
            tag_path: PathBuf::from(config.require_tag_path()?),
            exclude: config.exclude.clone(),
            extra_args: config.extra_args.clone(),
        })
    }

    pub fn output_path(&self) -> PathBuf {
        resolve_tag_path(&self.root, &self.tag_path)
    }

    /// `<program> -R --excmd=number [--exclude=<glob>]* [<extra>] -f <tag_path> <root>`
    pub fn command(&self) -> GenerationCommand {
        let mut args = vec!["-R".to_string(), "--excmd=number".to_string()];
        args.extend(self.exclude.iter().map(|glob| format!("--exclude={}", glob)));
        args.extend(self.extra_args.iter().cloned());
        args.push("-f".to_string());
        args.push(self.tag_path.to_string_lossy().into_owned());
        args.push(self.root.to_string_lossy().into_owned());

        GenerationCommand {
            program: self.program.clone(),
            args,
            cwd: self.root.clone(),
        }
    }
}

/// A ready-to-run process invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationCommand {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl fmt::Display for GenerationCommand {
    /// Shell form, suitable for display and for hook scripts
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", shell_quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(arg))?;
        }
        Ok(())
    }
}

fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_=./,:+@%".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
