//! Installs the tag generation command into git hook scripts.
//!
//! The command lives in a managed block:
//!
//! ```text
//! # tagnav
//! # 2026-10-18 09:12:44 UTC
//! ctags -R --excmd=number -f .tags /work/project
//! # end tagnav
//! ```
//!
//! Updating a hook rewrites only that block and leaves the rest of the script
//! byte-for-byte intact. Files are replaced atomically.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::NamedTempFile;

use crate::error::{Result, TagError};

pub const HOOK_MARKER: &str = "tagnav";

const SHEBANG: &str = "#!/bin/sh\n";

/// Renders the managed block, terminated by a newline
pub fn render_block(command: &str, timestamp: &str) -> String {
    format!(
        "# {marker}\n# {timestamp}\n{command}\n# end {marker}\n",
        marker = HOOK_MARKER,
        timestamp = timestamp,
        command = command
    )
}

/// Byte range of an existing managed block, including the newline after
/// the end marker when present. Marker lines may end in `\r\n`.
fn find_block(content: &str) -> Option<(usize, usize)> {
    let start_line = format!("# {}", HOOK_MARKER);
    let end_line = format!("# end {}", HOOK_MARKER);

    let start = line_offsets(content).find(|&offset| line_at(content, offset) == start_line)?;
    let end_marker = line_offsets(content)
        .filter(|&offset| offset > start)
        .find(|&offset| line_at(content, offset) == end_line)?;

    let end = match content[end_marker..].find('\n') {
        Some(newline) => end_marker + newline + 1,
        None => content.len(),
    };
    Some((start, end))
}

/// Line starting at `offset`, without its terminator
fn line_at(content: &str, offset: usize) -> &str {
    let rest = &content[offset..];
    let line = rest.split('\n').next().unwrap_or(rest);
    line.trim_end_matches('\r')
}

fn line_offsets(content: &str) -> impl Iterator<Item = usize> + '_ {
    std::iter::once(0).chain(
        content
            .match_indices('\n')
            .map(|(i, _)| i + 1)
            .filter(move |&i| i < content.len()),
    )
}

/// Replaces the managed block in `existing`, or appends it when absent.
pub fn apply_managed_block(existing: &str, block: &str) -> String {
    if let Some((start, end)) = find_block(existing) {
        let mut updated = String::with_capacity(existing.len() + block.len());
        updated.push_str(&existing[..start]);
        updated.push_str(block);
        updated.push_str(&existing[end..]);
        return updated;
    }

    if existing.is_empty() {
        return format!("{}{}", SHEBANG, block);
    }

    let mut updated = existing.to_string();
    if !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(block);
    updated
}

/// Hook scripts of one repository
pub struct GitHooks {
    hooks_dir: PathBuf,
}

impl GitHooks {
    /// Locates the hooks directory of the repository containing `repo_path`.
    pub fn discover(repo_path: impl AsRef<Path>) -> Result<Self> {
        let repo_path = repo_path.as_ref();

        let output = Command::new("git")
            .args(["rev-parse", "--git-path", "hooks"])
            .current_dir(repo_path)
            .output();

        let hooks_dir = match output {
            Ok(output) if output.status.success() => {
                let raw = String::from_utf8_lossy(&output.stdout).trim().to_string();
                repo_path.join(raw)
            }
            _ => {
                let fallback = repo_path.join(".git");
                if !fallback.is_dir() {
                    return Err(TagError::HookWrite {
                        path: fallback,
                        source: std::io::Error::new(
                            std::io::ErrorKind::NotFound,
                            "not a git repository",
                        ),
                    });
                }
                fallback.join("hooks")
            }
        };

        Ok(Self { hooks_dir })
    }

    pub fn with_hooks_dir(hooks_dir: impl Into<PathBuf>) -> Self {
        Self {
            hooks_dir: hooks_dir.into(),
        }
    }

    pub fn hooks_dir(&self) -> &Path {
        &self.hooks_dir
    }

    /// Writes the managed block into `hook_name` with the current time
    pub fn install(&self, hook_name: &str, command: &str) -> Result<PathBuf> {
        let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();
        self.install_with_timestamp(hook_name, command, &timestamp)
    }

    pub fn install_with_timestamp(
        &self,
        hook_name: &str,
        command: &str,
        timestamp: &str,
    ) -> Result<PathBuf> {
        let path = self.hooks_dir.join(hook_name);
        let hook_err = |source: std::io::Error| TagError::HookWrite {
            path: path.clone(),
            source,
        };

        let existing = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(hook_err(e)),
        };

        let updated = apply_managed_block(&existing, &render_block(command, timestamp));
        fs::create_dir_all(&self.hooks_dir).map_err(hook_err)?;
        write_atomic(&path, &updated).map_err(hook_err)?;

        tracing::info!("Updated git hook {}", path.display());
        Ok(path)
    }
}

/// Writes through a temporary file in the same directory, then renames it
/// over `path`. Readers see either the old or the new content.
fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(path)
            .map(|m| m.permissions().mode())
            .unwrap_or(0o644);
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(mode | 0o111))?;
    }

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: &str = "2026-01-01 00:00:00 UTC";

    #[test]
    fn test_render_block() {
        assert_eq!(
            render_block("ctags -R", TS),
            "# tagnav\n# 2026-01-01 00:00:00 UTC\nctags -R\n# end tagnav\n"
        );
    }

    #[test]
    fn test_empty_hook_gets_shebang() {
        let block = render_block("ctags -R", TS);
        assert_eq!(apply_managed_block("", &block), format!("#!/bin/sh\n{}", block));
    }

    #[test]
    fn test_append_when_block_absent() {
        let block = render_block("ctags -R", TS);
        let existing = "#!/bin/sh\necho done";
        assert_eq!(
            apply_managed_block(existing, &block),
            format!("#!/bin/sh\necho done\n{}", block)
        );
    }

    #[test]
    fn test_replace_block_preserves_surroundings() {
        let old = render_block("ctags old", "then");
        let existing = format!("#!/bin/bash\nset -e\n{}npm test\n  # end tagnav is not ours\n", old);
        let new = render_block("ctags new", TS);

        let updated = apply_managed_block(&existing, &new);
        assert_eq!(
            updated,
            format!("#!/bin/bash\nset -e\n{}npm test\n  # end tagnav is not ours\n", new)
        );
    }

    #[test]
    fn test_replace_block_at_end_without_newline() {
        let existing = "echo hi\n# tagnav\n# then\nctags old\n# end tagnav";
        let new = render_block("ctags new", TS);
        assert_eq!(
            apply_managed_block(existing, &new),
            format!("echo hi\n{}", new)
        );
    }

    #[test]
    fn test_replace_crlf_block() {
        let existing = "#!/bin/sh\r\n# tagnav\r\n# then\r\nctags old\r\n# end tagnav\r\necho after\r\n";
        let new = render_block("ctags new", TS);
        let updated = apply_managed_block(existing, &new);
        assert_eq!(updated, format!("#!/bin/sh\r\n{}echo after\r\n", new));
        assert_eq!(updated.matches("# end tagnav").count(), 1);
    }

    #[test]
    fn test_unterminated_block_is_left_alone() {
        let existing = "# tagnav\n# then\nctags old\n";
        let new = render_block("ctags new", TS);
        assert_eq!(
            apply_managed_block(existing, &new),
            format!("{}{}", existing, new)
        );
    }
}
