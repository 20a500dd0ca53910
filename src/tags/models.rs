use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Symbol category, taken from the single-character kind field of a tag line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagKind {
    Class,
    Method,
    Function,
    Variable,
    Parameter,
    /// Any code without a category glyph. The raw character is preserved.
    Other(char),
}

impl TagKind {
    pub fn from_code(code: char) -> Self {
        match code {
            'c' => TagKind::Class,
            'm' => TagKind::Method,
            'f' => TagKind::Function,
            'v' => TagKind::Variable,
            'p' => TagKind::Parameter,
            other => TagKind::Other(other),
        }
    }

    pub fn code(&self) -> char {
        match self {
            TagKind::Class => 'c',
            TagKind::Method => 'm',
            TagKind::Function => 'f',
            TagKind::Variable => 'v',
            TagKind::Parameter => 'p',
            TagKind::Other(c) => *c,
        }
    }

    /// Category glyph shown in front of the symbol name
    pub fn glyph(&self) -> Option<char> {
        match self {
            TagKind::Class => Some('C'),
            TagKind::Method | TagKind::Function => Some('M'),
            TagKind::Variable => Some('V'),
            TagKind::Parameter => Some('P'),
            TagKind::Other(_) => None,
        }
    }

    /// Codicon name for hosts that render icon fonts
    pub fn codicon(&self) -> Option<&'static str> {
        match self {
            TagKind::Class => Some("symbol-class"),
            TagKind::Method | TagKind::Function => Some("symbol-method"),
            TagKind::Variable => Some("symbol-constant"),
            TagKind::Parameter => Some("symbol-parameter"),
            TagKind::Other(_) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TagKind::Class => "class",
            TagKind::Method => "method",
            TagKind::Function => "function",
            TagKind::Variable => "variable",
            TagKind::Parameter => "parameter",
            TagKind::Other(_) => "other",
        }
    }
}

/// One symbol occurrence from a tag file.
///
/// Identity is `(name, file_path, line_number)`; kind, scope and the display
/// path are descriptive only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagRecord {
    pub name: String,
    /// Absolute path to the defining file
    pub file_path: PathBuf,
    /// Root-relative path shown to the user
    pub display_path: String,
    /// 1-based line number as written by the indexer
    pub line_number: u32,
    pub kind: TagKind,
    /// Enclosing scope, never used for matching
    pub scope: Option<String>,
}

impl TagRecord {
    /// 0-based cursor line for the editor. A recorded line of 0 stays 0.
    pub fn editor_line(&self) -> u32 {
        self.line_number.saturating_sub(1)
    }

    /// Name prefixed by the kind glyph, e.g. `M parse_line`
    pub fn label(&self) -> String {
        match self.kind.glyph() {
            Some(glyph) => format!("{} {}", glyph, self.name),
            None => self.name.clone(),
        }
    }

    pub fn detail(&self) -> &str {
        &self.display_path
    }

    pub fn description(&self) -> Option<&str> {
        self.scope.as_deref()
    }
}

impl PartialEq for TagRecord {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.file_path == other.file_path
            && self.line_number == other.line_number
    }
}

impl Eq for TagRecord {}

impl Hash for TagRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.file_path.hash(state);
        self.line_number.hash(state);
    }
}

impl fmt::Display for TagRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {}:{}", self.label(), self.display_path, self.line_number)?;
        if let Some(scope) = &self.scope {
            write!(f, "  ({})", scope)?;
        }
        Ok(())
    }
}
