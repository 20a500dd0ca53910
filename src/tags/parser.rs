use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::{ParseLineError, Result};
use crate::tags::models::{TagKind, TagRecord};

/// Prefix of ctags pseudo-tag (metadata) lines
pub const METADATA_PREFIX: &str = "!_TAG_";

/// Suffix ctags appends to the address field in `--excmd=number` mode
const ADDRESS_TERMINATOR: &str = ";\"";

/// Result of parsing a whole tag file
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub records: Vec<TagRecord>,
    /// Malformed lines that were skipped
    pub skipped: usize,
}

/// Line-oriented tag file parser.
///
/// Paths are resolved against `root`. Both root-relative and absolute path
/// fields are accepted, detected per line.
pub struct TagFileParser {
    root: PathBuf,
}

impl TagFileParser {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn parse_file(&self, path: &Path) -> Result<ParseOutcome> {
        let file = File::open(path)?;
        self.parse_reader(BufReader::new(file))
    }

    /// Streams lines from `reader`. Malformed lines are logged and skipped;
    /// only I/O failures abort the parse.
    pub fn parse_reader<R: BufRead>(&self, reader: R) -> Result<ParseOutcome> {
        let mut outcome = ParseOutcome::default();
        let mut unknown_kinds = HashSet::new();
        let mut records = self.records(reader);

        for result in records.by_ref() {
            match result {
                Ok(record) => {
                    if let TagKind::Other(code) = record.kind {
                        if unknown_kinds.insert(code) {
                            tracing::debug!("Unsupported tag kind {:?} (first seen on {})", code, record.name);
                        }
                    }
                    outcome.records.push(record);
                }
                Err(e) => {
                    tracing::warn!("ctags parse error, skipping {}", e);
                    outcome.skipped += 1;
                }
            }
        }
        if let Some(e) = records.take_error() {
            return Err(e.into());
        }

        tracing::debug!(
            "Parsed {} tags ({} skipped) under {}",
            outcome.records.len(),
            outcome.skipped,
            self.root.display()
        );
        Ok(outcome)
    }

    /// Lazily parses `reader`, one item per record or malformed line.
    /// Metadata and blank lines yield nothing.
    pub fn records<R: BufRead>(&self, reader: R) -> TagRecords<'_, R> {
        TagRecords {
            parser: self,
            reader,
            buf: Vec::new(),
            line_no: 0,
            error: None,
        }
    }

    /// Parses one line. Returns `None` for metadata and blank lines.
    pub fn parse_line(
        &self,
        line_no: usize,
        line: &str,
    ) -> Option<std::result::Result<TagRecord, ParseLineError>> {
        let line = line.trim_end_matches(&['\n', '\r'][..]);
        if line.is_empty() || line.starts_with(METADATA_PREFIX) {
            return None;
        }
        Some(self.build_record(line_no, line))
    }

    fn build_record(
        &self,
        line_no: usize,
        line: &str,
    ) -> std::result::Result<TagRecord, ParseLineError> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 4 {
            return Err(ParseLineError::TooFewFields {
                line: line_no,
                found: fields.len(),
            });
        }

        let name = fields[0];
        if name.is_empty() {
            return Err(ParseLineError::EmptyName { line: line_no });
        }

        let line_spec = fields[2];
        let line_number = line_spec
            .strip_suffix(ADDRESS_TERMINATOR)
            .unwrap_or(line_spec)
            .trim()
            .parse::<u32>()
            .map_err(|_| ParseLineError::InvalidLineNumber {
                line: line_no,
                value: line_spec.to_string(),
            })?;

        let kind = TagKind::from_code(fields[3].chars().next().unwrap_or(' '));

        // Fields past the fifth are ctags extension fields
        let scope = fields
            .get(4)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        let (file_path, display_path) = self.resolve_path(fields[1]);

        Ok(TagRecord {
            name: name.to_string(),
            file_path,
            display_path,
            line_number,
            kind,
            scope,
        })
    }

    /// Returns `(absolute, display)` for a raw path field.
    fn resolve_path(&self, raw: &str) -> (PathBuf, String) {
        let raw_path = Path::new(raw);
        if raw_path.is_absolute() {
            let display = raw_path
                .strip_prefix(&self.root)
                .map(|rel| rel.to_string_lossy().into_owned())
                .unwrap_or_else(|_| raw.to_string());
            (raw_path.to_path_buf(), display)
        } else {
            let relative = raw.strip_prefix("./").unwrap_or(raw);
            (self.root.join(relative), raw.to_string())
        }
    }
}

/// Iterator returned by [`TagFileParser::records`].
///
/// An I/O error ends the iteration; it is kept for [`TagRecords::take_error`].
pub struct TagRecords<'a, R> {
    parser: &'a TagFileParser,
    reader: R,
    buf: Vec<u8>,
    line_no: usize,
    error: Option<io::Error>,
}

impl<R> TagRecords<'_, R> {
    /// 1-based number of the last line read
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }
}

impl<R: BufRead> Iterator for TagRecords<'_, R> {
    type Item = std::result::Result<TagRecord, ParseLineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.error.is_some() {
            return None;
        }
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    self.error = Some(e);
                    return None;
                }
            }
            self.line_no += 1;

            let line = String::from_utf8_lossy(&self.buf);
            if let Some(result) = self.parser.parse_line(self.line_no, &line) {
                return Some(result);
            }
        }
    }
}
