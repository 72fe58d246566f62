//! Line and file parsing for shell-style `KEY=VALUE` dotfiles.
//!
//! Offset convention: `value_start`/`value_end` are byte offsets into the
//! line with any trailing '\r' removed — exactly the text the toggle engine
//! splices and the persist step rewrites. Entries are immutable; a changed
//! file always produces a fresh entry set.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::core::cycles::{CycleGroup, CycleTable, QuoteStyle};

/// `export KEY = value` with optional indentation and `export` keyword.
/// Keys may contain dots and hyphens after the leading identifier char.
static KEY_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*(?:export[ \t]+)?([A-Za-z_][A-Za-z0-9_.-]*)[ \t]*=[ \t]*(.*)$")
        .expect("key/value pattern is valid")
});

/// One parsed `KEY=VALUE` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub key: String,

    /// Trimmed value as written, quotes included.
    pub value: String,

    /// 0-based line number within the file.
    pub line: usize,

    /// Byte span of the trimmed value within the CR-stripped line.
    pub value_start: usize,
    pub value_end: usize,

    pub toggleable: bool,

    /// The matched group (canonical casing as configured), present iff
    /// `toggleable`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle: Option<CycleGroup>,

    /// The CR-stripped line this entry was parsed from.
    pub raw_line: String,
}

impl Entry {
    /// Value with one layer of surrounding quotes removed, as used for
    /// cycle matching.
    pub fn normalized_value(&self) -> &str {
        QuoteStyle::detect(&self.value).1
    }
}

/// Parse one line. Returns None for blank lines, comments, and anything
/// that is not a `KEY=VALUE` line.
pub fn parse_line(line: &str, line_no: usize, table: &CycleTable) -> Option<Entry> {
    // Mixed line endings are tolerated; offsets refer to the stripped line.
    let line = line.trim_end_matches('\r');

    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    let caps = KEY_VALUE.captures(line)?;
    let key = caps.get(1)?.as_str().to_string();
    let value_m = caps.get(2)?;

    // Leading whitespace after '=' was consumed by the pattern; trailing
    // whitespace is excluded from the editable span.
    let trimmed_value = value_m.as_str().trim_end();
    let value_start = value_m.start();
    let value_end = value_start + trimmed_value.len();

    let bare = QuoteStyle::detect(trimmed_value).1;
    let cycle = table.matching_group(bare).cloned();

    Some(Entry {
        key,
        value: trimmed_value.to_string(),
        line: line_no,
        value_start,
        value_end,
        toggleable: cycle.is_some(),
        cycle,
        raw_line: line.to_string(),
    })
}

/// Parse a full file text: strict '\n' split, 0-based line numbers, entries
/// in file order. Pure — no IO, no side effects.
pub fn parse_file(text: &str, table: &CycleTable) -> Vec<Entry> {
    text.split('\n')
        .enumerate()
        .filter_map(|(i, line)| parse_line(line, i, table))
        .collect()
}

/// A file's most recent parse result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedFile {
    pub path: PathBuf,

    /// Root-relative path for display.
    pub display_path: String,

    pub entries: Vec<Entry>,

    /// Indices into `entries` of the toggleable subset, in file order.
    /// Derived at construction, never updated independently.
    pub toggleable: Vec<usize>,
}

impl ParsedFile {
    pub fn parse(path: PathBuf, display_path: String, text: &str, table: &CycleTable) -> Self {
        let entries = parse_file(text, table);
        let toggleable = entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.toggleable)
            .map(|(i, _)| i)
            .collect();
        Self {
            path,
            display_path,
            entries,
            toggleable,
        }
    }

    pub fn entry_at_line(&self, line: usize) -> Option<&Entry> {
        self.entries.iter().find(|e| e.line == line)
    }

    pub fn toggleable_entries(&self) -> impl Iterator<Item = &Entry> {
        self.toggleable.iter().map(|&i| &self.entries[i])
    }
}

/// Root-relative display path, falling back to the full path outside root.
pub fn display_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}
