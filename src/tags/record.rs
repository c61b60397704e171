use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::tags::kind::TagKind;

static LINE_FIELD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\tline:(\d+)").unwrap());

/// One line of the tag file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    pub name: String,
    pub file: String,
    /// Ex command addressing the declaration, e.g. `/^object Foo {$/`
    pub address: String,
    pub kind: TagKind,
    pub line: usize,
    /// Extension fields, ending with `line:<N>`
    pub fields: Vec<String>,
}

impl TagRecord {
    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{};\"\t{}",
            self.name,
            self.file,
            self.address,
            self.fields.join("\t")
        )
    }
}

impl fmt::Display for TagRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}

/// Line number recorded in a formatted tag line's `line:` field
pub fn line_number(tag_line: &str) -> Option<usize> {
    LINE_FIELD
        .captures(tag_line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Removes duplicate tag lines and orders the rest by line number.
///
/// Lines sharing a line number are ordered by their text, so the output is
/// the same on every run.
pub fn sort_lines(mut lines: Vec<String>) -> Vec<String> {
    lines.sort_by(|a, b| {
        line_number(a)
            .cmp(&line_number(b))
            .then_with(|| a.cmp(b))
    });
    lines.dedup();
    lines
}

pub fn sort_records(records: &[TagRecord]) -> Vec<String> {
    sort_lines(records.iter().map(TagRecord::to_line).collect())
}
