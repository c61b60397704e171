use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;

use crate::error::Result;

/// First line of a file matching a search pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMatch {
    /// 1-based line number
    pub line: usize,
    /// Line text with trailing whitespace removed
    pub text: String,
}

impl LineMatch {
    /// Ex search command addressing this line
    pub fn address(&self) -> String {
        format!("/^{}$/", self.text)
    }
}

/// Finds declaration lines by regex search.
///
/// Lines are matched with their terminator attached, so a pattern ending in
/// `[^\w\d]` also matches a name at the very end of a line.
pub struct LineLocator {
    cache: Option<HashMap<PathBuf, Arc<Vec<String>>>>,
}

impl LineLocator {
    /// Locator that re-reads the file on every lookup
    pub fn new() -> Self {
        Self { cache: None }
    }

    /// Locator that reads each file once and keeps its lines for the run
    pub fn cached() -> Self {
        Self {
            cache: Some(HashMap::new()),
        }
    }

    pub fn locate(&mut self, path: &Path, pattern: &Regex) -> Result<Option<LineMatch>> {
        match self.cache.as_mut() {
            Some(cache) => {
                let lines = match cache.get(path) {
                    Some(lines) => Arc::clone(lines),
                    None => {
                        let lines = Arc::new(read_lines(path)?);
                        cache.insert(path.to_path_buf(), Arc::clone(&lines));
                        lines
                    }
                };
                Ok(first_match(lines.iter().map(String::as_str), pattern))
            }
            None => scan_file(path, pattern),
        }
    }

    pub fn clear(&mut self) {
        if let Some(cache) = self.cache.as_mut() {
            cache.clear();
        }
    }
}

impl Default for LineLocator {
    fn default() -> Self {
        Self::new()
    }
}

fn first_match<'a>(lines: impl Iterator<Item = &'a str>, pattern: &Regex) -> Option<LineMatch> {
    lines
        .enumerate()
        .find(|(_, line)| pattern.is_match(line))
        .map(|(idx, line)| LineMatch {
            line: idx + 1,
            text: line.trim_end().to_string(),
        })
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let bytes = std::fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes);
    Ok(content.split_inclusive('\n').map(str::to_string).collect())
}

/// Streams the file and stops at the first match
fn scan_file(path: &Path, pattern: &Regex) -> Result<Option<LineMatch>> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut buf = Vec::new();
    let mut line_no = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        line_no += 1;

        let line = String::from_utf8_lossy(&buf);
        if pattern.is_match(&line) {
            return Ok(Some(LineMatch {
                line: line_no,
                text: line.trim_end().to_string(),
            }));
        }
    }
}
