use std::io::Write;

use crate::error::Result;
use crate::tags::record::{sort_records, TagRecord};

/// Pseudo-tag header. The file is always declared unsorted: records are
/// ordered by line number, not by name as `SORTED=1` would promise.
pub fn header(encoding: &str) -> String {
    format!(
        "!_TAG_FILE_ENCODING\t{}\t//\n\
         !_TAG_FILE_FORMAT\t2\t/extended format; --format=1 will not append ;\" to lines/\n\
         !_TAG_FILE_SORTED\t0\t/0=unsorted, 1=sorted, 2=foldcase/\n",
        encoding
    )
}

/// Writes an extended-format tag file
pub struct TagWriter<W: Write> {
    out: W,
    encoding: String,
}

impl<W: Write> TagWriter<W> {
    pub fn new(out: W, encoding: impl Into<String>) -> Self {
        Self {
            out,
            encoding: encoding.into(),
        }
    }

    /// Writes the header followed by the deduplicated, line-ordered records.
    /// Returns the number of tag lines written.
    pub fn write(&mut self, records: &[TagRecord]) -> Result<usize> {
        let lines = sort_records(records);
        self.write_lines(&lines)?;
        Ok(lines.len())
    }

    /// Writes the header and already-ordered tag lines
    pub fn write_lines(&mut self, lines: &[String]) -> Result<()> {
        self.out.write_all(header(&self.encoding).as_bytes())?;
        for line in lines {
            self.out.write_all(line.as_bytes())?;
            self.out.write_all(b"\n")?;
        }
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
