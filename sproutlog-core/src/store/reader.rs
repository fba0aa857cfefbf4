//! Buffered Line Reader for the Sensor Log
//!
//! Streams the log file through a fixed 4 KiB chunk buffer, assembling
//! lines into fixed-capacity strings. Rotation uses this to walk the
//! existing records without ever holding the whole file in memory.
//!
//! Lines longer than a record can possibly be (`RECORD_LINE_MAX`) are not
//! valid data; they are consumed, counted, and skipped rather than
//! aborting the pass. Carriage returns and blank lines are ignored.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use super::RecordLine;
use crate::constants::READ_CHUNK;

/// Counters for one reading pass.
#[derive(Debug, Default, Clone)]
pub(super) struct ReadStats {
    /// Lines returned to the caller.
    pub lines_read: usize,
    /// Over-long lines consumed and discarded.
    pub lines_dropped: usize,
}

/// Chunked line reader over the log file.
pub(super) struct LineReader {
    file: File,
    buffer: [u8; READ_CHUNK],
    buffer_pos: usize,
    buffer_len: usize,
    line: RecordLine,
    overlong: bool,
    eof: bool,
    skip_lines: usize,
    lines_skipped: usize,
    stats: ReadStats,
}

impl LineReader {
    /// Open `path` for line-by-line reading.
    pub fn open(path: &Path) -> io::Result<Self> {
        Ok(Self {
            file: File::open(path)?,
            buffer: [0; READ_CHUNK],
            buffer_pos: 0,
            buffer_len: 0,
            line: RecordLine::new(),
            overlong: false,
            eof: false,
            skip_lines: 0,
            lines_skipped: 0,
            stats: ReadStats::default(),
        })
    }

    /// Skip the first `lines` lines (the header).
    pub fn with_skip_lines(mut self, lines: usize) -> Self {
        self.skip_lines = lines;
        self
    }

    /// Counters for this pass.
    pub fn stats(&self) -> &ReadStats {
        &self.stats
    }

    /// Pull more bytes from the file; false once fully drained.
    fn refill(&mut self) -> io::Result<bool> {
        if self.eof {
            return Ok(false);
        }

        self.buffer_pos = 0;
        self.buffer_len = self.file.read(&mut self.buffer)?;

        if self.buffer_len == 0 {
            self.eof = true;
            return Ok(false);
        }

        Ok(true)
    }

    /// Next non-empty, in-capacity line, or `None` at end of file.
    pub fn next_line(&mut self) -> io::Result<Option<RecordLine>> {
        loop {
            while self.buffer_pos < self.buffer_len {
                let byte = self.buffer[self.buffer_pos];
                self.buffer_pos += 1;

                if byte == b'\n' {
                    if self.lines_skipped < self.skip_lines {
                        self.lines_skipped += 1;
                    } else if self.overlong {
                        self.stats.lines_dropped += 1;
                    } else if !self.line.is_empty() {
                        self.stats.lines_read += 1;
                        return Ok(Some(core::mem::take(&mut self.line)));
                    }

                    self.line.clear();
                    self.overlong = false;
                } else if byte != b'\r' {
                    if self.line.push(byte as char).is_err() {
                        self.overlong = true;
                    }
                }
            }

            if !self.refill()? {
                // End of file; a final unterminated line still counts.
                if self.lines_skipped >= self.skip_lines && !self.overlong && !self.line.is_empty()
                {
                    self.stats.lines_read += 1;
                    return Ok(Some(core::mem::take(&mut self.line)));
                }

                if self.overlong {
                    self.stats.lines_dropped += 1;
                    self.overlong = false;
                    self.line.clear();
                }

                return Ok(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn reader_over(content: &str) -> (tempfile::TempDir, LineReader) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();

        let reader = LineReader::open(&path).unwrap();
        (dir, reader)
    }

    fn drain(reader: &mut LineReader) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = reader.next_line().unwrap() {
            lines.push(line.as_str().to_owned());
        }
        lines
    }

    #[test]
    fn reads_lines_in_order() {
        let (_dir, mut reader) = reader_over("one\ntwo\nthree\n");
        assert_eq!(drain(&mut reader), vec!["one", "two", "three"]);
        assert_eq!(reader.stats().lines_read, 3);
    }

    #[test]
    fn skips_header_line() {
        let (_dir, reader) = reader_over("Header\nrecord\n");
        let mut reader = reader.with_skip_lines(1);
        assert_eq!(drain(&mut reader), vec!["record"]);
    }

    #[test]
    fn handles_crlf_and_blank_lines() {
        let (_dir, mut reader) = reader_over("one\r\n\ntwo\r\n");
        assert_eq!(drain(&mut reader), vec!["one", "two"]);
    }

    #[test]
    fn final_line_without_newline_is_returned() {
        let (_dir, mut reader) = reader_over("one\ntwo");
        assert_eq!(drain(&mut reader), vec!["one", "two"]);
    }

    #[test]
    fn overlong_line_is_dropped_not_truncated() {
        let long = "x".repeat(200);
        let content = format!("{long}\nshort\n");
        let (_dir, mut reader) = reader_over(&content);

        assert_eq!(drain(&mut reader), vec!["short"]);
        assert_eq!(reader.stats().lines_dropped, 1);
    }

    #[test]
    fn spans_chunk_boundaries() {
        // More content than one read buffer, all of it well-formed.
        let mut content = String::new();
        for i in 0..200 {
            content.push_str(&format!("record number {i} with some padding\n"));
        }
        let (_dir, mut reader) = reader_over(&content);

        let lines = drain(&mut reader);
        assert_eq!(lines.len(), 200);
        assert_eq!(lines[0], "record number 0 with some padding");
        assert_eq!(lines[199], "record number 199 with some padding");
    }
}
