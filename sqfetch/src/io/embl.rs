use std::io::{BufRead, Seek};
use std::path::{Path, PathBuf};

use super::fasta::is_residue;
use super::lines::{self, LineReader};
use super::{Keep, RawRecord, ShapeTracker};
use crate::error::{Error, Result};

/// EMBL / UniProt 平面文件解析器。
///
/// - `ID` 行第二个词为名称
/// - 第一条 `AC` 行的第一个登录号作为 accession
/// - `DE` 行拼接为描述
/// - `SQ` 之后到 `//` 之间为残基，行内数字和空白被忽略
pub struct EmblParser<R> {
    path: PathBuf,
    lines: LineReader<R>,
}

fn field(line: &[u8]) -> String {
    let s = String::from_utf8_lossy(lines::content(line));
    s.get(2..).unwrap_or("").trim().to_string()
}

impl<R: BufRead + Seek> EmblParser<R> {
    pub fn new(path: PathBuf, lines: LineReader<R>) -> Self {
        Self { path, lines }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines(&self) -> &LineReader<R> {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> &mut LineReader<R> {
        &mut self.lines
    }

    fn truncated(&self, name: &str, what: &str) -> Error {
        Error::parse(
            &self.path,
            self.lines.offset(),
            format!("record {} ended before {}", name, what),
        )
    }

    pub fn next_record(&mut self, keep: Keep) -> Result<Option<RawRecord>> {
        loop {
            if !self.lines.read_line()? {
                return Ok(None);
            }
            if !lines::is_blank(self.lines.line()) {
                break;
            }
        }
        let record_offset = self.lines.line_start();
        if !self.lines.line().starts_with(b"ID") {
            return Err(Error::parse(
                &self.path,
                record_offset,
                "expected ID line at start of an EMBL record",
            ));
        }
        let name = field(self.lines.line())
            .split_whitespace()
            .next()
            .unwrap_or("")
            .trim_end_matches(';')
            .to_string();

        let mut acc = String::new();
        let mut desc = String::new();
        loop {
            if !self.lines.read_line()? {
                return Err(self.truncated(&name, "its SQ line"));
            }
            let line = self.lines.line();
            if line.starts_with(b"SQ") {
                break;
            }
            if line.starts_with(b"//") {
                return Err(self.truncated(&name, "its SQ line"));
            }
            if line.starts_with(b"AC") && acc.is_empty() {
                acc = field(line)
                    .split(|c: char| c == ';' || c.is_whitespace())
                    .find(|s| !s.is_empty())
                    .unwrap_or("")
                    .to_string();
            } else if line.starts_with(b"DE") {
                let text = field(line);
                if !desc.is_empty() && !text.is_empty() {
                    desc.push(' ');
                }
                desc.push_str(&text);
            }
        }
        let data_offset = self.lines.offset();

        let mut residues = keep.buffer()?;
        let mut len = 0u64;
        // residue lines carry spacing and position numbers, so no fixed-width addressing
        let mut shape = ShapeTracker::default();
        shape.mark_irregular();
        'lines: loop {
            if !self.lines.read_line()? {
                return Err(self.truncated(&name, "its // terminator"));
            }
            let line = self.lines.line();
            if line.starts_with(b"//") {
                break;
            }
            for &b in lines::content(line) {
                if b.is_ascii_whitespace() || b.is_ascii_digit() {
                    continue;
                }
                if !is_residue(b) {
                    return Err(Error::parse(
                        &self.path,
                        self.lines.line_start(),
                        format!("illegal character '{}' in sequence {}", b.escape_ascii(), name),
                    ));
                }
                len += 1;
                if keep.keeps() {
                    residues.push(b);
                    if keep.is_full(residues.len()) {
                        break 'lines;
                    }
                }
            }
        }

        Ok(Some(RawRecord {
            name,
            acc,
            desc,
            record_offset,
            data_offset,
            len,
            residues,
            shape: shape.finish(),
        }))
    }
}
