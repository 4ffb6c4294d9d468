use std::io::{BufRead, Seek};
use std::path::{Path, PathBuf};

use super::fasta::is_residue;
use super::lines::{self, LineReader};
use super::{Keep, RawRecord, ShapeTracker};
use crate::error::{Error, Result};

/// GenBank / DDBJ 平面文件解析器。
///
/// - `LOCUS` 行第二个词为名称
/// - `ACCESSION` 行第一个登录号作为 accession
/// - `DEFINITION` 及其缩进续行拼接为描述
/// - `ORIGIN` 之后到 `//` 之间为残基，行首位置编号和空白被忽略
pub struct GenbankParser<R> {
    path: PathBuf,
    lines: LineReader<R>,
}

/// 关键字之后的文本（关键字占前 12 列）。
fn value(line: &[u8]) -> String {
    let s = String::from_utf8_lossy(lines::content(line));
    s.get(12..).unwrap_or("").trim().to_string()
}

impl<R: BufRead + Seek> GenbankParser<R> {
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
        if !self.lines.line().starts_with(b"LOCUS") {
            return Err(Error::parse(
                &self.path,
                record_offset,
                "expected LOCUS line at start of a GenBank record",
            ));
        }
        let name = String::from_utf8_lossy(lines::content(self.lines.line()))
            .split_whitespace()
            .nth(1)
            .unwrap_or("")
            .to_string();

        let mut acc = String::new();
        let mut desc = String::new();
        let mut in_definition = false;
        loop {
            if !self.lines.read_line()? {
                return Err(self.truncated(&name, "its ORIGIN line"));
            }
            let line = self.lines.line();
            if line.starts_with(b"ORIGIN") {
                break;
            }
            if line.starts_with(b"//") {
                return Err(self.truncated(&name, "its ORIGIN line"));
            }
            let continued = line.first().is_some_and(|b| *b == b' ');
            if in_definition && continued {
                let text = String::from_utf8_lossy(lines::content(line));
                let text = text.trim();
                if !text.is_empty() {
                    desc.push(' ');
                    desc.push_str(text);
                }
                continue;
            }
            in_definition = false;
            if line.starts_with(b"DEFINITION") {
                desc = value(line);
                in_definition = true;
            } else if line.starts_with(b"ACCESSION") && acc.is_empty() {
                acc = value(line).split_whitespace().next().unwrap_or("").to_string();
            }
        }
        let data_offset = self.lines.offset();

        let mut residues = keep.buffer()?;
        let mut len = 0u64;
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
