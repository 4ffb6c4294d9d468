use std::io::{BufRead, Seek};
use std::path::{Path, PathBuf};

use super::lines::{self, LineReader};
use super::{Keep, RawRecord, ShapeTracker};
use crate::error::{Error, Result};

/// FASTA 记录解析器。
///
/// 头行 `>name description`：名称取第一个空白分隔的词，其余为描述。
/// 残基保持原样（不改大小写），行内空白被跳过。
pub struct FastaParser<R> {
    path: PathBuf,
    lines: LineReader<R>,
}

#[inline]
pub(crate) fn is_residue(b: u8) -> bool {
    b.is_ascii_alphabetic() || matches!(b, b'-' | b'.' | b'*' | b'~')
}

impl<R: BufRead + Seek> FastaParser<R> {
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

    pub fn next_record(&mut self, keep: Keep) -> Result<Option<RawRecord>> {
        // Find header line
        loop {
            if !self.lines.read_line()? {
                return Ok(None);
            }
            if !lines::is_blank(self.lines.line()) {
                break;
            }
        }
        let record_offset = self.lines.line_start();
        let line = self.lines.line();
        if !line.starts_with(b">") {
            return Err(Error::parse(
                &self.path,
                record_offset,
                "expected '>' at start of a sequence record",
            ));
        }

        // Parse id and description
        let header = String::from_utf8_lossy(lines::content(&line[1..])).into_owned();
        let header = header.trim();
        let mut parts = header.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or("").to_string();
        let desc = parts.next().map(|s| s.trim().to_string()).unwrap_or_default();
        let data_offset = self.lines.offset();

        // Read sequence lines
        let mut residues = keep.buffer()?;
        let mut len = 0u64;
        let mut shape = ShapeTracker::default();
        'lines: while self.lines.read_line()? {
            let line = self.lines.line();
            if line.starts_with(b">") {
                self.lines.unread();
                break;
            }
            let mut n = 0u64;
            for &b in lines::content(line) {
                match b {
                    b' ' | b'\t' | b'\r' => {}
                    _ if is_residue(b) => {
                        n += 1;
                        if keep.keeps() {
                            residues.push(b);
                            if keep.is_full(residues.len()) {
                                len += n;
                                break 'lines;
                            }
                        }
                    }
                    _ => {
                        return Err(Error::parse(
                            &self.path,
                            self.lines.line_start(),
                            format!("illegal character '{}' in sequence {}", b.escape_ascii(), name),
                        ));
                    }
                }
            }
            let bytes = line.len() as u64;
            shape.push(bytes, n, bytes == n + lines::eol_len(line) as u64);
            len += n;
        }

        Ok(Some(RawRecord {
            name,
            acc: String::new(),
            desc,
            record_offset,
            data_offset,
            len,
            residues,
            shape: shape.finish(),
        }))
    }
}
