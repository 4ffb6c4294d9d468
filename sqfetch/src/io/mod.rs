//! 记录解析层：把序列文件切分为带字节偏移的记录。
//!
//! 索引构建只需要每条记录的名称、登录号、偏移和长度；取序列时还需要残基。
//! 两种用途都经过 [`RecordParser`]，它按文件格式分派到具体解析器。

pub mod embl;
pub mod fasta;
pub mod genbank;
pub mod lines;

use std::fmt;
use std::io::{self, BufRead, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{reserve, Error, Result};
use embl::EmblParser;
use fasta::FastaParser;
use genbank::GenbankParser;
use lines::LineReader;

/// 支持的平面序列格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeqFormat {
    Fasta,
    Embl,
    /// GenBank / DDBJ。
    Genbank,
}

impl SeqFormat {
    /// 根据首个非空行判断格式，读完后把流倒回开头。
    pub fn detect<R: BufRead + Seek>(reader: &mut R) -> io::Result<Option<SeqFormat>> {
        let mut line = Vec::new();
        let found = loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break None;
            }
            if lines::is_blank(&line) {
                continue;
            }
            break if line.starts_with(b">") {
                Some(SeqFormat::Fasta)
            } else if line.starts_with(b"ID ") {
                Some(SeqFormat::Embl)
            } else if line.starts_with(b"LOCUS") {
                Some(SeqFormat::Genbank)
            } else {
                None
            };
        };
        reader.seek(SeekFrom::Start(0))?;
        Ok(found)
    }
}

impl fmt::Display for SeqFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SeqFormat::Fasta => "fasta",
            SeqFormat::Embl => "embl",
            SeqFormat::Genbank => "genbank",
        })
    }
}

impl FromStr for SeqFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fasta" | "fa" => Ok(SeqFormat::Fasta),
            "embl" | "uniprot" => Ok(SeqFormat::Embl),
            "genbank" | "gb" | "ddbj" => Ok(SeqFormat::Genbank),
            other => Err(format!("unknown sequence format '{}'", other)),
        }
    }
}

/// 一条记录的残基行形状，用于判断文件能否按行宽直接计算偏移。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineShape {
    /// 没有残基。
    Empty,
    /// 只有一行残基；`bytes` 含行尾。
    Single { bytes: u64, residues: u64 },
    /// 多行残基：除最后一行外每行 `bpl` 字节、`rpl` 个残基，最后一行不多于 `rpl`。
    Wrapped { bpl: u64, rpl: u64 },
    /// 行宽不一致，或行内夹有空白、数字等非残基字节。
    Irregular,
}

#[derive(Debug, Default)]
pub(crate) struct ShapeTracker {
    full: Option<(u64, u64)>,
    last: Option<(u64, u64)>,
    pending_blank: bool,
    irregular: bool,
}

impl ShapeTracker {
    /// `clean` 表示该行字节数恰好等于残基数加行尾。
    pub(crate) fn push(&mut self, bytes: u64, residues: u64, clean: bool) {
        if residues == 0 {
            // trailing blank lines are harmless; interior ones are not
            self.pending_blank = true;
            return;
        }
        if self.pending_blank || !clean {
            self.irregular = true;
        }
        if let Some(prev) = self.last.replace((bytes, residues)) {
            match self.full {
                None => self.full = Some(prev),
                Some(f) if f != prev => self.irregular = true,
                Some(_) => {}
            }
        }
    }

    pub(crate) fn mark_irregular(&mut self) {
        self.irregular = true;
    }

    pub(crate) fn finish(self) -> LineShape {
        if self.irregular {
            return LineShape::Irregular;
        }
        match (self.full, self.last) {
            (_, None) => LineShape::Empty,
            (None, Some((bytes, residues))) => LineShape::Single { bytes, residues },
            (Some((bpl, rpl)), Some((_, last))) if last <= rpl => LineShape::Wrapped { bpl, rpl },
            (Some(_), Some(_)) => LineShape::Irregular,
        }
    }
}

/// 读取记录时如何处理残基。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keep {
    /// 只统计长度。
    Nothing,
    /// 保留全部残基。
    All,
    /// 保留全部残基，并按已知长度预先申请空间。
    Sized(u64),
    /// 只读前 `n` 个残基就停下：`len` 为已读个数，游标停在记录中间。
    Prefix(usize),
}

impl Keep {
    pub(crate) fn keeps(self) -> bool {
        self != Keep::Nothing
    }

    /// 残基已读够，应当停止。
    pub(crate) fn is_full(self, kept: usize) -> bool {
        matches!(self, Keep::Prefix(n) if kept >= n)
    }

    pub(crate) fn buffer(self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Keep::Sized(n) = self {
            let n = usize::try_from(n).map_err(|_| {
                Error::OutOfMemory(format!("{} residues exceed the address space", n))
            })?;
            reserve(&mut buf, n, "reading sequence residues")?;
        }
        Ok(buf)
    }
}

/// 解析出的一条原始记录（文本残基）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub name: String,
    pub acc: String,
    pub desc: String,
    /// 记录起始（头行）偏移。
    pub record_offset: u64,
    /// 第一个残基行的偏移。
    pub data_offset: u64,
    pub len: u64,
    /// 按 [`Keep`] 填充。
    pub residues: Vec<u8>,
    pub shape: LineShape,
}

/// 按格式分派的记录解析器，拥有文件游标。
pub enum RecordParser<R> {
    Fasta(FastaParser<R>),
    Embl(EmblParser<R>),
    Genbank(GenbankParser<R>),
}

impl<R: BufRead + Seek> RecordParser<R> {
    pub fn new(format: SeqFormat, path: PathBuf, inner: R) -> Self {
        let lines = LineReader::new(inner);
        match format {
            SeqFormat::Fasta => RecordParser::Fasta(FastaParser::new(path, lines)),
            SeqFormat::Embl => RecordParser::Embl(EmblParser::new(path, lines)),
            SeqFormat::Genbank => RecordParser::Genbank(GenbankParser::new(path, lines)),
        }
    }

    pub fn format(&self) -> SeqFormat {
        match self {
            RecordParser::Fasta(_) => SeqFormat::Fasta,
            RecordParser::Embl(_) => SeqFormat::Embl,
            RecordParser::Genbank(_) => SeqFormat::Genbank,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            RecordParser::Fasta(p) => p.path(),
            RecordParser::Embl(p) => p.path(),
            RecordParser::Genbank(p) => p.path(),
        }
    }

    fn lines_mut(&mut self) -> &mut LineReader<R> {
        match self {
            RecordParser::Fasta(p) => p.lines_mut(),
            RecordParser::Embl(p) => p.lines_mut(),
            RecordParser::Genbank(p) => p.lines_mut(),
        }
    }

    /// 当前游标偏移。
    pub fn offset(&self) -> u64 {
        match self {
            RecordParser::Fasta(p) => p.lines().offset(),
            RecordParser::Embl(p) => p.lines().offset(),
            RecordParser::Genbank(p) => p.lines().offset(),
        }
    }

    pub fn position(&mut self, offset: u64) -> Result<()> {
        self.lines_mut().seek_to(offset)?;
        Ok(())
    }

    /// 读取游标处的下一条记录；到达文件末尾返回 `None`。
    pub fn next_record(&mut self, keep: Keep) -> Result<Option<RawRecord>> {
        match self {
            RecordParser::Fasta(p) => p.next_record(keep),
            RecordParser::Embl(p) => p.next_record(keep),
            RecordParser::Genbank(p) => p.next_record(keep),
        }
    }

    /// 从 `offset` 起读取 `len` 个原始字节。
    pub fn read_span(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        reserve(&mut buf, len, "reading subsequence")?;
        buf.resize(len, 0);
        match self.lines_mut().read_exact_at(offset, &mut buf) {
            Ok(()) => Ok(buf),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Err(Error::UnexpectedEof(self.path().to_path_buf()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
