//! 打开的序列文件句柄：游标、读取模式和可选的索引。
//!
//! 所有读取都经过同一个游标，因此方法都取 `&mut self`；不同句柄之间互不共享状态。

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::index::{build_index, index_path_for, Index, Location, RecordLength};
use crate::io::{Keep, LineShape, RawRecord, RecordParser, SeqFormat};
use crate::seq::alphabet::AlphabetKind;
use crate::seq::coords::{self, Strand};
use crate::seq::format::{to_fasta, LineWidth};
use crate::seq::{check_range, Residues, Sequence};

/// 残基以文本还是数字编码返回。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Text,
    Digital(AlphabetKind),
}

impl Mode {
    pub fn is_digital(self) -> bool {
        matches!(self, Mode::Digital(_))
    }
}

/// 打开选项。默认：自动识别格式，文本模式。
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    format: Option<SeqFormat>,
    digital: bool,
    alphabet: Option<AlphabetKind>,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 跳过格式识别。
    pub fn format(mut self, format: SeqFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn digital(mut self, digital: bool) -> Self {
        self.digital = digital;
        self
    }

    /// 数字模式下指定字母表；不指定时从第一条记录猜测。
    pub fn alphabet(mut self, alphabet: AlphabetKind) -> Self {
        self.alphabet = Some(alphabet);
        self
    }
}

/// 子序列请求：1-based 闭区间，`end == 0` 表示到末尾，`start > end` 表示反向互补。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeRequest {
    pub start: u64,
    pub end: u64,
    pub force_revcomp: bool,
    pub rename: Option<String>,
}

impl RangeRequest {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end, ..Self::default() }
    }

    /// 单个残基（`start == end`）只能靠这个标志表示反向。
    pub fn revcomp(mut self, force: bool) -> Self {
        self.force_revcomp = force;
        self
    }

    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.rename = Some(name.into());
        self
    }
}

pub struct SeqFile {
    path: PathBuf,
    mode: Mode,
    parser: RecordParser<BufReader<File>>,
    index: Option<Index>,
}

impl SeqFile {
    pub fn open(path: impl AsRef<Path>, opts: &OpenOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::FileNotFound(path.clone()),
            _ => Error::Io(e),
        })?;
        let mut reader = BufReader::new(file);
        let format = match opts.format {
            Some(f) => f,
            None => SeqFormat::detect(&mut reader)?.ok_or_else(|| Error::FormatUnrecognized(path.clone()))?,
        };
        let mut parser = RecordParser::new(format, path.clone(), reader);
        let mode = match (opts.digital, opts.alphabet) {
            (false, _) => Mode::Text,
            (true, Some(a)) => Mode::Digital(a),
            (true, None) => Mode::Digital(guess_alphabet(&mut parser)?),
        };
        debug!(path = %path.display(), %format, ?mode, "opened sequence file");
        Ok(Self { path, mode, parser, index: None })
    }

    /// 关闭句柄，同时释放文件和索引。
    pub fn close(self) {}

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> SeqFormat {
        self.parser.format()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn index_path(&self) -> PathBuf {
        index_path_for(&self.path)
    }

    /// 加载已有的索引文件；文件不存在时返回 `Ok(false)`。
    pub fn open_index(&mut self) -> Result<bool> {
        let idx_path = self.index_path();
        if !idx_path.exists() {
            return Ok(false);
        }
        let idx = Index::load_from_file(&idx_path)?;
        info!(index = %idx_path.display(), records = idx.len(), "attached sequence index");
        self.index = Some(idx);
        Ok(true)
    }

    /// 扫描整个文件重建索引，原子地写到磁盘并挂到句柄上；游标回到开头。
    pub fn create_index(&mut self) -> Result<()> {
        let built = build_index(&mut self.parser);
        let rewound = self.parser.position(0);
        let idx = built?;
        rewound?;
        idx.save_to_file(&self.index_path())?;
        self.index = Some(idx);
        Ok(())
    }

    pub fn detach_index(&mut self) -> Option<Index> {
        self.index.take()
    }

    pub fn index(&self) -> Option<&Index> {
        self.index.as_ref()
    }

    pub(crate) fn require_index(&self) -> Result<&Index> {
        self.index.as_ref().ok_or_else(|| Error::IndexAbsent(self.path.clone()))
    }

    /// 按主键或登录号定位记录。
    pub fn locate(&self, key: &str) -> Result<&Location> {
        self.require_index()?
            .find_by_name(key)
            .ok_or_else(|| Error::key_not_found(key, &self.path))
    }

    fn locate_ordinal(&self, n: usize) -> Result<&Location> {
        self.require_index()?
            .find_by_ordinal(n)
            .ok_or_else(|| Error::key_not_found(format!("#{}", n), &self.path))
    }

    /// 不存在时返回 `Ok(false)`，没有索引仍然是错误。
    pub fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.require_index()?.find_by_name(key).is_some())
    }

    /// 不存在时返回 `Ok(None)`。
    pub fn length_by_name(&self, key: &str) -> Result<Option<RecordLength>> {
        let idx = self.require_index()?;
        Ok(idx.find_by_name(key).map(|loc| idx.record_length(loc)))
    }

    pub fn name_and_length_by_ordinal(&self, n: usize) -> Result<(String, RecordLength)> {
        let loc = self.locate_ordinal(n)?;
        let len = self.require_index()?.record_length(loc);
        Ok((loc.name.clone(), len))
    }

    pub fn sequence_count(&self) -> Result<usize> {
        Ok(crate::index::stats::sequence_count(self.require_index()?))
    }

    pub fn total_residues(&self) -> Result<Option<u64>> {
        Ok(crate::index::stats::total_residues(self.require_index()?))
    }

    /// 读取 `loc` 处的整条记录。残基缓冲按索引长度预先申请。
    pub fn fetch_full(&mut self, loc: &Location) -> Result<Sequence> {
        self.parser.position(loc.record_offset)?;
        let rec = self
            .parser
            .next_record(Keep::Sized(loc.length))?
            .ok_or_else(|| Error::UnexpectedEof(self.path.clone()))?;
        if rec.name != loc.name {
            return Err(Error::InternalConsistency(format!(
                "index places {} at byte {} of {}, but found {} there",
                loc.name,
                loc.record_offset,
                self.path.display(),
                rec.name
            )));
        }
        self.make_sequence(rec)
    }

    pub fn fetch_by_name(&mut self, key: &str) -> Result<Sequence> {
        let loc = self.locate(key)?.clone();
        debug!(key, record = %loc.name, offset = loc.record_offset, "fetching record");
        self.fetch_full(&loc)
    }

    /// 按索引存储顺序（名称顺序）取第 `n` 条。
    pub fn fetch_by_ordinal(&mut self, n: usize) -> Result<Sequence> {
        let loc = self.locate_ordinal(n)?.clone();
        self.fetch_full(&loc)
    }

    /// 取正向子序列 `[start, end]`，结果名为记录名，不带登录号和描述。
    ///
    /// 文件行宽一致时直接按偏移读取所需字节，否则读出整条记录再截取。
    pub fn fetch_range(&mut self, loc: &Location, start: u64, end: u64) -> Result<Sequence> {
        let idx = self.require_index()?;
        let known_len = match idx.record_length(loc) {
            RecordLength::Unknown => None,
            l => l.residues(),
        };
        let layout = idx.layout_of(loc);

        let (layout, len) = match (layout, known_len) {
            (Some(layout), Some(len)) => (layout, len),
            _ => {
                debug!(record = %loc.name, "no uniform layout, reading whole record");
                let full = self.fetch_full(loc)?;
                let end = if end == 0 { full.len() } else { end };
                return full.subsequence(start, end);
            }
        };

        let end = if end == 0 { len } else { end };
        check_range(&loc.name, start, end, len)?;
        let first = layout.residue_offset(loc.data_offset, start - 1);
        let last = layout.residue_offset(loc.data_offset, end - 1);
        let span = usize::try_from(last - first + 1)
            .map_err(|_| Error::OutOfMemory(format!("reading {} bytes of {}", last - first + 1, loc.name)))?;
        debug!(record = %loc.name, start, end, offset = first, span, "reading subsequence by offset");

        let mut text = self.parser.read_span(first, span)?;
        text.retain(|&b| b != b'\n' && b != b'\r');
        if text.len() as u64 != end - start + 1 {
            return Err(Error::InternalConsistency(format!(
                "expected {} residues of {} at byte {}, read {}",
                end - start + 1,
                loc.name,
                first,
                text.len()
            )));
        }
        let raw = RawRecord {
            name: loc.name.clone(),
            acc: String::new(),
            desc: String::new(),
            record_offset: loc.record_offset,
            data_offset: first,
            len: text.len() as u64,
            residues: text,
            shape: LineShape::Empty,
        };
        self.make_sequence(raw)
    }

    /// 按调用方的坐标取子序列，必要时反向互补。
    ///
    /// 默认命名为 `<key>/<start>-<end>`，`end == 0` 时用记录末端的坐标。
    pub fn fetch_subsequence(&mut self, key: &str, req: &RangeRequest) -> Result<Sequence> {
        let loc = self.locate(key)?.clone();
        let c = coords::normalize(req.start, req.end, req.force_revcomp);
        let sub = self.fetch_range(&loc, c.start, c.end)?;
        let effective_end = if req.end == 0 { c.start + sub.len() - 1 } else { req.end };
        let sub = match c.strand {
            Strand::Forward => sub,
            Strand::Reverse => sub.reverse_complement()?,
        };
        let name = match &req.rename {
            Some(n) => n.clone(),
            None => format!("{}/{}-{}", key, req.start, effective_end),
        };
        Ok(sub.renamed(name))
    }

    /// 读取游标处的下一条记录；文件末尾返回 `None`。不需要索引。
    pub fn next_sequence(&mut self) -> Result<Option<Sequence>> {
        match self.parser.next_record(Keep::All)? {
            Some(rec) => self.make_sequence(rec).map(Some),
            None => Ok(None),
        }
    }

    /// 与 [`next_sequence`](Self::next_sequence) 相同，但文件末尾是错误。
    pub fn fetch_next(&mut self) -> Result<Sequence> {
        self.next_sequence()?.ok_or_else(|| Error::UnexpectedEof(self.path.clone()))
    }

    /// 从游标处顺序迭代剩余记录。
    pub fn sequences(&mut self) -> impl Iterator<Item = Result<Sequence>> + '_ {
        std::iter::from_fn(move || self.next_sequence().transpose())
    }

    /// 把游标移到某条记录的起始偏移。
    pub fn position(&mut self, offset: u64) -> Result<()> {
        self.parser.position(offset)
    }

    pub fn rewind(&mut self) -> Result<()> {
        self.parser.position(0)
    }

    pub fn fetch_fasta(&mut self, key: &str, width: LineWidth) -> Result<String> {
        let width = width.check()?;
        to_fasta(&self.fetch_by_name(key)?, width)
    }

    pub fn fetch_fasta_by_ordinal(&mut self, n: usize, width: LineWidth) -> Result<String> {
        let width = width.check()?;
        to_fasta(&self.fetch_by_ordinal(n)?, width)
    }

    pub fn fetch_next_fasta(&mut self, width: LineWidth) -> Result<String> {
        let width = width.check()?;
        to_fasta(&self.fetch_next()?, width)
    }

    pub fn fetch_subseq_fasta(&mut self, key: &str, req: &RangeRequest, width: LineWidth) -> Result<String> {
        let width = width.check()?;
        to_fasta(&self.fetch_subsequence(key, req)?, width)
    }

    fn make_sequence(&self, rec: RawRecord) -> Result<Sequence> {
        let residues = match self.mode {
            Mode::Text => Residues::Text(rec.residues),
            Mode::Digital(alphabet) => {
                let codes = alphabet.digitize(&rec.residues).map_err(|b| {
                    Error::parse(
                        &self.path,
                        rec.data_offset,
                        format!(
                            "illegal residue '{}' for {} alphabet in sequence {}",
                            b.escape_ascii(),
                            alphabet,
                            rec.name
                        ),
                    )
                })?;
                Residues::Digital { alphabet, codes }
            }
        };
        Ok(Sequence::new(rec.name, rec.acc, rec.desc, residues))
    }
}

/// 猜字母表时最多读取的残基数。
const GUESS_WINDOW: usize = 4000;

/// 只看第一条记录开头的 [`GUESS_WINDOW`] 个残基。
fn guess_alphabet(parser: &mut RecordParser<BufReader<File>>) -> Result<AlphabetKind> {
    let path = parser.path().to_path_buf();
    let undetermined = |msg: &str| Error::AlphabetUndetermined { path: path.clone(), msg: msg.to_string() };
    parser.position(0)?;
    let first = parser.next_record(Keep::Prefix(GUESS_WINDOW))?;
    let err = match first {
        None => undetermined("file is empty"),
        Some(rec) => match AlphabetKind::guess(&rec.residues) {
            Some(a) => {
                parser.position(0)?;
                return Ok(a);
            }
            None => undetermined(&format!("residues of {} fit no single alphabet", rec.name)),
        },
    };
    Err(err)
}
