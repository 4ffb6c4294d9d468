use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::io::SeqFormat;

/// 索引文件扩展名，追加在序列文件名之后（`genome.fa` → `genome.fa.sqi`）。
pub const INDEX_EXTENSION: &str = "sqi";

const MAGIC: [u8; 8] = *b"SQFETCHI";
const VERSION: u32 = 1;

/// 定宽行布局：每行 `bytes_per_line` 字节，其中 `residues_per_line` 个残基。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub bytes_per_line: u32,
    pub residues_per_line: u32,
}

impl Layout {
    /// 第 `i` 个残基（0-based）在文件中的字节偏移。
    #[inline]
    pub fn residue_offset(&self, data_offset: u64, i: u64) -> u64 {
        let rpl = self.residues_per_line as u64;
        let bpl = self.bytes_per_line as u64;
        data_offset + (i / rpl) * bpl + i % rpl
    }
}

/// 被索引的序列文件。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub format: SeqFormat,
    /// 仅当全文件行宽一致时存在，允许按偏移直接取子序列。
    pub layout: Option<Layout>,
    pub lengths_known: bool,
}

/// 主键条目：名称到文件位置和长度。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub file_id: u16,
    pub record_offset: u64,
    pub data_offset: u64,
    pub length: u64,
}

/// 次键（登录号）到主键名称。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub alias: String,
    pub primary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub source_file: Option<String>,
    pub build_timestamp: Option<String>,
}

/// 按名称查到的记录长度。
///
/// 长度为 0 的记录是合法的（有些数据用它作分隔），与“该文件未记录长度”区分开。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLength {
    Residues(u64),
    Empty,
    Unknown,
}

impl RecordLength {
    pub fn residues(self) -> Option<u64> {
        match self {
            RecordLength::Residues(n) => Some(n),
            RecordLength::Empty => Some(0),
            RecordLength::Unknown => None,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Header {
    magic: [u8; 8],
    version: u32,
}

/// 名称 / 登录号索引。
///
/// 主键表和别名表都按名称排序存放，所以序号顺序是名称顺序而非文件中的顺序。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    meta: IndexMeta,
    files: Vec<FileEntry>,
    primary: Vec<Location>,
    aliases: Vec<Alias>,
}

/// `seqfile` 对应的索引路径。
pub fn index_path_for(seqfile: &Path) -> PathBuf {
    let mut s = seqfile.as_os_str().to_owned();
    s.push(".");
    s.push(INDEX_EXTENSION);
    PathBuf::from(s)
}

impl Index {
    /// 由构建器调用：`primary` 与 `aliases` 必须已排序且去重。
    pub(crate) fn from_parts(meta: IndexMeta, files: Vec<FileEntry>, primary: Vec<Location>, aliases: Vec<Alias>) -> Self {
        Self { meta, files, primary, aliases }
    }

    pub fn meta(&self) -> &IndexMeta {
        &self.meta
    }

    /// 主键数量。
    pub fn len(&self) -> usize {
        self.primary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
    }

    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    pub fn file(&self, file_id: u16) -> Option<&FileEntry> {
        self.files.get(file_id as usize)
    }

    pub fn aliases(&self) -> &[Alias] {
        &self.aliases
    }

    /// 先查主键，再查别名并解析到主键条目。
    pub fn find_by_name(&self, key: &str) -> Option<&Location> {
        if let Some(loc) = self.find_primary(key) {
            return Some(loc);
        }
        let i = self.aliases.binary_search_by(|a| a.alias.as_str().cmp(key)).ok()?;
        self.find_primary(&self.aliases[i].primary)
    }

    fn find_primary(&self, name: &str) -> Option<&Location> {
        self.primary
            .binary_search_by(|l| l.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.primary[i])
    }

    /// 索引存储顺序中的第 `n` 条。
    pub fn find_by_ordinal(&self, n: usize) -> Option<&Location> {
        self.primary.get(n)
    }

    pub fn record_length(&self, loc: &Location) -> RecordLength {
        match self.file(loc.file_id) {
            Some(f) if f.lengths_known => match loc.length {
                0 => RecordLength::Empty,
                n => RecordLength::Residues(n),
            },
            _ => RecordLength::Unknown,
        }
    }

    pub fn layout_of(&self, loc: &Location) -> Option<Layout> {
        self.file(loc.file_id).and_then(|f| f.layout)
    }

    /// 先写入临时文件再改名，失败时保留原有索引。
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        match self.write_to(&tmp) {
            Ok(()) => {
                fs::rename(&tmp, path)?;
                Ok(())
            }
            Err(e) => {
                let _ = fs::remove_file(&tmp);
                Err(e)
            }
        }
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut w, &Header { magic: MAGIC, version: VERSION }).map_err(encode_error)?;
        bincode::serialize_into(&mut w, self).map_err(encode_error)?;
        w.flush()?;
        w.get_ref().sync_all()?;
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let invalid = |msg: String| Error::IndexFormatInvalid { path: path.to_path_buf(), msg };
        let mut r = BufReader::new(File::open(path)?);
        let header: Header = bincode::deserialize_from(&mut r).map_err(|e| invalid(e.to_string()))?;
        if header.magic != MAGIC {
            return Err(invalid("not a sequence index file".to_string()));
        }
        if header.version != VERSION {
            return Err(invalid(format!(
                "index version {} is not supported (expected {})",
                header.version, VERSION
            )));
        }
        let idx: Self = bincode::deserialize_from(&mut r).map_err(|e| invalid(e.to_string()))?;
        idx.validate().map_err(invalid)?;
        Ok(idx)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(w) = self.primary.windows(2).find(|w| w[0].name >= w[1].name) {
            return Err(format!("primary keys out of order at {}", w[1].name));
        }
        if let Some(w) = self.aliases.windows(2).find(|w| w[0].alias >= w[1].alias) {
            return Err(format!("secondary keys out of order at {}", w[1].alias));
        }
        if let Some(l) = self.primary.iter().find(|l| l.file_id as usize >= self.files.len()) {
            return Err(format!("key {} refers to unknown file #{}", l.name, l.file_id));
        }
        if let Some(f) = self.files.iter().find(|f| {
            f.layout
                .is_some_and(|l| l.residues_per_line == 0 || l.bytes_per_line < l.residues_per_line)
        }) {
            return Err(format!("bad line layout recorded for {}", f.name));
        }
        if let Some(a) = self.aliases.iter().find(|a| self.find_primary(&a.primary).is_none()) {
            return Err(format!("secondary key {} points to missing key {}", a.alias, a.primary));
        }
        Ok(())
    }
}

fn encode_error(e: bincode::Error) -> Error {
    match *e {
        bincode::ErrorKind::Io(io) => Error::Io(io),
        other => Error::InternalConsistency(format!("cannot encode index: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(name: &str, roff: u64, len: u64) -> Location {
        Location { name: name.to_string(), file_id: 0, record_offset: roff, data_offset: roff + 6, length: len }
    }

    fn sample() -> Index {
        Index::from_parts(
            IndexMeta { source_file: Some("t.fa".into()), build_timestamp: None },
            vec![FileEntry {
                name: "t.fa".into(),
                format: SeqFormat::Fasta,
                layout: Some(Layout { bytes_per_line: 61, residues_per_line: 60 }),
                lengths_known: true,
            }],
            vec![loc("alpha", 0, 120), loc("beta", 200, 0), loc("gamma", 300, 7)],
            vec![Alias { alias: "ACC1".into(), primary: "gamma".into() }],
        )
    }

    #[test]
    fn lookup_by_name_alias_and_ordinal() {
        let idx = sample();
        assert_eq!(idx.find_by_name("beta").unwrap().record_offset, 200);
        assert_eq!(idx.find_by_name("ACC1").unwrap().name, "gamma");
        assert!(idx.find_by_name("delta").is_none());
        assert_eq!(idx.find_by_ordinal(0).unwrap().name, "alpha");
        assert!(idx.find_by_ordinal(3).is_none());
    }

    #[test]
    fn record_length_is_tri_state() {
        let mut idx = sample();
        let beta = idx.find_by_name("beta").unwrap().clone();
        let gamma = idx.find_by_name("gamma").unwrap().clone();
        assert_eq!(idx.record_length(&beta), RecordLength::Empty);
        assert_eq!(idx.record_length(&gamma), RecordLength::Residues(7));
        idx.files[0].lengths_known = false;
        assert_eq!(idx.record_length(&gamma), RecordLength::Unknown);
        assert_eq!(RecordLength::Unknown.residues(), None);
    }

    #[test]
    fn residue_offsets_skip_line_ends() {
        let l = Layout { bytes_per_line: 5, residues_per_line: 4 };
        assert_eq!(l.residue_offset(10, 0), 10);
        assert_eq!(l.residue_offset(10, 3), 13);
        assert_eq!(l.residue_offset(10, 4), 15);
        assert_eq!(l.residue_offset(10, 9), 21);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.fa.sqi");
        let idx = sample();
        idx.save_to_file(&path).unwrap();
        assert!(!dir.path().join("t.fa.sqi.tmp").exists());
        assert_eq!(Index::load_from_file(&path).unwrap(), idx);
    }

    #[test]
    fn load_rejects_foreign_and_future_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.sqi");
        std::fs::write(&path, b"not an index at all").unwrap();
        assert!(matches!(Index::load_from_file(&path), Err(Error::IndexFormatInvalid { .. })));

        let mut bytes = bincode::serialize(&Header { magic: MAGIC, version: VERSION + 1 }).unwrap();
        bytes.extend(bincode::serialize(&sample()).unwrap());
        std::fs::write(&path, bytes).unwrap();
        let err = Index::load_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("not supported"));
    }

    #[test]
    fn load_rejects_dangling_alias() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("d.sqi");
        let mut idx = sample();
        idx.aliases[0].primary = "nope".into();
        idx.save_to_file(&path).unwrap();
        assert!(matches!(Index::load_from_file(&path), Err(Error::IndexFormatInvalid { .. })));
    }

    #[test]
    fn load_rejects_zero_width_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("z.sqi");
        let mut idx = sample();
        idx.files[0].layout = Some(Layout { bytes_per_line: 1, residues_per_line: 0 });
        idx.save_to_file(&path).unwrap();
        assert!(matches!(Index::load_from_file(&path), Err(Error::IndexFormatInvalid { .. })));
    }

    #[test]
    fn index_path_appends_extension() {
        assert_eq!(index_path_for(Path::new("/d/genome.fa")), PathBuf::from("/d/genome.fa.sqi"));
    }
}
