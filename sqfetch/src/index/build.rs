use std::io::{BufRead, Seek};
use std::path::{Path, PathBuf};

use tracing::info;

use super::table::{Alias, FileEntry, Index, IndexMeta, Layout, Location};
use crate::error::{Error, Result};
use crate::io::{Keep, LineShape, RawRecord, RecordParser, SeqFormat};

/// 逐条记录累积一个文件的行宽布局；出现任何不一致即放弃。
#[derive(Debug, Default)]
struct LayoutTracker {
    wrapped: Option<(u64, u64)>,
    max_single: u64,
    single_eol: Option<u64>,
    broken: bool,
}

impl LayoutTracker {
    fn push(&mut self, shape: LineShape) {
        match shape {
            LineShape::Empty => {}
            LineShape::Irregular => self.broken = true,
            LineShape::Single { bytes, residues } => {
                self.max_single = self.max_single.max(residues);
                let eol = bytes - residues;
                if eol > 0 && self.single_eol.is_none() {
                    self.single_eol = Some(eol);
                }
            }
            LineShape::Wrapped { bpl, rpl } => match self.wrapped {
                None => self.wrapped = Some((bpl, rpl)),
                Some(w) if w != (bpl, rpl) => self.broken = true,
                Some(_) => {}
            },
        }
    }

    fn finish(self) -> Option<Layout> {
        if self.broken {
            return None;
        }
        let (bpl, rpl) = match self.wrapped {
            Some((bpl, rpl)) if self.max_single <= rpl => (bpl, rpl),
            Some(_) => return None,
            // every record fits on one line
            None if self.max_single > 0 => {
                (self.max_single + self.single_eol.unwrap_or(1), self.max_single)
            }
            None => return None,
        };
        Some(Layout {
            bytes_per_line: u32::try_from(bpl).ok()?,
            residues_per_line: u32::try_from(rpl).ok()?,
        })
    }
}

struct PendingFile {
    entry: FileEntry,
    path: PathBuf,
    layout: LayoutTracker,
    nseq: u64,
}

/// 索引构建器：收集记录信息，结束时排序、查重并计算布局。
pub struct IndexBuilder {
    files: Vec<PendingFile>,
    primary: Vec<Location>,
    aliases: Vec<Alias>,
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self { files: Vec::new(), primary: Vec::new(), aliases: Vec::new() }
    }

    /// 登记一个序列文件，返回其文件号。
    pub fn add_file(&mut self, path: &Path, format: SeqFormat) -> Result<u16> {
        let id = u16::try_from(self.files.len()).map_err(|_| Error::DuplicateOrMissingName {
            path: path.to_path_buf(),
            msg: "too many sequence files in one index".to_string(),
        })?;
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.files.push(PendingFile {
            entry: FileEntry { name, format, layout: None, lengths_known: true },
            path: path.to_path_buf(),
            layout: LayoutTracker::default(),
            nseq: 0,
        });
        Ok(id)
    }

    pub fn add_record(&mut self, file_id: u16, rec: &RawRecord) -> Result<()> {
        let file = self
            .files
            .get_mut(file_id as usize)
            .ok_or_else(|| Error::InternalConsistency(format!("no sequence file #{} registered", file_id)))?;
        file.nseq += 1;
        if rec.name.is_empty() {
            return Err(Error::DuplicateOrMissingName {
                path: file.path.clone(),
                msg: format!(
                    "every sequence must have a name to be indexed; failed to find name of seq #{}",
                    file.nseq
                ),
            });
        }
        file.layout.push(rec.shape);

        self.primary.push(Location {
            name: rec.name.clone(),
            file_id,
            record_offset: rec.record_offset,
            data_offset: rec.data_offset,
            length: rec.len,
        });
        if !rec.acc.is_empty() && rec.acc != rec.name {
            self.aliases.push(Alias { alias: rec.acc.clone(), primary: rec.name.clone() });
        }
        Ok(())
    }

    pub fn finish(self, meta: IndexMeta) -> Result<Index> {
        let IndexBuilder { files, mut primary, mut aliases } = self;
        let dup = |file_id: u16, msg: String| Error::DuplicateOrMissingName {
            path: files.get(file_id as usize).map(|f| f.path.clone()).unwrap_or_default(),
            msg,
        };

        primary.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(w) = primary.windows(2).find(|w| w[0].name == w[1].name) {
            return Err(dup(w[1].file_id, format!("primary key {} occurs more than once", w[1].name)));
        }

        aliases.sort_by(|a, b| a.alias.cmp(&b.alias));
        if let Some(w) = aliases.windows(2).find(|w| w[0].alias == w[1].alias) {
            let owner = file_of(&primary, &w[1].primary);
            return Err(dup(owner, format!("secondary key {} occurs more than once", w[1].alias)));
        }

        let files: Vec<FileEntry> = files
            .into_iter()
            .map(|f| FileEntry { layout: f.layout.finish(), ..f.entry })
            .collect();
        Ok(Index::from_parts(meta, files, primary, aliases))
    }
}

fn file_of(primary: &[Location], name: &str) -> u16 {
    primary
        .binary_search_by(|l| l.name.as_str().cmp(name))
        .map(|i| primary[i].file_id)
        .unwrap_or(0)
}

/// 从文件开头扫描一遍记录并生成索引；结束时游标不做保证，由调用方重新定位。
pub fn build_index<R: BufRead + Seek>(parser: &mut RecordParser<R>) -> Result<Index> {
    let path = parser.path().to_path_buf();
    let mut builder = IndexBuilder::new();
    let file_id = builder.add_file(&path, parser.format())?;

    parser.position(0)?;
    while let Some(rec) = parser.next_record(Keep::Nothing)? {
        builder.add_record(file_id, &rec)?;
    }

    let meta = IndexMeta {
        source_file: Some(path.display().to_string()),
        build_timestamp: Some(chrono::Utc::now().to_rfc3339()),
    };
    let idx = builder.finish(meta)?;
    let layout = idx.files().first().and_then(|f| f.layout);
    info!(
        file = %path.display(),
        records = idx.len(),
        aliases = idx.aliases().len(),
        ?layout,
        "built sequence index"
    );
    Ok(idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::RecordLength;
    use std::io::Cursor;

    fn build(format: SeqFormat, data: &[u8]) -> Result<Index> {
        let mut p = RecordParser::new(format, PathBuf::from("t.seq"), Cursor::new(data.to_vec()));
        build_index(&mut p)
    }

    fn rec(name: &str, acc: &str, shape: LineShape) -> RawRecord {
        RawRecord {
            name: name.into(),
            acc: acc.into(),
            desc: String::new(),
            record_offset: 0,
            data_offset: 0,
            len: 0,
            residues: Vec::new(),
            shape,
        }
    }

    #[test]
    fn entries_are_sorted_by_name() {
        let idx = build(SeqFormat::Fasta, b">seqB\nGG\n>seqA\nAAAA\n>mid\n\n").unwrap();
        let names: Vec<&str> = (0..idx.len()).map(|i| idx.find_by_ordinal(i).unwrap().name.as_str()).collect();
        assert_eq!(names, ["mid", "seqA", "seqB"]);
        let a = idx.find_by_name("seqA").unwrap();
        assert_eq!((a.record_offset, a.data_offset, a.length), (9, 15, 4));
        assert_eq!(idx.record_length(idx.find_by_name("mid").unwrap()), RecordLength::Empty);
        assert!(idx.meta().build_timestamp.is_some());
    }

    #[test]
    fn wrapped_file_gets_layout() {
        let idx = build(SeqFormat::Fasta, b">a\nACGT\nACGT\nAC\n>b\nACG\n>c\nACGT\nA\n").unwrap();
        assert_eq!(idx.files()[0].layout, Some(Layout { bytes_per_line: 5, residues_per_line: 4 }));
    }

    #[test]
    fn single_line_file_uses_longest_line() {
        let idx = build(SeqFormat::Fasta, b">a\nACGTAC\n>b\nAC\n").unwrap();
        assert_eq!(idx.files()[0].layout, Some(Layout { bytes_per_line: 7, residues_per_line: 6 }));
    }

    #[test]
    fn uneven_lines_have_no_layout() {
        let idx = build(SeqFormat::Fasta, b">a\nACGT\nACGT\n>b\nACG\nACG\n").unwrap();
        assert_eq!(idx.files()[0].layout, None);
        let idx = build(SeqFormat::Fasta, b">a\nACGT\nAC\n>b\nACGTAC\n").unwrap();
        assert_eq!(idx.files()[0].layout, None);
        let idx = build(SeqFormat::Fasta, b">a\nAC GT\nAC\n").unwrap();
        assert_eq!(idx.files()[0].layout, None);
    }

    #[test]
    fn embl_records_add_aliases() {
        let data = b"ID   one; SV 1\nAC   P1;\nSQ   Sequence 4 AA;\n     MKVL\n//\nID   two\nAC   two;\nSQ\n     MK\n//\n";
        let idx = build(SeqFormat::Embl, data).unwrap();
        assert_eq!(idx.aliases().len(), 1);
        assert_eq!(idx.find_by_name("P1").unwrap().name, "one");
        assert_eq!(idx.files()[0].layout, None);
    }

    #[test]
    fn missing_name_is_fatal() {
        let err = build(SeqFormat::Fasta, b">a\nAC\n>\nAC\n").unwrap_err();
        match err {
            Error::DuplicateOrMissingName { msg, .. } => assert!(msg.contains("seq #2"), "{}", msg),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn duplicate_keys_are_fatal() {
        assert!(matches!(
            build(SeqFormat::Fasta, b">a\nAC\n>a\nGG\n"),
            Err(Error::DuplicateOrMissingName { .. })
        ));

        let mut b = IndexBuilder::new();
        let f = b.add_file(Path::new("t.seq"), SeqFormat::Embl).unwrap();
        b.add_record(f, &rec("one", "ACC", LineShape::Irregular)).unwrap();
        b.add_record(f, &rec("two", "ACC", LineShape::Irregular)).unwrap();
        assert!(matches!(b.finish(IndexMeta::default()), Err(Error::DuplicateOrMissingName { .. })));

    }

    #[test]
    fn accession_may_shadow_another_primary_key() {
        let mut b = IndexBuilder::new();
        let f = b.add_file(Path::new("t.seq"), SeqFormat::Embl).unwrap();
        b.add_record(f, &rec("one", "two", LineShape::Irregular)).unwrap();
        b.add_record(f, &rec("two", "", LineShape::Irregular)).unwrap();
        let index = b.finish(IndexMeta::default()).unwrap();
        assert_eq!(index.aliases().len(), 1);
        // primary keys are looked up first
        assert_eq!(index.find_by_name("two").unwrap().name, "two");
        assert_eq!(index.find_by_name("one").unwrap().name, "one");
    }

    #[test]
    fn parse_errors_abort_the_build() {
        assert!(matches!(build(SeqFormat::Fasta, b">a\nAC1\n"), Err(Error::Parse { .. })));
    }
}
