//! 跨文件的序列同一性比较。
//!
//! 两个句柄都必须已挂索引，且读取模式（文本 / 数字）相同；
//! 比较的是取回后的残基，不看名称和描述。

use tracing::debug;

use crate::error::{Error, Result};
use crate::seq::{Residues, Sequence};
use crate::sqfile::{RangeRequest, SeqFile};

fn check_pair(h1: &SeqFile, h2: &SeqFile) -> Result<()> {
    h1.require_index()?;
    h2.require_index()?;
    match (h1.mode().is_digital(), h2.mode().is_digital()) {
        (true, false) => Err(Error::DigitizationModeMismatch {
            digitized: h1.path().to_path_buf(),
            text: h2.path().to_path_buf(),
        }),
        (false, true) => Err(Error::DigitizationModeMismatch {
            digitized: h2.path().to_path_buf(),
            text: h1.path().to_path_buf(),
        }),
        _ => Ok(()),
    }
}

/// `h1` 中的 `name1` 与 `h2` 中的 `name2` 是否残基完全相同。
pub fn compare(h1: &mut SeqFile, name1: &str, h2: &mut SeqFile, name2: &str) -> Result<bool> {
    check_pair(h1, h2)?;
    let a = h1.fetch_by_name(name1)?;
    let b = h2.fetch_by_name(name2)?;
    let same = identical(&a, &b)?;
    debug!(name1, name2, same, "compared sequences");
    Ok(same)
}

/// 与 [`compare`] 相同，但第二个操作数是 `name2` 的子区间 `[start2, end2]`
/// （`start2 > end2` 取反向互补）。
pub fn compare_to_range(
    h1: &mut SeqFile,
    name1: &str,
    h2: &mut SeqFile,
    name2: &str,
    start2: u64,
    end2: u64,
) -> Result<bool> {
    check_pair(h1, h2)?;
    let a = h1.fetch_by_name(name1)?;
    let b = h2.fetch_subsequence(name2, &RangeRequest::new(start2, end2))?;
    identical(&a, &b)
}

/// 同一文件内两条记录的比较。
pub fn compare_within(h: &mut SeqFile, name1: &str, name2: &str) -> Result<bool> {
    h.require_index()?;
    let a = h.fetch_by_name(name1)?;
    let b = h.fetch_by_name(name2)?;
    identical(&a, &b)
}

/// 残基逐个相等。两者表示不同（一个文本一个数字）时返回错误。
pub fn identical(a: &Sequence, b: &Sequence) -> Result<bool> {
    if a.len() != b.len() {
        return Ok(false);
    }
    match (a.residues(), b.residues()) {
        (Residues::Text(x), Residues::Text(y)) => Ok(x == y),
        (Residues::Digital { codes: x, .. }, Residues::Digital { codes: y, .. }) => Ok(x == y),
        _ => Err(Error::InternalConsistency(format!(
            "cannot compare {} and {}: one is digital, the other text",
            a.name, b.name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqfile::OpenOptions;
    use std::path::Path;
    use tempfile::TempDir;

    fn open(dir: &Path, name: &str, content: &str, digital: bool, index: bool) -> SeqFile {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        let mut f = SeqFile::open(&path, &OpenOptions::new().digital(digital)).unwrap();
        if index {
            f.create_index().unwrap();
        }
        f
    }

    fn pair(c1: &str, c2: &str) -> (TempDir, SeqFile, SeqFile) {
        let dir = tempfile::tempdir().unwrap();
        let a = open(dir.path(), "a.fa", c1, false, true);
        let b = open(dir.path(), "b.fa", c2, false, true);
        (dir, a, b)
    }

    #[test]
    fn reflexive_and_mutated() {
        let (_d, mut a, mut b) = pair(">x\nACGTACGT\n", ">x\nACGTACGT\n>y\nACGTACGA\n>z\nACGT\n");
        assert!(compare(&mut a, "x", &mut b, "x").unwrap());
        assert!(!compare(&mut a, "x", &mut b, "y").unwrap());
        assert!(!compare(&mut a, "x", &mut b, "z").unwrap());
        assert!(compare_within(&mut b, "x", "x").unwrap());
        assert!(!compare_within(&mut b, "x", "y").unwrap());
    }

    #[test]
    fn compares_against_subrange() {
        let (_d, mut a, mut b) = pair(">q\nACGT\n>rc\nGACG\n", ">t\nGGACGTCC\n");
        assert!(compare_to_range(&mut a, "q", &mut b, "t", 3, 6).unwrap());
        assert!(compare_to_range(&mut a, "rc", &mut b, "t", 7, 4).unwrap());
        assert!(!compare_to_range(&mut a, "q", &mut b, "t", 2, 5).unwrap());
    }

    #[test]
    fn missing_key_is_fatal() {
        let (_d, mut a, mut b) = pair(">x\nAC\n", ">x\nAC\n");
        assert!(matches!(compare(&mut a, "x", &mut b, "nope"), Err(Error::KeyNotFound { .. })));
    }

    #[test]
    fn both_files_need_an_index() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = open(dir.path(), "a.fa", ">x\nAC\n", false, true);
        let mut b = open(dir.path(), "b.fa", ">x\nAC\n", false, false);
        match compare(&mut a, "x", &mut b, "x") {
            Err(Error::IndexAbsent(p)) => assert!(p.ends_with("b.fa")),
            other => panic!("unexpected result: {:?}", other.map_err(|e| e.to_string())),
        }
    }

    #[test]
    fn modes_must_match() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = open(dir.path(), "a.fa", ">x\nACGT\n", false, true);
        let mut b = open(dir.path(), "b.fa", ">x\nACGT\n", true, true);
        match compare(&mut a, "x", &mut b, "x") {
            Err(Error::DigitizationModeMismatch { digitized, text }) => {
                assert!(digitized.ends_with("b.fa"));
                assert!(text.ends_with("a.fa"));
            }
            other => panic!("unexpected result: {:?}", other.map_err(|e| e.to_string())),
        }

        let mut c = open(dir.path(), "c.fa", ">y\nACGT\n", true, true);
        assert!(compare(&mut b, "x", &mut c, "y").unwrap());
    }

    #[test]
    fn mixed_representations_are_an_error() {
        let t = Sequence::from_text("t", "AC");
        let d = t.digitize(crate::seq::alphabet::AlphabetKind::Dna).unwrap();
        assert!(matches!(identical(&t, &d), Err(Error::InternalConsistency(_))));
    }
}
