//! 序列值及其纯变换。
//!
//! [`Sequence`] 一旦取出就不再被原地修改：反向互补、数字化、文本化和截取
//! 都返回新的值。

pub mod alphabet;
pub mod coords;
pub mod format;

use crate::error::{Error, Result};
use alphabet::AlphabetKind;

/// 残基的两种表示。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Residues {
    /// 文件中的原始字符（保留大小写）。
    Text(Vec<u8>),
    /// 字母表编码，见 [`AlphabetKind`]。
    Digital { alphabet: AlphabetKind, codes: Vec<u8> },
}

impl Residues {
    pub fn len(&self) -> usize {
        match self {
            Residues::Text(t) => t.len(),
            Residues::Digital { codes, .. } => codes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    pub name: String,
    pub acc: String,
    pub desc: String,
    residues: Residues,
}

impl Sequence {
    pub fn new(name: impl Into<String>, acc: impl Into<String>, desc: impl Into<String>, residues: Residues) -> Self {
        Self { name: name.into(), acc: acc.into(), desc: desc.into(), residues }
    }

    /// 只有名称和文本残基的序列。
    pub fn from_text(name: impl Into<String>, residues: impl Into<Vec<u8>>) -> Self {
        Self::new(name, "", "", Residues::Text(residues.into()))
    }

    pub fn len(&self) -> u64 {
        self.residues.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    pub fn residues(&self) -> &Residues {
        &self.residues
    }

    pub fn is_digital(&self) -> bool {
        matches!(self.residues, Residues::Digital { .. })
    }

    /// 文本残基；数字序列返回 `None`。
    pub fn text(&self) -> Option<&[u8]> {
        match &self.residues {
            Residues::Text(t) => Some(t.as_slice()),
            Residues::Digital { .. } => None,
        }
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn digitize(&self, alphabet: AlphabetKind) -> Result<Sequence> {
        let codes = match &self.residues {
            Residues::Text(t) => alphabet.digitize(t).map_err(|b| {
                Error::InvalidParameter(format!(
                    "illegal residue '{}' for {} alphabet in sequence {}",
                    b.escape_ascii(),
                    alphabet,
                    self.name
                ))
            })?,
            Residues::Digital { alphabet: a, codes } if *a == alphabet => codes.clone(),
            Residues::Digital { .. } => {
                return self.textize()?.digitize(alphabet);
            }
        };
        Ok(self.with_residues(Residues::Digital { alphabet, codes }))
    }

    pub fn textize(&self) -> Result<Sequence> {
        let text = match &self.residues {
            Residues::Text(t) => t.clone(),
            Residues::Digital { alphabet, codes } => alphabet.textize(codes).map_err(|c| {
                Error::InternalConsistency(format!(
                    "problem converting digitized sequence {} to text (code {})",
                    self.name, c
                ))
            })?,
        };
        Ok(self.with_residues(Residues::Text(text)))
    }

    pub fn reverse_complement(&self) -> Result<Sequence> {
        let rc = match &self.residues {
            Residues::Text(t) => alphabet::revcomp(t).map(Residues::Text),
            Residues::Digital { alphabet, codes } => alphabet
                .revcomp_codes(codes)
                .map(|codes| Residues::Digital { alphabet: *alphabet, codes }),
        };
        rc.map(|r| self.with_residues(r)).ok_or_else(|| {
            Error::InvalidParameter(format!("failed to reverse complement {}; is it a protein?", self.name))
        })
    }

    /// 截取 1-based 闭区间 `[start, end]`，结果不带登录号和描述。
    pub fn subsequence(&self, start: u64, end: u64) -> Result<Sequence> {
        check_range(&self.name, start, end, self.len())?;
        let (s, e) = ((start - 1) as usize, end as usize);
        let residues = match &self.residues {
            Residues::Text(t) => Residues::Text(t[s..e].to_vec()),
            Residues::Digital { alphabet, codes } => {
                Residues::Digital { alphabet: *alphabet, codes: codes[s..e].to_vec() }
            }
        };
        Ok(Sequence::new(self.name.clone(), "", "", residues))
    }

    fn with_residues(&self, residues: Residues) -> Sequence {
        Sequence { name: self.name.clone(), acc: self.acc.clone(), desc: self.desc.clone(), residues }
    }
}

/// 校验 1-based 闭区间是否落在长度为 `len` 的序列内。
pub(crate) fn check_range(name: &str, start: u64, end: u64, len: u64) -> Result<()> {
    if start == 0 {
        return Err(Error::InvalidParameter(format!(
            "subsequence start must be >= 1 (got 0 for {})",
            name
        )));
    }
    if end > len {
        return Err(Error::InvalidParameter(format!(
            "subsequence end {} exceeds length {} of {}",
            end, len, name
        )));
    }
    if start > end {
        return Err(Error::InvalidParameter(format!(
            "subsequence start {} is beyond end {} of {}",
            start, end, name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq() -> Sequence {
        Sequence::new("s1", "AC1", "some desc", Residues::Text(b"AAAACCCG".to_vec()))
    }

    #[test]
    fn revcomp_returns_new_value() {
        let s = seq();
        let rc = s.reverse_complement().unwrap();
        assert_eq!(rc.text().unwrap(), b"CGGGTTTT");
        assert_eq!(rc.name, "s1");
        assert_eq!(s.text().unwrap(), b"AAAACCCG");
    }

    #[test]
    fn revcomp_of_protein_fails() {
        let p = Sequence::from_text("p", "MEEPLQ");
        assert!(matches!(p.reverse_complement(), Err(Error::InvalidParameter(_))));
        let d = p.digitize(AlphabetKind::Amino).unwrap();
        assert!(d.reverse_complement().is_err());
    }

    #[test]
    fn digitize_then_textize() {
        let d = seq().digitize(AlphabetKind::Dna).unwrap();
        assert!(d.is_digital());
        assert_eq!(d.len(), 8);
        assert!(d.text().is_none());
        let rc = d.reverse_complement().unwrap().textize().unwrap();
        assert_eq!(rc.text().unwrap(), b"CGGGTTTT");
        assert!(Sequence::from_text("x", "AC9").digitize(AlphabetKind::Dna).is_err());
    }

    #[test]
    fn subsequence_bounds() {
        let s = seq();
        let sub = s.subsequence(3, 6).unwrap();
        assert_eq!(sub.text().unwrap(), b"AACC");
        assert!(sub.acc.is_empty() && sub.desc.is_empty());
        assert_eq!(s.subsequence(8, 8).unwrap().text().unwrap(), b"G");
        assert!(s.subsequence(0, 3).is_err());
        assert!(s.subsequence(2, 9).is_err());
        assert!(s.subsequence(5, 4).is_err());
    }
}
