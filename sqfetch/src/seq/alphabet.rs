use std::fmt;
use std::str::FromStr;

/// 数字化字母表。
///
/// 编码为符号表中的下标：标准残基在前，随后是 gap、简并码、`*`（终止）和 `~`（缺失）。
/// DNA 与 RNA 的下标一一对应（T 与 U 同为 3），因此两者的数字序列可以直接比较。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlphabetKind {
    Rna,
    Dna,
    Amino,
}

const DNA_SYMBOLS: &[u8] = b"ACGT-RYMKSWHBVDN*~";
const RNA_SYMBOLS: &[u8] = b"ACGU-RYMKSWHBVDN*~";
const AMINO_SYMBOLS: &[u8] = b"ACDEFGHIKLMNPQRSTVWY-BJZOUX*~";

// complement by code for both nucleic alphabets: A<->T/U, C<->G, R<->Y, M<->K, H<->D, B<->V
const NUCLEIC_COMPLEMENT: [u8; 18] = [3, 2, 1, 0, 4, 6, 5, 8, 7, 9, 10, 14, 13, 12, 11, 15, 16, 17];

impl AlphabetKind {
    pub fn symbols(self) -> &'static [u8] {
        match self {
            AlphabetKind::Dna => DNA_SYMBOLS,
            AlphabetKind::Rna => RNA_SYMBOLS,
            AlphabetKind::Amino => AMINO_SYMBOLS,
        }
    }

    pub fn is_nucleic(self) -> bool {
        !matches!(self, AlphabetKind::Amino)
    }

    /// 单个字符的编码；`.` 与 `_` 视作 gap。
    #[inline]
    pub fn encode(self, b: u8) -> Option<u8> {
        let up = match b.to_ascii_uppercase() {
            b'.' | b'_' => b'-',
            other => other,
        };
        let up = match (self, up) {
            // U reads as T in DNA, T as U in RNA
            (AlphabetKind::Dna, b'U') => b'T',
            (AlphabetKind::Rna, b'T') => b'U',
            (_, c) => c,
        };
        self.symbols().iter().position(|&s| s == up).map(|i| i as u8)
    }

    #[inline]
    pub fn decode(self, code: u8) -> Option<u8> {
        self.symbols().get(code as usize).copied()
    }

    /// 编码整条序列；失败时返回第一个非法字符。
    pub fn digitize(self, text: &[u8]) -> Result<Vec<u8>, u8> {
        text.iter().map(|&b| self.encode(b).ok_or(b)).collect()
    }

    /// 解码整条序列；失败时返回第一个越界的编码。
    pub fn textize(self, codes: &[u8]) -> Result<Vec<u8>, u8> {
        codes.iter().map(|&c| self.decode(c).ok_or(c)).collect()
    }

    /// 数字序列的反向互补；蛋白质字母表返回 `None`。
    pub fn revcomp_codes(self, codes: &[u8]) -> Option<Vec<u8>> {
        if !self.is_nucleic() {
            return None;
        }
        codes
            .iter()
            .rev()
            .map(|&c| NUCLEIC_COMPLEMENT.get(c as usize).copied())
            .collect()
    }

    /// 从残基组成猜测字母表。
    ///
    /// 出现只属于蛋白质的字母即判为蛋白；否则 ACGTUN 占比不低于 90% 判为核酸
    /// （同时含 T 和 U 时无法判断），其余判为蛋白。没有残基时返回 `None`。
    pub fn guess(residues: &[u8]) -> Option<AlphabetKind> {
        let mut counts = [0usize; 26];
        let mut n = 0usize;
        for &b in residues {
            let up = b.to_ascii_uppercase();
            if up.is_ascii_uppercase() {
                counts[(up - b'A') as usize] += 1;
                n += 1;
            }
        }
        if n == 0 {
            return None;
        }
        let c = |ch: u8| counts[(ch - b'A') as usize];
        if b"EFIJLOPQZX".iter().any(|&ch| c(ch) > 0) {
            return Some(AlphabetKind::Amino);
        }
        let nucleic = c(b'A') + c(b'C') + c(b'G') + c(b'T') + c(b'U') + c(b'N');
        if nucleic * 10 < n * 9 {
            return Some(AlphabetKind::Amino);
        }
        match (c(b'T') > 0, c(b'U') > 0) {
            (true, true) => None,
            (false, true) => Some(AlphabetKind::Rna),
            _ => Some(AlphabetKind::Dna),
        }
    }
}

impl fmt::Display for AlphabetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AlphabetKind::Rna => "RNA",
            AlphabetKind::Dna => "DNA",
            AlphabetKind::Amino => "amino",
        })
    }
}

impl FromStr for AlphabetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rna" => Ok(AlphabetKind::Rna),
            "dna" => Ok(AlphabetKind::Dna),
            "amino" | "protein" => Ok(AlphabetKind::Amino),
            other => Err(format!("unknown alphabet '{}'", other)),
        }
    }
}

/// 文本残基的互补，保留大小写；非核酸字符返回 `None`。
#[inline]
pub fn complement(base: u8) -> Option<u8> {
    let c = match base.to_ascii_uppercase() {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' | b'U' => b'A',
        b'R' => b'Y',
        b'Y' => b'R',
        b'M' => b'K',
        b'K' => b'M',
        b'S' => b'S',
        b'W' => b'W',
        b'H' => b'D',
        b'D' => b'H',
        b'B' => b'V',
        b'V' => b'B',
        b'N' => b'N',
        b'-' | b'.' | b'*' | b'~' => return Some(base),
        _ => return None,
    };
    Some(if base.is_ascii_lowercase() { c.to_ascii_lowercase() } else { c })
}

/// 文本序列的反向互补；遇到非核酸字符返回 `None`。
pub fn revcomp(seq: &[u8]) -> Option<Vec<u8>> {
    seq.iter().rev().map(|&b| complement(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_revcomp_preserves_case() {
        assert_eq!(revcomp(b"AAAACCCC").unwrap(), b"GGGGTTTT");
        assert_eq!(revcomp(b"acgTN").unwrap(), b"NAcgt");
        assert_eq!(revcomp(b"RYmk").unwrap(), b"mkRY");
        assert!(revcomp(b"MEEP").is_none());
    }

    #[test]
    fn digitize_roundtrips_through_symbols() {
        let codes = AlphabetKind::Dna.digitize(b"acgtn-").unwrap();
        assert_eq!(codes, vec![0, 1, 2, 3, 15, 4]);
        assert_eq!(AlphabetKind::Dna.textize(&codes).unwrap(), b"ACGTN-");
        assert_eq!(AlphabetKind::Dna.digitize(b"AC1"), Err(b'1'));
        assert_eq!(AlphabetKind::Dna.textize(&[0, 99]), Err(99));
    }

    #[test]
    fn dna_and_rna_share_codes() {
        let d = AlphabetKind::Dna.digitize(b"ACGT").unwrap();
        let r = AlphabetKind::Rna.digitize(b"ACGU").unwrap();
        assert_eq!(d, r);
        assert_eq!(AlphabetKind::Rna.textize(&d).unwrap(), b"ACGU");
    }

    #[test]
    fn complement_table_is_an_involution() {
        for kind in [AlphabetKind::Dna, AlphabetKind::Rna] {
            let all: Vec<u8> = (0..kind.symbols().len() as u8).collect();
            let once = kind.revcomp_codes(&all).unwrap();
            let twice = kind.revcomp_codes(&once).unwrap();
            assert_eq!(twice, all);
        }
        let rc = AlphabetKind::Dna.revcomp_codes(&AlphabetKind::Dna.digitize(b"AACG").unwrap()).unwrap();
        assert_eq!(AlphabetKind::Dna.textize(&rc).unwrap(), b"CGTT");
        assert!(AlphabetKind::Amino.revcomp_codes(&[0]).is_none());
    }

    #[test]
    fn guess_alphabet() {
        assert_eq!(AlphabetKind::guess(b"ACGTACGTNN"), Some(AlphabetKind::Dna));
        assert_eq!(AlphabetKind::guess(b"acguacgu"), Some(AlphabetKind::Rna));
        assert_eq!(AlphabetKind::guess(b"MKVLAAGIVGLLLA"), Some(AlphabetKind::Amino));
        assert_eq!(AlphabetKind::guess(b"MADSHKRYW"), Some(AlphabetKind::Amino));
        assert_eq!(AlphabetKind::guess(b"ACGTU"), None);
        assert_eq!(AlphabetKind::guess(b"--**"), None);
    }
}
