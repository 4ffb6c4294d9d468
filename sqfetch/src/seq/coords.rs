/// 链方向。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
}

/// 规范化后的升序区间（1-based 闭区间，`end == 0` 表示到序列末尾）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coords {
    pub start: u64,
    pub end: u64,
    pub strand: Strand,
}

/// 把调用方给出的坐标解释为升序区间和链方向。
///
/// 判定顺序固定：
/// 1. `end != 0 && start > end`：反向，区间交换为 `[end, start]`；
/// 2. `start == end && force_revcomp`：单个残基的反向（仅凭坐标无法区分）；
/// 3. 其余为正向。
pub fn normalize(given_start: u64, given_end: u64, force_revcomp: bool) -> Coords {
    if given_end != 0 && given_start > given_end {
        Coords { start: given_end, end: given_start, strand: Strand::Reverse }
    } else if given_start == given_end && force_revcomp {
        Coords { start: given_start, end: given_end, strand: Strand::Reverse }
    } else {
        Coords { start: given_start, end: given_end, strand: Strand::Forward }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descending_coords_mean_reverse() {
        let c = normalize(10, 3, false);
        assert_eq!(c, Coords { start: 3, end: 10, strand: Strand::Reverse });
        // the flag does not change an explicit reversal
        assert_eq!(normalize(10, 3, true), c);
    }

    #[test]
    fn single_residue_needs_the_flag() {
        assert_eq!(normalize(5, 5, true).strand, Strand::Reverse);
        assert_eq!(normalize(5, 5, false).strand, Strand::Forward);
        assert_eq!((normalize(5, 5, true).start, normalize(5, 5, true).end), (5, 5));
    }

    #[test]
    fn zero_end_runs_to_the_end_forward() {
        assert_eq!(normalize(7, 0, false), Coords { start: 7, end: 0, strand: Strand::Forward });
        assert_eq!(normalize(7, 0, true).strand, Strand::Forward);
        assert_eq!(normalize(1, 8, true).strand, Strand::Forward);
    }
}
