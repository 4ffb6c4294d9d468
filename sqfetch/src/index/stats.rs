use super::table::{Index, Layout, RecordLength};

/// 主键条目数量。
pub fn sequence_count(index: &Index) -> usize {
    index.len()
}

/// 所有记录的残基总数（含零长度记录）；任一文件未记录长度时返回 `None`。
pub fn total_residues(index: &Index) -> Option<u64> {
    (0..index.len())
        .filter_map(|i| index.find_by_ordinal(i))
        .map(|loc| index.record_length(loc).residues())
        .sum()
}

/// 仅由索引得出的统计摘要。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub sequences: usize,
    pub aliases: usize,
    pub total_residues: Option<u64>,
    pub empty_records: usize,
    pub min_len: Option<u64>,
    pub max_len: Option<u64>,
    pub layout: Option<Layout>,
}

pub fn summarize(index: &Index) -> Summary {
    let lengths: Vec<RecordLength> = (0..index.len())
        .filter_map(|i| index.find_by_ordinal(i))
        .map(|loc| index.record_length(loc))
        .collect();
    let known = || lengths.iter().filter_map(|l| l.residues());
    Summary {
        sequences: sequence_count(index),
        aliases: index.aliases().len(),
        total_residues: total_residues(index),
        empty_records: lengths.iter().filter(|l| **l == RecordLength::Empty).count(),
        min_len: known().min(),
        max_len: known().max(),
        layout: match index.files() {
            [only] => only.layout,
            _ => None,
        },
    }
}
