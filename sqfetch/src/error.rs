use std::collections::TryReserveError;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// 库内所有可失败操作的错误类型。
///
/// 调用方按变体匹配，而不是比较状态码。
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("sequence file {} not found", .0.display())]
    FileNotFound(PathBuf),

    #[error("format of file {} unrecognized", .0.display())]
    FormatUnrecognized(PathBuf),

    #[error("parse failed (sequence file {}, byte {offset}): {msg}", .path.display())]
    Parse { path: PathBuf, offset: u64, msg: String },

    #[error("unexpected EOF reading sequence file {}", .0.display())]
    UnexpectedEof(PathBuf),

    #[error("couldn't determine alphabet of {}: {msg}", .path.display())]
    AlphabetUndetermined { path: PathBuf, msg: String },

    #[error("sequence file {} has no index information", .0.display())]
    IndexAbsent(PathBuf),

    #[error("index {} is in incorrect format: {msg}", .path.display())]
    IndexFormatInvalid { path: PathBuf, msg: String },

    #[error("seq {key} not found in index for file {}", .path.display())]
    KeyNotFound { key: String, path: PathBuf },

    #[error("cannot index {}: {msg}", .path.display())]
    DuplicateOrMissingName { path: PathBuf, msg: String },

    #[error("sequence file {} is digitized, but sequence file {} is not digitized",
        .digitized.display(), .text.display())]
    DigitizationModeMismatch { digitized: PathBuf, text: PathBuf },

    #[error("internal error: {0}")]
    InternalConsistency(String),

    #[error("out of memory while {0}")]
    OutOfMemory(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn parse(path: impl Into<PathBuf>, offset: u64, msg: impl Into<String>) -> Self {
        Error::Parse { path: path.into(), offset, msg: msg.into() }
    }

    pub(crate) fn key_not_found(key: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Error::KeyNotFound { key: key.into(), path: path.into() }
    }

    /// 仅当错误表示“查询对象不存在”时为 true。
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::KeyNotFound { .. } | Error::FileNotFound(_))
    }
}

/// 预留缓冲区，把分配失败转成 [`Error::OutOfMemory`]。
pub(crate) fn reserve<T>(buf: &mut Vec<T>, additional: usize, what: &str) -> Result<()> {
    buf.try_reserve_exact(additional)
        .map_err(|e: TryReserveError| Error::OutOfMemory(format!("{} ({})", what, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_message_names_both_files() {
        let e = Error::DigitizationModeMismatch {
            digitized: PathBuf::from("a.fa"),
            text: PathBuf::from("b.fa"),
        };
        assert_eq!(
            e.to_string(),
            "sequence file a.fa is digitized, but sequence file b.fa is not digitized"
        );
    }

    #[test]
    fn reserve_reports_out_of_memory() {
        let mut v: Vec<u8> = Vec::new();
        let err = reserve(&mut v, usize::MAX, "fetching seq1").unwrap_err();
        assert!(matches!(err, Error::OutOfMemory(_)));
        assert!(err.to_string().contains("fetching seq1"));
    }

    #[test]
    fn not_found_kinds() {
        assert!(Error::key_not_found("x", "f.fa").is_not_found());
        assert!(!Error::InvalidParameter("w".into()).is_not_found());
    }
}
