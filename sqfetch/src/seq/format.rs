use super::Sequence;
use crate::error::{reserve, Error, Result};

/// FASTA 输出的行宽。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineWidth {
    /// 残基全部写在一行。
    Unwrapped,
    /// 每行最多 n 个残基（n > 0）。
    Wrap(usize),
}

impl LineWidth {
    /// 从宿主约定的整数解析：`-1` 不换行，正数为行宽，其余为非法参数。
    pub fn from_raw(width: i64) -> Result<Self> {
        match width {
            -1 => Ok(LineWidth::Unwrapped),
            w if w > 0 => Ok(LineWidth::Wrap(w as usize)),
            w => Err(Error::InvalidParameter(format!("invalid value for line width: {}", w))),
        }
    }

    /// `Wrap(0)` 无法分行，视为非法参数。
    pub fn check(self) -> Result<Self> {
        match self {
            LineWidth::Wrap(0) => Err(Error::InvalidParameter("invalid value for line width: 0".to_string())),
            w => Ok(w),
        }
    }
}

impl Default for LineWidth {
    fn default() -> Self {
        LineWidth::Wrap(60)
    }
}

/// 把序列渲染为 FASTA 文本。数字序列先文本化。
pub fn to_fasta(seq: &Sequence, width: LineWidth) -> Result<String> {
    let width = width.check()?;
    let textized;
    let text: &[u8] = match seq.text() {
        Some(t) => t,
        None => {
            textized = seq.textize()?;
            textized.text().unwrap_or_default()
        }
    };

    let n = text.len();
    let n_lines = match width {
        LineWidth::Unwrapped => 1,
        LineWidth::Wrap(w) => n.div_ceil(w),
    };
    let header_len = 2 + seq.name.len() + seq.acc.len() + seq.desc.len() + 2;
    let mut out: Vec<u8> = Vec::new();
    reserve(&mut out, header_len + n + n_lines, &format!("formatting sequence {}", seq.name))?;

    out.push(b'>');
    out.extend_from_slice(seq.name.as_bytes());
    if !seq.acc.is_empty() {
        out.push(b' ');
        out.extend_from_slice(seq.acc.as_bytes());
    }
    if !seq.desc.is_empty() {
        out.push(b' ');
        out.extend_from_slice(seq.desc.as_bytes());
    }
    out.push(b'\n');

    match width {
        LineWidth::Unwrapped => {
            out.extend_from_slice(text);
            out.push(b'\n');
        }
        LineWidth::Wrap(w) => {
            for chunk in text.chunks(w) {
                out.extend_from_slice(chunk);
                out.push(b'\n');
            }
        }
    }

    String::from_utf8(out).map_err(|e| {
        Error::InternalConsistency(format!("sequence {} is not valid UTF-8 text: {}", seq.name, e))
    })
}
