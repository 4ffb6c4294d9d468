use std::io::{self, BufRead, Read, Seek, SeekFrom};

/// 带字节偏移的行读取器。
///
/// 每读一行都记录该行在文件中的起始偏移；`unread` 让下一次 `read_line`
/// 返回同一行（用于在下一条记录的头部停下）。
pub struct LineReader<R> {
    inner: R,
    offset: u64,
    line_start: u64,
    buf: Vec<u8>,
    replay: bool,
}

impl<R: BufRead + Seek> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, offset: 0, line_start: 0, buf: Vec::new(), replay: false }
    }

    /// 下一次读取将开始的偏移。
    pub fn offset(&self) -> u64 {
        if self.replay {
            self.line_start
        } else {
            self.offset
        }
    }

    pub fn seek_to(&mut self, offset: u64) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(offset))?;
        self.offset = offset;
        self.line_start = offset;
        self.replay = false;
        self.buf.clear();
        Ok(())
    }

    /// 把下一行（含行尾）读入内部缓冲区；到达文件末尾返回 `false`。
    pub fn read_line(&mut self) -> io::Result<bool> {
        if self.replay {
            self.replay = false;
            return Ok(true);
        }
        self.buf.clear();
        self.line_start = self.offset;
        let n = self.inner.read_until(b'\n', &mut self.buf)?;
        self.offset += n as u64;
        Ok(n > 0)
    }

    pub fn unread(&mut self) {
        self.replay = true;
    }

    /// 当前行（含行尾）。
    pub fn line(&self) -> &[u8] {
        &self.buf
    }

    pub fn line_start(&self) -> u64 {
        self.line_start
    }

    /// 从 `offset` 处读取恰好 `buf.len()` 个字节，读后游标位于区间末尾。
    pub fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        self.seek_to(offset)?;
        self.inner.read_exact(buf)?;
        self.offset = offset + buf.len() as u64;
        Ok(())
    }
}

/// 行尾字节数（`\n` 为 1，`\r\n` 为 2，文件末尾无换行为 0）。
pub fn eol_len(line: &[u8]) -> usize {
    match line {
        [.., b'\r', b'\n'] => 2,
        [.., b'\n'] => 1,
        _ => 0,
    }
}

/// 去掉行尾的内容。
pub fn content(line: &[u8]) -> &[u8] {
    &line[..line.len() - eol_len(line)]
}

pub fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}
