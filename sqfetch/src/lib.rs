//! # sqfetch
//!
//! 平面序列文件（FASTA、EMBL/UniProt、GenBank/DDBJ）的名称 / 登录号索引与随机读取。
//!
//! 建一次索引后，可以按名称、登录号或序号直接定位记录，无需重新扫描文件：
//!
//! - **索引构建**：单次扫描记录主键、登录号、字节偏移和长度，原子写入 `<seqfile>.sqi`
//! - **取序列**：整条记录，或任意子区间（`start > end` 取反向互补）；
//!   行宽一致的文件按偏移直接读取所需字节
//! - **比较**：跨文件判断两条记录残基是否相同
//! - **统计**：仅凭索引给出序列数与残基总数
//!
//! ## 快速示例
//!
//! ```rust,no_run
//! use sqfetch::{LineWidth, OpenOptions, RangeRequest, SeqFile};
//!
//! let mut f = SeqFile::open("genome.fa", &OpenOptions::new())?;
//! if !f.open_index()? {
//!     f.create_index()?;
//! }
//!
//! // 整条记录
//! print!("{}", f.fetch_fasta("chr1", LineWidth::default())?);
//!
//! // chr1 的 200..101 反向互补，命名为 chr1/200-101
//! let rc = f.fetch_subsequence("chr1", &RangeRequest::new(200, 101))?;
//! assert_eq!(rc.len(), 100);
//! # Ok::<(), sqfetch::Error>(())
//! ```
//!
//! ## 模块说明
//!
//! - [`io`] — 记录解析（带字节偏移）与格式识别
//! - [`index`] — 索引结构、构建、持久化与统计
//! - [`seq`] — 序列值、字母表、坐标规范化与 FASTA 输出
//! - [`sqfile`] — 打开的文件句柄与全部读取操作
//! - [`compare`] — 序列同一性比较
//! - [`error`] — 错误类型

pub mod compare;
pub mod error;
pub mod index;
pub mod io;
pub mod seq;
pub mod sqfile;

pub use error::{Error, Result};
pub use index::{Index, Location, RecordLength};
pub use io::SeqFormat;
pub use seq::alphabet::AlphabetKind;
pub use seq::coords::{normalize, Coords, Strand};
pub use seq::format::{to_fasta, LineWidth};
pub use seq::{Residues, Sequence};
pub use sqfile::{Mode, OpenOptions, RangeRequest, SeqFile};
