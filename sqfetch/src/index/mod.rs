//! 名称 / 登录号索引：构建、持久化、查找与统计。
//!
//! - [`table`] — 索引结构与磁盘格式（bincode）
//! - [`build`] — 单次扫描构建索引
//! - [`stats`] — 仅依赖索引的汇总统计

pub mod build;
pub mod stats;
pub mod table;

pub use build::{build_index, IndexBuilder};
pub use table::{index_path_for, Alias, FileEntry, Index, IndexMeta, Layout, Location, RecordLength};
