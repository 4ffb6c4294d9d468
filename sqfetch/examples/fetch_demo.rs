//! 演示如何在 library 模式下使用 sqfetch 建索引并随机读取序列。
//!
//! 运行方式：
//! ```bash
//! cargo run --example fetch_demo
//! ```

use sqfetch::{compare, LineWidth, OpenOptions, RangeRequest, RecordLength, SeqFile};

fn main() -> sqfetch::Result<()> {
    // 1. 准备一个小的 FASTA 文件
    let dir = std::env::temp_dir().join(format!("sqfetch-demo-{}", std::process::id()));
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("demo.fa");
    std::fs::write(
        &path,
        ">chr1 demo chromosome\nACGTACGTAG\nCTGATCGTAG\nCTAG\n>chr2\nGGGGCCCCAA\nTT\n>empty\n",
    )?;

    // 2. 打开并建立索引（已有索引时直接加载）
    let mut f = SeqFile::open(&path, &OpenOptions::new())?;
    if !f.open_index()? {
        f.create_index()?;
    }
    println!("索引文件: {}", f.index_path().display());
    println!("序列数: {}", f.sequence_count()?);
    match f.total_residues()? {
        Some(n) => println!("残基总数: {}", n),
        None => println!("残基总数: 未知"),
    }

    // 3. 按名称取整条记录
    print!("\n{}", f.fetch_fasta("chr1", LineWidth::Wrap(10))?);

    // 4. 子区间；start > end 取反向互补
    let fwd = RangeRequest::new(5, 14);
    let rev = RangeRequest::new(14, 5);
    print!("{}", f.fetch_subseq_fasta("chr1", &fwd, LineWidth::Unwrapped)?);
    print!("{}", f.fetch_subseq_fasta("chr1", &rev, LineWidth::Unwrapped)?);

    // 5. 长度查询：不存在不是错误
    for key in ["chr2", "empty", "chrX"] {
        match f.length_by_name(key)? {
            Some(RecordLength::Residues(n)) => println!("{}: {} 个残基", key, n),
            Some(RecordLength::Empty) => println!("{}: 空记录", key),
            Some(RecordLength::Unknown) => println!("{}: 长度未记录", key),
            None => println!("{}: 不存在", key),
        }
    }

    // 6. 同一文件内比较
    println!("\nchr1 == chr1: {}", compare::compare_within(&mut f, "chr1", "chr1")?);
    println!("chr1 == chr2: {}", compare::compare_within(&mut f, "chr1", "chr2")?);

    f.close();
    std::fs::remove_dir_all(&dir)?;
    Ok(())
}
