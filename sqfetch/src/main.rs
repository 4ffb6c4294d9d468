use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sqfetch::index::stats;
use sqfetch::{compare, AlphabetKind, LineWidth, OpenOptions, RangeRequest, RecordLength, SeqFile, SeqFormat};

#[derive(Parser, Debug)]
#[command(name = "sqfetch", author, version, about = "Index and fetch records from sequence files", arg_required_else_help = true)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, env = "SQFETCH_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug, Clone)]
struct OpenArgs {
    /// Sequence file format (fasta, embl, genbank); detected when omitted
    #[arg(long)]
    format: Option<SeqFormat>,
    /// Read residues into digital codes
    #[arg(long)]
    digital: bool,
    /// Alphabet for digital mode (dna, rna, amino); guessed when omitted
    #[arg(long, requires = "digital")]
    alphabet: Option<AlphabetKind>,
}

impl OpenArgs {
    fn options(&self) -> OpenOptions {
        let mut opts = OpenOptions::new().digital(self.digital);
        if let Some(f) = self.format {
            opts = opts.format(f);
        }
        if let Some(a) = self.alphabet {
            opts = opts.alphabet(a);
        }
        opts
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build <seqfile>.sqi name/accession indexes
    Index {
        /// Sequence files
        #[arg(required = true)]
        seqfiles: Vec<PathBuf>,
        #[command(flatten)]
        open: OpenArgs,
    },
    /// Fetch records or subsequences by name or accession, as FASTA
    Fetch {
        /// Indexed sequence file
        seqfile: PathBuf,
        /// Names or accessions to fetch
        #[arg(required = true)]
        keys: Vec<String>,
        /// First residue (1-based); a start above end fetches the reverse complement
        #[arg(short = 's', long)]
        start: Option<u64>,
        /// Last residue (1-based); 0 means the end of the record
        #[arg(short = 'e', long, default_value_t = 0, requires = "start")]
        end: u64,
        /// Reverse complement a single-residue range
        #[arg(short = 'r', long)]
        revcomp: bool,
        /// Name for the fetched subsequence (single key only)
        #[arg(long)]
        rename: Option<String>,
        /// Residues per line; -1 writes each sequence on one line
        #[arg(short = 'w', long, default_value_t = 60, allow_negative_numbers = true)]
        width: i64,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[command(flatten)]
        open: OpenArgs,
    },
    /// Print sequence counts and residue totals from indexes
    Stats {
        #[arg(required = true)]
        seqfiles: Vec<PathBuf>,
        /// Worker threads (0 = all cores)
        #[arg(short = 't', long = "threads", default_value_t = 0)]
        threads: usize,
    },
    /// Print record lengths by name or accession
    Length {
        seqfile: PathBuf,
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Check whether two records have identical residues
    Compare {
        seqfile1: PathBuf,
        name1: String,
        seqfile2: PathBuf,
        name2: String,
        /// Compare against this range of the second record
        #[arg(long, requires = "end2")]
        start2: Option<u64>,
        #[arg(long, requires = "start2")]
        end2: Option<u64>,
        #[command(flatten)]
        open: OpenArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Index { seqfiles, open } => run_index(&seqfiles, &open.options()),
        Commands::Fetch { seqfile, keys, start, end, revcomp, rename, width, out, open } => {
            let width = LineWidth::from_raw(width)?;
            if rename.is_some() && keys.len() > 1 {
                anyhow::bail!("--rename only applies to a single key");
            }
            let range = start.map(|s| RangeRequest { start: s, end, force_revcomp: revcomp, rename });
            run_fetch(&seqfile, &keys, range.as_ref(), width, out.as_deref(), &open.options())
        }
        Commands::Stats { seqfiles, threads } => run_stats(&seqfiles, threads),
        Commands::Length { seqfile, keys } => run_length(&seqfile, &keys),
        Commands::Compare { seqfile1, name1, seqfile2, name2, start2, end2, open } => {
            let opts = open.options();
            let mut h1 = open_indexed(&seqfile1, &opts)?;
            let same = if seqfile1 == seqfile2 && start2.is_none() {
                compare::compare_within(&mut h1, &name1, &name2)?
            } else {
                let mut h2 = open_indexed(&seqfile2, &opts)?;
                match (start2, end2) {
                    (Some(s), Some(e)) => compare::compare_to_range(&mut h1, &name1, &mut h2, &name2, s, e)?,
                    _ => compare::compare(&mut h1, &name1, &mut h2, &name2)?,
                }
            };
            println!("{}", if same { "identical" } else { "different" });
            Ok(())
        }
    }
}

fn open_indexed(path: &Path, opts: &OpenOptions) -> Result<SeqFile> {
    let mut f = SeqFile::open(path, opts).with_context(|| format!("cannot open '{}'", path.display()))?;
    if !f.open_index()? {
        anyhow::bail!(
            "no index for '{}'; run `sqfetch index {}` first",
            path.display(),
            path.display()
        );
    }
    Ok(f)
}

fn run_index(seqfiles: &[PathBuf], opts: &OpenOptions) -> Result<()> {
    for path in seqfiles {
        let mut f = SeqFile::open(path, opts).with_context(|| format!("cannot open '{}'", path.display()))?;
        f.create_index()
            .with_context(|| format!("cannot index '{}'", path.display()))?;
        let idx = f.index().context("index was not attached after build")?;
        println!("sequence file: {}", path.display());
        println!("format:        {}", f.format());
        println!("sequences:     {}", idx.len());
        println!("accessions:    {}", idx.aliases().len());
        match stats::total_residues(idx) {
            Some(n) => println!("residues:      {}", n),
            None => println!("residues:      unknown"),
        }
        println!("index saved:   {}", f.index_path().display());
    }
    Ok(())
}

fn run_fetch(
    seqfile: &Path,
    keys: &[String],
    range: Option<&RangeRequest>,
    width: LineWidth,
    out: Option<&Path>,
    opts: &OpenOptions,
) -> Result<()> {
    let mut f = open_indexed(seqfile, opts)?;
    let mut w: Box<dyn Write> = match out {
        Some(p) => Box::new(BufWriter::new(
            std::fs::File::create(p).with_context(|| format!("cannot create '{}'", p.display()))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };
    for key in keys {
        let text = match range {
            Some(req) => f.fetch_subseq_fasta(key, req, width)?,
            None => f.fetch_fasta(key, width)?,
        };
        w.write_all(text.as_bytes())?;
    }
    w.flush()?;
    Ok(())
}

fn run_stats(seqfiles: &[PathBuf], threads: usize) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
    let rows: Vec<Result<(String, stats::Summary)>> = pool.install(|| {
        seqfiles
            .par_iter()
            .map(|path| {
                let f = open_indexed(path, &OpenOptions::new())?;
                let idx = f.index().context("index was not attached")?;
                Ok((path.display().to_string(), stats::summarize(idx)))
            })
            .collect()
    });

    println!("file\tsequences\taccessions\tresidues\tmin\tmax\tempty");
    for row in rows {
        let (name, s) = row?;
        let opt = |v: Option<u64>| v.map_or_else(|| "-".to_string(), |n| n.to_string());
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            name,
            s.sequences,
            s.aliases,
            opt(s.total_residues),
            opt(s.min_len),
            opt(s.max_len),
            s.empty_records
        );
    }
    Ok(())
}

fn run_length(seqfile: &Path, keys: &[String]) -> Result<()> {
    let f = open_indexed(seqfile, &OpenOptions::new())?;
    for key in keys {
        match f.length_by_name(key)? {
            Some(RecordLength::Residues(n)) => println!("{}\t{}", key, n),
            Some(RecordLength::Empty) => println!("{}\t0", key),
            Some(RecordLength::Unknown) => println!("{}\tunknown", key),
            None => println!("{}\tnot found", key),
        }
    }
    Ok(())
}
