use anyhow::{Context as AnyhowContext, Result};
use clap::Parser;
use codesplit_chunker::{
    check_embeddable, Chunk, Chunker, ChunkingStats, Emitter, FallbackMode, Language, SkipReason,
    SkipStats, SourceUnit,
};
use collect::{collect_files, PathFilters};
use config::{load_policy, PolicyOverrides};
use flags::{FallbackFlag, FormatFlag, OverflowFlag, PresetFlag, UnitFlag};
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

mod collect;
mod config;
mod flags;
mod report;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout.write_all(text.as_bytes()).and_then(|_| stdout.flush()) {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser, Debug)]
#[command(name = "codesplit")]
#[command(about = "Split source files into structure-aware chunks", long_about = None)]
#[command(version)]
struct Cli {
    /// Files or directories to chunk
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Chunk policy file (TOML)
    #[arg(long, conflicts_with = "preset")]
    config: Option<PathBuf>,

    /// Built-in policy to start from
    #[arg(long, value_enum)]
    preset: Option<PresetFlag>,

    /// Maximum core size of a chunk
    #[arg(long)]
    max_size: Option<usize>,

    /// Chunks below this size are merged into a neighbour
    #[arg(long)]
    min_size: Option<usize>,

    /// Unit for --max-size and --min-size
    #[arg(long, value_enum)]
    unit: Option<UnitFlag>,

    /// Enclosing-scope header lines to attach as context
    #[arg(long)]
    context_lines: Option<usize>,

    /// Handling of functions/classes larger than --max-size
    #[arg(long, value_enum)]
    overflow: Option<OverflowFlag>,

    /// Extractor for languages without a grammar
    #[arg(long, value_enum)]
    fallback: Option<FallbackFlag>,

    /// Language identifier for every input, instead of detecting it from the extension
    #[arg(long)]
    language: Option<String>,

    /// Output framing
    #[arg(long, value_enum, default_value_t = FormatFlag::Json)]
    format: FormatFlag,

    /// Worker threads (default: one per core)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Files larger than this many bytes are skipped
    #[arg(long, default_value_t = 1_000_000)]
    max_file_size: u64,

    /// Chunk files the embeddability filter would skip (still requires UTF-8)
    #[arg(long)]
    include_unembeddable: bool,

    /// Extra glob pattern to exclude from directory walks (repeatable)
    #[arg(long = "exclude", value_name = "GLOB")]
    excludes: Vec<String>,

    /// Only walk files matching this glob (repeatable)
    #[arg(long = "include", value_name = "GLOB")]
    includes: Vec<String>,

    /// Do not apply the built-in exclusion patterns
    #[arg(long)]
    no_default_excludes: bool,

    /// Print a summary to stderr
    #[arg(long)]
    stats: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn overrides(&self) -> PolicyOverrides {
        PolicyOverrides {
            max_size: self.max_size,
            min_size: self.min_size,
            unit: self.unit.map(UnitFlag::as_domain),
            context_lines: self.context_lines,
            overflow: self.overflow.map(OverflowFlag::as_domain),
            fallback: self.fallback.map(FallbackFlag::as_domain),
        }
    }
}

/// What happened to one input file
enum FileOutcome {
    Chunked(Vec<Chunk>),
    Skipped(SkipReason, usize),
}

pub fn main_entry() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
    let base = match &cli.config {
        Some(path) => load_policy(path)?,
        None => cli.preset.unwrap_or_default().as_domain(),
    };
    let policy = cli.overrides().apply(base);
    let chunker = Chunker::new(policy).context("Invalid chunk policy")?;

    if let Some(jobs) = cli.jobs.filter(|&n| n > 0) {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .ok(); // Ignore error if pool already built
    }

    let filters = PathFilters::new(!cli.no_default_excludes, &cli.excludes, &cli.includes)?;
    let mut skipped = SkipStats::default();
    let accept = |path: &Path| {
        chunker.policy().fallback != FallbackMode::None
            || cli.language.is_some()
            || chunker.registry().supports(Language::from_path(path))
    };
    let files = collect_files(&cli.paths, &filters, accept, &mut skipped)?;
    log::debug!("Chunking {} files", files.len());

    let outcomes = files
        .par_iter()
        .map(|path| chunk_one(cli, &chunker, path))
        .collect::<Result<Vec<_>>>()?;

    let mut chunks = Vec::new();
    let mut chunked_files = 0;
    for outcome in outcomes {
        match outcome {
            FileOutcome::Chunked(file_chunks) => {
                chunked_files += 1;
                chunks.extend(file_chunks);
            }
            FileOutcome::Skipped(reason, bytes) => skipped.add(reason, bytes),
        }
    }

    let emitter = Emitter::new(cli.format.as_domain());
    print_stdout(&emitter.render(&chunks)?)?;

    if cli.stats {
        let stats: ChunkingStats = Chunker::stats(&chunks);
        eprintln!("{}", report::render_summary(chunked_files, &stats, &skipped));
    }
    Ok(())
}

fn chunk_one(cli: &Cli, chunker: &Chunker, path: &Path) -> Result<FileOutcome> {
    let size = fs::metadata(path)
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .len();
    let byte_count = usize::try_from(size).unwrap_or(usize::MAX);
    if size > cli.max_file_size {
        log::info!("Skipping {} (large: {size} bytes)", path.display());
        return Ok(FileOutcome::Skipped(SkipReason::Large, byte_count));
    }

    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let text = if cli.include_unembeddable {
        std::str::from_utf8(&bytes).map_err(|_| SkipReason::Binary)
    } else {
        check_embeddable(&bytes)
    };
    let text = match text {
        Ok(text) => text,
        Err(reason) => {
            log::info!("Skipping {} ({reason})", path.display());
            return Ok(FileOutcome::Skipped(reason, byte_count));
        }
    };

    let display = path.to_string_lossy();
    let unit = match &cli.language {
        Some(language) => SourceUnit::new(display, language.as_str(), text),
        None => SourceUnit::from_path(path, text),
    };
    let chunks = chunker
        .chunk(&unit)
        .with_context(|| format!("Failed to chunk {}", path.display()))?;
    Ok(FileOutcome::Chunked(chunks))
}
