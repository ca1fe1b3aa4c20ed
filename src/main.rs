use std::fs::File;
use std::io::{self, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use skypulse_report::config::{DEFAULT_BUCKETS, DEFAULT_MAX_READ_LEN, DEFAULT_MIN_CHUNK_LEN};
use skypulse_report::{generate, map_file, OutputFormat, Settings};
use tracing_subscriber::EnvFilter;

const ERR_DEFAULT: u8 = 1;
const ERR_FILE_OPEN: u8 = 3;
const ERR_STDERR: u8 = 4;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Per-station min/mean/max over a measurements file",
    long_about = None
)]
struct Cli {
    /// File of `station;temperature` lines
    file: PathBuf,

    /// Chunks parsed in parallel (default: twice the CPU count)
    #[arg(short, long, env = "SKYPULSE_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Largest single read, in bytes
    #[arg(long, env = "SKYPULSE_MAX_READ_LEN", default_value_t = DEFAULT_MAX_READ_LEN)]
    max_read_len: usize,

    /// Trees per station table
    #[arg(long, env = "SKYPULSE_BUCKETS", default_value_t = DEFAULT_BUCKETS)]
    buckets: usize,

    /// Smallest chunk worth a worker of its own, in bytes
    #[arg(long, env = "SKYPULSE_MIN_CHUNK_LEN", default_value_t = DEFAULT_MIN_CHUNK_LEN)]
    min_chunk_len: u64,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Read the input through a memory map instead of positional reads
    #[arg(long)]
    mmap: bool,
}

impl Cli {
    fn settings(&self) -> Settings {
        let concurrency = self.concurrency.unwrap_or_else(|| {
            std::thread::available_parallelism().map_or(1, NonZeroUsize::get) * 2
        });
        Settings::default()
            .with_concurrency(concurrency)
            .with_max_read_len(self.max_read_len)
            .with_buckets(self.buckets)
            .with_min_chunk_len(self.min_chunk_len)
    }
}

fn open(path: &Path) -> anyhow::Result<File> {
    File::open(path).with_context(|| format!("failed to open {}", path.display()))
}

/// An error and the exit code it maps to.
#[derive(Debug)]
struct Failure {
    err: anyhow::Error,
    code: u8,
}

impl Failure {
    fn with_code(code: u8) -> impl FnOnce(anyhow::Error) -> Self {
        move |err| Self { err, code }
    }
}

async fn run<W: Write + ?Sized>(cli: &Cli, out: &mut W) -> Result<(), Failure> {
    let file = open(&cli.file).map_err(Failure::with_code(ERR_FILE_OPEN))?;
    let settings = cli.settings();
    let result = if cli.mmap {
        let map = map_file(&file)
            .with_context(|| format!("failed to map {}", cli.file.display()))
            .map_err(Failure::with_code(ERR_FILE_OPEN))?;
        generate(&mut *out, Arc::new(map), &settings, cli.format).await
    } else {
        generate(&mut *out, Arc::new(file), &settings, cli.format).await
    };
    result
        .and_then(|()| writeln!(out).context("failed to write report"))
        .map_err(Failure::with_code(ERR_DEFAULT))
}

/// Prints `failure` and picks the process exit code.
fn exit_code<E: Write + ?Sized>(stderr: &mut E, failure: Failure) -> u8 {
    match writeln!(stderr, "{:#}", failure.err) {
        Ok(()) => failure.code,
        Err(_) => ERR_STDERR,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut out = io::stdout().lock();
    match run(&cli, &mut out).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => ExitCode::from(exit_code(&mut io::stderr(), failure)),
    }
}
