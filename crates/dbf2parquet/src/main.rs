//! `dbf2parquet` command-line converter.
//!
//! Exit status: 0 on success, 2 for usage or configuration errors, and a
//! distinct non-zero status per failure category otherwise (see
//! [`ConvertError::exit_code`]).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use dbf_connector::{convert, ConvertConfig, ConvertError, DeletedPolicy, EncodingChoice};
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use tracing::{error, info};

/// Convert a dBASE table (.dbf or .dbc) to Parquet.
#[derive(Debug, Parser)]
#[command(name = "dbf2parquet", version, about)]
struct Args {
    /// Input table (.dbf, or .dbc extracted with dbc2dbf)
    #[arg(long, value_name = "PATH")]
    input: PathBuf,

    /// Output Parquet file
    #[arg(long, value_name = "PATH")]
    output: PathBuf,

    /// Source code page: 'auto' or a label such as cp1252, cp850, cp437,
    /// cp1250, cp1251, utf-8
    #[arg(long, value_name = "LABEL", default_value = "auto")]
    encoding: EncodingChoice,

    /// Fail on the first byte invalid in the source encoding
    #[arg(long)]
    encoding_strict: bool,

    /// Rows per batch and per row group
    #[arg(long, value_name = "N", default_value_t = dbf_connector::DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Skip (default) or keep soft-deleted records
    #[arg(long, value_name = "skip|keep", default_value = "skip")]
    deleted: DeletedPolicy,

    /// Parquet compression codec
    #[arg(long, value_enum, default_value_t = CompressionArg::Snappy)]
    compression: CompressionArg,

    /// dbc2dbf executable for .dbc inputs (default: ./dbc2dbf, then PATH)
    #[arg(long, value_name = "PATH")]
    dbc_tool: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CompressionArg {
    Snappy,
    Zstd,
    Gzip,
    Lz4,
    None,
}

impl From<CompressionArg> for Compression {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::Snappy => Compression::SNAPPY,
            CompressionArg::Zstd => Compression::ZSTD(ZstdLevel::default()),
            CompressionArg::Gzip => Compression::GZIP(GzipLevel::default()),
            CompressionArg::Lz4 => Compression::LZ4_RAW,
            CompressionArg::None => Compression::UNCOMPRESSED,
        }
    }
}

impl Args {
    fn config(&self) -> ConvertConfig {
        let config = ConvertConfig::default()
            .with_encoding(self.encoding.clone())
            .with_strict(self.encoding_strict)
            .with_batch_size(self.batch_size)
            .with_deleted(self.deleted)
            .with_compression(self.compression.into());
        match &self.dbc_tool {
            Some(tool) => config.with_dbc_tool(tool),
            None => config,
        }
    }
}

fn run(args: &Args) -> Result<(), ConvertError> {
    let summary = convert(&args.input, &args.output, &args.config())?;
    info!(
        rows = summary.rows_written,
        batches = summary.batches_written,
        skipped = summary.deleted_skipped,
        "wrote {}",
        args.output.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(input = %args.input.display(), "{e}");
            ExitCode::from(e.exit_code())
        }
    }
}
