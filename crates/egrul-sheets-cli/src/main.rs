//! egrul-fill - fill a registry spreadsheet with company heads from EGRUL

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use egrul_sheets::prelude::*;
use egrul_sheets::{output_path_for, DEFAULT_BASE_URL, DEFAULT_FIO_COLUMN};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Spreadsheet shipped next to the binary in the container image
const DEFAULT_INPUT: &str = "Список рассылки свод.xlsx";

#[derive(Parser)]
#[command(name = "egrul-fill")]
#[command(
    author,
    version,
    about = "Look up company heads by INN in EGRUL and write them to a spreadsheet",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    fill: FillArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill the FIO column of a registry (default command)
    Fill(FillArgs),

    /// Show the sheets and column names of a spreadsheet
    Info {
        /// Input spreadsheet file
        input: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
struct FillArgs {
    /// Input registry (xlsx)
    #[arg(env = "EGRUL_INPUT", default_value = DEFAULT_INPUT)]
    input: PathBuf,

    /// Output file (default: input name with `_с_ФИО` before `.xlsx`)
    #[arg(short, long, env = "EGRUL_OUTPUT")]
    output: Option<PathBuf>,

    /// 1-based position of the INN column
    #[arg(long, env = "EGRUL_INN_COLUMN", default_value_t = 5)]
    inn_column: usize,

    /// Header of the column receiving the names
    #[arg(long, env = "EGRUL_FIO_COLUMN", default_value = DEFAULT_FIO_COLUMN)]
    fio_column: String,

    /// Sheet index to process (0-based)
    #[arg(short, long, env = "EGRUL_SHEET", default_value_t = 0)]
    sheet: usize,

    /// Pause after every looked-up row, in milliseconds
    #[arg(long, env = "EGRUL_ROW_DELAY_MS", default_value_t = 500)]
    row_delay_ms: u64,

    /// Pause between the two register requests, in milliseconds
    #[arg(long, env = "EGRUL_TOKEN_DELAY_MS", default_value_t = 1000)]
    token_delay_ms: u64,

    /// Per-request timeout, in seconds
    #[arg(long, env = "EGRUL_TIMEOUT_SECS", default_value_t = 15)]
    timeout_secs: u64,

    /// Register address
    #[arg(long, env = "EGRUL_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Process at most this many rows
    #[arg(long, env = "EGRUL_LIMIT")]
    limit: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Fill(args)) => fill(args).await,
        Some(Commands::Info { input }) => show_info(&input),
        None => fill(cli.fill).await,
    }
}

async fn fill(args: FillArgs) -> Result<()> {
    let config = EgrulConfig::new(&args.base_url)
        .with_timeout(Duration::from_secs(args.timeout_secs))
        .with_token_delay(Duration::from_millis(args.token_delay_ms));
    let client = EgrulClient::new(config).context("Failed to build HTTP client")?;

    let options = EnrichOptions {
        inn_column: args.inn_column,
        fio_column: args.fio_column,
        row_delay: Duration::from_millis(args.row_delay_ms),
        sheet: args.sheet,
        limit: args.limit,
    };

    let output = args
        .output
        .unwrap_or_else(|| output_path_for(&args.input));

    let report = Enricher::new(client, options)
        .enrich_file(&args.input, &output)
        .await
        .with_context(|| format!("Failed to process '{}'", args.input.display()))?;

    tracing::info!(
        "Wrote {} of {} names to '{}'",
        report.filled,
        report.rows,
        output.display()
    );
    Ok(())
}

fn show_info(input: &Path) -> Result<()> {
    let workbook =
        Workbook::open(input).with_context(|| format!("Failed to open '{}'", input.display()))?;

    let stdout = io::stdout();
    write_info(&mut stdout.lock(), input, &workbook).context("Failed to write sheet listing")
}

fn write_info(out: &mut impl Write, input: &Path, workbook: &Workbook) -> io::Result<()> {
    writeln!(out, "File: {}", input.display())?;
    writeln!(out, "Sheets: {}", workbook.sheet_count())?;

    for (i, sheet) in workbook.worksheets().enumerate() {
        let table = SheetTable::from_worksheet(sheet);

        writeln!(out)?;
        writeln!(out, "  Sheet {}: \"{}\"", i, sheet.name())?;
        writeln!(
            out,
            "    Rows: {}, columns: {}",
            table.row_count(),
            table.columns().len()
        )?;
        for (col, name) in table.columns().iter().enumerate() {
            writeln!(out, "    {}. {}", col + 1, name)?;
        }
    }

    Ok(())
}
