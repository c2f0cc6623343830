//! CLI argument definitions for stockdelta.
//!
//! A single invocation prices a list of stocks between two dates and writes
//! the report to the terminal and to a versioned CSV file.
//!
//! # Input
//!
//! | Option | Description |
//! |--------|-------------|
//! | `--file` | CSV with dates in row 1 and `name,ticker,isin` rows from row 5 |
//! | `--stocks` | Comma-separated company names, needs `--start` and `--end` |
//!
//! # Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--output` | `.` | Directory for `stock_changes_output.csv` |
//! | `--horizon-days` | `10` | Days to walk forward looking for a session |
//! | `--concurrency` | `1` | Requests priced at once |
//! | `--log-level` | `warn` | Log filter when `RUST_LOG` is unset |
//!
//! # Examples
//!
//! ```bash
//! # Price the stocks listed in a file
//! stockdelta --file holdings.csv
//!
//! # Price companies by name
//! stockdelta --stocks "Microsoft, Vodafone" --start 01-Jan-25 --end 01-Mar-25
//!
//! # Write the report elsewhere and show provider calls
//! stockdelta --file holdings.csv --output reports --log-level debug
//! ```

use std::path::PathBuf;

use clap::Parser;
use stockdelta_core::DEFAULT_HORIZON_DAYS;

use crate::error::CliError;

/// stockdelta - percentage price change between two trading days
#[derive(Debug, Parser)]
#[command(
    name = "stockdelta",
    author,
    version,
    about = "Percentage price change for a list of stocks between two dates",
    long_about = "stockdelta resolves each stock to a ticker (explicit ticker, then ISIN via \
OpenFIGI, then name search), moves each date forward to the next trading session with \
a close, and reports the percentage change.\n\
\n\
Set OPENFIGI_API_KEY (or STOCKDELTA_OPENFIGI_API_KEY) for higher OpenFIGI rate limits."
)]
pub struct Cli {
    /// CSV input file.
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Comma-separated company names, e.g. "Microsoft, Apple Inc".
    #[arg(long, value_name = "NAMES")]
    pub stocks: Option<String>,

    /// Start date as dd-mmm-yy, used with --stocks.
    #[arg(long, value_name = "DATE")]
    pub start: Option<String>,

    /// End date as dd-mmm-yy, used with --stocks.
    #[arg(long, value_name = "DATE")]
    pub end: Option<String>,

    /// Directory the CSV report is written to.
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Calendar days to search forward from each date for a trading session.
    #[arg(long, default_value_t = DEFAULT_HORIZON_DAYS)]
    pub horizon_days: u32,

    /// Number of stocks priced concurrently.
    #[arg(long, default_value_t = 1)]
    pub concurrency: usize,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "warn", value_name = "FILTER")]
    pub log_level: String,
}

/// Where the stock list and dates come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    File(PathBuf),
    Stocks {
        names: String,
        start: String,
        end: String,
    },
}

impl Cli {
    /// Check the input flags together. With `--file`, `--start` and `--end` are ignored.
    pub fn input_source(&self) -> Result<InputSource, CliError> {
        match (&self.file, &self.stocks) {
            (None, None) => Err(CliError::Usage(String::from(
                "Missing required arguments. Provide --file or --stocks with --start and --end.",
            ))),
            (Some(_), Some(_)) => Err(CliError::Usage(String::from(
                "--file and --stocks are mutually exclusive. Use one or the other, not both.",
            ))),
            (Some(path), None) => Ok(InputSource::File(path.clone())),
            (None, Some(names)) => {
                let start = required_date(self.start.as_deref(), "--start")?;
                let end = required_date(self.end.as_deref(), "--end")?;
                Ok(InputSource::Stocks {
                    names: names.clone(),
                    start,
                    end,
                })
            }
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

fn required_date(value: Option<&str>, flag: &str) -> Result<String, CliError> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => Ok(value.to_owned()),
        None => Err(CliError::Usage(format!(
            "When using --stocks, {flag} date is required."
        ))),
    }
}
