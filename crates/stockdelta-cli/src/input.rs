//! Stock list parsing for `--file` and `--stocks`.
//!
//! The input file layout is positional:
//!
//! ```text
//! row 1   Start Date,01-Jan-25,End Date,01-Mar-25
//! row 2-4 free text (usually blank lines and a column header)
//! row 5+  name,ticker,isin
//! ```

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use stockdelta_core::{parse_trading_date, StockRequest};
use time::Date;

use crate::error::CliError;

const MIN_ROWS: usize = 5;
const FIRST_STOCK_ROW: usize = 5;

/// Dates and requests for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInput {
    pub start: Date,
    pub end: Date,
    pub requests: Vec<StockRequest>,
}

pub fn from_file(path: &Path) -> Result<ParsedInput, CliError> {
    let file = File::open(path).map_err(|error| match error.kind() {
        io::ErrorKind::NotFound => CliError::Input(format!("File not found: {}", path.display())),
        _ => CliError::Io(error),
    })?;
    tracing::debug!(path = %path.display(), "reading stock list");
    parse_csv(file)
}

/// Parse the positional CSV layout. Rows are physical lines, so blank lines
/// count towards the row positions. LF and CRLF endings are both accepted.
pub fn parse_csv<R: Read>(mut source: R) -> Result<ParsedInput, CliError> {
    let mut text = String::new();
    source
        .read_to_string(&mut text)
        .map_err(|error| CliError::Input(format!("Failed to read CSV input: {error}")))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let rows = text
        .lines()
        .map(parse_row)
        .collect::<Result<Vec<StringRecord>, CliError>>()?;
    if rows.len() < MIN_ROWS {
        return Err(CliError::Input(String::from(
            "Invalid CSV structure. Missing required rows including date row.",
        )));
    }

    let date_row = rows
        .first()
        .filter(|record| record.len() >= 4)
        .ok_or_else(|| CliError::Input(String::from("Missing Start Date or End Date in row 1.")))?;
    let (start, end) = parse_date_row(date_row)?;

    let requests: Vec<StockRequest> = rows
        .iter()
        .skip(FIRST_STOCK_ROW - 1)
        .filter_map(stock_row)
        .collect();
    if requests.is_empty() {
        return Err(CliError::Input(String::from(
            "No stocks found in file. Stock list is empty.",
        )));
    }

    Ok(ParsedInput {
        start,
        end,
        requests,
    })
}

/// One physical line as a record. Blank lines are empty records.
fn parse_row(line: &str) -> Result<StringRecord, CliError> {
    if line.trim().is_empty() {
        return Ok(StringRecord::new());
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(line.as_bytes());
    match reader.records().next() {
        Some(record) => {
            record.map_err(|error| CliError::Input(format!("Failed to read CSV input: {error}")))
        }
        None => Ok(StringRecord::new()),
    }
}

/// Build input from `--stocks` and the two date flags.
pub fn from_stocks(names: &str, start: &str, end: &str) -> Result<ParsedInput, CliError> {
    let start = parse_trading_date(start).map_err(|_| {
        CliError::Usage(format!(
            "Invalid date format for --start. Expected dd-mmm-yy (e.g., 01-Jan-25), got: {start}"
        ))
    })?;
    let end = parse_trading_date(end).map_err(|_| {
        CliError::Usage(format!(
            "Invalid date format for --end. Expected dd-mmm-yy (e.g., 01-Jan-25), got: {end}"
        ))
    })?;

    let requests: Vec<StockRequest> = names
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(StockRequest::named)
        .collect();
    if requests.is_empty() {
        return Err(CliError::Usage(String::from(
            "No stock names given to --stocks. Stock list is empty.",
        )));
    }

    Ok(ParsedInput {
        start,
        end,
        requests,
    })
}

fn parse_date_row(record: &StringRecord) -> Result<(Date, Date), CliError> {
    let cell = |index: usize| record.get(index).unwrap_or_default();

    if !cell(0).eq_ignore_ascii_case("start date") || !cell(2).eq_ignore_ascii_case("end date") {
        return Err(CliError::Input(String::from(
            "Missing Start Date or End Date labels in row 1.",
        )));
    }

    let start = parse_trading_date(cell(1)).map_err(|_| {
        CliError::Input(format!(
            "Invalid date format for Start Date. Expected dd-mmm-yy (e.g., 01-Jan-25), got: {}",
            cell(1)
        ))
    })?;
    let end = parse_trading_date(cell(3)).map_err(|_| {
        CliError::Input(format!(
            "Invalid date format for End Date. Expected dd-mmm-yy (e.g., 01-Jan-25), got: {}",
            cell(3)
        ))
    })?;
    Ok((start, end))
}

/// `None` for rows without a name.
fn stock_row(record: &StringRecord) -> Option<StockRequest> {
    let name = record.get(0).filter(|name| !name.is_empty())?;
    Some(StockRequest::new(name, record.get(1), record.get(2)))
}
