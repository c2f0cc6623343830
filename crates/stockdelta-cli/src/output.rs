//! Report rendering for the terminal and the CSV file.
//!
//! Both renderings share the same row layout:
//!
//! | Result | Row |
//! |--------|-----|
//! | Success | `name,ticker,isin,start,end,percentage,currency` |
//! | NotFound | `name,ticker,isin,Stock details not found,,,` |
//! | Delisted | `name,ticker,isin,Delisted,,,` |
//! | Error | `name,ticker,isin,<message>,,,` |
//!
//! Non-success rows echo the ticker and ISIN the user supplied.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use csv::{Terminator, WriterBuilder};
use rust_decimal::{Decimal, RoundingStrategy};
use stockdelta_core::{format_trading_date, LookupReport, LookupResult, StockRequest};

use crate::error::CliError;

pub const OUTPUT_FILE_STEM: &str = "stock_changes_output";
pub const COLUMNS: [&str; 7] = [
    "Stock Name",
    "Ticker",
    "ISIN",
    "Start Price",
    "End Price",
    "Percentage",
    "Currency",
];

const NOT_FOUND_TEXT: &str = "Stock details not found";
const DELISTED_TEXT: &str = "Delisted";
const LINE_END: &[u8] = b"\r\n";

/// One report row. `request` is the input the result was produced from.
pub fn result_row(result: &LookupResult, request: &StockRequest) -> [String; 7] {
    let requested_ticker = request.ticker.clone().unwrap_or_default();
    let requested_isin = request.isin.clone().unwrap_or_default();

    match result {
        LookupResult::Success {
            name,
            ticker,
            isin,
            currency,
            start,
            end,
            percentage,
        } => [
            name.clone(),
            ticker.to_string(),
            isin.as_ref()
                .map_or(requested_isin, |isin| isin.as_str().to_owned()),
            format_price(start.price),
            format_price(end.price),
            format_percentage(*percentage),
            currency.clone(),
        ],
        LookupResult::NotFound { name } => {
            failure_row(name, requested_ticker, requested_isin, NOT_FOUND_TEXT)
        }
        LookupResult::Delisted { name, ticker } => {
            failure_row(name, ticker.to_string(), requested_isin, DELISTED_TEXT)
        }
        LookupResult::Error { name, message } => {
            failure_row(name, requested_ticker, requested_isin, message)
        }
    }
}

fn failure_row(name: &str, ticker: String, isin: String, text: &str) -> [String; 7] {
    [
        name.to_owned(),
        ticker,
        isin,
        text.to_owned(),
        String::new(),
        String::new(),
        String::new(),
    ]
}

fn format_price(price: Decimal) -> String {
    let rounded = price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}")
}

fn format_percentage(percentage: Decimal) -> String {
    let rounded = percentage.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.1}")
}

fn rows<'a>(
    report: &'a LookupReport,
    requests: &'a [StockRequest],
) -> impl Iterator<Item = [String; 7]> + 'a {
    report
        .results
        .iter()
        .zip(requests)
        .map(|(result, request)| result_row(result, request))
}

/// Print the report header, notes and rows.
pub fn render_terminal<W: Write>(
    out: &mut W,
    report: &LookupReport,
    requests: &[StockRequest],
) -> io::Result<()> {
    writeln!(
        out,
        "Start Date: {}, End Date: {}",
        format_trading_date(report.start),
        format_trading_date(report.end)
    )?;
    writeln!(out)?;

    let notes = report.notes();
    for note in &notes {
        writeln!(out, "Note: {note}")?;
    }
    if !notes.is_empty() {
        writeln!(out)?;
    }

    writeln!(out, "{}", COLUMNS.join(","))?;
    for row in rows(report, requests) {
        writeln!(out, "{}", row.join(","))?;
    }
    Ok(())
}

/// Write the report as CSV to `path`, replacing any existing file.
///
/// Separator rows are bare line ends, not quoted empty cells.
pub fn write_csv(path: &Path, report: &LookupReport, requests: &[StockRequest]) -> Result<(), CliError> {
    let mut file = BufWriter::new(File::create(path)?);

    let start = format_trading_date(report.start);
    let end = format_trading_date(report.end);
    file.write_all(&encode_record(["Start Date", start.as_str(), "End Date", end.as_str()])?)?;
    file.write_all(LINE_END)?;

    let notes = report.notes();
    for note in &notes {
        file.write_all(&encode_record([note])?)?;
    }
    if !notes.is_empty() {
        file.write_all(LINE_END)?;
    }

    file.write_all(&encode_record(COLUMNS)?)?;
    for row in rows(report, requests) {
        file.write_all(&encode_record(&row)?)?;
    }
    file.flush()?;
    Ok(())
}

fn encode_record<I, T>(fields: I) -> Result<Vec<u8>, CliError>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::CRLF)
        .from_writer(Vec::new());
    writer.write_record(fields)?;
    writer
        .into_inner()
        .map_err(|error| CliError::Io(error.into_error()))
}

/// First free name among `stock_changes_output.csv`, `stock_changes_output_v1.csv`, ...
pub fn next_output_path(dir: &Path) -> PathBuf {
    let base = dir.join(format!("{OUTPUT_FILE_STEM}.csv"));
    if !base.exists() {
        return base;
    }
    (1u32..)
        .map(|version| dir.join(format!("{OUTPUT_FILE_STEM}_v{version}.csv")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(base)
}

/// Create `dir` if needed and write the report to the next free file name.
pub fn save(dir: &Path, report: &LookupReport, requests: &[StockRequest]) -> Result<PathBuf, CliError> {
    fs::create_dir_all(dir)?;
    let path = next_output_path(dir);
    write_csv(&path, report, requests)?;
    tracing::info!(path = %path.display(), rows = report.results.len(), "report written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use stockdelta_core::{Boundary, DateAdjustment, Isin, PriceObservation, Ticker};
    use time::macros::date;

    fn sample() -> (LookupReport, Vec<StockRequest>) {
        let requests = vec![
            StockRequest::new("Microsoft", Some("MSFT"), None),
            StockRequest::new("Nobody Plc", Some("NOPE"), Some("GB0000000000")),
            StockRequest::named("Old Co"),
        ];
        let results = vec![
            LookupResult::Success {
                name: String::from("Microsoft"),
                ticker: Ticker::parse("MSFT").expect("valid"),
                isin: Isin::parse("US5949181045").ok(),
                currency: String::from("USD"),
                start: PriceObservation {
                    date: date!(2025 - 01 - 04),
                    price: dec!(418.58),
                    actual_trading_date: date!(2025 - 01 - 06),
                },
                end: PriceObservation {
                    date: date!(2025 - 03 - 03),
                    price: dec!(388.4900),
                    actual_trading_date: date!(2025 - 03 - 03),
                },
                percentage: dec!(-7.2),
            },
            LookupResult::NotFound {
                name: String::from("Nobody Plc"),
            },
            LookupResult::Delisted {
                name: String::from("Old Co"),
                ticker: Ticker::parse("OLD.L").expect("valid"),
            },
        ];
        let report = LookupReport {
            start: date!(2025 - 01 - 04),
            end: date!(2025 - 03 - 03),
            results,
            adjustments: vec![DateAdjustment {
                boundary: Boundary::Start,
                requested: date!(2025 - 01 - 04),
                actual: date!(2025 - 01 - 06),
                name: String::from("Microsoft"),
            }],
        };
        (report, requests)
    }

    #[test]
    fn terminal_output_lists_notes_then_rows() {
        let (report, requests) = sample();
        let mut out = Vec::new();
        render_terminal(&mut out, &report, &requests).expect("write to memory");

        let text = String::from_utf8(out).expect("utf-8");
        assert_eq!(
            text,
            "Start Date: 04-Jan-25, End Date: 03-Mar-25\n\
             \n\
             Note: Start date adjusted to 06-Jan-25 (next trading day) for: Microsoft\n\
             \n\
             Stock Name,Ticker,ISIN,Start Price,End Price,Percentage,Currency\n\
             Microsoft,MSFT,US5949181045,418.58,388.49,-7.2,USD\n\
             Nobody Plc,NOPE,GB0000000000,Stock details not found,,,\n\
             Old Co,OLD.L,,Delisted,,,\n"
        );
    }

    #[test]
    fn error_rows_echo_the_request() {
        let request = StockRequest::new("Zero Corp", Some("ZERO"), None);
        let row = result_row(
            &LookupResult::Error {
                name: String::from("Zero Corp"),
                message: String::from("Start price is zero; percentage change is undefined"),
            },
            &request,
        );
        assert_eq!(row[1], "ZERO");
        assert_eq!(row[3], "Start price is zero; percentage change is undefined");
        assert!(row[4..].iter().all(String::is_empty));
    }

    #[test]
    fn prices_keep_two_decimals() {
        assert_eq!(format_price(dec!(12)), "12.00");
        assert_eq!(format_price(dec!(0.125)), "0.13");
        assert_eq!(format_percentage(dec!(16.8)), "16.8");
        assert_eq!(format_percentage(dec!(0)), "0.0");
    }

    #[test]
    fn csv_file_mirrors_terminal_layout() {
        let dir = tempfile::tempdir().expect("temp dir");
        let (report, requests) = sample();

        let path = save(dir.path(), &report, &requests).expect("save report");
        assert_eq!(path, dir.path().join("stock_changes_output.csv"));

        let written = fs::read_to_string(&path).expect("read report");
        assert!(written.starts_with("Start Date,04-Jan-25,End Date,03-Mar-25\r\n\r\n"));
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines[0], "Start Date,04-Jan-25,End Date,03-Mar-25");
        assert_eq!(lines[1], "");
        assert_eq!(
            lines[2],
            "Start date adjusted to 06-Jan-25 (next trading day) for: Microsoft"
        );
        assert_eq!(lines[4], COLUMNS.join(","));
        assert_eq!(lines[3], "");
        assert_eq!(lines[5], "Microsoft,MSFT,US5949181045,418.58,388.49,-7.2,USD");
        assert_eq!(lines.len(), 8);
    }

    #[test]
    fn report_without_notes_has_one_separator_line() {
        let dir = tempfile::tempdir().expect("temp dir");
        let (mut report, requests) = sample();
        report.adjustments.clear();

        let path = save(dir.path(), &report, &requests).expect("save report");
        let written = fs::read_to_string(&path).expect("read report");

        assert!(written.starts_with(
            "Start Date,04-Jan-25,End Date,03-Mar-25\r\n\r\nStock Name,Ticker,ISIN,"
        ));
        assert!(!written.contains("\"\""));
    }

    #[test]
    fn existing_reports_are_never_overwritten() {
        let dir = tempfile::tempdir().expect("temp dir");
        let (report, requests) = sample();

        let first = save(dir.path(), &report, &requests).expect("first save");
        let second = save(dir.path(), &report, &requests).expect("second save");
        let third = save(dir.path(), &report, &requests).expect("third save");

        assert_eq!(first.file_name().and_then(|n| n.to_str()), Some("stock_changes_output.csv"));
        assert_eq!(second.file_name().and_then(|n| n.to_str()), Some("stock_changes_output_v1.csv"));
        assert_eq!(third.file_name().and_then(|n| n.to_str()), Some("stock_changes_output_v2.csv"));
    }

    #[test]
    fn missing_output_directory_is_created() {
        let dir = tempfile::tempdir().expect("temp dir");
        let nested = dir.path().join("reports").join("2025");
        let (report, requests) = sample();

        let path = save(&nested, &report, &requests).expect("save report");
        assert!(path.starts_with(&nested));
        assert!(path.exists());
    }
}
