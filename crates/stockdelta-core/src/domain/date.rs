//! Calendar dates in the `dd-mmm-yy` boundary format (e.g. `01-Jan-25`).

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Month};

use crate::ValidationError;

const DISPLAY_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[day]-[month repr:short]-[year repr:last_two]");

/// Parse a strict `dd-mmm-yy` date. Two-digit years map to 20yy.
pub fn parse_trading_date(input: &str) -> Result<Date, ValidationError> {
    let value = input.trim();
    let invalid = || ValidationError::InvalidDate {
        value: value.to_owned(),
    };

    let mut parts = value.split('-');
    let (Some(day), Some(month), Some(year), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };

    if day.len() != 2 || year.len() != 2 || month.len() != 3 {
        return Err(invalid());
    }
    if !day.bytes().all(|b| b.is_ascii_digit()) || !year.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let day: u8 = day.parse().map_err(|_| invalid())?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month = month_from_abbreviation(month).ok_or_else(invalid)?;

    Date::from_calendar_date(2000 + year, month, day).map_err(|_| invalid())
}

/// Render a date back into `dd-Mon-yy`.
pub fn format_trading_date(date: Date) -> String {
    date.format(DISPLAY_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

fn month_from_abbreviation(value: &str) -> Option<Month> {
    let month = match value.to_ascii_lowercase().as_str() {
        "jan" => Month::January,
        "feb" => Month::February,
        "mar" => Month::March,
        "apr" => Month::April,
        "may" => Month::May,
        "jun" => Month::June,
        "jul" => Month::July,
        "aug" => Month::August,
        "sep" => Month::September,
        "oct" => Month::October,
        "nov" => Month::November,
        "dec" => Month::December,
        _ => return None,
    };
    Some(month)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn parses_boundary_format() {
        assert_eq!(parse_trading_date("01-Jan-25"), Ok(date!(2025 - 01 - 01)));
        assert_eq!(parse_trading_date(" 31-dec-24 "), Ok(date!(2024 - 12 - 31)));
    }

    #[test]
    fn rejects_other_layouts() {
        for value in ["2025-01-01", "1-Jan-25", "01-January-25", "01-Jan-2025", "01/Jan/25", ""] {
            assert!(
                matches!(parse_trading_date(value), Err(ValidationError::InvalidDate { .. })),
                "{value} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_impossible_calendar_dates() {
        assert!(parse_trading_date("30-Feb-25").is_err());
        assert!(parse_trading_date("01-Foo-25").is_err());
    }

    #[test]
    fn formats_with_short_month_and_two_digit_year() {
        assert_eq!(format_trading_date(date!(2025 - 01 - 06)), "06-Jan-25");
        assert_eq!(format_trading_date(date!(2024 - 11 - 29)), "29-Nov-24");
    }
}
