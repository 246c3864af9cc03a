use std::collections::HashSet;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;

/// Largest serial the 1900 date system can express (9999-12-31).
const MAX_DATE_SERIAL: f64 = 2_958_465.0;

static NUMERIC_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^\s*[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?\s*$").ok()
});

// Every accepted date format carries a four digit year.
static YEAR_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\d{4}").ok());

const DATE_FORMATS: [&str; 12] = [
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
];

const DATETIME_FORMATS: [&str; 7] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

/// Parses text the way spreadsheets treat numeric strings: surrounding
/// whitespace, sign, fraction and exponent are allowed; `inf`, `NaN` and
/// hex literals are not numbers.
pub fn parse_numeric_str(s: &str) -> Option<f64> {
    let is_numeric = NUMERIC_PATTERN.as_ref().map_or(false, |re| re.is_match(s));
    if !is_numeric {
        return None;
    }
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

pub fn is_date_string(s: &str) -> bool {
    let s = s.trim();
    if !YEAR_PATTERN.as_ref().map_or(false, |re| re.is_match(s)) {
        return false;
    }

    if DateTime::parse_from_rfc3339(s).is_ok() {
        return true;
    }

    DATE_FORMATS
        .iter()
        .any(|format| NaiveDate::parse_from_str(s, format).is_ok())
        || DATETIME_FORMATS
            .iter()
            .any(|format| NaiveDateTime::parse_from_str(s, format).is_ok())
}

/// Converts a 1900-system spreadsheet serial into a calendar timestamp.
/// Serial 60 is the phantom 1900-02-29 and lands on 1900-02-28.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 || serial >= MAX_DATE_SERIAL + 1.0 {
        return None;
    }

    let days = serial.trunc() as i64;
    let base = if days < 60 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };

    let seconds = ((serial - serial.trunc()) * 86_400.0).round() as i64;
    base.and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::days(days))?
        .checked_add_signed(Duration::seconds(seconds))
}

pub fn format_date_serial(serial: f64) -> Option<String> {
    let datetime = excel_serial_to_datetime(serial)?;
    if datetime.num_seconds_from_midnight() == 0 {
        Some(datetime.format("%Y-%m-%d").to_string())
    } else {
        Some(datetime.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

/// Shortest decimal form: whole numbers print without a fraction.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage of the sheet's data rows (header excluded), rounded to two
/// decimals. A sheet with no data rows yields 0.
pub fn percent_of_data_rows(count: usize, row_count: usize) -> f64 {
    if row_count <= 1 {
        return 0.0;
    }
    round2(count as f64 / (row_count - 1) as f64 * 100.0)
}

/// Header for the 1-based `position`: blank or whitespace-only headers
/// become `Column N`, repeated ones get a numeric suffix. Other headers are
/// kept verbatim, surrounding whitespace included.
pub fn unique_header(raw: &str, position: usize, existing_names: &mut HashSet<String>) -> String {
    let mut name = if raw.trim().is_empty() {
        format!("Column {}", position)
    } else {
        raw.to_string()
    };

    // If the name already exists, add a numeric suffix
    let mut counter = 1;
    let original_name = name.clone();
    while !existing_names.insert(name.clone()) {
        name = format!("{}_{}", original_name, counter);
        counter += 1;
    }

    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn numeric_strings_follow_spreadsheet_rules() {
        assert_eq!(parse_numeric_str("42"), Some(42.0));
        assert_eq!(parse_numeric_str(" -3.5 "), Some(-3.5));
        assert_eq!(parse_numeric_str(".5"), Some(0.5));
        assert_eq!(parse_numeric_str("1e3"), Some(1000.0));
        assert_eq!(parse_numeric_str("inf"), None);
        assert_eq!(parse_numeric_str("NaN"), None);
        assert_eq!(parse_numeric_str("0x1A"), None);
        assert_eq!(parse_numeric_str("12 apples"), None);
        assert_eq!(parse_numeric_str(""), None);
    }

    #[test]
    fn date_strings() {
        assert!(is_date_string("2024-01-15"));
        assert!(is_date_string("15/01/2024"));
        assert!(is_date_string("2024-01-15 08:30:00"));
        assert!(is_date_string("2024-01-15T08:30:00Z"));
        assert!(is_date_string("5 Jan 2024"));
        assert!(is_date_string("January 5, 2024"));
        assert!(!is_date_string("Region A"));
        assert!(!is_date_string("1/2/3"));
        assert!(!is_date_string("2024"));
    }

    #[test]
    fn serial_conversion_handles_1900_system() {
        let d = excel_serial_to_datetime(1.0).unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (1900, 1, 1));

        let d = excel_serial_to_datetime(61.0).unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (1900, 3, 1));

        let d = excel_serial_to_datetime(25569.0).unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (1970, 1, 1));

        let d = excel_serial_to_datetime(45306.5).unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (2024, 1, 15));
        assert_eq!(d.hour(), 12);

        assert!(excel_serial_to_datetime(-1.0).is_none());
        assert!(excel_serial_to_datetime(f64::NAN).is_none());
        assert!(excel_serial_to_datetime(3_000_000.0).is_none());
    }

    #[test]
    fn date_serial_formatting() {
        assert_eq!(format_date_serial(45306.0).as_deref(), Some("2024-01-15"));
        assert_eq!(format_date_serial(45306.25).as_deref(), Some("2024-01-15 06:00:00"));
    }

    #[test]
    fn number_formatting_drops_trailing_zero_fraction() {
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(-2.0), "-2");
        assert_eq!(format_number(2.5), "2.5");
    }

    #[test]
    fn percent_guards_against_empty_sheets() {
        assert_eq!(percent_of_data_rows(3, 1), 0.0);
        assert_eq!(percent_of_data_rows(3, 0), 0.0);
        assert_eq!(percent_of_data_rows(1, 4), 33.33);
        assert_eq!(percent_of_data_rows(2, 3), 100.0);
    }

    #[test]
    fn headers_are_synthesized_and_deduplicated() {
        let mut seen = HashSet::new();
        assert_eq!(unique_header("Qty", 1, &mut seen), "Qty");
        assert_eq!(unique_header("", 2, &mut seen), "Column 2");
        assert_eq!(unique_header("Qty", 3, &mut seen), "Qty_1");
        assert_eq!(unique_header("Qty", 4, &mut seen), "Qty_2");
        assert_eq!(unique_header("Qty ", 5, &mut seen), "Qty ");
        assert_eq!(unique_header("   ", 6, &mut seen), "Column 6");
    }
}
