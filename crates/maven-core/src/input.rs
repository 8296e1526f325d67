//! User input normalization.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Trim and upper-case a ticker symbol. Symbols are case-insensitive.
pub fn normalize_symbol(raw: &str) -> Result<String, ValidationError> {
    let symbol = raw.trim();
    if symbol.is_empty() {
        return Err(ValidationError::EmptySymbol);
    }
    Ok(symbol.to_uppercase())
}

/// Inclusive `[start, end]` range of calendar dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvertedRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse optional `YYYY-MM-DD` query values. Both dates are required.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, ValidationError> {
        let start = parse_date("start", start)?;
        let end = parse_date("end", end)?;
        Self::new(start, end)
    }
}

fn parse_date(field: &'static str, value: Option<&str>) -> Result<NaiveDate, ValidationError> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ValidationError::MissingDate(field))?;
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol(" aapl ").unwrap(), "AAPL");
        assert_eq!(normalize_symbol("brk.b").unwrap(), "BRK.B");
        assert_eq!(normalize_symbol("   "), Err(ValidationError::EmptySymbol));
    }

    #[test]
    fn test_date_range_parse() {
        let range = DateRange::parse(Some("2024-01-02"), Some("2024-03-01")).unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());

        // Same-day range is allowed
        assert!(DateRange::parse(Some("2024-01-02"), Some("2024-01-02")).is_ok());
    }

    #[test]
    fn test_date_range_rejects_bad_input() {
        assert_eq!(
            DateRange::parse(None, Some("2024-01-02")),
            Err(ValidationError::MissingDate("start"))
        );
        assert_eq!(
            DateRange::parse(Some("2024-01-02"), Some("")),
            Err(ValidationError::MissingDate("end"))
        );
        assert!(matches!(
            DateRange::parse(Some("01/02/2024"), Some("2024-01-02")),
            Err(ValidationError::InvalidDate { field: "start", .. })
        ));
        assert!(matches!(
            DateRange::parse(Some("2024-02-01"), Some("2024-01-02")),
            Err(ValidationError::InvertedRange { .. })
        ));
    }
}
