//! Compact CoD date codes.
//!
//! Analog tables store dates as `YYMMDD` integers where `YY` is the year
//! offset from 1900, so `170101` is 2017-01-01. The century is always the
//! 1900s; codes for years at or past 2000 are ambiguous by construction and
//! the convention is kept as-is because the archive layout and file naming
//! downstream rely on the same two-digit form. Decoding is plain integer
//! arithmetic and performs no calendar validation.

use chrono::NaiveDate;

use crate::error::{Result, SdmError};

/// Epoch of the full-grid time axis.
pub const TIME_EPOCH: &str = "1899-12-31";

/// Components decoded from a compact `YYMMDD` date code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateParts {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// `MMDD` within the year.
    pub month_day: i32,
    /// `YYYYMM` grouping key; archive reads are batched on this.
    pub year_month: i32,
}

/// Decompose a compact date code into its components.
///
/// Never fails: day 31 in a 30-day month decodes without complaint, and the
/// caller owns the consequences.
pub fn decompose(code: i32) -> DateParts {
    let year_month = code / 100 + 190_000;
    let month_day = code % 10_000;

    DateParts {
        year: year_month / 100,
        month: (month_day / 100) as u32,
        day: (month_day % 100) as u32,
        month_day,
        year_month,
    }
}

/// Rebuild the compact code from a `YYYYMM` grouping key and day-of-month.
pub fn compose(year_month: i32, day: u32) -> i32 {
    (year_month - 190_000) * 100 + day as i32
}

/// Interpret the code as a calendar date, failing for nonsense components.
pub fn calendar_date(code: i32) -> Result<NaiveDate> {
    let p = decompose(code);
    NaiveDate::from_ymd_opt(p.year, p.month, p.day).ok_or(SdmError::InvalidDate(code))
}

/// Render a date code for display using a chrono format pattern,
/// e.g. `%Y-%m-%d`.
pub fn format_date(code: i32, pattern: &str) -> Result<String> {
    Ok(calendar_date(code)?.format(pattern).to_string())
}

/// Offset in whole days from the 1899-12-31 epoch, the value stored in the
/// full-grid `time` variable.
pub fn days_since_epoch(code: i32) -> Result<i64> {
    // The epoch literal is a valid date, so the unwrap-free path below only
    // fails for the input code.
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 31).ok_or(SdmError::InvalidDate(code))?;
    Ok((calendar_date(code)? - epoch).num_days())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decompose_example() {
        let p = decompose(170101);
        assert_eq!(p.year, 2017);
        assert_eq!(p.month, 1);
        assert_eq!(p.day, 1);
        assert_eq!(p.month_day, 101);
        assert_eq!(p.year_month, 201701);
    }

    #[test]
    fn test_decompose_century_convention() {
        // 1961-12-31: offsets below 100 stay in the 1900s
        let p = decompose(611231);
        assert_eq!((p.year, p.month, p.day), (1961, 12, 31));
        assert_eq!(p.year_month, 196112);
    }

    #[test]
    fn test_compose_round_trip() {
        for code in [101, 611231, 161231, 170101, 991231] {
            let p = decompose(code);
            assert_eq!(compose(p.year_month, p.day), code, "code {}", code);
        }
    }

    #[test]
    fn test_no_calendar_validation() {
        // Day 31 of a 30-day month decodes fine
        let p = decompose(170431);
        assert_eq!((p.month, p.day), (4, 31));
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(170101, "%Y-%m-%d").unwrap(), "2017-01-01");
        assert_eq!(format_date(161231, "%d/%m/%Y").unwrap(), "31/12/2016");
    }

    #[test]
    fn test_format_rejects_invalid_calendar_date() {
        assert!(matches!(
            format_date(170431, "%Y-%m-%d"),
            Err(SdmError::InvalidDate(170431))
        ));
    }

    #[test]
    fn test_days_since_epoch() {
        // 1900-01-01 (code 101) is one day past the epoch
        assert_eq!(days_since_epoch(101).unwrap(), 1);
        // 1901-01-01, one non-leap year later
        assert_eq!(days_since_epoch(10101).unwrap(), 366);
        // 117 years of 365 days plus 29 leap days, plus the day from the
        // epoch to 1900-01-01
        assert_eq!(days_since_epoch(170101).unwrap(), 42735);
    }
}
