use chrono::{Datelike, Days, Local, NaiveDate};

/// A date argument that could not be understood
#[derive(Debug, thiserror::Error)]
pub enum DateError {
    #[error("invalid date '{0}' (expected YYYY-MM-DD, today, tomorrow or yesterday)")]
    InvalidDay(String),
    #[error("invalid month '{0}' (expected YYYY-MM)")]
    InvalidMonth(String),
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a day argument relative to `today`.
pub fn parse_day(s: &str, today: NaiveDate) -> Result<NaiveDate, DateError> {
    let s = s.trim();
    let relative = match s.to_ascii_lowercase().as_str() {
        "today" => Some(today),
        "tomorrow" => today.checked_add_days(Days::new(1)),
        "yesterday" => today.checked_sub_days(Days::new(1)),
        _ => None,
    };
    if let Some(day) = relative {
        return Ok(day);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| DateError::InvalidDay(s.to_string()))
}

/// Parse `YYYY-MM` into (year, month).
pub fn parse_month(s: &str) -> Result<(i32, u32), DateError> {
    let invalid = || DateError::InvalidMonth(s.to_string());
    let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    Ok((first.year(), first.month()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn relative_days() {
        let today = d(2025, 3, 1);
        assert_eq!(parse_day("today", today).unwrap(), today);
        assert_eq!(parse_day("Tomorrow", today).unwrap(), d(2025, 3, 2));
        assert_eq!(parse_day("yesterday", today).unwrap(), d(2025, 2, 28));
    }

    #[test]
    fn iso_days() {
        let today = d(2025, 3, 1);
        assert_eq!(parse_day("2025-05-14", today).unwrap(), d(2025, 5, 14));
        assert_eq!(parse_day(" 2024-02-29 ", today).unwrap(), d(2024, 2, 29));
        assert!(parse_day("2025-02-30", today).is_err());
        assert!(parse_day("next week", today).is_err());
    }

    #[test]
    fn months() {
        assert_eq!(parse_month("2025-05").unwrap(), (2025, 5));
        assert_eq!(parse_month("2025-5").unwrap(), (2025, 5));
        assert!(parse_month("2025-13").is_err());
        assert!(parse_month("May").is_err());
    }
}
