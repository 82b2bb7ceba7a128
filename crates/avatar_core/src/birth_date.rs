//! Parsing of user-typed birth dates (`D.M.YYYY` or `D/M/YYYY`).

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateParseError {
    #[error("text does not look like D.M.YYYY")]
    Format,
    #[error("day or month is out of range")]
    OutOfRange,
    #[error("{0} is not a calendar date")]
    NotACalendarDate(String),
    #[error("date lies in the future")]
    InFuture,
}

/// A validated birth date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BirthDate {
    pub day: u32,
    pub month: u32,
    pub year: i32,
}

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{1,2})[./](\d{1,2})[./](\d{4})$").expect("date pattern is valid")
    })
}

impl BirthDate {
    /// Parses a birth date typed by the user and checks it against `today`.
    pub fn parse(text: &str, today: NaiveDate) -> Result<Self, DateParseError> {
        let caps = date_pattern()
            .captures(text.trim())
            .ok_or(DateParseError::Format)?;

        // The pattern guarantees at most two and exactly four digits.
        let field = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or_default();
        let day: u32 = field(1).parse().map_err(|_| DateParseError::Format)?;
        let month: u32 = field(2).parse().map_err(|_| DateParseError::Format)?;
        let year: i32 = field(3).parse().map_err(|_| DateParseError::Format)?;

        if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
            return Err(DateParseError::OutOfRange);
        }
        if year == 0 {
            return Err(DateParseError::NotACalendarDate(text.trim().to_string()));
        }

        let date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| DateParseError::NotACalendarDate(text.trim().to_string()))?;
        if date > today {
            return Err(DateParseError::InFuture);
        }

        Ok(Self {
            day: date.day(),
            month: date.month(),
            year: date.year(),
        })
    }

    /// `DD.MM.YYYY`, as printed in reports.
    pub fn formatted(&self) -> String {
        format!("{:02}.{:02}.{}", self.day, self.month, self.year)
    }
}
