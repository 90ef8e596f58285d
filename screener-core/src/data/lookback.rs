//! Lookback window: how much daily history to request per ticker.
//!
//! Parsed from short strings: `30d`, `6w`, `6mo`, `1y`.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookbackError {
    #[error("invalid lookback '{0}': expected <n>d, <n>w, <n>mo or <n>y")]
    Invalid(String),

    #[error("lookback must be positive, got '{0}'")]
    Zero(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookbackUnit {
    Days,
    Weeks,
    Months,
    Years,
}

impl LookbackUnit {
    fn suffix(self) -> &'static str {
        match self {
            LookbackUnit::Days => "d",
            LookbackUnit::Weeks => "w",
            LookbackUnit::Months => "mo",
            LookbackUnit::Years => "y",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Lookback {
    amount: u32,
    unit: LookbackUnit,
}

impl Lookback {
    pub fn new(amount: u32, unit: LookbackUnit) -> Result<Self, LookbackError> {
        if amount == 0 {
            return Err(LookbackError::Zero(format!("{amount}{}", unit.suffix())));
        }
        Ok(Self { amount, unit })
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    pub fn unit(&self) -> LookbackUnit {
        self.unit
    }

    /// First calendar day of the window ending on `end`.
    pub fn start_from(&self, end: NaiveDate) -> NaiveDate {
        let start = match self.unit {
            LookbackUnit::Days => end.checked_sub_signed(Duration::days(i64::from(self.amount))),
            LookbackUnit::Weeks => end.checked_sub_signed(Duration::weeks(i64::from(self.amount))),
            LookbackUnit::Months => end.checked_sub_months(Months::new(self.amount)),
            LookbackUnit::Years => self
                .amount
                .checked_mul(12)
                .and_then(|m| end.checked_sub_months(Months::new(m))),
        };
        start.unwrap_or(NaiveDate::MIN)
    }

    /// Inclusive `(start, end)` date range ending on `end`.
    pub fn date_range(&self, end: NaiveDate) -> (NaiveDate, NaiveDate) {
        (self.start_from(end), end)
    }
}

impl Default for Lookback {
    /// One year of history.
    fn default() -> Self {
        Self {
            amount: 1,
            unit: LookbackUnit::Years,
        }
    }
}

impl FromStr for Lookback {
    type Err = LookbackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().to_ascii_lowercase();
        let split = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| LookbackError::Invalid(s.to_string()))?;
        let (digits, suffix) = trimmed.split_at(split);

        let amount: u32 = digits
            .parse()
            .map_err(|_| LookbackError::Invalid(s.to_string()))?;
        let unit = match suffix {
            "d" => LookbackUnit::Days,
            "w" | "wk" => LookbackUnit::Weeks,
            "mo" => LookbackUnit::Months,
            "y" => LookbackUnit::Years,
            _ => return Err(LookbackError::Invalid(s.to_string())),
        };
        if amount == 0 {
            return Err(LookbackError::Zero(s.to_string()));
        }
        Ok(Self { amount, unit })
    }
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit.suffix())
    }
}

impl TryFrom<String> for Lookback {
    type Error = LookbackError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Lookback> for String {
    fn from(value: Lookback) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_common_windows() {
        assert_eq!("1y".parse::<Lookback>().unwrap(), Lookback::default());
        assert_eq!(
            "6mo".parse::<Lookback>().unwrap(),
            Lookback::new(6, LookbackUnit::Months).unwrap()
        );
        assert_eq!(
            " 30D ".parse::<Lookback>().unwrap(),
            Lookback::new(30, LookbackUnit::Days).unwrap()
        );
        assert_eq!(
            "2wk".parse::<Lookback>().unwrap(),
            Lookback::new(2, LookbackUnit::Weeks).unwrap()
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<Lookback>().is_err());
        assert!("y".parse::<Lookback>().is_err());
        assert!("12".parse::<Lookback>().is_err());
        assert!("3h".parse::<Lookback>().is_err());
        assert!(matches!("0d".parse::<Lookback>(), Err(LookbackError::Zero(_))));
    }

    #[test]
    fn display_roundtrips() {
        for s in ["1y", "6mo", "30d", "2w"] {
            assert_eq!(s.parse::<Lookback>().unwrap().to_string(), s);
        }
    }

    #[test]
    fn date_range_subtracts_calendar_units() {
        let end = date(2024, 3, 31);
        assert_eq!(Lookback::default().date_range(end), (date(2023, 3, 31), end));
        assert_eq!(
            "1mo".parse::<Lookback>().unwrap().start_from(end),
            date(2024, 2, 29)
        );
        assert_eq!("10d".parse::<Lookback>().unwrap().start_from(end), date(2024, 3, 21));
        assert_eq!("1w".parse::<Lookback>().unwrap().start_from(end), date(2024, 3, 24));
    }

    #[test]
    fn serde_uses_string_form() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            lookback: Lookback,
        }
        let w: Wrapper = toml::from_str("lookback = \"6mo\"").unwrap();
        assert_eq!(w.lookback.to_string(), "6mo");
        assert!(toml::from_str::<Wrapper>("lookback = \"6x\"").is_err());
    }
}
