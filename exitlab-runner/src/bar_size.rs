//! Bar interval table used to annualize per-bar statistics.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Markets trade around the clock, so a year is 365 full days.
pub const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown bar size '{0}' (expected 1min, 5min, 15min, 30min, 60min, 1h, 4h or 1d)")]
pub struct UnknownBarSize(pub String);

/// Supported bar intervals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BarSize {
    Min1,
    Min5,
    Min15,
    Min30,
    Hour1,
    #[default]
    Hour4,
    Day1,
}

impl BarSize {
    pub const ALL: [BarSize; 7] = [
        BarSize::Min1,
        BarSize::Min5,
        BarSize::Min15,
        BarSize::Min30,
        BarSize::Hour1,
        BarSize::Hour4,
        BarSize::Day1,
    ];

    pub fn minutes(&self) -> u32 {
        match self {
            BarSize::Min1 => 1,
            BarSize::Min5 => 5,
            BarSize::Min15 => 15,
            BarSize::Min30 => 30,
            BarSize::Hour1 => 60,
            BarSize::Hour4 => 240,
            BarSize::Day1 => 1440,
        }
    }

    pub fn bars_per_day(&self) -> f64 {
        1440.0 / self.minutes() as f64
    }

    pub fn bars_per_year(&self) -> f64 {
        self.bars_per_day() * DAYS_PER_YEAR
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BarSize::Min1 => "1min",
            BarSize::Min5 => "5min",
            BarSize::Min15 => "15min",
            BarSize::Min30 => "30min",
            BarSize::Hour1 => "1h",
            BarSize::Hour4 => "4h",
            BarSize::Day1 => "1d",
        }
    }
}

impl FromStr for BarSize {
    type Err = UnknownBarSize;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1min" => Ok(BarSize::Min1),
            "5min" => Ok(BarSize::Min5),
            "15min" => Ok(BarSize::Min15),
            "30min" => Ok(BarSize::Min30),
            "60min" | "1h" => Ok(BarSize::Hour1),
            "4h" => Ok(BarSize::Hour4),
            "1d" => Ok(BarSize::Day1),
            _ => Err(UnknownBarSize(s.to_string())),
        }
    }
}

impl TryFrom<String> for BarSize {
    type Error = UnknownBarSize;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BarSize> for String {
    fn from(size: BarSize) -> Self {
        size.as_str().to_string()
    }
}

impl fmt::Display for BarSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bars_per_year_table() {
        assert_eq!(BarSize::Min1.bars_per_year(), 525_600.0);
        assert_eq!(BarSize::Min5.bars_per_year(), 105_120.0);
        assert_eq!(BarSize::Min15.bars_per_year(), 35_040.0);
        assert_eq!(BarSize::Min30.bars_per_year(), 17_520.0);
        assert_eq!(BarSize::Hour1.bars_per_year(), 8_760.0);
        assert_eq!(BarSize::Hour4.bars_per_year(), 2_190.0);
        assert_eq!(BarSize::Day1.bars_per_year(), 365.0);
    }

    #[test]
    fn sixty_minutes_is_one_hour() {
        assert_eq!("60min".parse::<BarSize>().unwrap(), BarSize::Hour1);
        assert_eq!("1H".parse::<BarSize>().unwrap(), BarSize::Hour1);
    }

    #[test]
    fn unknown_size_is_rejected() {
        let err = "2h".parse::<BarSize>().unwrap_err();
        assert_eq!(err, UnknownBarSize("2h".into()));
    }

    #[test]
    fn every_size_parses_its_own_label() {
        for size in BarSize::ALL {
            assert_eq!(size.as_str().parse::<BarSize>().unwrap(), size);
        }
    }
}
