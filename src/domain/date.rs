use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A calendar date where any component may be unknown (stored as 0).
///
/// Catalogue data often only knows the year, or year and month, of a
/// premiere. Ordering is lexicographic over (year, month, day).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct FuzzyDate {
    year: u16,
    month: u8,
    day: u8,
}

impl FuzzyDate {
    #[must_use]
    pub const fn new(year: u16, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    #[must_use]
    pub const fn year(&self) -> u16 {
        self.year
    }

    #[must_use]
    pub const fn month(&self) -> u8 {
        self.month
    }

    #[must_use]
    pub const fn day(&self) -> u8 {
        self.day
    }

    /// A date is usable once its year is known.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.year > 0
    }

    /// Parses a date, treating anything unreadable as an unknown date.
    #[must_use]
    pub fn parse_lossy(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }

    const fn with_first_day(self) -> Self {
        if self.day == 0 {
            Self::new(self.year, self.month, 1)
        } else {
            self
        }
    }
}

impl fmt::Display for FuzzyDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl FromStr for FuzzyDate {
    type Err = String;

    /// Accepts `YYYY`, `YYYY-MM` and `YYYY-MM-DD`; zero components are unknown.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::default());
        }

        let mut parts = s.split('-');
        let mut next = |max: u16| -> Result<u16, String> {
            match parts.next() {
                None => Ok(0),
                Some(part) => part
                    .parse::<u16>()
                    .ok()
                    .filter(|value| *value <= max)
                    .ok_or_else(|| format!("Invalid date: {s}")),
            }
        };

        let year = next(9999)?;
        let month = u8::try_from(next(12)?).map_err(|e| e.to_string())?;
        let day = u8::try_from(next(31)?).map_err(|e| e.to_string())?;

        if parts.next().is_some() {
            return Err(format!("Invalid date: {s}"));
        }

        Ok(Self::new(year, month, day))
    }
}

/// Inclusive date window of a broadcast season.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateInterval {
    pub start: FuzzyDate,
    pub end: FuzzyDate,
}

impl DateInterval {
    /// Whether a premiere date falls inside the window. Dates without a known
    /// year and month never do; an unknown day counts as the first.
    #[must_use]
    pub fn contains(&self, date: &FuzzyDate) -> bool {
        if date.year == 0 || date.month == 0 {
            return false;
        }
        let date = date.with_first_day();
        self.start <= date && date <= self.end
    }
}
