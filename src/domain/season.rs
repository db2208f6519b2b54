use super::date::{DateInterval, FuzzyDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid season: {0:?} (expected e.g. \"Spring 2018\")")]
pub struct SeasonParseError(pub String);

/// Quarter of the year in which an anime premieres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum SeasonName {
    #[default]
    Unknown,
    Winter,
    Spring,
    Summer,
    Fall,
}

impl SeasonName {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Winter => "Winter",
            Self::Spring => "Spring",
            Self::Summer => "Summer",
            Self::Fall => "Fall",
        }
    }

    /// First month, last month and the last day of that month.
    const fn months(self) -> Option<(u8, u8, u8)> {
        match self {
            Self::Unknown => None,
            Self::Winter => Some((1, 3, 31)),
            Self::Spring => Some((4, 6, 30)),
            Self::Summer => Some((7, 9, 30)),
            Self::Fall => Some((10, 12, 31)),
        }
    }
}

impl fmt::Display for SeasonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeasonName {
    type Err = SeasonParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "winter" => Ok(Self::Winter),
            "spring" => Ok(Self::Spring),
            "summer" => Ok(Self::Summer),
            "fall" | "autumn" => Ok(Self::Fall),
            _ => Err(SeasonParseError(s.to_string())),
        }
    }
}

/// A broadcast season such as "Spring 2018".
///
/// Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Season {
    pub year: u16,
    pub name: SeasonName,
}

impl Season {
    #[must_use]
    pub const fn new(name: SeasonName, year: u16) -> Self {
        Self { year, name }
    }

    /// The sentinel used before any season has been loaded.
    #[must_use]
    pub const fn unknown() -> Self {
        Self::new(SeasonName::Unknown, 0)
    }

    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self.name, SeasonName::Unknown)
    }

    /// Cache file name, e.g. `2018_spring.xml`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}_{}.xml", self.year, self.name.as_str().to_lowercase())
    }

    /// Inclusive date window covered by the season, `None` when unknown.
    #[must_use]
    pub const fn interval(&self) -> Option<DateInterval> {
        match self.name.months() {
            Some((first, last, last_day)) => Some(DateInterval {
                start: FuzzyDate::new(self.year, first, 1),
                end: FuzzyDate::new(self.year, last, last_day),
            }),
            None => None,
        }
    }

    #[must_use]
    pub const fn next(&self) -> Self {
        match self.name {
            SeasonName::Unknown => *self,
            SeasonName::Winter => Self::new(SeasonName::Spring, self.year),
            SeasonName::Spring => Self::new(SeasonName::Summer, self.year),
            SeasonName::Summer => Self::new(SeasonName::Fall, self.year),
            SeasonName::Fall => Self::new(SeasonName::Winter, self.year.saturating_add(1)),
        }
    }

    #[must_use]
    pub const fn prev(&self) -> Self {
        match self.name {
            SeasonName::Unknown => *self,
            SeasonName::Winter => Self::new(SeasonName::Fall, self.year.saturating_sub(1)),
            SeasonName::Spring => Self::new(SeasonName::Winter, self.year),
            SeasonName::Summer => Self::new(SeasonName::Spring, self.year),
            SeasonName::Fall => Self::new(SeasonName::Summer, self.year),
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            f.write_str(self.name.as_str())
        } else {
            write!(f, "{} {}", self.name, self.year)
        }
    }
}

fn season_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(winter|spring|summer|fall|autumn)\s+(\d{4})\s*$")
            .expect("Invalid Regex")
    })
}

impl FromStr for Season {
    type Err = SeasonParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = season_regex()
            .captures(s)
            .ok_or_else(|| SeasonParseError(s.to_string()))?;

        let name = caps[1].parse()?;
        let year = caps[2]
            .parse()
            .map_err(|_| SeasonParseError(s.to_string()))?;

        Ok(Self::new(name, year))
    }
}

impl TryFrom<String> for Season {
    type Error = SeasonParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Season> for String {
    fn from(season: Season) -> Self {
        season.to_string()
    }
}

/// The span of seasons for which catalogue files are published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonRange {
    pub first: Season,
    pub last: Season,
}

impl SeasonRange {
    #[must_use]
    pub const fn new(first: Season, last: Season) -> Self {
        Self { first, last }
    }

    #[must_use]
    pub fn contains(&self, season: &Season) -> bool {
        !season.is_unknown() && self.first <= *season && *season <= self.last
    }

    /// Iterates seasons from `first` to `last`, inclusive.
    pub fn iter(&self) -> impl Iterator<Item = Season> {
        let last = self.last;
        let first = (!self.first.is_unknown() && self.first <= last).then_some(self.first);
        std::iter::successors(first, move |season| {
            let next = season.next();
            (next > *season && next <= last).then_some(next)
        })
    }
}
