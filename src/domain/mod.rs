//! Domain types for the season database with strong typing.
//!
//! This module provides type-safe wrappers for registry identifiers, the
//! external services an anime can be linked to, broadcast seasons and the
//! partially-known dates used by catalogue data.

pub mod date;
pub mod season;

pub use date::{DateInterval, FuzzyDate};
pub use season::{Season, SeasonName, SeasonParseError, SeasonRange};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for an anime in the local registry.
///
/// The value is the numeric ID the item has on its source service, so two
/// registries synced against the same service agree on IDs.
///
/// # Examples
///
/// ```rust
/// use kisetsu::domain::AnimeId;
///
/// let id = AnimeId::new(42);
/// assert_eq!(id.value(), 42);
/// assert_eq!(id.to_string(), "42");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AnimeId(i32);

impl AnimeId {
    /// Creates a new `AnimeId` from a raw i32 value.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if `id` is negative.
    #[must_use]
    pub const fn new(id: i32) -> Self {
        debug_assert!(id >= 0, "AnimeId should be non-negative");
        Self(id)
    }

    /// Returns the underlying i32 value.
    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for AnimeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<AnimeId> for i32 {
    fn from(id: AnimeId) -> Self {
        id.0
    }
}

impl From<i32> for AnimeId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

impl Serialize for AnimeId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i32(self.0)
    }
}

impl<'de> Deserialize<'de> for AnimeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let id = i32::deserialize(deserializer)?;
        Ok(Self::new(id))
    }
}

/// An external tracking service that assigns its own anime IDs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ServiceId {
    #[default]
    MyAnimeList,
    Kitsu,
    AniList,
}

impl ServiceId {
    /// Order in which cross-service IDs are tried when matching a catalogue
    /// entry against the registry. The first service with a hit wins.
    pub const LOOKUP_PRIORITY: [Self; 3] = [Self::MyAnimeList, Self::Kitsu, Self::AniList];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MyAnimeList => "myanimelist",
            Self::Kitsu => "kitsu",
            Self::AniList => "anilist",
        }
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::LOOKUP_PRIORITY
            .into_iter()
            .find(|service| service.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown service: {s}"))
    }
}
