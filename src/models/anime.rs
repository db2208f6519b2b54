use crate::domain::{AnimeId, FuzzyDate, ServiceId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Series format as numbered in catalogue files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnimeType {
    #[default]
    Unknown,
    Tv,
    Ova,
    Movie,
    Special,
    Ona,
    Music,
}

impl AnimeType {
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Tv,
            2 => Self::Ova,
            3 => Self::Movie,
            4 => Self::Special,
            5 => Self::Ona,
            6 => Self::Music,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Unknown => 0,
            Self::Tv => 1,
            Self::Ova => 2,
            Self::Movie => 3,
            Self::Special => 4,
            Self::Ona => 5,
            Self::Music => 6,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Tv => "TV",
            Self::Ova => "OVA",
            Self::Movie => "Movie",
            Self::Special => "Special",
            Self::Ona => "ONA",
            Self::Music => "Music",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AgeRating {
    #[default]
    Unknown,
    G,
    Pg,
    Pg13,
    R17,
    R,
    Rx,
}

impl AgeRating {
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            1 => Self::G,
            2 => Self::Pg,
            3 => Self::Pg13,
            4 => Self::R17,
            5 => Self::R,
            6 => Self::Rx,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Unknown => 0,
            Self::G => 1,
            Self::Pg => 2,
            Self::Pg13 => 3,
            Self::R17 => 4,
            Self::R => 5,
            Self::Rx => 6,
        }
    }
}

/// An anime as stored in the local registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeItem {
    pub id: AnimeId,
    /// Service whose numeric ID is used as the local ID.
    pub source: ServiceId,
    pub ids: BTreeMap<ServiceId, String>,
    pub title: String,
    pub anime_type: AnimeType,
    pub image_url: String,
    pub trailer_url: String,
    pub producers: Vec<String>,
    pub genres: Vec<String>,
    pub synopsis: String,
    pub date_start: FuzzyDate,
    pub age_rating: AgeRating,
    /// Unix timestamp of the data this item was last refreshed from.
    pub last_modified: i64,
}

impl AnimeItem {
    #[must_use]
    pub fn new(source: ServiceId) -> Self {
        Self {
            id: AnimeId::default(),
            source,
            ids: BTreeMap::new(),
            title: String::new(),
            anime_type: AnimeType::Unknown,
            image_url: String::new(),
            trailer_url: String::new(),
            producers: Vec::new(),
            genres: Vec::new(),
            synopsis: String::new(),
            date_start: FuzzyDate::default(),
            age_rating: AgeRating::Unknown,
            last_modified: 0,
        }
    }

    /// External ID of this anime on `service`, if known.
    #[must_use]
    pub fn service_id(&self, service: ServiceId) -> Option<&str> {
        self.ids
            .get(&service)
            .map(String::as_str)
            .filter(|id| !id.is_empty())
    }

    pub fn set_id(&mut self, service: ServiceId, id: impl Into<String>) {
        self.ids.insert(service, id.into());
    }

    /// Adult content is flagged by the "Hentai" genre or an Rx rating.
    #[must_use]
    pub fn is_nsfw(&self) -> bool {
        self.age_rating == AgeRating::Rx
            || self
                .genres
                .iter()
                .any(|genre| genre.eq_ignore_ascii_case("hentai"))
    }

    /// Copies every known field of `other` over this item, keeping values
    /// that `other` leaves empty.
    pub fn merge(&mut self, other: Self) {
        self.ids.extend(
            other
                .ids
                .into_iter()
                .filter(|(_, external_id)| !external_id.is_empty()),
        );

        merge_string(&mut self.title, other.title);
        merge_string(&mut self.image_url, other.image_url);
        merge_string(&mut self.trailer_url, other.trailer_url);
        merge_string(&mut self.synopsis, other.synopsis);

        if other.anime_type != AnimeType::Unknown {
            self.anime_type = other.anime_type;
        }
        if !other.producers.is_empty() {
            self.producers = other.producers;
        }
        if !other.genres.is_empty() {
            self.genres = other.genres;
        }
        if other.date_start.is_valid() {
            self.date_start = other.date_start;
        }
        if other.age_rating != AgeRating::Unknown {
            self.age_rating = other.age_rating;
        }
        self.last_modified = self.last_modified.max(other.last_modified);
    }
}

fn merge_string(target: &mut String, value: String) {
    if !value.is_empty() {
        *target = value;
    }
}

/// One `<anime>` entry of a season catalogue, before it is matched against
/// the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnimeRecord {
    pub title: String,
    pub type_code: i32,
    pub image_url: String,
    pub trailer_url: String,
    pub producers: Vec<String>,
    pub ids: BTreeMap<ServiceId, String>,
    pub last_modified: i64,
}

impl AnimeRecord {
    #[must_use]
    pub fn service_id(&self, service: ServiceId) -> Option<&str> {
        self.ids
            .get(&service)
            .map(String::as_str)
            .filter(|id| !id.is_empty())
    }

    /// Splits a comma-separated producer string.
    #[must_use]
    pub fn split_producers(value: &str) -> Vec<String> {
        value
            .split(',')
            .map(str::trim)
            .filter(|producer| !producer.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Builds a registry item sourced from `source`.
    #[must_use]
    pub fn into_item(self, source: ServiceId) -> AnimeItem {
        let mut item = AnimeItem::new(source);
        item.ids = self.ids;
        item.title = self.title;
        item.anime_type = AnimeType::from_code(self.type_code);
        item.image_url = self.image_url;
        item.trailer_url = self.trailer_url;
        item.producers = self.producers;
        item.last_modified = self.last_modified;
        item
    }
}
