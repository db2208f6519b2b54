//! Season catalogue database.
//!
//! A season catalogue lists the anime premiering in one quarter of a year.
//! Catalogues are cached on disk as `<year>_<season>.xml`; on a cache miss
//! the file is requested from a remote location and the download is handed
//! back later through [`SeasonDatabase::handle_fetch_response`].
//!
//! Loaded entries are merged into the [`AnimeRegistry`], and the season keeps
//! only the IDs of its items. [`SeasonDatabase::review`] reconciles that list
//! with the registry: items premiering outside the season (or filtered as
//! adult content) are dropped and registry items that belong are added.

use crate::config::Config;
use crate::constants::{REFRESH_THRESHOLD, status};
use crate::domain::{AnimeId, Season, SeasonRange, ServiceId};
use crate::library::anime_db::AnimeRegistry;
use crate::models::anime::{AnimeItem, AnimeRecord};
use crate::services::{FetchRequest, FetchResponse, SeasonFetcher, SeasonUi, ServiceManager};
use crate::xml::{
    XmlDocument, XmlElement, XmlError, XmlNodeType, attr_or_create, dump, read_int, read_str,
    write_int, write_str,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SeasonError {
    /// The cache file is missing. `fetching` tells whether a download was
    /// requested in its place.
    #[error("Anime season file not found: {}", path.display())]
    NotCached { path: PathBuf, fetching: bool },

    #[error("Could not read anime season data: {0}")]
    Xml(#[from] XmlError),

    #[error("Anime season data has no <season> element")]
    MissingSeason,

    #[error("Failed to download {url}: {message}")]
    Fetch { url: String, message: String },
}

/// Collaborators needed while loading a season.
pub struct SeasonContext<'a> {
    pub registry: &'a mut dyn AnimeRegistry,
    pub services: &'a ServiceManager,
    pub ui: &'a dyn SeasonUi,
    pub fetcher: &'a dyn SeasonFetcher,
}

#[derive(Debug, Clone)]
pub struct SeasonDatabase {
    current_season: Season,
    items: Vec<AnimeId>,
    database_path: PathBuf,
    remote_location: String,
    available_seasons: SeasonRange,
}

impl SeasonDatabase {
    pub fn new(
        database_path: impl Into<PathBuf>,
        remote_location: impl Into<String>,
        available_seasons: SeasonRange,
    ) -> Self {
        Self {
            current_season: Season::unknown(),
            items: Vec::new(),
            database_path: database_path.into(),
            remote_location: remote_location.into(),
            available_seasons,
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.season_database_path(),
            config.seasons.remote_location.clone(),
            SeasonRange::new(config.seasons.available_from, config.seasons.available_to),
        )
    }

    #[must_use]
    pub const fn current_season(&self) -> Season {
        self.current_season
    }

    #[must_use]
    pub fn items(&self) -> &[AnimeId] {
        &self.items
    }

    #[must_use]
    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    #[must_use]
    pub fn remote_location(&self) -> &str {
        &self.remote_location
    }

    #[must_use]
    pub const fn available_seasons(&self) -> SeasonRange {
        self.available_seasons
    }

    /// Path of the cache file for `season`.
    #[must_use]
    pub fn season_path(&self, season: &Season) -> PathBuf {
        self.database_path.join(season.file_name())
    }

    /// Loads `season` from its cache file, requesting a download on a miss.
    /// Returns the number of items in the season.
    pub fn load_season(
        &mut self,
        season: Season,
        ctx: &mut SeasonContext<'_>,
    ) -> Result<usize, SeasonError> {
        self.load_file(&season.file_name(), ctx)
    }

    pub fn load_file(
        &mut self,
        filename: &str,
        ctx: &mut SeasonContext<'_>,
    ) -> Result<usize, SeasonError> {
        let path = self.database_path.join(filename);

        let document = match std::fs::read_to_string(&path) {
            Ok(document) => document,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not find anime season file");

                let fetching = !self.remote_location.is_empty();
                if fetching {
                    ctx.ui.change_status_text(status::DOWNLOADING);
                    ctx.ui.enable_input(false);
                    ctx.fetcher
                        .request(FetchRequest::season(&self.remote_location, filename));
                }

                return Err(SeasonError::NotCached { path, fetching });
            }
        };

        match self.load_string(&document, &mut *ctx.registry, ctx.services) {
            Ok(count) => Ok(count),
            Err(e) => {
                ctx.ui
                    .display_error_message(status::READ_FAILED, &path.display().to_string());
                Err(e)
            }
        }
    }

    /// Parses a season catalogue and merges its entries into `registry`.
    ///
    /// Entries without an ID for the active service are skipped. Entries
    /// processed before an error stay in the registry.
    pub fn load_string(
        &mut self,
        data: &str,
        registry: &mut dyn AnimeRegistry,
        services: &ServiceManager,
    ) -> Result<usize, SeasonError> {
        let document = XmlDocument::parse(data)?;
        let season_node = document.child("season").ok_or(SeasonError::MissingSeason)?;
        let info = season_node.child("info");

        let season_name = info.map_or("", |info| info.child_value("name"));
        self.current_season = season_name.parse().unwrap_or_else(|_| {
            debug!(name = season_name, "Unrecognized season name");
            Season::unknown()
        });
        let modified = parse_timestamp(info.map_or("", |info| info.child_value("modified")));

        self.items.clear();
        let current_service = services.current_service_id();

        for node in season_node.children("anime") {
            let record = read_record(node, services, modified);

            let up_to_date = ServiceId::LOOKUP_PRIORITY
                .into_iter()
                .find_map(|service| {
                    record
                        .service_id(service)
                        .and_then(|external_id| registry.find_by_service_id(service, external_id))
                })
                .filter(|item| item.last_modified >= modified)
                .map(|item| item.id);

            let anime_id = if let Some(anime_id) = up_to_date {
                anime_id
            } else {
                if record.service_id(current_service).is_none() {
                    debug!(
                        season = %self.current_season,
                        title = %record.title,
                        service = %current_service,
                        "No ID for current service"
                    );
                    continue;
                }

                let title = record.title.clone();
                match registry.update_item(record.into_item(current_service)) {
                    Ok(anime_id) => anime_id,
                    Err(e) => {
                        warn!(title = %title, error = %e, "Failed to add season item");
                        continue;
                    }
                }
            };

            self.items.push(anime_id);
        }

        if !self.items.is_empty()
            && let Err(e) = registry.save()
        {
            warn!(error = %e, "Failed to save anime database");
        }

        info!(
            event = "season_loaded",
            season = %self.current_season,
            count = self.items.len(),
            "Loaded anime season"
        );

        Ok(self.items.len())
    }

    /// Completes a download started by [`Self::load_file`]. The body is
    /// cached on disk only if it loads successfully. A failed cache write is
    /// logged and does not fail the load.
    pub fn handle_fetch_response(
        &mut self,
        response: FetchResponse,
        ctx: &mut SeasonContext<'_>,
    ) -> Result<usize, SeasonError> {
        ctx.ui.enable_input(true);

        let FetchResponse { request, body } = response;
        let body = match body {
            Ok(body) => body,
            Err(message) => {
                ctx.ui.change_status_text(status::DOWNLOAD_FAILED);
                return Err(SeasonError::Fetch {
                    url: request.url,
                    message,
                });
            }
        };

        match self.load_string(&body, &mut *ctx.registry, ctx.services) {
            Ok(count) => {
                let path = self.database_path.join(&request.filename);
                match self.write_cache(&path, &body) {
                    Ok(()) => debug!(path = %path.display(), "Cached anime season file"),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Failed to cache anime season file");
                    }
                }

                ctx.ui.change_status_text("");
                Ok(count)
            }
            Err(e) => {
                ctx.ui.change_status_text(status::READ_FAILED);
                Err(e)
            }
        }
    }

    fn write_cache(&self, path: &Path, body: &str) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.database_path)?;
        std::fs::write(path, body)
    }

    /// Switches to `season` using only what the registry already holds.
    pub fn load_season_from_memory(
        &mut self,
        season: Season,
        registry: &dyn AnimeRegistry,
        services: &ServiceManager,
    ) {
        self.current_season = season;
        self.items.clear();
        self.review(registry, services, false);
    }

    /// Whether enough items lack a start date or synopsis that their
    /// metadata should be refreshed.
    #[must_use]
    pub fn is_refresh_required(&self, registry: &dyn AnimeRegistry) -> bool {
        self.items
            .iter()
            .filter_map(|anime_id| registry.find_item(*anime_id))
            .filter(|item| !item.date_start.is_valid() || item.synopsis.is_empty())
            .nth(REFRESH_THRESHOLD)
            .is_some()
    }

    pub fn reset(&mut self) {
        self.items.clear();
        self.current_season = Season::unknown();
    }

    /// Reconciles the item list with the season's date window.
    ///
    /// Items whose known start date lies outside the window, duplicates, and
    /// (with `hide_nsfw`) adult titles are removed. Registry items whose start
    /// date lies inside the window are then added. An item without a usable
    /// start date is kept if already listed but never added.
    pub fn review(
        &mut self,
        registry: &dyn AnimeRegistry,
        services: &ServiceManager,
        hide_nsfw: bool,
    ) {
        let Some(interval) = self.current_season.interval() else {
            debug!("Skipping review of unknown season");
            return;
        };

        let is_nsfw = |item: &AnimeItem| hide_nsfw && item.is_nsfw();

        let mut listed = HashSet::with_capacity(self.items.len());
        self.items.retain(|&anime_id| {
            if !listed.insert(anime_id) {
                debug!(anime_id = %anime_id, "Removed duplicate item");
                return false;
            }

            let Some(item) = registry.find_item(anime_id) else {
                return true;
            };

            let outside = item.date_start.is_valid() && !interval.contains(&item.date_start);
            if is_nsfw(item) || outside {
                listed.remove(&anime_id);
                debug!(
                    "Removed item: #{} \"{}\" ({})",
                    anime_id, item.title, item.date_start
                );
                return false;
            }

            true
        });

        let current_service = services.current_service_id();

        for item in registry.items() {
            if listed.contains(&item.id) {
                continue;
            }
            if is_nsfw(item) || !interval.contains(&item.date_start) {
                continue;
            }

            listed.insert(item.id);
            self.items.push(item.id);

            match current_service {
                ServiceId::MyAnimeList => debug!("{}", catalogue_entry(item)),
                _ => debug!(
                    "Added item: #{} \"{}\" ({})",
                    item.id, item.title, item.date_start
                ),
            }
        }
    }
}

fn read_record(node: &XmlElement, services: &ServiceManager, modified: i64) -> AnimeRecord {
    let mut record = AnimeRecord {
        title: read_str(node, "title"),
        type_code: read_int(node, "type"),
        image_url: read_str(node, "image"),
        trailer_url: read_str(node, "trailer"),
        producers: AnimeRecord::split_producers(node.child_value("producers")),
        last_modified: modified,
        ..AnimeRecord::default()
    };

    for id_node in node.children("id") {
        if let Some(service) = services.service_id_by_name(id_node.attribute_value("name")) {
            record.ids.insert(service, id_node.text().trim().to_string());
        }
    }

    record
}

/// Accepts unix seconds, RFC 3339, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD`.
/// Anything else reads as 0.
fn parse_timestamp(value: &str) -> i64 {
    let value = value.trim();

    value
        .parse::<i64>()
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.timestamp()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.and_utc().timestamp())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc().timestamp())
        })
        .unwrap_or(0)
}

/// Renders an item as a catalogue `<anime>` entry.
fn catalogue_entry(item: &AnimeItem) -> String {
    let mut node = XmlElement::new("anime");
    write_int(&mut node, "type", item.anime_type.code());

    let id_node = node.append_child("id");
    attr_or_create(id_node, "name").value = ServiceId::MyAnimeList.as_str().to_string();
    id_node.set_text(
        item.service_id(ServiceId::MyAnimeList)
            .map_or_else(|| item.id.to_string(), str::to_owned),
    );

    write_str(
        &mut node,
        "producers",
        &item.producers.join(", "),
        XmlNodeType::Text,
    );
    write_str(&mut node, "image", &item.image_url, XmlNodeType::Text);
    write_str(&mut node, "title", &item.title, XmlNodeType::Text);

    dump(&node)
}
