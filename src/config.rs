use crate::constants::{DEFAULT_REMOTE_LOCATION, defaults};
use crate::domain::{Season, SeasonName, ServiceId};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub seasons: SeasonsConfig,

    pub anime: AnimeConfig,

    pub sync: SyncConfig,

    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text.
    pub log_json: bool,

    /// Base folder for relative database paths.
    pub data_path: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_json: false,
            data_path: defaults::DATA_PATH.to_string(),
            worker_threads: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonsConfig {
    /// Folder holding cached `<year>_<season>.xml` catalogue files.
    pub database_path: String,

    /// Base URL catalogue files are downloaded from. Empty disables downloads.
    pub remote_location: String,

    pub hide_nsfw: bool,

    pub available_from: Season,

    pub available_to: Season,
}

impl Default for SeasonsConfig {
    fn default() -> Self {
        Self {
            database_path: defaults::SEASON_FOLDER.to_string(),
            remote_location: DEFAULT_REMOTE_LOCATION.to_string(),
            hide_nsfw: true,
            available_from: Season::new(SeasonName::Winter, 2011),
            available_to: Season::new(SeasonName::Spring, 2018),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimeConfig {
    pub database_file: String,
}

impl Default for AnimeConfig {
    fn default() -> Self {
        Self {
            database_file: defaults::ANIME_DATABASE_FILE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Service whose IDs key catalogue entries.
    pub active_service: ServiceId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds (default: 30)
    pub request_timeout_seconds: u32,

    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: 30,
            user_agent: format!("kisetsu/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::default_config_path();
        self.save_to_path(&path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("kisetsu").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".kisetsu").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();

        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        let remote = &self.seasons.remote_location;
        if !remote.is_empty() {
            url::Url::parse(remote)
                .with_context(|| format!("Invalid seasons.remote_location: {remote}"))?;

            if !remote.ends_with('/') {
                anyhow::bail!("seasons.remote_location must end with '/'");
            }
        }

        let (from, to) = (self.seasons.available_from, self.seasons.available_to);
        if from.is_unknown() || to.is_unknown() || from > to {
            anyhow::bail!("Invalid season range: {from} to {to}");
        }

        if self.http.request_timeout_seconds == 0 {
            anyhow::bail!("http.request_timeout_seconds must be > 0");
        }

        Ok(())
    }

    /// Season catalogue folder, resolved against `general.data_path`.
    #[must_use]
    pub fn season_database_path(&self) -> PathBuf {
        self.resolve(&self.seasons.database_path)
    }

    /// Anime registry file, resolved against `general.data_path`.
    #[must_use]
    pub fn anime_database_path(&self) -> PathBuf {
        self.resolve(&self.anime.database_file)
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            Path::new(&self.general.data_path).join(path)
        }
    }
}
