/// More than this many items lacking a start date or synopsis triggers a
/// metadata refresh.
pub const REFRESH_THRESHOLD: usize = 20;

pub const DEFAULT_REMOTE_LOCATION: &str =
    "https://raw.githubusercontent.com/erengy/anime-seasons/master/data/";

pub mod defaults {

    pub const DATA_PATH: &str = "data";

    pub const SEASON_FOLDER: &str = "seasons";

    pub const ANIME_DATABASE_FILE: &str = "anime.xml";
}

pub mod status {

    pub const DOWNLOADING: &str = "Downloading anime season data...";

    pub const DOWNLOAD_FAILED: &str = "Could not download anime season data.";

    pub const READ_FAILED: &str = "Could not read anime season file.";
}
