pub mod anime_db;
pub mod season_db;

pub use anime_db::{AnimeDatabase, AnimeRegistry, RegistryError};
pub use season_db::{SeasonContext, SeasonDatabase, SeasonError};
