//! Review season command handler

use super::{open_registry, print_season, service_manager};
use crate::cli::OutputArgs;
use crate::config::Config;
use crate::domain::Season;
use crate::library::SeasonDatabase;

pub async fn cmd_review_season(
    config: &Config,
    season: Season,
    output: OutputArgs,
) -> anyhow::Result<()> {
    let registry = open_registry(config)?;
    let services = service_manager(config);

    let mut seasons = SeasonDatabase::from_config(config);
    seasons.load_season_from_memory(season, &registry, &services);

    if output.hide_nsfw || config.seasons.hide_nsfw {
        seasons.review(&registry, &services, true);
    }

    print_season(&seasons, &registry, output)
}
