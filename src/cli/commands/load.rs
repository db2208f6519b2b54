//! Load season command handler

use super::{open_registry, print_season, service_manager};
use crate::cli::OutputArgs;
use crate::config::Config;
use crate::domain::Season;
use crate::library::{SeasonContext, SeasonDatabase, SeasonError};
use crate::services::{ConsoleUi, HttpSeasonFetcher};
use anyhow::Context;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{info, warn};

pub async fn cmd_load_season(
    config: &Config,
    season: Season,
    output: OutputArgs,
) -> anyhow::Result<()> {
    let mut registry = open_registry(config)?;
    let services = service_manager(config);
    let ui = ConsoleUi;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let fetcher = HttpSeasonFetcher::with_timeout(
        Duration::from_secs(u64::from(config.http.request_timeout_seconds)),
        &config.http.user_agent,
        Handle::current(),
        tx,
    )?;

    let mut seasons = SeasonDatabase::from_config(config);
    if !seasons.available_seasons().contains(&season) {
        warn!(season = %season, "Season is outside the published range");
    }

    let mut ctx = SeasonContext {
        registry: &mut registry,
        services: &services,
        ui: &ui,
        fetcher: &fetcher,
    };

    let count = match seasons.load_season(season, &mut ctx) {
        Ok(count) => count,
        Err(SeasonError::NotCached { fetching: true, .. }) => {
            let response = rx
                .recv()
                .await
                .context("Season download was dropped before completing")?;
            seasons.handle_fetch_response(response, &mut ctx)?
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to load {season}")),
    };

    info!(season = %season, count, "Season ready");

    seasons.review(
        &registry,
        &services,
        output.hide_nsfw || config.seasons.hide_nsfw,
    );

    print_season(&seasons, &registry, output)
}
