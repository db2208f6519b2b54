mod check;
mod init;
mod load;
mod review;
mod seasons;

pub use check::cmd_check_season;
pub use init::cmd_init;
pub use load::cmd_load_season;
pub use review::cmd_review_season;
pub use seasons::cmd_list_seasons;

use crate::cli::OutputArgs;
use crate::config::Config;
use crate::library::{AnimeDatabase, AnimeRegistry, SeasonDatabase};
use crate::models::anime::AnimeItem;
use crate::services::ServiceManager;
use anyhow::Context;

fn open_registry(config: &Config) -> anyhow::Result<AnimeDatabase> {
    let path = config.anime_database_path();
    AnimeDatabase::load(&path)
        .with_context(|| format!("Failed to open anime database: {}", path.display()))
}

/// Prints the season's items as a table or JSON, then the refresh notice.
fn print_season(
    seasons: &SeasonDatabase,
    registry: &dyn AnimeRegistry,
    output: OutputArgs,
) -> anyhow::Result<()> {
    let items: Vec<&AnimeItem> = seasons
        .items()
        .iter()
        .filter_map(|id| registry.find_item(*id))
        .collect();

    if output.json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No anime found for {}.", seasons.current_season());
        return Ok(());
    }

    println!("{} ({} titles)", seasons.current_season(), items.len());
    println!("{:-<70}", "");

    for item in items {
        println!(
            "{:>6}  {:<7} {}  {}",
            item.id,
            item.anime_type.as_str(),
            item.date_start,
            item.title
        );
        if !item.producers.is_empty() {
            println!("        {}", item.producers.join(", "));
        }
    }

    if seasons.is_refresh_required(registry) {
        println!();
        println!("Many titles lack a start date or synopsis; their metadata should be refreshed.");
    }

    Ok(())
}

fn service_manager(config: &Config) -> ServiceManager {
    ServiceManager::new(config.sync.active_service)
}
