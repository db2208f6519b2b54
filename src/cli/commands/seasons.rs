//! List seasons command handler

use crate::config::Config;
use crate::library::SeasonDatabase;

pub async fn cmd_list_seasons(config: &Config) -> anyhow::Result<()> {
    let seasons = SeasonDatabase::from_config(config);
    let range = seasons.available_seasons();

    println!("Available seasons ({} to {})", range.first, range.last);
    println!("{:-<40}", "");

    for season in range.iter() {
        let cached = seasons.season_path(&season).exists();
        println!("{} {}", if cached { "✓" } else { "•" }, season);
    }

    println!();
    println!("Legend: ✓ Cached | • Not downloaded");

    Ok(())
}
