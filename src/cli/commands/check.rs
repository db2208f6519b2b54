//! Check season command handler

use super::{open_registry, service_manager};
use crate::config::Config;
use crate::domain::{AnimeId, Season, ServiceId};
use crate::library::{AnimeDatabase, AnimeRegistry, RegistryError, SeasonDatabase};
use crate::models::anime::AnimeItem;
use anyhow::Context;
use tracing::debug;

/// Registry view that takes updates in memory but never writes them back.
struct ReadOnlyRegistry(AnimeDatabase);

impl AnimeRegistry for ReadOnlyRegistry {
    fn find_item(&self, id: AnimeId) -> Option<&AnimeItem> {
        self.0.find_item(id)
    }

    fn find_by_service_id(&self, service: ServiceId, external_id: &str) -> Option<&AnimeItem> {
        self.0.find_by_service_id(service, external_id)
    }

    fn update_item(&mut self, item: AnimeItem) -> Result<AnimeId, RegistryError> {
        self.0.update_item(item)
    }

    fn items(&self) -> Box<dyn Iterator<Item = &AnimeItem> + '_> {
        self.0.items()
    }

    fn save(&self) -> Result<(), RegistryError> {
        debug!(path = %self.0.path().display(), "Skipping anime database save");
        Ok(())
    }
}

pub async fn cmd_check_season(config: &Config, season: Season) -> anyhow::Result<()> {
    let mut seasons = SeasonDatabase::from_config(config);
    let path = seasons.season_path(&season);

    println!("Season:    {season}");
    println!(
        "Published: {}",
        if seasons.available_seasons().contains(&season) {
            "yes"
        } else {
            "no"
        }
    );
    println!("Cache:     {}", path.display());

    let data = match tokio::fs::read_to_string(&path).await {
        Ok(data) => data,
        Err(_) => {
            println!("Cached:    no");
            println!();
            println!("Download it with: kisetsu load {} {}", season.name, season.year);
            return Ok(());
        }
    };

    let mut registry = ReadOnlyRegistry(open_registry(config)?);
    let services = service_manager(config);
    let count = seasons
        .load_string(&data, &mut registry, &services)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    println!("Cached:    yes ({count} titles)");
    println!(
        "Refresh:   {}",
        if seasons.is_refresh_required(&registry) {
            "required"
        } else {
            "not required"
        }
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SeasonName, SeasonRange};
    use crate::services::ServiceManager;

    #[test]
    fn read_only_registry_does_not_write_database() {
        let dir = std::env::temp_dir().join(format!("kisetsu-check-{}", uuid::Uuid::new_v4()));
        let path = dir.join("anime.xml");

        let mut registry = ReadOnlyRegistry(AnimeDatabase::new(&path));
        let mut seasons = SeasonDatabase::new(
            dir.join("seasons"),
            "",
            SeasonRange::new(
                Season::new(SeasonName::Winter, 2011),
                Season::new(SeasonName::Spring, 2018),
            ),
        );

        let count = seasons
            .load_string(
                r#"<season>
                    <info><name>Spring 2018</name></info>
                    <anime><id name="myanimelist">36563</id><title>Megalo Box</title></anime>
                </season>"#,
                &mut registry,
                &ServiceManager::default(),
            )
            .unwrap();

        assert_eq!(count, 1);
        assert!(registry.find_item(AnimeId::new(36563)).is_some());
        assert!(!path.exists());
        assert!(!dir.exists());
    }
}
