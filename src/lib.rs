pub mod cli;
pub mod config;
pub mod constants;
pub mod domain;
pub mod library;
pub mod models;
pub mod services;
pub mod xml;

use clap::Parser;
use cli::{
    Cli, Commands, cmd_check_season, cmd_init, cmd_list_seasons, cmd_load_season,
    cmd_review_season,
};
pub use config::Config;
use tracing::debug;
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.general.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let cli = Cli::parse();
    debug!(
        active_service = %config.sync.active_service,
        data_path = %config.general.data_path,
        "Configuration loaded"
    );

    match cli.command {
        Commands::Load { season, output } => {
            cmd_load_season(&config, season.season(), output).await
        }
        Commands::Review { season, output } => {
            cmd_review_season(&config, season.season(), output).await
        }
        Commands::Check { season } => cmd_check_season(&config, season.season()).await,
        Commands::Seasons => cmd_list_seasons(&config).await,
        Commands::Init => cmd_init().await,
    }
}
