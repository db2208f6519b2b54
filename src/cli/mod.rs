//! CLI module - Command-line interface for Kisetsu
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use crate::domain::{Season, SeasonName};
use clap::{Args, Parser, Subcommand};

/// Kisetsu - Seasonal anime catalogue
/// Browse the anime premiering in a broadcast season
#[derive(Parser)]
#[command(name = "kisetsu")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a season catalogue, downloading it if it is not cached
    #[command(alias = "l")]
    Load {
        #[command(flatten)]
        season: SeasonArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Rebuild a season from the local anime database only
    #[command(alias = "r")]
    Review {
        #[command(flatten)]
        season: SeasonArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show cache state of a season without downloading
    #[command(alias = "c")]
    Check {
        #[command(flatten)]
        season: SeasonArgs,
    },

    /// List the seasons catalogues are published for
    #[command(alias = "ls")]
    Seasons,

    /// Write a default config.toml to the current folder
    Init,
}

#[derive(Args, Clone, Copy)]
pub struct SeasonArgs {
    /// Season name (winter, spring, summer, fall)
    pub name: SeasonName,

    /// Year, e.g. 2018
    pub year: u16,
}

impl SeasonArgs {
    #[must_use]
    pub const fn season(&self) -> Season {
        Season::new(self.name, self.year)
    }
}

#[derive(Args, Clone, Copy)]
pub struct OutputArgs {
    /// Hide adult titles regardless of config
    #[arg(long)]
    pub hide_nsfw: bool,

    /// Print items as JSON
    #[arg(long)]
    pub json: bool,
}

pub use commands::*;
