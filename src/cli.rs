use std::path::PathBuf;

use chrono::TimeDelta;
use clap::{Args, Parser, Subcommand};

use crate::app::input::parse_delay;

#[derive(Debug, Parser)]
#[command(
    name = "seen",
    version,
    about = "Keep track of the TV show episodes you have watched"
)]
pub struct Cli {
    /// Show what is happening and print exact timestamps
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the SQLite database (overrides SEEN_DATABASE and the config file)
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the history, optionally filtered by show, season and episode
    History(HistoryArgs),

    /// Record watched episodes as name/season/episode triples
    Record(RecordArgs),

    /// Add new shows to the catalog
    Add {
        names: Vec<String>,
    },

    /// List all shows in the catalog
    Shows {
        /// Only print the show names
        #[arg(short, long)]
        short_format: bool,

        #[arg(hide = true)]
        extra: Vec<String>,
    },

    /// Check whether a show is in the catalog
    Exists {
        name: Option<String>,
    },

    /// Find a show by a case-insensitive name fragment
    Search {
        pattern: Option<String>,
    },

    /// Print the next episode to watch for each show
    Next {
        /// Only print the episode number
        #[arg(short, long)]
        episode: bool,

        names: Vec<String>,
    },

    /// Print the version and exit
    Version,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// How many history lines to print
    #[arg(short, long, default_value_t = 5)]
    pub count: u32,

    pub name: Option<String>,

    pub season: Option<u32>,

    pub episode: Option<u32>,
}

#[derive(Debug, Args)]
pub struct RecordArgs {
    /// Offset added to the recorded time, e.g. 90m, -1h30m, 2d
    #[arg(
        short,
        long,
        default_value = "0s",
        value_parser = parse_delay,
        allow_hyphen_values = true
    )]
    pub delay: TimeDelta,

    #[arg(allow_negative_numbers = true)]
    pub triples: Vec<String>,
}
