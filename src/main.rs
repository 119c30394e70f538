mod app;
mod cli;
mod config;
mod db;
mod error;
mod paths;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    init_logging(cli.verbose);
    app::run(cli)
}

fn init_logging(verbose: bool) {
    let env = env_logger::Env::default().default_filter_or(default_log_filter(verbose));
    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn default_log_filter(verbose: bool) -> &'static str {
    if verbose { "warn,seen=info" } else { "warn" }
}
