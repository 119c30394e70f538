use std::path::PathBuf;

use anyhow::{Context, Result};

pub fn default_database_path() -> Result<PathBuf> {
    let base = dirs::data_dir().context("unable to resolve data directory")?;
    Ok(base.join("seen").join("seen.db"))
}

pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("seen").join("config.json"))
}
