use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::paths::{config_file_path, default_database_path};

pub const DATABASE_ENV: &str = "SEEN_DATABASE";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub database: Option<PathBuf>,
}

impl FileConfig {
    /// Reads the config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read config file {}", path.display()));
            }
        };
        serde_json::from_str(&raw)
            .with_context(|| format!("malformed config file {}", path.display()))
    }
}

/// Picks the database location: flag, then environment, then config file, then the data dir.
pub fn resolve_database_path(flag: Option<PathBuf>) -> Result<PathBuf> {
    let from_env = env::var_os(DATABASE_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from);
    let file_config = match config_file_path() {
        Some(path) => FileConfig::load(&path)?,
        None => FileConfig::default(),
    };
    resolve_from(flag, from_env, file_config)
}

fn resolve_from(
    flag: Option<PathBuf>,
    from_env: Option<PathBuf>,
    file_config: FileConfig,
) -> Result<PathBuf> {
    if let Some(path) = flag.or(from_env).or(file_config.database) {
        return Ok(path);
    }
    default_database_path()
}
