use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use crate::omdb::OMDB_BASE;

#[derive(Debug, Clone)]
pub struct Config {
    pub omdb_api_key: String,
    pub omdb_base_url: String,
    /// Directory holding the persisted watched list.
    pub data_dir: PathBuf,
}

impl Config {
    /// Reads `OMDB_API_KEY` (required), `OMDB_BASE_URL` and `POPCORN_DATA_DIR`.
    pub fn from_env() -> Result<Self> {
        let omdb_api_key = env::var("OMDB_API_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .context("OMDB_API_KEY not set")?;
        let omdb_base_url = env::var("OMDB_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| OMDB_BASE.to_string());
        let data_dir = env::var("POPCORN_DATA_DIR")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self {
            omdb_api_key,
            omdb_base_url,
            data_dir,
        })
    }
}
