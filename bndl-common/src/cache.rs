// bndl-common/src/cache.rs
// Caches raw registry index documents so later runs can resolve offline.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use super::error::{BndlError, Result};
use crate::Config;

/// Stores raw index documents under the configured index cache directory.
#[derive(Debug, Clone)]
pub struct Cache {
    cache_dir: PathBuf,
    ttl: Duration,
}

impl Cache {
    /// Create a new Cache using the config's index cache dir
    pub fn new(config: &Config) -> Result<Self> {
        Self::at(config.index_cache_dir(), config.index_ttl)
    }

    pub fn at(cache_dir: PathBuf, ttl: Duration) -> Result<Self> {
        if !cache_dir.exists() {
            fs::create_dir_all(&cache_dir)?;
        }
        Ok(Self { cache_dir, ttl })
    }

    /// Stores raw string data in the cache
    pub fn store_raw(&self, filename: &str, data: &str) -> Result<()> {
        let path = self.cache_dir.join(filename);
        tracing::debug!("Saving raw data to cache file: {:?}", path);
        fs::write(&path, data)?;
        Ok(())
    }

    /// Loads raw string data from the cache
    pub fn load_raw(&self, filename: &str) -> Result<String> {
        let path = self.cache_dir.join(filename);
        tracing::debug!("Loading raw data from cache file: {:?}", path);

        if !path.exists() {
            return Err(BndlError::Cache(format!(
                "Cache file {filename} does not exist"
            )));
        }

        fs::read_to_string(&path).map_err(|e| BndlError::Cache(format!("IO error: {e}")))
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.cache_dir.join(filename).is_file()
    }

    /// Checks if a cache file exists and is within the TTL
    pub fn is_cache_valid(&self, filename: &str) -> Result<bool> {
        let path = self.cache_dir.join(filename);
        if !path.exists() {
            return Ok(false);
        }

        let modified_time = fs::metadata(&path)?.modified()?;
        let age = SystemTime::now()
            .duration_since(modified_time)
            .map_err(|e| BndlError::Cache(format!("System time error: {e}")))?;
        tracing::debug!(
            "Cache file {} is {} old (ttl {})",
            filename,
            humantime::format_duration(age),
            humantime::format_duration(self.ttl)
        );

        Ok(age <= self.ttl)
    }

    pub fn clear_file(&self, filename: &str) -> Result<()> {
        let path = self.cache_dir.join(filename);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}
