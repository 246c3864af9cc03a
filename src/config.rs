use anyhow::Result;
use dotenvy::dotenv;
use std::str::FromStr;

fn default_max_file_size() -> usize {
    // 10 MB in bytes
    10 * 1024 * 1024
}

#[derive(Debug, Clone)]
pub struct Config {
    pub max_file_size: usize,
    /// Pair count at which cross-column analysis fans out over rayon.
    pub parallel_pair_threshold: usize,
    pub pair_cache_capacity: u64,
    pub include_cross_column_stats: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_file_size: default_max_file_size(),
            parallel_pair_threshold: 16,
            pair_cache_capacity: 1024,
            include_cross_column_stats: true,
        }
    }
}

impl Config {
    pub fn new() -> Result<Self> {
        // Load .env file first
        dotenv().ok();

        let defaults = Config::default();
        Ok(Config {
            max_file_size: env_or("SHEET_STATS_MAX_FILE_SIZE", defaults.max_file_size)?,
            parallel_pair_threshold: env_or("SHEET_STATS_PARALLEL_PAIRS", defaults.parallel_pair_threshold)?,
            pair_cache_capacity: env_or("SHEET_STATS_CACHE_CAPACITY", defaults.pair_cache_capacity)?,
            include_cross_column_stats: env_or("SHEET_STATS_CROSS_COLUMNS", defaults.include_cross_column_stats)?,
        })
    }
}

pub fn load_config() -> Result<Config> {
    let config = Config::new()?;
    tracing::debug!("Loaded configuration: {:?}", config);
    Ok(config)
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => parse_setting(key, &raw),
        Err(std::env::VarError::NotPresent) => Ok(default),
        Err(e) => Err(anyhow::anyhow!("Failed to load {}: {}", key, e)),
    }
}

fn parse_setting<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| anyhow::anyhow!("Invalid value '{}' for {}: {}", raw, key, e))
}
