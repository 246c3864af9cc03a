use std::sync::Arc;
use moka::sync::Cache;
use crate::config::Config;
use crate::error::AppError;
use crate::models::SheetStatistics;
use crate::services::excel::sheet::Sheet;
use super::analyzer::{CrossColumnAnalyzer, CrossColumnStat};

/// Identity of one sheet as the caller knows it, e.g. an upload id plus the
/// sheet name. Entries for a sheet stay valid until it is invalidated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SheetKey {
    pub source: String,
    pub sheet: String,
}

impl SheetKey {
    pub fn new(source: &str, sheet: &str) -> Self {
        SheetKey {
            source: source.to_string(),
            sheet: sheet.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PairKey {
    sheet: SheetKey,
    target: String,
    source: String,
}

/// Single-pair analyses keyed by (sheet, target, source). Concurrent
/// requests for the same key compute it once; the rest wait for that result.
pub struct PairCache {
    cache: Cache<PairKey, Arc<CrossColumnStat>>,
    analyzer: CrossColumnAnalyzer,
}

impl PairCache {
    pub fn new(capacity: u64, analyzer: CrossColumnAnalyzer) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .support_invalidation_closures()
            .build();
        Self { cache, analyzer }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.pair_cache_capacity, CrossColumnAnalyzer::from_config(config))
    }

    pub fn get_or_compute(
        &self,
        key: &SheetKey,
        sheet: &Sheet,
        precomputed: Option<&SheetStatistics>,
        target: &str,
        source: &str,
    ) -> Result<Arc<CrossColumnStat>, AppError> {
        self.get_or_insert_with(key, target, source, || {
            self.analyzer.lookup_pair(sheet, precomputed, target, source)
        })
    }

    /// Errors are handed back to every waiter and never cached.
    pub fn get_or_insert_with<F>(
        &self,
        key: &SheetKey,
        target: &str,
        source: &str,
        compute: F,
    ) -> Result<Arc<CrossColumnStat>, AppError>
    where
        F: FnOnce() -> Result<CrossColumnStat, AppError>,
    {
        let pair_key = PairKey {
            sheet: key.clone(),
            target: target.to_string(),
            source: source.to_string(),
        };

        self.cache
            .try_get_with(pair_key, || compute().map(Arc::new))
            .map_err(AppError::from_shared)
    }

    pub fn contains(&self, key: &SheetKey, target: &str, source: &str) -> bool {
        let pair_key = PairKey {
            sheet: key.clone(),
            target: target.to_string(),
            source: source.to_string(),
        };
        self.cache.get(&pair_key).is_some()
    }

    pub fn invalidate_sheet(&self, key: &SheetKey) {
        let key = key.clone();
        if let Err(e) = self.cache.invalidate_entries_if(move |k, _| k.sheet == key) {
            tracing::warn!("Failed to invalidate cached pairs: {}", e);
        }
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}
