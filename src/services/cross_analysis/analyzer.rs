use rayon::prelude::*;
use serde::Serialize;
use crate::config::Config;
use crate::error::AppError;
use crate::models::SheetStatistics;
use crate::services::excel::inference::infer_type;
use crate::services::excel::sheet::Sheet;
use crate::services::excel::types::{CellValue, DataType};
use super::correlation::{correlate, CorrelationResult};
use super::grouping::{group_by_category, CategoryStat};

/// One column pulled out of a sheet together with its inferred type.
#[derive(Debug, Clone)]
pub struct ColumnData {
    pub header: String,
    pub data_type: DataType,
    pub values: Vec<CellValue>,
}

impl ColumnData {
    pub fn new(header: &str, values: Vec<CellValue>) -> Self {
        ColumnData {
            header: header.to_string(),
            data_type: infer_type(&values),
            values,
        }
    }

    pub fn from_sheet(sheet: &Sheet, header: &str) -> Result<Self, AppError> {
        let values = sheet.column_values_by_name(header)?;
        Ok(ColumnData::new(header, values))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    CategoryStats(Vec<CategoryStat>),
    Correlation(CorrelationResult),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossColumnStat {
    pub target_column: String,
    pub source_column: String,
    pub target_type: DataType,
    pub source_type: DataType,
    /// Rows where both target and source hold a value.
    pub sample_count: usize,
    #[serde(flatten)]
    pub relation: Relation,
}

impl CrossColumnStat {
    pub fn correlation(&self) -> Option<&CorrelationResult> {
        match &self.relation {
            Relation::Correlation(result) => Some(result),
            Relation::CategoryStats(_) => None,
        }
    }

    pub fn category_stats(&self) -> Option<&[CategoryStat]> {
        match &self.relation {
            Relation::CategoryStats(stats) => Some(stats),
            Relation::Correlation(_) => None,
        }
    }
}

/// Analyzes one (target, source) pair. The caller guarantees the target
/// is numeric.
pub fn analyze_pair(target: &ColumnData, source: &ColumnData, row_count: usize) -> CrossColumnStat {
    let sample_count = target
        .values
        .iter()
        .zip(&source.values)
        .filter(|(t, s)| !t.is_empty() && !s.is_empty())
        .count();

    let relation = match source.data_type {
        DataType::Numeric => Relation::Correlation(correlate(&target.values, &source.values)),
        DataType::Text | DataType::Date | DataType::Mixed => {
            Relation::CategoryStats(group_by_category(&target.values, &source.values, row_count))
        }
    };

    CrossColumnStat {
        target_column: target.header.clone(),
        source_column: source.header.clone(),
        target_type: target.data_type,
        source_type: source.data_type,
        sample_count,
        relation,
    }
}

#[derive(Debug, Clone)]
pub struct CrossColumnAnalyzer {
    parallel_pair_threshold: usize,
}

impl Default for CrossColumnAnalyzer {
    fn default() -> Self {
        CrossColumnAnalyzer::new(Config::default().parallel_pair_threshold)
    }
}

impl CrossColumnAnalyzer {
    pub fn new(parallel_pair_threshold: usize) -> Self {
        Self { parallel_pair_threshold }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.parallel_pair_threshold)
    }

    /// Every ordered (numeric target, other source) pair, target-major and
    /// source-minor in column order.
    pub fn analyze(&self, columns: &[ColumnData], row_count: usize) -> Vec<CrossColumnStat> {
        let start = std::time::Instant::now();
        let pairs: Vec<(usize, usize)> = columns
            .iter()
            .enumerate()
            .filter(|(_, column)| column.data_type == DataType::Numeric)
            .flat_map(|(t, _)| (0..columns.len()).filter(move |s| *s != t).map(move |s| (t, s)))
            .collect();

        let run = |&(t, s): &(usize, usize)| analyze_pair(&columns[t], &columns[s], row_count);
        let stats: Vec<CrossColumnStat> = if pairs.len() >= self.parallel_pair_threshold {
            tracing::debug!("Analyzing {} column pairs in parallel", pairs.len());
            pairs.par_iter().map(run).collect()
        } else {
            pairs.iter().map(run).collect()
        };

        tracing::info!("Cross-column analysis of {} pairs completed in {:?}", stats.len(), start.elapsed());
        stats
    }

    /// Single-pair retrieval: reuse the precomputed entry when the sheet
    /// statistics carry one, otherwise compute it from the two raw columns.
    pub fn lookup_pair(
        &self,
        sheet: &Sheet,
        precomputed: Option<&SheetStatistics>,
        target: &str,
        source: &str,
    ) -> Result<CrossColumnStat, AppError> {
        sheet.column_index(target)?;
        sheet.column_index(source)?;

        if let Some(stat) = precomputed.and_then(|stats| stats.find_cross_stat(target, source)) {
            tracing::debug!("Using precomputed analysis for {} / {}", target, source);
            return Ok(stat.clone());
        }

        compute_pair(sheet, target, source)
    }
}

/// On-demand analysis re-reading only the two requested columns.
pub fn compute_pair(sheet: &Sheet, target: &str, source: &str) -> Result<CrossColumnStat, AppError> {
    if target == source {
        return Err(AppError::InvalidInput(format!(
            "target and source must be different columns (got '{}')",
            target
        )));
    }

    let target_column = ColumnData::from_sheet(sheet, target)?;
    let source_column = ColumnData::from_sheet(sheet, source)?;

    if target_column.data_type != DataType::Numeric {
        return Err(AppError::NonNumericTarget(target.to_string()));
    }

    tracing::debug!("Computing {} / {} on demand for sheet {}", target, source, sheet.name());
    Ok(analyze_pair(&target_column, &source_column, sheet.row_count()))
}
