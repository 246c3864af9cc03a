use rayon::prelude::*;
use crate::config::Config;
use crate::models::{SheetStatistics, WorkbookStatistics};
use crate::services::cross_analysis::analyzer::{ColumnData, CrossColumnAnalyzer};
use super::inference::{classify, TypeCounts, ValueKind};
use super::sheet::{Sheet, Workbook};
use super::types::{CellValue, ColumnStats, NumericSummary};
use super::utils::percent_of_data_rows;

/// Per-column descriptive statistics. `row_count` is the sheet's row count
/// including the header row; `values` holds one entry per data row.
pub fn build_column_stats(header: &str, values: &[CellValue], row_count: usize) -> ColumnStats {
    let counts = TypeCounts::tally(values);

    let numbers = values
        .iter()
        .filter(|v| classify(v) == Some(ValueKind::Numeric))
        .filter_map(CellValue::as_number);
    let numeric = numbers.fold(None, |summary: Option<NumericSummary>, n| {
        Some(match summary {
            None => NumericSummary { count: 1, sum: n, avg: n, min: n, max: n },
            Some(mut s) => {
                s.count += 1;
                s.sum += n;
                s.min = s.min.min(n);
                s.max = s.max.max(n);
                s
            }
        })
    });
    let numeric = numeric.map(|mut s| {
        s.avg = s.sum / s.count as f64;
        s
    });

    let non_empty_count = counts.non_empty();
    ColumnStats {
        header: header.to_string(),
        data_type: counts.predominant_type(),
        non_empty_count,
        empty_count: counts.empty,
        fill_rate: percent_of_data_rows(non_empty_count, row_count),
        numeric,
    }
}

pub struct ExcelAnalyzer {
    cross: CrossColumnAnalyzer,
    include_cross_column_stats: bool,
}

impl Default for ExcelAnalyzer {
    fn default() -> Self {
        ExcelAnalyzer::new(&Config::default())
    }
}

impl ExcelAnalyzer {
    pub fn new(config: &Config) -> Self {
        Self {
            cross: CrossColumnAnalyzer::from_config(config),
            include_cross_column_stats: config.include_cross_column_stats,
        }
    }

    pub fn analyze_sheet(&self, sheet: &Sheet) -> SheetStatistics {
        let start = std::time::Instant::now();
        let row_count = sheet.row_count();
        tracing::info!(
            "Analyzing sheet {} ({} rows, {} columns)",
            sheet.name(),
            row_count,
            sheet.column_count()
        );

        let columns: Vec<ColumnData> = sheet
            .headers()
            .par_iter()
            .enumerate()
            .map(|(idx, header)| ColumnData::new(header, sheet.column_values(idx)))
            .collect();

        let column_stats: Vec<ColumnStats> = columns
            .par_iter()
            .map(|column| build_column_stats(&column.header, &column.values, row_count))
            .collect();

        for stats in &column_stats {
            tracing::debug!(
                "Column {}: {} ({} filled, {} empty)",
                stats.header,
                stats.data_type,
                stats.non_empty_count,
                stats.empty_count
            );
        }

        let cross_column_stats = if self.include_cross_column_stats {
            self.cross.analyze(&columns, row_count)
        } else {
            Vec::new()
        };

        tracing::info!("Sheet {} analyzed in {:?}", sheet.name(), start.elapsed());

        SheetStatistics {
            name: sheet.name().to_string(),
            row_count,
            column_count: sheet.column_count(),
            columns: column_stats,
            cross_column_stats,
        }
    }

    pub fn analyze_workbook(&self, workbook: &Workbook) -> WorkbookStatistics {
        let start = std::time::Instant::now();
        let sheets = workbook
            .sheets()
            .iter()
            .map(|sheet| self.analyze_sheet(sheet))
            .collect();
        let stats = WorkbookStatistics::from_sheets(sheets);
        tracing::info!("Workbook with {} sheets analyzed in {:?}", stats.sheet_count, start.elapsed());
        stats
    }
}
