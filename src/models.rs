use serde::{Serialize, Serializer};
use crate::services::cross_analysis::analyzer::CrossColumnStat;
use crate::services::excel::types::{ColumnStats, DataType};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetStatistics {
    pub name: String,
    pub row_count: usize,
    pub column_count: usize,
    /// Serialized as `{header: stats}` in column order.
    #[serde(serialize_with = "columns_by_header")]
    pub columns: Vec<ColumnStats>,
    pub cross_column_stats: Vec<CrossColumnStat>,
}

impl SheetStatistics {
    pub fn column(&self, header: &str) -> Option<&ColumnStats> {
        self.columns.iter().find(|c| c.header == header)
    }

    pub fn find_cross_stat(&self, target: &str, source: &str) -> Option<&CrossColumnStat> {
        self.cross_column_stats
            .iter()
            .find(|s| s.target_column == target && s.source_column == source)
    }

    pub fn column_listing(&self) -> ColumnListing {
        let mut listing = ColumnListing::default();
        for column in &self.columns {
            match column.data_type {
                DataType::Numeric => listing.numeric.push(NumericColumnEntry {
                    name: column.header.clone(),
                    data_type: column.data_type,
                    stats: column.numeric.as_ref().map(|n| NumericRange {
                        min: n.min,
                        max: n.max,
                        avg: n.avg,
                    }),
                }),
                DataType::Text => listing.categorical.push(ColumnEntry::from(column)),
                DataType::Date => listing.date.push(ColumnEntry::from(column)),
                DataType::Mixed => listing.other.push(ColumnEntry::from(column)),
            }
        }
        listing
    }
}

fn columns_by_header<S: Serializer>(columns: &[ColumnStats], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_map(columns.iter().map(|c| (&c.header, c)))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkbookStatistics {
    pub sheet_count: usize,
    pub total_rows: usize,
    pub total_columns: usize,
    #[serde(serialize_with = "sheets_by_name")]
    pub sheets: Vec<SheetStatistics>,
}

impl WorkbookStatistics {
    pub fn from_sheets(sheets: Vec<SheetStatistics>) -> Self {
        WorkbookStatistics {
            sheet_count: sheets.len(),
            total_rows: sheets.iter().map(|s| s.row_count).sum(),
            total_columns: sheets.iter().map(|s| s.column_count).sum(),
            sheets,
        }
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetStatistics> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

fn sheets_by_name<S: Serializer>(sheets: &[SheetStatistics], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_map(sheets.iter().map(|s| (&s.name, s)))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericColumnEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
    pub stats: Option<NumericRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
    pub fill_rate: f64,
}

impl From<&ColumnStats> for ColumnEntry {
    fn from(column: &ColumnStats) -> Self {
        ColumnEntry {
            name: column.header.clone(),
            data_type: column.data_type,
            fill_rate: column.fill_rate,
        }
    }
}

/// Columns of one sheet grouped by inferred type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnListing {
    pub numeric: Vec<NumericColumnEntry>,
    pub categorical: Vec<ColumnEntry>,
    pub date: Vec<ColumnEntry>,
    pub other: Vec<ColumnEntry>,
}
