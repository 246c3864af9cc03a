use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use smallvec::SmallVec;
use crate::error::AppError;
use crate::services::excel::sheet::Sheet;

type BucketValues = SmallVec<[f64; 8]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Sum,
    Avg,
    Count,
    Min,
    Max,
    Median,
}

impl Aggregation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Sum => "sum",
            Aggregation::Avg => "avg",
            Aggregation::Count => "count",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
            Aggregation::Median => "median",
        }
    }

    /// Aggregate of one bucket; `None` only for an empty bucket.
    pub fn apply(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let count = values.len() as f64;
        let value = match self {
            Aggregation::Sum => values.iter().sum(),
            Aggregation::Avg => values.iter().sum::<f64>() / count,
            Aggregation::Count => count,
            Aggregation::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Aggregation::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Aggregation::Median => {
                let mut sorted = values.to_vec();
                sorted.sort_by(|a, b| a.total_cmp(b));
                let middle = sorted.len() / 2;
                if sorted.len() % 2 == 0 {
                    (sorted[middle - 1] + sorted[middle]) / 2.0
                } else {
                    sorted[middle]
                }
            }
        };
        Some(value)
    }
}

impl FromStr for Aggregation {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sum" => Ok(Aggregation::Sum),
            "avg" | "average" | "mean" => Ok(Aggregation::Avg),
            "count" => Ok(Aggregation::Count),
            "min" => Ok(Aggregation::Min),
            "max" => Ok(Aggregation::Max),
            "median" => Ok(Aggregation::Median),
            other => Err(AppError::InvalidAggregation(format!(
                "'{}' (expected one of sum, avg, count, min, max, median)",
                other
            ))),
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotRequest {
    pub row_column: String,
    pub column_column: String,
    pub value_column: String,
    pub aggregation: Aggregation,
}

impl PivotRequest {
    pub fn new(row_column: &str, column_column: &str, value_column: &str, aggregation: Aggregation) -> Self {
        PivotRequest {
            row_column: row_column.to_string(),
            column_column: column_column.to_string(),
            value_column: value_column.to_string(),
            aggregation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotSummary {
    pub aggregation: Aggregation,
    pub row_column: String,
    pub column_column: String,
    pub value_column: String,
}

/// Dense grid over sorted row × column labels. `None` marks a cell no row
/// contributed to.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    pub cells: Vec<Vec<Option<f64>>>,
    pub summary: PivotSummary,
}

impl PivotTable {
    pub fn value(&self, row_label: &str, col_label: &str) -> Option<f64> {
        let i = self.row_labels.iter().position(|l| l == row_label)?;
        let j = self.col_labels.iter().position(|l| l == col_label)?;
        self.cells[i][j]
    }
}

pub fn pivot_table(sheet: &Sheet, request: &PivotRequest) -> Result<PivotTable, AppError> {
    let start = std::time::Instant::now();
    let row_idx = sheet.column_index(&request.row_column)?;
    let col_idx = sheet.column_index(&request.column_column)?;
    let value_idx = sheet.column_index(&request.value_column)?;

    let row_values = sheet.column_values(row_idx);
    let col_values = sheet.column_values(col_idx);
    let values = sheet.column_values(value_idx);

    let mut buckets: HashMap<(String, String), BucketValues> = HashMap::new();
    let mut row_labels = BTreeSet::new();
    let mut col_labels = BTreeSet::new();

    for ((row_value, col_value), value) in row_values.iter().zip(&col_values).zip(&values) {
        if row_value.is_empty() || col_value.is_empty() || value.is_empty() {
            continue;
        }
        let Some(number) = value.as_number() else {
            continue;
        };

        let row_label = row_value.to_label();
        let col_label = col_value.to_label();
        row_labels.insert(row_label.clone());
        col_labels.insert(col_label.clone());
        buckets.entry((row_label, col_label)).or_default().push(number);
    }

    let row_labels: Vec<String> = row_labels.into_iter().collect();
    let col_labels: Vec<String> = col_labels.into_iter().collect();

    let cells = row_labels
        .iter()
        .map(|row_label| {
            col_labels
                .iter()
                .map(|col_label| {
                    buckets
                        .get(&(row_label.clone(), col_label.clone()))
                        .and_then(|bucket| request.aggregation.apply(bucket))
                })
                .collect()
        })
        .collect();

    tracing::info!(
        "Pivot {} x {} of {} ({}) built in {:?}",
        row_labels.len(),
        col_labels.len(),
        request.value_column,
        request.aggregation,
        start.elapsed()
    );

    Ok(PivotTable {
        row_labels,
        col_labels,
        cells,
        summary: PivotSummary {
            aggregation: request.aggregation,
            row_column: request.row_column.clone(),
            column_column: request.column_column.clone(),
            value_column: request.value_column.clone(),
        },
    })
}

const ROW_LABEL_KEY: &str = "row_label";

struct PivotRow<'a> {
    label: &'a str,
    col_labels: &'a [String],
    values: &'a [Option<f64>],
}

impl Serialize for PivotRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Keys must stay unique: a column labelled `row_label` is left out of
        // the row object and is only reachable through `col_labels` and `cells`.
        let entries: Vec<(&String, &Option<f64>)> = self
            .col_labels
            .iter()
            .zip(self.values)
            .filter(|(label, _)| label.as_str() != ROW_LABEL_KEY)
            .collect();

        let mut map = serializer.serialize_map(Some(entries.len() + 1))?;
        map.serialize_entry(ROW_LABEL_KEY, self.label)?;
        for (label, value) in entries {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

impl Serialize for PivotTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let data: Vec<PivotRow<'_>> = self
            .row_labels
            .iter()
            .zip(&self.cells)
            .map(|(label, values)| PivotRow {
                label,
                col_labels: &self.col_labels,
                values,
            })
            .collect();

        let mut state = serializer.serialize_struct("PivotTable", 4)?;
        state.serialize_field("row_labels", &self.row_labels)?;
        state.serialize_field("col_labels", &self.col_labels)?;
        state.serialize_field("data", &data)?;
        state.serialize_field("summary", &self.summary)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::excel::types::{Cell, CellValue};
    use serde_json::json;

    fn sheet() -> Sheet {
        Sheet::from_values(
            "Sales",
            vec![
                vec!["Region".into(), "Month".into(), "Sales".into()],
                vec!["A".into(), "Jan".into(), 10.0.into()],
                vec!["A".into(), "Feb".into(), 20.0.into()],
                vec!["B".into(), "Jan".into(), 30.0.into()],
            ],
        )
    }

    #[test]
    fn sum_pivot_with_missing_cell() {
        let request = PivotRequest::new("Region", "Month", "Sales", Aggregation::Sum);
        let table = pivot_table(&sheet(), &request).unwrap();

        assert_eq!(table.row_labels, vec!["A", "B"]);
        assert_eq!(table.col_labels, vec!["Feb", "Jan"]);
        assert_eq!(table.value("A", "Feb"), Some(20.0));
        assert_eq!(table.value("A", "Jan"), Some(10.0));
        assert_eq!(table.value("B", "Feb"), None);
        assert_eq!(table.value("B", "Jan"), Some(30.0));

        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(
            json["data"],
            json!([
                {"row_label": "A", "Feb": 20.0, "Jan": 10.0},
                {"row_label": "B", "Feb": null, "Jan": 30.0}
            ])
        );
        assert_eq!(json["summary"]["aggregation"], "sum");
        assert_eq!(json["summary"]["column_column"], "Month");
    }

    #[test]
    fn column_named_row_label_does_not_shadow_the_row_label() {
        let sheet = Sheet::from_values(
            "Clash",
            vec![
                vec!["Region".into(), "Kind".into(), "Sales".into()],
                vec!["A".into(), "row_label".into(), 5.0.into()],
                vec!["A".into(), "other".into(), 7.0.into()],
            ],
        );
        let request = PivotRequest::new("Region", "Kind", "Sales", Aggregation::Sum);
        let table = pivot_table(&sheet, &request).unwrap();
        assert_eq!(table.col_labels, vec!["other", "row_label"]);
        assert_eq!(table.value("A", "row_label"), Some(5.0));

        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json.matches("\"row_label\":").count(), 1);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["data"], json!([{"row_label": "A", "other": 7.0}]));
        assert_eq!(value["col_labels"], json!(["other", "row_label"]));
    }

    #[test]
    fn aggregations() {
        let values = [4.0, 1.0, 3.0, 2.0];
        assert_eq!(Aggregation::Sum.apply(&values), Some(10.0));
        assert_eq!(Aggregation::Avg.apply(&values), Some(2.5));
        assert_eq!(Aggregation::Count.apply(&values), Some(4.0));
        assert_eq!(Aggregation::Min.apply(&values), Some(1.0));
        assert_eq!(Aggregation::Max.apply(&values), Some(4.0));
        assert_eq!(Aggregation::Median.apply(&values), Some(2.5));
        assert_eq!(Aggregation::Median.apply(&[5.0, 1.0, 3.0]), Some(3.0));
        assert_eq!(Aggregation::Sum.apply(&[]), None);
    }

    #[test]
    fn parse_aggregation() {
        assert_eq!("SUM".parse::<Aggregation>().unwrap(), Aggregation::Sum);
        assert_eq!("mean".parse::<Aggregation>().unwrap(), Aggregation::Avg);
        assert!(matches!(
            "mode".parse::<Aggregation>(),
            Err(AppError::InvalidAggregation(_))
        ));
    }

    #[test]
    fn missing_column_fails_fast() {
        let request = PivotRequest::new("Region", "Quarter", "Sales", Aggregation::Sum);
        assert!(matches!(pivot_table(&sheet(), &request), Err(AppError::NotFound(_))));
    }

    #[test]
    fn skips_empty_and_non_numeric_rows() {
        let sheet = Sheet::new(
            "Mixed",
            vec!["R".into(), "C".into(), "V".into()],
            vec![
                vec![CellValue::from("x").into(), CellValue::from("y").into(), CellValue::from("n/a").into()],
                vec![CellValue::Empty.into(), CellValue::from("y").into(), CellValue::Number(1.0).into()],
                vec![
                    CellValue::from("x").into(),
                    CellValue::from("y").into(),
                    Cell::Formula {
                        expression: "=2+3".to_string(),
                        calculated: Some(CellValue::Number(5.0)),
                    },
                ],
            ],
        );
        let request = PivotRequest::new("R", "C", "V", Aggregation::Count);
        let table = pivot_table(&sheet, &request).unwrap();
        assert_eq!(table.row_labels, vec!["x"]);
        assert_eq!(table.value("x", "y"), Some(1.0));
    }

    #[test]
    fn header_only_sheet_yields_empty_labels() {
        let sheet = Sheet::from_values("Empty", vec![vec!["R".into(), "C".into(), "V".into()]]);
        let request = PivotRequest::new("R", "C", "V", Aggregation::Sum);
        let table = pivot_table(&sheet, &request).unwrap();
        assert!(table.row_labels.is_empty());
        assert!(table.col_labels.is_empty());
        assert!(table.cells.is_empty());
    }
}
