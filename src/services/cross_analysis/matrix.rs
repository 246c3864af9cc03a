use rayon::prelude::*;
use serde::Serialize;
use crate::error::AppError;
use crate::services::excel::sheet::Sheet;
use crate::services::excel::types::DataType;
use super::analyzer::ColumnData;
use super::correlation::{numeric_pairs, pearson};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub correlations: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == row)?;
        let j = self.columns.iter().position(|c| c == column)?;
        Some(self.correlations[i][j])
    }
}

/// All-pairs Pearson matrix over the numeric columns of `selected` (every
/// column when empty), in sheet order. Off-diagonal coefficients whose
/// magnitude is below `min_correlation` are reported as 0.
pub fn correlation_matrix(
    sheet: &Sheet,
    selected: &[String],
    min_correlation: f64,
) -> Result<CorrelationMatrix, AppError> {
    let start = std::time::Instant::now();

    for name in selected {
        sheet.column_index(name)?;
    }

    let candidates: Vec<(usize, &String)> = sheet
        .headers()
        .iter()
        .enumerate()
        .filter(|(_, h)| selected.is_empty() || selected.iter().any(|s| s == *h))
        .collect();

    let numeric: Vec<ColumnData> = candidates
        .par_iter()
        .map(|&(idx, header)| ColumnData::new(header, sheet.column_values(idx)))
        .filter(|column| column.data_type == DataType::Numeric)
        .collect();

    let correlations: Vec<Vec<f64>> = (0..numeric.len())
        .into_par_iter()
        .map(|i| {
            (0..numeric.len())
                .map(|j| {
                    if i == j {
                        return 1.0;
                    }
                    let (xs, ys) = numeric_pairs(&numeric[i].values, &numeric[j].values);
                    let r = pearson(&xs, &ys);
                    if r.abs() >= min_correlation {
                        r
                    } else {
                        0.0
                    }
                })
                .collect()
        })
        .collect();

    tracing::info!(
        "Correlation matrix for {} numeric columns of sheet {} built in {:?}",
        numeric.len(),
        sheet.name(),
        start.elapsed()
    );

    Ok(CorrelationMatrix {
        columns: numeric.into_iter().map(|c| c.header).collect(),
        correlations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::excel::types::CellValue;

    fn sheet() -> Sheet {
        let mut rows = vec![vec![
            CellValue::from("A"),
            CellValue::from("B"),
            CellValue::from("Label"),
            CellValue::from("C"),
        ]];
        let data = [
            (1.0, 2.0, "x", 5.0),
            (2.0, 4.0, "y", 1.0),
            (3.0, 6.5, "z", 4.0),
            (4.0, 8.0, "w", 2.0),
            (5.0, 9.5, "v", 3.0),
        ];
        for (a, b, label, c) in data {
            rows.push(vec![a.into(), b.into(), label.into(), c.into()]);
        }
        Sheet::from_values("M", rows)
    }

    #[test]
    fn square_with_unit_diagonal() {
        let matrix = correlation_matrix(&sheet(), &[], 0.0).unwrap();
        assert_eq!(matrix.columns, vec!["A", "B", "C"]);
        assert_eq!(matrix.correlations.len(), 3);
        for (i, row) in matrix.correlations.iter().enumerate() {
            assert_eq!(row.len(), 3);
            assert_eq!(row[i], 1.0);
        }
        assert_eq!(matrix.get("A", "B"), matrix.get("B", "A"));
    }

    #[test]
    fn threshold_zeroes_weak_pairs() {
        let full = correlation_matrix(&sheet(), &[], 0.0).unwrap();
        let ac = full.get("A", "C").unwrap();
        assert!(ac.abs() < 0.9);

        let filtered = correlation_matrix(&sheet(), &[], 0.9).unwrap();
        assert_eq!(filtered.get("A", "C"), Some(0.0));
        assert!(filtered.get("A", "B").unwrap() > 0.9);
        assert_eq!(filtered.get("C", "C"), Some(1.0));
    }

    #[test]
    fn constant_decimal_column_correlates_to_zero() {
        let mut rows = vec![vec![CellValue::from("Qty"), CellValue::from("Price")]];
        for qty in [3.0, 1.0, 4.0, 1.5, 5.0, 9.0, 2.0] {
            rows.push(vec![qty.into(), 0.1.into()]);
        }
        let matrix = correlation_matrix(&Sheet::from_values("Flat", rows), &[], 0.0).unwrap();
        assert_eq!(matrix.correlations, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn subset_drops_non_numeric_columns() {
        let selected = vec!["Label".to_string(), "C".to_string(), "A".to_string()];
        let matrix = correlation_matrix(&sheet(), &selected, 0.0).unwrap();
        assert_eq!(matrix.columns, vec!["A", "C"]);
    }

    #[test]
    fn unknown_subset_column_is_not_found() {
        let selected = vec!["Nope".to_string()];
        assert!(matches!(
            correlation_matrix(&sheet(), &selected, 0.0),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn matrix_serializes_to_columns_and_correlations() {
        let matrix = correlation_matrix(&sheet(), &[], 0.0).unwrap();
        let json = serde_json::to_value(&matrix).unwrap();
        assert_eq!(json["columns"][0], "A");
        assert_eq!(json["correlations"][1][1], 1.0);
    }
}
