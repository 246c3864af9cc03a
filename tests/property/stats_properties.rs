use proptest::prelude::*;
use sheet_stats::services::cross_analysis::correlation::{correlate, pearson};
use sheet_stats::services::cross_analysis::grouping::group_by_category;
use sheet_stats::services::cross_analysis::{correlation_matrix, Aggregation};
use sheet_stats::services::excel::analyzer::build_column_stats;
use sheet_stats::services::excel::{CellValue, Sheet};

fn arb_cell() -> impl Strategy<Value = CellValue> {
    prop_oneof![
        (-1.0e6..1.0e6f64).prop_map(CellValue::Number),
        "[a-d]{0,2}".prop_map(CellValue::from),
        Just(CellValue::Empty),
    ]
}

fn arb_numeric_cell() -> impl Strategy<Value = CellValue> {
    prop_oneof![
        4 => (-1.0e3..1.0e3f64).prop_map(CellValue::Number),
        1 => Just(CellValue::Empty),
    ]
}

// ── Column statistics ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn counts_cover_every_data_row(values in prop::collection::vec(arb_cell(), 0..60)) {
        let row_count = values.len() + 1;
        let stats = build_column_stats("col", &values, row_count);
        prop_assert_eq!(stats.non_empty_count + stats.empty_count, row_count - 1);
        prop_assert!(stats.fill_rate >= 0.0 && stats.fill_rate <= 100.0);
    }
}

// ── Correlation ─────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn correlation_is_symmetric_and_bounded(
        pairs in prop::collection::vec((arb_numeric_cell(), arb_numeric_cell()), 0..40)
    ) {
        let (a, b): (Vec<CellValue>, Vec<CellValue>) = pairs.into_iter().unzip();
        let ab = correlate(&a, &b).coefficient;
        let ba = correlate(&b, &a).coefficient;
        prop_assert_eq!(ab, ba);
        prop_assert!((-1.0..=1.0).contains(&ab));
    }

    #[test]
    fn pearson_of_a_series_with_itself_is_one_or_zero(
        xs in prop::collection::vec(-1.0e3..1.0e3f64, 2..30)
    ) {
        let r = pearson(&xs, &xs);
        prop_assert!(r == 0.0 || (r - 1.0).abs() < 1e-9);
    }
}

// ── Category grouping ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn category_counts_bounded_and_sorted(
        rows in prop::collection::vec((arb_numeric_cell(), "[a-l]{0,1}"), 0..80)
    ) {
        let row_count = rows.len() + 1;
        let (target, source): (Vec<CellValue>, Vec<CellValue>) = rows
            .into_iter()
            .map(|(t, s)| (t, CellValue::from(s)))
            .unzip();

        let stats = group_by_category(&target, &source, row_count);
        let total: usize = stats.iter().map(|s| s.count).sum();
        prop_assert!(total <= row_count - 1);
        prop_assert!(stats.len() <= 10);
        prop_assert!(stats.windows(2).all(|w| w[0].count >= w[1].count));
        for s in &stats {
            prop_assert!(s.variance >= 0.0);
            prop_assert!(s.min <= s.avg + 1e-9 && s.avg <= s.max + 1e-9);
        }
    }
}

// ── Correlation matrix ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn matrix_diagonal_and_threshold(
        rows in prop::collection::vec(prop::collection::vec(arb_numeric_cell(), 3), 2..25),
        threshold in 0.0..1.0f64,
    ) {
        let mut sheet_rows = vec![vec![
            CellValue::from("A"),
            CellValue::from("B"),
            CellValue::from("C"),
        ]];
        sheet_rows.extend(rows);
        let sheet = Sheet::from_values("P", sheet_rows);

        let matrix = correlation_matrix(&sheet, &[], threshold).unwrap();
        for (i, row) in matrix.correlations.iter().enumerate() {
            prop_assert_eq!(row.len(), matrix.columns.len());
            for (j, value) in row.iter().enumerate() {
                if i == j {
                    prop_assert_eq!(*value, 1.0);
                } else {
                    prop_assert!(value.abs() >= threshold || *value == 0.0);
                }
            }
        }
    }
}

// ── Pivot aggregation ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn sum_equals_avg_times_count(values in prop::collection::vec(-1.0e4..1.0e4f64, 1..50)) {
        let sum = Aggregation::Sum.apply(&values).unwrap();
        let avg = Aggregation::Avg.apply(&values).unwrap();
        let count = Aggregation::Count.apply(&values).unwrap();
        prop_assert!((sum - avg * count).abs() <= 1e-6 * (1.0 + sum.abs()));
    }

    #[test]
    fn even_median_is_mean_of_central_values(
        mut values in prop::collection::vec(-1.0e4..1.0e4f64, 1..25)
    ) {
        if values.len() % 2 == 1 {
            values.push(0.0);
        }
        let median = Aggregation::Median.apply(&values).unwrap();

        let mut sorted = values.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let mid = sorted.len() / 2;
        prop_assert_eq!(median, (sorted[mid - 1] + sorted[mid]) / 2.0);
    }
}
