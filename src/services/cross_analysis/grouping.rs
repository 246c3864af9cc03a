use std::collections::HashMap;
use serde::Serialize;
use crate::services::excel::types::CellValue;
use crate::services::excel::utils::percent_of_data_rows;

pub const MAX_CATEGORIES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStat {
    pub category: String,
    pub count: usize,
    pub percent: f64,
    pub sum: f64,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub variance: f64,
    pub std_dev: f64,
}

#[derive(Debug, Default)]
struct Bucket {
    sum: f64,
    min: f64,
    max: f64,
    values: Vec<f64>,
}

impl Bucket {
    fn push(&mut self, value: f64) {
        if self.values.is_empty() {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.sum += value;
        self.values.push(value);
    }

    fn finish(self, category: String, row_count: usize) -> CategoryStat {
        let count = self.values.len();
        let avg = self.sum / count as f64;
        let variance = if count > 1 {
            self.values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / count as f64
        } else {
            0.0
        };

        CategoryStat {
            category,
            count,
            percent: percent_of_data_rows(count, row_count),
            sum: self.sum,
            avg,
            min: self.min,
            max: self.max,
            variance,
            std_dev: variance.sqrt(),
        }
    }
}

/// Groups numeric target values by the label of the source value on the
/// same row. Rows with an empty label or a non-numeric target are skipped.
/// Returns at most the ten largest categories, largest first; equal counts
/// keep the order in which the categories were first seen.
pub fn group_by_category(
    target: &[CellValue],
    source: &[CellValue],
    row_count: usize,
) -> Vec<CategoryStat> {
    let mut order: Vec<(String, Bucket)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (target_value, source_value) in target.iter().zip(source) {
        let Some(value) = target_value.as_number() else {
            continue;
        };
        let category = source_value.to_label();
        if category.is_empty() {
            continue;
        }

        let slot = match index.get(&category) {
            Some(&slot) => slot,
            None => {
                index.insert(category.clone(), order.len());
                order.push((category, Bucket::default()));
                order.len() - 1
            }
        };
        order[slot].1.push(value);
    }

    let mut stats: Vec<CategoryStat> = order
        .into_iter()
        .map(|(category, bucket)| bucket.finish(category, row_count))
        .collect();

    // stable sort keeps first-seen order among ties
    stats.sort_by(|a, b| b.count.cmp(&a.count));
    stats.truncate(MAX_CATEGORIES);
    stats
}
