use serde::Serialize;
use crate::services::excel::types::CellValue;

/// Scatter points carried along for charting.
pub const MAX_SAMPLE_PAIRS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CorrelationStrength {
    #[serde(rename = "negligible")]
    Negligible,
    #[serde(rename = "weak")]
    Weak,
    #[serde(rename = "moderate")]
    Moderate,
    #[serde(rename = "strong")]
    Strong,
    #[serde(rename = "very strong")]
    VeryStrong,
}

impl CorrelationStrength {
    pub fn from_coefficient(coefficient: f64) -> Self {
        let abs = coefficient.abs();
        if abs < 0.1 {
            CorrelationStrength::Negligible
        } else if abs < 0.3 {
            CorrelationStrength::Weak
        } else if abs < 0.5 {
            CorrelationStrength::Moderate
        } else if abs < 0.7 {
            CorrelationStrength::Strong
        } else {
            CorrelationStrength::VeryStrong
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CorrelationStrength::Negligible => "negligible",
            CorrelationStrength::Weak => "weak",
            CorrelationStrength::Moderate => "moderate",
            CorrelationStrength::Strong => "strong",
            CorrelationStrength::VeryStrong => "very strong",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SamplePair {
    /// Source value.
    pub x: f64,
    /// Target value.
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationResult {
    pub coefficient: f64,
    pub strength: CorrelationStrength,
    pub sample_count: usize,
    pub sample_pairs: Vec<SamplePair>,
}

/// Pearson's r. Fewer than two points, mismatched lengths or a constant
/// series all give 0.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len();
    if n < 2 || n != y.len() || is_constant(x) || is_constant(y) {
        return 0.0;
    }

    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;

    let (sum_xy, sum_x2, sum_y2) = x.iter().zip(y).fold(
        (0.0, 0.0, 0.0),
        |(xy, x2, y2), (xi, yi)| {
            let dx = xi - mean_x;
            let dy = yi - mean_y;
            (xy + dx * dy, x2 + dx * dx, y2 + dy * dy)
        },
    );

    if sum_x2 == 0.0 || sum_y2 == 0.0 {
        return 0.0;
    }

    let r = sum_xy / (sum_x2 * sum_y2).sqrt();
    // keep rounding noise inside [-1, 1]
    r.clamp(-1.0, 1.0)
}

// exact comparison: the mean of a repeated decimal is inexact
fn is_constant(values: &[f64]) -> bool {
    values.iter().all(|v| *v == values[0])
}

/// Rows where both series hold a number, in row order.
pub fn numeric_pairs(a: &[CellValue], b: &[CellValue]) -> (Vec<f64>, Vec<f64>) {
    a.iter()
        .zip(b)
        .filter_map(|(va, vb)| Some((va.as_number()?, vb.as_number()?)))
        .unzip()
}

/// Correlates a numeric target against a numeric source over the rows
/// where both are numeric.
pub fn correlate(target: &[CellValue], source: &[CellValue]) -> CorrelationResult {
    let (ys, xs) = numeric_pairs(target, source);
    let coefficient = pearson(&ys, &xs);

    let sample_pairs = xs
        .iter()
        .zip(&ys)
        .take(MAX_SAMPLE_PAIRS)
        .map(|(x, y)| SamplePair { x: *x, y: *y })
        .collect();

    CorrelationResult {
        coefficient,
        strength: CorrelationStrength::from_coefficient(coefficient),
        sample_count: xs.len(),
        sample_pairs,
    }
}
