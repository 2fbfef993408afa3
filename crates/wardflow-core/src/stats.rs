//! Aggregate statistics and the flat column-naming scheme shared by the
//! metric tables.

/// A statistic computed over one source field of a grouped table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistic {
    Mean,
    Median,
    Std,
    Count,
}

impl Statistic {
    pub fn suffix(&self) -> &'static str {
        match self {
            Statistic::Mean => "mean",
            Statistic::Median => "median",
            Statistic::Std => "std",
            Statistic::Count => "count",
        }
    }
}

/// Flat output column name for a (source field, statistic) pair, e.g.
/// `ed_wait_time_median`.
pub fn flat_name(field: &str, statistic: Statistic) -> String {
    format!("{}_{}", field, statistic.suffix())
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Sample standard deviation (n - 1 denominator); undefined for fewer than
/// two observations.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let avg = mean(values)?;
    let variance =
        values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Rounding applied to aggregate metrics only; per-record derived fields keep
/// full precision.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
