//! Percentage normalization of grouped counts.

use crate::series::{ChartPoint, DimensionCount};

/// Ordering applied after normalization. Sorting is stable, so equal
/// percentages keep their input order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PercentOrder {
    Input,
    Descending,
    /// Descending, with the named dimension always last.
    PinnedLast(&'static str),
}

/// Convert counts to percentages of the grand total, one decimal place.
/// A zero total yields an empty series.
pub fn normalize(rows: &[DimensionCount], order: PercentOrder) -> Vec<ChartPoint<f64>> {
    let total: i64 = rows.iter().map(|row| row.count).sum();
    if total <= 0 {
        return Vec::new();
    }

    let mut points: Vec<ChartPoint<f64>> = rows
        .iter()
        .map(|row| {
            ChartPoint::new(
                row.dimension.clone(),
                round_one_decimal(row.count as f64 * 100.0 / total as f64),
            )
        })
        .collect();

    match order {
        PercentOrder::Input => {}
        PercentOrder::Descending => points.sort_by(|a, b| b.value.total_cmp(&a.value)),
        PercentOrder::PinnedLast(label) => points.sort_by(|a, b| {
            let pinned_a = a.name.as_deref() == Some(label);
            let pinned_b = b.name.as_deref() == Some(label);
            pinned_a
                .cmp(&pinned_b)
                .then_with(|| b.value.total_cmp(&a.value))
        }),
    }

    points
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
