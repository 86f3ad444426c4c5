//! Numeric range bucketing for values pulled out of extension payloads.

use crate::series::{ChartPoint, DimensionCount};

/// A half-open range `[lower, upper)` with its display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketRange {
    pub lower: i64,
    pub upper: i64,
    pub label: &'static str,
}

impl BucketRange {
    pub const fn new(lower: i64, upper: i64, label: &'static str) -> Self {
        Self {
            lower,
            upper,
            label,
        }
    }

    pub fn contains(&self, value: i64) -> bool {
        value >= self.lower && value < self.upper
    }
}

/// Ordered ranges plus an unbounded catch-all above the last one.
///
/// Values below the first lower bound, and text that does not parse as a
/// number, match nothing.
#[derive(Debug, Clone, Copy)]
pub struct Bucketer {
    ranges: &'static [BucketRange],
    overflow_label: &'static str,
}

impl Bucketer {
    pub const fn new(ranges: &'static [BucketRange], overflow_label: &'static str) -> Self {
        Self {
            ranges,
            overflow_label,
        }
    }

    /// Labels in declared order, catch-all last.
    pub fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.ranges
            .iter()
            .map(|range| range.label)
            .chain(std::iter::once(self.overflow_label))
    }

    pub fn classify(&self, value: i64) -> Option<&'static str> {
        let (Some(first), Some(last)) = (self.ranges.first(), self.ranges.last()) else {
            return Some(self.overflow_label);
        };

        if value < first.lower {
            return None;
        }
        if value >= last.upper {
            return Some(self.overflow_label);
        }
        self.ranges
            .iter()
            .find(|range| range.contains(value))
            .map(|range| range.label)
    }

    pub fn classify_text(&self, raw: &str) -> Option<&'static str> {
        parse_amount(raw).and_then(|value| self.classify(value))
    }

    /// Fold raw-value counts into bucket counts, in declared range order.
    ///
    /// Every bucket is emitted (zeros included) once at least one value
    /// classifies; if none does the result is empty.
    pub fn tally(&self, rows: &[DimensionCount]) -> Vec<ChartPoint<i64>> {
        let labels: Vec<&'static str> = self.labels().collect();
        let mut totals = vec![0_i64; labels.len()];
        let mut matched = false;

        for row in rows {
            let Some(label) = row.dimension.as_deref().and_then(|raw| self.classify_text(raw))
            else {
                continue;
            };
            if let Some(slot) = labels.iter().position(|l| *l == label) {
                totals[slot] += row.count;
                matched = true;
            }
        }

        if !matched {
            return Vec::new();
        }

        labels
            .into_iter()
            .zip(totals)
            .map(|(label, count)| ChartPoint::new(Some(label.to_string()), count))
            .collect()
    }
}

/// Parse a monetary amount stored as text. Integers parse exactly; decimals
/// are truncated toward zero.
pub fn parse_amount(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }

    let value: f64 = trimmed.parse().ok()?;
    if !value.is_finite() || value.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(value.trunc() as i64)
}
