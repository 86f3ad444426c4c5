//! Chart series values and the raw grouped counts they are derived from.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One row of a grouped-count query: a dimension value and how many records
/// carry it. `dimension` is `None` when the grouped value is absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::FromRow)]
pub struct DimensionCount {
    pub dimension: Option<String>,
    pub count: i64,
}

impl DimensionCount {
    pub fn new(dimension: impl Into<String>, count: i64) -> Self {
        Self {
            dimension: Some(dimension.into()),
            count,
        }
    }

    pub fn unnamed(count: i64) -> Self {
        Self {
            dimension: None,
            count,
        }
    }
}

/// A `{name, value}` pair as emitted at the JSON boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint<V> {
    pub name: Option<String>,
    pub value: V,
}

impl<V> ChartPoint<V> {
    pub fn new(name: Option<String>, value: V) -> Self {
        Self { name, value }
    }
}

impl From<DimensionCount> for ChartPoint<i64> {
    fn from(row: DimensionCount) -> Self {
        Self {
            name: row.dimension,
            value: row.count,
        }
    }
}

/// A named series' values. Serializes as a bare JSON array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Series {
    Counts(Vec<ChartPoint<i64>>),
    Percentages(Vec<ChartPoint<f64>>),
}

impl Series {
    pub fn len(&self) -> usize {
        match self {
            Series::Counts(points) => points.len(),
            Series::Percentages(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn counts(&self) -> Option<&[ChartPoint<i64>]> {
        match self {
            Series::Counts(points) => Some(points),
            Series::Percentages(_) => None,
        }
    }

    pub fn percentages(&self) -> Option<&[ChartPoint<f64>]> {
        match self {
            Series::Percentages(points) => Some(points),
            Series::Counts(_) => None,
        }
    }
}

/// Descending count, then name ascending with the unnamed row last.
pub fn by_count_then_name(a: &DimensionCount, b: &DimensionCount) -> Ordering {
    b.count
        .cmp(&a.count)
        .then_with(|| match (&a.dimension, &b.dimension) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

/// Sum rows sharing a dimension, returned in deterministic ranking order.
pub fn merge_counts(rows: impl IntoIterator<Item = DimensionCount>) -> Vec<DimensionCount> {
    let mut totals: BTreeMap<Option<String>, i64> = BTreeMap::new();
    for row in rows {
        *totals.entry(row.dimension).or_insert(0) += row.count;
    }

    let mut merged: Vec<DimensionCount> = totals
        .into_iter()
        .map(|(dimension, count)| DimensionCount { dimension, count })
        .collect();
    merged.sort_by(by_count_then_name);
    merged
}
