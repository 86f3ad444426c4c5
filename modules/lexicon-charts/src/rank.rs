//! Top-N ranking with an optional overflow bucket.

use crate::series::{merge_counts, DimensionCount};

/// Label of the synthetic overflow dimension.
pub const OTHER: &str = "Other";

/// What happens to the dimensions ranked below the cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    /// Drop them.
    Truncate,
    /// Sum them into one row with this label.
    Collapse(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopN {
    pub k: usize,
    pub overflow: Overflow,
}

impl TopN {
    pub const fn truncate(k: usize) -> Self {
        Self {
            k,
            overflow: Overflow::Truncate,
        }
    }

    pub const fn with_overflow(k: usize, label: &'static str) -> Self {
        Self {
            k,
            overflow: Overflow::Collapse(label),
        }
    }

    /// Rank by descending count (ties by name, unnamed last) and keep the
    /// top `k`. The overflow row is only appended when at least one
    /// dimension fell below the cutoff. A kept dimension that already
    /// carries the overflow label absorbs the tail instead, so the label
    /// appears at most once.
    pub fn apply(&self, rows: impl IntoIterator<Item = DimensionCount>) -> Vec<DimensionCount> {
        let mut ranked = merge_counts(rows);
        if ranked.len() <= self.k {
            return ranked;
        }

        let rest = ranked.split_off(self.k);
        if let Overflow::Collapse(label) = self.overflow {
            let total: i64 = rest.iter().map(|row| row.count).sum();
            match ranked
                .iter()
                .position(|row| row.dimension.as_deref() == Some(label))
            {
                Some(existing) => ranked[existing].count += total,
                None => ranked.push(DimensionCount::new(label, total)),
            }
        }
        ranked
    }
}
