//! In-memory record population for tests. No database required.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use lexicon_common::CaseRecord;

use crate::population::{CasePopulation, CaseSnapshot, CoreColumn, GroupQuery};
use crate::series::{merge_counts, DimensionCount};

/// Population backed by a `Vec<CaseRecord>`. `begin()` clones the records,
/// so a snapshot is unaffected by later inserts.
///
/// Failures can be injected on `begin` or on any query target (column or
/// extension field name) to exercise the abort path.
#[derive(Default)]
pub struct MemoryPopulation {
    records: Mutex<Vec<CaseRecord>>,
    fail_begin: bool,
    fail_on: Option<String>,
    stats: Arc<SnapshotStats>,
}

/// How snapshots handed out by a [`MemoryPopulation`] ended.
#[derive(Debug, Default)]
pub struct SnapshotStats {
    pub begun: AtomicUsize,
    pub committed: AtomicUsize,
    pub rolled_back: AtomicUsize,
}

impl MemoryPopulation {
    pub fn new(records: Vec<CaseRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    pub fn failing_on_begin(mut self) -> Self {
        self.fail_begin = true;
        self
    }

    /// Fail any query grouping by `target`.
    pub fn failing_on(mut self, target: impl Into<String>) -> Self {
        self.fail_on = Some(target.into());
        self
    }

    pub fn insert(&self, record: CaseRecord) {
        self.records.lock().unwrap().push(record);
    }

    pub fn stats(&self) -> &SnapshotStats {
        &self.stats
    }

    pub fn committed(&self) -> usize {
        self.stats.committed.load(Ordering::SeqCst)
    }

    pub fn rolled_back(&self) -> usize {
        self.stats.rolled_back.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CasePopulation for MemoryPopulation {
    async fn begin(&self) -> Result<Box<dyn CaseSnapshot>> {
        if self.fail_begin {
            return Err(anyhow!("injected failure opening snapshot"));
        }
        self.stats.begun.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySnapshot {
            records: self.records.lock().unwrap().clone(),
            fail_on: self.fail_on.clone(),
            stats: self.stats.clone(),
            finished: false,
        }))
    }
}

struct MemorySnapshot {
    records: Vec<CaseRecord>,
    fail_on: Option<String>,
    stats: Arc<SnapshotStats>,
    finished: bool,
}

impl MemorySnapshot {
    fn column_value(record: &CaseRecord, column: CoreColumn) -> Option<String> {
        match column {
            CoreColumn::Nation => record.nation.clone(),
            CoreColumn::SubjectType => Some(record.subject_type.to_string()),
            CoreColumn::CaseType => Some(record.case_type.to_string()),
        }
    }
}

#[async_trait]
impl CaseSnapshot for MemorySnapshot {
    async fn group_count(&mut self, query: GroupQuery<'_>) -> Result<Vec<DimensionCount>> {
        if self.fail_on.as_deref() == Some(query.target()) {
            return Err(anyhow!("injected failure grouping by {}", query.target()));
        }

        let rows: Vec<DimensionCount> = match query {
            GroupQuery::Column(column) => self
                .records
                .iter()
                .map(|record| DimensionCount {
                    dimension: Self::column_value(record, column),
                    count: 1,
                })
                .collect(),
            GroupQuery::ExtensionField {
                dataset,
                field,
                exclude,
            } => self
                .records
                .iter()
                .filter_map(|record| record.extension.entry_for(dataset))
                .map(|entry| entry.field(field))
                .filter(|value| !matches!(value, Some(v) if exclude.iter().any(|x| *x == v.as_str())))
                .map(|dimension| DimensionCount {
                    dimension,
                    count: 1,
                })
                .collect(),
        };

        Ok(merge_counts(rows))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let mut this = self;
        this.finished = true;
        this.stats.committed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for MemorySnapshot {
    fn drop(&mut self) {
        if !self.finished {
            self.stats.rolled_back.fetch_add(1, Ordering::SeqCst);
        }
    }
}
