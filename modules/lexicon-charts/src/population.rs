//! The record population seam: the read snapshot a report is computed from.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::series::DimensionCount;

/// Core record columns a general report groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoreColumn {
    Nation,
    /// Integer code, grouped raw; labels are applied by the caller.
    SubjectType,
    /// Integer code, grouped raw; labels are applied by the caller.
    CaseType,
}

impl CoreColumn {
    pub fn name(self) -> &'static str {
        match self {
            CoreColumn::Nation => "nation",
            CoreColumn::SubjectType => "subject_type",
            CoreColumn::CaseType => "case_type",
        }
    }
}

/// One grouped-count query against the population.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupQuery<'a> {
    /// `(column value as text, record count)` over every record.
    Column(CoreColumn),
    /// `(data[field] as text, record count)` over records whose payload has
    /// an entry of type `dataset`, using the first such entry. Rows whose
    /// value is in `exclude` are dropped. A missing field groups as `None`.
    ExtensionField {
        dataset: &'a str,
        field: &'a str,
        exclude: &'a [&'a str],
    },
}

impl GroupQuery<'_> {
    /// Column or field name this query groups by.
    pub fn target(&self) -> &str {
        match self {
            GroupQuery::Column(column) => column.name(),
            GroupQuery::ExtensionField { field, .. } => *field,
        }
    }
}

/// A consistent read view of the population. Every query issued through
/// one snapshot observes the same data.
///
/// Dropping a snapshot without calling [`CaseSnapshot::commit`] rolls it back.
#[async_trait]
pub trait CaseSnapshot: Send {
    async fn group_count(&mut self, query: GroupQuery<'_>) -> Result<Vec<DimensionCount>>;

    async fn commit(self: Box<Self>) -> Result<()>;
}

/// Source of read snapshots.
///
/// Implemented by `PgPopulation` (postgres) and `MemoryPopulation` (tests).
/// Also implemented for `Arc<P>` so one population can back many callers.
#[async_trait]
pub trait CasePopulation: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn CaseSnapshot>>;
}

#[async_trait]
impl<P: CasePopulation + ?Sized> CasePopulation for Arc<P> {
    async fn begin(&self) -> Result<Box<dyn CaseSnapshot>> {
        (**self).begin().await
    }
}
