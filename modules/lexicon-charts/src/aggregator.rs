//! Chart series aggregator: one read snapshot, N grouped queries, one report.

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::error::ReportError;
use crate::percent::normalize;
use crate::population::{CasePopulation, CaseSnapshot};
use crate::registry::{Derivation, ReportKind, SeriesId, SeriesPlan};
use crate::report::Report;
use crate::series::{merge_counts, ChartPoint, DimensionCount, Series};

/// Computes reports from an injected record population.
///
/// Holds no state between calls; concurrent reports each take their own
/// snapshot.
pub struct ChartAggregator<P> {
    population: P,
}

impl<P: CasePopulation> ChartAggregator<P> {
    pub fn new(population: P) -> Self {
        Self { population }
    }

    pub fn population(&self) -> &P {
        &self.population
    }

    /// Breakdown of every record by nation, subject type and case type.
    pub async fn general_report(&self) -> Result<Report, ReportError> {
        self.compute(ReportKind::General).await
    }

    /// Breakdown of records carrying an extension entry of type `marker`.
    /// An unknown marker yields a report with every series empty.
    pub async fn dataset_report(&self, marker: &str) -> Result<Report, ReportError> {
        self.compute(ReportKind::dataset(marker)).await
    }

    pub async fn compute(&self, kind: ReportKind) -> Result<Report, ReportError> {
        info!(report = kind.name(), dataset = kind.marker(), "Computing chart report");

        let mut snapshot = self.population.begin().await.map_err(|e| {
            warn!(report = kind.name(), error = %e, "Failed to open read snapshot");
            ReportError::Transaction(e)
        })?;

        let marker = kind.marker().unwrap_or_default().to_string();
        let mut report = Report::empty(kind);

        let series_ids = report.kind().series();
        for &id in series_ids {
            // Returning early drops the snapshot, which rolls it back.
            let series = compute_series(snapshot.as_mut(), id, &marker)
                .await
                .map_err(|source| {
                    warn!(series = %id, error = %source, "Series query failed, aborting report");
                    ReportError::Query {
                        series: id.key(),
                        source,
                    }
                })?;
            debug!(series = %id, points = series.len(), "Series computed");
            report.set(id, series);
        }

        snapshot.commit().await.map_err(|e| {
            warn!(error = %e, "Failed to commit read snapshot");
            ReportError::Commit(e)
        })?;

        info!(
            report = report.kind().name(),
            series = report.kind().series().len(),
            "Chart report computed"
        );
        Ok(report)
    }
}

async fn compute_series(
    snapshot: &mut dyn CaseSnapshot,
    id: SeriesId,
    marker: &str,
) -> Result<Series> {
    let plan = id.plan();
    let rows = snapshot.group_count(plan.source.query(marker)).await?;
    Ok(derive_series(&plan, rows))
}

/// Apply a plan's derivation to raw grouped counts.
///
/// Extension-sourced rows without a value are dropped first: a record
/// missing the field takes no part in that series.
pub fn derive_series(plan: &SeriesPlan, mut rows: Vec<DimensionCount>) -> Series {
    if plan.source.is_extension() {
        rows.retain(|row| row.dimension.is_some());
    }

    match plan.derivation {
        Derivation::Counts => Series::Counts(into_points(merge_counts(rows))),
        Derivation::CodeLabels(table) => {
            let labelled = rows.into_iter().map(|row| DimensionCount {
                dimension: row
                    .dimension
                    .as_deref()
                    .and_then(|raw| raw.trim().parse::<i64>().ok())
                    .and_then(|code| table.label(code))
                    .map(str::to_string),
                count: row.count,
            });
            Series::Counts(into_points(merge_counts(labelled)))
        }
        Derivation::Buckets(bucketer) => Series::Counts(bucketer.tally(&rows)),
        Derivation::Ranked(top) => Series::Counts(into_points(top.apply(rows))),
        Derivation::Percentages(order) => Series::Percentages(normalize(&merge_counts(rows), order)),
        Derivation::RankedPercentages(top, order) => {
            Series::Percentages(normalize(&top.apply(rows), order))
        }
    }
}

fn into_points(rows: Vec<DimensionCount>) -> Vec<ChartPoint<i64>> {
    rows.into_iter().map(ChartPoint::from).collect()
}
