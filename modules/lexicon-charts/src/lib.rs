//! Analytics aggregation engine for the compliance-record registry.
//!
//! Derives a fixed set of named chart series from one read snapshot of the
//! record population: grouped counts, numeric range buckets, top-N rankings
//! with an overflow bucket, and percentage distributions.
//!
//! The set of series per report is declared once in [`registry`]; a
//! [`Report`] can only be built from that declaration.

pub mod aggregator;
pub mod bucket;
pub mod error;
pub mod percent;
pub mod population;
pub mod postgres;
pub mod rank;
pub mod registry;
pub mod report;
pub mod series;

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

pub use aggregator::ChartAggregator;
pub use bucket::{BucketRange, Bucketer};
pub use error::ReportError;
pub use percent::{normalize, PercentOrder};
pub use population::{CasePopulation, CaseSnapshot, CoreColumn, GroupQuery};
pub use postgres::PgPopulation;
pub use rank::{Overflow, TopN};
pub use registry::{ReportKind, SeriesId, ValueKind, LKPP_DATASET, SCHEMA_VERSION};
pub use report::Report;
pub use series::{ChartPoint, DimensionCount, Series};

#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryPopulation;
