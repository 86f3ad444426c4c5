use thiserror::Error;

/// Why a report could not be computed. Any variant means no report at all;
/// a partially computed report is never returned.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to open read snapshot: {0}")]
    Transaction(#[source] anyhow::Error),

    #[error("query for series `{series}` failed: {source}")]
    Query {
        series: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to commit read snapshot: {0}")]
    Commit(#[source] anyhow::Error),
}
