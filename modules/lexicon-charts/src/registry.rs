//! The series registry: which series each report carries, where each
//! series' raw counts come from, and how they are derived.
//!
//! This is the one place report shape is declared. Bump [`SCHEMA_VERSION`]
//! whenever a key, a series list or a derivation changes.

use crate::bucket::{BucketRange, Bucketer};
use crate::percent::PercentOrder;
use crate::population::{CoreColumn, GroupQuery};
use crate::rank::{TopN, OTHER};

pub const SCHEMA_VERSION: u16 = 1;

/// Dataset marker of the procurement-blacklist extension entries.
pub const LKPP_DATASET: &str = "LKPP";

/// Province values that stand for "unknown" in source data.
pub const PLACEHOLDER_VALUES: &[&str] = &["", "-"];

const CEILING_RANGES: &[BucketRange] = &[
    BucketRange::new(0, 2_500_000_000, "0 - 2.5 B"),
    BucketRange::new(2_500_000_000, 15_000_000_000, "2.5 B - 15 B"),
    BucketRange::new(15_000_000_000, 50_000_000_000, "15 B - 50 B"),
    BucketRange::new(50_000_000_000, 100_000_000_000, "50 B - 100 B"),
];

pub const CEILING_BUCKETS: Bucketer = Bucketer::new(CEILING_RANGES, "> 100 B");
pub const TOP_REPORTERS: TopN = TopN::truncate(10);
pub const TOP_VIOLATIONS: TopN = TopN::with_overflow(5, OTHER);

/// Which report is being computed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReportKind {
    /// Whole-population breakdown over core record columns.
    General,
    /// Breakdown of records whose extension payload carries this marker.
    Dataset(String),
}

impl ReportKind {
    pub fn dataset(marker: impl Into<String>) -> Self {
        ReportKind::Dataset(marker.into())
    }

    pub fn series(&self) -> &'static [SeriesId] {
        match self {
            ReportKind::General => GENERAL_SERIES,
            ReportKind::Dataset(_) => DATASET_SERIES,
        }
    }

    pub fn marker(&self) -> Option<&str> {
        match self {
            ReportKind::General => None,
            ReportKind::Dataset(marker) => Some(marker),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReportKind::General => "general",
            ReportKind::Dataset(_) => "dataset",
        }
    }
}

const GENERAL_SERIES: &[SeriesId] = &[
    SeriesId::Countries,
    SeriesId::SubjectTypes,
    SeriesId::CaseTypes,
];

const DATASET_SERIES: &[SeriesId] = &[
    SeriesId::BlacklistProvince,
    SeriesId::CeilingDistribution,
    SeriesId::TopTenReporter,
    SeriesId::ScenarioDistribution,
    SeriesId::ViolationDistribution,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesId {
    Countries,
    SubjectTypes,
    CaseTypes,
    BlacklistProvince,
    CeilingDistribution,
    TopTenReporter,
    ScenarioDistribution,
    ViolationDistribution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Count,
    Percent,
}

impl SeriesId {
    /// JSON field name of this series in its report.
    pub fn key(self) -> &'static str {
        match self {
            SeriesId::Countries => "countries",
            SeriesId::SubjectTypes => "subject_types",
            SeriesId::CaseTypes => "case_types",
            SeriesId::BlacklistProvince => "blacklist_province",
            SeriesId::CeilingDistribution => "ceiling_distribution",
            SeriesId::TopTenReporter => "top_ten_reporter",
            SeriesId::ScenarioDistribution => "scenario_distribution",
            SeriesId::ViolationDistribution => "violation_distribution",
        }
    }

    pub fn value_kind(self) -> ValueKind {
        self.plan().derivation.value_kind()
    }

    pub fn plan(self) -> SeriesPlan {
        match self {
            SeriesId::Countries => SeriesPlan::column(CoreColumn::Nation, Derivation::Counts),
            SeriesId::SubjectTypes => SeriesPlan::column(
                CoreColumn::SubjectType,
                Derivation::CodeLabels(CodeTable::SubjectType),
            ),
            SeriesId::CaseTypes => SeriesPlan::column(
                CoreColumn::CaseType,
                Derivation::CodeLabels(CodeTable::CaseType),
            ),
            SeriesId::BlacklistProvince => SeriesPlan::extension_excluding(
                "province",
                PLACEHOLDER_VALUES,
                Derivation::Counts,
            ),
            SeriesId::CeilingDistribution => {
                SeriesPlan::extension("ceiling", Derivation::Buckets(CEILING_BUCKETS))
            }
            SeriesId::TopTenReporter => {
                SeriesPlan::extension("institution_area", Derivation::Ranked(TOP_REPORTERS))
            }
            SeriesId::ScenarioDistribution => SeriesPlan::extension(
                "scenario",
                Derivation::Percentages(PercentOrder::Descending),
            ),
            SeriesId::ViolationDistribution => SeriesPlan::extension(
                "rule",
                Derivation::RankedPercentages(TOP_VIOLATIONS, PercentOrder::PinnedLast(OTHER)),
            ),
        }
    }
}

impl std::fmt::Display for SeriesId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Where a series' raw grouped counts come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Column(CoreColumn),
    Extension {
        field: &'static str,
        exclude: &'static [&'static str],
    },
}

impl Source {
    pub fn query<'a>(&self, marker: &'a str) -> GroupQuery<'a> {
        match *self {
            Source::Column(column) => GroupQuery::Column(column),
            Source::Extension { field, exclude } => GroupQuery::ExtensionField {
                dataset: marker,
                field,
                exclude,
            },
        }
    }

    pub fn is_extension(&self) -> bool {
        matches!(self, Source::Extension { .. })
    }
}

/// Integer-code columns with fixed display labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeTable {
    SubjectType,
    CaseType,
}

impl CodeTable {
    pub fn label(self, code: i64) -> Option<&'static str> {
        match self {
            CodeTable::SubjectType => {
                lexicon_common::SubjectType::from_code(code).map(|t| t.label())
            }
            CodeTable::CaseType => lexicon_common::CaseType::from_code(code).map(|t| t.label()),
        }
    }
}

/// How raw counts become the emitted series.
#[derive(Debug, Clone, Copy)]
pub enum Derivation {
    Counts,
    CodeLabels(CodeTable),
    Buckets(Bucketer),
    Ranked(TopN),
    Percentages(PercentOrder),
    RankedPercentages(TopN, PercentOrder),
}

impl Derivation {
    pub fn value_kind(&self) -> ValueKind {
        match self {
            Derivation::Percentages(_) | Derivation::RankedPercentages(..) => ValueKind::Percent,
            Derivation::Counts
            | Derivation::CodeLabels(_)
            | Derivation::Buckets(_)
            | Derivation::Ranked(_) => ValueKind::Count,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SeriesPlan {
    pub source: Source,
    pub derivation: Derivation,
}

impl SeriesPlan {
    const fn column(column: CoreColumn, derivation: Derivation) -> Self {
        Self {
            source: Source::Column(column),
            derivation,
        }
    }

    const fn extension(field: &'static str, derivation: Derivation) -> Self {
        Self::extension_excluding(field, &[], derivation)
    }

    const fn extension_excluding(
        field: &'static str,
        exclude: &'static [&'static str],
        derivation: Derivation,
    ) -> Self {
        Self {
            source: Source::Extension { field, exclude },
            derivation,
        }
    }
}
