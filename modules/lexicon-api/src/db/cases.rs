use anyhow::Result;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use lexicon_common::{CaseRecord, ExtensionPayload};
use serde::Serialize;
use sqlx::PgPool;

/// Single-record lookup by id.
#[async_trait]
pub trait CaseLookup: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<CaseRecord>>;
}

#[derive(sqlx::FromRow)]
struct CaseRow {
    id: String,
    subject: String,
    subject_type: i32,
    case_type: i32,
    nation: Option<String>,
    decision_date: Option<NaiveDate>,
    decision_number: Option<String>,
    person_in_charge: Option<String>,
    beneficiary_ownership: Option<String>,
    source: String,
    link: String,
    punishment_duration: Option<String>,
    summary: String,
    extra_data: Option<serde_json::Value>,
}

impl From<CaseRow> for CaseRecord {
    fn from(row: CaseRow) -> Self {
        let extension = row
            .extra_data
            .as_ref()
            .map(ExtensionPayload::from_json)
            .unwrap_or_default();
        CaseRecord {
            id: row.id,
            subject: row.subject,
            subject_type: row.subject_type,
            case_type: row.case_type,
            nation: row.nation,
            decision_date: row.decision_date,
            decision_number: row.decision_number,
            person_in_charge: row.person_in_charge,
            beneficiary_ownership: row.beneficiary_ownership,
            source: row.source,
            link: row.link,
            punishment_duration: row.punishment_duration,
            summary: row.summary,
            extension,
        }
    }
}

pub struct PgCaseLookup {
    pool: PgPool,
}

impl PgCaseLookup {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CaseLookup for PgCaseLookup {
    async fn find_by_id(&self, id: &str) -> Result<Option<CaseRecord>> {
        let row = sqlx::query_as::<_, CaseRow>(
            r#"
            SELECT id, subject, subject_type::int AS subject_type, case_type::int AS case_type,
                   nation, decision_date, decision_number, person_in_charge,
                   beneficiary_ownership, source, link,
                   punishment_duration, summary, extra_data
            FROM cases
            WHERE id = $1
            LIMIT 1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CaseRecord::from))
    }
}

/// Case record as returned by the detail endpoint: raw codes replaced by
/// labels, plus the decision year and a public link.
#[derive(Debug, Serialize)]
pub struct CaseDetail {
    pub id: String,
    pub subject: String,
    pub subject_type: Option<&'static str>,
    pub case_type: Option<&'static str>,
    pub nation: Option<String>,
    pub decision_date: Option<NaiveDate>,
    pub year: Option<i32>,
    pub decision_number: Option<String>,
    pub person_in_charge: Option<String>,
    pub beneficiary_ownership: Option<String>,
    pub source: String,
    pub link: String,
    pub punishment_duration: Option<String>,
    pub summary: String,
    pub extension: ExtensionPayload,
    pub permalink: Option<String>,
}

impl CaseDetail {
    pub fn from_record(record: CaseRecord, base_url: &str) -> Self {
        let permalink =
            (!base_url.is_empty()).then(|| format!("{base_url}/detail/{}", record.id));
        Self {
            subject_type: record.subject_type().map(|t| t.label()),
            case_type: record.case_type().map(|t| t.label()),
            year: record.decision_date.map(|d| d.year()),
            id: record.id,
            subject: record.subject,
            nation: record.nation,
            decision_date: record.decision_date,
            decision_number: record.decision_number,
            person_in_charge: record.person_in_charge,
            beneficiary_ownership: record.beneficiary_ownership,
            source: record.source,
            link: record.link,
            punishment_duration: record.punishment_duration,
            summary: record.summary,
            extension: record.extension,
            permalink,
        }
    }
}

/// Ids are opaque text keys; anything outside this shape never matches a row.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
