//! Postgres-backed record population.
//!
//! Each snapshot is a `REPEATABLE READ, READ ONLY` transaction, so every
//! grouped query in one report sees the same committed state.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::population::{CasePopulation, CaseSnapshot, CoreColumn, GroupQuery};
use crate::series::DimensionCount;

const NATION_SQL: &str = r#"
    SELECT c.nation AS dimension, COUNT(*) AS count
    FROM cases c
    GROUP BY c.nation
"#;

const SUBJECT_TYPE_SQL: &str = r#"
    SELECT c.subject_type::text AS dimension, COUNT(*) AS count
    FROM cases c
    GROUP BY c.subject_type
"#;

const CASE_TYPE_SQL: &str = r#"
    SELECT c.case_type::text AS dimension, COUNT(*) AS count
    FROM cases c
    GROUP BY c.case_type
"#;

// $1 dataset marker, $2 data field, $3 excluded values.
// The first entry of the matching type wins; a non-array payload has none.
const EXTENSION_FIELD_SQL: &str = r#"
    SELECT
        e.entry -> 'data' ->> $2 AS dimension,
        COUNT(*) AS count
    FROM cases c
    CROSS JOIN LATERAL (
        SELECT x.entry
        FROM jsonb_array_elements(
            CASE WHEN jsonb_typeof(c.extra_data) = 'array' THEN c.extra_data ELSE '[]'::jsonb END
        ) WITH ORDINALITY AS x(entry, ord)
        WHERE x.entry ->> 'type' = $1
        ORDER BY x.ord
        LIMIT 1
    ) e
    WHERE NOT COALESCE(e.entry -> 'data' ->> $2 = ANY($3), false)
    GROUP BY 1
"#;

fn column_sql(column: CoreColumn) -> &'static str {
    match column {
        CoreColumn::Nation => NATION_SQL,
        CoreColumn::SubjectType => SUBJECT_TYPE_SQL,
        CoreColumn::CaseType => CASE_TYPE_SQL,
    }
}

/// The `cases` table in Postgres.
#[derive(Clone)]
pub struct PgPopulation {
    pool: PgPool,
}

impl PgPopulation {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CasePopulation for PgPopulation {
    async fn begin(&self) -> Result<Box<dyn CaseSnapshot>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;
        Ok(Box::new(PgSnapshot { tx }))
    }
}

struct PgSnapshot {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CaseSnapshot for PgSnapshot {
    async fn group_count(&mut self, query: GroupQuery<'_>) -> Result<Vec<DimensionCount>> {
        let rows = match query {
            GroupQuery::Column(column) => {
                sqlx::query_as::<_, DimensionCount>(column_sql(column))
                    .fetch_all(&mut *self.tx)
                    .await?
            }
            GroupQuery::ExtensionField {
                dataset,
                field,
                exclude,
            } => {
                let exclude: Vec<String> = exclude.iter().map(|v| v.to_string()).collect();
                sqlx::query_as::<_, DimensionCount>(EXTENSION_FIELD_SQL)
                    .bind(dataset)
                    .bind(field)
                    .bind(exclude)
                    .fetch_all(&mut *self.tx)
                    .await?
            }
        };
        Ok(rows)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
