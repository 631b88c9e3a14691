//! Postgres-backed implementation of the policy store.
//!
//! # What this module is
//! Implements [`PolicyStore`] on Postgres (via `sqlx`) using the `CasbinRule`
//! table: one row per policy or role-link rule, with a type tag in `PType`
//! and six nullable positional fields `V0`..`V5`.
//!
//! # Key invariants
//! - `Id` is a `SERIAL` identity; rows are never updated in place.
//! - Every value reaches Postgres as a bound parameter. The only SQL text
//!   built at runtime is column names, taken from the fixed [`FIELD_COLUMNS`]
//!   allowlist.
//! - Bulk inserts run in one transaction, so they apply completely or not at
//!   all.
//!
//! # Security notes
//! - Database URLs may contain credentials; they are never logged.
//! - Use a least-privilege DB role and TLS in production.
//!
//! # Operational notes
//! - Migrations are embedded with `sqlx::migrate!("./migrations")` and run at
//!   connect time unless disabled.
//! - Pool sizing and timeouts come from [`PostgresConfig`]; failing fast on
//!   an unreachable database surfaces as [`StoreError::Unavailable`].
use super::{PolicyStore, StoreError, StoreResult};
use crate::config::PostgresConfig;
use crate::filter::RowFilter;
use crate::model::{FIELD_COUNT, PolicyRow};
use anyhow::anyhow;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::str::FromStr;
use std::time::Duration;

/// Quoted column names for the positional fields, indexed by position.
const FIELD_COLUMNS: [&str; FIELD_COUNT] =
    [r#""V0""#, r#""V1""#, r#""V2""#, r#""V3""#, r#""V4""#, r#""V5""#];

const SELECT_ROWS: &str = r#"SELECT "Id" AS id, "PType" AS ptype, "V0" AS v0, "V1" AS v1, "V2" AS v2, "V3" AS v3, "V4" AS v4, "V5" AS v5 FROM "CasbinRule" ORDER BY "Id""#;

const INSERT_PREFIX: &str =
    r#"INSERT INTO "CasbinRule" ("PType", "V0", "V1", "V2", "V3", "V4", "V5") "#;

/// Postgres caps a statement at 65535 bind parameters; each row binds seven.
const INSERT_CHUNK_ROWS: usize = 65535 / (FIELD_COUNT + 1);

/// Durable policy store backed by Postgres.
///
/// # Example
/// ```rust,no_run
/// use policy_store::config::PostgresConfig;
/// use policy_store::store::postgres::PostgresStore;
///
/// async fn open(pg: PostgresConfig) {
///     let _ = PostgresStore::connect(&pg, true).await;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

/// Row shape for the `CasbinRule` table.
///
/// Kept separate from [`PolicyRow`] so column naming stays local to this
/// module.
#[derive(Debug, Clone, FromRow)]
struct DbPolicyRow {
    id: i32,
    ptype: Option<String>,
    v0: Option<String>,
    v1: Option<String>,
    v2: Option<String>,
    v3: Option<String>,
    v4: Option<String>,
    v5: Option<String>,
}

impl From<DbPolicyRow> for PolicyRow {
    fn from(row: DbPolicyRow) -> Self {
        PolicyRow {
            id: Some(row.id),
            ptype: row.ptype,
            fields: [row.v0, row.v1, row.v2, row.v3, row.v4, row.v5],
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if is_constraint_violation(&err) {
            return StoreError::ConstraintViolation(err.to_string());
        }
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
            other => StoreError::Unexpected(anyhow::Error::new(other)),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Unexpected(anyhow::Error::new(err))
    }
}

/// SQLSTATE class 23 covers unique, foreign-key, not-null and check
/// violations.
fn is_constraint_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err
            .code()
            .map(|code| code.starts_with("23"))
            .unwrap_or(false);
    }
    false
}

impl PostgresStore {
    /// Connect to Postgres and, when `run_migrations` is set, apply the
    /// embedded migrations before returning.
    ///
    /// # Errors
    /// - [`StoreError::Unavailable`] when the database cannot be reached within
    ///   the configured connect timeout.
    /// - Migration failures as [`StoreError::Unexpected`].
    pub async fn connect(pg: &PostgresConfig, run_migrations: bool) -> StoreResult<Self> {
        let connect_options = PgConnectOptions::from_str(&pg.url)?;
        let pool = tokio::time::timeout(
            Duration::from_millis(pg.connect_timeout_ms),
            PgPoolOptions::new()
                .max_connections(pg.max_connections)
                .acquire_timeout(Duration::from_millis(pg.acquire_timeout_ms))
                .connect_with(connect_options),
        )
        .await
        .map_err(|_| StoreError::Unavailable("timed out connecting to postgres".to_string()))??;

        if run_migrations {
            sqlx::migrate!("./migrations").run(&pool).await?;
        }
        tracing::debug!(
            max_connections = pg.max_connections,
            run_migrations,
            "postgres policy store connected"
        );
        Ok(Self { pool })
    }

    /// Wrap an existing pool. The schema is assumed to be present.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn push_row(builder: &mut QueryBuilder<'_, Postgres>, row: &PolicyRow) {
    let mut values = builder.separated(", ");
    values.push_bind(row.ptype.clone());
    for field in &row.fields {
        values.push_bind(field.clone());
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &RowFilter) -> StoreResult<()> {
    builder.push(r#" WHERE "PType" = "#);
    builder.push_bind(filter.ptype.clone());
    for constraint in &filter.constraints {
        let column = FIELD_COLUMNS.get(constraint.index).ok_or_else(|| {
            StoreError::Unexpected(anyhow!("field index {} out of range", constraint.index))
        })?;
        builder.push(" AND ");
        builder.push(*column);
        builder.push(" = ");
        builder.push_bind(constraint.value.clone());
    }
    Ok(())
}

#[async_trait]
impl PolicyStore for PostgresStore {
    fn stream_rows(&self) -> BoxStream<'_, StoreResult<PolicyRow>> {
        sqlx::query_as::<_, DbPolicyRow>(SELECT_ROWS)
            .fetch(&self.pool)
            .map_ok(PolicyRow::from)
            .map_err(StoreError::from)
            .boxed()
    }

    async fn insert_rows(&self, rows: Vec<PolicyRow>) -> StoreResult<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for chunk in rows.chunks(INSERT_CHUNK_ROWS) {
            let mut builder = QueryBuilder::<Postgres>::new(INSERT_PREFIX);
            builder.push("VALUES ");
            for (position, row) in chunk.iter().enumerate() {
                if position > 0 {
                    builder.push(", ");
                }
                builder.push("(");
                push_row(&mut builder, row);
                builder.push(")");
            }
            inserted += builder.build().execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;
        Ok(inserted)
    }

    async fn insert_row(&self, row: PolicyRow) -> StoreResult<PolicyRow> {
        let mut builder = QueryBuilder::<Postgres>::new(INSERT_PREFIX);
        builder.push("VALUES (");
        push_row(&mut builder, &row);
        builder.push(r#") RETURNING "Id""#);
        let id: i32 = builder.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(PolicyRow {
            id: Some(id),
            ..row
        })
    }

    async fn delete_matching(&self, filter: &RowFilter) -> StoreResult<u64> {
        let mut builder = QueryBuilder::<Postgres>::new(r#"DELETE FROM "CasbinRule""#);
        push_filter(&mut builder, filter)?;
        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn clear(&self) -> StoreResult<u64> {
        // DELETE rather than TRUNCATE so the identity sequence keeps counting up.
        let result = sqlx::query(r#"DELETE FROM "CasbinRule""#)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
