//! PostgreSQL query executor with connection pooling

use std::fmt::Debug;

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{Postgres, Row as _};
use tracing::debug;

use crate::domain::table::{
    Condition, ExecuteOutcome, QueryError, QueryExecutor, Row, SqlValue, Statement,
};
use crate::domain::DomainError;

/// SQLSTATE reported for unique constraint violations
const UNIQUE_VIOLATION: &str = "23505";

/// Alias given to the table in `SELECT` statements
const ROW_ALIAS: &str = "t";

/// PostgreSQL connection configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// Idle timeout in seconds
    pub idle_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/user_crud".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    pub fn with_idle_timeout(mut self, secs: u64) -> Self {
        self.idle_timeout_secs = secs;
        self
    }
}

/// SQL text with its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedStatement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Renders a statement as PostgreSQL with `$n` placeholders
///
/// Identifiers are quoted; callers validate them beforehand. Selects return
/// each row as a single JSONB column named `row`.
pub fn render(statement: &Statement) -> RenderedStatement {
    let mut params = Vec::new();

    let sql = match statement {
        Statement::Select {
            table,
            conditions,
            limit,
        } => {
            let mut sql = format!(
                "SELECT to_jsonb({alias}) AS row FROM {} AS {alias}",
                quote(table),
                alias = ROW_ALIAS
            );

            if !conditions.is_empty() {
                let clauses: Vec<String> = conditions
                    .iter()
                    .map(|condition| render_condition(condition, &mut params))
                    .collect();
                sql.push_str(" WHERE ");
                sql.push_str(&clauses.join(" AND "));
            }

            if let Some(limit) = limit {
                sql.push_str(&format!(" LIMIT {}", limit));
            }

            sql
        }
        Statement::Insert {
            table,
            key_column,
            columns,
            rows,
        } => {
            let column_list: Vec<String> = columns.iter().map(|c| quote(c)).collect();
            let tuples: Vec<String> = rows
                .iter()
                .map(|row| {
                    let placeholders: Vec<String> =
                        row.iter().map(|v| bind(&mut params, v.clone())).collect();
                    format!("({})", placeholders.join(", "))
                })
                .collect();

            format!(
                "INSERT INTO {} ({}) VALUES {} RETURNING {}",
                quote(table),
                column_list.join(", "),
                tuples.join(", "),
                quote(key_column)
            )
        }
        Statement::Update {
            table,
            assignments,
            key_column,
            key,
        } => {
            let sets: Vec<String> = assignments
                .iter()
                .map(|(column, value)| {
                    format!("{} = {}", quote(column), bind(&mut params, value.clone()))
                })
                .collect();

            format!(
                "UPDATE {} SET {} WHERE {} = {}",
                quote(table),
                sets.join(", "),
                quote(key_column),
                bind(&mut params, key.clone())
            )
        }
        Statement::Delete {
            table,
            column,
            value,
        } => format!(
            "DELETE FROM {} WHERE {} = {}",
            quote(table),
            quote(column),
            bind(&mut params, value.clone())
        ),
    };

    RenderedStatement { sql, params }
}

fn render_condition(condition: &Condition, params: &mut Vec<SqlValue>) -> String {
    match condition {
        Condition::Equals { column, value } => format!(
            "{}.{} = {}",
            ROW_ALIAS,
            quote(column),
            bind(params, value.clone())
        ),
        // One parameter per slot, referenced twice: shape never depends on the value
        Condition::ContainsOrAny { column, pattern } => {
            let placeholder = bind(params, SqlValue::from(pattern.clone()));
            format!(
                "({p}::text IS NULL OR {}.{} LIKE {p})",
                ROW_ALIAS,
                quote(column),
                p = placeholder
            )
        }
    }
}

fn bind(params: &mut Vec<SqlValue>, value: SqlValue) -> String {
    params.push(value);
    format!("${}", params.len())
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Maps a `<table>_<column>_key` constraint name back to its column
fn column_from_constraint(table: &str, constraint: &str) -> Option<String> {
    constraint
        .strip_prefix(table)?
        .strip_prefix('_')?
        .strip_suffix("_key")
        .filter(|column| !column.is_empty())
        .map(str::to_string)
}

fn classify(error: sqlx::Error, table: &str) -> QueryError {
    match &error {
        sqlx::Error::Database(db) if db.code().is_some_and(|c| c == UNIQUE_VIOLATION) => {
            let column = db
                .constraint()
                .and_then(|constraint| column_from_constraint(table, constraint));
            QueryError::duplicate_key(column, db.message())
        }
        sqlx::Error::PoolTimedOut => QueryError::timeout(error.to_string()),
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolClosed => {
            QueryError::connection(error.to_string())
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            QueryError::decode(error.to_string())
        }
        _ => QueryError::query(error.to_string()),
    }
}

fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &'q [SqlValue],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Integer(v) => query.bind(*v),
            SqlValue::Text(v) => query.bind(v.as_str()),
            SqlValue::Boolean(v) => query.bind(*v),
        };
    }
    query
}

fn decode_row(row: &PgRow) -> Result<Row, QueryError> {
    let value: serde_json::Value = row
        .try_get("row")
        .map_err(|e| QueryError::decode(e.to_string()))?;

    match value {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(QueryError::decode(format!(
            "Expected a JSON object, got {}",
            other
        ))),
    }
}

/// PostgreSQL executor backed by an sqlx connection pool
#[derive(Clone)]
pub struct PostgresExecutor {
    pool: PgPool,
}

impl Debug for PostgresExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresExecutor")
            .field("pool_size", &self.pool.size())
            .finish()
    }
}

impl PostgresExecutor {
    /// Creates an executor over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates an executor with a new connection pool
    pub async fn connect(config: &PostgresConfig) -> Result<Self, DomainError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(std::time::Duration::from_secs(config.idle_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| {
                DomainError::configuration(format!("Failed to connect to PostgreSQL: {}", e))
            })?;

        Ok(Self::new(pool))
    }

    /// Returns a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl QueryExecutor for PostgresExecutor {
    async fn fetch(&self, statement: &Statement) -> Result<Vec<Row>, QueryError> {
        let rendered = render(statement);
        debug!(sql = %rendered.sql, params = rendered.params.len(), "Fetching rows");

        let rows = bind_params(sqlx::query(&rendered.sql), &rendered.params)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| classify(e, statement.table()))?;

        rows.iter().map(decode_row).collect()
    }

    async fn execute(&self, statement: &Statement) -> Result<ExecuteOutcome, QueryError> {
        let rendered = render(statement);
        debug!(sql = %rendered.sql, params = rendered.params.len(), "Executing statement");

        let query = bind_params(sqlx::query(&rendered.sql), &rendered.params);

        match statement {
            Statement::Insert { key_column, .. } => {
                let rows = query
                    .fetch_all(&self.pool)
                    .await
                    .map_err(|e| classify(e, statement.table()))?;

                let insert_id = rows
                    .first()
                    .map(|row| row.try_get::<i64, _>(key_column.as_str()))
                    .transpose()
                    .map_err(|e| QueryError::decode(e.to_string()))?;

                Ok(ExecuteOutcome {
                    affected_rows: rows.len() as u64,
                    insert_id,
                })
            }
            _ => {
                let result = query
                    .execute(&self.pool)
                    .await
                    .map_err(|e| classify(e, statement.table()))?;

                Ok(ExecuteOutcome::affected(result.rows_affected()))
            }
        }
    }
}
