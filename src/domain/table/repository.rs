//! Generic single-table access

use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::DomainError;

use super::executor::{ExecuteOutcome, QueryError, QueryExecutor};
use super::record::{Row, TableRecord};
use super::statement::{contains_pattern, validate_identifier, Condition, SqlValue, Statement};

/// Substring predicates combined with `AND`
///
/// A column whose value is `None` matches every row. Every slot is always
/// sent to storage, so the statement shape depends only on which columns
/// are named, never on which values are present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    predicates: Vec<(String, Option<String>)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a predicate on `column`; `None` leaves the column unfiltered
    pub fn with(mut self, column: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        self.predicates.push((column.into(), value.map(Into::into)));
        self
    }

    pub fn predicates(&self) -> &[(String, Option<String>)] {
        &self.predicates
    }

    fn conditions(&self) -> Vec<Condition> {
        self.predicates
            .iter()
            .map(|(column, value)| Condition::ContainsOrAny {
                column: column.clone(),
                pattern: value.as_deref().map(contains_pattern),
            })
            .collect()
    }
}

/// Access to one table through a shared [`QueryExecutor`]
///
/// Holds no per-request state; clone it freely across requests. Every
/// operation issues exactly one statement. Duplicate-key failures are
/// reclassified as bad requests; every other executor failure is returned
/// unchanged as [`DomainError::Storage`].
pub struct Table<E>
where
    E: TableRecord,
{
    name: String,
    executor: Arc<dyn QueryExecutor>,
    _phantom: PhantomData<E>,
}

impl<E> Clone for Table<E>
where
    E: TableRecord,
{
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            executor: Arc::clone(&self.executor),
            _phantom: PhantomData,
        }
    }
}

impl<E> Debug for Table<E>
where
    E: TableRecord,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("record", &E::LABEL)
            .finish()
    }
}

impl<E> Table<E>
where
    E: TableRecord,
{
    /// Binds a table name to an executor
    pub fn new(
        name: impl Into<String>,
        executor: Arc<dyn QueryExecutor>,
    ) -> Result<Self, DomainError> {
        let name = name.into();

        std::iter::once(name.as_str())
            .chain(std::iter::once(E::KEY_COLUMN))
            .chain(E::columns().iter().copied())
            .try_for_each(validate_identifier)
            .map_err(|e| DomainError::configuration(e.to_string()))?;

        Ok(Self {
            name,
            executor,
            _phantom: PhantomData,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the first record where `column = value`, or `None`
    pub async fn find(
        &self,
        column: &str,
        value: impl Into<SqlValue>,
    ) -> Result<Option<E>, DomainError> {
        let value = self.require_value(column, value.into())?;
        debug!(table = %self.name, column, "Finding record");

        let statement = Statement::Select {
            table: self.name.clone(),
            conditions: vec![Condition::Equals {
                column: column.to_string(),
                value,
            }],
            limit: Some(1),
        };

        let rows = self.fetch(&statement).await?;
        rows.into_iter().next().map(decode::<E>).transpose()
    }

    /// Inserts or updates depending on whether the record has an id
    ///
    /// A missing or non-positive id inserts. Returns the new id on insert and
    /// the same id on update. `None` means the update matched no row; whether
    /// that is an error is up to the caller.
    pub async fn save(&self, record: &E) -> Result<Option<i64>, DomainError> {
        let Some(id) = record.id().filter(|id| *id > 0) else {
            return self.insert(std::slice::from_ref(record)).await.map(Some);
        };

        debug!(table = %self.name, id, "Updating record");

        let assignments = E::columns()
            .iter()
            .map(|column| column.to_string())
            .zip(record.values())
            .collect();

        let statement = Statement::Update {
            table: self.name.clone(),
            assignments,
            key_column: E::KEY_COLUMN.to_string(),
            key: SqlValue::Integer(id),
        };

        let outcome = self.execute(&statement).await?;
        Ok((outcome.affected_rows > 0).then_some(id))
    }

    /// Inserts all records in one statement and returns the id of the first
    ///
    /// Ids carried by the records are ignored; storage assigns them.
    pub async fn insert(&self, records: &[E]) -> Result<i64, DomainError> {
        if records.is_empty() {
            return Err(DomainError::bad_request(format!(
                "At least one {} is required",
                E::LABEL
            )));
        }

        debug!(table = %self.name, count = records.len(), "Inserting records");

        let statement = Statement::Insert {
            table: self.name.clone(),
            key_column: E::KEY_COLUMN.to_string(),
            columns: E::columns().iter().map(|c| c.to_string()).collect(),
            rows: records.iter().map(TableRecord::values).collect(),
        };

        let outcome = self.execute(&statement).await?;

        outcome.insert_id.ok_or_else(|| {
            DomainError::internal(format!(
                "Storage did not report an id for the inserted {}",
                E::LABEL
            ))
        })
    }

    /// Deletes rows where `column = value`; returns whether any row was removed
    pub async fn remove(
        &self,
        column: &str,
        value: impl Into<SqlValue>,
    ) -> Result<bool, DomainError> {
        let value = self.require_value(column, value.into())?;
        debug!(table = %self.name, column, "Removing records");

        let statement = Statement::Delete {
            table: self.name.clone(),
            column: column.to_string(),
            value,
        };

        let outcome = self.execute(&statement).await?;
        Ok(outcome.affected_rows > 0)
    }

    /// Returns every record matching all predicates, in storage order
    pub async fn filter(&self, filter: &Filter) -> Result<Vec<E>, DomainError> {
        debug!(table = %self.name, predicates = filter.predicates().len(), "Filtering records");

        let statement = Statement::Select {
            table: self.name.clone(),
            conditions: filter.conditions(),
            limit: None,
        };

        self.fetch(&statement)
            .await?
            .into_iter()
            .map(decode::<E>)
            .collect()
    }

    fn require_value(&self, column: &str, value: SqlValue) -> Result<SqlValue, DomainError> {
        if value.is_null() {
            return Err(DomainError::bad_request(format!(
                "A value for '{}' is required",
                column
            )));
        }
        Ok(value)
    }

    async fn fetch(&self, statement: &Statement) -> Result<Vec<Row>, DomainError> {
        statement
            .validate()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        self.executor
            .fetch(statement)
            .await
            .map_err(|e| self.translate(e))
    }

    async fn execute(&self, statement: &Statement) -> Result<ExecuteOutcome, DomainError> {
        statement
            .validate()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        self.executor
            .execute(statement)
            .await
            .map_err(|e| self.translate(e))
    }

    fn translate(&self, error: QueryError) -> DomainError {
        match error {
            QueryError::DuplicateKey { column, message } => {
                warn!(table = %self.name, column = ?column, detail = %message, "Duplicate key rejected");

                let field = column.as_deref().unwrap_or("unique value");
                DomainError::bad_request(format!(
                    "A {} with the same {} already exists",
                    E::LABEL,
                    field
                ))
            }
            other => DomainError::Storage(other),
        }
    }
}

fn decode<E: TableRecord>(row: Row) -> Result<E, DomainError> {
    E::from_row(row).map_err(|e| DomainError::Storage(QueryError::decode(e.to_string())))
}
