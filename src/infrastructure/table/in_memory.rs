//! In-memory query executor

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

use crate::domain::table::{
    Condition, ExecuteOutcome, QueryError, QueryExecutor, Row, SqlValue, Statement,
};

/// Thread-safe in-memory storage engine
///
/// Useful for testing and development. Data is lost when the process
/// terminates. Tables must be registered up front together with their
/// unique columns; keys come from a per-table sequence starting at 1.
#[derive(Debug, Default)]
pub struct InMemoryExecutor {
    tables: RwLock<HashMap<String, MemoryTable>>,
}

#[derive(Debug)]
struct MemoryTable {
    rows: BTreeMap<i64, Row>,
    next_id: i64,
    unique_columns: Vec<String>,
}

impl MemoryTable {
    fn new(unique_columns: &[&str]) -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
            unique_columns: unique_columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Returns the first unique column on which `candidate` collides with a stored row
    fn conflict(&self, candidate: &Row, skip: Option<i64>) -> Option<&str> {
        self.unique_columns.iter().map(String::as_str).find(|column| {
            let Some(value) = candidate.get(*column).filter(|v| !v.is_null()) else {
                return false;
            };

            self.rows
                .iter()
                .filter(|(id, _)| Some(**id) != skip)
                .any(|(_, row)| row.get(*column) == Some(value))
        })
    }
}

impl InMemoryExecutor {
    /// Creates an executor with no tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a table and the columns it keeps unique
    pub fn with_table(mut self, name: impl Into<String>, unique_columns: &[&str]) -> Self {
        self.tables
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), MemoryTable::new(unique_columns));
        self
    }

    fn insert(
        table: &mut MemoryTable,
        key_column: &str,
        columns: &[String],
        rows: &[Vec<SqlValue>],
    ) -> Result<ExecuteOutcome, QueryError> {
        let mut pending: Vec<Row> = Vec::with_capacity(rows.len());

        for values in rows {
            if values.len() != columns.len() {
                return Err(QueryError::query(format!(
                    "INSERT has {} columns but {} values",
                    columns.len(),
                    values.len()
                )));
            }

            let row: Row = columns
                .iter()
                .cloned()
                .zip(values.iter().map(SqlValue::to_json))
                .collect();

            if let Some(column) = table.conflict(&row, None) {
                return Err(duplicate(column));
            }

            // Collisions inside the batch abort it as a whole
            for column in &table.unique_columns {
                let value = row.get(column).filter(|v| !v.is_null());
                if value.is_some() && pending.iter().any(|p| p.get(column) == value) {
                    return Err(duplicate(column));
                }
            }

            pending.push(row);
        }

        let first_id = table.next_id;

        for mut row in pending {
            let id = table.next_id;
            table.next_id += 1;
            row.insert(key_column.to_string(), Value::from(id));
            table.rows.insert(id, row);
        }

        Ok(ExecuteOutcome::inserted(rows.len() as u64, first_id))
    }

    fn update(
        table: &mut MemoryTable,
        assignments: &[(String, SqlValue)],
        key_column: &str,
        key: &SqlValue,
    ) -> Result<ExecuteOutcome, QueryError> {
        let key_predicate = Predicate::Equals {
            column: key_column,
            value: key,
        };

        let targets: Vec<i64> = table
            .rows
            .iter()
            .filter(|(_, row)| key_predicate.matches(row))
            .map(|(id, _)| *id)
            .collect();

        let mut updated = Vec::with_capacity(targets.len());

        for id in &targets {
            let mut row = table.rows.get(id).cloned().unwrap_or_default();

            for (column, value) in assignments {
                row.insert(column.clone(), value.to_json());
            }

            if let Some(column) = table.conflict(&row, Some(*id)) {
                return Err(duplicate(column));
            }

            updated.push((*id, row));
        }

        for (id, row) in updated {
            table.rows.insert(id, row);
        }

        Ok(ExecuteOutcome::affected(targets.len() as u64))
    }

    fn delete(table: &mut MemoryTable, column: &str, value: &SqlValue) -> ExecuteOutcome {
        let predicate = Predicate::Equals { column, value };

        let before = table.rows.len();
        table.rows.retain(|_, row| !predicate.matches(row));

        ExecuteOutcome::affected((before - table.rows.len()) as u64)
    }
}

#[async_trait]
impl QueryExecutor for InMemoryExecutor {
    async fn fetch(&self, statement: &Statement) -> Result<Vec<Row>, QueryError> {
        let Statement::Select {
            table,
            conditions,
            limit,
        } = statement
        else {
            return Err(QueryError::query("Only SELECT statements return rows"));
        };

        let tables = self
            .tables
            .read()
            .map_err(|e| QueryError::query(format!("Failed to acquire read lock: {}", e)))?;

        let table = tables.get(table).ok_or_else(|| missing_table(table))?;
        let limit = limit.map_or(usize::MAX, |l| l as usize);
        let predicates = conditions
            .iter()
            .map(Predicate::compile)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(table
            .rows
            .values()
            .filter(|row| predicates.iter().all(|p| p.matches(row)))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn execute(&self, statement: &Statement) -> Result<ExecuteOutcome, QueryError> {
        if let Statement::Select { .. } = statement {
            let rows = self.fetch(statement).await?;
            return Ok(ExecuteOutcome::affected(rows.len() as u64));
        }

        let mut tables = self
            .tables
            .write()
            .map_err(|e| QueryError::query(format!("Failed to acquire write lock: {}", e)))?;

        let name = statement.table();
        let table = tables.get_mut(name).ok_or_else(|| missing_table(name))?;

        match statement {
            Statement::Insert {
                key_column,
                columns,
                rows,
                ..
            } => Self::insert(table, key_column, columns, rows),
            Statement::Update {
                assignments,
                key_column,
                key,
                ..
            } => Self::update(table, assignments, key_column, key),
            Statement::Delete { column, value, .. } => Ok(Self::delete(table, column, value)),
            Statement::Select { .. } => Ok(ExecuteOutcome::default()),
        }
    }
}

fn missing_table(name: &str) -> QueryError {
    QueryError::query(format!("relation \"{}\" does not exist", name))
}

fn duplicate(column: &str) -> QueryError {
    QueryError::duplicate_key(
        Some(column.to_string()),
        format!("duplicate value violates unique column \"{}\"", column),
    )
}

/// A condition prepared for evaluation against stored rows
enum Predicate<'a> {
    /// SQL equality: NULL never matches
    Equals { column: &'a str, value: &'a SqlValue },
    Like { column: &'a str, pattern: Regex },
    Any,
}

impl<'a> Predicate<'a> {
    fn compile(condition: &'a Condition) -> Result<Self, QueryError> {
        Ok(match condition {
            Condition::Equals { column, value } => Self::Equals { column, value },
            Condition::ContainsOrAny { pattern: None, .. } => Self::Any,
            Condition::ContainsOrAny {
                column,
                pattern: Some(pattern),
            } => Self::Like {
                column,
                pattern: like_regex(pattern)
                    .map_err(|e| QueryError::query(format!("Invalid LIKE pattern: {}", e)))?,
            },
        })
    }

    fn matches(&self, row: &Row) -> bool {
        match self {
            Self::Equals { column, value } => {
                !value.is_null() && row.get(*column) == Some(&value.to_json())
            }
            Self::Like { column, pattern } => row
                .get(*column)
                .and_then(Value::as_str)
                .is_some_and(|text| pattern.is_match(text)),
            Self::Any => true,
        }
    }
}

/// Translate a case-sensitive `LIKE` pattern with `\` as escape into an anchored regex
fn like_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut translated = String::with_capacity(pattern.len() + 8);
    translated.push_str("(?s)^");

    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => translated.push_str(".*"),
            '_' => translated.push('.'),
            '\\' => {
                let literal = chars.next().unwrap_or('\\');
                translated.push_str(&regex::escape(literal.encode_utf8(&mut [0; 4])));
            }
            other => translated.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }

    translated.push('$');
    Regex::new(&translated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn executor() -> InMemoryExecutor {
        InMemoryExecutor::new().with_table("user", &["email"])
    }

    fn insert(names_emails: &[(&str, &str)]) -> Statement {
        Statement::Insert {
            table: "user".to_string(),
            key_column: "id".to_string(),
            columns: vec!["name".to_string(), "email".to_string()],
            rows: names_emails
                .iter()
                .map(|(n, e)| vec![SqlValue::from(*n), SqlValue::from(*e)])
                .collect(),
        }
    }

    fn select_all() -> Statement {
        Statement::Select {
            table: "user".to_string(),
            conditions: vec![],
            limit: None,
        }
    }

    fn like_matches(pattern: &str, text: &str) -> bool {
        like_regex(pattern).unwrap().is_match(text)
    }

    #[test]
    fn test_like_matches() {
        assert!(like_matches("%ann%", "Joanna"));
        assert!(!like_matches("%ann%", "ANNE"));
        assert!(like_matches("a_c", "abc"));
        assert!(!like_matches("a_c", "ac"));
        assert!(like_matches("%", ""));
        assert!(like_matches("%50\\%%", "save 50% now"));
        assert!(!like_matches("%50\\%%", "save 50 now"));
        assert!(like_matches("%a\\_b%", "xa_by"));
        assert!(!like_matches("%a\\_b%", "xacby"));
    }

    #[test]
    fn test_like_treats_regex_syntax_literally() {
        assert!(like_matches("a.c", "a.c"));
        assert!(!like_matches("a.c", "abc"));
        assert!(like_matches("%(x)+[y]%", "pre (x)+[y] post"));
        assert!(like_matches("%a\\\\b%", "a\\b"));
        assert!(like_matches("%line%", "first\nline"));
        assert!(like_matches("trail\\", "trail\\"));
    }

    #[tokio::test]
    async fn test_fetch_filters_by_like_pattern() {
        let executor = executor();
        executor
            .execute(&insert(&[("Joanna", "j@x"), ("ANNE", "a@x"), ("J.nna", "d@x")]))
            .await
            .unwrap();

        let statement = Statement::Select {
            table: "user".to_string(),
            conditions: vec![
                Condition::ContainsOrAny {
                    column: "name".to_string(),
                    pattern: Some("%J.nn%".to_string()),
                },
                Condition::ContainsOrAny {
                    column: "email".to_string(),
                    pattern: None,
                },
            ],
            limit: None,
        };

        let rows = executor.fetch(&statement).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name"), Some(&json!("J.nna")));
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let executor = executor();

        let outcome = executor
            .execute(&insert(&[("A", "a@x"), ("B", "b@x")]))
            .await
            .unwrap();
        assert_eq!(outcome, ExecuteOutcome::inserted(2, 1));

        let outcome = executor.execute(&insert(&[("C", "c@x")])).await.unwrap();
        assert_eq!(outcome.insert_id, Some(3));

        let rows = executor.fetch(&select_all()).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get("id"), Some(&json!(1)));
        assert_eq!(rows[2].get("name"), Some(&json!("C")));
    }

    #[tokio::test]
    async fn test_duplicate_inside_batch_aborts_batch() {
        let executor = executor();

        let error = executor
            .execute(&insert(&[("A", "a@x"), ("B", "a@x")]))
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            QueryError::DuplicateKey { column: Some(ref c), .. } if c == "email"
        ));
        assert!(executor.fetch(&select_all()).await.unwrap().is_empty());

        // Sequence is not consumed by a failed batch
        let outcome = executor.execute(&insert(&[("A", "a@x")])).await.unwrap();
        assert_eq!(outcome.insert_id, Some(1));
    }

    #[tokio::test]
    async fn test_update_checks_uniqueness_against_other_rows() {
        let executor = executor();
        executor
            .execute(&insert(&[("A", "a@x"), ("B", "b@x")]))
            .await
            .unwrap();

        let same_email = Statement::Update {
            table: "user".to_string(),
            assignments: vec![
                ("name".to_string(), SqlValue::from("A2")),
                ("email".to_string(), SqlValue::from("a@x")),
            ],
            key_column: "id".to_string(),
            key: SqlValue::Integer(1),
        };
        assert_eq!(
            executor.execute(&same_email).await.unwrap(),
            ExecuteOutcome::affected(1)
        );

        let steal_email = Statement::Update {
            table: "user".to_string(),
            assignments: vec![("email".to_string(), SqlValue::from("a@x"))],
            key_column: "id".to_string(),
            key: SqlValue::Integer(2),
        };
        assert!(executor
            .execute(&steal_email)
            .await
            .unwrap_err()
            .is_duplicate_key());
    }

    #[tokio::test]
    async fn test_delete_counts_removed_rows() {
        let executor = executor();
        executor.execute(&insert(&[("A", "a@x")])).await.unwrap();

        let delete = |id: i64| Statement::Delete {
            table: "user".to_string(),
            column: "id".to_string(),
            value: SqlValue::Integer(id),
        };

        assert_eq!(executor.execute(&delete(5)).await.unwrap().affected_rows, 0);
        assert_eq!(executor.execute(&delete(1)).await.unwrap().affected_rows, 1);
    }

    #[tokio::test]
    async fn test_select_with_limit_and_conditions() {
        let executor = executor();
        executor
            .execute(&insert(&[("Ann", "1@x"), ("Annie", "2@x"), ("Bob", "3@x")]))
            .await
            .unwrap();

        let statement = Statement::Select {
            table: "user".to_string(),
            conditions: vec![
                Condition::ContainsOrAny {
                    column: "name".to_string(),
                    pattern: Some("%Ann%".to_string()),
                },
                Condition::ContainsOrAny {
                    column: "email".to_string(),
                    pattern: None,
                },
            ],
            limit: Some(1),
        };

        let rows = executor.fetch(&statement).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name"), Some(&json!("Ann")));
    }

    #[tokio::test]
    async fn test_unknown_table() {
        let executor = InMemoryExecutor::new();

        let error = executor.fetch(&select_all()).await.unwrap_err();
        assert!(matches!(error, QueryError::Query { .. }));
    }

    #[tokio::test]
    async fn test_fetch_rejects_writes() {
        let executor = executor();
        assert!(executor.fetch(&insert(&[("A", "a@x")])).await.is_err());
    }
}
