//! Typed statements issued against a single table
//!
//! Every statement has a fixed shape. Identifiers are validated before a
//! statement reaches an executor and values are always bound, never
//! interpolated.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

/// Table and column names: letters, digits and underscores, not starting with a digit
static IDENTIFIER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Errors raised when a table binding or statement names an unusable identifier
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TableDefinitionError {
    #[error("Invalid identifier '{0}'. Only letters, digits and underscores are allowed")]
    InvalidIdentifier(String),
}

/// Validate a table or column name
pub fn validate_identifier(name: &str) -> Result<(), TableDefinitionError> {
    if IDENTIFIER_PATTERN.is_match(name) {
        Ok(())
    } else {
        Err(TableDefinitionError::InvalidIdentifier(name.to_string()))
    }
}

/// Wrap a literal value into a `LIKE` pattern matching it as a substring
///
/// `%`, `_` and `\` inside the value are escaped with `\`.
pub fn contains_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');

    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }

    pattern.push('%');
    pattern
}

/// A bound parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Text(String),
    Boolean(bool),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// JSON form of the value, matching how rows are represented
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Integer(v) => Value::from(*v),
            Self::Text(v) => Value::from(v.as_str()),
            Self::Boolean(v) => Value::from(*v),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A single `WHERE` clause slot
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column = value`
    Equals { column: String, value: SqlValue },
    /// `(pattern IS NULL OR column LIKE pattern)`: a missing pattern matches every row
    ContainsOrAny {
        column: String,
        pattern: Option<String>,
    },
}

impl Condition {
    pub fn column(&self) -> &str {
        match self {
            Self::Equals { column, .. } | Self::ContainsOrAny { column, .. } => column,
        }
    }
}

/// One round trip against one table
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Conditions are combined with `AND`
    Select {
        table: String,
        conditions: Vec<Condition>,
        limit: Option<u32>,
    },
    /// Multi-row insert reporting the key of the first row
    Insert {
        table: String,
        key_column: String,
        columns: Vec<String>,
        rows: Vec<Vec<SqlValue>>,
    },
    Update {
        table: String,
        assignments: Vec<(String, SqlValue)>,
        key_column: String,
        key: SqlValue,
    },
    Delete {
        table: String,
        column: String,
        value: SqlValue,
    },
}

impl Statement {
    pub fn table(&self) -> &str {
        match self {
            Self::Select { table, .. }
            | Self::Insert { table, .. }
            | Self::Update { table, .. }
            | Self::Delete { table, .. } => table,
        }
    }

    /// Checks every identifier the statement names
    pub fn validate(&self) -> Result<(), TableDefinitionError> {
        validate_identifier(self.table())?;

        match self {
            Self::Select { conditions, .. } => conditions
                .iter()
                .try_for_each(|c| validate_identifier(c.column())),
            Self::Insert {
                key_column,
                columns,
                ..
            } => {
                validate_identifier(key_column)?;
                columns.iter().try_for_each(|c| validate_identifier(c))
            }
            Self::Update {
                assignments,
                key_column,
                ..
            } => {
                validate_identifier(key_column)?;
                assignments
                    .iter()
                    .try_for_each(|(c, _)| validate_identifier(c))
            }
            Self::Delete { column, .. } => validate_identifier(column),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("user").is_ok());
        assert!(validate_identifier("_audit_log2").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("2users").is_err());
        assert!(validate_identifier("user; DROP TABLE user").is_err());
        assert!(validate_identifier("na\"me").is_err());
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("ann"), "%ann%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
        assert_eq!(contains_pattern(""), "%%");
    }

    #[test]
    fn test_sql_value_conversions() {
        assert_eq!(SqlValue::from(7i64), SqlValue::Integer(7));
        assert_eq!(SqlValue::from(7i32), SqlValue::Integer(7));
        assert_eq!(SqlValue::from("x"), SqlValue::Text("x".to_string()));
        assert_eq!(SqlValue::from(None::<String>), SqlValue::Null);
        assert_eq!(SqlValue::from(Some(3i64)), SqlValue::Integer(3));
        assert!(SqlValue::Null.is_null());
        assert_eq!(SqlValue::Integer(1).to_json(), serde_json::json!(1));
    }

    #[test]
    fn test_statement_validate_rejects_bad_column() {
        let statement = Statement::Select {
            table: "user".to_string(),
            conditions: vec![Condition::Equals {
                column: "id = 1 OR 1".to_string(),
                value: SqlValue::Integer(1),
            }],
            limit: Some(1),
        };

        assert_eq!(
            statement.validate(),
            Err(TableDefinitionError::InvalidIdentifier(
                "id = 1 OR 1".to_string()
            ))
        );
    }

    #[test]
    fn test_statement_validate_accepts_well_formed() {
        let statement = Statement::Update {
            table: "user".to_string(),
            assignments: vec![("name".to_string(), SqlValue::from("Ana"))],
            key_column: "id".to_string(),
            key: SqlValue::Integer(1),
        };

        assert!(statement.validate().is_ok());
        assert_eq!(statement.table(), "user");
    }
}
