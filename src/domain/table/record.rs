//! Record traits for table-bound types

use std::fmt::Debug;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use super::statement::SqlValue;

/// A stored row, keyed by column name
pub type Row = Map<String, Value>;

/// Trait for types persisted as rows of a single table
///
/// The key column is assigned by storage on insert. A record whose
/// [`id`](TableRecord::id) is `None`, zero or negative has not been persisted
/// yet.
pub trait TableRecord: Clone + Debug + Send + Sync + Serialize + DeserializeOwned {
    /// Singular label used in caller-facing messages, e.g. `user`
    const LABEL: &'static str;

    /// Storage-assigned key column
    const KEY_COLUMN: &'static str = "id";

    /// Writable columns, excluding the key, in bind order
    fn columns() -> &'static [&'static str];

    /// Returns the persisted key, if any. Keys are strictly positive.
    fn id(&self) -> Option<i64>;

    /// Values for [`columns`](TableRecord::columns), in the same order
    fn values(&self) -> Vec<SqlValue>;

    /// Builds a record from a fetched row
    fn from_row(row: Row) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Tag {
        #[serde(default)]
        id: Option<i64>,
        label: String,
    }

    impl TableRecord for Tag {
        const LABEL: &'static str = "tag";

        fn columns() -> &'static [&'static str] {
            &["label"]
        }

        fn id(&self) -> Option<i64> {
            self.id
        }

        fn values(&self) -> Vec<SqlValue> {
            vec![SqlValue::from(self.label.as_str())]
        }
    }

    #[test]
    fn test_default_key_column() {
        assert_eq!(Tag::KEY_COLUMN, "id");
    }

    #[test]
    fn test_from_row() {
        let mut row = Row::new();
        row.insert("id".to_string(), Value::from(4));
        row.insert("label".to_string(), Value::from("rust"));

        let tag = Tag::from_row(row).unwrap();
        assert_eq!(
            tag,
            Tag {
                id: Some(4),
                label: "rust".to_string()
            }
        );
    }

    #[test]
    fn test_from_row_missing_column() {
        let mut row = Row::new();
        row.insert("id".to_string(), Value::from(4));

        assert!(Tag::from_row(row).is_err());
    }
}
