//! Write statements and read queries understood by every [`crate::RowStore`].

use crate::error::StoreError;
use crate::value::{Row, Value};

/// Comparison applied by a [`Filter`].
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    /// Column equals the value (`NULL` matches `NULL`).
    Eq(Value),
    /// Text column contains the needle, ignoring case.
    Contains(String),
}

/// A predicate on one column of the statement's table.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: &'static str,
    pub op: FilterOp,
}

impl Filter {
    pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
        Self {
            column,
            op: FilterOp::Eq(value.into()),
        }
    }

    pub fn contains(column: &'static str, needle: impl Into<String>) -> Self {
        Self {
            column,
            op: FilterOp::Contains(needle.into()),
        }
    }

    /// Returns true if the row satisfies this filter.
    pub fn matches(&self, row: &Row) -> bool {
        let value = row.get(self.column).unwrap_or(&Value::Null);
        match &self.op {
            FilterOp::Eq(expected) => value == expected,
            FilterOp::Contains(needle) => value
                .as_text()
                .is_some_and(|text| text.to_lowercase().contains(&needle.to_lowercase())),
        }
    }
}

/// A single persistence statement.
///
/// Statements never carry free-form SQL: table and column names come from
/// the domain mappers and every value is bound as a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Insert {
        table: &'static str,
        row: Row,
    },
    Update {
        table: &'static str,
        key: Vec<Filter>,
        values: Row,
    },
    Delete {
        table: &'static str,
        key: Vec<Filter>,
        /// When set, the batch fails unless exactly this many rows are deleted.
        expected_rows: Option<u64>,
    },
}

impl Statement {
    pub fn insert(table: &'static str, row: Row) -> Self {
        Statement::Insert { table, row }
    }

    pub fn update(table: &'static str, key: Vec<Filter>, values: Row) -> Self {
        Statement::Update { table, key, values }
    }

    pub fn delete(table: &'static str, key: Vec<Filter>) -> Self {
        Statement::Delete {
            table,
            key,
            expected_rows: None,
        }
    }

    /// Requires a delete to remove exactly `rows` rows.
    pub fn expect_rows(self, rows: u64) -> Self {
        match self {
            Statement::Delete { table, key, .. } => Statement::Delete {
                table,
                key,
                expected_rows: Some(rows),
            },
            other => other,
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            Statement::Insert { table, .. }
            | Statement::Update { table, .. }
            | Statement::Delete { table, .. } => table,
        }
    }

    /// Returns the statement kind, used as a metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            Statement::Insert { .. } => "insert",
            Statement::Update { .. } => "update",
            Statement::Delete { .. } => "delete",
        }
    }
}

/// A left join from the queried table onto a child table.
///
/// The selected child columns are added to each result row and are `NULL`
/// when the parent row has no children.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub table: &'static str,
    pub foreign_key: &'static str,
    pub columns: Vec<&'static str>,
}

impl Join {
    pub fn new(table: &'static str, foreign_key: &'static str, columns: Vec<&'static str>) -> Self {
        Self {
            table,
            foreign_key,
            columns,
        }
    }
}

/// A read against one table, optionally left-joined to child tables.
///
/// Results are grouped by primary key: every row for one parent is
/// returned before any row of the next parent.
#[derive(Debug, Clone, PartialEq)]
pub struct RowQuery {
    pub table: &'static str,
    pub primary_key: &'static str,
    pub filters: Vec<Filter>,
    pub joins: Vec<Join>,
}

impl RowQuery {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            primary_key: "id",
            filters: Vec::new(),
            joins: Vec::new(),
        }
    }

    pub fn primary_key(mut self, column: &'static str) -> Self {
        self.primary_key = column;
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filters(mut self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.filters.extend(filters);
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub fn joins(mut self, joins: impl IntoIterator<Item = Join>) -> Self {
        self.joins.extend(joins);
        self
    }
}

/// Validates a batch before it is executed.
///
/// Updates and deletes must be keyed so a batch can never touch a whole table.
pub fn validate_statements(statements: &[Statement]) -> std::result::Result<(), StoreError> {
    for (index, statement) in statements.iter().enumerate() {
        let reason = match statement {
            Statement::Insert { table, .. } | Statement::Update { table, .. }
                if table.is_empty() =>
            {
                Some("table name is empty")
            }
            Statement::Delete { table, .. } if table.is_empty() => Some("table name is empty"),
            Statement::Insert { row, .. } if row.is_empty() => Some("insert has no columns"),
            Statement::Update { key, .. } if key.is_empty() => Some("update has no key"),
            Statement::Update { values, .. } if values.is_empty() => {
                Some("update has no values")
            }
            Statement::Delete { key, .. } if key.is_empty() => Some("delete has no key"),
            _ => None,
        };

        if let Some(reason) = reason {
            return Err(StoreError::InvalidStatement {
                index,
                reason: reason.to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eq_filter_matches_null_against_missing_column() {
        let row = Row::new().with("title", "Dune");
        assert!(Filter::eq("translator", Value::Null).matches(&row));
        assert!(Filter::eq("title", "Dune").matches(&row));
        assert!(!Filter::eq("title", "Emma").matches(&row));
    }

    #[test]
    fn contains_filter_ignores_case() {
        let row = Row::new().with("title", "The Left Hand of Darkness");
        assert!(Filter::contains("title", "left hand").matches(&row));
        assert!(!Filter::contains("title", "right hand").matches(&row));
    }

    #[test]
    fn expect_rows_only_applies_to_deletes() {
        let delete = Statement::delete("genres", vec![Filter::eq("id", 1)]).expect_rows(1);
        assert!(matches!(
            delete,
            Statement::Delete {
                expected_rows: Some(1),
                ..
            }
        ));

        let insert = Statement::insert("genres", Row::new().with("id", 1)).expect_rows(1);
        assert!(matches!(insert, Statement::Insert { .. }));
    }

    #[test]
    fn validation_rejects_unkeyed_delete() {
        let statements = vec![
            Statement::insert("genres", Row::new().with("name", "Horror")),
            Statement::delete("genres", vec![]),
        ];

        let err = validate_statements(&statements).unwrap_err();
        assert!(matches!(err, StoreError::InvalidStatement { index: 1, .. }));
    }

    #[test]
    fn validation_rejects_empty_update() {
        let statements = vec![Statement::update(
            "genres",
            vec![Filter::eq("id", 1)],
            Row::new(),
        )];
        assert!(validate_statements(&statements).is_err());
    }

    #[test]
    fn validation_accepts_empty_batch() {
        assert!(validate_statements(&[]).is_ok());
    }
}
