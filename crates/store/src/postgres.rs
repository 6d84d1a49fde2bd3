use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row as _};

use crate::{
    Filter, FilterOp, Result, Row, RowQuery, Statement, StoreError, Value, store::RowStore,
    validate_statements,
};

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// PostgreSQL-backed row store implementation.
#[derive(Clone)]
pub struct PostgresRowStore {
    pool: PgPool,
}

impl PostgresRowStore {
    /// Creates a new PostgreSQL row store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_from_pg(row: PgRow) -> Result<Row> {
        let json: serde_json::Value = row.try_get("row")?;
        Ok(Row::from_json(json)?)
    }
}

/// Incrementally renders SQL with `$n` placeholders.
///
/// `NULL` is rendered inline so no untyped parameter is ever bound.
#[derive(Default)]
struct SqlBuilder<'a> {
    sql: String,
    params: Vec<&'a Value>,
}

impl<'a> SqlBuilder<'a> {
    fn push(&mut self, fragment: &str) {
        self.sql.push_str(fragment);
    }

    fn push_value(&mut self, value: &'a Value) {
        if value.is_null() {
            self.sql.push_str("NULL");
        } else {
            self.params.push(value);
            self.sql.push_str(&format!("${}", self.params.len()));
        }
    }

    fn push_filters(&mut self, alias: Option<&str>, filters: &'a [Filter], needles: &'a [Value]) {
        let prefix = alias.map(|a| format!("{a}.")).unwrap_or_default();
        let mut needles = needles.iter();

        for (position, filter) in filters.iter().enumerate() {
            self.push(if position == 0 { " WHERE " } else { " AND " });
            match &filter.op {
                FilterOp::Eq(value) if value.is_null() => {
                    self.push(&format!("{prefix}{} IS NULL", filter.column));
                }
                FilterOp::Eq(value) => {
                    self.push(&format!("{prefix}{} = ", filter.column));
                    self.push_value(value);
                }
                FilterOp::Contains(_) => {
                    self.push(&format!("{prefix}{} ILIKE ", filter.column));
                    if let Some(needle) = needles.next() {
                        self.push_value(needle);
                    }
                }
            }
        }
    }

    fn build(&self) -> PgQuery<'_> {
        self.params
            .iter()
            .fold(sqlx::query(&self.sql), |query, value| bind_value(query, value))
    }
}

fn bind_value<'q>(query: PgQuery<'q>, value: &'q Value) -> PgQuery<'q> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Text(v) => query.bind(v.as_str()),
        Value::Int(v) => query.bind(*v),
        Value::Bool(v) => query.bind(*v),
        Value::Uuid(v) => query.bind(*v),
        Value::Timestamp(v) => query.bind(*v),
        Value::Date(v) => query.bind(*v),
        Value::Json(v) => query.bind(v),
    }
}

/// Renders `ILIKE` patterns for every `Contains` filter, escaping wildcards.
fn like_patterns(filters: &[Filter]) -> Vec<Value> {
    filters
        .iter()
        .filter_map(|filter| match &filter.op {
            FilterOp::Contains(needle) => {
                let escaped = needle
                    .replace('\\', "\\\\")
                    .replace('%', "\\%")
                    .replace('_', "\\_");
                Some(Value::Text(format!("%{escaped}%")))
            }
            FilterOp::Eq(_) => None,
        })
        .collect()
}

fn map_database_error(error: sqlx::Error, table: &str) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = error
        && db_err.is_unique_violation()
    {
        return StoreError::UniqueViolation {
            table: table.to_string(),
            constraint: db_err.constraint().unwrap_or_default().to_string(),
        };
    }
    StoreError::Database(error)
}

#[async_trait]
impl RowStore for PostgresRowStore {
    async fn execute(&self, statements: Vec<Statement>) -> Result<Vec<u64>> {
        validate_statements(&statements)?;

        if statements.is_empty() {
            return Ok(Vec::new());
        }

        // Start a transaction; dropping it on an early return rolls back
        let mut tx = self.pool.begin().await?;
        let mut counts = Vec::with_capacity(statements.len());

        for statement in &statements {
            let needles = match statement {
                Statement::Update { key, .. } | Statement::Delete { key, .. } => like_patterns(key),
                Statement::Insert { .. } => Vec::new(),
            };
            let mut builder = SqlBuilder::default();

            match statement {
                Statement::Insert { table, row } => {
                    let columns: Vec<&str> = row.columns().map(|(column, _)| column).collect();
                    builder.push(&format!(
                        "INSERT INTO {table} ({}) VALUES (",
                        columns.join(", ")
                    ));
                    for (position, (_, value)) in row.columns().enumerate() {
                        if position > 0 {
                            builder.push(", ");
                        }
                        builder.push_value(value);
                    }
                    builder.push(")");
                }
                Statement::Update { table, key, values } => {
                    builder.push(&format!("UPDATE {table} SET "));
                    for (position, (column, value)) in values.columns().enumerate() {
                        if position > 0 {
                            builder.push(", ");
                        }
                        builder.push(&format!("{column} = "));
                        builder.push_value(value);
                    }
                    builder.push_filters(None, key, &needles);
                }
                Statement::Delete { table, key, .. } => {
                    builder.push(&format!("DELETE FROM {table}"));
                    builder.push_filters(None, key, &needles);
                }
            }

            let affected = builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|e| map_database_error(e, statement.table()))?
                .rows_affected();

            if let Statement::Delete {
                table,
                expected_rows: Some(expected),
                ..
            } = statement
                && affected != *expected
            {
                return Err(StoreError::UnexpectedRowCount {
                    table: table.to_string(),
                    expected: *expected,
                    actual: affected,
                });
            }

            metrics::counter!("store_statements_total", "kind" => statement.kind()).increment(1);
            counts.push(affected);
        }

        tx.commit().await?;
        tracing::debug!(statements = counts.len(), "committed statement batch");

        Ok(counts)
    }

    async fn fetch(&self, query: RowQuery) -> Result<Vec<Row>> {
        let mut select = String::from("to_jsonb(t.*)");
        let mut from = format!("{} t", query.table);

        for (position, join) in query.joins.iter().enumerate() {
            let alias = format!("j{position}");
            let pairs: Vec<String> = join
                .columns
                .iter()
                .map(|column| format!("'{column}', {alias}.{column}"))
                .collect();
            select.push_str(&format!(" || jsonb_build_object({})", pairs.join(", ")));
            from.push_str(&format!(
                " LEFT JOIN {} {alias} ON {alias}.{} = t.{}",
                join.table, join.foreign_key, query.primary_key
            ));
        }

        let needles = like_patterns(&query.filters);
        let mut builder = SqlBuilder::default();
        builder.push(&format!("SELECT {select} AS row FROM {from}"));
        builder.push_filters(Some("t"), &query.filters, &needles);
        builder.push(&format!(" ORDER BY t.{}", query.primary_key));

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_from_pg).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_inlines_null_and_numbers_placeholders() {
        let title = Value::from("Dune");
        let translator = Value::Null;
        let mut builder = SqlBuilder::default();
        builder.push("UPDATE books SET title = ");
        builder.push_value(&title);
        builder.push(", translator = ");
        builder.push_value(&translator);

        assert_eq!(builder.sql, "UPDATE books SET title = $1, translator = NULL");
        assert_eq!(builder.params.len(), 1);
    }

    #[test]
    fn filters_render_is_null_and_ilike() {
        let filters = vec![
            Filter::eq("image_url", Value::Null),
            Filter::eq("is_approved", true),
            Filter::contains("title", "50%"),
        ];
        let needles = like_patterns(&filters);
        let mut builder = SqlBuilder::default();
        builder.push("SELECT * FROM books t");
        builder.push_filters(Some("t"), &filters, &needles);

        assert_eq!(
            builder.sql,
            "SELECT * FROM books t WHERE t.image_url IS NULL AND t.is_approved = $1 \
             AND t.title ILIKE $2"
        );
        assert_eq!(needles, vec![Value::Text("%50\\%%".to_string())]);
    }
}
