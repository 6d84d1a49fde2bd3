use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    Filter, Result, Row, RowQuery, Statement, StoreError, Value, store::RowStore,
    validate_statements,
};

/// A uniqueness constraint enforced by the in-memory store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueConstraint {
    pub name: &'static str,
    pub table: &'static str,
    pub columns: Vec<&'static str>,
}

impl UniqueConstraint {
    pub fn new(name: &'static str, table: &'static str, columns: Vec<&'static str>) -> Self {
        Self {
            name,
            table,
            columns,
        }
    }

    fn collides(&self, a: &Row, b: &Row) -> bool {
        self.columns.iter().all(|column| {
            let left = a.get(column).unwrap_or(&Value::Null);
            let right = b.get(column).unwrap_or(&Value::Null);
            !left.is_null() && left == right
        })
    }
}

type Tables = HashMap<&'static str, Vec<Row>>;

/// Orders primary key values the way PostgreSQL orders the column.
fn compare_keys(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let (Some(a), Some(b)) = (a, b) else {
        return a.is_some().cmp(&b.is_some());
    };
    if let (Some(a), Some(b)) = (a.as_int(), b.as_int()) {
        return a.cmp(&b);
    }
    if let (Some(a), Some(b)) = (a.as_uuid(), b.as_uuid()) {
        return a.cmp(&b);
    }
    a.as_text().cmp(&b.as_text())
}

#[derive(Default)]
struct State {
    tables: Tables,
    rejected_tables: HashSet<&'static str>,
    executed: Vec<Statement>,
}

/// In-memory row store implementation for testing.
///
/// Batches are staged against a copy of the tables and swapped in only when
/// every statement succeeds, which gives the same all-or-nothing behaviour
/// as a PostgreSQL transaction.
#[derive(Clone, Default)]
pub struct InMemoryRowStore {
    state: Arc<RwLock<State>>,
    constraints: Arc<Vec<UniqueConstraint>>,
}

impl InMemoryRowStore {
    /// Creates a new empty in-memory store without constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a uniqueness constraint, builder style.
    pub fn with_unique_constraint(mut self, constraint: UniqueConstraint) -> Self {
        Arc::make_mut(&mut self.constraints).push(constraint);
        self
    }

    /// Makes every later statement touching `table` fail.
    pub async fn reject_statements_for(&self, table: &'static str) {
        self.state.write().await.rejected_tables.insert(table);
    }

    /// Lifts every rejection installed by [`Self::reject_statements_for`].
    pub async fn accept_all_statements(&self) {
        self.state.write().await.rejected_tables.clear();
    }

    /// Returns every statement committed so far, in execution order.
    pub async fn executed_statements(&self) -> Vec<Statement> {
        self.state.read().await.executed.clone()
    }

    /// Returns the number of statements committed so far.
    pub async fn statement_count(&self) -> usize {
        self.state.read().await.executed.len()
    }

    /// Returns a copy of every row in a table.
    pub async fn rows(&self, table: &str) -> Vec<Row> {
        self.state
            .read()
            .await
            .tables
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Forgets the statement history, keeping every table.
    pub async fn clear_history(&self) {
        self.state.write().await.executed.clear();
    }

    /// Clears all tables and the statement history.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.tables.clear();
        state.executed.clear();
    }

    fn check_unique(
        &self,
        tables: &Tables,
        table: &'static str,
        candidate: &Row,
        skip: Option<usize>,
    ) -> Result<()> {
        let Some(rows) = tables.get(table) else {
            return Ok(());
        };

        for constraint in self.constraints.iter().filter(|c| c.table == table) {
            let collision = rows
                .iter()
                .enumerate()
                .filter(|(position, _)| Some(*position) != skip)
                .any(|(_, existing)| constraint.collides(existing, candidate));
            if collision {
                return Err(StoreError::UniqueViolation {
                    table: table.to_string(),
                    constraint: constraint.name.to_string(),
                });
            }
        }

        Ok(())
    }

    fn apply(&self, tables: &mut Tables, statement: &Statement) -> Result<u64> {
        match statement {
            Statement::Insert { table, row } => {
                let table = *table;
                self.check_unique(tables, table, row, None)?;
                tables.entry(table).or_default().push(row.clone());
                Ok(1)
            }
            Statement::Update { table, key, values } => {
                let table = *table;
                let positions = matching_positions(tables, table, key);
                for &position in &positions {
                    let mut updated = tables[table][position].clone();
                    updated.merge(values);
                    self.check_unique(tables, table, &updated, Some(position))?;
                    if let Some(rows) = tables.get_mut(table) {
                        rows[position] = updated;
                    }
                }
                Ok(positions.len() as u64)
            }
            Statement::Delete {
                table,
                key,
                expected_rows,
            } => {
                let table = *table;
                let rows = tables.entry(table).or_default();
                let before = rows.len();
                rows.retain(|row| !key.iter().all(|filter| filter.matches(row)));
                let deleted = (before - rows.len()) as u64;

                if let Some(expected) = *expected_rows
                    && deleted != expected
                {
                    return Err(StoreError::UnexpectedRowCount {
                        table: table.to_string(),
                        expected,
                        actual: deleted,
                    });
                }
                Ok(deleted)
            }
        }
    }
}

fn matching_positions(tables: &Tables, table: &str, key: &[Filter]) -> Vec<usize> {
    tables
        .get(table)
        .map(|rows| {
            rows.iter()
                .enumerate()
                .filter(|(_, row)| key.iter().all(|filter| filter.matches(row)))
                .map(|(position, _)| position)
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl RowStore for InMemoryRowStore {
    async fn execute(&self, statements: Vec<Statement>) -> Result<Vec<u64>> {
        validate_statements(&statements)?;

        if statements.is_empty() {
            return Ok(Vec::new());
        }

        let mut state = self.state.write().await;

        // Stage against a copy so a failure leaves nothing behind
        let mut staged = state.tables.clone();
        let mut counts = Vec::with_capacity(statements.len());

        for (index, statement) in statements.iter().enumerate() {
            if state.rejected_tables.contains(statement.table()) {
                return Err(StoreError::StatementRejected {
                    index,
                    table: statement.table().to_string(),
                });
            }
            counts.push(self.apply(&mut staged, statement)?);
        }

        state.tables = staged;
        state.executed.extend(statements);

        Ok(counts)
    }

    async fn fetch(&self, query: RowQuery) -> Result<Vec<Row>> {
        let state = self.state.read().await;
        let Some(rows) = state.tables.get(query.table) else {
            return Ok(Vec::new());
        };

        let mut parents: Vec<&Row> = rows
            .iter()
            .filter(|row| query.filters.iter().all(|filter| filter.matches(row)))
            .collect();
        parents.sort_by(|a, b| compare_keys(a.get(query.primary_key), b.get(query.primary_key)));

        let mut results = Vec::new();
        for parent in parents {
            let parent_key = parent.get(query.primary_key).cloned().unwrap_or(Value::Null);
            let mut combined = vec![parent.clone()];

            for join in &query.joins {
                let children: Vec<&Row> = state
                    .tables
                    .get(join.table)
                    .map(|rows| {
                        rows.iter()
                            .filter(|child| child.get(join.foreign_key) == Some(&parent_key))
                            .collect()
                    })
                    .unwrap_or_default();

                let projections: Vec<Row> = if children.is_empty() {
                    vec![join.columns.iter().fold(Row::new(), |row, column| {
                        row.with(*column, Value::Null)
                    })]
                } else {
                    children
                        .into_iter()
                        .map(|child| {
                            join.columns.iter().fold(Row::new(), |row, column| {
                                row.with(*column, child.get(column).cloned().unwrap_or(Value::Null))
                            })
                        })
                        .collect()
                };

                combined = combined
                    .iter()
                    .flat_map(|base| {
                        projections.iter().map(move |projection| {
                            let mut row = base.clone();
                            row.merge(projection);
                            row
                        })
                    })
                    .collect();
            }

            results.extend(combined);
        }

        Ok(results)
    }
}
