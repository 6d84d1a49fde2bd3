//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use store::{
    Filter, Join, PostgresRowStore, Row, RowQuery, RowStore, RowStoreExt, Statement, StoreError,
    Value,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_catalog_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresRowStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query(
        "TRUNCATE TABLE books_authors, books_genres, book_change_requests, books, authors, \
         genres, categories CASCADE",
    )
    .execute(&pool)
    .await
    .unwrap();

    PostgresRowStore::new(pool)
}

fn category(id: Uuid, name: &str) -> Statement {
    Statement::insert("categories", Row::new().with("id", id).with("name", name))
}

fn author(id: Uuid, name: &str) -> Statement {
    Statement::insert(
        "authors",
        Row::new()
            .with("id", id)
            .with("name", name)
            .with("is_approved", true)
            .with("created_at", Utc::now()),
    )
}

fn book(id: Uuid, category_id: Uuid, title: &str) -> Statement {
    Statement::insert(
        "books",
        Row::new()
            .with("id", id)
            .with("title", title)
            .with("isbn", "")
            .with("publisher", "Chilton")
            .with("release_year", 1965)
            .with("language", "English")
            .with("translator", "")
            .with("format", "paperback")
            .with("pages", 412)
            .with("image_url", Value::Null)
            .with("category_id", category_id)
            .with("is_approved", false)
            .with("created_at", Utc::now()),
    )
}

fn set_image_url(book_id: Uuid, image_url: impl Into<Value>) -> Statement {
    Statement::update(
        "books",
        vec![Filter::eq("id", book_id)],
        Row::new().with("image_url", image_url),
    )
}

fn book_author(book_id: Uuid, author_id: Uuid) -> Statement {
    Statement::insert(
        "books_authors",
        Row::new().with("book_id", book_id).with("author_id", author_id),
    )
}

#[tokio::test]
async fn execute_and_fetch_with_joins() {
    let store = get_test_store().await;
    let category_id = Uuid::new_v4();
    let book_id = Uuid::new_v4();
    let a1 = Uuid::new_v4();
    let a2 = Uuid::new_v4();

    let counts = store
        .execute(vec![
            category(category_id, "Novel"),
            author(a1, "Frank Herbert"),
            author(a2, "Brian Herbert"),
            book(book_id, category_id, "Dune"),
            book_author(book_id, a1),
            book_author(book_id, a2),
        ])
        .await
        .unwrap();
    assert_eq!(counts, vec![1, 1, 1, 1, 1, 1]);

    let rows = store
        .fetch(
            RowQuery::new("books")
                .filter(Filter::eq("id", book_id))
                .join(Join::new("books_authors", "book_id", vec!["author_id"])),
        )
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].uuid("id").unwrap(), book_id);
    assert_eq!(rows[0].text("title").unwrap(), "Dune");
    assert_eq!(rows[0].int32("pages").unwrap(), 412);
    assert_eq!(rows[0].opt_text("image_url").unwrap(), None);
    assert!(rows[0].timestamp("created_at").is_ok());

    let mut authors: Vec<Uuid> = rows.iter().map(|r| r.uuid("author_id").unwrap()).collect();
    authors.sort();
    let mut expected = vec![a1, a2];
    expected.sort();
    assert_eq!(authors, expected);
}

#[tokio::test]
async fn left_join_yields_null_children() {
    let store = get_test_store().await;
    let category_id = Uuid::new_v4();
    let book_id = Uuid::new_v4();

    store
        .execute(vec![
            category(category_id, "Essay"),
            book(book_id, category_id, "Walden"),
        ])
        .await
        .unwrap();

    let rows = store
        .fetch(
            RowQuery::new("books")
                .join(Join::new("books_authors", "book_id", vec!["author_id"]))
                .join(Join::new("books_genres", "book_id", vec!["genre_id"])),
        )
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].opt_uuid("author_id").unwrap(), None);
    assert_eq!(rows[0].opt_uuid("genre_id").unwrap(), None);
}

#[tokio::test]
async fn unique_violation_is_reported_and_batch_rolled_back() {
    let store = get_test_store().await;

    store
        .execute(vec![category(Uuid::new_v4(), "Poetry")])
        .await
        .unwrap();

    let result = store
        .execute(vec![
            category(Uuid::new_v4(), "Drama"),
            category(Uuid::new_v4(), "Poetry"),
        ])
        .await;

    assert!(matches!(
        result,
        Err(StoreError::UniqueViolation { ref constraint, .. })
            if constraint == "categories_name_key"
    ));
    assert!(
        !store
            .exists(RowQuery::new("categories").filter(Filter::eq("name", "Drama")))
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn update_with_null_and_contains_filter() {
    let store = get_test_store().await;
    let category_id = Uuid::new_v4();
    let book_id = Uuid::new_v4();

    store
        .execute(vec![
            category(category_id, "Novel"),
            book(book_id, category_id, "The Left Hand of Darkness"),
            set_image_url(book_id, "https://img/1.png"),
        ])
        .await
        .unwrap();

    store
        .execute(vec![set_image_url(book_id, Value::Null)])
        .await
        .unwrap();

    let rows = store
        .fetch(
            RowQuery::new("books")
                .filter(Filter::contains("title", "left HAND"))
                .filter(Filter::eq("image_url", Value::Null)),
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn expected_row_count_aborts_transaction() {
    let store = get_test_store().await;
    let category_id = Uuid::new_v4();

    let result = store
        .execute(vec![
            category(category_id, "Satire"),
            Statement::delete(
                "book_change_requests",
                vec![Filter::eq("id", Uuid::new_v4())],
            )
            .expect_rows(1),
        ])
        .await;

    assert!(matches!(
        result,
        Err(StoreError::UnexpectedRowCount { actual: 0, .. })
    ));
    assert!(
        !store
            .exists(RowQuery::new("categories").filter(Filter::eq("id", category_id)))
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn json_column_round_trips() {
    let store = get_test_store().await;
    let id = Uuid::new_v4();
    let author_id = Uuid::new_v4();

    store
        .execute(vec![Statement::insert(
            "book_change_requests",
            Row::new()
                .with("id", id)
                .with("book_id", Uuid::new_v4())
                .with("user_email", "reader@example.com")
                .with("created_at", Utc::now())
                .with("title", "")
                .with("author_ids", serde_json::json!([author_id])),
        )])
        .await
        .unwrap();

    let rows = store
        .fetch(RowQuery::new("book_change_requests").filter(Filter::eq("id", id)))
        .await
        .unwrap();

    assert_eq!(rows[0].opt_text("title").unwrap(), Some(String::new()));
    assert_eq!(rows[0].opt_text("isbn").unwrap(), None);
    assert_eq!(
        rows[0].opt_json("author_ids").unwrap(),
        Some(serde_json::json!([author_id.to_string()]))
    );
}
