//! Integration tests for table rebuilds on a live SQLite database.
//!
//! Each test applies an initial migration, fills the tables, then applies a
//! migration that SQLite can only run through a rebuild, and checks that the
//! data and the final schema are what the target model describes.

use oxide_rebuild::prelude::*;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

async fn create_test_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .expect("Failed to create in-memory SQLite pool")
}

async fn executor(pool: &SqlitePool) -> MigrationExecutor<SqliteDialect> {
    let executor = MigrationExecutor::new(pool.clone(), SqliteDialect::new());
    executor.init().await.unwrap();
    executor
}

/// Builds the migration that creates `model` from nothing.
fn initial(app: &str, model: &DatabaseSchema) -> ExecutableMigration {
    let operations = Autodetector::new().diff(&DatabaseSchema::new(), model);
    ExecutableMigration::new(app, "0001_initial")
        .operations(operations)
        .target(model.clone())
}

async fn column_names(pool: &SqlitePool, table: &str) -> Vec<String> {
    sqlx::query_as::<_, (String,)>("SELECT name FROM pragma_table_info(?) ORDER BY cid")
        .bind(table)
        .fetch_all(pool)
        .await
        .unwrap()
        .into_iter()
        .map(|(name,)| name)
        .collect()
}

async fn index_names(pool: &SqlitePool, table: &str) -> Vec<String> {
    sqlx::query_as::<_, (String,)>(
        "SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = ? \
         AND name NOT LIKE 'sqlite_autoindex%' ORDER BY name",
    )
    .bind(table)
    .fetch_all(pool)
    .await
    .unwrap()
    .into_iter()
    .map(|(name,)| name)
    .collect()
}

async fn foreign_keys_enabled(pool: &SqlitePool) -> bool {
    let (enabled,): (i64,) = sqlx::query_as("PRAGMA foreign_keys")
        .fetch_one(pool)
        .await
        .unwrap();
    enabled == 1
}

// =============================================================================
// Rename, drop and alter in one batch
// =============================================================================

fn people_v1() -> DatabaseSchema {
    DatabaseSchema::new().table(
        TableSchema::new("people")
            .column(
                ColumnSchema::new("id", SqlType::Integer)
                    .primary_key()
                    .annotation(annotations::AUTOINCREMENT, AnnotationValue::Bool(true)),
            )
            .column(ColumnSchema::new("name", SqlType::Text).not_null())
            .column(ColumnSchema::new("email", SqlType::Text))
            .column(ColumnSchema::new("age", SqlType::Text))
            .index_on(&["name"], false),
    )
}

fn people_v2() -> DatabaseSchema {
    DatabaseSchema::new().table(
        TableSchema::new("people")
            .column(
                ColumnSchema::new("id", SqlType::Integer)
                    .primary_key()
                    .annotation(annotations::AUTOINCREMENT, AnnotationValue::Bool(true)),
            )
            .column(ColumnSchema::new("full_name", SqlType::Text).not_null())
            .column(ColumnSchema::new("age", SqlType::Integer))
            .index_on(&["full_name"], false),
    )
}

#[tokio::test]
async fn test_rebuild_keeps_rows_under_new_shape() {
    let pool = create_test_pool().await;
    let executor = executor(&pool).await;

    executor.apply(&initial("people", &people_v1())).await.unwrap();
    sqlx::query(
        "INSERT INTO people (name, email, age) VALUES \
         ('Ada', 'ada@example.com', '36'), ('Alan', NULL, '41')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let reshape = ExecutableMigration::new("people", "0002_reshape")
        .depends_on("people", "0001_initial")
        .operations(vec![
            MigrationOperation::drop_index("IX_people_name"),
            MigrationOperation::rename_column("people", "name", "full_name"),
            MigrationOperation::drop_column("people", "email"),
            MigrationOperation::alter_column(
                "people",
                "age",
                ColumnChanges::new().set_type(SqlType::Integer),
            ),
        ])
        .target(people_v2());
    executor.apply(&reshape).await.unwrap();

    let rows: Vec<(i64, String, i64)> =
        sqlx::query_as("SELECT id, full_name, age FROM people ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(
        rows,
        vec![(1, "Ada".to_string(), 36), (2, "Alan".to_string(), 41)]
    );

    assert_eq!(column_names(&pool, "people").await, vec!["id", "full_name", "age"]);
    assert_eq!(index_names(&pool, "people").await, vec!["IX_people_full_name"]);
    assert!(foreign_keys_enabled(&pool).await);
    assert!(executor.is_applied("people", "0002_reshape").await.unwrap());
}

#[tokio::test]
async fn test_autoincrement_survives_rebuild() {
    let pool = create_test_pool().await;
    let executor = executor(&pool).await;

    executor.apply(&initial("people", &people_v1())).await.unwrap();
    sqlx::query("INSERT INTO people (name) VALUES ('a'), ('b'), ('c')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("DELETE FROM people WHERE id = 3")
        .execute(&pool)
        .await
        .unwrap();

    let drop_email = ExecutableMigration::new("people", "0002_drop_email")
        .operation(MigrationOperation::drop_column("people", "email"))
        .target(
            DatabaseSchema::new().table(
                TableSchema::new("people")
                    .column(
                        ColumnSchema::new("id", SqlType::Integer)
                            .primary_key()
                            .annotation(annotations::AUTOINCREMENT, AnnotationValue::Bool(true)),
                    )
                    .column(ColumnSchema::new("name", SqlType::Text).not_null())
                    .column(ColumnSchema::new("age", SqlType::Text)),
            ),
        );
    executor.apply(&drop_email).await.unwrap();

    sqlx::query("INSERT INTO people (name) VALUES ('d')")
        .execute(&pool)
        .await
        .unwrap();
    let (id,): (i64,) = sqlx::query_as("SELECT id FROM people WHERE name = 'd'")
        .fetch_one(&pool)
        .await
        .unwrap();
    // The rebuilt table is a fresh AUTOINCREMENT table, so ids restart
    // after the highest surviving row.
    assert_eq!(id, 3);
}

// =============================================================================
// Foreign keys
// =============================================================================

fn library(with_fk: bool) -> DatabaseSchema {
    let mut books = TableSchema::new("books")
        .column(ColumnSchema::new("id", SqlType::Integer).primary_key())
        .column(ColumnSchema::new("title", SqlType::Text).not_null())
        .column(ColumnSchema::new("author_id", SqlType::Integer).not_null())
        .index_on(&["author_id"], false);
    if with_fk {
        books = books.foreign_key(
            ForeignKeyBuilder::new("FK_books_authors_author_id")
                .columns(vec!["author_id".to_string()])
                .references("authors", vec!["id".to_string()])
                .on_delete(ForeignKeyAction::Cascade)
                .build(),
        );
    }

    DatabaseSchema::new()
        .table(
            TableSchema::new("authors")
                .column(ColumnSchema::new("id", SqlType::Integer).primary_key())
                .column(ColumnSchema::new("name", SqlType::Text).not_null())
                .column(ColumnSchema::new("bio", SqlType::Text)),
        )
        .table(books)
}

async fn seed_library(pool: &SqlitePool) {
    sqlx::query("INSERT INTO authors (id, name) VALUES (1, 'Le Guin'), (2, 'Pratchett')")
        .execute(pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO books (id, title, author_id) VALUES \
         (1, 'The Dispossessed', 1), (2, 'Mort', 2), (3, 'Small Gods', 2)",
    )
    .execute(pool)
    .await
    .unwrap();
}

#[tokio::test]
async fn test_add_foreign_key_to_existing_table() {
    let pool = create_test_pool().await;
    let executor = executor(&pool).await;

    executor.apply(&initial("library", &library(false))).await.unwrap();
    seed_library(&pool).await;

    let fk = library(true)
        .get_table("books")
        .map(|t| t.foreign_keys[0].clone())
        .unwrap();
    let add_fk = ExecutableMigration::new("library", "0002_books_fk")
        .operation(MigrationOperation::add_foreign_key("books", fk))
        .target(library(true));
    executor.apply(&add_fk).await.unwrap();

    let (fk_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pragma_foreign_key_list('books')")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(fk_count, 1);

    let (book_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM books")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(book_count, 3);
    assert_eq!(index_names(&pool, "books").await, vec!["IX_books_author_id"]);

    // The constraint is live once checks are back on.
    let orphan = sqlx::query("INSERT INTO books (id, title, author_id) VALUES (4, 'Nobody', 99)")
        .execute(&pool)
        .await;
    assert!(orphan.is_err());
}

#[tokio::test]
async fn test_rebuilding_parent_does_not_cascade() {
    let pool = create_test_pool().await;
    let executor = executor(&pool).await;

    executor.apply(&initial("library", &library(true))).await.unwrap();
    seed_library(&pool).await;

    let mut target = library(true);
    target.tables[0].columns.retain(|c| c.name != "bio");
    let drop_bio = ExecutableMigration::new("library", "0002_drop_bio")
        .operation(MigrationOperation::drop_column("authors", "bio"))
        .target(target);
    executor.apply(&drop_bio).await.unwrap();

    let (book_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM books")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(book_count, 3);
    assert_eq!(column_names(&pool, "authors").await, vec!["id", "name"]);

    let (violations,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pragma_foreign_key_check")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(violations, 0);
}

#[tokio::test]
async fn test_foreign_key_folded_into_new_table() {
    let pool = create_test_pool().await;
    let executor = executor(&pool).await;

    let model = library(true);
    let fk = model.tables[1].foreign_keys[0].clone();

    // Created without the key; the key arrives as a separate operation.
    let mut operations = Autodetector::new().diff(&DatabaseSchema::new(), &library(false));
    operations.push(MigrationOperation::add_foreign_key("books", fk));

    let migration = ExecutableMigration::new("library", "0001_initial")
        .operations(operations)
        .target(model);

    let sql = executor.sql_for(&migration).unwrap();
    assert!(!sql.iter().any(|s| s.contains("books_new")));

    executor.apply(&migration).await.unwrap();
    let (fk_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pragma_foreign_key_list('books')")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(fk_count, 1);
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_rebuild_of_table_missing_from_model_runs_nothing() {
    let pool = create_test_pool().await;
    let executor = executor(&pool).await;

    executor.apply(&initial("people", &people_v1())).await.unwrap();

    let broken = ExecutableMigration::new("people", "0002_broken")
        .operation(MigrationOperation::run_sql("DELETE FROM people"))
        .operation(MigrationOperation::drop_column("people", "email"))
        .target(DatabaseSchema::new());

    assert!(matches!(
        executor.apply(&broken).await,
        Err(RebuildError::MissingSynthesizedTable { table }) if table == "people"
    ));
    assert_eq!(
        column_names(&pool, "people").await,
        vec!["id", "name", "email", "age"]
    );
    assert!(!executor.is_applied("people", "0002_broken").await.unwrap());
}
