//! Example: rebuilding a blog schema on SQLite
//!
//! Creates a `posts` table, fills it, then applies a migration SQLite cannot
//! express with `ALTER TABLE`: a column rename, a dropped column and a type
//! change. The rows survive the rebuild.
//!
//! Run with: cargo run --example blog_rebuild -p oxide-rebuild

use oxide_rebuild::prelude::*;

fn posts_v1() -> TableSchema {
    TableSchema::new("posts")
        .column(
            ColumnSchema::new("id", SqlType::Integer)
                .primary_key()
                .annotation(annotations::AUTOINCREMENT, AnnotationValue::Bool(true)),
        )
        .column(ColumnSchema::new("title", SqlType::Varchar(200)).not_null())
        .column(ColumnSchema::new("body", SqlType::Text))
        .column(ColumnSchema::new("legacy_slug", SqlType::Text))
        .column(ColumnSchema::new("views", SqlType::Text))
        .index_on(&["title"], false)
}

fn posts_v2() -> TableSchema {
    TableSchema::new("posts")
        .column(
            ColumnSchema::new("id", SqlType::Integer)
                .primary_key()
                .annotation(annotations::AUTOINCREMENT, AnnotationValue::Bool(true)),
        )
        .column(ColumnSchema::new("headline", SqlType::Varchar(200)).not_null())
        .column(ColumnSchema::new("body", SqlType::Text))
        .column(
            ColumnSchema::new("views", SqlType::Integer)
                .not_null()
                .default(DefaultValue::Integer(0)),
        )
        .index_on(&["headline"], false)
}

fn initial() -> ExecutableMigration {
    let table = posts_v1();
    let mut migration = ExecutableMigration::new("blog", "0001_initial").operation(
        MigrationOperation::create_table(
            "posts",
            table.columns.clone(),
            table.primary_key.clone(),
        ),
    );
    for index in &table.indexes {
        migration = migration.operation(MigrationOperation::create_index(
            index.name.clone(),
            "posts",
            index.columns.clone(),
            index.unique,
        ));
    }
    migration.target(DatabaseSchema::new().table(table))
}

fn reshape() -> ExecutableMigration {
    ExecutableMigration::new("blog", "0002_reshape_posts")
        .depends_on("blog", "0001_initial")
        .operation(MigrationOperation::rename_column("posts", "title", "headline"))
        .operation(MigrationOperation::drop_column("posts", "legacy_slug"))
        .operation(MigrationOperation::alter_column(
            "posts",
            "views",
            ColumnChanges::new()
                .set_type(SqlType::Integer)
                .set_nullable(false),
        ))
        .operation(MigrationOperation::drop_index("IX_posts_title"))
        .target(DatabaseSchema::new().table(posts_v2()))
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await?;

    let executor = MigrationExecutor::new(pool.clone(), SqliteDialect::new());
    executor.init().await?;

    let migrations = vec![initial(), reshape()];

    for migration in &migrations {
        println!("-- Migration: {}", migration.id());
        for sql in executor.sql_for(migration)? {
            println!("{sql};");
        }
        println!();
    }

    executor.apply(&migrations[0]).await?;
    sqlx::query(
        "INSERT INTO posts (title, body, legacy_slug, views) \
         VALUES ('Hello', 'First post', 'hello', '12'), ('Again', NULL, 'again', '3')",
    )
    .execute(&pool)
    .await?;

    executor.apply(&migrations[1]).await?;

    let rows: Vec<(i64, String, i64)> =
        sqlx::query_as("SELECT id, headline, views FROM posts ORDER BY id")
            .fetch_all(&pool)
            .await?;
    for (id, headline, views) in rows {
        println!("{id}: {headline} ({views} views)");
    }

    for applied in executor.history().get_applied().await? {
        println!("[X] {}/{}", applied.app, applied.name);
    }

    Ok(())
}
