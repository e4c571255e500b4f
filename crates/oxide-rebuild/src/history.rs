//! Migration history tracking.
//!
//! This module manages the `oxide_migrations` table that tracks which migrations
//! have been applied to the database.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::{SqliteConnection, SqlitePool};

use crate::error::Result;

/// SQL to create the migrations history table (SQLite).
pub const CREATE_MIGRATIONS_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS oxide_migrations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    app TEXT NOT NULL,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(app, name)
)
"#;

/// A record of an applied migration.
#[derive(Debug, Clone)]
pub struct AppliedMigration {
    /// Unique ID in the migrations table.
    pub id: i64,
    /// Application/module name.
    pub app: String,
    /// Migration name.
    pub name: String,
    /// When the migration was applied.
    pub applied_at: DateTime<Utc>,
}

impl AppliedMigration {
    fn from_row((id, app, name, applied_at): (i64, String, String, String)) -> Self {
        Self {
            id,
            app,
            name,
            applied_at: parse_timestamp(&applied_at),
        }
    }
}

/// Parses a stored timestamp. Rows written by this crate are RFC 3339; rows
/// relying on the column default use SQLite's `datetime('now')` format.
fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").map(|dt| dt.and_utc())
        })
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Manages the migration history in the database.
#[derive(Debug, Clone)]
pub struct MigrationHistory {
    pool: SqlitePool,
}

impl MigrationHistory {
    /// Creates a new migration history manager.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Ensures the migrations table exists.
    pub async fn ensure_table(&self) -> Result<()> {
        sqlx::query(CREATE_MIGRATIONS_TABLE_SQL)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Records a migration as applied, on the connection that applied it.
    pub async fn record_applied(
        &self,
        conn: &mut SqliteConnection,
        app: &str,
        name: &str,
    ) -> Result<()> {
        sqlx::query("INSERT INTO oxide_migrations (app, name, applied_at) VALUES (?, ?, ?)")
            .bind(app)
            .bind(name)
            .bind(Utc::now().to_rfc3339())
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Checks if a migration has been applied.
    pub async fn is_applied(&self, app: &str, name: &str) -> Result<bool> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM oxide_migrations WHERE app = ? AND name = ?")
                .bind(app)
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.is_some())
    }

    /// Gets all applied migrations.
    pub async fn get_applied(&self) -> Result<Vec<AppliedMigration>> {
        let rows: Vec<(i64, String, String, String)> =
            sqlx::query_as("SELECT id, app, name, applied_at FROM oxide_migrations ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(AppliedMigration::from_row).collect())
    }

    /// Gets applied migrations for a specific app.
    pub async fn get_applied_for_app(&self, app: &str) -> Result<Vec<AppliedMigration>> {
        let rows: Vec<(i64, String, String, String)> = sqlx::query_as(
            "SELECT id, app, name, applied_at FROM oxide_migrations WHERE app = ? ORDER BY id",
        )
        .bind(app)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(AppliedMigration::from_row).collect())
    }

    /// Gets a set of applied migration identifiers (app/name pairs).
    pub async fn get_applied_set(&self) -> Result<HashSet<(String, String)>> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT app, name FROM oxide_migrations")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().collect())
    }
}
