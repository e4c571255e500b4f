//! Migration executor.
//!
//! This module plans migrations through the rewriter and runs the resulting
//! commands against a SQLite database.
//!
//! All commands of one migration run on a single pooled connection, because
//! `PRAGMA foreign_keys` is a per-connection setting. Consecutive
//! transactional commands share one transaction; commands flagged
//! `suppress_transaction` run on their own, outside any transaction.

use sqlx::sqlite::{SqliteConnection, SqlitePool};
use sqlx::Connection;
use tracing::{debug, info, warn};

use crate::autodetector::{Autodetector, ModelDiffer};
use crate::command::MigrationCommand;
use crate::dialect::MigrationDialect;
use crate::error::{RebuildError, Result};
use crate::history::MigrationHistory;
use crate::operations::MigrationOperation;
use crate::rewrite::{OperationRewriter, DISABLE_FOREIGN_KEYS, ENABLE_FOREIGN_KEYS};
use crate::schema::DatabaseSchema;

/// A migration ready to be executed.
#[derive(Debug, Clone)]
pub struct ExecutableMigration {
    /// Application/module name.
    pub app: String,
    /// Migration name.
    pub name: String,
    /// Migration operations.
    pub operations: Vec<MigrationOperation>,
    /// Dependencies (app/name pairs).
    pub dependencies: Vec<(String, String)>,
    /// Model the database should match once this migration is applied.
    pub target: DatabaseSchema,
}

impl ExecutableMigration {
    /// Creates a new executable migration.
    #[must_use]
    pub fn new(app: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            name: name.into(),
            operations: Vec::new(),
            dependencies: Vec::new(),
            target: DatabaseSchema::new(),
        }
    }

    /// Adds an operation to this migration.
    #[must_use]
    pub fn operation(mut self, op: MigrationOperation) -> Self {
        self.operations.push(op);
        self
    }

    /// Adds operations to this migration.
    #[must_use]
    pub fn operations(mut self, ops: Vec<MigrationOperation>) -> Self {
        self.operations.extend(ops);
        self
    }

    /// Adds a dependency.
    #[must_use]
    pub fn depends_on(mut self, app: impl Into<String>, name: impl Into<String>) -> Self {
        self.dependencies.push((app.into(), name.into()));
        self
    }

    /// Sets the target model.
    #[must_use]
    pub fn target(mut self, target: DatabaseSchema) -> Self {
        self.target = target;
        self
    }

    /// Returns the full migration identifier.
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}/{}", self.app, self.name)
    }
}

/// Executes migrations against a database.
pub struct MigrationExecutor<D: MigrationDialect, M = Autodetector> {
    pool: SqlitePool,
    dialect: D,
    rewriter: OperationRewriter<M>,
    history: MigrationHistory,
    dry_run: bool,
}

impl<D: MigrationDialect> MigrationExecutor<D> {
    /// Creates a new migration executor.
    pub fn new(pool: SqlitePool, dialect: D) -> Self {
        let history = MigrationHistory::new(pool.clone());
        Self {
            pool,
            dialect,
            rewriter: OperationRewriter::new(),
            history,
            dry_run: false,
        }
    }
}

impl<D: MigrationDialect, M: ModelDiffer> MigrationExecutor<D, M> {
    /// Replaces the rewriter, e.g. to plan with a different differ.
    #[must_use]
    pub fn with_rewriter<N: ModelDiffer>(
        self,
        rewriter: OperationRewriter<N>,
    ) -> MigrationExecutor<D, N> {
        MigrationExecutor {
            pool: self.pool,
            dialect: self.dialect,
            rewriter,
            history: self.history,
            dry_run: self.dry_run,
        }
    }

    /// Enables dry-run mode (SQL is printed but not executed).
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Ensures the migrations history table exists.
    pub async fn init(&self) -> Result<()> {
        if !self.dry_run {
            self.history.ensure_table().await?;
        }
        Ok(())
    }

    /// Returns the migration history.
    #[must_use]
    pub fn history(&self) -> &MigrationHistory {
        &self.history
    }

    /// Returns the dialect.
    #[must_use]
    pub fn dialect(&self) -> &D {
        &self.dialect
    }

    /// Checks if a migration has been applied.
    pub async fn is_applied(&self, app: &str, name: &str) -> Result<bool> {
        self.history.is_applied(app, name).await
    }

    /// Plans a migration into executable commands.
    ///
    /// # Errors
    ///
    /// Fails if the migration cannot be rewritten or contains an operation
    /// SQLite cannot run.
    pub fn plan(&self, migration: &ExecutableMigration) -> Result<Vec<MigrationCommand>> {
        self.rewriter
            .generate_commands(&self.dialect, &migration.operations, &migration.target)
    }

    /// Generates SQL for a migration without executing it.
    ///
    /// # Errors
    ///
    /// Same as [`Self::plan`].
    pub fn sql_for(&self, migration: &ExecutableMigration) -> Result<Vec<String>> {
        Ok(self.plan(migration)?.into_iter().map(|c| c.sql).collect())
    }

    /// Applies a single migration.
    ///
    /// The migration is fully planned before anything runs, so a batch that
    /// cannot be planned leaves the database untouched.
    pub async fn apply(&self, migration: &ExecutableMigration) -> Result<()> {
        info!(
            app = %migration.app,
            name = %migration.name,
            "Applying migration"
        );

        let commands = self.plan(migration)?;

        if self.dry_run {
            for command in &commands {
                println!("{};", command.sql);
            }
            return Ok(());
        }

        if self
            .history
            .is_applied(&migration.app, &migration.name)
            .await?
        {
            warn!(
                app = %migration.app,
                name = %migration.name,
                "Migration already applied, skipping"
            );
            return Ok(());
        }

        for (dep_app, dep_name) in &migration.dependencies {
            if !self.history.is_applied(dep_app, dep_name).await? {
                return Err(RebuildError::MissingDependency {
                    migration: migration.id(),
                    dependency: format!("{dep_app}/{dep_name}"),
                });
            }
        }

        let mut conn = self.pool.acquire().await?;
        run_commands(&mut conn, &commands).await?;
        self.history
            .record_applied(&mut conn, &migration.app, &migration.name)
            .await?;

        info!(
            app = %migration.app,
            name = %migration.name,
            commands = commands.len(),
            "Migration applied successfully"
        );

        Ok(())
    }

    /// Applies multiple migrations in order.
    pub async fn apply_all(&self, migrations: &[ExecutableMigration]) -> Result<()> {
        for migration in migrations {
            self.apply(migration).await?;
        }
        Ok(())
    }

    /// Returns pending migrations (not yet applied).
    pub async fn pending<'a>(
        &self,
        migrations: &'a [ExecutableMigration],
    ) -> Result<Vec<&'a ExecutableMigration>> {
        let applied = self.history.get_applied_set().await?;
        Ok(migrations
            .iter()
            .filter(|m| !applied.contains(&(m.app.clone(), m.name.clone())))
            .collect())
    }
}

/// Runs `commands` in order on `conn`.
///
/// If a run fails while a rebuild has foreign key checks switched off, they
/// are switched back on before the error is returned.
async fn run_commands(conn: &mut SqliteConnection, commands: &[MigrationCommand]) -> Result<()> {
    let mut checks_off = false;
    let result = execute_runs(conn, commands, &mut checks_off).await;

    if result.is_err() && checks_off {
        warn!("Migration failed inside a rebuild, re-enabling foreign key checks");
        if let Err(err) = sqlx::query(ENABLE_FOREIGN_KEYS).execute(&mut *conn).await {
            warn!(error = %err, "Failed to re-enable foreign key checks");
        }
    }

    result
}

async fn execute_runs(
    conn: &mut SqliteConnection,
    commands: &[MigrationCommand],
    checks_off: &mut bool,
) -> Result<()> {
    for run in commands.chunk_by(|a, b| a.suppress_transaction == b.suppress_transaction) {
        if run[0].suppress_transaction {
            for command in run {
                debug!(sql = %command.sql, "Executing SQL outside transaction");
                sqlx::query(&command.sql).execute(&mut *conn).await?;
                if command.sql == DISABLE_FOREIGN_KEYS {
                    *checks_off = true;
                } else if command.sql == ENABLE_FOREIGN_KEYS {
                    *checks_off = false;
                }
            }
        } else {
            let mut tx = conn.begin().await?;
            for command in run {
                debug!(sql = %command.sql, "Executing SQL");
                sqlx::query(&command.sql).execute(&mut *tx).await?;
            }
            tx.commit().await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::SqliteDialect;
    use crate::operations::ColumnChanges;
    use crate::schema::{ColumnSchema, SqlType, TableSchema};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .expect("Failed to create in-memory SQLite pool")
    }

    fn users_table() -> TableSchema {
        TableSchema::new("users")
            .column(ColumnSchema::new("id", SqlType::Integer).primary_key())
            .column(ColumnSchema::new("username", SqlType::Varchar(255)).not_null())
    }

    fn create_users_migration() -> ExecutableMigration {
        let table = users_table();
        ExecutableMigration::new("users", "0001_initial")
            .operation(MigrationOperation::CreateTable {
                name: table.name.clone(),
                columns: table.columns.clone(),
                primary_key: table.primary_key.clone(),
                foreign_keys: Vec::new(),
                unique_constraints: Vec::new(),
            })
            .target(DatabaseSchema::new().table(table))
    }

    fn drop_username_migration() -> ExecutableMigration {
        ExecutableMigration::new("users", "0002_drop_username")
            .depends_on("users", "0001_initial")
            .operation(MigrationOperation::drop_column("users", "username"))
            .target(DatabaseSchema::new().table(
                TableSchema::new("users")
                    .column(ColumnSchema::new("id", SqlType::Integer).primary_key()),
            ))
    }

    async fn table_exists(pool: &SqlitePool, name: &str) -> bool {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name=?")
                .bind(name)
                .fetch_optional(pool)
                .await
                .unwrap();
        row.is_some()
    }

    #[tokio::test]
    async fn test_apply_migration() {
        let pool = create_test_pool().await;
        let executor = MigrationExecutor::new(pool.clone(), SqliteDialect::new());
        executor.init().await.unwrap();

        executor.apply(&create_users_migration()).await.unwrap();

        assert!(table_exists(&pool, "users").await);
        assert!(executor.is_applied("users", "0001_initial").await.unwrap());
    }

    #[tokio::test]
    async fn test_apply_idempotent() {
        let pool = create_test_pool().await;
        let executor = MigrationExecutor::new(pool, SqliteDialect::new());
        executor.init().await.unwrap();

        let migration = create_users_migration();

        // Second apply is skipped
        executor.apply(&migration).await.unwrap();
        executor.apply(&migration).await.unwrap();
    }

    #[tokio::test]
    async fn test_apply_rebuild_preserves_rows() {
        let pool = create_test_pool().await;
        let executor = MigrationExecutor::new(pool.clone(), SqliteDialect::new());
        executor.init().await.unwrap();

        executor.apply(&create_users_migration()).await.unwrap();
        sqlx::query("INSERT INTO users (id, username) VALUES (1, 'ada'), (2, 'linus')")
            .execute(&pool)
            .await
            .unwrap();

        executor.apply(&drop_username_migration()).await.unwrap();

        let ids: Vec<(i64,)> = sqlx::query_as("SELECT id FROM users ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(ids, vec![(1,), (2,)]);

        let columns: Vec<(String,)> = sqlx::query_as("SELECT name FROM pragma_table_info('users')")
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(columns, vec![("id".to_string(),)]);
        assert!(!table_exists(&pool, "users_new").await);
    }

    #[tokio::test]
    async fn test_apply_missing_dependency() {
        let pool = create_test_pool().await;
        let executor = MigrationExecutor::new(pool, SqliteDialect::new());
        executor.init().await.unwrap();

        let result = executor.apply(&drop_username_migration()).await;
        assert!(matches!(
            result,
            Err(RebuildError::MissingDependency { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_run_rolls_back() {
        let pool = create_test_pool().await;
        let executor = MigrationExecutor::new(pool.clone(), SqliteDialect::new());
        executor.init().await.unwrap();

        let migration = ExecutableMigration::new("misc", "0001_broken")
            .operation(MigrationOperation::run_sql("CREATE TABLE audit (id INTEGER)"))
            .operation(MigrationOperation::run_sql("INSERT INTO missing VALUES (1)"));

        assert!(matches!(
            executor.apply(&migration).await,
            Err(RebuildError::Database(_))
        ));
        assert!(!table_exists(&pool, "audit").await);
        assert!(!executor.is_applied("misc", "0001_broken").await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_copy_restores_foreign_key_checks() {
        let pool = create_test_pool().await;
        let executor = MigrationExecutor::new(pool.clone(), SqliteDialect::new());
        executor.init().await.unwrap();

        executor.apply(&create_users_migration()).await.unwrap();
        sqlx::query("INSERT INTO users (id, username) VALUES (1, 'ada')")
            .execute(&pool)
            .await
            .unwrap();

        // The copy violates the new CHECK, so the rebuild fails mid-block.
        let migration = ExecutableMigration::new("users", "0002_long_names")
            .operation(MigrationOperation::alter_column(
                "users",
                "username",
                ColumnChanges::new().set_type(SqlType::Text),
            ))
            .target(DatabaseSchema::new().table(
                TableSchema::new("users")
                    .column(ColumnSchema::new("id", SqlType::Integer).primary_key())
                    .column(
                        ColumnSchema::new("username", SqlType::Text)
                            .not_null()
                            .check("length(username) > 100"),
                    ),
            ));

        assert!(matches!(
            executor.apply(&migration).await,
            Err(RebuildError::Database(_))
        ));

        let (enabled,): (i64,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(enabled, 1);

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert!(!table_exists(&pool, "users_new").await);
        assert!(!executor.is_applied("users", "0002_long_names").await.unwrap());
    }

    #[tokio::test]
    async fn test_unplannable_migration_runs_nothing() {
        let pool = create_test_pool().await;
        let executor = MigrationExecutor::new(pool.clone(), SqliteDialect::new());
        executor.init().await.unwrap();

        let migration = ExecutableMigration::new("misc", "0001_sequence")
            .operation(MigrationOperation::run_sql("CREATE TABLE audit (id INTEGER)"))
            .operation(MigrationOperation::CreateSequence {
                name: "audit_ids".to_string(),
                start: 1,
                increment: 1,
            });

        assert!(matches!(
            executor.apply(&migration).await,
            Err(RebuildError::UnsupportedOperation { .. })
        ));
        assert!(!table_exists(&pool, "audit").await);
    }

    #[tokio::test]
    async fn test_pending_migrations() {
        let pool = create_test_pool().await;
        let executor = MigrationExecutor::new(pool, SqliteDialect::new());
        executor.init().await.unwrap();

        let m1 = create_users_migration();
        let m2 = drop_username_migration();
        let migrations = vec![m1.clone(), m2];

        let pending = executor.pending(&migrations).await.unwrap();
        assert_eq!(pending.len(), 2);

        executor.apply(&m1).await.unwrap();

        let pending = executor.pending(&migrations).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].name, "0002_drop_username");
    }

    #[tokio::test]
    async fn test_sql_generation() {
        let pool = create_test_pool().await;
        let executor = MigrationExecutor::new(pool, SqliteDialect::new());

        let sql = executor.sql_for(&drop_username_migration()).unwrap();

        assert_eq!(sql.first().map(String::as_str), Some("PRAGMA foreign_keys = 0"));
        assert!(sql.iter().any(|s| s.starts_with("CREATE TABLE \"users_new\"")));
        assert_eq!(sql.last().map(String::as_str), Some("PRAGMA foreign_keys = 1"));
    }

    #[tokio::test]
    async fn test_dry_run() {
        let pool = create_test_pool().await;
        let executor = MigrationExecutor::new(pool.clone(), SqliteDialect::new()).dry_run(true);

        executor.apply(&create_users_migration()).await.unwrap();

        assert!(!table_exists(&pool, "users").await);
    }
}
