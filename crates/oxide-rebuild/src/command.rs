//! Executable command units.
//!
//! The dialect writes statement text into a [`CommandListBuilder`] and closes
//! a command whenever a statement must stand alone. The executor runs the
//! resulting [`MigrationCommand`]s in order.

use serde::Serialize;

/// One executable unit of SQL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationCommand {
    /// SQL text, without a trailing terminator.
    pub sql: String,
    /// Whether the command must run outside any transaction.
    pub suppress_transaction: bool,
}

impl MigrationCommand {
    /// Creates a command that runs inside the migration transaction.
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            suppress_transaction: false,
        }
    }
}

/// Accumulates statement text and splits it into commands.
#[derive(Debug, Default)]
pub struct CommandListBuilder {
    commands: Vec<MigrationCommand>,
    current: String,
}

impl CommandListBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends text to the command being built.
    pub fn append(&mut self, sql: &str) -> &mut Self {
        self.current.push_str(sql);
        self
    }

    /// Closes the command being built. Empty commands are discarded.
    pub fn end_command(&mut self, suppress_transaction: bool) -> &mut Self {
        let sql = std::mem::take(&mut self.current);
        let sql = sql.trim();
        if !sql.is_empty() {
            self.commands.push(MigrationCommand {
                sql: sql.to_string(),
                suppress_transaction,
            });
        }
        self
    }

    /// Returns the number of closed commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns true if no command has been closed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Closes any pending text and returns the commands.
    #[must_use]
    pub fn finish(mut self) -> Vec<MigrationCommand> {
        self.end_command(false);
        self.commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_command_splits_units() {
        let mut builder = CommandListBuilder::new();
        builder.append("PRAGMA foreign_keys = 0").end_command(true);
        builder.append("DROP TABLE \"users\"").end_command(false);

        let commands = builder.finish();
        assert_eq!(commands.len(), 2);
        assert!(commands[0].suppress_transaction);
        assert_eq!(commands[1], MigrationCommand::new("DROP TABLE \"users\""));
    }

    #[test]
    fn test_empty_commands_are_dropped() {
        let mut builder = CommandListBuilder::new();
        builder.end_command(false).append("   ").end_command(true);
        assert!(builder.is_empty());
        assert!(builder.finish().is_empty());
    }

    #[test]
    fn test_finish_flushes_pending_text() {
        let mut builder = CommandListBuilder::new();
        builder.append("SELECT 1");
        assert_eq!(builder.len(), 0);
        assert_eq!(builder.finish(), vec![MigrationCommand::new("SELECT 1")]);
    }
}
