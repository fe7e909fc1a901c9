use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DbError>;

/// Everything that can go wrong while parsing or executing a command.
///
/// Each variant maps to one failure class surfaced to clients: a command
/// never crashes the server, it is converted into an error reply at the
/// dispatch boundary. `Io` and `Json` cover persistence failures; all other
/// variants are ordinary validation outcomes.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("No database selected")]
    NoDatabase,
    #[error("No table selected")]
    NoTable,
    #[error("Database '{0}' does not exist")]
    DatabaseNotFound(String),
    #[error("Table '{0}' does not exist")]
    TableNotFound(String),
    #[error("Database '{0}' already exists")]
    DatabaseExists(String),
    #[error("Table '{0}' already exists")]
    TableExists(String),
    #[error("Column '{0}' already exists")]
    ColumnExists(String),
    #[error("Expected {expected} value(s), got {got}")]
    Arity { expected: usize, got: usize },
    #[error("Cannot interpret '{value}' as {ty}")]
    Coerce { value: String, ty: &'static str },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Unknown command '{0}'")]
    UnknownCommand(String),
    #[error("Invalid arguments for '{command}': {detail}")]
    BadArguments { command: String, detail: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
