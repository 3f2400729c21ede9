//! Read-only enforcement for generated SQL.
//!
//! Two layers live here:
//!
//! - [`check_read_only`]: the gate. A case-insensitive prefix check that
//!   accepts text starting with `select` or `with`. It does not parse SQL, so
//!   a data-modifying statement hidden inside a `WITH` clause passes it.
//! - [`classify_sql`]: a sqlparser-based classifier. It never accepts or
//!   rejects anything; callers use it to log statements the gate let through
//!   that a real parse considers unsafe.

mod parser;

pub use parser::{classify_sql, SqlClassifier};

use std::fmt;

use crate::error::{AskqlError, Result};

/// Lowercase prefixes the gate accepts.
pub const READ_ONLY_PREFIXES: [&str; 2] = ["select", "with"];

/// Detail returned to clients when the gate rejects a statement.
pub const REJECTION_MESSAGE: &str = "Only SELECT queries are allowed";

/// Rejects text that does not start with an allowed read-only prefix.
pub fn check_read_only(sql: &str) -> Result<()> {
    let lowered = sql.trim_start().to_lowercase();
    if READ_ONLY_PREFIXES
        .iter()
        .any(|prefix| lowered.starts_with(prefix))
    {
        Ok(())
    } else {
        Err(AskqlError::rejected(REJECTION_MESSAGE))
    }
}

/// Safety level classification for SQL queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SafetyLevel {
    /// Read-only queries (SELECT, EXPLAIN without ANALYZE).
    Safe,
    /// Data modification (INSERT, UPDATE, MERGE).
    Mutating,
    /// Data loss or schema changes (DELETE, DROP, TRUNCATE, ALTER, ...).
    Destructive,
}

impl SafetyLevel {
    /// Returns true for read-only statements.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::Safe)
    }

    /// Priority value (higher = more dangerous).
    fn priority(&self) -> u8 {
        match self {
            Self::Safe => 0,
            Self::Mutating => 1,
            Self::Destructive => 2,
        }
    }
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Safe => write!(f, "Safe"),
            Self::Mutating => write!(f, "Mutating"),
            Self::Destructive => write!(f, "Destructive"),
        }
    }
}

/// The type of SQL statement detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementType {
    Select,
    Insert,
    Update,
    Delete,
    Merge,
    Drop,
    Truncate,
    Alter,
    Create,
    Grant,
    Revoke,
    Explain,
    /// Multiple statements detected; contains the most dangerous type.
    Multiple(Box<StatementType>),
    /// Statement type could not be determined.
    Unknown,
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select => write!(f, "SELECT"),
            Self::Insert => write!(f, "INSERT"),
            Self::Update => write!(f, "UPDATE"),
            Self::Delete => write!(f, "DELETE"),
            Self::Merge => write!(f, "MERGE"),
            Self::Drop => write!(f, "DROP"),
            Self::Truncate => write!(f, "TRUNCATE"),
            Self::Alter => write!(f, "ALTER"),
            Self::Create => write!(f, "CREATE"),
            Self::Grant => write!(f, "GRANT"),
            Self::Revoke => write!(f, "REVOKE"),
            Self::Explain => write!(f, "EXPLAIN"),
            Self::Multiple(inner) => write!(f, "Multiple ({})", inner),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Result of classifying a SQL query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    /// The determined safety level.
    pub level: SafetyLevel,
    /// The type of statement(s) detected.
    pub statement_type: StatementType,
    /// Why the classification is uncertain, if it is.
    pub warning: Option<String>,
}

impl ClassificationResult {
    /// Creates a new classification result.
    pub fn new(level: SafetyLevel, statement_type: StatementType) -> Self {
        Self {
            level,
            statement_type,
            warning: None,
        }
    }

    /// Creates a classification result with a warning message.
    pub fn with_warning(
        level: SafetyLevel,
        statement_type: StatementType,
        warning: impl Into<String>,
    ) -> Self {
        Self {
            level,
            statement_type,
            warning: Some(warning.into()),
        }
    }
}
