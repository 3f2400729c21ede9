//! Post-processing of model output into executable SQL.
//!
//! Pure string handling; nothing here understands SQL grammar. A semicolon
//! inside a string literal still truncates, and `limit` or `group by` inside
//! a literal or comment still suppresses the row cap.

use crate::error::Result;
use crate::llm::strip_code_fences;
use crate::safety::check_read_only;

/// Row cap injected when the statement carries no `LIMIT` of its own.
pub const DEFAULT_LIMIT: usize = 100;

/// Turns raw model output into the SQL that will be executed.
///
/// Steps, in order: strip code fences, apply the read-only gate, drop
/// everything from the first semicolon on, append `LIMIT 100` if the text
/// has neither `limit` nor `group by`.
pub fn sanitize_sql(raw: &str) -> Result<String> {
    let sql = strip_code_fences(raw);
    check_read_only(&sql)?;
    Ok(apply_row_cap(truncate_at_semicolon(&sql)))
}

/// Keeps only the text before the first `;`, trimmed.
pub fn truncate_at_semicolon(sql: &str) -> &str {
    sql.split(';').next().unwrap_or(sql).trim()
}

/// Appends the default `LIMIT` unless `limit` or `group by` already appears.
pub fn apply_row_cap(sql: &str) -> String {
    let lowered = sql.to_lowercase();
    if lowered.contains("limit") || lowered.contains("group by") {
        sql.to_string()
    } else {
        format!("{sql} LIMIT {DEFAULT_LIMIT}")
    }
}
