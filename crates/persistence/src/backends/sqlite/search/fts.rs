//! FTS5 full-text index over entities.
//!
//! The index is an external-content FTS5 table over `recon_entities`
//! covering the raw id, name, description and type list of each entity.

/// Name of the FTS5 virtual table.
pub const FTS_TABLE: &str = "recon_entities_fts";

/// Native relevance expression. bm25 is negative, best hits are lowest.
pub const SCORE_EXPR: &str = "bm25(recon_entities_fts)";

/// SQL creating the FTS5 table.
pub fn create_table_sql() -> &'static str {
    r#"
    CREATE VIRTUAL TABLE IF NOT EXISTS recon_entities_fts USING fts5(
        ent_id,
        ent_name,
        ent_description,
        ent_types,
        content='recon_entities'
    )
    "#
}

/// SQL rebuilding the index from the content table.
///
/// Run after bulk imports; external-content tables are not kept in sync
/// automatically.
pub fn rebuild_index_sql() -> String {
    format!("INSERT INTO {FTS_TABLE}({FTS_TABLE}) VALUES ('rebuild')")
}

/// Turns free text into an FTS5 match expression.
///
/// Every whitespace-separated token becomes a quoted string (so operators
/// and punctuation in the text are taken literally) and the last token gets
/// the prefix operator, so `"douglas ad"` finds "Douglas Adams". Returns
/// `None` when the text has no tokens.
///
/// # Examples
///
/// ```
/// # #[cfg(feature = "sqlite")]
/// # {
/// use recon_persistence::backends::sqlite::search::match_expression;
///
/// assert_eq!(match_expression("douglas ad").as_deref(), Some("\"douglas\" \"ad\"*"));
/// assert_eq!(match_expression("   "), None);
/// # }
/// ```
pub fn match_expression(text: &str) -> Option<String> {
    let tokens: Vec<String> = text
        .split_whitespace()
        .map(|t| format!("\"{}\"", t.replace('"', "\"\"")))
        .collect();
    if tokens.is_empty() {
        return None;
    }
    Some(format!("{}*", tokens.join(" ")))
}
