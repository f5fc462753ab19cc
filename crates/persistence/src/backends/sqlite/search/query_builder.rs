//! SQL builder for full-text entity searches.
//!
//! A search starts from the FTS5 table under alias `a`. Each property
//! constraint joins the entity-property table once more under the next alias
//! (`b`, `c`, ...) and adds an equality filter on that alias. Values are
//! always bound as parameters, in the order their clauses are emitted: the
//! search term first, then `(property id, value)` per constraint.

use rusqlite::ToSql;

use crate::core::PropertyFilter;

use super::fts::{FTS_TABLE, SCORE_EXPR};

/// Name of the entity-property value table.
pub const ENTITY_PROPERTIES_TABLE: &str = "recon_entity_properties";

/// A fragment of SQL with bound parameters.
#[derive(Debug, Clone, Default)]
pub struct SqlFragment {
    /// The SQL text.
    pub sql: String,
    /// Bound parameter values, in placeholder order.
    pub params: Vec<SqlParam>,
}

/// A bound SQL parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    /// String parameter.
    String(String),
}

impl SqlParam {
    /// Creates a string parameter.
    pub fn string(s: impl Into<String>) -> Self {
        SqlParam::String(s.into())
    }

    /// Returns the parameter as a rusqlite value.
    pub fn as_sql(&self) -> &dyn ToSql {
        match self {
            SqlParam::String(s) => s,
        }
    }
}

impl SqlFragment {
    /// Creates a fragment without parameters.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Adds a parameter and returns its placeholder (`?N`).
    pub fn add_param(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("?{}", self.params.len())
    }

    /// Returns the parameters in a form rusqlite can bind.
    pub fn bind_params(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(SqlParam::as_sql).collect()
    }
}

/// Returns the table alias for the `n`-th table of a search, starting at 0.
///
/// The first 26 tables get single letters. Later ones get a letter followed
/// by a number, so no alias can be an SQL keyword.
///
/// # Examples
///
/// ```
/// # #[cfg(feature = "sqlite")]
/// # {
/// use recon_persistence::backends::sqlite::search::table_alias;
///
/// assert_eq!(table_alias(0), "a");
/// assert_eq!(table_alias(1), "b");
/// assert_eq!(table_alias(26), "a1");
/// assert_eq!(table_alias(53), "b2");
/// # }
/// ```
pub fn table_alias(n: usize) -> String {
    let letter = char::from(b'a' + (n % 26) as u8);
    if n < 26 {
        letter.to_string()
    } else {
        format!("{letter}{}", n / 26)
    }
}

/// Builds the entity search statement.
///
/// Selects `(ent_id, ent_name, ent_types, score)` ordered best-first, where
/// `score` is the native bm25 rank (lower is better).
#[derive(Debug, Clone)]
pub struct EntitySearchBuilder<'a> {
    match_term: &'a str,
    filters: &'a [PropertyFilter],
}

impl<'a> EntitySearchBuilder<'a> {
    /// Creates a builder for an already sanitized FTS5 match expression.
    pub fn new(match_term: &'a str) -> Self {
        Self {
            match_term,
            filters: &[],
        }
    }

    /// Restricts the search to entities satisfying every filter.
    pub fn with_filters(mut self, filters: &'a [PropertyFilter]) -> Self {
        self.filters = filters;
        self
    }

    /// Builds the statement.
    pub fn build(&self) -> SqlFragment {
        let fts = table_alias(0);
        let mut fragment = SqlFragment::default();

        let mut from = format!("{FTS_TABLE} {fts}");
        let term = fragment.add_param(SqlParam::string(self.match_term));
        let mut conditions = vec![format!("{FTS_TABLE} MATCH {term}")];

        for (i, filter) in self.filters.iter().enumerate() {
            let alias = table_alias(i + 1);
            from.push_str(&format!(", {ENTITY_PROPERTIES_TABLE} {alias}"));
            let pid = fragment.add_param(SqlParam::string(filter.property_id.as_str()));
            let value = fragment.add_param(SqlParam::string(filter.value.as_str()));
            conditions.push(format!(
                "{fts}.ent_id={alias}.ent_id AND {fts}.ent_types={alias}.ent_types \
                 AND {alias}.prop_id={pid} AND {alias}.prop_value={value}"
            ));
        }

        fragment.sql = format!(
            "SELECT {fts}.ent_id, {fts}.ent_name, {fts}.ent_types, {SCORE_EXPR} AS score \
             FROM {from} WHERE {} ORDER BY score",
            conditions.join(" AND ")
        );
        fragment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(pid: &str, value: &str) -> PropertyFilter {
        PropertyFilter {
            property_id: pid.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_alias_sequence() {
        let aliases: Vec<_> = (0..4).map(table_alias).collect();
        assert_eq!(aliases, vec!["a", "b", "c", "d"]);
        assert_eq!(table_alias(25), "z");
        assert_eq!(table_alias(26), "a1");
        assert_eq!(table_alias(27), "b1");
    }

    #[test]
    fn test_aliases_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for n in 0..200 {
            assert!(seen.insert(table_alias(n)), "duplicate alias for {n}");
        }
    }

    #[test]
    fn test_search_without_filters() {
        let fragment = EntitySearchBuilder::new("\"doug\"*").build();
        assert_eq!(
            fragment.sql,
            "SELECT a.ent_id, a.ent_name, a.ent_types, bm25(recon_entities_fts) AS score \
             FROM recon_entities_fts a WHERE recon_entities_fts MATCH ?1 ORDER BY score"
        );
        assert_eq!(fragment.params, vec![SqlParam::string("\"doug\"*")]);
    }

    #[test]
    fn test_search_with_two_filters() {
        let filters = [filter("born", "1952"), filter("city", "c1")];
        let fragment = EntitySearchBuilder::new("\"adams\"*")
            .with_filters(&filters)
            .build();

        assert!(fragment.sql.contains(
            "FROM recon_entities_fts a, recon_entity_properties b, recon_entity_properties c WHERE"
        ));
        assert!(fragment.sql.contains("b.prop_id=?2 AND b.prop_value=?3"));
        assert!(fragment.sql.contains("c.prop_id=?4 AND c.prop_value=?5"));
        assert!(fragment.sql.contains("a.ent_id=c.ent_id AND a.ent_types=c.ent_types"));
        assert!(fragment.sql.ends_with("ORDER BY score"));
        assert_eq!(
            fragment.params,
            vec![
                SqlParam::string("\"adams\"*"),
                SqlParam::string("born"),
                SqlParam::string("1952"),
                SqlParam::string("city"),
                SqlParam::string("c1"),
            ]
        );
        assert_eq!(fragment.bind_params().len(), 5);
    }
}
