//! SQL sanitation and literal filter splicing.
//!
//! The system deliberately builds WHERE clauses by interpolating
//! literal values — parameter placeholders are rejected outright — so
//! every escaping and list-encoding decision is centralized here
//! instead of being duplicated per domain.
//!
//! Encoding policy:
//! - scalar text: single-quoted
//! - other scalars: emitted bare (`1`, `2.5`, `1`/`0` for booleans)
//! - uniform numeric list: `col IN (v1,v2,...)` in original order
//! - uniform text list: `col IN ('a','b',...)` in original order
//! - mixed list: equality against the first element only (documented
//!   limitation of the source system, preserved as-is)

use std::collections::HashSet;

use regex::Regex;

use crate::core::{FilterMap, FilterValue, Scalar};

/// Strips code-fence markup and a trailing statement terminator from a
/// generated SQL string.
#[must_use]
pub fn strip_markup(raw: &str) -> String {
    let mut text = raw.trim();

    if text.starts_with("```") {
        // Take the content of the first fenced block.
        let inner = text.split("```").nth(1).unwrap_or(text);
        text = inner
            .strip_prefix("sql")
            .or_else(|| inner.strip_prefix("json"))
            .unwrap_or(inner)
            .trim();
    }

    text.trim_end().trim_end_matches(';').trim().to_string()
}

/// Whether the statement contains a parameter placeholder.
///
/// Placeholders are a hard validation failure: the design mandates
/// literal-value WHERE clauses only.
#[must_use]
pub fn has_placeholder(sql: &str) -> bool {
    sql.contains('?')
}

/// Extracts the column names already constrained by the statement's
/// WHERE clause, uppercased for case-insensitive comparison.
#[must_use]
pub fn existing_where_columns(sql: &str) -> HashSet<String> {
    let Some(clause) = Regex::new(r"(?i)\bWHERE\b")
        .ok()
        .and_then(|re| re.find(sql))
        .map(|m| &sql[m.end()..])
    else {
        return HashSet::new();
    };

    let Ok(pattern) = Regex::new(r"(\w+)\s*[=<>!]") else {
        return HashSet::new();
    };
    pattern
        .captures_iter(clause)
        .map(|c| c[1].to_uppercase())
        .collect()
}

/// Renders one scalar as a SQL literal.
#[must_use]
pub fn render_scalar(value: &Scalar) -> String {
    match value {
        Scalar::Int(i) => i.to_string(),
        Scalar::Float(f) => f.to_string(),
        Scalar::Text(t) => format!("'{t}'"),
        Scalar::Bool(b) => if *b { "1" } else { "0" }.to_string(),
    }
}

/// Renders one filter as a complete WHERE condition.
///
/// A mixed-type list falls back to equality against the first element
/// only; this silently drops the remaining values, matching the source
/// system's documented behavior.
#[must_use]
pub fn render_condition(column: &str, value: &FilterValue) -> String {
    match value {
        FilterValue::One(scalar) => format!("{column} = {}", render_scalar(scalar)),
        FilterValue::Many(values) if values.is_empty() => format!("{column} IN ()"),
        FilterValue::Many(values) => {
            let all_numeric = values.iter().all(Scalar::is_numeric);
            let all_text = values.iter().all(|v| matches!(v, Scalar::Text(_)));
            if all_numeric || all_text {
                let rendered: Vec<String> = values.iter().map(render_scalar).collect();
                format!("{column} IN ({})", rendered.join(","))
            } else {
                format!("{column} = {}", render_scalar(&values[0]))
            }
        }
    }
}

/// Appends one condition to the statement, introducing a `WHERE`
/// clause if none exists yet.
#[must_use]
pub fn append_condition(sql: &str, condition: &str) -> String {
    if sql.to_uppercase().contains("WHERE") {
        format!("{sql} AND {condition}")
    } else {
        format!("{sql} WHERE {condition}")
    }
}

/// Merges caller-supplied filters into the statement's WHERE clause.
///
/// Filter keys that already have a condition in the statement are
/// skipped (case-insensitively) to avoid duplicate or conflicting
/// predicates; the rest are appended with `AND`.
#[must_use]
pub fn merge_filters(sql: &str, filters: &FilterMap) -> String {
    if filters.is_empty() {
        return sql.to_string();
    }

    let has_where = sql.to_uppercase().contains("WHERE");
    let existing = existing_where_columns(sql);
    let new_conditions: Vec<String> = filters
        .iter()
        .filter(|(key, _)| !existing.contains(&key.to_uppercase()))
        .map(|(key, value)| render_condition(key, value))
        .collect();

    if new_conditions.is_empty() {
        return sql.to_string();
    }

    let joined = new_conditions.join(" AND ");
    if has_where {
        format!("{sql} AND {joined}")
    } else {
        format!("{sql} WHERE {joined}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn filters(entries: &[(&str, FilterValue)]) -> FilterMap {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_strip_markup_plain() {
        assert_eq!(strip_markup("SELECT 1;"), "SELECT 1");
        assert_eq!(strip_markup("  SELECT 1  "), "SELECT 1");
    }

    #[test]
    fn test_strip_markup_fenced() {
        assert_eq!(
            strip_markup("```sql\nSELECT * FROM Orders;\n```"),
            "SELECT * FROM Orders"
        );
        assert_eq!(strip_markup("```\nSELECT 1\n```"), "SELECT 1");
    }

    #[test]
    fn test_has_placeholder() {
        assert!(has_placeholder("SELECT * FROM Orders WHERE OrderID = ?"));
        assert!(!has_placeholder("SELECT * FROM Orders WHERE OrderID = 1"));
    }

    #[test]
    fn test_existing_where_columns() {
        let cols = existing_where_columns("SELECT * FROM Orders WHERE OrderID = 1 AND status != 'x'");
        assert!(cols.contains("ORDERID"));
        assert!(cols.contains("STATUS"));
        assert!(existing_where_columns("SELECT * FROM Orders").is_empty());
    }

    #[test]
    fn test_render_scalar() {
        assert_eq!(render_scalar(&Scalar::Int(42)), "42");
        assert_eq!(render_scalar(&Scalar::Text("abc".to_string())), "'abc'");
        assert_eq!(render_scalar(&Scalar::Bool(true)), "1");
    }

    #[test]
    fn test_render_condition_numeric_list_preserves_order() {
        let value = FilterValue::Many(vec![Scalar::Int(4), Scalar::Int(7), Scalar::Int(2)]);
        assert_eq!(render_condition("OrderID", &value), "OrderID IN (4,7,2)");
    }

    #[test]
    fn test_render_condition_text_list_quoted() {
        let value = FilterValue::Many(vec![
            Scalar::Text("Open".to_string()),
            Scalar::Text("Closed".to_string()),
        ]);
        assert_eq!(
            render_condition("Status", &value),
            "Status IN ('Open','Closed')"
        );
    }

    #[test]
    fn test_render_condition_mixed_list_first_element_only() {
        let value = FilterValue::Many(vec![Scalar::Int(4), Scalar::Text("x".to_string())]);
        assert_eq!(render_condition("OrderID", &value), "OrderID = 4");
    }

    #[test]
    fn test_merge_filters_appends_where() {
        let merged = merge_filters(
            "SELECT * FROM Tickets",
            &filters(&[("UserID", FilterValue::int(1))]),
        );
        assert_eq!(merged, "SELECT * FROM Tickets WHERE UserID = 1");
    }

    #[test]
    fn test_merge_filters_appends_and() {
        let merged = merge_filters(
            "SELECT * FROM Tickets WHERE Status = 'Open'",
            &filters(&[("UserID", FilterValue::int(1))]),
        );
        assert_eq!(
            merged,
            "SELECT * FROM Tickets WHERE Status = 'Open' AND UserID = 1"
        );
    }

    #[test]
    fn test_merge_filters_skips_existing_column_case_insensitive() {
        let merged = merge_filters(
            "SELECT * FROM Orders WHERE orderid = 3",
            &filters(&[("OrderID", FilterValue::int(5))]),
        );
        assert_eq!(merged, "SELECT * FROM Orders WHERE orderid = 3");
    }

    #[test]
    fn test_merge_filters_quotes_text() {
        let merged = merge_filters(
            "SELECT UserID FROM Users",
            &filters(&[("Email", FilterValue::text("alice@example.com"))]),
        );
        assert_eq!(
            merged,
            "SELECT UserID FROM Users WHERE Email = 'alice@example.com'"
        );
    }

    proptest! {
        #[test]
        fn prop_numeric_in_list_preserves_order(values in proptest::collection::vec(any::<i64>(), 2..8)) {
            let scalars: Vec<Scalar> = values.iter().copied().map(Scalar::Int).collect();
            let rendered = render_condition("OrderID", &FilterValue::Many(scalars));
            let expected: Vec<String> = values.iter().map(ToString::to_string).collect();
            prop_assert_eq!(rendered, format!("OrderID IN ({})", expected.join(",")));
        }
    }
}
