//! SQL compilation for list queries over the `documents` table.
//!
//! Field names and values are always bound parameters. Field names become JSON
//! paths (`a.b` → `{a,b}`) applied with `#>`/`#>>`. Only the page window is
//! rendered inline, from integers.

use fittrack_query::{Condition, FilterQuery, FindQuery, Query, RangeOp, SearchQuery};
use serde_json::Value as JsonValue;

/// Bind values for `sqlx` queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindValue {
    Text(String),
    TextArray(Vec<String>),
}

fn push_text(binds: &mut Vec<BindValue>, value: String) -> usize {
    binds.push(BindValue::Text(value));
    binds.len()
}

fn push_text_array(binds: &mut Vec<BindValue>, value: Vec<String>) -> usize {
    binds.push(BindValue::TextArray(value));
    binds.len()
}

fn push_path(binds: &mut Vec<BindValue>, field: &str) -> usize {
    push_text_array(binds, field.split('.').map(str::to_string).collect())
}

/// Escape SQL LIKE meta-characters so user input is matched literally.
pub(crate) fn escape_like_pattern(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Text form of a JSON value as `#>>` renders it; `None` for JSON null.
pub(crate) fn json_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Numeric reading of a filter value: a JSON number, or a string that parses as a
/// finite number.
pub(crate) fn numeric_literal(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// `SELECT COUNT(*)` over the documents of `collection` matching `query`.
pub fn build_count_sql(collection: &str, query: &Query) -> (String, Vec<BindValue>) {
    let mut binds = Vec::new();
    let mut sql = String::from("SELECT COUNT(*) FROM documents d WHERE ");
    push_where(&mut sql, &mut binds, collection, query);
    (sql, binds)
}

/// Page of document bodies for `find`, ordered by its sort keys then by id.
pub fn build_find_sql(collection: &str, find: &FindQuery) -> (String, Vec<BindValue>) {
    let mut binds = Vec::new();
    let mut sql = String::from("SELECT d.body FROM documents d WHERE ");
    push_where(&mut sql, &mut binds, collection, find.conditions());

    let mut order = Vec::new();
    if let Some(sort) = find.sort_spec() {
        for key in sort.keys() {
            let idx = push_path(&mut binds, &key.field);
            let direction = if key.ascending() { "ASC" } else { "DESC" };
            order.push(format!("d.body #> ${idx} {direction}"));
        }
    }
    order.push("d.id ASC".to_string());
    sql.push_str(" ORDER BY ");
    sql.push_str(&order.join(", "));

    if let Some(limit) = find.max_results() {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    if find.offset() > 0 {
        sql.push_str(&format!(" OFFSET {}", find.offset()));
    }

    (sql, binds)
}

fn push_where(sql: &mut String, binds: &mut Vec<BindValue>, collection: &str, query: &Query) {
    let idx = push_text(binds, collection.to_string());
    sql.push_str(&format!("d.collection = ${idx}"));

    if let Some(filter) = query.filter() {
        for clause in filter_clauses(binds, filter) {
            sql.push_str(" AND ");
            sql.push_str(&clause);
        }
    }
    if let Some(search) = query.search() {
        if let Some(clause) = search_clause(binds, search) {
            sql.push_str(" AND ");
            sql.push_str(&clause);
        }
    }
}

fn filter_clauses(binds: &mut Vec<BindValue>, filter: &FilterQuery) -> Vec<String> {
    filter
        .iter()
        .map(|(field, condition)| condition_clause(binds, field, condition))
        .collect()
}

fn search_clause(binds: &mut Vec<BindValue>, search: &SearchQuery) -> Option<String> {
    let parts: Vec<String> = search
        .clauses()
        .iter()
        .map(|clause| contains_clause(binds, &clause.field, &clause.term))
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(format!("({})", parts.join(" OR ")))
}

fn contains_clause(binds: &mut Vec<BindValue>, field: &str, term: &str) -> String {
    let path = push_path(binds, field);
    let pattern = push_text(binds, format!("%{}%", escape_like_pattern(term)));
    format!("d.body #>> ${path} ILIKE ${pattern} ESCAPE E'\\\\'")
}

fn condition_clause(binds: &mut Vec<BindValue>, field: &str, condition: &Condition) -> String {
    match condition {
        Condition::Eq(value) => {
            let path = push_path(binds, field);
            match json_text(value) {
                Some(_) => equals_clause(binds, path, value),
                None => format!("d.body #>> ${path} IS NULL"),
            }
        }
        Condition::Ne(value) => {
            let path = push_path(binds, field);
            match json_text(value) {
                Some(_) => format!("NOT COALESCE({}, FALSE)", equals_clause(binds, path, value)),
                None => format!("d.body #>> ${path} IS NOT NULL"),
            }
        }
        Condition::In(values) => {
            let path = push_path(binds, field);
            let texts = push_text_array(binds, values.iter().filter_map(json_text).collect());
            let text_match = format!("d.body #>> ${path} = ANY(${texts})");
            let numbers: Vec<String> = values
                .iter()
                .filter_map(numeric_literal)
                .map(|n| n.to_string())
                .collect();
            if numbers.is_empty() {
                return text_match;
            }
            let idx = push_text_array(binds, numbers);
            format!(
                "({} OR {text_match})",
                numeric_guard(path, &format!("= ANY(${idx}::numeric[])"))
            )
        }
        Condition::Range(bounds) => {
            if bounds.is_empty() {
                return "TRUE".to_string();
            }
            let parts: Vec<String> = bounds
                .iter()
                .map(|bound| range_clause(binds, field, bound.op, &bound.value))
                .collect();
            format!("({})", parts.join(" AND "))
        }
        Condition::Contains(term) => contains_clause(binds, field, term),
    }
}

/// `(d.body #>> path)::numeric <comparison>`, false for anything but a JSON number.
fn numeric_guard(path: usize, comparison: &str) -> String {
    // CASE keeps the cast away from non-numeric values.
    format!(
        "(CASE WHEN jsonb_typeof(d.body #> ${path}) = 'number' \
         THEN (d.body #>> ${path})::numeric {comparison} ELSE FALSE END)"
    )
}

/// Numbers compare by value (`100` matches a stored `100.0`), everything else by text.
fn equals_clause(binds: &mut Vec<BindValue>, path: usize, value: &JsonValue) -> String {
    let text = push_text(binds, json_text(value).unwrap_or_default());
    match numeric_literal(value) {
        Some(n) => {
            let idx = push_text(binds, n.to_string());
            format!(
                "(CASE WHEN jsonb_typeof(d.body #> ${path}) = 'number' \
                 THEN (d.body #>> ${path})::numeric = ${idx}::numeric \
                 ELSE d.body #>> ${path} = ${text} END)"
            )
        }
        None => format!("d.body #>> ${path} = ${text}"),
    }
}

fn range_clause(binds: &mut Vec<BindValue>, field: &str, op: RangeOp, value: &JsonValue) -> String {
    let symbol = match op {
        RangeOp::Gt => ">",
        RangeOp::Gte => ">=",
        RangeOp::Lt => "<",
        RangeOp::Lte => "<=",
    };
    let path = push_path(binds, field);
    let idx = push_text(binds, json_text(value).unwrap_or_default());

    if value.is_number() {
        numeric_guard(path, &format!("{symbol} ${idx}::numeric"))
    } else {
        // Byte order, matching ISO dates and timestamps.
        format!("d.body #>> ${path} COLLATE \"C\" {symbol} ${idx}")
    }
}
