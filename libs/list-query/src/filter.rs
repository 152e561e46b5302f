//! Allow-listed field filters
//!
//! A [`FilterQuery`] only ever contains fields the endpoint declared: literal filters from
//! its [`AllowedFilters`] and fragments produced by its registered [`SpecialFilters`].
//! Anything else a client sends is dropped before it can reach the data layer.
//!
//! Supported request shapes:
//! - `type=strength` equality (a repeated key becomes a set match)
//! - `rating[gte]=4`, `rating[lt]=5`, `status[ne]=done`, `type[in]=cardio,hiit`
//! - `name[contains]=squat` case-insensitive partial match, taken literally
//! - `date=2024-03-01..2024-03-31` style values handled by a special filter transform

use crate::error::{Error, Result};
use crate::request::is_reserved;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Comparison operator of a range bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeOp {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl RangeOp {
    fn parse(op: &str) -> Option<Self> {
        match op {
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bound {
    pub op: RangeOp,
    pub value: JsonValue,
}

/// Condition on a single field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Condition {
    Eq(JsonValue),
    Ne(JsonValue),
    In(Vec<JsonValue>),
    /// Every bound must hold.
    Range(Vec<Bound>),
    /// Case-insensitive partial match on the literal text.
    Contains(String),
}

impl Condition {
    pub fn eq(value: impl Into<JsonValue>) -> Self {
        Self::Eq(value.into())
    }

    pub fn one_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<JsonValue>,
    {
        Self::In(values.into_iter().map(Into::into).collect())
    }

    pub fn bound(op: RangeOp, value: impl Into<JsonValue>) -> Self {
        Self::Range(vec![Bound {
            op,
            value: value.into(),
        }])
    }

    pub fn gte(value: impl Into<JsonValue>) -> Self {
        Self::bound(RangeOp::Gte, value)
    }

    pub fn lt(value: impl Into<JsonValue>) -> Self {
        Self::bound(RangeOp::Lt, value)
    }

    pub fn lte(value: impl Into<JsonValue>) -> Self {
        Self::bound(RangeOp::Lte, value)
    }

    /// Half-open `[from, to)` range.
    pub fn between(from: impl Into<JsonValue>, to: impl Into<JsonValue>) -> Self {
        Self::Range(vec![
            Bound {
                op: RangeOp::Gte,
                value: from.into(),
            },
            Bound {
                op: RangeOp::Lt,
                value: to.into(),
            },
        ])
    }
}

/// Conjunction of per-field conditions, ordered by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FilterQuery {
    clauses: BTreeMap<String, Condition>,
}

impl FilterQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`FilterQuery::insert`], convenient inside filter transforms.
    pub fn with(mut self, field: impl Into<String>, condition: Condition) -> Self {
        self.insert(field, condition);
        self
    }

    /// Add a condition. Range bounds on the same field accumulate; any other
    /// combination replaces the previous condition.
    pub fn insert(&mut self, field: impl Into<String>, condition: Condition) {
        let field = field.into();
        if let (Some(Condition::Range(existing)), Condition::Range(bounds)) =
            (self.clauses.get_mut(&field), &condition)
        {
            existing.extend(bounds.iter().cloned());
            return;
        }
        self.clauses.insert(field, condition);
    }

    pub fn merge(&mut self, other: FilterQuery) {
        for (field, condition) in other.clauses {
            self.insert(field, condition);
        }
    }

    pub fn get(&self, field: &str) -> Option<&Condition> {
        self.clauses.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.clauses.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Condition)> {
        self.clauses.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }
}

/// Field names a client may filter on directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedFilters {
    fields: BTreeSet<String>,
}

impl AllowedFilters {
    pub fn new<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out = Self::default();
        for field in fields {
            let field = field.into();
            validate_filter_name(&field)?;
            out.fields.insert(field);
        }
        Ok(out)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }
}

/// Converts one raw query value into a (possibly multi-field) filter fragment.
///
/// Transforms return an empty [`FilterQuery`] for values they cannot interpret.
pub trait FilterTransform: Send + Sync {
    fn apply(&self, raw_value: &str) -> FilterQuery;
}

impl<F> FilterTransform for F
where
    F: Fn(&str) -> FilterQuery + Send + Sync,
{
    fn apply(&self, raw_value: &str) -> FilterQuery {
        self(raw_value)
    }
}

/// Registry of special filters keyed by query parameter name.
#[derive(Clone, Default)]
pub struct SpecialFilters {
    transforms: BTreeMap<String, Arc<dyn FilterTransform>>,
}

impl SpecialFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transform. The name is validated here, once, rather than per request.
    pub fn register<T>(&mut self, name: impl Into<String>, transform: T) -> Result<()>
    where
        T: FilterTransform + 'static,
    {
        let name = name.into();
        validate_filter_name(&name)?;
        if self.transforms.contains_key(&name) {
            return Err(Error::DuplicateSpecialFilter(name));
        }
        self.transforms.insert(name, Arc::new(transform));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn FilterTransform> {
        self.transforms.get(name).map(|t| t.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.transforms.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.transforms.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl fmt::Debug for SpecialFilters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.transforms.keys()).finish()
    }
}

fn validate_filter_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::EmptyFilterName);
    }
    if is_reserved(name) {
        return Err(Error::ReservedFilterName(name.to_string()));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        return Err(Error::InvalidFilterName(name.to_string()));
    }
    Ok(())
}

/// Split `field[op]` into its parts.
fn split_operator(key: &str) -> Option<(&str, &str)> {
    let (field, rest) = key.split_once('[')?;
    let op = rest.strip_suffix(']')?;
    Some((field, op))
}

/// Interpret a raw value as a JSON scalar so range bounds compare numerically.
pub(crate) fn scalar_from_raw(raw: &str) -> JsonValue {
    let trimmed = raw.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return JsonValue::from(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return JsonValue::Number(n);
        }
    }
    match trimmed {
        "true" => JsonValue::Bool(true),
        "false" => JsonValue::Bool(false),
        _ => JsonValue::String(raw.to_string()),
    }
}

/// Build the filter for one request.
///
/// Reserved parameters are stripped first. A key registered in `special` is replaced by
/// its transform's fragment; a key in `allowed` becomes an equality (or operator)
/// condition; every other key is ignored.
pub fn build_filter_query(
    params: &[(String, String)],
    allowed: &AllowedFilters,
    special: &SpecialFilters,
) -> FilterQuery {
    let mut literal: Vec<(&str, Vec<&str>)> = Vec::new();
    let mut operators = FilterQuery::new();
    let mut fragments = Vec::new();

    for (key, value) in params {
        if is_reserved(key) {
            continue;
        }

        if let Some(transform) = special.get(key) {
            fragments.push(transform.apply(value));
            continue;
        }

        if allowed.contains(key) {
            match literal.iter_mut().find(|(k, _)| *k == key.as_str()) {
                Some((_, values)) => values.push(value),
                None => literal.push((key, vec![value])),
            }
            continue;
        }

        if let Some((field, op)) = split_operator(key) {
            if allowed.contains(field) {
                if let Some(condition) = operator_condition(op, value) {
                    operators.insert(field, condition);
                    continue;
                }
            }
        }

        tracing::debug!(param = %key, "ignoring filter parameter that is not allow-listed");
    }

    let mut query = FilterQuery::new();
    for (field, mut values) in literal {
        let condition = if values.len() == 1 {
            Condition::Eq(JsonValue::String(values.remove(0).to_string()))
        } else {
            Condition::In(
                values
                    .into_iter()
                    .map(|v| JsonValue::String(v.to_string()))
                    .collect(),
            )
        };
        query.insert(field, condition);
    }
    query.merge(operators);
    for fragment in fragments {
        query.merge(fragment);
    }
    query
}

fn operator_condition(op: &str, raw: &str) -> Option<Condition> {
    if let Some(range) = RangeOp::parse(op) {
        return Some(Condition::bound(range, scalar_from_raw(raw)));
    }
    match op {
        "ne" => Some(Condition::Ne(JsonValue::String(raw.to_string()))),
        "contains" => {
            let term = raw.trim();
            (!term.is_empty()).then(|| Condition::Contains(term.to_string()))
        }
        "in" => {
            let values: Vec<JsonValue> = raw
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| JsonValue::String(v.to_string()))
                .collect();
            if values.is_empty() {
                None
            } else {
                Some(Condition::In(values))
            }
        }
        _ => None,
    }
}
