//! Builders for statements whose shape depends on which fields are present.
//!
//! Both builders keep the SQL text and the bound values side by side. A
//! placeholder index is always derived from the number of values pushed so
//! far, so numbering stays sequential whatever subset of fields is active.

use sqlx::{sqlite::SqliteArguments, Arguments};
use thiserror::Error;

/// A value bound to a numbered placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Integer(i64),
    Real(f64),
    Text(String),
    Null,
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl SqlValue {
    fn add_to(self, args: &mut SqliteArguments<'_>) {
        match self {
            Self::Integer(value) => args.add(value),
            Self::Real(value) => args.add(value),
            Self::Text(value) => args.add(value),
            Self::Null => args.add(Option::<i64>::None),
        }
    }
}

fn into_arguments<'q>(values: Vec<SqlValue>) -> SqliteArguments<'q> {
    let mut args = SqliteArguments::default();
    for value in values {
        value.add_to(&mut args);
    }
    args
}

fn placeholder(position: usize) -> String {
    format!("?{position}")
}

/// Errors raised while assembling a dynamic statement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("no data to update")]
    EmptyUpdate,
    #[error("field has no column mapping: {0}")]
    UnknownField(String),
}

/// AND-ed list of predicates with their positional values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    predicates: Vec<String>,
    values: Vec<SqlValue>,
}

impl WhereClause {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a predicate that references one new value.
    ///
    /// `render` receives the placeholder assigned to `value` (for example
    /// `?2`) and returns the predicate text.
    pub fn and_bound<F>(&mut self, value: impl Into<SqlValue>, render: F) -> &mut Self
    where
        F: FnOnce(&str) -> String,
    {
        self.values.push(value.into());
        let slot = placeholder(self.values.len());
        self.predicates.push(render(&slot));
        self
    }

    /// Appends a predicate that needs no bound value.
    pub fn and_raw(&mut self, predicate: &str) -> &mut Self {
        self.predicates.push(predicate.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Renders ` WHERE a AND b`, or an empty string when nothing was added.
    pub fn to_sql(&self) -> String {
        if self.predicates.is_empty() {
            return String::new();
        }
        format!(" WHERE {}", self.predicates.join(" AND "))
    }

    pub fn into_arguments<'q>(self) -> SqliteArguments<'q> {
        into_arguments(self.values)
    }
}

/// `SET` clause for an update touching only the supplied fields.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialUpdate {
    assignments: Vec<String>,
    values: Vec<SqlValue>,
}

impl PartialUpdate {
    /// Maps each `(field, value)` pair to `column = ?N` using `columns`.
    ///
    /// Fails with [`QueryError::EmptyUpdate`] when `fields` yields nothing.
    pub fn build<'a, I>(fields: I, columns: &[(&str, &str)]) -> Result<Self, QueryError>
    where
        I: IntoIterator<Item = (&'a str, SqlValue)>,
    {
        let mut assignments = Vec::new();
        let mut values = Vec::new();

        for (field, value) in fields {
            let column = columns
                .iter()
                .find(|(name, _)| *name == field)
                .map(|(_, column)| *column)
                .ok_or_else(|| QueryError::UnknownField(field.to_string()))?;
            values.push(value);
            assignments.push(format!("{column} = {}", placeholder(values.len())));
        }

        if assignments.is_empty() {
            return Err(QueryError::EmptyUpdate);
        }

        Ok(Self {
            assignments,
            values,
        })
    }

    /// Comma separated assignments, e.g. `title = ?1, salary = ?2`.
    pub fn set_clause(&self) -> String {
        self.assignments.join(", ")
    }

    /// Appends the row key after the assigned values and returns its placeholder.
    pub fn bind_key(&mut self, key: impl Into<SqlValue>) -> String {
        self.values.push(key.into());
        placeholder(self.values.len())
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    pub fn into_arguments<'q>(self) -> SqliteArguments<'q> {
        into_arguments(self.values)
    }
}

/// Wraps `needle` in `%` wildcards, escaping `\`, `%` and `_` so they match
/// literally under `LIKE ... ESCAPE '\'`.
pub fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &[(&str, &str)] = &[
        ("title", "title"),
        ("numEmployees", "num_employees"),
        ("logoUrl", "logo_url"),
    ];

    #[test]
    fn empty_where_clause_renders_nothing() {
        let clause = WhereClause::new();
        assert!(clause.is_empty());
        assert_eq!(clause.to_sql(), "");
        assert!(clause.values().is_empty());
    }

    #[test]
    fn placeholders_follow_value_count() {
        let mut clause = WhereClause::new();
        clause
            .and_bound("%eng%", |slot| format!("j.title LIKE {slot}"))
            .and_raw("j.equity > 0")
            .and_bound(70_000_i64, |slot| format!("j.salary >= {slot}"));

        assert_eq!(
            clause.to_sql(),
            " WHERE j.title LIKE ?1 AND j.equity > 0 AND j.salary >= ?2"
        );
        assert_eq!(
            clause.values(),
            &[SqlValue::from("%eng%"), SqlValue::Integer(70_000)]
        );
    }

    #[test]
    fn first_present_criterion_takes_first_placeholder() {
        let mut clause = WhereClause::new();
        clause.and_bound(0_i64, |slot| format!("j.salary >= {slot}"));
        assert_eq!(clause.to_sql(), " WHERE j.salary >= ?1");
        assert_eq!(clause.values(), &[SqlValue::Integer(0)]);
    }

    #[test]
    fn raw_only_clause_binds_no_values() {
        let mut clause = WhereClause::new();
        clause.and_raw("j.equity > 0");
        assert_eq!(clause.to_sql(), " WHERE j.equity > 0");
        assert!(clause.values().is_empty());
    }

    #[test]
    fn partial_update_maps_fields_in_order() {
        let update = PartialUpdate::build(
            [
                ("numEmployees", SqlValue::Integer(12)),
                ("title", SqlValue::from("Widgets")),
            ],
            COLUMNS,
        )
        .expect("build update");

        assert_eq!(update.set_clause(), "num_employees = ?1, title = ?2");
        assert_eq!(
            update.values(),
            &[SqlValue::Integer(12), SqlValue::from("Widgets")]
        );
    }

    #[test]
    fn key_takes_final_placeholder() {
        let mut update = PartialUpdate::build([("logoUrl", SqlValue::Null)], COLUMNS)
            .expect("build update");
        let key = update.bind_key(41_i64);

        assert_eq!(update.set_clause(), "logo_url = ?1");
        assert_eq!(key, "?2");
        assert_eq!(update.values(), &[SqlValue::Null, SqlValue::Integer(41)]);
    }

    #[test]
    fn empty_update_is_rejected() {
        let fields: Vec<(&str, SqlValue)> = Vec::new();
        let err = PartialUpdate::build(fields, COLUMNS).unwrap_err();
        assert_eq!(err, QueryError::EmptyUpdate);
    }

    #[test]
    fn unmapped_field_is_rejected() {
        let err = PartialUpdate::build([("handle", SqlValue::from("x"))], COLUMNS).unwrap_err();
        assert_eq!(err, QueryError::UnknownField("handle".to_string()));
    }

    #[test]
    fn option_values_become_null() {
        assert_eq!(SqlValue::from(None::<i64>), SqlValue::Null);
        assert_eq!(SqlValue::from(Some(0.5_f64)), SqlValue::Real(0.5));
    }

    #[test]
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("eng"), "%eng%");
        assert_eq!(contains_pattern("100%_"), "%100\\%\\_%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }
}
