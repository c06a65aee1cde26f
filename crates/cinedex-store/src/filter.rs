//! Document filters
//!
//! A `Filter` is a conjunction of field conditions. It is evaluated in
//! process by the memory store and compiled to a SurrealQL `WHERE` clause
//! by the SurrealDB store, so both backends agree on what matches.
//!
//! Author: hephaex@gmail.com

use cinedex_core::{CinedexError, Result};
use serde_json::Value;

/// Single field condition
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Field equals value exactly
    Equals { field: String, value: Value },
    /// Field differs from value
    NotEquals { field: String, value: Value },
    /// String field equals value, ignoring case
    EqualsIgnoreCase { field: String, value: String },
    /// String field contains value, ignoring case
    ContainsIgnoreCase { field: String, value: String },
}

impl Condition {
    pub fn field(&self) -> &str {
        match self {
            Self::Equals { field, .. }
            | Self::NotEquals { field, .. }
            | Self::EqualsIgnoreCase { field, .. }
            | Self::ContainsIgnoreCase { field, .. } => field,
        }
    }

    fn matches(&self, document: &Value) -> bool {
        let actual = document.get(self.field());
        match self {
            Self::Equals { value, .. } => actual == Some(value),
            Self::NotEquals { value, .. } => actual != Some(value),
            Self::EqualsIgnoreCase { value, .. } => actual
                .and_then(Value::as_str)
                .is_some_and(|s| s.to_lowercase() == value.to_lowercase()),
            Self::ContainsIgnoreCase { value, .. } => actual
                .and_then(Value::as_str)
                .is_some_and(|s| s.to_lowercase().contains(&value.to_lowercase())),
        }
    }
}

/// Conjunction of conditions. An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    /// Match everything
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Equals {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn ne(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::NotEquals {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn eq_ignore_case(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions.push(Condition::EqualsIgnoreCase {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn contains_ignore_case(
        mut self,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.conditions.push(Condition::ContainsIgnoreCase {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Whether `document` satisfies every condition
    pub fn matches(&self, document: &Value) -> bool {
        self.conditions.iter().all(|c| c.matches(document))
    }

    /// Reject field names that are not plain identifiers.
    ///
    /// Field names end up inside SurrealQL text, values never do.
    pub fn validate(&self) -> Result<()> {
        for condition in &self.conditions {
            let field = condition.field();
            if !is_identifier(field) {
                return Err(CinedexError::InvalidFilter(format!(
                    "field name '{field}' is not an identifier"
                )));
            }
        }
        Ok(())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(Filter::all().matches(&json!({})));
        assert!(Filter::all().matches(&json!({"name": "Drama"})));
    }

    #[test]
    fn test_exact_and_case_insensitive_matching() {
        let doc = json!({"name": "Science Fiction", "genre_id": "g-1"});

        assert!(Filter::all().eq("genre_id", "g-1").matches(&doc));
        assert!(!Filter::all().eq("genre_id", "G-1").matches(&doc));
        assert!(Filter::all()
            .eq_ignore_case("name", "science fiction")
            .matches(&doc));
        assert!(Filter::all()
            .contains_ignore_case("name", "FICT")
            .matches(&doc));
        assert!(!Filter::all().contains_ignore_case("name", "horror").matches(&doc));
    }

    #[test]
    fn test_conditions_are_conjunctive() {
        let doc = json!({"name": "Drama", "genre_id": "g-1"});

        let filter = Filter::all()
            .eq_ignore_case("name", "drama")
            .ne("genre_id", "g-1");
        assert!(!filter.matches(&doc));

        let filter = Filter::all()
            .eq_ignore_case("name", "drama")
            .ne("genre_id", "g-2");
        assert!(filter.matches(&doc));
    }

    #[test]
    fn test_missing_field_does_not_match() {
        let doc = json!({"name": "Drama"});

        assert!(!Filter::all().eq("topic", "x").matches(&doc));
        assert!(!Filter::all().eq_ignore_case("topic", "x").matches(&doc));
        assert!(Filter::all().ne("topic", "x").matches(&doc));
    }

    #[test]
    fn test_field_names_must_be_identifiers() {
        assert!(Filter::all().eq("user_id", "1").validate().is_ok());
        assert!(Filter::all().eq("name; DELETE user", "1").validate().is_err());
        assert!(Filter::all().eq("", "1").validate().is_err());
        assert!(Filter::all().eq("1name", "1").validate().is_err());
    }
}
