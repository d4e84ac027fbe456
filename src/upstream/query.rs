// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Filter, ordering and limit parameters in the PostgREST query dialect.
//!
//! | Builder call | Rendered parameter |
//! |--------------|--------------------|
//! | `eq("status", "published")` | `status=eq.published` |
//! | `contains("tags", "rust")` | `tags=cs.{"rust"}` |
//! | `order("up_count", Desc)` + `order("down_count", Asc)` | `order=up_count.desc,down_count.asc` |
//! | `limit(1)` | `limit=1` |

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Asc => write!(f, "asc"),
            Direction::Desc => write!(f, "desc"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Filter {
    Eq { field: String, value: String },
    Contains { field: String, value: String },
}

impl Filter {
    fn to_param(&self) -> (String, String) {
        match self {
            Filter::Eq { field, value } => (field.clone(), format!("eq.{value}")),
            Filter::Contains { field, value } => {
                (field.clone(), format!("cs.{{{}}}", array_element(value)))
            }
        }
    }
}

/// Quote one element of a Postgres array literal so commas, braces and
/// quotes in user input stay inside the element.
fn array_element(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Query parameters for one data-service request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    filters: Vec<Filter>,
    order: Vec<(String, Direction)>,
    limit: Option<u32>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Equality filter: `field=eq.<value>`.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(Filter::Eq {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Array containment filter: `field=cs.{"<value>"}`.
    pub fn contains(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(Filter::Contains {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Append a sort key. Keys apply in the order they are added.
    pub fn order(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order.push((field.into(), direction));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }

    /// Render as `(name, value)` pairs ready for URL encoding.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> =
            self.filters.iter().map(Filter::to_param).collect();

        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|(field, direction)| format!("{field}.{direction}"))
                .collect::<Vec<_>>()
                .join(",");
            params.push(("order".to_string(), order));
        }

        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }

        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn renders_equality_and_containment() {
        let query = Query::new()
            .eq("status", "published")
            .contains("tags", "rust");
        assert_eq!(
            query.to_params(),
            expected(&[("status", "eq.published"), ("tags", r#"cs.{"rust"}"#)])
        );
    }

    #[test]
    fn containment_value_stays_a_single_element() {
        let render = |tag: &str| Query::new().contains("tags", tag).to_params()[0].1.clone();
        assert_eq!(render("a,b"), r#"cs.{"a,b"}"#);
        assert_eq!(render("x}"), r#"cs.{"x}"}"#);
        assert_eq!(render(r#"say "hi""#), r#"cs.{"say \"hi\""}"#);
        assert_eq!(render(r"back\slash"), r#"cs.{"back\\slash"}"#);
    }

    #[test]
    fn renders_multi_key_order_and_limit() {
        let query = Query::new()
            .order("up_count", Direction::Desc)
            .order("down_count", Direction::Asc)
            .limit(1);
        assert_eq!(
            query.to_params(),
            expected(&[("order", "up_count.desc,down_count.asc"), ("limit", "1")])
        );
    }

    #[test]
    fn empty_query_renders_nothing() {
        let query = Query::new();
        assert!(query.to_params().is_empty());
        assert!(!query.has_filters());
        assert!(Query::new().eq("id", "1").has_filters());
    }
}
