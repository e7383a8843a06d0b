//! Translation of [`ListingCriteria`] into a parametrised `WHERE` clause.
//!
//! User input only ever reaches SQLite as bound parameters; the clause text
//! is assembled from fixed fragments.

use annonces_shared::ListingCriteria;
use rusqlite::types::Value;

/// A `WHERE ...` clause (or an empty string) and its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub clause: String,
    pub params: Vec<Value>,
}

pub fn build_predicate(criteria: &ListingCriteria) -> Predicate {
    let mut where_parts: Vec<&'static str> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    if let Some(id) = criteria.id {
        where_parts.push("id = ?");
        params.push(Value::Integer(id));
    }
    if let Some(category) = criteria.category {
        where_parts.push("category = ?");
        params.push(Value::Text(category.as_str().to_string()));
    }
    if let Some(listing_type) = criteria.listing_type {
        where_parts.push("listing_type = ?");
        params.push(Value::Text(listing_type.as_str().to_string()));
    }
    if let Some(city) = criteria.city_filter() {
        where_parts.push("city LIKE ? ESCAPE '!'");
        params.push(Value::Text(format!("%{}%", escape_like(city))));
    }
    if let Some(min) = criteria.price_min {
        where_parts.push("price >= ?");
        params.push(Value::Real(min));
    }
    if let Some(max) = criteria.effective_price_max() {
        where_parts.push("price <= ?");
        params.push(Value::Real(max));
    }
    if let Some(status) = criteria.effective_status() {
        where_parts.push("status = ?");
        params.push(Value::Text(status.as_str().to_string()));
    }

    let clause = if where_parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", where_parts.join(" AND "))
    };

    Predicate { clause, params }
}

/// Escape LIKE wildcards with `!` so a city typed as `50%` matches literally.
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '!' | '%' | '_') {
            out.push('!');
        }
        out.push(ch);
    }
    out
}
