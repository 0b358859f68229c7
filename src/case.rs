//! Identifier helpers: labels derived from field keys, embed resource names, camelCase config keys.

/// Separator joining a parent resource name and an embedded field key.
pub const EMBED_SEPARATOR: &str = "__";

/// Display label for a key: first letter uppercased, underscores to spaces.
/// e.g. "unit_price" -> "Unit price", "id" -> "Id"
pub fn humanize(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Name of the resource synthesized for an embedded field.
/// e.g. ("post", "comment") -> "post__comment"
pub fn embed_name(parent: &str, field: &str) -> String {
    format!("{}{}{}", parent, EMBED_SEPARATOR, field)
}

/// Convert a single identifier from camelCase to snake_case.
/// e.g. "listPaginated" -> "list_paginated", "orderBy" -> "order_by"
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
