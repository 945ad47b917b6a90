//! PostgREST filter builder.
//!
//! Renders horizontal filters (`col=op.value`), `or` groups, ordering and
//! pagination into query pairs that reqwest URL-encodes.

use std::fmt::Display;

/// Query builder for PostgREST table requests.
///
/// Builder methods consume and return `self`, so filters chain:
///
/// ```rust
/// use ushop_api::supabase::Filter;
///
/// let filter = Filter::new()
///     .select("id,business_name")
///     .eq("status", "approved")
///     .order_desc("created_at")
///     .limit(10);
///
/// let pairs = filter.to_pairs();
/// assert!(pairs.contains(&("status".to_string(), "eq.approved".to_string())));
/// assert!(pairs.contains(&("order".to_string(), "created_at.desc.nullslast".to_string())));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    select: Option<String>,
    conditions: Vec<(String, String)>,
    order: Vec<String>,
    limit: Option<u32>,
    offset: Option<u32>,
}

impl Filter {
    /// An empty filter (all rows, all columns).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Column list, including embedded resources (e.g. `*,vendors!inner(status)`).
    #[must_use]
    pub fn select(mut self, columns: &str) -> Self {
        self.select = Some(columns.to_string());
        self
    }

    /// `column = value`
    #[must_use]
    pub fn eq(self, column: &str, value: impl Display) -> Self {
        self.op(column, "eq", value)
    }

    /// `column <> value`
    #[must_use]
    pub fn neq(self, column: &str, value: impl Display) -> Self {
        self.op(column, "neq", value)
    }

    /// `column >= value`
    #[must_use]
    pub fn gte(self, column: &str, value: impl Display) -> Self {
        self.op(column, "gte", value)
    }

    /// `column <= value`
    #[must_use]
    pub fn lte(self, column: &str, value: impl Display) -> Self {
        self.op(column, "lte", value)
    }

    /// `column IS NULL`
    #[must_use]
    pub fn is_null(self, column: &str) -> Self {
        self.op(column, "is", "null")
    }

    /// `column IN (values...)`. Each value is double-quoted.
    #[must_use]
    pub fn in_<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Display,
    {
        let list = values
            .into_iter()
            .map(|v| quote(&v.to_string()))
            .collect::<Vec<_>>()
            .join(",");
        self.op(column, "in", format!("({list})"))
    }

    /// Case-insensitive substring match on one column.
    #[must_use]
    pub fn ilike(self, column: &str, term: &str) -> Self {
        let pattern = format!("*{}*", escape_like(term));
        self.op(column, "ilike", pattern)
    }

    /// Case-insensitive substring match on any of `columns`.
    ///
    /// Renders `or=(a.ilike."*term*",b.ilike."*term*")`. The term is
    /// quoted, so commas and parentheses in user input stay literal.
    #[must_use]
    pub fn or_ilike(mut self, columns: &[&str], term: &str) -> Self {
        let pattern = quote(&format!("*{}*", escape_like(term)));
        let group = columns
            .iter()
            .map(|c| format!("{c}.ilike.{pattern}"))
            .collect::<Vec<_>>()
            .join(",");
        self.conditions.push(("or".to_string(), format!("({group})")));
        self
    }

    /// Disjunction of simple conditions, e.g. `[("price_max", "gte", "10"), ("price_min", "gte", "10")]`.
    ///
    /// Values are quoted like [`Filter::in_`]. PostgREST accepts one `or`
    /// group per request level, so do not combine with [`Filter::or_ilike`].
    #[must_use]
    pub fn or_any(mut self, conditions: &[(&str, &str, String)]) -> Self {
        let group = conditions
            .iter()
            .map(|(column, op, value)| format!("{column}.{op}.{}", quote(value)))
            .collect::<Vec<_>>()
            .join(",");
        self.conditions.push(("or".to_string(), format!("({group})")));
        self
    }

    /// Ascending sort on `column`. Repeated calls add tie-breakers.
    #[must_use]
    pub fn order_asc(mut self, column: &str) -> Self {
        self.order.push(format!("{column}.asc"));
        self
    }

    /// Descending sort on `column`, nulls last.
    #[must_use]
    pub fn order_desc(mut self, column: &str) -> Self {
        self.order.push(format!("{column}.desc.nullslast"));
        self
    }

    /// Maximum number of rows.
    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Rows to skip.
    #[must_use]
    pub const fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Conditions only (no select, order or pagination), for PATCH/DELETE/HEAD.
    #[must_use]
    pub fn condition_pairs(&self) -> Vec<(String, String)> {
        self.conditions.clone()
    }

    /// All query pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.conditions.len() + 4);
        if let Some(select) = &self.select {
            pairs.push(("select".to_string(), select.clone()));
        }
        pairs.extend(self.conditions.iter().cloned());
        if !self.order.is_empty() {
            pairs.push(("order".to_string(), self.order.join(",")));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset".to_string(), offset.to_string()));
        }
        pairs
    }

    fn op(mut self, column: &str, op: &str, value: impl Display) -> Self {
        self.conditions
            .push((column.to_string(), format!("{op}.{value}")));
        self
    }
}

/// Escape LIKE metacharacters in user input.
///
/// `%` and `_` are backslash-escaped, `\` is doubled, and `*` (PostgREST's
/// alias for `%`) is dropped.
#[must_use]
pub fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        match c {
            '\\' | '%' | '_' => {
                out.push('\\');
                out.push(c);
            }
            '*' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Double-quote a value for use inside `in.(...)` or `or=(...)`.
fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn test_empty_filter_has_no_pairs() {
        assert!(Filter::new().to_pairs().is_empty());
    }

    #[test]
    fn test_pair_order_is_select_conditions_order_pagination() {
        let pairs = Filter::new()
            .limit(5)
            .eq("vendor_id", "v1")
            .select("*")
            .order_asc("name")
            .offset(10)
            .to_pairs();
        assert_eq!(
            pairs,
            vec![
                pair("select", "*"),
                pair("vendor_id", "eq.v1"),
                pair("order", "name.asc"),
                pair("limit", "5"),
                pair("offset", "10"),
            ]
        );
    }

    #[test]
    fn test_multiple_orders_join() {
        let pairs = Filter::new()
            .order_desc("created_at")
            .order_asc("id")
            .to_pairs();
        assert_eq!(pairs, vec![pair("order", "created_at.desc.nullslast,id.asc")]);
    }

    #[test]
    fn test_ilike_escapes_wildcards() {
        let pairs = Filter::new().ilike("name", "50%_off*").to_pairs();
        assert_eq!(pairs, vec![pair("name", "ilike.*50\\%\\_off*")]);
    }

    #[test]
    fn test_or_ilike_quotes_reserved_characters() {
        let pairs = Filter::new()
            .or_ilike(&["name", "description"], "tea, (green)")
            .to_pairs();
        assert_eq!(
            pairs,
            vec![pair(
                "or",
                "(name.ilike.\"*tea, (green)*\",description.ilike.\"*tea, (green)*\")"
            )]
        );
    }

    #[test]
    fn test_or_ilike_escapes_quotes() {
        let pairs = Filter::new().or_ilike(&["name"], "12\" pizza").to_pairs();
        assert_eq!(pairs, vec![pair("or", "(name.ilike.\"*12\\\" pizza*\")")]);
    }

    #[test]
    fn test_or_any() {
        let pairs = Filter::new()
            .or_any(&[
                ("price_max", "gte", "10".to_string()),
                ("price_min", "gte", "10".to_string()),
            ])
            .to_pairs();
        assert_eq!(
            pairs,
            vec![pair("or", "(price_max.gte.\"10\",price_min.gte.\"10\")")]
        );
    }

    #[test]
    fn test_in_quotes_each_value() {
        let pairs = Filter::new().in_("id", ["a", "b,c"]).to_pairs();
        assert_eq!(pairs, vec![pair("id", "in.(\"a\",\"b,c\")")]);
    }

    #[test]
    fn test_condition_pairs_excludes_pagination() {
        let filter = Filter::new().eq("id", "x").limit(1).order_asc("id");
        assert_eq!(filter.condition_pairs(), vec![pair("id", "eq.x")]);
    }

    #[test]
    fn test_escape_like_backslash() {
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }
}
