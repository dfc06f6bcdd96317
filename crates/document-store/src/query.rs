use serde::Serialize;

/// Equality filter on a top-level field of the document body.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: serde_json::Value,
}

/// Builder for document lookups within a collection.
///
/// All filters must match (logical AND). Results come back in insertion
/// order, then `offset` and `limit` are applied.
#[derive(Debug, Clone, Default)]
pub struct DocumentQuery {
    /// Field equality filters.
    pub filters: Vec<FieldFilter>,

    /// Maximum number of documents to return.
    pub limit: Option<usize>,

    /// Number of documents to skip.
    pub offset: Option<usize>,
}

impl DocumentQuery {
    /// Creates a query matching every document of the collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `field` to equal the JSON form of `value`.
    pub fn eq(mut self, field: impl Into<String>, value: impl Serialize) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            value: serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
        });
        self
    }

    /// Limits the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips the first `offset` results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns true if `body` satisfies every filter.
    pub fn matches(&self, body: &serde_json::Value) -> bool {
        self.filters
            .iter()
            .all(|filter| body.get(&filter.field) == Some(&filter.value))
    }

    /// Returns the filters folded into one JSON object, suitable for a
    /// JSONB containment (`@>`) predicate.
    pub fn containment_object(&self) -> serde_json::Value {
        let map = self
            .filters
            .iter()
            .map(|f| (f.field.clone(), f.value.clone()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_query_matches_everything() {
        let query = DocumentQuery::new();
        assert!(query.matches(&json!({"status": "available"})));
        assert!(query.matches(&json!({})));
    }

    #[test]
    fn all_filters_must_match() {
        let query = DocumentQuery::new()
            .eq("status", "available")
            .eq("is_suspended", false);

        assert!(query.matches(&json!({"status": "available", "is_suspended": false})));
        assert!(!query.matches(&json!({"status": "available", "is_suspended": true})));
        assert!(!query.matches(&json!({"status": "available"})));
    }

    #[test]
    fn null_filter_matches_only_explicit_null() {
        let query = DocumentQuery::new().eq("parent_id", Option::<String>::None);
        assert!(query.matches(&json!({"parent_id": null})));
        assert!(!query.matches(&json!({})));
    }

    #[test]
    fn containment_object_merges_filters() {
        let query = DocumentQuery::new().eq("a", 1).eq("b", "x").limit(5);
        assert_eq!(query.containment_object(), json!({"a": 1, "b": "x"}));
        assert_eq!(query.limit, Some(5));
    }
}
