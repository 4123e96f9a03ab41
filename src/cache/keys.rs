//! Cache Key Builder
//!
//! One canonical way to turn a request shape into a store key:
//!
//! ```text
//! {namespace}:{path}[:u={principal}]:{canonical query}
//! ```
//!
//! The namespace leads so resource globs such as `agendamentos_*` keep
//! matching. The query is rendered as a JSON object with sorted keys, so
//! `?b=2&a=1` and `?a=1&b=2` share an entry while any differing parameter
//! yields a different key.

use std::collections::BTreeMap;

use serde_json::Value;

/// Builder for a single cache key.
#[derive(Debug, Clone, Default)]
pub struct CacheKey {
    namespace: String,
    path: Option<String>,
    principal: Option<String>,
    query: Vec<(String, String)>,
}

impl CacheKey {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Scopes the key to one authenticated principal.
    pub fn principal(mut self, id: impl Into<String>) -> Self {
        self.principal = Some(id.into());
        self
    }

    /// Adds decoded query pairs. Order of arrival does not matter.
    pub fn query<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn build(&self) -> String {
        let mut key = self.namespace.clone();
        if let Some(path) = &self.path {
            key.push(':');
            key.push_str(path);
        }
        if let Some(principal) = &self.principal {
            key.push_str(":u=");
            key.push_str(principal);
        }
        if self.path.is_some() || !self.query.is_empty() {
            key.push(':');
            key.push_str(&canonical_query(&self.query));
        }
        key
    }
}

/// Renders query pairs as a JSON object with lexicographically sorted keys.
///
/// A parameter given once maps to a string; a repeated parameter maps to
/// an array keeping the values in request order, since `?id=2&id=1` may
/// mean something different from `?id=1&id=2`.
pub fn canonical_query(pairs: &[(String, String)]) -> String {
    let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (k, v) in pairs {
        grouped.entry(k.as_str()).or_default().push(v.as_str());
    }

    let object = grouped
        .into_iter()
        .map(|(k, mut values)| {
            let value = if values.len() == 1 {
                Value::String(values.remove(0).to_string())
            } else {
                Value::Array(values.into_iter().map(|v| Value::String(v.to_string())).collect())
            };
            (k.to_string(), value)
        })
        .collect::<serde_json::Map<String, Value>>();

    Value::Object(object).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_canonical_query_sorts_keys() {
        let a = canonical_query(&pairs(&[("status", "pago"), ("page", "2")]));
        let b = canonical_query(&pairs(&[("page", "2"), ("status", "pago")]));
        assert_eq!(a, b);
        assert_eq!(a, r#"{"page":"2","status":"pago"}"#);
    }

    #[test]
    fn test_canonical_query_repeated_params() {
        let q = canonical_query(&pairs(&[("id", "3"), ("page", "1"), ("id", "1")]));
        assert_eq!(q, r#"{"id":["3","1"],"page":"1"}"#);
    }

    #[test]
    fn test_canonical_query_empty() {
        assert_eq!(canonical_query(&[]), "{}");
    }

    #[test]
    fn test_build_full_key() {
        let key = CacheKey::new("agendamentos_list")
            .path("/admin/agendamentos")
            .principal("17")
            .query([("status", "confirmado")])
            .build();

        assert_eq!(
            key,
            r#"agendamentos_list:/admin/agendamentos:u=17:{"status":"confirmado"}"#
        );
    }

    #[test]
    fn test_build_namespace_only() {
        assert_eq!(CacheKey::new("dashboard_totals").build(), "dashboard_totals");
    }

    #[test]
    fn test_path_without_query() {
        let key = CacheKey::new("clientes_list").path("/admin/clientes").build();
        assert_eq!(key, "clientes_list:/admin/clientes:{}");
    }

    #[test]
    fn test_single_param_changes_key() {
        let base = CacheKey::new("clientes_list").path("/admin/clientes");
        let a = base.clone().query([("page", "1")]).build();
        let b = base.query([("page", "2")]).build();
        assert_ne!(a, b);
    }

    #[test]
    fn test_principal_changes_key() {
        let base = CacheKey::new("creditos_list").path("/admin/creditos");
        let a = base.clone().principal("1").build();
        let b = base.principal("2").build();
        assert_ne!(a, b);
    }
}
