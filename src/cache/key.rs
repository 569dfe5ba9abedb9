//! Cache key derivation.

use std::collections::BTreeMap;

use serde_json::Value;

/// Deterministic key for a request: `METHOD:path:params:body`.
///
/// Params are serialized in sorted order; a missing body is rendered as `null`.
pub fn cache_key(
    method: &str,
    path: &str,
    params: &BTreeMap<String, String>,
    body: Option<&Value>,
) -> String {
    let params = serde_json::to_string(params).unwrap_or_default();
    let body = body.map(Value::to_string).unwrap_or_else(|| "null".to_string());
    format!("{}:{}:{}:{}", method.to_ascii_uppercase(), path, params, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_is_order_independent() {
        let mut a = BTreeMap::new();
        a.insert("cargo".to_string(), "Analista".to_string());
        a.insert("page".to_string(), "1".to_string());
        let mut b = BTreeMap::new();
        b.insert("page".to_string(), "1".to_string());
        b.insert("cargo".to_string(), "Analista".to_string());

        assert_eq!(
            cache_key("get", "/api/blocos", &a, None),
            cache_key("GET", "/api/blocos", &b, None)
        );
    }

    #[test]
    fn test_key_format() {
        let key = cache_key("GET", "/api/plans", &BTreeMap::new(), None);
        assert_eq!(key, "GET:/api/plans:{}:null");

        let body = json!({"cargo": "A"});
        let key = cache_key("POST", "/api/x", &BTreeMap::new(), Some(&body));
        assert_eq!(key, r#"POST:/api/x:{}:{"cargo":"A"}"#);
    }

    #[test]
    fn test_distinct_params_distinct_keys() {
        let mut a = BTreeMap::new();
        a.insert("cargo".to_string(), "A".to_string());
        let mut b = BTreeMap::new();
        b.insert("cargo".to_string(), "B".to_string());
        assert_ne!(
            cache_key("GET", "/api/blocos", &a, None),
            cache_key("GET", "/api/blocos", &b, None)
        );
    }
}
