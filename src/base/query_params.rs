use std::collections::HashMap;

/// Parse query parameters from a query string (the part after `?`).
///
/// Handles URL decoding and returns a HashMap of parameter key-value pairs.
/// Multiple values for the same key are not supported (only the last is kept).
///
/// # Example
/// ```
/// use feedboard::base::query_params::parse_query_params;
///
/// let params = parse_query_params("user=john&page=2");
/// assert_eq!(params.get("user"), Some(&"john".to_string()));
/// assert_eq!(params.get("page"), Some(&"2".to_string()));
/// ```
pub fn parse_query_params(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    for param in query.split('&').filter(|p| !p.is_empty()) {
        if let Some(eq_idx) = param.find('=') {
            let key = &param[..eq_idx];
            let encoded_value = &param[eq_idx + 1..];
            let decoded = urlencoding::decode(encoded_value)
                .unwrap_or(std::borrow::Cow::Borrowed(encoded_value))
                .to_string();
            params.insert(key.to_string(), decoded);
        } else {
            // Flag parameter without value
            params.insert(param.to_string(), String::new());
        }
    }

    params
}

/// The raw query string of a request URI, without the leading `?`.
pub fn query_string(uri: &str) -> &str {
    uri.split_once('?').map(|(_, query)| query).unwrap_or("")
}

/// Get a string parameter from parsed query params with optional default
pub fn get_string(params: &HashMap<String, String>, key: &str, default: Option<&str>) -> Option<String> {
    params.get(key)
        .cloned()
        .or_else(|| default.map(|d| d.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_values_and_keeps_flags() {
        let params = parse_query_params("page=2&q=hello%20world&all");
        assert_eq!(get_string(&params, "page", None).as_deref(), Some("2"));
        assert_eq!(get_string(&params, "q", None).as_deref(), Some("hello world"));
        assert_eq!(get_string(&params, "all", None).as_deref(), Some(""));
        assert_eq!(get_string(&params, "missing", Some("1")).as_deref(), Some("1"));
    }

    #[test]
    fn empty_query_has_no_params() {
        assert!(parse_query_params("").is_empty());
        assert_eq!(query_string("/group/cats/"), "");
        assert_eq!(query_string("/group/cats/?page=2"), "page=2");
    }
}
