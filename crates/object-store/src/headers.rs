//! Header plumbing shared by the store and container clients.

use std::collections::BTreeMap;
use std::str::FromStr;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};

use crate::error::ObjectStoreError;

pub(crate) const CONTAINER_META_PREFIX: &str = "x-container-meta-";
pub(crate) const OBJECT_META_PREFIX: &str = "x-object-meta-";

/// The baseline headers for an authenticated object storage request.
pub(crate) fn token_headers(token: &str) -> Result<HeaderMap, ObjectStoreError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        "X-Auth-Token",
        HeaderValue::from_str(token).map_err(http::Error::from)?,
    );
    Ok(headers)
}

/// Collect `<prefix><name>: value` pairs out of response headers.
/// Values are taken verbatim; nothing is decoded beyond the name strip.
pub(crate) fn decode_prefixed(headers: &HeaderMap, prefix: &str) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    for (name, value) in headers {
        if let Some(stripped) = name.as_str().strip_prefix(prefix) {
            if let Ok(value) = value.to_str() {
                metadata.insert(stripped.to_string(), value.to_string());
            }
        }
    }
    metadata
}

/// Merge `name -> value` pairs into outgoing headers as
/// `<prefix><name>: value`. Names that are not valid header tokens are
/// rejected rather than silently mangled.
pub(crate) fn merge_prefixed(
    headers: &mut HeaderMap,
    prefix: &str,
    metadata: &BTreeMap<String, String>,
) -> Result<(), ObjectStoreError> {
    for (name, value) in metadata {
        let header = HeaderName::from_str(&format!("{}{}", prefix, name))
            .map_err(http::Error::from)?;
        headers.insert(header, HeaderValue::from_str(value).map_err(http::Error::from)?);
    }
    Ok(())
}

/// Read a numeric response header, defaulting to zero when absent or
/// unparseable.
pub(crate) fn numeric_header(headers: &HeaderMap, name: &str) -> u64 {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_prefixed() {
        let mut headers = HeaderMap::new();
        headers.insert("x-container-meta-a", HeaderValue::from_static("a"));
        headers.insert(
            "x-container-meta-some-long-string",
            HeaderValue::from_static("long value"),
        );
        headers.insert("x-container-bytes-used", HeaderValue::from_static("42"));

        let md = decode_prefixed(&headers, CONTAINER_META_PREFIX);
        assert_eq!(md.len(), 2);
        assert_eq!(md["a"], "a");
        assert_eq!(md["some-long-string"], "long value");
    }

    #[test]
    fn test_merge_prefixed() {
        let mut metadata = BTreeMap::new();
        metadata.insert("foo".to_string(), "1".to_string());
        metadata.insert("bar".to_string(), "baz".to_string());

        let mut headers = HeaderMap::new();
        merge_prefixed(&mut headers, OBJECT_META_PREFIX, &metadata).unwrap();
        assert_eq!(headers.get("x-object-meta-foo").unwrap(), "1");
        assert_eq!(headers.get("x-object-meta-bar").unwrap(), "baz");
    }

    #[test]
    fn test_merge_rejects_bad_names() {
        let mut metadata = BTreeMap::new();
        metadata.insert("not a token".to_string(), "v".to_string());

        let mut headers = HeaderMap::new();
        let err = merge_prefixed(&mut headers, OBJECT_META_PREFIX, &metadata).unwrap_err();
        assert!(matches!(err, ObjectStoreError::Header(_)));
    }

    #[test]
    fn test_numeric_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-container-object-count", HeaderValue::from_static("17"));
        assert_eq!(numeric_header(&headers, "x-container-object-count"), 17);
        assert_eq!(numeric_header(&headers, "x-container-bytes-used"), 0);
    }
}
