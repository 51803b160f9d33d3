//! Object metadata.

use std::collections::BTreeMap;

use reqwest::header::HeaderMap;
use serde::Deserialize;

use crate::error::ObjectStoreError;
use crate::headers::{decode_prefixed, numeric_header, OBJECT_META_PREFIX};

pub const DEFAULT_CONTENT_TYPE: &str = "application/x-octet-stream";

/// One object entry from a JSON container listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectRecord {
    pub name: String,
    pub hash: Option<String>,
    pub bytes: Option<u64>,
    pub content_type: Option<String>,
    pub last_modified: Option<String>,
}

/// The data about an object, without the object content itself.
///
/// Used when declaring a new object for saving, in container listings,
/// when fetching just the metadata (HEAD), alongside a downloaded
/// object, and when updating metadata in place.
///
/// Listing entries are *partial*: the JSON carries no metadata,
/// transfer encoding or disposition, and the corresponding accessors
/// report [`ObjectStoreError::PartialRecord`] instead of guessing.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    name: String,
    content_type: String,
    etag: Option<String>,
    content_length: Option<u64>,
    transfer_encoding: Option<String>,
    disposition: Option<String>,
    last_modified: Option<String>,
    metadata: BTreeMap<String, String>,
    additional_headers: BTreeMap<String, String>,
    partial: bool,
}

impl ObjectInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            etag: None,
            content_length: None,
            transfer_encoding: None,
            disposition: None,
            last_modified: None,
            metadata: BTreeMap::new(),
            additional_headers: BTreeMap::new(),
            partial: false,
        }
    }

    pub fn with_content_type(name: impl Into<String>, content_type: impl Into<String>) -> Self {
        let mut info = Self::new(name);
        info.content_type = content_type.into();
        info
    }

    /// Build from a JSON listing entry. The result is partial.
    pub fn from_json(record: ObjectRecord) -> Self {
        let mut info = Self::new(record.name);
        info.partial = true;
        info.etag = record.hash;
        info.content_length = record.bytes;
        if let Some(content_type) = record.content_type {
            info.content_type = content_type;
        }
        info.last_modified = record.last_modified;
        info
    }

    /// Build from the response headers of a GET or HEAD on the object.
    pub fn from_response(name: impl Into<String>, headers: &HeaderMap) -> Self {
        let mut info = Self::new(name);
        let text = |key: &str| {
            headers
                .get(key)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string())
        };
        info.etag = text("etag");
        if let Some(content_type) = text("content-type") {
            info.content_type = content_type;
        }
        if headers.contains_key("content-length") {
            info.content_length = Some(numeric_header(headers, "content-length"));
        }
        info.transfer_encoding = text("transfer-encoding");
        info.disposition = text("content-disposition");
        info.last_modified = text("last-modified");
        info.metadata = decode_metadata(headers);
        info
    }

    // ----------------------------------------------------------------
    // Mutators. All only change the local copy; the server copy
    // changes when the object is saved.
    // ----------------------------------------------------------------

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    pub fn set_metadata(&mut self, metadata: BTreeMap<String, String>) -> &mut Self {
        self.metadata = metadata;
        self
    }

    /// Add one metadata pair, overwriting an existing entry.
    pub fn add_metadatum(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.metadata.insert(name.into(), value.into());
        self
    }

    pub fn delete_metadatum(&mut self, name: &str) -> &mut Self {
        self.metadata.remove(name);
        self
    }

    pub fn has_metadatum(&self, name: &str) -> bool {
        self.metadata.contains_key(name)
    }

    /// Set the content type (MIME type). Encoding parameters are
    /// passed along untouched; nothing is parsed or verified before it
    /// goes to the server.
    pub fn set_content_type(&mut self, content_type: impl Into<String>) -> &mut Self {
        self.content_type = content_type.into();
        self
    }

    pub fn set_etag(&mut self, md5: impl Into<String>) -> &mut Self {
        self.etag = Some(md5.into());
        self
    }

    pub fn set_content_length(&mut self, bytes: u64) -> &mut Self {
        self.content_length = Some(bytes);
        self
    }

    /// Informational only: marking an object gzip does not gzip it.
    pub fn set_transfer_encoding(&mut self, encoding: impl Into<String>) -> &mut Self {
        self.transfer_encoding = Some(encoding.into());
        self
    }

    /// E.g. `attachment; filename=foo.png` to force a download prompt.
    pub fn set_disposition(&mut self, disposition: impl Into<String>) -> &mut Self {
        self.disposition = Some(disposition.into());
        self
    }

    pub fn set_last_modified(&mut self, lastmod: impl Into<String>) -> &mut Self {
        self.last_modified = Some(lastmod.into());
        self
    }

    /// EXPERT: replace the additional raw headers sent with the object.
    pub fn set_additional_headers(&mut self, headers: BTreeMap<String, String>) -> &mut Self {
        self.additional_headers = headers;
        self
    }

    /// EXPERT: drop entries from the additional headers.
    pub fn remove_headers(&mut self, names: &[&str]) -> &mut Self {
        for name in names {
            self.additional_headers.remove(*name);
        }
        self
    }

    // ----------------------------------------------------------------
    // Accessors
    // ----------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The entity tag (an MD5 hash) reported for the object.
    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn last_modified(&self) -> Option<&str> {
        self.last_modified.as_deref()
    }

    /// Whether this record came from a listing and lacks the
    /// header-only fields.
    pub fn is_partial(&self) -> bool {
        self.partial
    }

    pub fn transfer_encoding(&self) -> Result<Option<&str>, ObjectStoreError> {
        if self.partial && self.transfer_encoding.is_none() {
            return Err(ObjectStoreError::PartialRecord("transfer encoding"));
        }
        Ok(self.transfer_encoding.as_deref())
    }

    pub fn disposition(&self) -> Result<Option<&str>, ObjectStoreError> {
        if self.partial && self.disposition.is_none() {
            return Err(ObjectStoreError::PartialRecord("disposition"));
        }
        Ok(self.disposition.as_deref())
    }

    pub fn metadata(&self) -> Result<&BTreeMap<String, String>, ObjectStoreError> {
        if self.partial && self.metadata.is_empty() {
            return Err(ObjectStoreError::PartialRecord("metadata"));
        }
        Ok(&self.metadata)
    }

    pub fn additional_headers(&self) -> &BTreeMap<String, String> {
        &self.additional_headers
    }

    /// Merge the metadata into outgoing request headers as
    /// `X-Object-Meta-<name>` entries.
    pub fn merge_metadata_headers(&self, headers: &mut HeaderMap) -> Result<(), ObjectStoreError> {
        crate::headers::merge_prefixed(headers, OBJECT_META_PREFIX, &self.metadata)
    }

    /// Merge the additional raw headers into outgoing request headers.
    pub fn merge_additional_headers(
        &self,
        headers: &mut HeaderMap,
    ) -> Result<(), ObjectStoreError> {
        crate::headers::merge_prefixed(headers, "", &self.additional_headers)
    }
}

/// Fetch the object metadata pairs out of response headers. Values are
/// not decoded; their encoding is the caller's business.
pub fn decode_metadata(headers: &HeaderMap) -> BTreeMap<String, String> {
    decode_prefixed(headers, OBJECT_META_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn canned_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("text/plain"));
        headers.insert("content-length", HeaderValue::from_static("11"));
        headers.insert(
            "etag",
            HeaderValue::from_static("5eb63bbbe01eeed093cb22bb8f5acdc3"),
        );
        headers.insert(
            "last-modified",
            HeaderValue::from_static("Tue, 07 Jan 2014 00:00:00 GMT"),
        );
        headers.insert("x-object-meta-owner", HeaderValue::from_static("ops"));
        headers
    }

    #[test]
    fn test_defaults() {
        let info = ObjectInfo::new("a.txt");
        assert_eq!(info.name(), "a.txt");
        assert_eq!(info.content_type(), DEFAULT_CONTENT_TYPE);
        assert!(!info.is_partial());
        assert!(info.etag().is_none());
    }

    #[test]
    fn test_from_response() {
        let info = ObjectInfo::from_response("hello.txt", &canned_headers());
        assert_eq!(info.content_type(), "text/plain");
        assert_eq!(info.content_length(), Some(11));
        assert_eq!(info.etag(), Some("5eb63bbbe01eeed093cb22bb8f5acdc3"));
        assert_eq!(info.metadata().unwrap()["owner"], "ops");
        assert!(!info.is_partial());
        // Full records report absent optional fields as None, not as
        // errors.
        assert_eq!(info.transfer_encoding().unwrap(), None);
    }

    #[test]
    fn test_from_json_is_partial() {
        let record: ObjectRecord = serde_json::from_str(
            r#"{
                "name": "photo.png",
                "hash": "abcd",
                "bytes": 1024,
                "content_type": "image/png",
                "last_modified": "2014-01-07T12:00:00"
            }"#,
        )
        .unwrap();
        let info = ObjectInfo::from_json(record);
        assert!(info.is_partial());
        assert_eq!(info.name(), "photo.png");
        assert_eq!(info.content_length(), Some(1024));
        assert!(matches!(
            info.metadata(),
            Err(ObjectStoreError::PartialRecord("metadata"))
        ));
        assert!(matches!(
            info.transfer_encoding(),
            Err(ObjectStoreError::PartialRecord(_))
        ));
        assert!(matches!(
            info.disposition(),
            Err(ObjectStoreError::PartialRecord(_))
        ));
    }

    #[test]
    fn test_metadata_roundtrip_through_headers() {
        let mut info = ObjectInfo::new("x");
        info.add_metadatum("foo", "1").add_metadatum("bar", "baz");
        assert!(info.has_metadatum("foo"));
        info.delete_metadatum("foo");
        assert!(!info.has_metadatum("foo"));

        let mut headers = HeaderMap::new();
        info.merge_metadata_headers(&mut headers).unwrap();
        assert_eq!(headers.get("x-object-meta-bar").unwrap(), "baz");
        assert!(headers.get("x-object-meta-foo").is_none());

        let decoded = decode_metadata(&headers);
        assert_eq!(decoded["bar"], "baz");
    }

    #[test]
    fn test_additional_headers_merge() {
        let mut info = ObjectInfo::new("x");
        let mut extra = BTreeMap::new();
        extra.insert("x-delete-after".to_string(), "86400".to_string());
        info.set_additional_headers(extra);

        let mut headers = HeaderMap::new();
        info.merge_additional_headers(&mut headers).unwrap();
        assert_eq!(headers.get("x-delete-after").unwrap(), "86400");

        info.remove_headers(&["x-delete-after"]);
        assert!(info.additional_headers().is_empty());
    }
}
