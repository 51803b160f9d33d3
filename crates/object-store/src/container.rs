//! Containers and the objects inside them.

use std::collections::BTreeMap;

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;
use transport::{Transport, UploadBody};
use url::Url;

use crate::acl::Acl;
use crate::error::ObjectStoreError;
use crate::headers::{decode_prefixed, numeric_header, token_headers, CONTAINER_META_PREFIX};
use crate::info::{ObjectInfo, ObjectRecord};
use crate::remote::RemoteObject;

/// One container entry from a JSON account listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ContainerRecord {
    pub name: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub bytes: u64,
}

/// One entry from a JSON object listing. With a delimiter in play the
/// server reports common prefixes as `Subdir` entries instead of
/// objects.
#[derive(Debug, Clone)]
pub enum ObjectEntry {
    Object(ObjectInfo),
    Subdir(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Subdir { subdir: String },
    Record(ObjectRecord),
}

/// A handle on one container.
///
/// Obtained from [`ObjectStore`](crate::store::ObjectStore); carries
/// the auth token and container URL so object operations need no
/// further lookups. The object count and byte size are a snapshot from
/// when the handle was fetched.
#[derive(Debug, Clone)]
pub struct Container {
    name: String,
    url: Url,
    token: String,
    count: u64,
    bytes: u64,
    transport: Transport,
}

impl Container {
    pub(crate) fn from_json(
        record: ContainerRecord,
        token: &str,
        endpoint: &Url,
        transport: Transport,
    ) -> Result<Self, ObjectStoreError> {
        Ok(Self {
            url: container_url(endpoint, &record.name)?,
            name: record.name,
            token: token.to_string(),
            count: record.count,
            bytes: record.bytes,
            transport,
        })
    }

    pub(crate) fn from_response(
        name: &str,
        headers: &reqwest::header::HeaderMap,
        token: &str,
        endpoint: &Url,
        transport: Transport,
    ) -> Result<Self, ObjectStoreError> {
        Ok(Self {
            url: container_url(endpoint, name)?,
            name: name.to_string(),
            token: token.to_string(),
            count: numeric_header(headers, "x-container-object-count"),
            bytes: numeric_header(headers, "x-container-bytes-used"),
            transport,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Number of objects at the time the handle was fetched.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Total bytes stored at the time the handle was fetched.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Fetch the container metadata (`X-Container-Meta-*` pairs).
    pub async fn metadata(&self) -> Result<BTreeMap<String, String>, ObjectStoreError> {
        let response = self
            .transport
            .request(Method::HEAD, self.url.clone(), token_headers(&self.token)?, None)
            .await?;
        Ok(decode_prefixed(&response.headers, CONTAINER_META_PREFIX))
    }

    /// Fetch the container's access control list.
    pub async fn acl(&self) -> Result<Acl, ObjectStoreError> {
        let response = self
            .transport
            .request(Method::HEAD, self.url.clone(), token_headers(&self.token)?, None)
            .await?;
        Ok(Acl::from_headers(&response.headers))
    }

    /// Upload an object.
    ///
    /// The body goes out with chunked transfer encoding and an MD5
    /// digest is accumulated as it streams, so the content never has
    /// to be fully resident. After the upload the server's `Etag` is
    /// compared against that digest; a mismatch means the stored copy
    /// is corrupt and surfaces as
    /// [`ObjectStoreError::IntegrityMismatch`].
    ///
    /// Returns the saved object's info with the verified etag filled
    /// in.
    pub async fn save(
        &self,
        info: &ObjectInfo,
        body: UploadBody,
    ) -> Result<ObjectInfo, ObjectStoreError> {
        let mut headers = token_headers(&self.token)?;
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_str(info.content_type()).map_err(http::Error::from)?,
        );
        info.merge_metadata_headers(&mut headers)?;
        info.merge_additional_headers(&mut headers)?;

        let url = self.object_url(info.name())?;
        let response = self
            .transport
            .chunked_request(Method::PUT, url, headers, body)
            .await?;

        let etag = response
            .headers
            .get("etag")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !etag.eq_ignore_ascii_case(&response.digest) {
            return Err(ObjectStoreError::IntegrityMismatch {
                digest: response.digest,
                etag,
            });
        }
        debug!(container = %self.name, object = info.name(), etag = %etag, "object saved");

        let mut saved = info.clone();
        saved.set_etag(response.digest);
        if let Some(lastmod) = response
            .headers
            .get("last-modified")
            .and_then(|v| v.to_str().ok())
        {
            saved.set_last_modified(lastmod);
        }
        Ok(saved)
    }

    /// Download an object. The content comes back as a stream.
    pub async fn object(&self, name: &str) -> Result<RemoteObject, ObjectStoreError> {
        let url = self.object_url(name)?;
        let response = self
            .transport
            .unmanaged_request(Method::GET, url, token_headers(&self.token)?)
            .await
            .map_err(|e| not_found_for(e, name))?;
        Ok(RemoteObject::from_response(name, response))
    }

    /// Fetch only an object's metadata, without the content.
    pub async fn object_info(&self, name: &str) -> Result<ObjectInfo, ObjectStoreError> {
        let url = self.object_url(name)?;
        let response = self
            .transport
            .request(Method::HEAD, url, token_headers(&self.token)?, None)
            .await
            .map_err(|e| not_found_for(e, name))?;
        Ok(ObjectInfo::from_response(name, &response.headers))
    }

    /// List objects. Entries are partial records; use
    /// [`Container::object_info`] for full metadata.
    pub async fn objects(
        &self,
        limit: Option<u32>,
        marker: Option<&str>,
    ) -> Result<Vec<ObjectEntry>, ObjectStoreError> {
        self.list(None, None, limit, marker).await
    }

    /// List objects whose names begin with `prefix`. With a delimiter
    /// the listing collapses deeper names into `Subdir` entries.
    pub async fn objects_with_prefix(
        &self,
        prefix: &str,
        delimiter: Option<char>,
        limit: Option<u32>,
        marker: Option<&str>,
    ) -> Result<Vec<ObjectEntry>, ObjectStoreError> {
        self.list(Some(prefix), delimiter, limit, marker).await
    }

    /// List a pseudo-directory: prefix plus `/` delimiter.
    pub async fn objects_by_path(
        &self,
        path: &str,
        limit: Option<u32>,
        marker: Option<&str>,
    ) -> Result<Vec<ObjectEntry>, ObjectStoreError> {
        self.list(Some(path), Some('/'), limit, marker).await
    }

    async fn list(
        &self,
        prefix: Option<&str>,
        delimiter: Option<char>,
        limit: Option<u32>,
        marker: Option<&str>,
    ) -> Result<Vec<ObjectEntry>, ObjectStoreError> {
        let mut url = self.url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("format", "json");
            if let Some(limit) = limit {
                query.append_pair("limit", &limit.to_string());
            }
            if let Some(marker) = marker {
                query.append_pair("marker", marker);
            }
            if let Some(prefix) = prefix {
                query.append_pair("prefix", prefix);
            }
            if let Some(delimiter) = delimiter {
                query.append_pair("delimiter", &delimiter.to_string());
            }
        }
        let response = self
            .transport
            .request(Method::GET, url, token_headers(&self.token)?, None)
            .await?;
        let raw: Vec<RawEntry> = serde_json::from_str(&response.body)?;
        Ok(raw
            .into_iter()
            .map(|entry| match entry {
                RawEntry::Subdir { subdir } => ObjectEntry::Subdir(subdir),
                RawEntry::Record(record) => ObjectEntry::Object(ObjectInfo::from_json(record)),
            })
            .collect())
    }

    /// Replace an object's metadata without re-uploading the content.
    pub async fn update_object_metadata(
        &self,
        info: &ObjectInfo,
    ) -> Result<(), ObjectStoreError> {
        let mut headers = token_headers(&self.token)?;
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_str(info.content_type()).map_err(http::Error::from)?,
        );
        info.merge_metadata_headers(&mut headers)?;
        let url = self.object_url(info.name())?;
        self.transport
            .request(Method::POST, url, headers, None)
            .await?;
        Ok(())
    }

    /// Server-side copy of an object into `dest_container` (which may
    /// be this container) under `dest_name`.
    pub async fn copy(
        &self,
        source: &str,
        dest_name: &str,
        dest_container: &str,
    ) -> Result<(), ObjectStoreError> {
        let mut headers = token_headers(&self.token)?;
        headers.insert(
            "destination",
            HeaderValue::from_str(&format!("{}/{}", dest_container, dest_name))
                .map_err(http::Error::from)?,
        );
        let method = Method::from_bytes(b"COPY").map_err(http::Error::from)?;
        let url = self.object_url(source)?;
        self.transport
            .request(method, url, headers, None)
            .await
            .map_err(|e| not_found_for(e, source))?;
        Ok(())
    }

    /// Delete an object. A missing object is
    /// [`ObjectStoreError::NotFound`], not a transport error.
    pub async fn delete_object(&self, name: &str) -> Result<(), ObjectStoreError> {
        let url = self.object_url(name)?;
        self.transport
            .request(Method::DELETE, url, token_headers(&self.token)?, None)
            .await
            .map_err(|e| not_found_for(e, name))?;
        Ok(())
    }

    /// Build the URL for an object in this container. Slashes in the
    /// name stay as path separators; every other reserved character is
    /// percent-encoded.
    fn object_url(&self, name: &str) -> Result<Url, ObjectStoreError> {
        let mut url = self.url.clone();
        url.path_segments_mut()
            .map_err(|_| ObjectStoreError::BadEndpoint)?
            .extend(name.split('/'));
        Ok(url)
    }
}

pub(crate) fn container_url(endpoint: &Url, name: &str) -> Result<Url, ObjectStoreError> {
    let mut url = endpoint.clone();
    url.path_segments_mut()
        .map_err(|_| ObjectStoreError::BadEndpoint)?
        .pop_if_empty()
        .push(name);
    Ok(url)
}

/// Map a 404 onto the named resource, leaving other failures alone.
pub(crate) fn not_found_for(err: transport::TransportError, name: &str) -> ObjectStoreError {
    if err.status_code() == 404 {
        ObjectStoreError::NotFound(name.to_string())
    } else {
        ObjectStoreError::Transport(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transport::TransportConfig;

    fn canned() -> Container {
        let endpoint = Url::parse("https://region-a.example.com/v1/account").unwrap();
        Container::from_json(
            ContainerRecord {
                name: "photos".to_string(),
                count: 3,
                bytes: 1024,
            },
            "tok",
            &endpoint,
            Transport::new(TransportConfig::default()).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_container_url_joins_name() {
        let container = canned();
        assert_eq!(
            container.url().as_str(),
            "https://region-a.example.com/v1/account/photos"
        );
        assert_eq!(container.count(), 3);
        assert_eq!(container.bytes(), 1024);
    }

    #[test]
    fn test_object_url_keeps_slashes_as_segments() {
        let container = canned();
        let url = container.object_url("2014/01/cat photo.png").unwrap();
        assert_eq!(
            url.as_str(),
            "https://region-a.example.com/v1/account/photos/2014/01/cat%20photo.png"
        );
    }

    #[test]
    fn test_trailing_slash_endpoint() {
        let endpoint = Url::parse("https://region-a.example.com/v1/account/").unwrap();
        let url = container_url(&endpoint, "photos").unwrap();
        assert_eq!(
            url.as_str(),
            "https://region-a.example.com/v1/account/photos"
        );
    }

    #[test]
    fn test_listing_entry_shapes() {
        let raw: Vec<RawEntry> = serde_json::from_str(
            r#"[
                {"subdir": "2014/"},
                {"name": "a.txt", "hash": "ff", "bytes": 2,
                 "content_type": "text/plain",
                 "last_modified": "2014-01-07T12:00:00"}
            ]"#,
        )
        .unwrap();
        assert!(matches!(&raw[0], RawEntry::Subdir { subdir } if subdir == "2014/"));
        assert!(matches!(&raw[1], RawEntry::Record(r) if r.name == "a.txt"));
    }
}
