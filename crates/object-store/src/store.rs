//! The account-level entry point for object storage.

use std::collections::BTreeMap;

use identity::Identity;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use tracing::debug;
use transport::{Transport, TransportConfig};
use url::Url;

use crate::acl::Acl;
use crate::container::{container_url, not_found_for, Container, ContainerRecord};
use crate::error::ObjectStoreError;
use crate::headers::{
    decode_prefixed, merge_prefixed, numeric_header, token_headers, CONTAINER_META_PREFIX,
};

/// The service type under which object storage registers itself in
/// the identity service catalog.
pub const SERVICE_TYPE: &str = "object-store";

/// Usage totals for the whole account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountInfo {
    pub objects: u64,
    pub bytes: u64,
    pub containers: u64,
}

/// A client for one account's object storage endpoint.
///
/// Carries the endpoint URL and auth token; all container and account
/// operations go through here. Tokens expire, so long-lived programs
/// re-authenticate and build a fresh store rather than holding one
/// forever.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    endpoint: Url,
    token: String,
    transport: Transport,
}

impl ObjectStore {
    pub fn new(endpoint: Url, token: impl Into<String>) -> Result<Self, ObjectStoreError> {
        let transport = Transport::new(TransportConfig::default())?;
        Ok(Self::with_transport(endpoint, token, transport))
    }

    pub fn with_transport(
        endpoint: Url,
        token: impl Into<String>,
        transport: Transport,
    ) -> Self {
        Self {
            endpoint,
            token: token.into(),
            transport,
        }
    }

    /// Build a store from an authenticated identity, resolving the
    /// `object-store` entry in its service catalog.
    pub fn from_identity(
        identity: &Identity,
        region: Option<&str>,
    ) -> Result<Self, ObjectStoreError> {
        let endpoint = identity.service_by_name(SERVICE_TYPE, region)?;
        let url = Url::parse(&endpoint.public_url)?;
        Self::new(url, identity.token())
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// List the account's containers.
    pub async fn containers(
        &self,
        limit: Option<u32>,
        marker: Option<&str>,
    ) -> Result<Vec<Container>, ObjectStoreError> {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("format", "json");
            if let Some(limit) = limit {
                query.append_pair("limit", &limit.to_string());
            }
            if let Some(marker) = marker {
                query.append_pair("marker", marker);
            }
        }
        let response = self
            .transport
            .request(Method::GET, url, token_headers(&self.token)?, None)
            .await?;
        let records: Vec<ContainerRecord> = serde_json::from_str(&response.body)?;
        records
            .into_iter()
            .map(|record| {
                Container::from_json(record, &self.token, &self.endpoint, self.transport.clone())
            })
            .collect()
    }

    /// Fetch a single container. A missing container is
    /// [`ObjectStoreError::NotFound`].
    pub async fn container(&self, name: &str) -> Result<Container, ObjectStoreError> {
        let url = container_url(&self.endpoint, name)?;
        let response = self
            .transport
            .request(Method::HEAD, url, token_headers(&self.token)?, None)
            .await
            .map_err(|e| not_found_for(e, name))?;
        Container::from_response(
            name,
            &response.headers,
            &self.token,
            &self.endpoint,
            self.transport.clone(),
        )
    }

    pub async fn has_container(&self, name: &str) -> Result<bool, ObjectStoreError> {
        match self.container(name).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Create a container, or update it if it already exists.
    ///
    /// Returns `true` when the container was newly created (201) and
    /// `false` when an existing one was updated (202).
    pub async fn create_container(
        &self,
        name: &str,
        acl: Option<&Acl>,
        metadata: Option<&BTreeMap<String, String>>,
    ) -> Result<bool, ObjectStoreError> {
        let mut headers = token_headers(&self.token)?;
        if let Some(acl) = acl {
            merge_acl(&mut headers, acl)?;
        }
        if let Some(metadata) = metadata {
            merge_prefixed(&mut headers, CONTAINER_META_PREFIX, metadata)?;
        }
        let url = container_url(&self.endpoint, name)?;
        let response = self
            .transport
            .request(Method::PUT, url, headers, None)
            .await?;
        let created = response.status.as_u16() == 201;
        debug!(container = name, created, "container put");
        Ok(created)
    }

    /// Replace a container's metadata. Same wire operation as
    /// [`ObjectStore::create_container`]; split out so intent reads at
    /// the call site.
    pub async fn update_container(
        &self,
        name: &str,
        metadata: &BTreeMap<String, String>,
    ) -> Result<(), ObjectStoreError> {
        self.create_container(name, None, Some(metadata)).await?;
        Ok(())
    }

    /// Set a container's access control list without touching its
    /// metadata.
    pub async fn change_container_acl(
        &self,
        name: &str,
        acl: &Acl,
    ) -> Result<(), ObjectStoreError> {
        let mut headers = token_headers(&self.token)?;
        merge_acl(&mut headers, acl)?;
        let url = container_url(&self.endpoint, name)?;
        self.transport
            .request(Method::POST, url, headers, None)
            .await?;
        Ok(())
    }

    /// Delete a container. Returns `true` when the container existed
    /// and was removed, `false` when there was nothing to delete. The
    /// server refuses to delete a non-empty container; that surfaces
    /// as the underlying 409.
    pub async fn delete_container(&self, name: &str) -> Result<bool, ObjectStoreError> {
        let url = container_url(&self.endpoint, name)?;
        match self
            .transport
            .request(Method::DELETE, url, token_headers(&self.token)?, None)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.status_code() == 404 => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Account-wide usage totals from a HEAD on the endpoint.
    pub async fn account_info(&self) -> Result<AccountInfo, ObjectStoreError> {
        let response = self
            .transport
            .request(
                Method::HEAD,
                self.endpoint.clone(),
                token_headers(&self.token)?,
                None,
            )
            .await?;
        Ok(AccountInfo {
            objects: numeric_header(&response.headers, "x-account-object-count"),
            bytes: numeric_header(&response.headers, "x-account-bytes-used"),
            containers: numeric_header(&response.headers, "x-account-container-count"),
        })
    }
}

/// Fetch the container metadata pairs out of response headers.
pub fn decode_container_metadata(headers: &HeaderMap) -> BTreeMap<String, String> {
    decode_prefixed(headers, CONTAINER_META_PREFIX)
}

fn merge_acl(headers: &mut HeaderMap, acl: &Acl) -> Result<(), ObjectStoreError> {
    for (name, value) in acl.headers() {
        headers.insert(name, HeaderValue::from_str(&value).map_err(http::Error::from)?);
    }
    Ok(())
}
