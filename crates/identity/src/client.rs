use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use tracing::debug;
use transport::{Transport, TransportConfig, TransportError};
use url::Url;

use crate::error::IdentityError;
use crate::identity::Identity;
use crate::types::{
    AccessKeyCredentials, AuthPayload, AuthRequest, PasswordCredentials, Tenant, TenantList,
    TokenCredentials,
};

/// The tenant (project) an authentication should be scoped to.
/// At most one of id or name is ever in play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantRef {
    Id(String),
    Name(String),
}

/// Client for an identity services endpoint.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    endpoint: Url,
    tenant: Option<TenantRef>,
    transport: Transport,
}

impl IdentityClient {
    pub fn new(endpoint: Url) -> Result<Self, IdentityError> {
        let transport = Transport::new(TransportConfig::default())?;
        Ok(Self::with_transport(endpoint, transport))
    }

    pub fn with_transport(endpoint: Url, transport: Transport) -> Self {
        Self {
            endpoint,
            tenant: None,
            transport,
        }
    }

    /// The identity services endpoint URL.
    pub fn url(&self) -> &Url {
        &self.endpoint
    }

    pub fn tenant(&self) -> Option<&TenantRef> {
        self.tenant.as_ref()
    }

    /// Scope subsequent authentications to a tenant id. Replaces any
    /// previously set tenant name. Call before authenticating.
    pub fn set_tenant_id(&mut self, id: impl Into<String>) -> &mut Self {
        self.tenant = Some(TenantRef::Id(id.into()));
        self
    }

    /// Scope subsequent authentications to a tenant name. Replaces any
    /// previously set tenant id. Call before authenticating.
    pub fn set_tenant_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.tenant = Some(TenantRef::Name(name.into()));
        self
    }

    /// Raw authentication: POST the given payload to `/tokens` and
    /// parse the resulting identity document.
    ///
    /// The `authenticate_as_*` methods are usually what you want; they
    /// build the payload and attach the configured tenant scope.
    pub async fn authenticate(&self, payload: AuthPayload) -> Result<Identity, IdentityError> {
        let url = self.join("tokens")?;
        let body = serde_json::to_vec(&AuthRequest { auth: payload })?;
        let response = self
            .transport
            .request(Method::POST, url, basic_headers(), Some(Bytes::from(body)))
            .await
            .inspect_err(|e| debug!(status = e.status_code(), "authentication failed"))?;

        let doc: crate::types::AccessDocument = serde_json::from_str(&response.body)?;
        Ok(Identity::new(doc.access))
    }

    /// Authenticate with username and password.
    pub async fn authenticate_as_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Identity, IdentityError> {
        let mut payload = AuthPayload {
            password_credentials: Some(PasswordCredentials {
                username: username.to_string(),
                password: password.to_string(),
            }),
            ..Default::default()
        };
        self.apply_tenant(&mut payload);
        self.authenticate(payload).await
    }

    /// Authenticate with account access key and secret key.
    pub async fn authenticate_as_account(
        &self,
        access_key: &str,
        secret_key: &str,
    ) -> Result<Identity, IdentityError> {
        let mut payload = AuthPayload {
            api_access_key_credentials: Some(AccessKeyCredentials {
                access_key: access_key.to_string(),
                secret_key: secret_key.to_string(),
            }),
            ..Default::default()
        };
        self.apply_tenant(&mut payload);
        self.authenticate(payload).await
    }

    /// Re-scope an existing token to the configured tenant.
    pub async fn rescope(&self, token: &str) -> Result<Identity, IdentityError> {
        let mut payload = AuthPayload {
            token: Some(TokenCredentials {
                id: token.to_string(),
            }),
            ..Default::default()
        };
        self.apply_tenant(&mut payload);
        self.authenticate(payload).await
    }

    /// List the tenants the authenticated identity can access.
    pub async fn tenants(&self, identity: &Identity) -> Result<Vec<Tenant>, IdentityError> {
        let url = self.join("tenants")?;
        let mut headers = basic_headers();
        headers.insert(
            "X-Auth-Token",
            HeaderValue::from_str(identity.token())
                .map_err(|e| TransportError::InvalidHeader(e.into()))?,
        );
        let response = self
            .transport
            .request(Method::GET, url, headers, None)
            .await
            .inspect_err(|e| debug!(status = e.status_code(), "tenant listing failed"))?;
        let list: TenantList = serde_json::from_str(&response.body)?;
        Ok(list.tenants)
    }

    fn apply_tenant(&self, payload: &mut AuthPayload) {
        match &self.tenant {
            Some(TenantRef::Id(id)) => payload.tenant_id = Some(id.clone()),
            Some(TenantRef::Name(name)) => payload.tenant_name = Some(name.clone()),
            None => {}
        }
    }

    fn join(&self, path: &str) -> Result<Url, IdentityError> {
        let base = self.endpoint.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{}/{}", base, path))?)
    }
}

fn basic_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_scope_is_applied() {
        let mut client =
            IdentityClient::new(Url::parse("https://identity.example.com/v2.0").unwrap()).unwrap();
        client.set_tenant_id("t-1");

        let mut payload = AuthPayload::default();
        client.apply_tenant(&mut payload);
        assert_eq!(payload.tenant_id.as_deref(), Some("t-1"));
        assert!(payload.tenant_name.is_none());

        // Setting a name replaces the id.
        client.set_tenant_name("dev");
        assert_eq!(client.tenant(), Some(&TenantRef::Name("dev".into())));
        let mut payload = AuthPayload::default();
        client.apply_tenant(&mut payload);
        assert!(payload.tenant_id.is_none());
        assert_eq!(payload.tenant_name.as_deref(), Some("dev"));
    }

    #[test]
    fn test_join_handles_trailing_slash() {
        let client =
            IdentityClient::new(Url::parse("https://identity.example.com/v2.0/").unwrap()).unwrap();
        assert_eq!(
            client.join("tokens").unwrap().as_str(),
            "https://identity.example.com/v2.0/tokens"
        );
    }
}
