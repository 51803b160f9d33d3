//! Wire types for the identity services JSON protocol.

use serde::{Deserialize, Serialize};

/// The envelope POSTed to `/tokens`: `{"auth": {...}}`.
#[derive(Debug, Clone, Serialize)]
pub struct AuthRequest {
    pub auth: AuthPayload,
}

/// The body of an authentication request. Exactly one credential kind
/// should be set; the tenant scope is optional.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_credentials: Option<PasswordCredentials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_access_key_credentials: Option<AccessKeyCredentials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenCredentials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessKeyCredentials {
    pub access_key: String,
    pub secret_key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenCredentials {
    pub id: String,
}

/// Top-level response document: `{"access": {...}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessDocument {
    pub access: Access,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Access {
    pub token: Token,
    #[serde(default)]
    pub service_catalog: Vec<CatalogEntry>,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Token {
    pub id: String,
    pub expires: String,
    pub tenant: Option<TokenTenant>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenTenant {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Endpoint {
    pub region: Option<String>,
    #[serde(rename = "publicURL")]
    pub public_url: String,
    #[serde(rename = "internalURL")]
    pub internal_url: Option<String>,
    #[serde(rename = "tenantId")]
    pub tenant_id: Option<String>,
    #[serde(rename = "versionId")]
    pub version_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Role {
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "serviceId")]
    pub service_id: Option<String>,
}

/// One tenant from the `/tenants` listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    pub created: Option<String>,
    pub updated: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TenantList {
    pub tenants: Vec<Tenant>,
}
