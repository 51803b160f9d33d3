use chrono::{DateTime, Utc};

use crate::error::IdentityError;
use crate::types::{Access, CatalogEntry, Endpoint, Role, Token, User};

/// A parsed identity document: the token plus the service catalog.
///
/// Returned by the authentication calls on
/// [`IdentityClient`](crate::IdentityClient); pass it to the service
/// clients so they can locate their endpoints and authenticate.
#[derive(Debug, Clone)]
pub struct Identity {
    access: Access,
}

impl Identity {
    pub fn new(access: Access) -> Self {
        Self { access }
    }

    /// The authentication token, sent as `X-Auth-Token` on service
    /// requests.
    pub fn token(&self) -> &str {
        &self.access.token.id
    }

    /// Token details: id, expiry, tenant scope.
    pub fn token_details(&self) -> &Token {
        &self.access.token
    }

    /// The token expiry, if the server-supplied timestamp parses.
    pub fn expires(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.access.token.expires)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// Whether the token has expired. An unparseable expiry reads as
    /// not expired, matching the lenient behavior callers rely on.
    pub fn is_expired(&self) -> bool {
        match self.expires() {
            Some(expires) => expires < Utc::now(),
            None => false,
        }
    }

    pub fn tenant_id(&self) -> Result<&str, IdentityError> {
        self.access
            .token
            .tenant
            .as_ref()
            .map(|t| t.id.as_str())
            .ok_or(IdentityError::MissingScope)
    }

    pub fn tenant_name(&self) -> Result<&str, IdentityError> {
        self.access
            .token
            .tenant
            .as_ref()
            .map(|t| t.name.as_str())
            .ok_or(IdentityError::MissingScope)
    }

    /// The catalog of activated services.
    pub fn service_catalog(&self) -> &[CatalogEntry] {
        &self.access.service_catalog
    }

    /// Look up a service endpoint by service type, optionally narrowed
    /// to a region.
    ///
    /// When several catalog entries share a type, the last one wins.
    /// Without a region, the entry's first endpoint is returned. A
    /// miss is caller misuse and reported as an error immediately.
    pub fn service_by_name(
        &self,
        service_type: &str,
        region: Option<&str>,
    ) -> Result<&Endpoint, IdentityError> {
        let entry = self
            .access
            .service_catalog
            .iter()
            .filter(|e| e.service_type == service_type)
            .next_back()
            .ok_or_else(|| IdentityError::UnknownService(service_type.to_string()))?;

        match region {
            Some(region) => entry
                .endpoints
                .iter()
                .find(|e| e.region.as_deref() == Some(region))
                .ok_or_else(|| IdentityError::UnknownRegion {
                    service: service_type.to_string(),
                    region: region.to_string(),
                }),
            None => entry
                .endpoints
                .first()
                .ok_or_else(|| IdentityError::UnknownService(service_type.to_string())),
        }
    }

    pub fn user(&self) -> &User {
        &self.access.user
    }

    pub fn roles(&self) -> &[Role] {
        &self.access.user.roles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccessDocument;

    fn canned_identity() -> Identity {
        let doc: AccessDocument = serde_json::from_str(
            r#"{
                "access": {
                    "token": {
                        "id": "abc123token",
                        "expires": "2999-01-01T00:00:00Z",
                        "tenant": { "id": "t-9000", "name": "testtenant" }
                    },
                    "serviceCatalog": [
                        {
                            "name": "Identity",
                            "type": "identity",
                            "endpoints": [
                                { "publicURL": "https://identity.example.com/v2.0", "region": null }
                            ]
                        },
                        {
                            "name": "Object Storage",
                            "type": "object-store",
                            "endpoints": [
                                {
                                    "publicURL": "https://objects.east.example.com/v1/t-9000",
                                    "region": "east.geo-1",
                                    "tenantId": "t-9000"
                                },
                                {
                                    "publicURL": "https://objects.west.example.com/v1/t-9000",
                                    "region": "west.geo-1",
                                    "tenantId": "t-9000"
                                }
                            ]
                        }
                    ],
                    "user": {
                        "id": "u-1",
                        "name": "testuser",
                        "roles": [ { "id": "r-1", "name": "admin" } ]
                    }
                }
            }"#,
        )
        .unwrap();
        Identity::new(doc.access)
    }

    #[test]
    fn test_token_and_tenant() {
        let id = canned_identity();
        assert_eq!(id.token(), "abc123token");
        assert_eq!(id.tenant_id().unwrap(), "t-9000");
        assert_eq!(id.tenant_name().unwrap(), "testtenant");
        assert_eq!(id.user().name, "testuser");
        assert_eq!(id.roles()[0].name, "admin");
    }

    #[test]
    fn test_not_yet_expired() {
        let id = canned_identity();
        assert!(!id.is_expired());
        assert!(id.expires().is_some());
    }

    #[test]
    fn test_expired_token() {
        let mut id = canned_identity();
        id.access.token.expires = "2001-01-01T00:00:00Z".into();
        assert!(id.is_expired());
    }

    #[test]
    fn test_unparseable_expiry_reads_not_expired() {
        let mut id = canned_identity();
        id.access.token.expires = "not a timestamp".into();
        assert!(id.expires().is_none());
        assert!(!id.is_expired());
    }

    #[test]
    fn test_service_lookup_by_region() {
        let id = canned_identity();
        let ep = id
            .service_by_name("object-store", Some("west.geo-1"))
            .unwrap();
        assert_eq!(ep.public_url, "https://objects.west.example.com/v1/t-9000");
    }

    #[test]
    fn test_service_lookup_defaults_to_first_endpoint() {
        let id = canned_identity();
        let ep = id.service_by_name("object-store", None).unwrap();
        assert_eq!(ep.public_url, "https://objects.east.example.com/v1/t-9000");
    }

    #[test]
    fn test_unknown_service_is_an_error() {
        let id = canned_identity();
        let err = id.service_by_name("ext:cdn", None).unwrap_err();
        assert!(matches!(err, IdentityError::UnknownService(_)));
    }

    #[test]
    fn test_unknown_region_is_an_error() {
        let id = canned_identity();
        let err = id
            .service_by_name("object-store", Some("mars.geo-9"))
            .unwrap_err();
        assert!(matches!(err, IdentityError::UnknownRegion { .. }));
    }

    #[test]
    fn test_unscoped_token_has_no_tenant() {
        let doc: AccessDocument = serde_json::from_str(
            r#"{
                "access": {
                    "token": { "id": "tok", "expires": "2999-01-01T00:00:00Z" },
                    "user": { "name": "nobody" }
                }
            }"#,
        )
        .unwrap();
        let id = Identity::new(doc.access);
        assert!(matches!(id.tenant_id(), Err(IdentityError::MissingScope)));
        assert!(id.service_catalog().is_empty());
    }
}
