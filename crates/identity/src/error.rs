use transport::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("malformed identity response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
    /// The service catalog has no entry of the requested type. Caller
    /// misuse, reported synchronously.
    #[error("no such service: {0}")]
    UnknownService(String),
    #[error("no endpoint for service {service} in region {region}")]
    UnknownRegion { service: String, region: String },
    /// The token was issued without a tenant scope.
    #[error("identity is not scoped to a tenant")]
    MissingScope,
}
