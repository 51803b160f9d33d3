use identity::IdentityError;
use transport::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),
    #[error("malformed listing: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid header: {0}")]
    Header(#[from] http::Error),
    #[error("endpoint URL cannot be a base")]
    BadEndpoint,
    #[error("not found: {0}")]
    NotFound(String),
    /// The uploaded content arrived, but the entity tag the server
    /// returned does not match the digest of what was sent.
    #[error("content uploaded, but checksum does not match (sent {digest}, server says {etag})")]
    IntegrityMismatch { digest: String, etag: String },
    /// The record came from a JSON listing and does not carry this
    /// field; fetch the full object info instead.
    #[error("results are partial; {0} is not available")]
    PartialRecord(&'static str),
}
