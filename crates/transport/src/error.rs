use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The server answered with a status outside the success window.
    #[error("HTTP error {status}")]
    HttpStatus { status: StatusCode, body: String },
    /// The request failed before any response arrived (connection
    /// refused, DNS failure, broken pipe mid-body, ...).
    #[error("non-HTTP error: {0}")]
    Connection(#[from] reqwest::Error),
    #[error("invalid header: {0}")]
    InvalidHeader(#[from] http::Error),
}

impl TransportError {
    /// The numeric status code carried by this error.
    ///
    /// Transport-level failures that never produced a response report 0.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::HttpStatus { status, .. } => status.as_u16(),
            Self::Connection(e) => e.status().map(|s| s.as_u16()).unwrap_or(0),
            Self::InvalidHeader(_) => 0,
        }
    }
}
