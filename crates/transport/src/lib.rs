/**
 * HTTP transport for the Cumulus cloud client.
 *
 * Every service client in the workspace funnels its requests through
 * this crate. Two request shapes are supported:
 *  - managed requests, where the whole response body is accumulated
 *    and returned as a string
 *  - chunked requests, where the outgoing body is streamed with
 *    chunked transfer encoding while an MD5 digest of the sent bytes
 *    is accumulated for post-upload integrity verification
 */
pub mod body;
pub mod config;
pub mod error;
mod transport;

pub use body::UploadBody;
pub use config::TransportConfig;
pub use error::TransportError;
pub use transport::{ChunkedResponse, Transport, TransportResponse};

pub mod prelude {
    pub use crate::body::UploadBody;
    pub use crate::config::TransportConfig;
    pub use crate::error::TransportError;
    pub use crate::transport::{ChunkedResponse, Transport, TransportResponse};
}
