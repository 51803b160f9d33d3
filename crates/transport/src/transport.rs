use std::io;
use std::sync::Arc;

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use md5::{Digest, Md5};
use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderValue, TRANSFER_ENCODING};
use reqwest::{Client, Method, StatusCode};
use url::Url;

use crate::body::UploadBody;
use crate::config::TransportConfig;
use crate::error::TransportError;

/// A finished managed request: status, headers and the accumulated
/// response body.
#[derive(Debug)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

/// A finished chunked upload.
#[derive(Debug)]
pub struct ChunkedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
    /// Lowercase hex MD5 of the request body as it was sent. Callers
    /// compare this against the `Etag` the server returned.
    pub digest: String,
}

#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    config: TransportConfig,
}

impl Transport {
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        // The success window is enforced here, not by reqwest, so
        // redirects must surface as plain 3xx responses.
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Perform a managed request.
    ///
    /// Statuses in [200, 400) succeed with the accumulated body; any
    /// other status is a [`TransportError::HttpStatus`].
    pub async fn request(
        &self,
        method: Method,
        url: Url,
        headers: HeaderMap,
        body: Option<Bytes>,
    ) -> Result<TransportResponse, TransportError> {
        let mut builder = self.client.request(method, url).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }
        let response = builder.send().await?;
        let (status, headers, body) = managed(response).await?;
        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }

    /// Perform a request without consuming the response body.
    ///
    /// Used for large downloads where the response should be streamed
    /// onward. Statuses below 400 succeed; 1xx/3xx are the caller's
    /// problem.
    pub async fn unmanaged_request(
        &self,
        method: Method,
        url: Url,
        headers: HeaderMap,
    ) -> Result<reqwest::Response, TransportError> {
        let response = self
            .client
            .request(method, url)
            .headers(headers)
            .send()
            .await?;
        let status = response.status();
        if status.as_u16() < 400 {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(TransportError::HttpStatus { status, body })
        }
    }

    /// Send a body with chunked transfer encoding, computing an MD5
    /// digest of the outgoing bytes as they go.
    ///
    /// The transfer-encoding header is set here; callers must not set
    /// it themselves. For a streamed body each chunk updates the digest
    /// accumulator and is then forwarded, in source order, without
    /// whole-body buffering. The source drives the timing; a source
    /// that never completes stalls the call indefinitely.
    pub async fn chunked_request(
        &self,
        method: Method,
        url: Url,
        mut headers: HeaderMap,
        body: UploadBody,
    ) -> Result<ChunkedResponse, TransportError> {
        headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));

        let (request_body, digest) = match body {
            UploadBody::Bytes(bytes) => {
                let mut md5 = Md5::new();
                md5.update(&bytes);
                let handle = DigestHandle(Arc::new(Mutex::new(md5)));
                (reqwest::Body::from(bytes), handle)
            }
            UploadBody::Stream(stream) => {
                let (tapped, handle) = digest_stream(stream, self.config.wire_debug);
                (reqwest::Body::wrap_stream(tapped), handle)
            }
        };

        let response = self
            .client
            .request(method, url)
            .headers(headers)
            .body(request_body)
            .send()
            .await?;
        let (status, headers, body) = managed(response).await?;

        // The source has completed by the time the response is in, so
        // the accumulator is final.
        Ok(ChunkedResponse {
            status,
            headers,
            body,
            digest: digest.hex(),
        })
    }
}

async fn managed(
    response: reqwest::Response,
) -> Result<(StatusCode, HeaderMap, String), TransportError> {
    let status = response.status();
    let headers = response.headers().clone();
    if status.as_u16() >= 200 && status.as_u16() < 400 {
        let body = response.text().await?;
        Ok((status, headers, body))
    } else {
        tracing::debug!(status = status.as_u16(), "request failed");
        let body = response.text().await.unwrap_or_default();
        Err(TransportError::HttpStatus { status, body })
    }
}

/// Shared view onto the digest accumulator of an in-flight upload.
struct DigestHandle(Arc<Mutex<Md5>>);

impl DigestHandle {
    fn hex(&self) -> String {
        hex::encode(self.0.lock().clone().finalize())
    }
}

/// Wrap an upload source so every chunk updates the digest before it
/// is forwarded. Chunks are processed strictly in emission order; the
/// tap adds no buffering of its own.
fn digest_stream(
    stream: BoxStream<'static, io::Result<Bytes>>,
    wire_debug: bool,
) -> (
    impl Stream<Item = io::Result<Bytes>> + Send + 'static,
    DigestHandle,
) {
    let md5 = Arc::new(Mutex::new(Md5::new()));
    let handle = DigestHandle(md5.clone());
    let tapped = stream.map(move |next| {
        match &next {
            Ok(chunk) => {
                md5.lock().update(chunk);
                if wire_debug {
                    tracing::debug!(len = chunk.len(), "chunk");
                }
            }
            Err(e) => {
                tracing::warn!("upload source failed: {}", e);
            }
        }
        next
    });
    (tapped, handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunked(parts: &[&[u8]]) -> BoxStream<'static, io::Result<Bytes>> {
        let chunks: Vec<io::Result<Bytes>> = parts
            .iter()
            .map(|p| Ok(Bytes::copy_from_slice(p)))
            .collect();
        futures::stream::iter(chunks).boxed()
    }

    #[tokio::test]
    async fn test_digest_is_chunk_boundary_invariant() {
        let data = b"the quick brown fox jumps over the lazy dog";

        let (whole, whole_handle) = digest_stream(chunked(&[data]), false);
        let _: Vec<_> = whole.collect().await;

        let (split, split_handle) = digest_stream(
            chunked(&[&data[..7], &data[7..20], &data[20..]]),
            false,
        );
        let _: Vec<_> = split.collect().await;

        assert_eq!(whole_handle.hex(), split_handle.hex());
    }

    #[tokio::test]
    async fn test_digest_matches_whole_body_md5() {
        let (stream, handle) = digest_stream(chunked(&[b"hello ", b"world"]), false);
        let forwarded: Vec<_> = stream.collect().await;

        // Forwarded chunks are untouched.
        let collected: Vec<u8> = forwarded
            .into_iter()
            .flat_map(|c| c.unwrap().to_vec())
            .collect();
        assert_eq!(collected, b"hello world");

        let expected = hex::encode(Md5::digest(b"hello world"));
        assert_eq!(handle.hex(), expected);
    }

    #[tokio::test]
    async fn test_source_error_is_forwarded() {
        let chunks: Vec<io::Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"ok")),
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "source died")),
        ];
        let (stream, _handle) = digest_stream(futures::stream::iter(chunks).boxed(), false);
        let out: Vec<_> = stream.collect().await;
        assert!(out[0].is_ok());
        assert!(out[1].is_err());
    }
}
