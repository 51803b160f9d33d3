//! A downloaded object with its content stream.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures::stream::BoxStream;
use futures::{Stream, StreamExt, TryStreamExt};

use crate::error::ObjectStoreError;
use crate::info::ObjectInfo;

/// An object fetched from a container, with its metadata and a stream
/// of its content.
///
/// The content arrives lazily: each poll yields the next chunk as the
/// server delivers it, so a large object never has to be resident in
/// memory at once. [`RemoteObject::read_all`] is the convenience path
/// for small objects.
pub struct RemoteObject {
    info: ObjectInfo,
    body: BoxStream<'static, Result<Bytes, ObjectStoreError>>,
}

impl RemoteObject {
    pub(crate) fn new(
        info: ObjectInfo,
        body: BoxStream<'static, Result<Bytes, ObjectStoreError>>,
    ) -> Self {
        Self { info, body }
    }

    pub(crate) fn from_response(name: &str, response: reqwest::Response) -> Self {
        let info = ObjectInfo::from_response(name, response.headers());
        let body = response
            .bytes_stream()
            .map_err(|e| ObjectStoreError::Transport(e.into()))
            .boxed();
        Self::new(info, body)
    }

    pub fn info(&self) -> &ObjectInfo {
        &self.info
    }

    /// Drain the stream and return the whole content.
    pub async fn read_all(mut self) -> Result<Bytes, ObjectStoreError> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf.freeze())
    }
}

impl Stream for RemoteObject {
    type Item = Result<Bytes, ObjectStoreError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.body.poll_next_unpin(cx)
    }
}

impl std::fmt::Debug for RemoteObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteObject")
            .field("info", &self.info)
            .field("body", &"<stream>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn canned(chunks: Vec<&'static str>) -> RemoteObject {
        let body = stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok(Bytes::from_static(c.as_bytes()))),
        )
        .boxed();
        RemoteObject::new(ObjectInfo::new("chunky.txt"), body)
    }

    #[tokio::test]
    async fn test_read_all_joins_chunks() {
        let remote = canned(vec!["hello ", "world"]);
        assert_eq!(remote.read_all().await.unwrap(), "hello world");
    }

    #[tokio::test]
    async fn test_streams_chunk_by_chunk() {
        let mut remote = canned(vec!["a", "b"]);
        assert_eq!(remote.next().await.unwrap().unwrap(), "a");
        assert_eq!(remote.next().await.unwrap().unwrap(), "b");
        assert!(remote.next().await.is_none());
    }
}
