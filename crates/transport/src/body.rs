use std::fmt;
use std::io;

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};

/// The body of an upload request.
///
/// Either the whole body is already in memory, or it is delivered
/// lazily as a single-pass, non-restartable sequence of chunks.
pub enum UploadBody {
    Bytes(Bytes),
    Stream(BoxStream<'static, io::Result<Bytes>>),
}

impl UploadBody {
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self::Stream(stream.boxed())
    }
}

impl From<Bytes> for UploadBody {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for UploadBody {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(bytes))
    }
}

impl From<String> for UploadBody {
    fn from(s: String) -> Self {
        Self::Bytes(Bytes::from(s))
    }
}

impl From<&str> for UploadBody {
    fn from(s: &str) -> Self {
        Self::Bytes(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl fmt::Debug for UploadBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(b) => write!(f, "UploadBody::Bytes({} bytes)", b.len()),
            Self::Stream(_) => write!(f, "UploadBody::Stream"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_in_memory_sources() {
        let from_str = UploadBody::from("hello");
        let from_string = UploadBody::from(String::from("hello"));
        let from_vec = UploadBody::from(b"hello".to_vec());

        for body in [from_str, from_string, from_vec] {
            match body {
                UploadBody::Bytes(b) => assert_eq!(&b[..], b"hello"),
                UploadBody::Stream(_) => panic!("expected in-memory body"),
            }
        }
    }

    #[test]
    fn test_from_stream_is_stream_variant() {
        let chunks = vec![Ok(Bytes::from_static(b"a")), Ok(Bytes::from_static(b"b"))];
        let body = UploadBody::from_stream(futures::stream::iter(chunks));
        assert!(matches!(body, UploadBody::Stream(_)));
    }
}
