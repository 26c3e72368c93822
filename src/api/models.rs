use std::time::Duration;

use bytes::Bytes;
use futures::stream::BoxStream;

use super::client::FetchError;

/// An opened remote resource, ready to be streamed.
pub struct RemoteResource {
    /// Reported length of the body. Servers may omit it or send zero.
    pub content_length: Option<u64>,
    pub body: BoxStream<'static, Result<Bytes, FetchError>>,
}

impl std::fmt::Debug for RemoteResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteResource")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub user_agent: String,
    pub connect_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("work-downloader/{}", env!("CARGO_PKG_VERSION")),
            connect_timeout: None,
        }
    }
}
