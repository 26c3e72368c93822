use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::{Client, StatusCode};
use thiserror::Error;

use super::{ClientConfig, RemoteResource};
use crate::domain::FailureReason;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server responded with {0}")]
    Status(StatusCode),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<FetchError> for FailureReason {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::InvalidUrl(_) => FailureReason::InvalidInput(e.to_string()),
            FetchError::Request(_) | FetchError::Status(_) => {
                FailureReason::Network(e.to_string())
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;

/// Opens remote resources for the transfer task.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn open(&self, url: &str) -> Result<RemoteResource>;
}

/// Plain HTTP(S) GET with the client's default redirect handling.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn open(&self, url: &str) -> Result<RemoteResource> {
        let url = url::Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let content_length = response.content_length();
        let body = response.bytes_stream().map_err(FetchError::Request).boxed();

        Ok(RemoteResource {
            content_length,
            body,
        })
    }
}
