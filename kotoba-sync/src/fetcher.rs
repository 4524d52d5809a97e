//! Asset fetcher: one GET per identity, returning the body and its descriptor.
//!
//! No retries happen here; see [`crate::pipeline`] for the retry layer.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::header::{HeaderMap, CONTENT_LENGTH, LAST_MODIFIED};
use reqwest::Client;
use url::Url;

use kotoba_core::{types::parse_http_date, AssetLayout, RemoteDescriptor, ResourceIdentity};

use crate::error::{FetchError, SyncError};

/// Initial buffer cap so a lying `Content-Length` cannot force a huge allocation.
const MAX_PREALLOC: u64 = 8 * 1024 * 1024;

/// Complete body of one remote asset plus the metadata it was served with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedAsset {
    pub bytes: Bytes,
    pub descriptor: RemoteDescriptor,
}

#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Retrieve the full asset for `identity`.
    async fn fetch(&self, identity: &ResourceIdentity) -> Result<FetchedAsset, FetchError>;
}

/// Client options for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub request_timeout: Duration,
    pub pool_max_idle_per_host: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            pool_max_idle_per_host: 8,
        }
    }
}

/// [`AssetFetcher`] over HTTP(S), resolving URLs through an [`AssetLayout`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    layout: Arc<dyn AssetLayout>,
}

impl HttpFetcher {
    pub fn new(layout: Arc<dyn AssetLayout>, options: &FetchOptions) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(options.request_timeout)
            .pool_max_idle_per_host(options.pool_max_idle_per_host)
            .build()
            .map_err(|e| SyncError::Client(e.to_string()))?;
        Ok(Self::with_client(client, layout))
    }

    /// Share an existing client (connection pool) with other callers.
    pub fn with_client(client: Client, layout: Arc<dyn AssetLayout>) -> Self {
        Self { client, layout }
    }
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
    async fn fetch(&self, identity: &ResourceIdentity) -> Result<FetchedAsset, FetchError> {
        let url = self.layout.remote_url(identity)?;

        let mut resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::transport(&url, e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                url,
            });
        }

        let last_modified = last_modified(resp.headers(), &url)?;
        let declared = content_length(resp.headers(), &url)?;

        let mut body = BytesMut::with_capacity(declared.unwrap_or(0).min(MAX_PREALLOC) as usize);
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| FetchError::transport(&url, e))?
        {
            body.extend_from_slice(&chunk);
        }

        let received = body.len() as u64;
        let byte_len = match declared {
            Some(declared) if declared != received => {
                return Err(FetchError::Transport {
                    url,
                    message: format!("body truncated: expected {declared} bytes, received {received}"),
                });
            }
            Some(declared) => declared,
            None => received,
        };

        Ok(FetchedAsset {
            bytes: body.freeze(),
            descriptor: RemoteDescriptor::new(byte_len, last_modified),
        })
    }
}

fn last_modified(headers: &HeaderMap, url: &Url) -> Result<chrono::DateTime<chrono::Utc>, FetchError> {
    let Some(value) = headers.get(LAST_MODIFIED) else {
        return Err(FetchError::MissingHeader {
            url: url.clone(),
            header: "Last-Modified",
        });
    };
    let invalid = || FetchError::InvalidHeader {
        url: url.clone(),
        header: "Last-Modified",
        value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
    };
    let text = value.to_str().map_err(|_| invalid())?;
    parse_http_date(text).ok_or_else(invalid)
}

fn content_length(headers: &HeaderMap, url: &Url) -> Result<Option<u64>, FetchError> {
    let Some(value) = headers.get(CONTENT_LENGTH) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|text| text.trim().parse::<u64>().ok())
        .map(Some)
        .ok_or_else(|| FetchError::InvalidHeader {
            url: url.clone(),
            header: "Content-Length",
            value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
        })
}
