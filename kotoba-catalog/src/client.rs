//! HTTP client for the catalog's search API.

use std::time::Duration;

use reqwest::Client;
use url::Url;

use kotoba_core::MirrorConfig;

use crate::error::CatalogError;
use crate::model::CatalogResponse;
use crate::query::CatalogQuery;

#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    endpoint: Url,
}

impl CatalogClient {
    /// Client for `endpoint` (the full `.../SearchCategoryAPI` URL).
    pub fn new(endpoint: Url, request_timeout: Duration) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| CatalogError::Client(e.to_string()))?;
        Ok(Self::with_client(client, endpoint))
    }

    pub fn from_config(config: &MirrorConfig) -> Result<Self, CatalogError> {
        Self::new(config.words_api_url()?, config.request_timeout())
    }

    pub fn with_client(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    /// Fetch and decode one listing.
    pub async fn list_words(&self, query: &CatalogQuery) -> Result<CatalogResponse, CatalogError> {
        let url = self.endpoint.clone();
        let transport = |e: reqwest::Error| CatalogError::Transport {
            url: url.clone(),
            message: e.to_string(),
        };

        let resp = self
            .client
            .get(url.clone())
            .query(&query.params())
            .send()
            .await
            .map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CatalogError::Http {
                status: status.as_u16(),
                url: resp.url().clone(),
            });
        }

        let body = resp.bytes().await.map_err(transport)?;
        let listing: CatalogResponse =
            serde_json::from_slice(&body).map_err(|e| CatalogError::Decode {
                url: url.clone(),
                message: e.to_string(),
            })?;

        tracing::debug!(
            level = %query.level,
            language = %query.language,
            words = listing.data.len(),
            "catalog listing received",
        );
        Ok(listing)
    }
}
