use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use liftfuel_core::fdc::{
    FoodRecord, FoodSearchProvider, SearchError, SearchResponse, filter_complete,
};

const NAME_DATA_TYPES: &str = "Foundation,SR Legacy,Survey (FNDDS)";
const BARCODE_DATA_TYPE: &str = "Branded";
const PAGE_SIZE: &str = "25";

pub struct FdcClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FdcClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        Self::with_timeouts(
            base_url,
            api_key,
            Duration::from_secs(10),
            Duration::from_secs(5),
        )
    }

    pub fn with_timeouts(
        base_url: &str,
        api_key: &str,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "liftfuel-cli/{} (workout and nutrition tracker)",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    async fn search(&self, params: &[(&str, &str)]) -> Result<Vec<FoodRecord>, SearchError> {
        let url = format!("{}/foods/search", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let body = resp.text().await.map_err(transport_error)?;
        let data: SearchResponse =
            serde_json::from_str(&body).map_err(|e| SearchError::Decode(e.to_string()))?;
        debug!(count = data.foods.len(), "FDC search returned");
        Ok(data.foods)
    }
}

fn transport_error(e: reqwest::Error) -> SearchError {
    if e.is_timeout() {
        SearchError::Timeout
    } else {
        SearchError::Network(e.to_string())
    }
}

#[async_trait]
impl FoodSearchProvider for FdcClient {
    async fn search_by_name(&self, query: &str) -> Result<Vec<FoodRecord>, SearchError> {
        let foods = self
            .search(&[
                ("query", query),
                ("dataType", NAME_DATA_TYPES),
                ("pageSize", PAGE_SIZE),
            ])
            .await?;
        Ok(filter_complete(foods))
    }

    async fn search_by_barcode(&self, code: &str) -> Result<Vec<FoodRecord>, SearchError> {
        self.search(&[("query", code), ("dataType", BARCODE_DATA_TYPE)])
            .await
    }
}
