//! HTTP client for the restaurant API.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    config::ClientConfig,
    data::{Restaurant, Selection},
};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    Status { status: StatusCode, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url: config.api_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Distinct cuisines for the cuisine filter.
    pub async fn cuisines(&self) -> Result<Vec<String>, ClientError> {
        let value = self.get_json::<Value>("/api/cuisines", &[]).await?;
        parse_string_list(value)
    }

    /// Distinct boroughs for the borough filter.
    pub async fn boroughs(&self) -> Result<Vec<String>, ClientError> {
        let value = self.get_json::<Value>("/api/boroughs", &[]).await?;
        parse_string_list(value)
    }

    /// Restaurants matching `selection`.
    pub async fn restaurants(&self, selection: &Selection) -> Result<Vec<Restaurant>, ClientError> {
        self.get_json("/api/restaurants", &selection.query_pairs()).await
    }

    /// The unfiltered featured listing.
    pub async fn featured(&self) -> Result<Vec<Restaurant>, ClientError> {
        self.get_json("/api/restaurants", &[]).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let url = format!("{}{path}", self.base_url);

        let mut req = self.client.get(&url);
        if !query.is_empty() {
            req = req.query(query);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Malformed(e.to_string()))
    }
}

/// Accept only a JSON array of strings; anything else (such as
/// `{"error": "..."}`) is malformed.
pub fn parse_string_list(value: Value) -> Result<Vec<String>, ClientError> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(ClientError::Malformed(format!(
                "expected an array, got {other}"
            )))
        }
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            other => Err(ClientError::Malformed(format!(
                "expected a string element, got {other}"
            ))),
        })
        .collect()
}
