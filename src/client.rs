use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::catalog::{Category, Video};
use crate::server::VideoDetail;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("video {0} not found")]
    NotFound(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Client for the catalog server's JSON API
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn list_videos(
        &self,
        search: Option<&str>,
        category: Option<&str>,
    ) -> Result<Vec<Video>, ClientError> {
        let mut params = Vec::new();
        if let Some(search) = search.filter(|s| !s.is_empty()) {
            params.push(format!("search={}", urlencoding::encode(search)));
        }
        if let Some(category) = category.filter(|c| !c.is_empty()) {
            params.push(format!("category={}", urlencoding::encode(category)));
        }

        let mut url = format!("{}/api/videos", self.base_url);
        if !params.is_empty() {
            url.push('?');
            url.push_str(&params.join("&"));
        }

        self.get_json(&url).await
    }

    pub async fn get_video(&self, id: &str) -> Result<VideoDetail, ClientError> {
        let url = format!("{}/api/videos/{}", self.base_url, urlencoding::encode(id));
        let response = self.client.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(id.to_string()));
        }
        if !response.status().is_success() {
            return Err(ClientError::InvalidResponse(format!(
                "status: {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }

    pub async fn categories(&self) -> Result<Vec<Category>, ClientError> {
        let url = format!("{}/api/categories", self.base_url);
        self.get_json(&url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ClientError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(ClientError::InvalidResponse(format!(
                "status: {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }
}
