use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::schema::{DatasetList, ImageList, LegacyImage};
use crate::{routes, Ack, ApiError, DatasetInfo, DatasetSummary, ImageData, LabelRecordSet, Result};

/// Content type the service has always been sent for the bulk image
/// request, even though the body is a JSON array. Kept for wire compatibility.
pub const IMAGES_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[async_trait]
pub trait DatasetApi: Send + Sync {
    async fn list_datasets(&self) -> Result<Vec<DatasetSummary>>;
    async fn get_dataset_metadata(&self, name: &str) -> Result<DatasetInfo>;
    async fn get_label_records(&self, dataset: &str, label: &str) -> Result<LabelRecordSet>;

    /// Bulk fetch. The reply only holds the hashes the server could resolve,
    /// in no particular order.
    async fn get_images(&self, dataset: &str, hashes: &[String]) -> Result<Vec<ImageData>>;

    async fn set_record_validity(&self, dataset: &str, hash: &str, valid: bool) -> Result<Ack>;
    async fn set_font_validity(&self, dataset: &str, font: &str, valid: bool) -> Result<Ack>;
    async fn set_label_completion(&self, dataset: &str, label: &str, completed: bool) -> Result<Ack>;

    /// Single image as base64. Legacy endpoint, superseded by `get_images`.
    async fn get_image(&self, dataset: &str, hash: &str) -> Result<String> {
        let hashes = [hash.to_string()];
        self.get_images(dataset, &hashes)
            .await?
            .into_iter()
            .find(|img| img.hash == hash)
            .map(|img| img.data)
            .ok_or_else(|| ApiError::Server {
                status: 404,
                message: format!("Cannot find image with hash {hash:?} in dataset {dataset}!"),
            })
    }
}

pub struct HttpDatasetApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpDatasetApi {
    pub fn new(cfg: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(cfg.timeout).build()?;
        Ok(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!(%url, "GET");
        let resp = self.client.get(&url).send().await?;
        read_json(resp).await
    }
}

async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    let url = resp.url().to_string();
    let body = resp.bytes().await?;

    if status != StatusCode::OK {
        let message = server_message(&body);
        warn!(%url, status = status.as_u16(), %message, "dataset service error");
        return Err(ApiError::Server { status: status.as_u16(), message });
    }
    Ok(serde_json::from_slice(&body)?)
}

/// Prefer the JSON `message` field, fall back to the raw body.
fn server_message(body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string())
}

#[async_trait]
impl DatasetApi for HttpDatasetApi {
    async fn list_datasets(&self) -> Result<Vec<DatasetSummary>> {
        let list: DatasetList = self.get_json(routes::DATASETS).await?;
        Ok(list.datasets.into_iter().map(|name| DatasetSummary { name }).collect())
    }

    async fn get_dataset_metadata(&self, name: &str) -> Result<DatasetInfo> {
        self.get_json(&routes::dataset(name)).await
    }

    async fn get_label_records(&self, dataset: &str, label: &str) -> Result<LabelRecordSet> {
        self.get_json(&routes::label(dataset, label)).await
    }

    async fn get_images(&self, dataset: &str, hashes: &[String]) -> Result<Vec<ImageData>> {
        let url = self.url(&routes::images(dataset));
        let body = serde_json::to_string(hashes)?;
        debug!(%url, count = hashes.len(), "POST");

        let resp = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, IMAGES_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;
        let list: ImageList = read_json(resp).await?;

        if list.images.len() != hashes.len() {
            debug!(requested = hashes.len(), returned = list.images.len(), "partial image reply");
        }
        Ok(list.images)
    }

    async fn set_record_validity(&self, dataset: &str, hash: &str, valid: bool) -> Result<Ack> {
        self.get_json(&routes::record_validity(dataset, hash, valid)).await
    }

    async fn set_font_validity(&self, dataset: &str, font: &str, valid: bool) -> Result<Ack> {
        self.get_json(&routes::font_validity(dataset, font, valid)).await
    }

    async fn set_label_completion(&self, dataset: &str, label: &str, completed: bool) -> Result<Ack> {
        self.get_json(&routes::label_completion(dataset, label, completed)).await
    }

    async fn get_image(&self, dataset: &str, hash: &str) -> Result<String> {
        let img: LegacyImage = self.get_json(&routes::legacy_image(dataset, hash)).await?;
        Ok(img.image)
    }
}
