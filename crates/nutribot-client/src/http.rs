//! reqwest-backed implementation of [`FoodService`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use nutribot_core::config::NutriConfig;
use nutribot_core::types::{ConfirmationData, NutritionData};

use crate::error::{Result, ServiceError};
use crate::service::{AnalysisInput, FoodService, ImageUpload};

pub const ANALYZE_PATH: &str = "analyze-food";
pub const NUTRITION_PATH: &str = "get-nutrition-info";

#[derive(Serialize)]
struct AnalyzeTextRequest<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct NutritionRequest<'a> {
    food: &'a str,
    quantity: &'a str,
}

/// HTTP client for `POST {base}/analyze-food` and `POST {base}/get-nutrition-info`.
#[derive(Clone, Debug)]
pub struct HttpFoodService {
    base_url: Url,
    http: Client,
}

impl HttpFoodService {
    /// Create a client against `base_url` with the given timeouts.
    pub fn new(
        mut base_url: Url,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        // `Url::join` replaces the last path segment unless the base ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self { base_url, http })
    }

    /// Create a client from configuration. Fails if the base URL is missing or invalid.
    pub fn from_config(config: &NutriConfig) -> Result<Self> {
        let base_url = config.resolve_base_url()?;
        Self::new(
            base_url,
            Duration::from_secs(config.service.request_timeout_secs),
            Duration::from_secs(config.service.connect_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ServiceError::Config(format!("invalid endpoint '{path}': {e}")))
    }

    async fn analyze_text(&self, text: &str) -> Result<Response> {
        Ok(self
            .http
            .post(self.url(ANALYZE_PATH)?)
            .json(&AnalyzeTextRequest { text })
            .send()
            .await?)
    }

    async fn analyze_image(&self, upload: ImageUpload) -> Result<Response> {
        let part = Part::bytes(upload.bytes.to_vec())
            .file_name(upload.file_name)
            .mime_str(&upload.mime)
            .map_err(|e| ServiceError::Multipart(e.to_string()))?;
        let form = Form::new().part("image", part);
        Ok(self
            .http
            .post(self.url(ANALYZE_PATH)?)
            .multipart(form)
            .send()
            .await?)
    }
}

/// Reject non-2xx responses and decode the JSON body.
async fn decode<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        tracing::warn!(endpoint, status = status.as_u16(), "Service returned an error status");
        return Err(ServiceError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| ServiceError::Decode {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })
}

#[async_trait]
impl FoodService for HttpFoodService {
    async fn analyze(&self, input: AnalysisInput) -> Result<ConfirmationData> {
        tracing::debug!(mode = input.mode(), "Sending analysis request");
        let response = match input {
            AnalysisInput::Text(text) => self.analyze_text(&text).await?,
            AnalysisInput::Image(upload) => self.analyze_image(upload).await?,
        };
        decode(ANALYZE_PATH, response).await
    }

    async fn lookup_nutrition(&self, food: &str, quantity: &str) -> Result<NutritionData> {
        tracing::debug!(food, quantity, "Sending nutrition lookup");
        let response = self
            .http
            .post(self.url(NUTRITION_PATH)?)
            .json(&NutritionRequest { food, quantity })
            .send()
            .await?;
        decode(NUTRITION_PATH, response).await
    }
}
