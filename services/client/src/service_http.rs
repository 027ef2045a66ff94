use async_trait::async_trait;
use bytes::Bytes;
use insights::FeaturePayload;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::AppConfig;
use crate::error::ServiceError;
use crate::service::{ServiceInfo, TrainingService};
use crate::types_api::{
    ErrorBody, HealthStatus, PredictRequest, PredictResponse, TrainRequest, TrainResponse,
    UploadResponse,
};

pub const UPLOAD_FALLBACK: &str = "Failed to upload file";
pub const TRAIN_FALLBACK: &str = "Failed to train model";
pub const PREDICT_FALLBACK: &str = "Failed to make prediction";
pub const HEALTH_FALLBACK: &str = "Health check failed";

/// JSON-over-HTTP client for the training service.
pub struct HttpTrainingService {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTrainingService {
    pub fn new(cfg: &AppConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder().timeout(cfg.timeout).build()?;
        Ok(Self {
            base_url: cfg.api_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Decodes a 2xx body as `T`; anything else becomes `Rejected` carrying the
/// service's `error` text or `fallback`.
async fn decode<T: DeserializeOwned>(
    resp: reqwest::Response,
    fallback: &str,
) -> Result<T, ServiceError> {
    let status = resp.status();
    if status.is_success() {
        return resp
            .json::<T>()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()));
    }

    let body: ErrorBody = resp.json().await.unwrap_or_default();
    let message = body
        .error
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string());
    debug!(status = status.as_u16(), %message, "training service rejected request");
    Err(ServiceError::Rejected {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl TrainingService for HttpTrainingService {
    async fn health(&self) -> Result<HealthStatus, ServiceError> {
        let resp = self.client.get(self.url("/api/health")).send().await?;
        decode(resp, HEALTH_FALLBACK).await
    }

    async fn upload(&self, filename: &str, content: Bytes) -> Result<UploadResponse, ServiceError> {
        let part = Part::bytes(content.to_vec())
            .file_name(filename.to_string())
            .mime_str("text/csv")?;
        let form = Form::new().part("file", part);

        let resp = self
            .client
            .post(self.url("/api/upload"))
            .multipart(form)
            .send()
            .await?;
        decode(resp, UPLOAD_FALLBACK).await
    }

    async fn train(&self, request: &TrainRequest) -> Result<TrainResponse, ServiceError> {
        let resp = self
            .client
            .post(self.url("/api/train"))
            .json(request)
            .send()
            .await?;
        decode(resp, TRAIN_FALLBACK).await
    }

    async fn predict(&self, payload: &FeaturePayload) -> Result<PredictResponse, ServiceError> {
        let body = PredictRequest {
            data: std::slice::from_ref(payload),
        };
        let resp = self
            .client
            .post(self.url("/api/predict"))
            .json(&body)
            .send()
            .await?;
        decode(resp, PREDICT_FALLBACK).await
    }

    fn info(&self) -> ServiceInfo {
        ServiceInfo {
            name: "http".to_string(),
            base_url: self.base_url.clone(),
        }
    }
}
