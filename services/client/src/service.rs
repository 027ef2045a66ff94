use async_trait::async_trait;
use bytes::Bytes;
use insights::FeaturePayload;

use crate::error::ServiceError;
use crate::types_api::{HealthStatus, PredictResponse, TrainRequest, TrainResponse, UploadResponse};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    pub base_url: String,
}

/// The remote side of the workflow: dataset intake, training and inference.
#[async_trait]
pub trait TrainingService: Send + Sync {
    async fn health(&self) -> Result<HealthStatus, ServiceError>;
    async fn upload(&self, filename: &str, content: Bytes) -> Result<UploadResponse, ServiceError>;
    async fn train(&self, request: &TrainRequest) -> Result<TrainResponse, ServiceError>;
    async fn predict(&self, payload: &FeaturePayload) -> Result<PredictResponse, ServiceError>;
    fn info(&self) -> ServiceInfo;
}
