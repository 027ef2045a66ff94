use std::collections::BTreeMap;

use artifacts::{
    ArtifactError, DatasetDescriptor, FeatureImportance, ModelDescriptor, PreviewRow, ProblemType,
    Scalar,
};
use insights::FeaturePayload;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: chrono::NaiveDateTime,
}

#[derive(Clone, Debug, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub filename: Option<String>, // name the service stored the file under
    pub statistics: DatasetStatistics,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DatasetStatistics {
    pub columns: Vec<String>,
    pub shape: (u64, u64), // (rows, columns)
    #[serde(default)]
    pub preview: Vec<PreviewRow>,
    #[serde(default)]
    pub dtypes: BTreeMap<String, String>,
    #[serde(default)]
    pub missing_values: BTreeMap<String, u64>,
}

impl UploadResponse {
    /// `local_name` is used when the service does not echo a filename.
    pub fn into_descriptor(
        self,
        local_name: &str,
        content: &[u8],
    ) -> Result<DatasetDescriptor, ArtifactError> {
        let stats = self.statistics;
        let filename = self.filename.unwrap_or_else(|| local_name.to_string());
        Ok(
            DatasetDescriptor::new(filename, stats.shape.0, stats.columns, stats.preview, content)?
                .with_column_stats(stats.dtypes, stats.missing_values),
        )
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainRequest {
    pub filename: String,
    #[serde(rename = "targetColumn")]
    pub target_column: String,
    #[serde(rename = "problemType")]
    pub problem_type: ProblemType,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TrainResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub metrics: BTreeMap<String, serde_json::Value>,
    pub feature_importance: FeatureImportance,
    #[serde(alias = "test_predicted")]
    pub test_predictions: Vec<Scalar>,
    pub test_actual: Vec<Scalar>,
    #[serde(default)]
    pub metric_name: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

impl TrainResponse {
    /// Headline metric: explicit `metric_name`/`score` if present, otherwise
    /// `r2` for regression and `accuracy` for classification.
    pub fn headline(&self, problem_type: ProblemType) -> Option<(String, f64)> {
        if let (Some(name), Some(score)) = (&self.metric_name, self.score) {
            return Some((name.clone(), score));
        }
        let key = match problem_type {
            ProblemType::Regression => "r2",
            ProblemType::Classification => "accuracy",
        };
        let score = self.metrics.get(key)?.as_f64()?;
        Some((key.to_string(), score))
    }

    pub fn into_descriptor(
        self,
        target_column: &str,
        problem_type: ProblemType,
    ) -> Result<ModelDescriptor, String> {
        let (metric_name, score) = self
            .headline(problem_type)
            .ok_or_else(|| "Training response carried no score".to_string())?;

        Ok(ModelDescriptor {
            metric_name,
            score,
            problem_type,
            target_column: target_column.to_string(),
            feature_importance: self.feature_importance,
            test_actual: self.test_actual,
            test_predicted: self.test_predictions,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct PredictRequest<'a> {
    pub data: &'a [FeaturePayload],
}

#[derive(Clone, Debug, Deserialize)]
pub struct PredictResponse {
    pub predictions: Vec<Scalar>,
    #[serde(default)]
    pub feature_importance: Option<FeatureImportance>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}
