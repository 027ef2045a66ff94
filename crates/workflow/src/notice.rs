use artifacts::decimal::to_fixed;
use artifacts::{DatasetDescriptor, ModelDescriptor};
use serde::Serialize;

/// Short user-facing confirmation of a completed transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn dataset_loaded(dataset: &DatasetDescriptor) -> Self {
        Self {
            title: "File Uploaded Successfully".to_string(),
            description: format!(
                "Loaded dataset with {} rows and {} columns.",
                dataset.row_count,
                dataset.column_count()
            ),
        }
    }

    pub fn model_trained(model: &ModelDescriptor) -> Self {
        Self {
            title: "Model Trained Successfully".to_string(),
            description: format!("{}: {}", model.metric_name, to_fixed(model.score, 4)),
        }
    }

    pub fn reset() -> Self {
        Self {
            title: "Application Reset".to_string(),
            description: "All data and model information has been cleared.".to_string(),
        }
    }
}
