//! Derived data for the model views: chart series and the prediction form.

pub mod binder;
pub mod charts;
mod error;

pub use binder::{bind_inputs, input_fields, normalize_result, performance_summary};
pub use binder::{FeaturePayload, InputField, PredictionDisplay, CLASSIFICATION_NOTE};
pub use charts::{comparison_series, importance_ranking, scatter_set};
pub use charts::{ChartSet, ComparisonPoint, ImportanceBar, ScatterPoint};
pub use error::{InsightError, Result};
