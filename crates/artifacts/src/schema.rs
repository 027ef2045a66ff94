use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::{FeatureImportance, Scalar};

pub type Hash32 = [u8; 32];

/// Rows kept from the service's `head()` preview.
pub const PREVIEW_ROWS: usize = 5;

pub type PreviewRow = BTreeMap<String, Scalar>;

#[derive(Debug, Error, PartialEq)]
pub enum ArtifactError {
    #[error("duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("test arrays differ in length: {actual} actual vs {predicted} predicted")]
    LengthMismatch { actual: usize, predicted: usize },

    #[error("feature importance is empty")]
    EmptyImportance,

    #[error("feature '{0}' is not a column of the dataset")]
    UnknownFeature(String),

    #[error("target column '{0}' listed as a feature")]
    TargetAsFeature(String),

    #[error("importance of '{feature}' out of range: {weight}")]
    WeightOutOfRange { feature: String, weight: f64 },

    #[error("no dataset installed")]
    NoDataset,

    #[error("unknown problem type: {0}")]
    UnknownProblemType(String),
}

pub type Result<T> = std::result::Result<T, ArtifactError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProblemType {
    Regression,
    Classification,
}

impl ProblemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemType::Regression => "regression",
            ProblemType::Classification => "classification",
        }
    }
}

impl fmt::Display for ProblemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProblemType {
    type Err = ArtifactError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "regression" => Ok(ProblemType::Regression),
            "classification" => Ok(ProblemType::Classification),
            other => Err(ArtifactError::UnknownProblemType(other.to_string())),
        }
    }
}

/// An uploaded tabular dataset, as far as the client knows it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    pub filename: String,
    pub row_count: u64,
    pub column_names: Vec<String>,
    pub preview_rows: Vec<PreviewRow>,
    #[serde(default)]
    pub dtypes: BTreeMap<String, String>,
    #[serde(default)]
    pub missing_values: BTreeMap<String, u64>,
    #[serde(with = "hex", rename = "content_hash_hex")]
    pub content_hash: Hash32, // BLAKE3(file_bytes)
}

impl DatasetDescriptor {
    /// Builds a descriptor, rejecting repeated column names and cutting the
    /// preview down to `PREVIEW_ROWS`.
    pub fn new(
        filename: impl Into<String>,
        row_count: u64,
        column_names: Vec<String>,
        mut preview_rows: Vec<PreviewRow>,
        content: &[u8],
    ) -> Result<Self> {
        let mut seen = HashSet::with_capacity(column_names.len());
        for name in &column_names {
            if !seen.insert(name.as_str()) {
                return Err(ArtifactError::DuplicateColumn(name.clone()));
            }
        }
        preview_rows.truncate(PREVIEW_ROWS);

        Ok(Self {
            filename: filename.into(),
            row_count,
            column_names,
            preview_rows,
            dtypes: BTreeMap::new(),
            missing_values: BTreeMap::new(),
            content_hash: blake3::hash(content).into(),
        })
    }

    pub fn with_column_stats(
        mut self,
        dtypes: BTreeMap<String, String>,
        missing_values: BTreeMap<String, u64>,
    ) -> Self {
        self.dtypes = dtypes;
        self.missing_values = missing_values;
        self
    }

    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_names.iter().any(|c| c == name)
    }

    pub fn content_hash_hex(&self) -> String {
        hex::encode(self.content_hash)
    }
}

/// Result of a successful training run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub metric_name: String,
    pub score: f64,
    pub problem_type: ProblemType,
    pub target_column: String,
    pub feature_importance: FeatureImportance,
    pub test_actual: Vec<Scalar>,
    pub test_predicted: Vec<Scalar>,
}

impl ModelDescriptor {
    /// Length of the aligned test arrays.
    pub fn aligned_len(&self) -> Result<usize> {
        let (actual, predicted) = (self.test_actual.len(), self.test_predicted.len());
        if actual != predicted {
            return Err(ArtifactError::LengthMismatch { actual, predicted });
        }
        Ok(actual)
    }

    /// Checks the descriptor against the dataset it claims to be trained on.
    pub fn validate_against(&self, dataset: &DatasetDescriptor) -> Result<()> {
        self.aligned_len()?;

        if self.feature_importance.is_empty() {
            return Err(ArtifactError::EmptyImportance);
        }
        for (feature, weight) in self.feature_importance.iter() {
            if feature == self.target_column {
                return Err(ArtifactError::TargetAsFeature(feature.to_string()));
            }
            if !dataset.has_column(feature) {
                return Err(ArtifactError::UnknownFeature(feature.to_string()));
            }
            if !(0.0..=1.0).contains(&weight) {
                return Err(ArtifactError::WeightOutOfRange {
                    feature: feature.to_string(),
                    weight,
                });
            }
        }
        Ok(())
    }
}
