//! Prediction form: free-text entries in, typed request payload out, and the
//! service's answer back into something displayable.

use artifacts::decimal::to_fixed;
use artifacts::{ModelDescriptor, ProblemType, Scalar};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::{InsightError, Result};

pub const CLASSIFICATION_NOTE: &str =
    "This is a classification prediction representing the most likely class.";

/// Feature values for one prediction request, in entry order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeaturePayload {
    values: Vec<(String, Scalar)>,
}

impl FeaturePayload {
    pub fn get(&self, feature: &str) -> Option<&Scalar> {
        self.values.iter().find(|(k, _)| k == feature).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn set(&mut self, feature: String, value: Scalar) {
        match self.values.iter_mut().find(|(k, _)| *k == feature) {
            Some(slot) => slot.1 = value,
            None => self.values.push((feature, value)),
        }
    }
}

impl Serialize for FeaturePayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (k, v) in &self.values {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Coerces raw form entries.
///
/// Blank entries are left out. An entry that parses completely as a finite
/// number (surrounding whitespace ignored) becomes a number; anything else
/// is sent as the text the user typed.
pub fn bind_inputs<I, K, V>(raw_entries: I) -> FeaturePayload
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: AsRef<str>,
{
    let mut payload = FeaturePayload::default();
    for (feature, raw) in raw_entries {
        let raw = raw.as_ref();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        let value = match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Scalar::Number(n),
            _ => Scalar::Text(raw.to_string()),
        };
        payload.set(feature.into(), value);
    }
    payload
}

/// Primary prediction, ready to show.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionDisplay {
    pub value: Scalar,
    pub display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<&'static str>,
}

pub fn normalize_result(raw_prediction: &[Scalar], problem_type: ProblemType) -> Result<PredictionDisplay> {
    let primary = raw_prediction.first().ok_or(InsightError::EmptyPrediction)?;
    let display = match primary {
        Scalar::Number(n) => to_fixed(*n, 4),
        other => other.to_string(),
    };
    let note = match problem_type {
        ProblemType::Classification => Some(CLASSIFICATION_NOTE),
        ProblemType::Regression => None,
    };
    Ok(PredictionDisplay {
        value: primary.clone(),
        display,
        note,
    })
}

/// One input of the prediction form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputField {
    pub feature: String,
    pub label: String,
}

/// Form inputs, most important feature first.
pub fn input_fields(model: &ModelDescriptor) -> Vec<InputField> {
    let mut weighted: Vec<(&str, f64)> = model.feature_importance.iter().collect();
    weighted.sort_by(|a, b| b.1.total_cmp(&a.1));
    weighted
        .into_iter()
        .map(|(feature, weight)| InputField {
            feature: feature.to_string(),
            label: format!("{feature} (Importance: {}%)", to_fixed(weight * 100.0, 1)),
        })
        .collect()
}

pub fn performance_summary(model: &ModelDescriptor) -> String {
    format!("{}: {}", model.metric_name, to_fixed(model.score, 4))
}
