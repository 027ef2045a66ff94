//! Chart-ready views of a trained model.
//!
//! Every view checks that the test arrays line up before producing anything;
//! a mismatch is reported instead of truncating or padding.

use artifacts::decimal::round_to;
use artifacts::{ModelDescriptor, Scalar};
use serde::Serialize;

use crate::{InsightError, Result};

/// Decimal places kept for actual/predicted values.
pub const VALUE_DECIMALS: usize = 4;

/// Decimal places kept for importance percentages.
pub const PERCENT_DECIMALS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportanceBar {
    pub feature: String,
    pub importance_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonPoint {
    pub index: usize, // 1-based
    pub actual: Scalar,
    pub predicted: Scalar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub actual: Scalar,
    pub predicted: Scalar,
}

/// All three views, built together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSet {
    pub importance: Vec<ImportanceBar>,
    pub comparison: Vec<ComparisonPoint>,
    pub scatter: Vec<ScatterPoint>,
}

impl ChartSet {
    pub fn build(model: &ModelDescriptor) -> Result<Self> {
        Ok(Self {
            importance: importance_ranking(model)?,
            comparison: comparison_series(model)?,
            scatter: scatter_set(model)?,
        })
    }
}

/// Features by descending rounded percentage; equal percentages keep the
/// order the service reported them in.
pub fn importance_ranking(model: &ModelDescriptor) -> Result<Vec<ImportanceBar>> {
    check_aligned(model)?;

    let mut bars: Vec<ImportanceBar> = model
        .feature_importance
        .iter()
        .map(|(feature, weight)| ImportanceBar {
            feature: feature.to_string(),
            importance_percent: round_to(weight * 100.0, PERCENT_DECIMALS),
        })
        .collect();

    // sort_by is stable
    bars.sort_by(|a, b| b.importance_percent.total_cmp(&a.importance_percent));
    Ok(bars)
}

pub fn comparison_series(model: &ModelDescriptor) -> Result<Vec<ComparisonPoint>> {
    Ok(rounded_pairs(model)?
        .enumerate()
        .map(|(i, (actual, predicted))| ComparisonPoint {
            index: i + 1,
            actual,
            predicted,
        })
        .collect())
}

pub fn scatter_set(model: &ModelDescriptor) -> Result<Vec<ScatterPoint>> {
    Ok(rounded_pairs(model)?
        .map(|(actual, predicted)| ScatterPoint { actual, predicted })
        .collect())
}

fn rounded_pairs(
    model: &ModelDescriptor,
) -> Result<impl Iterator<Item = (Scalar, Scalar)> + '_> {
    check_aligned(model)?;
    Ok(model
        .test_actual
        .iter()
        .zip(&model.test_predicted)
        .map(|(a, p)| (round_value(a), round_value(p))))
}

fn round_value(v: &Scalar) -> Scalar {
    v.map_number(|n| round_to(n, VALUE_DECIMALS))
}

fn check_aligned(model: &ModelDescriptor) -> Result<()> {
    model
        .aligned_len()
        .map(|_| ())
        .map_err(|_| InsightError::MalformedModelDescriptor {
            actual: model.test_actual.len(),
            predicted: model.test_predicted.len(),
        })
}
