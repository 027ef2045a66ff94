use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::WorkflowError;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    #[default]
    Upload,
    Train,
    Predict,
    Visualize,
}

impl Stage {
    /// Rendering order of the navigation and the step indicator.
    pub const ALL: [Stage; 4] = [Stage::Upload, Stage::Train, Stage::Predict, Stage::Visualize];

    pub fn id(&self) -> &'static str {
        match self {
            Stage::Upload => "upload",
            Stage::Train => "train",
            Stage::Predict => "predict",
            Stage::Visualize => "visualize",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Stage::Upload => "Upload Data",
            Stage::Train => "Train Model",
            Stage::Predict => "Make Predictions",
            Stage::Visualize => "Visualizations",
        }
    }

    /// Zero-based position in `ALL`.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Stage {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|st| st.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| WorkflowError::UnknownStage(s.to_string()))
    }
}
