use crate::{ArtifactError, DatasetDescriptor, ModelDescriptor, Result};

/// Holds at most one dataset and at most one model.
///
/// A model never outlives the dataset it was installed against: installing
/// a dataset drops the model, and a model cannot be installed without one.
#[derive(Clone, Debug, Default)]
pub struct ArtifactStore {
    dataset: Option<DatasetDescriptor>,
    model: Option<ModelDescriptor>,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dataset(&self) -> Option<&DatasetDescriptor> {
        self.dataset.as_ref()
    }

    pub fn model(&self) -> Option<&ModelDescriptor> {
        self.model.as_ref()
    }

    pub fn has_dataset(&self) -> bool {
        self.dataset.is_some()
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Replaces the dataset wholesale and clears any model.
    pub fn install_dataset(&mut self, dataset: DatasetDescriptor) {
        self.model = None;
        self.dataset = Some(dataset);
    }

    pub fn install_model(&mut self, model: ModelDescriptor) -> Result<()> {
        if self.dataset.is_none() {
            return Err(ArtifactError::NoDataset);
        }
        self.model = Some(model);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.dataset = None;
        self.model = None;
    }
}
