use artifacts::{ArtifactStore, DatasetDescriptor, ModelDescriptor};
use serde::Serialize;
use tracing::{debug, info};

use crate::{Notice, RequestSequencer, RequestTicket, Result, Stage, WorkflowError};

/// One entry of the step-progress indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepStatus {
    pub stage: Stage,
    pub position: usize, // 1-based
    pub label: &'static str,
    pub active: bool,
    pub enterable: bool,
}

/// What became of a response delivered against a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied(Notice),
    /// The ticket was superseded; nothing changed.
    Stale,
}

/// Upload -> Train -> Predict -> Visualize.
///
/// Owns the artifact store. Which stages can be entered is derived from the
/// store on every query; the only other state is the active stage and the
/// request counters.
#[derive(Debug, Default)]
pub struct WorkflowController {
    store: ArtifactStore,
    active: Stage,
    sequencer: RequestSequencer,
}

impl WorkflowController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_stage(&self) -> Stage {
        self.active
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn dataset(&self) -> Option<&DatasetDescriptor> {
        self.store.dataset()
    }

    pub fn model(&self) -> Option<&ModelDescriptor> {
        self.store.model()
    }

    pub fn can_enter(&self, stage: Stage) -> bool {
        match stage {
            Stage::Upload => true,
            Stage::Train => self.store.has_dataset(),
            Stage::Predict | Stage::Visualize => self.store.has_model(),
        }
    }

    /// Installs a freshly uploaded dataset. Any model trained on the previous
    /// dataset is dropped, and in-flight training or prediction requests go
    /// stale.
    pub fn on_dataset_ready(&mut self, dataset: DatasetDescriptor) -> Notice {
        let notice = Notice::dataset_loaded(&dataset);
        info!(
            filename = %dataset.filename,
            rows = dataset.row_count,
            columns = dataset.column_count(),
            "workflow: dataset installed"
        );

        self.store.install_dataset(dataset);
        self.sequencer.invalidate(&[Stage::Train, Stage::Predict]);
        self.active = Stage::Train;
        notice
    }

    pub fn on_model_ready(&mut self, model: ModelDescriptor) -> Result<Notice> {
        let dataset = self.store.dataset().ok_or(WorkflowError::InvalidTransition {
            stage: Stage::Predict,
            reason: "no dataset has been uploaded",
        })?;
        model.validate_against(dataset)?;

        let notice = Notice::model_trained(&model);
        info!(
            metric = %model.metric_name,
            score = model.score,
            problem_type = %model.problem_type,
            "workflow: model installed"
        );

        self.store.install_model(model)?;
        self.sequencer.invalidate(&[Stage::Predict]);
        // Visualize is enterable too, but training lands on Predict.
        self.active = Stage::Predict;
        Ok(notice)
    }

    /// Explicit tab selection.
    pub fn navigate(&mut self, stage: Stage) -> Result<()> {
        if !self.can_enter(stage) {
            return Err(WorkflowError::InvalidTransition {
                stage,
                reason: missing_artifact(stage),
            });
        }
        self.active = stage;
        Ok(())
    }

    pub fn reset(&mut self) -> Notice {
        self.store.clear();
        self.sequencer.invalidate_all();
        self.active = Stage::Upload;
        info!("workflow: reset");
        Notice::reset()
    }

    pub fn steps(&self) -> Vec<StepStatus> {
        Stage::ALL
            .into_iter()
            .map(|stage| StepStatus {
                stage,
                position: stage.index() + 1,
                label: stage.label(),
                active: stage == self.active,
                enterable: self.can_enter(stage),
            })
            .collect()
    }

    /// Issues a ticket for a request made on behalf of `stage`.
    pub fn begin(&mut self, stage: Stage) -> Result<RequestTicket> {
        if !self.can_enter(stage) {
            return Err(WorkflowError::InvalidTransition {
                stage,
                reason: missing_artifact(stage),
            });
        }
        let ticket = self.sequencer.issue(stage);
        debug!(stage = %stage, seq = ticket.seq, "workflow: request issued");
        Ok(ticket)
    }

    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.sequencer.is_current(ticket)
    }

    pub fn accept_dataset(
        &mut self,
        ticket: RequestTicket,
        dataset: DatasetDescriptor,
    ) -> Result<Outcome> {
        expect_stage(&ticket, Stage::Upload)?;
        if !self.settle(&ticket) {
            return Ok(Outcome::Stale);
        }
        Ok(Outcome::Applied(self.on_dataset_ready(dataset)))
    }

    pub fn accept_model(&mut self, ticket: RequestTicket, model: ModelDescriptor) -> Result<Outcome> {
        expect_stage(&ticket, Stage::Train)?;
        if !self.settle(&ticket) {
            return Ok(Outcome::Stale);
        }
        self.on_model_ready(model).map(Outcome::Applied)
    }

    fn settle(&self, ticket: &RequestTicket) -> bool {
        let current = self.is_current(ticket);
        if !current {
            debug!(stage = %ticket.stage, seq = ticket.seq, "workflow: dropping stale response");
        }
        current
    }
}

fn missing_artifact(stage: Stage) -> &'static str {
    match stage {
        Stage::Upload => "always enterable",
        Stage::Train => "no dataset has been uploaded",
        Stage::Predict | Stage::Visualize => "no model has been trained",
    }
}

fn expect_stage(ticket: &RequestTicket, stage: Stage) -> Result<()> {
    if ticket.stage != stage {
        return Err(WorkflowError::InvalidTransition {
            stage,
            reason: "ticket was issued for another stage",
        });
    }
    Ok(())
}
