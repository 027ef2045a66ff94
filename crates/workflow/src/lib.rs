//! Workflow state machine for the tabular training client.
//!
//! The controller owns the artifact store and decides which stages are
//! reachable; everything it needs to answer is derived from the store.

mod controller;
mod error;
mod notice;
mod sequence;
mod stage;

pub use controller::{Outcome, StepStatus, WorkflowController};
pub use error::{Result, WorkflowError};
pub use notice::Notice;
pub use sequence::{RequestSequencer, RequestTicket};
pub use stage::Stage;
