//! Client side of the tabular training workflow: configuration, the HTTP
//! boundary to the training service, and the session that drives the
//! workflow controller through it.

pub mod config;
pub mod error;
pub mod report;
pub mod service;
pub mod service_http;
pub mod session;
pub mod types_api;

pub use config::AppConfig;
pub use error::{ServiceError, SessionError};
pub use service::{ServiceInfo, TrainingService};
pub use service_http::HttpTrainingService;
pub use session::{Session, Snapshot};
