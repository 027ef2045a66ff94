//! One user's run through the workflow against a training service.
//!
//! The controller sits behind a mutex that is never held across a service
//! call: a request takes a ticket, releases the lock, awaits the service and
//! then re-locks to deliver the answer. Answers whose ticket went stale in
//! between are dropped.

use std::path::Path;

use artifacts::{DatasetDescriptor, ModelDescriptor, ProblemType};
use bytes::Bytes;
use insights::{bind_inputs, input_fields, normalize_result, ChartSet, InputField, PredictionDisplay};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use workflow::{Notice, Outcome, Stage, StepStatus, WorkflowController, WorkflowError};

use crate::error::SessionError;
use crate::service::TrainingService;
use crate::types_api::{HealthStatus, TrainRequest};

pub type Result<T> = std::result::Result<T, SessionError>;

pub const CSV_REQUIRED: &str = "Please upload a CSV file";

/// Point-in-time copy of the session's state.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub active: Stage,
    pub dataset: Option<DatasetDescriptor>,
    pub model: Option<ModelDescriptor>,
}

pub struct Session<S> {
    service: S,
    controller: Mutex<WorkflowController>,
    max_upload_bytes: u64,
}

impl<S: TrainingService> Session<S> {
    pub fn new(service: S, max_upload_bytes: u64) -> Self {
        Self {
            service,
            controller: Mutex::new(WorkflowController::new()),
            max_upload_bytes,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub async fn check_health(&self) -> Result<HealthStatus> {
        self.service
            .health()
            .await
            .map_err(|e| SessionError::Unavailable(e.to_string()))
            .inspect_err(log_failure)
    }

    /// Reads a CSV file from disk and uploads it.
    pub async fn upload_file(&self, path: &Path) -> Result<Outcome> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        check_csv_name(&filename).inspect_err(log_failure)?;

        let content = tokio::fs::read(path)
            .await
            .map_err(|source| SessionError::Io {
                path: path.to_path_buf(),
                source,
            })
            .inspect_err(log_failure)?;
        self.upload(&filename, Bytes::from(content)).await
    }

    pub async fn upload(&self, filename: &str, content: Bytes) -> Result<Outcome> {
        self.upload_inner(filename, content).await.inspect_err(log_failure)
    }

    async fn upload_inner(&self, filename: &str, content: Bytes) -> Result<Outcome> {
        check_csv_name(filename)?;
        if content.len() as u64 > self.max_upload_bytes {
            return Err(SessionError::Upload(format!(
                "File exceeds the {} byte upload limit",
                self.max_upload_bytes
            )));
        }

        let ticket = self.controller.lock().await.begin(Stage::Upload)?;
        info!(filename, bytes = content.len(), "session: uploading dataset");

        let answer = self
            .service
            .upload(filename, content.clone())
            .await
            .map_err(|e| SessionError::Upload(e.to_string()))
            .and_then(|resp| {
                resp.into_descriptor(filename, &content)
                    .map_err(|e| SessionError::Upload(e.to_string()))
            });

        let mut wf = self.controller.lock().await;
        if !wf.is_current(&ticket) {
            debug!(seq = ticket.seq, ok = answer.is_ok(), "session: dropping stale upload");
            return Ok(Outcome::Stale);
        }
        Ok(wf.accept_dataset(ticket, answer?)?)
    }

    /// Trains on the current dataset. `target` must be one of its columns.
    pub async fn train(&self, target: &str, problem_type: ProblemType) -> Result<Outcome> {
        self.train_inner(target, problem_type).await.inspect_err(log_failure)
    }

    async fn train_inner(&self, target: &str, problem_type: ProblemType) -> Result<Outcome> {
        let (ticket, filename) = {
            let mut wf = self.controller.lock().await;
            let filename = match wf.dataset() {
                Some(d) if d.has_column(target) => d.filename.clone(),
                Some(_) => {
                    return Err(SessionError::Training(format!(
                        "Column '{target}' is not in the dataset"
                    )))
                }
                None => String::new(), // begin() reports the gate
            };
            (wf.begin(Stage::Train)?, filename)
        };

        let request = TrainRequest {
            filename,
            target_column: target.to_string(),
            problem_type,
        };
        info!(filename = %request.filename, target, %problem_type, "session: training");

        let answer = self
            .service
            .train(&request)
            .await
            .map_err(|e| SessionError::Training(e.to_string()))
            .and_then(|resp| {
                resp.into_descriptor(target, problem_type)
                    .map_err(SessionError::Training)
            });

        let mut wf = self.controller.lock().await;
        if !wf.is_current(&ticket) {
            debug!(seq = ticket.seq, ok = answer.is_ok(), "session: dropping stale training result");
            return Ok(Outcome::Stale);
        }
        Ok(wf.accept_model(ticket, answer?)?)
    }

    /// Sends one row of feature entries for inference. `Ok(None)` means the
    /// answer arrived after the model it was meant for was replaced or reset.
    pub async fn predict<I, K, V>(&self, raw_entries: I) -> Result<Option<PredictionDisplay>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let payload = bind_inputs(raw_entries);
        self.predict_inner(payload).await.inspect_err(log_failure)
    }

    async fn predict_inner(&self, payload: insights::FeaturePayload) -> Result<Option<PredictionDisplay>> {
        let (ticket, problem_type) = {
            let mut wf = self.controller.lock().await;
            let ticket = wf.begin(Stage::Predict)?;
            let problem_type = wf
                .model()
                .map(|m| m.problem_type)
                .ok_or(WorkflowError::InvalidTransition {
                    stage: Stage::Predict,
                    reason: "no model has been trained",
                })?;
            (ticket, problem_type)
        };
        debug!(features = payload.len(), "session: predicting");

        let answer = self.service.predict(&payload).await;

        if !self.controller.lock().await.is_current(&ticket) {
            debug!(seq = ticket.seq, ok = answer.is_ok(), "session: dropping stale prediction");
            return Ok(None);
        }
        let resp = answer.map_err(|e| SessionError::Prediction(e.to_string()))?;
        Ok(Some(normalize_result(&resp.predictions, problem_type)?))
    }

    pub async fn navigate(&self, stage: Stage) -> Result<()> {
        self.controller
            .lock()
            .await
            .navigate(stage)
            .map_err(SessionError::from)
            .inspect_err(log_failure)
    }

    pub async fn reset(&self) -> Notice {
        self.controller.lock().await.reset()
    }

    pub async fn steps(&self) -> Vec<StepStatus> {
        self.controller.lock().await.steps()
    }

    pub async fn charts(&self) -> Result<ChartSet> {
        let wf = self.controller.lock().await;
        let model = wf.model().ok_or(WorkflowError::InvalidTransition {
            stage: Stage::Visualize,
            reason: "no model has been trained",
        });
        model
            .map_err(SessionError::from)
            .and_then(|m| ChartSet::build(m).map_err(SessionError::from))
            .inspect_err(log_failure)
    }

    pub async fn input_fields(&self) -> Result<Vec<InputField>> {
        let wf = self.controller.lock().await;
        match wf.model() {
            Some(m) => Ok(input_fields(m)),
            None => Err(SessionError::from(WorkflowError::InvalidTransition {
                stage: Stage::Predict,
                reason: "no model has been trained",
            })),
        }
    }

    pub async fn snapshot(&self) -> Snapshot {
        let wf = self.controller.lock().await;
        Snapshot {
            active: wf.active_stage(),
            dataset: wf.dataset().cloned(),
            model: wf.model().cloned(),
        }
    }
}

fn check_csv_name(filename: &str) -> Result<()> {
    let is_csv = Path::new(filename)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if !is_csv {
        return Err(SessionError::Upload(CSV_REQUIRED.to_string()));
    }
    Ok(())
}

fn log_failure(err: &SessionError) {
    if err.is_contract_breach() {
        error!(kind = "contract_breach", error = %err, "session: operation failed");
    } else {
        warn!(kind = "user_failure", error = %err, "session: operation failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::service::ServiceInfo;
    use crate::types_api::{DatasetStatistics, PredictResponse, TrainResponse, UploadResponse};
    use artifacts::Scalar;
    use async_trait::async_trait;
    use insights::FeaturePayload;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use tokio::sync::oneshot;

    const CSV: &[u8] = b"rooms,area,price\n3,70,100\n4,90,150\n";

    /// Holds one call back until the test releases it.
    struct Gate {
        entered: Option<oneshot::Sender<()>>,
        release: oneshot::Receiver<()>,
    }

    #[derive(Default)]
    struct FakeService {
        gated_upload: Mutex<Option<(String, Gate)>>,
        gated_train: Mutex<Option<Gate>>,
        gated_predict: Mutex<Option<Gate>>,
        train_body: Mutex<Option<String>>,
        fail_upload: Option<&'static str>,
        fail_train: bool,
        fail_predict: bool,
    }

    async fn pass(gate: Option<Gate>) {
        if let Some(mut g) = gate {
            if let Some(tx) = g.entered.take() {
                let _ = tx.send(());
            }
            let _ = g.release.await;
        }
    }

    fn gate() -> (Gate, oneshot::Receiver<()>, oneshot::Sender<()>) {
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        (
            Gate { entered: Some(entered_tx), release: release_rx },
            entered_rx,
            release_tx,
        )
    }

    #[async_trait]
    impl TrainingService for FakeService {
        async fn health(&self) -> std::result::Result<HealthStatus, ServiceError> {
            Err(ServiceError::Decode("offline".into()))
        }

        async fn upload(&self, filename: &str, _content: Bytes) -> std::result::Result<UploadResponse, ServiceError> {
            let taken = {
                let mut slot = self.gated_upload.lock().await;
                match slot.take() {
                    Some((name, g)) if name == filename => Some(g),
                    other => {
                        *slot = other;
                        None
                    }
                }
            };
            pass(taken).await;
            if self.fail_upload == Some(filename) {
                return Err(ServiceError::Rejected { status: 400, message: "Error processing file: bad header".into() });
            }
            Ok(UploadResponse {
                message: None,
                filename: Some(filename.to_string()),
                statistics: DatasetStatistics {
                    columns: vec!["rooms".into(), "area".into(), "price".into()],
                    shape: (2, 3),
                    preview: vec![],
                    dtypes: BTreeMap::new(),
                    missing_values: BTreeMap::new(),
                },
            })
        }

        async fn train(&self, _request: &TrainRequest) -> std::result::Result<TrainResponse, ServiceError> {
            let gate = self.gated_train.lock().await.take();
            pass(gate).await;
            if self.fail_train {
                return Err(ServiceError::Rejected { status: 500, message: "Error during model training: boom".into() });
            }
            let body = self.train_body.lock().await.clone().unwrap_or_else(|| {
                r#"{"metrics": {"r2": 0.9}, "feature_importance": {"rooms": 0.4, "area": 0.6},
                    "test_predictions": [101.0, 149.5], "test_actual": [100, 150]}"#
                    .to_string()
            });
            serde_json::from_str(&body).map_err(|e| ServiceError::Decode(e.to_string()))
        }

        async fn predict(&self, _payload: &FeaturePayload) -> std::result::Result<PredictResponse, ServiceError> {
            let gate = self.gated_predict.lock().await.take();
            pass(gate).await;
            if self.fail_predict {
                return Err(ServiceError::Rejected { status: 400, message: "Missing features: ['area']".into() });
            }
            Ok(PredictResponse { predictions: vec![Scalar::Number(123.456789)], feature_importance: None })
        }

        fn info(&self) -> ServiceInfo {
            ServiceInfo { name: "fake".into(), base_url: String::new() }
        }
    }

    fn session(service: FakeService) -> Arc<Session<FakeService>> {
        Arc::new(Session::new(service, 1024))
    }

    async fn trained(s: &Session<FakeService>) {
        s.upload("houses.csv", Bytes::from_static(CSV)).await.unwrap();
        s.train("price", ProblemType::Regression).await.unwrap();
    }

    #[tokio::test]
    async fn test_full_flow() {
        let s = session(FakeService::default());

        let outcome = s.upload("houses.csv", Bytes::from_static(CSV)).await.unwrap();
        assert_eq!(
            outcome,
            Outcome::Applied(Notice {
                title: "File Uploaded Successfully".into(),
                description: "Loaded dataset with 2 rows and 3 columns.".into(),
            })
        );
        assert_eq!(s.snapshot().await.active, Stage::Train);

        let outcome = s.train("price", ProblemType::Regression).await.unwrap();
        match outcome {
            Outcome::Applied(n) => assert_eq!(n.description, "r2: 0.9000"),
            Outcome::Stale => panic!("training answer dropped"),
        }
        assert_eq!(s.snapshot().await.active, Stage::Predict);

        let shown = s.predict([("rooms", "3"), ("area", "80")]).await.unwrap().unwrap();
        assert_eq!(shown.display, "123.4568");

        let charts = s.charts().await.unwrap();
        assert_eq!(charts.importance[0].feature, "area");
        assert_eq!(charts.comparison.len(), 2);

        let fields = s.input_fields().await.unwrap();
        assert_eq!(fields[0].label, "area (Importance: 60.0%)");
    }

    #[tokio::test]
    async fn test_upload_rejections() {
        let s = session(FakeService::default());
        let err = s.upload("houses.xlsx", Bytes::from_static(CSV)).await.unwrap_err();
        assert_eq!(err.to_string(), CSV_REQUIRED);

        let big = Bytes::from(vec![b'a'; 2048]);
        assert!(matches!(s.upload("big.csv", big).await, Err(SessionError::Upload(_))));
        assert!(s.snapshot().await.dataset.is_none());
    }

    #[tokio::test]
    async fn test_upload_file_reads_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Houses.CSV");
        std::fs::write(&path, CSV).unwrap();

        let s = session(FakeService::default());
        s.upload_file(&path).await.unwrap();
        let snap = s.snapshot().await;
        assert_eq!(snap.dataset.unwrap().filename, "Houses.CSV");

        let missing = dir.path().join("gone.csv");
        assert!(matches!(s.upload_file(&missing).await, Err(SessionError::Io { .. })));
    }

    #[tokio::test]
    async fn test_gates_before_artifacts() {
        let s = session(FakeService::default());
        let err = s.train("price", ProblemType::Regression).await.unwrap_err();
        assert!(err.is_contract_breach());
        assert!(s.predict([("x", "1")]).await.unwrap_err().is_contract_breach());
        assert!(s.charts().await.unwrap_err().is_contract_breach());
        assert!(s.navigate(Stage::Visualize).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_target_column() {
        let s = session(FakeService::default());
        s.upload("houses.csv", Bytes::from_static(CSV)).await.unwrap();
        let err = s.train("nope", ProblemType::Regression).await.unwrap_err();
        assert!(matches!(err, SessionError::Training(_)));
        assert!(!err.is_contract_breach());
    }

    #[tokio::test]
    async fn test_misaligned_model_is_refused() {
        let service = FakeService::default();
        *service.train_body.lock().await = Some(
            r#"{"metrics": {"r2": 0.9}, "feature_importance": {"rooms": 1.0},
                "test_predictions": [1.0], "test_actual": [1.0, 2.0]}"#
                .to_string(),
        );
        let s = session(service);
        s.upload("houses.csv", Bytes::from_static(CSV)).await.unwrap();
        let err = s.train("price", ProblemType::Regression).await.unwrap_err();
        assert!(err.is_contract_breach());
        assert!(s.snapshot().await.model.is_none());
    }

    #[tokio::test]
    async fn test_prediction_error_passes_through() {
        let s = session(FakeService { fail_predict: true, ..Default::default() });
        trained(&s).await;
        let err = s.predict([("rooms", "3")]).await.unwrap_err();
        assert_eq!(err.to_string(), "Missing features: ['area']");
    }

    #[tokio::test]
    async fn test_late_upload_is_dropped() {
        let (g, entered, release) = gate();
        let service = FakeService::default();
        *service.gated_upload.lock().await = Some(("slow.csv".to_string(), g));
        let s = session(service);

        let slow = {
            let s = s.clone();
            tokio::spawn(async move { s.upload("slow.csv", Bytes::from_static(CSV)).await })
        };
        entered.await.unwrap();

        s.upload("fast.csv", Bytes::from_static(CSV)).await.unwrap();
        release.send(()).unwrap();

        assert_eq!(slow.await.unwrap().unwrap(), Outcome::Stale);
        assert_eq!(s.snapshot().await.dataset.unwrap().filename, "fast.csv");
    }

    #[tokio::test]
    async fn test_training_answer_after_reset_is_dropped() {
        let (g, entered, release) = gate();
        let service = FakeService::default();
        *service.gated_train.lock().await = Some(g);
        let s = session(service);
        s.upload("houses.csv", Bytes::from_static(CSV)).await.unwrap();

        let pending = {
            let s = s.clone();
            tokio::spawn(async move { s.train("price", ProblemType::Regression).await })
        };
        entered.await.unwrap();
        s.reset().await;
        release.send(()).unwrap();

        assert_eq!(pending.await.unwrap().unwrap(), Outcome::Stale);
        let snap = s.snapshot().await;
        assert!(snap.dataset.is_none() && snap.model.is_none());
        assert_eq!(snap.active, Stage::Upload);
    }

    #[tokio::test]
    async fn test_prediction_after_retrain_is_dropped() {
        let (g, entered, release) = gate();
        let service = FakeService::default();
        let s = session(service);
        trained(&s).await;
        *s.service().gated_predict.lock().await = Some(g);

        let pending = {
            let s = s.clone();
            tokio::spawn(async move { s.predict([("rooms", "3")]).await })
        };
        entered.await.unwrap();
        s.train("price", ProblemType::Regression).await.unwrap();
        release.send(()).unwrap();

        assert_eq!(pending.await.unwrap().unwrap(), None);
    }

    #[tokio::test]
    async fn test_health_failure_is_unavailable() {
        let s = session(FakeService::default());
        assert!(matches!(s.check_health().await, Err(SessionError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_late_upload_failure_is_dropped() {
        let (g, entered, release) = gate();
        let service = FakeService { fail_upload: Some("slow.csv"), ..Default::default() };
        *service.gated_upload.lock().await = Some(("slow.csv".to_string(), g));
        let s = session(service);

        let slow = {
            let s = s.clone();
            tokio::spawn(async move { s.upload("slow.csv", Bytes::from_static(CSV)).await })
        };
        entered.await.unwrap();

        s.upload("fast.csv", Bytes::from_static(CSV)).await.unwrap();
        release.send(()).unwrap();

        assert_eq!(slow.await.unwrap().unwrap(), Outcome::Stale);
        assert_eq!(s.snapshot().await.dataset.unwrap().filename, "fast.csv");
    }

    #[tokio::test]
    async fn test_training_failure_after_reset_is_dropped() {
        let (g, entered, release) = gate();
        let service = FakeService { fail_train: true, ..Default::default() };
        *service.gated_train.lock().await = Some(g);
        let s = session(service);
        s.upload("houses.csv", Bytes::from_static(CSV)).await.unwrap();

        let pending = {
            let s = s.clone();
            tokio::spawn(async move { s.train("price", ProblemType::Regression).await })
        };
        entered.await.unwrap();
        s.reset().await;
        release.send(()).unwrap();

        assert_eq!(pending.await.unwrap().unwrap(), Outcome::Stale);
        assert_eq!(s.snapshot().await.active, Stage::Upload);
    }

    #[tokio::test]
    async fn test_current_training_failure_is_reported() {
        let s = session(FakeService { fail_train: true, ..Default::default() });
        s.upload("houses.csv", Bytes::from_static(CSV)).await.unwrap();
        let err = s.train("price", ProblemType::Regression).await.unwrap_err();
        assert_eq!(err.to_string(), "Error during model training: boom");
    }

    #[tokio::test]
    async fn test_prediction_failure_after_retrain_is_dropped() {
        let (g, entered, release) = gate();
        let s = session(FakeService { fail_predict: true, ..Default::default() });
        trained(&s).await;
        *s.service().gated_predict.lock().await = Some(g);

        let pending = {
            let s = s.clone();
            tokio::spawn(async move { s.predict([("rooms", "3")]).await })
        };
        entered.await.unwrap();
        s.train("price", ProblemType::Regression).await.unwrap();
        release.send(()).unwrap();

        assert_eq!(pending.await.unwrap().unwrap(), None);
    }
}
