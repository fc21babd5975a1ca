use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::{HouseFeatures, ModelStore, PriceModel, TrainingData, TrainingReport};
use crate::error::ModelError;

/// Lifecycle of the in-memory model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictorStatus {
    Uninitialized,
    Training,
    Ready,
    Failed,
}

#[derive(Debug)]
enum PredictorState {
    Uninitialized,
    Training,
    Ready(PriceModel),
    Failed,
}

/// How bootstrap reached the ready state.
#[derive(Debug, Clone, PartialEq)]
pub enum BootstrapOutcome {
    Loaded,
    Trained(TrainingReport),
}

/// Read-only description of the loaded model
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub trained_at: DateTime<Utc>,
    pub samples: usize,
    pub r_squared: f64,
    pub rmse: f64,
}

/// Where training data comes from.
#[derive(Debug, Clone, Default)]
pub enum TrainingSource {
    #[default]
    Bundled,
    File(PathBuf),
}

impl TrainingSource {
    fn load(&self) -> Result<TrainingData, ModelError> {
        match self {
            TrainingSource::Bundled => TrainingData::bundled(),
            TrainingSource::File(path) => TrainingData::from_path(path),
        }
    }
}

/// Owns the model handle and drives the load/train bootstrap.
///
/// Mutating operations take `&mut self` and run once before serving;
/// afterwards the predictor is shared read-only behind an `Arc`.
pub struct Predictor {
    store: Box<dyn ModelStore>,
    training: TrainingSource,
    state: PredictorState,
}

impl Predictor {
    pub fn new(store: Box<dyn ModelStore>, training: TrainingSource) -> Self {
        Self {
            store,
            training,
            state: PredictorState::Uninitialized,
        }
    }

    pub fn status(&self) -> PredictorStatus {
        match self.state {
            PredictorState::Uninitialized => PredictorStatus::Uninitialized,
            PredictorState::Training => PredictorStatus::Training,
            PredictorState::Ready(_) => PredictorStatus::Ready,
            PredictorState::Failed => PredictorStatus::Failed,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status() == PredictorStatus::Ready
    }

    pub fn model_info(&self) -> Option<ModelInfo> {
        match &self.state {
            PredictorState::Ready(model) => {
                let artifact = model.artifact();
                Some(ModelInfo {
                    trained_at: artifact.trained_at,
                    samples: artifact.report.samples,
                    r_squared: artifact.report.r_squared,
                    rmse: artifact.report.rmse,
                })
            }
            _ => None,
        }
    }

    /// Load the persisted model. `Ok(false)` means nothing has been trained yet.
    /// Corrupt artifacts are returned as errors, never retrained over.
    pub fn load_model(&mut self) -> Result<bool, ModelError> {
        if !self.store.exists()? {
            debug!("No model artifact at {}", self.store.location().display());
            return Ok(false);
        }

        match self.store.load() {
            Ok(artifact) => {
                info!("Loaded price model trained at {} from {}",
                    artifact.trained_at, self.store.location().display());
                self.state = PredictorState::Ready(PriceModel::from_artifact(artifact));
                Ok(true)
            }
            Err(ModelError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Fit a fresh model and persist it. Does not load it; call `load_model` after.
    pub fn train_and_save(&mut self) -> Result<TrainingReport, ModelError> {
        let data = self.training.load()?;
        let (model, report) = PriceModel::train(&data)?;
        self.store.save(model.artifact())?;
        Ok(report)
    }

    /// Bring the predictor to `Ready`, training first if nothing is persisted.
    /// Any error leaves the predictor `Failed`.
    pub fn bootstrap(&mut self) -> Result<BootstrapOutcome, ModelError> {
        let result = self.run_bootstrap();
        if let Err(e) = &result {
            error!("Model bootstrap failed: {}", e);
            self.state = PredictorState::Failed;
        }
        result
    }

    fn run_bootstrap(&mut self) -> Result<BootstrapOutcome, ModelError> {
        if self.load_model()? {
            return Ok(BootstrapOutcome::Loaded);
        }

        warn!("Trained model not found at {}. Training a new one...",
            self.store.location().display());
        self.state = PredictorState::Training;
        let report = self.train_and_save()?;

        if !self.load_model()? {
            return Err(ModelError::Unavailable(self.store.location()));
        }
        Ok(BootstrapOutcome::Trained(report))
    }

    /// Price estimate for one house. Requires a loaded model.
    pub fn predict(&self, features: &HouseFeatures) -> Result<f64, ModelError> {
        match &self.state {
            PredictorState::Ready(model) => Ok(model.predict(features)),
            _ => Err(ModelError::ModelNotLoaded),
        }
    }
}
