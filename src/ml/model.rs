use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{HouseFeatures, TrainingData};
use crate::error::ModelError;

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

const MIN_TRAINING_SAMPLES: usize = 20;
const MAX_ITERATIONS: usize = 5000;
const LEARNING_RATE: f64 = 0.1;

/// Training report after model fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub samples: usize,
    pub r_squared: f64,
    pub rmse: f64,
}

/// Model weights for persistence (linear regression on z-scored features)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelWeights {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub feature_means: Vec<f64>,
    pub feature_stds: Vec<f64>,
}

/// Everything that gets persisted for a trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub trained_at: DateTime<Utc>,
    pub weights: ModelWeights,
    pub report: TrainingReport,
}

impl ModelArtifact {
    /// Structural checks a deserialized artifact must pass before use.
    pub fn validate(&self) -> Result<(), String> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(format!(
                "unsupported format version {} (expected {})",
                self.format_version, ARTIFACT_FORMAT_VERSION
            ));
        }

        let w = &self.weights;
        let n = HouseFeatures::NUM_FEATURES;
        if w.coefficients.len() != n || w.feature_means.len() != n || w.feature_stds.len() != n {
            return Err(format!("expected {} weights per vector", n));
        }

        let all_finite = w.coefficients.iter()
            .chain(&w.feature_means)
            .chain(&w.feature_stds)
            .chain(std::iter::once(&w.intercept))
            .all(|v| v.is_finite());
        if !all_finite {
            return Err("non-finite weight".to_string());
        }

        Ok(())
    }
}

/// House price regressor. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceModel {
    artifact: ModelArtifact,
}

impl PriceModel {
    /// Wrap an artifact that already passed `ModelArtifact::validate`.
    pub fn from_artifact(artifact: ModelArtifact) -> Self {
        Self { artifact }
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    /// Fit the model from historical sales
    pub fn train(data: &TrainingData) -> Result<(Self, TrainingReport), ModelError> {
        let n = data.len();
        if n < MIN_TRAINING_SAMPLES {
            return Err(ModelError::Training(format!(
                "Not enough training samples: {} < {}",
                n, MIN_TRAINING_SAMPLES
            )));
        }

        let num_features = HouseFeatures::NUM_FEATURES;
        let mut features = Array2::<f64>::zeros((n, num_features));
        let mut targets = Array1::<f64>::zeros(n);

        for (i, (feat, price)) in data.samples.iter().enumerate() {
            for (j, &val) in feat.to_array().iter().enumerate() {
                features[[i, j]] = val;
            }
            targets[i] = *price;
        }

        let means = features
            .mean_axis(Axis(0))
            .ok_or_else(|| ModelError::Training("empty feature matrix".to_string()))?;
        let stds = features.std_axis(Axis(0), 0.0);
        let normalized = normalize(&features, &means, &stds);

        let (coefficients, intercept) =
            fit_linear_regression(&normalized, &targets, MAX_ITERATIONS, LEARNING_RATE);

        let residuals = &targets - &(normalized.dot(&coefficients) + intercept);
        let ss_res = residuals.mapv(|r| r * r).sum();
        let target_mean = targets.mean().unwrap_or(0.0);
        let ss_tot = targets.mapv(|v| (v - target_mean).powi(2)).sum();
        let report = TrainingReport {
            samples: n,
            r_squared: if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 },
            rmse: (ss_res / n as f64).sqrt(),
        };

        let artifact = ModelArtifact {
            format_version: ARTIFACT_FORMAT_VERSION,
            trained_at: Utc::now(),
            weights: ModelWeights {
                coefficients: coefficients.to_vec(),
                intercept,
                feature_means: means.to_vec(),
                feature_stds: stds.to_vec(),
            },
            report: report.clone(),
        };
        artifact
            .validate()
            .map_err(|reason| ModelError::Training(format!("fit diverged: {}", reason)))?;

        info!("Price model trained: {} samples, R²={:.3}, RMSE={:.0}",
            report.samples, report.r_squared, report.rmse);

        Ok((Self { artifact }, report))
    }

    /// Estimated price, never negative
    pub fn predict(&self, features: &HouseFeatures) -> f64 {
        let w = &self.artifact.weights;
        let arr = features.to_array();

        let mut price = w.intercept;
        for j in 0..HouseFeatures::NUM_FEATURES {
            let std = w.feature_stds[j];
            let normalized = if std > 1e-10 {
                (arr[j] - w.feature_means[j]) / std
            } else {
                0.0
            };
            price += w.coefficients[j] * normalized;
        }

        debug!("Raw price estimate {:.2} for {:?}", price, features);
        price.max(0.0)
    }
}

fn normalize(features: &Array2<f64>, means: &Array1<f64>, stds: &Array1<f64>) -> Array2<f64> {
    let mut normalized = features.clone();
    for (j, mut column) in normalized.axis_iter_mut(Axis(1)).enumerate() {
        let std = stds[j];
        if std > 1e-10 {
            column.mapv_inplace(|v| (v - means[j]) / std);
        } else {
            column.fill(0.0);
        }
    }
    normalized
}

/// Fit least squares via full-batch gradient descent
fn fit_linear_regression(
    features: &Array2<f64>,
    targets: &Array1<f64>,
    max_iter: usize,
    learning_rate: f64,
) -> (Array1<f64>, f64) {
    let n = features.nrows() as f64;
    let mut coefficients = Array1::<f64>::zeros(features.ncols());
    let mut intercept = targets.mean().unwrap_or(0.0);

    for _iter in 0..max_iter {
        let errors = features.dot(&coefficients) + intercept - targets;
        let grad_coef = features.t().dot(&errors) / n;
        let grad_intercept = errors.sum() / n;

        coefficients.scaled_add(-learning_rate, &grad_coef);
        intercept -= learning_rate * grad_intercept;
    }

    (coefficients, intercept)
}
