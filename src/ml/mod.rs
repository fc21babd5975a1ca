pub mod features;
pub mod dataset;
pub mod model;
pub mod persistence;
pub mod predictor;

pub use features::{FeatureRange, HouseFeatures, FEATURE_RANGES};
pub use dataset::TrainingData;
pub use model::{ModelArtifact, PriceModel, TrainingReport};
pub use persistence::{FileModelStore, ModelStore};
#[cfg(test)]
pub use persistence::MockModelStore;
pub use predictor::{BootstrapOutcome, ModelInfo, Predictor, PredictorStatus, TrainingSource};
