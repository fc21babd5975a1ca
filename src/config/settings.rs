use std::path::PathBuf;

use ::config::{Config, ConfigError, Environment, File, Map};
use serde::{Deserialize, Serialize};

use crate::ml::TrainingSource;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MODEL_PATH: &str = "models/house_price_model.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub model_path: PathBuf,
    /// CSV to train from instead of the bundled sales data
    #[serde(default)]
    pub training_data: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            training_data: None,
        }
    }
}

impl ServiceConfig {
    /// Defaults, then the optional TOML file, then process environment
    /// (`PORT`, `HOST`, `MODEL_PATH`, `TRAINING_DATA`).
    pub fn load(config_file: &str) -> Result<Self, ConfigError> {
        Self::build(config_file, None)
    }

    fn build(config_file: &str, env: Option<Map<String, String>>) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("host", DEFAULT_HOST)?
            .set_default("port", i64::from(DEFAULT_PORT))?
            .set_default("model_path", DEFAULT_MODEL_PATH)?
            .add_source(File::with_name(config_file).required(false))
            .add_source(Environment::default().try_parsing(true).source(env))
            .build()?
            .try_deserialize()
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.port == 0 {
            errors.push("port must be > 0".to_string());
        }
        if self.host.trim().is_empty() {
            errors.push("host must not be empty".to_string());
        }
        if self.model_path.as_os_str().is_empty() {
            errors.push("model_path must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn training_source(&self) -> TrainingSource {
        match &self.training_data {
            Some(path) => TrainingSource::File(path.clone()),
            None => TrainingSource::Bundled,
        }
    }
}
