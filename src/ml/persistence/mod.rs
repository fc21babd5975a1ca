use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::ModelArtifact;
use crate::error::ModelError;

/// Durable home of the trained model artifact.
#[cfg_attr(test, mockall::automock)]
pub trait ModelStore: Send + Sync {
    /// Whether an artifact is present. Absence is `Ok(false)`, not an error.
    fn exists(&self) -> Result<bool, ModelError>;

    /// Replace the stored artifact. Readers never observe a partial write.
    fn save(&self, artifact: &ModelArtifact) -> Result<(), ModelError>;

    fn load(&self) -> Result<ModelArtifact, ModelError>;

    /// Human-readable location, used in logs and errors.
    fn location(&self) -> PathBuf;
}

/// JSON artifact on the local filesystem
pub struct FileModelStore {
    path: PathBuf,
}

impl FileModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_temp(&self, tmp: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = File::create(tmp)?;
        file.write_all(bytes)?;
        file.sync_all()
    }
}

impl ModelStore for FileModelStore {
    fn exists(&self) -> Result<bool, ModelError> {
        self.path
            .try_exists()
            .map_err(|e| ModelError::storage(&self.path, e))
    }

    fn save(&self, artifact: &ModelArtifact) -> Result<(), ModelError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| ModelError::storage(dir, e))?;
        }

        let bytes = serde_json::to_vec_pretty(artifact)
            .map_err(|e| ModelError::storage(&self.path, std::io::Error::new(ErrorKind::InvalidData, e)))?;

        let tmp = self.temp_path();
        if let Err(e) = self.write_temp(&tmp, &bytes) {
            let _ = fs::remove_file(&tmp);
            return Err(ModelError::storage(&tmp, e));
        }
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(ModelError::storage(&self.path, e));
        }

        info!("Saved price model ({} bytes) to {}", bytes.len(), self.path.display());
        Ok(())
    }

    fn load(&self) -> Result<ModelArtifact, ModelError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ModelError::NotFound(self.path.clone()));
            }
            Err(e) => return Err(ModelError::storage(&self.path, e)),
        };

        let artifact: ModelArtifact = serde_json::from_slice(&bytes)
            .map_err(|e| ModelError::corrupt(&self.path, e.to_string()))?;
        artifact
            .validate()
            .map_err(|reason| ModelError::corrupt(&self.path, reason))?;

        debug!("Read model artifact trained at {} from {}", artifact.trained_at, self.path.display());
        Ok(artifact)
    }

    fn location(&self) -> PathBuf {
        self.path.clone()
    }
}
