//! Persistence of the latest trusted light block.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use tendermint_light_client_verifier::types::LightBlock;

use crate::LightClientError;

/// Keeps the latest trusted light block across restarts.
pub trait TrustedStore: Send + Sync {
    /// The latest saved block, if any.
    ///
    /// # Errors
    /// Returns [`LightClientError::Store`] if the store cannot be read.
    fn latest(&self) -> Result<Option<LightBlock>, LightClientError>;

    /// Replaces the saved block.
    ///
    /// # Errors
    /// Returns [`LightClientError::Store`] if the block cannot be written.
    fn save(&self, block: &LightBlock) -> Result<(), LightClientError>;
}

/// [`TrustedStore`] writing the block as JSON to a single file.
#[derive(Clone, Debug)]
pub struct FileTrustedStore {
    path: PathBuf,
}

impl FileTrustedStore {
    /// Store backed by `path`. The file is created on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the store file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TrustedStore for FileTrustedStore {
    fn latest(&self) -> Result<Option<LightBlock>, LightClientError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(LightClientError::Store(format!(
                    "read {}: {e}",
                    self.path.display()
                )))
            }
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| LightClientError::Store(format!("decode {}: {e}", self.path.display())))
    }

    fn save(&self, block: &LightBlock) -> Result<(), LightClientError> {
        let json = serde_json::to_vec(block)
            .map_err(|e| LightClientError::Store(format!("encode light block: {e}")))?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                LightClientError::Store(format!("create {}: {e}", parent.display()))
            })?;
        }

        // write then rename, so a crash never leaves a half-written trust root
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)
            .map_err(|e| LightClientError::Store(format!("write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| LightClientError::Store(format!("rename {}: {e}", tmp.display())))
    }
}

/// In-memory [`TrustedStore`].
#[derive(Debug, Default)]
pub struct MemoryTrustedStore {
    block: Mutex<Option<LightBlock>>,
}

impl MemoryTrustedStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrustedStore for MemoryTrustedStore {
    fn latest(&self) -> Result<Option<LightBlock>, LightClientError> {
        self.block
            .lock()
            .map(|b| b.clone())
            .map_err(|e| LightClientError::Store(e.to_string()))
    }

    fn save(&self, block: &LightBlock) -> Result<(), LightClientError> {
        *self
            .block
            .lock()
            .map_err(|e| LightClientError::Store(e.to_string()))? = Some(block.clone());
        Ok(())
    }
}
