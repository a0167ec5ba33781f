//! Best-effort key/value persistence of the coordinate form.
//! See [`load_inputs()`] and [`save_inputs()`].

use std::path::PathBuf;

use async_trait::async_trait;
use eyre::Context;

use crate::{fs, input::CoordinateInputs};

/// Key the raw coordinate inputs are saved under.
pub const INPUTS_KEY: &str = "phoneTrackerCoords";

/// Interface for a string key/value store.
/// See [`FileGateway`] for implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Port: Send + Sync {
    /// Load the value stored under `key`, `None` if nothing has been saved.
    async fn load(&self, key: &str) -> eyre::Result<Option<String>>;
    /// Store `value` under `key`, replacing any previous value.
    async fn save(&self, key: &str, value: &str) -> eyre::Result<()>;
}

/// Implementation of [`Port`] storing each key as `<directory>/<key>.json`.
pub struct FileGateway {
    directory: PathBuf,
}

impl FileGateway {
    /// Construct a new [`FileGateway`]. `directory` is created on the first save.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn path(&self, key: &str) -> eyre::Result<PathBuf> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            eyre::bail!("Invalid storage key {:?}", key);
        }
        Ok(self.directory.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl Port for FileGateway {
    async fn load(&self, key: &str) -> eyre::Result<Option<String>> {
        let path = self.path(key)?;
        if !path.is_file() {
            return Ok(None);
        }
        let value = tokio::fs::read_to_string(&path)
            .await
            .wrap_err_with(|| format!("Error reading {:?}", path))?;
        Ok(Some(value))
    }

    async fn save(&self, key: &str, value: &str) -> eyre::Result<()> {
        let path = self.path(key)?;
        fs::create_dir_if_not_exists(&self.directory)?;
        tokio::fs::write(&path, value)
            .await
            .wrap_err_with(|| format!("Error writing {:?}", path))
    }
}

/// Copy the saved inputs over `inputs`. Only non-empty saved fields are used. Any failure leaves
/// `inputs` untouched.
#[tracing::instrument(skip_all)]
pub async fn load_inputs(store: &dyn Port, inputs: &mut CoordinateInputs) {
    let saved = match store.load(INPUTS_KEY).await {
        Ok(Some(saved)) => saved,
        Ok(None) => return,
        Err(error) => {
            tracing::warn!("Could not load saved coordinates: {:?}", error);
            return;
        }
    };

    match serde_json::from_str::<CoordinateInputs>(&saved) {
        Ok(saved) => {
            tracing::debug!("Loaded saved coordinates {:?}", saved);
            inputs.overlay(&saved);
        }
        Err(error) => tracing::debug!("Could not parse saved coordinates: {}", error),
    }
}

/// Save `inputs`, ignoring any failure.
#[tracing::instrument(skip_all)]
pub async fn save_inputs(store: &dyn Port, inputs: &CoordinateInputs) {
    let result = match serde_json::to_string(inputs) {
        Ok(value) => store.save(INPUTS_KEY, &value).await,
        Err(error) => Err(error.into()),
    };
    if let Err(error) = result {
        tracing::warn!("Could not save coordinates: {:?}", error);
    }
}
