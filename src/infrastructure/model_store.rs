//! On-disk persistence for the instrument -> model mapping.
//!
//! A single JSON artifact. Any load failure — missing, unreadable, or
//! unparseable — means "no prior models", not an error; a failed save
//! propagates, since it risks losing a finished training run.

use crate::application::model::TrainedModel;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

pub struct ModelStore {
    file_path: PathBuf,
}

impl ModelStore {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    pub fn load(&self) -> HashMap<String, TrainedModel> {
        if !self.file_path.exists() {
            info!("No model artifact at {:?}; starting empty", self.file_path);
            return HashMap::new();
        }

        let content = match fs::read_to_string(&self.file_path) {
            Ok(content) => content,
            Err(e) => {
                warn!(error = %e, "failed to read model artifact {:?}; starting empty", self.file_path);
                return HashMap::new();
            }
        };
        match serde_json::from_str::<HashMap<String, TrainedModel>>(&content) {
            Ok(models) => {
                info!(count = models.len(), "loaded models from {:?}", self.file_path);
                models
            }
            Err(e) => {
                warn!(error = %e, "failed to parse model artifact {:?}; starting empty", self.file_path);
                HashMap::new()
            }
        }
    }

    pub fn save(&self, models: &HashMap<String, TrainedModel>) -> Result<()> {
        if let Some(parent) = self.file_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create model directory {:?}", parent))?;
        }

        let content =
            serde_json::to_string(models).context("Failed to serialize model mapping")?;

        // Atomic write: write to temp file then rename
        let temp_path = self.file_path.with_extension("tmp");
        fs::write(&temp_path, content)
            .with_context(|| format!("Failed to write temp model file {:?}", temp_path))?;
        fs::rename(&temp_path, &self.file_path)
            .with_context(|| format!("Failed to rename model file into {:?}", self.file_path))?;

        info!(count = models.len(), "saved models to {:?}", self.file_path);
        Ok(())
    }
}
