use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use log::warn;

use crate::error::ServiceError;
use crate::models::chat::Conversation;

/// On-disk store for the full conversation set, held as a single JSON
/// document mapping conversation id to conversation. The store is the only
/// code that touches the document path.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the document. A missing file is created empty; unparseable
    /// content yields an empty mapping instead of an error.
    pub fn load(&self) -> Result<HashMap<String, Conversation>, ServiceError> {
        if !self.path.exists() {
            fs::write(&self.path, "{}").map_err(|e|
                ServiceError::Persistence(
                    format!("failed to create history file '{}': {}", self.path.display(), e)
                )
            )?;
            return Ok(HashMap::new());
        }

        let raw = fs::read_to_string(&self.path).map_err(|e|
            ServiceError::Persistence(
                format!("failed to read history file '{}': {}", self.path.display(), e)
            )
        )?;

        match serde_json::from_str(&raw) {
            Ok(conversations) => Ok(conversations),
            Err(e) => {
                warn!(
                    "History file '{}' is not valid JSON ({}), starting with empty history",
                    self.path.display(),
                    e
                );
                Ok(HashMap::new())
            }
        }
    }

    /// Serialize the whole mapping and replace the document atomically:
    /// write to a temporary path in the same directory, then rename over
    /// the destination so an interrupted write never leaves a truncated
    /// document behind.
    pub fn save(&self, all: &HashMap<String, Conversation>) -> Result<(), ServiceError> {
        let payload = serde_json::to_string_pretty(all).map_err(|e|
            ServiceError::Persistence(format!("failed to serialize history: {}", e))
        )?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, payload).map_err(|e|
            ServiceError::Persistence(
                format!("failed to write '{}': {}", temp_path.display(), e)
            )
        )?;
        fs::rename(&temp_path, &self.path).map_err(|e|
            ServiceError::Persistence(
                format!("failed to replace '{}': {}", self.path.display(), e)
            )
        )?;
        Ok(())
    }
}
