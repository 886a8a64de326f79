use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::constants::paths;
use crate::conversation::Turn;
use crate::error::ChatbotError;

/// View-local state, restored whenever a conversation view is created.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewState {
    #[serde(default)]
    pub history: Vec<Turn>,
}

/// Stores a [`ViewState`] as a JSON file.
#[derive(Debug, Clone)]
pub struct ViewStateStore {
    path: PathBuf,
}

impl ViewStateStore {
    /// Store under the default data directory.
    pub fn new() -> Self {
        Self::with_path(Settings::data_dir().join(paths::VIEW_STATE_FILE))
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved state. A missing file is an empty history.
    pub fn load(&self) -> Result<ViewState, ChatbotError> {
        if !self.path.exists() {
            return Ok(ViewState::default());
        }

        let contents = fs::read_to_string(&self.path).map_err(|e| {
            ChatbotError::Config(format!("Failed to read view state: {}", e))
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            ChatbotError::Config(format!("Failed to parse view state: {}", e))
        })
    }

    pub fn save(&self, state: &ViewState) -> Result<(), ChatbotError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(state)?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, contents).map_err(|e| {
            ChatbotError::Config(format!("Failed to write temporary view state: {}", e))
        })?;

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            ChatbotError::Config(format!("Failed to rename view state: {}", e))
        })?;

        Ok(())
    }

    pub fn clear(&self) -> Result<(), ChatbotError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

impl Default for ViewStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty_history() {
        let dir = TempDir::new().unwrap();
        let store = ViewStateStore::with_path(dir.path().join("state.json"));
        assert!(store.load().unwrap().history.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = ViewStateStore::with_path(dir.path().join("nested").join("state.json"));
        let state = ViewState {
            history: vec![Turn::user("hi"), Turn::bot("hello")],
        };
        store.save(&state).unwrap();

        assert_eq!(store.load().unwrap(), state);
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();

        let err = ViewStateStore::with_path(&path).load().unwrap_err();
        assert!(matches!(err, ChatbotError::Config(_)));
    }
}
