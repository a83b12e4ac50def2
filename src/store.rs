use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{ScheduleError, ScheduleResult};
use crate::models::ScheduleConfig;

/// The JSON file holding the last schedule the user created.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ConfigStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing, unreadable and corrupt files all read as "no config".
    pub fn load(&self) -> Option<ScheduleConfig> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                log::warn!("failed to read config {}: {}", self.path.display(), err);
                return None;
            }
        };

        match serde_json::from_str::<ScheduleConfig>(&content) {
            Ok(config) => Some(config),
            Err(err) => {
                log::warn!("ignoring unparsable config {}: {}", self.path.display(), err);
                None
            }
        }
    }

    /// Replaces the file wholesale via a temp file and rename.
    pub fn save(&self, config: &ScheduleConfig) -> ScheduleResult<()> {
        let fail = |reason: String| ScheduleError::Persistence {
            path: self.path.clone(),
            reason,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| fail(format!("create directory: {e}")))?;
        }

        let serialized =
            serde_json::to_string_pretty(config).map_err(|e| fail(format!("serialize: {e}")))?;
        let temp_path = self.temp_path();

        fs::write(&temp_path, serialized).map_err(|e| fail(format!("write temp file: {e}")))?;
        if let Err(err) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(fail(format!("replace config: {err}")));
        }

        log::debug!("saved schedule config to {}", self.path.display());
        Ok(())
    }

    /// Deletes the file; an already missing file counts as success.
    pub fn remove(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("config.json");
        self.path.with_file_name(format!("{file_name}.tmp"))
    }
}
