//! On-disk persistence of the open session.
//!
//! The state lives in a small JSON file next to the database. A missing file
//! means no session is open. Transitions hold an exclusive lock on a sibling
//! `.lock` file so concurrent `wt` processes never act on stale state.

use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::PathBuf;

use fs2::FileExt;

use wt_core::SessionState;

use crate::TrackerError;

/// Location of the persisted session state.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

/// Exclusive lock on the session state, released on drop.
#[derive(Debug)]
pub struct StateLock {
    _file: File,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    /// Reads the state. A missing file is an idle session.
    pub fn load(&self) -> Result<SessionState, TrackerError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                serde_json::from_str(&content).map_err(|source| TrackerError::StateJson {
                    path: self.path.clone(),
                    source,
                })
            }
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(SessionState::idle()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    /// Writes the state. An idle state removes the file.
    pub fn save(&self, state: &SessionState) -> Result<(), TrackerError> {
        if !state.is_active() {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
                Err(source) => Err(self.io_error(source)),
            };
        }
        self.ensure_parent()?;
        let json = serde_json::to_string(state).map_err(|source| TrackerError::StateJson {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(|source| self.io_error(source))
    }

    /// Blocks until this process holds the state lock.
    pub fn lock(&self) -> Result<StateLock, TrackerError> {
        self.ensure_parent()?;
        let path = self.lock_path();
        let file = File::create(&path).map_err(|source| TrackerError::StateIo {
            path: path.clone(),
            source,
        })?;
        file.lock_exclusive()
            .map_err(|source| TrackerError::StateIo { path, source })?;
        Ok(StateLock { _file: file })
    }

    fn ensure_parent(&self) -> Result<(), TrackerError> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).map_err(|source| TrackerError::StateIo {
                    path: parent.to_path_buf(),
                    source,
                })
            }
            _ => Ok(()),
        }
    }

    fn io_error(&self, source: std::io::Error) -> TrackerError {
        TrackerError::StateIo {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_idle() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateFile::new(dir.path().join("session.json"));
        assert_eq!(state.load().unwrap(), SessionState::idle());
    }

    #[test]
    fn active_state_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let state = StateFile::new(&path);

        state.save(&SessionState::active(1_700_000_000)).unwrap();
        assert!(path.exists());
        assert_eq!(state.load().unwrap(), SessionState::active(1_700_000_000));
    }

    #[test]
    fn saving_idle_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let state = StateFile::new(&path);

        state.save(&SessionState::active(5)).unwrap();
        state.save(&SessionState::idle()).unwrap();
        assert!(!path.exists());
        // Clearing twice is fine.
        state.save(&SessionState::idle()).unwrap();
        assert_eq!(state.load().unwrap(), SessionState::idle());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();

        let err = StateFile::new(&path).load().unwrap_err();
        assert!(matches!(err, TrackerError::StateJson { .. }));
    }

    #[test]
    fn lock_can_be_reacquired_after_release() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateFile::new(dir.path().join("session.json"));

        let lock = state.lock().unwrap();
        drop(lock);
        let _again = state.lock().unwrap();
        assert!(dir.path().join("session.lock").exists());
    }
}
