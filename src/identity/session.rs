//! Persisted local session.
//!
//! One JSON file next to the config file. Tokens live only here; `whoami`
//! reads it, `logout` removes it.

use crate::error::IdentityError;
use crate::identity::types::Session;
use std::fs;
use std::path::{Path, PathBuf};

const SESSION_FILENAME: &str = "session.json";

pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(config_dir: &Path) -> Self {
        Self {
            path: config_dir.join(SESSION_FILENAME),
        }
    }

    /// Load the persisted session; a missing file means no one is signed in.
    pub fn load(&self) -> Result<Option<Session>, IdentityError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path).map_err(|err| {
            IdentityError::SessionStore(format!("failed to read {}: {err}", self.path.display()))
        })?;
        let session = serde_json::from_str(&contents).map_err(|err| {
            IdentityError::SessionStore(format!("failed to parse {}: {err}", self.path.display()))
        })?;
        Ok(Some(session))
    }

    /// Load, failing when no session exists.
    pub fn require(&self) -> Result<Session, IdentityError> {
        self.load()?.ok_or(IdentityError::NotSignedIn)
    }

    pub fn save(&self, session: &Session) -> Result<(), IdentityError> {
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(|err| {
            IdentityError::SessionStore(format!(
                "failed to create {}: {err}",
                parent.display()
            ))
        })?;

        let json = serde_json::to_string_pretty(session)
            .map_err(|err| IdentityError::SessionStore(err.to_string()))?;
        fs::write(&self.path, json).map_err(|err| {
            IdentityError::SessionStore(format!("failed to write {}: {err}", self.path.display()))
        })?;
        Ok(())
    }

    /// Remove the persisted session. Removing an already-absent session is
    /// not an error.
    pub fn clear(&self) -> Result<(), IdentityError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(IdentityError::SessionStore(format!(
                "failed to remove {}: {err}",
                self.path.display()
            ))),
        }
    }
}
