//! Local persistent client-side storage
//!
//! Browser-mode stand-in for the shell's settings store: one file per key
//! under a data directory. Only the onboarding flag lives here today.

use gangway_core::Result;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `$GANGWAY_DATA_DIR`, falling back to `~/.gangway`, falling back to a
    /// `.gangway` directory next to the process when no home is known.
    pub fn default_location() -> Self {
        let dir = std::env::var_os("GANGWAY_DATA_DIR")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| Path::new(&home).join(".gangway")))
            .unwrap_or_else(|| PathBuf::from(".gangway"));
        Self::new(dir)
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path(key), value)?;
        Ok(())
    }

    /// Removing an absent key is a no-op, not an error.
    pub fn remove(&self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}
