use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DismissalStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Stored log could not be decoded: {0}")]
    Corrupt(String),
}

/// Client-local key-value persistence holding the serialized dismissal log.
///
/// Implementations only move raw text; interpreting it is the engine's job,
/// so a store never needs to know what a valid log looks like.
pub trait DismissalStore: Send + Sync {
    /// Returns the stored log, or `None` when nothing has been stored yet.
    fn read(&self) -> Result<Option<String>, DismissalStoreError>;

    fn write(&self, contents: &str) -> Result<(), DismissalStoreError>;
}

impl<T: DismissalStore + ?Sized> DismissalStore for &T {
    fn read(&self) -> Result<Option<String>, DismissalStoreError> {
        (**self).read()
    }

    fn write(&self, contents: &str) -> Result<(), DismissalStoreError> {
        (**self).write(contents)
    }
}

#[derive(Debug, Default)]
pub struct MemoryDismissalStore {
    contents: Mutex<Option<String>>,
}

impl MemoryDismissalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Mutex::new(Some(contents.into())),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().ok().and_then(|c| c.clone())
    }
}

impl DismissalStore for MemoryDismissalStore {
    fn read(&self) -> Result<Option<String>, DismissalStoreError> {
        let contents = self
            .contents
            .lock()
            .map_err(|e| DismissalStoreError::Unavailable(e.to_string()))?;
        Ok(contents.clone())
    }

    fn write(&self, contents: &str) -> Result<(), DismissalStoreError> {
        let mut current = self
            .contents
            .lock()
            .map_err(|e| DismissalStoreError::Unavailable(e.to_string()))?;
        *current = Some(contents.to_string());
        Ok(())
    }
}

/// Dismissal log kept in a JSON file on the client machine.
#[derive(Debug, Clone)]
pub struct FileDismissalStore {
    path: PathBuf,
}

impl FileDismissalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DismissalStore for FileDismissalStore {
    fn read(&self) -> Result<Option<String>, DismissalStoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, contents: &str) -> Result<(), DismissalStoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}
