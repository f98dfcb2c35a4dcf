use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::task::Task;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not read {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize tasks: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    pub fn corrupt(path: &Path, reason: impl Into<String>) -> Self {
        StoreError::Corrupt {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, StoreError::Corrupt { .. })
    }
}

/// Durable home of the task list. Every access is a full load or a full
/// rewrite; implementations keep no handle open between calls.
pub trait TaskStore {
    fn load_all(&self) -> Result<Vec<Task>, StoreError>;
    fn save_all(&self, tasks: &[Task]) -> Result<(), StoreError>;
    /// File or directory owned by the store.
    fn location(&self) -> &Path;
}

impl<S: TaskStore + ?Sized> TaskStore for Box<S> {
    fn load_all(&self) -> Result<Vec<Task>, StoreError> {
        (**self).load_all()
    }

    fn save_all(&self, tasks: &[Task]) -> Result<(), StoreError> {
        (**self).save_all(tasks)
    }

    fn location(&self) -> &Path {
        (**self).location()
    }
}
