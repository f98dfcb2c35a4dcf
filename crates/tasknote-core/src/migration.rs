use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::json_store::JsonStore;
use crate::store::{StoreError, TaskStore};
use crate::task::Task;
use crate::vault::VaultStore;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("No task document found at {}", .0.display())]
    SourceMissing(PathBuf),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct MigrationResult {
    pub from: PathBuf,
    pub to: PathBuf,
    pub migrated: Vec<Task>,
}

/// Copies every record of a JSON document into a vault, keeping ids,
/// completion and timestamps. Records already in the vault with the same id
/// are replaced; the JSON document itself is left in place.
pub fn migrate_json_to_vault(
    source: &JsonStore,
    target: &VaultStore,
) -> Result<MigrationResult, MigrationError> {
    if !source.exists() {
        return Err(MigrationError::SourceMissing(source.path().to_path_buf()));
    }
    let incoming = source.load_all()?;
    let mut merged = target.load_all()?;
    for task in &incoming {
        match merged.iter_mut().find(|existing| existing.id == task.id) {
            Some(existing) => *existing = task.clone(),
            None => merged.push(task.clone()),
        }
    }
    if !incoming.is_empty() {
        target.save_all(&merged)?;
    }
    info!(
        count = incoming.len(),
        from = %source.path().display(),
        to = %target.dir().display(),
        "migrated tasks"
    );
    Ok(MigrationResult {
        from: source.path().to_path_buf(),
        to: target.dir().to_path_buf(),
        migrated: incoming,
    })
}
