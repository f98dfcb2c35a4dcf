use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::store::{StoreError, TaskStore};
use crate::task::Task;

/// All tasks in one JSON array, kept in insertion order.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

pub fn render_tasks_json(tasks: &[Task]) -> Result<String, serde_json::Error> {
    let mut text = serde_json::to_string_pretty(tasks)?;
    text.push('\n');
    Ok(text)
}

/// Ids must be positive and unique, the same rule the vault enforces per file.
fn check_ids(path: &Path, tasks: &[Task]) -> Result<(), StoreError> {
    let mut seen = HashSet::new();
    for task in tasks {
        if task.id == 0 {
            return Err(StoreError::corrupt(
                path,
                format!("invalid id 0 for task \"{}\"", task.title),
            ));
        }
        if !seen.insert(task.id) {
            return Err(StoreError::corrupt(path, format!("duplicate id {}", task.id)));
        }
    }
    Ok(())
}

impl TaskStore for JsonStore {
    fn load_all(&self) -> Result<Vec<Task>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no task document yet");
                return Ok(Vec::new());
            }
            Err(err) => return Err(StoreError::io(&self.path, err)),
        };
        let tasks: Vec<Task> = serde_json::from_str(&text)
            .map_err(|err| StoreError::corrupt(&self.path, err.to_string()))?;
        check_ids(&self.path, &tasks)?;
        debug!(path = %self.path.display(), count = tasks.len(), "loaded tasks");
        Ok(tasks)
    }

    fn save_all(&self, tasks: &[Task]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| StoreError::io(parent, err))?;
        }
        let body = render_tasks_json(tasks)?;
        let temp = self.temp_path();
        fs::write(&temp, body).map_err(|err| StoreError::io(&temp, err))?;
        fs::rename(&temp, &self.path).map_err(|err| StoreError::io(&self.path, err))?;
        debug!(path = %self.path.display(), count = tasks.len(), "saved tasks");
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample() -> Vec<Task> {
        vec![
            Task {
                id: 1,
                title: "Buy milk".to_string(),
                description: String::new(),
                completed: true,
                created_at: "2026-03-01 08:00:00".to_string(),
            },
            Task {
                id: 2,
                title: "Read \"Dune\"".to_string(),
                description: "Chapter 1".to_string(),
                completed: false,
                created_at: "2026-03-01 08:05:00".to_string(),
            },
        ]
    }

    #[test]
    fn missing_file_loads_empty() {
        let temp = TempDir::new().expect("tempdir");
        let store = JsonStore::new(temp.path().join("tasks.json"));
        assert!(store.load_all().expect("load").is_empty());
        assert!(!store.exists());
    }

    #[test]
    fn save_writes_fields_in_declared_order() {
        let temp = TempDir::new().expect("tempdir");
        let store = JsonStore::new(temp.path().join("tasks.json"));
        store.save_all(&sample()[..1]).expect("save");
        let text = fs::read_to_string(store.path()).expect("read");
        assert_eq!(
            text,
            "[\n  {\n    \"id\": 1,\n    \"title\": \"Buy milk\",\n    \"description\": \"\",\n    \"completed\": true,\n    \"created_at\": \"2026-03-01 08:00:00\"\n  }\n]\n"
        );
    }

    #[test]
    fn save_then_load_keeps_insertion_order() {
        let temp = TempDir::new().expect("tempdir");
        let store = JsonStore::new(temp.path().join("nested").join("tasks.json"));
        let mut tasks = sample();
        tasks.reverse();
        store.save_all(&tasks).expect("save");
        assert_eq!(store.load_all().expect("load"), tasks);
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn zero_id_is_corrupt() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("tasks.json");
        fs::write(&path, r#"[{"id": 0, "title": "Zero"}]"#).expect("write");
        let err = JsonStore::new(&path).load_all().expect_err("zero id");
        assert!(err.is_corrupt());
        assert!(err.to_string().contains("invalid id 0"));
    }

    #[test]
    fn duplicate_ids_are_corrupt() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("tasks.json");
        fs::write(&path, r#"[{"id": 4, "title": "a"}, {"id": 4, "title": "b"}]"#).expect("write");
        let err = JsonStore::new(&path).load_all().expect_err("duplicate");
        assert!(err.to_string().contains("duplicate id 4"));
    }

    #[test]
    fn unparseable_document_is_corrupt() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("tasks.json");
        fs::write(&path, "{ not json").expect("write");
        let err = JsonStore::new(&path).load_all().expect_err("corrupt");
        assert!(err.is_corrupt());
        assert!(err.to_string().contains("tasks.json"));
    }
}
